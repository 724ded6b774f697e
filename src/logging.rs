use std::env;
use std::fmt;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Auto,
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LogFormat::Auto => "auto",
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        };
        f.write_str(text)
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" | "verbose" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(text)
    }
}

/// User-specified or environment-provided log configuration.
#[derive(Debug, Clone, Copy)]
pub struct LogOptions {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogOptions {
    pub const DEFAULT: Self = Self {
        format: LogFormat::Auto,
        level: LogLevel::Info,
    };

    #[must_use]
    pub fn with_overrides(base: Self, overrides: LogSettings) -> Self {
        Self {
            format: overrides.format.unwrap_or(base.format),
            level: overrides.level.unwrap_or(base.level),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        let format =
            env::var_os("VCANON_LOG_FORMAT").map(|value| value.to_string_lossy().to_string());
        let level =
            env::var_os("VCANON_LOG_LEVEL").map(|value| value.to_string_lossy().to_string());
        apply_env_overrides(Self::DEFAULT, format.as_deref(), level.as_deref())
    }

    #[must_use]
    pub fn resolved(self) -> Self {
        let format = match self.format {
            LogFormat::Auto => LogFormat::Text,
            other => other,
        };
        Self { format, ..self }
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Host-supplied overrides for logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSettings {
    pub format: Option<LogFormat>,
    pub level: Option<LogLevel>,
}

impl LogSettings {
    pub fn is_empty(&self) -> bool {
        self.format.is_none() && self.level.is_none()
    }

    #[must_use]
    pub fn merged_with_env(self) -> LogOptions {
        let env = LogOptions::from_env();
        LogOptions::with_overrides(env, self)
    }
}

fn apply_env_overrides(
    mut options: LogOptions,
    format: Option<&str>,
    level: Option<&str>,
) -> LogOptions {
    if let Some(spec) = format.and_then(LogFormat::parse) {
        options.format = spec;
    }
    if let Some(spec) = level.and_then(LogLevel::parse) {
        options.level = spec;
    }
    options
}

/// Install a global `tracing` subscriber according to `options`. Safe to
/// call more than once; only the first call takes effect.
pub fn init_logging(options: &LogOptions) {
    use std::io::IsTerminal;
    use std::sync::OnceLock;
    use tracing_subscriber::{EnvFilter, fmt};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    let _ = INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let level = options.level.as_tracing_level();
        let make_filter = || {
            let directive = options.level.to_string();
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
        };

        match options.resolved().format {
            LogFormat::Json => {
                let subscriber = fmt::fmt()
                    .with_env_filter(make_filter())
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .json()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            _ => {
                let subscriber = fmt::fmt()
                    .with_env_filter(make_filter())
                    .with_max_level(level)
                    .with_ansi(use_ansi)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .compact()
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}
