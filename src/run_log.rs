//! Structured log of executed passes, for replaying and auditing runs.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const RUN_LOG_VERSION: &str = "0.1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunLog {
    pub version: String,
    pub passes: Vec<PassEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassEvent {
    pub pass: String,
    pub changed: bool,
    pub duration_us: u64,
}

#[derive(Debug)]
pub enum RunLogError {
    Io(std::io::Error),
    Decode(serde_json::Error),
}

impl fmt::Display for RunLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to access run log: {err}"),
            Self::Decode(err) => write!(f, "failed to decode run log: {err}"),
        }
    }
}

impl std::error::Error for RunLogError {}

#[derive(Default)]
struct RunLogState {
    enabled: bool,
    output: Option<PathBuf>,
    log: RunLog,
}

static RUN_LOGGER: Lazy<Mutex<RunLogState>> = Lazy::new(|| {
    let mut state = RunLogState::default();
    state.log.version = RUN_LOG_VERSION.to_string();
    Mutex::new(state)
});

/// Start recording pass events; with `output` set, the log file is
/// rewritten after every event.
pub fn enable(output: Option<PathBuf>) {
    if let Ok(mut state) = RUN_LOGGER.lock() {
        state.enabled = true;
        state.output = output;
    }
}

/// Stop recording and drop any events collected so far.
pub fn reset() {
    if let Ok(mut state) = RUN_LOGGER.lock() {
        state.enabled = false;
        state.output = None;
        state.log.passes.clear();
    }
}

pub fn record_pass(pass: &str, changed: bool, duration: Duration) {
    let Ok(mut state) = RUN_LOGGER.lock() else {
        return;
    };
    if !state.enabled {
        return;
    }
    let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    state.log.passes.push(PassEvent {
        pass: pass.to_string(),
        changed,
        duration_us,
    });
    if let Some(path) = state.output.clone() {
        let _ = write_log(&state.log, &path);
    }
}

/// Copy of the log collected so far.
#[must_use]
pub fn snapshot() -> RunLog {
    RUN_LOGGER
        .lock()
        .map(|state| state.log.clone())
        .unwrap_or_default()
}

pub fn write_log(log: &RunLog, path: &Path) -> Result<(), RunLogError> {
    let rendered = serde_json::to_string_pretty(log).map_err(RunLogError::Decode)?;
    fs::write(path, rendered).map_err(RunLogError::Io)
}

pub fn read_log(path: &Path) -> Result<RunLog, RunLogError> {
    let raw = fs::read_to_string(path).map_err(RunLogError::Io)?;
    serde_json::from_str(&raw).map_err(RunLogError::Decode)
}
