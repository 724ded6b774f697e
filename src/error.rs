use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::ir::VerifyReport;

/// Unified error type for the crate.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Verify(VerifyReport),
    Transform {
        message: String,
        backtrace: Option<Backtrace>,
    },
    Internal {
        message: String,
        backtrace: Option<Backtrace>,
    },
}

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new transformation error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    /// Construct a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: capture_backtrace(),
        }
    }

    /// Return the captured backtrace, if any.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            Error::Transform { backtrace, .. } | Error::Internal { backtrace, .. } => {
                backtrace.as_ref()
            }
            Error::Io(_) | Error::Verify(_) => None,
        }
    }
}

fn capture_backtrace() -> Option<Backtrace> {
    if cfg!(debug_assertions) {
        Some(Backtrace::force_capture())
    } else {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Verify(report) => write!(f, "malformed module: {report}"),
            Error::Transform { message, .. } => write!(f, "transform error: {message}"),
            Error::Internal { message, .. } => write!(f, "internal error: {message}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Verify(report) => Some(report),
            Error::Transform { .. } | Error::Internal { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<VerifyReport> for Error {
    fn from(report: VerifyReport) -> Self {
        Error::Verify(report)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::internal(message)
    }
}
