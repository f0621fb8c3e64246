//! Error types surfaced by the tracker and the command-line front end.

use std::fmt;
use std::path::PathBuf;

pub type FreshenResult<T> = anyhow::Result<T>;

/// A declared input path does not exist when the step is fingerprinted.
#[derive(Debug, thiserror::Error)]
#[error("input file `{}` does not exist", path.display())]
pub struct MissingInputError {
    pub path: PathBuf,
}

/// The step was described in a way that cannot be cached.
#[derive(Debug, thiserror::Error)]
#[error("invalid step configuration: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl fmt::Display) -> ConfigError {
        ConfigError {
            message: message.to_string(),
        }
    }
}

/// The CLI error is the error type used at freshen's CLI-layer.
///
/// All errors from the lib side of freshen will get wrapped with this error.
/// Other errors (such as command-line argument validation) will create this
/// directly.
#[derive(Debug)]
pub struct CliError {
    /// The error to display. This can be `None` in rare cases to exit with a
    /// code without displaying a message. For example `freshen status` uses
    /// this to report a stale step through the exit status alone.
    pub error: Option<anyhow::Error>,
    /// The process exit code.
    pub exit_code: i32,
}

pub type CliResult = Result<(), CliError>;

impl CliError {
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error: Some(error),
            exit_code: code,
        }
    }

    pub fn code(code: i32) -> CliError {
        CliError {
            error: None,
            exit_code: code,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 101)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> CliError {
        CliError::new(err.into(), 1)
    }
}
