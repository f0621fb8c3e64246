//! Error value for [`crate::ProcessBuilder`] when a process fails.

use std::fmt;
use std::process::ExitStatus;

#[derive(Debug)]
pub struct ProcessError {
    /// What failed, followed by the exit status in parentheses.
    pub desc: String,
    /// `None` when the process never started or was killed by a signal.
    pub code: Option<i32>,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.desc.fmt(f)
    }
}

impl std::error::Error for ProcessError {}

impl ProcessError {
    /// `status` is `None` if the process did not launch.
    pub fn new(msg: &str, status: Option<ExitStatus>) -> ProcessError {
        let exit = match status {
            Some(s) => exit_status_to_string(s),
            None => "never executed".to_string(),
        };
        ProcessError {
            desc: format!("{} ({})", msg, exit),
            code: status.and_then(|s| s.code()),
        }
    }
}

fn exit_status_to_string(status: ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return format!("signal: {}", signal);
        }
    }
    status.to_string()
}

/// Whether `code` is an exit code a process returns on its own, as opposed
/// to one reporting abnormal termination.
pub fn is_simple_exit_code(code: i32) -> bool {
    (0..=127).contains(&code)
}
