//! Running the command wrapped by `freshen run`.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::Command;

use anyhow::{Context, Result};
use shell_escape::escape;

use crate::process_error::ProcessError;

/// A program and its arguments, run with the parent's environment, working
/// directory and standard streams.
#[derive(Clone, Debug)]
pub struct ProcessBuilder {
    program: OsString,
    args: Vec<OsString>,
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", escape(arg.to_string_lossy()))?;
        }
        write!(f, "`")
    }
}

impl ProcessBuilder {
    pub fn new<T: AsRef<OsStr>>(program: T) -> ProcessBuilder {
        ProcessBuilder {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// (chainable) Adds `arg` to the args list.
    pub fn arg<T: AsRef<OsStr>>(&mut self, arg: T) -> &mut ProcessBuilder {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// (chainable) Adds multiple `args` to the args list.
    pub fn args<T: AsRef<OsStr>>(&mut self, args: &[T]) -> &mut ProcessBuilder {
        self.args
            .extend(args.iter().map(|t| t.as_ref().to_os_string()));
        self
    }

    /// Runs the process to completion.
    ///
    /// A process that cannot be started or exits unsuccessfully is reported
    /// as a [`ProcessError`].
    pub fn exec(&self) -> Result<()> {
        let status = self
            .build_command()
            .status()
            .with_context(|| ProcessError::new(&format!("could not execute process {}", self), None))?;
        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::new(
                &format!("process didn't exit successfully: {}", self),
                Some(status),
            )
            .into())
        }
    }

    pub fn build_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}
