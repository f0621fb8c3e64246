//! Miscellaneous support code used by freshen.

pub use process_builder::ProcessBuilder;
pub use process_error::{ProcessError, is_simple_exit_code};
pub use sha256::Sha256;

pub mod paths;
mod process_builder;
mod process_error;
mod sha256;
