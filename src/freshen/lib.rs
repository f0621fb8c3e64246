//! # freshen: content-addressed staleness tracking for build steps
//!
//! Build scripts wrap the expensive part of their work in a [`Tracker`] so
//! that it only runs when something it depends on actually changed. A step
//! is described by its input files, input strings (typically the command
//! line) and outputs:
//!
//! ```no_run
//! use freshen::{Step, Tracker, TrackerConfig};
//!
//! # fn main() -> freshen::FreshenResult<()> {
//! let mut step = Step::new();
//! step.input_path("src/Foo.java")
//!     .input_string("-source 11")
//!     .output_path("out/Foo.class")
//!     .depfile("out/Foo.d");
//!
//! let tracker = Tracker::new(TrackerConfig::from_env());
//! tracker.run_if_stale(&step, |changes| {
//!     for path in changes.iter_changed_paths() {
//!         println!("recompiling {}", path.display());
//!     }
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! Staleness is decided from content digests, never from timestamps. The
//! record of the last successful run lives next to the outputs (see
//! [`record`]) and is replaced atomically.
//!
//! Set `FRESHEN_LOG=debug` to see why each step was considered fresh or
//! stale, and `FRESHEN_EXPLAIN=1` to get a description of what changed.

use std::io::Write;

use anyhow::Error;
use tracing::debug;

pub use crate::changes::{Changes, PathStatus};
pub use crate::fingerprint::{DirtyReason, EntryFingerprint, EntryLister, ZipEntries};
pub use crate::tracker::{Freshness, Step, Tracker, TrackerConfig, default_record_path};
pub use crate::util::{
    CliError, CliResult, ConfigError, FreshenResult, MissingInputError, expand_file_args,
    parse_gn_list, parse_gn_lists, read_sources_list, to_gn_string,
};

pub mod changes;
pub mod dep_info;
pub mod fingerprint;
pub mod record;
pub mod tracker;
pub mod util;

/// Prints `err` and exits with its exit code.
pub fn exit_with_error(err: CliError) -> ! {
    debug!("exit_with_error; err={:?}", err);

    if let Some(ref err) = err.error {
        if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
            let exit_code = if clap_err.use_stderr() { 1 } else { 0 };
            let _ = clap_err.print();
            std::process::exit(exit_code)
        }
    }

    let CliError { error, exit_code } = err;
    if let Some(error) = error {
        display_error(&error);
    }

    std::process::exit(exit_code)
}

/// Displays an error and all its causes to stderr.
pub fn display_error(err: &Error) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "error: {}", err);
    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "\nCaused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  {}", cause);
        }
    }
}
