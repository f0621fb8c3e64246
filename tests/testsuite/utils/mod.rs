use std::cell::Cell;
use std::path::PathBuf;

use freshen::{Changes, Freshness, Step, Tracker};
use freshen_test_support::Project;

/// Path to the freshen binary
pub fn freshen_exe() -> PathBuf {
    snapbox::cmd::cargo_bin!("freshen").to_path_buf()
}

pub trait FreshenProjectExt {
    /// Creates a command running freshen in the project root, with the
    /// environment variables freshen reads cleared.
    fn freshen(&self) -> snapbox::cmd::Command;
}

impl FreshenProjectExt for Project {
    fn freshen(&self) -> snapbox::cmd::Command {
        snapbox::cmd::Command::new(freshen_exe())
            .current_dir(self.root())
            .env_remove("FRESHEN_LOG")
            .env_remove("FRESHEN_EXPLAIN")
            .env_remove("FRESHEN_FORCE")
    }
}

/// Counts how many times a tracked action ran.
#[derive(Default)]
pub struct Runs {
    count: Cell<usize>,
}

impl Runs {
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Runs `step`, with an action that records the call and writes every
    /// declared output.
    pub fn run(&self, tracker: &Tracker, step: &Step) -> Freshness {
        self.run_with(tracker, step, |_| Ok(()))
    }

    /// Like [`Runs::run`], calling `inspect` before writing the outputs.
    pub fn run_with(
        &self,
        tracker: &Tracker,
        step: &Step,
        inspect: impl FnOnce(&Changes<'_>) -> anyhow::Result<()>,
    ) -> Freshness {
        tracker
            .run_if_stale(step, |changes| {
                self.count.set(self.count.get() + 1);
                inspect(changes)?;
                for output in step.get_output_paths() {
                    freshen_util::paths::create_parent_dir_all(output)?;
                    freshen_util::paths::write(output, "built")?;
                }
                Ok(())
            })
            .unwrap()
    }
}
