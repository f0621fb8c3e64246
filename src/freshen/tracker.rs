//! Deciding whether a step is stale, and running it when it is.
//!
//! A [`Step`] names everything that determines whether a build step has to
//! run again: its input paths and strings, and the outputs it produces. The
//! [`Tracker`] fingerprints the inputs, compares the result with the step's
//! record and, when the step is stale, invokes the caller's action exactly
//! once. After the action succeeds the inputs are fingerprinted again, the
//! record is replaced with that fingerprint, the depfile is written and the
//! stamp file is touched.
//!
//! A step is stale when, checked in this order:
//!
//! 1. it is forced, by the step itself or by [`TrackerConfig::force`];
//! 2. there is no usable record;
//! 3. a declared output does not exist;
//! 4. the digest of the inputs differs from the recorded one.
//!
//! The previous record is deleted before the action runs. If the action
//! fails, or the process is interrupted while it runs, the step stays stale
//! instead of trusting outputs that may be half written.

use std::fmt;
use std::path::{Path, PathBuf};

use freshen_util::paths;
use tracing::{debug, info, warn};

use crate::changes::Changes;
use crate::dep_info;
use crate::fingerprint::{self, DirtyReason, EntryLister, Fingerprint, ZipEntries};
use crate::record::{self, Record};
use crate::util::{ConfigError, FreshenResult};

/// Behavior shared by every step run through a [`Tracker`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Describe why each stale step has to run.
    pub explain: bool,
    /// Treat every step as stale.
    pub force: bool,
}

impl TrackerConfig {
    /// Reads `FRESHEN_EXPLAIN` and `FRESHEN_FORCE`.
    ///
    /// A variable counts as set unless it is empty, `0` or `false`.
    pub fn from_env() -> TrackerConfig {
        TrackerConfig {
            explain: env_flag("FRESHEN_EXPLAIN"),
            force: env_flag("FRESHEN_FORCE"),
        }
    }
}

#[allow(clippy::disallowed_methods)]
fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(value) => !matches!(value.as_str(), "" | "0" | "false"),
        Err(_) => false,
    }
}

/// Returns the record path used when a step does not name one:
/// `<output_paths[0]>.fingerprint`.
pub fn default_record_path<P: AsRef<Path>>(output_paths: &[P]) -> Option<PathBuf> {
    let first = output_paths.first()?;
    let mut path = first.as_ref().as_os_str().to_os_string();
    path.push(".fingerprint");
    Some(PathBuf::from(path))
}

/// A build step whose freshness is tracked.
#[derive(Clone, Debug, Default)]
pub struct Step {
    input_paths: Vec<PathBuf>,
    input_strings: Vec<String>,
    output_paths: Vec<PathBuf>,
    force: bool,
    record_path: Option<PathBuf>,
    depfile: Option<PathBuf>,
    depfile_extra_deps: Vec<PathBuf>,
    stamp: Option<PathBuf>,
    track_subentries: Vec<PathBuf>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.output_paths.first() {
            Some(out) => write!(f, "{}", out.display()),
            None => f.write_str("<no outputs>"),
        }
    }
}

impl Step {
    pub fn new() -> Step {
        Step::default()
    }

    /// (chainable) Adds an input file or directory.
    pub fn input_path<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.input_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Adds multiple input files or directories.
    pub fn input_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> &mut Step {
        self.input_paths
            .extend(paths.iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// (chainable) Adds a string, such as a compiler flag, that is part of
    /// the step's inputs. Order matters.
    pub fn input_string<S: AsRef<str>>(&mut self, s: S) -> &mut Step {
        self.input_strings.push(s.as_ref().to_string());
        self
    }

    /// (chainable) Adds multiple input strings.
    pub fn input_strings<S: AsRef<str>>(&mut self, strings: &[S]) -> &mut Step {
        self.input_strings
            .extend(strings.iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// (chainable) Adds an output. The first output is the depfile target.
    pub fn output_path<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.output_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Adds multiple outputs.
    pub fn output_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> &mut Step {
        self.output_paths
            .extend(paths.iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// (chainable) Runs the step even if it looks fresh.
    pub fn force(&mut self, force: bool) -> &mut Step {
        self.force = force;
        self
    }

    /// (chainable) Stores the record at `path` instead of the
    /// [default location](default_record_path).
    pub fn record_path<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.record_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Writes a depfile at `path` after each successful run.
    pub fn depfile<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.depfile = Some(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Lists `path` in the depfile without fingerprinting it.
    pub fn depfile_extra_dep<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.depfile_extra_deps.push(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Touches `path` after each successful run.
    pub fn stamp<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.stamp = Some(path.as_ref().to_path_buf());
        self
    }

    /// (chainable) Tracks the entries of the input container `path`
    /// individually, see [`Changes::changed_subpaths`].
    pub fn track_subentries<P: AsRef<Path>>(&mut self, path: P) -> &mut Step {
        self.track_subentries.push(path.as_ref().to_path_buf());
        self
    }

    pub fn get_input_paths(&self) -> &[PathBuf] {
        &self.input_paths
    }

    pub fn get_input_strings(&self) -> &[String] {
        &self.input_strings
    }

    pub fn get_output_paths(&self) -> &[PathBuf] {
        &self.output_paths
    }

    pub fn get_depfile(&self) -> Option<&Path> {
        self.depfile.as_deref()
    }

    pub fn get_stamp(&self) -> Option<&Path> {
        self.stamp.as_deref()
    }

    pub fn get_track_subentries(&self) -> &[PathBuf] {
        &self.track_subentries
    }

    /// The record path, explicit or derived from the first output.
    pub fn get_record_path(&self) -> Option<PathBuf> {
        self.record_path
            .clone()
            .or_else(|| default_record_path(&self.output_paths))
    }

    /// Checks that the step can be tracked and returns its record path.
    fn validate(&self) -> FreshenResult<PathBuf> {
        let record_path = match self.get_record_path() {
            Some(path) if !self.output_paths.is_empty() => path,
            _ => return Err(ConfigError::new("a step needs at least one output path").into()),
        };
        if let Some(depfile) = &self.depfile {
            if self.output_paths.contains(depfile) {
                return Err(ConfigError::new(format!(
                    "depfile `{}` is also declared as an output",
                    depfile.display()
                ))
                .into());
            }
        }
        if self.output_paths.contains(&record_path) {
            return Err(ConfigError::new(format!(
                "record `{}` is also declared as an output",
                record_path.display()
            ))
            .into());
        }
        if self.depfile.as_ref() == Some(&record_path) {
            return Err(ConfigError::new(format!(
                "record `{}` is also the depfile",
                record_path.display()
            ))
            .into());
        }
        for container in &self.track_subentries {
            if !self.input_paths.contains(container) {
                return Err(ConfigError::new(format!(
                    "tracked container `{}` is not an input path",
                    container.display()
                ))
                .into());
            }
        }
        Ok(record_path)
    }
}

/// The outcome of [`Tracker::run_if_stale`] and [`Tracker::check`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing changed. The action was not run and nothing was written.
    Fresh,
    /// The step was stale.
    Dirty {
        reason: DirtyReason,
        /// Set when [`TrackerConfig::explain`] is enabled.
        explanation: Option<String>,
    },
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }

    pub fn is_dirty(&self) -> bool {
        !self.is_fresh()
    }
}

/// The staleness decision for a step, before anything runs.
struct Decision {
    record_path: PathBuf,
    fingerprint: Fingerprint,
    old: Option<Record>,
    missing_outputs: Vec<PathBuf>,
    forced: bool,
    dirty: Option<DirtyReason>,
}

pub struct Tracker {
    config: TrackerConfig,
    lister: Box<dyn EntryLister>,
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker::new(TrackerConfig::default())
    }
}

impl Tracker {
    /// Creates a tracker that lists container entries with [`ZipEntries`].
    pub fn new(config: TrackerConfig) -> Tracker {
        Tracker {
            config,
            lister: Box::new(ZipEntries),
        }
    }

    /// Replaces the hook used to list the entries of tracked containers.
    pub fn with_entry_lister(mut self, lister: impl EntryLister + 'static) -> Tracker {
        self.lister = Box::new(lister);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Decides whether `step` is stale without running or writing anything.
    pub fn check(&self, step: &Step) -> FreshenResult<Freshness> {
        let decision = self.decide(step)?;
        let Some(reason) = decision.dirty.clone() else {
            return Ok(Freshness::Fresh);
        };
        let explanation = self
            .config
            .explain
            .then(|| self.changes(step, &decision).describe_difference());
        Ok(Freshness::Dirty {
            reason,
            explanation,
        })
    }

    /// Runs `action` if `step` is stale.
    ///
    /// Errors from `action` are returned unchanged, and in that case neither
    /// the record, the depfile nor the stamp is written.
    #[tracing::instrument(skip_all, fields(step = %step))]
    pub fn run_if_stale<F>(&self, step: &Step, action: F) -> FreshenResult<Freshness>
    where
        F: FnOnce(&Changes<'_>) -> anyhow::Result<()>,
    {
        let decision = self.decide(step)?;
        let Some(reason) = decision.dirty.clone() else {
            debug!("fresh");
            return Ok(Freshness::Fresh);
        };
        info!("stale: {reason}");

        let changes = self.changes(step, &decision);
        let explanation = self.config.explain.then(|| changes.describe_difference());
        if let Some(explanation) = &explanation {
            info!("{explanation}");
        }

        // Forget the previous run before touching any output, so that an
        // interrupted or failed action can never leave a valid record behind.
        if decision.record_path.exists() {
            paths::remove_file(&decision.record_path)?;
        }

        action(&changes)?;

        self.write_results(step, &decision)?;
        Ok(Freshness::Dirty {
            reason,
            explanation,
        })
    }

    fn decide(&self, step: &Step) -> FreshenResult<Decision> {
        let record_path = step.validate()?;
        debug!("record at: {}", record_path.display());

        let fingerprint = fingerprint::calculate(&step.input_paths, &step.input_strings)?;
        let old = record::load(&record_path);
        let missing_outputs: Vec<PathBuf> = step
            .output_paths
            .iter()
            .filter(|p| !p.exists())
            .cloned()
            .collect();
        let forced = step.force || self.config.force;

        let dirty = if forced {
            Some(DirtyReason::Forced)
        } else if let Some(old) = &old {
            if let Some(path) = missing_outputs.first() {
                Some(DirtyReason::MissingOutput { path: path.clone() })
            } else if old.hash != fingerprint.hash() {
                Some(DirtyReason::InputsChanged {
                    old: old.hash.clone(),
                    new: fingerprint.hash().to_string(),
                })
            } else {
                None
            }
        } else {
            Some(DirtyReason::FreshBuild)
        };

        Ok(Decision {
            record_path,
            fingerprint,
            old,
            missing_outputs,
            forced,
            dirty,
        })
    }

    fn changes<'a>(&'a self, step: &'a Step, decision: &'a Decision) -> Changes<'a> {
        Changes::new(
            decision.old.as_ref(),
            &decision.fingerprint,
            &*self.lister,
            &step.track_subentries,
            decision.forced,
            decision.missing_outputs.clone(),
        )
    }

    fn write_results(&self, step: &Step, decision: &Decision) -> FreshenResult<()> {
        // The action may have rewritten declared inputs, such as generated
        // sources, so the record describes the inputs as they are now.
        let current = fingerprint::calculate(&step.input_paths, &step.input_strings)?;
        if current.hash() != decision.fingerprint.hash() {
            debug!("inputs changed while the step ran");
        }
        let mut record = Record::from_fingerprint(&current);
        for file in &mut record.files {
            if step.track_subentries.contains(&file.path) {
                file.entries = Some(self.lister.list_entries(&file.path)?);
            }
        }
        record::save(&decision.record_path, &record)?;

        if let Some(depfile) = &step.depfile {
            let deps: Vec<&Path> = step
                .input_paths
                .iter()
                .chain(&step.depfile_extra_deps)
                .map(PathBuf::as_path)
                .collect();
            // validate() guarantees at least one output.
            if let Some(target) = step.output_paths.first() {
                dep_info::write_depfile(depfile, target, &deps)?;
            }
        }

        if let Some(stamp) = &step.stamp {
            paths::create_parent_dir_all(stamp)?;
            paths::touch(stamp)?;
        }

        for output in &step.output_paths {
            if !output.exists() {
                warn!(
                    "output `{}` does not exist after running the step",
                    output.display()
                );
            }
        }
        Ok(())
    }
}
