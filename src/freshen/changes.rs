//! What changed since the last successful run of a step.
//!
//! A [`Changes`] is handed to the action of a stale step. It compares the
//! freshly computed [`Fingerprint`] with the previous [`Record`] and lets the
//! action process only what changed. The per-path classification is only
//! computed when the action first asks for it.
//!
//! When the step is forced, an output is missing or the input strings
//! changed, earlier results cannot be reused and every current input path is
//! reported as added.

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fingerprint::{EntryFingerprint, EntryLister, Fingerprint};
use crate::record::Record;
use crate::util::FreshenResult;

/// How an input path compares with the previous record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathStatus {
    Added,
    Modified,
    Removed,
    Unchanged,
}

pub struct Changes<'a> {
    old: Option<&'a Record>,
    new: &'a Fingerprint,
    lister: &'a dyn EntryLister,
    tracked: &'a [PathBuf],
    forced: bool,
    missing_outputs: Vec<PathBuf>,
    classified: OnceCell<Classified>,
}

struct Classified {
    /// Status of each path of the new fingerprint, in input order.
    status: Vec<PathStatus>,
    /// Paths of the old record that are no longer inputs, in record order.
    removed: Vec<PathBuf>,
}

impl<'a> Changes<'a> {
    pub(crate) fn new(
        old: Option<&'a Record>,
        new: &'a Fingerprint,
        lister: &'a dyn EntryLister,
        tracked: &'a [PathBuf],
        forced: bool,
        missing_outputs: Vec<PathBuf>,
    ) -> Changes<'a> {
        Changes {
            old,
            new,
            lister,
            tracked,
            forced,
            missing_outputs,
            classified: OnceCell::new(),
        }
    }

    /// Whether a record of a previous successful run was found.
    pub fn has_record(&self) -> bool {
        self.old.is_some()
    }

    /// Whether the step runs because it was forced.
    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Declared outputs that did not exist when staleness was decided.
    pub fn missing_outputs(&self) -> &[PathBuf] {
        &self.missing_outputs
    }

    /// Whether any input path or string differs from the record.
    pub fn has_changes(&self) -> bool {
        self.old.is_none_or(|old| old.hash != self.new.hash())
    }

    /// Whether the input strings differ from the record.
    ///
    /// Forced runs and runs without a record count as changed strings.
    pub fn has_string_changes(&self) -> bool {
        self.forced
            || self
                .old
                .is_none_or(|old| old.strings_hash != self.new.strings_hash())
    }

    /// True when nothing was removed, so the action may process only the
    /// added and modified paths.
    ///
    /// Removals cover input paths and the entries of tracked containers. A
    /// container whose entries cannot be listed counts as having removals.
    pub fn added_or_modified_only(&self) -> bool {
        if !self.classified().removed.is_empty() {
            return false;
        }
        self.tracked
            .iter()
            .all(|container| self.removed_subpaths(container).is_ok_and(|r| r.is_empty()))
    }

    /// Every input path, in input order.
    pub fn iter_all_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.new.files().iter().map(|f| f.path.as_path())
    }

    pub fn iter_added_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.iter_with_status(|s| s == PathStatus::Added)
    }

    pub fn iter_modified_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.iter_with_status(|s| s == PathStatus::Modified)
    }

    /// Added and modified paths, in input order.
    pub fn iter_changed_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.iter_with_status(|s| matches!(s, PathStatus::Added | PathStatus::Modified))
    }

    /// Paths of the previous record that are no longer inputs.
    pub fn iter_removed_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.classified().removed.iter().map(PathBuf::as_path)
    }

    /// Status of `path`, or `None` if it is neither a current nor a
    /// previously recorded input.
    pub fn status_of(&self, path: &Path) -> Option<PathStatus> {
        let classified = self.classified();
        if let Some(i) = self.new.files().iter().position(|f| f.path == path) {
            return Some(classified.status[i]);
        }
        classified
            .removed
            .iter()
            .any(|p| p == path)
            .then_some(PathStatus::Removed)
    }

    /// Entries of the tracked container `container` that are new or whose
    /// content changed.
    ///
    /// Unchanged, removed and untracked containers have no changed entries.
    /// Every entry of a newly added container is changed.
    pub fn changed_subpaths(&self, container: &Path) -> FreshenResult<Vec<String>> {
        let Some((old, new)) = self.container_entries(container)? else {
            return Ok(Vec::new());
        };
        let Some(old) = old else {
            return Ok(new.into_iter().map(|e| e.name).collect());
        };
        let old: HashMap<&str, &str> = old
            .iter()
            .map(|e| (e.name.as_str(), e.tag.as_str()))
            .collect();
        Ok(new
            .into_iter()
            .filter(|e| old.get(e.name.as_str()) != Some(&e.tag.as_str()))
            .map(|e| e.name)
            .collect())
    }

    /// Entries of the tracked container `container` that no longer exist.
    pub fn removed_subpaths(&self, container: &Path) -> FreshenResult<Vec<String>> {
        let Some((Some(old), new)) = self.container_entries(container)? else {
            return Ok(Vec::new());
        };
        let new: HashSet<&str> = new.iter().map(|e| e.name.as_str()).collect();
        Ok(old
            .iter()
            .filter(|e| !new.contains(e.name.as_str()))
            .map(|e| e.name.clone())
            .collect())
    }

    /// A human readable account of why the step is stale.
    pub fn describe_difference(&self) -> String {
        if self.forced {
            return "forced".to_string();
        }
        if !self.missing_outputs.is_empty() {
            let mut out = "outputs do not exist:".to_string();
            for path in &self.missing_outputs {
                out.push_str(&format!("\n  {}", path.display()));
            }
            return out;
        }
        let Some(old) = self.old else {
            return "no previous record found".to_string();
        };
        if old.strings_hash != self.new.strings_hash() {
            let mut out = "input strings changed:".to_string();
            for line in diff_strings(&old.strings, self.new.strings()) {
                out.push_str("\n  ");
                out.push_str(&line);
            }
            return out;
        }
        if old.hash == self.new.hash() {
            return "no difference".to_string();
        }

        let mut lines = Vec::new();
        for path in self.iter_added_paths() {
            lines.push(format!("added: {}", path.display()));
        }
        for path in self.iter_removed_paths() {
            lines.push(format!("removed: {}", path.display()));
        }
        for path in self.iter_modified_paths() {
            lines.push(format!("modified: {}", path.display()));
            if let Some((Some(old), new)) = self.container_entries(path).ok().flatten() {
                let tags: HashMap<&str, &str> = old
                    .iter()
                    .map(|e| (e.name.as_str(), e.tag.as_str()))
                    .collect();
                let names: HashSet<&str> = new.iter().map(|e| e.name.as_str()).collect();
                for entry in &new {
                    match tags.get(entry.name.as_str()) {
                        None => lines.push(format!("  -> subpath added: {}", entry.name)),
                        Some(tag) if *tag != entry.tag => {
                            lines.push(format!("  -> subpath modified: {}", entry.name))
                        }
                        Some(_) => {}
                    }
                }
                for entry in old.iter().filter(|e| !names.contains(e.name.as_str())) {
                    lines.push(format!("  -> subpath removed: {}", entry.name));
                }
            }
        }
        if lines.is_empty() {
            // Only the order of the input paths changed.
            return "input paths were reordered".to_string();
        }
        format!("input files changed:\n  {}", lines.join("\n  "))
    }

    fn classified(&self) -> &Classified {
        self.classified.get_or_init(|| self.classify())
    }

    fn classify(&self) -> Classified {
        let files = self.new.files();
        let Some(old) = self.old else {
            return Classified {
                status: vec![PathStatus::Added; files.len()],
                removed: Vec::new(),
            };
        };
        if self.rebuilds_everything(old) {
            let current: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
            return Classified {
                status: vec![PathStatus::Added; files.len()],
                removed: removed_paths(old, &current),
            };
        }
        if old.hash == self.new.hash() {
            return Classified {
                status: vec![PathStatus::Unchanged; files.len()],
                removed: Vec::new(),
            };
        }

        let old_hashes: HashMap<&Path, &str> = old
            .files
            .iter()
            .map(|f| (f.path.as_path(), f.hash.as_str()))
            .collect();
        let status = files
            .iter()
            .map(|f| match old_hashes.get(f.path.as_path()) {
                None => PathStatus::Added,
                Some(hash) if *hash != f.hash => PathStatus::Modified,
                Some(_) => PathStatus::Unchanged,
            })
            .collect();
        let current: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        Classified {
            status,
            removed: removed_paths(old, &current),
        }
    }

    /// Forced runs, missing outputs and changed strings invalidate every
    /// earlier result, so every current path is reported as added.
    fn rebuilds_everything(&self, old: &Record) -> bool {
        self.forced
            || !self.missing_outputs.is_empty()
            || old.strings_hash != self.new.strings_hash()
    }

    fn iter_with_status(
        &self,
        pred: impl Fn(PathStatus) -> bool + 'a,
    ) -> impl Iterator<Item = &Path> + '_ {
        let status = &self.classified().status;
        self.new
            .files()
            .iter()
            .zip(status)
            .filter(move |(_, s)| pred(**s))
            .map(|(f, _)| f.path.as_path())
    }

    /// Old and current entries of a tracked container that was added or
    /// modified. The old entries are `None` when the container is new or the
    /// record holds no entries for it.
    fn container_entries(
        &self,
        container: &Path,
    ) -> FreshenResult<Option<(Option<&'a [EntryFingerprint]>, Vec<EntryFingerprint>)>> {
        if !self.tracked.iter().any(|p| p == container) {
            debug!("{} is not a tracked container", container.display());
            return Ok(None);
        }
        let old = match self.status_of(container) {
            Some(PathStatus::Added) => None,
            Some(PathStatus::Modified) => self
                .old
                .and_then(|old| old.file(container))
                .and_then(|f| f.entries.as_deref()),
            _ => return Ok(None),
        };
        let new = self.lister.list_entries(container)?;
        Ok(Some((old, new)))
    }
}

/// Paths of `old` that are not among `current`, in record order.
fn removed_paths(old: &Record, current: &HashSet<&Path>) -> Vec<PathBuf> {
    old.files
        .iter()
        .filter(|f| !current.contains(f.path.as_path()))
        .map(|f| f.path.clone())
        .collect()
}

/// Lines describing how `old` turned into `new`, prefixed with `-` for
/// dropped strings and `+` for new ones.
fn diff_strings(old: &[String], new: &[String]) -> Vec<String> {
    // Longest common subsequence table over the suffixes of both lists.
    let mut lcs = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut lines = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            lines.push(format!("- {}", old[i]));
            i += 1;
        } else {
            lines.push(format!("+ {}", new[j]));
            j += 1;
        }
    }
    lines.extend(old[i..].iter().map(|s| format!("- {}", s)));
    lines.extend(new[j..].iter().map(|s| format!("+ {}", s)));
    lines
}
