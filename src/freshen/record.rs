//! The persisted record of a step's last successful run.
//!
//! A record is a small JSON document stored next to the step's outputs. It
//! is replaced atomically after every successful run and is never written
//! when the action fails. A record that cannot be read for any reason is
//! treated as absent, which makes the step run again.

use std::path::{Path, PathBuf};

use freshen_util::paths;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fingerprint::{EntryFingerprint, Fingerprint};
use crate::util::FreshenResult;

/// Bumped whenever the digest scheme or the layout of [`Record`] changes.
pub const RECORD_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub version: u32,
    pub hash: String,
    pub strings_hash: String,
    pub strings: Vec<String>,
    pub files: Vec<FileRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub hash: String,
    /// Entries of a tracked container, `None` for ordinary inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryFingerprint>>,
}

impl Record {
    pub fn from_fingerprint(fingerprint: &Fingerprint) -> Record {
        Record {
            version: RECORD_VERSION,
            hash: fingerprint.hash().to_string(),
            strings_hash: fingerprint.strings_hash().to_string(),
            strings: fingerprint.strings().to_vec(),
            files: fingerprint
                .files()
                .iter()
                .map(|f| FileRecord {
                    path: f.path.clone(),
                    hash: f.hash.clone(),
                    entries: None,
                })
                .collect(),
        }
    }

    pub fn file(&self, path: &Path) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Loads the record at `path`.
///
/// Returns `None` when the record is missing, unreadable, malformed or was
/// written with a different [`RECORD_VERSION`].
pub fn load(path: &Path) -> Option<Record> {
    let contents = match paths::read(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("no usable record at {}: {:#}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Record>(&contents) {
        Ok(record) if record.version == RECORD_VERSION => Some(record),
        Ok(record) => {
            debug!(
                "ignoring record {} with version {} (expected {})",
                path.display(),
                record.version,
                RECORD_VERSION
            );
            None
        }
        Err(e) => {
            debug!("ignoring corrupt record {}: {}", path.display(), e);
            None
        }
    }
}

/// Atomically replaces the record at `path`, creating parent directories.
pub fn save(path: &Path, record: &Record) -> FreshenResult<()> {
    let json = serde_json::to_string(record)?;
    debug!("write record ({}) : {}", record.hash, path.display());
    paths::create_parent_dir_all(path)?;
    paths::write_atomic(path, json)
}
