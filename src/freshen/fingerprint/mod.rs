//! Content fingerprints of a step's inputs.
//!
//! A [`Fingerprint`] is computed from the ordered input paths and the ordered
//! input strings of a step. Files are hashed by their contents with SHA-256,
//! and directories by a sorted recursive walk that folds in every regular
//! file's relative path and content digest. Nothing about a file other than
//! its bytes contributes: touching a file without changing it leaves the
//! fingerprint alone.
//!
//! The combined digest folds, in order, every path together with its digest
//! and then the digest of the strings. Strings are length-prefixed, so
//! `["ab", "c"]` and `["a", "bc"]` produce different fingerprints.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use freshen_util::{Sha256, paths};
use tracing::trace;

use crate::util::{FreshenResult, MissingInputError};

pub use self::dirty_reason::DirtyReason;
pub use self::entries::{EntryFingerprint, EntryLister, ZipEntries};

mod dirty_reason;
mod entries;

/// The digest of a single input path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFingerprint {
    pub path: PathBuf,
    /// Hex SHA-256 of the file's contents, or of the directory walk.
    pub hash: String,
}

/// The digest of all inputs of a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    hash: String,
    strings_hash: String,
    strings: Vec<String>,
    files: Vec<FileFingerprint>,
}

impl Fingerprint {
    /// Hex digest over every path, its content and the strings.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hex digest over the input strings alone.
    pub fn strings_hash(&self) -> &str {
        &self.strings_hash
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Per-path digests, in input order.
    pub fn files(&self) -> &[FileFingerprint] {
        &self.files
    }

    pub fn file_hash(&self, path: &Path) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.hash.as_str())
    }
}

/// Computes the fingerprint of `input_paths` and `input_strings`.
///
/// Fails with [`MissingInputError`] naming the first input path that does
/// not exist. A path listed more than once only counts at its first
/// position.
pub fn calculate<P, S>(input_paths: &[P], input_strings: &[S]) -> FreshenResult<Fingerprint>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(input_paths.len());
    for path in input_paths {
        let path = path.as_ref();
        if !seen.insert(path) {
            continue;
        }
        let hash = hash_path(path)?;
        trace!("fingerprint {} = {}", path.display(), hash);
        files.push(FileFingerprint {
            path: path.to_path_buf(),
            hash,
        });
    }

    let strings: Vec<String> = input_strings
        .iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    let strings_hash = hash_strings(&strings);

    let mut hasher = Sha256::new();
    for file in &files {
        hasher.update_framed(paths::path2bytes(&file.path)?);
        hasher.update_framed(file.hash.as_bytes());
    }
    hasher.update_framed(strings_hash.as_bytes());

    Ok(Fingerprint {
        hash: hasher.finish_hex(),
        strings_hash,
        strings,
        files,
    })
}

fn hash_path(path: &Path) -> FreshenResult<String> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(MissingInputError {
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to stat `{}`", path.display()));
        }
    };
    let mut hasher = Sha256::new();
    if meta.is_dir() {
        hasher.update_dir(path)?;
    } else {
        hasher.update_path(path)?;
    }
    Ok(hasher.finish_hex())
}

pub(crate) fn hash_strings<S: AsRef<str>>(strings: &[S]) -> String {
    let mut hasher = Sha256::new();
    for s in strings {
        hasher.update_framed(s.as_ref().as_bytes());
    }
    hasher.finish_hex()
}
