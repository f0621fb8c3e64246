//! Listing the entries of container inputs such as `.jar` and `.zip` files.
//!
//! When an input is registered as a tracked container, its entries are stored
//! in the record together with a tag that changes whenever the entry's
//! content does. On the next run the action can ask which entries changed
//! instead of reprocessing the whole archive.

use std::path::Path;

use anyhow::Context as _;
use freshen_util::paths;
use serde::{Deserialize, Serialize};

use crate::util::FreshenResult;

/// One entry of a container and its content tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryFingerprint {
    pub name: String,
    pub tag: String,
}

/// Enumerates the entries of a container input.
pub trait EntryLister {
    fn list_entries(&self, path: &Path) -> FreshenResult<Vec<EntryFingerprint>>;
}

impl<F> EntryLister for F
where
    F: Fn(&Path) -> FreshenResult<Vec<EntryFingerprint>>,
{
    fn list_entries(&self, path: &Path) -> FreshenResult<Vec<EntryFingerprint>> {
        self(path)
    }
}

/// Lists the files of a zip archive, tagged with their CRC-32.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipEntries;

impl EntryLister for ZipEntries {
    fn list_entries(&self, path: &Path) -> FreshenResult<Vec<EntryFingerprint>> {
        let file = paths::open(path)?;
        let mut archive = zip::ZipArchive::new(file)
            .with_context(|| format!("failed to read zip archive `{}`", path.display()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .with_context(|| format!("failed to read entry {} of `{}`", i, path.display()))?;
            if entry.is_dir() {
                continue;
            }
            entries.push(EntryFingerprint {
                name: entry.name().to_string(),
                tag: format!("{:08x}", entry.crc32()),
            });
        }
        Ok(entries)
    }
}
