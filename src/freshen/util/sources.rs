use std::path::Path;

use freshen_util::paths;

use crate::util::FreshenResult;

/// Reads a file listing one source path per line.
///
/// Surrounding whitespace is trimmed and blank lines are skipped.
pub fn read_sources_list(path: &Path) -> FreshenResult<Vec<String>> {
    Ok(paths::read(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
