//! Writing Makefile-style depfiles for the outer build system.
//!
//! The depfile names the step's first output as the target and every input
//! as a prerequisite, on a single line:
//!
//! ```text
//! out/Foo.class: src/Foo.java src/with\ space.java
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::format_err;
use freshen_util::paths;

use crate::util::FreshenResult;

/// Renders `path` for a depfile, escaping spaces.
pub fn render_filename(path: &Path) -> FreshenResult<String> {
    path.to_str()
        .ok_or_else(|| format_err!("path `{}` is not valid UTF-8", path.display()))
        .map(|f| f.replace(' ', "\\ "))
}

/// Renders the depfile contents for `target` depending on `deps`.
///
/// Duplicate prerequisites are dropped, keeping the first occurrence.
pub fn render<P: AsRef<Path>>(target: &Path, deps: &[P]) -> FreshenResult<String> {
    let mut out = render_filename(target)?;
    out.push(':');
    let mut seen = HashSet::new();
    for dep in deps {
        let dep = dep.as_ref();
        if !seen.insert(dep) {
            continue;
        }
        out.push(' ');
        out.push_str(&render_filename(dep)?);
    }
    out.push('\n');
    Ok(out)
}

/// Writes the depfile at `depfile`, leaving it untouched when the contents
/// are unchanged.
pub fn write_depfile<P: AsRef<Path>>(depfile: &Path, target: &Path, deps: &[P]) -> FreshenResult<()> {
    let contents = render(target, deps)?;
    paths::create_parent_dir_all(depfile)?;
    paths::write_if_changed(depfile, contents)
}
