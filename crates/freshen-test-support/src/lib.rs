//! # Freshen test support.
//!
//! Builders for throwaway directory trees that the testsuite runs steps
//! against. Every [`Project`] lives in its own temporary directory which is
//! removed when the project is dropped.

#![allow(clippy::disallowed_methods)]
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use std::fmt::Write;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use freshen_util::paths;
use tempfile::TempDir;

/// Unwrap a `Result` with a useful panic message
///
/// # Example
///
/// ```rust
/// use freshen_test_support::t;
/// t!(std::fs::read_to_string("Cargo.toml"));
/// ```
#[macro_export]
macro_rules! t {
    ($e:expr) => {
        match $e {
            Ok(e) => e,
            Err(e) => $crate::panic_error(&format!("failed running {}", stringify!($e)), e),
        }
    };
}

pub use snapbox::str;

/// `panic!`, reporting the specified error , see also [`t!`]
#[track_caller]
pub fn panic_error(what: &str, err: impl Into<anyhow::Error>) -> ! {
    let err = err.into();
    pe(what, err);
    #[track_caller]
    fn pe(what: &str, err: anyhow::Error) -> ! {
        let mut result = format!("{}\nerror: {}", what, err);
        for cause in err.chain().skip(1) {
            let _ = writeln!(result, "\nCaused by:");
            let _ = write!(result, "{}", cause);
        }
        panic!("\n{}", result);
    }
}

/*
 *
 * ===== Builders =====
 *
 */

#[derive(PartialEq, Clone)]
enum Contents {
    Text(String),
    Zip(Vec<(String, String)>),
}

#[derive(PartialEq, Clone)]
struct FileBuilder {
    path: PathBuf,
    contents: Contents,
    executable: bool,
}

impl FileBuilder {
    fn new(path: PathBuf, contents: Contents, executable: bool) -> FileBuilder {
        FileBuilder {
            path,
            contents,
            executable,
        }
    }

    fn mk(&self) {
        t!(paths::create_parent_dir_all(&self.path));
        match &self.contents {
            Contents::Text(body) => t!(paths::write(&self.path, body)),
            Contents::Zip(entries) => write_zip(&self.path, entries),
        }

        #[cfg(unix)]
        if self.executable {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = t!(fs::metadata(&self.path)).permissions();
            let mode = perms.mode();
            perms.set_mode(mode | 0o111);
            t!(fs::set_permissions(&self.path, perms));
        }
    }
}

fn write_zip(path: &Path, entries: &[(String, String)]) {
    let mut zip = zip::ZipWriter::new(t!(paths::create(path)));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, body) in entries {
        t!(zip.start_file(name.as_str(), options));
        t!(zip.write_all(body.as_bytes()));
    }
    t!(zip.finish());
}

fn zip_entries(entries: &[(&str, &str)]) -> Contents {
    Contents::Zip(
        entries
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect(),
    )
}

/// A directory tree to run steps against.
///
/// See [`project`] to get started.
pub struct Project {
    root: TempDir,
}

/// Create a project to run tests against
#[must_use]
pub struct ProjectBuilder {
    root: Project,
    files: Vec<FileBuilder>,
}

impl ProjectBuilder {
    /// Root of the project
    pub fn root(&self) -> PathBuf {
        self.root.root()
    }

    /// Adds a file to the project.
    pub fn file<B: AsRef<Path>>(mut self, path: B, body: &str) -> Self {
        self._file(path.as_ref(), Contents::Text(body.to_string()), false);
        self
    }

    /// Adds an executable file to the project.
    pub fn executable<B: AsRef<Path>>(mut self, path: B, body: &str) -> Self {
        self._file(path.as_ref(), Contents::Text(body.to_string()), true);
        self
    }

    /// Adds a zip archive holding `entries` as `(name, contents)` pairs.
    pub fn zip<B: AsRef<Path>>(mut self, path: B, entries: &[(&str, &str)]) -> Self {
        self._file(path.as_ref(), zip_entries(entries), false);
        self
    }

    fn _file(&mut self, path: &Path, contents: Contents, executable: bool) {
        self.files.push(FileBuilder::new(
            self.root.root().join(path),
            contents,
            executable,
        ));
    }

    /// Creates the project.
    pub fn build(self) -> Project {
        for file in &self.files {
            file.mk();
        }
        let ProjectBuilder { root, .. } = self;
        root
    }
}

impl Project {
    /// Root of the project
    pub fn root(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// Absolute path of `path` within the project
    pub fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root().join(path)
    }

    /// Overwrite a file with new content
    pub fn change_file(&self, path: impl AsRef<Path>, body: &str) {
        FileBuilder::new(self.path(path), Contents::Text(body.to_string()), false).mk()
    }

    /// Overwrite a zip archive with new entries
    pub fn change_zip(&self, path: impl AsRef<Path>, entries: &[(&str, &str)]) {
        FileBuilder::new(self.path(path), zip_entries(entries), false).mk()
    }

    /// Returns the contents of a path in the project root
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full = self.path(path);
        fs::read_to_string(&full)
            .unwrap_or_else(|e| panic!("could not read file {}: {}", full.display(), e))
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        t!(paths::remove_file(self.path(path)));
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.path(path).exists()
    }

    pub fn mtime(&self, path: impl AsRef<Path>) -> FileTime {
        t!(paths::mtime(&self.path(path)))
    }

    /// Moves the modification time of `path` into the past, so a later
    /// rewrite or touch is observable even on filesystems with coarse
    /// timestamps.
    pub fn age(&self, path: impl AsRef<Path>) {
        let past = FileTime::from_unix_time(1_000_000_000, 0);
        t!(filetime::set_file_mtime(self.path(path), past));
    }
}

/// Generates a project layout in a fresh temporary directory
pub fn project() -> ProjectBuilder {
    let root = t!(tempfile::Builder::new().prefix("freshen-test").tempdir());
    ProjectBuilder {
        root: Project { root },
        files: vec![],
    }
}
