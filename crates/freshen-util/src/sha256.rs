use super::paths;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256 as Sha2_sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub struct Sha256(Sha2_sha256);

impl Sha256 {
    pub fn new() -> Sha256 {
        let hasher = Sha2_sha256::new();
        Sha256(hasher)
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Sha256 {
        let _ = self.0.update(bytes);
        self
    }

    /// Feeds `bytes` prefixed by their length, so that consecutive calls
    /// cannot be confused with a different split of the same bytes.
    pub fn update_framed(&mut self, bytes: &[u8]) -> &mut Sha256 {
        self.update(&(bytes.len() as u64).to_le_bytes());
        self.update(bytes)
    }

    pub fn update_file(&mut self, mut file: &File) -> io::Result<&mut Sha256> {
        let mut buf = [0; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break Ok(self);
            }
            self.update(&buf[..n]);
        }
    }

    pub fn update_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Sha256> {
        let path = path.as_ref();
        let file = paths::open(path)?;
        self.update_file(&file)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        Ok(self)
    }

    /// Hashes every regular file below `dir`, in sorted order, folding in
    /// each file's relative path and the digest of its contents.
    pub fn update_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<&mut Sha256> {
        let dir = dir.as_ref();
        for rel in paths::walk_files(dir)? {
            let digest = Sha256::new().update_path(dir.join(&rel))?.finish();
            self.update_framed(paths::path2bytes(&rel)?);
            self.update(&digest);
        }
        Ok(self)
    }

    pub fn finish(&mut self) -> [u8; 32] {
        self.0.finalize_reset().into()
    }

    pub fn finish_hex(&mut self) -> String {
        hex::encode(self.finish())
    }
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}
