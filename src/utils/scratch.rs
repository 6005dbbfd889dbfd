use anyhow::Context;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::Result;

/// Temporary directory that is removed when dropped.
///
/// Removal failures are logged rather than returned: cleanup never
/// overrides the result of the work done inside the directory.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory under `root`, or under the system temp
    /// directory when no root is given
    pub fn new(root: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);

        let dir = match root {
            Some(root) => {
                fs_err::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create temporary directory")?;

        let path = dir.path().to_path_buf();
        tracing::debug!("Created scratch directory: {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now instead of waiting for drop
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!("Cleaned up scratch directory: {}", self.path.display()),
                Err(e) => tracing::warn!(
                    "Could not remove scratch directory {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop_with_contents() {
        let root = TempDir::new().unwrap();
        let path = {
            let scratch = ScratchDir::new(Some(root.path()), "post-").unwrap();
            fs_err::write(scratch.path().join("video.mp4"), b"data").unwrap();
            fs_err::create_dir(scratch.path().join("nested")).unwrap();
            fs_err::write(scratch.path().join("nested/audio.wav"), b"data").unwrap();
            scratch.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_close_is_immediate() {
        let scratch = ScratchDir::new(None, "reelscribe-test-").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());

        scratch.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_removed_when_unwinding_through_error_path() {
        let root = TempDir::new().unwrap();

        fn failing_step(root: &Path) -> Result<()> {
            let scratch = ScratchDir::new(Some(root), "post-")?;
            fs_err::write(scratch.path().join("partial.mp4"), b"x")?;
            anyhow::bail!("download interrupted")
        }

        assert!(failing_step(root.path()).is_err());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let scratch = ScratchDir::new(None, "reelscribe-test-").unwrap();
        std::fs::remove_dir_all(scratch.path()).unwrap();
        drop(scratch);
    }
}
