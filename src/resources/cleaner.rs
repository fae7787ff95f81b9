//! Dead-link sweeper.
use std::path::Path;
use std::sync::Arc;

use crate::error::LinkError;
use crate::logging::Log;
use crate::operations::{EntryKind, FileSystemOps};

/// Removes symlinks whose target no longer exists.
#[derive(Debug, Clone)]
pub struct Cleaner {
    fs: Arc<dyn FileSystemOps>,
    log: Arc<dyn Log>,
}

impl Cleaner {
    /// Create a cleaner over the given filesystem and log sink.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystemOps>, log: Arc<dyn Log>) -> Self {
        Self { fs, log }
    }

    /// Delete every dangling symlink directly inside `dir` (not recursive).
    ///
    /// Regular entries and links whose target exists are left alone.  The
    /// first unexpected error aborts the sweep; entries not yet visited stay
    /// as they are, and running the sweep again is safe.
    ///
    /// Returns the number of links removed.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotADirectory`] if `dir` is not a directory, or
    /// an I/O error for any failure other than a missing link target.
    pub fn clean_dead_symlinks(&self, dir: &Path) -> Result<usize, LinkError> {
        let kind = self
            .fs
            .stat(dir)
            .map_err(|e| LinkError::io("open", dir, e))?;
        if kind != EntryKind::Dir {
            return Err(LinkError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| LinkError::io("readdir", dir, e))?;

        let mut removed = 0usize;
        for entry in entries {
            if !self.is_dead_symlink(dir, &entry)? {
                continue;
            }

            self.fs
                .remove(&entry)
                .map_err(|e| LinkError::io("remove", &entry, e))?;

            if removed == 0 {
                self.log.info("Cleaning dead symlinks...");
            }
            removed += 1;
            self.log
                .info(&format!("✓ removed broken symlink {}", entry.display()));
        }

        Ok(removed)
    }

    /// Whether `entry` is a symlink whose target is missing.
    ///
    /// Relative targets are resolved against `dir`.  The target is queried
    /// without following further links.
    fn is_dead_symlink(&self, dir: &Path, entry: &Path) -> Result<bool, LinkError> {
        let kind = self
            .fs
            .lstat(entry)
            .map_err(|e| LinkError::io("lstat", entry, e))?;
        if kind != EntryKind::Symlink {
            return Ok(false);
        }

        let target = self
            .fs
            .read_link(entry)
            .map_err(|e| LinkError::io("readlink", entry, e))?;
        let resolved = if target.is_absolute() {
            target
        } else {
            dir.join(target)
        };

        match self.fs.lstat(&resolved) {
            Ok(_) => Ok(false),
            Err(e) if self.fs.is_not_found(&e) => Ok(true),
            Err(e) => Err(LinkError::io("lstat", resolved, e)),
        }
    }
}
