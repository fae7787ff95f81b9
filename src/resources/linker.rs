//! Path state classifier and link mutator.
//!
//! [`Linker::need_symlink`] is a query with a side effect: a symlink that
//! points at the wrong target is deleted before it returns.  Callers must
//! ask `need_symlink` before [`Linker::need_backup`] for the same
//! destination, so that a stale link is already gone when backup is decided
//! and can never be mistaken for content worth preserving.
use std::path::Path;
use std::sync::Arc;

use super::state::{DestinationState, inspect};
use crate::error::LinkError;
use crate::logging::Log;
use crate::operations::{EntryKind, FileSystemOps};

/// Classifies destinations and performs backup and link mutations.
#[derive(Debug, Clone)]
pub struct Linker {
    fs: Arc<dyn FileSystemOps>,
    log: Arc<dyn Log>,
}

impl Linker {
    /// Create a linker over the given filesystem and log sink.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystemOps>, log: Arc<dyn Log>) -> Self {
        Self { fs, log }
    }

    /// Report whether `destination` needs a new link to `source`.
    ///
    /// - absent → `true`
    /// - real content → `true`, left in place for the caller to back up
    /// - link to `source` → `false`
    /// - link elsewhere → removed, then `true`
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be queried, or if a wrong
    /// link cannot be removed.
    pub fn need_symlink(&self, source: &Path, destination: &Path) -> Result<bool, LinkError> {
        match inspect(self.fs.as_ref(), source, destination)? {
            DestinationState::Absent | DestinationState::Other => Ok(true),
            DestinationState::CorrectSymlink(_) => {
                self.log
                    .debug(&format!("✓ correct symlink {}", destination.display()));
                Ok(false)
            }
            DestinationState::WrongSymlink(target) => {
                self.fs
                    .remove(destination)
                    .map_err(|e| LinkError::io("remove", destination, e))?;
                self.log.info(&format!(
                    "✓ removed wrong symlink {} (was -> {})",
                    destination.display(),
                    target.display()
                ));
                Ok(true)
            }
        }
    }

    /// Report whether `destination` holds real content that must be backed
    /// up before it is replaced.  Symlinks, right or wrong, never are.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be queried.
    pub fn need_backup(&self, destination: &Path) -> Result<bool, LinkError> {
        match self.fs.lstat(destination) {
            Ok(kind) => Ok(kind != EntryKind::Symlink),
            Err(e) if self.fs.is_not_found(&e) => Ok(false),
            Err(e) => Err(LinkError::io("lstat", destination, e)),
        }
    }

    /// Move `old_path` to `new_path`, creating missing ancestors of
    /// `new_path` owner-only.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::SourceMissing`] if `old_path` does not exist, or
    /// an I/O error if directory creation or the rename fails.
    pub fn move_entry(&self, old_path: &Path, new_path: &Path) -> Result<(), LinkError> {
        match self.fs.lstat(old_path) {
            Ok(_) => {}
            Err(e) if self.fs.is_not_found(&e) => {
                return Err(LinkError::SourceMissing {
                    path: old_path.to_path_buf(),
                });
            }
            Err(e) => return Err(LinkError::io("lstat", old_path, e)),
        }

        self.ensure_parent(new_path)?;

        self.log.debug(&format!(
            "→ backup {} to {}",
            old_path.display(),
            new_path.display()
        ));
        self.fs
            .rename(old_path, new_path)
            .map_err(|e| LinkError::io("rename", old_path, e))
    }

    /// Create a link at `destination` pointing to `source`, creating missing
    /// ancestors of `destination` owner-only.
    ///
    /// Never overwrites: the destination must already be vacant.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails or anything already
    /// exists at `destination`.
    pub fn set_symlink(&self, source: &Path, destination: &Path) -> Result<(), LinkError> {
        self.ensure_parent(destination)?;
        self.fs
            .symlink(source, destination)
            .map_err(|e| LinkError::io("symlink", destination, e))?;
        self.log.debug(&format!(
            "linked {} -> {}",
            destination.display(),
            source.display()
        ));
        Ok(())
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), LinkError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| LinkError::io("mkdir", parent, e))?;
        }
        Ok(())
    }
}
