//! `install`: sweep dead links, then link every mapped dotfile into place.
//!
//! The run is strictly sequential:
//!
//! 1. sweep dead links out of the destination root;
//! 2. resolve the mapping and the absolute sources directory;
//! 3. filter: drop entries whose source is missing (warning) or whose
//!    destination is already correct;
//! 4. apply: back up real content, then create the link.
//!
//! Any unexpected error stops the run.  Entries applied before the failure
//! stay applied; there is no rollback.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, for_each_profile};
use crate::cli::GlobalOpts;
use crate::config::profile::Profile;
use crate::error::LinkError;
use crate::logging::Log;
use crate::mapping;
use crate::operations::FileSystemOps;
use crate::resources::{Cleaner, Linker};

/// Counters describing what one install run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Dead links removed from the destination root.
    pub dead_links_removed: usize,
    /// Links created.
    pub linked: usize,
    /// Destinations moved into the backup directory first.
    pub backed_up: usize,
    /// Mapping entries skipped because their source does not exist.
    pub missing_sources: usize,
    /// Destinations that already pointed at their source.
    pub already_correct: usize,
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} linked, {} backed up, {} missing, {} already correct",
            self.linked, self.backed_up, self.missing_sources, self.already_correct
        )
    }
}

/// One entry that survived the filter pass.
#[derive(Debug)]
struct PendingLink {
    source: PathBuf,
    destination: PathBuf,
    backup: PathBuf,
}

/// Drives a single install run over one profile.
#[derive(Debug)]
pub struct Installer {
    profile: Profile,
    fs: Arc<dyn FileSystemOps>,
    log: Arc<dyn Log>,
    linker: Linker,
    cleaner: Cleaner,
}

impl Installer {
    /// Create an installer for `profile`.
    #[must_use]
    pub fn new(profile: Profile, fs: Arc<dyn FileSystemOps>, log: Arc<dyn Log>) -> Self {
        let linker = Linker::new(Arc::clone(&fs), Arc::clone(&log));
        let cleaner = Cleaner::new(Arc::clone(&fs), Arc::clone(&log));
        Self {
            profile,
            fs,
            log,
            linker,
            cleaner,
        }
    }

    /// Execute the whole run.
    ///
    /// # Errors
    ///
    /// Returns the first unexpected error: a failed sweep, a missing sources
    /// directory, an unreadable source or destination, or a failed backup or
    /// link.
    pub fn run(&self) -> Result<InstallReport, LinkError> {
        let dirs = &self.profile.directories;
        let mut report = InstallReport {
            dead_links_removed: self.cleaner.clean_dead_symlinks(&dirs.destination)?,
            ..InstallReport::default()
        };

        let source_dir = self.profile.source_dir();
        if dirs.sources.is_some() {
            match self.fs.stat(&source_dir) {
                Ok(_) => {}
                Err(e) if self.fs.is_not_found(&e) => {
                    return Err(LinkError::SourcesDirMissing { path: source_dir });
                }
                Err(e) => return Err(LinkError::io("stat", source_dir, e)),
            }
        }

        let mapping = mapping::resolve(
            self.fs.as_ref(),
            self.log.as_ref(),
            &self.profile,
            &source_dir,
        )?;

        self.log.stage("Installing dotfiles");

        let mut pending = Vec::new();
        for (src, dst) in &mapping {
            let source = source_dir.join(src);
            let destination = dirs.destination.join(dst);

            match self.fs.stat(&source) {
                Ok(_) => {}
                Err(e) if self.fs.is_not_found(&e) => {
                    self.log
                        .warn(&format!("source file {} does not exist", source.display()));
                    report.missing_sources += 1;
                    continue;
                }
                Err(e) => return Err(LinkError::io("stat", source, e)),
            }

            if self.linker.need_symlink(&source, &destination)? {
                pending.push(PendingLink {
                    source,
                    destination,
                    backup: dirs.backup.join(dst),
                });
            } else {
                report.already_correct += 1;
            }
        }

        if pending.is_empty() {
            return Ok(report);
        }

        self.log.debug(&format!(
            "linking from {} to {}",
            source_dir.display(),
            dirs.destination.display()
        ));
        for link in &pending {
            // need_symlink already ran for this destination, so a wrong link
            // is gone and cannot be mistaken for content to back up
            if self.linker.need_backup(&link.destination)? {
                self.linker.move_entry(&link.destination, &link.backup)?;
                report.backed_up += 1;
            }
            self.linker.set_symlink(&link.source, &link.destination)?;
            self.log.info(&format!(
                "+ set symlink {} -> {}",
                link.source.display(),
                link.destination.display()
            ));
            report.linked += 1;
        }

        Ok(report)
    }
}

/// Install every resolved profile.
///
/// # Errors
///
/// Returns an error if setup fails for a profile or its install run fails.
pub fn run(global: &GlobalOpts, fs: &Arc<dyn FileSystemOps>, log: &Arc<dyn Log>) -> Result<()> {
    for_each_profile(global, fs, log, |setup: &CommandSetup| {
        let installer = Installer::new(setup.profile.clone(), Arc::clone(fs), Arc::clone(log));
        let report = installer.run()?;
        if report.dead_links_removed > 0 {
            log.info(&format!("{} dead link(s) removed", report.dead_links_removed));
        }
        log.info(&format!("All done: {report}"));
        Ok(())
    })
}
