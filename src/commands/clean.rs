//! `clean`: remove dead links from the destination root and nothing else.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::{CommandSetup, for_each_profile};
use crate::cli::GlobalOpts;
use crate::config::profile::Profile;
use crate::error::LinkError;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::resources::Cleaner;

/// Sweep the destination root of `profile`.  Returns the number of links
/// removed.
///
/// # Errors
///
/// Returns an error if the sweep hits an unexpected filesystem failure.
pub fn sweep(
    profile: &Profile,
    fs: Arc<dyn FileSystemOps>,
    log: Arc<dyn Log>,
) -> Result<usize, LinkError> {
    Cleaner::new(fs, log).clean_dead_symlinks(&profile.directories.destination)
}

/// Sweep every resolved profile.
///
/// # Errors
///
/// Returns an error if setup or the sweep fails for any profile.
pub fn run(global: &GlobalOpts, fs: &Arc<dyn FileSystemOps>, log: &Arc<dyn Log>) -> Result<()> {
    for_each_profile(global, fs, log, |setup: &CommandSetup| {
        let removed = sweep(&setup.profile, Arc::clone(fs), Arc::clone(log))
            .context("cleaning dead symlinks")?;
        log.info(&format!("Cleaned! {removed} dead link(s) removed"));
        Ok(())
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::profile::Directories;
    use crate::logging::test_helpers::RecordingLog;
    use crate::operations::MemoryFileSystemOps;

    fn profile() -> Profile {
        Profile {
            directories: Directories {
                dotfiles: PathBuf::from("/d"),
                sources: None,
                destination: PathBuf::from("/home/u"),
                backup: PathBuf::from("/home/u/.bak"),
            },
            mapping: std::collections::BTreeMap::new(),
            excludes: Vec::new(),
            path: PathBuf::from("/d/profile.toml"),
        }
    }

    #[test]
    fn sweeps_only_the_destination_root() {
        let fs = Arc::new(
            MemoryFileSystemOps::new()
                .with_symlink("/home/u/.dead", "/d/gone")
                .with_symlink("/d/also-dead", "/nowhere"),
        );
        let removed = sweep(&profile(), fs.clone(), Arc::new(RecordingLog::new())).unwrap();
        assert_eq!(removed, 1);
        assert!(fs.node("/home/u/.dead").is_none());
        assert!(fs.node("/d/also-dead").is_some());
    }

    #[test]
    fn destination_that_is_a_file_fails() {
        let fs = Arc::new(MemoryFileSystemOps::new().with_file("/home/u", "x"));
        let err = sweep(&profile(), fs, Arc::new(RecordingLog::new())).unwrap_err();
        assert!(matches!(err, LinkError::NotADirectory { .. }));
    }
}
