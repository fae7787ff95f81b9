//! Subcommand orchestration and the setup they share.
pub mod add;
pub mod clean;
pub mod install;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::app::{AppConfig, AppConfigPaths};
use crate::config::profile::Profile;
use crate::error::ConfigError;
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// The loaded profile.
    pub profile: Profile,
}

impl CommandSetup {
    /// Load the profile at `profile_path` and make sure its backup
    /// directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be loaded or the backup
    /// directory cannot be created.
    pub fn init(profile_path: &Path, fs: &dyn FileSystemOps, log: &dyn Log) -> Result<Self> {
        log.stage(&format!("Loading profile {}", profile_path.display()));
        let profile = Profile::load(profile_path).with_context(|| {
            format!(
                "cannot read profile {} (if it was renamed, pass the new path with --config)",
                profile_path.display()
            )
        })?;
        Self::prepare(profile, fs, log)
    }

    /// Finish setup for an already loaded profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup directory cannot be created.
    pub fn prepare(profile: Profile, fs: &dyn FileSystemOps, log: &dyn Log) -> Result<Self> {
        let dirs = &profile.directories;
        fs.create_dir_all(&dirs.backup)
            .with_context(|| format!("creating backup directory {}", dirs.backup.display()))?;

        log.debug(&format!("dotfiles root: {}", dirs.dotfiles.display()));
        log.debug(&format!(
            "dotfiles sources: {}",
            dirs.sources
                .as_deref()
                .map_or_else(|| "-".to_string(), |s| s.display().to_string())
        ));
        log.debug(&format!("destination: {}", dirs.destination.display()));
        log.debug(&format!("backup: {}", dirs.backup.display()));

        Ok(Self { profile })
    }
}

/// Work out which profile files this run processes.
///
/// An explicit `config` path is made absolute, remembered in the tool config
/// and returned alone.  Without one, every remembered path is returned.
///
/// # Errors
///
/// Returns an error if the tool config cannot be loaded or saved, or if no
/// profile is given and none is remembered.
pub fn resolve_profile_paths(
    config: Option<&Path>,
    location: AppConfigPaths,
    log: &dyn Log,
) -> Result<Vec<PathBuf>> {
    let mut app = AppConfig::load(location, log).context("loading dotlink config")?;

    let Some(config) = config else {
        let paths = app.profile_paths();
        if paths.is_empty() {
            return Err(ConfigError::NoProfiles.into());
        }
        log.debug(&format!("using profiles from {}", app.path().display()));
        return Ok(paths);
    };

    let absolute = std::path::absolute(config)
        .with_context(|| format!("bad profile path {}", config.display()))?;
    if app.add_profile(absolute.clone()) {
        app.save(log).context("saving dotlink config")?;
        log.debug(&format!(
            "remembered profile {} in {}",
            absolute.display(),
            app.path().display()
        ));
    }
    Ok(vec![absolute])
}

/// Run `action` once per resolved profile, stopping at the first failure.
///
/// # Errors
///
/// Returns the first setup or action error.
pub fn for_each_profile(
    global: &GlobalOpts,
    fs: &Arc<dyn FileSystemOps>,
    log: &Arc<dyn Log>,
    mut action: impl FnMut(&CommandSetup) -> Result<()>,
) -> Result<()> {
    let location = AppConfigPaths::for_current_user()?;
    let paths = resolve_profile_paths(global.config.as_deref(), location, log.as_ref())?;
    for path in paths {
        let setup = CommandSetup::init(&path, fs.as_ref(), log.as_ref())?;
        action(&setup)?;
    }
    Ok(())
}
