//! `add`: adopt an existing file into the dotfiles and link it back.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use super::{CommandSetup, resolve_profile_paths};
use crate::cli::{AddOpts, GlobalOpts};
use crate::config::app::AppConfigPaths;
use crate::config::profile::Profile;
use crate::logging::Log;
use crate::operations::{EntryKind, FileSystemOps};
use crate::resources::Linker;

/// Adopt `file` into `profile`'s sources directory.
///
/// The file is copied into the backup directory, moved into the sources
/// directory under its own name, and replaced by a link to the new location.
/// Returns the new location.
///
/// # Errors
///
/// Returns an error if `file` is missing, a symlink or a directory, if a
/// file of the same name is already managed, or if any step fails.
pub fn add_file(
    profile: &Profile,
    fs: &Arc<dyn FileSystemOps>,
    log: &Arc<dyn Log>,
    file: &Path,
) -> Result<PathBuf> {
    let file = std::path::absolute(file)
        .with_context(|| format!("bad file path {}", file.display()))?;

    match fs.lstat(&file) {
        Ok(EntryKind::File) => {}
        Ok(EntryKind::Symlink) => bail!("cannot add file {} - it is a symlink", file.display()),
        Ok(EntryKind::Dir) => bail!(
            "cannot add dir {} - directories are not supported",
            file.display()
        ),
        Ok(EntryKind::Other) => bail!("cannot add {} - not a regular file", file.display()),
        Err(e) if fs.is_not_found(&e) => bail!("{}: no such file or directory", file.display()),
        Err(e) => return Err(e).with_context(|| format!("lstat {}", file.display())),
    }

    let Some(name) = file.file_name() else {
        bail!("cannot add {} - it has no file name", file.display());
    };
    let source_dir = profile.source_dir();
    let managed = source_dir.join(name);
    match fs.lstat(&managed) {
        Ok(_) => bail!("{} is already in the dotfiles", managed.display()),
        Err(e) if fs.is_not_found(&e) => {}
        Err(e) => return Err(e).with_context(|| format!("lstat {}", managed.display())),
    }

    log.debug(&format!(
        "adding {} to dotfiles {}",
        file.display(),
        source_dir.display()
    ));

    let backup = profile.directories.backup.join(name);
    fs.create_dir_all(&profile.directories.backup)
        .with_context(|| format!("creating {}", profile.directories.backup.display()))?;
    fs.copy_file(&file, &backup)
        .with_context(|| format!("cannot backup file {}", file.display()))?;
    log.info(&format!("→ backup {} to {}", file.display(), backup.display()));

    let linker = Linker::new(Arc::clone(fs), Arc::clone(log));
    linker.move_entry(&file, &managed)?;
    linker.set_symlink(&managed, &file)?;

    Ok(managed)
}

/// Adopt `opts.file` into the first resolved profile.
///
/// The file is moved away from its original location, so only one profile
/// can receive it.
///
/// # Errors
///
/// Returns an error if setup fails or the file cannot be adopted.
pub fn run(
    global: &GlobalOpts,
    opts: &AddOpts,
    fs: &Arc<dyn FileSystemOps>,
    log: &Arc<dyn Log>,
) -> Result<()> {
    let location = AppConfigPaths::for_current_user()?;
    let paths = resolve_profile_paths(global.config.as_deref(), location, log.as_ref())?;
    let Some(profile_path) = paths.first() else {
        bail!("profile file not specified");
    };

    let setup = CommandSetup::init(profile_path, fs.as_ref(), log.as_ref())?;
    let managed = add_file(&setup.profile, fs, log, &opts.file)?;
    log.info(&format!(
        "{} was successfully added to your dotfiles as {}",
        opts.file.display(),
        managed.display()
    ));
    Ok(())
}
