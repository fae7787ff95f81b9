//! Source → destination name table for one profile.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::profile::Profile;
use crate::error::LinkError;
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Relative source name → relative destination name.
///
/// Ordered so that runs over the same tree visit entries identically.
pub type Mapping = BTreeMap<PathBuf, PathBuf>;

/// Build the mapping for `profile`.
///
/// An explicit `[mapping]` table is used verbatim and the exclude list is
/// ignored (with a warning).  Otherwise every immediate entry of
/// `source_dir` maps to itself, minus entries whose name exactly equals an
/// exclude.
///
/// # Errors
///
/// Returns an error if `source_dir` has to be listed and cannot be.
pub fn resolve(
    fs: &dyn FileSystemOps,
    log: &dyn Log,
    profile: &Profile,
    source_dir: &Path,
) -> Result<Mapping, LinkError> {
    if !profile.mapping.is_empty() {
        if !profile.excludes.is_empty() {
            log.warn("excludes make no sense when a mapping is given, ignoring them");
        }
        return Ok(profile
            .mapping
            .iter()
            .map(|(src, dst)| (PathBuf::from(src), PathBuf::from(dst)))
            .collect());
    }

    log.debug("no mapping given, linking every entry of the sources directory");
    let entries = fs
        .read_dir(source_dir)
        .map_err(|e| LinkError::io("readdir", source_dir, e))?;

    let mut mapping = Mapping::new();
    for entry in entries {
        let Some(name) = entry.file_name() else {
            continue;
        };
        mapping.insert(PathBuf::from(name), PathBuf::from(name));
    }
    for exclude in &profile.excludes {
        mapping.remove(Path::new(exclude));
    }

    Ok(mapping)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::io;

    use super::*;
    use crate::config::profile::Directories;
    use crate::logging::test_helpers::{Level, RecordingLog};
    use crate::operations::{MemoryFileSystemOps, Op};

    fn profile(mapping: &[(&str, &str)], excludes: &[&str]) -> Profile {
        Profile {
            directories: Directories {
                dotfiles: PathBuf::from("/d"),
                sources: None,
                destination: PathBuf::from("/home/u"),
                backup: PathBuf::from("/home/u/.bak"),
            },
            mapping: mapping
                .iter()
                .map(|(s, d)| ((*s).to_string(), (*d).to_string()))
                .collect(),
            excludes: excludes.iter().map(|e| (*e).to_string()).collect(),
            path: PathBuf::from("/d/profile.toml"),
        }
    }

    fn dotfiles() -> MemoryFileSystemOps {
        MemoryFileSystemOps::new()
            .with_file("/d/.bashrc", "b")
            .with_file("/d/.vimrc", "v")
            .with_file("/d/README.md", "r")
    }

    #[test]
    fn identity_mapping_minus_excludes() {
        let log = RecordingLog::new();
        let mapping = resolve(
            &dotfiles(),
            &log,
            &profile(&[], &["README.md"]),
            Path::new("/d"),
        )
        .unwrap();
        let expected: Mapping = [(".bashrc", ".bashrc"), (".vimrc", ".vimrc")]
            .into_iter()
            .map(|(s, d)| (PathBuf::from(s), PathBuf::from(d)))
            .collect();
        assert_eq!(mapping, expected);
        assert!(log.messages(Level::Warn).is_empty());
    }

    #[test]
    fn excludes_are_exact_names_not_globs() {
        let log = RecordingLog::new();
        let mapping = resolve(
            &dotfiles(),
            &log,
            &profile(&[], &["*.md", ".vim"]),
            Path::new("/d"),
        )
        .unwrap();
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn subdirectories_are_single_entries() {
        let fs = dotfiles().with_file("/d/.config/nvim/init.vim", "n");
        let mapping = resolve(
            &fs,
            &RecordingLog::new(),
            &profile(&[], &[]),
            Path::new("/d"),
        )
        .unwrap();
        assert!(mapping.contains_key(Path::new(".config")));
        assert!(!mapping.contains_key(Path::new(".config/nvim")));
    }

    #[test]
    fn explicit_mapping_is_used_verbatim_and_excludes_warned() {
        let log = RecordingLog::new();
        let mapping = resolve(
            &dotfiles(),
            &log,
            &profile(&[("vim/vimrc", ".vimrc")], &["README.md"]),
            Path::new("/d"),
        )
        .unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.get(Path::new("vim/vimrc")),
            Some(&PathBuf::from(".vimrc"))
        );
        assert!(log.contains(Level::Warn, "excludes"));
    }

    #[test]
    fn explicit_mapping_does_not_list_the_directory() {
        let fs = MemoryFileSystemOps::new().with_failure(
            Op::ReadDir,
            "/d",
            io::ErrorKind::PermissionDenied,
        );
        let mapping = resolve(
            &fs,
            &RecordingLog::new(),
            &profile(&[(".vimrc", ".vimrc")], &[]),
            Path::new("/d"),
        )
        .unwrap();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn unreadable_source_dir_fails() {
        let fs = MemoryFileSystemOps::new().with_failure(
            Op::ReadDir,
            "/d",
            io::ErrorKind::PermissionDenied,
        );
        let err = resolve(&fs, &RecordingLog::new(), &profile(&[], &[]), Path::new("/d"))
            .unwrap_err();
        assert!(matches!(err, LinkError::Io { op: "readdir", .. }));
    }
}
