// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed sandbox with a dotfiles tree, a fake
// home directory and a profile file, so each integration test can set up an
// isolated environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotlink::config::profile::{Profile, ProfileEnv};
use dotlink::logging::Log;
use dotlink::operations::{FileSystemOps, SystemFileSystemOps};

/// [`Log`] that discards everything.
#[derive(Debug, Default)]
pub struct NullLog;

impl Log for NullLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// An isolated sandbox backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `dots/`     dotfiles root, holding `profile.toml`
/// - `home/`     destination
/// - `home/.bak` backup directory
#[derive(Debug)]
pub struct Sandbox {
    /// Temporary directory containing everything.
    pub root: tempfile::TempDir,
}

impl Sandbox {
    /// Create the sandbox with empty `dots/` and `home/` directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("dots")).expect("create dots dir");
        std::fs::create_dir_all(root.path().join("home")).expect("create home dir");
        Self { root }
    }

    /// Dotfiles root.
    pub fn dots(&self) -> PathBuf {
        self.root.path().join("dots")
    }

    /// Destination (fake home) directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// Backup directory inside the fake home.
    pub fn backup(&self) -> PathBuf {
        self.home().join(".bak")
    }

    /// Directory to point `XDG_CACHE_HOME` at.
    pub fn cache(&self) -> PathBuf {
        self.root.path().join("cache")
    }

    /// Location of `profile.toml`.
    pub fn profile_path(&self) -> PathBuf {
        self.dots().join("profile.toml")
    }

    /// Write `content` to `rel` under `base`, creating parents.
    pub fn write(&self, base: &Path, rel: &str, content: &str) -> PathBuf {
        let path = base.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Write `profile.toml` with explicit directories, the given mapping and
    /// excludes.
    pub fn write_profile(&self, mapping: &[(&str, &str)], excludes: &[&str]) -> PathBuf {
        let mut toml = format!(
            "[directories]\ndestination = \"{}\"\nbackup = \"{}\"\n",
            self.home().display(),
            self.backup().display()
        );
        if !mapping.is_empty() {
            toml.push_str("\n[mapping]\n");
            for (src, dst) in mapping {
                writeln!(toml, "\"{src}\" = \"{dst}\"").expect("format mapping");
            }
        }
        let excludes: Vec<String> = excludes.iter().map(|e| format!("\"{e}\"")).collect();
        write!(toml, "\n[files]\nexcludes = [{}]\n", excludes.join(", ")).expect("format files");

        std::fs::write(self.profile_path(), toml).expect("write profile");
        self.profile_path()
    }

    /// Load the profile written by [`Sandbox::write_profile`].
    pub fn load_profile(&self) -> Profile {
        let env = ProfileEnv {
            home: Some(self.home()),
            lookup: |_: &str| None::<String>,
        };
        Profile::load_with(&self.profile_path(), &env).expect("load profile")
    }

    /// Real filesystem capability.
    pub fn fs(&self) -> Arc<dyn FileSystemOps> {
        Arc::new(SystemFileSystemOps)
    }

    /// Log sink that drops everything.
    pub fn log(&self) -> Arc<dyn Log> {
        Arc::new(NullLog)
    }
}
