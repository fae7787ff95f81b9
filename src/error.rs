//! Domain-specific error types for the dotlink engine.
//!
//! Internal modules return typed errors ([`LinkError`], [`ConfigError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DotlinkError
//! ├── Config(ConfigError) — profile and tool config loading, validation
//! └── Link(LinkError)     — classification, backup, symlink, sweep
//! ```
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the dotlink engine.
#[derive(Error, Debug)]
pub enum DotlinkError {
    /// Configuration-related error (parsing, validation, I/O).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem mutation or classification error.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// Which form a directory field of a profile must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathForm {
    /// Must be an absolute path.
    Absolute,
    /// Must be relative to `directories.dotfiles`.
    Relative,
}

impl std::fmt::Display for PathForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => f.write_str("an absolute path"),
            Self::Relative => f.write_str("a relative path (to 'directories.dotfiles')"),
        }
    }
}

/// Errors that arise from loading and validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The profile file extension is neither `.toml` nor `.json`.
    #[error("unknown profile file extension {0}: supported extensions are .toml and .json")]
    UnsupportedExtension(PathBuf),

    /// The file could not be deserialized.
    #[error("cannot parse {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// A `[directories]` field has the wrong form.
    #[error("'directories.{field}' must be {expected}")]
    InvalidDirectory {
        /// Field name, lowercase (e.g. `backup`).
        field: &'static str,
        /// Required form.
        expected: PathForm,
    },

    /// A `[mapping]` entry is not a plain relative path.
    #[error("invalid mapping entry '{name}': {reason}")]
    InvalidMapping {
        /// Offending source or destination name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No profile path was given on the command line and none is remembered.
    #[error("profile file not specified")]
    NoProfiles,

    /// The home directory could not be determined.
    #[error("cannot determine home directory")]
    NoHome,

    /// An I/O error occurred while reading or writing a config file.
    #[error("IO error on config file {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Errors raised by the classifier, mutator, sweeper and orchestrator.
#[derive(Error, Debug)]
pub enum LinkError {
    /// `move` was asked to relocate a path that does not exist.
    #[error("file {} not exists", path.display())]
    SourceMissing {
        /// The missing path.
        path: PathBuf,
    },

    /// The sweeper was pointed at something other than a directory.
    #[error("specified path {} is not a directory", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A configured sources subdirectory does not exist.
    #[error("sources directory {} does not exist", path.display())]
    SourcesDirMissing {
        /// Absolute sources directory.
        path: PathBuf,
    },

    /// Any unexpected filesystem failure.
    #[error("{op} {}: {source}", path.display())]
    Io {
        /// Operation that failed (e.g. `lstat`, `symlink`).
        op: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl LinkError {
    /// Wrap an I/O error with the failing operation and path.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
