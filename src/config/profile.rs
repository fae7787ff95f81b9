//! Profile loading: TOML or JSON, directory defaulting, validation.
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, PathForm};

/// Name of the backup directory created under `$HOME` when none is given.
pub const DEFAULT_BACKUP_DIR: &str = ".dotfiles~";

/// Resolved `[directories]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    /// Absolute root of the dotfiles checkout.
    pub dotfiles: PathBuf,
    /// Optional subdirectory of `dotfiles` holding the managed files.
    pub sources: Option<PathBuf>,
    /// Absolute directory the links are created in.
    pub destination: PathBuf,
    /// Absolute directory replaced content is moved into.
    pub backup: PathBuf,
}

/// A loaded, validated profile.  Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Directory layout.
    pub directories: Directories,
    /// Explicit source → destination table; empty means "link everything".
    pub mapping: BTreeMap<String, String>,
    /// Exact names skipped when no explicit mapping is given.
    pub excludes: Vec<String>,
    /// File this profile was read from.
    pub path: PathBuf,
}

/// Host facts needed to default and expand directory values.
#[derive(Debug, Clone)]
pub struct ProfileEnv<F> {
    /// Home directory, used for the destination and backup defaults.
    pub home: Option<PathBuf>,
    /// Environment variable lookup for `$VAR` expansion.
    pub lookup: F,
}

/// `$VAR` lookup backed by the process environment.
pub type ProcessLookup = fn(&str) -> Option<String>;

impl ProfileEnv<ProcessLookup> {
    /// Environment of the running process.
    #[must_use]
    pub fn process() -> Self {
        Self {
            home: dirs::home_dir(),
            lookup: |name| std::env::var(name).ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProfile {
    #[serde(alias = "Directories")]
    directories: RawDirectories,
    #[serde(alias = "Mapping")]
    mapping: BTreeMap<String, String>,
    #[serde(alias = "Files")]
    files: RawFiles,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDirectories {
    dotfiles: String,
    sources: String,
    destination: String,
    backup: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFiles {
    #[serde(alias = "Excludes")]
    excludes: Vec<String>,
}

impl Profile {
    /// Load a profile from `path` using the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unsupported, the file cannot be
    /// read or parsed, or any directory or mapping entry is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, &ProfileEnv::process())
    }

    /// Load a profile from `path`, defaulting and expanding against `env`.
    ///
    /// # Errors
    ///
    /// See [`Profile::load`].
    pub fn load_with<F>(path: &Path, env: &ProfileEnv<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, format, path, env)
    }

    /// Parse profile text as if it were read from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or fails validation.
    pub fn parse<F>(
        content: &str,
        format: Format,
        path: &Path,
        env: &ProfileEnv<F>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let raw: RawProfile = match format {
            Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };

        let directories = resolve_directories(&raw.directories, path, env)?;
        for (src, dst) in &raw.mapping {
            validate_mapping_name(src)?;
            validate_mapping_name(dst)?;
        }

        Ok(Self {
            directories,
            mapping: raw.mapping,
            excludes: raw.files.excludes,
            path: path.to_path_buf(),
        })
    }

    /// Absolute directory the managed files live in: `dotfiles`, joined with
    /// `sources` when one is configured.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        match &self.directories.sources {
            Some(sources) => self.directories.dotfiles.join(sources),
            None => self.directories.dotfiles.clone(),
        }
    }
}

/// Profile file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl Format {
    /// Pick the format from `path`'s extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedExtension`] for anything but
    /// `.toml` and `.json`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedExtension(path.to_path_buf())),
        }
    }
}

fn resolve_directories<F>(
    raw: &RawDirectories,
    profile_path: &Path,
    env: &ProfileEnv<F>,
) -> Result<Directories, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let expand = |value: &str| expand_env(value, &env.lookup);
    let home = || env.home.clone().ok_or(ConfigError::NoHome);

    let dotfiles = match expand(&raw.dotfiles) {
        v if v.is_empty() => profile_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        v => PathBuf::from(v),
    };
    let sources = match expand(&raw.sources) {
        v if v.is_empty() => None,
        v => Some(PathBuf::from(v)),
    };
    let destination = match expand(&raw.destination) {
        v if v.is_empty() => home()?,
        v => PathBuf::from(v),
    };
    let backup = match expand(&raw.backup) {
        v if v.is_empty() => home()?.join(DEFAULT_BACKUP_DIR),
        v => PathBuf::from(v),
    };

    check_form("dotfiles", &dotfiles, PathForm::Absolute)?;
    if let Some(sources) = &sources {
        check_form("sources", sources, PathForm::Relative)?;
    }
    check_form("destination", &destination, PathForm::Absolute)?;
    check_form("backup", &backup, PathForm::Absolute)?;

    Ok(Directories {
        dotfiles,
        sources,
        destination,
        backup,
    })
}

fn check_form(field: &'static str, path: &Path, expected: PathForm) -> Result<(), ConfigError> {
    let ok = match expected {
        PathForm::Absolute => path.is_absolute(),
        PathForm::Relative => !path.is_absolute(),
    };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidDirectory { field, expected })
    }
}

fn validate_mapping_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidMapping {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(invalid("must be a relative path"));
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(invalid("must not contain '..'"));
    }
    Ok(())
}

/// Expand `$NAME` and `${NAME}` references using `lookup`.
///
/// Unset variables expand to the empty string.  A `$` that does not start a
/// reference is kept as is.
pub fn expand_env<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((head, tail)) = rest.split_once('$') {
        out.push_str(head);

        if let Some(braced) = tail.strip_prefix('{')
            && let Some((name, after)) = braced.split_once('}')
        {
            out.push_str(&lookup(name).unwrap_or_default());
            rest = after;
            continue;
        }

        let name_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        let (name, after) = tail.split_at(name_len);
        if name.is_empty() {
            out.push('$');
        } else {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = after;
    }

    out.push_str(rest);
    out
}
