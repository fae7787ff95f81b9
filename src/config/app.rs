//! Tool-level config: the list of remembered profile files.
//!
//! Stored as JSON at `$HOME/.dotlink/config.json`.  An older layout kept a
//! single `config` object in `$HOME/.dotlink/profile.json`; it is migrated
//! on first load and then deleted.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::Log;

/// Directory under `$HOME` holding the tool's own files.
pub const APP_DIR: &str = ".dotlink";
const CONFIG_FILE: &str = "config.json";
const LEGACY_FILE: &str = "profile.json";

/// Locations of the current and legacy config files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfigPaths {
    /// `config.json`.
    pub config: PathBuf,
    /// Legacy `profile.json`, read only for migration.
    pub legacy: PathBuf,
}

impl AppConfigPaths {
    /// Standard locations under `home`.
    #[must_use]
    pub fn under(home: &Path) -> Self {
        let dir = home.join(APP_DIR);
        Self {
            config: dir.join(CONFIG_FILE),
            legacy: dir.join(LEGACY_FILE),
        }
    }

    /// Standard locations under the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHome`] if the home directory is unknown.
    pub fn for_current_user() -> Result<Self, ConfigError> {
        dirs::home_dir()
            .map(|home| Self::under(&home))
            .ok_or(ConfigError::NoHome)
    }
}

/// One remembered profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Absolute path of the profile file.
    pub path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    profiles: Vec<ProfileEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyFile {
    #[serde(default)]
    config: LegacyConfig,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyConfig {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    paths: Vec<PathBuf>,
}

impl LegacyConfig {
    fn into_paths(self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            self.path.into_iter().collect()
        } else {
            self.paths
        }
    }
}

/// In-memory view of the tool config, bound to its file location.
#[derive(Debug, Clone)]
pub struct AppConfig {
    profiles: Vec<ProfileEntry>,
    location: AppConfigPaths,
}

impl AppConfig {
    /// Load from `location`, migrating the legacy file if only it exists.
    ///
    /// Neither file existing yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// the migrated config cannot be written or the legacy file removed.
    pub fn load(location: AppConfigPaths, log: &dyn Log) -> Result<Self, ConfigError> {
        if let Some(content) = read_optional(&location.config)? {
            let file: ConfigFile = parse_json(&location.config, &content)?;
            log.debug(&format!("loaded config {}", location.config.display()));
            return Ok(Self {
                profiles: file.profiles,
                location,
            });
        }

        let Some(content) = read_optional(&location.legacy)? else {
            log.debug("no config file found, starting fresh");
            return Ok(Self {
                profiles: Vec::new(),
                location,
            });
        };

        log.info(&format!(
            "migrating legacy config {} to {}",
            location.legacy.display(),
            location.config.display()
        ));
        let legacy: LegacyFile = parse_json(&location.legacy, &content)?;

        let mut config = Self {
            profiles: Vec::new(),
            location,
        };
        for path in legacy.config.into_paths() {
            config.add_profile(path);
        }
        config.save(log)?;
        fs::remove_file(&config.location.legacy).map_err(|source| ConfigError::Io {
            path: config.location.legacy.clone(),
            source,
        })?;
        log.info("config migration completed");

        Ok(config)
    }

    /// Remember `path`.  Returns `false` if it was already known.
    pub fn add_profile(&mut self, path: PathBuf) -> bool {
        if self.profiles.iter().any(|p| p.path == path) {
            return false;
        }
        self.profiles.push(ProfileEntry { path });
        true
    }

    /// Remembered profile paths, in insertion order.
    #[must_use]
    pub fn profile_paths(&self) -> Vec<PathBuf> {
        self.profiles.iter().map(|p| p.path.clone()).collect()
    }

    /// File this config is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.location.config
    }

    /// Write the config as pretty-printed JSON, creating its directory
    /// owner-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, log: &dyn Log) -> Result<(), ConfigError> {
        let path = &self.location.config;
        let io_error = |source: io::Error| ConfigError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            create_private_dir(parent).map_err(io_error)?;
        }

        let file = ConfigFile {
            profiles: self.profiles.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_private(path, json.as_bytes()).map_err(io_error)?;

        log.debug(&format!("saved config {}", path.display()));
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, content: &str) -> Result<T, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    use io::Write as _;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)
}
