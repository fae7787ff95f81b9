//! Configuration: profile files and the tool's own config.
pub mod app;
pub mod profile;

pub use app::{AppConfig, AppConfigPaths};
pub use profile::Profile;
