//! Symlink-based dotfiles installer.
//!
//! Projects files from a dotfiles tree into a destination directory as
//! symbolic links.  Whatever real content sat at a destination is moved into
//! a backup directory first; links whose target has vanished are swept away.
//!
//! The public API is organised into layers:
//!
//! - **[`operations`]**: the filesystem capability every component goes through
//! - **[`resources`]**: destination classifier, link mutator, dead-link sweeper
//! - **[`mapping`]**: which source name lands at which destination name
//! - **[`config`]**: profile files and the list of remembered profiles
//! - **[`commands`]**: `install`, `clean` and `add` orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod operations;
pub mod resources;
