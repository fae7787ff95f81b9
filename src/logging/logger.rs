//! [`Log`] implementation that emits [`tracing`] events.
use std::path::{Path, PathBuf};

use super::subscriber::STAGE_TARGET;
use super::types::Log;
use super::utils::log_file_path;

/// Logger used by the binary.
///
/// Every message becomes a `tracing` event; where it ends up (console,
/// `$XDG_CACHE_HOME/dotlink/<command>.log`) is decided by the subscriber
/// from [`init_subscriber`](super::subscriber::init_subscriber).  Without a
/// subscriber the events are dropped.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for a run of `command`.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    /// Where the persistent log for this run is written, if anywhere.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_path_is_named_after_command() {
        let log = Logger::new("clean");
        if let Some(path) = log.log_path() {
            assert!(path.ends_with("clean.log"), "{}", path.display());
        }
    }

    #[test]
    fn events_without_subscriber_are_dropped() {
        let log = Logger::new("install");
        log.stage("Installing dotfiles");
        log.info("+ set symlink a -> b");
        log.debug("dotfiles: /d");
        log.warn("source file /d/x does not exist");
        log.error("boom");
    }
}
