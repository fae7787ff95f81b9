//! Core logging types: verbosity and the [`Log`] trait.

/// Console verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only warnings and errors reach the console.
    Quiet,
    /// Informational output (the default).
    #[default]
    Normal,
    /// Debug output as well.
    Verbose,
}

impl Verbosity {
    /// Derive the verbosity from the `--quiet` / `--verbose` flags.
    ///
    /// `quiet` wins when both are set.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Abstraction over logging backends.
///
/// The engine never talks to a global logger: every component receives an
/// `Arc<dyn Log>` at construction, so tests can swap in a recorder and the
/// binary decides where output goes.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
}
