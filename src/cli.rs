//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Link dotfiles into place, backing up whatever was there",
    version
)]
pub struct Cli {
    /// Subcommand to run; `install` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Profile file (.toml or .json); remembered for later runs
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalOpts {
    /// Console verbosity selected by the flags.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Remove dead links, then link every dotfile into place
    #[default]
    Install,
    /// Only remove dead links from the destination directory
    Clean,
    /// Move a file into the dotfiles and link it back
    Add(AddOpts),
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Print version information
    Version,
}

impl Command {
    /// Short name, used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Clean => "clean",
            Self::Add(_) => "add",
            Self::Completions { .. } => "completions",
            Self::Version => "version",
        }
    }
}

/// Options for the `add` subcommand.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct AddOpts {
    /// File to adopt into the dotfiles
    pub file: PathBuf,
}
