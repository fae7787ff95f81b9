//! Destination classification and link mutation primitives.
//!
//! Everything here talks to the filesystem only through
//! [`FileSystemOps`](crate::operations::FileSystemOps) and reports through
//! an explicit [`Log`](crate::logging::Log), so each piece can be driven
//! against the in-memory fake in tests.
pub mod cleaner;
pub mod linker;
pub mod state;

pub use cleaner::Cleaner;
pub use linker::Linker;
pub use state::{DestinationState, InstallDecision};
