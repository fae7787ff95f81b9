//! Destination state classification.
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::operations::{EntryKind, FileSystemOps};

/// What currently occupies a destination path.
///
/// Always computed fresh from the filesystem; never cached.
///
/// # Examples
///
/// ```
/// use dotlink::resources::state::{DestinationState, InstallDecision};
///
/// let state = DestinationState::Other;
/// assert_eq!(
///     state.decision(),
///     InstallDecision { needs_symlink: true, needs_backup: true }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationState {
    /// Nothing at the destination.
    Absent,
    /// A symlink whose target is exactly the desired source.
    CorrectSymlink(PathBuf),
    /// A symlink pointing anywhere else.
    WrongSymlink(PathBuf),
    /// Real content: a file, directory or special file.
    Other,
}

/// Work needed to bring one destination into the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallDecision {
    /// A new link must be created.
    pub needs_symlink: bool,
    /// The destination holds real content that must be moved aside first.
    pub needs_backup: bool,
}

impl DestinationState {
    /// Map the state to the mutations it requires.
    ///
    /// Only real content is backed up; a wrong symlink is deleted in place.
    #[must_use]
    pub const fn decision(&self) -> InstallDecision {
        match self {
            Self::Absent | Self::WrongSymlink(_) => InstallDecision {
                needs_symlink: true,
                needs_backup: false,
            },
            Self::CorrectSymlink(_) => InstallDecision {
                needs_symlink: false,
                needs_backup: false,
            },
            Self::Other => InstallDecision {
                needs_symlink: true,
                needs_backup: true,
            },
        }
    }
}

/// Classify `destination` against the desired link target `source`.
///
/// Uses a non-following stat.  The link target is compared to `source`
/// byte for byte, without any normalisation.
///
/// # Errors
///
/// Returns [`LinkError::Io`] for any failure other than "not found".
pub fn inspect(
    fs: &dyn FileSystemOps,
    source: &Path,
    destination: &Path,
) -> Result<DestinationState, LinkError> {
    let kind = match fs.lstat(destination) {
        Ok(kind) => kind,
        Err(e) if fs.is_not_found(&e) => return Ok(DestinationState::Absent),
        Err(e) => return Err(LinkError::io("lstat", destination, e)),
    };

    if kind != EntryKind::Symlink {
        return Ok(DestinationState::Other);
    }

    let target = fs
        .read_link(destination)
        .map_err(|e| LinkError::io("readlink", destination, e))?;

    if target.as_os_str() == source.as_os_str() {
        Ok(DestinationState::CorrectSymlink(target))
    } else {
        Ok(DestinationState::WrongSymlink(target))
    }
}
