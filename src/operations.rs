//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the classifier, mutator and
//! sweeper can be unit-tested without touching the real filesystem.
//! Production code uses [`SystemFileSystemOps`]; unit tests use the
//! in-memory `MemoryFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry as reported by [`FileSystemOps::lstat`] or
/// [`FileSystemOps::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symbolic link (only ever returned by `lstat`).
    Symlink,
    /// Socket, fifo, device node, ...
    Other,
}

impl EntryKind {
    fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            Self::Symlink
        } else if ft.is_dir() {
            Self::Dir
        } else if ft.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Abstraction over every filesystem call the engine makes.
///
/// Implement this trait to swap in a fake during unit tests, keeping the
/// decision logic independent of real I/O.  The production implementation
/// is [`SystemFileSystemOps`].
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Non-following stat: a symlink reports [`EntryKind::Symlink`].
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or cannot be queried.
    fn lstat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Following stat: reports the kind of the final link target.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` (or a link target along the way) does not
    /// exist or cannot be queried.
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// Never overwrites: fails if `link` already exists as any entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Remove the file, symlink or empty directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Rename `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create `path` and every missing ancestor, owner-only (`0700`) on Unix.
    ///
    /// # Errors
    ///
    /// Returns an error if a component exists and is not a directory, or
    /// creation fails.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Return the immediate child paths inside `path`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Copy the contents of regular file `from` into `to`, replacing it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Whether `err` means "the path does not exist".
    fn is_not_found(&self, err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::NotFound
    }
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn lstat(&self, path: &Path) -> io::Result<EntryKind> {
        std::fs::symlink_metadata(path).map(|m| EntryKind::from_file_type(m.file_type()))
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        std::fs::metadata(path).map(|m| EntryKind::from_file_type(m.file_type()))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, link)
        }

        #[cfg(windows)]
        {
            if target.is_dir() {
                std::os::windows::fs::symlink_dir(target, link)
            } else {
                std::os::windows::fs::symlink_file(target, link)
            }
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt as _;
            builder.mode(0o700);
        }
        builder.create(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }
}

/// Name of a [`FileSystemOps`] method, used to inject failures into the
/// in-memory fake.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    Lstat,
    Stat,
    ReadLink,
    Symlink,
    Remove,
    Rename,
    CreateDirAll,
    ReadDir,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    File(Vec<u8>),
    Dir,
    Symlink(PathBuf),
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Paths are absolute; `/` always exists.  Build the initial tree with the
/// builder-style methods, then inspect it after the code under test ran.
///
/// # Example
///
/// ```ignore
/// let fs = MemoryFileSystemOps::new()
///     .with_file("/d/.vimrc", "set nu")
///     .with_symlink("/home/u/.vimrc", "/elsewhere")
///     .with_failure(Op::Symlink, "/home/u/.bashrc", io::ErrorKind::PermissionDenied);
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryFileSystemOps {
    nodes: std::sync::Mutex<std::collections::BTreeMap<PathBuf, Node>>,
    failures: std::collections::HashMap<(Op, PathBuf), io::ErrorKind>,
    calls: std::sync::Mutex<Vec<(Op, PathBuf)>>,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MemoryFileSystemOps {
    const MAX_LINK_HOPS: usize = 40;

    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn insert_with_parents(&self, path: &Path, node: Node) {
        let mut nodes = self.lock();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() || ancestor == Path::new("/") {
                continue;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        nodes.insert(path.to_path_buf(), node);
    }

    /// Add a regular file with `content`, creating parent directories.
    #[must_use]
    pub(crate) fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        self.insert_with_parents(path.as_ref(), Node::File(content.as_bytes().to_vec()));
        self
    }

    /// Add an empty directory, creating parent directories.
    #[must_use]
    pub(crate) fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.insert_with_parents(path.as_ref(), Node::Dir);
        self
    }

    /// Add a symbolic link at `path` pointing to `target`.
    #[must_use]
    pub(crate) fn with_symlink(self, path: impl AsRef<Path>, target: impl Into<PathBuf>) -> Self {
        self.insert_with_parents(path.as_ref(), Node::Symlink(target.into()));
        self
    }

    /// Make every call of `op` on `path` fail with `kind`.
    #[must_use]
    pub(crate) fn with_failure(
        mut self,
        op: Op,
        path: impl Into<PathBuf>,
        kind: io::ErrorKind,
    ) -> Self {
        self.failures.insert((op, path.into()), kind);
        self
    }

    /// Current node at `path`, if any.
    pub(crate) fn node(&self, path: impl AsRef<Path>) -> Option<Node> {
        self.lock().get(path.as_ref()).cloned()
    }

    /// Content of the regular file at `path`, if it is one.
    pub(crate) fn file_content(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.node(path) {
            Some(Node::File(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => None,
        }
    }

    /// Number of recorded mutating calls (symlink, remove, rename).
    pub(crate) fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .iter()
            .filter(|(op, _)| matches!(op, Op::Symlink | Op::Remove | Op::Rename))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, std::collections::BTreeMap<PathBuf, Node>> {
        self.nodes.lock().expect("mock nodes poisoned")
    }

    fn enter(&self, op: Op, path: &Path) -> io::Result<()> {
        self.calls
            .lock()
            .expect("mock calls poisoned")
            .push((op, path.to_path_buf()));
        match self.failures.get(&(op, path.to_path_buf())) {
            Some(kind) => Err(io::Error::from(*kind)),
            None => Ok(()),
        }
    }

    fn kind_of(node: &Node) -> EntryKind {
        match node {
            Node::File(_) => EntryKind::File,
            Node::Dir => EntryKind::Dir,
            Node::Symlink(_) => EntryKind::Symlink,
        }
    }

    fn is_dir_at(nodes: &std::collections::BTreeMap<PathBuf, Node>, path: &Path) -> bool {
        path == Path::new("/") || matches!(nodes.get(path), Some(Node::Dir))
    }

    fn parent_is_dir(
        nodes: &std::collections::BTreeMap<PathBuf, Node>,
        path: &Path,
    ) -> io::Result<()> {
        match path.parent() {
            Some(parent) if Self::is_dir_at(nodes, parent) => Ok(()),
            _ => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}

#[cfg(test)]
impl FileSystemOps for MemoryFileSystemOps {
    fn lstat(&self, path: &Path) -> io::Result<EntryKind> {
        self.enter(Op::Lstat, path)?;
        if path == Path::new("/") {
            return Ok(EntryKind::Dir);
        }
        self.lock()
            .get(path)
            .map(Self::kind_of)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        self.enter(Op::Stat, path)?;
        let nodes = self.lock();
        let mut current = path.to_path_buf();
        for _ in 0..Self::MAX_LINK_HOPS {
            if current == Path::new("/") {
                return Ok(EntryKind::Dir);
            }
            match nodes.get(&current) {
                None => return Err(io::Error::from(io::ErrorKind::NotFound)),
                Some(Node::Symlink(target)) => {
                    current = match current.parent() {
                        Some(parent) => parent.join(target),
                        None => target.clone(),
                    };
                }
                Some(node) => return Ok(Self::kind_of(node)),
            }
        }
        Err(io::Error::other("too many levels of symbolic links"))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.enter(Op::ReadLink, path)?;
        match self.lock().get(path) {
            Some(Node::Symlink(target)) => Ok(target.clone()),
            Some(_) => Err(io::Error::from(io::ErrorKind::InvalidInput)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        self.enter(Op::Symlink, link)?;
        let mut nodes = self.lock();
        if link == Path::new("/") || nodes.contains_key(link) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        Self::parent_is_dir(&nodes, link)?;
        nodes.insert(link.to_path_buf(), Node::Symlink(target.to_path_buf()));
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.enter(Op::Remove, path)?;
        let mut nodes = self.lock();
        match nodes.get(path) {
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
            Some(Node::Dir) if nodes.keys().any(|k| k.parent() == Some(path)) => {
                Err(io::Error::from(io::ErrorKind::DirectoryNotEmpty))
            }
            Some(_) => {
                nodes.remove(path);
                Ok(())
            }
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.enter(Op::Rename, from)?;
        let mut nodes = self.lock();
        if !nodes.contains_key(from) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Self::parent_is_dir(&nodes, to)?;
        let moved: Vec<(PathBuf, Node)> = nodes
            .iter()
            .filter(|(k, _)| k.starts_with(from))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (old, node) in moved {
            nodes.remove(&old);
            let suffix = old.strip_prefix(from).map(Path::to_path_buf).unwrap_or_default();
            let new = if suffix.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(suffix)
            };
            nodes.insert(new, node);
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.enter(Op::CreateDirAll, path)?;
        let mut nodes = self.lock();
        let mut ancestors: Vec<&Path> = path.ancestors().collect();
        ancestors.reverse();
        for dir in ancestors {
            if dir.as_os_str().is_empty() || dir == Path::new("/") {
                continue;
            }
            match nodes.get(dir) {
                Some(Node::Dir) => {}
                Some(_) => return Err(io::Error::from(io::ErrorKind::AlreadyExists)),
                None => {
                    nodes.insert(dir.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.enter(Op::ReadDir, path)?;
        let nodes = self.lock();
        if !Self::is_dir_at(&nodes, path) {
            return Err(if nodes.contains_key(path) {
                io::Error::from(io::ErrorKind::NotADirectory)
            } else {
                io::Error::from(io::ErrorKind::NotFound)
            });
        }
        Ok(nodes
            .keys()
            .filter(|k| k.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        let content = match nodes.get(from) {
            Some(Node::File(bytes)) => bytes.clone(),
            Some(_) => return Err(io::Error::from(io::ErrorKind::InvalidInput)),
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
        };
        Self::parent_is_dir(&nodes, to)?;
        nodes.insert(to.to_path_buf(), Node::File(content));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_stat_follows_links_and_lstat_does_not() {
        let fs = MemoryFileSystemOps::new()
            .with_file("/d/a", "x")
            .with_symlink("/h/a", "/d/a");
        assert_eq!(fs.lstat(Path::new("/h/a")).unwrap(), EntryKind::Symlink);
        assert_eq!(fs.stat(Path::new("/h/a")).unwrap(), EntryKind::File);
    }

    #[test]
    fn memory_stat_resolves_relative_targets() {
        let fs = MemoryFileSystemOps::new()
            .with_file("/d/a", "x")
            .with_symlink("/d/link", "a");
        assert_eq!(fs.stat(Path::new("/d/link")).unwrap(), EntryKind::File);
    }

    #[test]
    fn memory_symlink_never_overwrites() {
        let fs = MemoryFileSystemOps::new().with_file("/h/a", "x");
        let err = fs
            .symlink(Path::new("/d/a"), Path::new("/h/a"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn memory_rename_moves_subtree() {
        let fs = MemoryFileSystemOps::new()
            .with_file("/h/dir/inner", "x")
            .with_dir("/b");
        fs.rename(Path::new("/h/dir"), Path::new("/b/dir")).unwrap();
        assert_eq!(fs.file_content("/b/dir/inner").as_deref(), Some("x"));
        assert!(fs.node("/h/dir").is_none());
    }

    #[test]
    fn memory_injected_failure_is_returned() {
        let fs = MemoryFileSystemOps::new().with_failure(
            Op::Lstat,
            "/x",
            io::ErrorKind::PermissionDenied,
        );
        let err = fs.lstat(Path::new("/x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!fs.is_not_found(&err));
    }

    #[test]
    fn system_lstat_reports_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(SystemFileSystemOps.lstat(&file).unwrap(), EntryKind::File);
        assert_eq!(SystemFileSystemOps.lstat(dir.path()).unwrap(), EntryKind::Dir);

        #[cfg(unix)]
        {
            let link = dir.path().join("link");
            SystemFileSystemOps.symlink(&file, &link).unwrap();
            assert_eq!(SystemFileSystemOps.lstat(&link).unwrap(), EntryKind::Symlink);
            assert_eq!(SystemFileSystemOps.stat(&link).unwrap(), EntryKind::File);
        }
    }

    #[test]
    fn system_not_found_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemFileSystemOps
            .lstat(&dir.path().join("missing"))
            .unwrap_err();
        assert!(SystemFileSystemOps.is_not_found(&err));
    }

    #[cfg(unix)]
    #[test]
    fn system_create_dir_all_is_owner_only() {
        use std::os::unix::fs::PermissionsExt as _;
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        SystemFileSystemOps.create_dir_all(&nested).unwrap();
        let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn system_read_dir_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b"), "").unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        let entries = SystemFileSystemOps.read_dir(dir.path()).unwrap();
        assert_eq!(entries, vec![dir.path().join("a"), dir.path().join("b")]);
    }
}
