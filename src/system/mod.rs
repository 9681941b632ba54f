//! The injected OS abstraction. Every filesystem or process call the
//! executors make goes through this trait, never directly through
//! `std::fs` or `tokio::process`, so that tests can swap in
//! [`memory::MemorySystem`].

pub mod local;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

pub use local::LocalSystem;
pub use memory::MemorySystem;

/// The kind of filesystem entity `lstat` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: EntryKind,
    pub mode: u32,
}

impl FileInfo {
    pub fn is_regular(&self) -> bool {
        self.kind == EntryKind::Regular
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Error from a non-process `System` call. `is_exist`/`is_not_exist` are
/// exposed as predicates rather than variants a caller matches on, so
/// callers can ask "did this already exist?" without caring about the
/// underlying `io::ErrorKind`.
#[derive(Debug, Clone)]
pub struct SystemError {
    path: String,
    kind: SystemErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemErrorKind {
    Exists,
    NotExist,
    Other,
}

impl SystemError {
    pub fn exists(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: SystemErrorKind::Exists,
        }
    }

    pub fn not_exist(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: SystemErrorKind::NotExist,
        }
    }

    pub fn other(path: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            kind: SystemErrorKind::Other,
        }
        .with_cause(cause)
    }

    fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.path = format!("{}: {}", self.path, cause);
        self
    }

    pub fn is_exist(&self) -> bool {
        self.kind == SystemErrorKind::Exists
    }

    pub fn is_not_exist(&self) -> bool {
        self.kind == SystemErrorKind::NotExist
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::error::Error for SystemError {}

/// A command descriptor ready for `System::run`, produced by
/// `executors::exec::build_command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub path: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub dir: String,
}

/// Error from `System::run`. Distinguishes a clean non-zero exit from a
/// process that could never be started.
#[derive(Debug, Clone)]
pub enum RunError {
    ExitStatus { code: Option<i32>, output: Vec<u8> },
    Spawn(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::ExitStatus { code, .. } => match code {
                Some(c) => write!(f, "command exited with status {c}"),
                None => write!(f, "command terminated by signal"),
            },
            RunError::Spawn(msg) => write!(f, "failed to spawn command: {msg}"),
        }
    }
}

impl std::error::Error for RunError {}

/// The injected OS abstraction. All methods take an explicit cancellation
/// token rather than relying on ambient thread state.
#[async_trait]
pub trait System: Send + Sync {
    async fn lstat(&self, ctx: &CancellationToken, path: &str) -> Result<FileInfo, SystemError>;
    async fn mkdir(&self, ctx: &CancellationToken, path: &str, mode: u32)
        -> Result<(), SystemError>;
    async fn symlink(
        &self,
        ctx: &CancellationToken,
        newname: &str,
        oldname: &str,
    ) -> Result<(), SystemError>;
    async fn readlink(&self, ctx: &CancellationToken, path: &str) -> Result<String, SystemError>;
    async fn remove(&self, ctx: &CancellationToken, path: &str) -> Result<(), SystemError>;
    async fn write_file(
        &self,
        ctx: &CancellationToken,
        path: &str,
        bytes: &[u8],
        mode: u32,
    ) -> Result<(), SystemError>;
    async fn run(&self, ctx: &CancellationToken, cmd: &CommandSpec) -> Result<Vec<u8>, RunError>;

    /// Absolute default working directory used when a command omits one.
    fn local_root(&self) -> &str;
}
