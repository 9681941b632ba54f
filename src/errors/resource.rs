use std::fmt;

/// Identity of a resource for error reporting — cheap to carry around and
/// clone, unlike the full [`crate::catalog::Resource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub id: u64,
    pub comment: String,
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.comment.is_empty() {
            write!(f, "id={}", self.id)
        } else {
            write!(f, "{} (id={})", self.comment, self.id)
        }
    }
}

/// Which stage of executing a resource produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceErrorKind {
    /// Malformed resource content caught before any `System` call was made
    /// (empty path, non-absolute argv[0], empty env name, …).
    Validation,
    /// A non-process `System` call failed (lstat, mkdir, symlink, …).
    Io,
    /// A condition or main command exited non-zero, or could not be spawned.
    Exec,
    /// The observed filesystem entity differs in kind from the declared
    /// intent (e.g. a `directory` resource found a regular file).
    State,
}

impl fmt::Display for ResourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceErrorKind::Validation => "validation",
            ResourceErrorKind::Io => "io",
            ResourceErrorKind::Exec => "exec",
            ResourceErrorKind::State => "state",
        };
        write!(f, "{s}")
    }
}

/// A single resource's execution failure, wrapped with enough context to be
/// logged and surfaced without re-deriving it from the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceError {
    pub resource: ResourceIdentity,
    pub kind: ResourceErrorKind,
    pub cause: String,
    /// Combined stdout+stderr captured from a failed command, when the
    /// failure came from `Exec`.
    pub output: Option<Vec<u8>>,
}

impl ResourceError {
    pub fn new(
        resource: ResourceIdentity,
        kind: ResourceErrorKind,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            kind,
            cause: cause.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: Vec<u8>) -> Self {
        self.output = Some(output);
        self
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resource {}: {} error: {}",
            self.resource, self.kind, self.cause
        )
    }
}

impl std::error::Error for ResourceError {}
