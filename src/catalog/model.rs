use serde::Deserialize;

/// One unit of desired host state.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub id: u64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub dependencies: Vec<u64>,
    pub body: Body,
}

impl Resource {
    /// `dependencies` with duplicates collapsed, preserving first occurrence
    /// order.
    pub fn unique_dependencies(&self) -> Vec<u64> {
        let mut seen = std::collections::HashSet::new();
        self.dependencies
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// A resource's effect, exactly one of `noop | file | exec`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    Noop,
    File(FileResource),
    Exec(ExecResource),
}

/// The `file` resource body: a path plus a tagged sub-variant describing
/// what should exist there.
#[derive(Debug, Clone, Deserialize)]
pub struct FileResource {
    pub path: String,
    /// Mode bits. When absent, `executors::file` falls back to its
    /// historical defaults (0666 plain, 0777 directory).
    #[serde(default)]
    pub mode: Option<u32>,
    #[serde(flatten)]
    pub kind: FileKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "file_kind", rename_all = "snake_case")]
pub enum FileKind {
    Plain {
        #[serde(default, with = "content_as_bytes", rename = "content")]
        content: Option<Vec<u8>>,
    },
    Directory,
    Symlink {
        target: String,
    },
    Absent,
}

/// `content` is authored as a UTF-8 string in catalog YAML but stored
/// internally as raw bytes, so non-UTF-8 file content can round-trip once a
/// binary-capable decoder replaces this YAML stand-in.
mod content_as_bytes {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        Ok(opt.map(String::into_bytes))
    }
}

/// The `exec` resource body: a command to run, gated by a condition.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecResource {
    pub command: Command,
    #[serde(default)]
    pub condition: Condition,
}

/// Tagged variant; `argv` is the only command kind this crate builds today.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Argv(ArgvCommand),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArgvCommand {
    pub argv: Vec<String>,
    /// `"name=value"` pairs, in order. The child process gets exactly these
    /// variables; the ambient environment is never inherited.
    #[serde(default)]
    pub environment: Vec<String>,
    /// Absolute when non-empty; empty means "use the system's configured
    /// local root".
    #[serde(default)]
    pub working_directory: String,
}

/// Tagged on `condition_type` rather than `type`: `OnlyIf`/`Unless` flatten a
/// nested [`Command`], which is itself tagged on `type`, and the two tags
/// would otherwise collide in the same YAML map.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "condition_type", rename_all = "snake_case")]
pub enum Condition {
    Always,
    OnlyIf(Command),
    Unless(Command),
    FileAbsent { path: String },
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Always
    }
}

/// An ordered sequence of resources. Catalog order is not execution order —
/// that is derived from the dependency graph built over it.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Catalog {
    pub resources: Vec<Resource>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
