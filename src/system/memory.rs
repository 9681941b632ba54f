use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{CommandSpec, EntryKind, FileInfo, RunError, System, SystemError};

#[derive(Debug, Clone)]
enum Entry {
    Regular { content: Vec<u8>, mode: u32 },
    Directory { mode: u32 },
    Symlink { target: String },
}

struct State {
    entries: HashMap<String, Entry>,
    calls: Vec<String>,
    command_results: HashMap<(String, Vec<String>), Result<Vec<u8>, RunError>>,
    denied_writes: std::collections::HashSet<String>,
}

/// An in-memory, non-OS-touching `System` implementation for fast executor
/// tests. Every call is recorded (`calls()`) so tests can assert on the
/// exact sequence the executors issued.
pub struct MemorySystem {
    state: Mutex<State>,
    local_root: String,
}

impl MemorySystem {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                calls: Vec::new(),
                command_results: HashMap::new(),
                denied_writes: std::collections::HashSet::new(),
            }),
            local_root: "/".to_string(),
        }
    }

    /// Pre-seed a regular file at `path`.
    pub fn seed_file(&self, path: impl Into<String>, content: impl Into<Vec<u8>>, mode: u32) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(
            path.into(),
            Entry::Regular {
                content: content.into(),
                mode,
            },
        );
    }

    pub fn seed_directory(&self, path: impl Into<String>, mode: u32) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(path.into(), Entry::Directory { mode });
    }

    /// Make `write_file` to `path` fail with a permission-denied-style
    /// error, to exercise skip-on-failure in tests.
    pub fn deny_write(&self, path: impl Into<String>) {
        self.state.lock().unwrap().denied_writes.insert(path.into());
    }

    pub fn seed_symlink(&self, path: impl Into<String>, target: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(
            path.into(),
            Entry::Symlink {
                target: target.into(),
            },
        );
    }

    /// Program the result `System::run` returns for an exact `(path, args)`
    /// pair. Unprogrammed commands fail with `RunError::Spawn`.
    pub fn expect_run(
        &self,
        path: impl Into<String>,
        args: Vec<String>,
        result: Result<Vec<u8>, RunError>,
    ) {
        let mut state = self.state.lock().unwrap();
        state.command_results.insert((path.into(), args), result);
    }

    /// The full call log, in issue order, for assertions like an exact
    /// symlink-retarget call sequence.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn file_content(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().entries.get(path) {
            Some(Entry::Regular { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

impl Default for MemorySystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl System for MemorySystem {
    async fn lstat(&self, _ctx: &CancellationToken, path: &str) -> Result<FileInfo, SystemError> {
        self.record(format!("lstat({path})"));
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(Entry::Regular { mode, .. }) => Ok(FileInfo {
                kind: EntryKind::Regular,
                mode: *mode,
            }),
            Some(Entry::Directory { mode }) => Ok(FileInfo {
                kind: EntryKind::Directory,
                mode: *mode,
            }),
            Some(Entry::Symlink { .. }) => Ok(FileInfo {
                kind: EntryKind::Symlink,
                mode: 0o777,
            }),
            None => Err(SystemError::not_exist(path)),
        }
    }

    async fn mkdir(
        &self,
        _ctx: &CancellationToken,
        path: &str,
        mode: u32,
    ) -> Result<(), SystemError> {
        self.record(format!("mkdir({path}, {mode:o})"));
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(path) {
            return Err(SystemError::exists(path));
        }
        state.entries.insert(path.to_string(), Entry::Directory { mode });
        Ok(())
    }

    async fn symlink(
        &self,
        _ctx: &CancellationToken,
        newname: &str,
        oldname: &str,
    ) -> Result<(), SystemError> {
        self.record(format!("symlink({oldname} -> {newname})"));
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(newname) {
            return Err(SystemError::exists(newname));
        }
        state.entries.insert(
            newname.to_string(),
            Entry::Symlink {
                target: oldname.to_string(),
            },
        );
        Ok(())
    }

    async fn readlink(&self, _ctx: &CancellationToken, path: &str) -> Result<String, SystemError> {
        self.record(format!("readlink({path})"));
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(Entry::Symlink { target }) => Ok(target.clone()),
            Some(_) => Err(SystemError::other(path, "not a symlink")),
            None => Err(SystemError::not_exist(path)),
        }
    }

    async fn remove(&self, _ctx: &CancellationToken, path: &str) -> Result<(), SystemError> {
        self.record(format!("remove({path})"));
        let mut state = self.state.lock().unwrap();
        state.entries.remove(path);
        Ok(())
    }

    async fn write_file(
        &self,
        _ctx: &CancellationToken,
        path: &str,
        bytes: &[u8],
        mode: u32,
    ) -> Result<(), SystemError> {
        self.record(format!("write_file({path}, {} bytes)", bytes.len()));
        let mut state = self.state.lock().unwrap();
        if state.denied_writes.contains(path) {
            return Err(SystemError::other(path, "permission denied"));
        }
        state.entries.insert(
            path.to_string(),
            Entry::Regular {
                content: bytes.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    async fn run(&self, _ctx: &CancellationToken, cmd: &CommandSpec) -> Result<Vec<u8>, RunError> {
        self.record(format!("run({} {:?})", cmd.path, cmd.args));
        let state = self.state.lock().unwrap();
        state
            .command_results
            .get(&(cmd.path.clone(), cmd.args.clone()))
            .cloned()
            .unwrap_or_else(|| Err(RunError::Spawn(format!("unprogrammed command: {}", cmd.path))))
    }

    fn local_root(&self) -> &str {
        &self.local_root
    }
}
