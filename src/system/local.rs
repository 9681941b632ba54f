use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{CommandSpec, EntryKind, FileInfo, RunError, System, SystemError};

/// The real `System` implementation: every call goes through `tokio::fs` or
/// `tokio::process`. This is what `main.rs` wires up for a live apply run.
pub struct LocalSystem {
    local_root: String,
}

impl LocalSystem {
    pub fn new(local_root: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
        }
    }
}

impl Default for LocalSystem {
    fn default() -> Self {
        Self::new("/")
    }
}

fn to_system_error(path: &str, err: std::io::Error) -> SystemError {
    match err.kind() {
        std::io::ErrorKind::AlreadyExists => SystemError::exists(path),
        std::io::ErrorKind::NotFound => SystemError::not_exist(path),
        _ => SystemError::other(path, err),
    }
}

fn classify(metadata: &std::fs::Metadata) -> EntryKind {
    let ft = metadata.file_type();
    if ft.is_symlink() {
        EntryKind::Symlink
    } else if ft.is_dir() {
        EntryKind::Directory
    } else if ft.is_file() {
        EntryKind::Regular
    } else {
        EntryKind::Other
    }
}

#[async_trait]
impl System for LocalSystem {
    async fn lstat(&self, _ctx: &CancellationToken, path: &str) -> Result<FileInfo, SystemError> {
        let metadata = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| to_system_error(path, e))?;
        Ok(FileInfo {
            kind: classify(&metadata),
            mode: metadata.permissions().mode(),
        })
    }

    async fn mkdir(
        &self,
        _ctx: &CancellationToken,
        path: &str,
        mode: u32,
    ) -> Result<(), SystemError> {
        tokio::fs::create_dir(path)
            .await
            .map_err(|e| to_system_error(path, e))?;
        let permissions = std::fs::Permissions::from_mode(mode);
        tokio::fs::set_permissions(path, permissions)
            .await
            .map_err(|e| to_system_error(path, e))
    }

    async fn symlink(
        &self,
        _ctx: &CancellationToken,
        newname: &str,
        oldname: &str,
    ) -> Result<(), SystemError> {
        let oldname = oldname.to_owned();
        let newname_owned = newname.to_owned();
        tokio::task::spawn_blocking(move || std::os::unix::fs::symlink(&oldname, &newname_owned))
            .await
            .map_err(|e| SystemError::other(newname, e))?
            .map_err(|e| to_system_error(newname, e))
    }

    async fn readlink(&self, _ctx: &CancellationToken, path: &str) -> Result<String, SystemError> {
        let target = tokio::fs::read_link(path)
            .await
            .map_err(|e| to_system_error(path, e))?;
        Ok(target.to_string_lossy().into_owned())
    }

    async fn remove(&self, _ctx: &CancellationToken, path: &str) -> Result<(), SystemError> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) if metadata.file_type().is_dir() => tokio::fs::remove_dir(path)
                .await
                .map_err(|e| to_system_error(path, e)),
            Ok(_) => tokio::fs::remove_file(path)
                .await
                .map_err(|e| to_system_error(path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(to_system_error(path, e)),
        }
    }

    async fn write_file(
        &self,
        _ctx: &CancellationToken,
        path: &str,
        bytes: &[u8],
        mode: u32,
    ) -> Result<(), SystemError> {
        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp_path = parent.join(format!(
            ".{}.tmp-{}",
            Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "catalog-applier".into()),
            std::process::id()
        ));

        tokio::fs::write(&temp_path, bytes)
            .await
            .map_err(|e| to_system_error(path, e))?;
        tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| to_system_error(path, e))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| to_system_error(path, e))
    }

    async fn run(&self, ctx: &CancellationToken, cmd: &CommandSpec) -> Result<Vec<u8>, RunError> {
        let mut command = Command::new(&cmd.path);
        command
            .args(&cmd.args)
            .env_clear()
            .envs(cmd.env.iter().cloned())
            .current_dir(&cmd.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| RunError::Spawn(e.to_string()))?;

        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut stderr = child.stderr.take().expect("piped stderr");

        // Drain both pipes concurrently with the wait, rather than after it:
        // a child that fills its pipe buffer before exiting would otherwise
        // deadlock against a wait() that never returns.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let wait_result = tokio::select! {
            _ = ctx.cancelled() => {
                let _ = child.start_kill();
                None
            }
            status = child.wait() => Some(status),
        };

        let mut output = stdout_task.await.unwrap_or_default();
        output.extend_from_slice(&stderr_task.await.unwrap_or_default());

        match wait_result {
            None => {
                let _ = child.wait().await;
                Err(RunError::Spawn("cancelled".into()))
            }
            Some(status) => {
                let status = status.map_err(|e| RunError::Spawn(e.to_string()))?;
                if status.success() {
                    Ok(output)
                } else {
                    Err(RunError::ExitStatus {
                        code: status.code(),
                        output,
                    })
                }
            }
        }
    }

    fn local_root(&self) -> &str {
        &self.local_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn write_file_then_lstat_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let system = LocalSystem::new(dir.path().to_string_lossy().into_owned());
        let ctx = CancellationToken::new();
        let file = path(&dir, "greeting");

        system.write_file(&ctx, &file, b"hello", 0o640).await.unwrap();
        let info = system.lstat(&ctx, &file).await.unwrap();
        assert!(info.is_regular());
        assert_eq!(tokio::fs::read(&file).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn mkdir_is_reported_as_already_exists_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let system = LocalSystem::default();
        let ctx = CancellationToken::new();
        let sub = path(&dir, "sub");

        system.mkdir(&ctx, &sub, 0o755).await.unwrap();
        let err = system.mkdir(&ctx, &sub, 0o755).await.unwrap_err();
        assert!(err.is_exist());
    }

    #[tokio::test]
    async fn symlink_then_readlink_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let system = LocalSystem::default();
        let ctx = CancellationToken::new();
        let target = path(&dir, "target");
        let link = path(&dir, "link");
        tokio::fs::write(&target, b"x").await.unwrap();

        system.symlink(&ctx, &link, &target).await.unwrap();
        assert_eq!(system.readlink(&ctx, &link).await.unwrap(), target);
        assert!(system.lstat(&ctx, &link).await.unwrap().is_symlink());

        system.remove(&ctx, &link).await.unwrap();
        let err = system.lstat(&ctx, &link).await.unwrap_err();
        assert!(err.is_not_exist());
    }

    #[tokio::test]
    async fn run_captures_combined_stdout_and_stderr() {
        let system = LocalSystem::default();
        let ctx = CancellationToken::new();
        let cmd = CommandSpec {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), "echo out; echo err 1>&2".into()],
            env: vec![],
            dir: "/".into(),
        };

        let output = system.run(&ctx, &cmd).await.unwrap();
        assert_eq!(output, b"out\nerr\n");
    }

    #[tokio::test]
    async fn run_reports_non_zero_exit_with_captured_output() {
        let system = LocalSystem::default();
        let ctx = CancellationToken::new();
        let cmd = CommandSpec {
            path: "/bin/sh".into(),
            args: vec!["-c".into(), "echo boom; exit 7".into()],
            env: vec![],
            dir: "/".into(),
        };

        match system.run(&ctx, &cmd).await.unwrap_err() {
            RunError::ExitStatus { code, output } => {
                assert_eq!(code, Some(7));
                assert_eq!(output, b"boom\n");
            }
            other => panic!("expected ExitStatus, got {other:?}"),
        }
    }
}
