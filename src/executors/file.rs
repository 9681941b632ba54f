use tokio_util::sync::CancellationToken;

use crate::catalog::{FileKind, FileResource};
use crate::errors::{ResourceError, ResourceErrorKind, ResourceIdentity};
use crate::system::System;

const DEFAULT_FILE_MODE: u32 = 0o666;
const DEFAULT_DIR_MODE: u32 = 0o777;

/// Apply a `file` resource body, dispatching on its sub-variant.
pub async fn apply(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
) -> Result<(), ResourceError> {
    if file.path.is_empty() {
        return Err(validation(identity, "file path is empty"));
    }

    match &file.kind {
        FileKind::Plain { content } => match content {
            Some(bytes) => apply_plain_with_content(ctx, system, identity, file, bytes).await,
            None => apply_plain_without_content(ctx, system, identity, file).await,
        },
        FileKind::Directory => apply_directory(ctx, system, identity, file).await,
        FileKind::Symlink { target } => apply_symlink(ctx, system, identity, file, target).await,
        FileKind::Absent => apply_absent(ctx, system, identity, file).await,
    }
}

fn validation(identity: &ResourceIdentity, cause: impl Into<String>) -> ResourceError {
    ResourceError::new(identity.clone(), ResourceErrorKind::Validation, cause)
}

fn io_err(identity: &ResourceIdentity, cause: impl std::fmt::Display) -> ResourceError {
    ResourceError::new(identity.clone(), ResourceErrorKind::Io, cause.to_string())
}

fn state_err(identity: &ResourceIdentity, cause: impl Into<String>) -> ResourceError {
    ResourceError::new(identity.clone(), ResourceErrorKind::State, cause)
}

async fn apply_plain_with_content(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
    content: &[u8],
) -> Result<(), ResourceError> {
    let mode = file.mode.unwrap_or(DEFAULT_FILE_MODE);
    system
        .write_file(ctx, &file.path, content, mode)
        .await
        .map_err(|e| io_err(identity, e))
}

async fn apply_plain_without_content(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
) -> Result<(), ResourceError> {
    match system.lstat(ctx, &file.path).await {
        Ok(info) if info.is_regular() => Ok(()),
        Ok(_) => Err(state_err(
            identity,
            format!("{} exists but is not a regular file", file.path),
        )),
        Err(e) if e.is_not_exist() => Err(state_err(
            identity,
            format!("{} does not exist", file.path),
        )),
        Err(e) => Err(io_err(identity, e)),
    }
}

async fn apply_directory(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
) -> Result<(), ResourceError> {
    let mode = file.mode.unwrap_or(DEFAULT_DIR_MODE);
    match system.mkdir(ctx, &file.path, mode).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_exist() => match system.lstat(ctx, &file.path).await {
            Ok(info) if info.is_dir() => Ok(()),
            Ok(_) => Err(state_err(
                identity,
                format!("{} exists but is not a directory", file.path),
            )),
            Err(e) => Err(io_err(identity, e)),
        },
        Err(e) => Err(io_err(identity, e)),
    }
}

async fn apply_symlink(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
    target: &str,
) -> Result<(), ResourceError> {
    match system.symlink(ctx, &file.path, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_exist() => {
            let info = system
                .lstat(ctx, &file.path)
                .await
                .map_err(|e| io_err(identity, e))?;
            if !info.is_symlink() {
                return Err(state_err(
                    identity,
                    format!("{} exists but is not a symlink", file.path),
                ));
            }
            let current = system
                .readlink(ctx, &file.path)
                .await
                .map_err(|e| io_err(identity, e))?;
            if current == target {
                return Ok(());
            }
            system
                .remove(ctx, &file.path)
                .await
                .map_err(|e| retargeting(identity, e))?;
            system
                .symlink(ctx, &file.path, target)
                .await
                .map_err(|e| retargeting(identity, e))
        }
        Err(e) => Err(io_err(identity, e)),
    }
}

fn retargeting(identity: &ResourceIdentity, cause: impl std::fmt::Display) -> ResourceError {
    ResourceError::new(
        identity.clone(),
        ResourceErrorKind::Io,
        format!("retargeting: {cause}"),
    )
}

async fn apply_absent(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    file: &FileResource,
) -> Result<(), ResourceError> {
    match system.remove(ctx, &file.path).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_exist() => Ok(()),
        Err(e) => Err(io_err(identity, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MemorySystem;

    fn identity() -> ResourceIdentity {
        ResourceIdentity {
            id: 1,
            comment: "test".into(),
        }
    }

    fn plain(path: &str, content: Option<&[u8]>) -> FileResource {
        FileResource {
            path: path.to_string(),
            mode: None,
            kind: FileKind::Plain {
                content: content.map(|c| c.to_vec()),
            },
        }
    }

    #[tokio::test]
    async fn empty_path_is_a_validation_error() {
        let system = MemorySystem::new();
        let ctx = CancellationToken::new();
        let file = plain("", Some(b"x"));
        let err = apply(&ctx, &system, &identity(), &file).await.unwrap_err();
        assert_eq!(err.kind, ResourceErrorKind::Validation);
    }

    #[tokio::test]
    async fn plain_with_content_writes_the_file() {
        let system = MemorySystem::new();
        let ctx = CancellationToken::new();
        let file = plain("/a", Some(b"hello"));
        apply(&ctx, &system, &identity(), &file).await.unwrap();
        assert_eq!(system.file_content("/a").unwrap(), b"hello");
    }

    #[tokio::test]
    async fn plain_without_content_requires_existing_regular_file() {
        let system = MemorySystem::new();
        let ctx = CancellationToken::new();
        let file = plain("/missing", None);
        let err = apply(&ctx, &system, &identity(), &file).await.unwrap_err();
        assert_eq!(err.kind, ResourceErrorKind::State);

        system.seed_file("/present", b"x", 0o666);
        let file = plain("/present", None);
        apply(&ctx, &system, &identity(), &file).await.unwrap();
    }

    #[tokio::test]
    async fn directory_is_idempotent() {
        let system = MemorySystem::new();
        let ctx = CancellationToken::new();
        let file = FileResource {
            path: "/d".into(),
            mode: None,
            kind: FileKind::Directory,
        };
        apply(&ctx, &system, &identity(), &file).await.unwrap();
        apply(&ctx, &system, &identity(), &file).await.unwrap();
    }

    #[tokio::test]
    async fn symlink_retargets_when_existing_target_differs() {
        let system = MemorySystem::new();
        system.seed_symlink("/link", "/old");
        let ctx = CancellationToken::new();
        let file = FileResource {
            path: "/link".into(),
            mode: None,
            kind: FileKind::Symlink {
                target: "/new".into(),
            },
        };
        apply(&ctx, &system, &identity(), &file).await.unwrap();
        assert_eq!(
            system.calls(),
            vec![
                "symlink(/new -> /link)",
                "lstat(/link)",
                "readlink(/link)",
                "remove(/link)",
                "symlink(/new -> /link)",
            ]
        );
    }

    #[tokio::test]
    async fn absent_succeeds_whether_or_not_it_existed() {
        let system = MemorySystem::new();
        let ctx = CancellationToken::new();
        let file = FileResource {
            path: "/gone".into(),
            mode: None,
            kind: FileKind::Absent,
        };
        apply(&ctx, &system, &identity(), &file).await.unwrap();

        system.seed_file("/there", b"x", 0o666);
        let file = FileResource {
            path: "/there".into(),
            mode: None,
            kind: FileKind::Absent,
        };
        apply(&ctx, &system, &identity(), &file).await.unwrap();
    }
}
