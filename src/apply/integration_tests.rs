use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::apply::apply;
use crate::catalog::{
    ArgvCommand, Body, Catalog, Command, Condition, ExecResource, FileKind, FileResource, Resource,
};
use crate::errors::Error;
use crate::logger::RecordingLogger;
use crate::system::{CommandSpec, FileInfo, MemorySystem, RunError, System, SystemError};

fn exec_resource(id: u64, deps: &[u64], argv: &[&str]) -> Resource {
    Resource {
        id,
        comment: format!("r{id}"),
        dependencies: deps.to_vec(),
        body: Body::Exec(ExecResource {
            command: Command::Argv(ArgvCommand {
                argv: argv.iter().map(|s| s.to_string()).collect(),
                environment: vec![],
                working_directory: String::new(),
            }),
            condition: Condition::Always,
        }),
    }
}

fn noop(id: u64, deps: &[u64]) -> Resource {
    Resource {
        id,
        comment: format!("r{id}"),
        dependencies: deps.to_vec(),
        body: Body::Noop,
    }
}

#[tokio::test]
async fn linear_chain_all_succeed() {
    let system = MemorySystem::new();
    system.expect_run("/bin/echo", vec![], Ok(vec![]));
    let logger = RecordingLogger::new();
    let ctx = CancellationToken::new();

    let r1 = Resource {
        id: 1,
        comment: "r1".into(),
        dependencies: vec![],
        body: Body::File(FileResource {
            path: "/tmp/a".into(),
            mode: None,
            kind: FileKind::Absent,
        }),
    };
    let r2 = exec_resource(2, &[1], &["/bin/echo"]);
    let catalog = Catalog {
        resources: vec![r1, r2],
    };

    apply(&ctx, &system, &logger, &catalog).await.unwrap();

    let applying_lines: Vec<&String> = logger
        .lines()
        .iter()
        .filter(|l| l.starts_with("applying:"))
        .collect();
    assert_eq!(
        applying_lines,
        vec!["applying: r1 (id=1)", "applying: r2 (id=2)"]
    );
}

#[tokio::test]
async fn skip_on_failure() {
    let system = MemorySystem::new();
    system.deny_write("/root/forbidden");
    system.expect_run("/bin/echo", vec![], Ok(vec![]));
    let logger = RecordingLogger::new();
    let ctx = CancellationToken::new();

    let r1 = Resource {
        id: 1,
        comment: "r1".into(),
        dependencies: vec![],
        body: Body::File(FileResource {
            path: "/root/forbidden".into(),
            mode: None,
            kind: FileKind::Plain {
                content: Some(b"x".to_vec()),
            },
        }),
    };
    let r2 = exec_resource(2, &[1], &["/bin/echo"]);
    let r3 = noop(3, &[2]);
    let catalog = Catalog {
        resources: vec![r1, r2, r3],
    };

    let err = apply(&ctx, &system, &logger, &catalog).await.unwrap_err();
    assert_eq!(
        err,
        Error::NotClean {
            failed: 1,
            skipped: 2
        }
    );

    assert!(logger
        .lines()
        .iter()
        .any(|l| l == "skipping due to failure of r1 (id=1): r2 (id=2), r3 (id=3)"));
    // r2's /bin/echo was never run.
    assert!(system.calls().iter().all(|c| !c.starts_with("run(")));
}

#[tokio::test]
async fn exec_condition_unless_skips_main_command() {
    let system = MemorySystem::new();
    system.expect_run("/bin/true", vec![], Ok(vec![]));
    let logger = RecordingLogger::new();
    let ctx = CancellationToken::new();

    let r1 = Resource {
        id: 1,
        comment: String::new(),
        dependencies: vec![],
        body: Body::Exec(ExecResource {
            command: Command::Argv(ArgvCommand {
                argv: vec!["/bin/false".into()],
                environment: vec![],
                working_directory: String::new(),
            }),
            condition: Condition::Unless(Command::Argv(ArgvCommand {
                argv: vec!["/bin/true".into()],
                environment: vec![],
                working_directory: String::new(),
            })),
        }),
    };
    let catalog = Catalog { resources: vec![r1] };

    apply(&ctx, &system, &logger, &catalog).await.unwrap();
    assert_eq!(system.calls(), vec!["run(/bin/true [])"]);
}

#[tokio::test]
async fn symlink_retarget_goes_through_expected_call_sequence() {
    let system = MemorySystem::new();
    system.seed_symlink("/tmp/link", "/old");
    let logger = RecordingLogger::new();
    let ctx = CancellationToken::new();

    let r1 = Resource {
        id: 1,
        comment: String::new(),
        dependencies: vec![],
        body: Body::File(FileResource {
            path: "/tmp/link".into(),
            mode: None,
            kind: FileKind::Symlink {
                target: "/new".into(),
            },
        }),
    };
    let catalog = Catalog { resources: vec![r1] };

    apply(&ctx, &system, &logger, &catalog).await.unwrap();
    assert_eq!(
        system.calls(),
        vec![
            "symlink(/new -> /tmp/link)",
            "lstat(/tmp/link)",
            "readlink(/tmp/link)",
            "remove(/tmp/link)",
            "symlink(/new -> /tmp/link)",
        ]
    );
}

#[tokio::test]
async fn cycle_is_a_construction_error_and_touches_no_system_call() {
    let system = MemorySystem::new();
    let logger = RecordingLogger::new();
    let ctx = CancellationToken::new();

    let catalog = Catalog {
        resources: vec![noop(1, &[2]), noop(2, &[1])],
    };

    let err = apply(&ctx, &system, &logger, &catalog).await.unwrap_err();
    assert!(matches!(err, Error::Construction(_)));
    assert!(system.calls().is_empty());
}

/// Wraps a `MemorySystem` and cancels the shared token right after its
/// first `System` call completes, simulating an external cancellation
/// firing while the first resource is still in flight.
struct CancelAfterFirstCall {
    inner: MemorySystem,
    token: CancellationToken,
}

#[async_trait]
impl System for CancelAfterFirstCall {
    async fn lstat(&self, ctx: &CancellationToken, path: &str) -> Result<FileInfo, SystemError> {
        let result = self.inner.lstat(ctx, path).await;
        self.token.cancel();
        result
    }

    async fn mkdir(
        &self,
        ctx: &CancellationToken,
        path: &str,
        mode: u32,
    ) -> Result<(), SystemError> {
        let result = self.inner.mkdir(ctx, path, mode).await;
        self.token.cancel();
        result
    }

    async fn symlink(
        &self,
        ctx: &CancellationToken,
        newname: &str,
        oldname: &str,
    ) -> Result<(), SystemError> {
        let result = self.inner.symlink(ctx, newname, oldname).await;
        self.token.cancel();
        result
    }

    async fn readlink(&self, ctx: &CancellationToken, path: &str) -> Result<String, SystemError> {
        self.inner.readlink(ctx, path).await
    }

    async fn remove(&self, ctx: &CancellationToken, path: &str) -> Result<(), SystemError> {
        let result = self.inner.remove(ctx, path).await;
        self.token.cancel();
        result
    }

    async fn write_file(
        &self,
        ctx: &CancellationToken,
        path: &str,
        bytes: &[u8],
        mode: u32,
    ) -> Result<(), SystemError> {
        let result = self.inner.write_file(ctx, path, bytes, mode).await;
        self.token.cancel();
        result
    }

    async fn run(&self, ctx: &CancellationToken, cmd: &CommandSpec) -> Result<Vec<u8>, RunError> {
        let result = self.inner.run(ctx, cmd).await;
        self.token.cancel();
        result
    }

    fn local_root(&self) -> &str {
        self.inner.local_root()
    }
}

#[tokio::test]
async fn cancellation_stops_the_loop_after_the_in_flight_resource() {
    let ctx = CancellationToken::new();
    let inner = MemorySystem::new();
    for path in ["/a", "/b", "/c", "/d", "/e"] {
        inner.seed_file(path, b"x", 0o666);
    }
    let system = CancelAfterFirstCall {
        inner,
        token: ctx.clone(),
    };
    let logger = RecordingLogger::new();

    let catalog = Catalog {
        resources: (1..=5u64)
            .map(|id| Resource {
                id,
                comment: format!("r{id}"),
                dependencies: vec![],
                body: Body::File(FileResource {
                    path: format!("/{}", (b'a' + (id - 1) as u8) as char),
                    mode: None,
                    kind: FileKind::Plain { content: None },
                }),
            })
            .collect(),
    };

    let err = apply(&ctx, &system, &logger, &catalog).await.unwrap_err();
    assert_eq!(err, Error::Cancelled);

    let applying_count = logger
        .lines()
        .iter()
        .filter(|l| l.starts_with("applying:"))
        .count();
    assert_eq!(applying_count, 1, "only the first resource should start");
}
