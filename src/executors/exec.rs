use tokio_util::sync::CancellationToken;

use crate::catalog::{ArgvCommand, Command, Condition, ExecResource};
use crate::errors::{ResourceError, ResourceErrorKind, ResourceIdentity};
use crate::system::{CommandSpec, RunError, System};

/// Apply an `exec` resource body: evaluate the condition, then optionally
/// run the main command.
pub async fn apply(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    exec: &ExecResource,
) -> Result<(), ResourceError> {
    if !evaluate_condition(ctx, system, identity, &exec.condition).await? {
        return Ok(());
    }

    let spec = build_command(system, identity, &exec.command)?;
    run_or_wrap(ctx, system, identity, &spec).await?;
    Ok(())
}

/// Returns `Ok(true)` when the main command should proceed, `Ok(false)` when
/// the condition says to skip silently.
async fn evaluate_condition(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    condition: &Condition,
) -> Result<bool, ResourceError> {
    match condition {
        Condition::Always => Ok(true),
        Condition::OnlyIf(cmd) => {
            let spec = build_command(system, identity, cmd)?;
            match system.run(ctx, &spec).await {
                Ok(_) => Ok(true),
                Err(RunError::ExitStatus { .. }) => Ok(false),
                Err(e @ RunError::Spawn(_)) => Err(exec_err(identity, e, None)),
            }
        }
        Condition::Unless(cmd) => {
            let spec = build_command(system, identity, cmd)?;
            match system.run(ctx, &spec).await {
                Ok(_) => Ok(false),
                Err(RunError::ExitStatus { .. }) => Ok(true),
                Err(e @ RunError::Spawn(_)) => Err(exec_err(identity, e, None)),
            }
        }
        Condition::FileAbsent { path } => match system.lstat(ctx, path).await {
            Ok(_) => Ok(false),
            Err(e) if e.is_not_exist() => Ok(true),
            Err(e) => Err(ResourceError::new(
                identity.clone(),
                ResourceErrorKind::Io,
                e.to_string(),
            )),
        },
    }
}

async fn run_or_wrap(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    spec: &CommandSpec,
) -> Result<Vec<u8>, ResourceError> {
    system.run(ctx, spec).await.map_err(|e| match &e {
        RunError::ExitStatus { output, .. } => exec_err(identity, e.clone(), Some(output.clone())),
        RunError::Spawn(_) => exec_err(identity, e, None),
    })
}

fn exec_err(identity: &ResourceIdentity, cause: RunError, output: Option<Vec<u8>>) -> ResourceError {
    let error = ResourceError::new(identity.clone(), ResourceErrorKind::Exec, cause.to_string());
    match output {
        Some(bytes) => error.with_output(bytes),
        None => error,
    }
}

/// Build a `CommandSpec` from a catalog `Command`, validating per §4.4.1.
pub fn build_command(
    system: &dyn System,
    identity: &ResourceIdentity,
    command: &Command,
) -> Result<CommandSpec, ResourceError> {
    let Command::Argv(ArgvCommand {
        argv,
        environment,
        working_directory,
    }) = command;

    let path = argv
        .first()
        .ok_or_else(|| validation(identity, "argv must not be empty"))?;
    if !path.starts_with('/') {
        return Err(validation(
            identity,
            format!("argv[0] must be an absolute path, got {path}"),
        ));
    }

    let mut env = Vec::with_capacity(environment.len());
    for pair in environment {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| validation(identity, format!("malformed environment pair: {pair}")))?;
        if name.is_empty() {
            return Err(validation(identity, "environment variable name is empty"));
        }
        env.push((name.to_string(), value.to_string()));
    }

    let dir = if working_directory.is_empty() {
        system.local_root().to_string()
    } else if !working_directory.starts_with('/') {
        return Err(validation(
            identity,
            format!("working_directory must be absolute, got {working_directory}"),
        ));
    } else {
        working_directory.clone()
    };

    Ok(CommandSpec {
        path: path.clone(),
        args: argv[1..].to_vec(),
        env,
        dir,
    })
}

fn validation(identity: &ResourceIdentity, cause: impl Into<String>) -> ResourceError {
    ResourceError::new(identity.clone(), ResourceErrorKind::Validation, cause)
}
