//! Pure dispatchers from a resource body to `System` calls. Each executor
//! takes a borrowed resource identity (for error wrapping) and a
//! `&dyn System`, never touching the OS directly.

pub mod exec;
pub mod file;

use tokio_util::sync::CancellationToken;

use crate::catalog::Body;
use crate::errors::{ResourceError, ResourceIdentity};
use crate::system::System;

/// Dispatch a resource's body to the matching executor. `noop` always
/// succeeds without a single `System` call.
pub async fn apply(
    ctx: &CancellationToken,
    system: &dyn System,
    identity: &ResourceIdentity,
    body: &Body,
) -> Result<(), ResourceError> {
    match body {
        Body::Noop => Ok(()),
        Body::File(f) => file::apply(ctx, system, identity, f).await,
        Body::Exec(e) => exec::apply(ctx, system, identity, e).await,
    }
}
