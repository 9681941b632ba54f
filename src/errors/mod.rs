// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the catalog applier.
//!
//! [`Error`] is what `apply` itself can return: a malformed catalog
//! (`Construction`), an external cancellation, an internal consistency bug,
//! or the summary `NotClean` returned once a full pass has at least one
//! failed or skipped resource. A single resource's failure is a
//! [`ResourceError`], carrying the offending resource's `{id, comment}`; it
//! is logged as it happens and folded into the `NotClean` tally rather than
//! aborting or propagating as an `Error` itself.

mod construction;
mod resource;

pub use construction::ConstructionError;
pub use resource::{ResourceError, ResourceErrorKind, ResourceIdentity};

use thiserror::Error;

/// Top-level error returned by [`crate::apply::apply`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The catalog could not be turned into a dependency graph.
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// The cancellation token fired before (or during) the loop.
    #[error("apply cancelled")]
    Cancelled,

    /// An internal consistency error — e.g. `ready()` returned empty while
    /// the graph was not yet `done()`. Indicates a bug in the graph or
    /// driver, not a bad catalog.
    #[error("internal error: {0}")]
    Internal(String),

    /// Summary error returned when at least one resource failed or was
    /// skipped as a result. Never returned mid-loop — only as the final
    /// result of a full `apply` pass.
    #[error("{failed} resource(s) failed, {skipped} skipped as a result")]
    NotClean { failed: usize, skipped: usize },
}
