// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types logged by `apply` and the logger it drives. Each one
//! implements `Display` (the human-readable line) and [`StructuredLog`]
//! (the `tracing` event carrying the same data as fields).
//!
//! ```
//! use catalog_applier::observability::messages::{StructuredLog, apply::ApplyStarted};
//!
//! let msg = ApplyStarted { resource_count: 3 };
//! msg.log();
//! ```

pub mod apply;
pub mod resource;

use tracing::Span;

pub trait StructuredLog {
    /// Emit this event at its appropriate level, with both the
    /// human-readable `Display` line and its structured fields.
    fn log(&self);

    /// Open a span carrying this message's fields as attributes.
    fn span(&self, name: &'static str) -> Span;
}
