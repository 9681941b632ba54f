// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-resource events emitted by the applier driver loop.

use std::fmt::{Display, Formatter};
use tracing::Span;

use crate::errors::{ResourceError, ResourceIdentity};

use super::StructuredLog;

/// Logged right before a resource's executor is dispatched.
pub struct ResourceApplying<'a> {
    pub resource: &'a ResourceIdentity,
}

impl Display for ResourceApplying<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "applying: {}", self.resource)
    }
}

impl StructuredLog for ResourceApplying<'_> {
    fn log(&self) {
        tracing::info!(
            resource_id = self.resource.id,
            comment = %self.resource.comment,
            "{}", self
        );
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::info_span!(
            "resource_applying",
            span_name = name,
            resource_id = self.resource.id,
        )
    }
}

pub struct ResourceSucceeded<'a> {
    pub resource: &'a ResourceIdentity,
}

impl Display for ResourceSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "applied: {}", self.resource)
    }
}

impl StructuredLog for ResourceSucceeded<'_> {
    fn log(&self) {
        tracing::info!(resource_id = self.resource.id, "{}", self);
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::info_span!(
            "resource_succeeded",
            span_name = name,
            resource_id = self.resource.id,
        )
    }
}

/// Logged once per failed resource, via `Logger::error`, carrying the
/// wrapped error (identity, cause, captured output).
pub struct ResourceFailed<'a> {
    pub error: &'a ResourceError,
}

impl Display for ResourceFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StructuredLog for ResourceFailed<'_> {
    fn log(&self) {
        tracing::error!(
            resource_id = self.error.resource.id,
            kind = %self.error.kind,
            "{}", self
        );
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::error_span!(
            "resource_failed",
            span_name = name,
            resource_id = self.error.resource.id,
            kind = %self.error.kind,
        )
    }
}

/// Logged once per failure, naming every freshly skipped descendant
/// together rather than emitting one line per descendant.
pub struct ResourceSkipped<'a> {
    pub parent: &'a ResourceIdentity,
    pub descendants: &'a [ResourceIdentity],
}

impl Display for ResourceSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let names = self
            .descendants
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "skipping due to failure of {}: {}", self.parent, names)
    }
}

impl StructuredLog for ResourceSkipped<'_> {
    fn log(&self) {
        tracing::info!(
            parent_id = self.parent.id,
            skipped_count = self.descendants.len(),
            "{}", self
        );
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::info_span!(
            "resource_skipped",
            span_name = name,
            parent_id = self.parent.id,
            skipped_count = self.descendants.len(),
        )
    }
}
