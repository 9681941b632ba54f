// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Lifecycle events for a whole `apply` run.

use std::fmt::{Display, Formatter};
use tracing::Span;

use super::StructuredLog;

pub struct ApplyStarted {
    pub resource_count: usize,
}

impl Display for ApplyStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "applying catalog of {} resource(s)", self.resource_count)
    }
}

impl StructuredLog for ApplyStarted {
    fn log(&self) {
        tracing::info!(resource_count = self.resource_count, "{}", self);
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::info_span!("apply", span_name = name, resource_count = self.resource_count)
    }
}

pub struct ApplyCompleted {
    pub resource_count: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Display for ApplyCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.failed == 0 && self.skipped == 0 {
            write!(f, "apply completed: {} resource(s) applied", self.resource_count)
        } else {
            write!(
                f,
                "apply completed: {} resource(s), {} failed, {} skipped",
                self.resource_count, self.failed, self.skipped
            )
        }
    }
}

impl StructuredLog for ApplyCompleted {
    fn log(&self) {
        tracing::info!(
            resource_count = self.resource_count,
            failed = self.failed,
            skipped = self.skipped,
            "{}", self
        );
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::info_span!(
            "apply_completed",
            span_name = name,
            resource_count = self.resource_count,
            failed = self.failed,
            skipped = self.skipped,
        )
    }
}

pub struct ConstructionFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ConstructionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "catalog construction failed: {}", self.error)
    }
}

impl StructuredLog for ConstructionFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::error_span!("construction_failed", span_name = name, error = %self.error)
    }
}

pub struct ApplyCancelled {
    pub applied: usize,
    pub remaining: usize,
}

impl Display for ApplyCancelled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "apply cancelled after {} resource(s); {} never started",
            self.applied, self.remaining
        )
    }
}

impl StructuredLog for ApplyCancelled {
    fn log(&self) {
        tracing::warn!(applied = self.applied, remaining = self.remaining, "{}", self);
    }

    fn span(&self, name: &'static str) -> Span {
        tracing::warn_span!(
            "apply_cancelled",
            span_name = name,
            applied = self.applied,
            remaining = self.remaining,
        )
    }
}
