// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the applier.
//!
//! Message types follow a struct-based pattern with a `Display`
//! implementation for the human-readable line and a [`messages::StructuredLog`]
//! implementation for the machine-readable `tracing` event, so there are no
//! magic format strings scattered through `apply` or the executors.

pub mod messages;
