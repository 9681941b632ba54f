// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A minimal configuration manager: given a declarative catalog of
//! resources (files, directories, symlinks, shell commands) with
//! inter-resource dependencies, brings the host into the described state.
//!
//! The entry point is [`apply::apply`]: build a [`graph::DependencyGraph`]
//! from a [`catalog::Catalog`], then run its resources one at a time,
//! dispatching each to the [`executors`] matching its body, against a
//! [`system::System`] implementation.

pub mod apply;
pub mod catalog;
pub mod errors;
pub mod executors;
pub mod graph;
pub mod logger;
pub mod observability;
pub mod system;
