// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! # neuromorph-observability
//!
//! Logging setup shared by neuromorph tools and tests, with per-crate debug
//! flag support.
//!
//! Library crates only emit `tracing` events with their crate name as the
//! target; installing a subscriber is left to the application.
//!
//! ## Features
//! - `file-logging`: JSON log files with per-run folders and retention (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known neuromorph crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neuromorph-core",
    "neuromorph-io",
    "neuromorph-config",
    "neuromorph-observability",
];
