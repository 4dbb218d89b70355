// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neuromorph.toml`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuromorphConfig {
    pub build: BuildConfig,
    pub readers: ReadersConfig,
    pub logging: LoggingConfig,
}

/// What the tree builder does when a mitochondrial sample is anchored to a
/// neurite section that does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MitoAnchorPolicy {
    /// Abort the whole build.
    #[default]
    FailFast,
    /// Return the neurite forest without mitochondria.
    DropMitochondria,
}

impl fmt::Display for MitoAnchorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MitoAnchorPolicy::FailFast => write!(f, "fail_fast"),
            MitoAnchorPolicy::DropMitochondria => write!(f, "drop_mitochondria"),
        }
    }
}

impl FromStr for MitoAnchorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" | "failfast" => Ok(MitoAnchorPolicy::FailFast),
            "drop_mitochondria" | "drop" => Ok(MitoAnchorPolicy::DropMitochondria),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown mitochondria anchor policy '{}'",
                other
            ))),
        }
    }
}

/// Tree builder configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mito_anchor_policy: MitoAnchorPolicy,
    /// Reorder root sections axon first, then basal, then apical dendrites
    pub nrn_order: bool,
}

/// Format reader configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadersConfig {
    /// Reject SWC files whose soma samples start more than one chain
    pub swc_strict_soma: bool,
}

impl Default for ReadersConfig {
    fn default() -> Self {
        Self {
            swc_strict_soma: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown log format '{}'",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
    /// Crates that log at debug level regardless of `level`
    pub debug_crates: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            debug_crates: Vec::new(),
        }
    }
}

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
