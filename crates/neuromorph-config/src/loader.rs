// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base values, missing keys take defaults)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{validate_config, ConfigError, ConfigResult, NeuromorphConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "neuromorph.toml";

/// Environment variable naming an explicit config file
const CONFIG_PATH_VAR: &str = "NEUROMORPH_CONFIG_PATH";

/// Find the neuromorph configuration file
///
/// Search order:
/// 1. `NEUROMORPH_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neuromorph.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_VAR) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_VAR,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_VAR
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found, contains invalid TOML, an
/// override has an unparsable value, or validation fails
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuromorphConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let config: NeuromorphConfig = toml::from_str(&content)?;
    finish(config, cli_args)
}

/// Like [`load_config`], but starts from defaults when no file can be found
///
/// # Errors
///
/// Same as [`load_config`], except that a missing file is not an error
pub fn load_config_or_default(
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuromorphConfig> {
    match find_config_file() {
        Ok(path) => load_config(Some(&path), cli_args),
        Err(ConfigError::FileNotFound(_)) => finish(NeuromorphConfig::default(), cli_args),
        Err(e) => Err(e),
    }
}

fn finish(
    mut config: NeuromorphConfig,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeuromorphConfig> {
    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }
    validate_config(&config)?;
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROMORPH_MITO_ANCHOR_POLICY` -> `build.mito_anchor_policy`
/// - `NEUROMORPH_NRN_ORDER` -> `build.nrn_order`
/// - `NEUROMORPH_SWC_STRICT_SOMA` -> `readers.swc_strict_soma`
/// - `NEUROMORPH_LOG_LEVEL` -> `logging.level`
/// - `NEUROMORPH_LOG_FORMAT` -> `logging.format`
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unparsable policy or format
pub fn apply_environment_overrides(config: &mut NeuromorphConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("NEUROMORPH_MITO_ANCHOR_POLICY") {
        config.build.mito_anchor_policy = value.parse()?;
    }
    if let Ok(value) = env::var("NEUROMORPH_NRN_ORDER") {
        config.build.nrn_order = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROMORPH_SWC_STRICT_SOMA") {
        config.readers.swc_strict_soma = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROMORPH_LOG_LEVEL") {
        config.logging.level = value.to_lowercase();
    }
    if let Ok(value) = env::var("NEUROMORPH_LOG_FORMAT") {
        config.logging.format = value.parse()?;
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// Recognized keys: `mito_anchor_policy`, `nrn_order`, `swc_strict_soma`,
/// `log_level`, `log_format`. Unknown keys are ignored.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for an unparsable policy or format
pub fn apply_cli_overrides(
    config: &mut NeuromorphConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("mito_anchor_policy") {
        config.build.mito_anchor_policy = value.parse()?;
    }
    if let Some(value) = cli_args.get("nrn_order") {
        config.build.nrn_order = parse_flag(value);
    }
    if let Some(value) = cli_args.get("swc_strict_soma") {
        config.readers.swc_strict_soma = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.to_lowercase();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.parse()?;
    }
    Ok(())
}
