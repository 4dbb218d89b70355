//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-neuromorph-io` or `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use neuromorph_config::LoggingConfig;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug, comma-separated or `all`
pub const DEBUG_ENV_VAR: &str = "NEUROMORPH_DEBUG";

/// Crates whose events are logged at debug level
///
/// # Example
/// ```rust
/// use neuromorph_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-neuromorph-io".to_string()]);
/// assert!(flags.is_enabled("neuromorph-io"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse `--debug-{crate-name}` and `--debug-all` from command-line arguments
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Flags listed under `logging.debug_crates`
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut flags = CrateDebugFlags::default();
        for crate_name in &config.debug_crates {
            if crate_name == "all" {
                flags.enable_all();
            } else {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Parse the `NEUROMORPH_DEBUG` format: `all` or comma-separated names
    pub fn from_env_value(value: &str) -> Self {
        let mut flags = CrateDebugFlags::default();
        if value.trim() == "all" {
            flags.enable_all();
            return flags;
        }
        for crate_name in value.split(',') {
            flags.enable(crate_name);
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Union of both flag sets
    pub fn merge(mut self, other: CrateDebugFlags) -> Self {
        self.enabled_crates.extend(other.enabled_crates);
        self
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter string for `EnvFilter`, e.g. `neuromorph-io=debug,info`
    pub fn to_filter_string(&self) -> String {
        self.to_filter_string_with_default("info")
    }

    /// Like [`Self::to_filter_string`] with a custom level for everything else
    pub fn to_filter_string_with_default(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Debug flags from the process arguments and the `NEUROMORPH_DEBUG` variable
pub fn parse_debug_flags() -> CrateDebugFlags {
    let flags = CrateDebugFlags::from_args(env::args());
    match env::var(DEBUG_ENV_VAR) {
        Ok(value) => flags.merge(CrateDebugFlags::from_env_value(&value)),
        Err(_) => flags,
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {var}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {var}=all                             Enable debug for all crates

Examples:
  --debug-neuromorph-io
  --debug-neuromorph-core --debug-neuromorph-io
  {var}=neuromorph-core,neuromorph-io
"#,
        KNOWN_CRATES.join(", "),
        var = DEBUG_ENV_VAR
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromorph-io".to_string()]);
        assert!(flags.is_enabled("neuromorph-io"));
        assert!(!flags.is_enabled("neuromorph-core"));
    }

    #[test]
    fn test_non_flag_arguments_are_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "neuromorph".to_string(),
            "cell.swc".to_string(),
            "--verbose".to_string(),
        ]);
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string(), "info");
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_is_sorted() {
        let flags = CrateDebugFlags::from_env_value("neuromorph-io, neuromorph-core,");
        assert_eq!(
            flags.to_filter_string_with_default("warn"),
            "neuromorph-core=debug,neuromorph-io=debug,warn"
        );
    }

    #[test]
    fn test_from_config_and_merge() {
        let config = LoggingConfig {
            debug_crates: vec!["neuromorph-core".to_string()],
            ..LoggingConfig::default()
        };
        let flags = CrateDebugFlags::from_config(&config)
            .merge(CrateDebugFlags::from_args(vec!["--debug-neuromorph-io".to_string()]));
        let enabled: Vec<&str> = flags.enabled_crates().collect();
        assert_eq!(enabled, vec!["neuromorph-core", "neuromorph-io"]);
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromorph-core".to_string()]);
        assert_eq!(flags.log_level("neuromorph-core"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("neuromorph-io"), tracing::Level::INFO);
    }

    #[test]
    fn test_help_lists_crates() {
        let help = debug_flags_help();
        for crate_name in KNOWN_CRATES {
            assert!(help.contains(crate_name));
        }
        assert!(help.contains("NEUROMORPH_DEBUG=all"));
    }
}
