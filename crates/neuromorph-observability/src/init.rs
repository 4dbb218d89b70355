// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output follows `logging.format`; the `file-logging` feature adds
//! JSON log files with one folder per run.

use anyhow::{Context, Result};
use neuromorph_config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Filter combining `logging.level`, `logging.debug_crates` and `debug_flags`
pub fn build_filter(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    let flags = CrateDebugFlags::from_config(config).merge(debug_flags.clone());
    let directives = flags.to_filter_string_with_default(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter: {}", directives))
}

fn console_layer(
    format: LogFormat,
    filter: EnvFilter,
) -> Box<dyn Layer<Registry> + Send + Sync + 'static> {
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Install the global console subscriber
///
/// Fails if a global subscriber is already set or the filter does not parse.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<()> {
    let filter = build_filter(config, debug_flags)?;
    Registry::default()
        .with(vec![console_layer(config.format, filter)])
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

#[cfg(feature = "file-logging")]
pub use file::*;

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
    use neuromorph_config::LoggingConfig;
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    use super::{build_filter, console_layer};
    use crate::cli::CrateDebugFlags;

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";
    const COMBINED_LOG: &str = "neuromorph.log";

    /// Keeps the non-blocking writers alive; logs flush on drop
    pub struct LoggingGuard {
        _file_guards: Vec<WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Folder of the current run
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Retention for run folders under the log directory
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Retention {
        pub days: u64,
        pub runs: usize,
    }

    impl Default for Retention {
        fn default() -> Self {
            Self { days: 30, runs: 10 }
        }
    }

    /// Console logging plus JSON files
    ///
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── neuromorph-core.log
    ///       ├── neuromorph-io.log
    ///       └── neuromorph.log (combined)
    /// ```
    pub fn init_file_logging(
        config: &LoggingConfig,
        debug_flags: &CrateDebugFlags,
        log_dir: Option<PathBuf>,
        retention: Retention,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));
        let run_folder = base_log_dir.join(format!(
            "{}{}",
            RUN_PREFIX,
            Utc::now().format(RUN_FORMAT)
        ));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
        cleanup_old_logs(&base_log_dir, &run_folder, retention, Utc::now())?;

        let mut layers = vec![console_layer(config.format, build_filter(config, debug_flags)?)];
        let mut file_guards = Vec::new();

        for crate_name in crate::KNOWN_CRATES {
            let appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::try_new(format!("{}=debug,off", crate_name))?)
                    .boxed(),
            );
        }

        let (combined, combined_guard) =
            tracing_appender::non_blocking(rolling::never(&run_folder, COMBINED_LOG));
        file_guards.push(combined_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(combined)
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(build_filter(config, debug_flags)?)
                .boxed(),
        );

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    fn run_timestamp(path: &Path) -> Option<DateTime<Utc>> {
        let name = path.file_name()?.to_str()?;
        let stamp = name.strip_prefix(RUN_PREFIX)?;
        NaiveDateTime::parse_from_str(stamp, RUN_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Remove run folders older than `retention.days`, then all but the
    /// newest `retention.runs`. `current` is never removed.
    pub(crate) fn cleanup_old_logs(
        base_log_dir: &Path,
        current: &Path,
        retention: Retention,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let cutoff = now - TimeDelta::days(retention.days as i64);

        let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() || path == current {
                continue;
            }
            if let Some(stamp) = run_timestamp(&path) {
                runs.push((path, stamp));
            }
        }
        // newest first
        runs.sort_by(|a, b| b.1.cmp(&a.1));

        // the current run takes one slot
        let keep = retention.runs.saturating_sub(1);
        for (index, (path, stamp)) in runs.iter().enumerate() {
            if *stamp < cutoff || index >= keep {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    eprintln!(
                        "Warning: Failed to remove old log directory {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        fn make_run(base: &Path, stamp: &str) -> PathBuf {
            let path = base.join(format!("{}{}", RUN_PREFIX, stamp));
            std::fs::create_dir_all(&path).unwrap();
            path
        }

        #[test]
        fn test_run_timestamp() {
            let stamp = run_timestamp(Path::new("/logs/run_20250102_030405")).unwrap();
            assert_eq!(stamp, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
            assert!(run_timestamp(Path::new("/logs/other")).is_none());
        }

        #[test]
        fn test_cleanup_by_age_and_count() {
            let dir = tempfile::tempdir().unwrap();
            let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
            let ancient = make_run(dir.path(), "20240101_000000");
            let older = make_run(dir.path(), "20250529_000000");
            let newer = make_run(dir.path(), "20250530_000000");
            let current = make_run(dir.path(), "20250601_000000");
            let unrelated = dir.path().join("keep_me");
            std::fs::create_dir_all(&unrelated).unwrap();

            let retention = Retention { days: 30, runs: 2 };
            cleanup_old_logs(dir.path(), &current, retention, now).unwrap();

            assert!(!ancient.exists());
            assert!(!older.exists());
            assert!(newer.exists());
            assert!(current.exists());
            assert!(unrelated.exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_config_level_and_flags() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            debug_crates: vec!["neuromorph-core".to_string()],
        };
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuromorph-io".to_string()]);
        let filter = build_filter(&config, &flags).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("neuromorph-core=debug"));
        assert!(rendered.contains("neuromorph-io=debug"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        let config = LoggingConfig {
            level: "neuromorph-core=shouting".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_filter(&config, &CrateDebugFlags::default()).is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();
        let flags = CrateDebugFlags::default();
        // The first call may lose the race with another test's subscriber.
        let _ = init_logging(&config, &flags);
        assert!(init_logging(&config, &flags).is_err());
    }
}
