//! Logging setup for the binary.
//!
//! Human-readable logs go to stderr (stdout carries command output and the
//! MCP protocol). When a log directory is known, a JSONL copy is written to a
//! daily-rotated file through a non-blocking writer.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Explicit log file path.
pub const LOG_PATH_ENV: &str = "SCRIVENER_LOG_PATH";
/// Log directory.
pub const LOG_DIR_ENV: &str = "SCRIVENER_LOG_DIR";

const DEFAULT_LOG_FILE: &str = "scrivener.jsonl";

/// Where JSONL logs are written, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Directory holding the rotated log files.
    pub log_dir: Option<PathBuf>,
    /// File name prefix inside `log_dir`.
    pub file_name: String,
}

impl ObservabilityConfig {
    /// Resolve the log location from the environment, then `config_log_dir`,
    /// then the platform data directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        Self::resolve(
            std::env::var_os(LOG_PATH_ENV).map(PathBuf::from),
            std::env::var_os(LOG_DIR_ENV).map(PathBuf::from),
            config_log_dir,
            scrivener_core::config::user_data_local_dir()
                .map(|dir| dir.join("logs").into_std_path_buf()),
        )
    }

    fn resolve(
        log_path: Option<PathBuf>,
        env_dir: Option<PathBuf>,
        config_dir: Option<PathBuf>,
        platform_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = log_path
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            return Self {
                log_dir: Some(dir),
                file_name: name.to_string(),
            };
        }

        Self {
            log_dir: env_dir.or(config_dir).or(platform_dir),
            file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Keeps the background log writer alive; drop it to flush.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Build the log filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` means errors only, each `-v`
/// raises verbosity one step, and the configured level applies by default.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if std::env::var_os("RUST_LOG").is_some()
        && let Ok(filter) = EnvFilter::try_from_default_env()
    {
        return filter;
    }
    EnvFilter::new(level_directive(quiet, verbose, config_level))
}

fn level_directive(quiet: bool, verbose: u8, config_level: &str) -> &str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => config_level,
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// Install the global subscriber.
///
/// A log directory that cannot be created disables the file layer instead
/// of failing startup.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut guard = None;
    let file_layer = match config.log_dir.as_deref() {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, &config.file_name);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(worker);
                Some(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer),
                )
            }
            Err(err) => {
                eprintln!("warning: file logging disabled ({}: {err})", dir.display());
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(ObservabilityGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_path_wins() {
        let cfg = ObservabilityConfig::resolve(
            Some(PathBuf::from("/var/log/scrivener/run.jsonl")),
            Some(PathBuf::from("/elsewhere")),
            None,
            None,
        );
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/var/log/scrivener")));
        assert_eq!(cfg.file_name, "run.jsonl");
    }

    #[test]
    fn bare_file_name_logs_to_cwd() {
        let cfg = ObservabilityConfig::resolve(Some(PathBuf::from("run.jsonl")), None, None, None);
        assert_eq!(cfg.log_dir, Some(PathBuf::from(".")));
    }

    #[test]
    fn directory_precedence() {
        let cfg = ObservabilityConfig::resolve(
            None,
            None,
            Some(PathBuf::from("/config")),
            Some(PathBuf::from("/platform")),
        );
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/config")));
        assert_eq!(cfg.file_name, DEFAULT_LOG_FILE);

        let cfg = ObservabilityConfig::resolve(
            None,
            Some(PathBuf::from("/env")),
            Some(PathBuf::from("/config")),
            None,
        );
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/env")));
    }

    #[test]
    fn verbosity_flags_map_to_levels() {
        assert_eq!(level_directive(true, 3, "info"), "error");
        assert_eq!(level_directive(false, 0, "warn"), "warn");
        assert_eq!(level_directive(false, 1, "info"), "debug");
        assert_eq!(level_directive(false, 2, "info"), "trace");
    }
}
