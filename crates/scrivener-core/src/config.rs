//! Layered configuration.
//!
//! A [`Config`] is merged from, lowest precedence first:
//!
//! 1. built-in defaults;
//! 2. the user file, `config.<ext>` in the platform config directory;
//! 3. project files, `.scrivener.<ext>` then `scrivener.<ext>`, from the
//!    nearest directory above the working directory that has any (the search
//!    ends at a repository root);
//! 4. files passed explicitly;
//! 5. `SCRIVENER_*` environment variables, `__` separating sections
//!    (`SCRIVENER_REMOTE__MODEL=gpt-4o-mini`).
//!
//! `<ext>` is `toml`, `yaml`, `yml` or `json`.
//!
//! ```no_run
//! use camino::Utf8Path;
//! use scrivener_core::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, sources) = ConfigLoader::new()
//!     .with_project_search(Utf8Path::new("/home/me/novel"))
//!     .load()?;
//! println!("{:?} from {:?}", config.analysis, sources.primary_file());
//! # Ok(())
//! # }
//! ```

// use scrivener_core::config::{Config, ConfigLoader};
//
// let cwd = std::env::current_dir().unwrap();
// let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
// let config = ConfigLoader::new()
//     .with_project_search(&cwd)
//     .load()
//     .unwrap();
// ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;

/// Environment variable consulted when `remote.api_key` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Connection settings for the remote chat-completion service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    /// The configured key, or the value of `OPENAI_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Tuning for the cache, failure tracker, and dictionaries.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cached analysis results.
    pub cache_capacity: usize,
    /// Consecutive errors before a service is treated as degraded.
    pub failure_threshold: u32,
    /// Seconds between recovery probes for a degraded service.
    pub recovery_interval_secs: u64,
    /// Directory of `<code>.txt` word lists. Bundled lists are used when unset.
    pub dictionary_dir: Option<Utf8PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            failure_threshold: 5,
            recovery_interval_secs: 60,
            dictionary_dir: None,
        }
    }
}

/// Everything scrivener reads from config files and the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default log level when neither `RUST_LOG` nor `-q`/`-v` is given.
    pub log_level: LogLevel,
    /// Directory for the JSONL log files.
    pub log_dir: Option<Utf8PathBuf>,
    /// Largest accepted text in bytes, for the CLI and the MCP tools alike.
    /// Unset means [`DEFAULT_MAX_INPUT_BYTES`](crate::input::DEFAULT_MAX_INPUT_BYTES).
    pub max_input_bytes: Option<usize>,
    /// Accept text of any size; `max_input_bytes` is then ignored.
    pub disable_input_limit: bool,
    /// Initial analysis settings.
    pub analysis: Settings,
    /// Remote service connection.
    pub remote: RemoteConfig,
    /// Engine tuning.
    pub engine: EngineConfig,
}

impl Config {
    /// The input limit to enforce, if any.
    pub fn max_input(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(
                self.max_input_bytes
                    .unwrap_or(crate::input::DEFAULT_MAX_INPUT_BYTES),
            )
        }
    }
}

/// Baseline verbosity.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routing decisions and cache activity.
    Debug,
    /// Startup and recovery events.
    #[default]
    Info,
    /// Service errors.
    Warn,
    /// Fatal errors only.
    Error,
}

impl LogLevel {
    /// The `tracing` directive for this level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which files contributed to a loaded [`Config`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// The user-level config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Files from the nearest project directory that has any, lowest
    /// precedence first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// Files passed explicitly, e.g. with `--config`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// The file with the last word: explicit, then project, then user.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .or(self.project_files.last())
            .map(Utf8PathBuf::as_path)
            .or(self.user_file.as_deref())
    }

    /// Every file in merge order.
    fn files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.user_file
            .iter()
            .chain(&self.project_files)
            .chain(&self.explicit_files)
            .map(Utf8PathBuf::as_path)
    }
}

/// Accepted extensions; within one directory later entries win.
const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

const APP_NAME: &str = "scrivener";

const ENV_PREFIX: &str = "SCRIVENER_";

/// Project discovery does not climb past a directory containing this.
const REPOSITORY_MARKER: &str = ".git";

/// Layered configuration loader.
///
/// Sources merge in this order, later ones winning: defaults, the user
/// config, project files, explicit files, then `SCRIVENER_*` variables.
#[derive(Debug)]
pub struct ConfigLoader {
    search_from: Option<Utf8PathBuf>,
    user_config: bool,
    files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader that reads the user config and nothing else.
    pub const fn new() -> Self {
        Self {
            search_from: None,
            user_config: true,
            files: Vec::new(),
        }
    }

    /// Look for project files in `dir` and its parents.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, dir: P) -> Self {
        self.search_from = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Whether to read `~/.config/scrivener/config.<ext>`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.user_config = include;
        self
    }

    /// Merge `path` after every discovered file.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source into a [`Config`].
    #[tracing::instrument(skip(self), fields(search_from = ?self.search_from))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        let sources = ConfigSources {
            user_file: if self.user_config { user_file() } else { None },
            project_files: self
                .search_from
                .as_deref()
                .map(project_files)
                .unwrap_or_default(),
            explicit_files: self.files,
        };

        let figment = sources
            .files()
            .fold(
                Figment::new().merge(Serialized::defaults(Config::default())),
                merge_file,
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            files = sources.files().count(),
            log_level = config.log_level.as_str(),
            work_offline = config.analysis.work_offline,
            "configuration loaded"
        );
        Ok((config, sources))
    }
}

/// Config files in the nearest directory, from `start` upward, that has any.
/// Dotfiles come first so `scrivener.<ext>` overrides `.scrivener.<ext>`.
fn project_files(start: &Utf8Path) -> Vec<Utf8PathBuf> {
    let stems = [format!(".{APP_NAME}"), APP_NAME.to_string()];
    for dir in start.ancestors() {
        let found: Vec<Utf8PathBuf> = stems
            .iter()
            .flat_map(|stem| {
                EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
            .filter(|path| path.is_file())
            .collect();
        if !found.is_empty() {
            tracing::debug!(dir = %dir, count = found.len(), "project config found");
            return found;
        }
        if dir.join(REPOSITORY_MARKER).exists() {
            break;
        }
    }
    Vec::new()
}

fn user_file() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => figment.merge(Toml::file_exact(path)),
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Per-user config directory, e.g. `~/.config/scrivener` on Linux.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.config_dir().to_path_buf()).ok()
}

/// Machine-local data directory, e.g. `~/.local/share/scrivener` on Linux.
/// Logs default to a `logs` folder inside it.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.data_local_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Held by tests that set process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn load_file(name: &str, contents: &str) -> ConfigResult<Config> {
        let tmp = TempDir::new().unwrap();
        let path = utf8(&tmp).join(name);
        fs::write(&path, contents).unwrap();
        ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load()
            .map(|(config, _)| config)
    }

    #[test]
    fn sections_default_to_documented_values() {
        let config = Config::default();
        assert_eq!(config.analysis, Settings::default());
        assert_eq!(config.remote.model, "gpt-4o");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.engine.cache_capacity, 100);
        assert_eq!(config.engine.failure_threshold, 5);
        assert_eq!(config.engine.recovery_interval_secs, 60);
        assert!(config.engine.dictionary_dir.is_none());
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn max_input_resolves_limit() {
        let mut config = Config::default();
        assert_eq!(
            config.max_input(),
            Some(crate::input::DEFAULT_MAX_INPUT_BYTES)
        );
        config.max_input_bytes = Some(10);
        assert_eq!(config.max_input(), Some(10));
        config.disable_input_limit = true;
        assert_eq!(config.max_input(), None);
    }

    #[test]
    fn nested_sections_from_toml() {
        let config = load_file(
            "config.toml",
            r#"
[analysis]
work_offline = true
language = "auto"

[remote]
model = "gpt-4o-mini"
base_url = "http://localhost:9000/v1"

[engine]
cache_capacity = 8
dictionary_dir = "/usr/share/scrivener/words"
"#,
        )
        .unwrap();

        assert!(config.analysis.work_offline);
        assert_eq!(config.analysis.language, "auto");
        assert!(config.analysis.spelling_check, "unset keys keep defaults");
        assert_eq!(config.remote.model, "gpt-4o-mini");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.engine.cache_capacity, 8);
        assert_eq!(
            config.engine.dictionary_dir.as_deref().map(Utf8Path::as_str),
            Some("/usr/share/scrivener/words")
        );
    }

    #[test]
    fn json_file_by_extension() {
        let config = load_file(
            "settings.json",
            r#"{"analysis": {"autocomplete": false}, "engine": {"failure_threshold": 2}}"#,
        )
        .unwrap();
        assert!(!config.analysis.autocomplete);
        assert_eq!(config.engine.failure_threshold, 2);
    }

    #[test]
    fn unknown_analysis_key_is_rejected() {
        let result = load_file("config.toml", "[analysis]\nstart_on_boot = true\n");
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn sections_deserialize_from_yaml() {
        let yaml = r#"
analysis:
  grammar_check: false
engine:
  failure_threshold: 3
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.analysis.grammar_check);
        assert_eq!(config.engine.failure_threshold, 3);
        assert_eq!(config.engine.cache_capacity, 100);
    }

    #[test]
    fn project_file_beats_dotfile_and_explicit_beats_both() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(
            root.join(".scrivener.toml"),
            "[engine]\ncache_capacity = 1\nfailure_threshold = 1\n",
        )
        .unwrap();
        fs::write(root.join("scrivener.yaml"), "engine:\n  cache_capacity: 2\n").unwrap();
        let explicit = root.join("override.toml");
        fs::write(&explicit, "[engine]\nfailure_threshold = 9\n").unwrap();
        let nested = root.join("drafts/chapter-one");
        fs::create_dir_all(&nested).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&nested)
            .with_file(&explicit)
            .load()
            .unwrap();

        assert_eq!(config.engine.cache_capacity, 2);
        assert_eq!(config.engine.failure_threshold, 9);
        assert_eq!(
            sources.project_files,
            vec![root.join(".scrivener.toml"), root.join("scrivener.yaml")]
        );
        assert_eq!(sources.primary_file(), Some(explicit.as_path()));
    }

    #[test]
    fn discovery_stops_at_repository_root() {
        let tmp = TempDir::new().unwrap();
        let root = utf8(&tmp);
        fs::write(root.join("scrivener.toml"), "[analysis]\nwork_offline = true\n").unwrap();
        let repo = root.join("notes");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let inner = repo.join("journal");
        fs::create_dir_all(&inner).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&inner)
            .load()
            .unwrap();

        assert!(sources.project_files.is_empty());
        assert_eq!(sources.primary_file(), None);
        assert!(!config.analysis.work_offline);
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_overrides_nested_keys() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        // SAFETY: ENV_LOCK serializes environment access in this module.
        unsafe {
            std::env::set_var("SCRIVENER_ANALYSIS__WORK_OFFLINE", "true");
            std::env::set_var("SCRIVENER_ENGINE__RECOVERY_INTERVAL_SECS", "7");
        }
        let config = load_file("config.toml", "[analysis]\nwork_offline = false\n");
        // SAFETY: as above.
        unsafe {
            std::env::remove_var("SCRIVENER_ANALYSIS__WORK_OFFLINE");
            std::env::remove_var("SCRIVENER_ENGINE__RECOVERY_INTERVAL_SECS");
        }

        let config = config.unwrap();
        assert!(config.analysis.work_offline);
        assert_eq!(config.engine.recovery_interval_secs, 7);
    }

    #[test]
    #[allow(unsafe_code)]
    fn api_key_falls_back_to_environment() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let configured = RemoteConfig {
            api_key: Some("sk-config".into()),
            ..RemoteConfig::default()
        };

        // SAFETY: ENV_LOCK serializes environment access in this module.
        unsafe {
            std::env::set_var(API_KEY_ENV, "sk-env");
        }
        let from_env = RemoteConfig::default().resolved_api_key();
        let from_config = configured.resolved_api_key();
        // SAFETY: as above.
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }

        assert_eq!(from_env.as_deref(), Some("sk-env"));
        assert_eq!(from_config.as_deref(), Some("sk-config"));
    }
}
