//! Info command implementation

use clap::Args;
use owo_colors::OwoColorize;
use scrivener_core::config::{Config, ConfigSources};
use scrivener_core::language::map_to_supported;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<usize>,
    work_offline: bool,
    language: String,
    dictionary_language: &'static str,
    spelling_check: bool,
    grammar_check: bool,
    autocomplete: bool,
    model: String,
    base_url: String,
    api_key_configured: bool,
    cache_capacity: usize,
    failure_threshold: u32,
    recovery_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    dictionary_dir: Option<String>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let analysis = &config.analysis;
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            max_input_bytes: config.max_input(),
            work_offline: analysis.work_offline,
            language: analysis.language.clone(),
            dictionary_language: map_to_supported(&analysis.language).code(),
            spelling_check: analysis.spelling_check,
            grammar_check: analysis.grammar_check,
            autocomplete: analysis.autocomplete,
            model: config.remote.model.clone(),
            base_url: config.remote.base_url.clone(),
            api_key_configured: config.remote.resolved_api_key().is_some(),
            cache_capacity: config.engine.cache_capacity,
            failure_threshold: config.engine.failure_threshold,
            recovery_interval_secs: config.engine.recovery_interval_secs,
            dictionary_dir: config.engine.dictionary_dir.as_ref().map(|p| p.to_string()),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let info = PackageInfo::new();

    debug!(json_output = global_json, "executing info command");

    let config_info = ConfigInfo::from_config(config, sources);
    let full_info = FullInfo {
        package: info,
        config: config_info,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
    } else {
        println!(
            "{} {}",
            full_info.package.name.bold(),
            full_info.package.version.green()
        );
        if !full_info.package.description.is_empty() {
            println!("{}", full_info.package.description);
        }
        if !full_info.package.license.is_empty() {
            println!("{}: {}", "License".dimmed(), full_info.package.license);
        }
        if !full_info.package.repository.is_empty() {
            println!(
                "{}: {}",
                "Repository".dimmed(),
                full_info.package.repository.cyan()
            );
        }

        let cfg = &full_info.config;
        println!();
        println!("{}", "Configuration".bold().underline());
        if let Some(ref path) = cfg.config_file {
            println!("{}: {}", "Config file".dimmed(), path.cyan());
        } else {
            println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
        }
        println!("{}: {}", "Log level".dimmed(), cfg.log_level);
        if let Some(ref dir) = cfg.log_dir {
            println!("{}: {}", "Log directory".dimmed(), dir);
        }
        match cfg.max_input_bytes {
            Some(limit) => println!("{}: {limit} bytes", "Input limit".dimmed()),
            None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
        }

        println!();
        println!("{}", "Analysis".bold().underline());
        let mode = if cfg.work_offline { "offline" } else { "online" };
        println!("{}: {mode}", "Mode".dimmed());
        println!(
            "{}: {} (dictionary: {})",
            "Language".dimmed(),
            cfg.language,
            cfg.dictionary_language
        );
        print_switch("Spelling", cfg.spelling_check);
        print_switch("Grammar", cfg.grammar_check);
        print_switch("Autocomplete", cfg.autocomplete);

        println!();
        println!("{}", "Remote".bold().underline());
        println!("{}: {}", "Model".dimmed(), cfg.model);
        println!("{}: {}", "Endpoint".dimmed(), cfg.base_url.cyan());
        print_switch("API key", cfg.api_key_configured);

        println!();
        println!("{}", "Engine".bold().underline());
        println!("{}: {}", "Cache capacity".dimmed(), cfg.cache_capacity);
        println!(
            "{}: {} errors, retry every {}s",
            "Failover".dimmed(),
            cfg.failure_threshold,
            cfg.recovery_interval_secs
        );
        if let Some(ref dir) = cfg.dictionary_dir {
            println!("{}: {}", "Dictionaries".dimmed(), dir);
        }
    }

    Ok(())
}

fn print_switch(label: &str, on: bool) {
    if on {
        println!("{}: {}", label.dimmed(), "on".green());
    } else {
        println!("{}: {}", label.dimmed(), "off".yellow());
    }
}
