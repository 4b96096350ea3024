//! Analyze command: spelling, grammar and completions for a piece of text.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use scrivener_core::{AnalysisResult, AnalyzerBuilder, Config, CorrectionKind, Language, Settings};

use super::read_text_input;

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Text to analyze. Reads --file or stdin when omitted.
    pub text: Option<String>,

    /// File to analyze.
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<Utf8PathBuf>,

    /// Use only the local dictionary engine.
    #[arg(long, conflicts_with = "online")]
    pub offline: bool,

    /// Use the remote service (falls back offline when it keeps failing).
    #[arg(long)]
    pub online: bool,

    /// Language code (en, es, en-US, ...) or "auto".
    #[arg(short, long)]
    pub language: Option<String>,
}

impl AnalyzeArgs {
    /// Configured settings with this invocation's overrides applied.
    fn settings(&self, base: &Settings) -> Settings {
        let mut settings = base.clone();
        if self.offline {
            settings.work_offline = true;
        }
        if self.online {
            settings.work_offline = false;
        }
        if let Some(ref language) = self.language {
            settings.language.clone_from(language);
        }
        settings
    }
}

#[derive(Serialize)]
struct AnalyzeReport {
    language: Language,
    offline: bool,
    #[serde(flatten)]
    result: AnalysisResult,
}

/// Analyze text and print the corrections.
#[instrument(name = "cmd_analyze", skip_all, fields(file = ?args.file))]
pub async fn cmd_analyze(
    args: AnalyzeArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let settings = args.settings(&config.analysis);
    debug!(offline = settings.work_offline, language = %settings.language, "executing analyze command");

    if !settings.work_offline && config.remote.resolved_api_key().is_none() {
        tracing::warn!("no API key configured; online analysis is limited to the quick spelling pass");
    }

    let text = read_text_input(args.text, args.file.as_ref(), max_input)?;
    let analyzer = AnalyzerBuilder::from_config(config)
        .context("failed to build analyzer")?
        .settings(settings.clone())
        .build();

    let language = analyzer.resolve_language(&text);
    let result = analyzer.analyze(&text).await.filtered(&settings);
    let report = AnalyzeReport {
        language,
        offline: settings.work_offline,
        result,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &AnalyzeReport) {
    let mode = if report.offline { "offline" } else { "online" };
    println!(
        "{} {}",
        report.language.name().bold(),
        format!("({mode})").dimmed()
    );

    let corrections = &report.result.corrections;
    if corrections.is_empty() {
        println!("  {}", "No issues found".green());
    } else {
        for correction in corrections {
            let label = match correction.kind {
                CorrectionKind::Spelling => format!("{:<8}", correction.kind.to_string()).red().to_string(),
                CorrectionKind::Grammar => format!("{:<8}", correction.kind.to_string()).yellow().to_string(),
            };
            let suggestions = if correction.suggestions.is_empty() {
                "(no suggestions)".dimmed().to_string()
            } else {
                correction.suggestions.join(", ")
            };
            println!("  {label} {} -> {suggestions}", correction.word.bold());
            if !correction.context.is_empty() {
                println!("           {}", format!("\"{}\"", correction.context).dimmed());
            }
        }
    }

    let completions = &report.result.autocomplete_suggestions;
    if !completions.is_empty() {
        println!("\n  {} {}", "Completions:".cyan(), completions.join(", "));
    }
}
