//! Detect command: report the language of a piece of text.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use scrivener_core::Language;
use scrivener_core::language::{detect, map_detected};

use super::read_text_input;

/// Arguments for the `detect` subcommand.
#[derive(Args, Debug, Default)]
pub struct DetectArgs {
    /// Text to classify. Reads --file or stdin when omitted.
    pub text: Option<String>,

    /// File to classify.
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<Utf8PathBuf>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Detection {
    /// Raw verdict; `None` when the text is too short to classify.
    detected: Option<Language>,
    /// Language whose dictionary would be used.
    dictionary: Language,
}

fn classify(text: &str) -> Detection {
    let detected = detect(text);
    Detection {
        detected,
        dictionary: map_detected(detected),
    }
}

/// Detect the language of text.
#[instrument(name = "cmd_detect", skip_all, fields(file = ?args.file))]
pub fn cmd_detect(
    args: DetectArgs,
    global_json: bool,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let text = read_text_input(args.text, args.file.as_ref(), max_input)?;
    let detection = classify(&text);
    debug!(detected = ?detection.detected, "language detected");

    if global_json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    match detection.detected {
        Some(language) => println!("{} ({})", language.name().bold(), language.code()),
        None => println!("{}", "unknown (text too short)".yellow()),
    }
    if detection.detected != Some(detection.dictionary) {
        println!(
            "{}: {}",
            "Dictionary".dimmed(),
            detection.dictionary.name()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_maps_to_default_dictionary() {
        let detection = classify("Le garçon mange une pomme très rouge");
        assert_eq!(detection.detected, Some(Language::French));
        assert_eq!(detection.dictionary, Language::English);
    }

    #[test]
    fn short_text_is_unknown() {
        assert_eq!(
            classify("hi"),
            Detection {
                detected: None,
                dictionary: Language::English
            }
        );
    }

    #[test]
    fn cmd_detect_json_succeeds() {
        let args = DetectArgs {
            text: Some("El niño está en la casa".into()),
            file: None,
        };
        assert!(cmd_detect(args, true, None).is_ok());
    }
}
