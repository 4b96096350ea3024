//! Core library for scrivener.
//!
//! This crate provides the text-analysis engine behind the `scrivener` CLI
//! and MCP server: language detection, an offline dictionary engine, a
//! remote chat-completion client, result caching, and per-service failure
//! tracking with automatic offline fallback.
//!
//! # Modules
//!
//! - [`orchestrator`] - The [`Analyzer`] entry point that routes every request
//! - [`language`] - Heuristic language detection and dictionary mapping
//! - [`dictionary`] - Offline spelling, grammar patterns, and stub autocomplete
//! - [`remote`] - Online analysis client and the quick spelling pass
//! - [`cache`] - LRU memoization of analysis results
//! - [`failure`] - Error counting, degradation, and recovery probes
//! - [`history`] - In-memory correction log and usage counters
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use scrivener_core::{AnalyzerBuilder, ConfigLoader};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, _sources) = ConfigLoader::new().with_user_config(true).load()?;
//! let analyzer = AnalyzerBuilder::from_config(&config)?.build();
//!
//! let result = analyzer.analyze("I recieve teh letter yesterday").await;
//! for correction in &result.corrections {
//!     println!("{} -> {:?}", correction.word, correction.suggestions);
//! }
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod correction;
pub mod dictionary;
pub mod error;
pub mod failure;
pub mod history;
pub mod input;
pub mod language;
pub mod orchestrator;
pub mod remote;
pub mod settings;
pub mod text;

pub use config::{Config, ConfigLoader, LogLevel};
pub use correction::{AnalysisResult, Correction, CorrectionKind};
pub use error::{ConfigError, ConfigResult, DictionaryError, InputError, RemoteError};
pub use failure::{ServiceCategory, ServiceReport, ServiceState};
pub use input::{DEFAULT_MAX_INPUT_BYTES, validate_text};
pub use language::Language;
pub use orchestrator::{Analyzer, AnalyzerBuilder};
pub use settings::{Settings, SettingsPatch};
