//! Error types for scrivener-core.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::language::Language;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Caller-input violations, reported synchronously at the boundary layer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    /// No text was supplied, or it was only whitespace.
    #[error("text is required")]
    Empty,

    /// The text exceeds the configured input limit.
    #[error("input too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Size of the rejected input in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

/// Errors raised while loading or consulting a spelling dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// No dictionary exists for the requested language.
    #[error("no dictionary available for {0}")]
    Unavailable(Language),

    /// The dictionary file could not be read.
    #[error("failed to read dictionary {path}")]
    Io {
        /// Path that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The dictionary loaded but contains no words.
    #[error("dictionary for {0} is empty")]
    Empty(Language),

    /// The background load task was cancelled or panicked.
    #[error("dictionary load for {language} did not complete: {reason}")]
    LoadAborted {
        /// Language whose load was interrupted.
        language: Language,
        /// Description of the interruption.
        reason: String,
    },
}

/// Result type alias using [`DictionaryError`].
pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Failures of the remote language-model service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No API key was configured for the remote service.
    #[error("no API key configured for the remote analysis service")]
    MissingApiKey,

    /// The request never produced an HTTP response.
    #[error("remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("remote service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response envelope or its JSON payload could not be parsed.
    #[error("could not parse remote response: {0}")]
    Parse(String),

    /// A scripted or otherwise non-HTTP failure.
    #[error("remote analysis unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias using [`RemoteError`].
pub type RemoteResult<T> = Result<T, RemoteError>;
