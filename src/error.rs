//! Error types for pwgen
//!
//! Library code returns [`PwgenError`]; the binary wraps it in `anyhow` at the edge.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the generator library
#[derive(Error, Debug)]
pub enum PwgenError {
    /// Malformed or out-of-range configuration. Callers treat this as non-fatal
    /// and fall back to built-in defaults for the affected item.
    #[error("configuration error for '{item}': {reason}")]
    Config { item: String, reason: String },

    /// Source list could not be read or decoded
    #[error("failed to load source passwords from {path:?}: {reason}")]
    SourceLoad { path: PathBuf, reason: String },

    /// A rule failed on one input. The engine skips that contribution and keeps going.
    #[error("rule '{rule}' failed on input '{input}': {reason}")]
    RuleEvaluation {
        rule: String,
        input: String,
        reason: String,
    },

    /// Projected run exceeds the configured hard limits
    #[error("projected run exceeds hard limits: {}", .0.join("; "))]
    HardLimitExceeded(Vec<String>),

    /// Writing the output destination failed
    #[error("failed to write output {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PwgenError {
    pub fn config(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            item: item.into(),
            reason: reason.into(),
        }
    }

    pub fn rule(rule: &str, input: &str, reason: impl Into<String>) -> Self {
        Self::RuleEvaluation {
            rule: rule.to_string(),
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PwgenError>;
