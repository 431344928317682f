// src/core/error.rs
//! Error types shared across the redirect pipeline
//!
//! Only genuine failures live here. "Nothing to do" results (unknown
//! application, no address bar, no matching rule) are reported through
//! [`crate::core::redirector::HandleOutcome`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while writing a rewritten value back into a host control
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The application or node the action targets can no longer be reached
    #[error("injection target unavailable: {0}")]
    TargetUnavailable(String),

    /// The host refused to perform the requested node action
    #[error("host rejected the {action} action")]
    ActionRejected { action: &'static str },

    /// Reading or writing the clipboard failed
    #[error("clipboard error: {0}")]
    Clipboard(String),
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rewrite rule #{index} has an empty match substring")]
    EmptyMatch { index: usize },

    #[error("browser entry #{index} has an empty application id or address field id")]
    EmptyBrowserField { index: usize },

    #[error("debounce window must be greater than zero")]
    ZeroDebounceWindow,
}

/// Failure while wiring the redirector to a host
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("host supports neither direct text replacement nor clipboard paste")]
    NoInjectionStrategy,
}
