// src/core/config.rs
//! Redirector configuration
//!
//! The defaults are the compiled-in browser table and rewrite rule. A JSON
//! file can override any subset of fields.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::debounce::{DEFAULT_DEBOUNCE_WINDOW, DEFAULT_MAX_TRACKED};
use crate::core::error::ConfigError;
use crate::core::registry::{default_browsers, BrowserEntry};
use crate::core::rewrite::{default_rules, RewriteRule};

/// Class name of the host's editable text control
pub const EDIT_TEXT_CLASS: &str = "android.widget.EditText";

/// When a detection is written to the debounce table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPolicy {
    /// Every extracted URL is recorded, matching a rule or not
    #[default]
    AllExtracted,
    /// Only URLs that match a rule are recorded
    MatchedOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectorConfig {
    pub browsers: Vec<BrowserEntry>,
    pub rules: Vec<RewriteRule>,
    pub debounce_window_ms: u64,
    pub record_policy: RecordPolicy,
    /// Source classes that count as text inputs; injection is skipped otherwise
    pub text_input_classes: Vec<String>,
    /// Debounce table size that triggers a sweep of stale entries
    pub max_tracked_detections: usize,
    pub notification_timeout_ms: u64,
}

impl Default for RedirectorConfig {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
            rules: default_rules(),
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64,
            record_policy: RecordPolicy::default(),
            text_input_classes: vec![EDIT_TEXT_CLASS.to_string()],
            max_tracked_detections: DEFAULT_MAX_TRACKED,
            notification_timeout_ms: 300,
        }
    }
}

impl RedirectorConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_window_ms == 0 {
            return Err(ConfigError::ZeroDebounceWindow);
        }
        if let Some(index) = self
            .browsers
            .iter()
            .position(|b| b.application_id.is_empty() || b.address_field_id.is_empty())
        {
            return Err(ConfigError::EmptyBrowserField { index });
        }
        if let Some(index) = self.rules.iter().position(|r| r.match_substring.is_empty()) {
            return Err(ConfigError::EmptyMatch { index });
        }
        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn is_text_input(&self, class_name: &str) -> bool {
        self.text_input_classes.iter().any(|c| c == class_name)
    }
}
