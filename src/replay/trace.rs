// src/replay/trace.rs
//! JSON-lines trace format for replaying recorded events
//!
//! One event per line:
//!
//! ```json
//! {"app": "com.android.chrome", "t": 1000, "class": "android.widget.EditText",
//!  "fields": {"com.android.chrome:id/url_bar": "http://google.com"}}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::EDIT_TEXT_CLASS;
use crate::core::host::EventKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Application id; absent for malformed events
    #[serde(default)]
    pub app: Option<String>,
    /// Event timestamp in milliseconds
    pub t: u64,
    /// Class name of the event source element
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: EventKind,
    /// Field id to text (or null for a field without text) in the window
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    /// Whether the event carries a source element at all
    #[serde(default = "default_source")]
    pub source: bool,
}

fn default_kind() -> EventKind {
    EventKind::WindowContentChanged
}

fn default_source() -> bool {
    true
}

impl TraceEvent {
    pub fn content_changed(app: impl Into<String>, t: u64) -> Self {
        Self {
            app: Some(app.into()),
            t,
            class: None,
            kind: default_kind(),
            fields: BTreeMap::new(),
            source: true,
        }
    }

    /// Mark the source element as an editable text control
    pub fn in_text_input(mut self) -> Self {
        self.class = Some(EDIT_TEXT_CLASS.to_string());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_field(mut self, field_id: impl Into<String>, text: Option<&str>) -> Self {
        self.fields.insert(field_id.into(), text.map(str::to_string));
        self
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Parse one trace line, `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> Result<Option<TraceEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
