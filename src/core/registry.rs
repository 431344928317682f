// src/core/registry.rs
//! Table of tracked browsers and where each one keeps its address bar

use serde::{Deserialize, Serialize};

/// A browser application and the field id of its address bar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrowserEntry {
    pub application_id: String,
    pub address_field_id: String,
}

impl BrowserEntry {
    pub fn new(application_id: impl Into<String>, address_field_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            address_field_id: address_field_id.into(),
        }
    }
}

/// Browsers tracked out of the box
pub fn default_browsers() -> Vec<BrowserEntry> {
    vec![
        BrowserEntry::new("com.android.chrome", "com.android.chrome:id/url_bar"),
        BrowserEntry::new("org.mozilla.firefox", "org.mozilla.firefox:id/url_bar_title"),
        BrowserEntry::new("com.opera.browser", "com.opera.browser:id/url_field"),
    ]
}

/// Ordered, immutable list of tracked browsers
///
/// Duplicate application ids are allowed; lookups resolve to the entry
/// declared last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserRegistry {
    entries: Vec<BrowserEntry>,
}

impl BrowserRegistry {
    pub fn new(entries: Vec<BrowserEntry>) -> Self {
        Self { entries }
    }

    pub fn list_browsers(&self) -> &[BrowserEntry] {
        &self.entries
    }

    /// Application ids to scope the host's event delivery to, in table order
    /// and without repeats
    pub fn application_identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !ids.contains(&entry.application_id) {
                ids.push(entry.application_id.clone());
            }
        }
        ids
    }

    pub fn lookup(&self, application_id: &str) -> Option<&BrowserEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.application_id == application_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BrowserRegistry {
    fn default() -> Self {
        Self::new(default_browsers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let registry = BrowserRegistry::default();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.application_identifiers(),
            vec!["com.android.chrome", "org.mozilla.firefox", "com.opera.browser"]
        );
        assert_eq!(
            registry.lookup("org.mozilla.firefox").map(|e| e.address_field_id.as_str()),
            Some("org.mozilla.firefox:id/url_bar_title")
        );
    }

    #[test]
    fn test_unknown_application() {
        let registry = BrowserRegistry::default();
        assert!(registry.lookup("com.example.notes").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_duplicates_resolve_to_last_entry() {
        let registry = BrowserRegistry::new(vec![
            BrowserEntry::new("app.browser", "app.browser:id/old_url"),
            BrowserEntry::new("app.other", "app.other:id/url"),
            BrowserEntry::new("app.browser", "app.browser:id/url"),
        ]);
        assert_eq!(
            registry.lookup("app.browser").map(|e| e.address_field_id.as_str()),
            Some("app.browser:id/url")
        );
        assert_eq!(registry.application_identifiers(), vec!["app.browser", "app.other"]);
    }
}
