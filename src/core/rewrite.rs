// src/core/rewrite.rs
//! Trigger rules and the substitution they apply

use serde::{Deserialize, Serialize};

/// Replace every occurrence of `from` in `input` with `to`
///
/// An empty `from` leaves the input untouched.
pub fn substring_replace_all(input: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return input.to_string();
    }
    input.replace(from, to)
}

/// Plain substring trigger and its replacement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewriteRule {
    #[serde(rename = "match")]
    pub match_substring: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(match_substring: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            match_substring: match_substring.into(),
            replacement: replacement.into(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        !self.match_substring.is_empty() && url.contains(&self.match_substring)
    }

    pub fn apply(&self, url: &str) -> String {
        substring_replace_all(url, &self.match_substring, &self.replacement)
    }
}

/// Rules shipped by default
pub fn default_rules() -> Vec<RewriteRule> {
    vec![RewriteRule::new("google.com", "zarebin.ir")]
}

/// Ordered rule list, first match wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    pub fn first_match(&self, url: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
