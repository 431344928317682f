//! Browser URL Redirector Library
//!
//! Watches UI state change events from browser applications, reads the
//! address bar through the host's accessibility tree, and rewrites URLs
//! that match a trigger rule back into the address bar.
//!
//! The host platform is reached only through the traits in
//! [`crate::core::host`]; [`replay`] provides an in-memory host for traces and
//! tests.

#![deny(unsafe_code)]

pub mod core;
pub mod extractors;
pub mod replay;

pub use crate::core::config::{RecordPolicy, RedirectorConfig};
pub use crate::core::redirector::{HandleOutcome, Redirector, RedirectorStats};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::core::config::{RecordPolicy, RedirectorConfig};
    pub use crate::core::debounce::{DebounceGate, DetectionKey};
    pub use crate::core::error::{ConfigError, InjectionError, SetupError};
    pub use crate::core::host::{
        Clipboard, EventKind, EventTypes, HostCapabilities, NodeGuard, UiEvent, UiTree,
    };
    pub use crate::core::injector::{
        select_injector, ClipboardRelayInjector, DirectTextInjector, InjectionStrategy, Injector,
    };
    pub use crate::core::redirector::{HandleOutcome, Redirector, RedirectorStats};
    pub use crate::core::registry::{BrowserEntry, BrowserRegistry};
    pub use crate::core::rewrite::{substring_replace_all, RewriteRule, RuleSet};
    pub use crate::core::service_info::{FeedbackKind, ServiceFlags, ServiceInfo};
    pub use crate::extractors::extract_url;
}
