// src/core/service_info.rs
//! Registration request handed to the host when the service connects
//!
//! Scopes event delivery to content-changed events from tracked browsers
//! and asks for the window and view-id access the extractor needs.

use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::config::RedirectorConfig;
use crate::core::host::{EventKind, EventTypes};
use crate::core::registry::BrowserRegistry;

bitflags! {
    /// Service capability flags, using the host's bit assignments
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ServiceFlags: u32 {
        const DEFAULT = 1 << 0;
        const INCLUDE_NOT_IMPORTANT_VIEWS = 1 << 1;
        const REQUEST_ENHANCED_WEB_ACCESSIBILITY = 1 << 3;
        const REPORT_VIEW_IDS = 1 << 4;
        const RETRIEVE_INTERACTIVE_WINDOWS = 1 << 6;
    }
}

/// Kind of feedback the service declares it provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Spoken,
    Haptic,
    Audible,
    Visual,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub event_types: EventTypes,
    pub application_ids: Vec<String>,
    pub feedback: FeedbackKind,
    pub notification_timeout_ms: u64,
    pub flags: ServiceFlags,
}

impl ServiceInfo {
    pub fn from_registry(registry: &BrowserRegistry, config: &RedirectorConfig) -> Self {
        Self {
            event_types: EventTypes::WINDOW_CONTENT_CHANGED,
            application_ids: registry.application_identifiers(),
            feedback: FeedbackKind::Generic,
            notification_timeout_ms: config.notification_timeout_ms,
            flags: ServiceFlags::DEFAULT
                | ServiceFlags::RETRIEVE_INTERACTIVE_WINDOWS
                | ServiceFlags::REQUEST_ENHANCED_WEB_ACCESSIBILITY
                | ServiceFlags::INCLUDE_NOT_IMPORTANT_VIEWS
                | ServiceFlags::REPORT_VIEW_IDS,
        }
    }

    pub fn accepts_kind(&self, kind: EventKind) -> bool {
        self.event_types.contains(kind.as_flag())
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }
}
