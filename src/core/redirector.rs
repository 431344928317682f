// src/core/redirector.rs
//! The redirect engine
//!
//! Each inbound event goes through registry lookup, address bar
//! extraction, the debounce gate and rule matching. When a rule matches
//! and the event came from a text input, the rewritten URL is injected back
//! through the host's injector. Every step that finds nothing to do ends
//! the event quietly; injection failures are logged and swallowed.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::{RecordPolicy, RedirectorConfig};
use crate::core::debounce::{DebounceGate, DetectionKey};
use crate::core::error::SetupError;
use crate::core::host::{Clipboard, HostCapabilities, NodeGuard, UiEvent, UiTree};
use crate::core::injector::{select_injector, InjectionStrategy, Injector};
use crate::core::registry::BrowserRegistry;
use crate::core::rewrite::RuleSet;
use crate::core::service_info::ServiceInfo;
use crate::extractors::extract_url;

/// What happened to a single event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandleOutcome {
    /// No application id or no source element
    MalformedEvent,
    /// Event type outside the registered mask
    IgnoredEventKind,
    /// Application is not a tracked browser
    UnknownApplication,
    /// Address bar missing or empty
    NoUrl,
    /// Same application and URL triggered within the debounce window
    Debounced { url: String },
    NoRuleMatch { url: String },
    /// A rule matched but the source element is not a text input
    NotTextInput { url: String },
    Injected {
        strategy: InjectionStrategy,
        url: String,
        rewritten: String,
    },
    InjectionFailed {
        strategy: InjectionStrategy,
        url: String,
        reason: String,
    },
}

/// Running totals per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedirectorStats {
    pub events_seen: u64,
    pub malformed: u64,
    pub ignored_kind: u64,
    pub unknown_application: u64,
    pub no_url: u64,
    pub debounced: u64,
    pub no_rule_match: u64,
    pub not_text_input: u64,
    pub injected: u64,
    pub injection_failed: u64,
}

impl RedirectorStats {
    fn record(&mut self, outcome: &HandleOutcome) {
        self.events_seen += 1;
        let counter = match outcome {
            HandleOutcome::MalformedEvent => &mut self.malformed,
            HandleOutcome::IgnoredEventKind => &mut self.ignored_kind,
            HandleOutcome::UnknownApplication => &mut self.unknown_application,
            HandleOutcome::NoUrl => &mut self.no_url,
            HandleOutcome::Debounced { .. } => &mut self.debounced,
            HandleOutcome::NoRuleMatch { .. } => &mut self.no_rule_match,
            HandleOutcome::NotTextInput { .. } => &mut self.not_text_input,
            HandleOutcome::Injected { .. } => &mut self.injected,
            HandleOutcome::InjectionFailed { .. } => &mut self.injection_failed,
        };
        *counter += 1;
    }

    pub fn injection_attempts(&self) -> u64 {
        self.injected + self.injection_failed
    }
}

/// Event-driven URL rewriter bound to one host
///
/// Handling takes `&mut self`, so the debounce check and record for an
/// event cannot interleave with another event.
pub struct Redirector<T: UiTree> {
    tree: T,
    injector: Box<dyn Injector<T>>,
    registry: BrowserRegistry,
    rules: RuleSet,
    gate: DebounceGate,
    service_info: ServiceInfo,
    config: RedirectorConfig,
    stats: RedirectorStats,
}

impl<T: UiTree> Redirector<T> {
    pub fn new(tree: T, injector: Box<dyn Injector<T>>, config: RedirectorConfig) -> Self {
        let capabilities = tree.capabilities();
        if !capabilities.contains(HostCapabilities::FIND_BY_FIELD_ID) {
            warn!("Host cannot look up nodes by field id; no address bar will ever be found");
        }

        let registry = BrowserRegistry::new(config.browsers.clone());
        let service_info = ServiceInfo::from_registry(&registry, &config);
        let gate = DebounceGate::with_capacity(config.debounce_window(), config.max_tracked_detections);

        info!(
            browsers = registry.len(),
            rules = config.rules.len(),
            strategy = ?injector.strategy(),
            "Redirector ready"
        );

        Self {
            tree,
            injector,
            rules: RuleSet::new(config.rules.clone()),
            registry,
            gate,
            service_info,
            config,
            stats: RedirectorStats::default(),
        }
    }

    /// Build a redirector choosing the injection strategy from the host's
    /// capabilities
    pub fn with_host<C>(tree: T, clipboard: Option<C>, config: RedirectorConfig) -> Result<Self, SetupError>
    where
        C: Clipboard + 'static,
    {
        let injector = select_injector(tree.capabilities(), clipboard)?;
        Ok(Self::new(tree, injector, config))
    }

    /// Process one inbound event to completion
    pub fn handle(&mut self, event: UiEvent<T::Node>) -> HandleOutcome {
        let outcome = self.process(event);
        match &outcome {
            HandleOutcome::Injected { .. } | HandleOutcome::InjectionFailed { .. } => {}
            other => debug!(?other, "event produced no injection"),
        }
        self.stats.record(&outcome);
        outcome
    }

    fn process(&mut self, event: UiEvent<T::Node>) -> HandleOutcome {
        let UiEvent {
            kind,
            application_id,
            timestamp_millis,
            source_class_name,
            source,
        } = event;

        // Released on every path out of this function
        let source = source.map(|node| NodeGuard::new(&self.tree, node));

        let (Some(source), Some(application_id)) = (source, application_id) else {
            return HandleOutcome::MalformedEvent;
        };

        if !self.service_info.accepts_kind(kind) {
            return HandleOutcome::IgnoredEventKind;
        }

        let Some(entry) = self.registry.lookup(&application_id) else {
            return HandleOutcome::UnknownApplication;
        };

        let Some(url) = extract_url(&self.tree, &*source, entry) else {
            return HandleOutcome::NoUrl;
        };

        let key = DetectionKey::new(application_id, url);
        let rule = match self.config.record_policy {
            RecordPolicy::AllExtracted => {
                if !self.gate.should_trigger(&key, timestamp_millis) {
                    return HandleOutcome::Debounced { url: key.url };
                }
                self.rules.first_match(&key.url)
            }
            RecordPolicy::MatchedOnly => {
                let rule = self.rules.first_match(&key.url);
                if rule.is_some() && !self.gate.should_trigger(&key, timestamp_millis) {
                    return HandleOutcome::Debounced { url: key.url };
                }
                rule
            }
        };

        let Some(rule) = rule else {
            return HandleOutcome::NoRuleMatch { url: key.url };
        };
        let rewritten = rule.apply(&key.url);

        let is_text_input = source_class_name
            .as_deref()
            .is_some_and(|class| self.config.is_text_input(class));
        if !is_text_input {
            return HandleOutcome::NotTextInput { url: key.url };
        }

        let strategy = self.injector.strategy();
        match self.injector.inject(&self.tree, &*source, &rewritten) {
            Ok(()) => {
                info!(app = %key.application_id, url = %key.url, %rewritten, ?strategy, "Redirected");
                HandleOutcome::Injected {
                    strategy,
                    url: key.url,
                    rewritten,
                }
            }
            Err(e) => {
                warn!(app = %key.application_id, url = %key.url, ?strategy, "Redirect injection failed: {}", e);
                HandleOutcome::InjectionFailed {
                    strategy,
                    url: key.url,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn stats(&self) -> &RedirectorStats {
        &self.stats
    }

    /// Registration request to hand to the host at connect time
    pub fn service_info(&self) -> &ServiceInfo {
        &self.service_info
    }

    pub fn registry(&self) -> &BrowserRegistry {
        &self.registry
    }

    pub fn strategy(&self) -> InjectionStrategy {
        self.injector.strategy()
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Number of (application, URL) pairs currently held by the debounce gate
    pub fn tracked_detections(&self) -> usize {
        self.gate.len()
    }
}
