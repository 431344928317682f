// src/replay/host.rs
//! In-memory host with a throwaway UI tree per event
//!
//! Keeps a log of every handle it hands out and every action performed on
//! it, so callers can check that nodes are released exactly once and see
//! what would have been written into the browser.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use crate::core::config::EDIT_TEXT_CLASS;
use crate::core::error::InjectionError;
use crate::core::host::{Clipboard, HostCapabilities, UiEvent, UiTree};
use crate::replay::trace::TraceEvent;

/// Handle into the simulated tree
#[derive(Debug, PartialEq, Eq)]
pub struct SimNode {
    handle: usize,
    element: usize,
}

impl SimNode {
    pub fn handle(&self) -> usize {
        self.handle
    }
}

/// Side effect performed on the simulated host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    SetText { handle: usize, text: String },
    RequestFocus { handle: usize },
    Paste { handle: usize, clipboard: Option<String> },
    ClipboardSet { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct HostLog {
    pub find_calls: usize,
    pub issued_handles: usize,
    pub releases: HashMap<usize, usize>,
    pub actions: Vec<HostAction>,
}

impl HostLog {
    pub fn release_count(&self, handle: usize) -> usize {
        self.releases.get(&handle).copied().unwrap_or(0)
    }

    /// Every handle issued so far was released, and none twice
    pub fn all_released_once(&self) -> bool {
        (0..self.issued_handles).all(|h| self.release_count(h) == 1)
            && self.releases.keys().all(|h| *h < self.issued_handles)
    }

    /// Values that reached an address bar, through either injection path
    pub fn injected_texts(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                HostAction::SetText { text, .. } => Some(text.clone()),
                HostAction::Paste { clipboard, .. } => Some(clipboard.clone().unwrap_or_default()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct SimElement {
    class_name: Option<String>,
    field_id: Option<String>,
    text: Option<String>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct SimState {
    elements: RefCell<Vec<SimElement>>,
    log: RefCell<HostLog>,
    clipboard: RefCell<Option<String>>,
    fail_injection: Cell<bool>,
    fail_clipboard: Cell<bool>,
}

impl SimState {
    fn issue(&self, element: usize) -> SimNode {
        let mut log = self.log.borrow_mut();
        let handle = log.issued_handles;
        log.issued_handles += 1;
        SimNode { handle, element }
    }

    fn record(&self, action: HostAction) {
        self.log.borrow_mut().actions.push(action);
    }
}

/// Simulated accessibility host
#[derive(Debug)]
pub struct SimulatedHost {
    capabilities: HostCapabilities,
    state: Rc<SimState>,
}

impl SimulatedHost {
    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self {
            capabilities,
            state: Rc::new(SimState::default()),
        }
    }

    /// Newer host: lookup, direct text replacement and paste
    pub fn direct() -> Self {
        Self::with_capabilities(HostCapabilities::all())
    }

    /// Older host: lookup and paste only
    pub fn clipboard_only() -> Self {
        Self::with_capabilities(HostCapabilities::FIND_BY_FIELD_ID | HostCapabilities::PASTE_ACTION)
    }

    /// Clipboard sharing state with this host
    pub fn clipboard(&self) -> SimulatedClipboard {
        SimulatedClipboard {
            state: Rc::clone(&self.state),
        }
    }

    /// Make every following set-text and paste fail as if the browser vanished
    pub fn fail_injection(&self, fail: bool) {
        self.state.fail_injection.set(fail);
    }

    /// Make every following clipboard write fail
    pub fn fail_clipboard(&self, fail: bool) {
        self.state.fail_clipboard.set(fail);
    }

    pub fn log(&self) -> HostLog {
        self.state.log.borrow().clone()
    }

    /// Replace the tree with a root holding one child per `(field_id, text)`
    /// and hand out a handle to the root
    pub fn build_tree(&self, fields: &[(&str, Option<&str>)]) -> SimNode {
        self.reset_tree(
            None,
            fields
                .iter()
                .map(|(id, text)| (id.to_string(), text.map(str::to_string))),
        );
        self.state.issue(0)
    }

    pub fn release_root(&self, root: SimNode) {
        self.release(&root);
    }

    /// Build the tree described by a trace record and wrap it in an event
    ///
    /// An edit-text event fires on the first field itself, so injection
    /// lands in that field. Any other event fires on the window root.
    pub fn materialize(&self, trace: &TraceEvent) -> UiEvent<SimNode> {
        let on_field = trace.class.as_deref() == Some(EDIT_TEXT_CLASS) && !trace.fields.is_empty();
        self.reset_tree(
            if on_field { None } else { trace.class.clone() },
            trace.fields.iter().map(|(id, text)| (id.clone(), text.clone())),
        );
        let element = if on_field { 1 } else { 0 };

        UiEvent {
            kind: trace.kind,
            application_id: trace.app.clone(),
            timestamp_millis: trace.t,
            source_class_name: trace.class.clone(),
            source: trace.source.then(|| self.state.issue(element)),
        }
    }

    /// Current text of the first element with `field_id`
    pub fn field_text(&self, field_id: &str) -> Option<String> {
        self.state
            .elements
            .borrow()
            .iter()
            .find(|e| e.field_id.as_deref() == Some(field_id))
            .and_then(|e| e.text.clone())
    }

    /// Class name of the element behind a handle
    pub fn class_of(&self, node: &SimNode) -> Option<String> {
        self.state
            .elements
            .borrow()
            .get(node.element)
            .and_then(|e| e.class_name.clone())
    }

    fn reset_tree(
        &self,
        root_class: Option<String>,
        fields: impl Iterator<Item = (String, Option<String>)>,
    ) {
        let mut elements = self.state.elements.borrow_mut();
        elements.clear();
        elements.push(SimElement {
            class_name: root_class,
            ..Default::default()
        });
        for (field_id, text) in fields {
            let index = elements.len();
            elements.push(SimElement {
                class_name: Some(EDIT_TEXT_CLASS.to_string()),
                field_id: Some(field_id),
                text,
                children: Vec::new(),
            });
            elements[0].children.push(index);
        }
    }

    fn check_target(&self, node: &SimNode, action: &'static str) -> Result<(), InjectionError> {
        if self.state.fail_injection.get() {
            return Err(InjectionError::TargetUnavailable(format!(
                "no activity found to handle {action}"
            )));
        }
        if node.element >= self.state.elements.borrow().len() {
            return Err(InjectionError::TargetUnavailable(format!(
                "stale node handle {}",
                node.handle
            )));
        }
        Ok(())
    }
}

impl UiTree for SimulatedHost {
    type Node = SimNode;

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn find_by_field_id(&self, root: &SimNode, field_id: &str) -> Vec<SimNode> {
        self.state.log.borrow_mut().find_calls += 1;
        if !self.capabilities.contains(HostCapabilities::FIND_BY_FIELD_ID) {
            return Vec::new();
        }

        let mut found = Vec::new();
        {
            let elements = self.state.elements.borrow();
            let mut stack = vec![root.element];
            while let Some(index) = stack.pop() {
                let Some(element) = elements.get(index) else {
                    continue;
                };
                if element.field_id.as_deref() == Some(field_id) {
                    found.push(index);
                }
                stack.extend(element.children.iter().rev());
            }
        }
        found.into_iter().map(|index| self.state.issue(index)).collect()
    }

    fn text(&self, node: &SimNode) -> Option<String> {
        self.state
            .elements
            .borrow()
            .get(node.element)
            .and_then(|e| e.text.clone())
    }

    fn release(&self, node: &SimNode) {
        *self
            .state
            .log
            .borrow_mut()
            .releases
            .entry(node.handle)
            .or_insert(0) += 1;
    }

    fn set_text(&self, node: &SimNode, text: &str) -> Result<(), InjectionError> {
        if !self.capabilities.contains(HostCapabilities::SET_TEXT) {
            return Err(InjectionError::ActionRejected { action: "set_text" });
        }
        self.check_target(node, "set_text")?;
        if let Some(element) = self.state.elements.borrow_mut().get_mut(node.element) {
            element.text = Some(text.to_string());
        }
        self.state.record(HostAction::SetText {
            handle: node.handle,
            text: text.to_string(),
        });
        Ok(())
    }

    fn request_focus(&self, node: &SimNode) -> Result<(), InjectionError> {
        self.check_target(node, "focus")?;
        self.state.record(HostAction::RequestFocus {
            handle: node.handle,
        });
        Ok(())
    }

    fn paste(&self, node: &SimNode) -> Result<(), InjectionError> {
        if !self.capabilities.contains(HostCapabilities::PASTE_ACTION) {
            return Err(InjectionError::ActionRejected { action: "paste" });
        }
        self.check_target(node, "paste")?;
        let clipboard = self.state.clipboard.borrow().clone();
        if let Some(element) = self.state.elements.borrow_mut().get_mut(node.element) {
            element.text = clipboard.clone();
        }
        self.state.record(HostAction::Paste {
            handle: node.handle,
            clipboard,
        });
        Ok(())
    }
}

/// Clipboard of a [`SimulatedHost`]
#[derive(Debug, Clone)]
pub struct SimulatedClipboard {
    state: Rc<SimState>,
}

impl SimulatedClipboard {
    /// Seed the clipboard without logging an action
    pub fn preset(&self, text: Option<&str>) {
        *self.state.clipboard.borrow_mut() = text.map(str::to_string);
    }

    pub fn current(&self) -> Option<String> {
        self.state.clipboard.borrow().clone()
    }
}

impl Clipboard for SimulatedClipboard {
    fn primary_text(&self) -> Result<Option<String>, InjectionError> {
        Ok(self.current())
    }

    fn set_primary_text(&self, text: &str) -> Result<(), InjectionError> {
        if self.state.fail_clipboard.get() {
            return Err(InjectionError::Clipboard("clipboard service refused the write".into()));
        }
        *self.state.clipboard.borrow_mut() = Some(text.to_string());
        self.state.record(HostAction::ClipboardSet {
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_walks_in_order_and_issues_handles() {
        let host = SimulatedHost::direct();
        let root = host.build_tree(&[("a", Some("1")), ("b", Some("2")), ("a", Some("3"))]);

        let found = host.find_by_field_id(&root, "a");
        let texts: Vec<_> = found.iter().map(|n| host.text(n)).collect();
        assert_eq!(texts, vec![Some("1".to_string()), Some("3".to_string())]);
        assert_eq!(host.class_of(&found[0]).as_deref(), Some("android.widget.EditText"));
        assert_eq!(host.class_of(&root), None);

        let log = host.log();
        assert_eq!(log.issued_handles, 3);
        assert!(!log.all_released_once());

        for node in &found {
            host.release(node);
        }
        host.release_root(root);
        assert!(host.log().all_released_once());
    }

    #[test]
    fn test_double_release_is_detected() {
        let host = SimulatedHost::direct();
        let root = host.build_tree(&[]);
        host.release(&root);
        host.release(&root);
        assert_eq!(host.log().release_count(0), 2);
        assert!(!host.log().all_released_once());
    }

    #[test]
    fn test_lookup_unsupported_returns_nothing() {
        let host = SimulatedHost::with_capabilities(HostCapabilities::SET_TEXT);
        let root = host.build_tree(&[("a", Some("1"))]);
        assert!(host.find_by_field_id(&root, "a").is_empty());
        assert_eq!(host.log().find_calls, 1);
        host.release_root(root);
    }

    #[test]
    fn test_paste_uses_clipboard_content() {
        let host = SimulatedHost::clipboard_only();
        let clipboard = host.clipboard();
        let root = host.build_tree(&[("url", Some("old"))]);
        let field = host.find_by_field_id(&root, "url").remove(0);

        clipboard.set_primary_text("new").unwrap();
        host.paste(&field).unwrap();
        assert_eq!(host.field_text("url").as_deref(), Some("new"));
        assert_eq!(host.log().injected_texts(), vec!["new".to_string()]);

        assert!(matches!(
            host.set_text(&field, "x"),
            Err(InjectionError::ActionRejected { action: "set_text" })
        ));
        host.release(&field);
        host.release_root(root);
    }

    #[test]
    fn test_failing_injection() {
        let host = SimulatedHost::direct();
        let root = host.build_tree(&[]);
        host.fail_injection(true);
        assert!(matches!(
            host.set_text(&root, "x"),
            Err(InjectionError::TargetUnavailable(_))
        ));
        assert!(host.log().actions.is_empty());
        host.release_root(root);
    }

    #[test]
    fn test_edit_text_event_fires_on_the_field() {
        let host = SimulatedHost::direct();
        let trace = TraceEvent::content_changed("app.browser", 1)
            .in_text_input()
            .with_field("app.browser:id/url", Some("http://old.example"));
        let event = host.materialize(&trace);
        let source = event.source.unwrap();
        assert_eq!(host.class_of(&source).as_deref(), Some(EDIT_TEXT_CLASS));

        // Lookup from the field finds the field itself
        let found = host.find_by_field_id(&source, "app.browser:id/url");
        assert_eq!(found.len(), 1);
        assert_eq!(host.text(&found[0]).as_deref(), Some("http://old.example"));

        host.set_text(&source, "http://new.example").unwrap();
        assert_eq!(host.field_text("app.browser:id/url").as_deref(), Some("http://new.example"));

        host.release(&found[0]);
        host.release(&source);
        assert!(host.log().all_released_once());
    }

    #[test]
    fn test_other_events_fire_on_the_root() {
        let host = SimulatedHost::direct();
        let trace = TraceEvent::content_changed("app.browser", 1)
            .with_class("android.widget.FrameLayout")
            .with_field("app.browser:id/url", Some("http://old.example"));
        let source = host.materialize(&trace).source.unwrap();
        assert_eq!(host.class_of(&source).as_deref(), Some("android.widget.FrameLayout"));
        host.release(&source);

        let detached = host.materialize(&TraceEvent {
            source: false,
            ..trace
        });
        assert!(detached.source.is_none());
        assert!(host.log().all_released_once());
    }

    #[test]
    fn test_failing_clipboard() {
        let host = SimulatedHost::clipboard_only();
        let clipboard = host.clipboard();
        clipboard.preset(Some("kept"));
        host.fail_clipboard(true);

        assert!(matches!(
            clipboard.set_primary_text("x"),
            Err(InjectionError::Clipboard(_))
        ));
        assert_eq!(clipboard.current().as_deref(), Some("kept"));
        assert!(host.log().actions.is_empty());
    }
}
