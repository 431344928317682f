// src/core/host.rs
//! Common types and traits for the host accessibility boundary
//!
//! The redirector never talks to a platform API directly. A host adapter
//! implements [`UiTree`] (and optionally [`Clipboard`]) and feeds
//! [`UiEvent`]s into the engine one at a time.

use std::fmt;
use std::ops::Deref;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::error::InjectionError;

bitflags! {
    /// Event type mask, using the host's bit assignments
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EventTypes: u32 {
        const VIEW_CLICKED = 1 << 0;
        const VIEW_FOCUSED = 1 << 3;
        const VIEW_TEXT_CHANGED = 1 << 4;
        const WINDOW_STATE_CHANGED = 1 << 5;
        const WINDOW_CONTENT_CHANGED = 1 << 11;
    }
}

bitflags! {
    /// What the connected host can do with UI nodes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HostCapabilities: u8 {
        /// Descendant lookup by view/field identifier
        const FIND_BY_FIELD_ID = 1 << 0;
        /// Direct replacement of a node's text content
        const SET_TEXT = 1 << 1;
        /// Paste action on a node
        const PASTE_ACTION = 1 << 2;
    }
}

/// Type of a UI state change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Something inside a window changed (the address bar text among others)
    WindowContentChanged,
    /// A window opened or changed state
    WindowStateChanged,
    ViewTextChanged,
    ViewFocused,
    ViewClicked,
}

impl EventKind {
    /// The mask bit this kind is registered under
    pub fn as_flag(self) -> EventTypes {
        match self {
            EventKind::WindowContentChanged => EventTypes::WINDOW_CONTENT_CHANGED,
            EventKind::WindowStateChanged => EventTypes::WINDOW_STATE_CHANGED,
            EventKind::ViewTextChanged => EventTypes::VIEW_TEXT_CHANGED,
            EventKind::ViewFocused => EventTypes::VIEW_FOCUSED,
            EventKind::ViewClicked => EventTypes::VIEW_CLICKED,
        }
    }
}

/// An inbound UI state change event
///
/// `source` is a live handle owned by the event. The redirector takes the
/// event by value and releases the handle before `handle` returns.
#[derive(Debug)]
pub struct UiEvent<N> {
    pub kind: EventKind,
    pub application_id: Option<String>,
    pub timestamp_millis: u64,
    pub source_class_name: Option<String>,
    pub source: Option<N>,
}

impl<N> UiEvent<N> {
    pub fn new(kind: EventKind, application_id: impl Into<String>, timestamp_millis: u64) -> Self {
        Self {
            kind,
            application_id: Some(application_id.into()),
            timestamp_millis,
            source_class_name: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: N) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.source_class_name = Some(class_name.into());
        self
    }
}

impl<N> fmt::Display for UiEvent<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} from {} at {}ms",
            self.kind,
            self.application_id.as_deref().unwrap_or("<unknown>"),
            self.timestamp_millis
        )
    }
}

/// Query and mutation interface of the host's live UI tree
///
/// Every `Node` handed out by the host (the event source and each result
/// of [`UiTree::find_by_field_id`]) must be passed to [`UiTree::release`]
/// exactly once. Inside this crate that is enforced by [`NodeGuard`].
pub trait UiTree {
    /// Opaque handle into the live tree
    type Node;

    /// What this host can do; queried once when the redirector is built
    fn capabilities(&self) -> HostCapabilities;

    /// Descendants of `root` (in traversal order) whose field id equals `field_id`
    fn find_by_field_id(&self, root: &Self::Node, field_id: &str) -> Vec<Self::Node>;

    /// Text content of a node, if it has any
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Give a handle back to the host
    fn release(&self, node: &Self::Node);

    fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), InjectionError>;

    fn request_focus(&self, node: &Self::Node) -> Result<(), InjectionError>;

    fn paste(&self, node: &Self::Node) -> Result<(), InjectionError>;
}

/// Primary clipboard of the host
pub trait Clipboard {
    /// Current primary content coerced to text, `None` when empty
    fn primary_text(&self) -> Result<Option<String>, InjectionError>;

    fn set_primary_text(&self, text: &str) -> Result<(), InjectionError>;
}

/// Scoped ownership of a host node handle
///
/// Releases the handle when dropped, so early returns and error paths
/// cannot leak or double-release it.
pub struct NodeGuard<'t, T: UiTree> {
    tree: &'t T,
    node: T::Node,
}

impl<'t, T: UiTree> NodeGuard<'t, T> {
    pub fn new(tree: &'t T, node: T::Node) -> Self {
        Self { tree, node }
    }

    /// Wrap every handle of a query result
    pub fn wrap_all(tree: &'t T, nodes: Vec<T::Node>) -> Vec<Self> {
        nodes.into_iter().map(|node| Self::new(tree, node)).collect()
    }
}

impl<T: UiTree> Deref for NodeGuard<'_, T> {
    type Target = T::Node;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<T: UiTree> Drop for NodeGuard<'_, T> {
    fn drop(&mut self) {
        self.tree.release(&self.node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CountingTree {
        released: RefCell<Vec<u32>>,
    }

    impl UiTree for CountingTree {
        type Node = u32;

        fn capabilities(&self) -> HostCapabilities {
            HostCapabilities::all()
        }

        fn find_by_field_id(&self, _root: &u32, _field_id: &str) -> Vec<u32> {
            vec![7, 8, 9]
        }

        fn text(&self, _node: &u32) -> Option<String> {
            None
        }

        fn release(&self, node: &u32) {
            self.released.borrow_mut().push(*node);
        }

        fn set_text(&self, _node: &u32, _text: &str) -> Result<(), InjectionError> {
            Ok(())
        }

        fn request_focus(&self, _node: &u32) -> Result<(), InjectionError> {
            Ok(())
        }

        fn paste(&self, _node: &u32) -> Result<(), InjectionError> {
            Ok(())
        }
    }

    #[test]
    fn test_guard_releases_once_on_drop() {
        let tree = CountingTree::default();
        {
            let guard = NodeGuard::new(&tree, 3);
            assert_eq!(*guard, 3);
            assert!(tree.released.borrow().is_empty());
        }
        assert_eq!(*tree.released.borrow(), vec![3]);
    }

    #[test]
    fn test_wrap_all_releases_every_handle() {
        let tree = CountingTree::default();
        let nodes = tree.find_by_field_id(&0, "any");
        let guards = NodeGuard::wrap_all(&tree, nodes);
        assert_eq!(guards.len(), 3);
        drop(guards);
        assert_eq!(*tree.released.borrow(), vec![7, 8, 9]);
    }

    #[test]
    fn test_event_kind_flags() {
        assert_eq!(
            EventKind::WindowContentChanged.as_flag(),
            EventTypes::WINDOW_CONTENT_CHANGED
        );
        assert!(!EventTypes::WINDOW_CONTENT_CHANGED.contains(EventKind::ViewClicked.as_flag()));
    }

    #[test]
    fn test_event_builder() {
        let event: UiEvent<u32> = UiEvent::new(EventKind::WindowContentChanged, "app.browser", 42)
            .with_source(1)
            .with_class_name("android.widget.EditText");
        assert_eq!(event.application_id.as_deref(), Some("app.browser"));
        assert_eq!(event.source, Some(1));
        assert_eq!(event.to_string(), "WindowContentChanged from app.browser at 42ms");
    }
}
