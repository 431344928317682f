// src/core/injector.rs
//! Writing a rewritten URL back into the browser's address bar
//!
//! Two host-dependent strategies exist. Newer hosts replace a node's text
//! directly; older ones only offer a paste action, so the value is relayed
//! through the clipboard. The strategy is chosen once from the host's
//! [`HostCapabilities`] when the redirector is built.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::error::{InjectionError, SetupError};
use crate::core::host::{Clipboard, HostCapabilities, UiTree};

/// Which injection path is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionStrategy {
    DirectText,
    ClipboardRelay,
}

/// Fire-and-forget writer of text into a host node
pub trait Injector<T: UiTree> {
    fn strategy(&self) -> InjectionStrategy;

    fn inject(&self, tree: &T, target: &T::Node, text: &str) -> Result<(), InjectionError>;
}

/// Sets the node text and asks for input focus
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectTextInjector;

impl<T: UiTree> Injector<T> for DirectTextInjector {
    fn strategy(&self) -> InjectionStrategy {
        InjectionStrategy::DirectText
    }

    fn inject(&self, tree: &T, target: &T::Node, text: &str) -> Result<(), InjectionError> {
        tree.set_text(target, text)?;
        tree.request_focus(target)
    }
}

/// Saves the clipboard, pastes `text` through it, then restores it
#[derive(Debug)]
pub struct ClipboardRelayInjector<C> {
    clipboard: C,
}

impl<C: Clipboard> ClipboardRelayInjector<C> {
    pub fn new(clipboard: C) -> Self {
        Self { clipboard }
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }
}

impl<T: UiTree, C: Clipboard> Injector<T> for ClipboardRelayInjector<C> {
    fn strategy(&self) -> InjectionStrategy {
        InjectionStrategy::ClipboardRelay
    }

    fn inject(&self, tree: &T, target: &T::Node, text: &str) -> Result<(), InjectionError> {
        let _restore = ClipboardRestore::capture(&self.clipboard)?;
        self.clipboard.set_primary_text(text)?;
        tree.paste(target)
    }
}

/// Puts the captured clipboard content back when dropped
struct ClipboardRestore<'c, C: Clipboard> {
    clipboard: &'c C,
    original: Option<String>,
}

impl<'c, C: Clipboard> ClipboardRestore<'c, C> {
    fn capture(clipboard: &'c C) -> Result<Self, InjectionError> {
        let original = clipboard.primary_text()?;
        Ok(Self {
            clipboard,
            original,
        })
    }
}

impl<C: Clipboard> Drop for ClipboardRestore<'_, C> {
    fn drop(&mut self) {
        // An empty clipboard comes back as empty text
        let original = self.original.as_deref().unwrap_or_default();
        if let Err(e) = self.clipboard.set_primary_text(original) {
            warn!("Failed to restore clipboard after relay paste: {}", e);
        }
    }
}

/// Pick the injection strategy for a host
///
/// Direct text replacement wins whenever the host supports it; the
/// clipboard relay needs both the paste action and a clipboard.
pub fn select_injector<T, C>(
    capabilities: HostCapabilities,
    clipboard: Option<C>,
) -> Result<Box<dyn Injector<T>>, SetupError>
where
    T: UiTree,
    C: Clipboard + 'static,
{
    if capabilities.contains(HostCapabilities::SET_TEXT) {
        debug!("Host supports direct text replacement");
        return Ok(Box::new(DirectTextInjector));
    }

    match clipboard {
        Some(clipboard) if capabilities.contains(HostCapabilities::PASTE_ACTION) => {
            debug!("Falling back to clipboard relay injection");
            Ok(Box::new(ClipboardRelayInjector::new(clipboard)))
        }
        _ => Err(SetupError::NoInjectionStrategy),
    }
}
