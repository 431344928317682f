// src/extractors/url.rs
//! Address bar URL extraction from a browser's UI tree

use tracing::trace;

use crate::core::host::{NodeGuard, UiTree};
use crate::core::registry::BrowserEntry;

/// Read the address bar text below `root`
///
/// Only the first node with the browser's address field id is consulted.
/// Returns `None` when the field is missing (browsers fire events before the
/// bar exists, and some UI variants use other ids) or has no text. Every
/// handle returned by the query is released before returning.
pub fn extract_url<T: UiTree>(tree: &T, root: &T::Node, entry: &BrowserEntry) -> Option<String> {
    let matches = NodeGuard::wrap_all(tree, tree.find_by_field_id(root, &entry.address_field_id));

    let Some(address_bar) = matches.first() else {
        trace!(app = %entry.application_id, field = %entry.address_field_id, "address bar not found");
        return None;
    };

    tree.text(address_bar)
}
