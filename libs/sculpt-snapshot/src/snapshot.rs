//! # Snapshot Schema
//!
//! The loosely-typed document snapshot: four string-keyed entity maps plus a
//! distinguished root component. Every entity is a mapping from attribute
//! name to string value; values are parsed on demand by the typed layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a single entity (part, node, edge, or component).
pub type AttributeMap = BTreeMap<String, String>;

/// Reserved id addressing the root component.
///
/// The root is not stored in [`Snapshot::components`]; cache slots and dirty
/// sets key it under this id.
pub const ROOT_COMPONENT_ID: &str = "root";

/// A read-only snapshot of the document state.
///
/// Ordered maps keep traversal deterministic, which the combination
/// expression ids rely on.
///
/// # Example
///
/// ```rust
/// use sculpt_snapshot::Snapshot;
///
/// let snapshot = Snapshot::default();
/// assert!(snapshot.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Canvas attributes (profile origins: `originX`, `originY`, `originZ`).
    pub canvas: AttributeMap,
    /// Skeletal parts by id.
    pub parts: BTreeMap<String, AttributeMap>,
    /// Skeleton nodes by id; each references its `partId`.
    pub nodes: BTreeMap<String, AttributeMap>,
    /// Skeleton edges by id; each references its `partId`, `from` and `to`.
    pub edges: BTreeMap<String, AttributeMap>,
    /// Non-root components by id.
    pub components: BTreeMap<String, AttributeMap>,
    /// The distinguished root component.
    pub root_component: AttributeMap,
}

impl Snapshot {
    /// Returns true if the snapshot holds no parts and no components.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.components.is_empty()
    }

    /// Looks up a component attribute map, resolving the reserved root id.
    pub fn component(&self, component_id: &str) -> Option<&AttributeMap> {
        if component_id == ROOT_COMPONENT_ID {
            Some(&self.root_component)
        } else {
            self.components.get(component_id)
        }
    }
}

/// Returns the value of `key` in `map`, or the empty string when absent.
pub fn attribute<'a>(map: &'a AttributeMap, key: &str) -> &'a str {
    map.get(key).map(String::as_str).unwrap_or("")
}

/// Interprets an attribute value as a boolean flag.
///
/// The document layer writes flags as `"true"`; `"1"` is accepted for
/// hand-written snapshots.
pub fn is_true_value(value: &str) -> bool {
    value == "true" || value == "1"
}
