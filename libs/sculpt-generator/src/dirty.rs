//! # Dirty Tracker
//!
//! Explicit post-order traversal over the component tree producing the set
//! of dirty part and component ids. No failure mode: absent or malformed
//! references are logged and treated as not-dirty.

use sculpt_snapshot::{ParsedSnapshot, ROOT_COMPONENT_ID};
use std::collections::BTreeSet;

/// The dirty ids of one snapshot, consumed by cache invalidation.
#[derive(Debug, Clone, Default)]
pub struct DirtySets {
    /// Parts whose own data changed.
    pub parts: BTreeSet<String>,
    /// Components whose subtree must be recombined.
    pub components: BTreeSet<String>,
}

/// Scans the snapshot and returns the dirty sets.
///
/// A part is dirty when its own flag is set or a cut-face part it
/// references (at part or node granularity) is dirty. A component is dirty
/// when its own flag is set, its linked part is dirty (directly or through
/// a cut-face dependency), or any child component is dirty.
pub fn scan(parsed: &ParsedSnapshot) -> DirtySets {
    let mut sets = DirtySets::default();
    scan_component(parsed, ROOT_COMPONENT_ID, &mut sets);
    sets
}

fn part_is_dirty(parsed: &ParsedSnapshot, part_id: &str) -> bool {
    match parsed.part(part_id) {
        Some(part) => part.dirty,
        None => {
            tracing::warn!(part = part_id, "part not found");
            false
        }
    }
}

/// Checks whether any cut face this part references is itself dirty.
///
/// A cut-face attribute may also name a built-in template; only values
/// that resolve to an existing part participate here.
fn part_dependency_is_dirty(parsed: &ParsedSnapshot, part_id: &str) -> bool {
    let part = match parsed.part(part_id) {
        Some(part) => part,
        None => {
            tracing::warn!(part = part_id, "part not found");
            return false;
        }
    };
    if let Some(cut_face) = &part.cut_face {
        if parsed.parts.contains_key(cut_face) && part_is_dirty(parsed, cut_face) {
            return true;
        }
    }
    for node in parsed.part_nodes(part_id) {
        if let Some(cut_face) = &node.cut_face {
            if parsed.parts.contains_key(cut_face) && part_is_dirty(parsed, cut_face) {
                return true;
            }
        }
    }
    false
}

fn scan_component(parsed: &ParsedSnapshot, component_id: &str, sets: &mut DirtySets) -> bool {
    let component = match parsed.component(component_id) {
        Some(component) => component,
        None => {
            tracing::warn!(component = component_id, "component not found");
            return false;
        }
    };

    let mut is_dirty = component.dirty;

    if let Some(part_id) = &component.link_part {
        if part_is_dirty(parsed, part_id) {
            sets.parts.insert(part_id.clone());
            is_dirty = true;
        }
        if !is_dirty && part_dependency_is_dirty(parsed, part_id) {
            is_dirty = true;
        }
    }

    for child_id in &component.children {
        // Every child is visited even when already dirty, so the full
        // subtree lands in the dirty set.
        if scan_component(parsed, child_id, sets) {
            is_dirty = true;
        }
    }

    if is_dirty {
        sets.components.insert(component_id.to_string());
    }
    is_dirty
}
