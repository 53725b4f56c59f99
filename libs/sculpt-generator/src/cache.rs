//! # Generation Caches
//!
//! Per-part and per-component cache slots plus the memoized combination
//! map, owned together as one [`CacheContext`]. The context is passed
//! explicitly into each generation — never a process-wide singleton — so
//! nested fill-mesh sub-generations run with isolated contexts. Mesh slots
//! are owned `Option`s, replaced atomically on rebuild.

use crate::object::{ObjectEdge, ObjectNode, PositionedNodeSource};
use glam::DVec3;
use sculpt_mesh::repair::QuadEdgeKey;
use sculpt_mesh::{CombinableMesh, PositionKey};
use sculpt_snapshot::ParsedSnapshot;
use std::collections::{BTreeMap, BTreeSet};

/// Cached build products of one part.
#[derive(Debug, Clone, Default)]
pub struct GeneratedPart {
    /// Raw vertices from the builder (mirrored when applicable).
    pub vertices: Vec<DVec3>,
    /// Raw polygon faces from the builder.
    pub faces: Vec<Vec<u32>>,
    /// Preview vertex buffer.
    pub preview_vertices: Vec<DVec3>,
    /// Preview triangulation (validated mesh, or the raw fallback).
    pub preview_triangles: Vec<[u32; 3]>,
    /// Skeleton nodes this part contributes.
    pub object_nodes: Vec<ObjectNode>,
    /// Skeleton edges this part contributes.
    pub object_edges: Vec<ObjectEdge>,
    /// Per-vertex node attribution.
    pub object_node_vertices: Vec<PositionedNodeSource>,
    /// Whether a combinable mesh was produced.
    pub is_successful: bool,
    /// Whether the part contributes to the combined body.
    pub joined: bool,
    /// The part's combinable mesh, if any.
    pub mesh: Option<CombinableMesh>,
}

/// Cached combination products of one component subtree.
#[derive(Debug, Clone, Default)]
pub struct GeneratedComponent {
    /// The subtree's combined mesh, if any.
    pub mesh: Option<CombinableMesh>,
    /// Vertex positions that must never be welded (original part surface
    /// vertices; only seam debris between them may collapse).
    pub seam_free_vertices: BTreeSet<PositionKey>,
    /// Diagonals of quads split by triangulation, for quad recovery.
    pub shared_quad_edges: BTreeSet<QuadEdgeKey>,
    /// Valid but unfoldable meshes, spliced in as disjoint islands.
    pub incombinable_meshes: Vec<CombinableMesh>,
    /// Aggregated skeleton nodes of the subtree.
    pub object_nodes: Vec<ObjectNode>,
    /// Aggregated skeleton edges of the subtree.
    pub object_edges: Vec<ObjectEdge>,
    /// Aggregated per-vertex node attribution of the subtree.
    pub object_node_vertices: Vec<PositionedNodeSource>,
}

/// All caches of one generation pipeline.
///
/// Owned by the caller and threaded through the generation call graph;
/// the worker keeps one alive across generations for incremental rebuilds.
#[derive(Debug, Default)]
pub struct CacheContext {
    /// Per-part build products.
    pub parts: BTreeMap<String, GeneratedPart>,
    /// Per-component combination products.
    pub components: BTreeMap<String, GeneratedComponent>,
    /// Memoized combinations by expression id; `None` marks a known-bad
    /// combination so it is not recomputed.
    pub cached_combinations: BTreeMap<String, Option<CombinableMesh>>,
    /// Mirror part id → source part id.
    pub part_mirror_ids: BTreeMap<String, String>,
}

impl CacheContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops cache entries for parts and components no longer present.
    ///
    /// A mirror part's entry survives while its source part exists.
    /// Evicting a component also purges every cached combination whose
    /// expression id mentions it.
    pub fn evict_absent(&mut self, parsed: &ParsedSnapshot) {
        let stale_parts: Vec<String> = self
            .parts
            .keys()
            .filter(|id| !parsed.parts.contains_key(*id))
            .cloned()
            .collect();
        for part_id in stale_parts {
            if let Some(source_id) = self.part_mirror_ids.get(&part_id) {
                if parsed.parts.contains_key(source_id) {
                    continue;
                }
                self.part_mirror_ids.remove(&part_id);
            }
            tracing::debug!(part = part_id.as_str(), "evicting cached part");
            self.parts.remove(&part_id);
        }

        let stale_components: Vec<String> = self
            .components
            .keys()
            .filter(|id| !parsed.components.contains_key(*id))
            .cloned()
            .collect();
        for component_id in stale_components {
            self.purge_combinations_mentioning(&component_id);
            tracing::debug!(
                component = component_id.as_str(),
                "evicting cached component"
            );
            self.components.remove(&component_id);
        }
    }

    /// Purges cached combinations whose expression id mentions any dirty
    /// component.
    pub fn invalidate_dirty_combinations(&mut self, dirty_component_ids: &BTreeSet<String>) {
        for component_id in dirty_component_ids {
            self.purge_combinations_mentioning(component_id);
        }
    }

    fn purge_combinations_mentioning(&mut self, id: &str) {
        let before = self.cached_combinations.len();
        self.cached_combinations
            .retain(|expression, _| !expression.contains(id));
        let removed = before - self.cached_combinations.len();
        if removed > 0 {
            tracing::debug!(id, removed, "purged cached combinations");
        }
    }

    /// Number of memoized combinations, including failure markers.
    pub fn combination_count(&self) -> usize {
        self.cached_combinations.len()
    }
}
