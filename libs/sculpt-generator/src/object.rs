//! # Generation Result Types
//!
//! The immutable result of one completed generation: the final buffers plus
//! the node/edge provenance downstream consumers (rigging, texturing) read.

use glam::DVec3;
use sculpt_snapshot::Color;
use std::collections::BTreeMap;

/// A skeleton node carried through to the result for downstream consumers.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    /// Owning part id.
    pub part_id: String,
    /// Node id.
    pub node_id: String,
    /// Node position (X negated for mirror twins).
    pub origin: DVec3,
    /// Node radius.
    pub radius: f64,
    /// Part color.
    pub color: Color,
    /// Part color solubility.
    pub color_solubility: f32,
    /// Part metalness.
    pub metalness: f32,
    /// Part roughness.
    pub roughness: f32,
    /// Part countershading hint.
    pub countershaded: bool,
    /// Source part when this node belongs to a mirror twin.
    pub mirror_from_part_id: Option<String>,
    /// Mirror twin synthesized from this node's part.
    pub mirrored_by_part_id: Option<String>,
    /// Whether the part contributes to the combined body.
    pub joined: bool,
}

/// A skeleton edge in the result, as (part id, node id) endpoints.
#[derive(Debug, Clone)]
pub struct ObjectEdge {
    /// First endpoint.
    pub from: (String, String),
    /// Second endpoint.
    pub to: (String, String),
}

/// A raw vertex position attributed to the skeleton node it came from.
#[derive(Debug, Clone)]
pub struct PositionedNodeSource {
    /// The vertex position.
    pub position: DVec3,
    /// Owning part id.
    pub part_id: String,
    /// Source node id.
    pub node_id: String,
}

/// The final mesh and provenance of one generation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedObject {
    /// Vertex positions.
    pub vertices: Vec<DVec3>,
    /// Triangulated faces used for geometric checks and rendering.
    pub triangles: Vec<[u32; 3]>,
    /// Cosmetic topology with recovered quads.
    pub triangle_and_quads: Vec<Vec<u32>>,
    /// Flat normal per triangle.
    pub triangle_normals: Vec<DVec3>,
    /// Display color per triangle.
    pub triangle_colors: Vec<Color>,
    /// Smoothed normal per triangle corner.
    pub triangle_vertex_normals: Vec<[DVec3; 3]>,
    /// Source (part id, node id) per triangle; `None` when unattributed.
    pub triangle_source_nodes: Vec<Option<(String, String)>>,
    /// Source (part id, node id) per vertex; `None` when unattributed.
    pub vertex_source_nodes: Vec<Option<(String, String)>>,
    /// Skeleton nodes contributing to this object.
    pub nodes: Vec<ObjectNode>,
    /// Skeleton edges contributing to this object.
    pub edges: Vec<ObjectEdge>,
}

/// One completed generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Monotonically increasing id; the document layer uses it to discard
    /// superseded results.
    pub generation_id: u64,
    /// The final object.
    pub object: GeneratedObject,
    /// False when any part failed or any combination degraded.
    pub is_successful: bool,
    /// Success flag per joined part, for UI highlighting.
    pub part_success: BTreeMap<String, bool>,
}
