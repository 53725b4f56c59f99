//! # Stroke Builder Boundary
//!
//! The external collaborators the engine consumes: the stroke-to-tube mesh
//! builder that turns one part's nodes, edges, and cross-section into raw
//! geometry, and the provider resolving fill-mesh ids to sub-snapshots.
//! Both are traits; the engine never builds raw tube geometry itself.

use glam::{DVec2, DVec3};
use sculpt_mesh::Mesh;
use sculpt_snapshot::{PartBase, Snapshot};
use thiserror::Error;

/// One stroke node handed to the builder.
#[derive(Debug, Clone, Copy)]
pub struct StrokeNode {
    /// Node position, recentered around the canvas origin.
    pub position: DVec3,
    /// Node radius.
    pub radius: f64,
}

/// Per-node cross-section override.
#[derive(Debug, Clone)]
pub struct NodeCutOverride {
    /// The node's own template polygon.
    pub template: Vec<DVec2>,
    /// The node's own cut rotation, in degrees.
    pub rotation_degrees: f64,
}

/// Pass-through build attributes.
///
/// The engine resolves these from the part record and forwards them
/// opaquely; only `intermediate_nodes` matters to the engine itself (it is
/// disabled for the degraded retry).
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Insert smoothing nodes between skeleton nodes.
    pub intermediate_nodes: bool,
    /// Smooth the stroke polyline.
    pub smooth: bool,
    /// Subdivide the generated surface.
    pub subdived: bool,
    /// Round the stroke ends.
    pub rounded: bool,
    /// Base-normal restriction plane.
    pub base: PartBase,
    /// Deform thickness multiplier.
    pub deform_thickness: f64,
    /// Deform width multiplier.
    pub deform_width: f64,
    /// Unified deform flag.
    pub deform_unified: bool,
    /// Hollow tube wall thickness (0 = solid).
    pub hollow_thickness: f64,
    /// Per-node cross-section overrides, indexed like the node list.
    pub node_cut_overrides: Vec<Option<NodeCutOverride>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            intermediate_nodes: true,
            smooth: false,
            subdived: false,
            rounded: false,
            base: PartBase::Xyz,
            deform_thickness: 1.0,
            deform_width: 1.0,
            deform_unified: false,
            hollow_thickness: 0.0,
            node_cut_overrides: Vec::new(),
        }
    }
}

/// Raw geometry produced by the stroke builder.
#[derive(Debug, Clone)]
pub struct BuiltPartMesh {
    /// The swept surface, quads where the sweep allows.
    pub mesh: Mesh,
    /// For each vertex, the index of the stroke node it belongs to.
    pub vertex_source_nodes: Vec<usize>,
}

/// Failure of the stroke builder to produce geometry.
#[derive(Debug, Error)]
pub enum BuildFailure {
    /// The stroke has no nodes to sweep.
    #[error("stroke has no usable nodes")]
    EmptyStroke,

    /// The stroke cannot be swept into a surface.
    #[error("stroke geometry cannot be built: {0}")]
    Unbuildable(String),
}

/// The external stroke-to-tube mesh builder.
///
/// Given node positions, radii, and a 2D cross-section template, returns a
/// vertex list and a face list, or fails. The engine retries a failed part
/// once with `intermediate_nodes` disabled before giving up on it.
pub trait StrokeMeshBuilder: Send + Sync {
    /// Builds raw geometry for one part.
    fn build_part(
        &self,
        nodes: &[StrokeNode],
        edges: &[(usize, usize)],
        cross_section: &[DVec2],
        cut_rotation_degrees: f64,
        options: &BuildOptions,
    ) -> Result<BuiltPartMesh, BuildFailure>;
}

/// Resolves fill-mesh ids to the sub-snapshots describing them.
///
/// Fill meshes are generated by a nested generator with an isolated cache
/// context and then reshaped along the part's stroke.
pub trait FillMeshProvider: Send + Sync {
    /// Returns the sub-snapshot for a fill-mesh id, if known.
    fn fill_snapshot(&self, fill_mesh_id: &str) -> Option<Snapshot>;
}
