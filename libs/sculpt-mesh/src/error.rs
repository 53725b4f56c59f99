//! # Mesh Errors
//!
//! Error types for mesh validation and combination.

use thiserror::Error;

/// Errors raised while validating or combining meshes.
///
/// The engine converts these into degraded results rather than propagating
/// them; they surface here so the rejection reason can be logged.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A face references a vertex that does not exist, or repeats one.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// The mesh has no usable geometry.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The triangulation fails the half-edge pairing manifold check.
    #[error("mesh is not manifold")]
    NonManifold,

    /// Two non-adjacent triangles of the mesh intersect.
    #[error("mesh self-intersects")]
    SelfIntersecting,

    /// A boolean operation produced no usable output.
    #[error("boolean operation failed: {0}")]
    BooleanFailed(String),
}
