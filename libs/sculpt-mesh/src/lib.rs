//! # Sculpt Mesh
//!
//! Geometry layer for the sculpt pipeline: validated combinable meshes,
//! boolean combination, and seam repair.
//!
//! ## Architecture
//!
//! ```text
//! raw vertices/faces → CombinableMesh (validated) → boolean::combine
//!                                                 → repair (weld, quads)
//! ```
//!
//! ## Algorithms
//!
//! All algorithms are pure Rust:
//! - **Boolean Operations**: BSP clipping (csg.js sequences) with
//!   exact-arithmetic plane-side classification (`robust`)
//! - **Validation**: half-edge-pairing manifold check plus a parallel
//!   triangle/triangle self-intersection scan
//! - **Repair**: fixed-point seam welding and quad recovery

pub mod boolean;
pub mod combinable;
pub mod error;
pub mod intersect;
pub mod manifold;
pub mod mesh;
pub mod normal;
pub mod position_key;
pub mod repair;
pub mod spatial_index;

pub use boolean::{combine, Combined, Method, VertexSource};
pub use combinable::CombinableMesh;
pub use error::MeshError;
pub use manifold::is_manifold;
pub use mesh::Mesh;
pub use position_key::PositionKey;
pub use spatial_index::SpatialIndex;
