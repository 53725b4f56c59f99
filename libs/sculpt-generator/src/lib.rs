//! # Sculpt Generator
//!
//! The procedural mesh combination and caching engine: turns a declarative
//! snapshot — skeletal parts arranged in a component tree with boolean
//! combine modes — into one final polygon mesh, regenerated incrementally
//! as the snapshot is edited.
//!
//! ## Architecture
//!
//! ```text
//! Snapshot → dirty tracker → per-part producer → hierarchical combiner
//!                                 (cache)            (cache, memoized)
//!          → seam weld + quad recovery → GeneratedObject
//! ```
//!
//! The stroke-to-tube builder is an external collaborator behind the
//! [`StrokeMeshBuilder`] trait; the engine owns dirty tracking, caching,
//! boolean combination, and repair. A generation always terminates and
//! always produces the best obtainable mesh — failures mark parts and the
//! outcome instead of aborting.

pub mod builder;
pub mod cache;
pub mod combine;
pub mod cut_face;
pub mod dirty;
pub mod generator;
pub mod object;
pub mod part;
pub mod worker;

pub use builder::{
    BuildFailure, BuildOptions, BuiltPartMesh, FillMeshProvider, NodeCutOverride,
    StrokeMeshBuilder, StrokeNode,
};
pub use cache::{CacheContext, GeneratedComponent, GeneratedPart};
pub use dirty::{scan as scan_dirty, DirtySets};
pub use generator::{reverse_id, GeneratorSettings, MeshGenerator};
pub use object::{
    GeneratedObject, GenerationOutcome, ObjectEdge, ObjectNode, PositionedNodeSource,
};
pub use worker::GenerationWorker;
