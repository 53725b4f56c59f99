//! # Sculpt Snapshot
//!
//! The declarative description of a model: a set of skeletal parts (chains of
//! radius-tagged nodes connected by edges) arranged into a component tree
//! whose interior nodes carry boolean combine modes.
//!
//! ## Architecture
//!
//! ```text
//! document layer (string attribute maps) → Snapshot → ParsedSnapshot
//! ```
//!
//! The loosely-typed [`Snapshot`] exists only at the external boundary; the
//! engine works against the strongly-typed [`ParsedSnapshot`] built
//! immediately after ingestion. Every recognized attribute key and its
//! default is documented on the corresponding record type.

pub mod color;
pub mod combine_mode;
pub mod cut_face;
pub mod record;
pub mod snapshot;

pub use color::Color;
pub use combine_mode::{CombineMode, PartBase, PartTarget};
pub use cut_face::{chamfer_template, CutFaceTemplate};
pub use record::{
    ComponentRecord, EdgeRecord, NodeRecord, ParsedSnapshot, PartRecord,
};
pub use snapshot::{AttributeMap, Snapshot, ROOT_COMPONENT_ID};
