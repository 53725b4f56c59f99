//! # Combine Modes and Part Classification
//!
//! How a component's mesh joins its siblings, what a part's geometry is
//! used for, and which profile plane anchors its sweep.

use serde::{Deserialize, Serialize};

/// How a component's mesh combines with the fold of its siblings.
///
/// # Variants
///
/// - `Normal`: unioned into the running fold
/// - `Inversion`: subtracted from the running fold
/// - `Uncombined`: kept out of the fold entirely; spliced into the final
///   object as a disjoint island
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineMode {
    /// Unioned into the running fold.
    Normal,
    /// Subtracted from the running fold.
    Inversion,
    /// Excluded from folding; emitted as a disjoint island.
    Uncombined,
}

impl CombineMode {
    /// Parses a combine mode name, defaulting to `Normal`.
    pub fn parse(text: &str) -> Self {
        match text {
            "Inversion" | "inversion" => Self::Inversion,
            "Uncombined" | "uncombined" => Self::Uncombined,
            _ => Self::Normal,
        }
    }

    /// Returns the mode name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Inversion => "inversion",
            Self::Uncombined => "uncombined",
        }
    }
}

impl Default for CombineMode {
    fn default() -> Self {
        Self::Normal
    }
}

/// What a part's generated geometry is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartTarget {
    /// The part contributes to the combined model body.
    Model,
    /// The part only serves as a traced cross-section template.
    CutFace,
}

impl PartTarget {
    /// Parses a target name, defaulting to `Model`.
    pub fn parse(text: &str) -> Self {
        match text {
            "CutFace" | "cutFace" | "cutface" => Self::CutFace,
            _ => Self::Model,
        }
    }
}

impl Default for PartTarget {
    fn default() -> Self {
        Self::Model
    }
}

/// Profile plane anchoring a part's base normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartBase {
    /// Unrestricted base normal.
    Xyz,
    /// Averaged base normal.
    Average,
    /// Base normal restricted off the Z axis.
    Xy,
    /// Base normal restricted off the X axis.
    Yz,
    /// Base normal restricted off the Y axis.
    Zx,
}

impl PartBase {
    /// Parses a base-plane name, defaulting to `Xyz`.
    pub fn parse(text: &str) -> Self {
        match text {
            "Average" | "average" => Self::Average,
            "XY" | "xy" => Self::Xy,
            "YZ" | "yz" => Self::Yz,
            "ZX" | "zx" => Self::Zx,
            _ => Self::Xyz,
        }
    }
}

impl Default for PartBase {
    fn default() -> Self {
        Self::Xyz
    }
}
