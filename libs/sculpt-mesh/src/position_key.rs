//! # Position Key
//!
//! Quantized vertex position used as an exact, hashable lookup key.
//! Drives vertex provenance after boolean operations, seam-free vertex
//! sets, and duplicate-vertex welding.

use config::constants::POSITION_KEY_SCALE;
use glam::DVec3;

/// A 3D position quantized onto an integer lattice.
///
/// Two positions closer than one lattice step per axis compare equal.
///
/// # Example
///
/// ```rust
/// use sculpt_mesh::PositionKey;
/// use glam::DVec3;
///
/// let a = PositionKey::new(DVec3::new(0.1, 0.2, 0.3));
/// let b = PositionKey::new(DVec3::new(0.1 + 1e-9, 0.2, 0.3));
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    x: i64,
    y: i64,
    z: i64,
}

impl PositionKey {
    /// Quantizes a position into a key.
    pub fn new(position: DVec3) -> Self {
        Self {
            x: quantize(position.x),
            y: quantize(position.y),
            z: quantize(position.z),
        }
    }

    /// Returns the lattice position this key represents.
    pub fn position(&self) -> DVec3 {
        DVec3::new(
            self.x as f64 / POSITION_KEY_SCALE,
            self.y as f64 / POSITION_KEY_SCALE,
            self.z as f64 / POSITION_KEY_SCALE,
        )
    }
}

impl From<DVec3> for PositionKey {
    fn from(position: DVec3) -> Self {
        Self::new(position)
    }
}

fn quantize(value: f64) -> i64 {
    (value * POSITION_KEY_SCALE).round() as i64
}
