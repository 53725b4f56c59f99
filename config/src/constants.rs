//! # Configuration Constants
//!
//! Centralized constants for the mesh generation pipeline. All geometry
//! tolerances, welding parameters, and display defaults are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Quantization**: Position-key scaling for exact position lookup
//! - **Welding**: Seam repair distances
//! - **Shading**: Smooth-normal generation defaults
//! - **Colors**: Default and error display colors

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons.
///
/// Used for determining if two floating-point values are "equal" within
/// numerical tolerance.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Thickness of the coplanar band when classifying points against a
/// splitting plane during boolean operations.
///
/// Points within this signed distance of the plane are treated as lying on
/// it; points outside the band are classified by exact-arithmetic
/// orientation.
pub const PLANE_THICKNESS_EPSILON: f64 = 1e-5;

/// Epsilon for vertex deduplication.
///
/// Tolerance used when merging nearly-identical vertices produced by
/// boolean operations and transformations.
pub const VERTEX_MERGE_EPSILON: f64 = 1e-8;

// =============================================================================
// QUANTIZATION CONSTANTS
// =============================================================================

/// Scaling factor for quantizing f64 coordinates into integer position keys.
///
/// Two positions closer than `1 / POSITION_KEY_SCALE` per axis map to the
/// same key. Position keys drive vertex provenance lookup after boolean
/// operations and the seam-free vertex sets used by seam welding.
///
/// # Example
///
/// ```rust
/// use config::constants::POSITION_KEY_SCALE;
///
/// let quantized = (0.123456789_f64 * POSITION_KEY_SCALE).round() as i64;
/// assert_eq!(quantized, 12346);
/// ```
pub const POSITION_KEY_SCALE: f64 = 1e5;

// =============================================================================
// WELDING CONSTANTS
// =============================================================================

/// Maximum edge length considered a weldable seam artifact.
///
/// Triangle edges shorter than this, whose endpoints are not protected by a
/// seam-free set, are collapsed during the seam weld pass.
pub const SEAM_WELD_DISTANCE: f64 = 0.025;

/// Weld distance for debris vertices created along boolean intersection
/// curves.
///
/// Applied between fold steps when recombination is requested; vertices
/// that match an input position are protected, only new intersection
/// vertices collapse.
pub const INTERSECTION_WELD_DISTANCE: f64 = 1e-3;

// =============================================================================
// SHADING CONSTANTS
// =============================================================================

/// Default crease angle for smooth vertex normal generation, in degrees.
///
/// Faces meeting at an angle sharper than this keep a hard edge; shallower
/// transitions share averaged normals.
pub const SMOOTH_SHADING_THRESHOLD_DEGREES: f64 = 60.0;

// =============================================================================
// COLOR CONSTANTS
// =============================================================================

/// Default part color (opaque white, RGBA).
pub const DEFAULT_PART_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Display color for parts whose geometry failed to build (opaque red, RGBA).
pub const ERROR_PART_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
