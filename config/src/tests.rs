//! # Tests for Config Constants
//!
//! Unit tests verifying the relationships between configuration constants.

use crate::constants::*;

// =============================================================================
// PRECISION TESTS
// =============================================================================

#[test]
fn test_epsilon_is_positive() {
    assert!(EPSILON > 0.0, "EPSILON must be positive");
}

#[test]
fn test_epsilon_is_small() {
    assert!(EPSILON < 1e-6, "EPSILON should be small for precision");
}

#[test]
fn test_vertex_merge_epsilon_larger_than_epsilon() {
    assert!(
        VERTEX_MERGE_EPSILON >= EPSILON,
        "VERTEX_MERGE_EPSILON should be >= EPSILON"
    );
}

#[test]
fn test_plane_thickness_wider_than_merge_epsilon() {
    assert!(
        PLANE_THICKNESS_EPSILON >= VERTEX_MERGE_EPSILON,
        "coplanar band should be at least as wide as the merge tolerance"
    );
}

// =============================================================================
// QUANTIZATION TESTS
// =============================================================================

#[test]
fn test_position_key_scale_is_large() {
    assert!(
        POSITION_KEY_SCALE >= 1e4,
        "POSITION_KEY_SCALE should be large enough for precision"
    );
}

#[test]
fn test_position_key_resolution_below_weld_distance() {
    assert!(
        1.0 / POSITION_KEY_SCALE < SEAM_WELD_DISTANCE,
        "position keys must resolve finer than the weld distance"
    );
}

// =============================================================================
// WELDING / SHADING TESTS
// =============================================================================

#[test]
fn test_seam_weld_distance_is_positive() {
    assert!(SEAM_WELD_DISTANCE > 0.0);
}

#[test]
fn test_smooth_shading_threshold_in_range() {
    assert!(SMOOTH_SHADING_THRESHOLD_DEGREES > 0.0);
    assert!(SMOOTH_SHADING_THRESHOLD_DEGREES < 180.0);
}

// =============================================================================
// COLOR TESTS
// =============================================================================

#[test]
fn test_colors_are_opaque() {
    assert_eq!(DEFAULT_PART_COLOR[3], 1.0);
    assert_eq!(ERROR_PART_COLOR[3], 1.0);
}
