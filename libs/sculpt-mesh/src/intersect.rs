//! # Self-Intersection Scan
//!
//! Triangle/triangle overlap detection over a spatial hash grid. Plane-side
//! rejection uses exact-arithmetic orientation so near-coplanar pairs are
//! classified consistently; interval arithmetic stays in f64.
//!
//! The pair scan is embarrassingly parallel and runs on rayon.

use crate::spatial_index::SpatialIndex;
use config::constants::EPSILON;
use glam::DVec3;
use rayon::prelude::*;
use robust::{orient2d, orient3d, Coord, Coord3D};

fn coord3(v: DVec3) -> Coord3D<f64> {
    Coord3D {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}

/// Sign of `d` relative to the plane through `a`, `b`, `c`; positive on the
/// side the counter-clockwise normal `(b - a) × (c - a)` points to.
fn plane_side(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    // orient3d is positive below the ccw plane, so the normal side is the
    // negative range.
    let s = orient3d(coord3(a), coord3(b), coord3(c), coord3(d));
    if s > 0.0 {
        -1.0
    } else if s < 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Checks whether any two non-adjacent triangles of the mesh intersect.
///
/// Triangles sharing a vertex index are skipped; within a welded mesh,
/// coincident corners share indices, so seams between neighboring faces do
/// not count as intersections.
pub fn self_intersects(vertices: &[DVec3], triangles: &[[u32; 3]]) -> bool {
    if triangles.len() < 2 {
        return false;
    }
    let index = SpatialIndex::from_triangles(vertices, triangles);
    triangles.par_iter().enumerate().any(|(i, triangle)| {
        let corners = [
            vertices[triangle[0] as usize],
            vertices[triangle[1] as usize],
            vertices[triangle[2] as usize],
        ];
        let min = corners[0].min(corners[1]).min(corners[2]) - DVec3::splat(EPSILON);
        let max = corners[0].max(corners[1]).max(corners[2]) + DVec3::splat(EPSILON);
        index.query_aabb(min, max).into_iter().any(|j| {
            if j <= i {
                return false;
            }
            let other = &triangles[j];
            if shares_vertex(triangle, other) {
                return false;
            }
            triangles_intersect(
                corners[0],
                corners[1],
                corners[2],
                vertices[other[0] as usize],
                vertices[other[1] as usize],
                vertices[other[2] as usize],
            )
        })
    })
}

fn shares_vertex(a: &[u32; 3], b: &[u32; 3]) -> bool {
    a.iter().any(|index| b.contains(index))
}

/// Triangle/triangle overlap test (interval variant).
///
/// Touching contact within [`EPSILON`] does not count as an intersection, so
/// exactly abutting faces pass.
pub fn triangles_intersect(
    a0: DVec3,
    a1: DVec3,
    a2: DVec3,
    b0: DVec3,
    b1: DVec3,
    b2: DVec3,
) -> bool {
    let sides_a = [
        plane_side(b0, b1, b2, a0),
        plane_side(b0, b1, b2, a1),
        plane_side(b0, b1, b2, a2),
    ];
    if sides_a.iter().all(|&s| s > 0.0) || sides_a.iter().all(|&s| s < 0.0) {
        return false;
    }
    let sides_b = [
        plane_side(a0, a1, a2, b0),
        plane_side(a0, a1, a2, b1),
        plane_side(a0, a1, a2, b2),
    ];
    if sides_b.iter().all(|&s| s > 0.0) || sides_b.iter().all(|&s| s < 0.0) {
        return false;
    }

    let normal_a = (a1 - a0).cross(a2 - a0);
    let normal_b = (b1 - b0).cross(b2 - b0);

    if sides_a.iter().all(|&s| s == 0.0) {
        return coplanar_intersect(normal_a, [a0, a1, a2], [b0, b1, b2]);
    }

    // Project both triangles onto the dominant axis of the intersection line
    // and compare the crossing intervals.
    let line = normal_a.cross(normal_b);
    let axis = dominant_axis(line);
    let distances = |points: [DVec3; 3], normal: DVec3, anchor: DVec3, sides: [f64; 3]| {
        let mut d = [0.0; 3];
        for i in 0..3 {
            d[i] = if sides[i] == 0.0 {
                0.0
            } else {
                normal.dot(points[i] - anchor)
            };
        }
        d
    };
    let da = distances([a0, a1, a2], normal_b, b0, sides_a);
    let db = distances([b0, b1, b2], normal_a, a0, sides_b);
    let pa = [a0[axis], a1[axis], a2[axis]];
    let pb = [b0[axis], b1[axis], b2[axis]];

    let interval_a = match crossing_interval(pa, da) {
        Some(interval) => interval,
        None => return coplanar_intersect(normal_a, [a0, a1, a2], [b0, b1, b2]),
    };
    let interval_b = match crossing_interval(pb, db) {
        Some(interval) => interval,
        None => return coplanar_intersect(normal_a, [a0, a1, a2], [b0, b1, b2]),
    };

    interval_a.1.min(interval_b.1) - interval_a.0.max(interval_b.0) > EPSILON
}

fn dominant_axis(v: DVec3) -> usize {
    let abs = v.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

/// Interval a triangle cuts out of the intersection line, from projected
/// coordinates `pp` and signed plane distances `d`.
///
/// Returns `None` when all three distances vanish (coplanar pair).
fn crossing_interval(pp: [f64; 3], d: [f64; 3]) -> Option<(f64, f64)> {
    let d0d1 = d[0] * d[1];
    let d0d2 = d[0] * d[2];
    if d0d1 > 0.0 {
        Some(interval_endpoints(pp, d, 2, 0, 1))
    } else if d0d2 > 0.0 {
        Some(interval_endpoints(pp, d, 1, 0, 2))
    } else if d[1] * d[2] > 0.0 || d[0] != 0.0 {
        Some(interval_endpoints(pp, d, 0, 1, 2))
    } else if d[1] != 0.0 {
        Some(interval_endpoints(pp, d, 1, 0, 2))
    } else if d[2] != 0.0 {
        Some(interval_endpoints(pp, d, 2, 0, 1))
    } else {
        None
    }
}

fn interval_endpoints(
    pp: [f64; 3],
    d: [f64; 3],
    alone: usize,
    first: usize,
    second: usize,
) -> (f64, f64) {
    let t1 = pp[alone] + (pp[first] - pp[alone]) * d[alone] / (d[alone] - d[first]);
    let t2 = pp[alone] + (pp[second] - pp[alone]) * d[alone] / (d[alone] - d[second]);
    (t1.min(t2), t1.max(t2))
}

/// Overlap test for a coplanar triangle pair: any properly crossing edge
/// pair, or one triangle strictly containing a corner of the other.
fn coplanar_intersect(normal: DVec3, a: [DVec3; 3], b: [DVec3; 3]) -> bool {
    let axis = dominant_axis(normal);
    let (u, v) = match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };
    let flat = |p: DVec3| Coord { x: p[u], y: p[v] };
    let fa = [flat(a[0]), flat(a[1]), flat(a[2])];
    let fb = [flat(b[0]), flat(b[1]), flat(b[2])];

    for i in 0..3 {
        for j in 0..3 {
            if segments_properly_cross(
                fa[i],
                fa[(i + 1) % 3],
                fb[j],
                fb[(j + 1) % 3],
            ) {
                return true;
            }
        }
    }
    point_strictly_inside(fb, fa[0]) || point_strictly_inside(fa, fb[0])
}

fn sign(value: f64) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn segments_properly_cross(
    p0: Coord<f64>,
    p1: Coord<f64>,
    q0: Coord<f64>,
    q1: Coord<f64>,
) -> bool {
    let s1 = sign(orient2d(p0, p1, q0));
    let s2 = sign(orient2d(p0, p1, q1));
    let s3 = sign(orient2d(q0, q1, p0));
    let s4 = sign(orient2d(q0, q1, p1));
    s1 * s2 < 0 && s3 * s4 < 0
}

fn point_strictly_inside(triangle: [Coord<f64>; 3], point: Coord<f64>) -> bool {
    let s1 = sign(orient2d(triangle[0], triangle[1], point));
    let s2 = sign(orient2d(triangle[1], triangle[2], point));
    let s3 = sign(orient2d(triangle[2], triangle[0], point));
    s1 != 0 && s1 == s2 && s2 == s3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_triangles_intersect() {
        // A vertical triangle piercing a horizontal one.
        let a0 = DVec3::new(-1.0, -1.0, 0.0);
        let a1 = DVec3::new(1.0, -1.0, 0.0);
        let a2 = DVec3::new(0.0, 1.0, 0.0);
        let b0 = DVec3::new(0.0, -0.5, -1.0);
        let b1 = DVec3::new(0.0, 0.5, 1.0);
        let b2 = DVec3::new(0.0, -0.5, 1.0);
        assert!(triangles_intersect(a0, a1, a2, b0, b1, b2));
    }

    #[test]
    fn test_separated_triangles_do_not_intersect() {
        let a0 = DVec3::new(0.0, 0.0, 0.0);
        let a1 = DVec3::new(1.0, 0.0, 0.0);
        let a2 = DVec3::new(0.0, 1.0, 0.0);
        let b0 = DVec3::new(0.0, 0.0, 5.0);
        let b1 = DVec3::new(1.0, 0.0, 5.0);
        let b2 = DVec3::new(0.0, 1.0, 5.0);
        assert!(!triangles_intersect(a0, a1, a2, b0, b1, b2));
    }

    #[test]
    fn test_coplanar_overlapping_triangles_intersect() {
        let a0 = DVec3::new(0.0, 0.0, 0.0);
        let a1 = DVec3::new(2.0, 0.0, 0.0);
        let a2 = DVec3::new(0.0, 2.0, 0.0);
        let b0 = DVec3::new(0.5, 0.5, 0.0);
        let b1 = DVec3::new(2.5, 0.5, 0.0);
        let b2 = DVec3::new(0.5, 2.5, 0.0);
        assert!(triangles_intersect(a0, a1, a2, b0, b1, b2));
    }

    #[test]
    fn test_coplanar_disjoint_triangles_do_not_intersect() {
        let a0 = DVec3::new(0.0, 0.0, 0.0);
        let a1 = DVec3::new(1.0, 0.0, 0.0);
        let a2 = DVec3::new(0.0, 1.0, 0.0);
        let b0 = DVec3::new(5.0, 5.0, 0.0);
        let b1 = DVec3::new(6.0, 5.0, 0.0);
        let b2 = DVec3::new(5.0, 6.0, 0.0);
        assert!(!triangles_intersect(a0, a1, a2, b0, b1, b2));
    }

    #[test]
    fn test_self_intersects_detects_piercing_pair() {
        let vertices = vec![
            DVec3::new(-1.0, -1.0, 0.0),
            DVec3::new(1.0, -1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, -0.5, -1.0),
            DVec3::new(0.0, 0.5, 1.0),
            DVec3::new(0.0, -0.5, 1.0),
        ];
        let triangles = vec![[0, 1, 2], [3, 4, 5]];
        assert!(self_intersects(&vertices, &triangles));
    }

    #[test]
    fn test_self_intersects_skips_adjacent_triangles() {
        // Two triangles sharing an edge meet but do not self-intersect.
        let vertices = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 1.0),
        ];
        let triangles = vec![[0, 1, 2], [1, 3, 2]];
        assert!(!self_intersects(&vertices, &triangles));
    }

    #[test]
    fn test_cube_does_not_self_intersect() {
        let vertices = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        ];
        let quads: Vec<Vec<u32>> = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
        ];
        let triangles = crate::mesh::triangulate_faces(&quads);
        assert!(!self_intersects(&vertices, &triangles));
    }
}
