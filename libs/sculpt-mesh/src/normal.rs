//! # Normal Generation
//!
//! Flat triangle normals plus angle-thresholded smooth corner normals for
//! the final object. Corners meeting across a crease sharper than the
//! threshold keep their flat normal.

use crate::position_key::PositionKey;
use glam::DVec3;
use std::collections::BTreeMap;

/// Computes the flat normal of every triangle.
pub fn triangle_normals(vertices: &[DVec3], triangles: &[[u32; 3]]) -> Vec<DVec3> {
    triangles
        .iter()
        .map(|triangle| {
            let v0 = vertices[triangle[0] as usize];
            let v1 = vertices[triangle[1] as usize];
            let v2 = vertices[triangle[2] as usize];
            (v1 - v0).cross(v2 - v0).normalize_or_zero()
        })
        .collect()
}

/// Computes per-corner smooth normals with an angle threshold.
///
/// Corners at the same position share averaged normals across the faces
/// whose flat normals lie within `threshold_degrees` of each other;
/// sharper creases stay hard.
pub fn smooth_triangle_vertex_normals(
    vertices: &[DVec3],
    triangles: &[[u32; 3]],
    flat_normals: &[DVec3],
    threshold_degrees: f64,
) -> Vec<[DVec3; 3]> {
    let threshold_cosine = threshold_degrees.to_radians().cos();

    // Faces touching each position.
    let mut position_faces: BTreeMap<PositionKey, Vec<usize>> = BTreeMap::new();
    for (triangle_index, triangle) in triangles.iter().enumerate() {
        for &vertex_index in triangle {
            position_faces
                .entry(PositionKey::new(vertices[vertex_index as usize]))
                .or_default()
                .push(triangle_index);
        }
    }

    triangles
        .iter()
        .enumerate()
        .map(|(triangle_index, triangle)| {
            let own_normal = flat_normals[triangle_index];
            let mut corners = [DVec3::ZERO; 3];
            for (corner, &vertex_index) in triangle.iter().enumerate() {
                let key = PositionKey::new(vertices[vertex_index as usize]);
                let mut sum = DVec3::ZERO;
                if let Some(neighbors) = position_faces.get(&key) {
                    for &neighbor in neighbors {
                        let neighbor_normal = flat_normals[neighbor];
                        if own_normal.dot(neighbor_normal) >= threshold_cosine {
                            sum += neighbor_normal;
                        }
                    }
                }
                corners[corner] = if sum.length_squared() > 0.0 {
                    sum.normalize()
                } else {
                    own_normal
                };
            }
            corners
        })
        .collect()
}
