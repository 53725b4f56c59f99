//! # Seam Repair
//!
//! Post-combination cleanup: welding near-duplicate vertices along former
//! part boundaries and recovering the original quad topology that
//! triangulation split apart. Both passes are best-effort; anomalies are
//! logged and skipped, never fatal.

use crate::position_key::PositionKey;
use glam::DVec3;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An unordered pair of position keys identifying a shared quad diagonal.
pub type QuadEdgeKey = (PositionKey, PositionKey);

fn quad_edge_key(a: PositionKey, b: PositionKey) -> QuadEdgeKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Records the diagonals of every quad face.
///
/// When a quad is later triangulated, the two triangles share one of these
/// diagonals; [`recover_quads`] uses the set to stitch them back together.
pub fn collect_shared_quad_edges(
    vertices: &[DVec3],
    faces: &[Vec<u32>],
    shared_quad_edges: &mut BTreeSet<QuadEdgeKey>,
) {
    for face in faces {
        if face.len() != 4 {
            continue;
        }
        shared_quad_edges.insert(quad_edge_key(
            PositionKey::new(vertices[face[0] as usize]),
            PositionKey::new(vertices[face[2] as usize]),
        ));
        shared_quad_edges.insert(quad_edge_key(
            PositionKey::new(vertices[face[1] as usize]),
            PositionKey::new(vertices[face[3] as usize]),
        ));
    }
}

/// One seam-weld pass.
///
/// Scans triangle edges shorter than `allowed_smallest_distance` whose
/// endpoints are not protected by `seam_free`, merges the endpoint with
/// fewer adjacent faces into the other, and drops triangles degenerated by
/// the merge. Returns the welded buffers and the number of merges.
pub fn weld_seam(
    vertices: &[DVec3],
    faces: &[Vec<u32>],
    allowed_smallest_distance: f64,
    seam_free: &BTreeSet<PositionKey>,
    welded_vertices: &mut Vec<DVec3>,
    welded_faces: &mut Vec<Vec<u32>>,
) -> usize {
    let squared_limit = allowed_smallest_distance * allowed_smallest_distance;

    let mut adjacent_face_count = vec![0_usize; vertices.len()];
    for face in faces {
        for &index in face {
            if let Some(count) = adjacent_face_count.get_mut(index as usize) {
                *count += 1;
            }
        }
    }

    let mut remap: HashMap<u32, u32> = HashMap::new();
    // Endpoints already involved in a merge this pass; a kept vertex must
    // not be dropped by a later merge or the remap would chain.
    let mut touched: std::collections::HashSet<u32> = std::collections::HashSet::new();
    let mut affected = 0_usize;
    for face in faces {
        for i in 0..face.len() {
            let a = face[i];
            let b = face[(i + 1) % face.len()];
            if a == b || touched.contains(&a) || touched.contains(&b) {
                continue;
            }
            let pa = vertices[a as usize];
            let pb = vertices[b as usize];
            if pa.distance_squared(pb) > squared_limit {
                continue;
            }
            if seam_free.contains(&PositionKey::new(pa))
                || seam_free.contains(&PositionKey::new(pb))
            {
                continue;
            }
            let (dropped, kept) = if adjacent_face_count[a as usize]
                < adjacent_face_count[b as usize]
            {
                (a, b)
            } else {
                (b, a)
            };
            remap.insert(dropped, kept);
            touched.insert(a);
            touched.insert(b);
            affected += 1;
        }
    }

    // Rebuild buffers, dropping unused vertices and degenerate faces.
    let mut old_to_new: HashMap<u32, u32> = HashMap::new();
    for face in faces {
        let mapped: Vec<u32> = face
            .iter()
            .map(|index| *remap.get(index).unwrap_or(index))
            .collect();
        let mut seen = mapped.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() < 3 {
            continue;
        }
        let rebuilt: Vec<u32> = mapped
            .iter()
            .map(|&index| {
                *old_to_new.entry(index).or_insert_with(|| {
                    let new_index = welded_vertices.len() as u32;
                    welded_vertices.push(vertices[index as usize]);
                    new_index
                })
            })
            .collect();
        welded_faces.push(rebuilt);
    }
    affected
}

/// Runs [`weld_seam`] to a fixed point.
///
/// Each productive pass strictly reduces the vertex count, so the loop is
/// additionally bounded by the initial vertex count.
pub fn weld_seam_to_fixed_point(
    vertices: Vec<DVec3>,
    faces: Vec<Vec<u32>>,
    allowed_smallest_distance: f64,
    seam_free: &BTreeSet<PositionKey>,
) -> (Vec<DVec3>, Vec<Vec<u32>>, usize) {
    let mut current_vertices = vertices;
    let mut current_faces = faces;
    let mut total_affected = 0_usize;
    let max_passes = current_vertices.len();
    for _ in 0..=max_passes {
        let mut welded_vertices = Vec::new();
        let mut welded_faces = Vec::new();
        let affected = weld_seam(
            &current_vertices,
            &current_faces,
            allowed_smallest_distance,
            seam_free,
            &mut welded_vertices,
            &mut welded_faces,
        );
        current_vertices = welded_vertices;
        current_faces = welded_faces;
        if affected == 0 {
            break;
        }
        total_affected += affected;
    }
    (current_vertices, current_faces, total_affected)
}

/// Recovers quads across recorded shared diagonals.
///
/// For each diagonal in `shared_quad_edges`, the two triangles sharing it
/// re-emit as one quadrilateral; everything else passes through unchanged.
/// Purely cosmetic — the triangulated mesh is left untouched.
pub fn recover_quads(
    vertices: &[DVec3],
    faces: &[Vec<u32>],
    shared_quad_edges: &BTreeSet<QuadEdgeKey>,
    triangle_and_quads: &mut Vec<Vec<u32>>,
) {
    // Directed diagonal key → (face index, from, to, opposite corner).
    let mut halfedges: BTreeMap<(PositionKey, PositionKey), (usize, u32, u32, u32)> =
        BTreeMap::new();
    for (face_index, face) in faces.iter().enumerate() {
        if face.len() != 3 {
            continue;
        }
        for i in 0..3 {
            let from = face[i];
            let to = face[(i + 1) % 3];
            let opposite = face[(i + 2) % 3];
            let from_key = PositionKey::new(vertices[from as usize]);
            let to_key = PositionKey::new(vertices[to as usize]);
            if !shared_quad_edges.contains(&quad_edge_key(from_key, to_key)) {
                continue;
            }
            if halfedges
                .insert((from_key, to_key), (face_index, from, to, opposite))
                .is_some()
            {
                tracing::debug!("shared quad diagonal used more than once, skipping");
            }
        }
    }

    let mut consumed = vec![false; faces.len()];
    for (&(from_key, to_key), &(face_index, from, to, opposite)) in &halfedges {
        if consumed[face_index] {
            continue;
        }
        // Only handle each diagonal once, from its lexically smaller side.
        if (to_key, from_key) < (from_key, to_key) {
            continue;
        }
        let twin = match halfedges.get(&(to_key, from_key)) {
            Some(&twin) => twin,
            None => {
                tracing::debug!("no twin triangle across shared quad diagonal");
                continue;
            }
        };
        let (twin_face_index, _, _, twin_opposite) = twin;
        if twin_face_index == face_index || consumed[twin_face_index] {
            continue;
        }
        consumed[face_index] = true;
        consumed[twin_face_index] = true;
        triangle_and_quads.push(vec![to, opposite, from, twin_opposite]);
    }

    for (face_index, face) in faces.iter().enumerate() {
        if !consumed[face_index] {
            triangle_and_quads.push(face.clone());
        }
    }
}
