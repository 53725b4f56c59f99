//! # Boolean Combination
//!
//! Union and difference of combinable meshes with per-output-vertex
//! provenance.
//!
//! ## Contract
//!
//! Both inputs must be non-null and combinable; a violated precondition or
//! a degenerate kernel result yields `None` rather than an error — the
//! caller checks and degrades. Output combinability is re-validated with
//! the manifold check before the result is returned.
//!
//! ## Clip sequences
//!
//! - Union: `a.clip_to(b); b.clip_to(a); b.invert(); b.clip_to(a);
//!   b.invert()`; collect both.
//! - Difference: `a.invert(); a.clip_to(b); b.clip_to(a); b.invert();
//!   b.clip_to(a); b.invert()`; collect both, flip the result.

mod bsp;
mod plane;
mod polygon;

use crate::combinable::CombinableMesh;
use crate::manifold::is_manifold;
use crate::position_key::PositionKey;
use bsp::BspNode;
use glam::DVec3;
use polygon::BspPolygon;
use std::collections::BTreeMap;

/// Boolean combination method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Keep the volume of both inputs.
    Union,
    /// Remove the second input's volume from the first.
    Difference,
}

impl Method {
    /// Returns the expression-id operator marker for this method.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Union => "+",
            Self::Difference => "-",
        }
    }
}

/// Which input mesh an output vertex came from.
///
/// Vertices created at intersection curves match no input position and are
/// recorded as `Unknown`; downstream consumers treat that as "no
/// attribution", not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSource {
    /// From the first input, with its vertex index.
    First(u32),
    /// From the second input, with its vertex index.
    Second(u32),
    /// A new vertex with no exact-position match in either input.
    Unknown,
}

/// A successful boolean combination.
#[derive(Debug, Clone)]
pub struct Combined {
    /// The combined mesh; non-null, possibly uncombinable.
    pub mesh: CombinableMesh,
    /// Provenance of every output vertex.
    pub vertex_sources: Vec<VertexSource>,
}

/// Combines two meshes.
///
/// Returns `None` when either input is null or uncombinable, or when the
/// kernel produces no usable geometry.
///
/// # Example
///
/// ```rust,ignore
/// let combined = combine(&first, &second, Method::Union)?;
/// if combined.mesh.is_combinable() {
///     // fold further
/// }
/// ```
pub fn combine(
    first: &CombinableMesh,
    second: &CombinableMesh,
    method: Method,
) -> Option<Combined> {
    if first.is_null() || !first.is_combinable() || second.is_null() || !second.is_combinable()
    {
        return None;
    }

    let mut provenance: BTreeMap<PositionKey, VertexSource> = BTreeMap::new();
    for (index, &position) in first.vertices().iter().enumerate() {
        provenance
            .entry(PositionKey::new(position))
            .or_insert(VertexSource::First(index as u32));
    }
    for (index, &position) in second.vertices().iter().enumerate() {
        provenance
            .entry(PositionKey::new(position))
            .or_insert(VertexSource::Second(index as u32));
    }

    let polygons_a = mesh_polygons(first);
    let polygons_b = mesh_polygons(second);
    if polygons_a.is_empty() || polygons_b.is_empty() {
        return None;
    }

    let result_polygons = match method {
        Method::Union => {
            let mut a = BspNode::new(polygons_a);
            let mut b = BspNode::new(polygons_b);
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            let mut polygons = a.all_polygons();
            polygons.extend(b.all_polygons());
            polygons
        }
        Method::Difference => {
            let mut a = BspNode::new(polygons_a);
            let mut b = BspNode::new(polygons_b);
            a.invert();
            a.clip_to(&b);
            b.clip_to(&a);
            b.invert();
            b.clip_to(&a);
            b.invert();
            let mut polygons = a.all_polygons();
            polygons.extend(b.all_polygons());
            for polygon in &mut polygons {
                polygon.flip();
            }
            polygons
        }
    };

    if result_polygons.is_empty() {
        tracing::debug!(method = ?method, "boolean produced no polygons");
        return None;
    }

    let (vertices, triangles) = index_polygons(&result_polygons);
    if triangles.is_empty() {
        return None;
    }

    let combinable = is_manifold(&triangles);
    let vertex_sources = vertices
        .iter()
        .map(|&position| {
            provenance
                .get(&PositionKey::new(position))
                .copied()
                .unwrap_or(VertexSource::Unknown)
        })
        .collect();

    Some(Combined {
        mesh: CombinableMesh::from_triangles(vertices, triangles, combinable),
        vertex_sources,
    })
}

/// Converts a combinable mesh's triangles into BSP polygons.
fn mesh_polygons(mesh: &CombinableMesh) -> Vec<BspPolygon> {
    let vertices = mesh.vertices();
    mesh.triangles()
        .iter()
        .filter_map(|triangle| {
            BspPolygon::new(vec![
                vertices[triangle[0] as usize],
                vertices[triangle[1] as usize],
                vertices[triangle[2] as usize],
            ])
        })
        .collect()
}

/// Re-indexes a polygon soup into shared vertices and fan triangles.
///
/// Coincident positions weld onto one index so the manifold re-check sees
/// the stitched surface.
fn index_polygons(polygons: &[BspPolygon]) -> (Vec<DVec3>, Vec<[u32; 3]>) {
    let mut key_to_index: BTreeMap<PositionKey, u32> = BTreeMap::new();
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();
    for polygon in polygons {
        let indices: Vec<u32> = polygon
            .vertices()
            .iter()
            .map(|&position| {
                *key_to_index.entry(PositionKey::new(position)).or_insert_with(|| {
                    let index = vertices.len() as u32;
                    vertices.push(position);
                    index
                })
            })
            .collect();
        // Welding can collapse sliver polygons; emit only real triangles.
        for i in 1..indices.len().saturating_sub(1) {
            let triangle = [indices[0], indices[i], indices[i + 1]];
            if triangle[0] != triangle[1]
                && triangle[1] != triangle[2]
                && triangle[0] != triangle[2]
            {
                triangles.push(triangle);
            }
        }
    }
    (vertices, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combinable_cube(center: DVec3, half_extent: f64) -> CombinableMesh {
        let h = half_extent;
        let vertices = vec![
            center + DVec3::new(-h, -h, -h),
            center + DVec3::new(h, -h, -h),
            center + DVec3::new(h, h, -h),
            center + DVec3::new(-h, h, -h),
            center + DVec3::new(-h, -h, h),
            center + DVec3::new(h, -h, h),
            center + DVec3::new(h, h, h),
            center + DVec3::new(-h, h, h),
        ];
        let faces: Vec<Vec<u32>> = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
        ];
        CombinableMesh::new(&vertices, &faces)
    }

    #[test]
    fn test_combine_rejects_null_input() {
        let a = combinable_cube(DVec3::ZERO, 1.0);
        assert!(combine(&a, &CombinableMesh::null(), Method::Union).is_none());
        assert!(combine(&CombinableMesh::null(), &a, Method::Union).is_none());
    }

    #[test]
    fn test_union_of_disjoint_cubes_concatenates() {
        let a = combinable_cube(DVec3::ZERO, 1.0);
        let b = combinable_cube(DVec3::new(5.0, 0.0, 0.0), 1.0);
        let combined = combine(&a, &b, Method::Union).unwrap();
        assert!(combined.mesh.is_combinable());
        assert_eq!(combined.mesh.vertex_count(), 16);
        assert_eq!(combined.mesh.triangle_count(), 24);
        // Every vertex is attributable to one of the inputs.
        assert!(combined
            .vertex_sources
            .iter()
            .all(|source| *source != VertexSource::Unknown));
    }

    #[test]
    fn test_difference_carves_cavity() {
        let outer = combinable_cube(DVec3::ZERO, 2.0);
        let inner = combinable_cube(DVec3::ZERO, 0.5);
        let combined = combine(&outer, &inner, Method::Difference).unwrap();
        assert!(combined.mesh.is_combinable());
        // Shell plus inverted inner cube.
        assert_eq!(combined.mesh.vertex_count(), 16);
        assert_eq!(combined.mesh.triangle_count(), 24);
        assert!(is_manifold(combined.mesh.triangles()));
    }

    #[test]
    fn test_difference_of_disjoint_cubes_keeps_first() {
        let a = combinable_cube(DVec3::ZERO, 1.0);
        let b = combinable_cube(DVec3::new(10.0, 0.0, 0.0), 1.0);
        let combined = combine(&a, &b, Method::Difference).unwrap();
        assert!(combined.mesh.is_combinable());
        assert_eq!(combined.mesh.vertex_count(), 8);
    }

    #[test]
    fn test_union_provenance_tracks_inputs() {
        let a = combinable_cube(DVec3::ZERO, 1.0);
        let b = combinable_cube(DVec3::new(5.0, 0.0, 0.0), 1.0);
        let combined = combine(&a, &b, Method::Union).unwrap();
        let firsts = combined
            .vertex_sources
            .iter()
            .filter(|s| matches!(s, VertexSource::First(_)))
            .count();
        let seconds = combined
            .vertex_sources
            .iter()
            .filter(|s| matches!(s, VertexSource::Second(_)))
            .count();
        assert_eq!(firsts, 8);
        assert_eq!(seconds, 8);
    }

    #[test]
    fn test_method_markers() {
        assert_eq!(Method::Union.marker(), "+");
        assert_eq!(Method::Difference.marker(), "-");
    }
}
