//! # Combinable Mesh
//!
//! A triangulated, validated mesh wrapper with independent null and
//! combinable states. Construction runs the full validation pipeline:
//! topology sanity, duplicate-vertex welding, fan triangulation, the
//! half-edge-pairing manifold check, and the self-intersection scan.
//!
//! A mesh rejected by validation becomes null. A boolean result can exist
//! (non-null) yet be uncombinable when its triangulation fails the manifold
//! re-check; such meshes are routed to the incombinable island list instead
//! of being folded further.

use crate::error::MeshError;
use crate::intersect::self_intersects;
use crate::manifold::is_manifold;
use crate::mesh::triangulate_faces;
use crate::position_key::PositionKey;
use glam::DVec3;
use std::collections::BTreeMap;

/// Owned triangulated geometry of a non-null combinable mesh.
#[derive(Debug, Clone)]
pub(crate) struct TriMesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// A validated, triangulated mesh handle.
///
/// `is_null` and `is_combinable` are independent: a null mesh is never
/// combinable, but a non-null mesh may be uncombinable.
///
/// # Example
///
/// ```rust
/// use sculpt_mesh::CombinableMesh;
///
/// let mesh = CombinableMesh::null();
/// assert!(mesh.is_null());
/// assert!(!mesh.is_combinable());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombinableMesh {
    data: Option<TriMesh>,
    combinable: bool,
}

impl CombinableMesh {
    /// Creates the null mesh.
    pub fn null() -> Self {
        Self::default()
    }

    /// Builds a combinable mesh from raw geometry, validating it.
    ///
    /// Validation failure yields the null mesh; the rejection reason is
    /// logged, never returned (callers check [`CombinableMesh::is_null`]).
    pub fn new(vertices: &[DVec3], faces: &[Vec<u32>]) -> Self {
        match validate(vertices, faces) {
            Ok(data) => Self {
                data: Some(data),
                combinable: true,
            },
            Err(error) => {
                tracing::warn!(%error, "mesh rejected");
                Self::null()
            }
        }
    }

    /// Wraps already-indexed triangles, trusting the caller's validation.
    ///
    /// Used by the boolean combiner, which re-checks manifoldness itself and
    /// passes the verdict as `combinable`.
    pub(crate) fn from_triangles(
        vertices: Vec<DVec3>,
        triangles: Vec<[u32; 3]>,
        combinable: bool,
    ) -> Self {
        if triangles.is_empty() {
            return Self::null();
        }
        Self {
            data: Some(TriMesh {
                vertices,
                triangles,
            }),
            combinable,
        }
    }

    /// Returns true when no underlying mesh exists (construction failed).
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// Returns true when the mesh is a valid, manifold triangulation that
    /// the boolean combiner accepts.
    pub fn is_combinable(&self) -> bool {
        self.data.is_some() && self.combinable
    }

    /// Returns the vertex positions (empty for the null mesh).
    pub fn vertices(&self) -> &[DVec3] {
        self.data.as_ref().map(|d| d.vertices.as_slice()).unwrap_or(&[])
    }

    /// Returns the triangles (empty for the null mesh).
    pub fn triangles(&self) -> &[[u32; 3]] {
        self.data
            .as_ref()
            .map(|d| d.triangles.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices().len()
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles().len()
    }

    /// Copies out vertex and face buffers, faces as index lists.
    pub fn fetch(&self) -> (Vec<DVec3>, Vec<Vec<u32>>) {
        match &self.data {
            Some(data) => (
                data.vertices.clone(),
                data.triangles.iter().map(|t| t.to_vec()).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        }
    }
}

/// Runs the construction validation pipeline.
fn validate(vertices: &[DVec3], faces: &[Vec<u32>]) -> Result<TriMesh, MeshError> {
    if faces.is_empty() {
        return Err(MeshError::DegenerateGeometry("no faces".to_string()));
    }
    let vertex_count = vertices.len() as u32;
    for face in faces {
        if face.len() < 3 {
            return Err(MeshError::InvalidTopology(format!(
                "face with {} vertices",
                face.len()
            )));
        }
        for &index in face {
            if index >= vertex_count {
                return Err(MeshError::InvalidTopology(format!(
                    "vertex index {index} out of range"
                )));
            }
        }
    }

    // Weld exactly-coincident vertices so shared corners share indices.
    let mut key_to_index: BTreeMap<PositionKey, u32> = BTreeMap::new();
    let mut remap = Vec::with_capacity(vertices.len());
    let mut welded_vertices = Vec::with_capacity(vertices.len());
    for &position in vertices {
        let key = PositionKey::new(position);
        let index = *key_to_index.entry(key).or_insert_with(|| {
            let index = welded_vertices.len() as u32;
            welded_vertices.push(position);
            index
        });
        remap.push(index);
    }
    let mut welded_faces = Vec::with_capacity(faces.len());
    for face in faces {
        let mapped: Vec<u32> = face.iter().map(|&i| remap[i as usize]).collect();
        let mut deduped = mapped.clone();
        deduped.dedup();
        if deduped.last() == deduped.first() && deduped.len() > 1 {
            deduped.pop();
        }
        if deduped.len() < 3 {
            tracing::debug!("dropping face degenerated by vertex welding");
            continue;
        }
        welded_faces.push(deduped);
    }

    let triangles = triangulate_faces(&welded_faces);
    if triangles.is_empty() {
        return Err(MeshError::DegenerateGeometry(
            "triangulation is empty".to_string(),
        ));
    }
    if !is_manifold(&triangles) {
        return Err(MeshError::NonManifold);
    }
    if self_intersects(&welded_vertices, &triangles) {
        return Err(MeshError::SelfIntersecting);
    }
    Ok(TriMesh {
        vertices: welded_vertices,
        triangles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(center: DVec3, half_extent: f64) -> (Vec<DVec3>, Vec<Vec<u32>>) {
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
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
        ];
        (vertices, faces)
    }

    #[test]
    fn test_null_mesh() {
        let mesh = CombinableMesh::null();
        assert!(mesh.is_null());
        assert!(!mesh.is_combinable());
        assert!(mesh.vertices().is_empty());
    }

    #[test]
    fn test_cube_is_combinable() {
        let (vertices, faces) = cube(DVec3::ZERO, 1.0);
        let mesh = CombinableMesh::new(&vertices, &faces);
        assert!(!mesh.is_null());
        assert!(mesh.is_combinable());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(is_manifold(mesh.triangles()));
    }

    #[test]
    fn test_empty_faces_yield_null() {
        let mesh = CombinableMesh::new(&[DVec3::ZERO], &[]);
        assert!(mesh.is_null());
    }

    #[test]
    fn test_open_surface_yields_null() {
        let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let faces = vec![vec![0, 1, 2]];
        let mesh = CombinableMesh::new(&vertices, &faces);
        assert!(mesh.is_null());
    }

    #[test]
    fn test_out_of_range_index_yields_null() {
        let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let faces = vec![vec![0, 1, 9]];
        let mesh = CombinableMesh::new(&vertices, &faces);
        assert!(mesh.is_null());
    }

    #[test]
    fn test_duplicate_vertices_are_welded() {
        // The same cube with every face carrying its own vertex copies.
        let (vertices, faces) = cube(DVec3::ZERO, 1.0);
        let mut exploded_vertices = Vec::new();
        let mut exploded_faces = Vec::new();
        for face in &faces {
            let base = exploded_vertices.len() as u32;
            for &index in face {
                exploded_vertices.push(vertices[index as usize]);
            }
            exploded_faces.push((0..face.len() as u32).map(|i| base + i).collect());
        }
        let mesh = CombinableMesh::new(&exploded_vertices, &exploded_faces);
        assert!(mesh.is_combinable());
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_fetch_round_trip() {
        let (vertices, faces) = cube(DVec3::ZERO, 1.0);
        let mesh = CombinableMesh::new(&vertices, &faces);
        let (fetched_vertices, fetched_faces) = mesh.fetch();
        assert_eq!(fetched_vertices.len(), 8);
        assert_eq!(fetched_faces.len(), 12);
        assert!(fetched_faces.iter().all(|f| f.len() == 3));
    }
}
