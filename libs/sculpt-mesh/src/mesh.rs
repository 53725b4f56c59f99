//! # Mesh Data Structure
//!
//! Polygon mesh with vertices and variable-arity faces. The stroke builder
//! emits quads where it can; triangulation happens on demand.

use glam::DVec3;

/// A polygon mesh with vertices and face index lists.
///
/// All geometry calculations use f64 internally.
///
/// # Example
///
/// ```rust
/// use sculpt_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_face(&[0, 1, 2]);
/// assert_eq!(mesh.triangulated().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions.
    vertices: Vec<DVec3>,
    /// Faces as vertex index lists (triangles, quads, or larger polygons).
    faces: Vec<Vec<u32>>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a polygon face by vertex indices.
    pub fn add_face(&mut self, indices: &[u32]) {
        self.faces.push(indices.to_vec());
    }

    /// Returns a reference to the vertices.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns a reference to the faces.
    #[inline]
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    /// Returns the vertex at the given index.
    #[inline]
    pub fn vertex(&self, index: u32) -> DVec3 {
        self.vertices[index as usize]
    }

    /// Fan-triangulates every face.
    ///
    /// Faces with fewer than three vertices are dropped.
    pub fn triangulated(&self) -> Vec<[u32; 3]> {
        triangulate_faces(&self.faces)
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns (min, max) corners; both zero for an empty mesh.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        if self.vertices.is_empty() {
            return (DVec3::ZERO, DVec3::ZERO);
        }
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }
        (min, max)
    }

    /// Translates the mesh by a vector.
    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Mirrors the mesh across the YZ plane.
    ///
    /// Negates X and reverses every face's winding so the surface keeps
    /// facing outward.
    pub fn mirror_x(&mut self) {
        for v in &mut self.vertices {
            v.x = -v.x;
        }
        for face in &mut self.faces {
            face.reverse();
        }
    }

    /// Merges another mesh into this one, offsetting its indices.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        for face in &other.faces {
            self.faces
                .push(face.iter().map(|index| index + offset).collect());
        }
    }
}

/// Fan-triangulates a list of polygon faces.
pub fn triangulate_faces(faces: &[Vec<u32>]) -> Vec<[u32; 3]> {
    let mut triangles = Vec::new();
    for face in faces {
        if face.len() < 3 {
            continue;
        }
        for i in 1..face.len() - 1 {
            triangles.push([face[0], face[i], face[i + 1]]);
        }
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_new() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_mesh_add_vertex() {
        let mut mesh = Mesh::new();
        let index = mesh.add_vertex(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(index, 0);
        assert_eq!(mesh.vertex(0), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_triangulate_quad() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_vertex(DVec3::X);
        mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
        mesh.add_vertex(DVec3::Y);
        mesh.add_face(&[0, 1, 2, 3]);
        let triangles = mesh.triangulated();
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_triangulate_drops_short_faces() {
        assert!(triangulate_faces(&[vec![0, 1]]).is_empty());
    }

    #[test]
    fn test_mesh_bounding_box() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::new(-1.0, -2.0, -3.0));
        mesh.add_vertex(DVec3::new(4.0, 5.0, 6.0));
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(max, DVec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_mesh_mirror_x() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(DVec3::new(2.0, 0.0, 0.0));
        mesh.add_vertex(DVec3::new(1.0, 1.0, 0.0));
        mesh.add_face(&[0, 1, 2]);
        mesh.mirror_x();
        assert_eq!(mesh.vertex(0).x, -1.0);
        assert_eq!(mesh.faces()[0], vec![2, 1, 0]);
    }

    #[test]
    fn test_mesh_merge() {
        let mut first = Mesh::new();
        first.add_vertex(DVec3::ZERO);
        first.add_vertex(DVec3::X);
        first.add_vertex(DVec3::Y);
        first.add_face(&[0, 1, 2]);

        let mut second = Mesh::new();
        second.add_vertex(DVec3::Z);
        second.add_vertex(DVec3::new(1.0, 0.0, 1.0));
        second.add_vertex(DVec3::new(0.0, 1.0, 1.0));
        second.add_face(&[0, 1, 2]);

        first.merge(&second);
        assert_eq!(first.vertex_count(), 6);
        assert_eq!(first.faces()[1], vec![3, 4, 5]);
    }
}
