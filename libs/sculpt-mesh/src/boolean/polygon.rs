//! # BSP Polygon
//!
//! Convex polygon carried through BSP clipping, with the four-way split
//! used by tree construction and polygon clipping.

use super::plane::{Plane, PointSide};
use glam::DVec3;

/// A convex polygon with its containing plane.
#[derive(Debug, Clone)]
pub struct BspPolygon {
    vertices: Vec<DVec3>,
    plane: Plane,
}

impl BspPolygon {
    /// Creates a polygon from counter-clockwise vertices.
    ///
    /// Returns `None` when no valid plane can be derived (degenerate
    /// slivers are dropped here).
    pub fn new(vertices: Vec<DVec3>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let plane = Plane::from_points(vertices[0], vertices[1], vertices[2])?;
        Some(Self { vertices, plane })
    }

    /// Returns the polygon vertices.
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns the polygon plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Reverses the polygon in place (winding and plane).
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    /// Splits this polygon by a plane into the four csg.js categories.
    ///
    /// Coplanar polygons land in `coplanar_front`/`coplanar_back` by normal
    /// agreement; spanning polygons are cut along the plane, emitting the
    /// interpolated crossing points into both halves.
    pub fn split(
        &self,
        plane: &Plane,
        coplanar_front: &mut Vec<BspPolygon>,
        coplanar_back: &mut Vec<BspPolygon>,
        front: &mut Vec<BspPolygon>,
        back: &mut Vec<BspPolygon>,
    ) {
        let sides: Vec<PointSide> = self.vertices.iter().map(|&v| plane.side(v)).collect();
        let has_front = sides.contains(&PointSide::Front);
        let has_back = sides.contains(&PointSide::Back);

        if !has_front && !has_back {
            if self.plane.normal().dot(plane.normal()) > 0.0 {
                coplanar_front.push(self.clone());
            } else {
                coplanar_back.push(self.clone());
            }
            return;
        }
        if !has_back {
            front.push(self.clone());
            return;
        }
        if !has_front {
            back.push(self.clone());
            return;
        }

        let mut front_vertices = Vec::with_capacity(self.vertices.len() + 1);
        let mut back_vertices = Vec::with_capacity(self.vertices.len() + 1);
        for i in 0..self.vertices.len() {
            let j = (i + 1) % self.vertices.len();
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            let si = sides[i];
            let sj = sides[j];

            if si != PointSide::Back {
                front_vertices.push(vi);
            }
            if si != PointSide::Front {
                back_vertices.push(vi);
            }
            if (si == PointSide::Front && sj == PointSide::Back)
                || (si == PointSide::Back && sj == PointSide::Front)
            {
                let di = plane.signed_distance(vi);
                let dj = plane.signed_distance(vj);
                let t = di / (di - dj);
                let crossing = vi.lerp(vj, t);
                front_vertices.push(crossing);
                back_vertices.push(crossing);
            }
        }
        if let Some(polygon) = BspPolygon::new(front_vertices) {
            front.push(polygon);
        }
        if let Some(polygon) = BspPolygon::new(back_vertices) {
            back.push(polygon);
        }
    }
}
