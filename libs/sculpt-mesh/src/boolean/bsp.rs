//! # BSP Tree
//!
//! Binary space partitioning tree driving the boolean clip sequences
//! (csg.js style): `clip_to` removes the parts of one solid inside another,
//! `invert` complements a solid, `all_polygons` collects the survivors.

use super::plane::Plane;
use super::polygon::BspPolygon;

/// A node of the BSP tree.
///
/// Each node holds the polygons coplanar with its splitting plane plus the
/// front and back subtrees.
#[derive(Debug, Default)]
pub struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<BspPolygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

impl BspNode {
    /// Builds a tree from a polygon soup.
    pub fn new(polygons: Vec<BspPolygon>) -> Self {
        let mut root = Self::default();
        root.build(polygons);
        root
    }

    /// Inserts polygons, splitting them down the tree.
    pub fn build(&mut self, polygons: Vec<BspPolygon>) {
        if polygons.is_empty() {
            return;
        }
        if self.plane.is_none() {
            self.plane = Some(*polygons[0].plane());
        }
        let plane = match self.plane {
            Some(plane) => plane,
            None => return,
        };
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            polygon.split(
                &plane,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        // Coplanar polygons of either orientation stay on this node.
        self.polygons.append(&mut coplanar_front);
        self.polygons.append(&mut coplanar_back);
        if !front.is_empty() {
            self.front
                .get_or_insert_with(Default::default)
                .build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Default::default).build(back);
        }
    }

    /// Complements the solid: flips every polygon and swaps the subtrees.
    pub fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            *plane = plane.flipped();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<BspPolygon>) -> Vec<BspPolygon> {
        let plane = match self.plane {
            Some(plane) => plane,
            None => return polygons,
        };
        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in polygons {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            polygon.split(&plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
            front.extend(coplanar_front);
            back.extend(coplanar_back);
        }
        let mut front = match &self.front {
            Some(child) => child.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(child) => child.clip_polygons(back),
            // No back subtree: the back side is solid, those polygons drop.
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Clips this tree's polygons against another tree's solid.
    pub fn clip_to(&mut self, other: &BspNode) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    /// Collects every polygon in the tree.
    pub fn all_polygons(&self) -> Vec<BspPolygon> {
        let mut result = self.polygons.clone();
        if let Some(front) = &self.front {
            result.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            result.extend(back.all_polygons());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn triangle(z: f64) -> BspPolygon {
        BspPolygon::new(vec![
            DVec3::new(0.0, 0.0, z),
            DVec3::new(1.0, 0.0, z),
            DVec3::new(0.0, 1.0, z),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_empty() {
        let tree = BspNode::new(Vec::new());
        assert!(tree.all_polygons().is_empty());
    }

    #[test]
    fn test_collects_all_polygons() {
        let tree = BspNode::new(vec![triangle(0.0), triangle(1.0), triangle(-1.0)]);
        assert_eq!(tree.all_polygons().len(), 3);
    }

    #[test]
    fn test_invert_flips_normals() {
        let original_normal = triangle(0.0).plane().normal();
        let mut tree = BspNode::new(vec![triangle(0.0)]);
        tree.invert();
        let inverted_normal = tree.all_polygons()[0].plane().normal();
        assert!((original_normal + inverted_normal).length() < 1e-12);
    }

    #[test]
    fn test_clip_keeps_front_side() {
        let tree = BspNode::new(vec![triangle(0.0)]);
        // In front of the plane (kept).
        assert_eq!(tree.clip_polygons(vec![triangle(1.0)]).len(), 1);
        // Behind the plane is inside the half-space solid (dropped).
        assert!(tree.clip_polygons(vec![triangle(-1.0)]).is_empty());
    }
}
