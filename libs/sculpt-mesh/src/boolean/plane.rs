//! # Splitting Plane
//!
//! Plane representation for BSP clipping. Points within a thin coplanar
//! band count as on the plane; outside the band the side is decided by
//! exact-arithmetic orientation against the plane's anchor triangle.

use config::constants::PLANE_THICKNESS_EPSILON;
use glam::DVec3;
use robust::{orient3d, Coord3D};

/// Side of a point relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    /// On the normal side of the plane.
    Front,
    /// Opposite the normal.
    Back,
    /// Within the coplanar band.
    Coplanar,
}

/// An oriented plane, anchored on the triangle that defined it.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: DVec3,
    w: f64,
    anchor: [DVec3; 3],
}

fn coord3(v: DVec3) -> Coord3D<f64> {
    Coord3D {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}

impl Plane {
    /// Creates a plane from three points in counter-clockwise order.
    ///
    /// Returns `None` for degenerate (collinear) triples.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let cross = (b - a).cross(c - a);
        let length = cross.length();
        if length < f64::EPSILON {
            return None;
        }
        let normal = cross / length;
        Some(Self {
            normal,
            w: normal.dot(a),
            anchor: [a, b, c],
        })
    }

    /// Returns the unit normal.
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Returns the plane with reversed orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
            anchor: [self.anchor[0], self.anchor[2], self.anchor[1]],
        }
    }

    /// Signed distance from the plane; positive in front.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Classifies a point against the thick plane.
    ///
    /// Outside the coplanar band the sign comes from `robust::orient3d`
    /// against the anchor triangle, so splitting decisions stay consistent
    /// under accumulated floating-point noise.
    pub fn side(&self, point: DVec3) -> PointSide {
        let distance = self.signed_distance(point);
        if distance.abs() <= PLANE_THICKNESS_EPSILON {
            return PointSide::Coplanar;
        }
        let orientation = orient3d(
            coord3(self.anchor[0]),
            coord3(self.anchor[1]),
            coord3(self.anchor[2]),
            coord3(point),
        );
        // orient3d is positive below the ccw anchor triangle, negative on
        // the normal side.
        if orientation < 0.0 {
            PointSide::Front
        } else if orientation > 0.0 {
            PointSide::Back
        } else if distance > 0.0 {
            PointSide::Front
        } else {
            PointSide::Back
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_plane() -> Plane {
        Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::Y).unwrap()
    }

    #[test]
    fn test_from_points_normal() {
        let plane = xy_plane();
        assert!((plane.normal() - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_points_rejected() {
        assert!(Plane::from_points(DVec3::ZERO, DVec3::X, DVec3::new(2.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_side_classification() {
        let plane = xy_plane();
        assert_eq!(plane.side(DVec3::new(0.3, 0.3, 1.0)), PointSide::Front);
        assert_eq!(plane.side(DVec3::new(0.3, 0.3, -1.0)), PointSide::Back);
        assert_eq!(plane.side(DVec3::new(5.0, -2.0, 0.0)), PointSide::Coplanar);
        assert_eq!(
            plane.side(DVec3::new(0.0, 0.0, PLANE_THICKNESS_EPSILON / 2.0)),
            PointSide::Coplanar
        );
    }

    #[test]
    fn test_flipped_reverses_sides() {
        let plane = xy_plane().flipped();
        assert_eq!(plane.side(DVec3::new(0.0, 0.0, 1.0)), PointSide::Back);
        assert_eq!(plane.side(DVec3::new(0.0, 0.0, -1.0)), PointSide::Front);
    }
}
