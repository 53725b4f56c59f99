//! # Built-in Cross-Section Templates
//!
//! Named 2D polygons swept along a part's stroke, plus the corner chamfer
//! applied to chamfered parts. Templates live in the unit box so traced
//! templates can be normalized to the same scale.

use glam::DVec2;

/// Fraction of an edge consumed by each chamfer cut.
const CHAMFER_FRACTION: f64 = 0.2;

/// A named built-in cross-section polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutFaceTemplate {
    /// Axis-aligned unit square.
    Quad,
    /// Regular triangle.
    Triangle,
    /// Regular pentagon.
    Pentagon,
    /// Regular hexagon.
    Hexagon,
}

impl CutFaceTemplate {
    /// Parses a template name.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Quad" | "quad" | "" => Some(Self::Quad),
            "Triangle" | "triangle" => Some(Self::Triangle),
            "Pentagon" | "pentagon" => Some(Self::Pentagon),
            "Hexagon" | "hexagon" => Some(Self::Hexagon),
            _ => None,
        }
    }

    /// Returns the template name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quad => "quad",
            Self::Triangle => "triangle",
            Self::Pentagon => "pentagon",
            Self::Hexagon => "hexagon",
        }
    }

    /// Returns the template polygon, counter-clockwise.
    ///
    /// The quad is axis-aligned so box-profile parts sweep flat-sided tubes;
    /// the other templates are regular polygons inscribed in the unit
    /// circle, first vertex at the bottom.
    pub fn points(&self) -> Vec<DVec2> {
        match self {
            Self::Quad => vec![
                DVec2::new(-1.0, -1.0),
                DVec2::new(1.0, -1.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(-1.0, 1.0),
            ],
            Self::Triangle => regular_polygon(3),
            Self::Pentagon => regular_polygon(5),
            Self::Hexagon => regular_polygon(6),
        }
    }
}

fn regular_polygon(sides: usize) -> Vec<DVec2> {
    let step = std::f64::consts::TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let angle = -std::f64::consts::FRAC_PI_2 + step * i as f64;
            DVec2::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Chamfers the corners of a 2D template polygon in place.
///
/// Each corner is replaced by two points pulled toward its neighbors, so an
/// n-gon becomes a 2n-gon with cut corners.
pub fn chamfer_template(points: &mut Vec<DVec2>) {
    if points.len() < 3 {
        return;
    }
    let n = points.len();
    let mut chamfered = Vec::with_capacity(n * 2);
    for i in 0..n {
        let previous = points[(i + n - 1) % n];
        let current = points[i];
        let next = points[(i + 1) % n];
        chamfered.push(current.lerp(previous, CHAMFER_FRACTION));
        chamfered.push(current.lerp(next, CHAMFER_FRACTION));
    }
    *points = chamfered;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(CutFaceTemplate::parse("Quad"), Some(CutFaceTemplate::Quad));
        assert_eq!(
            CutFaceTemplate::parse("Hexagon"),
            Some(CutFaceTemplate::Hexagon)
        );
        // The empty name is the document default.
        assert_eq!(CutFaceTemplate::parse(""), Some(CutFaceTemplate::Quad));
        assert_eq!(CutFaceTemplate::parse("{uuid}"), None);
    }

    #[test]
    fn test_point_counts() {
        assert_eq!(CutFaceTemplate::Quad.points().len(), 4);
        assert_eq!(CutFaceTemplate::Triangle.points().len(), 3);
        assert_eq!(CutFaceTemplate::Pentagon.points().len(), 5);
        assert_eq!(CutFaceTemplate::Hexagon.points().len(), 6);
    }

    #[test]
    fn test_quad_is_counter_clockwise() {
        let points = CutFaceTemplate::Quad.points();
        let mut area = 0.0;
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            area += a.x * b.y - b.x * a.y;
        }
        assert!(area > 0.0);
    }

    #[test]
    fn test_chamfer_doubles_vertex_count() {
        let mut points = CutFaceTemplate::Quad.points();
        chamfer_template(&mut points);
        assert_eq!(points.len(), 8);
        // Chamfered corners stay inside the original box.
        for p in &points {
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_chamfer_ignores_degenerate_input() {
        let mut points = vec![DVec2::ZERO, DVec2::X];
        chamfer_template(&mut points);
        assert_eq!(points.len(), 2);
    }
}
