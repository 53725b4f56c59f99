//! # Spatial Index for Triangle Queries
//!
//! Hash-grid acceleration structure used by the self-intersection scan.
//! Cell size adapts to the mesh extent and triangle count.

use glam::DVec3;
use std::collections::HashMap;

/// Cell size multiplier; larger values mean fewer cells with more triangles
/// per cell.
const CELL_SIZE_FACTOR: f64 = 2.0;

/// Minimum cell size to keep the grid bounded for tiny meshes.
const MIN_CELL_SIZE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord {
    x: i32,
    y: i32,
    z: i32,
}

impl CellCoord {
    fn from_position(position: DVec3, cell_size: f64) -> Self {
        Self {
            x: (position.x / cell_size).floor() as i32,
            y: (position.y / cell_size).floor() as i32,
            z: (position.z / cell_size).floor() as i32,
        }
    }
}

/// Hash grid mapping space onto triangle index lists.
///
/// # Example
///
/// ```rust
/// use sculpt_mesh::SpatialIndex;
/// use glam::DVec3;
///
/// let vertices = [DVec3::ZERO, DVec3::X, DVec3::Y];
/// let triangles = [[0_u32, 1, 2]];
/// let index = SpatialIndex::from_triangles(&vertices, &triangles);
/// let hits = index.query_aabb(DVec3::splat(-0.1), DVec3::splat(1.1));
/// assert_eq!(hits, vec![0]);
/// ```
#[derive(Debug)]
pub struct SpatialIndex {
    grid: HashMap<CellCoord, Vec<usize>>,
    cell_size: f64,
}

impl SpatialIndex {
    /// Builds an index over a triangle list.
    pub fn from_triangles(vertices: &[DVec3], triangles: &[[u32; 3]]) -> Self {
        let mut bounds_min = DVec3::splat(f64::INFINITY);
        let mut bounds_max = DVec3::splat(f64::NEG_INFINITY);
        for v in vertices {
            bounds_min = bounds_min.min(*v);
            bounds_max = bounds_max.max(*v);
        }
        let extent = if vertices.is_empty() {
            DVec3::ZERO
        } else {
            bounds_max - bounds_min
        };
        let average_extent = (extent.x + extent.y + extent.z) / 3.0;
        let cell_size = (average_extent / (triangles.len().max(1) as f64).cbrt()
            * CELL_SIZE_FACTOR)
            .max(MIN_CELL_SIZE);

        let mut grid: HashMap<CellCoord, Vec<usize>> = HashMap::new();
        for (triangle_index, triangle) in triangles.iter().enumerate() {
            let v0 = vertices[triangle[0] as usize];
            let v1 = vertices[triangle[1] as usize];
            let v2 = vertices[triangle[2] as usize];
            let lower = CellCoord::from_position(v0.min(v1).min(v2), cell_size);
            let upper = CellCoord::from_position(v0.max(v1).max(v2), cell_size);
            for x in lower.x..=upper.x {
                for y in lower.y..=upper.y {
                    for z in lower.z..=upper.z {
                        grid.entry(CellCoord { x, y, z })
                            .or_default()
                            .push(triangle_index);
                    }
                }
            }
        }
        Self { grid, cell_size }
    }

    /// Returns the indices of triangles whose cells overlap the box.
    ///
    /// The result is sorted and deduplicated.
    pub fn query_aabb(&self, min: DVec3, max: DVec3) -> Vec<usize> {
        let lower = CellCoord::from_position(min, self.cell_size);
        let upper = CellCoord::from_position(max, self.cell_size);
        let mut result = Vec::new();
        for x in lower.x..=upper.x {
            for y in lower.y..=upper.y {
                for z in lower.z..=upper.z {
                    if let Some(cell) = self.grid.get(&CellCoord { x, y, z }) {
                        result.extend_from_slice(cell);
                    }
                }
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }
}
