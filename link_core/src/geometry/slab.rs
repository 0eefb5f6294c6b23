//! Slab outlines.
//!
//! Boundary and opening polygons pass through in their original order;
//! only their units change. Shape simplification belongs to the host
//! extraction layer.

use super::point::Point3;
use crate::units::LengthUnit;

/// Outer boundary plus openings, all in the same unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlabOutline {
    pub boundary: Vec<Point3>,
    pub openings: Vec<Vec<Point3>>,
}

impl SlabOutline {
    /// Re-express every polygon from `native` units in `target` units.
    pub fn converted(&self, native: LengthUnit, target: LengthUnit) -> SlabOutline {
        SlabOutline {
            boundary: convert_polygon(&self.boundary, native, target),
            openings: self
                .openings
                .iter()
                .map(|opening| convert_polygon(opening, native, target))
                .collect(),
        }
    }
}

/// Convert every vertex of a polygon, preserving order.
pub fn convert_polygon(points: &[Point3], native: LengthUnit, target: LengthUnit) -> Vec<Point3> {
    points.iter().map(|p| p.converted(native, target)).collect()
}
