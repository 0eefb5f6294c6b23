//! Points and axis-aligned bounds in canonical meters.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::units::{convert_linear, LengthUnit};

/// Position in three dimensional space measured in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert host-native coordinates into `target` units.
    pub fn from_native(x: f64, y: f64, z: f64, native: LengthUnit, target: LengthUnit) -> Self {
        Self::new(
            convert_linear(x, native, target),
            convert_linear(y, native, target),
            convert_linear(z, native, target),
        )
    }

    /// Re-express this point (in `from` units) in `to` units.
    pub fn converted(self, from: LengthUnit, to: LengthUnit) -> Self {
        Self::from_native(self.x, self.y, self.z, from, to)
    }

    /// Convert the point into an algebraic vector.
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance_to(&self, other: &Point3) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Coincident within `tolerance` (Euclidean).
    pub fn approx_eq(&self, other: &Point3, tolerance: f64) -> bool {
        self.distance_to(other) <= tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }
}

impl From<Vector3<f64>> for Point3 {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point3> for Vector3<f64> {
    fn from(value: Point3) -> Self {
        value.to_vector()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    /// Bounds of a point set; `None` when the set is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = BoundingBox { min: first, max: first };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.min.z = bounds.min.z.min(p.z);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
            bounds.max.z = bounds.max.z.max(p.z);
        }
        Some(bounds)
    }

    /// Both corners coincide within `tolerance`.
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.min.approx_eq(&other.min, tolerance) && self.max.approx_eq(&other.max, tolerance)
    }

    /// Boxes share a plan area wider than `tolerance` on both axes and
    /// their elevation ranges touch within `tolerance`.
    pub fn overlaps_in_plan(&self, other: &BoundingBox, tolerance: f64) -> bool {
        let overlap_x = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let overlap_y = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        let gap_z = self.min.z.max(other.min.z) - self.max.z.min(other.max.z);
        overlap_x > tolerance && overlap_y > tolerance && gap_z <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert_relative_eq!(a.distance_to(&b), 13.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_conversion() {
        let p = Point3::new(1.0, -2.0, 3.5);
        let v = p.to_vector() * 2.0;
        assert_eq!(Point3::from(v), Point3::new(2.0, -4.0, 7.0));
        assert_eq!(Vector3::from(p), Vector3::new(1.0, -2.0, 3.5));
    }

    #[test]
    fn test_from_native_feet() {
        let p = Point3::from_native(10.0, 0.0, 1.0, LengthUnit::Feet, LengthUnit::Meters);
        assert_relative_eq!(p.x, 3.048, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.3048, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds() {
        let pts = [
            Point3::new(1.0, 5.0, 3.0),
            Point3::new(-2.0, 0.0, 3.0),
            Point3::new(4.0, 2.0, 3.0),
        ];
        let bounds = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bounds.min, Point3::new(-2.0, 0.0, 3.0));
        assert_eq!(bounds.max, Point3::new(4.0, 5.0, 3.0));
        assert!(BoundingBox::from_points(std::iter::empty::<&Point3>()).is_none());
    }

    #[test]
    fn test_plan_overlap() {
        let bounds = |min: Point3, max: Point3| BoundingBox { min, max };
        let a = bounds(Point3::new(0.0, 0.0, 3.0), Point3::new(5.0, 5.0, 3.0));
        let b = bounds(Point3::new(4.0, 4.0, 3.0), Point3::new(8.0, 8.0, 3.0));
        let touching = bounds(Point3::new(5.0, 0.0, 3.0), Point3::new(9.0, 5.0, 3.0));
        let above = bounds(Point3::new(0.0, 0.0, 6.0), Point3::new(5.0, 5.0, 6.0));
        assert!(a.overlaps_in_plan(&b, 0.001));
        assert!(!a.overlaps_in_plan(&touching, 0.001));
        assert!(!a.overlaps_in_plan(&above, 0.001));
    }

    #[test]
    fn test_serialization_field_names() {
        let json = serde_json::to_string(&Point3::new(1.5, -2.0, 0.25)).unwrap();
        assert_eq!(json, r#"{"X":1.5,"Y":-2.0,"Z":0.25}"#);
    }
}
