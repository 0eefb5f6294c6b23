//! Wall centerline derivation from an unordered boundary point set.
//!
//! A wall panel arrives from the source model as a loose set of boundary
//! vertices. The planar centerline is taken from the bottom edge: the
//! points sharing the minimum elevation. When the bottom edge has three or
//! more points, the longer of the first two candidate pairs wins so a
//! rectangular panel yields its long side rather than its thickness.
//!
//! ```rust
//! use link_core::geometry::{derive_wall_frame, Point3};
//!
//! let boundary = [
//!     Point3::new(0.0, 0.0, 3.0),
//!     Point3::new(6.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(6.0, 0.0, 3.0),
//! ];
//! let frame = derive_wall_frame(&boundary);
//! assert_eq!(frame.length, 6.0);
//! assert_eq!(frame.height, 3.0);
//! ```

use serde::{Deserialize, Serialize};

use super::point::Point3;

/// Elevation tolerance for grouping points into the bottom/top edge (1 mm).
pub const WALL_EDGE_TOLERANCE: f64 = 0.001;

/// Canonical planar description of a wall panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallFrame {
    pub start: Point3,
    pub end: Point3,
    /// Distance between start and end (m)
    pub length: f64,
    /// Elevation extent of the boundary (m)
    pub height: f64,
    /// atan2 of the start->end vector (radians, not range-normalized)
    pub orientation: f64,
}

impl WallFrame {
    /// Zeroed frame for boundaries with fewer than two usable points.
    pub fn degenerate() -> Self {
        WallFrame {
            start: Point3::ORIGIN,
            end: Point3::ORIGIN,
            length: 0.0,
            height: 0.0,
            orientation: 0.0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.length == 0.0 && self.height == 0.0
    }
}

/// Planar direction of `start -> end` in radians.
///
/// Reversing the edge flips the angle by π.
pub fn edge_orientation(start: &Point3, end: &Point3) -> f64 {
    (end.y - start.y).atan2(end.x - start.x)
}

/// Derive a wall frame using [`WALL_EDGE_TOLERANCE`].
pub fn derive_wall_frame(points: &[Point3]) -> WallFrame {
    derive_wall_frame_with_tolerance(points, WALL_EDGE_TOLERANCE)
}

/// Derive a wall frame, grouping edge points within `tolerance` of the
/// minimum/maximum elevation.
///
/// Points with non-finite coordinates are not usable and are ignored.
pub fn derive_wall_frame_with_tolerance(points: &[Point3], tolerance: f64) -> WallFrame {
    let usable: Vec<Point3> = points.iter().copied().filter(Point3::is_finite).collect();
    if usable.len() < 2 {
        tracing::debug!(points = points.len(), "Wall boundary is degenerate");
        return WallFrame::degenerate();
    }

    let min_z = usable.iter().map(|p| p.z).fold(f64::INFINITY, f64::min);
    let max_z = usable.iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max);

    let bottom: Vec<Point3> = usable
        .iter()
        .copied()
        .filter(|p| (p.z - min_z).abs() < tolerance)
        .collect();
    let top_count = usable
        .iter()
        .filter(|p| (p.z - max_z).abs() < tolerance)
        .count();

    let (start, end) = if bottom.len() >= 2 {
        let mut edge = (bottom[0], bottom[1]);
        // Only the first two candidate pairs are compared.
        if bottom.len() >= 3
            && bottom[1].distance_to(&bottom[2]) > bottom[0].distance_to(&bottom[1])
        {
            edge = (bottom[1], bottom[2]);
        }
        edge
    } else {
        tracing::warn!(
            bottom = bottom.len(),
            top = top_count,
            "Wall bottom edge has fewer than two points, using raw boundary order"
        );
        (usable[0], usable[1])
    };

    WallFrame {
        start,
        end,
        length: start.distance_to(&end),
        height: max_z - min_z,
        orientation: edge_orientation(&start, &end),
    }
}
