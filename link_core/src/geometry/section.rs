//! Beam and column dimensional fields.
//!
//! Width and depth come from the source model's section properties. Only
//! rectangular sections carry usable dimensions: any other shape yields
//! (0, 0) and is reported as unsupported, so callers skip defaulting for
//! it. A section the source cannot describe at all falls back to
//! configured dimensions (0.3 m x 0.5 m unless overridden).

use serde::{Deserialize, Serialize};

use super::point::Point3;
use crate::units::{convert_linear, LengthUnit, Meters};

/// Default width when the section lookup returns nothing (m)
pub const FALLBACK_WIDTH_M: f64 = 0.3;

/// Default depth when the section lookup returns nothing (m)
pub const FALLBACK_DEPTH_M: f64 = 0.5;

/// Section property record as reported by a host, in host-native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionShape {
    Rectangular { width: f64, depth: f64 },
    /// I, T, L, pipe, tube and any other profile
    Other { shape: String },
}

/// Where a [`SectionSize`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionSource {
    /// Read from a rectangular section
    Section,
    /// Lookup unavailable, fallback dimensions applied
    Fallback,
    /// Non-rectangular section; dimensions left at zero
    Unsupported,
}

/// Resolved width/depth in canonical meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSize {
    pub width: f64,
    pub depth: f64,
    pub source: DimensionSource,
}

/// Width/depth of a rectangular section, (0, 0) for anything else.
pub fn rectangular_dimensions(shape: &SectionShape) -> (f64, f64) {
    match shape {
        SectionShape::Rectangular { width, depth } => (*width, *depth),
        SectionShape::Other { .. } => (0.0, 0.0),
    }
}

/// Resolve member dimensions from an optional section lookup.
pub fn resolve_section_size(
    shape: Option<&SectionShape>,
    native: LengthUnit,
    fallback_width: Meters,
    fallback_depth: Meters,
) -> SectionSize {
    match shape {
        None => SectionSize {
            width: fallback_width.value(),
            depth: fallback_depth.value(),
            source: DimensionSource::Fallback,
        },
        Some(shape @ SectionShape::Rectangular { .. }) => {
            let (width, depth) = rectangular_dimensions(shape);
            SectionSize {
                width: convert_linear(width, native, LengthUnit::Meters),
                depth: convert_linear(depth, native, LengthUnit::Meters),
                source: DimensionSource::Section,
            }
        }
        Some(shape @ SectionShape::Other { .. }) => {
            let (width, depth) = rectangular_dimensions(shape);
            SectionSize {
                width,
                depth,
                source: DimensionSource::Unsupported,
            }
        }
    }
}

/// Angle of a column axis away from vertical (radians, 0 for plumb).
///
/// Zero-length axes report 0.
pub fn slant_angle(base: &Point3, top: &Point3) -> f64 {
    let length = base.distance_to(top);
    if length == 0.0 {
        return 0.0;
    }
    let dz = (top.z - base.z).abs();
    (dz / length).clamp(-1.0, 1.0).acos()
}
