//! Load type vocabularies
//!
//! Two closed vocabularies travel through the interchange document:
//! load *pattern* types (what kind of load a named pattern is) and load
//! *assignment* shapes (how a load is applied to one element). Both are
//! persisted as upper-case codes and parsed case-insensitively.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LinkError;
use crate::units::CanonicalUnit;

/// Load pattern types.
///
/// # Example
/// ```
/// use link_core::loads::LoadPatternType;
///
/// let pattern: LoadPatternType = "superdead".parse().unwrap();
/// assert_eq!(pattern, LoadPatternType::SuperDead);
/// assert_eq!(pattern.code(), "SUPERDEAD");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadPatternType {
    /// Self-weight of structure
    Dead,
    /// Superimposed dead load (finishes, partitions)
    SuperDead,
    /// Occupancy live load
    Live,
    /// Reducible live load
    ReduceLive,
    /// Seismic
    Quake,
    Wind,
    Snow,
    Other,
    /// Notional lateral load
    Notional,
}

impl LoadPatternType {
    /// All pattern types in host order
    pub const ALL: [LoadPatternType; 9] = [
        LoadPatternType::Dead,
        LoadPatternType::SuperDead,
        LoadPatternType::Live,
        LoadPatternType::ReduceLive,
        LoadPatternType::Quake,
        LoadPatternType::Wind,
        LoadPatternType::Snow,
        LoadPatternType::Other,
        LoadPatternType::Notional,
    ];

    /// Persisted code
    pub fn code(&self) -> &'static str {
        match self {
            LoadPatternType::Dead => "DEAD",
            LoadPatternType::SuperDead => "SUPERDEAD",
            LoadPatternType::Live => "LIVE",
            LoadPatternType::ReduceLive => "REDUCELIVE",
            LoadPatternType::Quake => "QUAKE",
            LoadPatternType::Wind => "WIND",
            LoadPatternType::Snow => "SNOW",
            LoadPatternType::Other => "OTHER",
            LoadPatternType::Notional => "NOTIONAL",
        }
    }

    /// Whether this pattern acts downward
    pub fn is_gravity(&self) -> bool {
        matches!(
            self,
            LoadPatternType::Dead
                | LoadPatternType::SuperDead
                | LoadPatternType::Live
                | LoadPatternType::ReduceLive
                | LoadPatternType::Snow
        )
    }
}

impl FromStr for LoadPatternType {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LoadPatternType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LinkError::invalid_load_type("load pattern", s))
    }
}

impl std::fmt::Display for LoadPatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How an assigned load is distributed over its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadShape {
    /// Area load over a slab or wall
    Uniform,
    /// Constant line load along a frame
    Line,
    /// Concentrated force
    Point,
    /// Linearly varying line load
    Trapezoidal,
    /// Concentrated moment
    Moment,
}

impl LoadShape {
    pub const ALL: [LoadShape; 5] = [
        LoadShape::Uniform,
        LoadShape::Line,
        LoadShape::Point,
        LoadShape::Trapezoidal,
        LoadShape::Moment,
    ];

    /// Persisted code
    pub fn code(&self) -> &'static str {
        match self {
            LoadShape::Uniform => "UNIFORM",
            LoadShape::Line => "LINE",
            LoadShape::Point => "POINT",
            LoadShape::Trapezoidal => "TRAPEZOIDAL",
            LoadShape::Moment => "MOMENT",
        }
    }

    /// Canonical unit a load of this shape is expressed in
    pub fn canonical_unit(&self) -> CanonicalUnit {
        match self {
            LoadShape::Uniform => CanonicalUnit::KnPerM2,
            LoadShape::Line | LoadShape::Trapezoidal => CanonicalUnit::KnPerM,
            LoadShape::Point => CanonicalUnit::Kn,
            LoadShape::Moment => CanonicalUnit::KnM,
        }
    }

    /// Canonical unit for a persisted shape code; unknown codes use kN.
    pub fn canonical_unit_for_code(code: &str) -> CanonicalUnit {
        code.parse::<LoadShape>()
            .map(|shape| shape.canonical_unit())
            .unwrap_or(CanonicalUnit::Kn)
    }
}

impl FromStr for LoadShape {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LoadShape::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LinkError::invalid_load_type("load assignment", s))
    }
}

impl std::fmt::Display for LoadShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
