//! # Measurement Normalizer
//!
//! Converts host-native measurements into the canonical SI system used by
//! every interchange record:
//! - Length: meters (millimeters where a record asks for them)
//! - Area load: kN/m²
//! - Line load: kN/m
//! - Force: kN
//! - Moment: kN·m
//! - Angle: radians
//!
//! Unit names are looked up case-insensitively in a static alias table and
//! resolved to closed enumerations, so every supported unit carries its
//! canonical target and factor at compile time.
//!
//! ## Example
//!
//! ```rust
//! use link_core::units::{convert_linear, convert_load, CanonicalUnit, LengthUnit};
//!
//! let (value, unit) = convert_load(1.0, "kip").unwrap();
//! assert_eq!(value, 4.44822);
//! assert_eq!(unit, CanonicalUnit::Kn);
//!
//! let meters = convert_linear(12.0, LengthUnit::Feet, LengthUnit::Meters);
//! assert!((meters - 3.6576).abs() < 1e-12);
//! ```

use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Sub};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{LinkError, LinkResult};

// ============================================================================
// Length Units
// ============================================================================

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Meters);
impl_arithmetic!(Millimeters);

/// Linear units a host model may report coordinates and dimensions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Meters,
    Millimeters,
    Centimeters,
    Feet,
    Inches,
}

impl LengthUnit {
    /// Meters per one of this unit
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            LengthUnit::Meters => 1.0,
            LengthUnit::Millimeters => 0.001,
            LengthUnit::Centimeters => 0.01,
            LengthUnit::Feet => 0.3048,
            LengthUnit::Inches => 0.0254,
        }
    }

    /// Short symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Meters => "m",
            LengthUnit::Millimeters => "mm",
            LengthUnit::Centimeters => "cm",
            LengthUnit::Feet => "ft",
            LengthUnit::Inches => "in",
        }
    }

    /// Resolve a host unit name (case-insensitive).
    pub fn from_name(name: &str) -> LinkResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(LengthUnit::Meters),
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => {
                Ok(LengthUnit::Millimeters)
            }
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Ok(LengthUnit::Centimeters)
            }
            "ft" | "foot" | "feet" => Ok(LengthUnit::Feet),
            "in" | "inch" | "inches" => Ok(LengthUnit::Inches),
            _ => Err(LinkError::unsupported_unit(name)),
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Convert a linear measurement between host-native and canonical units.
///
/// Typically `target` is [`LengthUnit::Meters`], or
/// [`LengthUnit::Millimeters`] for records that store section sizes in mm.
pub fn convert_linear(value: f64, native: LengthUnit, target: LengthUnit) -> f64 {
    if native == target {
        return value;
    }
    value * native.meters_per_unit() / target.meters_per_unit()
}

// ============================================================================
// Load Units
// ============================================================================

/// Canonical SI unit a load magnitude is expressed in after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalUnit {
    /// kN/m² (area load)
    KnPerM2,
    /// kN/m (line load)
    KnPerM,
    /// kN (force)
    Kn,
    /// kN·m (moment)
    KnM,
}

impl CanonicalUnit {
    pub const ALL: [CanonicalUnit; 4] = [
        CanonicalUnit::KnPerM2,
        CanonicalUnit::KnPerM,
        CanonicalUnit::Kn,
        CanonicalUnit::KnM,
    ];

    /// The unit tag written into converted load records
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalUnit::KnPerM2 => "kN/m²",
            CanonicalUnit::KnPerM => "kN/m",
            CanonicalUnit::Kn => "kN",
            CanonicalUnit::KnM => "kN·m",
        }
    }

    /// Whether `tag` names this unit (any accepted spelling).
    pub fn matches_tag(&self, tag: &str) -> bool {
        matches!(
            LoadUnit::from_tag(tag),
            Ok(unit) if unit.is_canonical() && unit.canonical() == *self
        )
    }

    /// Resolve a canonical tag (any accepted spelling) back to the enum.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.matches_tag(tag))
    }
}

impl std::fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every load unit the conversion table understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadUnit {
    Ksf,
    KPa,
    KnPerM2,
    Psi,
    KgfPerM2,
    KipPerFt,
    Plf,
    NPerM,
    KnPerM,
    Kip,
    Lb,
    Kgf,
    Kn,
    KipFt,
    KnM,
}

impl LoadUnit {
    /// Canonical SI unit this unit converts to
    pub fn canonical(&self) -> CanonicalUnit {
        match self {
            LoadUnit::Ksf
            | LoadUnit::KPa
            | LoadUnit::KnPerM2
            | LoadUnit::Psi
            | LoadUnit::KgfPerM2 => CanonicalUnit::KnPerM2,
            LoadUnit::KipPerFt | LoadUnit::Plf | LoadUnit::NPerM | LoadUnit::KnPerM => {
                CanonicalUnit::KnPerM
            }
            LoadUnit::Kip | LoadUnit::Lb | LoadUnit::Kgf | LoadUnit::Kn => CanonicalUnit::Kn,
            LoadUnit::KipFt | LoadUnit::KnM => CanonicalUnit::KnM,
        }
    }

    /// Multiplicative factor into the canonical unit
    pub fn factor(&self) -> f64 {
        match self {
            LoadUnit::Ksf => 47.88026,
            LoadUnit::KPa | LoadUnit::KnPerM2 => 1.0,
            LoadUnit::Psi => 6.89476,
            LoadUnit::KgfPerM2 => 0.00980665,
            LoadUnit::KipPerFt => 14.5939,
            LoadUnit::Plf => 0.0145939,
            LoadUnit::NPerM => 0.001,
            LoadUnit::KnPerM => 1.0,
            LoadUnit::Kip => 4.44822,
            LoadUnit::Lb => 0.00444822,
            LoadUnit::Kgf => 0.00980665,
            LoadUnit::Kn => 1.0,
            LoadUnit::KipFt => 1.35582,
            LoadUnit::KnM => 1.0,
        }
    }

    /// True for the four canonical units themselves (kPa is an alias with
    /// factor 1.0 but is not a canonical spelling).
    pub fn is_canonical(&self) -> bool {
        matches!(
            self,
            LoadUnit::KnPerM2 | LoadUnit::KnPerM | LoadUnit::Kn | LoadUnit::KnM
        )
    }

    /// Resolve a unit tag (case-insensitive, surrounding whitespace ignored).
    pub fn from_tag(tag: &str) -> LinkResult<Self> {
        LOAD_UNIT_ALIASES
            .get(tag.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| LinkError::unsupported_unit(tag))
    }
}

/// Lower-cased spellings accepted for each load unit.
static LOAD_UNIT_ALIASES: Lazy<HashMap<&'static str, LoadUnit>> = Lazy::new(|| {
    let entries: &[(&str, LoadUnit)] = &[
        ("ksf", LoadUnit::Ksf),
        ("kpa", LoadUnit::KPa),
        ("kn/m²", LoadUnit::KnPerM2),
        ("kn/m2", LoadUnit::KnPerM2),
        ("kn/m^2", LoadUnit::KnPerM2),
        ("psi", LoadUnit::Psi),
        ("kgf/m²", LoadUnit::KgfPerM2),
        ("kgf/m2", LoadUnit::KgfPerM2),
        ("kip/ft", LoadUnit::KipPerFt),
        ("klf", LoadUnit::KipPerFt),
        ("plf", LoadUnit::Plf),
        ("lb/ft", LoadUnit::Plf),
        ("n/m", LoadUnit::NPerM),
        ("kn/m", LoadUnit::KnPerM),
        ("kip", LoadUnit::Kip),
        ("kips", LoadUnit::Kip),
        ("lb", LoadUnit::Lb),
        ("lbs", LoadUnit::Lb),
        ("lbf", LoadUnit::Lb),
        ("kgf", LoadUnit::Kgf),
        ("kn", LoadUnit::Kn),
        ("kip-ft", LoadUnit::KipFt),
        ("kip·ft", LoadUnit::KipFt),
        ("k-ft", LoadUnit::KipFt),
        ("kn·m", LoadUnit::KnM),
        ("kn-m", LoadUnit::KnM),
        ("kn*m", LoadUnit::KnM),
        ("kn.m", LoadUnit::KnM),
        ("knm", LoadUnit::KnM),
    ];
    entries.iter().copied().collect()
});

/// Convert a load magnitude to its canonical SI unit.
///
/// Canonical tags convert with factor 1.0, so this is idempotent.
///
/// # Errors
///
/// [`LinkError::UnsupportedUnit`] when the tag is not in the table.
pub fn convert_load(value: f64, unit_tag: &str) -> LinkResult<(f64, CanonicalUnit)> {
    let unit = LoadUnit::from_tag(unit_tag)?;
    Ok((value * unit.factor(), unit.canonical()))
}

/// Convert a load magnitude whose shape expects `target`.
///
/// A tag already equal to `target` passes through untouched. Any other tag
/// is converted by table; when the table's canonical unit differs from
/// `target` the table wins and the mismatch is logged.
pub fn normalize_load(
    value: f64,
    unit_tag: &str,
    target: CanonicalUnit,
) -> LinkResult<(f64, CanonicalUnit)> {
    if target.matches_tag(unit_tag) {
        return Ok((value, target));
    }
    let (converted, unit) = convert_load(value, unit_tag)?;
    if unit != target {
        tracing::warn!(
            unit_tag,
            expected = %target,
            resolved = %unit,
            "Load unit does not match the canonical unit for its shape"
        );
    }
    Ok((converted, unit))
}

// ============================================================================
// Load Direction
// ============================================================================

/// Host code for gravity direction
pub const GRAVITY_DIRECTION_CODE: i32 = 10;

/// Host code for projected gravity direction
pub const PROJECTED_GRAVITY_DIRECTION_CODE: i32 = 11;

/// Canonical load direction axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Axis1,
    Axis2,
    Axis3,
}

impl Axis {
    /// Numeric code written into converted records (1, 2 or 3)
    pub fn code(&self) -> i32 {
        match self {
            Axis::Axis1 => 1,
            Axis::Axis2 => 2,
            Axis::Axis3 => 3,
        }
    }
}

/// Map a host direction code onto the canonical axes.
///
/// - 1, 2, 3 (local axes) map to themselves
/// - 4, 5, 6 (global X, Y, Z) map to 1, 2, 3
/// - gravity and projected gravity map to 3
/// - anything else maps to 3
pub fn normalize_direction(code: i32) -> Axis {
    match code {
        1 | 4 => Axis::Axis1,
        2 | 5 => Axis::Axis2,
        3 | 6 | GRAVITY_DIRECTION_CODE | PROJECTED_GRAVITY_DIRECTION_CODE => Axis::Axis3,
        _ => Axis::Axis3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_meters_to_millimeters() {
        let mm: Millimeters = Meters(0.3).into();
        assert_relative_eq!(mm.0, 300.0, epsilon = 1e-12);
        let back: Meters = Millimeters(450.0).into();
        assert_relative_eq!(back.0, 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_arithmetic() {
        let a = Meters(10.0);
        let b = Meters(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_convert_linear() {
        let (m, mm) = (LengthUnit::Meters, LengthUnit::Millimeters);
        assert_relative_eq!(convert_linear(1.0, LengthUnit::Feet, m), 0.3048, epsilon = 1e-12);
        assert_relative_eq!(convert_linear(1.0, LengthUnit::Inches, mm), 25.4, epsilon = 1e-12);
        assert_relative_eq!(convert_linear(2500.0, mm, m), 2.5, epsilon = 1e-12);
        assert_eq!(convert_linear(7.25, LengthUnit::Meters, LengthUnit::Meters), 7.25);
    }

    #[test]
    fn test_length_unit_names() {
        assert_eq!(LengthUnit::from_name("FT").unwrap(), LengthUnit::Feet);
        assert_eq!(LengthUnit::from_name(" mm ").unwrap(), LengthUnit::Millimeters);
        assert!(LengthUnit::from_name("cubit").is_err());
    }

    #[test]
    fn test_convert_load_kip() {
        let (value, unit) = convert_load(1.0, "kip").unwrap();
        assert_eq!(value, 4.44822);
        assert_eq!(unit, CanonicalUnit::Kn);
        assert_eq!(unit.as_str(), "kN");
    }

    #[test]
    fn test_convert_load_unknown() {
        let err = convert_load(1.0, "UNKNOWN").unwrap_err();
        assert_eq!(err, LinkError::unsupported_unit("UNKNOWN"));
    }

    #[test]
    fn test_convert_load_table() {
        let cases = [
            ("ksf", 47.88026, CanonicalUnit::KnPerM2),
            ("kPa", 1.0, CanonicalUnit::KnPerM2),
            ("psi", 6.89476, CanonicalUnit::KnPerM2),
            ("kgf/m²", 0.00980665, CanonicalUnit::KnPerM2),
            ("kip/ft", 14.5939, CanonicalUnit::KnPerM),
            ("plf", 0.0145939, CanonicalUnit::KnPerM),
            ("N/m", 0.001, CanonicalUnit::KnPerM),
            ("lb", 0.00444822, CanonicalUnit::Kn),
            ("kgf", 0.00980665, CanonicalUnit::Kn),
            ("kip-ft", 1.35582, CanonicalUnit::KnM),
        ];
        for (tag, factor, canonical) in cases {
            let (value, unit) = convert_load(2.0, tag).unwrap();
            assert_relative_eq!(value, 2.0 * factor, epsilon = 1e-12);
            assert_eq!(unit, canonical, "unit for {}", tag);
        }
    }

    #[test]
    fn test_convert_load_case_insensitive() {
        assert_eq!(convert_load(1.0, "KSF").unwrap(), convert_load(1.0, "ksf").unwrap());
        assert_eq!(convert_load(3.0, "KN/M2").unwrap(), (3.0, CanonicalUnit::KnPerM2));
    }

    #[test]
    fn test_convert_load_idempotent() {
        for unit in CanonicalUnit::ALL {
            let (value, tag) = convert_load(12.5, unit.as_str()).unwrap();
            assert_eq!(value, 12.5);
            assert_eq!(tag, unit);
            let (again, tag_again) = convert_load(value, tag.as_str()).unwrap();
            assert_eq!(again, value);
            assert_eq!(tag_again, tag);
        }
    }

    #[test]
    fn test_normalize_load_passthrough() {
        let (value, unit) = normalize_load(3.3, "kN/m", CanonicalUnit::KnPerM).unwrap();
        assert_eq!(value, 3.3);
        assert_eq!(unit, CanonicalUnit::KnPerM);
    }

    #[test]
    fn test_normalize_load_converts() {
        let (value, unit) = normalize_load(1.0, "ksf", CanonicalUnit::KnPerM2).unwrap();
        assert_eq!(value, 47.88026);
        assert_eq!(unit, CanonicalUnit::KnPerM2);
    }

    #[test]
    fn test_kpa_is_not_a_canonical_spelling() {
        assert!(!CanonicalUnit::KnPerM2.matches_tag("kPa"));
        assert!(CanonicalUnit::KnPerM2.matches_tag("kN/m2"));
        assert_eq!(CanonicalUnit::from_tag("kN-m"), Some(CanonicalUnit::KnM));
        assert_eq!(CanonicalUnit::from_tag("kip"), None);
    }

    #[test]
    fn test_normalize_direction() {
        assert_eq!(normalize_direction(1), Axis::Axis1);
        assert_eq!(normalize_direction(2), Axis::Axis2);
        assert_eq!(normalize_direction(3), Axis::Axis3);
        assert_eq!(normalize_direction(4), Axis::Axis1);
        assert_eq!(normalize_direction(5), Axis::Axis2);
        assert_eq!(normalize_direction(6), Axis::Axis3);
        assert_eq!(normalize_direction(GRAVITY_DIRECTION_CODE), Axis::Axis3);
        assert_eq!(normalize_direction(-4), Axis::Axis3);
        assert_eq!(normalize_direction(99), Axis::Axis3);
    }
}
