//! Load definitions, combinations and per-element assignments
//!
//! This module carries the load-transfer substructure of the interchange
//! document and the two pipeline stages that run on it before loads reach
//! the target model.
//!
//! # Overview
//!
//! - [`LoadData`] - `LoadDefinitions`, `LoadCombinations` and `Elements[].Loads`
//! - [`validate`] - accumulate every structural/vocabulary violation
//! - [`prepare`] - convert every assignment to canonical SI units
//!
//! Load types and units are persisted as the strings the source tool
//! reported, so an unknown code survives deserialization and is reported
//! by validation rather than rejected by the parser.
//!
//! # Example
//!
//! ```
//! use link_core::loads::{
//!     prepare, validate, ElementLoads, LoadAssignment, LoadCombination, LoadData, LoadDefinition,
//! };
//!
//! let data = LoadData {
//!     load_definitions: vec![
//!         LoadDefinition::new("DL", "DEAD"),
//!         LoadDefinition::new("LL", "LIVE"),
//!     ],
//!     load_combinations: vec![
//!         LoadCombination::new("1.2D+1.6L")
//!             .with_factor("DL", 1.2)
//!             .with_factor("LL", 1.6),
//!     ],
//!     elements: vec![
//!         ElementLoads::new("B1").with_load(LoadAssignment::new("LL", "LINE", 1.0, "kip/ft")),
//!     ],
//! };
//!
//! let report = validate(&data);
//! assert!(report.valid);
//!
//! let prepared = prepare(&data);
//! assert_eq!(prepared.data.elements[0].loads[0].unit.as_deref(), Some("kN/m"));
//! ```

pub mod conversion;
pub mod load_types;
pub mod validation;

pub use conversion::{convert_assignment, prepare, ConversionFailure, PreparedLoads};
pub use load_types::{LoadPatternType, LoadShape};
pub use validation::{validate, LoadIssue, LoadWarning, ValidationReport};

use serde::{Deserialize, Serialize};

use crate::units::GRAVITY_DIRECTION_CODE;

/// Load transfer payload: patterns, combinations and element loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadData {
    #[serde(default)]
    pub load_definitions: Vec<LoadDefinition>,
    #[serde(default)]
    pub load_combinations: Vec<LoadCombination>,
    #[serde(default)]
    pub elements: Vec<ElementLoads>,
}

impl LoadData {
    pub fn is_empty(&self) -> bool {
        self.load_definitions.is_empty()
            && self.load_combinations.is_empty()
            && self.elements.is_empty()
    }

    /// Total number of per-element assignments
    pub fn assignment_count(&self) -> usize {
        self.elements.iter().map(|e| e.loads.len()).sum()
    }

    pub fn definition(&self, name: &str) -> Option<&LoadDefinition> {
        self.load_definitions.iter().find(|d| d.name == name)
    }
}

/// A named load pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadDefinition {
    pub name: String,
    /// Pattern type code (DEAD, LIVE, ...)
    pub load_type: String,
    /// Multiplier on member self-weight included in this pattern
    #[serde(default)]
    pub self_weight_multiplier: f64,
}

impl LoadDefinition {
    pub fn new(name: impl Into<String>, load_type: impl Into<String>) -> Self {
        LoadDefinition {
            name: name.into(),
            load_type: load_type.into(),
            self_weight_multiplier: 0.0,
        }
    }

    /// Set the self-weight multiplier (builder pattern)
    pub fn with_self_weight(mut self, multiplier: f64) -> Self {
        self.self_weight_multiplier = multiplier;
        self
    }

    /// Parsed pattern type, if the code is in the vocabulary
    pub fn pattern_type(&self) -> Option<LoadPatternType> {
        self.load_type.parse().ok()
    }
}

/// How the factored patterns of a combination are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombinationKind {
    #[default]
    LinearAdd,
    Envelope,
    AbsoluteAdd,
    Srss,
}

/// One (pattern, factor) pair of a combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadFactor {
    pub load_pattern: String,
    pub factor: f64,
}

/// A named, ordered set of factored load patterns.
///
/// # Example
/// ```
/// use link_core::loads::LoadCombination;
///
/// let combo = LoadCombination::new("D+L")
///     .with_factor("DL", 1.0)
///     .with_factor("LL", 1.0);
/// assert_eq!(combo.factor_for("LL"), Some(1.0));
/// assert_eq!(combo.factor_for("WL"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadCombination {
    pub name: String,
    #[serde(default)]
    pub combination_type: CombinationKind,
    #[serde(default)]
    pub factors: Vec<LoadFactor>,
}

impl LoadCombination {
    pub fn new(name: impl Into<String>) -> Self {
        LoadCombination {
            name: name.into(),
            combination_type: CombinationKind::default(),
            factors: Vec::new(),
        }
    }

    /// Append a factor (builder pattern). Order is preserved.
    pub fn with_factor(mut self, load_pattern: impl Into<String>, factor: f64) -> Self {
        self.factors.push(LoadFactor {
            load_pattern: load_pattern.into(),
            factor,
        });
        self
    }

    /// Set the combination kind (builder pattern)
    pub fn with_kind(mut self, kind: CombinationKind) -> Self {
        self.combination_type = kind;
        self
    }

    /// Factor for a pattern (first occurrence)
    pub fn factor_for(&self, load_pattern: &str) -> Option<f64> {
        self.factors
            .iter()
            .find(|f| f.load_pattern == load_pattern)
            .map(|f| f.factor)
    }
}

/// Loads assigned to one element of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ElementLoads {
    pub element_id: String,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub loads: Vec<LoadAssignment>,
}

impl ElementLoads {
    pub fn new(element_id: impl Into<String>) -> Self {
        ElementLoads {
            element_id: element_id.into(),
            element_type: None,
            loads: Vec::new(),
        }
    }

    /// Add a load (builder pattern)
    pub fn with_load(mut self, load: LoadAssignment) -> Self {
        self.loads.push(load);
        self
    }
}

fn default_direction() -> i32 {
    GRAVITY_DIRECTION_CODE
}

/// One load applied to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadAssignment {
    pub load_pattern: String,
    /// Shape code (UNIFORM, LINE, POINT, TRAPEZOIDAL, MOMENT)
    pub load_type: String,
    pub value: f64,
    /// End magnitude of a trapezoidal load, same unit as `value`
    #[serde(default)]
    pub end_value: Option<f64>,
    pub unit: Option<String>,
    /// Host direction code; canonical 1, 2 or 3 after conversion
    #[serde(default = "default_direction")]
    pub direction: i32,
    /// Relative position along the member for point/moment loads (0..1)
    #[serde(default)]
    pub position: Option<f64>,
}

impl LoadAssignment {
    pub fn new(
        load_pattern: impl Into<String>,
        load_type: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        LoadAssignment {
            load_pattern: load_pattern.into(),
            load_type: load_type.into(),
            value,
            end_value: None,
            unit: Some(unit.into()),
            direction: default_direction(),
            position: None,
        }
    }

    /// Set the direction code (builder pattern)
    pub fn with_direction(mut self, direction: i32) -> Self {
        self.direction = direction;
        self
    }

    /// Set the trapezoidal end value (builder pattern)
    pub fn with_end_value(mut self, end_value: f64) -> Self {
        self.end_value = Some(end_value);
        self
    }

    /// Set the relative position (builder pattern)
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    /// Parsed shape, if the code is in the vocabulary
    pub fn shape(&self) -> Option<LoadShape> {
        self.load_type.parse().ok()
    }
}
