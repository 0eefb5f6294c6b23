//! Load unit conversion
//!
//! [`prepare`] produces a converted copy of a [`LoadData`] batch. Every
//! surviving assignment carries a canonical SI unit tag and a canonical
//! direction code. An assignment whose unit cannot be converted is logged,
//! recorded in [`PreparedLoads::failures`] and left out of the copy; the
//! rest of the batch is still converted.

use serde::{Deserialize, Serialize};

use super::load_types::LoadShape;
use super::{ElementLoads, LoadAssignment, LoadData};
use crate::errors::{LinkError, LinkResult};
use crate::units::{normalize_direction, normalize_load};

/// One assignment that could not be converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionFailure {
    pub element_id: String,
    pub load_index: usize,
    pub load_pattern: String,
    pub error: LinkError,
}

/// Converted copy of a load batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedLoads {
    pub data: LoadData,
    pub converted: usize,
    pub failures: Vec<ConversionFailure>,
}

impl PreparedLoads {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Convert one assignment to canonical units and direction.
///
/// The target unit comes from the shape; unknown shapes target kN. A tag
/// already equal to the target is left untouched.
pub fn convert_assignment(load: &LoadAssignment) -> LinkResult<LoadAssignment> {
    let unit_tag = load
        .unit
        .as_deref()
        .ok_or_else(|| LinkError::unsupported_unit("<missing>"))?;
    let target = LoadShape::canonical_unit_for_code(&load.load_type);

    let (value, unit) = normalize_load(load.value, unit_tag, target)?;
    let end_value = match load.end_value {
        Some(end) => Some(normalize_load(end, unit_tag, target)?.0),
        None => None,
    };

    Ok(LoadAssignment {
        value,
        end_value,
        unit: Some(unit.as_str().to_string()),
        direction: normalize_direction(load.direction).code(),
        ..load.clone()
    })
}

/// Convert every element load of a batch to canonical SI units.
pub fn prepare(data: &LoadData) -> PreparedLoads {
    let mut failures = Vec::new();
    let mut converted = 0;

    let elements = data
        .elements
        .iter()
        .map(|element| {
            let mut loads = Vec::with_capacity(element.loads.len());
            for (index, load) in element.loads.iter().enumerate() {
                match convert_assignment(load) {
                    Ok(load) => {
                        converted += 1;
                        loads.push(load);
                    }
                    Err(error) => {
                        tracing::warn!(
                            element = %element.element_id,
                            load_index = index,
                            load_pattern = %load.load_pattern,
                            error = %error,
                            "Skipping load that could not be converted"
                        );
                        failures.push(ConversionFailure {
                            element_id: element.element_id.clone(),
                            load_index: index,
                            load_pattern: load.load_pattern.clone(),
                            error,
                        });
                    }
                }
            }
            ElementLoads {
                element_id: element.element_id.clone(),
                element_type: element.element_type.clone(),
                loads,
            }
        })
        .collect();

    tracing::info!(converted, failed = failures.len(), "Prepared element loads");

    PreparedLoads {
        data: LoadData {
            load_definitions: data.load_definitions.clone(),
            load_combinations: data.load_combinations.clone(),
            elements,
        },
        converted,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::LoadDefinition;
    use crate::units::CanonicalUnit;
    use approx::assert_relative_eq;

    #[test]
    fn test_convert_point_load() {
        let load = LoadAssignment::new("LL", "POINT", 2.0, "kip").with_direction(6);
        let converted = convert_assignment(&load).unwrap();
        assert_relative_eq!(converted.value, 8.89644, epsilon = 1e-12);
        assert_eq!(converted.unit.as_deref(), Some("kN"));
        assert_eq!(converted.direction, 3);
        assert_eq!(converted.load_pattern, "LL");
    }

    #[test]
    fn test_convert_trapezoidal_scales_both_ends() {
        let load = LoadAssignment::new("DL", "TRAPEZOIDAL", 1.0, "plf").with_end_value(2.0);
        let converted = convert_assignment(&load).unwrap();
        assert_relative_eq!(converted.value, 0.0145939, epsilon = 1e-12);
        assert_relative_eq!(converted.end_value.unwrap(), 0.0291878, epsilon = 1e-12);
        assert_eq!(converted.unit.as_deref(), Some("kN/m"));
    }

    #[test]
    fn test_canonical_load_untouched() {
        let load = LoadAssignment::new("SDL", "UNIFORM", 1.75, "kN/m²").with_direction(2);
        let converted = convert_assignment(&load).unwrap();
        assert_eq!(converted.value, 1.75);
        assert_eq!(converted.unit.as_deref(), Some(CanonicalUnit::KnPerM2.as_str()));
        assert_eq!(converted.direction, 2);
        assert_eq!(convert_assignment(&converted).unwrap(), converted);
    }

    #[test]
    fn test_prepare_continues_past_bad_unit() {
        let data = LoadData {
            load_definitions: vec![LoadDefinition::new("LL", "LIVE")],
            load_combinations: Vec::new(),
            elements: vec![
                ElementLoads::new("B1")
                    .with_load(LoadAssignment::new("LL", "LINE", 1.0, "kip/ft"))
                    .with_load(LoadAssignment::new("LL", "LINE", 1.0, "furlong/fortnight"))
                    .with_load(LoadAssignment::new("LL", "POINT", 100.0, "lb")),
                ElementLoads::new("B2")
                    .with_load(LoadAssignment::new("LL", "MOMENT", 1.0, "kip-ft")),
            ],
        };
        let prepared = prepare(&data);

        assert_eq!(prepared.converted, 3);
        assert_eq!(prepared.failures.len(), 1);
        assert_eq!(prepared.failures[0].element_id, "B1");
        assert_eq!(prepared.failures[0].load_index, 1);
        assert_eq!(
            prepared.failures[0].error,
            LinkError::unsupported_unit("furlong/fortnight")
        );
        assert!(!prepared.is_complete());

        let b1 = &prepared.data.elements[0];
        assert_eq!(b1.loads.len(), 2);
        assert_relative_eq!(b1.loads[0].value, 14.5939, epsilon = 1e-12);
        assert_relative_eq!(b1.loads[1].value, 0.444822, epsilon = 1e-12);
        assert_eq!(prepared.data.elements[1].loads[0].unit.as_deref(), Some("kN·m"));

        // Input is untouched
        assert_eq!(data.elements[0].loads[0].unit.as_deref(), Some("kip/ft"));
    }

    #[test]
    fn test_prepared_units_always_canonical() {
        let data = LoadData {
            elements: vec![ElementLoads::new("W1")
                .with_load(LoadAssignment::new("WL", "UNIFORM", 30.0, "psf_unknown"))
                .with_load(LoadAssignment::new("WL", "UNIFORM", 0.5, "ksf"))
                .with_load(LoadAssignment::new("WL", "UNIFORM", 1.0, "psi"))],
            ..Default::default()
        };
        let prepared = prepare(&data);
        for load in &prepared.data.elements[0].loads {
            let tag = load.unit.as_deref().unwrap();
            assert!(CanonicalUnit::from_tag(tag).is_some(), "non-canonical tag {}", tag);
        }
    }

    #[test]
    fn test_missing_unit_fails() {
        let mut load = LoadAssignment::new("LL", "POINT", 1.0, "kN");
        load.unit = None;
        assert_eq!(convert_assignment(&load).unwrap_err().error_code(), "UNSUPPORTED_UNIT");
    }
}
