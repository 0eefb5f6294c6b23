//! Load data validation
//!
//! Validation never fails fast: every violation is recorded and the caller
//! decides whether the remaining data is still usable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::load_types::{LoadPatternType, LoadShape};
use super::LoadData;
use crate::errors::LinkError;

/// A blocking problem, located by a document path such as
/// `LoadCombinations[2].Factors[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadIssue {
    pub path: String,
    pub error: LinkError,
}

/// A non-blocking observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadWarning {
    pub path: String,
    pub message: String,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<LoadIssue>,
    pub warnings: Vec<LoadWarning>,
}

impl ValidationReport {
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }

    fn error(&mut self, path: String, error: LinkError) {
        self.errors.push(LoadIssue { path, error });
    }

    fn warn(&mut self, path: String, message: String) {
        self.warnings.push(LoadWarning { path, message });
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Validate load definitions, combinations and element assignments.
///
/// Errors:
/// - no load definitions at all
/// - a definition with an empty name, a pattern type outside the
///   vocabulary, or a negative/non-finite self-weight multiplier
/// - a combination with an empty name or no factors
/// - a factor with an empty pattern name, a non-finite value, or naming
///   neither a defined pattern nor another combination
/// - an assignment with an empty pattern, a shape outside the vocabulary,
///   a missing unit tag, or a non-finite value
///
/// Warnings: duplicate definition/combination names, and assignments
/// naming an undefined pattern.
pub fn validate(data: &LoadData) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    if data.load_definitions.is_empty() {
        report.error(
            "LoadDefinitions".to_string(),
            LinkError::invalid_load_definition("LoadDefinitions", "no load definitions"),
        );
    }

    let mut pattern_names = HashSet::new();
    for (i, def) in data.load_definitions.iter().enumerate() {
        let path = format!("LoadDefinitions[{}]", i);
        if is_blank(&def.name) {
            report.error(path.clone(), LinkError::invalid_load_definition(&path, "empty name"));
        } else if !pattern_names.insert(def.name.as_str()) {
            report.warn(path.clone(), format!("duplicate load pattern name '{}'", def.name));
        }
        if let Err(e) = def.load_type.parse::<LoadPatternType>() {
            let context = if is_blank(&def.name) { path.clone() } else { def.name.clone() };
            report.error(
                path.clone(),
                match e {
                    LinkError::InvalidLoadType { load_type, .. } => {
                        LinkError::invalid_load_type(context, load_type)
                    }
                    other => other,
                },
            );
        }
        if !def.self_weight_multiplier.is_finite() || def.self_weight_multiplier < 0.0 {
            report.error(
                path,
                LinkError::invalid_load_definition(
                    &def.name,
                    format!(
                        "self-weight multiplier {} must be finite and non-negative",
                        def.self_weight_multiplier
                    ),
                ),
            );
        }
    }

    let combination_names: HashSet<&str> = data
        .load_combinations
        .iter()
        .map(|c| c.name.as_str())
        .filter(|n| !is_blank(n))
        .collect();

    let mut seen_combinations = HashSet::new();
    for (i, combo) in data.load_combinations.iter().enumerate() {
        let path = format!("LoadCombinations[{}]", i);
        let label = if is_blank(&combo.name) { path.clone() } else { combo.name.clone() };
        if is_blank(&combo.name) {
            report.error(
                path.clone(),
                LinkError::invalid_load_definition(&path, "empty combination name"),
            );
        } else if !seen_combinations.insert(combo.name.as_str()) {
            report.warn(path.clone(), format!("duplicate load combination name '{}'", combo.name));
        }
        if combo.factors.is_empty() {
            report.error(
                path.clone(),
                LinkError::invalid_load_definition(&label, "combination has no factors"),
            );
        }
        for (j, factor) in combo.factors.iter().enumerate() {
            let factor_path = format!("{}.Factors[{}]", path, j);
            if is_blank(&factor.load_pattern) {
                report.error(
                    factor_path,
                    LinkError::invalid_load_definition(
                        &label,
                        format!("factor {} has an empty load pattern", j),
                    ),
                );
                continue;
            }
            if !factor.factor.is_finite() {
                report.error(
                    factor_path.clone(),
                    LinkError::invalid_load_definition(
                        &label,
                        format!("factor for '{}' is not finite", factor.load_pattern),
                    ),
                );
            }
            let pattern = factor.load_pattern.as_str();
            let known = pattern_names.contains(pattern)
                || (pattern != combo.name && combination_names.contains(pattern));
            if !known {
                report.error(
                    factor_path,
                    LinkError::invalid_load_definition(
                        &label,
                        format!("references undefined load pattern '{}'", factor.load_pattern),
                    ),
                );
            }
        }
    }

    for (i, element) in data.elements.iter().enumerate() {
        for (j, load) in element.loads.iter().enumerate() {
            let path = format!("Elements[{}].Loads[{}]", i, j);
            let label = format!("{} load {}", element.element_id, j);
            if is_blank(&load.load_pattern) {
                report.error(
                    path.clone(),
                    LinkError::invalid_load_definition(&label, "empty load pattern"),
                );
            } else if !pattern_names.contains(load.load_pattern.as_str()) {
                report.warn(
                    path.clone(),
                    format!("load pattern '{}' is not defined", load.load_pattern),
                );
            }
            if load.load_type.parse::<LoadShape>().is_err() {
                report.error(path.clone(), LinkError::invalid_load_type(&label, &load.load_type));
            }
            if load.unit.is_none() {
                report.error(
                    path.clone(),
                    LinkError::invalid_load_definition(&label, "missing unit"),
                );
            }
            if !load.value.is_finite() || load.end_value.is_some_and(|v| !v.is_finite()) {
                report.error(
                    path,
                    LinkError::invalid_load_definition(&label, "load value is not finite"),
                );
            }
        }
    }

    report.valid = report.errors.is_empty();
    if report.valid {
        tracing::debug!(warnings = report.warnings.len(), "Load data valid");
    } else {
        tracing::info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Load data failed validation"
        );
    }
    report
}
