//! # Duplicate/Conflict Resolver
//!
//! Compares a proposed element against the elements already present in a
//! target model and classifies the relationship:
//!
//! - `ExactDuplicate` - same kind, same location, same section and material
//! - `LocationConflict` - overlapping location but a different section,
//!   material or kind
//! - `Independent` - no geometric overlap
//!
//! The resolver only classifies and plans. Removing or creating elements is
//! done by the caller through [`crate::host::TargetModel`].
//!
//! ## Example
//!
//! ```rust
//! use link_core::conflict::{classify, Classification, ElementDescriptor};
//! use link_core::geometry::Point3;
//! use link_core::schema::ElementKind;
//!
//! let existing = vec![ElementDescriptor::segment(
//!     "W-12", ElementKind::Wall, Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0),
//! ).with_section("RC200")];
//!
//! let proposed = ElementDescriptor::segment(
//!     "W1", ElementKind::Wall, Point3::new(5.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0),
//! ).with_section("rc200");
//!
//! let record = classify(&proposed, &existing, 0.001);
//! assert_eq!(record.classification, Classification::ExactDuplicate);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LinkError;
use crate::geometry::{BoundingBox, Point3};
use crate::schema::{BeamRecord, ColumnRecord, ElementKind, SlabRecord, WallGeometry};
use crate::units::LengthUnit;

// ============================================================================
// Descriptors
// ============================================================================

/// Location an element occupies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Footprint {
    /// Frame axis or wall bottom centerline
    Segment { start: Point3, end: Point3 },
    /// Area element bounds
    Region(BoundingBox),
}

impl Footprint {
    pub fn converted(self, from: LengthUnit, to: LengthUnit) -> Self {
        match self {
            Footprint::Segment { start, end } => Footprint::Segment {
                start: start.converted(from, to),
                end: end.converted(from, to),
            },
            Footprint::Region(b) => Footprint::Region(BoundingBox {
                min: b.min.converted(from, to),
                max: b.max.converted(from, to),
            }),
        }
    }
}

/// The comparable identity of one element, proposed or existing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub id: String,
    pub kind: ElementKind,
    pub section: String,
    pub material: String,
    pub footprint: Footprint,
}

impl ElementDescriptor {
    pub fn segment(id: impl Into<String>, kind: ElementKind, start: Point3, end: Point3) -> Self {
        ElementDescriptor {
            id: id.into(),
            kind,
            section: String::new(),
            material: String::new(),
            footprint: Footprint::Segment { start, end },
        }
    }

    pub fn region(id: impl Into<String>, kind: ElementKind, bounds: BoundingBox) -> Self {
        ElementDescriptor {
            id: id.into(),
            kind,
            section: String::new(),
            material: String::new(),
            footprint: Footprint::Region(bounds),
        }
    }

    /// Set the section identifier (builder pattern)
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Set the material identifier (builder pattern)
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    /// Same section and material, ignoring case and surrounding blanks.
    pub fn same_properties(&self, other: &ElementDescriptor) -> bool {
        same_identifier(&self.section, &other.section)
            && same_identifier(&self.material, &other.material)
    }
}

fn same_identifier(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl From<&BeamRecord> for ElementDescriptor {
    fn from(beam: &BeamRecord) -> Self {
        ElementDescriptor::segment(&beam.name, ElementKind::Beam, beam.start_point, beam.end_point)
            .with_section(&beam.section_name)
            .with_material(&beam.material)
    }
}

impl From<&ColumnRecord> for ElementDescriptor {
    fn from(column: &ColumnRecord) -> Self {
        let (base, top) = (column.base_point, column.top_point);
        ElementDescriptor::segment(&column.name, ElementKind::Column, base, top)
            .with_section(&column.section_name)
            .with_material(&column.material)
    }
}

impl From<&SlabRecord> for ElementDescriptor {
    fn from(slab: &SlabRecord) -> Self {
        let bounds = slab.bounds().unwrap_or(BoundingBox {
            min: Point3::ORIGIN,
            max: Point3::ORIGIN,
        });
        ElementDescriptor::region(&slab.name, ElementKind::Slab, bounds)
            .with_section(&slab.section_name)
            .with_material(&slab.material)
    }
}

impl From<&WallGeometry> for ElementDescriptor {
    fn from(wall: &WallGeometry) -> Self {
        ElementDescriptor::segment(&wall.name, ElementKind::Wall, wall.start(), wall.end())
            .with_section(&wall.section_name)
            .with_material(&wall.material)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Relationship between a proposed element and the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Independent,
    ExactDuplicate,
    LocationConflict,
}

/// One existing element that overlaps the proposed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictMatch {
    pub existing_id: String,
    pub existing_kind: ElementKind,
    pub classification: Classification,
}

/// Outcome of [`classify`].
///
/// `classification` is `ExactDuplicate` if any match is exact, otherwise
/// `LocationConflict` if any match exists, otherwise `Independent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub proposed: ElementDescriptor,
    pub matches: Vec<ConflictMatch>,
    pub classification: Classification,
}

impl ConflictRecord {
    pub fn is_independent(&self) -> bool {
        self.classification == Classification::Independent
    }

    /// Ids of every overlapping existing element
    pub fn matched_ids(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.existing_id.clone()).collect()
    }

    /// Id of the first element this one duplicates exactly
    pub fn exact_match(&self) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.classification == Classification::ExactDuplicate)
            .map(|m| m.existing_id.as_str())
    }
}

fn endpoints_coincide(a: (&Point3, &Point3), b: (&Point3, &Point3), tolerance: f64) -> bool {
    (a.0.approx_eq(b.0, tolerance) && a.1.approx_eq(b.1, tolerance))
        || (a.0.approx_eq(b.1, tolerance) && a.1.approx_eq(b.0, tolerance))
}

/// Both segments lie on one line and share a stretch longer than `tolerance`.
/// Segments meeting at a single joint do not overlap.
fn collinear_overlap(a: (&Point3, &Point3), b: (&Point3, &Point3), tolerance: f64) -> bool {
    let origin = a.0.to_vector();
    let axis = a.1.to_vector() - origin;
    let length = axis.norm();
    if length <= tolerance {
        return false;
    }
    let unit = axis.normalize();

    let mut params = [0.0; 2];
    for (slot, p) in params.iter_mut().zip([b.0, b.1]) {
        let v = p.to_vector() - origin;
        let t = v.dot(&unit);
        if (v - unit * t).norm() > tolerance {
            return false;
        }
        *slot = t;
    }

    let lo = params[0].min(params[1]).max(0.0);
    let hi = params[0].max(params[1]).min(length);
    hi - lo > tolerance
}

/// Compare two footprints: `Some(true)` when they occupy the same place,
/// `Some(false)` when they merely overlap, `None` when apart.
/// A segment never overlaps a region.
fn compare_footprints(a: &Footprint, b: &Footprint, tolerance: f64) -> Option<bool> {
    match (a, b) {
        (Footprint::Segment { start: s1, end: e1 }, Footprint::Segment { start: s2, end: e2 }) => {
            if endpoints_coincide((s1, e1), (s2, e2), tolerance) {
                Some(true)
            } else if collinear_overlap((s1, e1), (s2, e2), tolerance) {
                Some(false)
            } else {
                None
            }
        }
        (Footprint::Region(r1), Footprint::Region(r2)) => {
            if r1.approx_eq(r2, tolerance) {
                Some(true)
            } else if r1.overlaps_in_plan(r2, tolerance) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Classify a proposed element against the existing elements.
///
/// Every existing element is compared; all overlaps are reported in
/// [`ConflictRecord::matches`].
pub fn classify(
    proposed: &ElementDescriptor,
    existing: &[ElementDescriptor],
    tolerance: f64,
) -> ConflictRecord {
    let matches: Vec<ConflictMatch> = existing
        .iter()
        .filter_map(|other| {
            let coincident = compare_footprints(&proposed.footprint, &other.footprint, tolerance)?;
            let exact =
                coincident && proposed.kind == other.kind && proposed.same_properties(other);
            Some(ConflictMatch {
                existing_id: other.id.clone(),
                existing_kind: other.kind,
                classification: if exact {
                    Classification::ExactDuplicate
                } else {
                    Classification::LocationConflict
                },
            })
        })
        .collect();

    let any_exact = matches
        .iter()
        .any(|m| m.classification == Classification::ExactDuplicate);
    let classification = if any_exact {
        Classification::ExactDuplicate
    } else if matches.is_empty() {
        Classification::Independent
    } else {
        Classification::LocationConflict
    };

    tracing::debug!(
        element = %proposed.id,
        kind = %proposed.kind,
        ?classification,
        matches = matches.len(),
        "Classified element"
    );

    ConflictRecord {
        proposed: proposed.clone(),
        matches,
        classification,
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Caller-selected handling of a duplicate or conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    /// Ignore the conflict and create the element anyway
    CreateBoth,
    /// Remove the overlapping elements, then create
    Replace,
    /// Do not create the element
    #[default]
    Skip,
}

impl FromStr for ResolutionPolicy {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "createboth" => Ok(ResolutionPolicy::CreateBoth),
            "replace" => Ok(ResolutionPolicy::Replace),
            "skip" => Ok(ResolutionPolicy::Skip),
            _ => Err(LinkError::Internal {
                message: format!("unknown conflict policy '{}'", s),
            }),
        }
    }
}

/// What the orchestrator should do with one proposed element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedAction {
    Create,
    ReplaceExisting { remove: Vec<String> },
    Skip,
}

/// Turn a classification into an action. Independent elements are always
/// created; the policy decides everything else.
pub fn plan_resolution(record: &ConflictRecord, policy: ResolutionPolicy) -> PlannedAction {
    if record.is_independent() {
        return PlannedAction::Create;
    }
    match policy {
        ResolutionPolicy::CreateBoth => PlannedAction::Create,
        ResolutionPolicy::Replace => PlannedAction::ReplaceExisting {
            remove: record.matched_ids(),
        },
        ResolutionPolicy::Skip => PlannedAction::Skip,
    }
}
