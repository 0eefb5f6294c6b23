//! # Transfer orchestration
//!
//! Runs the pipeline between two host models:
//!
//! 1. [`extract_document`] - read a [`SourceModel`] into a canonical
//!    [`InterchangeDocument`]
//! 2. [`plan_import`] - classify every record against the target's existing
//!    elements and decide an action per record
//! 3. [`apply_import`] - execute the plan through a [`TargetModel`], then
//!    validate, convert and assign the document's loads
//!
//! Each call works only on its inputs. A host failure on one element is
//! recorded and the rest of the batch proceeds; a failure to list elements
//! aborts the current call.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::conflict::{
    classify, plan_resolution, ConflictRecord, ElementDescriptor, PlannedAction, ResolutionPolicy,
};
use crate::errors::{LinkError, LinkResult};
use crate::geometry::{
    convert_polygon, resolve_section_size, DimensionSource, SectionSize, SlabOutline,
};
use crate::host::{DrawCommand, RawFrame, SectionDefinition, SourceModel, TargetModel};
use crate::loads::{prepare, validate, ConversionFailure, LoadData, ValidationReport};
use crate::schema::{
    BeamRecord, ColumnRecord, ElementKind, InterchangeDocument, SlabRecord, WallGeometry,
};
use crate::settings::TransferContext;
use crate::units::{convert_linear, LengthUnit};

// ============================================================================
// Extraction
// ============================================================================

/// Why an element was flagged during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// Section lookup unavailable, fallback dimensions applied
    FallbackSection,
    /// Non-rectangular section, dimensions left at zero
    UnsupportedSection,
    /// Too few points or zero extent; a zeroed record was kept
    DegenerateGeometry,
}

/// A non-fatal observation about one extracted element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionNote {
    pub element: String,
    pub kind: ElementKind,
    pub note: NoteKind,
    pub message: String,
}

/// Result of [`extract_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub document: InterchangeDocument,
    pub notes: Vec<ExtractionNote>,
}

fn frame_size(
    ctx: &TransferContext,
    source: &dyn SourceModel,
    frame: &RawFrame,
    kind: ElementKind,
    notes: &mut Vec<ExtractionNote>,
) -> SectionSize {
    let shape = if frame.section_name.trim().is_empty() {
        None
    } else {
        source.section_shape(&frame.section_name)
    };
    let size = resolve_section_size(
        shape.as_ref(),
        source.length_unit(),
        ctx.settings.fallback_width(),
        ctx.settings.fallback_depth(),
    );
    match size.source {
        DimensionSource::Section => {}
        DimensionSource::Fallback => notes.push(ExtractionNote {
            element: frame.name.clone(),
            kind,
            note: NoteKind::FallbackSection,
            message: format!(
                "section '{}' unavailable, using {} x {} m",
                frame.section_name, size.width, size.depth
            ),
        }),
        DimensionSource::Unsupported => notes.push(ExtractionNote {
            element: frame.name.clone(),
            kind,
            note: NoteKind::UnsupportedSection,
            message: format!("section '{}' is not rectangular", frame.section_name),
        }),
    }
    size
}

fn degenerate_note(name: &str, kind: ElementKind, reason: &str) -> ExtractionNote {
    ExtractionNote {
        element: name.to_string(),
        kind,
        note: NoteKind::DegenerateGeometry,
        message: LinkError::degenerate_geometry(name, reason).to_string(),
    }
}

const ZERO_LENGTH: &str = "zero length";
const ZERO_HEIGHT: &str = "zero height";
const SLAB_TOO_FEW_POINTS: &str = "boundary has fewer than 3 points";
const WALL_TOO_FEW_POINTS: &str = "fewer than 2 usable boundary points";

/// Build a canonical document from a source model.
///
/// Coordinates and dimensions are converted from the source's native unit
/// to meters. Geometry problems are noted and the zeroed record kept;
/// listing failures abort extraction with `HostApiFailure`.
pub fn extract_document(ctx: &TransferContext, source: &dyn SourceModel) -> LinkResult<Extraction> {
    let native = source.length_unit();
    let canonical = LengthUnit::Meters;
    let mut document = InterchangeDocument::new(source.tool_name());
    let mut notes = Vec::new();

    for frame in source.frames(ElementKind::Beam)? {
        let size = frame_size(ctx, source, &frame, ElementKind::Beam, &mut notes);
        let mut beam = BeamRecord::new(
            &frame.name,
            frame.start.converted(native, canonical),
            frame.end.converted(native, canonical),
        )
        .with_section(&frame.section_name, size.width, size.depth);
        beam.material = frame.material;
        beam.rotation = frame.rotation;
        beam.level = frame.base_level.or(frame.top_level);
        if beam.length() == 0.0 {
            notes.push(degenerate_note(&beam.name, ElementKind::Beam, ZERO_LENGTH));
        }
        document.beams.push(beam);
    }

    for frame in source.frames(ElementKind::Column)? {
        let size = frame_size(ctx, source, &frame, ElementKind::Column, &mut notes);
        let mut column = ColumnRecord::new(
            &frame.name,
            frame.start.converted(native, canonical),
            frame.end.converted(native, canonical),
        )
        .with_section(&frame.section_name, size.width, size.depth);
        column.material = frame.material;
        column.rotation = frame.rotation;
        column.base_level = frame.base_level;
        column.top_level = frame.top_level;
        if column.height() == 0.0 {
            notes.push(degenerate_note(&column.name, ElementKind::Column, ZERO_HEIGHT));
        }
        document.columns.push(column);
    }

    for panel in source.panels(ElementKind::Slab)? {
        let outline = SlabOutline {
            boundary: panel.points,
            openings: panel.openings,
        }
        .converted(native, canonical);
        if outline.boundary.len() < 3 {
            notes.push(degenerate_note(&panel.name, ElementKind::Slab, SLAB_TOO_FEW_POINTS));
        }
        let mut slab = SlabRecord::new(
            panel.name,
            outline.boundary,
            convert_linear(panel.thickness, native, canonical),
        );
        slab.openings = outline.openings;
        slab.level = panel.base_level;
        slab.section_name = panel.section_name;
        slab.material = panel.material;
        document.slabs.push(slab);
    }

    for panel in source.panels(ElementKind::Wall)? {
        let points = convert_polygon(&panel.points, native, canonical);
        let mut wall = WallGeometry::from_boundary(
            &panel.name,
            &points,
            convert_linear(panel.thickness, native, canonical),
            ctx.settings.wall_edge_tolerance,
        );
        if wall.is_degenerate() {
            notes.push(degenerate_note(&panel.name, ElementKind::Wall, WALL_TOO_FEW_POINTS));
        }
        wall.base_level = panel.base_level;
        wall.top_level = panel.top_level;
        wall.section_name = panel.section_name;
        wall.material = panel.material;
        wall.load_bearing = panel.load_bearing;
        document.struct_walls.push(wall);
    }

    document.loads = source.load_data()?;

    tracing::info!(
        run = %ctx.run_id,
        source = source.tool_name(),
        beams = document.beams.len(),
        columns = document.columns.len(),
        slabs = document.slabs.len(),
        walls = document.struct_walls.len(),
        loads = document.loads.assignment_count(),
        notes = notes.len(),
        "Extracted interchange document"
    );

    Ok(Extraction { document, notes })
}

// ============================================================================
// Planning
// ============================================================================

/// Decision for one document record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub kind: ElementKind,
    /// Index into the document group for `kind`
    pub index: usize,
    pub conflict: ConflictRecord,
    pub action: PlannedAction,
}

/// Ordered list of decisions produced by [`plan_import`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportPlan {
    pub steps: Vec<PlannedStep>,
}

impl ImportPlan {
    /// Steps that will draw an element
    pub fn creates(&self) -> usize {
        self.steps.iter().filter(|s| s.action != PlannedAction::Skip).count()
    }

    pub fn skips(&self) -> usize {
        self.steps.iter().filter(|s| s.action == PlannedAction::Skip).count()
    }

    /// Steps that were not independent
    pub fn conflicts(&self) -> impl Iterator<Item = &PlannedStep> {
        self.steps.iter().filter(|s| !s.conflict.is_independent())
    }
}

fn document_descriptors(doc: &InterchangeDocument) -> Vec<(ElementKind, usize, ElementDescriptor)> {
    fn tagged<'a, R: 'a>(
        kind: ElementKind,
        records: &'a [R],
    ) -> impl Iterator<Item = (ElementKind, usize, ElementDescriptor)> + 'a
    where
        ElementDescriptor: From<&'a R>,
    {
        records
            .iter()
            .enumerate()
            .map(move |(i, r)| (kind, i, ElementDescriptor::from(r)))
    }
    let beams = tagged(ElementKind::Beam, &doc.beams);
    let columns = tagged(ElementKind::Column, &doc.columns);
    let slabs = tagged(ElementKind::Slab, &doc.slabs);
    let walls = tagged(ElementKind::Wall, &doc.struct_walls);
    beams.chain(columns).chain(slabs).chain(walls).collect()
}

/// Why a record cannot be drawn, if it is degenerate.
fn degeneracy(doc: &InterchangeDocument, kind: ElementKind, index: usize) -> Option<&'static str> {
    match kind {
        ElementKind::Beam => doc
            .beams
            .get(index)
            .filter(|b| b.length() == 0.0)
            .map(|_| ZERO_LENGTH),
        ElementKind::Column => doc
            .columns
            .get(index)
            .filter(|c| c.height() == 0.0)
            .map(|_| ZERO_HEIGHT),
        ElementKind::Slab => doc
            .slabs
            .get(index)
            .filter(|s| s.boundary.len() < 3)
            .map(|_| SLAB_TOO_FEW_POINTS),
        ElementKind::Wall => doc
            .struct_walls
            .get(index)
            .filter(|w| w.is_degenerate())
            .map(|_| WALL_TOO_FEW_POINTS),
    }
}

/// Plan an import using the context's default conflict policy.
pub fn plan_import(
    ctx: &TransferContext,
    doc: &InterchangeDocument,
    target: &dyn TargetModel,
) -> LinkResult<ImportPlan> {
    let policy = ctx.settings.conflict_policy;
    plan_import_with(ctx, doc, target, |_| policy)
}

/// Plan an import, asking `policy_for` how to resolve each duplicate or
/// conflict.
///
/// Records are compared against the target's existing elements and against
/// the records of the same document already planned for creation, so a
/// document never creates two copies of one element unless the policy
/// says so. Degenerate records are classified but never stand in for an
/// element later records could match.
pub fn plan_import_with(
    ctx: &TransferContext,
    doc: &InterchangeDocument,
    target: &dyn TargetModel,
    policy_for: impl Fn(&ConflictRecord) -> ResolutionPolicy,
) -> LinkResult<ImportPlan> {
    let native = target.length_unit();
    let mut known: Vec<ElementDescriptor> = target
        .existing_elements()?
        .into_iter()
        .map(|mut e| {
            e.footprint = e.footprint.converted(native, LengthUnit::Meters);
            e
        })
        .collect();

    let mut plan = ImportPlan::default();
    for (kind, index, descriptor) in document_descriptors(doc) {
        let conflict = classify(&descriptor, &known, ctx.settings.tolerance);
        let action = plan_resolution(&conflict, policy_for(&conflict));
        if degeneracy(doc, kind, index).is_none() {
            match &action {
                PlannedAction::Skip => {}
                PlannedAction::Create => known.push(descriptor),
                PlannedAction::ReplaceExisting { remove } => {
                    known.retain(|e| !remove.contains(&e.id));
                    known.push(descriptor);
                }
            }
        }
        plan.steps.push(PlannedStep {
            kind,
            index,
            conflict,
            action,
        });
    }

    tracing::info!(
        run = %ctx.run_id,
        steps = plan.steps.len(),
        creates = plan.creates(),
        skips = plan.skips(),
        conflicts = plan.conflicts().count(),
        "Planned import"
    );
    Ok(plan)
}

// ============================================================================
// Applying
// ============================================================================

/// An element drawn in the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedElement {
    pub name: String,
    pub kind: ElementKind,
    pub target_id: String,
}

/// A host failure on one element or load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFailure {
    pub element: String,
    pub error: LinkError,
}

/// Outcome of the load stage of an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadImportReport {
    pub validation: ValidationReport,
    pub patterns: usize,
    pub combinations: usize,
    pub assigned: usize,
    pub conversion_failures: Vec<ConversionFailure>,
    pub failures: Vec<ElementFailure>,
}

/// Outcome of [`apply_import`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<CreatedElement>,
    /// Skipped exact duplicates, linked to the target element they duplicate
    pub reused: Vec<CreatedElement>,
    /// Target ids removed by `Replace`
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<ElementFailure>,
    pub loads: Option<LoadImportReport>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self
                .loads
                .as_ref()
                .map_or(true, |l| {
                    l.validation.valid && l.failures.is_empty() && l.conversion_failures.is_empty()
                })
    }

    /// Document element name to target id, for created and reused elements
    pub fn id_map(&self) -> HashMap<String, String> {
        self.created
            .iter()
            .chain(&self.reused)
            .map(|c| (c.name.clone(), c.target_id.clone()))
            .collect()
    }
}

fn section_key(section_name: &str, prefix: impl std::fmt::Display, dims_mm: &[f64]) -> String {
    if !section_name.trim().is_empty() {
        return section_name.to_string();
    }
    let dims: Vec<String> = dims_mm.iter().map(|d| format!("{:.0}", d)).collect();
    format!("{}_{}", prefix, dims.join("x"))
}

/// Section and draw command for one record, in target native units.
fn build_commands(
    doc: &InterchangeDocument,
    kind: ElementKind,
    index: usize,
    native: LengthUnit,
) -> Option<(SectionDefinition, DrawCommand)> {
    let m = LengthUnit::Meters;
    let len = |v: f64| convert_linear(v, m, native);
    let mm = |v: f64| convert_linear(v, m, LengthUnit::Millimeters);

    match kind {
        ElementKind::Beam => {
            let beam = doc.beams.get(index)?;
            let section = section_key(&beam.section_name, kind, &[mm(beam.width), mm(beam.depth)]);
            Some((
                SectionDefinition::Frame {
                    name: section.clone(),
                    material: beam.material.clone(),
                    width: len(beam.width),
                    depth: len(beam.depth),
                },
                DrawCommand::Frame {
                    kind,
                    name: beam.name.clone(),
                    start: beam.start_point.converted(m, native),
                    end: beam.end_point.converted(m, native),
                    section_name: section,
                    rotation: beam.rotation,
                },
            ))
        }
        ElementKind::Column => {
            let column = doc.columns.get(index)?;
            let dims = [mm(column.width), mm(column.depth)];
            let section = section_key(&column.section_name, kind, &dims);
            Some((
                SectionDefinition::Frame {
                    name: section.clone(),
                    material: column.material.clone(),
                    width: len(column.width),
                    depth: len(column.depth),
                },
                DrawCommand::Frame {
                    kind,
                    name: column.name.clone(),
                    start: column.base_point.converted(m, native),
                    end: column.top_point.converted(m, native),
                    section_name: section,
                    rotation: column.rotation,
                },
            ))
        }
        ElementKind::Slab => {
            let slab = doc.slabs.get(index)?;
            let section = section_key(&slab.section_name, kind, &[mm(slab.thickness)]);
            let outline = SlabOutline {
                boundary: slab.boundary.clone(),
                openings: slab.openings.clone(),
            }
            .converted(m, native);
            Some((
                SectionDefinition::Area {
                    name: section.clone(),
                    material: slab.material.clone(),
                    thickness: len(slab.thickness),
                },
                DrawCommand::Area {
                    kind,
                    name: slab.name.clone(),
                    points: outline.boundary,
                    openings: outline.openings,
                    section_name: section,
                },
            ))
        }
        ElementKind::Wall => {
            let wall = doc.struct_walls.get(index)?;
            let section = section_key(&wall.section_name, kind, &[mm(wall.thickness)]);
            Some((
                SectionDefinition::Area {
                    name: section.clone(),
                    material: wall.material.clone(),
                    thickness: len(wall.thickness),
                },
                DrawCommand::Area {
                    kind,
                    name: wall.name.clone(),
                    points: convert_polygon(&wall.corner_points(), m, native),
                    openings: Vec::new(),
                    section_name: section,
                },
            ))
        }
    }
}

/// Execute a plan against the target, then import the document's loads.
///
/// Sections are defined once per name. Degenerate records are never drawn
/// and are reported as `DegenerateGeometry`. A failed delete, section
/// definition or draw is recorded against that element only; a replacement
/// first checks that every element it removes is still in the target.
///
/// Loads are assigned to the target ids of elements created in this run,
/// to the matched target element for skipped exact duplicates, or to the
/// document id unchanged for elements the plan does not cover. Loads of
/// planned elements that were not placed are reported, not assigned.
pub fn apply_import(
    ctx: &TransferContext,
    doc: &InterchangeDocument,
    plan: &ImportPlan,
    target: &mut dyn TargetModel,
) -> ImportReport {
    let native = target.length_unit();
    let mut report = ImportReport::default();
    let mut ids: HashMap<String, String> = HashMap::new();
    let mut defined: HashSet<String> = HashSet::new();

    'steps: for step in &plan.steps {
        let name = step.conflict.proposed.id.clone();

        if let Some(reason) = degeneracy(doc, step.kind, step.index) {
            tracing::warn!(element = %name, reason, "Not drawing degenerate element");
            let error = LinkError::degenerate_geometry(&name, reason);
            report.failures.push(ElementFailure { element: name, error });
            continue;
        }

        match &step.action {
            PlannedAction::Skip => {
                tracing::debug!(element = %name, "Skipping element");
                if let Some(existing) = step.conflict.exact_match() {
                    let target_id =
                        ids.get(existing).cloned().unwrap_or_else(|| existing.to_string());
                    ids.insert(name.clone(), target_id.clone());
                    report.reused.push(CreatedElement {
                        name: name.clone(),
                        kind: step.kind,
                        target_id,
                    });
                }
                report.skipped.push(name);
                continue;
            }
            PlannedAction::ReplaceExisting { remove } => {
                let doomed: Vec<String> = remove
                    .iter()
                    .map(|id| ids.get(id).cloned().unwrap_or_else(|| id.clone()))
                    .collect();
                if doomed.len() > 1 {
                    if let Err(error) = check_present(&*target, &doomed) {
                        tracing::warn!(element = %name, error = %error, "Not replacing elements");
                        report.failures.push(ElementFailure { element: name, error });
                        continue;
                    }
                }

                let mut removed: Vec<String> = Vec::new();
                for target_id in doomed {
                    if let Err(error) = target.delete_element(&target_id) {
                        tracing::warn!(
                            element = %name,
                            existing = %target_id,
                            error = %error,
                            "Could not remove existing element"
                        );
                        let error = if removed.is_empty() {
                            error
                        } else {
                            LinkError::Internal {
                                message: format!(
                                    "replacement stopped after removing {}: {}",
                                    removed.join(", "),
                                    error
                                ),
                            }
                        };
                        report.removed.extend(removed);
                        report.failures.push(ElementFailure { element: name, error });
                        continue 'steps;
                    }
                    removed.push(target_id);
                }
                report.removed.extend(removed);
            }
            PlannedAction::Create => {}
        }

        let Some((section, command)) = build_commands(doc, step.kind, step.index, native) else {
            report.failures.push(ElementFailure {
                element: name,
                error: LinkError::Internal {
                    message: format!("plan refers to missing {} record {}", step.kind, step.index),
                },
            });
            continue;
        };

        if !defined.contains(section.name()) {
            if let Err(error) = target.define_section(&section) {
                tracing::warn!(
                    element = %name,
                    section = section.name(),
                    error = %error,
                    "Could not define section"
                );
                report.failures.push(ElementFailure { element: name, error });
                continue;
            }
            defined.insert(section.name().to_string());
        }

        match target.draw(&command) {
            Ok(target_id) => {
                ids.insert(name.clone(), target_id.clone());
                report.created.push(CreatedElement {
                    name,
                    kind: step.kind,
                    target_id,
                });
            }
            Err(error) => {
                tracing::warn!(element = %name, error = %error, "Could not draw element");
                report.failures.push(ElementFailure { element: name, error });
            }
        }
    }

    if doc.has_loads() {
        let unplaced: HashSet<String> = plan
            .steps
            .iter()
            .map(|s| s.conflict.proposed.id.clone())
            .filter(|name| !ids.contains_key(name))
            .collect();
        report.loads = Some(import_loads(ctx, &doc.loads, &ids, &unplaced, target));
    }

    tracing::info!(
        run = %ctx.run_id,
        created = report.created.len(),
        removed = report.removed.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "Applied import"
    );
    report
}

/// Every id in `ids` still names an element of the target.
fn check_present(target: &dyn TargetModel, ids: &[String]) -> LinkResult<()> {
    let existing = target.existing_elements()?;
    match ids.iter().find(|id| !existing.iter().any(|e| &e.id == *id)) {
        Some(missing) => Err(LinkError::Internal {
            message: format!("{} is no longer in the target, nothing removed", missing),
        }),
        None => Ok(()),
    }
}

/// Validate, convert and assign load data.
///
/// Invalid data is not imported; the validation report says why. Loads
/// whose unit cannot be converted are dropped and listed; the remaining
/// loads are still assigned. `ids` maps document element ids to target ids.
/// Elements in `unplaced` are missing from the target, so their loads are
/// reported as failures instead.
pub fn import_loads(
    ctx: &TransferContext,
    loads: &LoadData,
    ids: &HashMap<String, String>,
    unplaced: &HashSet<String>,
    target: &mut dyn TargetModel,
) -> LoadImportReport {
    let validation = validate(loads);
    let mut report = LoadImportReport {
        validation,
        patterns: 0,
        combinations: 0,
        assigned: 0,
        conversion_failures: Vec::new(),
        failures: Vec::new(),
    };
    if !report.validation.valid {
        tracing::warn!(
            run = %ctx.run_id,
            errors = report.validation.errors.len(),
            "Load data invalid, loads not imported"
        );
        return report;
    }

    let prepared = prepare(loads);
    report.conversion_failures = prepared.failures;

    for definition in &prepared.data.load_definitions {
        match target.define_load_pattern(definition) {
            Ok(()) => report.patterns += 1,
            Err(error) => report.failures.push(ElementFailure {
                element: definition.name.clone(),
                error,
            }),
        }
    }
    for combination in &prepared.data.load_combinations {
        match target.define_combination(combination) {
            Ok(()) => report.combinations += 1,
            Err(error) => report.failures.push(ElementFailure {
                element: combination.name.clone(),
                error,
            }),
        }
    }
    for element in &prepared.data.elements {
        if unplaced.contains(&element.element_id) && !element.loads.is_empty() {
            tracing::warn!(element = %element.element_id, "Loads of an element not in the target");
            report.failures.push(ElementFailure {
                element: element.element_id.clone(),
                error: LinkError::invalid_load_definition(
                    &element.element_id,
                    "element was not placed in the target",
                ),
            });
            continue;
        }
        let target_id = ids.get(&element.element_id).unwrap_or(&element.element_id);
        for load in &element.loads {
            match target.assign_load(target_id, load) {
                Ok(()) => report.assigned += 1,
                Err(error) => {
                    tracing::warn!(
                        element = %element.element_id,
                        error = %error,
                        "Could not assign load"
                    );
                    report.failures.push(ElementFailure {
                        element: element.element_id.clone(),
                        error,
                    });
                }
            }
        }
    }

    tracing::info!(
        run = %ctx.run_id,
        patterns = report.patterns,
        combinations = report.combinations,
        assigned = report.assigned,
        dropped = report.conversion_failures.len(),
        failed = report.failures.len(),
        "Imported loads"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Classification;
    use crate::geometry::{Point3, SectionShape};
    use crate::host::memory::{MemorySource, MemoryTarget};
    use crate::host::{RawFrame, RawPanel};
    use crate::loads::{ElementLoads, LoadAssignment, LoadCombination, LoadDefinition};
    use crate::schema::{deserialize_document, serialize_document};
    use approx::assert_relative_eq;

    fn mm_source() -> MemorySource {
        let mut source = MemorySource::new(LengthUnit::Millimeters);
        source.beams.push(RawFrame::new(
            "B1",
            Point3::new(0.0, 0.0, 3000.0),
            Point3::new(6000.0, 0.0, 3000.0),
            "R300x600",
        ));
        source.beams.push(RawFrame::new(
            "B2",
            Point3::new(0.0, 6000.0, 3000.0),
            Point3::new(6000.0, 6000.0, 3000.0),
            "",
        ));
        source.columns.push(RawFrame::new(
            "C1",
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 3000.0),
            "PIPE200",
        ));
        source.sections.insert(
            "R300x600".to_string(),
            SectionShape::Rectangular {
                width: 300.0,
                depth: 600.0,
            },
        );
        source.sections.insert(
            "PIPE200".to_string(),
            SectionShape::Other {
                shape: "Pipe".to_string(),
            },
        );
        source.slabs.push(RawPanel::new(
            "S1",
            vec![
                Point3::new(0.0, 0.0, 3000.0),
                Point3::new(6000.0, 0.0, 3000.0),
                Point3::new(6000.0, 6000.0, 3000.0),
                Point3::new(0.0, 6000.0, 3000.0),
            ],
            200.0,
        ));
        source.walls.push(RawPanel::new(
            "W1",
            vec![
                Point3::new(6000.0, 0.0, 3000.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 3000.0),
                Point3::new(6000.0, 0.0, 0.0),
            ],
            250.0,
        ));
        source.walls.push(RawPanel::new("W2", vec![Point3::new(1.0, 1.0, 1.0)], 250.0));
        source
    }

    #[test]
    fn test_extract_converts_to_meters() {
        let ctx = TransferContext::default();
        let extraction = extract_document(&ctx, &mm_source()).unwrap();
        let doc = &extraction.document;

        assert_eq!(doc.meta.source_tool, "memory-source");
        assert_eq!(doc.beams.len(), 2);
        assert_relative_eq!(doc.beams[0].length(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(doc.beams[0].width, 0.3, epsilon = 1e-12);
        assert_relative_eq!(doc.beams[0].depth, 0.6, epsilon = 1e-12);
        assert_eq!(doc.beams[1].width, 0.3);
        assert_eq!(doc.beams[1].depth, 0.5);

        assert_eq!(doc.columns[0].width, 0.0);
        assert_eq!(doc.columns[0].slant_angle, 0.0);
        assert_relative_eq!(doc.slabs[0].thickness, 0.2, epsilon = 1e-12);

        let wall = &doc.struct_walls[0];
        assert_relative_eq!(wall.length(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(wall.height, 3.0, epsilon = 1e-9);
        assert_relative_eq!(wall.thickness, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_extract_notes() {
        let extraction = extract_document(&TransferContext::default(), &mm_source()).unwrap();
        let notes: Vec<(&str, NoteKind)> = extraction
            .notes
            .iter()
            .map(|n| (n.element.as_str(), n.note))
            .collect();
        assert_eq!(
            notes,
            vec![
                ("B2", NoteKind::FallbackSection),
                ("C1", NoteKind::UnsupportedSection),
                ("W2", NoteKind::DegenerateGeometry),
            ]
        );
        let degenerate = &extraction.document.struct_walls[1];
        assert_eq!(degenerate.length(), 0.0);
        assert_eq!(degenerate.height, 0.0);
        assert_eq!(degenerate.orientation(), 0.0);
    }

    #[test]
    fn test_extract_uses_configured_fallback() {
        let mut ctx = TransferContext::default();
        ctx.settings.fallback_width = 0.2;
        ctx.settings.fallback_depth = 0.4;
        let doc = extract_document(&ctx, &mm_source()).unwrap().document;
        assert_eq!(doc.beams[1].width, 0.2);
        assert_eq!(doc.beams[1].depth, 0.4);
    }

    #[test]
    fn test_extract_host_failure_aborts() {
        let mut source = mm_source();
        source.failing_kinds.insert(ElementKind::Slab);
        let err = extract_document(&TransferContext::default(), &source).unwrap_err();
        assert_eq!(err.error_code(), "HOST_API_FAILURE");
    }

    fn meters_doc() -> InterchangeDocument {
        let mut doc = InterchangeDocument::new("test");
        doc.beams.push(
            BeamRecord::new("B1", Point3::new(0.0, 0.0, 3.0), Point3::new(6.0, 0.0, 3.0))
                .with_section("R300x600", 0.3, 0.6),
        );
        let (start, end) = (Point3::new(0.0, 5.0, 0.0), Point3::new(6.0, 5.0, 0.0));
        let mut wall = WallGeometry::new("W1", start, end, 3.0, 0.2);
        wall.section_name = "W200".to_string();
        doc.struct_walls.push(wall);
        doc
    }

    #[test]
    fn test_plan_against_existing_in_target_units() {
        let target = MemoryTarget::new(LengthUnit::Millimeters).with_existing(
            ElementDescriptor::segment(
                "T-wall",
                ElementKind::Wall,
                Point3::new(0.0, 5000.0, 0.0),
                Point3::new(6000.0, 5000.0, 0.0),
            )
            .with_section("W200"),
        );
        let plan = plan_import(&TransferContext::default(), &meters_doc(), &target).unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].action, PlannedAction::Create);
        assert_eq!(plan.steps[1].conflict.classification, Classification::ExactDuplicate);
        assert_eq!(plan.steps[1].action, PlannedAction::Skip);
        assert_eq!(plan.creates(), 1);
        assert_eq!(plan.skips(), 1);
    }

    #[test]
    fn test_plan_per_conflict_policy() {
        let target = MemoryTarget::new(LengthUnit::Meters).with_existing(
            ElementDescriptor::segment(
                "T-wall",
                ElementKind::Wall,
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(6.0, 5.0, 0.0),
            )
            .with_section("W300"),
        );
        let plan = plan_import_with(&TransferContext::default(), &meters_doc(), &target, |record| {
            match record.classification {
                Classification::LocationConflict => ResolutionPolicy::Replace,
                _ => ResolutionPolicy::Skip,
            }
        })
        .unwrap();
        assert_eq!(
            plan.steps[1].action,
            PlannedAction::ReplaceExisting {
                remove: vec!["T-wall".to_string()]
            }
        );
    }

    #[test]
    fn test_plan_detects_duplicates_within_document() {
        let mut doc = meters_doc();
        let copy = doc.beams[0].clone();
        doc.beams.push(BeamRecord { name: "B1-copy".to_string(), ..copy });
        let target = MemoryTarget::new(LengthUnit::Meters);

        let plan = plan_import(&TransferContext::default(), &doc, &target).unwrap();
        assert_eq!(plan.steps[1].conflict.classification, Classification::ExactDuplicate);
        assert_eq!(plan.steps[1].conflict.matched_ids(), vec!["B1".to_string()]);
        assert_eq!(plan.steps[1].action, PlannedAction::Skip);

        let ctx = TransferContext::default().with_policy(ResolutionPolicy::CreateBoth);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        assert_eq!(plan.creates(), 3);
    }

    #[test]
    fn test_apply_converts_back_to_target_units() {
        let ctx = TransferContext::default();
        let doc = meters_doc();
        let mut target = MemoryTarget::new(LengthUnit::Feet);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert!(report.is_complete());
        assert_eq!(report.created.len(), 2);
        match &target.drawn[0].1 {
            DrawCommand::Frame { end, section_name, .. } => {
                assert_relative_eq!(end.x, 6.0 / 0.3048, epsilon = 1e-9);
                assert_eq!(section_name, "R300x600");
            }
            other => panic!("expected frame, got {:?}", other),
        }
        match &target.sections[0] {
            SectionDefinition::Frame { width, .. } => {
                assert_relative_eq!(*width, 0.3 / 0.3048, epsilon = 1e-12)
            }
            other => panic!("expected frame section, got {:?}", other),
        }
        match &target.drawn[1].1 {
            DrawCommand::Area { points, .. } => assert_eq!(points.len(), 4),
            other => panic!("expected area, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_records_failures_and_continues() {
        let ctx = TransferContext::default();
        let mut doc = meters_doc();
        let (start, end) = (Point3::new(0.0, 9.0, 3.0), Point3::new(6.0, 9.0, 3.0));
        doc.beams.push(BeamRecord::new("B2", start, end));
        let mut target = MemoryTarget::new(LengthUnit::Meters);
        target.failing_draws.insert("B1".to_string());

        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].element, "B1");
        assert_eq!(report.failures[0].error.error_code(), "HOST_API_FAILURE");
        assert_eq!(target.drawn_names(), vec!["B2", "W1"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_apply_defines_each_section_once() {
        let ctx = TransferContext::default();
        let mut doc = meters_doc();
        doc.beams.push(
            BeamRecord::new("B2", Point3::new(0.0, 9.0, 3.0), Point3::new(6.0, 9.0, 3.0))
                .with_section("R300x600", 0.3, 0.6),
        );
        let (start, end) = (Point3::new(0.0, 12.0, 3.0), Point3::new(6.0, 12.0, 3.0));
        doc.beams.push(BeamRecord::new("B3", start, end));
        let mut target = MemoryTarget::new(LengthUnit::Meters);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        apply_import(&ctx, &doc, &plan, &mut target);

        let names: Vec<&str> = target.sections.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["R300x600", "Beam_300x500", "W200"]);
    }

    #[test]
    fn test_apply_replace_removes_existing() {
        let ctx = TransferContext::default().with_policy(ResolutionPolicy::Replace);
        let doc = meters_doc();
        let mut target = MemoryTarget::new(LengthUnit::Meters).with_existing(
            ElementDescriptor::segment(
                "T-wall",
                ElementKind::Wall,
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(6.0, 5.0, 0.0),
            )
            .with_section("W300"),
        );
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert_eq!(report.removed, vec!["T-wall".to_string()]);
        assert_eq!(target.deleted, vec!["T-wall".to_string()]);
        assert_eq!(report.created.len(), 2);
    }

    #[test]
    fn test_replace_checks_every_element_before_removing() {
        let ctx = TransferContext::default().with_policy(ResolutionPolicy::Replace);
        let doc = meters_doc();
        let mut target = MemoryTarget::new(LengthUnit::Meters)
            .with_existing(ElementDescriptor::segment(
                "T-a",
                ElementKind::Wall,
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(3.0, 5.0, 0.0),
            ))
            .with_existing(ElementDescriptor::segment(
                "T-b",
                ElementKind::Wall,
                Point3::new(3.0, 5.0, 0.0),
                Point3::new(6.0, 5.0, 0.0),
            ));
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        assert_eq!(
            plan.steps[1].action,
            PlannedAction::ReplaceExisting {
                remove: vec!["T-a".to_string(), "T-b".to_string()]
            }
        );

        // T-b disappears between planning and applying
        target.existing.retain(|e| e.id != "T-b");
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert!(target.deleted.is_empty());
        assert!(report.removed.is_empty());
        assert!(target.existing.iter().any(|e| e.id == "T-a"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].element, "W1");
        assert_eq!(target.drawn_names(), vec!["B1"]);
    }

    #[test]
    fn test_apply_never_draws_degenerate_records() {
        let ctx = TransferContext::default();
        let mut doc = meters_doc();
        let corners = [
            ("W0", Point3::new(1.0, 1.0, 1.0)),
            ("W0b", Point3::new(2.0, 2.0, 2.0)),
        ];
        for (name, point) in corners {
            doc.struct_walls
                .push(WallGeometry::from_boundary_default(name, &[point], 0.2));
        }
        let joint = Point3::new(1.0, 1.0, 3.0);
        doc.beams.push(BeamRecord::new("B0", joint, joint));
        doc.loads = LoadData {
            load_definitions: vec![LoadDefinition::new("DL", "DEAD")],
            load_combinations: Vec::new(),
            elements: vec![ElementLoads::new("W0")
                .with_load(LoadAssignment::new("DL", "UNIFORM", 1.5, "kPa"))],
        };
        let mut target = MemoryTarget::new(LengthUnit::Meters);

        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let w0b = plan.steps.iter().find(|s| s.conflict.proposed.id == "W0b").unwrap();
        assert!(w0b.conflict.is_independent());

        let report = apply_import(&ctx, &doc, &plan, &mut target);
        assert_eq!(target.drawn_names(), vec!["B1", "W1"]);
        let failed: Vec<(&str, &str)> = report
            .failures
            .iter()
            .map(|f| (f.element.as_str(), f.error.error_code()))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("B0", "DEGENERATE_GEOMETRY"),
                ("W0", "DEGENERATE_GEOMETRY"),
                ("W0b", "DEGENERATE_GEOMETRY"),
            ]
        );

        let loads = report.loads.as_ref().unwrap();
        assert_eq!(loads.assigned, 0);
        assert_eq!(loads.failures.len(), 1);
        assert_eq!(loads.failures[0].element, "W0");
        assert!(target.assigned.is_empty());
    }

    #[test]
    fn test_skipped_duplicate_loads_follow_existing_element() {
        let ctx = TransferContext::default();
        let mut doc = meters_doc();
        doc.loads = LoadData {
            load_definitions: vec![LoadDefinition::new("DL", "DEAD")],
            load_combinations: Vec::new(),
            elements: vec![ElementLoads::new("W1")
                .with_load(LoadAssignment::new("DL", "UNIFORM", 1.5, "kPa"))],
        };
        let mut target = MemoryTarget::new(LengthUnit::Meters).with_existing(
            ElementDescriptor::segment(
                "T-wall",
                ElementKind::Wall,
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(6.0, 5.0, 0.0),
            )
            .with_section("W200"),
        );
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert_eq!(report.skipped, vec!["W1".to_string()]);
        assert_eq!(report.reused.len(), 1);
        assert_eq!(report.reused[0].target_id, "T-wall");
        assert_eq!(report.id_map()["W1"], "T-wall");
        assert_eq!(report.loads.as_ref().unwrap().assigned, 1);
        assert_eq!(target.assigned.len(), 1);
        assert_eq!(target.assigned[0].0, "T-wall");
    }

    #[test]
    fn test_skipped_conflict_loads_are_not_assigned() {
        let ctx = TransferContext::default();
        let mut doc = meters_doc();
        doc.loads = LoadData {
            load_definitions: vec![LoadDefinition::new("DL", "DEAD")],
            load_combinations: Vec::new(),
            elements: vec![ElementLoads::new("W1")
                .with_load(LoadAssignment::new("DL", "UNIFORM", 1.5, "kPa"))],
        };
        let mut target = MemoryTarget::new(LengthUnit::Meters).with_existing(
            ElementDescriptor::segment(
                "T-wall",
                ElementKind::Wall,
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(6.0, 5.0, 0.0),
            )
            .with_section("W300"),
        );
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);

        assert!(report.reused.is_empty());
        let loads = report.loads.as_ref().unwrap();
        assert_eq!(loads.assigned, 0);
        assert_eq!(loads.failures[0].element, "W1");
        assert_eq!(loads.failures[0].error.error_code(), "INVALID_LOAD_DEFINITION");
    }

    fn loaded_doc() -> InterchangeDocument {
        let mut doc = meters_doc();
        doc.loads = LoadData {
            load_definitions: vec![
                LoadDefinition::new("DL", "DEAD"),
                LoadDefinition::new("LL", "LIVE"),
            ],
            load_combinations: vec![LoadCombination::new("ULS")
                .with_factor("DL", 1.2)
                .with_factor("LL", 1.6)],
            elements: vec![
                ElementLoads::new("B1")
                    .with_load(LoadAssignment::new("LL", "POINT", 1.0, "kip").with_direction(6))
                    .with_load(LoadAssignment::new("LL", "POINT", 1.0, "stone")),
                ElementLoads::new("EXISTING-7")
                    .with_load(LoadAssignment::new("DL", "LINE", 2.0, "kN/m")),
            ],
        };
        doc
    }

    #[test]
    fn test_apply_imports_converted_loads() {
        let ctx = TransferContext::default();
        let doc = loaded_doc();
        let mut target = MemoryTarget::new(LengthUnit::Meters);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);
        let loads = report.loads.as_ref().unwrap();

        assert!(loads.validation.valid);
        assert_eq!(loads.patterns, 2);
        assert_eq!(loads.combinations, 1);
        assert_eq!(loads.assigned, 2);
        assert_eq!(loads.conversion_failures.len(), 1);

        let ids = report.id_map();
        let b1_target = &ids["B1"];
        let (id, load) = &target.assigned[0];
        assert_eq!(id, b1_target);
        assert_relative_eq!(load.value, 4.44822, epsilon = 1e-12);
        assert_eq!(load.unit.as_deref(), Some("kN"));
        assert_eq!(load.direction, 3);
        assert_eq!(target.assigned[1].0, "EXISTING-7");
    }

    #[test]
    fn test_invalid_loads_not_imported() {
        let ctx = TransferContext::default();
        let mut doc = loaded_doc();
        doc.loads.load_combinations.push(LoadCombination::new("EMPTY"));
        let mut target = MemoryTarget::new(LengthUnit::Meters);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);
        let loads = report.loads.as_ref().unwrap();

        assert!(!loads.validation.valid);
        assert_eq!(loads.assigned, 0);
        assert!(target.patterns.is_empty());
        assert!(target.assigned.is_empty());
        assert_eq!(report.created.len(), 2);
    }

    #[test]
    fn test_assignment_failure_is_per_element() {
        let ctx = TransferContext::default();
        let doc = loaded_doc();
        let mut target = MemoryTarget::new(LengthUnit::Meters);
        target.failing_assignments.insert("EXISTING-7".to_string());
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);
        let loads = report.loads.as_ref().unwrap();

        assert_eq!(loads.assigned, 1);
        assert_eq!(loads.failures.len(), 1);
        assert_eq!(loads.failures[0].element, "EXISTING-7");
    }

    #[test]
    fn test_extract_persist_import_round_trip() {
        let ctx = TransferContext::default();
        let extraction = extract_document(&ctx, &mm_source()).unwrap();
        let json = serialize_document(&extraction.document).unwrap();
        let doc = deserialize_document(&json).unwrap();
        assert_eq!(doc, extraction.document);

        let mut target = MemoryTarget::new(LengthUnit::Millimeters);
        let plan = plan_import(&ctx, &doc, &target).unwrap();
        let report = apply_import(&ctx, &doc, &plan, &mut target);
        assert_eq!(report.created.len(), doc.element_count() - 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].element, "W2");

        // Importing the same document again finds only duplicates
        let again = plan_import(&ctx, &doc, &target).unwrap();
        assert_eq!(again.skips(), doc.element_count() - 1);
    }
}
