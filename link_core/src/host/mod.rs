//! Host model boundary.
//!
//! The core never holds a native reference into a host tool. Instead a host
//! integration implements one of two narrow traits that exchange plain
//! values:
//!
//! - [`SourceModel`] - read elements, sections and loads from the model the
//!   document is extracted from (values in the host's native length unit)
//! - [`TargetModel`] - define sections, draw elements and assign loads in the
//!   model the document is imported into (values in the target's native
//!   length unit; loads in canonical SI units)
//!
//! Calls into a host API must be serialized by the integration layer; the
//! traits take `&self`/`&mut self` and make no threading assumptions.

#[cfg(test)]
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::conflict::ElementDescriptor;
use crate::errors::LinkResult;
use crate::geometry::{Point3, SectionShape};
use crate::loads::{LoadAssignment, LoadCombination, LoadData, LoadDefinition};
use crate::schema::ElementKind;
use crate::units::LengthUnit;

/// A beam or column as reported by the source, in native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub name: String,
    pub start: Point3,
    pub end: Point3,
    pub section_name: String,
    pub material: String,
    /// Rotation about the member axis (radians)
    pub rotation: f64,
    pub base_level: Option<String>,
    pub top_level: Option<String>,
}

impl RawFrame {
    pub fn new(
        name: impl Into<String>,
        start: Point3,
        end: Point3,
        section_name: impl Into<String>,
    ) -> Self {
        RawFrame {
            name: name.into(),
            start,
            end,
            section_name: section_name.into(),
            material: String::new(),
            rotation: 0.0,
            base_level: None,
            top_level: None,
        }
    }
}

/// A slab or wall as reported by the source, in native units.
///
/// `points` is the outer boundary. For slabs it is ordered; for walls it is
/// the unordered set of panel reference points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPanel {
    pub name: String,
    pub points: Vec<Point3>,
    pub openings: Vec<Vec<Point3>>,
    pub thickness: f64,
    pub section_name: String,
    pub material: String,
    pub base_level: Option<String>,
    pub top_level: Option<String>,
    pub load_bearing: bool,
}

impl RawPanel {
    pub fn new(name: impl Into<String>, points: Vec<Point3>, thickness: f64) -> Self {
        RawPanel {
            name: name.into(),
            points,
            openings: Vec::new(),
            thickness,
            section_name: String::new(),
            material: String::new(),
            base_level: None,
            top_level: None,
            load_bearing: true,
        }
    }
}

/// Section to define in the target before drawing, in target native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionDefinition {
    Frame {
        name: String,
        material: String,
        width: f64,
        depth: f64,
    },
    Area {
        name: String,
        material: String,
        thickness: f64,
    },
}

impl SectionDefinition {
    pub fn name(&self) -> &str {
        match self {
            SectionDefinition::Frame { name, .. } | SectionDefinition::Area { name, .. } => name,
        }
    }
}

/// Draw-by-coordinates request, in target native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Frame {
        kind: ElementKind,
        name: String,
        start: Point3,
        end: Point3,
        section_name: String,
        rotation: f64,
    },
    Area {
        kind: ElementKind,
        name: String,
        points: Vec<Point3>,
        openings: Vec<Vec<Point3>>,
        section_name: String,
    },
}

impl DrawCommand {
    pub fn name(&self) -> &str {
        match self {
            DrawCommand::Frame { name, .. } | DrawCommand::Area { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            DrawCommand::Frame { kind, .. } | DrawCommand::Area { kind, .. } => *kind,
        }
    }
}

/// Read access to the model a document is extracted from.
pub trait SourceModel {
    /// Name recorded in the document header
    fn tool_name(&self) -> &str;

    fn length_unit(&self) -> LengthUnit;

    /// Beams or columns, depending on `kind`.
    fn frames(&self, kind: ElementKind) -> LinkResult<Vec<RawFrame>>;

    /// Slabs or walls, depending on `kind`.
    fn panels(&self, kind: ElementKind) -> LinkResult<Vec<RawPanel>>;

    /// Section properties by name; `None` when the lookup is unavailable.
    fn section_shape(&self, section_name: &str) -> Option<SectionShape>;

    /// Load patterns, combinations and element loads, in the units the
    /// source reports them.
    fn load_data(&self) -> LinkResult<LoadData> {
        Ok(LoadData::default())
    }
}

/// Command access to the model a document is imported into.
///
/// Every command returns `HostApiFailure` when the host reports a
/// non-success status.
pub trait TargetModel {
    fn length_unit(&self) -> LengthUnit;

    /// Elements already present, in target native units
    fn existing_elements(&self) -> LinkResult<Vec<ElementDescriptor>>;

    fn define_section(&mut self, section: &SectionDefinition) -> LinkResult<()>;

    /// Draw an element and return the id the target assigned to it.
    fn draw(&mut self, command: &DrawCommand) -> LinkResult<String>;

    fn delete_element(&mut self, id: &str) -> LinkResult<()>;

    fn define_load_pattern(&mut self, definition: &LoadDefinition) -> LinkResult<()>;

    fn define_combination(&mut self, combination: &LoadCombination) -> LinkResult<()>;

    /// Assign one load (canonical SI units) to an element by target id.
    fn assign_load(&mut self, element_id: &str, load: &LoadAssignment) -> LinkResult<()>;
}
