//! In-memory host models for tests.

use std::collections::{HashMap, HashSet};

use super::{DrawCommand, RawFrame, RawPanel, SectionDefinition, SourceModel, TargetModel};
use crate::conflict::{ElementDescriptor, Footprint};
use crate::errors::{LinkError, LinkResult};
use crate::geometry::{BoundingBox, SectionShape};
use crate::loads::{LoadAssignment, LoadCombination, LoadData, LoadDefinition};
use crate::schema::ElementKind;
use crate::units::LengthUnit;

/// Host status code used for injected failures
pub const FAILURE_STATUS: i32 = 1;

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub unit: LengthUnit,
    pub beams: Vec<RawFrame>,
    pub columns: Vec<RawFrame>,
    pub slabs: Vec<RawPanel>,
    pub walls: Vec<RawPanel>,
    pub sections: HashMap<String, SectionShape>,
    pub loads: LoadData,
    /// Kinds whose listing call fails
    pub failing_kinds: HashSet<ElementKind>,
}

impl MemorySource {
    pub fn new(unit: LengthUnit) -> Self {
        MemorySource {
            unit,
            ..Default::default()
        }
    }

    fn check(&self, kind: ElementKind) -> LinkResult<()> {
        if self.failing_kinds.contains(&kind) {
            let operation = format!("list {}", kind.group_name());
            return Err(LinkError::host_api_failure(operation, FAILURE_STATUS));
        }
        Ok(())
    }
}

impl SourceModel for MemorySource {
    fn tool_name(&self) -> &str {
        "memory-source"
    }

    fn length_unit(&self) -> LengthUnit {
        self.unit
    }

    fn frames(&self, kind: ElementKind) -> LinkResult<Vec<RawFrame>> {
        self.check(kind)?;
        Ok(match kind {
            ElementKind::Beam => self.beams.clone(),
            ElementKind::Column => self.columns.clone(),
            _ => Vec::new(),
        })
    }

    fn panels(&self, kind: ElementKind) -> LinkResult<Vec<RawPanel>> {
        self.check(kind)?;
        Ok(match kind {
            ElementKind::Slab => self.slabs.clone(),
            ElementKind::Wall => self.walls.clone(),
            _ => Vec::new(),
        })
    }

    fn section_shape(&self, section_name: &str) -> Option<SectionShape> {
        self.sections.get(section_name).cloned()
    }

    fn load_data(&self) -> LinkResult<LoadData> {
        Ok(self.loads.clone())
    }
}

/// Target double recording every command it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    pub unit: LengthUnit,
    pub existing: Vec<ElementDescriptor>,
    pub sections: Vec<SectionDefinition>,
    pub drawn: Vec<(String, DrawCommand)>,
    pub deleted: Vec<String>,
    pub patterns: Vec<LoadDefinition>,
    pub combinations: Vec<LoadCombination>,
    pub assigned: Vec<(String, LoadAssignment)>,
    /// Element names whose draw call fails
    pub failing_draws: HashSet<String>,
    /// Element ids whose load assignment fails
    pub failing_assignments: HashSet<String>,
    next_id: usize,
}

impl MemoryTarget {
    pub fn new(unit: LengthUnit) -> Self {
        MemoryTarget {
            unit,
            ..Default::default()
        }
    }

    /// Seed an existing element (builder pattern)
    pub fn with_existing(mut self, element: ElementDescriptor) -> Self {
        self.existing.push(element);
        self
    }

    pub fn drawn_names(&self) -> Vec<&str> {
        self.drawn.iter().map(|(_, c)| c.name()).collect()
    }
}

impl TargetModel for MemoryTarget {
    fn length_unit(&self) -> LengthUnit {
        self.unit
    }

    fn existing_elements(&self) -> LinkResult<Vec<ElementDescriptor>> {
        Ok(self.existing.clone())
    }

    fn define_section(&mut self, section: &SectionDefinition) -> LinkResult<()> {
        self.sections.push(section.clone());
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> LinkResult<String> {
        if self.failing_draws.contains(command.name()) {
            return Err(LinkError::host_api_failure("draw", FAILURE_STATUS));
        }
        self.next_id += 1;
        let id = format!("T{}", self.next_id);
        let (footprint, section) = match command {
            DrawCommand::Frame {
                start,
                end,
                section_name,
                ..
            } => (
                Footprint::Segment {
                    start: *start,
                    end: *end,
                },
                section_name,
            ),
            // Wall panels are drawn bottom edge first
            DrawCommand::Area {
                kind: ElementKind::Wall,
                points,
                section_name,
                ..
            } if points.len() >= 2 => (
                Footprint::Segment {
                    start: points[0],
                    end: points[1],
                },
                section_name,
            ),
            DrawCommand::Area {
                points, section_name, ..
            } => {
                let bounds = BoundingBox::from_points(points)
                    .ok_or_else(|| LinkError::degenerate_geometry(command.name(), "no points"))?;
                (Footprint::Region(bounds), section_name)
            }
        };
        self.existing.push(ElementDescriptor {
            id: id.clone(),
            kind: command.kind(),
            section: section.clone(),
            material: String::new(),
            footprint,
        });
        self.drawn.push((id.clone(), command.clone()));
        Ok(id)
    }

    fn delete_element(&mut self, id: &str) -> LinkResult<()> {
        let before = self.existing.len();
        self.existing.retain(|e| e.id != id);
        if self.existing.len() == before {
            return Err(LinkError::host_api_failure(format!("delete {}", id), FAILURE_STATUS));
        }
        self.deleted.push(id.to_string());
        Ok(())
    }

    fn define_load_pattern(&mut self, definition: &LoadDefinition) -> LinkResult<()> {
        self.patterns.push(definition.clone());
        Ok(())
    }

    fn define_combination(&mut self, combination: &LoadCombination) -> LinkResult<()> {
        self.combinations.push(combination.clone());
        Ok(())
    }

    fn assign_load(&mut self, element_id: &str, load: &LoadAssignment) -> LinkResult<()> {
        if self.failing_assignments.contains(element_id) {
            return Err(LinkError::host_api_failure("assign load", FAILURE_STATUS));
        }
        self.assigned.push((element_id.to_string(), load.clone()));
        Ok(())
    }
}
