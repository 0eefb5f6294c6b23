//! # Interchange Schema
//!
//! The `InterchangeDocument` is the tool-agnostic tree exchanged between
//! the source and target models and persisted as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! InterchangeDocument
//! ├── Meta: DocumentMeta (version, id, source tool, timestamp)
//! ├── Beams: [BeamRecord]
//! ├── Columns: [ColumnRecord]
//! ├── Slabs: [SlabRecord]
//! ├── StructWalls: [WallGeometry]
//! ├── LoadDefinitions: [LoadDefinition]
//! ├── LoadCombinations: [LoadCombination]
//! └── Elements: [ElementLoads { ElementId, Loads: [LoadAssignment] }]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use link_core::geometry::Point3;
//! use link_core::schema::{
//!     deserialize_document, serialize_document, BeamRecord, InterchangeDocument,
//! };
//!
//! let mut doc = InterchangeDocument::new("bim-source");
//! doc.beams.push(BeamRecord::new("B1", Point3::new(0.0, 0.0, 3.0), Point3::new(6.0, 0.0, 3.0)));
//!
//! let json = serialize_document(&doc).unwrap();
//! let back = deserialize_document(&json).unwrap();
//! assert_eq!(back.beams, doc.beams);
//! ```

pub mod records;

pub use records::{BeamRecord, ColumnRecord, SlabRecord, WallGeometry};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LinkResult;
use crate::loads::LoadData;

/// Current schema version for interchange documents
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Kind of structural element a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Beam,
    Column,
    Slab,
    Wall,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Beam,
        ElementKind::Column,
        ElementKind::Slab,
        ElementKind::Wall,
    ];

    /// Name of the document group holding this kind
    pub fn group_name(&self) -> &'static str {
        match self {
            ElementKind::Beam => "Beams",
            ElementKind::Column => "Columns",
            ElementKind::Slab => "Slabs",
            ElementKind::Wall => "StructWalls",
        }
    }

    /// Frames are drawn by two points, areas by a polygon.
    pub fn is_frame(&self) -> bool {
        matches!(self, ElementKind::Beam | ElementKind::Column)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ElementKind::Beam => "Beam",
            ElementKind::Column => "Column",
            ElementKind::Slab => "Slab",
            ElementKind::Wall => "Wall",
        };
        write!(f, "{}", name)
    }
}

/// Document header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentMeta {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub document_id: Uuid,
    /// Tool the document was extracted from
    #[serde(default)]
    pub source_tool: String,
    pub created: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn new(source_tool: impl Into<String>) -> Self {
        DocumentMeta {
            version: SCHEMA_VERSION.to_string(),
            document_id: Uuid::new_v4(),
            source_tool: source_tool.into(),
            created: Utc::now(),
        }
    }
}

impl Default for DocumentMeta {
    fn default() -> Self {
        tracing::debug!("Document header missing, assuming current schema version");
        DocumentMeta::new("")
    }
}

/// Root interchange container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterchangeDocument {
    #[serde(default)]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub beams: Vec<BeamRecord>,
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,
    #[serde(default)]
    pub slabs: Vec<SlabRecord>,
    #[serde(default)]
    pub struct_walls: Vec<WallGeometry>,
    #[serde(flatten)]
    pub loads: LoadData,
}

impl InterchangeDocument {
    /// Create an empty document extracted from `source_tool`.
    pub fn new(source_tool: impl Into<String>) -> Self {
        InterchangeDocument {
            meta: DocumentMeta::new(source_tool),
            beams: Vec::new(),
            columns: Vec::new(),
            slabs: Vec::new(),
            struct_walls: Vec::new(),
            loads: LoadData::default(),
        }
    }

    /// Number of records of one kind
    pub fn count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Beam => self.beams.len(),
            ElementKind::Column => self.columns.len(),
            ElementKind::Slab => self.slabs.len(),
            ElementKind::Wall => self.struct_walls.len(),
        }
    }

    /// Total number of element records
    pub fn element_count(&self) -> usize {
        ElementKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn has_loads(&self) -> bool {
        !self.loads.is_empty()
    }
}

impl Default for InterchangeDocument {
    fn default() -> Self {
        InterchangeDocument::new("")
    }
}

/// Serialize a document to pretty-printed JSON. Every field is emitted.
pub fn serialize_document(doc: &InterchangeDocument) -> LinkResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse a document, substituting defaults for missing optional fields.
pub fn deserialize_document(json: &str) -> LinkResult<InterchangeDocument> {
    let doc: InterchangeDocument = serde_json::from_str(json)?;
    tracing::debug!(
        beams = doc.beams.len(),
        columns = doc.columns.len(),
        slabs = doc.slabs.len(),
        walls = doc.struct_walls.len(),
        "Parsed interchange document"
    );
    Ok(doc)
}
