//! Per-element interchange records.
//!
//! All geometry is canonical SI at rest: coordinates and dimensions in
//! meters, angles in radians. Missing optional fields deserialize to fixed
//! defaults; substituted defaults are logged at debug level.

use serde::{Deserialize, Serialize};

use crate::geometry::{
    derive_wall_frame_with_tolerance, edge_orientation, BoundingBox, Point3, FALLBACK_DEPTH_M,
    FALLBACK_WIDTH_M, WALL_EDGE_TOLERANCE,
};

fn default_beam_type() -> String {
    tracing::debug!("ElementType missing, defaulting to Beam");
    "Beam".to_string()
}

fn default_column_type() -> String {
    tracing::debug!("ElementType missing, defaulting to Column");
    "Column".to_string()
}

fn default_width() -> f64 {
    tracing::debug!(width = FALLBACK_WIDTH_M, "Width missing, using fallback");
    FALLBACK_WIDTH_M
}

fn default_depth() -> f64 {
    tracing::debug!(depth = FALLBACK_DEPTH_M, "Depth missing, using fallback");
    FALLBACK_DEPTH_M
}

fn default_load_bearing() -> bool {
    true
}

// ============================================================================
// Frames
// ============================================================================

/// A straight prismatic beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BeamRecord {
    pub name: String,
    #[serde(default = "default_beam_type")]
    pub element_type: String,
    pub start_point: Point3,
    pub end_point: Point3,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_depth")]
    pub depth: f64,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub material: String,
    /// Rotation about the member axis (radians)
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub level: Option<String>,
}

impl BeamRecord {
    pub fn new(name: impl Into<String>, start_point: Point3, end_point: Point3) -> Self {
        BeamRecord {
            name: name.into(),
            element_type: "Beam".to_string(),
            start_point,
            end_point,
            width: FALLBACK_WIDTH_M,
            depth: FALLBACK_DEPTH_M,
            section_name: String::new(),
            material: String::new(),
            rotation: 0.0,
            level: None,
        }
    }

    /// Set section name and dimensions (builder pattern)
    pub fn with_section(mut self, section_name: impl Into<String>, width: f64, depth: f64) -> Self {
        self.section_name = section_name.into();
        self.width = width;
        self.depth = depth;
        self
    }

    pub fn length(&self) -> f64 {
        self.start_point.distance_to(&self.end_point)
    }
}

/// A straight prismatic column, possibly slanted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnRecord {
    pub name: String,
    #[serde(default = "default_column_type")]
    pub element_type: String,
    pub base_point: Point3,
    pub top_point: Point3,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_depth")]
    pub depth: f64,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub material: String,
    /// Rotation about the member axis (radians)
    #[serde(default)]
    pub rotation: f64,
    /// Deviation of the axis from vertical (radians)
    #[serde(default)]
    pub slant_angle: f64,
    #[serde(default)]
    pub base_level: Option<String>,
    #[serde(default)]
    pub top_level: Option<String>,
}

impl ColumnRecord {
    pub fn new(name: impl Into<String>, base_point: Point3, top_point: Point3) -> Self {
        ColumnRecord {
            name: name.into(),
            element_type: "Column".to_string(),
            base_point,
            top_point,
            width: FALLBACK_WIDTH_M,
            depth: FALLBACK_DEPTH_M,
            section_name: String::new(),
            material: String::new(),
            rotation: 0.0,
            slant_angle: crate::geometry::slant_angle(&base_point, &top_point),
            base_level: None,
            top_level: None,
        }
    }

    /// Set section name and dimensions (builder pattern)
    pub fn with_section(mut self, section_name: impl Into<String>, width: f64, depth: f64) -> Self {
        self.section_name = section_name.into();
        self.width = width;
        self.depth = depth;
        self
    }

    pub fn height(&self) -> f64 {
        self.base_point.distance_to(&self.top_point)
    }
}

// ============================================================================
// Slabs
// ============================================================================

/// A polygonal slab with optional openings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlabRecord {
    pub name: String,
    /// Closed outer boundary, in order
    pub boundary: Vec<Point3>,
    #[serde(default)]
    pub openings: Vec<Vec<Point3>>,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub material: String,
}

impl SlabRecord {
    pub fn new(name: impl Into<String>, boundary: Vec<Point3>, thickness: f64) -> Self {
        SlabRecord {
            name: name.into(),
            boundary,
            openings: Vec::new(),
            thickness,
            level: None,
            section_name: String::new(),
            material: String::new(),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.boundary)
    }
}

// ============================================================================
// Walls
// ============================================================================

/// A structural wall panel.
///
/// Length and orientation are always derived from the start/end points and
/// cannot be set independently: they are recomputed on construction, on
/// [`WallGeometry::set_endpoints`] and on deserialization.
///
/// ```
/// use link_core::geometry::Point3;
/// use link_core::schema::WallGeometry;
///
/// let start = Point3::new(0.0, 0.0, 0.0);
/// let wall = WallGeometry::new("W1", start, Point3::new(0.0, 4.0, 0.0), 3.0, 0.2);
/// assert_eq!(wall.length(), 4.0);
/// assert_eq!(wall.orientation(), std::f64::consts::FRAC_PI_2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WallWire", into = "WallWire")]
pub struct WallGeometry {
    pub name: String,
    start: Point3,
    end: Point3,
    length: f64,
    pub height: f64,
    pub thickness: f64,
    orientation: f64,
    pub base_level: Option<String>,
    pub top_level: Option<String>,
    pub section_name: String,
    pub material: String,
    pub load_bearing: bool,
}

impl WallGeometry {
    pub fn new(
        name: impl Into<String>,
        start: Point3,
        end: Point3,
        height: f64,
        thickness: f64,
    ) -> Self {
        WallGeometry {
            name: name.into(),
            start,
            end,
            length: start.distance_to(&end),
            height,
            thickness,
            orientation: edge_orientation(&start, &end),
            base_level: None,
            top_level: None,
            section_name: String::new(),
            material: String::new(),
            load_bearing: true,
        }
    }

    /// Derive a wall from an unordered boundary point set.
    ///
    /// Fewer than two usable points produce a degenerate wall
    /// (origin endpoints, zero length/height/orientation).
    pub fn from_boundary(
        name: impl Into<String>,
        boundary: &[Point3],
        thickness: f64,
        tolerance: f64,
    ) -> Self {
        let frame = derive_wall_frame_with_tolerance(boundary, tolerance);
        WallGeometry::new(name, frame.start, frame.end, frame.height, thickness)
    }

    /// Same as [`WallGeometry::from_boundary`] with the default edge tolerance.
    pub fn from_boundary_default(
        name: impl Into<String>,
        boundary: &[Point3],
        thickness: f64,
    ) -> Self {
        Self::from_boundary(name, boundary, thickness, WALL_EDGE_TOLERANCE)
    }

    pub fn start(&self) -> Point3 {
        self.start
    }

    pub fn end(&self) -> Point3 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Move the wall; length and orientation follow.
    pub fn set_endpoints(&mut self, start: Point3, end: Point3) {
        self.start = start;
        self.end = end;
        self.length = start.distance_to(&end);
        self.orientation = edge_orientation(&start, &end);
    }

    pub fn is_degenerate(&self) -> bool {
        self.length == 0.0 && self.height == 0.0
    }

    /// Panel corners: bottom start, bottom end, top end, top start.
    pub fn corner_points(&self) -> [Point3; 4] {
        [
            self.start,
            self.end,
            self.end.with_z(self.end.z + self.height),
            self.start.with_z(self.start.z + self.height),
        ]
    }
}

/// Persisted form of [`WallGeometry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WallWire {
    name: String,
    start_point: Point3,
    end_point: Point3,
    #[serde(default)]
    length: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    thickness: f64,
    #[serde(default)]
    orientation: f64,
    #[serde(default)]
    base_level: Option<String>,
    #[serde(default)]
    top_level: Option<String>,
    #[serde(default)]
    section_name: String,
    #[serde(default)]
    material: String,
    #[serde(default = "default_load_bearing")]
    load_bearing: bool,
}

impl From<WallWire> for WallGeometry {
    fn from(wire: WallWire) -> Self {
        // Persisted Length/Orientation are ignored; the endpoints are authoritative.
        let mut wall = WallGeometry::new(
            wire.name,
            wire.start_point,
            wire.end_point,
            wire.height,
            wire.thickness,
        );
        wall.base_level = wire.base_level;
        wall.top_level = wire.top_level;
        wall.section_name = wire.section_name;
        wall.material = wire.material;
        wall.load_bearing = wire.load_bearing;
        wall
    }
}

impl From<WallGeometry> for WallWire {
    fn from(wall: WallGeometry) -> Self {
        WallWire {
            name: wall.name,
            start_point: wall.start,
            end_point: wall.end,
            length: wall.length,
            height: wall.height,
            thickness: wall.thickness,
            orientation: wall.orientation,
            base_level: wall.base_level,
            top_level: wall.top_level,
            section_name: wall.section_name,
            material: wall.material,
            load_bearing: wall.load_bearing,
        }
    }
}
