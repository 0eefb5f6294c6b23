//! # Geometry Deriver
//!
//! Turns raw host reference points into the canonical geometric fields of
//! the interchange records:
//!
//! - [`point`] - [`Point3`] and [`BoundingBox`] in canonical meters
//! - [`wall`] - wall centerline, length, height and orientation from an
//!   unordered boundary
//! - [`section`] - beam/column width and depth from section properties
//! - [`slab`] - slab boundary and opening polygons

pub mod point;
pub mod section;
pub mod slab;
pub mod wall;

pub use point::{BoundingBox, Point3};
pub use section::{
    rectangular_dimensions, resolve_section_size, slant_angle, DimensionSource, SectionShape,
    SectionSize, FALLBACK_DEPTH_M, FALLBACK_WIDTH_M,
};
pub use slab::{convert_polygon, SlabOutline};
pub use wall::{
    derive_wall_frame, derive_wall_frame_with_tolerance, edge_orientation, WallFrame,
    WALL_EDGE_TOLERANCE,
};
