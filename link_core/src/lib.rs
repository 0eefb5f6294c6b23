//! # link_core - Structural Model Interchange Engine
//!
//! `link_core` moves structural models between a BIM authoring tool and a
//! structural analysis tool through a tool-agnostic interchange document.
//! Host tools plug in through two narrow traits; everything in between is
//! plain, JSON-serializable value data in canonical SI units.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every call works on its inputs and returns a result
//! - **Canonical at rest**: meters, radians, kN, kN/m, kN/m², kN·m
//! - **Accumulate, don't abort**: validation and conversion record every
//!   problem and keep going; geometry degrades to zeroed records
//! - **Explicit context**: settings travel in a [`TransferContext`]
//!
//! ## Quick Start
//!
//! ```rust
//! use link_core::geometry::{derive_wall_frame, Point3};
//! use link_core::units::convert_load;
//!
//! // Wall centerline from an unordered boundary
//! let frame = derive_wall_frame(&[
//!     Point3::new(4.0, 0.0, 3.0),
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(4.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 3.0),
//! ]);
//! assert_eq!((frame.length, frame.height), (4.0, 3.0));
//!
//! // Load magnitude to canonical SI
//! let (value, unit) = convert_load(1.0, "kip").unwrap();
//! assert_eq!(value, 4.44822);
//! assert_eq!(unit.as_str(), "kN");
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Measurement normalizer: length/load units, direction codes
//! - [`geometry`] - Geometry deriver: points, walls, sections, slabs
//! - [`schema`] - Interchange document and element records
//! - [`conflict`] - Duplicate/conflict classification and resolution
//! - [`loads`] - Load data, validation and conversion
//! - [`host`] - Source/target model traits
//! - [`transfer`] - Extraction, import planning and execution
//! - [`settings`] - Transfer settings and context
//! - [`errors`] - Structured error types
//! - [`file_io`] - Atomic document saves and locking

pub mod conflict;
pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod geometry;
pub mod host;
pub mod loads;
pub mod schema;
pub mod settings;
pub mod transfer;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use conflict::{classify, Classification, ElementDescriptor, ResolutionPolicy};
pub use errors::{LinkError, LinkResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_document, save_document, FileLock};
pub use host::{SourceModel, TargetModel};
pub use schema::{InterchangeDocument, SCHEMA_VERSION};
pub use settings::{TransferContext, TransferSettings};
pub use transfer::{apply_import, extract_document, plan_import};
