//! # Error Types
//!
//! Structured error types for link_core. Every failure carries enough
//! context (unit tag, element id, host operation, file path) for a caller
//! to report it per element without losing the rest of a batch.
//!
//! ## Example
//!
//! ```rust
//! use link_core::errors::{LinkError, LinkResult};
//!
//! fn require_points(count: usize) -> LinkResult<()> {
//!     if count < 2 {
//!         return Err(LinkError::degenerate_geometry(
//!             "W-1",
//!             format!("{} boundary point(s), need at least 2", count),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_points(1).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for link_core operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Structured error type for interchange operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum LinkError {
    /// Unit tag has no entry in the conversion table
    #[error("Unsupported unit: '{unit}'")]
    UnsupportedUnit { unit: String },

    /// Load type outside the closed pattern or assignment vocabulary
    #[error("Invalid load type for '{context}': '{load_type}'")]
    InvalidLoadType { context: String, load_type: String },

    /// Structurally invalid load definition, combination or assignment
    #[error("Invalid load definition '{name}': {reason}")]
    InvalidLoadDefinition { name: String, reason: String },

    /// Not enough points to derive a shape
    #[error("Degenerate geometry for '{element}': {reason}")]
    DegenerateGeometry { element: String, reason: String },

    /// A host model call returned a non-success status
    #[error("Host API failure: {operation} returned {status}")]
    HostApiFailure { operation: String, status: i32 },

    /// Persisted document does not exist
    #[error("File not found: '{path}'")]
    FileNotFound { path: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LinkError {
    /// Create an UnsupportedUnit error
    pub fn unsupported_unit(unit: impl Into<String>) -> Self {
        LinkError::UnsupportedUnit { unit: unit.into() }
    }

    /// Create an InvalidLoadType error
    pub fn invalid_load_type(context: impl Into<String>, load_type: impl Into<String>) -> Self {
        LinkError::InvalidLoadType {
            context: context.into(),
            load_type: load_type.into(),
        }
    }

    /// Create an InvalidLoadDefinition error
    pub fn invalid_load_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkError::InvalidLoadDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a DegenerateGeometry error
    pub fn degenerate_geometry(element: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkError::DegenerateGeometry {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Create a HostApiFailure error
    pub fn host_api_failure(operation: impl Into<String>, status: i32) -> Self {
        LinkError::HostApiFailure {
            operation: operation.into(),
            status,
        }
    }

    /// Create a FileNotFound error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        LinkError::FileNotFound { path: path.into() }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        LinkError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        LinkError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        LinkError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinkError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            LinkError::UnsupportedUnit { .. } => "UNSUPPORTED_UNIT",
            LinkError::InvalidLoadType { .. } => "INVALID_LOAD_TYPE",
            LinkError::InvalidLoadDefinition { .. } => "INVALID_LOAD_DEFINITION",
            LinkError::DegenerateGeometry { .. } => "DEGENERATE_GEOMETRY",
            LinkError::HostApiFailure { .. } => "HOST_API_FAILURE",
            LinkError::FileNotFound { .. } => "FILE_NOT_FOUND",
            LinkError::FileError { .. } => "FILE_ERROR",
            LinkError::FileLocked { .. } => "FILE_LOCKED",
            LinkError::SerializationError { .. } => "SERIALIZATION_ERROR",
            LinkError::VersionMismatch { .. } => "VERSION_MISMATCH",
            LinkError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(e: serde_json::Error) -> Self {
        LinkError::serialization(e.to_string())
    }
}
