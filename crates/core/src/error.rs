//! Core error types

use crate::types::{Cell, Resolution};
use thiserror::Error;

/// Errors raised while building or validating a geofence.
///
/// Every variant is a local, recoverable condition; callers turn them into
/// user feedback rather than aborting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeofenceError {
    /// Out-of-range or unparsable latitude, longitude or resolution
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// The cell is already selected; the add was a no-op
    #[error("Cell {cell} is already part of the geofence")]
    DuplicateCell { cell: Cell },

    /// Attempt to mix resolutions in one geofence
    #[error("Resolution mismatch: geofence uses {expected}, got {actual}")]
    ResolutionMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    /// Commit (or stored record) without any cells
    #[error("Geofence has no cells")]
    EmptyGeofence,

    /// Malformed cell identifier
    #[error("Invalid cell: {0}")]
    InvalidCell(String),

    /// Neighbor ring wider than the configured limit
    #[error("Ring {ring} exceeds the maximum of {max}")]
    RingTooLarge { ring: u32, max: u32 },
}

impl GeofenceError {
    /// True when the error stems from user input variance rather than a
    /// malformed value handed over by another component.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, GeofenceError::InvalidCell(_))
    }
}

pub type Result<T> = std::result::Result<T, GeofenceError>;
