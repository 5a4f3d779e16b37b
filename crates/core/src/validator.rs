//! Customer location validation.
//!
//! [`LocationValidator::validate`] maps the candidate point onto the grid at
//! the geofence's resolution and checks set membership. Only the boolean and
//! the candidate cell are load-bearing; the message is presentation text
//! taken from [`VerdictMessages`].

use crate::error::Result;
use crate::grid::{GridIndexer, H3Grid};
use crate::locked::{GeofenceRecord, LockedGeofence};
use crate::types::Cell;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Verdict for one candidate location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub candidate_cell: Cell,
    pub message: String,
}

/// Human-readable texts attached to verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictMessages {
    pub inside: String,
    pub outside: String,
}

impl Default for VerdictMessages {
    fn default() -> Self {
        Self {
            inside: "Location verified: you are inside the permitted payment area.".to_string(),
            outside: "Location rejected: you are outside the permitted payment area.".to_string(),
        }
    }
}

/// Checks candidate locations against committed geofences.
#[derive(Debug, Clone, Default)]
pub struct LocationValidator<G: GridIndexer = H3Grid> {
    grid: G,
    messages: VerdictMessages,
}

impl LocationValidator<H3Grid> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<G: GridIndexer> LocationValidator<G> {
    pub fn with_indexer(grid: G) -> Self {
        Self {
            grid,
            messages: VerdictMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: VerdictMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn messages(&self) -> &VerdictMessages {
        &self.messages
    }

    /// Decide whether `(lat, lng)` falls inside `geofence`.
    ///
    /// # Errors
    /// * `InvalidCoordinate` - the point cannot be placed on the grid
    pub fn validate(&self, geofence: &LockedGeofence, lat: f64, lng: f64) -> Result<ValidationResult> {
        let candidate_cell = self.grid.point_to_cell(lat, lng, geofence.resolution())?;
        let is_valid = geofence.contains(candidate_cell);

        debug!(
            owner_id = ?geofence.owner_id(),
            candidate = %candidate_cell,
            is_valid,
            "Location validated"
        );

        let message = if is_valid {
            self.messages.inside.clone()
        } else {
            self.messages.outside.clone()
        };

        Ok(ValidationResult {
            is_valid,
            candidate_cell,
            message,
        })
    }

    /// Validate against a stored record, normalizing the legacy single-cell
    /// shape first. The record's cells are checked against the grid.
    pub fn validate_record(&self, record: &GeofenceRecord, lat: f64, lng: f64) -> Result<ValidationResult> {
        let geofence = record.clone().into_locked(&self.grid)?;
        self.validate(&geofence, lat, lng)
    }
}
