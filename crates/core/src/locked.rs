//! Committed geofence snapshots and their persisted shapes.
//!
//! A [`LockedGeofence`] is what the customer flow validates against. Storage
//! and transport hand it around as JSON:
//!
//! ```json
//! {"cells": ["89283082803ffff"], "resolution": 9, "ownerId": "m-1"}
//! ```
//!
//! Older clients stored a single cell under `h3Index` and newer ones a list
//! under `h3Indices`. Both are read through [`GeofenceRecord`], which
//! normalizes them into the canonical snapshot. Deserializing a
//! [`LockedGeofence`] checks every cell against [`H3Grid`].

use crate::error::{GeofenceError, Result};
use crate::grid::{GridIndexer, H3Grid};
use crate::types::{Cell, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable committed geofence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedGeofence {
    cells: BTreeSet<Cell>,
    resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
}

impl LockedGeofence {
    /// Build a snapshot from cells coming from outside the process.
    ///
    /// Every cell must be a valid grid cell at `resolution`. Duplicates
    /// collapse.
    ///
    /// # Errors
    /// * `EmptyGeofence` - no cells
    /// * `InvalidCell` - a value is not a grid cell
    /// * `ResolutionMismatch` - a cell belongs to another resolution
    pub fn from_cells<I, G>(
        cells: I,
        resolution: Resolution,
        owner_id: Option<String>,
        grid: &G,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Cell>,
        G: GridIndexer + ?Sized,
    {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if cells.is_empty() {
            return Err(GeofenceError::EmptyGeofence);
        }
        for cell in &cells {
            let actual = grid.cell_resolution(*cell)?;
            if actual != resolution {
                return Err(GeofenceError::ResolutionMismatch {
                    expected: resolution,
                    actual,
                });
            }
        }
        Ok(Self {
            cells,
            resolution,
            owner_id,
        })
    }

    /// Snapshot cells already vetted by a [`crate::GeofenceSet`] or a legacy
    /// record.
    pub(crate) fn from_trusted(
        cells: BTreeSet<Cell>,
        resolution: Resolution,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            cells,
            resolution,
            owner_id,
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Cells in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// Same cells under a different owner.
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Cell identifiers as strings, ascending.
    pub fn cell_strings(&self) -> Vec<String> {
        self.cells.iter().map(ToString::to_string).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Persisted geofence as found in storage or on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeofenceRecord {
    /// Current shape: a list of cells.
    #[serde(rename_all = "camelCase")]
    Set {
        #[serde(alias = "h3Indices")]
        cells: Vec<Cell>,
        resolution: Resolution,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner_id: Option<String>,
    },
    /// Legacy shape: exactly one cell.
    #[serde(rename_all = "camelCase")]
    Single {
        #[serde(rename = "h3Index")]
        cell: Cell,
        resolution: Resolution,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        owner_id: Option<String>,
    },
}

impl GeofenceRecord {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            GeofenceRecord::Set { resolution, .. } | GeofenceRecord::Single { resolution, .. } => {
                *resolution
            }
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, GeofenceRecord::Single { .. })
    }

    /// Canonical snapshot without consulting the grid.
    ///
    /// A legacy single cell becomes a one-element set.
    pub fn normalize(&self) -> Result<LockedGeofence> {
        match self {
            GeofenceRecord::Set {
                cells,
                resolution,
                owner_id,
            } => {
                if cells.is_empty() {
                    return Err(GeofenceError::EmptyGeofence);
                }
                Ok(LockedGeofence::from_trusted(
                    cells.iter().copied().collect(),
                    *resolution,
                    owner_id.clone(),
                ))
            }
            GeofenceRecord::Single {
                cell,
                resolution,
                owner_id,
            } => Ok(LockedGeofence::from_trusted(
                BTreeSet::from([*cell]),
                *resolution,
                owner_id.clone(),
            )),
        }
    }

    /// Canonical snapshot with every cell checked against the grid.
    pub fn into_locked<G: GridIndexer + ?Sized>(self, grid: &G) -> Result<LockedGeofence> {
        match self {
            GeofenceRecord::Set {
                cells,
                resolution,
                owner_id,
            } => LockedGeofence::from_cells(cells, resolution, owner_id, grid),
            GeofenceRecord::Single {
                cell,
                resolution,
                owner_id,
            } => LockedGeofence::from_cells([cell], resolution, owner_id, grid),
        }
    }
}

impl From<LockedGeofence> for GeofenceRecord {
    fn from(locked: LockedGeofence) -> Self {
        GeofenceRecord::Set {
            cells: locked.cells.into_iter().collect(),
            resolution: locked.resolution,
            owner_id: locked.owner_id,
        }
    }
}

impl<'de> Deserialize<'de> for LockedGeofence {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let record = GeofenceRecord::deserialize(deserializer)?;
        record
            .into_locked(&H3Grid::new())
            .map_err(serde::de::Error::custom)
    }
}
