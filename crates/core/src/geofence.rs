//! Interactive geofence authoring.
//!
//! A [`GeofenceSet`] is owned by one merchant session. It collects the cells
//! the merchant picks, grows them by neighbor rings and finally produces an
//! immutable [`LockedGeofence`] via [`GeofenceSet::commit`].
//!
//! # Invariants
//!
//! - Every cell is unique and shares the set's resolution.
//! - The resolution is fixed by the first successful add and released when
//!   the set becomes empty again.
//! - Insertion order carries no meaning; listings are sorted.

use crate::error::{GeofenceError, Result};
use crate::grid::{GridIndexer, H3Grid};
use crate::locked::LockedGeofence;
use crate::types::{Cell, LatLng, Resolution};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Ring limit of [`GeofenceSet::expand_neighbors`] unless overridden.
pub const DEFAULT_MAX_EXPANSION_RING: u32 = 10;

/// Per-cell bookkeeping kept while authoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetadata {
    /// Point the cell was derived from: the picked point for manual adds, the
    /// cell center for cells added by expansion.
    pub origin: LatLng,
    pub resolution: Resolution,
    /// True when the cell came from neighbor expansion.
    pub expanded: bool,
}

/// Outcome of [`GeofenceSet::add_points`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAddReport {
    pub added: Vec<Cell>,
    pub duplicates: Vec<Cell>,
}

/// Mutable set of selected cells.
#[derive(Debug, Clone)]
pub struct GeofenceSet<G: GridIndexer = H3Grid> {
    grid: G,
    cells: HashMap<Cell, CellMetadata>,
    resolution: Option<Resolution>,
    max_ring: u32,
}

impl GeofenceSet<H3Grid> {
    pub fn new() -> Self {
        Self::with_indexer(H3Grid::new())
    }
}

impl Default for GeofenceSet<H3Grid> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GridIndexer> GeofenceSet<G> {
    pub fn with_indexer(grid: G) -> Self {
        Self {
            grid,
            cells: HashMap::new(),
            resolution: None,
            max_ring: DEFAULT_MAX_EXPANSION_RING,
        }
    }

    /// Limit the ring accepted by [`Self::expand_neighbors`].
    pub fn with_max_ring(mut self, max_ring: u32) -> Self {
        self.max_ring = max_ring;
        self
    }

    pub fn max_ring(&self) -> u32 {
        self.max_ring
    }

    /// Add the cell containing `(lat, lng)`.
    ///
    /// # Errors
    /// * `InvalidCoordinate` - bad point or resolution outside 0..=15
    /// * `ResolutionMismatch` - the set already uses another resolution
    /// * `DuplicateCell` - the cell is already selected (set unchanged)
    pub fn add_cell(&mut self, lat: f64, lng: f64, resolution: u8) -> Result<Cell> {
        let resolution = Resolution::new(resolution)?;
        self.check_resolution(resolution)?;

        let cell = self.grid.point_to_cell(lat, lng, resolution)?;
        if self.cells.contains_key(&cell) {
            debug!(cell = %cell, "Cell already selected");
            return Err(GeofenceError::DuplicateCell { cell });
        }

        self.cells.insert(
            cell,
            CellMetadata {
                origin: LatLng::new(lat, lng),
                resolution,
                expanded: false,
            },
        );
        self.resolution = Some(resolution);

        debug!(cell = %cell, resolution = %resolution, count = self.cells.len(), "Cell added");
        Ok(cell)
    }

    /// Add many points at once.
    ///
    /// Duplicates are reported instead of aborting the batch; any other error
    /// stops at the offending point, leaving earlier additions in place.
    pub fn add_points<I>(&mut self, points: I, resolution: u8) -> Result<BatchAddReport>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut report = BatchAddReport::default();
        for point in points {
            match self.add_cell(point.lat, point.lng, resolution) {
                Ok(cell) => report.added.push(cell),
                Err(GeofenceError::DuplicateCell { cell }) => report.duplicates.push(cell),
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Grow the set by every cell within `ring` steps of the seed cells.
    ///
    /// Seeds are the cells added directly; when none is left, every current
    /// cell acts as a seed. Returns the newly added cells in ascending order,
    /// empty when nothing was new.
    ///
    /// # Errors
    /// * `RingTooLarge` - `ring` is above [`Self::max_ring`] (set unchanged)
    pub fn expand_neighbors(&mut self, ring: u32) -> Result<Vec<Cell>> {
        if ring > self.max_ring {
            return Err(GeofenceError::RingTooLarge {
                ring,
                max: self.max_ring,
            });
        }
        let Some(resolution) = self.resolution else {
            return Ok(Vec::new());
        };

        let mut seeds: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, meta)| !meta.expanded)
            .map(|(cell, _)| *cell)
            .collect();
        if seeds.is_empty() {
            seeds = self.cells.keys().copied().collect();
        }

        // Resolve everything before touching the set so a grid failure leaves
        // it unchanged.
        let mut fresh = BTreeSet::new();
        for seed in seeds {
            for neighbor in self.grid.neighbors(seed, ring)? {
                if !self.cells.contains_key(&neighbor) {
                    fresh.insert(neighbor);
                }
            }
        }

        let mut pending = Vec::with_capacity(fresh.len());
        for cell in &fresh {
            let origin = self.grid.cell_center(*cell)?;
            pending.push((*cell, origin));
        }

        for (cell, origin) in pending {
            self.cells.insert(
                cell,
                CellMetadata {
                    origin,
                    resolution,
                    expanded: true,
                },
            );
        }

        let added: Vec<Cell> = fresh.into_iter().collect();
        debug!(ring, added = added.len(), count = self.cells.len(), "Neighbors expanded");
        Ok(added)
    }

    /// Remove a cell. Returns `false` when it was not selected.
    pub fn remove_cell(&mut self, cell: Cell) -> bool {
        let removed = self.cells.remove(&cell).is_some();
        if self.cells.is_empty() {
            self.resolution = None;
        }
        removed
    }

    /// Drop every cell and release the resolution.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.resolution = None;
    }

    /// Snapshot the current selection into an immutable geofence.
    pub fn commit(&self, owner_id: Option<String>) -> Result<LockedGeofence> {
        let Some(resolution) = self.resolution else {
            return Err(GeofenceError::EmptyGeofence);
        };
        if self.cells.is_empty() {
            return Err(GeofenceError::EmptyGeofence);
        }

        let locked = LockedGeofence::from_trusted(
            self.cells.keys().copied().collect(),
            resolution,
            owner_id,
        );

        info!(
            owner_id = ?locked.owner_id(),
            cells = locked.len(),
            resolution = %resolution,
            "Geofence committed"
        );
        Ok(locked)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Selected cells in ascending order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.cells.keys().copied().collect();
        cells.sort_unstable();
        cells
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    pub fn metadata(&self, cell: Cell) -> Option<&CellMetadata> {
        self.cells.get(&cell)
    }

    /// Number of cells added directly rather than by expansion.
    pub fn seed_count(&self) -> usize {
        self.cells.values().filter(|meta| !meta.expanded).count()
    }

    fn check_resolution(&self, requested: Resolution) -> Result<()> {
        match self.resolution {
            Some(expected) if expected != requested => Err(GeofenceError::ResolutionMismatch {
                expected,
                actual: requested,
            }),
            _ => Ok(()),
        }
    }
}
