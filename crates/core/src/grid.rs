//! Hexagonal grid primitives.
//!
//! The geofence only needs four operations from the grid: point to cell,
//! neighbor disk, cell center and cell resolution. They sit behind the
//! [`GridIndexer`] trait; [`H3Grid`] implements it on top of `h3o`.

use crate::error::{GeofenceError, Result};
use crate::types::{Cell, LatLng, Resolution};
use h3o::CellIndex;

/// Widest neighbor ring [`H3Grid::neighbors`] resolves (30 301 cells).
pub const MAX_RING: u32 = 100;

/// Read-only access to the discrete global grid.
///
/// Implementations must be deterministic and free of side effects so they can
/// be shared between threads without coordination.
pub trait GridIndexer: Send + Sync {
    /// Cell containing the point at the given resolution.
    fn point_to_cell(&self, lat: f64, lng: f64, resolution: Resolution) -> Result<Cell>;

    /// All cells within `ring` grid steps of `cell`, the origin included.
    fn neighbors(&self, cell: Cell, ring: u32) -> Result<Vec<Cell>>;

    /// Center point of the cell.
    fn cell_center(&self, cell: Cell) -> Result<LatLng>;

    /// Resolution encoded in the cell identifier.
    fn cell_resolution(&self, cell: Cell) -> Result<Resolution>;
}

/// [`GridIndexer`] backed by the H3 system.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Grid;

impl H3Grid {
    pub fn new() -> Self {
        Self
    }

    fn index(cell: Cell) -> Result<CellIndex> {
        CellIndex::try_from(cell.raw())
            .map_err(|e| GeofenceError::InvalidCell(format!("{cell}: {e}")))
    }

    fn h3_resolution(resolution: Resolution) -> Result<h3o::Resolution> {
        h3o::Resolution::try_from(resolution.value())
            .map_err(|e| GeofenceError::InvalidCoordinate(e.to_string()))
    }
}

impl GridIndexer for H3Grid {
    fn point_to_cell(&self, lat: f64, lng: f64, resolution: Resolution) -> Result<Cell> {
        LatLng::new(lat, lng).validate()?;
        let point = h3o::LatLng::new(lat, lng)
            .map_err(|e| GeofenceError::InvalidCoordinate(e.to_string()))?;
        let index = point.to_cell(Self::h3_resolution(resolution)?);
        Ok(Cell::from_raw(u64::from(index)))
    }

    fn neighbors(&self, cell: Cell, ring: u32) -> Result<Vec<Cell>> {
        if ring > MAX_RING {
            return Err(GeofenceError::RingTooLarge {
                ring,
                max: MAX_RING,
            });
        }
        let index = Self::index(cell)?;
        let disk: Vec<CellIndex> = index.grid_disk(ring);
        Ok(disk
            .into_iter()
            .map(|neighbor| Cell::from_raw(u64::from(neighbor)))
            .collect())
    }

    fn cell_center(&self, cell: Cell) -> Result<LatLng> {
        let center = h3o::LatLng::from(Self::index(cell)?);
        Ok(LatLng::new(center.lat(), center.lng()))
    }

    fn cell_resolution(&self, cell: Cell) -> Result<Resolution> {
        let index = Self::index(cell)?;
        Resolution::new(u8::from(index.resolution()))
    }
}
