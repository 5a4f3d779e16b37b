//! Core types shared by the geofence components.

use crate::error::{GeofenceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// Supported H3 resolutions
pub const MIN_RESOLUTION: u8 = 0;
pub const MAX_RESOLUTION: u8 = 15;

/// A latitude/longitude pair in decimal degrees.
///
/// Construction does not check ranges: the coordinate parser may hand back a
/// best-effort pair that is out of range. Use [`LatLng::validate`] or let the
/// grid indexer reject it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and inside the global range.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "latitude {} outside [{MIN_LAT}, {MAX_LAT}]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(MIN_LNG..=MAX_LNG).contains(&self.lng) {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "longitude {} outside [{MIN_LNG}, {MAX_LNG}]",
                self.lng
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Grid granularity level (0 = coarsest, 15 = finest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Resolution(u8);

impl Resolution {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_RESOLUTION {
            return Err(GeofenceError::InvalidCoordinate(format!(
                "resolution {value} outside supported range {MIN_RESOLUTION}..={MAX_RESOLUTION}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Resolution {
    type Error = GeofenceError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Resolution> for u8 {
    fn from(resolution: Resolution) -> Self {
        resolution.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of one hexagon in the global grid.
///
/// Holds the raw 64-bit H3 index and renders as the canonical lowercase
/// hexadecimal string. Ordering follows the raw value so listings come out
/// deterministic; it carries no geographic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cell(u64);

impl Cell {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for Cell {
    type Err = GeofenceError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GeofenceError::InvalidCell("empty cell identifier".to_string()));
        }
        u64::from_str_radix(trimmed, 16)
            .map(Cell)
            .map_err(|e| GeofenceError::InvalidCell(format!("{trimmed:?}: {e}")))
    }
}

impl TryFrom<String> for Cell {
    type Error = GeofenceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        cell.to_string()
    }
}
