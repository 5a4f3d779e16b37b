//! Core functionality for HexPay, the hexagonal-grid payment geofence engine.
//!
//! Merchants select grid cells around their premises ([`GeofenceSet`]) and
//! commit them as an immutable [`LockedGeofence`]. Customers are accepted when
//! the cell of their reported location belongs to that set
//! ([`LocationValidator`]).
//!
//! ```no_run
//! use hexpay_core::{GeofenceSet, LocationValidator};
//!
//! let mut set = GeofenceSet::new();
//! set.add_cell(24.7136, 46.6753, 9)?;
//! set.expand_neighbors(1)?;
//! let locked = set.commit(Some("merchant-1".to_string()))?;
//!
//! let verdict = LocationValidator::new().validate(&locked, 24.7137, 46.6754)?;
//! assert!(verdict.is_valid);
//! # Ok::<(), hexpay_core::GeofenceError>(())
//! ```

pub mod config;
pub mod coordinate;
pub mod error;
pub mod geofence;
pub mod grid;
pub mod locked;
pub mod logging;
#[cfg(feature = "sqlite")]
pub mod merchant;
pub mod store;
pub mod types;
pub mod validator;

pub use config::Config;
pub use coordinate::CoordinateOrder;
pub use error::{GeofenceError, Result};
pub use geofence::{BatchAddReport, CellMetadata, GeofenceSet, DEFAULT_MAX_EXPANSION_RING};
pub use grid::{GridIndexer, H3Grid, MAX_RING};
pub use locked::{GeofenceRecord, LockedGeofence};
#[cfg(feature = "sqlite")]
pub use merchant::{
    GeofenceVersion, Merchant, MerchantStatus, MerchantStore, MerchantUpdate, NewMerchant,
};
pub use store::{GeofenceStore, MemoryGeofenceStore, StoreError, StoreResult};
pub use types::{Cell, LatLng, Resolution};
pub use validator::{LocationValidator, ValidationResult, VerdictMessages};
