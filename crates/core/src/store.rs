//! Geofence persistence boundary.
//!
//! The core never decides where committed geofences live. A
//! [`GeofenceStore`] keeps every commit per owner (a new commit supersedes
//! the previous one without destroying it) and answers "by owner" and
//! "latest" lookups.

use crate::error::GeofenceError;
use crate::locked::LockedGeofence;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Geofence rejected: {0}")]
    Geofence(#[from] GeofenceError),

    #[error("Merchant with ID '{merchant_id}' already exists")]
    MerchantExists { merchant_id: String },

    #[error("Merchant with ID '{merchant_id}' not found")]
    MerchantNotFound { merchant_id: String },

    #[error("Invalid merchant: {0}")]
    InvalidMerchant(String),

    #[error("Geofence has no owner; cannot persist it")]
    MissingOwner,

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Keeps committed geofences keyed by owner.
pub trait GeofenceStore {
    /// Append a commit for the geofence's owner and return its version.
    fn save(&mut self, geofence: &LockedGeofence) -> StoreResult<u64>;

    /// Most recent commit for `owner_id`.
    fn load(&self, owner_id: &str) -> StoreResult<Option<LockedGeofence>>;

    /// Most recent commit across all owners.
    fn latest(&self) -> StoreResult<Option<LockedGeofence>>;
}

/// In-process store, the server-side counterpart of the browser's
/// "last locked geofence" slot.
#[derive(Debug, Default)]
pub struct MemoryGeofenceStore {
    versions: HashMap<String, Vec<(u64, LockedGeofence)>>,
    next_version: u64,
    latest_owner: Option<String>,
}

impl MemoryGeofenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every commit for `owner_id`, oldest first.
    pub fn history(&self, owner_id: &str) -> Vec<(u64, LockedGeofence)> {
        self.versions.get(owner_id).cloned().unwrap_or_default()
    }

    pub fn owner_count(&self) -> usize {
        self.versions.len()
    }
}

impl GeofenceStore for MemoryGeofenceStore {
    fn save(&mut self, geofence: &LockedGeofence) -> StoreResult<u64> {
        let owner_id = geofence.owner_id().ok_or(StoreError::MissingOwner)?.to_string();

        self.next_version += 1;
        let version = self.next_version;
        self.versions
            .entry(owner_id.clone())
            .or_default()
            .push((version, geofence.clone()));

        info!(owner_id = %owner_id, version, cells = geofence.len(), "Geofence stored");
        self.latest_owner = Some(owner_id);
        Ok(version)
    }

    fn load(&self, owner_id: &str) -> StoreResult<Option<LockedGeofence>> {
        Ok(self
            .versions
            .get(owner_id)
            .and_then(|versions| versions.last())
            .map(|(_, geofence)| geofence.clone()))
    }

    fn latest(&self) -> StoreResult<Option<LockedGeofence>> {
        match &self.latest_owner {
            Some(owner_id) => self.load(owner_id),
            None => Ok(None),
        }
    }
}
