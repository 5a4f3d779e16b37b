//! Test utilities for geofence integration tests

use hexpay_core::logging::{self, LogFormat};
use hexpay_core::{GeofenceSet, LockedGeofence, MerchantStore, NewMerchant};
use std::path::PathBuf;

/// King Fahd Road, Riyadh
pub const RIYADH: (f64, f64) = (24.7136, 46.6753);

/// Al-Balad, Jeddah; roughly 850 km from [`RIYADH`]
pub const JEDDAH: (f64, f64) = (21.4858, 39.1925);

/// Install a test subscriber once per process
pub fn init_test_logging() {
    logging::try_init(LogFormat::Plain);
}

/// SQLite file under the system temp dir, removed on drop
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("hexpay_it_{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn open(&self) -> MerchantStore {
        MerchantStore::open(&self.path).unwrap()
    }
}

impl Default for TempDb {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            std::fs::remove_file(path).ok();
        }
    }
}

/// Geofence around `point` grown by `ring`, committed for `owner`
pub fn committed_geofence(point: (f64, f64), resolution: u8, ring: u32, owner: &str) -> LockedGeofence {
    let mut set = GeofenceSet::new();
    set.add_cell(point.0, point.1, resolution).unwrap();
    if ring > 0 {
        set.expand_neighbors(ring).unwrap();
    }
    set.commit(Some(owner.to_string())).unwrap()
}

/// Registration payload owning `geofence`
pub fn merchant_for(merchant_id: &str, geofence: &LockedGeofence) -> NewMerchant {
    NewMerchant::from_geofence(merchant_id, format!("Merchant {merchant_id}"), "+966500000000", geofence)
}
