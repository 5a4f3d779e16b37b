//! Merchant authoring → commit → store → customer validation
//!
//! Runs the whole flow against a real SQLite file, including a reopen between
//! the merchant and the customer side.

use crate::test_utils::*;
use hexpay_core::coordinate;
use hexpay_core::{GeofenceSet, GeofenceStore, LocationValidator, MemoryGeofenceStore, MerchantUpdate};

#[test]
fn test_merchant_commit_then_customer_validates() {
    init_test_logging();
    let db = TempDb::new();

    let geofence = committed_geofence(RIYADH, 9, 1, "cafe-1");
    {
        let mut store = db.open();
        store.create_merchant(merchant_for("cafe-1", &geofence)).unwrap();
    }

    // Customer side opens the store fresh
    let store = db.open();
    let loaded = store.load("cafe-1").unwrap().unwrap();
    assert_eq!(loaded, geofence);

    let validator = LocationValidator::new();
    let inside = validator.validate(&loaded, RIYADH.0, RIYADH.1).unwrap();
    assert!(inside.is_valid);

    let outside = validator.validate(&loaded, JEDDAH.0, JEDDAH.1).unwrap();
    assert!(!outside.is_valid);
    assert!(!loaded.contains(outside.candidate_cell));
}

#[test]
fn test_parsed_search_box_input_drives_authoring() {
    let point = coordinate::parse("  24.7136 ,   46.6753 ").unwrap();
    assert_eq!((point.lat, point.lng), RIYADH);

    // Longitude-first input is tolerated when the ranges make it unambiguous
    let swapped = coordinate::parse("-122.0553238, 37.3615593").unwrap();
    assert_eq!((swapped.lat, swapped.lng), (37.3615593, -122.0553238));

    let mut set = GeofenceSet::new();
    let cell = set.add_cell(point.lat, point.lng, 9).unwrap();
    let locked = set.commit(Some("cafe-1".to_string())).unwrap();

    let result = LocationValidator::new()
        .validate(&locked, RIYADH.0, RIYADH.1)
        .unwrap();
    assert!(result.is_valid);
    assert_eq!(result.candidate_cell, cell);
}

#[test]
fn test_recommit_supersedes_previous_geofence() {
    init_test_logging();
    let db = TempDb::new();
    let mut store = db.open();

    let riyadh = committed_geofence(RIYADH, 9, 0, "cafe-1");
    store.create_merchant(merchant_for("cafe-1", &riyadh)).unwrap();

    // The merchant moves to Jeddah
    let jeddah = committed_geofence(JEDDAH, 9, 1, "cafe-1");
    store.save(&jeddah).unwrap();

    let current = store.load("cafe-1").unwrap().unwrap();
    assert_eq!(current, jeddah);

    let validator = LocationValidator::new();
    assert!(!validator.validate(&current, RIYADH.0, RIYADH.1).unwrap().is_valid);
    assert!(validator.validate(&current, JEDDAH.0, JEDDAH.1).unwrap().is_valid);

    let history = store.geofence_history("cafe-1").unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].geofence, riyadh);
}

#[test]
fn test_update_with_new_resolution_commits_version() {
    let db = TempDb::new();
    let mut store = db.open();

    let coarse = committed_geofence(RIYADH, 8, 0, "cafe-1");
    store.create_merchant(merchant_for("cafe-1", &coarse)).unwrap();

    let fine = committed_geofence(RIYADH, 10, 1, "cafe-1");
    let updated = store
        .update_merchant(
            "cafe-1",
            MerchantUpdate {
                h3_indices: Some(fine.cells().copied().collect()),
                h3_resolution: Some(fine.resolution()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.geofence, fine);
    assert_eq!(store.geofence_history("cafe-1").unwrap().len(), 2);
    assert_eq!(store.latest().unwrap(), Some(fine));
}

#[test]
fn test_memory_and_sqlite_stores_agree() {
    let db = TempDb::new();
    let mut sqlite = db.open();
    let mut memory = MemoryGeofenceStore::new();

    for (owner, point) in [("cafe-1", RIYADH), ("cafe-2", JEDDAH)] {
        let geofence = committed_geofence(point, 9, 1, owner);
        sqlite.create_merchant(merchant_for(owner, &geofence)).unwrap();
        memory.save(&geofence).unwrap();
    }

    for owner in ["cafe-1", "cafe-2", "ghost"] {
        assert_eq!(sqlite.load(owner).unwrap(), memory.load(owner).unwrap());
    }
    assert_eq!(sqlite.latest().unwrap(), memory.latest().unwrap());
}
