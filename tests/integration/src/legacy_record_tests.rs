//! Stored geofence shapes written by older clients
//!
//! Records carrying a single `h3Index` must validate exactly like a set with
//! that one cell, and the plural `h3Indices` key must read as `cells`.

use crate::test_utils::*;
use hexpay_core::{
    GeofenceError, GeofenceRecord, GridIndexer, H3Grid, LocationValidator, LockedGeofence,
    Resolution,
};

fn riyadh_cell() -> hexpay_core::Cell {
    H3Grid::new()
        .point_to_cell(RIYADH.0, RIYADH.1, Resolution::new(9).unwrap())
        .unwrap()
}

#[test]
fn test_legacy_and_set_records_give_same_verdicts() {
    let cell = riyadh_cell();
    let legacy = GeofenceRecord::from_json(&format!(
        r#"{{"h3Index": "{cell}", "resolution": 9, "lat": 24.7136, "lng": 46.6753}}"#
    ))
    .unwrap();
    let plural = GeofenceRecord::from_json(&format!(
        r#"{{"h3Indices": ["{cell}"], "resolution": 9, "ownerId": "cafe-1"}}"#
    ))
    .unwrap();

    assert!(legacy.is_legacy());
    assert!(!plural.is_legacy());

    let validator = LocationValidator::new();
    for (lat, lng) in [RIYADH, JEDDAH, (24.72, 46.68)] {
        let a = validator.validate_record(&legacy, lat, lng).unwrap();
        let b = validator.validate_record(&plural, lat, lng).unwrap();
        assert_eq!(a.is_valid, b.is_valid);
        assert_eq!(a.candidate_cell, b.candidate_cell);
    }
}

#[test]
fn test_legacy_record_with_wrong_resolution_is_caught_by_grid_check() {
    let record = GeofenceRecord::Single {
        cell: riyadh_cell(),
        resolution: Resolution::new(7).unwrap(),
        owner_id: None,
    };

    assert!(matches!(
        record.into_locked(&H3Grid::new()),
        Err(GeofenceError::ResolutionMismatch { .. })
    ));
}

#[test]
fn test_committed_geofence_survives_json_storage() {
    let geofence = committed_geofence(RIYADH, 9, 2, "cafe-1");
    let json = geofence.to_json().unwrap();

    let record = GeofenceRecord::from_json(&json).unwrap();
    let restored: LockedGeofence = record.into_locked(&H3Grid::new()).unwrap();
    assert_eq!(restored, geofence);
    assert_eq!(restored.len(), 19);
    assert_eq!(restored.owner_id(), Some("cafe-1"));
}

#[test]
fn test_records_with_cells_off_the_grid_never_validate() {
    let json = r#"{"cells":["ff","89283082803ffff"],"resolution":3,"ownerId":"m-1"}"#;
    let record = GeofenceRecord::from_json(json).unwrap();

    assert!(serde_json::from_str::<LockedGeofence>(json).is_err());
    assert!(matches!(
        LocationValidator::new().validate_record(&record, RIYADH.0, RIYADH.1),
        Err(GeofenceError::InvalidCell(_))
    ));
}
