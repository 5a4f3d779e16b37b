//! Integration tests for the merchant to customer flow
//!
//! This test suite validates:
//! - Geofence authoring, commit and persistence in SQLite
//! - Superseding commits and history
//! - Legacy single-cell records read back as one-element sets
//! - The HTTP surface driving the same flow end to end

pub mod test_utils;

#[cfg(test)]
mod geofence_flow_tests;

#[cfg(test)]
mod legacy_record_tests;

#[cfg(test)]
mod http_flow_tests;
