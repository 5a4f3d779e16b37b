//! Merchant Store - SQLite-backed merchant profiles and geofence commits
//!
//! This module persists merchants together with the payment areas they
//! committed:
//! - SQLite backend with WAL mode for durability
//! - One profile row per merchant, unique `merchant_id`
//! - Append-only geofence versions: a new commit supersedes the previous one
//!   but never overwrites it
//! - Cells are re-checked against the grid before anything is written
//!
//! # Layout
//!
//! `merchants` holds the profile fields. `geofence_versions` holds one row per
//! commit with the cells stored as a comma-separated list of H3 indexes and
//! the resolution they were taken at. The current geofence of a merchant is
//! the row with the highest version.

use crate::grid::H3Grid;
use crate::locked::{GeofenceRecord, LockedGeofence};
use crate::store::{GeofenceStore, StoreError, StoreResult};
use crate::types::{Cell, Resolution};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const MAX_NAME_LEN: usize = 255;
const MAX_MERCHANT_ID_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;

/// Whether a merchant currently accepts payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MerchantStatus {
    #[default]
    Active,
    Inactive,
}

impl MerchantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantStatus::Active => "active",
            MerchantStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for MerchantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MerchantStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        match s {
            "active" => Ok(MerchantStatus::Active),
            "inactive" => Ok(MerchantStatus::Inactive),
            other => Err(StoreError::InvalidMerchant(format!(
                "status must be 'active' or 'inactive', got '{other}'"
            ))),
        }
    }
}

/// A stored merchant with its current geofence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merchant {
    /// Row identifier
    pub id: i64,
    /// External merchant identifier
    pub merchant_id: String,
    pub merchant_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<String>,
    pub status: MerchantStatus,
    pub notes: Option<String>,
    /// Latest committed payment area
    pub geofence: LockedGeofence,
    /// Creation time (Unix milliseconds)
    pub created_at: u64,
    /// Last update time (Unix milliseconds)
    pub updated_at: Option<u64>,
}

/// Input for [`MerchantStore::create_merchant`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewMerchant {
    pub merchant_id: String,
    pub merchant_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub status: MerchantStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub h3_indices: Vec<Cell>,
    pub h3_resolution: Resolution,
}

impl NewMerchant {
    /// Minimal merchant owning the cells of `geofence`.
    pub fn from_geofence(
        merchant_id: impl Into<String>,
        merchant_name: impl Into<String>,
        phone: impl Into<String>,
        geofence: &LockedGeofence,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            merchant_name: merchant_name.into(),
            phone: phone.into(),
            email: None,
            address: None,
            business_type: None,
            status: MerchantStatus::Active,
            notes: None,
            h3_indices: geofence.cells().copied().collect(),
            h3_resolution: geofence.resolution(),
        }
    }
}

/// Partial update for [`MerchantStore::update_merchant`]; `None` keeps the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MerchantUpdate {
    pub merchant_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub business_type: Option<String>,
    pub status: Option<MerchantStatus>,
    pub notes: Option<String>,
    pub h3_indices: Option<Vec<Cell>>,
    pub h3_resolution: Option<Resolution>,
}

impl MerchantUpdate {
    fn touches_geofence(&self) -> bool {
        self.h3_indices.is_some() || self.h3_resolution.is_some()
    }
}

/// One committed geofence of a merchant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceVersion {
    pub version: u64,
    pub merchant_id: String,
    pub geofence: LockedGeofence,
    /// Commit time (Unix milliseconds)
    pub committed_at: u64,
}

/// Profile columns as read from SQLite, before the geofence is decoded
struct MerchantRow {
    id: i64,
    merchant_id: String,
    merchant_name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    business_type: Option<String>,
    status: String,
    notes: Option<String>,
    created_at: i64,
    updated_at: Option<i64>,
    h3_indices: String,
    h3_resolution: i64,
}

const MERCHANT_SELECT: &str = r#"
    SELECT m.id, m.merchant_id, m.merchant_name, m.phone, m.email, m.address,
           m.business_type, m.status, m.notes, m.created_at, m.updated_at,
           g.h3_indices, g.h3_resolution
    FROM merchants m
    JOIN geofence_versions g ON g.version = (
        SELECT MAX(version) FROM geofence_versions WHERE merchant_id = m.merchant_id
    )
"#;

impl MerchantRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            merchant_id: row.get(1)?,
            merchant_name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            address: row.get(5)?,
            business_type: row.get(6)?,
            status: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            h3_indices: row.get(11)?,
            h3_resolution: row.get(12)?,
        })
    }

    fn into_merchant(self) -> StoreResult<Merchant> {
        let geofence = decode_geofence(&self.merchant_id, &self.h3_indices, self.h3_resolution)?;
        Ok(Merchant {
            id: self.id,
            status: self.status.parse()?,
            merchant_id: self.merchant_id,
            merchant_name: self.merchant_name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            business_type: self.business_type,
            notes: self.notes,
            geofence,
            created_at: self.created_at as u64,
            updated_at: self.updated_at.map(|ts| ts as u64),
        })
    }
}

/// Merchant store with SQLite backend
pub struct MerchantStore {
    conn: Connection,
    grid: H3Grid,
}

impl MerchantStore {
    /// Create or open a store at the specified path
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(MerchantStore)` - Successfully opened store
    /// * `Err(StoreError)` - Failed to open or initialize database
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening merchant store");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn,
            grid: H3Grid::new(),
        })
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            grid: H3Grid::new(),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS merchants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                merchant_id TEXT NOT NULL UNIQUE,
                merchant_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT,
                address TEXT,
                business_type TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                notes TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS geofence_versions (
                version INTEGER PRIMARY KEY AUTOINCREMENT,
                merchant_id TEXT NOT NULL,
                h3_indices TEXT NOT NULL,
                h3_resolution INTEGER NOT NULL,
                committed_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_merchant_name ON merchants(merchant_name);
            CREATE INDEX IF NOT EXISTS idx_geofence_merchant
                ON geofence_versions(merchant_id, version);
            "#,
        )?;

        Ok(())
    }

    /// Register a merchant and commit its first geofence
    ///
    /// # Errors
    /// * `InvalidMerchant` - a profile field breaks its limits
    /// * `MerchantExists` - `merchant_id` is taken
    /// * `Geofence` - the cells are empty, malformed or mix resolutions
    pub fn create_merchant(&mut self, merchant: NewMerchant) -> StoreResult<Merchant> {
        validate_profile(
            &merchant.merchant_id,
            &merchant.merchant_name,
            &merchant.phone,
            merchant.email.as_deref(),
        )?;

        let geofence = LockedGeofence::from_cells(
            merchant.h3_indices.iter().copied(),
            merchant.h3_resolution,
            Some(merchant.merchant_id.clone()),
            &self.grid,
        )?;

        let tx = self.conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM merchants WHERE merchant_id = ?1",
                [&merchant.merchant_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            warn!(merchant_id = %merchant.merchant_id, "Merchant already exists");
            return Err(StoreError::MerchantExists {
                merchant_id: merchant.merchant_id,
            });
        }

        let now = now_ms();
        tx.execute(
            r#"
            INSERT INTO merchants (
                merchant_id, merchant_name, phone, email, address,
                business_type, status, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                merchant.merchant_id,
                merchant.merchant_name,
                merchant.phone,
                merchant.email,
                merchant.address,
                merchant.business_type,
                merchant.status.as_str(),
                merchant.notes,
                now as i64,
            ],
        )?;
        insert_version(&tx, &merchant.merchant_id, &geofence, now)?;
        tx.commit()?;

        info!(
            merchant_id = %merchant.merchant_id,
            cells = geofence.len(),
            resolution = %geofence.resolution(),
            "Merchant created"
        );

        self.get_merchant(&merchant.merchant_id)
    }

    /// List merchants in creation order
    pub fn list_merchants(&self, skip: usize, limit: usize) -> StoreResult<Vec<Merchant>> {
        let sql = format!("{MERCHANT_SELECT} ORDER BY m.id ASC LIMIT ?1 OFFSET ?2");
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![limit as i64, skip as i64], MerchantRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(MerchantRow::into_merchant).collect()
    }

    /// Get a merchant by its external identifier
    pub fn get_merchant(&self, merchant_id: &str) -> StoreResult<Merchant> {
        self.find_merchant(merchant_id)?
            .ok_or_else(|| StoreError::MerchantNotFound {
                merchant_id: merchant_id.to_string(),
            })
    }

    fn find_merchant(&self, merchant_id: &str) -> StoreResult<Option<Merchant>> {
        let sql = format!("{MERCHANT_SELECT} WHERE m.merchant_id = ?1");
        let row = self
            .conn
            .query_row(&sql, [merchant_id], MerchantRow::from_row)
            .optional()?;

        row.map(MerchantRow::into_merchant).transpose()
    }

    /// Most recently created merchant
    pub fn latest_merchant(&self) -> StoreResult<Option<Merchant>> {
        let sql = format!("{MERCHANT_SELECT} ORDER BY m.created_at DESC, m.id DESC LIMIT 1");
        let row = self
            .conn
            .query_row(&sql, [], MerchantRow::from_row)
            .optional()?;

        row.map(MerchantRow::into_merchant).transpose()
    }

    /// Apply a partial update
    ///
    /// When the update carries cells or a resolution, the combined geofence is
    /// re-validated and committed as a new version.
    pub fn update_merchant(
        &mut self,
        merchant_id: &str,
        update: MerchantUpdate,
    ) -> StoreResult<Merchant> {
        let current = self.get_merchant(merchant_id)?;

        let merchant_name = update.merchant_name.clone().unwrap_or(current.merchant_name);
        let phone = update.phone.clone().unwrap_or(current.phone);
        let email = update.email.clone().or(current.email);
        validate_profile(merchant_id, &merchant_name, &phone, email.as_deref())?;

        let new_geofence = if update.touches_geofence() {
            let cells = update
                .h3_indices
                .clone()
                .unwrap_or_else(|| current.geofence.cells().copied().collect());
            let resolution = update.h3_resolution.unwrap_or(current.geofence.resolution());
            Some(LockedGeofence::from_cells(
                cells,
                resolution,
                Some(merchant_id.to_string()),
                &self.grid,
            )?)
        } else {
            None
        };

        let now = now_ms();
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            UPDATE merchants
            SET merchant_name = ?1, phone = ?2, email = ?3, address = ?4,
                business_type = ?5, status = ?6, notes = ?7, updated_at = ?8
            WHERE merchant_id = ?9
            "#,
            params![
                merchant_name,
                phone,
                email,
                update.address.or(current.address),
                update.business_type.or(current.business_type),
                update.status.unwrap_or(current.status).as_str(),
                update.notes.or(current.notes),
                now as i64,
                merchant_id,
            ],
        )?;
        if let Some(geofence) = &new_geofence {
            insert_version(&tx, merchant_id, geofence, now)?;
        }
        tx.commit()?;

        debug!(
            merchant_id = %merchant_id,
            new_geofence = new_geofence.is_some(),
            "Merchant updated"
        );

        self.get_merchant(merchant_id)
    }

    /// Remove a merchant and all of its geofence versions
    pub fn delete_merchant(&mut self, merchant_id: &str) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM merchants WHERE merchant_id = ?1", [merchant_id])?;
        if removed == 0 {
            return Err(StoreError::MerchantNotFound {
                merchant_id: merchant_id.to_string(),
            });
        }
        tx.execute(
            "DELETE FROM geofence_versions WHERE merchant_id = ?1",
            [merchant_id],
        )?;
        tx.commit()?;

        info!(merchant_id = %merchant_id, "Merchant deleted");
        Ok(())
    }

    /// Every geofence committed by a merchant, oldest first
    pub fn geofence_history(&self, merchant_id: &str) -> StoreResult<Vec<GeofenceVersion>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT version, merchant_id, h3_indices, h3_resolution, committed_at
            FROM geofence_versions
            WHERE merchant_id = ?1
            ORDER BY version ASC
            "#,
        )?;

        let rows = stmt
            .query_map([merchant_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(version, owner, cells, resolution, committed_at)| -> StoreResult<GeofenceVersion> {
                Ok(GeofenceVersion {
                    version: version as u64,
                    geofence: decode_geofence(&owner, &cells, resolution)?,
                    merchant_id: owner,
                    committed_at: committed_at as u64,
                })
            })
            .collect()
    }

    /// Get the database path
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(self.conn.path().unwrap_or(""))
    }
}

impl GeofenceStore for MerchantStore {
    fn save(&mut self, geofence: &LockedGeofence) -> StoreResult<u64> {
        let merchant_id = geofence.owner_id().ok_or(StoreError::MissingOwner)?;
        let checked = LockedGeofence::from_cells(
            geofence.cells().copied(),
            geofence.resolution(),
            Some(merchant_id.to_string()),
            &self.grid,
        )?;

        let tx = self.conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM merchants WHERE merchant_id = ?1",
                [merchant_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::MerchantNotFound {
                merchant_id: merchant_id.to_string(),
            });
        }

        let version = insert_version(&tx, merchant_id, &checked, now_ms())?;
        tx.commit()?;

        info!(merchant_id = %merchant_id, version, "Geofence committed");
        Ok(version)
    }

    fn load(&self, owner_id: &str) -> StoreResult<Option<LockedGeofence>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT h3_indices, h3_resolution FROM geofence_versions
                WHERE merchant_id = ?1
                ORDER BY version DESC
                LIMIT 1
                "#,
                [owner_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        row.map(|(cells, resolution)| decode_geofence(owner_id, &cells, resolution))
            .transpose()
    }

    fn latest(&self) -> StoreResult<Option<LockedGeofence>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT merchant_id, h3_indices, h3_resolution FROM geofence_versions
                ORDER BY version DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(owner, cells, resolution)| decode_geofence(&owner, &cells, resolution))
            .transpose()
    }
}

fn insert_version(
    tx: &rusqlite::Transaction<'_>,
    merchant_id: &str,
    geofence: &LockedGeofence,
    committed_at: u64,
) -> StoreResult<u64> {
    tx.execute(
        r#"
        INSERT INTO geofence_versions (merchant_id, h3_indices, h3_resolution, committed_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            merchant_id,
            geofence.cell_strings().join(","),
            geofence.resolution().value() as i64,
            committed_at as i64,
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

fn decode_geofence(owner_id: &str, cells: &str, resolution: i64) -> StoreResult<LockedGeofence> {
    let resolution = u8::try_from(resolution)
        .map_err(|_| StoreError::Corrupt(format!("resolution {resolution} for '{owner_id}'")))
        .and_then(|value| {
            Resolution::new(value).map_err(|e| StoreError::Corrupt(e.to_string()))
        })?;

    let cells = cells
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Cell::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Corrupt(format!("cells for '{owner_id}': {e}")))?;

    GeofenceRecord::Set {
        cells,
        resolution,
        owner_id: Some(owner_id.to_string()),
    }
    .normalize()
    .map_err(|e| StoreError::Corrupt(format!("geofence for '{owner_id}': {e}")))
}

fn validate_profile(
    merchant_id: &str,
    merchant_name: &str,
    phone: &str,
    email: Option<&str>,
) -> StoreResult<()> {
    check_length("merchant_id", merchant_id, MAX_MERCHANT_ID_LEN)?;
    check_length("merchant_name", merchant_name, MAX_NAME_LEN)?;
    check_length("phone", phone, MAX_PHONE_LEN)?;
    if let Some(email) = email {
        if !email.contains('@') {
            return Err(StoreError::InvalidMerchant(format!(
                "email '{email}' is not a valid address"
            )));
        }
    }
    Ok(())
}

fn check_length(field: &str, value: &str, max: usize) -> StoreResult<()> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(StoreError::InvalidMerchant(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
