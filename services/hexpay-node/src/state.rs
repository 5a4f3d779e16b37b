use hexpay_core::{Config, LocationValidator, MerchantStore, StoreResult};
use std::sync::{Mutex, MutexGuard};

use crate::error::ApiError;

pub struct AppState {
    pub config: Config,
    store: Mutex<MerchantStore>,
    pub validator: LocationValidator,
}

impl AppState {
    /// Open the SQLite store named by `config.storage.database_path`.
    pub fn new(config: Config) -> StoreResult<Self> {
        let store = MerchantStore::open(&config.storage.database_path)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: MerchantStore) -> Self {
        let validator = LocationValidator::new().with_messages(config.verdict_messages());
        AppState {
            config,
            store: Mutex::new(store),
            validator,
        }
    }

    pub fn store(&self) -> Result<MutexGuard<'_, MerchantStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("merchant store lock poisoned".to_string()))
    }
}
