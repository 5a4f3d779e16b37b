//! Configuration management for HexPay.

use crate::geofence::DEFAULT_MAX_EXPANSION_RING;
use crate::grid::MAX_RING;
use crate::types::MAX_RESOLUTION;
use crate::validator::VerdictMessages;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Resolution used when a merchant does not pick one
    pub default_resolution: u8,
    /// Ring distance for neighbor expansion
    pub expansion_ring: u32,
    /// Widest ring an expansion request may ask for
    pub max_expansion_ring: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub inside_message: String,
    pub outside_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_resolution: 9,
            expansion_ring: 1,
            max_expansion_ring: DEFAULT_MAX_EXPANSION_RING,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "hexpay.db".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let messages = VerdictMessages::default();
        Self {
            inside_message: messages.inside,
            outside_message: messages.outside,
        }
    }
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            grid: GridConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            validation: ValidationConfig::default(),
        }
    }

    /// Reject values the grid or the listener cannot use.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grid.default_resolution > MAX_RESOLUTION {
            anyhow::bail!(
                "grid.default_resolution must be 0..={}, got {}",
                MAX_RESOLUTION,
                self.grid.default_resolution
            );
        }
        if self.grid.max_expansion_ring > MAX_RING {
            anyhow::bail!(
                "grid.max_expansion_ring must be at most {}, got {}",
                MAX_RING,
                self.grid.max_expansion_ring
            );
        }
        if self.grid.expansion_ring > self.grid.max_expansion_ring {
            anyhow::bail!(
                "grid.expansion_ring {} exceeds grid.max_expansion_ring {}",
                self.grid.expansion_ring,
                self.grid.max_expansion_ring
            );
        }
        if self.server.port == 0 {
            anyhow::bail!("server.port must be non-zero");
        }
        if self.storage.database_path.trim().is_empty() {
            anyhow::bail!("storage.database_path must not be empty");
        }
        Ok(())
    }

    /// Verdict texts for [`crate::LocationValidator::with_messages`].
    pub fn verdict_messages(&self) -> VerdictMessages {
        VerdictMessages {
            inside: self.validation.inside_message.clone(),
            outside: self.validation.outside_message.clone(),
        }
    }

    /// Whether any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.server.cors_origins.iter().any(|origin| origin == "*")
    }
}
