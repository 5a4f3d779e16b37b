use hexpay_core::Config;
use std::env;
use tracing::info;

/// Load the service configuration.
///
/// `HEXPAY_CONFIG` names an optional TOML file; `PORT`, `DATABASE_PATH` and
/// `CORS_ORIGINS` (comma-separated) override what the file says.
pub fn from_env() -> anyhow::Result<Config> {
    let mut config = match env::var("HEXPAY_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            Config::from_file(path)?
        }
        Err(_) => Config::default_config(),
    };

    apply_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT '{}' is not a port number: {}", port, e))?;
    }
    if let Some(path) = lookup("DATABASE_PATH") {
        config.storage.database_path = path;
    }
    if let Some(origins) = lookup("CORS_ORIGINS") {
        config.server.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}
