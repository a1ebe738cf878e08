pub mod error;
pub mod model;

pub use error::*;
pub use model::*;

use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "gpu-config.json";

/// Environment variable pointing directly at a configuration file
pub const CONFIG_PATH_ENV: &str = "GPU_FINDER_CONFIG";

/// Locate the configuration file
///
/// Search order:
/// 1. `GPU_FINDER_CONFIG` environment variable (direct path)
/// 2. `./gpu-config.json`
/// 3. `~/.config/gpufinder/gpu-config.json` (global config)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. Environment override
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points to {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    // 2. Current directory
    let local = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    // 3. Global config
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("gpufinder").join(CONFIG_FILE_NAME);
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Read and parse a configuration file. Does not validate it.
pub fn load_config(path: &Path) -> Result<GpuConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = GpuConfig::from_json(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load from an explicit path, or discover the file when none is given
pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, GpuConfig)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    let config = load_config(&path)?;
    Ok((path, config))
}
