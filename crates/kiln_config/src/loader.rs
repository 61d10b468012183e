//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{CacheOptions, DependencyMode, KilnConfig};
use std::path::Path;

/// Loads and validates the cache options from a workspace directory.
///
/// Reads `<workspace_dir>/kiln.toml`, parses it, and validates it.
pub fn load_options(workspace_dir: &Path) -> Result<CacheOptions, ConfigError> {
    let config_path = workspace_dir.join("kiln.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_options_from_str(&content)
}

/// Parses and validates cache options from a string.
///
/// The `[workspace]` table is folded into the returned options.
pub fn load_options_from_str(content: &str) -> Result<CacheOptions, ConfigError> {
    let config: KilnConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    let KilnConfig {
        mut cache,
        workspace,
    } = config;
    cache.workspace = workspace;
    Ok(cache)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    if config.workspace.mode == DependencyMode::Legacy
        && config.workspace.toolchain_root.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "workspace.toolchain_root is required in legacy mode".to_string(),
        ));
    }
    Ok(())
}
