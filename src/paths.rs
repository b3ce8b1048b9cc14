//! Centralized path resolution for archform
//!
//! # Environment Variables
//!
//! - `ARCHFORM_CONFIG` - Override the system file path
//! - `ARCHFORM_CACHE_DIR` - Override the cache directory (AUR sources live below it)
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config` flag (handled by clap, which also reads `ARCHFORM_CONFIG`)
//! 2. `XDG_CONFIG_HOME/archform/system.toml` (if set)
//! 3. `~/.config/archform/system.toml`
//!
//! For cache_dir():
//! 1. `ARCHFORM_CACHE_DIR` environment variable
//! 2. `XDG_CACHE_HOME/archform` (if set)
//! 3. `~/.cache/archform`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for cache directory override
pub const ENV_CACHE_DIR: &str = "ARCHFORM_CACHE_DIR";

/// File name of the system file inside the config directory
pub const SYSTEM_FILE: &str = "system.toml";

/// Get the archform config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        let path = PathBuf::from(xdg_config).join("archform");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("archform");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default system file location
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(SYSTEM_FILE))
}

/// Get the archform cache directory path
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
        let path = expand(&dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME")
        && !xdg_cache.is_empty()
    {
        let path = PathBuf::from(xdg_cache).join("archform");
        log::debug!("Using XDG_CACHE_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".cache").join("archform"))
}

/// Default AUR source cache
pub fn aur_cache_dir() -> Result<PathBuf> {
    Ok(cache_dir()?.join("aur"))
}

/// Expand ~ and environment variables in a path string.
///
/// This is the canonical path expansion function for archform. Declaration
/// paths go through it so that `~/src` resolves against the identity the
/// step runs as (a per-user child has its own `HOME`).
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
