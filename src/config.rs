use anyhow::{Context, Result};
use log::LevelFilter;
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "mediadeck";
const HANDLE_STORE_FILE: &str = "handles.json";
const LOG_FILE: &str = "mediadeck.log";

pub const CONFIG_DIR_ENV: &str = "MEDIADECK_CONFIG_DIR";
pub const LOG_LEVEL_ENV: &str = "MEDIADECK_LOG";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let base = dirs::config_dir().context("no configuration directory for this platform")?;
    Ok(base.join(APP_DIR))
}

pub fn handle_store_path() -> Result<PathBuf> {
    Ok(config_root()?.join(HANDLE_STORE_FILE))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn log_level() -> LevelFilter {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(LevelFilter::Info)
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
