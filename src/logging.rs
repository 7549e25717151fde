//! File logging. The terminal belongs to the UI, so records only go to
//! `mediadeck.log` under the config root.

use crate::config;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;

/// Best-effort setup. Failures are reported on stderr and never stop the
/// player from starting.
pub fn init() -> Option<PathBuf> {
    let log_path = match config::ensure_config_dir().and_then(|_| config::log_path()) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            return None;
        }
    };

    if let Ok(metadata) = fs::metadata(&log_path)
        && metadata.len() > MAX_LOG_BYTES
    {
        let _ = fs::rename(&log_path, log_path.with_extension("log.old"));
    }

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("warning: could not open {}: {err}", log_path.display());
            return None;
        }
    };

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(log::LevelFilter::Off)
        .build();

    if WriteLogger::init(config::log_level(), log_config, file).is_err() {
        eprintln!("warning: logger already initialized");
        return None;
    }

    log::info!("mediadeck session started");
    Some(log_path)
}
