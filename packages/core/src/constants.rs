// ABOUTME: Filesystem locations for REVV data
// ABOUTME: Resolves the data directory from REVV_DATA_DIR or the home directory

use std::env;
use std::path::PathBuf;

use revv_config::REVV_DATA_DIR;

/// Get the path to the REVV data directory (~/.revv, or $REVV_DATA_DIR)
pub fn revv_dir() -> PathBuf {
    if let Ok(dir) = env::var(REVV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    // HOME first so tests can redirect it
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".revv")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".revv")
    }
}
