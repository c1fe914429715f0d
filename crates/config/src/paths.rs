//! Path helpers for on-disk state.

use std::path::PathBuf;

/// Data directory (~/.motive). Falls back to a relative directory when
/// no home is resolvable, e.g. in minimal containers.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".motive"))
        .unwrap_or_else(|| PathBuf::from(".motive"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
