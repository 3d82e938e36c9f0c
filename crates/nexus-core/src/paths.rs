use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NEXUS_DIR: &str = ".nexus";
pub const STORE_DIR: &str = ".nexus/store";
pub const CONFIG_FILE: &str = ".nexus/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn nexus_dir(root: &Path) -> PathBuf {
    root.join(NEXUS_DIR)
}

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// File backing a single store key. Keys are already filesystem-safe.
pub fn store_entry(root: &Path, key: &str) -> PathBuf {
    store_dir(root).join(format!("{key}.json"))
}
