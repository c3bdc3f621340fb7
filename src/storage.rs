use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::diff::Snapshot;

pub const SNAPSHOT_FILE: &str = "catalog_snapshot.json";

/// Reads a JSON state file. A missing file is simply absent; an unreadable or
/// corrupted one is logged and treated the same, never an error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "Corrupted state file {}, treating it as absent: {err}",
                path.display()
            );
            None
        }
    }
}

/// Whole-file rewrite via a sibling temp file. The rename is atomic on the
/// same filesystem, so readers never observe a torn write.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(storage_path: &Path) -> Self {
        Self {
            path: storage_path.join(SNAPSHOT_FILE),
        }
    }

    pub fn load(&self) -> Snapshot {
        load_json(&self.path).unwrap_or_default()
    }

    pub fn write(&self, snapshot: &Snapshot) -> io::Result<()> {
        write_json_atomic(&self.path, snapshot)
    }
}
