// Cache path utilities.
// Lays out cache generations and their entries under a root directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Get the base cache directory (~/.cache/offline-shell on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "offline-shell").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to the index listing cache generations in creation order.
pub fn index_path(root: &Path) -> PathBuf {
    root.join("caches.json")
}

/// Path to a cache generation's directory.
pub fn generation_dir(root: &Path, name: &str) -> PathBuf {
    root.join("generations").join(sanitize_name(name))
}

/// Path to a generation's entry index.
pub fn entries_index_path(generation: &Path) -> PathBuf {
    generation.join("entries.json")
}

/// Path to an entry's metadata file.
pub fn entry_meta_path(generation: &Path, key: &str) -> PathBuf {
    generation.join(format!("{}.json", entry_id(key)))
}

/// Path to an entry's body file.
pub fn entry_body_path(generation: &Path, key: &str) -> PathBuf {
    generation.join(format!("{}.body", entry_id(key)))
}

/// Stable file stem for a cache key.
/// URLs carry query strings and can exceed file name limits, so hash them.
fn entry_id(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
