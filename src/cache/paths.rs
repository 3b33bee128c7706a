// Cache path utilities.
// Resolves the cache directory and derives the backing file name for a store.

use std::path::PathBuf;

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Default base cache directory (~/.cache/magento-api-client on Linux).
/// Returns `None` when no home directory can be determined.
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "magento-api-client").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Derive the backing file name for a logical cache name.
///
/// The name is lower-cased and stripped of every character outside
/// `[0-9a-z._-]` before hashing, so two names that differ only by stripped
/// characters share one file. Hashing the sanitized name keeps hostile names
/// from escaping the cache directory.
pub fn cache_file_name(name: &str, extension: &str) -> String {
    let sanitized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        .collect();

    let digest = Sha256::digest(sanitized.as_bytes());
    format!("{}{}", hex::encode(digest), extension)
}
