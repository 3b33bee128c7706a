// Cache store for memoized API responses.
// Handles JSON serialization, TTL checking, and filesystem operations.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::error::{Error, Result};

use super::paths;

/// Default entry lifetime: one hour.
pub const DEFAULT_LIFETIME: u64 = 3600;

/// Identity and default TTL for one cache store.
///
/// The triple (path, name, extension) resolves to exactly one backing file.
/// A store is bound to that file for its whole lifetime; to target a
/// different file, open a new store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub name: String,
    pub extension: String,
    /// Default TTL in seconds for new entries. Zero means entries are
    /// written already expired.
    pub lifetime: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: paths::default_cache_dir().unwrap_or_else(|| PathBuf::from("cache")),
            name: "default".to_string(),
            extension: ".cache".to_string(),
            lifetime: DEFAULT_LIFETIME,
        }
    }
}

/// One persisted entry: creation time, lifetime in seconds, and the payload
/// as JSON text. On disk: `{"time": .., "expire": .., "data": ".."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    time: u64,
    expire: u64,
    data: String,
}

impl Entry {
    /// `expire == 0` is an immediate-invalidate marker, not "infinite".
    fn is_expired(&self, now: u64) -> bool {
        if self.expire == 0 {
            return true;
        }
        now.saturating_sub(self.time) > self.expire
    }
}

/// File-backed key-value store with per-entry expiry.
///
/// Entries expire lazily: a stale entry stays on disk until it is read via
/// `get`/`clean_by_key` or swept by `clean_expired`/`clean_all`. Every
/// mutation rewrites the whole table through an atomic temp-file-and-rename
/// write. There is no inter-process locking: concurrent writers to the same
/// file can lose updates.
#[derive(Debug)]
pub struct ApiCache {
    file: PathBuf,
    lifetime: u64,
    entries: HashMap<String, Entry>,
}

impl ApiCache {
    /// Open a store: create the cache directory, resolve the backing file,
    /// and load any existing entries. An unreadable or corrupt file starts
    /// the store empty rather than failing the open.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let dir = &config.path;
        fs::create_dir_all(dir).map_err(|source| Error::CacheDir {
            path: dir.clone(),
            source,
        })?;
        let meta = fs::metadata(dir).map_err(|source| Error::CacheDir {
            path: dir.clone(),
            source,
        })?;
        if meta.permissions().readonly() {
            return Err(Error::CacheDir {
                path: dir.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "cache directory must be readable and writable",
                ),
            });
        }

        let file = dir.join(paths::cache_file_name(&config.name, &config.extension));
        let entries = load_entries(&file);

        Ok(Self {
            file,
            lifetime: config.lifetime,
            entries,
        })
    }

    /// Store a value under `key` with the default lifetime. One disk write.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.lifetime)
    }

    /// Store a value with an explicit TTL in seconds. `ttl == 0` writes the
    /// entry already expired.
    pub fn set_with_ttl<T: Serialize>(&mut self, key: &str, value: &T, ttl: u64) -> Result<()> {
        self.insert(key, value, ttl)?;
        self.persist()
    }

    /// Store a batch of values with exactly one disk write.
    pub fn set_many<T: Serialize>(&mut self, values: &HashMap<String, T>) -> Result<()> {
        for (key, value) in values {
            self.insert(key, value, self.lifetime)?;
        }
        self.persist()
    }

    fn insert<T: Serialize>(&mut self, key: &str, value: &T, ttl: u64) -> Result<()> {
        let entry = Entry {
            time: now(),
            expire: ttl,
            data: serde_json::to_string(value)?,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Fetch a value, lazily evicting it first when stale. Missing keys and
    /// corrupt payloads both read as `None`; a corrupt payload is logged.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        if let Err(err) = self.clean_by_key(key) {
            warn!(key, error = %err, "failed to evict expired cache entry");
        }
        let entry = self.entries.get(key)?;
        decode(key, &entry.data)
    }

    /// Deserialize every entry currently in the table. Expired entries that
    /// have not been swept yet are included; call `clean_expired` first for
    /// live data only. Corrupt payloads are skipped.
    pub fn all<T: DeserializeOwned>(&self) -> HashMap<String, T> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| decode(key, &entry.data).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Membership test. Does not trigger expiry eviction.
    pub fn is_cached(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Evict `key` if it is expired; no-op otherwise.
    pub fn clean_by_key(&mut self, key: &str) -> Result<()> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now()));
        if expired {
            self.entries.remove(key);
            self.persist()?;
        }
        Ok(())
    }

    /// Evict every expired entry with a single disk write. Idempotent.
    pub fn clean_expired(&mut self) -> Result<()> {
        let now = now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        self.persist()
    }

    /// Drop every entry and truncate the backing file.
    pub fn clean_all(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    /// The resolved backing file for this store.
    pub fn cache_file(&self) -> &Path {
        &self.file
    }

    /// Default TTL in seconds for new entries.
    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    /// Change the default TTL for subsequent writes. Existing entries keep
    /// the TTL they were written with.
    pub fn set_lifetime(&mut self, lifetime: u64) {
        self.lifetime = lifetime;
    }

    /// Rewrite the whole table: serialize, write to a temp file, fsync,
    /// rename over the backing file.
    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;

        let temp_path = self.file.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.file)?;

        Ok(())
    }
}

fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn load_entries(file: &Path) -> HashMap<String, Entry> {
    let Ok(contents) = fs::read_to_string(file) else {
        return HashMap::new();
    };
    match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(file = %file.display(), error = %err, "cache file is corrupt, starting empty");
            HashMap::new()
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: &str) -> Option<T> {
    match serde_json::from_str(data) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "cached payload failed to deserialize, treating as miss");
            None
        }
    }
}
