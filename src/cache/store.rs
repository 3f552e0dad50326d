use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::types::CacheEntry;
use crate::error::CacheError;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const CACHE_DIR_NAME: &str = "godoc";
pub const SNAPSHOT_FILE: &str = "cache.json";
const SNAPSHOT_VERSION: u32 = 1;

/// Cache construction parameters
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Snapshot file; `None` keeps the cache in memory only
    pub path: Option<PathBuf>,
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

struct Slot {
    entry: CacheEntry,
    written_at: DateTime<Utc>,
    last_access: AtomicU64,
}

impl Slot {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        is_expired(self.written_at, ttl, now)
    }
}

fn is_expired(written_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    match (now - written_at).to_std() {
        Ok(age) => age >= ttl,
        // Written in the future (clock skew): treat as fresh
        Err(_) => false,
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    entries: Vec<RecordOut<'a>>,
}

#[derive(Serialize)]
struct RecordOut<'a> {
    key: &'a str,
    written_at: DateTime<Utc>,
    entry: &'a CacheEntry,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    #[serde(default)]
    entries: Vec<RecordIn>,
}

#[derive(Deserialize)]
struct RecordIn {
    key: String,
    written_at: DateTime<Utc>,
    entry: CacheEntry,
}

/// Bounded, TTL-based documentation cache with an optional JSON snapshot.
///
/// Reads take a shared lock and bump a per-entry access tick; the least
/// recently accessed entry is evicted once capacity is exceeded. Every `set`
/// rewrites the snapshot while persistence is active.
pub struct DocCache {
    entries: RwLock<HashMap<String, Slot>>,
    clock: AtomicU64,
    capacity: usize,
    ttl: Duration,
    /// Snapshot target, held for the whole write so writers never interleave
    snapshot: Mutex<Option<PathBuf>>,
}

impl std::fmt::Debug for DocCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("snapshot", &self.snapshot_path())
            .finish()
    }
}

impl DocCache {
    /// Cache without a snapshot file
    pub fn in_memory(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            capacity: capacity.max(1),
            ttl,
            snapshot: Mutex::new(None),
        }
    }

    /// Builds a cache, loading the snapshot at `config.path` if there is one.
    ///
    /// A missing snapshot is normal. An unreadable or corrupt one disables
    /// persistence for the life of this cache.
    pub fn open(config: CacheConfig) -> Result<Self, CacheError> {
        let cache = Self::in_memory(config.capacity, config.ttl);
        let Some(path) = config.path else {
            return Ok(cache);
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        match cache.load(&path) {
            Ok(()) => {
                tracing::debug!("loaded {} cache entries from {}", cache.len(), path.display());
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("no cache snapshot at {}", path.display());
            }
            Err(e) => {
                tracing::warn!("cache persistence disabled: {}", e);
                return Ok(cache);
            }
        }

        *cache.lock_snapshot() = Some(path);
        Ok(cache)
    }

    /// Opens the cache at [`DocCache::default_path`]
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open(CacheConfig::default().with_path(Self::default_path()?))
    }

    /// `<user cache dir>/godoc/cache.json`
    pub fn default_path() -> Result<PathBuf, CacheError> {
        let dir = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(dir.join(CACHE_DIR_NAME).join(SNAPSHOT_FILE))
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let slot = entries.get(key)?;
        if slot.is_expired(self.ttl, Utc::now()) {
            return None;
        }
        slot.last_access.store(self.tick(), Ordering::Relaxed);
        Some(slot.entry.clone())
    }

    /// Stores `entry` under every non-empty key, then rewrites the snapshot.
    ///
    /// The in-memory update is kept even when the snapshot write fails.
    pub fn set(&self, entry: &CacheEntry, keys: &[String]) -> Result<(), CacheError> {
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let now = Utc::now();
            for key in keys.iter().filter(|k| !k.is_empty()) {
                entries.insert(
                    key.clone(),
                    Slot {
                        entry: entry.clone(),
                        written_at: now,
                        last_access: AtomicU64::new(self.tick()),
                    },
                );
            }
            self.evict_over_capacity(&mut entries);
        }

        self.persist()
    }

    /// Writes a full snapshot if persistence is active
    pub fn persist(&self) -> Result<(), CacheError> {
        let snapshot = self.lock_snapshot();
        let Some(path) = snapshot.as_deref() else {
            return Ok(());
        };

        let bytes = self.encode_snapshot()?;
        write_atomic(path, &bytes)?;
        tracing::debug!("wrote cache snapshot {}", path.display());
        Ok(())
    }

    /// Merges the snapshot at `path` into the cache, skipping expired entries
    pub fn load(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = std::fs::read(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let corrupt = |source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        };
        let snapshot: SnapshotIn = serde_json::from_slice(&bytes).map_err(corrupt)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(corrupt(serde::de::Error::custom(format!(
                "unsupported snapshot version {}",
                snapshot.version
            ))));
        }

        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for record in snapshot.entries {
            if is_expired(record.written_at, self.ttl, now) {
                continue;
            }
            entries.insert(
                record.key,
                Slot {
                    entry: record.entry,
                    written_at: record.written_at,
                    last_access: AtomicU64::new(self.tick()),
                },
            );
        }
        self.evict_over_capacity(&mut entries);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_persistent(&self) -> bool {
        self.lock_snapshot().is_some()
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.lock_snapshot().clone()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock_snapshot(&self) -> std::sync::MutexGuard<'_, Option<PathBuf>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evict_over_capacity(&self, entries: &mut HashMap<String, Slot>) {
        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_access.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!("evicting cache entry {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    fn encode_snapshot(&self) -> Result<Vec<u8>, CacheError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let mut records: Vec<RecordOut<'_>> = entries
            .iter()
            .filter(|(_, slot)| !slot.is_expired(self.ttl, now))
            .map(|(key, slot)| RecordOut {
                key: key.as_str(),
                written_at: slot.written_at,
                entry: &slot.entry,
            })
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(serde_json::to_vec(&SnapshotOut {
            version: SNAPSHOT_VERSION,
            entries: records,
        })?)
    }
}

/// Writes to a temp file beside `path` and renames it into place
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let persist_err = |source| CacheError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(bytes).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::CacheMetadata;
    use crate::docs::{SymbolDoc, SymbolKind};
    use tempfile::TempDir;

    fn entry(name: &str) -> CacheEntry {
        CacheEntry::symbol(
            SymbolDoc::new("fmt", "fmt", SymbolKind::Func, name, format!("{name} docs.")),
            CacheMetadata {
                go_version: "go1.22.0".into(),
                module_version: String::new(),
            },
        )
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_set_and_get_under_every_key() {
        let cache = DocCache::in_memory(DEFAULT_CAPACITY, DEFAULT_TTL);
        cache.set(&entry("Println"), &keys(&["a", "", "b"])).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(entry("Println")));
        assert_eq!(cache.get("b"), Some(entry("Println")));
        assert_eq!(cache.get(""), None);
        assert!(!cache.is_persistent());
    }

    #[test]
    fn test_expired_entries_read_as_absent() {
        let cache = DocCache::in_memory(DEFAULT_CAPACITY, Duration::ZERO);
        cache.set(&entry("Println"), &keys(&["a"])).unwrap();
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = DocCache::in_memory(2, DEFAULT_TTL);
        cache.set(&entry("A"), &keys(&["a"])).unwrap();
        cache.set(&entry("B"), &keys(&["b"])).unwrap();

        // Touch "a" so "b" becomes the eviction candidate
        assert!(cache.get("a").is_some());
        cache.set(&entry("C"), &keys(&["c"])).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_DIR_NAME).join(SNAPSHOT_FILE);

        let cache = DocCache::open(CacheConfig::default().with_path(&path)).unwrap();
        assert!(cache.is_persistent());
        cache.set(&entry("Println"), &keys(&["k1", "k2"])).unwrap();
        assert!(path.exists());

        let reopened = DocCache::open(CacheConfig::default().with_path(&path)).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("k2"), Some(entry("Println")));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["entries"].as_array().unwrap().len(), 2);
        assert!(raw["entries"][0]["written_at"].is_string());
    }

    #[test]
    fn test_expired_snapshot_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);

        let cache = DocCache::open(CacheConfig::default().with_path(&path)).unwrap();
        cache.set(&entry("Println"), &keys(&["k1"])).unwrap();

        let reopened =
            DocCache::open(CacheConfig::default().with_path(&path).with_ttl(Duration::ZERO))
                .unwrap();
        assert!(reopened.is_empty());
        assert!(reopened.is_persistent());
    }

    #[test]
    fn test_corrupt_snapshot_disables_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);
        std::fs::write(&path, b"{not json").unwrap();

        let cache = DocCache::open(CacheConfig::default().with_path(&path)).unwrap();
        assert!(!cache.is_persistent());
        assert_eq!(cache.snapshot_path(), None);

        cache.set(&entry("Println"), &keys(&["k1"])).unwrap();
        assert!(cache.get("k1").is_some());
        // The corrupt file is left untouched
        assert_eq!(std::fs::read(&path).unwrap(), b"{not json");
    }

    #[test]
    fn test_unknown_snapshot_version_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);
        std::fs::write(&path, br#"{"version": 7, "entries": []}"#).unwrap();

        let cache = DocCache::in_memory(DEFAULT_CAPACITY, DEFAULT_TTL);
        let err = cache.load(&path).unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[test]
    fn test_persist_failure_keeps_memory_update() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("gone");
        let path = cache_dir.join(SNAPSHOT_FILE);

        let cache = DocCache::open(CacheConfig::default().with_path(&path)).unwrap();
        std::fs::remove_dir_all(&cache_dir).unwrap();

        let err = cache.set(&entry("Println"), &keys(&["k1"])).unwrap_err();
        assert!(matches!(err, CacheError::Persist { .. }));
        assert_eq!(cache.get("k1"), Some(entry("Println")));
    }

    #[test]
    fn test_create_dir_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let err =
            DocCache::open(CacheConfig::default().with_path(blocker.join("sub").join(SNAPSHOT_FILE)))
                .unwrap_err();
        assert!(matches!(err, CacheError::CreateDir { .. }));
    }
}
