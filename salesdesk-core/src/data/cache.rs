//! Parquet cache for loaded tables, keyed by source identity.
//!
//! Layout: `{cache_dir}/{blake3(source_id)}.parquet` with a
//! `{key}.meta.json` sidecar recording the source and fetch time.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Freshness check against a caller-supplied TTL
//! - Corrupt entries are quarantined ({filename}.quarantined) and treated
//!   as misses
//!
//! Entries are immutable once populated, so concurrent readers never see a
//! partially written file and never contend with a writer.

use super::source::DataError;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata sidecar for a cached table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub source_id: String,
    pub row_count: usize,
    pub cached_at: NaiveDateTime,
}

impl CacheMeta {
    /// True while `cached_at + ttl` is still in the future.
    pub fn is_fresh(&self, ttl: chrono::Duration) -> bool {
        chrono::Local::now().naive_local() - self.cached_at < ttl
    }
}

/// Cache entry status, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub source_id: String,
    pub row_count: usize,
    pub cached_at: NaiveDateTime,
}

/// The table cache.
pub struct TableCache {
    cache_dir: PathBuf,
}

impl TableCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn key(source_id: &str) -> String {
        blake3::hash(source_id.as_bytes()).to_hex().to_string()
    }

    fn table_path(&self, source_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.parquet", Self::key(source_id)))
    }

    fn meta_path(&self, source_id: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.meta.json", Self::key(source_id)))
    }

    /// Store a table under its source identity.
    ///
    /// Writes are atomic: write to .tmp then rename.
    pub fn store(&self, source_id: &str, df: &DataFrame) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let path = self.table_path(source_id);
        let tmp_path = path.with_extension("parquet.tmp");

        let file = fs::File::create(&tmp_path)
            .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
        ParquetWriter::new(file)
            .finish(&mut df.clone())
            .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            source_id: source_id.to_string(),
            row_count: df.height(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(source_id), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Look up a fresh entry. Stale, absent, and corrupt entries are misses;
    /// corrupt files are quarantined on the way out.
    pub fn lookup(&self, source_id: &str, ttl: chrono::Duration) -> Option<DataFrame> {
        let meta = self.get_meta(source_id)?;
        if !meta.is_fresh(ttl) {
            log::debug!("cache entry for '{source_id}' is stale");
            return None;
        }

        let path = self.table_path(source_id);
        let file = fs::File::open(&path).ok()?;
        match ParquetReader::new(file).finish() {
            Ok(df) => Some(df),
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                log::warn!(
                    "quarantining corrupt cache file {}: {e}",
                    path.display()
                );
                let _ = fs::rename(&path, &quarantine);
                None
            }
        }
    }

    fn get_meta(&self, source_id: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(source_id)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Status of every entry in the cache.
    pub fn status(&self) -> Vec<CacheStatus> {
        let mut statuses = Vec::new();
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return statuses;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_meta = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".meta.json"));
            if !is_meta {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            if let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) {
                statuses.push(CacheStatus {
                    source_id: meta.source_id,
                    row_count: meta.row_count,
                    cached_at: meta.cached_at,
                });
            }
        }
        statuses.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        statuses
    }

    /// Remove entries older than the TTL, and sweep any quarantined files.
    /// Returns the number of entries and quarantined files removed.
    pub fn clean_stale(&self, ttl: chrono::Duration) -> usize {
        let mut removed = 0;
        for status in self.status() {
            let meta = CacheMeta {
                source_id: status.source_id.clone(),
                row_count: status.row_count,
                cached_at: status.cached_at,
            };
            if !meta.is_fresh(ttl) {
                let _ = fs::remove_file(self.table_path(&status.source_id));
                let _ = fs::remove_file(self.meta_path(&status.source_id));
                removed += 1;
            }
        }
        if let Ok(entries) = fs::read_dir(&self.cache_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let is_quarantined = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".quarantined"));
                if is_quarantined && fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("salesdesk_cache_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_table() -> DataFrame {
        df!(
            "Ticker" => &["AAA", "BBB"],
            "AUM" => &[1000.0, -500.0],
        )
        .unwrap()
    }

    #[test]
    fn store_and_lookup_roundtrip() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);

        cache.store("http://example.com/etf.csv", &sample_table()).unwrap();
        let loaded = cache
            .lookup("http://example.com/etf.csv", chrono::Duration::days(21))
            .unwrap();

        assert!(loaded.equals(&sample_table()));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn lookup_unknown_source_misses() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        assert!(cache.lookup("nope", chrono::Duration::days(21)).is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_entry_misses() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        cache.store("src", &sample_table()).unwrap();

        // Zero TTL: everything already written is stale.
        assert!(cache.lookup("src", chrono::Duration::zero()).is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_entry_is_quarantined() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        cache.store("src", &sample_table()).unwrap();

        // Clobber the parquet file.
        fs::write(cache.table_path("src"), b"not parquet").unwrap();
        assert!(cache.lookup("src", chrono::Duration::days(21)).is_none());
        assert!(!cache.table_path("src").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn status_lists_entries() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        cache.store("a", &sample_table()).unwrap();
        cache.store("b", &sample_table()).unwrap();

        let statuses = cache.status();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].source_id, "a");
        assert_eq!(statuses[0].row_count, 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clean_stale_removes_expired_entries() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        cache.store("a", &sample_table()).unwrap();

        assert_eq!(cache.clean_stale(chrono::Duration::days(21)), 0);
        assert_eq!(cache.clean_stale(chrono::Duration::zero()), 1);
        assert!(cache.status().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clean_stale_sweeps_quarantined_files() {
        let dir = temp_cache_dir();
        let cache = TableCache::new(&dir);
        cache.store("src", &sample_table()).unwrap();

        fs::write(cache.table_path("src"), b"not parquet").unwrap();
        assert!(cache.lookup("src", chrono::Duration::days(21)).is_none());

        let quarantined = |dir: &PathBuf| {
            fs::read_dir(dir)
                .unwrap()
                .flatten()
                .filter(|e| e.path().to_string_lossy().ends_with(".quarantined"))
                .count()
        };
        assert_eq!(quarantined(&dir), 1);

        // The entry itself is still fresh; only the quarantined file goes.
        assert_eq!(cache.clean_stale(chrono::Duration::days(21)), 1);
        assert_eq!(quarantined(&dir), 0);
        let _ = fs::remove_dir_all(&dir);
    }
}
