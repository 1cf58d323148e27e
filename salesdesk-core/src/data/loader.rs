//! Tabular loader: fetch a spreadsheet source through the TTL cache.

use super::cache::TableCache;
use super::source::{DataError, TableSource};
use polars::prelude::*;

/// Default retention window for cached tables (reference deployment).
pub const DEFAULT_TTL_DAYS: i64 = 21;

/// Loads tables from sources, caching each result by source identity.
///
/// A cache hit within the TTL never re-fetches; a miss fetches exactly once
/// and stores the result. A failed cache store is logged and the fetched
/// table is still returned — only fetch and parse failures block the caller.
pub struct TableLoader {
    cache: TableCache,
    ttl: chrono::Duration,
}

impl TableLoader {
    pub fn new(cache_dir: impl Into<std::path::PathBuf>, ttl_days: i64) -> Self {
        Self {
            cache: TableCache::new(cache_dir),
            ttl: chrono::Duration::days(ttl_days),
        }
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn load(&self, source: &dyn TableSource) -> Result<DataFrame, DataError> {
        let id = source.id();
        if let Some(df) = self.cache.lookup(&id, self.ttl) {
            log::debug!("cache hit for '{id}' ({} rows)", df.height());
            return Ok(df);
        }

        log::info!("fetching '{id}'");
        let df = source.fetch()?;
        if let Err(e) = self.cache.store(&id, &df) {
            log::warn!("failed to cache '{id}': {e}");
        }
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::FileSource;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir =
            std::env::temp_dir().join(format!("salesdesk_loader_{}_{id}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// In-memory source that counts how often it gets fetched.
    struct CountingSource {
        id: String,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl TableSource for CountingSource {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn fetch(&self) -> Result<DataFrame, DataError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(df!(
                "Ticker" => &["AAA"],
                "AUM" => &[100.0],
            )
            .unwrap())
        }
    }

    #[test]
    fn repeated_load_within_ttl_fetches_once() {
        let dir = temp_cache_dir();
        let loader = TableLoader::new(&dir, DEFAULT_TTL_DAYS);
        let source = CountingSource::new("src");

        let first = loader.load(&source).unwrap();
        let second = loader.load(&source).unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(first.equals(&second));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn expired_entry_refetches() {
        let dir = temp_cache_dir();
        let loader = TableLoader::new(&dir, 0);
        let source = CountingSource::new("src");

        loader.load(&source).unwrap();
        loader.load(&source).unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn edited_upload_is_reloaded_not_served_stale() {
        let dir = temp_cache_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("upload.csv");
        std::fs::write(&path, "Ticker,AUM\nAAA,1.0\n").unwrap();
        let loader = TableLoader::new(dir.join("cache"), DEFAULT_TTL_DAYS);

        let first = loader.load(&FileSource::new(&path)).unwrap();
        assert_eq!(first.height(), 1);

        // Rewriting the file must not hit the old entry, TTL notwithstanding.
        std::fs::write(&path, "Ticker,AUM\nAAA,1.0\nBBB,2.0\n").unwrap();
        let second = loader.load(&FileSource::new(&path)).unwrap();
        assert_eq!(second.height(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn distinct_sources_cache_independently() {
        let dir = temp_cache_dir();
        let loader = TableLoader::new(&dir, DEFAULT_TTL_DAYS);
        let a = CountingSource::new("a");
        let b = CountingSource::new("b");

        loader.load(&a).unwrap();
        loader.load(&b).unwrap();
        loader.load(&a).unwrap();

        assert_eq!(a.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(b.fetches.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
