//! Table Cache Module
//! Process-wide memo of loaded tables with explicit invalidation.

use once_cell::sync::Lazy;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

static GLOBAL: Lazy<Mutex<TableCache>> = Lazy::new(|| Mutex::new(TableCache::new()));

/// Cached tables keyed by source descriptor and pipeline stage.
///
/// `DataFrame` clones share their column buffers, so handing out copies is cheap.
#[derive(Default)]
pub struct TableCache {
    tables: HashMap<String, DataFrame>,
    loads: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `key`, running `load` only on a miss.
    ///
    /// Failed loads leave the cache untouched.
    pub fn get_or_load<E, F>(&mut self, key: &str, load: F) -> Result<DataFrame, E>
    where
        F: FnOnce() -> Result<DataFrame, E>,
    {
        if let Some(df) = self.tables.get(key) {
            debug!(key, "table cache hit");
            return Ok(df.clone());
        }

        let df = load()?;
        self.loads += 1;
        info!(key, rows = df.height(), "table cached");
        self.tables.insert(key.to_string(), df.clone());
        Ok(df)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tables.contains_key(key)
    }

    /// Drop one entry; returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.tables.remove(key).is_some();
        if removed {
            info!(key, "table cache entry invalidated");
        }
        removed
    }

    /// Drop every entry (the dashboard's refresh command).
    pub fn clear(&mut self) {
        let n = self.tables.len();
        self.tables.clear();
        info!(entries = n, "table cache cleared");
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of loads that actually ran.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

/// Lock the process-wide cache.
///
/// A poisoned lock only means a loader panicked mid-call; the map itself is
/// still consistent, so the guard is recovered.
pub fn global() -> MutexGuard<'static, TableCache> {
    GLOBAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cache key for one stage of one source.
pub fn stage_key(source: &str, stage: &str) -> String {
    format!("{stage}@{source}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn sample() -> DataFrame {
        df!("x" => [1i32, 2, 3]).unwrap()
    }

    #[test]
    fn loads_once_until_invalidated() {
        let mut cache = TableCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let df = cache
                .get_or_load::<PolarsError, _>("k", || {
                    calls += 1;
                    Ok(sample())
                })
                .unwrap();
            assert_eq!(df.height(), 3);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.load_count(), 1);

        assert!(cache.invalidate("k"));
        assert!(!cache.invalidate("k"));
        cache
            .get_or_load::<PolarsError, _>("k", || {
                calls += 1;
                Ok(sample())
            })
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = TableCache::new();
        let result: Result<DataFrame, String> = cache.get_or_load("k", || Err("boom".into()));
        assert!(result.is_err());
        assert!(!cache.contains("k"));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_all_entries() {
        let mut cache = TableCache::new();
        for key in ["a", "b"] {
            cache
                .get_or_load::<PolarsError, _>(key, || Ok(sample()))
                .unwrap();
        }
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn stage_keys_separate_stages() {
        assert_ne!(stage_key("csv:a", "raw"), stage_key("csv:a", "normalized"));
    }
}
