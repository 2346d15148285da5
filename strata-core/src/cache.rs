use crate::{RenderedQuery, RowLabeled, SqlWriter};
use std::collections::{HashMap, HashSet};

/// Cache key for a select, derived from the rendered query shape.
///
/// Two independently built but structurally identical queries render to the
/// same SQL and parameter list, so they share an entry. Object identity
/// never participates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub table: String,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(table: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Key for a rendered query: the SQL text plus its parameters rendered
    /// as literals by the writer.
    pub fn for_query(table: &str, rendered: &RenderedQuery, writer: &dyn SqlWriter) -> Self {
        let mut fingerprint = String::with_capacity(rendered.sql.len() + 16);
        fingerprint.push_str(&rendered.sql);
        for param in &rendered.params {
            fingerprint.push('\u{1f}');
            writer.write_value(&mut fingerprint, param);
        }
        Self::new(table, fingerprint)
    }
}

/// Hit and miss counters, mainly interesting to tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Minimal cache contract: get, put, invalidate by table, clear.
///
/// Absence of a provider on the database instance means no caching at all;
/// callers must not depend on one being present.
pub trait CacheProvider {
    fn get(&mut self, key: &CacheKey) -> Option<Vec<RowLabeled>>;
    fn put(&mut self, key: CacheKey, rows: Vec<RowLabeled>);
    /// Drops every entry for `table`. Called unconditionally after each
    /// successful write touching that table.
    fn invalidate(&mut self, table: &str);
    fn clear(&mut self);
    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// In-process cache with a per-table key index for coarse invalidation.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<CacheKey, Vec<RowLabeled>>,
    by_table: HashMap<String, HashSet<CacheKey>>,
    stats: CacheStats,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheProvider for MemoryCache {
    fn get(&mut self, key: &CacheKey) -> Option<Vec<RowLabeled>> {
        match self.entries.get(key) {
            Some(rows) => {
                self.stats.hits += 1;
                Some(rows.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: CacheKey, rows: Vec<RowLabeled>) {
        self.by_table
            .entry(key.table.clone())
            .or_default()
            .insert(key.clone());
        self.entries.insert(key, rows);
    }

    fn invalidate(&mut self, table: &str) {
        if let Some(keys) = self.by_table.remove(table) {
            for key in keys {
                self.entries.remove(&key);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.by_table.clear();
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}
