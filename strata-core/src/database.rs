use crate::{
    Backend, CacheKey, CacheProvider, CacheStats, ConnectOptions, IndexDef, LockController,
    Model, Operation, Passthru, QueryResponse, Result, TableColumn, TableMeta, TableRef,
    VirtualQuery, schema,
};
use std::collections::{HashMap, HashSet};

/// One configured connection and the state scoped to its lifetime.
///
/// The context object is passed explicitly to models and builders; multiple
/// independent instances may coexist. Dropping or closing an instance
/// discards all of its cached state, so nothing leaks across
/// reconfigurations.
pub struct Database {
    backend: Box<dyn Backend>,
    options: ConnectOptions,
    cache: Option<Box<dyn CacheProvider>>,
    metadata: HashMap<String, TableMeta>,
    known_tables: HashSet<String>,
}

impl Database {
    pub fn new(backend: Box<dyn Backend>, options: ConnectOptions) -> Self {
        Self {
            backend,
            options,
            cache: None,
            metadata: HashMap::new(),
            known_tables: HashSet::new(),
        }
    }

    /// Attaches a query cache provider. Without one, caching is a no-op
    /// pass-through.
    pub fn with_cache(mut self, cache: Box<dyn CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn set_cache(&mut self, cache: Option<Box<dyn CacheProvider>>) {
        self.cache = cache;
    }

    pub fn use_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn dialect(&self) -> &'static str {
        self.backend.dialect()
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    /// Explicit teardown. Dropping the instance has the same effect; this
    /// form reads better at reconfiguration sites.
    pub fn close(self) {}

    // ---- virtual query constructors ----

    pub fn select(&self, table: &str, alias: &str) -> VirtualQuery {
        VirtualQuery::select(TableRef::new(table, alias))
    }

    pub fn insert(&self, table: &str, alias: &str) -> VirtualQuery {
        VirtualQuery::insert(TableRef::new(table, alias))
    }

    pub fn update(&self, table: &str, alias: &str) -> VirtualQuery {
        VirtualQuery::update(TableRef::new(table, alias))
    }

    pub fn delete(&self, table: &str, alias: &str) -> VirtualQuery {
        VirtualQuery::delete(TableRef::new(table, alias))
    }

    pub fn passthru(&mut self, sql: impl Into<String>) -> Passthru<'_> {
        Passthru::new(self, sql)
    }

    pub fn lock_controller(&mut self, table: &str, alias: &str) -> LockController<'_> {
        LockController::new(self, table, alias)
    }

    // ---- execution ----

    /// Executes a virtual query, propagating failures as typed errors.
    pub fn run(&mut self, query: &VirtualQuery) -> Result<QueryResponse> {
        self.run_virtual(query).into_result()
    }

    /// Executes a virtual query, capturing failures on the response for
    /// callers that prefer inspection over propagation.
    pub fn run_response(&mut self, query: &VirtualQuery) -> QueryResponse {
        self.run_virtual(query)
    }

    /// The single choke point every operation flows through. Write
    /// invalidation lives here and nowhere else, so no write path can skip
    /// it.
    fn run_virtual(&mut self, query: &VirtualQuery) -> QueryResponse {
        let rendered = match self.backend.writer().render(query) {
            Ok(rendered) => rendered,
            Err(error) => return QueryResponse::from_error(error),
        };
        let key = match query.operation {
            Operation::Select if self.cache.is_some() => Some(CacheKey::for_query(
                &query.table.name,
                &rendered,
                self.backend.writer(),
            )),
            _ => None,
        };
        if let (Some(cache), Some(key)) = (self.cache.as_mut(), key.as_ref()) {
            if let Some(rows) = cache.get(key) {
                log::debug!("cache hit on {}", query.table.name);
                return QueryResponse::cached(rows);
            }
        }
        log::debug!("{}: {}", self.backend.dialect(), rendered.sql);
        let response = self.backend.run(query.operation, &rendered);
        if response.is_error() {
            return response;
        }
        match query.operation {
            Operation::Select => {
                if let (Some(cache), Some(key)) = (self.cache.as_mut(), key) {
                    cache.put(key, response.rows().to_vec());
                }
            }
            Operation::Insert | Operation::Update | Operation::Delete => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.invalidate(&query.table.name);
                }
            }
            // Raw SQL cannot be classified, so assume the worst.
            Operation::Passthru => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.clear();
                }
            }
            Operation::Lock => {}
        }
        response
    }

    // ---- schema ----

    pub fn ensure_table<M: Model>(&mut self) -> Result<()> {
        schema::ensure_table::<M>(self)
    }

    pub fn delete_table<M: Model>(&mut self) -> Result<()> {
        schema::delete_table::<M>(self)
    }

    pub fn delete_table_named(&mut self, table: &str) -> Result<()> {
        schema::delete_table_named(self, table)
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        self.backend.table_exists(table)
    }

    /// Ordered column descriptors for a table, introspected once per
    /// instance and cached until the provisioner changes the table.
    pub fn describe_columns(&mut self, table: &str) -> Result<Vec<TableColumn>> {
        self.load_table_meta(table)?;
        Ok(self.metadata[table].columns.clone())
    }

    /// Ordered index descriptors, primary index first.
    pub fn get_table_indexes(&mut self, table: &str) -> Result<Vec<IndexDef>> {
        self.load_table_meta(table)?;
        Ok(self.metadata[table].indexes.clone())
    }

    /// First column of the table's primary index, or none.
    pub fn table_primary_key(&mut self, table: &str) -> Result<Option<String>> {
        self.load_table_meta(table)?;
        Ok(self.metadata[table].primary_key().map(str::to_string))
    }

    fn load_table_meta(&mut self, table: &str) -> Result<()> {
        if self.metadata.contains_key(table) {
            return Ok(());
        }
        let columns = self
            .backend
            .describe_columns(table)
            .map_err(|e| schema::for_table(table, e))?;
        let indexes = self
            .backend
            .get_indexes(table)
            .map_err(|e| schema::for_table(table, e))?;
        self.metadata
            .insert(table.to_string(), TableMeta { columns, indexes });
        Ok(())
    }

    pub(crate) fn is_table_known(&self, table: &str) -> bool {
        self.known_tables.contains(table)
    }

    pub(crate) fn mark_table_known(&mut self, table: &str) {
        self.known_tables.insert(table.to_string());
    }

    /// Drops all cached knowledge of a table after the provisioner creates
    /// or drops it.
    pub(crate) fn forget_table(&mut self, table: &str) {
        self.known_tables.remove(table);
        self.metadata.remove(table);
        if let Some(cache) = self.cache.as_mut() {
            cache.invalidate(table);
        }
    }
}
