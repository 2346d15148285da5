use crate::{
    IndexDef, Operation, QueryResponse, RenderedQuery, Result, SqlWriter, TableColumn,
    VirtualQuery,
};

/// Dialect connection contract implemented by each driver crate.
///
/// A backend is stateless per invocation; it holds only the connection
/// handle and its writer. Native driver errors never cross this boundary:
/// they are normalized into the crate error taxonomy with the original code
/// and message attached.
pub trait Backend {
    /// Dialect name, used in logs.
    fn dialect(&self) -> &'static str;

    /// The SQL writer for this dialect.
    fn writer(&self) -> &dyn SqlWriter;

    /// Executes an already rendered query. The operation kind tells the
    /// backend how to collect the outcome (rows vs. affected count and
    /// generated key).
    fn run(&mut self, operation: Operation, rendered: &RenderedQuery) -> QueryResponse;

    /// Renders and executes a virtual query. Render failures are captured
    /// on the response rather than thrown, so both error paths stay
    /// available to the caller.
    fn process(&mut self, query: &VirtualQuery) -> QueryResponse {
        let rendered = match self.writer().render(query) {
            Ok(rendered) => rendered,
            Err(error) => return QueryResponse::from_error(error),
        };
        log::debug!("{}: {}", self.dialect(), rendered.sql);
        self.run(query.operation, &rendered)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Ordered column descriptors, with foreign key constraints joined on.
    fn describe_columns(&mut self, table: &str) -> Result<Vec<TableColumn>>;

    /// Ordered index descriptors, primary index first.
    fn get_indexes(&mut self, table: &str) -> Result<Vec<IndexDef>>;
}
