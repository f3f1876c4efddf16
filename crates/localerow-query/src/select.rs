//! SELECT queries with introspectable, rewritable clauses.
//!
//! A [`Select`] is the unit read hooks operate on: they inspect the select
//! list, ORDER BY and WHERE clauses, rewrite field references in place,
//! register related tables to eager-load ("contain"), and attach result
//! formatters that post-process fetched rows.
//!
//! # Example
//!
//! ```
//! use localerow_query::{Direction, Expr, Select};
//!
//! let mut query = Select::new("articles");
//! query.select("id").select("title");
//! query.filter(Expr::eq("published", true));
//! query.order_by("title", Direction::Asc);
//!
//! let (sql, params) = query.to_sql();
//! assert_eq!(
//!     sql,
//!     "SELECT id, title FROM articles WHERE published = ? ORDER BY title ASC"
//! );
//! assert_eq!(params.len(), 1);
//! ```

use std::fmt;

use localerow_core::{Result, Row, RelationshipInfo, RelationshipKind, Value};

use crate::expr::{Expr, FieldRef};
use crate::order::{Direction, OrderBy};

/// An entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A column, bare or qualified.
    Field(String),
    /// A computed column with an alias.
    Expr { expr: Expr, alias: String },
}

impl SelectItem {
    /// Column name, for plain field entries.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            SelectItem::Field(name) => Some(name),
            SelectItem::Expr { .. } => None,
        }
    }
}

/// Post-processes fetched rows, one row at a time.
///
/// Formatters run in registration order; `None` rows (e.g. an empty slot in
/// a result set) are handed to every formatter as well.
pub trait ResultFormatter: fmt::Debug {
    /// Transform one row.
    fn map_row(&self, row: Option<Row>) -> Option<Row>;
}

/// Where a new formatter goes relative to the ones already attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatterMode {
    /// Run after existing formatters.
    #[default]
    Append,
    /// Run before existing formatters.
    Prepend,
}

/// Executes select queries.
pub trait QueryExecutor {
    /// Fetch every row matching `query`. Formatters are not applied.
    fn all(&self, query: &Select) -> Result<Vec<Option<Row>>>;

    /// Fetch the first matching row. Formatters are not applied.
    fn first(&self, query: &Select) -> Result<Option<Row>> {
        Ok(self.all(query)?.into_iter().flatten().next())
    }
}

/// A SELECT query.
#[derive(Debug)]
pub struct Select {
    table: String,
    alias: String,
    fields: Vec<SelectItem>,
    auto_fields: Option<bool>,
    where_clause: Option<Expr>,
    order: OrderBy,
    contain: Vec<RelationshipInfo>,
    limit: Option<u64>,
    buffered: bool,
    formatters: Vec<Box<dyn ResultFormatter>>,
}

impl Select {
    /// Select from `table`, aliased as itself.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            fields: Vec::new(),
            auto_fields: None,
            where_clause: None,
            order: OrderBy::new(),
            contain: Vec::new(),
            limit: None,
            buffered: true,
            formatters: Vec::new(),
        }
    }

    /// Use a different alias for the main table.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Main table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Main table alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Qualify `field` with `alias`, or with the main table alias.
    pub fn alias_field(&self, field: &str, alias: Option<&str>) -> String {
        format!("{}.{}", alias.unwrap_or(&self.alias), field)
    }

    // ========================================================================
    // Select list
    // ========================================================================

    /// Add a column to the select list.
    pub fn select(&mut self, field: impl Into<String>) -> &mut Self {
        self.fields.push(SelectItem::Field(field.into()));
        self
    }

    /// Add several columns to the select list.
    pub fn select_many<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|f| SelectItem::Field(f.into())));
        self
    }

    /// Add a computed column.
    pub fn select_expr(&mut self, expr: Expr, alias: impl Into<String>) -> &mut Self {
        self.fields.push(SelectItem::Expr {
            expr,
            alias: alias.into(),
        });
        self
    }

    /// The select list.
    pub fn select_clause(&self) -> &[SelectItem] {
        &self.fields
    }

    /// Explicitly select every column of the main table (and joined
    /// one-to-one relations) in addition to the select list.
    pub fn enable_auto_fields(&mut self, enabled: bool) -> &mut Self {
        self.auto_fields = Some(enabled);
        self
    }

    /// Whether auto-fields were explicitly enabled.
    pub fn is_auto_fields_enabled(&self) -> bool {
        self.auto_fields == Some(true)
    }

    // ========================================================================
    // WHERE / ORDER BY / LIMIT
    // ========================================================================

    /// AND a predicate into the WHERE clause.
    pub fn filter(&mut self, expr: Expr) -> &mut Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self
    }

    /// The WHERE clause.
    pub fn where_clause(&self) -> Option<&Expr> {
        self.where_clause.as_ref()
    }

    /// The WHERE clause, mutably.
    pub fn where_clause_mut(&mut self) -> Option<&mut Expr> {
        self.where_clause.as_mut()
    }

    /// Append a sort key.
    pub fn order_by(&mut self, term: impl Into<FieldRef>, direction: Direction) -> &mut Self {
        self.order.push(term, direction);
        self
    }

    /// The ORDER BY clause.
    pub fn order_clause(&self) -> &OrderBy {
        &self.order
    }

    /// The ORDER BY clause, mutably.
    pub fn order_clause_mut(&mut self) -> &mut OrderBy {
        &mut self.order
    }

    /// Limit the number of rows.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// The row limit.
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Whether the executor may buffer results. Disable for single-row
    /// lookups that should not populate any result cache.
    pub fn enable_buffered_results(&mut self, enabled: bool) -> &mut Self {
        self.buffered = enabled;
        self
    }

    /// Whether results are buffered.
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    // ========================================================================
    // Eager loading
    // ========================================================================

    /// Eager-load a relation, replacing an earlier one with the same name.
    pub fn contain(&mut self, relation: RelationshipInfo) -> &mut Self {
        self.contain.retain(|r| r.name != relation.name);
        self.contain.push(relation);
        self
    }

    /// Eager-loaded relations.
    pub fn contained(&self) -> &[RelationshipInfo] {
        &self.contain
    }

    // ========================================================================
    // Result formatting
    // ========================================================================

    /// Attach a result formatter.
    pub fn format_results(
        &mut self,
        formatter: Box<dyn ResultFormatter>,
        mode: FormatterMode,
    ) -> &mut Self {
        match mode {
            FormatterMode::Append => self.formatters.push(formatter),
            FormatterMode::Prepend => self.formatters.insert(0, formatter),
        }
        self
    }

    /// Attached formatters, in execution order.
    pub fn formatters(&self) -> &[Box<dyn ResultFormatter>] {
        &self.formatters
    }

    /// Run every formatter over `rows`.
    pub fn apply_formatters(&self, rows: Vec<Option<Row>>) -> Vec<Option<Row>> {
        rows.into_iter()
            .map(|row| {
                self.formatters
                    .iter()
                    .fold(row, |row, formatter| formatter.map_row(row))
            })
            .collect()
    }

    /// Execute and format all rows.
    #[tracing::instrument(level = "debug", skip(self, executor), fields(table = %self.table))]
    pub fn execute(&self, executor: &dyn QueryExecutor) -> Result<Vec<Option<Row>>> {
        let rows = executor.all(self)?;
        tracing::debug!(rows = rows.len(), formatters = self.formatters.len(), "Fetched rows");
        Ok(self.apply_formatters(rows))
    }

    /// Execute and format the first row.
    pub fn first(&self, executor: &dyn QueryExecutor) -> Result<Option<Row>> {
        let row = executor.first(self)?;
        Ok(self
            .formatters
            .iter()
            .fold(row, |row, formatter| formatter.map_row(row)))
    }

    // ========================================================================
    // SQL rendering
    // ========================================================================

    /// Render the query with `?` placeholders.
    ///
    /// Contained one-to-one relations render as joins; one-to-many relations
    /// are fetched by a separate query and do not appear here.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let joined: Vec<&RelationshipInfo> = self
            .contain
            .iter()
            .filter(|r| r.kind == RelationshipKind::OneToOne)
            .collect();

        let mut columns = Vec::new();
        if self.fields.is_empty() || self.is_auto_fields_enabled() {
            columns.push(format!("{}.*", self.alias));
            columns.extend(joined.iter().map(|r| format!("{}.*", r.name)));
        }
        for item in &self.fields {
            columns.push(match item {
                SelectItem::Field(name) => name.clone(),
                SelectItem::Expr { expr, alias } => {
                    format!("({}) AS {}", expr.to_sql(&mut params), alias)
                }
            });
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);
        if self.alias != self.table {
            sql.push(' ');
            sql.push_str(&self.alias);
        }

        for relation in joined {
            let mut on: Vec<String> = relation
                .foreign_key
                .iter()
                .zip(&relation.binding_key)
                .map(|(fk, bk)| format!("{}.{} = {}.{}", relation.name, fk, self.alias, bk))
                .collect();
            for (column, value) in &relation.conditions {
                on.push(format!("{column} = ?"));
                params.push(value.clone());
            }
            sql.push_str(&format!(
                " {} {} {} ON {}",
                relation.join_type.as_sql(),
                relation.related_table,
                relation.name,
                on.join(" AND ")
            ));
        }

        if let Some(filter) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.to_sql(&mut params));
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.to_sql(&mut params));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        (sql, params)
    }
}
