//! Schema metadata lookup.
//!
//! The translation engine only needs the declared column names of a table
//! (and the primary key of the main table). Anything that can answer those
//! questions implements [`Schema`]; [`MemorySchema`] is a runtime-defined
//! implementation for tables whose layout is known up front.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Answers column questions for named tables.
pub trait Schema {
    /// Declared column names of `table`, in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<String>>;

    /// Primary key column names of `table`.
    fn primary_key(&self, table: &str) -> Result<Vec<String>>;
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name in the database.
    pub name: String,
    /// Whether this column is nullable.
    pub nullable: bool,
    /// Whether this is a primary key column.
    pub primary_key: bool,
}

impl ColumnDef {
    /// Create a new non-null, non-key column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            primary_key: false,
        }
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Column layout of a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Empty table layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Column definitions in declaration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Primary key column names.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// In-memory [`Schema`] keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySchema {
    tables: HashMap<String, TableSchema>,
}

impl MemorySchema {
    /// Empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table layout.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>, table: TableSchema) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    fn lookup(&self, table: &str) -> Result<&TableSchema> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))
    }
}

impl Schema for MemorySchema {
    fn columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .lookup(table)?
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    fn primary_key(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .lookup(table)?
            .primary_key_columns()
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}
