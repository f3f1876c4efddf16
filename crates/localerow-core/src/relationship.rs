//! Relationship metadata and the registry holding it.
//!
//! Relations are declared at runtime by name and may be redeclared: the
//! translation engine overwrites its one-to-one relation on every read so the
//! join type and locale condition match the current call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The type of relationship between two tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One-to-one: an `Article` has one `ArticleTranslation` for a locale.
    OneToOne,
    /// One-to-many: an `Article` has many `ArticleTranslation`s.
    #[default]
    OneToMany,
}

/// SQL join flavour used when a relation is joined into a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinType {
    /// Rows without a match are dropped.
    Inner,
    /// Rows without a match are kept with NULL related columns.
    #[default]
    Left,
}

impl JoinType {
    /// SQL keyword(s).
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// How related rows of a to-many relation are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Single query with a join.
    Join,
    /// Separate query with an `IN` list of keys.
    Select,
    /// Separate query filtered by a subquery on the parent query.
    #[default]
    Subquery,
}

/// Metadata about a relation between two tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipInfo {
    /// Relation name, also used as alias of the related table in SQL.
    pub name: String,
    /// The related table name.
    pub related_table: String,
    /// Kind of relationship.
    pub kind: RelationshipKind,
    /// Foreign key column(s) on the related table pointing at the owner key.
    pub foreign_key: Vec<String>,
    /// Owner column(s) the foreign key refers to.
    pub binding_key: Vec<String>,
    /// Join type when joined into a read.
    pub join_type: JoinType,
    /// Extra equality conditions on the related table (`alias.column = value`).
    pub conditions: Vec<(String, Value)>,
    /// Property under which related data is attached to the owning row.
    pub property_name: String,
    /// Fetch strategy for to-many relations.
    pub strategy: FetchStrategy,
    /// Whether related rows are deleted together with the owner.
    pub dependent: bool,
}

impl RelationshipInfo {
    /// Create a new relation with required fields.
    pub fn new(
        name: impl Into<String>,
        related_table: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        let name = name.into();
        Self {
            property_name: name.clone(),
            name,
            related_table: related_table.into(),
            kind,
            foreign_key: vec!["id".to_string()],
            binding_key: vec!["id".to_string()],
            join_type: JoinType::default(),
            conditions: Vec::new(),
            strategy: FetchStrategy::default(),
            dependent: false,
        }
    }

    /// Set the foreign key column(s).
    #[must_use]
    pub fn foreign_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foreign_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the owner column(s) the foreign key refers to.
    #[must_use]
    pub fn binding_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binding_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the join type.
    #[must_use]
    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// Add an equality condition on the related table.
    #[must_use]
    pub fn condition(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// Set the property name related data is attached under.
    #[must_use]
    pub fn property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name = name.into();
        self
    }

    /// Set the fetch strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable/disable dependent (cascading) delete.
    #[must_use]
    pub fn dependent(mut self, value: bool) -> Self {
        self.dependent = value;
        self
    }
}

/// Declares and looks up relations of a table.
pub trait RelationRegistry {
    /// Declare a relation, replacing any previous one with the same name.
    fn declare(&mut self, info: RelationshipInfo);

    /// Look up a relation by name.
    fn relationship(&self, name: &str) -> Option<&RelationshipInfo>;
}

/// Name-keyed [`RelationRegistry`].
#[derive(Debug, Clone, Default)]
pub struct Relations {
    by_name: BTreeMap<String, RelationshipInfo>,
}

impl Relations {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared relations.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over declared relations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RelationshipInfo> {
        self.by_name.values()
    }
}

impl RelationRegistry for Relations {
    fn declare(&mut self, info: RelationshipInfo) {
        tracing::trace!(
            relation = %info.name,
            related_table = %info.related_table,
            join = info.join_type.as_sql(),
            "Declaring relation"
        );
        self.by_name.insert(info.name.clone(), info);
    }

    fn relationship(&self, name: &str) -> Option<&RelationshipInfo> {
        self.by_name.get(name)
    }
}
