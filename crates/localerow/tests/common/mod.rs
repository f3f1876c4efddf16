//! In-memory tables for integration tests.
//!
//! `MemoryDatabase` evaluates `Select` queries the way a SQL backend would
//! for the subset the translation engine produces: WHERE via `Expr::matches`,
//! one-to-one contains as joins honouring join type and conditions,
//! one-to-many contains as attached row lists, ORDER BY on named terms and
//! LIMIT. `persist` writes dirty columns and cascades registered child
//! collections keyed by a composite key.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;

use localerow::prelude::*;
use localerow_core::{JoinType, RelationshipInfo, RelationshipKind};
use localerow_query::{Direction, SelectItem};

pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
struct Cascade {
    property: String,
    table: String,
    keys: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    columns: BTreeMap<String, Vec<String>>,
    rows: BTreeMap<String, Vec<Record>>,
    cascades: BTreeMap<String, Cascade>,
    next_id: i64,
}

impl MemoryDatabase {
    /// Tables and columns taken from `schema`.
    pub fn new(schema: &MemorySchema, tables: &[&str]) -> Self {
        let mut db = Self::default();
        for table in tables {
            let columns = schema.columns(table).expect("table in schema");
            db.columns.insert((*table).to_string(), columns);
            db.rows.insert((*table).to_string(), Vec::new());
        }
        db
    }

    /// Persist `property` rows of `parent` entities into `table`, keyed by
    /// `keys`. The first key receives the parent id.
    pub fn cascade(mut self, parent: &str, property: &str, table: &str, keys: &[&str]) -> Self {
        self.cascades.insert(
            parent.to_string(),
            Cascade {
                property: property.to_string(),
                table: table.to_string(),
                keys: keys.iter().map(|k| (*k).to_string()).collect(),
            },
        );
        self
    }

    pub fn insert<'a>(&mut self, table: &str, values: impl IntoIterator<Item = (&'a str, Value)>) {
        let mut record: Record = self.columns[table]
            .iter()
            .map(|c| (c.clone(), Value::Null))
            .collect();
        for (column, value) in values {
            record.insert(column.to_string(), value);
        }
        if let Some(Value::BigInt(id)) = record.get("id") {
            self.next_id = self.next_id.max(*id);
        }
        self.rows.get_mut(table).expect("known table").push(record);
    }

    pub fn rows(&self, table: &str) -> &[Record] {
        &self.rows[table]
    }

    pub fn find_row(&self, table: &str, keys: &[(&str, Value)]) -> Option<&Record> {
        self.rows[table]
            .iter()
            .find(|r| keys.iter().all(|(k, v)| same(r.get(*k), Some(v))))
    }

    /// Write `entity` into `table` and cascade its registered children.
    pub fn persist(&mut self, table: &str, entity: &mut Entity) -> Result<()> {
        if !self.rows.contains_key(table) {
            return Err(Error::UnknownTable(table.to_string()));
        }

        let mut id = entity.value("id").cloned().unwrap_or_default();
        if id.is_blank() {
            self.next_id += 1;
            id = Value::BigInt(self.next_id);
            entity.set_raw("id", id.clone());
        }
        self.upsert(table, &["id".to_string()], entity);

        if let Some(cascade) = self.cascades.get(table).cloned() {
            if let Some(Property::Many(children)) = entity.get(&cascade.property).cloned() {
                for child in children {
                    let mut child = child.into_entity(&cascade.table);
                    child.set(cascade.keys[0].clone(), id.clone());
                    self.upsert(&cascade.table, &cascade.keys, &child);
                }
            }
        }

        entity.clean();
        entity.set_new(false);
        Ok(())
    }

    fn upsert(&mut self, table: &str, keys: &[String], entity: &Entity) {
        let columns = self.columns[table].clone();
        let key_values: Vec<Value> = keys
            .iter()
            .map(|k| entity.value(k).cloned().unwrap_or_default())
            .collect();

        let rows = self.rows.get_mut(table).expect("known table");
        let position = rows.iter().position(|r| {
            keys.iter()
                .zip(&key_values)
                .all(|(k, v)| same(r.get(k), Some(v)))
        });
        let record = match position {
            Some(at) => &mut rows[at],
            None => {
                rows.push(columns.iter().map(|c| (c.clone(), Value::Null)).collect());
                rows.last_mut().expect("just pushed")
            }
        };
        for (key, value) in keys.iter().zip(key_values) {
            record.insert(key.clone(), value);
        }
        for column in &columns {
            if entity.is_dirty(column) {
                record.insert(
                    column.clone(),
                    entity.value(column).cloned().unwrap_or_default(),
                );
            }
        }
    }

    fn related<'a>(&'a self, relation: &RelationshipInfo, base: &Record) -> Vec<&'a Record> {
        let Some(rows) = self.rows.get(&relation.related_table) else {
            return Vec::new();
        };
        rows.iter()
            .filter(|row| {
                relation
                    .foreign_key
                    .iter()
                    .zip(&relation.binding_key)
                    .all(|(fk, bk)| same(row.get(fk), base.get(bk)))
                    && relation.conditions.iter().all(|(column, value)| {
                        let column = column.rsplit('.').next().unwrap_or(column);
                        same(row.get(column), Some(value))
                    })
            })
            .collect()
    }
}

fn same(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b) == Some(Ordering::Equal),
        _ => false,
    }
}

fn order_values(a: Option<Value>, b: Option<Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(&b).unwrap_or(Ordering::Equal),
    }
}

struct Candidate<'a> {
    alias: &'a str,
    base: &'a Record,
    joined: Vec<(&'a RelationshipInfo, Option<&'a Record>)>,
}

impl Candidate<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        match name.split_once('.') {
            Some((alias, column)) if alias == self.alias => self.base.get(column).cloned(),
            Some((alias, column)) => self
                .joined
                .iter()
                .find(|(relation, _)| relation.name == alias)
                .and_then(|(_, row)| row.and_then(|r| r.get(column).cloned())),
            None => self.base.get(name).cloned(),
        }
    }
}

fn hydrate(table: &str, record: &Record) -> Row {
    Row::Entity(Entity::hydrate(table, record.clone()))
}

impl QueryExecutor for MemoryDatabase {
    fn all(&self, query: &Select) -> Result<Vec<Option<Row>>> {
        let table = query.table();
        let Some(rows) = self.rows.get(table) else {
            return Err(Error::UnknownTable(table.to_string()));
        };

        let joins: Vec<&RelationshipInfo> = query
            .contained()
            .iter()
            .filter(|r| r.kind == RelationshipKind::OneToOne)
            .collect();

        let mut candidates = Vec::new();
        'rows: for base in rows {
            let mut joined = Vec::new();
            for relation in &joins {
                let matched = self.related(relation, base).into_iter().next();
                if matched.is_none() && relation.join_type == JoinType::Inner {
                    continue 'rows;
                }
                joined.push((*relation, matched));
            }
            let candidate = Candidate {
                alias: query.alias(),
                base,
                joined,
            };
            let keep = query
                .where_clause()
                .is_none_or(|filter| filter.matches(&|name: &str| candidate.lookup(name)));
            if keep {
                candidates.push(candidate);
            }
        }

        for part in query.order_clause().parts().iter().rev() {
            let Some(name) = part.term.as_name() else {
                continue;
            };
            candidates.sort_by(|a, b| {
                let ordering = order_values(a.lookup(name), b.lookup(name));
                match part.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let limit = query
            .limit_value()
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let selected: Vec<&str> = query
            .select_clause()
            .iter()
            .filter_map(SelectItem::as_field)
            .filter_map(|field| match field.split_once('.') {
                Some((alias, column)) if alias == query.alias() => Some(column),
                Some(_) => None,
                None => Some(field),
            })
            .collect();
        let all_columns = query.select_clause().is_empty() || query.is_auto_fields_enabled();

        Ok(candidates
            .into_iter()
            .take(limit)
            .map(|candidate| {
                let mut properties: BTreeMap<String, Property> = candidate
                    .base
                    .iter()
                    .filter(|(column, _)| all_columns || selected.contains(&column.as_str()))
                    .map(|(column, value)| (column.clone(), Property::Value(value.clone())))
                    .collect();
                for (relation, matched) in &candidate.joined {
                    let property = match matched {
                        Some(record) => Property::from(hydrate(&relation.related_table, record)),
                        None => Property::Value(Value::Null),
                    };
                    properties.insert(relation.property_name.clone(), property);
                }
                for relation in query
                    .contained()
                    .iter()
                    .filter(|r| r.kind == RelationshipKind::OneToMany)
                {
                    let children = self
                        .related(relation, candidate.base)
                        .into_iter()
                        .map(|record| hydrate(&relation.related_table, record))
                        .collect();
                    properties.insert(relation.property_name.clone(), Property::Many(children));
                }
                Some(Row::Entity(Entity::hydrate(table, properties)))
            })
            .collect())
    }
}

pub fn articles_schema() -> MemorySchema {
    MemorySchema::new()
        .table(
            "articles",
            TableSchema::new()
                .column(ColumnDef::new("id").primary_key())
                .column(ColumnDef::new("title").nullable())
                .column(ColumnDef::new("body").nullable())
                .column(ColumnDef::new("published")),
        )
        .table(
            "articles_translations",
            TableSchema::new()
                .column(ColumnDef::new("id").primary_key())
                .column(ColumnDef::new("locale").primary_key())
                .column(ColumnDef::new("title").nullable())
                .column(ColumnDef::new("body").nullable()),
        )
}

pub fn articles_db(schema: &MemorySchema) -> MemoryDatabase {
    MemoryDatabase::new(schema, &["articles", "articles_translations"]).cascade(
        "articles",
        "_i18n",
        "articles_translations",
        &["id", "locale"],
    )
}

/// Strategy over `articles` with default locale `en_US`, pinned to `locale`.
pub fn strategy(schema: &MemorySchema, config: TranslateConfig, locale: &str) -> TranslateStrategy {
    let mut strategy =
        TranslateStrategy::new(schema, "articles", config.default_locale("en_US")).expect("strategy");
    strategy.set_locale(Some(locale.to_string()));
    strategy
}

/// Run the save lifecycle for an `articles` entity.
pub fn save(
    db: &mut MemoryDatabase,
    listener: &dyn TableListener,
    entity: &mut Entity,
) -> Result<SaveOutcome> {
    let mut options = SaveOptions::new();
    let outcome = listener.before_save(entity, &mut options, &*db)?;
    db.persist("articles", entity)?;
    listener.after_save(entity);
    Ok(outcome)
}

/// Run the read lifecycle and drop empty slots.
pub fn find(
    db: &MemoryDatabase,
    listener: &mut dyn TableListener,
    mut query: Select,
    options: &FindOptions,
) -> Result<(ReadPlan, Vec<Row>)> {
    let plan = listener.before_find(&mut query, options);
    let rows = query.execute(db)?.into_iter().flatten().collect();
    Ok((plan, rows))
}
