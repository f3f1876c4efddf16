//! Result rows and property values.
//!
//! A fetched row comes in one of two shapes: a hydrated [`Entity`] (with
//! dirty tracking) or a plain name → property mapping. Code that post-processes
//! results branches on [`Row::is_hydrated`] only, never on concrete layout.

use std::collections::BTreeMap;

use crate::entity::Entity;
use crate::value::Value;

/// A property of a row: a scalar column or associated data.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A column value.
    Value(Value),
    /// A single associated row (one-to-one).
    One(Box<Row>),
    /// A list of associated rows (one-to-many).
    Many(Vec<Row>),
    /// Associated rows keyed by a string, e.g. by locale.
    Keyed(BTreeMap<String, Row>),
}

impl Property {
    /// Borrow the scalar value, if this is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the associated row, if this is one.
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Property::One(row) => Some(row),
            _ => None,
        }
    }

    /// Whether the property carries no data.
    ///
    /// NULL, empty lists, empty keyed maps and associated plain rows without
    /// any field count as empty. A hydrated associated entity never does.
    pub fn is_empty(&self) -> bool {
        match self {
            Property::Value(v) => v.is_null(),
            Property::One(row) => match row.as_ref() {
                Row::Entity(_) => false,
                Row::Plain(map) => map.is_empty(),
            },
            Property::Many(rows) => rows.is_empty(),
            Property::Keyed(map) => map.is_empty(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Property::Value(v) => v.to_json(),
            Property::One(row) => row.to_json(),
            Property::Many(rows) => rows.iter().map(Row::to_json).collect(),
            Property::Keyed(map) => serde_json::Value::Object(
                map.iter().map(|(k, r)| (k.clone(), r.to_json())).collect(),
            ),
        }
    }
}

impl From<Value> for Property {
    fn from(v: Value) -> Self {
        Property::Value(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::Value(Value::from(v))
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::Value(Value::from(v))
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::Value(Value::BigInt(v))
    }
}

impl From<bool> for Property {
    fn from(v: bool) -> Self {
        Property::Value(Value::Bool(v))
    }
}

impl From<Row> for Property {
    fn from(row: Row) -> Self {
        Property::One(Box::new(row))
    }
}

impl From<Entity> for Property {
    fn from(entity: Entity) -> Self {
        Property::One(Box::new(Row::Entity(entity)))
    }
}

impl From<Vec<Row>> for Property {
    fn from(rows: Vec<Row>) -> Self {
        Property::Many(rows)
    }
}

impl From<BTreeMap<String, Row>> for Property {
    fn from(map: BTreeMap<String, Row>) -> Self {
        Property::Keyed(map)
    }
}

/// A fetched row, hydrated or plain.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Entity with dirty tracking.
    Entity(Entity),
    /// Plain property mapping.
    Plain(BTreeMap<String, Property>),
}

impl Row {
    /// Build a plain row.
    pub fn plain<K, P>(properties: impl IntoIterator<Item = (K, P)>) -> Self
    where
        K: Into<String>,
        P: Into<Property>,
    {
        Row::Plain(
            properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether this row is a hydrated entity.
    pub fn is_hydrated(&self) -> bool {
        matches!(self, Row::Entity(_))
    }

    /// Get a property.
    pub fn get(&self, field: &str) -> Option<&Property> {
        match self {
            Row::Entity(e) => e.get(field),
            Row::Plain(map) => map.get(field),
        }
    }

    /// Get a property mutably.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Property> {
        match self {
            Row::Entity(e) => e.get_mut(field),
            Row::Plain(map) => map.get_mut(field),
        }
    }

    /// Get a scalar property.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(Property::as_value)
    }

    /// Get a text property.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.value(field).and_then(Value::as_str)
    }

    /// Set a property. On entities this runs setters and marks the field dirty.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Property>) {
        match self {
            Row::Entity(e) => e.set(field, value),
            Row::Plain(map) => {
                map.insert(field.into(), value.into());
            }
        }
    }

    /// Remove a property.
    pub fn unset(&mut self, field: &str) -> Option<Property> {
        match self {
            Row::Entity(e) => e.unset(field),
            Row::Plain(map) => map.remove(field),
        }
    }

    /// Names of the present properties.
    pub fn fields(&self) -> Vec<String> {
        match self {
            Row::Entity(e) => e.property_names(),
            Row::Plain(map) => map.keys().cloned().collect(),
        }
    }

    /// Forget pending writes. No-op on plain rows.
    pub fn mark_clean(&mut self) {
        if let Row::Entity(e) = self {
            e.clean();
        }
    }

    /// Borrow the entity, if hydrated.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Row::Entity(e) => Some(e),
            Row::Plain(_) => None,
        }
    }

    /// Borrow the entity mutably, if hydrated.
    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Row::Entity(e) => Some(e),
            Row::Plain(_) => None,
        }
    }

    /// Convert into an entity of `source`; plain rows are hydrated clean.
    pub fn into_entity(self, source: &str) -> Entity {
        match self {
            Row::Entity(e) => e,
            Row::Plain(map) => Entity::hydrate(source, map),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Row::Entity(e) => e.to_json(),
            Row::Plain(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}
