//! Hydrated entities with per-field dirty tracking.
//!
//! `Entity` is the runtime-shaped record the translation engine reads and
//! writes. It behaves like an ORM entity: properties are addressed by name,
//! every `set` marks the field dirty, `clean()` forgets pending changes, and
//! validation errors can be attached per field (or per nested key, e.g. per
//! locale).

use std::collections::{BTreeMap, BTreeSet};

use crate::error::FieldErrors;
use crate::row::{Property, Row};
use crate::value::Value;

/// Transforms a value on its way into an entity.
pub type Setter = fn(Value) -> Value;

/// Options for [`Entity::set_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Run the registered setter for the field, if any.
    pub setter: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { setter: true }
    }
}

impl SetOptions {
    /// Skip setters.
    #[must_use]
    pub const fn raw() -> Self {
        Self { setter: false }
    }
}

/// A record of some source table, addressed by property name.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Table (or registry alias) this entity belongs to.
    source: String,
    /// Current property values.
    properties: BTreeMap<String, Property>,
    /// Properties with pending writes.
    dirty: BTreeSet<String>,
    /// Whether the entity has not been persisted yet.
    new: bool,
    /// Validation messages per field.
    errors: FieldErrors,
    /// Validation messages per nested key (per locale for translations).
    nested_errors: BTreeMap<String, FieldErrors>,
    /// Value transformers applied by `set` unless bypassed.
    setters: BTreeMap<String, Setter>,
}

impl Entity {
    /// Create a new, not-yet-persisted entity.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            properties: BTreeMap::new(),
            dirty: BTreeSet::new(),
            new: true,
            errors: FieldErrors::new(),
            nested_errors: BTreeMap::new(),
            setters: BTreeMap::new(),
        }
    }

    /// Build a persisted, clean entity from fetched properties.
    pub fn hydrate<K, P>(source: impl Into<String>, properties: impl IntoIterator<Item = (K, P)>) -> Self
    where
        K: Into<String>,
        P: Into<Property>,
    {
        let mut entity = Self::new(source);
        entity.properties = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        entity.new = false;
        entity
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Property>) -> Self {
        self.set(field, value);
        self
    }

    /// Register a setter for `field`.
    #[must_use]
    pub fn with_setter(mut self, field: impl Into<String>, setter: Setter) -> Self {
        self.setters.insert(field.into(), setter);
        self
    }

    /// Source table name.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get a property.
    pub fn get(&self, field: &str) -> Option<&Property> {
        self.properties.get(field)
    }

    /// Get a property mutably. Does not mark it dirty.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Property> {
        self.properties.get_mut(field)
    }

    /// Get a scalar property.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(Property::as_value)
    }

    /// Get a text property.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.value(field).and_then(Value::as_str)
    }

    /// Whether the property exists (even if NULL).
    pub fn has(&self, field: &str) -> bool {
        self.properties.contains_key(field)
    }

    /// Set a property, running its setter, and mark it dirty.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Property>) {
        self.set_with(field, value, SetOptions::default());
    }

    /// Set a property bypassing its setter, and mark it dirty.
    pub fn set_raw(&mut self, field: impl Into<String>, value: impl Into<Property>) {
        self.set_with(field, value, SetOptions::raw());
    }

    /// Set a property with explicit options.
    pub fn set_with(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Property>,
        options: SetOptions,
    ) {
        let field = field.into();
        let mut value = value.into();
        if options.setter {
            if let (Some(setter), Property::Value(v)) = (self.setters.get(&field), &mut value) {
                *v = setter(std::mem::take(v));
            }
        }
        self.dirty.insert(field.clone());
        self.properties.insert(field, value);
    }

    /// Remove a property and its dirty flag.
    pub fn unset(&mut self, field: &str) -> Option<Property> {
        self.dirty.remove(field);
        self.properties.remove(field)
    }

    /// Names of all present properties, in name order.
    pub fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    /// All properties.
    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }

    /// Scalar values for `fields`.
    ///
    /// With `only_dirty` the result holds just the dirty ones; otherwise every
    /// requested field is present, NULL when missing.
    pub fn extract(&self, fields: &[String], only_dirty: bool) -> BTreeMap<String, Value> {
        fields
            .iter()
            .filter(|f| !only_dirty || self.is_dirty(f))
            .map(|f| (f.clone(), self.value(f).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Whether `field` has a pending write.
    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    /// Whether any field has a pending write.
    pub fn is_any_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Flag or unflag `field` as having a pending write.
    ///
    /// A field can be flagged dirty without being present.
    pub fn set_dirty(&mut self, field: impl Into<String>, dirty: bool) {
        let field = field.into();
        if dirty {
            self.dirty.insert(field);
        } else {
            self.dirty.remove(&field);
        }
    }

    /// Fields with pending writes.
    pub fn dirty_fields(&self) -> Vec<String> {
        self.dirty.iter().cloned().collect()
    }

    /// Forget pending writes and validation errors.
    pub fn clean(&mut self) {
        self.dirty.clear();
        self.errors.clear();
        self.nested_errors.clear();
    }

    /// Whether the entity has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.new
    }

    /// Mark the entity as new (or persisted).
    pub fn set_new(&mut self, new: bool) {
        self.new = new;
    }

    /// Field-level validation errors.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Append a validation message for `field`.
    pub fn set_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Merge field-level errors.
    pub fn set_errors(&mut self, errors: FieldErrors) {
        for (field, messages) in errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// Errors attached under a nested key.
    pub fn nested_errors(&self, key: &str) -> Option<&FieldErrors> {
        self.nested_errors.get(key)
    }

    /// All nested errors.
    pub fn all_nested_errors(&self) -> &BTreeMap<String, FieldErrors> {
        &self.nested_errors
    }

    /// Attach errors under a nested key, replacing previous ones for that key.
    pub fn set_nested_errors(&mut self, key: impl Into<String>, errors: FieldErrors) {
        self.nested_errors.insert(key.into(), errors);
    }

    /// Whether any error (flat or nested) is attached.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.nested_errors.values().any(|e| !e.is_empty())
    }

    /// Serialize the visible properties as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.properties == other.properties
            && self.dirty == other.dirty
            && self.new == other.new
            && self.errors == other.errors
            && self.nested_errors == other.nested_errors
    }
}

impl From<Entity> for Row {
    fn from(entity: Entity) -> Self {
        Row::Entity(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(v: Value) -> Value {
        match v {
            Value::Text(s) => Value::Text(s.to_uppercase()),
            other => other,
        }
    }

    #[test]
    fn test_set_marks_dirty() {
        let mut e = Entity::hydrate("articles", [("id", Value::BigInt(1))]);
        assert!(!e.is_new());
        assert!(!e.is_any_dirty());

        e.set("title", "Hello");
        assert!(e.is_dirty("title"));
        assert!(!e.is_dirty("id"));
        assert_eq!(e.text("title"), Some("Hello"));
    }

    #[test]
    fn test_setter_and_bypass() {
        let mut e = Entity::new("articles").with_setter("title", upper);
        e.set("title", "hello");
        assert_eq!(e.text("title"), Some("HELLO"));

        e.set_raw("title", "hello");
        assert_eq!(e.text("title"), Some("hello"));
        assert!(e.is_dirty("title"));
    }

    #[test]
    fn test_extract_only_dirty() {
        let mut e = Entity::hydrate(
            "articles",
            [("title", Value::from("a")), ("body", Value::from("b"))],
        );
        e.set("body", "c");
        let fields = vec!["title".to_string(), "body".to_string(), "slug".to_string()];

        let dirty = e.extract(&fields, true);
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty["body"], Value::from("c"));

        let all = e.extract(&fields, false);
        assert_eq!(all.len(), 3);
        assert_eq!(all["slug"], Value::Null);
    }

    #[test]
    fn test_set_dirty_without_value() {
        let mut e = Entity::new("articles");
        e.set_dirty("title", true);
        assert!(e.is_dirty("title"));
        assert!(!e.has("title"));
        e.set_dirty("title", false);
        assert!(!e.is_any_dirty());
    }

    #[test]
    fn test_clean_forgets_dirty_and_errors() {
        let mut e = Entity::new("articles").with("title", "x");
        e.set_error("title", "too short");
        e.set_nested_errors("fr", FieldErrors::from([("body".to_string(), vec!["required".to_string()])]));
        assert!(e.has_errors());

        e.clean();
        assert!(!e.is_any_dirty());
        assert!(!e.has_errors());
        assert!(e.is_new());
    }

    #[test]
    fn test_unset_removes_dirty_flag() {
        let mut e = Entity::new("articles").with("_i18n", Property::Many(Vec::new()));
        assert!(e.unset("_i18n").is_some());
        assert!(!e.is_dirty("_i18n"));
        assert!(e.unset("_i18n").is_none());
    }

    #[test]
    fn test_to_json() {
        let e = Entity::hydrate("articles", [("id", Value::BigInt(3)), ("title", Value::from("t"))]);
        assert_eq!(e.to_json(), serde_json::json!({"id": 3, "title": "t"}));
    }
}
