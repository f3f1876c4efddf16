//! Binding multi-locale input onto an entity.
//!
//! Input of the form `{"fr": {"title": "Bonjour"}, "de": {...}}` is merged
//! into the entity's `_translations` map, one translation entity per locale.
//! Validation errors are collected per locale and attached to the root
//! entity under the locale key.

use std::collections::BTreeMap;

use localerow_core::{Entity, FieldErrors, Property, Row, Value};

use crate::reconcile::TRANSLATIONS_PROPERTY;
use crate::validation::Validator;

/// Merges `_translations` input into translation entities.
#[derive(Debug, Clone, Copy)]
pub struct TranslationMarshaller<'a> {
    translation_table: &'a str,
    validator: Option<&'a Validator>,
}

impl<'a> TranslationMarshaller<'a> {
    pub fn new(translation_table: &'a str, validator: Option<&'a Validator>) -> Self {
        Self {
            translation_table,
            validator,
        }
    }

    /// Merge `input` into `entity`'s `_translations`.
    ///
    /// Non-object input sets the property to NULL. Locales already present
    /// on the entity but absent from `input` are kept.
    pub fn merge(&self, entity: &mut Entity, input: &serde_json::Value) {
        let Some(locales) = input.as_object() else {
            tracing::warn!(input = %input, "Ignoring non-object translations input");
            entity.set(TRANSLATIONS_PROPERTY, Value::Null);
            return;
        };

        let mut translations = match entity.get(TRANSLATIONS_PROPERTY) {
            Some(Property::Keyed(existing)) => existing.clone(),
            _ => BTreeMap::new(),
        };

        for (locale, fields) in locales {
            let Some(fields) = fields.as_object() else {
                tracing::warn!(locale = %locale, "Ignoring non-object translation fields");
                continue;
            };
            let data: BTreeMap<String, Value> = fields
                .iter()
                .map(|(field, value)| (field.clone(), Value::from_json(value)))
                .collect();

            let mut translation = translations.remove(locale).map_or_else(
                || Entity::new(self.translation_table),
                |row| row.into_entity(self.translation_table),
            );
            let errors = self.merge_one(&mut translation, data);
            if !errors.is_empty() {
                entity.set_nested_errors(locale.clone(), errors);
            }
            translations.insert(locale.clone(), Row::Entity(translation));
        }

        entity.set(TRANSLATIONS_PROPERTY, Property::Keyed(translations));
    }

    fn merge_one(&self, translation: &mut Entity, data: BTreeMap<String, Value>) -> FieldErrors {
        let errors = self
            .validator
            .map(|v| v.validate(&data, translation.is_new()))
            .unwrap_or_default();

        for (field, value) in data {
            if errors.contains_key(&field) {
                continue;
            }
            if translation.is_new() || translation.value(&field) != Some(&value) {
                translation.set(field, value);
            }
        }
        translation.set_errors(errors.clone());
        errors
    }
}
