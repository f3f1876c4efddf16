//! Save-side reconciliation.
//!
//! Before a main-table entity is persisted, its translated values for the
//! effective locale are moved into a translation row found (or created) by
//! `(id, locale)`, and any multi-locale payload is bundled into translation
//! rows. The host persists those rows from `_i18n` when it cascades the
//! one-to-many relation; [`SaveReconciler::after_save`] drops the property
//! again.

use std::collections::BTreeMap;

use localerow_core::{Entity, Property, Result, Row, Value};
use localerow_query::{Expr, QueryExecutor, Select};

use crate::classify::{FieldClassifier, LOCALE_COLUMN};
use crate::config::ResolvedConfig;
use crate::events::{AssociatedOptions, SaveOptions};
use crate::locale::LOCALE_PROPERTY;

/// Working collection of translation rows to persist with the entity.
pub const BUNDLE_PROPERTY: &str = "_i18n";

/// Multi-locale view: locale → translation row.
pub const TRANSLATIONS_PROPERTY: &str = "_translations";

/// How a save was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Default locale without a multi-locale payload; nothing to stage.
    DefaultLocale,
    /// Both inline translated values and a multi-locale payload were
    /// present; only the payload is persisted.
    AmbiguousPayload,
    /// The entity has no key yet. Translated fields were flagged dirty so
    /// the main insert carries them; the payload goes through `_i18n`.
    DeferredUntilInsert,
    /// No translated value changed and there is no payload.
    NothingToSave,
    /// A translation row for the effective locale was staged in `_i18n`.
    Staged {
        /// Whether the row is new rather than fetched.
        created: bool,
    },
}

/// Reconciles saves of main-table entities with their translation rows.
#[derive(Debug, Clone, Copy)]
pub struct SaveReconciler<'a> {
    config: &'a ResolvedConfig,
    classifier: &'a FieldClassifier,
}

impl<'a> SaveReconciler<'a> {
    pub fn new(config: &'a ResolvedConfig, classifier: &'a FieldClassifier) -> Self {
        Self { config, classifier }
    }

    /// Prepare `entity` for persistence in `locale`.
    pub fn before_save(
        &self,
        entity: &mut Entity,
        locale: &str,
        options: &mut SaveOptions,
        executor: &dyn QueryExecutor,
    ) -> Result<SaveOutcome> {
        options
            .associated
            .entry(self.config.translation_table.clone())
            .or_insert(AssociatedOptions {
                validate: Some(false),
            });

        if !self.config.allow_empty_translations {
            self.unset_empty_fields(entity);
        }
        self.bundle_translated_fields(entity);

        let bundled = match entity.get(BUNDLE_PROPERTY) {
            Some(Property::Many(rows)) => rows.clone(),
            _ => Vec::new(),
        };
        if bundled.is_empty() && self.config.is_default_locale(locale) {
            tracing::debug!(locale = %locale, "Default locale save, no translation row");
            return Ok(SaveOutcome::DefaultLocale);
        }

        let values = entity.extract(self.classifier.translated_fields(), true);
        if values.is_empty() && bundled.is_empty() {
            return Ok(SaveOutcome::NothingToSave);
        }
        if !values.is_empty() && !bundled.is_empty() {
            tracing::debug!(
                locale = %locale,
                fields = ?values.keys().collect::<Vec<_>>(),
                "Inline translated values ignored in favour of the multi-locale payload"
            );
            return Ok(SaveOutcome::AmbiguousPayload);
        }

        let key_column = self.config.key_column();
        let id = entity.value(key_column).cloned().unwrap_or_default();
        if values.is_empty() {
            if id.is_blank() {
                for field in self.classifier.translated_fields() {
                    entity.set_dirty(field.clone(), true);
                }
                return Ok(SaveOutcome::DeferredUntilInsert);
            }
            return Ok(SaveOutcome::NothingToSave);
        }

        let (translation, created) = self.find_or_create(&id, locale, &values, executor)?;
        tracing::debug!(
            table = %self.config.translation_table,
            locale = %locale,
            created,
            "Staged translation row"
        );

        let mut rows = bundled;
        rows.push(Row::Entity(translation));
        entity.set(BUNDLE_PROPERTY, Property::Many(rows));
        entity.set_raw(LOCALE_PROPERTY, locale);
        entity.set_dirty(LOCALE_PROPERTY, false);
        for field in values.keys() {
            entity.set_dirty(field.clone(), false);
        }

        Ok(SaveOutcome::Staged { created })
    }

    /// Drop the working `_i18n` collection after persistence.
    pub fn after_save(&self, entity: &mut Entity) {
        entity.unset(BUNDLE_PROPERTY);
    }

    fn find_or_create(
        &self,
        id: &Value,
        locale: &str,
        values: &BTreeMap<String, Value>,
        executor: &dyn QueryExecutor,
    ) -> Result<(Entity, bool)> {
        let table = &self.config.translation_table;
        let mut query = Select::new(table.clone());
        query
            .select_many(["id", LOCALE_COLUMN])
            .select_many(values.keys().cloned())
            .filter(Expr::eq("id", id.clone()).and(Expr::eq(LOCALE_COLUMN, locale)))
            .enable_buffered_results(false)
            .limit(1);

        if let Some(row) = query.first(executor)? {
            let mut translation = row.into_entity(table);
            for (field, value) in values {
                translation.set(field.clone(), value.clone());
            }
            return Ok((translation, false));
        }

        let mut translation = Entity::new(table.clone());
        translation.set_raw("id", id.clone());
        translation.set_raw(LOCALE_COLUMN, locale);
        for (field, value) in values {
            translation.set_raw(field.clone(), value.clone());
        }
        translation.set_new(true);
        Ok((translation, true))
    }

    /// Stamp `(id, locale)` on payload rows lacking an id and store the
    /// payload as the working `_i18n` collection.
    ///
    /// Runs when the multi-locale payload is non-empty or explicitly dirty.
    pub fn bundle_translated_fields(&self, entity: &mut Entity) {
        let payload_empty = entity
            .get(TRANSLATIONS_PROPERTY)
            .is_none_or(Property::is_empty);
        if payload_empty && !entity.is_dirty(TRANSLATIONS_PROPERTY) {
            return;
        }

        let key = entity
            .value(self.config.key_column())
            .cloned()
            .unwrap_or_default();
        let mut bundle = Vec::new();
        if let Some(Property::Keyed(translations)) = entity.get_mut(TRANSLATIONS_PROPERTY) {
            for (locale, translation) in translations.iter_mut() {
                if translation.value("id").is_none_or(Value::is_blank) {
                    translation.set("id", key.clone());
                    translation.set(LOCALE_COLUMN, locale.as_str());
                }
                bundle.push(translation.clone());
            }
        }
        entity.set(BUNDLE_PROPERTY, Property::Many(bundle));
    }

    /// Remove zero-length translated values from the payload, then locales
    /// left without content, then the payload itself once empty.
    pub fn unset_empty_fields(&self, entity: &mut Entity) {
        let fields = self.classifier.translated_fields();
        let Some(Property::Keyed(translations)) = entity.get_mut(TRANSLATIONS_PROPERTY) else {
            return;
        };

        translations.retain(|locale, translation| {
            for field in fields {
                if translation.value(field).is_some_and(Value::is_empty_text) {
                    translation.unset(field);
                }
            }
            let has_content = fields
                .iter()
                .any(|f| translation.value(f).is_some_and(|v| !v.is_blank()));
            if !has_content {
                tracing::debug!(locale = %locale, "Dropping empty translation");
            }
            has_content
        });

        if translations.is_empty() {
            entity.unset(TRANSLATIONS_PROPERTY);
        }
    }
}
