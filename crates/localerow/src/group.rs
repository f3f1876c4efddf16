//! Grouping eager-loaded translation rows by locale.

use std::collections::{BTreeMap, BTreeSet};

use localerow_core::{Property, Row};
use localerow_query::ResultFormatter;

use crate::classify::LOCALE_COLUMN;
use crate::reconcile::{BUNDLE_PROPERTY, TRANSLATIONS_PROPERTY};

/// Replaces a row's `_i18n` collection with a locale-keyed `_translations`
/// map.
///
/// Rows whose collection is empty but which already carry a non-empty
/// `_translations` map are returned untouched. With a locale filter, only
/// translations for those locales are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationGrouper {
    locales: BTreeSet<String>,
}

impl TranslationGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the given locales. An empty list keeps every locale.
    #[must_use]
    pub fn locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    fn wanted(&self, locale: &str) -> bool {
        self.locales.is_empty() || self.locales.contains(locale)
    }
}

impl ResultFormatter for TranslationGrouper {
    fn map_row(&self, row: Option<Row>) -> Option<Row> {
        let mut row = row?;
        let collection_empty = row.get(BUNDLE_PROPERTY).is_none_or(Property::is_empty);
        let already_grouped = row
            .get(TRANSLATIONS_PROPERTY)
            .is_some_and(|p| !p.is_empty());
        if collection_empty && already_grouped {
            return Some(row);
        }

        let translations = match row.unset(BUNDLE_PROPERTY) {
            Some(Property::Many(rows)) => rows,
            Some(Property::One(single)) => vec![*single],
            _ => Vec::new(),
        };

        let mut grouped = BTreeMap::new();
        for mut translation in translations {
            translation.unset("id");
            let locale = translation
                .text(LOCALE_COLUMN)
                .map(str::to_string)
                .unwrap_or_default();
            if self.wanted(&locale) {
                grouped.insert(locale, translation);
            }
        }

        row.set(TRANSLATIONS_PROPERTY, Property::Keyed(grouped));
        row.mark_clean();
        Some(row)
    }
}
