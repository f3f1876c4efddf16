//! Merging joined translations into fetched rows.

use localerow_core::{Property, Row};
use localerow_query::ResultFormatter;

use crate::classify::LOCALE_COLUMN;
use crate::locale::LOCALE_PROPERTY;

/// Property the joined per-locale translation is attached under.
pub const TRANSLATION_PROPERTY: &str = "translation";

/// Copies the joined translation's values over the main row's values.
///
/// Bound to the locale of the read it was registered for. Rows come out
/// with `_locale` stamped, without the `translation` property and clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMapper {
    locale: String,
    allow_empty: bool,
}

impl RowMapper {
    pub fn new(locale: impl Into<String>, allow_empty: bool) -> Self {
        Self {
            locale: locale.into(),
            allow_empty,
        }
    }

    /// Locale the mapper was bound to.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn merge(&self, row: &mut Row, translation: &Row) {
        for field in translation.fields() {
            let Some(property) = translation.get(&field) else {
                continue;
            };
            if field == LOCALE_COLUMN {
                row.set(LOCALE_PROPERTY, property.clone());
                continue;
            }
            if let Property::Value(value) = property {
                if value.is_null() || (!self.allow_empty && value.is_empty_text()) {
                    continue;
                }
            }
            row.set(field, property.clone());
        }
    }
}

impl ResultFormatter for RowMapper {
    fn map_row(&self, row: Option<Row>) -> Option<Row> {
        let mut row = row?;
        match row.unset(TRANSLATION_PROPERTY).filter(|p| !p.is_empty()) {
            Some(Property::One(translation)) => self.merge(&mut row, &translation),
            _ => row.set(LOCALE_PROPERTY, self.locale.as_str()),
        }
        row.mark_clean();
        Some(row)
    }
}
