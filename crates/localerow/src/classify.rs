//! Field classification.
//!
//! Both field sets are computed once, when the strategy is built, and never
//! change afterwards.

use localerow_core::{Result, Schema};

use crate::config::ResolvedConfig;

/// Columns of the translation table that are never translatable.
pub const RESERVED_COLUMNS: [&str; 2] = ["id", LOCALE_COLUMN];

/// Locale column of the translation table.
pub const LOCALE_COLUMN: &str = "locale";

/// What a field token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Already carries a table qualifier.
    Qualified,
    /// A translatable field.
    Translated,
    /// A main-table column that is not translatable.
    Main,
    /// Neither; left alone by rewriting.
    Unknown,
}

/// Classifies field names as translatable, main-table or qualified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldClassifier {
    translated: Vec<String>,
    main: Vec<String>,
}

impl FieldClassifier {
    /// Build from explicit field lists.
    pub fn new<T, M, S>(translated: T, main: M) -> Self
    where
        T: IntoIterator<Item = S>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            translated: translated.into_iter().map(Into::into).collect(),
            main: main.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from schema metadata.
    ///
    /// Translatable fields are `explicit` when given, otherwise the
    /// translation table's columns minus `id` and `locale`. Main fields are
    /// the main table's columns.
    pub fn from_schema(
        schema: &dyn Schema,
        config: &ResolvedConfig,
        explicit: &[String],
    ) -> Result<Self> {
        let translated = if explicit.is_empty() {
            schema
                .columns(&config.translation_table)?
                .into_iter()
                .filter(|c| !RESERVED_COLUMNS.contains(&c.as_str()))
                .collect()
        } else {
            explicit.to_vec()
        };
        let main = schema.columns(&config.main_table)?;

        tracing::debug!(
            table = %config.main_table,
            translated = ?translated,
            "Classified translatable fields"
        );
        Ok(Self { translated, main })
    }

    /// Translatable fields, in declaration order.
    pub fn translated_fields(&self) -> &[String] {
        &self.translated
    }

    /// Main-table fields, in declaration order.
    pub fn main_fields(&self) -> &[String] {
        &self.main
    }

    /// Whether `field` is translatable.
    pub fn is_translated(&self, field: &str) -> bool {
        self.translated.iter().any(|f| f == field)
    }

    /// Whether `field` is a main-table column.
    pub fn is_main(&self, field: &str) -> bool {
        self.main.iter().any(|f| f == field)
    }

    /// Classify a field token.
    pub fn classify(&self, field: &str) -> FieldClass {
        if is_qualified(field) {
            FieldClass::Qualified
        } else if self.is_translated(field) {
            FieldClass::Translated
        } else if self.is_main(field) {
            FieldClass::Main
        } else {
            FieldClass::Unknown
        }
    }
}

/// Whether `field` carries a table qualifier (`alias.field`).
///
/// A leading dot is not a qualifier.
pub fn is_qualified(field: &str) -> bool {
    field.find('.').is_some_and(|at| at > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use localerow_core::{ColumnDef, Error, MemorySchema, TableSchema};

    fn schema() -> MemorySchema {
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

    fn resolved() -> ResolvedConfig {
        TranslateConfig::new()
            .resolve("articles", vec!["id".to_string()])
            .unwrap()
    }

    #[test]
    fn test_from_schema_discovers_fields() {
        let classifier = FieldClassifier::from_schema(&schema(), &resolved(), &[]).unwrap();
        assert_eq!(classifier.translated_fields(), ["title", "body"]);
        assert_eq!(
            classifier.main_fields(),
            ["id", "title", "body", "published"]
        );
    }

    #[test]
    fn test_explicit_fields_bypass_discovery() {
        let classifier =
            FieldClassifier::from_schema(&schema(), &resolved(), &["title".to_string()]).unwrap();
        assert_eq!(classifier.translated_fields(), ["title"]);
        assert!(!classifier.is_translated("body"));
    }

    #[test]
    fn test_unknown_table_propagates() {
        let schema = MemorySchema::new();
        let err = FieldClassifier::from_schema(&schema, &resolved(), &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownTable(_)));
    }

    #[test]
    fn test_classify() {
        let classifier = FieldClassifier::new(["title"], ["id", "title", "published"]);
        assert_eq!(classifier.classify("title"), FieldClass::Translated);
        assert_eq!(classifier.classify("published"), FieldClass::Main);
        assert_eq!(classifier.classify("articles.title"), FieldClass::Qualified);
        assert_eq!(classifier.classify("other"), FieldClass::Unknown);
    }

    #[test]
    fn test_is_qualified() {
        assert!(is_qualified("a.title"));
        assert!(!is_qualified("title"));
        assert!(!is_qualified(".title"));
    }
}
