//! Translation configuration.
//!
//! [`TranslateConfig`] is what callers provide (in code or as JSON);
//! [`ResolvedConfig`] is what the engine runs with once the table aliases
//! and the translation table name have been derived from the main table.

use localerow_core::{Error, FetchStrategy, Result};
use serde::{Deserialize, Deserializer};

/// Options recognized by the translation engine.
///
/// # Example
///
/// ```
/// use localerow::TranslateConfig;
///
/// let config = TranslateConfig::from_json(
///     r#"{"defaultLocale": "en_US", "onlyTranslated": true, "validator": false}"#,
/// )
/// .unwrap();
/// assert_eq!(config.default_locale.as_deref(), Some("en_US"));
/// assert!(config.only_translated);
/// assert!(config.allow_empty_translations);
/// assert!(config.validator.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslateConfig {
    /// Explicit translatable fields. Empty means discover them from the
    /// translation table's columns.
    pub fields: Vec<String>,

    /// Locale whose values live on the main table itself.
    pub default_locale: Option<String>,

    /// Name the translation table is derived from. Defaults to the main
    /// table name.
    pub reference_name: Option<String>,

    /// Alias of the main table in queries. Defaults to the main table name.
    pub main_table_alias: Option<String>,

    /// Translation table. Defaults to `{referenceName}_translations`.
    pub translation_table: Option<String>,

    /// Alias of the per-locale one-to-one relation. Defaults to
    /// `{mainTableAlias}_translation`.
    pub has_one_alias: Option<String>,

    /// Keep zero-length translated values (on read and on save).
    pub allow_empty_translations: bool,

    /// Drop rows without a translation for the current locale.
    pub only_translated: bool,

    /// Fetch strategy of the one-to-many translations relation.
    pub strategy: FetchStrategy,

    /// Validator used when marshalling multi-locale input. `false` in JSON
    /// disables validation; `true` selects the validator named `default`.
    #[serde(deserialize_with = "validator_name")]
    pub validator: Option<String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            default_locale: None,
            reference_name: None,
            main_table_alias: None,
            translation_table: None,
            has_one_alias: None,
            allow_empty_translations: true,
            only_translated: false,
            strategy: FetchStrategy::default(),
            validator: None,
        }
    }
}

impl TranslateConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }

    /// Set the translatable fields explicitly.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the default locale.
    #[must_use]
    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    /// Set the reference name.
    #[must_use]
    pub fn reference_name(mut self, name: impl Into<String>) -> Self {
        self.reference_name = Some(name.into());
        self
    }

    /// Set the main table alias.
    #[must_use]
    pub fn main_table_alias(mut self, alias: impl Into<String>) -> Self {
        self.main_table_alias = Some(alias.into());
        self
    }

    /// Set the translation table.
    #[must_use]
    pub fn translation_table(mut self, table: impl Into<String>) -> Self {
        self.translation_table = Some(table.into());
        self
    }

    /// Set the one-to-one relation alias.
    #[must_use]
    pub fn has_one_alias(mut self, alias: impl Into<String>) -> Self {
        self.has_one_alias = Some(alias.into());
        self
    }

    /// Keep or suppress zero-length translations.
    #[must_use]
    pub fn allow_empty_translations(mut self, allow: bool) -> Self {
        self.allow_empty_translations = allow;
        self
    }

    /// Inner-join translations by default.
    #[must_use]
    pub fn only_translated(mut self, only: bool) -> Self {
        self.only_translated = only;
        self
    }

    /// Set the fetch strategy of the translations relation. Only `Select`
    /// and `Subquery` resolve.
    #[must_use]
    pub fn strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validate multi-locale input with the named validator.
    #[must_use]
    pub fn validator(mut self, name: impl Into<String>) -> Self {
        self.validator = Some(name.into());
        self
    }

    /// Derive the aliases and table names for `main_table`.
    pub fn resolve(&self, main_table: &str, primary_key: Vec<String>) -> Result<ResolvedConfig> {
        if main_table.is_empty() {
            return Err(Error::Config("main table name is empty".to_string()));
        }
        if primary_key.is_empty() {
            return Err(Error::Config(format!(
                "table `{main_table}` has no primary key"
            )));
        }
        if self.strategy == FetchStrategy::Join {
            return Err(Error::Config(
                "translations relation cannot use the `join` strategy".to_string(),
            ));
        }

        let reference_name = non_empty(self.reference_name.as_deref()).unwrap_or(main_table);
        let main_alias = non_empty(self.main_table_alias.as_deref()).unwrap_or(main_table);
        let translation_table = non_empty(self.translation_table.as_deref())
            .map_or_else(|| format!("{reference_name}_translations"), str::to_string);
        let has_one_alias = non_empty(self.has_one_alias.as_deref())
            .map_or_else(|| format!("{main_alias}_translation"), str::to_string);

        Ok(ResolvedConfig {
            main_table: main_table.to_string(),
            main_alias: main_alias.to_string(),
            reference_name: reference_name.to_string(),
            translation_table,
            has_one_alias,
            primary_key,
            default_locale: self.default_locale.clone(),
            allow_empty_translations: self.allow_empty_translations,
            only_translated: self.only_translated,
            strategy: self.strategy,
            validator: self.validator.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn validator_name<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Name(String),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Name(name)) if !name.is_empty() => Some(name),
        Some(Raw::Flag(true)) => Some("default".to_string()),
        _ => None,
    })
}

/// Configuration after table names and aliases have been derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Main table.
    pub main_table: String,
    /// Alias of the main table in queries.
    pub main_alias: String,
    /// Name the translation table was derived from.
    pub reference_name: String,
    /// Translation table; also the name of the one-to-many relation.
    pub translation_table: String,
    /// Alias of the per-locale one-to-one relation.
    pub has_one_alias: String,
    /// Primary key column(s) of the main table.
    pub primary_key: Vec<String>,
    /// Locale whose values live on the main table.
    pub default_locale: Option<String>,
    /// Keep zero-length translations.
    pub allow_empty_translations: bool,
    /// Inner-join translations by default.
    pub only_translated: bool,
    /// Fetch strategy of the one-to-many relation.
    pub strategy: FetchStrategy,
    /// Validator name for multi-locale input.
    pub validator: Option<String>,
}

impl ResolvedConfig {
    /// Whether `locale` is the configured default locale.
    pub fn is_default_locale(&self, locale: &str) -> bool {
        self.default_locale.as_deref() == Some(locale)
    }

    /// First primary key column of the main table.
    pub fn key_column(&self) -> &str {
        self.primary_key.first().map_or("id", String::as_str)
    }
}
