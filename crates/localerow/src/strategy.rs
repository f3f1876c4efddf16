//! The translation strategy bound to one main table.

use localerow_core::{
    Entity, Error, RelationRegistry, Relations, RelationshipInfo, RelationshipKind, Result, Row,
    Schema,
};
use localerow_query::{FormatterMode, QueryExecutor, ResultFormatter, Select};

use crate::classify::FieldClassifier;
use crate::config::{ResolvedConfig, TranslateConfig};
use crate::events::{FindOptions, MarshalOptions, SaveOptions, TableListener};
use crate::group::TranslationGrouper;
use crate::locale::LocaleResolver;
use crate::mapper::TRANSLATION_PROPERTY;
use crate::marshal::TranslationMarshaller;
use crate::planner::{QueryPlanner, ReadPlan};
use crate::reconcile::{BUNDLE_PROPERTY, SaveOutcome, SaveReconciler, TRANSLATIONS_PROPERTY};
use crate::validation::{Validator, ValidatorRegistry};

/// Locale-aware translation of one main table through its translations
/// table.
///
/// Built once per main table. Field classification happens at
/// construction; the locale is resolved per operation.
///
/// # Example
///
/// ```
/// use localerow::prelude::*;
///
/// let schema = MemorySchema::new()
///     .table(
///         "articles",
///         TableSchema::new()
///             .column(ColumnDef::new("id").primary_key())
///             .column(ColumnDef::new("title").nullable()),
///     )
///     .table(
///         "articles_translations",
///         TableSchema::new()
///             .column(ColumnDef::new("id").primary_key())
///             .column(ColumnDef::new("locale").primary_key())
///             .column(ColumnDef::new("title").nullable()),
///     );
///
/// let mut strategy = TranslateStrategy::new(
///     &schema,
///     "articles",
///     TranslateConfig::new().default_locale("en_US"),
/// )
/// .unwrap();
/// strategy.set_locale(Some("fr".to_string()));
///
/// let mut query = Select::new("articles");
/// query.select("id").select("title");
/// let plan = strategy.before_find(&mut query, &FindOptions::new());
/// assert!(plan.is_joined());
/// assert_eq!(strategy.translation_field("title"), "articles_translation.title");
/// ```
#[derive(Debug, Clone)]
pub struct TranslateStrategy {
    config: ResolvedConfig,
    classifier: FieldClassifier,
    resolver: LocaleResolver,
    relations: Relations,
    validators: ValidatorRegistry,
}

impl TranslateStrategy {
    /// Bind to `main_table`, reading columns and keys from `schema`.
    ///
    /// Declares the one-to-many relation to the translations table
    /// (property `_i18n`, dependent).
    pub fn new(schema: &dyn Schema, main_table: &str, config: TranslateConfig) -> Result<Self> {
        let primary_key = schema.primary_key(main_table)?;
        let resolved = config.resolve(main_table, primary_key)?;
        let classifier = FieldClassifier::from_schema(schema, &resolved, &config.fields)?;

        let mut relations = Relations::new();
        relations.declare(
            RelationshipInfo::new(
                resolved.translation_table.clone(),
                resolved.translation_table.clone(),
                RelationshipKind::OneToMany,
            )
            .foreign_key(["id"])
            .binding_key([resolved.key_column().to_string()])
            .property_name(BUNDLE_PROPERTY)
            .strategy(resolved.strategy)
            .dependent(true),
        );

        tracing::info!(
            table = %resolved.main_table,
            translation_table = %resolved.translation_table,
            fields = classifier.translated_fields().len(),
            "Translation strategy ready"
        );

        Ok(Self {
            config: resolved,
            classifier,
            resolver: LocaleResolver::new(),
            relations,
            validators: ValidatorRegistry::new(),
        })
    }

    /// Use `validators` to resolve the configured validator name.
    #[must_use]
    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = validators;
        self
    }

    /// Pin the locale of future operations, or follow the global locale
    /// again with `None`. A `_locale` on a saved entity still wins.
    pub fn set_locale(&mut self, locale: Option<String>) {
        self.resolver.set_locale(locale);
    }

    /// The current locale.
    pub fn locale(&self) -> String {
        self.resolver.locale()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    /// Translatable fields.
    pub fn translated_fields(&self) -> &[String] {
        self.classifier.translated_fields()
    }

    /// Main-table fields.
    pub fn main_fields(&self) -> &[String] {
        self.classifier.main_fields()
    }

    /// Declared relations of the main table.
    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// The one-to-many translations relation.
    pub fn translations_relation(&self) -> Option<&RelationshipInfo> {
        self.relations.relationship(&self.config.translation_table)
    }

    /// The one-to-one relation as declared by the last planned read.
    pub fn translation_relation(&self) -> Option<&RelationshipInfo> {
        self.relations
            .relationship(&self.config.has_one_alias)
            .filter(|r| r.property_name == TRANSLATION_PROPERTY)
    }

    /// Fully aliased column for `field` under the current locale.
    ///
    /// Translatable fields point at the translation relation unless the
    /// current locale is the default one.
    pub fn translation_field(&self, field: &str) -> String {
        if !self.config.is_default_locale(&self.locale()) && self.classifier.is_translated(field) {
            format!("{}.{}", self.config.has_one_alias, field)
        } else {
            format!("{}.{}", self.config.main_alias, field)
        }
    }

    /// Eager-load every translation of the rows `query` returns, exposed as
    /// `_translations` (locale → translation row).
    ///
    /// An empty `locales` list keeps every locale.
    pub fn find_translations(&self, query: &mut Select, locales: &[String]) {
        if let Some(relation) = self.translations_relation() {
            query.contain(relation.clone());
        }
        query.format_results(
            Box::new(TranslationGrouper::new().locales(locales.iter().cloned())),
            FormatterMode::Prepend,
        );
    }

    /// Group already fetched `_i18n` collections into `_translations`.
    pub fn group_translations(&self, rows: Vec<Option<Row>>) -> Vec<Option<Row>> {
        let grouper = TranslationGrouper::new();
        rows.into_iter().map(|row| grouper.map_row(row)).collect()
    }

    /// Bind multi-locale input (`data["_translations"]`) onto `entity`.
    ///
    /// Does nothing when `options.translations` is `Some(false)` or the
    /// input carries no `_translations` key.
    pub fn marshal_translations(
        &self,
        entity: &mut Entity,
        data: &serde_json::Value,
        options: &MarshalOptions,
    ) -> Result<()> {
        if options.translations == Some(false) {
            return Ok(());
        }
        let Some(input) = data.get(TRANSLATIONS_PROPERTY) else {
            return Ok(());
        };

        let validator = self.validator()?;
        TranslationMarshaller::new(&self.config.translation_table, validator).merge(entity, input);
        Ok(())
    }

    fn validator(&self) -> Result<Option<&Validator>> {
        match self.config.validator.as_deref() {
            None => Ok(None),
            Some(name) => self
                .validators
                .get(name)
                .map(Some)
                .ok_or_else(|| Error::Config(format!("unknown validator `{name}`"))),
        }
    }
}

impl TableListener for TranslateStrategy {
    #[tracing::instrument(level = "debug", skip(self, query, options), fields(table = %self.config.main_table))]
    fn before_find(&mut self, query: &mut Select, options: &FindOptions) -> ReadPlan {
        let locale = self.locale();
        QueryPlanner::new(&self.config, &self.classifier).plan(
            query,
            &locale,
            options,
            &mut self.relations,
        )
    }

    #[tracing::instrument(level = "debug", skip(self, entity, options, executor), fields(table = %self.config.main_table))]
    fn before_save(
        &self,
        entity: &mut Entity,
        options: &mut SaveOptions,
        executor: &dyn QueryExecutor,
    ) -> Result<SaveOutcome> {
        let locale = self.resolver.resolve_for(entity);
        SaveReconciler::new(&self.config, &self.classifier).before_save(
            entity, &locale, options, executor,
        )
    }

    #[tracing::instrument(level = "debug", skip(self, entity), fields(table = %self.config.main_table))]
    fn after_save(&self, entity: &mut Entity) {
        SaveReconciler::new(&self.config, &self.classifier).after_save(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;
    use localerow_core::{ColumnDef, FetchStrategy, MemorySchema, TableSchema};
    use localerow_query::Expr;
    use serde_json::json;

    fn schema() -> MemorySchema {
        MemorySchema::new()
            .table(
                "articles",
                TableSchema::new()
                    .column(ColumnDef::new("id").primary_key())
                    .column(ColumnDef::new("title").nullable())
                    .column(ColumnDef::new("body").nullable()),
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

    fn strategy(locale: &str) -> TranslateStrategy {
        let mut strategy = TranslateStrategy::new(
            &schema(),
            "articles",
            TranslateConfig::new()
                .default_locale("en_US")
                .strategy(FetchStrategy::Select),
        )
        .unwrap();
        strategy.set_locale(Some(locale.to_string()));
        strategy
    }

    #[test]
    fn test_declares_translations_relation() {
        let strategy = strategy("fr");
        let relation = strategy.translations_relation().unwrap();
        assert_eq!(relation.kind, RelationshipKind::OneToMany);
        assert_eq!(relation.property_name, "_i18n");
        assert_eq!(relation.foreign_key, vec!["id".to_string()]);
        assert_eq!(relation.strategy, FetchStrategy::Select);
        assert!(relation.dependent);
        assert!(strategy.translation_relation().is_none());
    }

    #[test]
    fn test_unknown_table() {
        let err = TranslateStrategy::new(&schema(), "pages", TranslateConfig::new()).unwrap_err();
        assert_eq!(err, Error::UnknownTable("pages".to_string()));
    }

    #[test]
    fn test_before_find_redeclares_one_to_one() {
        let mut strategy = strategy("fr");
        let mut query = Select::new("articles");
        strategy.before_find(&mut query, &FindOptions::new());
        assert_eq!(
            strategy.translation_relation().map(|r| r.join_type),
            Some(localerow_core::JoinType::Left)
        );

        strategy.set_locale(Some("de".to_string()));
        let mut query = Select::new("articles");
        strategy.before_find(&mut query, &FindOptions::new().filter_by_current_locale(true));
        let relation = strategy.translation_relation().unwrap();
        assert_eq!(relation.join_type, localerow_core::JoinType::Inner);
        assert_eq!(relation.conditions[0].1, localerow_core::Value::from("de"));
    }

    #[test]
    fn test_translation_field() {
        let mut strategy = strategy("fr");
        assert_eq!(strategy.translation_field("title"), "articles_translation.title");
        assert_eq!(strategy.translation_field("id"), "articles.id");

        strategy.set_locale(Some("en_US".to_string()));
        assert_eq!(strategy.translation_field("title"), "articles.title");
    }

    #[test]
    fn test_find_translations_prepends_grouper() {
        let strategy = strategy("fr");
        let mut query = Select::new("articles");
        query.filter(Expr::eq("id", 1));
        strategy.find_translations(&mut query, &[]);
        assert_eq!(query.contained().len(), 1);
        assert_eq!(query.contained()[0].property_name, "_i18n");
        assert_eq!(query.formatters().len(), 1);
    }

    #[test]
    fn test_marshal_uses_configured_validator() {
        let strategy = TranslateStrategy::new(
            &schema(),
            "articles",
            TranslateConfig::new().validator("translated"),
        )
        .unwrap()
        .with_validators(
            ValidatorRegistry::new()
                .register("translated", Validator::new().rule("title", Rule::Required)),
        );

        let mut entity = Entity::new("articles");
        strategy
            .marshal_translations(
                &mut entity,
                &json!({"_translations": {"fr": {"body": "Corps"}}}),
                &MarshalOptions::default(),
            )
            .unwrap();
        assert!(entity.nested_errors("fr").is_some_and(|e| e.contains_key("title")));
    }

    #[test]
    fn test_marshal_disabled_or_unknown_validator() {
        let strategy = strategy("fr");
        let mut entity = Entity::new("articles");
        strategy
            .marshal_translations(
                &mut entity,
                &json!({"_translations": {"fr": {"title": "Bonjour"}}}),
                &MarshalOptions {
                    translations: Some(false),
                },
            )
            .unwrap();
        assert!(!entity.has("_translations"));

        let strategy = TranslateStrategy::new(
            &schema(),
            "articles",
            TranslateConfig::new().validator("missing"),
        )
        .unwrap();
        let err = strategy
            .marshal_translations(
                &mut entity,
                &json!({"_translations": {}}),
                &MarshalOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
