//! Read-query interception.
//!
//! For a non-default locale the planner declares the per-locale one-to-one
//! relation, qualifies the query's field references, and attaches the join
//! plus a [`RowMapper`] only when one of the rewrite passes needs it.

use localerow_core::{JoinType, RelationRegistry, RelationshipInfo, RelationshipKind};
use localerow_query::{FormatterMode, Select, SelectItem};

use crate::classify::{FieldClassifier, LOCALE_COLUMN};
use crate::config::ResolvedConfig;
use crate::events::FindOptions;
use crate::mapper::{RowMapper, TRANSLATION_PROPERTY};
use crate::rewrite::ClauseRewriter;

/// What the planner did to a read query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    /// The locale is the default one; the query was left alone.
    DefaultLocale,
    /// Field references were qualified but nothing needed the translation,
    /// so no join was attached.
    Unjoined(JoinType),
    /// The translation relation was joined and a row mapper attached.
    Joined(JoinType),
}

impl ReadPlan {
    /// Whether the translation relation was joined.
    pub fn is_joined(&self) -> bool {
        matches!(self, ReadPlan::Joined(_))
    }
}

/// Plans reads against the main table.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner<'a> {
    config: &'a ResolvedConfig,
    classifier: &'a FieldClassifier,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(config: &'a ResolvedConfig, classifier: &'a FieldClassifier) -> Self {
        Self { config, classifier }
    }

    /// Join type for a read with `options`.
    pub fn join_type(&self, options: &FindOptions) -> JoinType {
        let inner = options
            .filter_by_current_locale
            .unwrap_or(self.config.only_translated);
        if inner { JoinType::Inner } else { JoinType::Left }
    }

    /// The per-locale one-to-one translation relation.
    pub fn translation_relation(&self, locale: &str, join_type: JoinType) -> RelationshipInfo {
        let alias = &self.config.has_one_alias;
        RelationshipInfo::new(
            alias.clone(),
            self.config.translation_table.clone(),
            RelationshipKind::OneToOne,
        )
        .foreign_key(["id"])
        .binding_key(self.config.primary_key.iter().take(1).cloned())
        .join_type(join_type)
        .condition(format!("{alias}.{LOCALE_COLUMN}"), locale)
        .property_name(TRANSLATION_PROPERTY)
    }

    /// Rewrite `query` for a read in `locale`.
    pub fn plan(
        &self,
        query: &mut Select,
        locale: &str,
        options: &FindOptions,
        relations: &mut dyn RelationRegistry,
    ) -> ReadPlan {
        if self.config.is_default_locale(locale) {
            tracing::debug!(locale = %locale, "Default locale, leaving query untouched");
            return ReadPlan::DefaultLocale;
        }

        let join_type = self.join_type(options);
        let relation = self.translation_relation(locale, join_type);
        relations.declare(relation.clone());

        let rewriter = ClauseRewriter::new(
            self.classifier,
            &self.config.main_alias,
            &self.config.has_one_alias,
        );
        let fields_added = self.add_fields_to_query(query);
        let order_requires_join = rewriter.iterate_clause(query.order_clause_mut());
        let where_requires_join = query
            .where_clause_mut()
            .is_some_and(|filter| rewriter.traverse_clause(filter));

        if !fields_added && !order_requires_join && !where_requires_join {
            tracing::debug!(
                locale = %locale,
                join = join_type.as_sql(),
                "No translated field referenced, skipping join"
            );
            return ReadPlan::Unjoined(join_type);
        }

        query.contain(relation);
        query.format_results(
            Box::new(RowMapper::new(locale, self.config.allow_empty_translations)),
            FormatterMode::Prepend,
        );
        tracing::debug!(
            locale = %locale,
            join = join_type.as_sql(),
            fields_added,
            order_requires_join,
            where_requires_join,
            "Attached translation join"
        );
        ReadPlan::Joined(join_type)
    }

    /// Select the translated columns the query asks for from the relation.
    ///
    /// Returns `true` when the translation is needed: always for
    /// auto-field or empty select lists, otherwise when a translatable field
    /// (bare or main-qualified) is selected.
    pub fn add_fields_to_query(&self, query: &mut Select) -> bool {
        if query.is_auto_fields_enabled() {
            return true;
        }

        let selected: Vec<String> = query
            .select_clause()
            .iter()
            .filter_map(SelectItem::as_field)
            .map(str::to_string)
            .collect();
        if selected.is_empty() {
            return true;
        }

        let main_alias = &self.config.main_alias;
        let has_one_alias = self.config.has_one_alias.as_str();
        let mut join_required = false;
        for field in self.classifier.translated_fields() {
            let qualified = format!("{main_alias}.{field}");
            if selected.iter().any(|s| s == field || *s == qualified) {
                join_required = true;
                query.select(query.alias_field(field, Some(has_one_alias)));
            }
        }
        if join_required {
            query.select(query.alias_field(LOCALE_COLUMN, Some(has_one_alias)));
        }
        join_required
    }
}
