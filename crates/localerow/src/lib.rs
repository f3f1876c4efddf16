//! Row-level, locale-aware content translation.
//!
//! `localerow` layers per-locale values over a main table (e.g. `articles`)
//! using a companion translations table (`articles_translations`) keyed by
//! `(id, locale)`.
//!
//! # Reads
//!
//! [`TableListener::before_find`] rewrites a [`Select`](localerow_query::Select)
//! for the current locale: unqualified field references are qualified, the
//! per-locale translation is joined only when a translated field is actually
//! needed, and a [`RowMapper`] copies the translated values over the main
//! row's values before any other result formatter runs.
//!
//! # Saves
//!
//! [`TableListener::before_save`] moves translated values of the
//! effective locale into a translation row found or created by
//! `(id, locale)`, bundles a multi-locale `_translations` payload, and marks
//! the captured fields clean so the main row is not rewritten with them.
//!
//! # Locales
//!
//! The effective locale is the entity's `_locale`, else the strategy's pinned
//! locale, else the process-wide [`global_locale`].

pub mod classify;
pub mod config;
pub mod events;
pub mod group;
pub mod locale;
pub mod mapper;
pub mod marshal;
pub mod planner;
pub mod reconcile;
pub mod rewrite;
pub mod strategy;
pub mod validation;

pub use classify::{FieldClass, FieldClassifier, is_qualified};
pub use config::{ResolvedConfig, TranslateConfig};
pub use events::{AssociatedOptions, FindOptions, MarshalOptions, SaveOptions, TableListener};
pub use group::TranslationGrouper;
pub use locale::{LocaleResolver, global_locale, set_global_locale};
pub use mapper::RowMapper;
pub use marshal::TranslationMarshaller;
pub use planner::{QueryPlanner, ReadPlan};
pub use reconcile::{SaveOutcome, SaveReconciler};
pub use rewrite::ClauseRewriter;
pub use strategy::TranslateStrategy;
pub use validation::{Rule, Validator, ValidatorRegistry};

/// Everything needed to wire the strategy into a data layer.
pub mod prelude {
    pub use crate::{
        AssociatedOptions, FindOptions, MarshalOptions, ReadPlan, SaveOptions, SaveOutcome,
        TableListener, TranslateConfig, TranslateStrategy, Validator, ValidatorRegistry,
    };
    pub use localerow_core::{
        ColumnDef, Entity, Error, MemorySchema, Property, Result, Row, Schema, TableSchema, Value,
    };
    pub use localerow_query::{Direction, Expr, QueryExecutor, Select};
}
