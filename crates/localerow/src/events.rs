//! Lifecycle hook options and the listener trait.
//!
//! The host data layer fires `before_find` before executing a read, and
//! `before_save` / `after_save` around persisting a single entity. Options
//! bags travel with each event.

use std::collections::BTreeMap;

use localerow_core::{Entity, Result};
use localerow_query::{QueryExecutor, Select};

use crate::planner::ReadPlan;
use crate::reconcile::SaveOutcome;

/// Options of a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// `Some(true)` keeps only rows translated into the current locale
    /// (inner join), `Some(false)` keeps every row (left join). `None`
    /// falls back to the `onlyTranslated` setting.
    pub filter_by_current_locale: Option<bool>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter_by_current_locale(mut self, filter: bool) -> Self {
        self.filter_by_current_locale = Some(filter);
        self
    }
}

/// Save options for one associated relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociatedOptions {
    /// Run validation on the associated rows.
    pub validate: Option<bool>,
}

/// Options of a single-entity save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Per-relation options for cascaded saves, keyed by relation name.
    pub associated: BTreeMap<String, AssociatedOptions>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set options for an associated relation.
    #[must_use]
    pub fn associated(mut self, relation: impl Into<String>, options: AssociatedOptions) -> Self {
        self.associated.insert(relation.into(), options);
        self
    }
}

/// Options of input marshalling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    /// `Some(false)` ignores the `_translations` input.
    pub translations: Option<bool>,
}

/// Receives table lifecycle events.
pub trait TableListener {
    /// Called before a read query runs.
    fn before_find(&mut self, query: &mut Select, options: &FindOptions) -> ReadPlan;

    /// Called before `entity` is persisted.
    fn before_save(
        &self,
        entity: &mut Entity,
        options: &mut SaveOptions,
        executor: &dyn QueryExecutor,
    ) -> Result<SaveOutcome>;

    /// Called after `entity` was persisted.
    fn after_save(&self, entity: &mut Entity);
}
