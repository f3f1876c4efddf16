//! Clause rewriting.
//!
//! Unqualified field references in ORDER BY and WHERE clauses are ambiguous
//! once the translation table is joined in, since both tables carry the
//! translatable columns. [`ClauseRewriter`] qualifies them: translatable
//! fields point at the translation relation, other main-table columns at the
//! main table. Anything else is left alone, so a second pass is a no-op.

use localerow_query::{Expr, FieldRef, OrderBy};

use crate::classify::{FieldClass, FieldClassifier};

/// Qualifies field references against the main table and the translation
/// relation.
#[derive(Debug, Clone, Copy)]
pub struct ClauseRewriter<'a> {
    classifier: &'a FieldClassifier,
    main_alias: &'a str,
    translation_alias: &'a str,
}

impl<'a> ClauseRewriter<'a> {
    pub fn new(
        classifier: &'a FieldClassifier,
        main_alias: &'a str,
        translation_alias: &'a str,
    ) -> Self {
        Self {
            classifier,
            main_alias,
            translation_alias,
        }
    }

    /// Rewrite one field token in place.
    ///
    /// Returns `true` when the token now points at the translation relation.
    pub fn rewrite_field(&self, field: &mut String) -> bool {
        let (alias, join_required) = match self.classifier.classify(field) {
            FieldClass::Translated => (self.translation_alias, true),
            FieldClass::Main => (self.main_alias, false),
            FieldClass::Qualified | FieldClass::Unknown => return false,
        };
        let rewritten = format!("{alias}.{field}");
        tracing::trace!(from = %field, to = %rewritten, "Qualified field");
        *field = rewritten;
        join_required
    }

    fn rewrite_ref(&self, field: &mut FieldRef) -> bool {
        match field {
            FieldRef::Name(name) => self.rewrite_field(name),
            FieldRef::Expr(_) => false,
        }
    }

    /// Rewrite every sort term. Returns whether a join is required.
    pub fn iterate_clause(&self, order: &mut OrderBy) -> bool {
        let mut join_required = false;
        order.iterate_parts(|term| {
            join_required |= self.rewrite_ref(term);
        });
        join_required
    }

    /// Rewrite every leaf of a predicate tree. Returns whether a join is
    /// required.
    pub fn traverse_clause(&self, filter: &mut Expr) -> bool {
        let mut join_required = false;
        filter.traverse_mut(&mut |node: &mut Expr| {
            if let Some(field) = node.field_mut() {
                join_required |= self.rewrite_ref(field);
            }
        });
        join_required
    }
}
