//! Select queries for localerow.
//!
//! `localerow-query` models the read side the translation engine intercepts:
//! a [`Select`] with an introspectable select list, a WHERE predicate tree
//! ([`Expr`]) whose leaves expose a field accessor, an ORDER BY list
//! ([`OrderBy`]) whose terms can be rewritten in place, eager-loaded
//! relations, and an ordered pipeline of [`ResultFormatter`]s.
//!
//! Execution is delegated to a [`QueryExecutor`]; this crate does not talk to
//! a database.

pub mod expr;
pub mod order;
pub mod select;

pub use expr::{CompareOp, Expr, FieldRef};
pub use order::{Direction, OrderBy, OrderPart};
pub use select::{FormatterMode, QueryExecutor, ResultFormatter, Select, SelectItem};
