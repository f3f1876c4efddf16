//! Core data model for localerow.
//!
//! `localerow-core` is the **foundation layer**: it defines the collaborator
//! types the translation engine reads and mutates.
//!
//! # Role In The Architecture
//!
//! - **Data model**: `Value`, `Entity`, `Row` and `Property` represent column
//!   values, hydrated records with dirty tracking, and fetched rows (hydrated or
//!   plain).
//! - **Metadata**: `Schema` answers column questions; `RelationRegistry` holds
//!   one-to-one / one-to-many relation declarations.
//! - **Errors**: `Error` is what collaborators surface; the engine forwards it.
//!
//! # Who Uses This Crate
//!
//! - `localerow-query` builds select queries over `Value` and `Row`.
//! - `localerow` rewrites queries, maps rows and reconciles saves using the
//!   types defined here.

pub mod entity;
pub mod error;
pub mod relationship;
pub mod row;
pub mod schema;
pub mod validate;
pub mod value;

pub use entity::{Entity, SetOptions, Setter};
pub use error::{Error, FieldErrors, Result};
pub use relationship::{
    FetchStrategy, JoinType, RelationRegistry, Relations, RelationshipInfo, RelationshipKind,
};
pub use row::{Property, Row};
pub use schema::{ColumnDef, MemorySchema, Schema, TableSchema};
pub use validate::{matches_pattern, validate_pattern};
pub use value::Value;
