//! Error types shared by every localerow crate.

use std::collections::BTreeMap;
use std::fmt;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced by collaborators (schema, executors, configuration).
///
/// The translation engine never fabricates these on its own; it forwards
/// whatever the schema source or query executor returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The schema source has no table with this name.
    UnknownTable(String),
    /// A configuration document could not be parsed or is inconsistent.
    Config(String),
    /// A query could not be built or executed.
    Query(String),
    /// Writing rows failed.
    Persistence(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownTable(table) => write!(f, "unknown table `{table}`"),
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
            Error::Persistence(msg) => write!(f, "persistence error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
