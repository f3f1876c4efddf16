//! Pattern matching helpers for validation rules.
//!
//! Patterns are compiled on first use and kept for the life of the process.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use regex::Regex;

#[derive(Default)]
struct RegexCache {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl RegexCache {
    fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Ok(regex.clone());
        }

        let regex = Regex::new(pattern)?;
        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

fn regex_cache() -> &'static RegexCache {
    static CACHE: OnceLock<RegexCache> = OnceLock::new();
    CACHE.get_or_init(RegexCache::default)
}

/// Check whether `value` matches `pattern`.
///
/// An invalid pattern never matches; it is reported through `tracing` rather
/// than failing the validation run.
pub fn matches_pattern(value: &str, pattern: &str) -> bool {
    match regex_cache().get_or_compile(pattern) {
        Ok(regex) => regex.is_match(value),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Invalid regex pattern in validation rule, treating as non-match"
            );
            false
        }
    }
}

/// Returns an error message if `pattern` does not compile.
pub fn validate_pattern(pattern: &str) -> Option<String> {
    Regex::new(pattern)
        .err()
        .map(|e| format!("invalid regex pattern: {e}"))
}
