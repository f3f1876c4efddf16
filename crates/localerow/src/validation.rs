//! Validators for multi-locale input.
//!
//! A [`Validator`] is a list of per-field [`Rule`]s. Validators are
//! registered by name in a [`ValidatorRegistry`]; the translation config
//! refers to one by name.

use std::collections::BTreeMap;

use localerow_core::{FieldErrors, Value, matches_pattern, validate_pattern};

/// A constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Must be present and non-empty on new rows; must not be emptied on
    /// existing ones.
    Required,
    /// Text must not exceed this many characters.
    MaxLength(usize),
    /// Text must match this regular expression.
    Pattern(String),
}

impl Rule {
    fn check(&self, value: Option<&Value>, is_new: bool) -> Option<String> {
        match self {
            Rule::Required => {
                let missing = match value {
                    None => is_new,
                    Some(v) => v.is_empty_text(),
                };
                missing.then(|| "This field is required".to_string())
            }
            Rule::MaxLength(max) => {
                let text = value.and_then(Value::as_str)?;
                (text.chars().count() > *max)
                    .then(|| format!("Must be at most {max} characters long"))
            }
            Rule::Pattern(pattern) => {
                let text = value.and_then(Value::as_str)?;
                (!matches_pattern(text, pattern)).then(|| "The provided value is invalid".to_string())
            }
        }
    }
}

/// Per-field rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    rules: Vec<(String, Rule)>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `field`.
    ///
    /// Pattern rules with an invalid expression are logged and dropped.
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, rule: Rule) -> Self {
        let field = field.into();
        if let Rule::Pattern(pattern) = &rule {
            if let Some(error) = validate_pattern(pattern) {
                tracing::warn!(field = %field, error = %error, "Ignoring pattern rule");
                return self;
            }
        }
        self.rules.push((field, rule));
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check `data` bound for a new (`is_new`) or existing row.
    pub fn validate(&self, data: &BTreeMap<String, Value>, is_new: bool) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, rule) in &self.rules {
            if let Some(message) = rule.check(data.get(field), is_new) {
                errors.entry(field.clone()).or_default().push(message);
            }
        }
        errors
    }
}

/// Validators by name.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    validators: BTreeMap<String, Validator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a validator.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.validators.insert(name.into(), validator);
        self
    }

    /// Look up a validator.
    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.validators.get(name)
    }
}
