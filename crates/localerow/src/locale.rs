//! Locale resolution.
//!
//! The effective locale of an operation is, in order: the locale carried by
//! the entity being saved (`_locale`), the locale pinned on the resolver, and
//! the process-wide global locale.

use std::sync::{OnceLock, PoisonError, RwLock};

use localerow_core::Entity;

/// Global locale used until [`set_global_locale`] is called.
pub const DEFAULT_GLOBAL_LOCALE: &str = "en_US";

/// Property carrying an entity's locale override.
pub const LOCALE_PROPERTY: &str = "_locale";

static GLOBAL_LOCALE: OnceLock<RwLock<String>> = OnceLock::new();

fn global_cell() -> &'static RwLock<String> {
    GLOBAL_LOCALE.get_or_init(|| RwLock::new(DEFAULT_GLOBAL_LOCALE.to_string()))
}

/// The process-wide current locale.
pub fn global_locale() -> String {
    global_cell()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide current locale.
///
/// Meant to be called once at startup; every resolver without a pinned
/// locale picks the new value up on its next call.
pub fn set_global_locale(locale: impl Into<String>) {
    let locale = locale.into();
    tracing::debug!(locale = %locale, "Setting global locale");
    *global_cell()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = locale;
}

/// Resolves the locale of a read or a save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleResolver {
    pinned: Option<String>,
}

impl LocaleResolver {
    /// Resolver following the global locale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver pinned to `locale`.
    pub fn pinned(locale: impl Into<String>) -> Self {
        Self {
            pinned: Some(locale.into()),
        }
    }

    /// Pin a locale, or clear the pin with `None`.
    pub fn set_locale(&mut self, locale: Option<String>) {
        self.pinned = locale;
    }

    /// The pinned locale, if any.
    pub fn pinned_locale(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    /// Pinned locale, or the global one. An empty pin counts as unset.
    pub fn locale(&self) -> String {
        match self.pinned.as_deref() {
            Some(locale) if !locale.is_empty() => locale.to_string(),
            _ => global_locale(),
        }
    }

    /// Locale for saving `entity`: its non-empty `_locale` wins.
    pub fn resolve_for(&self, entity: &Entity) -> String {
        match entity.text(LOCALE_PROPERTY) {
            Some(locale) if !locale.is_empty() => locale.to_string(),
            _ => self.locale(),
        }
    }
}
