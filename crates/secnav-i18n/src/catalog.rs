#![forbid(unsafe_code)]

//! String catalogs with locale fallback.
//!
//! # Invariants
//!
//! 1. `get` consults the current locale, then each fallback locale in order.
//! 2. A key missing everywhere resolves to `None`; [`LabelResolver::label`]
//!    then returns the key itself so a tab is never blank.
//! 3. Interpolation is single-pass: substituted values are never re-scanned.

use std::collections::HashMap;
use std::fmt;

/// Maps a label key to display text.
pub trait LabelResolver {
    /// Localized text for `key`, or `None` if unknown.
    fn resolve(&self, key: &str) -> Option<String>;

    /// Localized text for `key`, falling back to the key itself.
    fn label(&self, key: &str) -> String {
        self.resolve(key).unwrap_or_else(|| key.to_owned())
    }
}

impl<F> LabelResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Catalog errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// The requested locale has no strings registered.
    UnknownLocale(String),
    /// A fallback chain entry names an unregistered locale.
    UnknownFallback(String),
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLocale(locale) => write!(f, "unknown locale: {locale}"),
            Self::UnknownFallback(locale) => write!(f, "unknown fallback locale: {locale}"),
        }
    }
}

impl std::error::Error for I18nError {}

/// Strings for a single locale.
#[derive(Debug, Clone, Default)]
pub struct LocaleStrings {
    entries: HashMap<String, String>,
}

impl LocaleStrings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocaleStrings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut strings = Self::new();
        for (k, v) in iter {
            strings.insert(k, v);
        }
        strings
    }
}

/// Multi-locale catalog with a current locale and a fallback chain.
#[derive(Debug, Clone)]
pub struct StringCatalog {
    locales: HashMap<String, LocaleStrings>,
    current: String,
    fallbacks: Vec<String>,
}

impl StringCatalog {
    /// Create a catalog whose current locale is `locale`.
    #[must_use]
    pub fn new(locale: impl Into<String>, strings: LocaleStrings) -> Self {
        let current = locale.into();
        let mut locales = HashMap::new();
        locales.insert(current.clone(), strings);
        Self {
            locales,
            current,
            fallbacks: Vec::new(),
        }
    }

    /// Register (or replace) a locale.
    pub fn add_locale(&mut self, locale: impl Into<String>, strings: LocaleStrings) {
        self.locales.insert(locale.into(), strings);
    }

    /// Set the fallback chain consulted after the current locale.
    pub fn set_fallbacks<I, S>(&mut self, chain: I) -> Result<(), I18nError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chain: Vec<String> = chain.into_iter().map(Into::into).collect();
        if let Some(missing) = chain.iter().find(|l| !self.locales.contains_key(*l)) {
            return Err(I18nError::UnknownFallback(missing.clone()));
        }
        self.fallbacks = chain;
        Ok(())
    }

    /// Switch the current locale. Returns `true` if it changed.
    pub fn set_locale(&mut self, locale: &str) -> Result<bool, I18nError> {
        if !self.locales.contains_key(locale) {
            return Err(I18nError::UnknownLocale(locale.to_owned()));
        }
        if self.current == locale {
            return Ok(false);
        }
        self.current = locale.to_owned();
        Ok(true)
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.current
    }

    /// Look up `key` through the current locale and the fallback chain.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        std::iter::once(&self.current)
            .chain(self.fallbacks.iter())
            .filter_map(|locale| self.locales.get(locale))
            .find_map(|strings| strings.get(key))
    }

    /// Look up `key` and substitute `{name}` placeholders from `args`.
    ///
    /// Placeholders without a matching argument are left intact.
    #[must_use]
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> Option<String> {
        self.get(key).map(|template| interpolate(template, args))
    }

    /// Keys present in `locale` but missing from the current locale.
    #[must_use]
    pub fn missing_keys(&self, locale: &str) -> Vec<String> {
        let (Some(reference), Some(current)) =
            (self.locales.get(locale), self.locales.get(&self.current))
        else {
            return Vec::new();
        };
        let mut missing: Vec<String> = reference
            .entries
            .keys()
            .filter(|k| current.get(k).is_none())
            .cloned()
            .collect();
        missing.sort();
        missing
    }
}

impl LabelResolver for StringCatalog {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_owned)
    }
}

/// Single-pass `{name}` substitution.
#[must_use]
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match args.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
