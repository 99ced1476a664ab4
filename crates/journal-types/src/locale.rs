//! Locale text store.
//!
//! UI copy lives in an embedded JSON resource keyed `locale → key → text`.
//! It is parsed once on first use and shared for the life of the process.

use std::collections::HashMap;
use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::Result;

const TEXTS_JSON: &str = include_str!("../locales/texts.json");

static TEXTS: OnceLock<LocaleTable> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Sv,
    En,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::Sv => "sv",
            Locale::En => "en",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().split(['-', '_']).next() {
            Some("sv") => Some(Locale::Sv),
            Some("en") => Some(Locale::En),
            _ => None,
        }
    }

    pub fn all() -> &'static [Locale] {
        &[Locale::Sv, Locale::En]
    }

    pub fn label(&self) -> &str {
        match self {
            Locale::Sv => "Svenska",
            Locale::En => "English",
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Sv
    }
}

/// Immutable `locale → key → text` table
#[derive(Debug, Clone, Default)]
pub struct LocaleTable {
    tables: HashMap<String, HashMap<String, String>>,
}

impl LocaleTable {
    pub fn parse(json: &str) -> Result<Self> {
        let tables: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)?;
        Ok(Self { tables })
    }

    /// Look up `key` for `locale`, falling back to Swedish and then to the
    /// key itself so a missing entry is visible rather than blank.
    pub fn get<'a>(&'a self, locale: Locale, key: &'a str) -> &'a str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(Locale::Sv, key))
            .unwrap_or(key)
    }

    pub fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.tables
            .get(locale.tag())
            .and_then(|t| t.get(key))
            .map(String::as_str)
    }

    pub fn keys(&self, locale: Locale) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .tables
            .get(locale.tag())
            .map(|t| t.keys().map(String::as_str).collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }
}

/// The process-wide table parsed from the embedded resource.
pub fn texts() -> &'static LocaleTable {
    TEXTS.get_or_init(|| LocaleTable::parse(TEXTS_JSON).unwrap_or_default())
}

/// Shorthand for `texts().get(locale, key)`.
pub fn text(locale: Locale, key: &str) -> &str {
    texts().get(locale, key)
}
