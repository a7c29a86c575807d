//! Static language to font lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbol fonts that are never replaced by a language font.
pub const PRESERVED_FONTS: &[&str] = &[
    "Symbol",
    "Wingdings",
    "Wingdings 2",
    "Wingdings 3",
    "Webdings",
    "Marlett",
];

/// Whether a run's explicit font must survive a font override.
pub fn is_preserved_font(font: &str) -> bool {
    PRESERVED_FONTS
        .iter()
        .any(|preserved| preserved.eq_ignore_ascii_case(font.trim()))
}

/// Maps language codes to the font used for translated runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontMap {
    fonts: BTreeMap<String, String>,
}

impl Default for FontMap {
    fn default() -> Self {
        let fonts = [
            ("ko", "Malgun Gothic"),
            ("ja", "Yu Gothic"),
            ("zh", "Microsoft YaHei"),
            ("zh-cn", "Microsoft YaHei"),
            ("zh-tw", "Microsoft JhengHei"),
            ("en", "Arial"),
        ]
        .into_iter()
        .map(|(lang, font)| (lang.to_string(), font.to_string()))
        .collect();

        Self { fonts }
    }
}

impl FontMap {
    /// A map with no entries; fonts are never overridden.
    pub fn empty() -> Self {
        Self {
            fonts: BTreeMap::new(),
        }
    }

    /// Add or replace the font for a language.
    pub fn with_font(mut self, language: &str, font: impl Into<String>) -> Self {
        self.fonts.insert(normalize_code(language), font.into());
        self
    }

    /// Remove the entry for a language.
    pub fn without(mut self, language: &str) -> Self {
        self.fonts.remove(&normalize_code(language));
        self
    }

    /// Font for a language code; a regional code falls back to its primary subtag.
    pub fn lookup(&self, language: &str) -> Option<&str> {
        let code = normalize_code(language);
        if let Some(font) = self.fonts.get(&code) {
            return Some(font.as_str());
        }

        let primary = code.split('-').next().unwrap_or_default();
        self.fonts.get(primary).map(String::as_str)
    }
}

fn normalize_code(language: &str) -> String {
    language.trim().replace('_', "-").to_lowercase()
}
