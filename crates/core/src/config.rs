//! Translator configuration.

use crate::fonts::FontMap;
use crate::split::SplitPolicy;
use serde::{Deserialize, Serialize};

/// Default number of units above which a slide is translated with context.
pub const DEFAULT_CONTEXT_THRESHOLD: usize = 5;

/// Default maximum number of units per batch request.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Configuration for a translation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Target language code, e.g. `ko` or `pt-BR`.
    pub target_language: String,

    /// Slides with more units than this use the context strategy.
    pub context_threshold: usize,

    /// Maximum number of units per batch request.
    pub batch_size: usize,

    /// How translated text is split across runs.
    pub split_policy: SplitPolicy,

    /// Language to font lookup.
    pub fonts: FontMap,

    /// Whether speaker notes are translated as well.
    pub translate_notes: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            target_language: "en".to_string(),
            context_threshold: DEFAULT_CONTEXT_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            split_policy: SplitPolicy::default(),
            fonts: FontMap::default(),
            translate_notes: true,
        }
    }
}

impl TranslatorConfig {
    /// Configuration for the given target language with default settings.
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            ..Self::default()
        }
    }

    pub fn with_context_threshold(mut self, threshold: usize) -> Self {
        self.context_threshold = threshold;
        self
    }

    /// Set the batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_split_policy(mut self, policy: SplitPolicy) -> Self {
        self.split_policy = policy;
        self
    }

    pub fn with_fonts(mut self, fonts: FontMap) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_notes(mut self, translate_notes: bool) -> Self {
        self.translate_notes = translate_notes;
        self
    }

    /// Font configured for the target language, if any.
    pub fn target_font(&self) -> Option<&str> {
        self.fonts.lookup(&self.target_language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::new("ko");
        assert_eq!(config.context_threshold, 5);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.split_policy, SplitPolicy::WordBoundary);
        assert!(config.translate_notes);
        assert_eq!(config.target_font(), Some("Malgun Gothic"));
    }

    #[test]
    fn test_builder() {
        let config = TranslatorConfig::new("de")
            .with_context_threshold(2)
            .with_batch_size(0)
            .with_split_policy(SplitPolicy::Proportional)
            .with_notes(false);
        assert_eq!(config.context_threshold, 2);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.split_policy, SplitPolicy::Proportional);
        assert!(!config.translate_notes);
        assert_eq!(config.target_font(), None);
    }
}
