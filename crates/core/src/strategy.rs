//! Chooses how the units of one slide are sent to the backend and merges
//! the answers back in unit order.

use crate::backend::{BackendError, SegmentRequest, TranslationBackend, TranslationRequest};
use crate::complexity::is_complex;
use crate::config::TranslatorConfig;
use crate::model::TextFrameStructure;
use crate::text::clean_translation;
use crate::types::TranslationUnit;
use crate::Error;
use serde::{Deserialize, Serialize};

/// How the units of a slide are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One request per unit.
    Individual,
    /// Requests of at most `batch_size` segments, each carrying its neighbours as context.
    Context,
    /// Units grouped into requests of at most `batch_size` segments.
    Batch,
}

/// Translated text for every unit of a slide, in unit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideTranslation {
    /// Strategy chosen for the slide (before any fallback).
    pub strategy: Strategy,
    /// `None` where the unit could not be translated; its text stays as is.
    pub translations: Vec<Option<String>>,
    /// One entry per unit that failed.
    pub errors: Vec<String>,
}

/// Picks a [`Strategy`] per slide and drives the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySelector {
    /// Slides with more units than this use [`Strategy::Context`].
    pub context_threshold: usize,
    /// Maximum segments per [`Strategy::Batch`] or [`Strategy::Context`] request.
    pub batch_size: usize,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl StrategySelector {
    pub fn new(context_threshold: usize, batch_size: usize) -> Self {
        Self {
            context_threshold,
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.context_threshold, config.batch_size)
    }

    /// Strategy for one slide. `structures` holds the extracted frame of each unit.
    pub fn select(&self, units: &[TranslationUnit], structures: &[TextFrameStructure]) -> Strategy {
        if structures.iter().any(is_complex) {
            Strategy::Individual
        } else if units.len() > self.context_threshold {
            Strategy::Context
        } else {
            Strategy::Batch
        }
    }

    /// Translate the units of one slide.
    ///
    /// A failed or mis-shaped batch/context request is retried unit by unit;
    /// a failed single-unit request leaves that unit untranslated.
    pub fn translate_slide(
        &self,
        backend: &dyn TranslationBackend,
        target_language: &str,
        units: &[TranslationUnit],
        structures: &[TextFrameStructure],
    ) -> SlideTranslation {
        let strategy = self.select(units, structures);
        log::info!("Translating {} unit(s) with {:?} strategy", units.len(), strategy);

        let mut translations = vec![None; units.len()];
        let mut errors = Vec::new();

        match strategy {
            Strategy::Individual => {
                for index in 0..units.len() {
                    translations[index] =
                        self.translate_one(backend, target_language, units, index, &mut errors);
                }
            }
            Strategy::Context | Strategy::Batch => {
                for (chunk_index, chunk) in units.chunks(self.batch_size).enumerate() {
                    let offset = chunk_index * self.batch_size;
                    let segments = chunk
                        .iter()
                        .enumerate()
                        .map(|(i, unit)| SegmentRequest {
                            id: offset + i,
                            text: unit.source_text.clone(),
                            // Hints look across chunk edges at the whole slide
                            context_hint: match strategy {
                                Strategy::Context => context_hint(units, offset + i),
                                _ => None,
                            },
                        })
                        .collect();
                    self.translate_group(
                        backend,
                        target_language,
                        strategy,
                        units,
                        offset,
                        segments,
                        &mut translations,
                        &mut errors,
                    );
                }
            }
        }

        SlideTranslation {
            strategy,
            translations,
            errors,
        }
    }

    /// One multi-segment request; on failure every unit in it is retried alone.
    #[allow(clippy::too_many_arguments)]
    fn translate_group(
        &self,
        backend: &dyn TranslationBackend,
        target_language: &str,
        strategy: Strategy,
        units: &[TranslationUnit],
        offset: usize,
        segments: Vec<SegmentRequest>,
        translations: &mut [Option<String>],
        errors: &mut Vec<String>,
    ) {
        let count = segments.len();
        let request = TranslationRequest {
            target_language: target_language.to_string(),
            strategy,
            segments,
        };

        match request_ordered(backend, &request) {
            Ok(texts) => {
                for (i, text) in texts.iter().enumerate() {
                    let index = offset + i;
                    translations[index] = match clean_translation(text) {
                        Some(cleaned) => Some(cleaned),
                        None => self.translate_one(backend, target_language, units, index, errors),
                    };
                }
            }
            Err(e) => {
                log::warn!(
                    "{:?} request for {} unit(s) failed ({}); retrying individually",
                    strategy,
                    count,
                    e
                );
                for index in offset..offset + count {
                    translations[index] =
                        self.translate_one(backend, target_language, units, index, errors);
                }
            }
        }
    }

    fn translate_one(
        &self,
        backend: &dyn TranslationBackend,
        target_language: &str,
        units: &[TranslationUnit],
        index: usize,
        errors: &mut Vec<String>,
    ) -> Option<String> {
        let request = TranslationRequest {
            target_language: target_language.to_string(),
            strategy: Strategy::Individual,
            segments: vec![SegmentRequest {
                id: index,
                text: units[index].source_text.clone(),
                context_hint: None,
            }],
        };

        let result = request_ordered(backend, &request).and_then(|texts| {
            texts
                .first()
                .and_then(|text| clean_translation(text))
                .ok_or_else(|| BackendError::Failure("empty translation".to_string()))
        });

        match result {
            Ok(text) => Some(text),
            Err(e) => {
                errors.push(format!("text frame {}: {}", index + 1, Error::Backend(e)));
                None
            }
        }
    }
}

/// Send a request and return the segment texts in request order.
///
/// A response whose ids do not match the request one to one is a failure.
fn request_ordered(
    backend: &dyn TranslationBackend,
    request: &TranslationRequest,
) -> Result<Vec<String>, BackendError> {
    let response = backend.translate(request)?;

    if response.len() != request.segments.len() {
        return Err(BackendError::Failure(format!(
            "expected {} segment(s), got {}",
            request.segments.len(),
            response.len()
        )));
    }

    let mut texts: Vec<Option<String>> = vec![None; request.segments.len()];
    for segment in response {
        let position = request
            .segments
            .iter()
            .position(|s| s.id == segment.id)
            .ok_or_else(|| BackendError::Failure(format!("unknown segment id {}", segment.id)))?;
        if texts[position].is_some() {
            return Err(BackendError::Failure(format!(
                "duplicate segment id {}",
                segment.id
            )));
        }
        texts[position] = Some(segment.text);
    }

    Ok(texts.into_iter().flatten().collect())
}

/// Source text of the neighbouring units.
fn context_hint(units: &[TranslationUnit], index: usize) -> Option<String> {
    let previous = index.checked_sub(1).map(|i| units[i].source_text.as_str());
    let next = units.get(index + 1).map(|u| u.source_text.as_str());

    let hint = previous
        .into_iter()
        .chain(next)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if hint.is_empty() {
        None
    } else {
        Some(hint)
    }
}
