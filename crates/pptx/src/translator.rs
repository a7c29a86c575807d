//! Presentation-level translation driver.

use crate::document::PptxDocument;
use crate::slide::{count_shapes, find_notes_body, find_text_frames, FrameLocation};
use pptx_translate_core::{
    FormattingExtractor, FrameKind, LocationHandle, Result, StrategySelector, TextFilter,
    TextFrameUpdater, TranslationBackend, TranslationResult, TranslationUnit, TranslatorConfig,
    XmlElement,
};
use std::path::Path;

/// Translates the slides of a presentation through a [`TranslationBackend`].
pub struct PresentationTranslator<'a> {
    config: TranslatorConfig,
    backend: &'a dyn TranslationBackend,
    extractor: FormattingExtractor,
    filter: TextFilter,
    selector: StrategySelector,
    updater: TextFrameUpdater,
}

impl<'a> PresentationTranslator<'a> {
    pub fn new(config: TranslatorConfig, backend: &'a dyn TranslationBackend) -> Self {
        let updater = TextFrameUpdater::new(config.split_policy)
            .with_font_override(config.target_font().map(str::to_string));

        Self {
            selector: StrategySelector::from_config(&config),
            extractor: FormattingExtractor::new(),
            filter: TextFilter::new(),
            updater,
            config,
            backend,
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate every slide of `input` and write the result to `output`.
    pub fn translate_presentation(&self, input: &Path, output: &Path) -> Result<TranslationResult> {
        let mut document = PptxDocument::open(input)?;
        let result = self.translate_document(&mut document);
        document.save(output)?;

        log::info!(
            "Translation completed: {} text(s), {} note(s), {} shape(s), {} error(s)",
            result.translated_count,
            result.translated_notes_count,
            result.total_shapes,
            result.errors.len()
        );
        Ok(result)
    }

    /// Translate the given 1-based slides of `input` and write the result to `output`.
    ///
    /// When any number is out of range nothing is translated or written and
    /// the result carries a single error.
    pub fn translate_slides(
        &self,
        input: &Path,
        output: &Path,
        numbers: &[usize],
    ) -> Result<TranslationResult> {
        let mut document = PptxDocument::open(input)?;
        let result = self.translate_selected(&mut document, numbers);
        if invalid_numbers(&document, numbers).is_empty() {
            document.save(output)?;
        }
        Ok(result)
    }

    /// Translate all slides of an opened document in place.
    pub fn translate_document(&self, document: &mut PptxDocument) -> TranslationResult {
        let numbers: Vec<usize> = (1..=document.slide_count()).collect();
        self.translate_numbers(document, &numbers)
    }

    /// Translate selected slides of an opened document in place.
    pub fn translate_selected(&self, document: &mut PptxDocument, numbers: &[usize]) -> TranslationResult {
        let invalid = invalid_numbers(document, numbers);
        if !invalid.is_empty() {
            let mut result = TranslationResult::new();
            result.add_error(format!(
                "Invalid slide numbers: {:?}. Valid range: 1-{}",
                invalid,
                document.slide_count()
            ));
            return result;
        }

        let mut numbers = numbers.to_vec();
        numbers.sort_unstable();
        numbers.dedup();
        self.translate_numbers(document, &numbers)
    }

    fn translate_numbers(&self, document: &mut PptxDocument, numbers: &[usize]) -> TranslationResult {
        let mut result = TranslationResult::new();
        let total = document.slide_count();

        for &number in numbers {
            log::info!("Processing slide {}/{}", number, total);
            let slide_result = self.translate_slide(document, number);
            log::info!(
                "Slide {}: {} text(s) translated",
                number,
                slide_result.translated_count
            );
            result.merge(slide_result);
        }

        result
    }

    fn translate_slide(&self, document: &mut PptxDocument, number: usize) -> TranslationResult {
        let mut result = TranslationResult::new();
        let label = format!("slide {}", number);

        let entry = match document.slide(number) {
            Ok(entry) => entry.clone(),
            Err(e) => {
                result.add_error(e.to_string());
                return result;
            }
        };

        match self.translate_part(document, &entry.part, &label, |root| {
            (find_text_frames(root), count_shapes(root))
        }) {
            Ok((translated, shapes, errors)) => {
                result.translated_count += translated;
                result.total_shapes += shapes;
                errors.into_iter().for_each(|e| result.add_error(e));
            }
            Err(e) => result.add_error(format!("{}: {}", label, e)),
        }

        let notes_part = entry.notes.as_deref().filter(|_| self.config.translate_notes);
        if let Some(notes_part) = notes_part {
            let label = format!("slide {} notes", number);
            let outcome = self.translate_part(document, notes_part, &label, |root| {
                let frames = find_notes_body(root)
                    .map(|path| FrameLocation {
                        path,
                        kind: FrameKind::Notes,
                    })
                    .into_iter()
                    .collect();
                (frames, 0)
            });

            match outcome {
                Ok((translated, _, errors)) => {
                    if translated > 0 {
                        result.translated_notes_count += 1;
                    }
                    errors.into_iter().for_each(|e| result.add_error(e));
                }
                Err(e) => result.add_error(format!("{}: {}", label, e)),
            }
        }

        result
    }

    /// Translate the frames `locate` finds in one part and write the part back.
    ///
    /// Returns the number of updated frames, the shape count reported by
    /// `locate` and the recovered errors.
    fn translate_part<F>(
        &self,
        document: &mut PptxDocument,
        part: &str,
        label: &str,
        locate: F,
    ) -> Result<(usize, usize, Vec<String>)>
    where
        F: Fn(&XmlElement) -> (Vec<FrameLocation>, usize),
    {
        let mut xml = document.package().read_xml(part)?;
        let part_index = document.part_index(part)?;
        let (locations, shapes) = locate(&xml.root);

        let mut errors = Vec::new();
        let mut units = Vec::new();
        let mut structures = Vec::new();

        for location in locations {
            let Some(frame) = xml.root.descendant(&location.path) else {
                continue;
            };
            let structure = match self.extractor.extract_frame(frame) {
                Ok(structure) => structure,
                Err(e) => {
                    errors.push(format!("{}: {}", label, e));
                    continue;
                }
            };

            let text = structure.translatable_text();
            if self.filter.should_skip(&text) {
                log::debug!("{}: skipping {:?} frame", label, location.kind);
                continue;
            }

            units.push(TranslationUnit::new(
                LocationHandle::new(part_index, location.path),
                text,
            ));
            structures.push(structure);
        }

        if units.is_empty() {
            return Ok((0, shapes, errors));
        }

        let translation = self.selector.translate_slide(
            self.backend,
            &self.config.target_language,
            &units,
            &structures,
        );
        errors.extend(translation.errors.into_iter().map(|e| format!("{}: {}", label, e)));

        let mut translated = 0;
        for (unit, text) in units.iter().zip(translation.translations) {
            let Some(text) = text else {
                continue;
            };
            if text.trim() == unit.source_text.trim() {
                log::debug!("{}: translation of {} is unchanged", label, unit.handle);
                continue;
            }
            let Some(frame) = xml.root.descendant_mut(&unit.handle.path) else {
                errors.push(format!("{}: no text frame at {}", label, unit.handle));
                continue;
            };

            match self.updater.update_frame(frame, &text) {
                Ok(update) => {
                    translated += 1;
                    errors.extend(update.errors.into_iter().map(|e| format!("{}: {}", label, e)));
                }
                Err(e) => errors.push(format!("{}: {}", label, e)),
            }
        }

        if translated > 0 {
            document.package_mut().write_xml(part, &xml)?;
        }

        Ok((translated, shapes, errors))
    }
}

fn invalid_numbers(document: &PptxDocument, numbers: &[usize]) -> Vec<usize> {
    numbers
        .iter()
        .copied()
        .filter(|&n| n == 0 || n > document.slide_count())
        .collect()
}
