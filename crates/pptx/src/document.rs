//! Presentation-level view over a package: ordered slides and their notes.

use crate::package::PptxPackage;
use crate::rels::{notes_part_for, slide_order};
use crate::slide::{find_notes_body, find_text_frames, frame_texts};
use pptx_translate_core::{
    Error, FormattingExtractor, FrameKind, LocationHandle, Result, TextFrameStructure,
};
use serde::Serialize;
use std::path::Path;

/// Default preview length used by [`PptxDocument::slide_preview`] callers.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// A slide part and its notes part, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideEntry {
    pub part: String,
    pub notes: Option<String>,
}

/// A text frame of a slide as the extractor sees it.
#[derive(Debug, Clone, Serialize)]
pub struct InspectedFrame {
    pub kind: FrameKind,
    pub handle: LocationHandle,
    pub structure: TextFrameStructure,
}

/// An opened presentation.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    package: PptxPackage,
    slides: Vec<SlideEntry>,
}

impl PptxDocument {
    /// Open a presentation from disk.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_package(PptxPackage::open(path)?)
    }

    /// Read a presentation from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_package(PptxPackage::from_bytes(bytes)?)
    }

    /// Resolve slide order and notes for a package.
    pub fn from_package(package: PptxPackage) -> Result<Self> {
        let mut slides = Vec::new();
        for part in slide_order(&package)? {
            let notes = notes_part_for(&package, &part)?;
            slides.push(SlideEntry { part, notes });
        }

        log::debug!("Presentation has {} slide(s)", slides.len());
        Ok(Self { package, slides })
    }

    pub fn package(&self) -> &PptxPackage {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut PptxPackage {
        &mut self.package
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[SlideEntry] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Slide by 1-based number.
    pub fn slide(&self, number: usize) -> Result<&SlideEntry> {
        if number == 0 || number > self.slides.len() {
            return Err(Error::InvalidSlide {
                number,
                count: self.slides.len(),
            });
        }
        Ok(&self.slides[number - 1])
    }

    /// Short text summary of a slide.
    ///
    /// Frame texts are joined with " | ", notes are appended as
    /// `[Notes: ...]`, and the result is cut to `max_chars` characters.
    pub fn slide_preview(&self, number: usize, max_chars: usize) -> Result<String> {
        let entry = self.slide(number)?;
        let extractor = FormattingExtractor::new();

        let slide = self.package.read_xml(&entry.part)?;
        let mut texts = frame_texts(&slide.root, &extractor);

        if let Some(notes_part) = &entry.notes {
            let notes = self.package.read_xml(notes_part)?;
            let notes_text = find_notes_body(&notes.root)
                .and_then(|path| notes.root.descendant(&path))
                .and_then(|body| extractor.extract_frame(body).ok())
                .map(|structure| structure.text())
                .unwrap_or_default();
            let notes_text = notes_text.trim();
            if !notes_text.is_empty() {
                texts.push(format!("[Notes: {}]", notes_text));
            }
        }

        let preview = texts.join(" | ");
        if preview.is_empty() {
            return Ok("[No text content found]".to_string());
        }
        if preview.chars().count() > max_chars {
            let truncated: String = preview.chars().take(max_chars).collect();
            return Ok(format!("{}...", truncated));
        }
        Ok(preview)
    }

    /// Extracted structure of every text frame on a slide and its notes body.
    pub fn inspect_slide(&self, number: usize) -> Result<Vec<InspectedFrame>> {
        let entry = self.slide(number)?;
        let extractor = FormattingExtractor::new();
        let mut frames = Vec::new();

        let slide = self.package.read_xml(&entry.part)?;
        let part = self.part_index(&entry.part)?;
        for location in find_text_frames(&slide.root) {
            if let Some(frame) = slide.root.descendant(&location.path) {
                frames.push(InspectedFrame {
                    kind: location.kind,
                    structure: extractor.extract_frame(frame)?,
                    handle: LocationHandle::new(part, location.path),
                });
            }
        }

        if let Some(notes_part) = &entry.notes {
            let notes = self.package.read_xml(notes_part)?;
            let part = self.part_index(notes_part)?;
            if let Some(path) = find_notes_body(&notes.root) {
                if let Some(frame) = notes.root.descendant(&path) {
                    frames.push(InspectedFrame {
                        kind: FrameKind::Notes,
                        structure: extractor.extract_frame(frame)?,
                        handle: LocationHandle::new(part, path),
                    });
                }
            }
        }

        Ok(frames)
    }

    /// Index of a part in the package, used as [`LocationHandle::part`].
    pub fn part_index(&self, part: &str) -> Result<usize> {
        self.package
            .index_of(part)
            .ok_or_else(|| Error::CorruptedFile(format!("part '{}' is missing", part)))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.package.save(path)
    }
}
