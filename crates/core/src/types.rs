//! Domain types shared between the engine and the document accessor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable back-reference to a text frame: an index path of child nodes
/// from the root of one document part down to the `txBody` element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationHandle {
    /// Index of the document part (slide or notes slide) in the accessor.
    pub part: usize,

    /// Child-node indices from the part's root element.
    pub path: Vec<usize>,
}

impl LocationHandle {
    /// Create a new handle.
    pub fn new(part: usize, path: Vec<usize>) -> Self {
        Self { part, path }
    }
}

impl fmt::Display for LocationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part {} /", self.part)?;
        for index in &self.path {
            write!(f, "{}/", index)?;
        }
        Ok(())
    }
}

/// What kind of container a text frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    /// A shape's text body.
    Shape,
    /// A table cell's text body.
    TableCell,
    /// The body placeholder of a notes slide.
    Notes,
}

/// One text frame whose text needs translation. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub handle: LocationHandle,

    /// The frame's translatable text, paragraphs joined with newlines.
    pub source_text: String,
}

impl TranslationUnit {
    /// Create a new unit.
    pub fn new(handle: LocationHandle, source_text: impl Into<String>) -> Self {
        Self {
            handle,
            source_text: source_text.into(),
        }
    }
}

/// Aggregate outcome of translating a presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Text frames on slides that received a translation.
    pub translated_count: usize,

    /// Speaker notes that received a translation.
    pub translated_notes_count: usize,

    /// Top-level shapes visited.
    pub total_shapes: usize,

    /// One human-readable entry per recoverable failure, in order of occurrence.
    pub errors: Vec<String>,
}

impl TranslationResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable failure.
    pub fn add_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        log::warn!("{}", error);
        self.errors.push(error);
    }

    /// Whether every unit was processed without a recorded failure.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: TranslationResult) {
        self.translated_count += other.translated_count;
        self.translated_notes_count += other.translated_notes_count;
        self.total_shapes += other.total_shapes;
        self.errors.extend(other.errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        let handle = LocationHandle::new(2, vec![0, 1, 3]);
        assert_eq!(handle.to_string(), "part 2 /0/1/3/");
    }

    #[test]
    fn test_result_merge() {
        let mut total = TranslationResult::new();
        total.translated_count = 2;
        total.add_error("slide 1: first");

        let mut other = TranslationResult::new();
        other.translated_count = 3;
        other.translated_notes_count = 1;
        other.total_shapes = 4;
        other.add_error("slide 2: second");

        total.merge(other);
        assert_eq!(total.translated_count, 5);
        assert_eq!(total.translated_notes_count, 1);
        assert_eq!(total.total_shapes, 4);
        assert_eq!(total.errors, vec!["slide 1: first", "slide 2: second"]);
        assert!(!total.is_clean());
    }
}
