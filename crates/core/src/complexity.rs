//! Structural complexity of text frames.

use crate::model::{ColorSpec, TextFrameStructure};
use serde::Serialize;
use std::collections::HashSet;

/// Complexity signals derived from a [`TextFrameStructure`]. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ComplexityScore {
    /// Some paragraph sits above level 0.
    pub has_indent: bool,
    /// Some paragraph draws an explicit bullet or number.
    pub has_bullets: bool,
    /// Distinct explicit colors across text runs.
    pub color_variety: usize,
    /// Distinct (bold, italic, font) combinations across text runs.
    pub style_variety: usize,
}

impl ComplexityScore {
    /// Score a frame.
    pub fn of(structure: &TextFrameStructure) -> Self {
        let mut colors: HashSet<&ColorSpec> = HashSet::new();
        let mut styles: HashSet<(Option<bool>, Option<bool>, Option<&str>)> = HashSet::new();

        for run in structure
            .paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .filter(|r| r.is_text())
        {
            if let Some(color) = &run.format.color {
                colors.insert(color);
            }
            styles.insert((
                run.format.bold,
                run.format.italic,
                run.format.font_name.as_deref(),
            ));
        }

        Self {
            has_indent: structure.paragraphs.iter().any(|p| p.level() > 0),
            has_bullets: structure.paragraphs.iter().any(|p| p.bullet.is_visible()),
            color_variety: colors.len(),
            style_variety: styles.len(),
        }
    }

    /// Whether a frame needs its own request to keep text and formatting aligned.
    pub fn is_complex(&self) -> bool {
        self.has_bullets || self.has_indent || self.color_variety > 1 || self.style_variety > 1
    }
}

/// Shorthand for `ComplexityScore::of(structure).is_complex()`.
pub fn is_complex(structure: &TextFrameStructure) -> bool {
    ComplexityScore::of(structure).is_complex()
}
