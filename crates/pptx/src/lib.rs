//! PPTX (Office Open XML) document accessor and translation driver.
//!
//! A .pptx file is a ZIP archive of XML parts. [`PptxPackage`] keeps every
//! entry in memory so untouched parts are written back unchanged,
//! [`PptxDocument`] resolves slide order and speaker notes, and
//! [`PresentationTranslator`] runs the core engine over each slide.

pub mod document;
pub mod package;
pub mod rels;
pub mod slide;
pub mod translator;

#[cfg(test)]
pub(crate) mod test_support;

pub use document::{InspectedFrame, PptxDocument, SlideEntry, DEFAULT_PREVIEW_CHARS};
pub use package::{PptxPackage, PRESENTATION_PART};
pub use rels::Relationship;
pub use slide::FrameLocation;
pub use translator::PresentationTranslator;
