//! Structure-preserving text substitution for DrawingML text frames.
//!
//! Text frames are read into a [`TextFrameStructure`], translated through a
//! [`TranslationBackend`] with a per-slide [`Strategy`], and written back by a
//! [`TextFrameUpdater`] that keeps every formatting attribute it did not change.

pub mod apply;
pub mod backend;
pub mod complexity;
pub mod config;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod model;
pub mod split;
pub mod strategy;
pub mod text;
pub mod types;
pub mod updater;
pub mod xml;

pub use apply::FormattingApplier;
pub use backend::{
    BackendError, SegmentRequest, TranslatedSegment, TranslationBackend, TranslationRequest,
};
pub use complexity::{is_complex, ComplexityScore};
pub use config::TranslatorConfig;
pub use error::{Error, Result};
pub use extract::FormattingExtractor;
pub use fonts::FontMap;
pub use model::{
    Alignment, AttributeBag, BulletSpec, ColorSpec, ParagraphInfo, RunFormat, RunInfo, RunKind,
    Spacing, TextFrameStructure,
};
pub use split::SplitPolicy;
pub use strategy::{SlideTranslation, Strategy, StrategySelector};
pub use text::{clean_translation, TextFilter};
pub use types::{FrameKind, LocationHandle, TranslationResult, TranslationUnit};
pub use updater::{FrameUpdate, TextFrameUpdater, UpdateMode};
pub use xml::{XmlDocument, XmlElement, XmlNode};
