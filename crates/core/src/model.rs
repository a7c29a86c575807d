//! Language-neutral model of the formatting structure of a text frame.
//!
//! The model carries everything needed to rewrite a paragraph after its text
//! has been replaced: modeled fields for what the updater reasons about, and
//! verbatim attribute/element bags for everything else.

use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// Logical form of a `br` element inside paragraph text.
pub const LINE_BREAK: char = '\u{000B}';

/// A run color. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpec {
    /// Direct 24-bit color (`srgbClr`), hex digits as written.
    Rgb { hex: String },
    /// Theme color with brightness adjustment (`schemeClr` + `lumMod`/`lumOff`).
    /// Values are in thousandths of a percent, as stored in the markup.
    Theme {
        name: String,
        lum_mod: Option<i32>,
        lum_off: Option<i32>,
    },
    /// Plain color scheme slot (`schemeClr` without adjustments).
    Scheme { name: String },
}

/// Bullet definition of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BulletSpec {
    /// No bullet element present; the bullet comes from the layout or master.
    #[default]
    Inherit,
    /// Explicit `buNone`.
    None,
    /// Character bullet with an optional bullet typeface.
    Char {
        character: String,
        font: Option<String>,
    },
    /// Auto-numbered bullet.
    AutoNum {
        scheme: String,
        start_at: Option<u32>,
    },
}

impl BulletSpec {
    /// Whether this paragraph explicitly draws a bullet glyph or number.
    pub fn is_visible(&self) -> bool {
        matches!(self, BulletSpec::Char { .. } | BulletSpec::AutoNum { .. })
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    #[default]
    Inherit,
}

impl Alignment {
    /// Parse an `algn` attribute value. Values outside the modeled set yield `None`.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" => Some(Self::Justify),
            _ => None,
        }
    }

    /// The `algn` attribute value, or `None` for `Inherit`.
    pub fn as_attribute(&self) -> Option<&'static str> {
        match self {
            Self::Left => Some("l"),
            Self::Center => Some("ctr"),
            Self::Right => Some("r"),
            Self::Justify => Some("just"),
            Self::Inherit => None,
        }
    }
}

/// Paragraph spacing in raw markup units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spacing {
    /// `spcPct`, thousandths of a percent.
    Percent(i32),
    /// `spcPts`, hundredths of a point.
    Points(i32),
}

/// Ordered bag of attributes that the model does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttributeBag(Vec<(String, String)>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Character formatting of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunFormat {
    /// Latin typeface; `None` means inherit.
    pub font_name: Option<String>,
    /// Size in hundredths of a point.
    pub size: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<ColorSpec>,
    /// Relationship id of the click hyperlink.
    pub hyperlink: Option<String>,
    /// Unmodeled `rPr` attributes, verbatim.
    pub raw_attributes: AttributeBag,
    /// Unmodeled `rPr` children, verbatim. `latin` and `hlinkClick` are kept
    /// here too and receive the modeled typeface/target on re-application.
    pub preserved: Vec<XmlElement>,
    /// Whether the source run had an `rPr` element at all.
    pub has_properties: bool,
}

impl RunFormat {
    /// The same format without a hyperlink.
    pub fn without_hyperlink(&self) -> Self {
        let mut format = self.clone();
        format.hyperlink = None;
        format.preserved.retain(|e| e.local_name() != "hlinkClick");
        format
    }
}

/// What kind of paragraph child a run came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunKind {
    /// Regular text run (`r`).
    Text,
    /// Soft line break (`br`); its text is [`LINE_BREAK`].
    LineBreak,
    /// Field (`fld`), kept verbatim and never translated.
    Field { element: XmlElement },
}

/// A span of uniformly formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub text: String,
    pub format: RunFormat,
    pub kind: RunKind,
}

impl RunInfo {
    /// A text run with the given format.
    pub fn text(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
            kind: RunKind::Text,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, RunKind::Text)
    }

    pub fn is_hyperlink(&self) -> bool {
        self.is_text() && self.format.hyperlink.is_some()
    }
}

/// Formatting structure of one paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphInfo {
    /// `lvl`, 0-based; `None` when not set on the paragraph.
    pub indent_level: Option<u32>,
    pub alignment: Alignment,
    /// `marL`, raw EMU, copied as-is.
    pub margin_left: Option<i64>,
    /// `indent`, raw EMU, copied as-is.
    pub indent_first_line: Option<i64>,
    pub space_before: Option<Spacing>,
    pub space_after: Option<Spacing>,
    pub line_spacing: Option<Spacing>,
    pub bullet: BulletSpec,
    pub runs: Vec<RunInfo>,
    /// Unmodeled `pPr` attributes, verbatim.
    pub raw_attributes: AttributeBag,
    /// Unmodeled `pPr` children, verbatim (`buFont` receives the modeled
    /// bullet typeface on re-application).
    pub preserved: Vec<XmlElement>,
    /// Whether the source paragraph had a `pPr` element at all.
    pub has_properties: bool,
    /// The `endParaRPr` element, verbatim.
    pub end_properties: Option<XmlElement>,
}

impl ParagraphInfo {
    /// The logical text of the paragraph: every run, fields included.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// The text sent for translation: fields are left out.
    pub fn translatable_text(&self) -> String {
        self.runs
            .iter()
            .filter(|r| !matches!(r.kind, RunKind::Field { .. }))
            .map(|r| r.text.as_str())
            .collect()
    }

    /// Level used for complexity checks (absent `lvl` is level 0).
    pub fn level(&self) -> u32 {
        self.indent_level.unwrap_or(0)
    }

    /// Format of the first text run, if any.
    pub fn first_text_format(&self) -> Option<&RunFormat> {
        self.runs.iter().find(|r| r.is_text()).map(|r| &r.format)
    }

    pub fn has_hyperlinks(&self) -> bool {
        self.runs.iter().any(RunInfo::is_hyperlink)
    }

    /// Number of line breaks between text segments.
    pub fn line_break_count(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r.kind, RunKind::LineBreak))
            .count()
    }

    /// A copy with the same paragraph-level formatting and no runs.
    pub fn formatting_template(&self) -> Self {
        Self {
            runs: Vec::new(),
            ..self.clone()
        }
    }
}

/// Ordered paragraphs of one text frame. Rebuilt per extraction, never cached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextFrameStructure {
    pub paragraphs: Vec<ParagraphInfo>,
}

impl TextFrameStructure {
    pub fn new(paragraphs: Vec<ParagraphInfo>) -> Self {
        Self { paragraphs }
    }

    /// Logical text with paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(ParagraphInfo::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Translatable text with paragraphs joined by newlines.
    pub fn translatable_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(ParagraphInfo::translatable_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_hyperlinks(&self) -> bool {
        self.paragraphs.iter().any(ParagraphInfo::has_hyperlinks)
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> RunInfo {
        RunInfo::text(text, RunFormat::default())
    }

    #[test]
    fn test_alignment_attribute_mapping() {
        assert_eq!(Alignment::from_attribute("ctr"), Some(Alignment::Center));
        assert_eq!(Alignment::from_attribute("dist"), None);
        assert_eq!(Alignment::Justify.as_attribute(), Some("just"));
        assert_eq!(Alignment::Inherit.as_attribute(), None);
    }

    #[test]
    fn test_attribute_bag_keeps_order_and_replaces() {
        let mut bag = AttributeBag::new();
        bag.insert("lang", "en-US");
        bag.insert("dirty", "0");
        bag.insert("lang", "ko-KR");
        let entries: Vec<_> = bag.iter().collect();
        assert_eq!(entries, vec![("lang", "ko-KR"), ("dirty", "0")]);
    }

    #[test]
    fn test_translatable_text_skips_fields() {
        let para = ParagraphInfo {
            runs: vec![
                run("Slide "),
                RunInfo {
                    text: "3".to_string(),
                    format: RunFormat::default(),
                    kind: RunKind::Field {
                        element: XmlElement::new("a:fld"),
                    },
                },
            ],
            ..Default::default()
        };
        assert_eq!(para.text(), "Slide 3");
        assert_eq!(para.translatable_text(), "Slide ");
    }

    #[test]
    fn test_frame_text_joins_paragraphs() {
        let frame = TextFrameStructure::new(vec![
            ParagraphInfo {
                runs: vec![run("One")],
                ..Default::default()
            },
            ParagraphInfo {
                runs: vec![run("Two"), run(" more")],
                ..Default::default()
            },
        ]);
        assert_eq!(frame.text(), "One\nTwo more");
        assert!(!frame.has_hyperlinks());
    }

    #[test]
    fn test_bullet_visibility() {
        assert!(!BulletSpec::Inherit.is_visible());
        assert!(!BulletSpec::None.is_visible());
        assert!(BulletSpec::AutoNum {
            scheme: "arabicPeriod".to_string(),
            start_at: None
        }
        .is_visible());
    }
}
