//! Reads DrawingML text frames into a [`TextFrameStructure`].
//!
//! Absence of a property never fails; only a property that is present but
//! malformed (an unparsable number, a run without a text element) does.

use crate::model::{
    Alignment, AttributeBag, BulletSpec, ColorSpec, ParagraphInfo, RunFormat, RunInfo, RunKind,
    Spacing, TextFrameStructure, LINE_BREAK,
};
use crate::xml::XmlElement;
use crate::{Error, Result};

/// Extracts the formatting-relevant structure of text frames. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingExtractor;

impl FormattingExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract every paragraph of a `txBody`-like element.
    pub fn extract_frame(&self, frame: &XmlElement) -> Result<TextFrameStructure> {
        let mut paragraphs = Vec::new();

        for (index, paragraph) in frame.children_named("p").enumerate() {
            let info = self.extract_paragraph(paragraph).map_err(|e| match e {
                Error::ExtractionError(msg) => {
                    Error::ExtractionError(format!("paragraph {}: {}", index + 1, msg))
                }
                other => other,
            })?;
            paragraphs.push(info);
        }

        Ok(TextFrameStructure::new(paragraphs))
    }

    /// Extract a single `p` element.
    pub fn extract_paragraph(&self, paragraph: &XmlElement) -> Result<ParagraphInfo> {
        let mut info = ParagraphInfo::default();

        if let Some(p_pr) = paragraph.child("pPr") {
            self.extract_paragraph_properties(p_pr, &mut info)?;
        }

        for (index, child) in paragraph.elements().enumerate() {
            match child.local_name() {
                "r" => {
                    let text = child.child("t").ok_or_else(|| {
                        Error::ExtractionError(format!("run {} has no text element", index + 1))
                    })?;
                    let format = self.extract_run_format(child.child("rPr"))?;
                    info.runs.push(RunInfo::text(text.text(), format));
                }
                "br" => {
                    let format = self.extract_run_format(child.child("rPr"))?;
                    info.runs.push(RunInfo {
                        text: LINE_BREAK.to_string(),
                        format,
                        kind: RunKind::LineBreak,
                    });
                }
                "fld" => {
                    let format = self.extract_run_format(child.child("rPr"))?;
                    let text = child.child("t").map(XmlElement::text).unwrap_or_default();
                    info.runs.push(RunInfo {
                        text,
                        format,
                        kind: RunKind::Field {
                            element: child.clone(),
                        },
                    });
                }
                "endParaRPr" => {
                    info.end_properties = Some(child.clone());
                }
                "pPr" => {}
                other => {
                    log::debug!("Ignoring unmodeled paragraph child <{}>", other);
                }
            }
        }

        Ok(info)
    }

    fn extract_paragraph_properties(&self, p_pr: &XmlElement, info: &mut ParagraphInfo) -> Result<()> {
        info.has_properties = true;

        for (key, value) in &p_pr.attributes {
            match key.as_str() {
                "lvl" => info.indent_level = Some(parse_number(key, value)?),
                "marL" => info.margin_left = Some(parse_number(key, value)?),
                "indent" => info.indent_first_line = Some(parse_number(key, value)?),
                "algn" => match Alignment::from_attribute(value) {
                    Some(alignment) => info.alignment = alignment,
                    None => info.raw_attributes.insert(key.as_str(), value.as_str()),
                },
                _ => info.raw_attributes.insert(key.as_str(), value.as_str()),
            }
        }

        let mut bu_none = false;
        let mut bu_char = None;
        let mut bu_auto_num = None;
        let mut bullet_font = None;

        for child in p_pr.elements() {
            match child.local_name() {
                "lnSpc" | "spcBef" | "spcAft" => match extract_spacing(child)? {
                    Some(spacing) => match child.local_name() {
                        "lnSpc" => info.line_spacing = Some(spacing),
                        "spcBef" => info.space_before = Some(spacing),
                        _ => info.space_after = Some(spacing),
                    },
                    None => info.preserved.push(child.clone()),
                },
                "buNone" => bu_none = true,
                "buChar" => {
                    let character = child.attribute("char").ok_or_else(|| {
                        Error::ExtractionError("buChar without a char attribute".to_string())
                    })?;
                    bu_char = Some(character.to_string());
                }
                "buAutoNum" => {
                    let scheme = child.attribute("type").ok_or_else(|| {
                        Error::ExtractionError("buAutoNum without a type attribute".to_string())
                    })?;
                    let start_at = child
                        .attribute("startAt")
                        .map(|v| parse_number("startAt", v))
                        .transpose()?;
                    bu_auto_num = Some((scheme.to_string(), start_at));
                }
                "buFont" => {
                    bullet_font = child.attribute("typeface").map(str::to_string);
                    info.preserved.push(child.clone());
                }
                _ => info.preserved.push(child.clone()),
            }
        }

        // Priority: explicit no-bullet, then character, then auto-numbering
        info.bullet = if bu_none {
            BulletSpec::None
        } else if let Some(character) = bu_char {
            BulletSpec::Char {
                character,
                font: bullet_font,
            }
        } else if let Some((scheme, start_at)) = bu_auto_num {
            BulletSpec::AutoNum { scheme, start_at }
        } else {
            BulletSpec::Inherit
        };

        Ok(())
    }

    /// Extract a run's formatting from its (optional) `rPr` element.
    pub fn extract_run_format(&self, r_pr: Option<&XmlElement>) -> Result<RunFormat> {
        let r_pr = match r_pr {
            Some(r_pr) => r_pr,
            None => return Ok(RunFormat::default()),
        };

        let mut format = RunFormat {
            has_properties: true,
            ..RunFormat::default()
        };
        let mut raw = AttributeBag::new();

        for (key, value) in &r_pr.attributes {
            match key.as_str() {
                "sz" => format.size = Some(parse_number(key, value)?),
                "b" => format.bold = Some(parse_flag(key, value)?),
                "i" => format.italic = Some(parse_flag(key, value)?),
                _ => raw.insert(key.as_str(), value.as_str()),
            }
        }
        format.raw_attributes = raw;

        for child in r_pr.elements() {
            match child.local_name() {
                "solidFill" if format.color.is_none() => match extract_color(child)? {
                    Some(color) => format.color = Some(color),
                    None => format.preserved.push(child.clone()),
                },
                "latin" => {
                    format.font_name = child.attribute("typeface").map(str::to_string);
                    format.preserved.push(child.clone());
                }
                "hlinkClick" => {
                    // Action-only links carry no relationship id
                    format.hyperlink = child.attribute_by_local("id").map(|(_, v)| v.to_string());
                    format.preserved.push(child.clone());
                }
                _ => format.preserved.push(child.clone()),
            }
        }

        Ok(format)
    }
}

/// Spacing with a single `spcPct`/`spcPts` child; anything else is left unmodeled.
fn extract_spacing(element: &XmlElement) -> Result<Option<Spacing>> {
    let mut children = element.elements();
    let value = match (children.next(), children.next()) {
        (Some(value), None) => value,
        _ => return Ok(None),
    };

    if value.attributes.len() != 1 || value.elements().next().is_some() {
        return Ok(None);
    }

    let raw = match value.attribute("val") {
        Some(raw) => raw,
        None => return Ok(None),
    };

    match value.local_name() {
        "spcPct" => Ok(Some(Spacing::Percent(parse_number("spcPct", raw)?))),
        "spcPts" => Ok(Some(Spacing::Points(parse_number("spcPts", raw)?))),
        _ => Ok(None),
    }
}

/// Color of a `solidFill`, in priority order RGB, theme with brightness, scheme.
///
/// Fills carrying transforms the model does not represent return `None` and
/// are kept verbatim by the caller.
fn extract_color(fill: &XmlElement) -> Result<Option<ColorSpec>> {
    let mut children = fill.elements();
    let color = match (children.next(), children.next()) {
        (Some(color), None) => color,
        _ => return Ok(None),
    };

    if color.attributes.len() != 1 {
        return Ok(None);
    }

    match color.local_name() {
        "srgbClr" => {
            if color.elements().next().is_some() {
                return Ok(None);
            }
            let hex = color.attribute("val").ok_or_else(|| {
                Error::ExtractionError("srgbClr without a val attribute".to_string())
            })?;
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::ExtractionError(format!(
                    "invalid RGB color value '{}'",
                    hex
                )));
            }
            Ok(Some(ColorSpec::Rgb {
                hex: hex.to_string(),
            }))
        }
        "schemeClr" => {
            let name = color.attribute("val").ok_or_else(|| {
                Error::ExtractionError("schemeClr without a val attribute".to_string())
            })?;

            let mut lum_mod = None;
            let mut lum_off = None;

            for adjustment in color.elements() {
                if adjustment.attributes.len() != 1 || !adjustment.children.is_empty() {
                    return Ok(None);
                }
                let val = match adjustment.attribute("val") {
                    Some(val) => val,
                    None => return Ok(None),
                };
                match adjustment.local_name() {
                    "lumMod" if lum_mod.is_none() => lum_mod = Some(parse_number("lumMod", val)?),
                    "lumOff" if lum_off.is_none() => lum_off = Some(parse_number("lumOff", val)?),
                    _ => return Ok(None),
                }
            }

            if lum_mod.is_some() || lum_off.is_some() {
                Ok(Some(ColorSpec::Theme {
                    name: name.to_string(),
                    lum_mod,
                    lum_off,
                }))
            } else {
                Ok(Some(ColorSpec::Scheme {
                    name: name.to_string(),
                }))
            }
        }
        _ => Ok(None),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        Error::ExtractionError(format!("invalid numeric value '{}' for {}", value, key))
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(Error::ExtractionError(format!(
            "invalid boolean value '{}' for {}",
            value, key
        ))),
    }
}
