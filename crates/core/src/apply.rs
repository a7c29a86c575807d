//! Writes a [`ParagraphInfo`] back into DrawingML paragraph markup.
//!
//! Properties are emitted in schema order: renderers silently ignore
//! property elements that appear out of sequence.

use crate::fonts::is_preserved_font;
use crate::model::{
    AttributeBag, BulletSpec, ColorSpec, ParagraphInfo, RunFormat, RunInfo, RunKind, Spacing,
    LINE_BREAK,
};
use crate::xml::{XmlElement, XmlNode};
use crate::{Error, Result};

/// Attribute order of `a:pPr`.
const PARAGRAPH_ATTRIBUTE_ORDER: &[&str] = &[
    "marL",
    "marR",
    "lvl",
    "indent",
    "algn",
    "defTabSz",
    "rtl",
    "eaLnBrk",
    "fontAlgn",
    "latinLnBrk",
    "hangingPunct",
];

/// Child element order of `a:pPr`.
const PARAGRAPH_CHILD_ORDER: &[&str] = &[
    "lnSpc", "spcBef", "spcAft", "buClrTx", "buClr", "buSzTx", "buSzPct", "buSzPts", "buFontTx",
    "buFont", "buNone", "buAutoNum", "buChar", "buBlip", "tabLst", "defRPr", "extLst",
];

/// Attribute order of `a:rPr` (and `a:endParaRPr`).
const RUN_ATTRIBUTE_ORDER: &[&str] = &[
    "kumimoji",
    "lang",
    "altLang",
    "sz",
    "b",
    "i",
    "u",
    "strike",
    "kern",
    "cap",
    "spc",
    "normalizeH",
    "baseline",
    "noProof",
    "dirty",
    "err",
    "smtClean",
    "smtId",
    "bmk",
];

/// Child element order of `a:rPr`.
const RUN_CHILD_ORDER: &[&str] = &[
    "ln",
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
    "effectLst",
    "effectDag",
    "highlight",
    "uLnTx",
    "uLn",
    "uFillTx",
    "uFill",
    "latin",
    "ea",
    "cs",
    "sym",
    "hlinkClick",
    "hlinkMouseOver",
    "rtl",
    "extLst",
];

/// Run fill choices; only one may be present.
const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// Paragraph children the applier knows how to rewrite.
const SUPPORTED_PARAGRAPH_CHILDREN: &[&str] = &["pPr", "r", "br", "fld", "endParaRPr"];

/// Writes paragraph models into markup. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingApplier;

impl FormattingApplier {
    /// Create a new applier.
    pub fn new() -> Self {
        Self
    }

    /// Rewrite `target` so that it matches `info`.
    ///
    /// `font_override` replaces the Latin and East Asian typefaces of every
    /// run whose explicit font is not a preserved symbol font. On error the
    /// target is left unchanged.
    pub fn apply_paragraph(
        &self,
        target: &mut XmlElement,
        info: &ParagraphInfo,
        font_override: Option<&str>,
    ) -> Result<()> {
        validate_target(target)?;

        let mut children = Vec::new();

        if let Some(p_pr) = self.build_paragraph_properties(target, info) {
            children.push(XmlNode::Element(p_pr));
        }

        for run in &info.runs {
            for element in self.build_run(target, run, font_override) {
                children.push(XmlNode::Element(element));
            }
        }

        if let Some(end) = &info.end_properties {
            children.push(XmlNode::Element(end.clone()));
        }

        target.children = children;
        Ok(())
    }

    fn build_paragraph_properties(&self, target: &XmlElement, info: &ParagraphInfo) -> Option<XmlElement> {
        let modeled = info.indent_level.is_some()
            || info.margin_left.is_some()
            || info.indent_first_line.is_some()
            || info.alignment.as_attribute().is_some()
            || info.space_before.is_some()
            || info.space_after.is_some()
            || info.line_spacing.is_some()
            || info.bullet != BulletSpec::Inherit;

        if !info.has_properties && !modeled && info.raw_attributes.is_empty() && info.preserved.is_empty() {
            return None;
        }

        let mut attributes = Vec::new();
        if let Some(margin) = info.margin_left {
            attributes.push(("marL".to_string(), margin.to_string()));
        }
        if let Some(level) = info.indent_level {
            attributes.push(("lvl".to_string(), level.to_string()));
        }
        if let Some(indent) = info.indent_first_line {
            attributes.push(("indent".to_string(), indent.to_string()));
        }
        if let Some(algn) = info.alignment.as_attribute() {
            attributes.push(("algn".to_string(), algn.to_string()));
        }
        merge_raw(&mut attributes, &info.raw_attributes);

        let mut children = Vec::new();
        for (local, spacing) in [
            ("lnSpc", info.line_spacing),
            ("spcBef", info.space_before),
            ("spcAft", info.space_after),
        ] {
            if let Some(spacing) = spacing {
                children.push(spacing_element(target, local, spacing));
            }
        }

        let bullet_elements = bullet_elements(target, &info.bullet, &info.preserved);
        let bullet_set = info.bullet != BulletSpec::Inherit;
        let governs_bullet_font = matches!(info.bullet, BulletSpec::Char { .. });

        for element in &info.preserved {
            let local = element.local_name();
            let superseded = children.iter().any(|c: &XmlElement| c.local_name() == local)
                || (governs_bullet_font && local == "buFont")
                || (bullet_set && local == "buBlip");
            if !superseded {
                children.push(element.clone());
            }
        }
        children.extend(bullet_elements);

        Some(XmlElement {
            name: target.qualified("pPr"),
            attributes: order_attributes(attributes, PARAGRAPH_ATTRIBUTE_ORDER),
            children: order_children(children, PARAGRAPH_CHILD_ORDER),
        })
    }

    /// Markup for one run. Text containing line-break characters becomes
    /// alternating `r` and `br` elements.
    fn build_run(&self, target: &XmlElement, run: &RunInfo, font_override: Option<&str>) -> Vec<XmlElement> {
        match &run.kind {
            RunKind::Field { element } => vec![element.clone()],
            RunKind::LineBreak => vec![self.line_break(target, &run.format, font_override)],
            RunKind::Text => {
                if !run.text.contains(LINE_BREAK) {
                    return vec![self.text_run(target, &run.format, &run.text, font_override)];
                }

                let mut elements = Vec::new();
                for (index, piece) in run.text.split(LINE_BREAK).enumerate() {
                    if index > 0 {
                        elements.push(self.line_break(target, &run.format, font_override));
                    }
                    if !piece.is_empty() {
                        elements.push(self.text_run(target, &run.format, piece, font_override));
                    }
                }
                elements
            }
        }
    }

    fn text_run(&self, target: &XmlElement, format: &RunFormat, text: &str, font_override: Option<&str>) -> XmlElement {
        let mut run = XmlElement::new(target.qualified("r"));
        if let Some(r_pr) = self.build_run_properties(target, format, font_override) {
            run.children.push(XmlNode::Element(r_pr));
        }
        let mut t = XmlElement::new(target.qualified("t"));
        t.set_text(text);
        run.with_child(t)
    }

    fn line_break(&self, target: &XmlElement, format: &RunFormat, font_override: Option<&str>) -> XmlElement {
        let mut br = XmlElement::new(target.qualified("br"));
        if let Some(r_pr) = self.build_run_properties(target, format, font_override) {
            br.children.push(XmlNode::Element(r_pr));
        }
        br
    }

    /// Build an `rPr` element for a run format, or `None` when the source had
    /// none and nothing needs to be set.
    pub fn build_run_properties(
        &self,
        target: &XmlElement,
        format: &RunFormat,
        font_override: Option<&str>,
    ) -> Option<XmlElement> {
        let override_font = font_override.filter(|_| {
            !format
                .font_name
                .as_deref()
                .map_or(false, is_preserved_font)
        });
        let font = override_font.or(format.font_name.as_deref());

        let modeled = format.size.is_some()
            || format.bold.is_some()
            || format.italic.is_some()
            || format.color.is_some()
            || format.hyperlink.is_some()
            || font.is_some();

        if !format.has_properties && !modeled && format.raw_attributes.is_empty() && format.preserved.is_empty() {
            return None;
        }

        let mut attributes = Vec::new();
        if let Some(size) = format.size {
            attributes.push(("sz".to_string(), size.to_string()));
        }
        if let Some(bold) = format.bold {
            attributes.push(("b".to_string(), flag(bold)));
        }
        if let Some(italic) = format.italic {
            attributes.push(("i".to_string(), flag(italic)));
        }
        merge_raw(&mut attributes, &format.raw_attributes);

        let mut children = Vec::new();

        if let Some(color) = &format.color {
            children.push(color_element(target, color));
        }

        if let Some(font) = font {
            children.push(overlay(target, &format.preserved, "latin", "typeface", font));
        }

        if let Some(font) = override_font {
            children.push(overlay(target, &format.preserved, "ea", "typeface", font));
        }

        if let Some(link) = &format.hyperlink {
            let mut element = format
                .preserved
                .iter()
                .find(|e| e.local_name() == "hlinkClick")
                .cloned()
                .unwrap_or_else(|| XmlElement::new(target.qualified("hlinkClick")));
            let key = element
                .attribute_by_local("id")
                .map(|(k, _)| k.to_string())
                .unwrap_or_else(|| "r:id".to_string());
            element.set_attribute(key, link.as_str());
            children.push(element);
        }

        for element in &format.preserved {
            let local = element.local_name();
            let superseded = match local {
                "latin" => true,
                "hlinkClick" => format.hyperlink.is_some(),
                "ea" => override_font.is_some(),
                fill if FILL_ELEMENTS.contains(&fill) => format.color.is_some(),
                _ => false,
            };
            if !superseded {
                children.push(element.clone());
            }
        }

        Some(XmlElement {
            name: target.qualified("rPr"),
            attributes: order_attributes(attributes, RUN_ATTRIBUTE_ORDER),
            children: order_children(children, RUN_CHILD_ORDER),
        })
    }
}

fn validate_target(target: &XmlElement) -> Result<()> {
    if target.local_name() != "p" {
        return Err(Error::ApplicationError(format!(
            "target <{}> is not a paragraph",
            target.name
        )));
    }

    for node in &target.children {
        match node {
            XmlNode::Element(e) if !SUPPORTED_PARAGRAPH_CHILDREN.contains(&e.local_name()) => {
                return Err(Error::ApplicationError(format!(
                    "unsupported paragraph content <{}>",
                    e.name
                )));
            }
            XmlNode::Text(t) if !t.trim().is_empty() => {
                return Err(Error::ApplicationError(
                    "unexpected character data directly inside paragraph".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

fn flag(value: bool) -> String {
    let value = if value { "1" } else { "0" };
    value.to_string()
}

/// Append raw attributes that the modeled fields have not already written.
fn merge_raw(attributes: &mut Vec<(String, String)>, raw: &AttributeBag) {
    for (key, value) in raw.iter() {
        if !attributes.iter().any(|(k, _)| k == key) {
            attributes.push((key.to_string(), value.to_string()));
        }
    }
}

fn rank(order: &[&str], local: &str) -> usize {
    order.iter().position(|name| *name == local).unwrap_or(order.len())
}

/// Stable sort into schema order; unknown entries go last in their original order.
fn order_attributes(mut attributes: Vec<(String, String)>, order: &[&str]) -> Vec<(String, String)> {
    attributes.sort_by_key(|(key, _)| rank(order, key));
    attributes
}

fn order_children(mut children: Vec<XmlElement>, order: &[&str]) -> Vec<XmlNode> {
    children.sort_by_key(|child| rank(order, child.local_name()));
    children.into_iter().map(XmlNode::Element).collect()
}

/// A preserved element with one attribute replaced, or a new element carrying it.
fn overlay(target: &XmlElement, preserved: &[XmlElement], local: &str, key: &str, value: &str) -> XmlElement {
    let mut element = preserved
        .iter()
        .find(|e| e.local_name() == local)
        .cloned()
        .unwrap_or_else(|| XmlElement::new(target.qualified(local)));
    element.set_attribute(key, value);
    element
}

fn spacing_element(target: &XmlElement, local: &str, spacing: Spacing) -> XmlElement {
    let (kind, value) = match spacing {
        Spacing::Percent(value) => ("spcPct", value),
        Spacing::Points(value) => ("spcPts", value),
    };
    XmlElement::new(target.qualified(local))
        .with_child(XmlElement::new(target.qualified(kind)).with_attribute("val", value.to_string()))
}

fn bullet_elements(target: &XmlElement, bullet: &BulletSpec, preserved: &[XmlElement]) -> Vec<XmlElement> {
    match bullet {
        BulletSpec::Inherit => Vec::new(),
        BulletSpec::None => vec![XmlElement::new(target.qualified("buNone"))],
        BulletSpec::Char { character, font } => {
            let mut elements = Vec::new();
            if let Some(font) = font {
                elements.push(overlay(target, preserved, "buFont", "typeface", font));
            }
            elements.push(
                XmlElement::new(target.qualified("buChar")).with_attribute("char", character.as_str()),
            );
            elements
        }
        BulletSpec::AutoNum { scheme, start_at } => {
            let mut element =
                XmlElement::new(target.qualified("buAutoNum")).with_attribute("type", scheme.as_str());
            if let Some(start) = start_at {
                element.set_attribute("startAt", start.to_string());
            }
            vec![element]
        }
    }
}

/// A `solidFill` that keeps the variant it was read from.
fn color_element(target: &XmlElement, color: &ColorSpec) -> XmlElement {
    let inner = match color {
        ColorSpec::Rgb { hex } => {
            XmlElement::new(target.qualified("srgbClr")).with_attribute("val", hex.as_str())
        }
        ColorSpec::Scheme { name } => {
            XmlElement::new(target.qualified("schemeClr")).with_attribute("val", name.as_str())
        }
        ColorSpec::Theme {
            name,
            lum_mod,
            lum_off,
        } => {
            let mut element =
                XmlElement::new(target.qualified("schemeClr")).with_attribute("val", name.as_str());
            if let Some(value) = lum_mod {
                element = element.with_child(
                    XmlElement::new(target.qualified("lumMod")).with_attribute("val", value.to_string()),
                );
            }
            if let Some(value) = lum_off {
                element = element.with_child(
                    XmlElement::new(target.qualified("lumOff")).with_attribute("val", value.to_string()),
                );
            }
            element
        }
    };
    XmlElement::new(target.qualified("solidFill")).with_child(inner)
}
