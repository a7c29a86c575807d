//! Rewrites a text frame with translated text.
//!
//! One [`UpdateMode`] is chosen per frame, in fixed priority: frames with
//! hyperlinks always take the hyperlink-safe path, then paragraph counts
//! decide between an in-place update and a structural rebuild.

use crate::apply::FormattingApplier;
use crate::extract::FormattingExtractor;
use crate::model::{ParagraphInfo, RunFormat, RunInfo, RunKind, TextFrameStructure};
use crate::split::{distribute, SplitPolicy};
use crate::xml::{XmlElement, XmlNode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a frame is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// One paragraph in, one line out.
    SingleParagraph,
    /// Same number of paragraphs and lines; each paragraph keeps its runs.
    MatchingCount,
    /// Paragraphs are replaced by one paragraph per line, all formatted like the first.
    StructuralRebuild,
    /// Run-by-run update that keeps every hyperlink run in place.
    HyperlinkSafe,
}

impl UpdateMode {
    /// Choose the mode for a frame given the number of translated lines.
    pub fn select(structure: &TextFrameStructure, line_count: usize) -> Self {
        if structure.has_hyperlinks() {
            UpdateMode::HyperlinkSafe
        } else if structure.paragraphs.len() == line_count {
            if line_count == 1 {
                UpdateMode::SingleParagraph
            } else {
                UpdateMode::MatchingCount
            }
        } else {
            UpdateMode::StructuralRebuild
        }
    }
}

/// Outcome of updating one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameUpdate {
    pub mode: UpdateMode,
    /// Recovered per-paragraph failures, in paragraph order.
    pub errors: Vec<String>,
}

/// Split translated frame text into paragraph lines.
pub fn split_lines(translated: &str) -> Vec<String> {
    translated
        .trim()
        .replace("\r\n", "\n")
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

/// Applies translated text to text frames.
#[derive(Debug, Clone, Default)]
pub struct TextFrameUpdater {
    extractor: FormattingExtractor,
    applier: FormattingApplier,
    split_policy: SplitPolicy,
    font_override: Option<String>,
}

impl TextFrameUpdater {
    /// Create an updater using the given split policy.
    pub fn new(split_policy: SplitPolicy) -> Self {
        Self {
            split_policy,
            ..Self::default()
        }
    }

    /// Replace fonts of translated runs with `font`.
    pub fn with_font_override(mut self, font: Option<String>) -> Self {
        self.font_override = font;
        self
    }

    /// Rewrite `frame` (a `txBody`) with `translated`, one line per paragraph.
    ///
    /// Fails only when the frame cannot be read; the frame is then untouched.
    /// Per-paragraph failures are reported in [`FrameUpdate::errors`].
    pub fn update_frame(&self, frame: &mut XmlElement, translated: &str) -> Result<FrameUpdate> {
        let structure = self.extractor.extract_frame(frame)?;
        let lines = split_lines(translated);
        let mode = UpdateMode::select(&structure, lines.len());

        log::debug!(
            "Updating frame: {} paragraph(s), {} line(s), mode {:?}",
            structure.paragraphs.len(),
            lines.len(),
            mode
        );

        let mut errors = Vec::new();
        match mode {
            UpdateMode::SingleParagraph | UpdateMode::MatchingCount => {
                self.update_matching(frame, &structure, &lines, &mut errors)
            }
            UpdateMode::StructuralRebuild => self.rebuild(frame, &structure, &lines, &mut errors),
            UpdateMode::HyperlinkSafe => {
                self.update_hyperlink_safe(frame, &structure, &lines, &mut errors)
            }
        }

        Ok(FrameUpdate { mode, errors })
    }

    fn apply_at(
        &self,
        frame: &mut XmlElement,
        position: usize,
        info: &ParagraphInfo,
        paragraph_no: usize,
        errors: &mut Vec<String>,
    ) {
        let target = match frame.children.get_mut(position) {
            Some(XmlNode::Element(target)) => target,
            _ => {
                errors.push(format!("paragraph {}: paragraph node not found", paragraph_no));
                return;
            }
        };

        if let Err(e) = self
            .applier
            .apply_paragraph(target, info, self.font_override.as_deref())
        {
            log::warn!("Skipping paragraph {}: {}", paragraph_no, e);
            errors.push(format!("paragraph {}: {}", paragraph_no, e));
        }
    }

    fn update_matching(
        &self,
        frame: &mut XmlElement,
        structure: &TextFrameStructure,
        lines: &[String],
        errors: &mut Vec<String>,
    ) {
        let positions = paragraph_positions(frame);
        for (index, (paragraph, line)) in structure.paragraphs.iter().zip(lines).enumerate() {
            let info = self.retext(paragraph, line);
            self.apply_at(frame, positions[index], &info, index + 1, errors);
        }
    }

    /// Replace every paragraph with one paragraph per line.
    fn rebuild(
        &self,
        frame: &mut XmlElement,
        structure: &TextFrameStructure,
        lines: &[String],
        errors: &mut Vec<String>,
    ) {
        let positions = paragraph_positions(frame);
        let name = paragraph_name(frame);

        let (template, format) = match structure.paragraphs.first() {
            Some(first) => (
                first.formatting_template(),
                first.first_text_format().cloned().unwrap_or_default(),
            ),
            None => (ParagraphInfo::default(), RunFormat::default()),
        };

        let mut rebuilt = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let mut info = template.clone();
            info.runs = vec![RunInfo::text(line.as_str(), format.clone())];

            let mut paragraph = XmlElement::new(name.as_str());
            match self
                .applier
                .apply_paragraph(&mut paragraph, &info, self.font_override.as_deref())
            {
                Ok(()) => rebuilt.push(XmlNode::Element(paragraph)),
                Err(e) => errors.push(format!("paragraph {}: {}", index + 1, e)),
            }
        }

        let insert_at = positions.first().copied().unwrap_or(frame.children.len());
        for position in positions.iter().rev() {
            frame.children.remove(*position);
        }
        let tail = frame.children.split_off(insert_at);
        frame.children.extend(rebuilt);
        frame.children.extend(tail);
    }

    fn update_hyperlink_safe(
        &self,
        frame: &mut XmlElement,
        structure: &TextFrameStructure,
        lines: &[String],
        errors: &mut Vec<String>,
    ) {
        let positions = paragraph_positions(frame);
        let paired = structure.paragraphs.len().min(lines.len());

        for index in 0..paired {
            let paragraph = &structure.paragraphs[index];
            let info = if paragraph.has_hyperlinks() {
                self.relink(paragraph, &lines[index], index + 1, errors)
            } else {
                self.retext(paragraph, &lines[index])
            };
            self.apply_at(frame, positions[index], &info, index + 1, errors);
        }

        if lines.len() > paired {
            self.append_paragraphs(frame, structure, &lines[paired..], paired, errors);
        }

        let mut surplus = Vec::new();
        for index in paired..structure.paragraphs.len() {
            if structure.paragraphs[index].has_hyperlinks() {
                errors.push(format!(
                    "paragraph {}: {}",
                    index + 1,
                    Error::CorrelationError(
                        "no translated line for a paragraph with hyperlinks; left untranslated"
                            .to_string()
                    )
                ));
            } else {
                surplus.push(positions[index]);
            }
        }
        for position in surplus.into_iter().rev() {
            frame.children.remove(position);
        }
    }

    /// Extra lines become new paragraphs after the last one, formatted like it
    /// but without its links.
    fn append_paragraphs(
        &self,
        frame: &mut XmlElement,
        structure: &TextFrameStructure,
        lines: &[String],
        offset: usize,
        errors: &mut Vec<String>,
    ) {
        let name = paragraph_name(frame);
        let (template, format) = match structure.paragraphs.last() {
            Some(last) => (last.formatting_template(), plain_format(last)),
            None => (ParagraphInfo::default(), RunFormat::default()),
        };

        let mut insert_at = paragraph_positions(frame)
            .last()
            .map(|p| p + 1)
            .unwrap_or(frame.children.len());

        for (index, line) in lines.iter().enumerate() {
            let mut info = template.clone();
            info.runs = vec![RunInfo::text(line.as_str(), format.clone())];

            let mut paragraph = XmlElement::new(name.as_str());
            match self
                .applier
                .apply_paragraph(&mut paragraph, &info, self.font_override.as_deref())
            {
                Ok(()) => {
                    frame.children.insert(insert_at, XmlNode::Element(paragraph));
                    insert_at += 1;
                }
                Err(e) => errors.push(format!("paragraph {}: {}", offset + index + 1, e)),
            }
        }
    }

    /// The paragraph with its run texts replaced by `line`.
    fn retext(&self, paragraph: &ParagraphInfo, line: &str) -> ParagraphInfo {
        let mut info = paragraph.clone();
        if line == paragraph.translatable_text() {
            return info;
        }

        if !info.runs.iter().any(RunInfo::is_text) {
            info.runs.retain(|r| !matches!(r.kind, RunKind::LineBreak));
            if !line.is_empty() {
                let format = self
                    .extractor
                    .extract_run_format(paragraph.end_properties.as_ref())
                    .unwrap_or_default();
                info.runs.push(RunInfo::text(line, format));
            }
            return info;
        }

        if !self.retext_by_segment(&mut info, line) {
            let text_runs: Vec<usize> = (0..info.runs.len()).filter(|&i| info.runs[i].is_text()).collect();
            self.fill(&mut info.runs, &text_runs, line);
            info.runs.retain(|r| !matches!(r.kind, RunKind::LineBreak));
        }

        drop_empty_runs(&mut info.runs);
        info
    }

    /// Keep the original line breaks when the translation has the same number
    /// of segments. Returns false when the shapes do not line up.
    fn retext_by_segment(&self, info: &mut ParagraphInfo, line: &str) -> bool {
        let breaks = info.line_break_count();
        if breaks == 0 {
            return false;
        }

        let segments: Vec<&str> = line.split(crate::model::LINE_BREAK).collect();
        if segments.len() != breaks + 1 {
            return false;
        }

        let mut groups: Vec<Vec<usize>> = vec![Vec::new()];
        for (index, run) in info.runs.iter().enumerate() {
            match run.kind {
                RunKind::LineBreak => groups.push(Vec::new()),
                RunKind::Text => {
                    if let Some(group) = groups.last_mut() {
                        group.push(index);
                    }
                }
                RunKind::Field { .. } => {}
            }
        }

        if groups
            .iter()
            .zip(&segments)
            .any(|(group, segment)| group.is_empty() && !segment.is_empty())
        {
            return false;
        }

        for (group, segment) in groups.iter().zip(&segments) {
            self.fill(&mut info.runs, group, segment);
        }
        true
    }

    /// Distribute `text` over the runs at `indices` by their current lengths.
    fn fill(&self, runs: &mut [RunInfo], indices: &[usize], text: &str) {
        let weights: Vec<usize> = indices.iter().map(|&i| runs[i].text.chars().count()).collect();
        let pieces = distribute(text, &weights, self.split_policy);
        for (&index, piece) in indices.iter().zip(pieces) {
            runs[index].text = piece;
        }
    }

    /// Hyperlink-aware rewrite of one paragraph.
    ///
    /// Each link run is anchored in the translated line (exact match of its
    /// source text first, then its proportional position snapped to word
    /// boundaries); the text between anchors goes to the plain runs around it.
    fn relink(
        &self,
        paragraph: &ParagraphInfo,
        line: &str,
        paragraph_no: usize,
        errors: &mut Vec<String>,
    ) -> ParagraphInfo {
        if line == paragraph.translatable_text() {
            return paragraph.clone();
        }

        let chars: Vec<char> = line.chars().collect();
        let anchors = anchor_links(paragraph, &chars, paragraph_no, errors);
        let fallback = plain_format(paragraph);

        let mut runs: Vec<RunInfo> = Vec::with_capacity(paragraph.runs.len() + 1);
        let mut group: Vec<usize> = Vec::new();
        let mut anchors = anchors.into_iter();
        let mut previous_end = 0;

        for run in &paragraph.runs {
            match run.kind {
                RunKind::Field { .. } => runs.push(run.clone()),
                RunKind::LineBreak => {}
                RunKind::Text if run.is_hyperlink() => {
                    let anchor = match anchors.next() {
                        Some(anchor) => anchor,
                        None => {
                            runs.push(run.clone());
                            continue;
                        }
                    };
                    let gap: String = chars[previous_end..anchor.start].iter().collect();
                    self.fill_gap(&mut runs, &group, &gap, &fallback);
                    group.clear();

                    let mut link = run.clone();
                    if let Some(text) = anchor.text {
                        link.text = text;
                    }
                    runs.push(link);
                    previous_end = anchor.end;
                }
                RunKind::Text => {
                    runs.push(run.clone());
                    group.push(runs.len() - 1);
                }
            }
        }

        let tail: String = chars[previous_end.min(chars.len())..].iter().collect();
        self.fill_gap(&mut runs, &group, &tail, &fallback);

        runs.retain(|r| r.is_hyperlink() || !r.is_text() || !r.text.is_empty());

        ParagraphInfo {
            runs,
            ..paragraph.formatting_template()
        }
    }

    fn fill_gap(&self, runs: &mut Vec<RunInfo>, group: &[usize], gap: &str, fallback: &RunFormat) {
        if group.is_empty() {
            if !gap.is_empty() {
                runs.push(RunInfo::text(gap, fallback.clone()));
            }
            return;
        }
        self.fill(runs, group, gap);
    }
}

/// Position of a link run's text in the translated line, in characters.
struct Anchor {
    start: usize,
    end: usize,
    /// Translated link text; `None` keeps the source text.
    text: Option<String>,
}

fn anchor_links(
    paragraph: &ParagraphInfo,
    chars: &[char],
    paragraph_no: usize,
    errors: &mut Vec<String>,
) -> Vec<Anchor> {
    let len = chars.len();
    let snap = chars.iter().any(|c| c.is_whitespace());

    let mut spans = Vec::new();
    let mut offset = 0;
    for run in paragraph.runs.iter().filter(|r| r.is_text()) {
        let width = run.text.chars().count();
        if run.is_hyperlink() {
            spans.push((run.text.as_str(), offset, offset + width));
        }
        offset += width;
    }
    let total = offset.max(1);

    let mut anchors = Vec::with_capacity(spans.len());
    let mut cursor = 0;

    for (source, start, end) in spans {
        let needle: Vec<char> = source.trim().chars().collect();
        if let Some(found) = find_chars(chars, &needle, cursor) {
            cursor = found + needle.len();
            anchors.push(Anchor {
                start: found,
                end: cursor,
                text: Some(needle.iter().collect()),
            });
            continue;
        }

        let mut span_start = scale(start, len, total).max(cursor);
        let mut span_end = scale(end, len, total).max(span_start);
        if snap {
            span_start = nearest_boundary(chars, span_start, cursor);
            span_end = nearest_boundary(chars, span_end, span_start);
        }
        while span_start < span_end && chars[span_start].is_whitespace() {
            span_start += 1;
        }
        while span_end > span_start && chars[span_end - 1].is_whitespace() {
            span_end -= 1;
        }

        if span_end > span_start {
            cursor = span_end;
            anchors.push(Anchor {
                start: span_start,
                end: span_end,
                text: Some(chars[span_start..span_end].iter().collect()),
            });
        } else {
            errors.push(format!(
                "paragraph {}: {}",
                paragraph_no,
                Error::CorrelationError(format!(
                    "hyperlink text '{}' could not be located in the translation; left untranslated",
                    source
                ))
            ));
            cursor = span_start;
            anchors.push(Anchor {
                start: span_start,
                end: span_start,
                text: None,
            });
        }
    }

    anchors
}

fn scale(position: usize, len: usize, total: usize) -> usize {
    ((position * len * 2 + total) / (2 * total)).min(len)
}

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Nearest word start (or either end) to `ideal`, never before `floor`.
fn nearest_boundary(chars: &[char], ideal: usize, floor: usize) -> usize {
    let is_boundary = |p: usize| p == 0 || p == chars.len() || chars[p - 1].is_whitespace();
    for distance in 0..=chars.len() {
        let forward = ideal + distance;
        if forward <= chars.len() && is_boundary(forward) {
            return forward;
        }
        if let Some(backward) = ideal.checked_sub(distance) {
            if backward >= floor && is_boundary(backward) {
                return backward;
            }
        }
    }
    ideal
}

/// Format of the first text run without a hyperlink.
fn plain_format(paragraph: &ParagraphInfo) -> RunFormat {
    paragraph
        .runs
        .iter()
        .find(|r| r.is_text() && !r.is_hyperlink())
        .map(|r| r.format.clone())
        .or_else(|| paragraph.first_text_format().map(RunFormat::without_hyperlink))
        .unwrap_or_default()
}

/// Drop text runs emptied by redistribution, keeping at least one.
fn drop_empty_runs(runs: &mut Vec<RunInfo>) {
    let keep_first = runs.iter().filter(|r| r.is_text()).all(|r| r.text.is_empty());
    let mut seen_text = false;
    runs.retain(|r| {
        if !r.is_text() || !r.text.is_empty() {
            return true;
        }
        let keep = keep_first && !seen_text;
        seen_text = true;
        keep
    });
}

fn paragraph_positions(frame: &XmlElement) -> Vec<usize> {
    frame
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            XmlNode::Element(e) if e.local_name() == "p" => Some(i),
            _ => None,
        })
        .collect()
}

/// Qualified paragraph name used by the frame's existing paragraphs.
fn paragraph_name(frame: &XmlElement) -> String {
    frame
        .child("p")
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "a:p".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BulletSpec;
    use crate::xml::XmlDocument;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn frame(body: &str) -> XmlElement {
        let xml = format!(r#"<p:txBody {}><a:bodyPr/><a:lstStyle/>{}</p:txBody>"#, NS, body);
        XmlDocument::parse(&xml).unwrap().root
    }

    fn reread(frame: &XmlElement) -> TextFrameStructure {
        FormattingExtractor::new().extract_frame(frame).unwrap()
    }

    fn updater() -> TextFrameUpdater {
        TextFrameUpdater::new(SplitPolicy::WordBoundary)
    }

    #[test]
    fn test_mode_selection_priority() {
        let plain = reread(&frame(r#"<a:p><a:r><a:t>One</a:t></a:r></a:p><a:p><a:r><a:t>Two</a:t></a:r></a:p>"#));
        assert_eq!(UpdateMode::select(&plain, 2), UpdateMode::MatchingCount);
        assert_eq!(UpdateMode::select(&plain, 3), UpdateMode::StructuralRebuild);

        let single = reread(&frame(r#"<a:p><a:r><a:t>One</a:t></a:r></a:p>"#));
        assert_eq!(UpdateMode::select(&single, 1), UpdateMode::SingleParagraph);

        let linked = reread(&frame(
            r#"<a:p><a:r><a:rPr><a:hlinkClick r:id="rId1"/></a:rPr><a:t>One</a:t></a:r></a:p>"#,
        ));
        assert_eq!(UpdateMode::select(&linked, 1), UpdateMode::HyperlinkSafe);
        assert_eq!(UpdateMode::select(&linked, 4), UpdateMode::HyperlinkSafe);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("  Un\r\nDeux \n"), vec!["Un", "Deux"]);
        assert_eq!(split_lines("Seul"), vec!["Seul"]);
    }

    #[test]
    fn test_single_paragraph_keeps_run_formats() {
        let mut target = frame(concat!(
            r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr b="1"/><a:t>Hello </a:t></a:r>"#,
            r#"<a:r><a:rPr i="1"/><a:t>world</a:t></a:r></a:p>"#,
        ));

        let update = updater().update_frame(&mut target, "Bonjour le monde").unwrap();
        assert_eq!(update.mode, UpdateMode::SingleParagraph);
        assert!(update.errors.is_empty());

        let structure = reread(&target);
        let para = &structure.paragraphs[0];
        assert_eq!(para.text(), "Bonjour le monde");
        assert_eq!(para.runs.len(), 2);
        assert_eq!(para.runs[0].format.bold, Some(true));
        assert_eq!(para.runs[1].format.italic, Some(true));
        assert_eq!(para.alignment, crate::model::Alignment::Center);
    }

    #[test]
    fn test_unchanged_text_keeps_original_split() {
        let body = r#"<a:p><a:r><a:rPr b="1"/><a:t>AB</a:t></a:r><a:r><a:t>CDEFGH</a:t></a:r></a:p>"#;
        let mut target = frame(body);
        let before = target.clone();

        updater().update_frame(&mut target, "ABCDEFGH").unwrap();
        assert_eq!(target, before);
    }

    #[test]
    fn test_matching_count_preserves_line_breaks() {
        let mut target = frame(concat!(
            r#"<a:p><a:r><a:t>First line</a:t></a:r><a:br/><a:r><a:t>Second line</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:t>Other</a:t></a:r></a:p>"#,
        ));

        let update = updater()
            .update_frame(&mut target, "Première ligne\u{b}Deuxième ligne\nAutre")
            .unwrap();
        assert_eq!(update.mode, UpdateMode::MatchingCount);

        let structure = reread(&target);
        let first = &structure.paragraphs[0];
        assert_eq!(first.runs[0].text, "Première ligne");
        assert_eq!(first.runs[1].kind, RunKind::LineBreak);
        assert_eq!(first.runs[2].text, "Deuxième ligne");
        assert_eq!(structure.paragraphs[1].text(), "Autre");
    }

    #[test]
    fn test_partial_failure_continues() {
        let mut target = frame(concat!(
            r#"<a:p><a:r><a:t>One</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:t>Two</a:t></a:r><mc:AlternateContent xmlns:mc="urn:mc"/></a:p>"#,
            r#"<a:p><a:r><a:t>Three</a:t></a:r></a:p>"#,
        ));

        let update = updater().update_frame(&mut target, "Un\nDeux\nTrois").unwrap();
        assert_eq!(update.mode, UpdateMode::MatchingCount);
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].starts_with("paragraph 2:"), "{:?}", update.errors);

        let structure = reread(&target);
        assert_eq!(structure.paragraphs[0].text(), "Un");
        assert_eq!(structure.paragraphs[1].text(), "Two");
        assert_eq!(structure.paragraphs[2].text(), "Trois");
    }

    #[test]
    fn test_rebuild_uses_first_paragraph_template() {
        let mut target = frame(concat!(
            r#"<a:p><a:pPr marL="285750" lvl="1" indent="-285750" algn="just"><a:buFont typeface="Arial"/><a:buChar char="•"/></a:pPr>"#,
            r#"<a:r><a:rPr lang="en-US" sz="1800" b="1" i="0"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>Bold start</a:t></a:r>"#,
            r#"<a:r><a:rPr sz="1400"/><a:t> and the rest</a:t></a:r></a:p>"#,
        ));
        let original = reread(&target).paragraphs[0].clone();

        let update = updater()
            .update_frame(&mut target, "Ligne un\nLigne deux\nLigne trois")
            .unwrap();
        assert_eq!(update.mode, UpdateMode::StructuralRebuild);
        assert!(update.errors.is_empty());

        let structure = reread(&target);
        assert_eq!(structure.paragraphs.len(), 3);
        for (para, expected) in structure
            .paragraphs
            .iter()
            .zip(["Ligne un", "Ligne deux", "Ligne trois"])
        {
            assert_eq!(para.text(), expected);
            assert_eq!(para.runs.len(), 1);
            assert_eq!(para.bullet, original.bullet);
            assert_eq!(para.indent_level, Some(1));
            assert_eq!(para.margin_left, original.margin_left);
            assert_eq!(para.alignment, original.alignment);

            let format = &para.runs[0].format;
            assert_eq!(format.font_name.as_deref(), Some("Georgia"));
            assert_eq!(format.size, Some(1800));
            assert_eq!(format.bold, Some(true));
            assert_eq!(format.italic, Some(false));
        }

        assert_eq!(target.elements().next().unwrap().local_name(), "bodyPr");
    }

    #[test]
    fn test_rebuild_shrinks_paragraphs() {
        let mut target = frame(concat!(
            r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr b="1" sz="2400"/><a:t>Title line</a:t></a:r></a:p>"#,
            r#"<a:p><a:pPr algn="r"/><a:r><a:rPr i="1" sz="1200"/><a:t>Second line</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:rPr u="sng"/><a:t>Third line</a:t></a:r></a:p>"#,
        ));

        let update = updater().update_frame(&mut target, "Titre\nSuite").unwrap();
        assert_eq!(update.mode, UpdateMode::StructuralRebuild);
        assert!(update.errors.is_empty(), "{:?}", update.errors);

        let structure = reread(&target);
        assert_eq!(structure.paragraphs.len(), 2);
        for (para, expected) in structure.paragraphs.iter().zip(["Titre", "Suite"]) {
            assert_eq!(para.text(), expected);
            assert_eq!(para.runs.len(), 1);
            assert_eq!(para.alignment, crate::model::Alignment::Center);
            assert_eq!(para.runs[0].format.bold, Some(true));
            assert_eq!(para.runs[0].format.size, Some(2400));
            assert_ne!(para.runs[0].format.italic, Some(true));
        }

        let names: Vec<_> = target.elements().map(|e| e.local_name().to_string()).collect();
        assert_eq!(names, vec!["bodyPr", "lstStyle", "p", "p"]);
    }

    #[test]
    fn test_relink_multiple_links_proportional() {
        let mut target = frame(concat!(
            r#"<a:p><a:r><a:t>Read </a:t></a:r>"#,
            r#"<a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>the guide</a:t></a:r>"#,
            r#"<a:r><a:t> and </a:t></a:r>"#,
            r#"<a:r><a:rPr><a:hlinkClick r:id="rId3"/></a:rPr><a:t>the FAQ</a:t></a:r>"#,
            r#"<a:r><a:t> now</a:t></a:r></a:p>"#,
        ));
        let line = "Lisez le manuel et la foire aux questions maintenant";

        let update = updater().update_frame(&mut target, line).unwrap();
        assert_eq!(update.mode, UpdateMode::HyperlinkSafe);
        assert!(update.errors.is_empty(), "{:?}", update.errors);

        let para = reread(&target).paragraphs[0].clone();
        assert_eq!(para.text(), line);

        let texts: Vec<_> = para.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Lisez ", "manuel et la", " foire aux ", "questions", " maintenant"]
        );
        let links: Vec<_> = para
            .runs
            .iter()
            .map(|r| r.format.hyperlink.as_deref())
            .collect();
        assert_eq!(links, vec![None, Some("rId2"), None, Some("rId3"), None]);
    }

    #[test]
    fn test_hyperlink_run_keeps_target() {
        let mut target = frame(
            r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>See </a:t></a:r><a:r><a:rPr lang="en-US"><a:hlinkClick r:id="rId2"/></a:rPr><a:t>our site</a:t></a:r></a:p>"#,
        );

        let update = updater().update_frame(&mut target, "Voir notre site").unwrap();
        assert_eq!(update.mode, UpdateMode::HyperlinkSafe);
        assert!(update.errors.is_empty(), "{:?}", update.errors);

        let runs = reread(&target).paragraphs[0].runs.clone();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Voir ");
        assert_eq!(runs[0].format.hyperlink, None);
        assert_eq!(runs[1].text, "notre site");
        assert_eq!(runs[1].format.hyperlink.as_deref(), Some("rId2"));
    }

    #[test]
    fn test_hyperlink_exact_match() {
        let mut target = frame(
            r#"<a:p><a:r><a:t>Visit </a:t></a:r><a:r><a:rPr><a:hlinkClick r:id="rId3"/></a:rPr><a:t>GitHub</a:t></a:r><a:r><a:t> today</a:t></a:r></a:p>"#,
        );

        updater()
            .update_frame(&mut target, "Besuchen Sie GitHub noch heute")
            .unwrap();

        let runs = reread(&target).paragraphs[0].runs.clone();
        let texts: Vec<_> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Besuchen Sie ", "GitHub", " noch heute"]);
        assert_eq!(runs[1].format.hyperlink.as_deref(), Some("rId3"));
    }

    #[test]
    fn test_hyperlink_uncorrelated_is_left_untranslated() {
        let mut target = frame(
            r#"<a:p><a:r><a:t>Read the documentation here </a:t></a:r><a:r><a:rPr><a:hlinkClick r:id="rId4"/></a:rPr><a:t>x</a:t></a:r></a:p>"#,
        );

        let update = updater().update_frame(&mut target, "Lisez").unwrap();
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].contains("Correlation error"));

        let runs = reread(&target).paragraphs[0].runs.clone();
        let link = runs.iter().find(|r| r.is_hyperlink()).unwrap();
        assert_eq!(link.text, "x");
        assert_eq!(link.format.hyperlink.as_deref(), Some("rId4"));
        assert!(reread(&target).paragraphs[0].text().starts_with("Lisez"));
    }

    #[test]
    fn test_hyperlink_frame_with_extra_and_missing_lines() {
        let mut target = frame(concat!(
            r#"<a:p><a:r><a:t>Intro</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:rPr><a:hlinkClick r:id="rId5"/></a:rPr><a:t>Link</a:t></a:r></a:p>"#,
        ));

        let update = updater().update_frame(&mut target, "Einleitung\nVerweis\nNachtrag").unwrap();
        assert!(update.errors.is_empty());
        let structure = reread(&target);
        assert_eq!(structure.paragraphs.len(), 3);
        assert_eq!(structure.paragraphs[2].text(), "Nachtrag");
        assert!(!structure.paragraphs[2].has_hyperlinks());

        let mut target = frame(concat!(
            r#"<a:p><a:r><a:rPr><a:hlinkClick r:id="rId5"/></a:rPr><a:t>Link</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:t>Plain</a:t></a:r></a:p>"#,
            r#"<a:p><a:r><a:rPr><a:hlinkClick r:id="rId6"/></a:rPr><a:t>Other</a:t></a:r></a:p>"#,
        ));

        let update = updater().update_frame(&mut target, "Verweis").unwrap();
        assert_eq!(update.errors.len(), 1);
        assert!(update.errors[0].starts_with("paragraph 3:"));
        let structure = reread(&target);
        assert_eq!(structure.paragraphs.len(), 2);
        assert_eq!(structure.paragraphs[1].text(), "Other");
    }

    #[test]
    fn test_font_override_applies_to_rebuilt_paragraphs() {
        let mut target = frame(r#"<a:p><a:pPr><a:buNone/></a:pPr><a:r><a:t>Hello</a:t></a:r></a:p>"#);

        updater()
            .with_font_override(Some("Malgun Gothic".to_string()))
            .update_frame(&mut target, "안녕\n하세요")
            .unwrap();

        let structure = reread(&target);
        assert_eq!(structure.paragraphs.len(), 2);
        for para in &structure.paragraphs {
            assert_eq!(para.bullet, BulletSpec::None);
            assert_eq!(para.runs[0].format.font_name.as_deref(), Some("Malgun Gothic"));
        }
    }

    #[test]
    fn test_malformed_frame_is_untouched() {
        let mut target = frame(r#"<a:p><a:r><a:rPr sz="huge"/><a:t>x</a:t></a:r></a:p>"#);
        let before = target.clone();
        assert!(updater().update_frame(&mut target, "y").is_err());
        assert_eq!(target, before);
    }
}
