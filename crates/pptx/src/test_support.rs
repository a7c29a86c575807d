//! In-memory PPTX fixtures.

use crate::package::PRESENTATION_PART;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Build a ZIP archive holding the given entries.
pub fn build_package(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A shape holding one paragraph per line of `text`.
pub fn text_shape(id: usize, text: &str) -> String {
    let paragraphs: String = text
        .lines()
        .map(|line| format!(r#"<a:p><a:r><a:rPr lang="en-US" sz="1800"/><a:t>{}</a:t></a:r></a:p>"#, line))
        .collect();
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
        ),
        id = id,
        paragraphs = paragraphs
    )
}

fn notes_xml(text: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:notes {ns}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld></p:notes>"#
        ),
        ns = NS,
        text = text
    )
}

struct SampleSlide {
    shapes: String,
    notes: Option<String>,
}

/// Builder for a minimal but well-formed presentation package.
#[derive(Default)]
pub struct SamplePresentation {
    slides: Vec<SampleSlide>,
    reversed: bool,
}

impl SamplePresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide with one text box.
    pub fn slide_with_text(self, text: &str) -> Self {
        self.slide_with_shapes(&text_shape(2, text))
    }

    /// Add a slide with one text box and speaker notes.
    pub fn slide_with_notes(mut self, text: &str, notes: &str) -> Self {
        self.slides.push(SampleSlide {
            shapes: text_shape(2, text),
            notes: Some(notes.to_string()),
        });
        self
    }

    /// Add a slide whose `spTree` holds the given shape markup.
    pub fn slide_with_shapes(mut self, shapes: &str) -> Self {
        self.slides.push(SampleSlide {
            shapes: shapes.to_string(),
            notes: None,
        });
        self
    }

    /// List slides in `sldIdLst` in reverse part order.
    pub fn reversed_order(mut self) -> Self {
        self.reversed = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut entries: Vec<(String, String)> = Vec::new();

        let mut overrides = String::new();
        let mut presentation_rels = format!(
            r#"<Relationship Id="rId1" Type="{}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
            REL_BASE
        );
        let mut slide_ids: Vec<String> = Vec::new();

        for (index, slide) in self.slides.iter().enumerate() {
            let number = index + 1;
            let rel_id = format!("rId{}", number + 1);
            presentation_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
                rel_id, REL_BASE, number
            ));
            slide_ids.push(format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + number, rel_id));
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                number
            ));

            entries.push((
                format!("ppt/slides/slide{}.xml", number),
                format!(
                    concat!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                        r#"<p:sld {ns}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
                        r#"{shapes}</p:spTree></p:cSld></p:sld>"#
                    ),
                    ns = NS,
                    shapes = slide.shapes
                ),
            ));

            let mut slide_rels = format!(
                r#"<Relationship Id="rId1" Type="{}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
                REL_BASE
            );
            if let Some(notes) = &slide.notes {
                slide_rels.push_str(&format!(
                    r#"<Relationship Id="rId2" Type="{}/notesSlide" Target="../notesSlides/notesSlide{}.xml"/>"#,
                    REL_BASE, number
                ));
                entries.push((
                    format!("ppt/notesSlides/notesSlide{}.xml", number),
                    notes_xml(notes),
                ));
            }
            entries.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", number),
                format!(r#"<Relationships xmlns="{}">{}</Relationships>"#, REL_NS, slide_rels),
            ));
        }

        if self.reversed {
            slide_ids.reverse();
        }

        let mut all = vec![
            (
                "[Content_Types].xml".to_string(),
                format!(
                    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">{}</Types>"#,
                    overrides
                ),
            ),
            (
                PRESENTATION_PART.to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
                    NS,
                    slide_ids.concat()
                ),
            ),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                format!(
                    r#"<Relationships xmlns="{}">{}</Relationships>"#,
                    REL_NS, presentation_rels
                ),
            ),
        ];
        all.extend(entries);

        let borrowed: Vec<(&str, &str)> = all.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        build_package(&borrowed)
    }
}
