//! Package relationships and slide ordering.

use crate::package::{PptxPackage, PRESENTATION_PART};
use pptx_translate_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

const SLIDE_REL_SUFFIX: &str = "/slide";
const NOTES_REL_SUFFIX: &str = "/notesSlide";

/// One `Relationship` element of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Parse a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut relationship = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|e| Error::XmlError(format!("Error parsing relationships: {}", e)))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => relationship.id = value,
                        b"Type" => relationship.rel_type = value,
                        b"Target" => relationship.target = value,
                        b"TargetMode" => relationship.external = value == "External",
                        _ => {}
                    }
                }

                relationships.push(relationship);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Path of the `.rels` part belonging to `part`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Relationships of a part; a part without a `.rels` file has none.
pub fn part_relationships(package: &PptxPackage, part: &str) -> Result<Vec<Relationship>> {
    let rels_path = rels_path_for(part);
    if !package.contains(&rels_path) {
        return Ok(Vec::new());
    }
    parse_relationships(&package.read_string(&rels_path)?)
}

/// Slide part paths in presentation order.
///
/// Order comes from the `sldIdLst` of `presentation.xml`; when that list is
/// missing, slide relationships are ordered by the number in their id or target.
pub fn slide_order(package: &PptxPackage) -> Result<Vec<String>> {
    let relationships = part_relationships(package, PRESENTATION_PART)?;
    let slide_ids = slide_id_list(&package.read_string(PRESENTATION_PART)?)?;

    if !slide_ids.is_empty() {
        let mut slides = Vec::with_capacity(slide_ids.len());
        for id in slide_ids {
            let relationship = relationships
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| {
                    Error::CorruptedFile(format!("slide relationship '{}' not found", id))
                })?;
            slides.push(resolve_target(PRESENTATION_PART, &relationship.target));
        }
        return Ok(slides);
    }

    let mut slides: Vec<(String, Option<usize>)> = relationships
        .iter()
        .filter(|r| r.rel_type.ends_with(SLIDE_REL_SUFFIX))
        .map(|r| {
            let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            (resolve_target(PRESENTATION_PART, &r.target), order)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Notes slide part of a slide, if it has one.
pub fn notes_part_for(package: &PptxPackage, slide_part: &str) -> Result<Option<String>> {
    let notes = part_relationships(package, slide_part)?
        .into_iter()
        .find(|r| !r.external && r.rel_type.ends_with(NOTES_REL_SUFFIX))
        .map(|r| resolve_target(slide_part, &r.target))
        .filter(|path| package.contains(path));
    Ok(notes)
}

/// Relationship ids listed in `sldIdLst`, in order.
fn slide_id_list(presentation_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    reader.trim_text(true);

    let mut ids = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => in_list = true,
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => in_list = false,
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_list && local_name(e.name().as_ref()) == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    if local_name(attr.key.as_ref()) == b"id" && attr.key.as_ref() != b"id" {
                        ids.push(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing {}: {}",
                    PRESENTATION_PART, e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract the local name from a potentially namespaced XML name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_package, SamplePresentation};

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slides/slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sldId"), b"sldId");
        assert_eq!(local_name(b"Relationship"), b"Relationship");
    }

    #[test]
    fn test_rels_path_and_resolution() {
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>"#,
            r#"</Relationships>"#,
        ))
        .unwrap();

        assert_eq!(rels.len(), 2);
        assert!(!rels[0].external);
        assert!(rels[1].external);
        assert_eq!(rels[1].target, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_slide_order_follows_slide_id_list() {
        let sample = SamplePresentation::new()
            .slide_with_text("First")
            .slide_with_text("Second")
            .slide_with_text("Third")
            .reversed_order();
        let package = PptxPackage::from_bytes(sample.build()).unwrap();

        let order = slide_order(&package).unwrap();
        assert_eq!(
            order,
            vec!["ppt/slides/slide3.xml", "ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]
        );
    }

    #[test]
    fn test_slide_order_without_id_list() {
        let bytes = build_package(&[
            (PRESENTATION_PART, r#"<p:presentation xmlns:p="urn:p"/>"#),
            (
                "ppt/_rels/presentation.xml.rels",
                concat!(
                    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>"#,
                    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
                    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>"#,
                    r#"</Relationships>"#
                ),
            ),
        ]);
        let package = PptxPackage::from_bytes(bytes).unwrap();
        assert_eq!(
            slide_order(&package).unwrap(),
            vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]
        );
    }

    #[test]
    fn test_notes_part_lookup() {
        let sample = SamplePresentation::new()
            .slide_with_notes("Body", "Speaker notes")
            .slide_with_text("No notes");
        let package = PptxPackage::from_bytes(sample.build()).unwrap();

        assert_eq!(
            notes_part_for(&package, "ppt/slides/slide1.xml").unwrap(),
            Some("ppt/notesSlides/notesSlide1.xml".to_string())
        );
        assert_eq!(notes_part_for(&package, "ppt/slides/slide2.xml").unwrap(), None);
    }
}
