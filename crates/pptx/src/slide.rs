//! Text-frame discovery inside slide and notes parts.

use pptx_translate_core::{FormattingExtractor, FrameKind, XmlElement, XmlNode};

/// Elements of `spTree` that describe the tree itself rather than a shape.
const TREE_PROPERTY_ELEMENTS: &[&str] = &["nvGrpSpPr", "grpSpPr", "extLst"];

/// A text frame found in a part: its child-node path from the root and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLocation {
    pub path: Vec<usize>,
    pub kind: FrameKind,
}

/// All `txBody` elements below `root` in document order.
///
/// Frames inside groups and table cells are included. Text bodies are not
/// searched for nested frames.
pub fn find_text_frames(root: &XmlElement) -> Vec<FrameLocation> {
    let mut frames = Vec::new();
    let mut path = Vec::new();
    collect_frames(root, &mut path, &mut frames);
    frames
}

fn collect_frames(element: &XmlElement, path: &mut Vec<usize>, frames: &mut Vec<FrameLocation>) {
    for (index, node) in element.children.iter().enumerate() {
        let XmlNode::Element(child) = node else {
            continue;
        };

        path.push(index);
        if child.local_name() == "txBody" {
            let kind = if element.local_name() == "tc" {
                FrameKind::TableCell
            } else {
                FrameKind::Shape
            };
            frames.push(FrameLocation {
                path: path.clone(),
                kind,
            });
        } else {
            collect_frames(child, path, frames);
        }
        path.pop();
    }
}

/// Number of top-level shapes on a slide.
pub fn count_shapes(root: &XmlElement) -> usize {
    root.child("cSld")
        .and_then(|c_sld| c_sld.child("spTree"))
        .map(|tree| {
            tree.elements()
                .filter(|e| !TREE_PROPERTY_ELEMENTS.contains(&e.local_name()))
                .count()
        })
        .unwrap_or(0)
}

/// Path to the text body of the notes placeholder in a notes slide.
pub fn find_notes_body(root: &XmlElement) -> Option<Vec<usize>> {
    let (c_sld_index, c_sld) = indexed_child(root, "cSld")?;
    let (tree_index, tree) = indexed_child(c_sld, "spTree")?;

    for (shape_index, node) in tree.children.iter().enumerate() {
        let XmlNode::Element(shape) = node else {
            continue;
        };
        if shape.local_name() != "sp" || !is_body_placeholder(shape) {
            continue;
        }
        if let Some((body_index, _)) = indexed_child(shape, "txBody") {
            return Some(vec![c_sld_index, tree_index, shape_index, body_index]);
        }
    }
    None
}

fn is_body_placeholder(shape: &XmlElement) -> bool {
    shape
        .child("nvSpPr")
        .and_then(|nv| nv.child("nvPr"))
        .and_then(|nv| nv.child("ph"))
        .map(|ph| ph.attribute("type") == Some("body"))
        .unwrap_or(false)
}

fn indexed_child<'a>(element: &'a XmlElement, local: &str) -> Option<(usize, &'a XmlElement)> {
    element
        .children
        .iter()
        .enumerate()
        .find_map(|(index, node)| match node {
            XmlNode::Element(e) if e.local_name() == local => Some((index, e)),
            _ => None,
        })
}

/// Display text of every non-empty frame below `root`, in document order.
pub fn frame_texts(root: &XmlElement, extractor: &FormattingExtractor) -> Vec<String> {
    find_text_frames(root)
        .iter()
        .filter_map(|location| root.descendant(&location.path))
        .filter_map(|frame| match extractor.extract_frame(frame) {
            Ok(structure) => Some(structure.text()),
            Err(e) => {
                log::debug!("Skipping unreadable text frame in preview: {}", e);
                None
            }
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
