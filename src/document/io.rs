//! JSON interchange for scene documents
//!
//! Documents are exchanged as a nested tree (`DocumentSpec`), the shape
//! a designer or an exporter would naturally author. Ids are assigned in
//! tree order on load, so repeated loads of the same file produce the
//! same ids and reports stay referable across runs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::{
    AutoLayout, Constraints, LayoutAlign, NodeId, NodeType, Paint,
};
use super::{Document, DocumentError};

/// Errors that can occur when loading or saving document files.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read document file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse document JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    Invalid(String),
}

/// Root of the interchange form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub pages: Vec<NodeSpec>,
}

/// One node in the interchange tree.
///
/// Every field except `type` is optional; omitted fields take host
/// defaults. Instance-to-definition links are not expressed in this
/// form — a saved instance reloads as a plain locked container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<AutoLayout>,
    #[serde(default)]
    pub layout_grow: f64,
    #[serde(default)]
    pub layout_align: LayoutAlign,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub clips_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

/// Build a document from its interchange form.
pub fn from_spec(spec: &DocumentSpec) -> Result<Document, IoError> {
    let mut doc = Document::new();
    for page in &spec.pages {
        if page.node_type != NodeType::Page {
            return Err(IoError::Invalid(format!(
                "top-level entries must be pages, found {}",
                page.node_type
            )));
        }
        let page_id = doc.create_page(page.name.clone());
        for child in &page.children {
            build_node(&mut doc, page_id, child)?;
        }
    }
    Ok(doc)
}

fn build_node(doc: &mut Document, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, IoError> {
    if spec.node_type == NodeType::Page {
        return Err(IoError::Invalid("pages cannot be nested".into()));
    }
    if !spec.children.is_empty() && !spec.node_type.is_container() {
        return Err(IoError::Invalid(format!(
            "a {} cannot carry children",
            spec.node_type
        )));
    }
    let name = if spec.name.is_empty() {
        spec.node_type.label().to_string()
    } else {
        spec.name.clone()
    };
    let id = doc.create_node(spec.node_type, name);
    {
        let node = doc.node_mut(id).map_err(invalid)?;
        node.x = spec.x;
        node.y = spec.y;
        node.width = spec.width;
        node.height = spec.height;
        node.fills = spec.fills.clone();
        node.strokes = spec.strokes.clone();
        node.constraints = spec.constraints;
        node.auto_layout = spec.layout.unwrap_or_default();
        node.layout_grow = spec.layout_grow;
        node.layout_align = spec.layout_align;
        node.corner_radius = spec.corner_radius;
        node.clips_content = spec.clips_content;
        if spec.node_type == NodeType::Text {
            node.characters = Some(spec.text.clone().unwrap_or_default());
        }
    }
    // Attach directly: interchange trees may describe content inside
    // instances, which the public structural API would refuse.
    doc.attach_loaded(parent, id);
    for child in &spec.children {
        build_node(doc, id, child)?;
    }
    Ok(id)
}

fn invalid(err: DocumentError) -> IoError {
    IoError::Invalid(err.to_string())
}

/// Capture a document back into its interchange form.
pub fn to_spec(doc: &Document) -> DocumentSpec {
    let pages = doc
        .pages()
        .iter()
        .filter_map(|&page| doc.find(page))
        .map(|page| NodeSpec {
            node_type: NodeType::Page,
            name: page.name.clone(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            constraints: Constraints::default(),
            layout: None,
            layout_grow: 0.0,
            layout_align: LayoutAlign::Inherit,
            corner_radius: 0.0,
            clips_content: false,
            text: None,
            children: page
                .children
                .iter()
                .filter_map(|&c| node_to_spec(doc, c))
                .collect(),
        })
        .collect();
    DocumentSpec { pages }
}

fn node_to_spec(doc: &Document, id: NodeId) -> Option<NodeSpec> {
    let node = doc.find(id)?;
    Some(NodeSpec {
        node_type: node.node_type,
        name: node.name.clone(),
        x: node.x,
        y: node.y,
        width: node.width,
        height: node.height,
        fills: node.fills.clone(),
        strokes: node.strokes.clone(),
        constraints: node.constraints,
        layout: if node.auto_layout == AutoLayout::default() {
            None
        } else {
            Some(node.auto_layout)
        },
        layout_grow: node.layout_grow,
        layout_align: node.layout_align,
        corner_radius: node.corner_radius,
        clips_content: node.clips_content,
        text: node.characters.clone(),
        children: node
            .children
            .iter()
            .filter_map(|&c| node_to_spec(doc, c))
            .collect(),
    })
}

/// Parse a document from a JSON string.
pub fn parse_document(json: &str) -> Result<Document, IoError> {
    let spec: DocumentSpec = serde_json::from_str(json)?;
    from_spec(&spec)
}

/// Serialize a document to pretty-printed JSON.
pub fn to_json(doc: &Document) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(&to_spec(doc))?)
}

/// Load a document from a JSON file.
pub fn load_document(path: &Path) -> Result<Document, IoError> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

/// Save a document to a JSON file.
pub fn save_document(doc: &Document, path: &Path) -> Result<(), IoError> {
    std::fs::write(path, to_json(doc)?)?;
    Ok(())
}
