//! Content diffing between structurally equivalent nodes
//!
//! Fingerprint equality says two subtrees have the same shape, not the
//! same content. This module compares each group member against the
//! master and records what must be re-applied as overrides after the
//! member is replaced by an instance: text leaves matched by name, and
//! the member's whole fill array when any fill deviates.
//!
//! Fill comparison is deliberately coarse: only solid paints get a
//! tolerance, and any mismatch overrides the entire array rather than
//! patching individual paints.

use std::collections::HashMap;

use crate::document::node::{NodeId, NodeType, Paint, Rgba};
use crate::document::{Document, DocumentError};

use super::fingerprint::NodeSnapshot;

/// Per-channel tolerance when comparing solid fill colors.
pub const FILL_TOLERANCE: f64 = 0.01;

/// A text leaf whose content deviates from the master's.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDiff {
    /// Name of the text leaf, the key both subtrees are matched by.
    pub child_name: String,
    /// The member's own content, to be restored onto its instance.
    pub value: String,
}

/// A fill slot whose paint deviates from the master's.
#[derive(Debug, Clone, PartialEq)]
pub struct FillDiff {
    pub index: usize,
    pub hex: String,
    pub color: Rgba,
}

/// Everything that must be re-applied to one member's replacement
/// instance. Computed once, applied once, never mutated.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub node_id: NodeId,
    pub text_diffs: Vec<TextDiff>,
    pub fill_diffs: Vec<FillDiff>,
    /// The member's complete fill array, present when any fill
    /// deviates.
    pub raw_fills: Option<Vec<Paint>>,
}

impl DiffEntry {
    pub fn is_empty(&self) -> bool {
        self.text_diffs.is_empty() && self.raw_fills.is_none()
    }
}

/// Collect a subtree's text leaves by name. First occurrence wins when
/// names repeat.
fn text_leaves(doc: &Document, root: NodeId) -> HashMap<String, String> {
    let mut leaves = HashMap::new();
    for id in doc.descendants(root) {
        if let Some(node) = doc.find(id) {
            if node.node_type == NodeType::Text {
                if let Some(text) = &node.characters {
                    leaves.entry(node.name.clone()).or_insert_with(|| text.clone());
                }
            }
        }
    }
    leaves
}

fn paints_differ(a: &Paint, b: &Paint) -> bool {
    match (a.as_solid(), b.as_solid()) {
        (Some(ca), Some(cb)) => !ca.approx_eq(cb, FILL_TOLERANCE),
        _ => a != b,
    }
}

fn fills_differ(a: &[Paint], b: &[Paint]) -> bool {
    a.len() != b.len() || a.iter().zip(b).any(|(pa, pb)| paints_differ(pa, pb))
}

/// Diff one candidate against the master. `None` when the nodes match
/// or either side no longer resolves.
pub fn diff_against_master(
    doc: &Document,
    master: NodeId,
    candidate: NodeId,
) -> Option<DiffEntry> {
    let master_node = doc.find(master)?;
    let candidate_node = doc.find(candidate)?;

    let master_texts = text_leaves(doc, master);
    let candidate_texts = text_leaves(doc, candidate);
    let mut text_diffs = Vec::new();
    // Walk the candidate in document order for a stable diff order.
    for id in doc.descendants(candidate) {
        let node = doc.find(id)?;
        if node.node_type != NodeType::Text {
            continue;
        }
        let value = match candidate_texts.get(&node.name) {
            Some(v) => v,
            None => continue,
        };
        match master_texts.get(&node.name) {
            Some(master_value) if master_value != value => {
                if !text_diffs
                    .iter()
                    .any(|d: &TextDiff| d.child_name == node.name)
                {
                    text_diffs.push(TextDiff {
                        child_name: node.name.clone(),
                        value: value.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    let mut fill_diffs = Vec::new();
    let mut raw_fills = None;
    if fills_differ(&master_node.fills, &candidate_node.fills) {
        for (index, paint) in candidate_node.fills.iter().enumerate() {
            let deviates = match master_node.fills.get(index) {
                Some(master_paint) => paints_differ(master_paint, paint),
                None => true,
            };
            if deviates {
                if let Some(color) = paint.as_solid() {
                    fill_diffs.push(FillDiff {
                        index,
                        hex: color.to_hex(),
                        color: *color,
                    });
                }
            }
        }
        raw_fills = Some(candidate_node.fills.clone());
    }

    let entry = DiffEntry {
        node_id: candidate,
        text_diffs,
        fill_diffs,
        raw_fills,
    };
    if entry.is_empty() {
        None
    } else {
        Some(entry)
    }
}

/// Diff every member of a scanned group against `members[0]`.
pub fn diff_group(doc: &Document, members: &[NodeSnapshot]) -> Vec<DiffEntry> {
    let master = match members.first() {
        Some(m) => m.id,
        None => return Vec::new(),
    };
    members[1..]
        .iter()
        .filter_map(|member| diff_against_master(doc, master, member.id))
        .collect()
}

/// Re-apply a member's recorded content onto its replacement instance:
/// text by leaf name first, then the whole fill array.
pub fn apply_overrides(
    doc: &mut Document,
    instance: NodeId,
    entry: &DiffEntry,
) -> Result<(), DocumentError> {
    for diff in &entry.text_diffs {
        let target = doc.descendants(instance).into_iter().find(|&id| {
            doc.find(id)
                .map(|n| n.node_type == NodeType::Text && n.name == diff.child_name)
                .unwrap_or(false)
        });
        if let Some(id) = target {
            doc.node_mut(id)?.characters = Some(diff.value.clone());
        } else {
            log::debug!(
                "text override \"{}\" has no matching leaf under {}",
                diff.child_name,
                instance
            );
        }
    }
    if let Some(fills) = &entry.raw_fills {
        doc.node_mut(instance)?.fills = fills.clone();
    }
    Ok(())
}
