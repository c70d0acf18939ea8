//! Combining heterogeneous nodes into one variant family
//!
//! Unlike extraction, the selected nodes are not required to share a
//! fingerprint: each becomes its own definition, the definitions merge
//! into a single component set discriminated by a property
//! (`Variant=Default`, `Variant=Variant2`, ...), and every original
//! slot is refilled with an instance of its specific variant.
//!
//! Definitions are built from clones first, so nothing on the canvas is
//! touched until it is certain at least two variants exist; a failure
//! before the merge removes the freshly built definitions and restores
//! renamed members, leaving the document as it was.

use crate::document::node::{NodeId, NodeType};
use crate::document::{Document, DocumentError};

use super::extract::{place_instance, Slot};
use super::fingerprint::base_name;

/// Gap between the anchor content and the placed component set.
const PLACEMENT_MARGIN: f64 = 100.0;

/// Input for a combine operation.
#[derive(Debug, Clone)]
pub struct CombineRequest {
    pub node_ids: Vec<NodeId>,
    /// Name for the resulting component set; derived from the first
    /// member when absent.
    pub set_name: Option<String>,
    /// Name of the discriminating property; "Variant" when absent.
    pub property: Option<String>,
}

/// Outcome of a successful combine.
#[derive(Debug)]
pub struct CombineReport {
    pub component_set: NodeId,
    pub variants: usize,
    /// Per-member replacement problems; the family itself exists even
    /// when some original slots could not be refilled.
    pub errors: Vec<String>,
}

/// One member prepared for the merge.
struct Prepared {
    original: NodeId,
    definition: NodeId,
    /// Whether the definition was freshly built (and thus removable on
    /// rollback) rather than a pre-existing component.
    created: bool,
    slot: Slot,
    old_name: String,
}

fn capture_live_slot(doc: &Document, id: NodeId) -> Result<Slot, DocumentError> {
    let node = doc.node(id)?;
    let (absolute_x, absolute_y) = doc.absolute_position(id)?;
    let page_name = doc
        .page_of(id)
        .and_then(|p| doc.find(p))
        .map(|p| p.name.clone())
        .unwrap_or_default();
    Ok(Slot {
        parent: node.parent,
        index: node.parent.and_then(|p| doc.child_index(p, id)),
        relative_x: node.x,
        relative_y: node.y,
        absolute_x,
        absolute_y,
        page_name,
    })
}

/// Build a definition that reproduces `source` without dismantling it:
/// metadata first, then cloned children, then the source's size.
fn componentize_from_clone(doc: &mut Document, source: NodeId) -> Result<NodeId, DocumentError> {
    let node = doc.node(source)?;
    if !matches!(node.node_type, NodeType::Frame | NodeType::Group) {
        return Err(DocumentError::unsupported(
            source,
            format!("a {} cannot become a variant", node.node_type),
        ));
    }
    let (name, width, height) = (node.name.clone(), node.width, node.height);
    let page = doc
        .page_of(source)
        .ok_or_else(|| DocumentError::validation("member is not attached to any page"))?;

    let definition = doc.create_component(name);
    doc.append_child(page, definition)?;
    let result = (|| -> Result<(), DocumentError> {
        let source_node = doc.node(source)?.clone();
        {
            let def = doc.node_mut(definition)?;
            def.fills = source_node.fills;
            def.strokes = source_node.strokes;
            def.corner_radius = source_node.corner_radius;
            def.clips_content = source_node.clips_content;
            def.auto_layout = source_node.auto_layout;
        }
        for child in source_node.children {
            doc.clone_subtree(child, definition)?;
        }
        let def = doc.node_mut(definition)?;
        def.width = width;
        def.height = height;
        Ok(())
    })();
    if let Err(err) = result {
        if let Err(cleanup_err) = doc.remove(definition) {
            log::warn!("rollback of {} failed: {}", definition, cleanup_err);
        }
        return Err(err);
    }
    Ok(definition)
}

/// Where the finished set should land: below the first member's
/// top-level canvas ancestor, or to the right of all page content when
/// no such ancestor exists.
fn placement_anchor(doc: &Document, first: NodeId) -> (f64, f64) {
    if let Some(ancestor) = doc.top_level_ancestor(first) {
        if let Some(node) = doc.find(ancestor) {
            return (node.x, node.y + node.height + PLACEMENT_MARGIN);
        }
    }
    let mut right_edge: f64 = 0.0;
    for &page in doc.pages() {
        for &child in doc.children(page) {
            if let Some(node) = doc.find(child) {
                right_edge = right_edge.max(node.x + node.width);
            }
        }
    }
    (right_edge + PLACEMENT_MARGIN, 0.0)
}

/// Merge the requested nodes into one variant family.
///
/// Validation failures (fewer than two members, or fewer than two
/// usable after filtering) happen before or are rolled back to a state
/// with zero net mutation. A failing host merge aborts the request the
/// same way. Per-slot replacement problems after a successful merge are
/// reported, not fatal.
pub fn combine(doc: &mut Document, request: &CombineRequest) -> Result<CombineReport, DocumentError> {
    if request.node_ids.len() < 2 {
        return Err(DocumentError::validation(format!(
            "combining needs at least 2 nodes, got {}",
            request.node_ids.len()
        )));
    }

    let mut errors = Vec::new();
    let mut prepared: Vec<Prepared> = Vec::new();
    for &id in &request.node_ids {
        let node = match doc.find(id) {
            Some(n) => n,
            None => {
                errors.push(format!("node {} no longer exists", id));
                continue;
            }
        };
        let node_type = node.node_type;
        let old_name = node.name.clone();
        let slot = match capture_live_slot(doc, id) {
            Ok(s) => s,
            Err(err) => {
                errors.push(format!("node {}: {}", id, err));
                continue;
            }
        };
        let (definition, created) = if node_type == NodeType::Component {
            (id, false)
        } else {
            match componentize_from_clone(doc, id) {
                Ok(def) => (def, true),
                Err(err) => {
                    errors.push(format!("node {}: {}", id, err));
                    continue;
                }
            }
        };
        prepared.push(Prepared {
            original: id,
            definition,
            created,
            slot,
            old_name,
        });
    }

    let rollback = |doc: &mut Document, prepared: &[Prepared]| {
        for member in prepared {
            if member.created && doc.find(member.definition).is_some() {
                if let Err(err) = doc.remove(member.definition) {
                    log::warn!("rollback of {} failed: {}", member.definition, err);
                }
            }
            if !member.created {
                if let Ok(node) = doc.node_mut(member.definition) {
                    node.name = member.old_name.clone();
                }
            }
        }
    };

    if prepared.len() < 2 {
        rollback(doc, &prepared);
        return Err(DocumentError::validation(format!(
            "only {} of {} members could become variants: {}",
            prepared.len(),
            request.node_ids.len(),
            errors.join("; ")
        )));
    }

    // Discriminating names: first member is the default variant.
    let property = request.property.as_deref().unwrap_or("Variant");
    for (i, member) in prepared.iter().enumerate() {
        let value = if i == 0 {
            "Default".to_string()
        } else {
            format!("Variant{}", i + 1)
        };
        doc.node_mut(member.definition)?.name = format!("{}={}", property, value);
    }

    let anchor = placement_anchor(doc, request.node_ids[0]);
    let definition_ids: Vec<NodeId> = prepared.iter().map(|m| m.definition).collect();
    let set = match doc.combine_as_variants(&definition_ids) {
        Ok(set) => set,
        Err(err) => {
            rollback(doc, &prepared);
            return Err(err);
        }
    };

    let set_name = request.set_name.clone().unwrap_or_else(|| {
        let base = base_name(&prepared[0].old_name);
        if base.is_empty() {
            "Component set".to_string()
        } else {
            base
        }
    });
    {
        let node = doc.node_mut(set)?;
        node.name = set_name;
        node.x = anchor.0;
        node.y = anchor.1;
    }

    // Refill every original slot with an instance of its own variant.
    for member in &prepared {
        if let Err(err) = replace_original(doc, member) {
            log::warn!("could not refill slot of {}: {}", member.original, err);
            errors.push(format!("node {}: {}", member.original, err));
        }
    }

    Ok(CombineReport {
        component_set: set,
        variants: prepared.len(),
        errors,
    })
}

fn replace_original(doc: &mut Document, member: &Prepared) -> Result<(), DocumentError> {
    if member.created {
        // The original is still sitting in its slot; swap it out.
        doc.remove(member.original)?;
    }
    let instance = doc.create_instance(member.definition)?;
    place_instance(doc, instance, &member.slot)
}
