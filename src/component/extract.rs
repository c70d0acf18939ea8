//! Extraction of duplicate groups into shared definitions
//!
//! The riskiest path in the crate: it rewrites live structure while
//! several invariants must hold at once — every member's canvas slot
//! ends up holding an instance at the member's original position and
//! z-order, the definition itself moves off to the side instead of
//! occupying a slot, and recorded content overrides are re-applied to
//! each replacement.
//!
//! All member data is snapshotted before any mutation; after a mutation
//! step, nodes are only reached through fresh id lookups. Requests are
//! processed strictly in caller order, and a definition-phase failure
//! rolls back that request's partial work without touching the rest of
//! the batch.

use crate::document::node::{NodeId, NodeType};
use crate::document::{Document, DocumentError};

use super::diff::{apply_overrides, DiffEntry};
use super::fingerprint::{ComponentGroup, NodeSnapshot};

/// Gap between existing canvas content and newly placed definitions,
/// and between stacked definitions.
const PLACEMENT_MARGIN: f64 = 100.0;

/// One extraction request, normally derived from a scanned group.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub fingerprint: String,
    pub label: String,
    pub node_ids: Vec<NodeId>,
    pub snapshots: Vec<NodeSnapshot>,
    pub diffs: Vec<DiffEntry>,
}

impl From<&ComponentGroup> for ConvertRequest {
    fn from(group: &ComponentGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.clone(),
            label: group.label.clone(),
            node_ids: group.nodes.iter().map(|n| n.id).collect(),
            snapshots: group.nodes.clone(),
            diffs: group.diffs.clone(),
        }
    }
}

/// A member that could not be replaced; the rest of its request is
/// unaffected.
#[derive(Debug)]
pub struct MemberFailure {
    pub node_id: NodeId,
    pub reason: String,
}

/// Outcome of one request.
#[derive(Debug)]
pub struct ConvertReport {
    pub fingerprint: String,
    pub label: String,
    /// The definition all instances now share, if the request got that
    /// far.
    pub component: Option<NodeId>,
    /// Live instances placed back on canvas, the master's slot
    /// included.
    pub instanced: usize,
    pub failures: Vec<MemberFailure>,
    /// Definition-phase failure; set only when the whole request was
    /// aborted and rolled back.
    pub error: Option<String>,
}

/// A member's canvas slot, captured immediately before its removal.
pub(crate) struct Slot {
    pub(crate) parent: Option<NodeId>,
    pub(crate) index: Option<usize>,
    pub(crate) relative_x: f64,
    pub(crate) relative_y: f64,
    pub(crate) absolute_x: f64,
    pub(crate) absolute_y: f64,
    pub(crate) page_name: String,
}

fn capture_slot(doc: &Document, id: NodeId, snapshot: &NodeSnapshot) -> Slot {
    let node = doc.find(id);
    let parent = node.and_then(|n| n.parent);
    let (absolute_x, absolute_y) = doc
        .absolute_position(id)
        .unwrap_or((snapshot.absolute_x, snapshot.absolute_y));
    Slot {
        parent,
        index: parent.and_then(|p| doc.child_index(p, id)),
        relative_x: node.map(|n| n.x).unwrap_or(snapshot.relative_x),
        relative_y: node.map(|n| n.y).unwrap_or(snapshot.relative_y),
        absolute_x,
        absolute_y,
        page_name: snapshot.page_name.clone(),
    }
}

/// Convert a batch of requests. Each request gets its own report; a
/// failed request never aborts the others.
pub fn convert(doc: &mut Document, requests: &[ConvertRequest]) -> Vec<ConvertReport> {
    // Definitions land to the right of everything touched by this
    // batch, stacked vertically per request, so they never overlap
    // existing canvas content.
    let mut right_edge = f64::NEG_INFINITY;
    let mut top = f64::INFINITY;
    for request in requests {
        for snapshot in &request.snapshots {
            right_edge = right_edge.max(snapshot.absolute_x + snapshot.width);
            top = top.min(snapshot.absolute_y);
        }
    }
    let offset_x = if right_edge.is_finite() {
        right_edge + PLACEMENT_MARGIN
    } else {
        0.0
    };
    let mut placement_y = if top.is_finite() { top } else { 0.0 };

    let mut reports = Vec::new();
    for request in requests {
        let report = convert_one(doc, request, offset_x, placement_y);
        if let Some(def) = report.component {
            if let Some(node) = doc.find(def) {
                placement_y += node.height + PLACEMENT_MARGIN;
            }
        }
        reports.push(report);
    }
    reports
}

fn convert_one(doc: &mut Document, request: &ConvertRequest, x: f64, y: f64) -> ConvertReport {
    let mut report = ConvertReport {
        fingerprint: request.fingerprint.clone(),
        label: request.label.clone(),
        component: None,
        instanced: 0,
        failures: Vec::new(),
        error: None,
    };
    if request.node_ids.is_empty() || request.node_ids.len() != request.snapshots.len() {
        report.error = Some("request carries no usable member snapshots".to_string());
        return report;
    }

    let definition = match build_definition(doc, request, x, y) {
        Ok(def) => def,
        Err(err) => {
            report.error = Some(err.to_string());
            return report;
        }
    };
    report.component = Some(definition);
    report.instanced += 1; // the master's replacement

    for (member_id, snapshot) in request.node_ids.iter().zip(&request.snapshots).skip(1) {
        match replace_member(doc, definition, *member_id, snapshot, &request.diffs) {
            Ok(()) => report.instanced += 1,
            Err(err) => {
                log::warn!("could not replace member {}: {}", member_id, err);
                report.failures.push(MemberFailure {
                    node_id: *member_id,
                    reason: err.to_string(),
                });
            }
        }
    }
    report
}

/// Build the shared definition from the master, place it at the batch
/// offset, and put an instance into the master's original slot. Any
/// failure rolls back the partially built definition and aborts the
/// request.
fn build_definition(
    doc: &mut Document,
    request: &ConvertRequest,
    x: f64,
    y: f64,
) -> Result<NodeId, DocumentError> {
    let master_id = request.node_ids[0];
    let snapshot = &request.snapshots[0];

    let master = doc.node(master_id)?;
    let master_type = master.node_type;
    let master_name = master.name.clone();
    if !master_type.is_extractable() {
        return Err(DocumentError::unsupported(
            master_id,
            format!("a {} cannot become a definition", master_type),
        ));
    }
    let page = doc
        .page_of(master_id)
        .ok_or_else(|| DocumentError::validation("master is not attached to any page"))?;
    let slot = capture_slot(doc, master_id, snapshot);
    let protected = doc.inside_protected(master_id);

    // Track partial work so a failure can be rolled back.
    let mut created_def: Option<NodeId> = None;
    let mut created_clone: Option<NodeId> = None;

    let result = (|| -> Result<NodeId, DocumentError> {
        let definition = if master_type == NodeType::Component {
            // Already a definition: relocate it as-is.
            doc.reparent(master_id, page, None)?;
            master_id
        } else {
            // A protected master cannot be dismantled in place; work on
            // a clone parked at page level instead.
            let source = if protected {
                let clone = doc.clone_subtree(master_id, page)?;
                created_clone = Some(clone);
                clone
            } else {
                master_id
            };

            let name = if request.label.is_empty() {
                master_name.clone()
            } else {
                request.label.clone()
            };
            let def = doc.create_component(name);
            created_def = Some(def);
            doc.append_child(page, def)?;
            // Visual and layout metadata must be in place before any
            // child arrives, so auto-layout sizing rules apply to the
            // arriving children rather than to an empty container.
            copy_visual_metadata(doc, source, def)?;

            if master_type == NodeType::Group {
                // Never move children out of a group: the host may
                // auto-delete an emptied group mid-operation and drop
                // whatever is still inside. Clone them instead.
                for child in doc.children(source).to_vec() {
                    doc.clone_subtree(child, def)?;
                }
            } else {
                for child in doc.children(source).to_vec() {
                    doc.reparent(child, def, None)?;
                }
            }

            {
                let node = doc.node_mut(def)?;
                node.width = snapshot.width;
                node.height = snapshot.height;
            }

            if let Some(clone) = created_clone.take() {
                doc.remove(clone)?;
            }
            // Remove the dismantled original; its slot is refilled with
            // an instance below. For a protected master this is the
            // splice half of clone-and-splice and fails inside
            // instances, aborting the request.
            doc.remove(master_id)?;
            def
        };

        {
            let node = doc.node_mut(definition)?;
            node.x = x;
            node.y = y;
        }

        let instance = doc.create_instance(definition)?;
        place_instance(doc, instance, &slot)?;
        log::debug!(
            "definition {} built from master {}, instance re-inserted",
            definition,
            master_id
        );
        Ok(definition)
    })();

    if result.is_err() {
        for id in [created_clone, created_def].into_iter().flatten() {
            if doc.find(id).is_some() {
                if let Err(cleanup_err) = doc.remove(id) {
                    log::warn!("rollback of {} failed: {}", id, cleanup_err);
                }
            }
        }
    }
    result
}

/// Replace one non-master member with an instance of the definition.
fn replace_member(
    doc: &mut Document,
    definition: NodeId,
    member_id: NodeId,
    snapshot: &NodeSnapshot,
    diffs: &[DiffEntry],
) -> Result<(), DocumentError> {
    doc.node(member_id)?;
    let slot = capture_slot(doc, member_id, snapshot);
    doc.remove(member_id)?;
    let instance = doc.create_instance(definition)?;
    place_instance(doc, instance, &slot)?;
    if let Some(entry) = diffs.iter().find(|d| d.node_id == member_id) {
        apply_overrides(doc, instance, entry)?;
    }
    Ok(())
}

/// Put an instance into a captured slot: the original parent at the
/// original index and relative position when that parent still accepts
/// children, otherwise the member's page at absolute coordinates.
pub(crate) fn place_instance(
    doc: &mut Document,
    instance: NodeId,
    slot: &Slot,
) -> Result<(), DocumentError> {
    match slot.parent.filter(|&p| doc.accepts_children(p)) {
        Some(parent) => {
            doc.insert_child(parent, slot.index.unwrap_or(usize::MAX), instance)?;
            let node = doc.node_mut(instance)?;
            node.x = slot.relative_x;
            node.y = slot.relative_y;
        }
        None => {
            let page = doc
                .pages()
                .iter()
                .copied()
                .find(|&p| doc.find(p).map(|n| n.name == slot.page_name).unwrap_or(false))
                .or_else(|| doc.pages().first().copied())
                .ok_or_else(|| DocumentError::host("document has no pages to place into"))?;
            doc.append_child(page, instance)?;
            let node = doc.node_mut(instance)?;
            node.x = slot.absolute_x;
            node.y = slot.absolute_y;
        }
    }
    Ok(())
}

fn copy_visual_metadata(
    doc: &mut Document,
    from: NodeId,
    to: NodeId,
) -> Result<(), DocumentError> {
    let source = doc.node(from)?.clone();
    let target = doc.node_mut(to)?;
    target.fills = source.fills;
    target.strokes = source.strokes;
    target.corner_radius = source.corner_radius;
    target.clips_content = source.clips_content;
    target.auto_layout = source.auto_layout;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::fingerprint::{scan_components, ScanOptions};
    use crate::document::node::{LayoutMode, NodeType, Paint, Rgba};

    fn card(doc: &mut Document, page: NodeId, name: &str, x: f64, label: &str) -> NodeId {
        let frame = doc.create_frame(name);
        doc.append_child(page, frame).unwrap();
        {
            let f = doc.node_mut(frame).unwrap();
            f.x = x;
            f.y = 10.0;
            f.width = 200.0;
            f.height = 120.0;
        }
        let text = doc.create_node(NodeType::Text, "label");
        doc.append_child(frame, text).unwrap();
        {
            let t = doc.node_mut(text).unwrap();
            t.width = 120.0;
            t.height = 16.0;
            t.characters = Some(label.to_string());
        }
        frame
    }

    fn requests_for(doc: &Document) -> Vec<ConvertRequest> {
        scan_components(doc, &ScanOptions::default())
            .iter()
            .map(ConvertRequest::from)
            .collect()
    }

    #[test]
    fn test_extraction_no_gap_invariant() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        card(&mut doc, page, "Card 2", 220.0, "B");
        card(&mut doc, page, "Card 3", 440.0, "C");

        let requests = requests_for(&doc);
        assert_eq!(requests.len(), 1);
        let reports = convert(&mut doc, &requests);
        let report = &reports[0];
        assert!(report.error.is_none());
        assert_eq!(report.instanced, 3);
        assert!(report.failures.is_empty());

        // The page holds three instances plus the definition.
        let children = doc.children(page).to_vec();
        let instances: Vec<_> = children
            .iter()
            .filter(|&&c| doc.node(c).unwrap().node_type == NodeType::Instance)
            .copied()
            .collect();
        assert_eq!(instances.len(), 3);
        let positions: Vec<f64> = instances
            .iter()
            .map(|&i| doc.node(i).unwrap().x)
            .collect();
        assert_eq!(positions, vec![0.0, 220.0, 440.0]);
    }

    #[test]
    fn test_definition_sits_clear_of_content() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        card(&mut doc, page, "Card 2", 220.0, "B");

        let requests = requests_for(&doc);
        let reports = convert(&mut doc, &requests);
        let def = reports[0].component.unwrap();
        let node = doc.node(def).unwrap();
        assert_eq!(node.node_type, NodeType::Component);
        // Rightmost content edge was 220 + 200.
        assert_eq!(node.x, 520.0);
        assert_eq!(node.width, 200.0);
        assert_eq!(node.height, 120.0);
    }

    #[test]
    fn test_z_order_preserved() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        let backdrop = doc.create_node(NodeType::Rectangle, "backdrop");
        doc.append_child(page, backdrop).unwrap();
        doc.node_mut(backdrop).unwrap().width = 800.0;
        doc.node_mut(backdrop).unwrap().height = 10.0;
        card(&mut doc, page, "Card 2", 220.0, "B");

        let requests = requests_for(&doc);
        let reports = convert(&mut doc, &requests);
        assert!(reports[0].error.is_none());
        let children = doc.children(page).to_vec();
        // Slot 0 and slot 2 hold instances; the backdrop kept slot 1.
        assert_eq!(doc.node(children[0]).unwrap().node_type, NodeType::Instance);
        assert_eq!(doc.node(children[1]).unwrap().name, "backdrop");
        assert_eq!(doc.node(children[2]).unwrap().node_type, NodeType::Instance);
    }

    #[test]
    fn test_overrides_applied_to_replacements() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        card(&mut doc, page, "Card 2", 220.0, "B");

        let requests = requests_for(&doc);
        assert!(requests[0].diffs.len() == 1);
        let reports = convert(&mut doc, &requests);
        assert!(reports[0].error.is_none());

        let children = doc.children(page).to_vec();
        let second_instance = children[1];
        let leaf = doc.children(second_instance)[0];
        assert_eq!(doc.node(leaf).unwrap().characters.as_deref(), Some("B"));
        // The master's slot renders the master content.
        let first_leaf = doc.children(children[0])[0];
        assert_eq!(doc.node(first_leaf).unwrap().characters.as_deref(), Some("A"));
    }

    #[test]
    fn test_auto_layout_metadata_copied_onto_definition() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        let a = card(&mut doc, page, "Row 1", 0.0, "A");
        let b = card(&mut doc, page, "Row 2", 220.0, "B");
        for &id in &[a, b] {
            let n = doc.node_mut(id).unwrap();
            n.auto_layout.mode = LayoutMode::Horizontal;
            n.auto_layout.item_spacing = 8.0;
            n.auto_layout.padding_left = 12.0;
            n.auto_layout.padding_top = 6.0;
            n.fills = vec![Paint::solid(Rgba::rgb(0.9, 0.9, 0.9))];
            n.corner_radius = 4.0;
        }

        let requests = requests_for(&doc);
        let reports = convert(&mut doc, &requests);
        let def = doc.node(reports[0].component.unwrap()).unwrap();
        assert_eq!(def.auto_layout.mode, LayoutMode::Horizontal);
        assert_eq!(def.auto_layout.item_spacing, 8.0);
        assert_eq!(def.auto_layout.padding_left, 12.0);
        assert_eq!(def.auto_layout.padding_top, 6.0);
        assert_eq!(def.corner_radius, 4.0);
        assert_eq!(def.fills.len(), 1);
        assert_eq!(def.width, 200.0);
        assert_eq!(def.height, 120.0);
    }

    #[test]
    fn test_group_master_children_survive() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        for x in [0.0, 300.0] {
            let group = doc.create_node(NodeType::Group, "Badge");
            doc.append_child(page, group).unwrap();
            {
                let g = doc.node_mut(group).unwrap();
                g.x = x;
                g.width = 60.0;
                g.height = 20.0;
            }
            let dot = doc.create_node(NodeType::Ellipse, "dot");
            doc.append_child(group, dot).unwrap();
            {
                let d = doc.node_mut(dot).unwrap();
                d.x = 4.0;
                d.y = 4.0;
                d.width = 12.0;
                d.height = 12.0;
            }
        }

        let requests = requests_for(&doc);
        let reports = convert(&mut doc, &requests);
        let def = reports[0].component.unwrap();
        let def_children = doc.children(def).to_vec();
        assert_eq!(def_children.len(), 1);
        let dot = doc.node(def_children[0]).unwrap();
        assert_eq!(dot.node_type, NodeType::Ellipse);
        assert_eq!((dot.x, dot.y), (4.0, 4.0));
        assert_eq!(reports[0].instanced, 2);
    }

    #[test]
    fn test_stale_member_is_per_item_failure() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        let second = card(&mut doc, page, "Card 2", 220.0, "B");
        card(&mut doc, page, "Card 3", 440.0, "C");

        let requests = requests_for(&doc);
        // The second member disappears between scan and convert.
        doc.remove(second).unwrap();

        let reports = convert(&mut doc, &requests);
        let report = &reports[0];
        assert!(report.error.is_none());
        assert_eq!(report.instanced, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node_id, second);
    }

    #[test]
    fn test_master_inside_component_is_spliced() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        // The master lives inside an existing definition.
        let holder = doc.create_component("Panel");
        doc.append_child(page, holder).unwrap();
        doc.node_mut(holder).unwrap().width = 400.0;
        doc.node_mut(holder).unwrap().height = 200.0;
        let inner = card(&mut doc, page, "Tile 1", 0.0, "A");
        doc.reparent(inner, holder, None).unwrap();
        card(&mut doc, page, "Tile 2", 500.0, "B");

        let requests: Vec<ConvertRequest> =
            scan_components(&doc, &ScanOptions::new().with_protected(true))
                .iter()
                .map(ConvertRequest::from)
                .collect();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].snapshots[0].inside_protected);

        let reports = convert(&mut doc, &requests);
        let report = &reports[0];
        assert!(report.error.is_none(), "unexpected error: {:?}", report.error);
        // The holder's slot now carries an instance of the new
        // definition instead of the original frame.
        let holder_children = doc.children(holder).to_vec();
        assert_eq!(holder_children.len(), 1);
        assert_eq!(
            doc.node(holder_children[0]).unwrap().node_type,
            NodeType::Instance
        );
        assert_eq!(report.instanced, 2);
    }

    #[test]
    fn test_batch_requests_stack_vertically() {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        card(&mut doc, page, "Card 1", 0.0, "A");
        card(&mut doc, page, "Card 2", 220.0, "B");
        for x in [0.0, 300.0] {
            let chip = doc.create_frame("Chip");
            doc.append_child(page, chip).unwrap();
            {
                let c = doc.node_mut(chip).unwrap();
                c.x = x;
                c.y = 400.0;
                c.width = 80.0;
                c.height = 24.0;
            }
            let dot = doc.create_node(NodeType::Ellipse, "dot");
            doc.append_child(chip, dot).unwrap();
            doc.node_mut(dot).unwrap().width = 8.0;
            doc.node_mut(dot).unwrap().height = 8.0;
        }

        let requests = requests_for(&doc);
        assert_eq!(requests.len(), 2);
        let reports = convert(&mut doc, &requests);
        assert!(reports.iter().all(|r| r.error.is_none()));
        let first = doc.node(reports[0].component.unwrap()).unwrap();
        let second = doc.node(reports[1].component.unwrap()).unwrap();
        // Same column, stacked downward in request order.
        assert_eq!(first.x, second.x);
        assert!(second.y > first.y + first.height);
    }
}
