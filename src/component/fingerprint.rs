//! Structural fingerprinting and duplicate grouping
//!
//! A fingerprint condenses a subtree into a string key: node type, size
//! snapped to a coarse grid, and the sorted fingerprints of its
//! children, capped at a fixed depth. Nodes sharing a fingerprint are
//! candidates for extraction into one shared definition. Equal
//! fingerprints do not guarantee equal content — text and fills may
//! still differ, which the content diff captures separately.

use std::collections::HashMap;

use crate::document::node::{NodeId, NodeType, SceneNode};
use crate::document::Document;

use super::diff::{diff_group, DiffEntry};

/// Name suffixes that designers append to copies of the same element.
const STATE_WORDS: [&str; 8] = [
    "default", "hover", "active", "pressed", "disabled", "selected", "focus", "copy",
];

/// Options for the duplicate scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Descend into component/instance subtrees and group their
    /// content too. Off by default: that content is already managed by
    /// a definition, and re-extracting it is rarely wanted.
    pub include_protected: bool,
    /// How many levels of children participate in a fingerprint.
    pub max_depth: usize,
    /// Grid, in canvas units, that sizes are snapped to before they
    /// enter the fingerprint.
    pub size_grid: f64,
    /// Smallest group worth reporting.
    pub min_group_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_protected: false,
            max_depth: 4,
            size_grid: 4.0,
            min_group_size: 2,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also scan inside protected subtrees.
    pub fn with_protected(mut self, include: bool) -> Self {
        self.include_protected = include;
        self
    }
}

/// Immutable capture of everything extraction needs to know about a
/// group member. Taken at scan time, because extraction mutates the
/// tree and must replay original geometry and parentage afterwards.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub width: f64,
    pub height: f64,
    pub absolute_x: f64,
    pub absolute_y: f64,
    pub relative_x: f64,
    pub relative_y: f64,
    pub parent_id: Option<NodeId>,
    pub parent_name: String,
    pub page_name: String,
    pub inside_protected: bool,
}

/// A set of structurally equivalent nodes found by the scan.
/// `nodes[0]` is the designated master: the first member in document
/// order, which the arena keeps deterministic across runs.
#[derive(Debug, Clone)]
pub struct ComponentGroup {
    pub fingerprint: String,
    pub label: String,
    pub nodes: Vec<NodeSnapshot>,
    pub pages: Vec<String>,
    pub has_diffs: bool,
    pub diffs: Vec<DiffEntry>,
}

fn type_tag(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Page => "page",
        NodeType::Frame => "frame",
        NodeType::Group => "group",
        NodeType::Section => "section",
        NodeType::Component => "component",
        NodeType::ComponentSet => "component-set",
        NodeType::Instance => "instance",
        NodeType::Rectangle => "rectangle",
        NodeType::Ellipse => "ellipse",
        NodeType::Vector => "vector",
        NodeType::Text => "text",
    }
}

fn snap(value: f64, grid: f64) -> i64 {
    if grid <= 0.0 {
        return value.round() as i64;
    }
    (value / grid).round() as i64
}

/// Compute the structural fingerprint of a subtree.
pub fn fingerprint(doc: &Document, id: NodeId, options: &ScanOptions) -> Option<String> {
    let node = doc.find(id)?;
    Some(fingerprint_node(doc, node, 0, options))
}

fn fingerprint_node(
    doc: &Document,
    node: &SceneNode,
    depth: usize,
    options: &ScanOptions,
) -> String {
    let mut key = format!(
        "{}:{}x{}",
        type_tag(node.node_type),
        snap(node.width, options.size_grid),
        snap(node.height, options.size_grid),
    );
    if depth < options.max_depth && !node.children.is_empty() {
        let mut child_keys: Vec<String> = node
            .children
            .iter()
            .filter_map(|&c| doc.find(c))
            .map(|c| fingerprint_node(doc, c, depth + 1, options))
            .collect();
        // Sorted so that z-order differences do not split groups.
        child_keys.sort();
        key.push('[');
        key.push_str(&child_keys.join(","));
        key.push(']');
    }
    key
}

/// Scan the document for groups of structurally equivalent frames and
/// groups, content diffs included.
pub fn scan_components(doc: &Document, options: &ScanOptions) -> Vec<ComponentGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<NodeSnapshot>> = HashMap::new();

    for &page in doc.pages() {
        let page_name = doc.find(page).map(|p| p.name.clone()).unwrap_or_default();
        for &child in doc.children(page) {
            collect(doc, child, false, &page_name, options, &mut order, &mut buckets);
        }
    }

    let mut groups = Vec::new();
    for key in order {
        let members = match buckets.remove(&key) {
            Some(m) => m,
            None => continue,
        };
        if members.len() < options.min_group_size {
            continue;
        }
        let label = group_label(&members);
        let mut pages = Vec::new();
        for member in &members {
            if !pages.contains(&member.page_name) {
                pages.push(member.page_name.clone());
            }
        }
        let diffs = diff_group(doc, &members);
        groups.push(ComponentGroup {
            fingerprint: key,
            label,
            has_diffs: !diffs.is_empty(),
            diffs,
            nodes: members,
            pages,
        });
    }
    groups
}

#[allow(clippy::too_many_arguments)]
fn collect(
    doc: &Document,
    id: NodeId,
    inside_protected: bool,
    page_name: &str,
    options: &ScanOptions,
    order: &mut Vec<String>,
    buckets: &mut HashMap<String, Vec<NodeSnapshot>>,
) {
    let node = match doc.find(id) {
        Some(n) => n,
        None => return,
    };
    if node.node_type.is_protected() && !options.include_protected {
        return;
    }

    if matches!(node.node_type, NodeType::Frame | NodeType::Group) && !node.children.is_empty() {
        let key = fingerprint_node(doc, node, 0, options);
        if let Some(snapshot) = snapshot_of(doc, node, page_name, inside_protected) {
            if !buckets.contains_key(&key) {
                order.push(key.clone());
            }
            buckets.entry(key).or_default().push(snapshot);
        }
    }

    let child_protection = inside_protected || node.node_type.is_protected();
    for &child in &node.children {
        collect(
            doc,
            child,
            child_protection,
            page_name,
            options,
            order,
            buckets,
        );
    }
}

fn snapshot_of(
    doc: &Document,
    node: &SceneNode,
    page_name: &str,
    inside_protected: bool,
) -> Option<NodeSnapshot> {
    let (abs_x, abs_y) = doc.absolute_position(node.id).ok()?;
    let parent_name = node
        .parent
        .and_then(|p| doc.find(p))
        .map(|p| p.name.clone())
        .unwrap_or_default();
    Some(NodeSnapshot {
        id: node.id,
        name: node.name.clone(),
        node_type: node.node_type,
        width: node.width,
        height: node.height,
        absolute_x: abs_x,
        absolute_y: abs_y,
        relative_x: node.x,
        relative_y: node.y,
        parent_id: node.parent,
        parent_name,
        page_name: page_name.to_string(),
        inside_protected,
    })
}

/// Strip trailing counters and state words from a member name.
pub fn base_name(name: &str) -> String {
    let mut current = name.trim().to_string();
    loop {
        let mut next = current
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .trim_end_matches(['/', '-', '_', ' ', '='])
            .to_string();
        for word in STATE_WORDS {
            if next.len() >= word.len()
                && next.is_char_boundary(next.len() - word.len())
                && next[next.len() - word.len()..].eq_ignore_ascii_case(word)
            {
                next.truncate(next.len() - word.len());
                next = next.trim_end_matches(['/', '-', '_', ' ', '=']).to_string();
                break;
            }
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

fn group_label(members: &[NodeSnapshot]) -> String {
    let mut shared: Option<String> = None;
    for member in members {
        let base = base_name(&member.name);
        match &shared {
            None => shared = Some(base),
            Some(existing) if *existing == base => {}
            Some(_) => {
                shared = None;
                break;
            }
        }
    }
    match shared {
        Some(base) if !base.is_empty() => base,
        _ => {
            let master = &members[0];
            format!(
                "{}x{} frame",
                master.width.round() as i64,
                master.height.round() as i64
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::NodeType;

    /// A page with `count` card frames, each holding a rectangle and a
    /// text leaf.
    fn doc_with_cards(count: usize) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        let mut cards = Vec::new();
        for i in 0..count {
            let card = doc.create_frame(format!("Card {}", i + 1));
            doc.append_child(page, card).unwrap();
            {
                let c = doc.node_mut(card).unwrap();
                c.x = i as f64 * 220.0;
                c.width = 200.0;
                c.height = 120.0;
            }
            let icon = doc.create_node(NodeType::Rectangle, "icon");
            doc.append_child(card, icon).unwrap();
            {
                let n = doc.node_mut(icon).unwrap();
                n.width = 24.0;
                n.height = 24.0;
            }
            let title = doc.create_node(NodeType::Text, "title");
            doc.append_child(card, title).unwrap();
            {
                let n = doc.node_mut(title).unwrap();
                n.width = 120.0;
                n.height = 16.0;
                n.characters = Some("Card".into());
            }
            cards.push(card);
        }
        (doc, cards)
    }

    #[test]
    fn test_fingerprint_stability() {
        let (doc, cards) = doc_with_cards(2);
        let options = ScanOptions::default();
        let a = fingerprint(&doc, cards[0], &options).unwrap();
        let b = fingerprint(&doc, cards[1], &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_ignores_sub_grid_jitter() {
        let (mut doc, cards) = doc_with_cards(2);
        doc.node_mut(cards[1]).unwrap().width = 201.0;
        let options = ScanOptions::default();
        assert_eq!(
            fingerprint(&doc, cards[0], &options).unwrap(),
            fingerprint(&doc, cards[1], &options).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_changes_with_leaf_type() {
        let (mut doc, cards) = doc_with_cards(2);
        let icon = doc.children(cards[1])[0];
        doc.node_mut(icon).unwrap().node_type = NodeType::Ellipse;
        let options = ScanOptions::default();
        assert_ne!(
            fingerprint(&doc, cards[0], &options).unwrap(),
            fingerprint(&doc, cards[1], &options).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_ignores_z_order() {
        let (mut doc, cards) = doc_with_cards(2);
        let first = doc.children(cards[1])[0];
        // Move the icon behind the title on the second card.
        doc.reparent(first, cards[1], Some(1)).unwrap();
        let options = ScanOptions::default();
        assert_eq!(
            fingerprint(&doc, cards[0], &options).unwrap(),
            fingerprint(&doc, cards[1], &options).unwrap()
        );
    }

    #[test]
    fn test_scan_groups_duplicates() {
        let (doc, cards) = doc_with_cards(3);
        let groups = scan_components(&doc, &ScanOptions::default());
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.nodes.len(), 3);
        assert_eq!(group.nodes[0].id, cards[0]);
        assert_eq!(group.label, "Card");
        assert_eq!(group.pages, vec!["Page 1".to_string()]);
    }

    #[test]
    fn test_scan_discards_singletons() {
        let (doc, _) = doc_with_cards(1);
        assert!(scan_components(&doc, &ScanOptions::default()).is_empty());
    }

    #[test]
    fn test_scan_skips_protected_by_default() {
        let (mut doc, _) = doc_with_cards(2);
        let page = doc.pages()[0];
        let def = doc.create_component("CardComponent");
        doc.append_child(page, def).unwrap();
        // Two identical frames inside the definition.
        for _ in 0..2 {
            let inner = doc.create_frame("Slot");
            doc.append_child(def, inner).unwrap();
            doc.node_mut(inner).unwrap().width = 40.0;
            doc.node_mut(inner).unwrap().height = 40.0;
            let dot = doc.create_node(NodeType::Ellipse, "dot");
            doc.append_child(inner, dot).unwrap();
            doc.node_mut(dot).unwrap().width = 8.0;
            doc.node_mut(dot).unwrap().height = 8.0;
        }

        let default_groups = scan_components(&doc, &ScanOptions::default());
        assert_eq!(default_groups.len(), 1); // just the cards

        let opted_in = scan_components(&doc, &ScanOptions::new().with_protected(true));
        assert_eq!(opted_in.len(), 2);
        let slots = opted_in
            .iter()
            .find(|g| g.label == "Slot")
            .expect("expected the Slot group");
        assert!(slots.nodes.iter().all(|n| n.inside_protected));
    }

    #[test]
    fn test_base_name_stripping() {
        assert_eq!(base_name("Card 12"), "Card");
        assert_eq!(base_name("Button / Hover"), "Button");
        assert_eq!(base_name("Chip Copy 2"), "Chip");
        assert_eq!(base_name("Row-default"), "Row");
        assert_eq!(base_name("hero"), "hero");
    }

    #[test]
    fn test_label_falls_back_to_dimensions() {
        let (mut doc, cards) = doc_with_cards(2);
        doc.node_mut(cards[0]).unwrap().name = "Pricing".into();
        doc.node_mut(cards[1]).unwrap().name = "Testimonial".into();
        let groups = scan_components(&doc, &ScanOptions::default());
        assert_eq!(groups[0].label, "200x120 frame");
    }

    #[test]
    fn test_snapshot_captures_geometry() {
        let (doc, cards) = doc_with_cards(2);
        let groups = scan_components(&doc, &ScanOptions::default());
        let second = &groups[0].nodes[1];
        assert_eq!(second.id, cards[1]);
        assert_eq!(second.relative_x, 220.0);
        assert_eq!(second.absolute_x, 220.0);
        assert_eq!(second.parent_name, "Page 1");
        assert!(!second.inside_protected);
    }
}
