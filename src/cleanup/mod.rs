//! Naming and hygiene checks
//!
//! Flat, read-only scans independent of the layout engine: host-default
//! names, names needing ASCII transliteration, siblings that break the
//! dominant naming convention, empty containers, and zero-size leaves.
//! Each issue kind has a paired one-shot fixer in [`fix`].

pub mod case;
pub mod fix;
pub mod translit;

pub use case::CaseStyle;
pub use fix::{apply_cleanup_fix, fix_all_cleanup};

use std::collections::HashMap;

use crate::document::node::{NodeId, NodeType, SceneNode};
use crate::document::Document;

/// The closed set of hygiene issue kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanupIssueKind {
    /// Name is still the host's default ("Frame 12", "Rectangle 3"...).
    DefaultName,
    /// Name contains characters the transliteration table can replace.
    ForeignCharacters { replacement: String },
    /// Name breaks the convention most siblings follow.
    CaseMismatch {
        dominant: CaseStyle,
        replacement: String,
    },
    /// Container-typed node with no children.
    EmptyContainer,
    /// Sized leaf with zero width or height.
    ZeroSize,
}

impl CleanupIssueKind {
    /// Stable tag for display and dedup.
    pub fn key(&self) -> &'static str {
        match self {
            CleanupIssueKind::DefaultName => "default-name",
            CleanupIssueKind::ForeignCharacters { .. } => "foreign-characters",
            CleanupIssueKind::CaseMismatch { .. } => "case-mismatch",
            CleanupIssueKind::EmptyContainer => "empty-container",
            CleanupIssueKind::ZeroSize => "zero-size",
        }
    }
}

/// One hygiene finding. Like layout issues, these are value snapshots
/// keyed by id, never live handles.
#[derive(Debug, Clone)]
pub struct CleanupIssue {
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: NodeType,
    pub kind: CleanupIssueKind,
    pub description: String,
    pub suggestion: String,
}

/// Whether a name is the host default for its type: the type label,
/// optionally followed by a counter.
pub fn is_default_name(name: &str, node_type: NodeType) -> bool {
    let label = node_type.label();
    match name.strip_prefix(label) {
        Some("") => true,
        Some(rest) => {
            rest.starts_with(' ')
                && !rest.trim_start().is_empty()
                && rest.trim_start().chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Scan the whole document for hygiene issues.
pub fn scan_cleanup(doc: &Document) -> Vec<CleanupIssue> {
    let mut issues = Vec::new();
    for &page in doc.pages() {
        visit(doc, page, &mut issues);
    }
    issues
}

fn visit(doc: &Document, id: NodeId, issues: &mut Vec<CleanupIssue>) {
    let node = match doc.find(id) {
        Some(n) => n,
        None => return,
    };
    if node.node_type == NodeType::Instance {
        return;
    }
    if node.node_type != NodeType::Page {
        check_node(node, issues);
    }
    check_sibling_case(doc, node, issues);
    for &child in &node.children {
        visit(doc, child, issues);
    }
}

fn issue_for(node: &SceneNode, kind: CleanupIssueKind, description: String, suggestion: String) -> CleanupIssue {
    CleanupIssue {
        node_id: node.id,
        node_name: node.name.clone(),
        node_type: node.node_type,
        kind,
        description,
        suggestion,
    }
}

fn check_node(node: &SceneNode, issues: &mut Vec<CleanupIssue>) {
    if is_default_name(&node.name, node.node_type) {
        issues.push(issue_for(
            node,
            CleanupIssueKind::DefaultName,
            format!("\"{}\" still has its default name", node.name),
            "Give it a name that says what it is".to_string(),
        ));
    }

    if translit::needs_transliteration(&node.name) {
        let replacement = translit::transliterate(&node.name);
        issues.push(issue_for(
            node,
            CleanupIssueKind::ForeignCharacters {
                replacement: replacement.clone(),
            },
            format!("\"{}\" contains non-ASCII characters", node.name),
            format!("Rename it to \"{}\"", replacement),
        ));
    }

    if matches!(
        node.node_type,
        NodeType::Frame | NodeType::Group | NodeType::Section
    ) && node.children.is_empty()
    {
        issues.push(issue_for(
            node,
            CleanupIssueKind::EmptyContainer,
            format!("\"{}\" is an empty {}", node.name, node.node_type),
            "Remove it".to_string(),
        ));
    }

    if matches!(
        node.node_type,
        NodeType::Rectangle | NodeType::Ellipse | NodeType::Vector | NodeType::Text
    ) && (node.width <= 0.0 || node.height <= 0.0)
    {
        issues.push(issue_for(
            node,
            CleanupIssueKind::ZeroSize,
            format!("\"{}\" has zero size and renders nothing", node.name),
            "Remove it".to_string(),
        ));
    }
}

/// Majority vote over sibling naming conventions: when one style clearly
/// dominates, flag the siblings that deviate from it. Default-named
/// nodes neither vote nor get flagged (they have their own issue kind),
/// and single lowercase words are compatible with everything.
fn check_sibling_case(doc: &Document, container: &SceneNode, issues: &mut Vec<CleanupIssue>) {
    let named: Vec<&SceneNode> = container
        .children
        .iter()
        .filter_map(|&id| doc.find(id))
        .filter(|n| !is_default_name(&n.name, n.node_type))
        .collect();
    if named.len() < 2 {
        return;
    }
    let mut votes: HashMap<CaseStyle, usize> = HashMap::new();
    for node in &named {
        if let Some(style) = case::classify(&node.name) {
            if style != CaseStyle::Lower {
                *votes.entry(style).or_insert(0) += 1;
            }
        }
    }
    let (dominant, dominant_count) = match votes
        .iter()
        .max_by_key(|(style, count)| (**count, style_rank(**style)))
    {
        Some((&style, &count)) => (style, count),
        None => return,
    };
    if dominant_count < 2 {
        return;
    }
    for node in named {
        let style = match case::classify(&node.name) {
            Some(s) => s,
            None => continue,
        };
        if style == dominant || style == CaseStyle::Lower {
            continue;
        }
        let minority_count = votes.get(&style).copied().unwrap_or(0);
        if minority_count >= dominant_count {
            continue;
        }
        let replacement = case::convert(&node.name, dominant);
        issues.push(issue_for(
            node,
            CleanupIssueKind::CaseMismatch {
                dominant,
                replacement: replacement.clone(),
            },
            format!(
                "\"{}\" breaks the {} convention its siblings follow",
                node.name, dominant
            ),
            format!("Rename it to \"{}\"", replacement),
        ));
    }
}

/// Deterministic tie-break for equally popular styles.
fn style_rank(style: CaseStyle) -> u8 {
    match style {
        CaseStyle::Camel => 5,
        CaseStyle::Pascal => 4,
        CaseStyle::Snake => 3,
        CaseStyle::Kebab => 2,
        CaseStyle::Title => 1,
        CaseStyle::Lower => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_children(names: &[(&str, NodeType)]) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        let frame = doc.create_frame("Panel");
        doc.append_child(page, frame).unwrap();
        doc.node_mut(frame).unwrap().width = 100.0;
        doc.node_mut(frame).unwrap().height = 100.0;
        let mut ids = Vec::new();
        for &(name, node_type) in names {
            let id = doc.create_node(node_type, name);
            doc.append_child(frame, id).unwrap();
            let n = doc.node_mut(id).unwrap();
            n.width = 10.0;
            n.height = 10.0;
            ids.push(id);
        }
        (doc, ids)
    }

    fn kinds(issues: &[CleanupIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.kind.key()).collect()
    }

    #[test]
    fn test_default_name_matching() {
        assert!(is_default_name("Frame 12", NodeType::Frame));
        assert!(is_default_name("Rectangle 3", NodeType::Rectangle));
        assert!(is_default_name("Text", NodeType::Text));
        assert!(!is_default_name("Frame 12", NodeType::Group));
        assert!(!is_default_name("Framework", NodeType::Frame));
        assert!(!is_default_name("Frame one", NodeType::Frame));
    }

    #[test]
    fn test_default_name_scan() {
        let (doc, ids) = doc_with_children(&[
            ("Rectangle 1", NodeType::Rectangle),
            ("hero", NodeType::Rectangle),
        ]);
        let issues = scan_cleanup(&doc);
        assert_eq!(kinds(&issues), vec!["default-name"]);
        assert_eq!(issues[0].node_id, ids[0]);
    }

    #[test]
    fn test_foreign_characters_scan() {
        let (doc, _) = doc_with_children(&[("Überschrift", NodeType::Text)]);
        let issues = scan_cleanup(&doc);
        assert_eq!(kinds(&issues), vec!["foreign-characters"]);
        match &issues[0].kind {
            CleanupIssueKind::ForeignCharacters { replacement } => {
                assert_eq!(replacement, "Uberschrift");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_case_minority_flagged() {
        let (doc, ids) = doc_with_children(&[
            ("navBar", NodeType::Frame),
            ("sideBar", NodeType::Frame),
            ("main_content", NodeType::Frame),
        ]);
        // The frames themselves are empty containers too; filter to the
        // case issues.
        let issues = scan_cleanup(&doc);
        let case_issues: Vec<_> = issues
            .iter()
            .filter(|i| i.kind.key() == "case-mismatch")
            .collect();
        assert_eq!(case_issues.len(), 1);
        assert_eq!(case_issues[0].node_id, ids[2]);
        match &case_issues[0].kind {
            CleanupIssueKind::CaseMismatch {
                dominant,
                replacement,
            } => {
                assert_eq!(*dominant, CaseStyle::Camel);
                assert_eq!(replacement, "mainContent");
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_no_case_vote_without_majority() {
        let (doc, _) = doc_with_children(&[
            ("navBar", NodeType::Frame),
            ("main_content", NodeType::Frame),
        ]);
        let issues = scan_cleanup(&doc);
        assert!(!kinds(&issues).contains(&"case-mismatch"));
    }

    #[test]
    fn test_lowercase_single_words_are_compatible() {
        let (doc, _) = doc_with_children(&[
            ("navBar", NodeType::Frame),
            ("sideBar", NodeType::Frame),
            ("footer", NodeType::Frame),
        ]);
        let issues = scan_cleanup(&doc);
        assert!(!kinds(&issues).contains(&"case-mismatch"));
    }

    #[test]
    fn test_empty_container_and_zero_size() {
        let (mut doc, ids) = doc_with_children(&[
            ("shell", NodeType::Frame),
            ("divider", NodeType::Rectangle),
        ]);
        doc.node_mut(ids[1]).unwrap().height = 0.0;
        let issues = scan_cleanup(&doc);
        let keys = kinds(&issues);
        assert!(keys.contains(&"empty-container"));
        assert!(keys.contains(&"zero-size"));
    }

    #[test]
    fn test_scan_skips_instances() {
        let (mut doc, _) = doc_with_children(&[("holder", NodeType::Frame)]);
        let page = doc.pages()[0];
        let def = doc.create_component("Chip");
        doc.append_child(page, def).unwrap();
        let label = doc.create_node(NodeType::Text, "Überschrift");
        doc.node_mut(label).unwrap().width = 10.0;
        doc.node_mut(label).unwrap().height = 10.0;
        doc.append_child(def, label).unwrap();
        let inst = doc.create_instance(def).unwrap();
        doc.append_child(page, inst).unwrap();

        let issues = scan_cleanup(&doc);
        let foreign: Vec<_> = issues
            .iter()
            .filter(|i| i.kind.key() == "foreign-characters")
            .collect();
        // Flagged once on the definition's child, not again on the
        // instance's mirror copy.
        assert_eq!(foreign.len(), 1);
        assert_eq!(foreign[0].node_id, label);
    }
}
