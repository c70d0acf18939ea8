//! Layout mismatch detection
//!
//! Compares each node's *declared* resize behavior (constraints, grow,
//! align) against the behavior its geometry suggests it *wants*: a node
//! hugging the bottom-right corner of its frame probably wants to stay
//! there when the frame resizes, a node spanning the full width
//! probably wants to stretch, and so on.
//!
//! The scan is read-only and never fails per node — anything it cannot
//! classify is skipped. Detectors for the anchor family run in a fixed
//! priority order (corner, then both-edges, then single-edge) and emit
//! at most one issue per node; the fill, full-bleed, center, and
//! sibling-fill families emit independently. Duplicate `(node, kind)`
//! pairs are suppressed.

use std::collections::HashSet;
use std::fmt;

use crate::document::node::{Anchor, LayoutAlign, LayoutMode, NodeId, NodeType, SceneNode};
use crate::document::Document;

use super::config::LayoutConfig;
use super::geometry::{center_offset, edge_gaps, inner_box};

/// A container edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// The anchor that pins a node to this edge.
    pub fn matching_anchor(self) -> Anchor {
        match self {
            Edge::Left | Edge::Top => Anchor::Min,
            Edge::Right | Edge::Bottom => Anchor::Max,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }

    fn axis_prefix(self) -> &'static str {
        if self.is_horizontal() {
            "H"
        } else {
            "V"
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Edge::Left => "left",
            Edge::Right => "right",
            Edge::Top => "top",
            Edge::Bottom => "bottom",
        };
        write!(f, "{}", s)
    }
}

/// How strongly a mismatch distorts the layout when the container
/// resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
        }
    }
}

/// The closed set of layout mismatch kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssueKind {
    /// Node hugs two adjacent edges but is not anchored to that corner.
    CornerNotPinned { horizontal: Edge, vertical: Edge },
    /// Node hugs exactly one edge but is not anchored to it.
    EdgeNotPinned { edge: Edge },
    /// Node hugs both left and right edges but does not stretch.
    WidthNotStretch,
    /// Node hugs both top and bottom edges but does not stretch.
    HeightNotStretch,
    /// Node occupies nearly the full container width at a fixed size.
    WideNotFill,
    /// Node occupies nearly the full container height at a fixed size.
    TallNotFill,
    /// Node covers the container on both axes but stretches on neither.
    FullBleedNotStretch,
    /// Node is visually centered but not anchored to the center.
    NotCentered { horizontal: bool, vertical: bool },
    /// Widest child of a row dominates it at a fixed width instead of
    /// flexing.
    SiblingFillCandidate,
}

impl LayoutIssueKind {
    /// Stable tag, also the dedup key discriminator.
    pub fn key(&self) -> &'static str {
        match self {
            LayoutIssueKind::CornerNotPinned { .. } => "corner-not-pinned",
            LayoutIssueKind::EdgeNotPinned { .. } => "edge-not-pinned",
            LayoutIssueKind::WidthNotStretch => "width-not-stretch",
            LayoutIssueKind::HeightNotStretch => "height-not-stretch",
            LayoutIssueKind::WideNotFill => "wide-not-fill",
            LayoutIssueKind::TallNotFill => "tall-not-fill",
            LayoutIssueKind::FullBleedNotStretch => "full-bleed-not-stretch",
            LayoutIssueKind::NotCentered { .. } => "not-centered",
            LayoutIssueKind::SiblingFillCandidate => "sibling-fill-candidate",
        }
    }
}

/// One detected mismatch between declared and apparent layout intent.
///
/// Issues are value snapshots: they hold ids and copied names, never
/// live handles, because the document may be mutated between the scan
/// and a fix.
#[derive(Debug, Clone)]
pub struct LayoutIssue {
    pub node_id: NodeId,
    pub node_name: String,
    pub node_type: NodeType,
    pub parent_id: NodeId,
    pub parent_name: String,
    pub kind: LayoutIssueKind,
    pub severity: Severity,
    pub description: String,
    pub suggestion: String,
    /// Current values, in the `H: X, V: Y` / `GROW: n` / `ALIGN: X`
    /// mini-grammar.
    pub actual: String,
    /// Values the fix dispatcher should apply, same mini-grammar.
    pub expected: String,
}

/// Scan the whole document for layout mismatches.
pub fn scan_layout(doc: &Document, config: &LayoutConfig) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for &page in doc.pages() {
        visit(doc, config, page, &mut issues, &mut seen);
    }
    issues
}

fn visit(
    doc: &Document,
    config: &LayoutConfig,
    id: NodeId,
    issues: &mut Vec<LayoutIssue>,
    seen: &mut HashSet<(NodeId, &'static str)>,
) {
    let node = match doc.find(id) {
        Some(n) => n,
        None => return,
    };
    // Instance subtrees mirror their definition; flagging them would
    // duplicate every issue already reported on the definition.
    if node.node_type == NodeType::Instance {
        return;
    }

    if config.check_sibling_fill && node.auto_layout.mode == LayoutMode::Horizontal {
        check_sibling_fill(doc, config, node, issues, seen);
    }

    let anchors_apply = matches!(node.node_type, NodeType::Frame | NodeType::Component);
    for &child_id in &node.children {
        if let Some(child) = doc.find(child_id) {
            if anchors_apply {
                classify_child(config, child, node, issues, seen);
            }
            visit(doc, config, child_id, issues, seen);
        }
    }
}

fn push_issue(
    issues: &mut Vec<LayoutIssue>,
    seen: &mut HashSet<(NodeId, &'static str)>,
    issue: LayoutIssue,
) {
    if seen.insert((issue.node_id, issue.kind.key())) {
        issues.push(issue);
    }
}

fn issue_for(
    child: &SceneNode,
    parent: &SceneNode,
    kind: LayoutIssueKind,
    severity: Severity,
    description: String,
    suggestion: String,
    actual: String,
    expected: String,
) -> LayoutIssue {
    LayoutIssue {
        node_id: child.id,
        node_name: child.name.clone(),
        node_type: child.node_type,
        parent_id: parent.id,
        parent_name: parent.name.clone(),
        kind,
        severity,
        description,
        suggestion,
        actual,
        expected,
    }
}

fn classify_child(
    config: &LayoutConfig,
    child: &SceneNode,
    parent: &SceneNode,
    issues: &mut Vec<LayoutIssue>,
    seen: &mut HashSet<(NodeId, &'static str)>,
) {
    if config.only_defaults && !child.has_default_resize_behavior() {
        return;
    }
    let inner = inner_box(parent);
    if inner.width <= 0.0 || inner.height <= 0.0 {
        return;
    }
    let gaps = edge_gaps(child, parent);
    let threshold_x = config.edge_proximity_ratio * inner.width;
    let threshold_y = config.edge_proximity_ratio * inner.height;
    let near_left = gaps.left.abs() <= threshold_x;
    let near_right = gaps.right.abs() <= threshold_x;
    let near_top = gaps.top.abs() <= threshold_y;
    let near_bottom = gaps.bottom.abs() <= threshold_y;
    let in_auto_layout = parent.auto_layout.mode != LayoutMode::None;

    // Anchor family: corner, then both-edges, then single-edge; first
    // match wins. Auto-layout children are positioned by the container,
    // not by anchors, so the whole family is skipped for them.
    if !in_auto_layout {
        let family = corner_issue(
            config, child, parent, near_left, near_right, near_top, near_bottom,
        )
        .or_else(|| {
            both_edges_issue(
                config, child, parent, near_left, near_right, near_top, near_bottom,
            )
        })
        .or_else(|| {
            single_edge_issue(
                config, child, parent, near_left, near_right, near_top, near_bottom,
            )
        });
        if let Some(issue) = family {
            push_issue(issues, seen, issue);
        }
    }

    if config.check_fill {
        if child.width >= config.fill_ratio * inner.width {
            if let Some(issue) = fill_issue(child, parent, true) {
                push_issue(issues, seen, issue);
            }
        }
        if child.height >= config.fill_ratio * inner.height {
            if let Some(issue) = fill_issue(child, parent, false) {
                push_issue(issues, seen, issue);
            }
        }
    }

    if config.check_full_bleed
        && !in_auto_layout
        && child.width >= config.full_bleed_ratio * inner.width
        && child.height >= config.full_bleed_ratio * inner.height
        && !child.constraints.horizontal.is_stretchy()
        && !child.constraints.vertical.is_stretchy()
    {
        push_issue(
            issues,
            seen,
            issue_for(
                child,
                parent,
                LayoutIssueKind::FullBleedNotStretch,
                Severity::High,
                format!(
                    "\"{}\" covers \"{}\" edge to edge on both axes but stretches on neither",
                    child.name, parent.name
                ),
                "Stretch it on both axes so it keeps covering the container".to_string(),
                child.constraints.to_string(),
                "H: STRETCH, V: STRETCH".to_string(),
            ),
        );
    }

    if config.check_center && !in_auto_layout {
        if let Some(issue) = center_issue(config, child, parent) {
            push_issue(issues, seen, issue);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn corner_issue(
    config: &LayoutConfig,
    child: &SceneNode,
    parent: &SceneNode,
    near_left: bool,
    near_right: bool,
    near_top: bool,
    near_bottom: bool,
) -> Option<LayoutIssue> {
    if !config.check_corner {
        return None;
    }
    let horizontal = match (near_left, near_right) {
        (true, false) => Edge::Left,
        (false, true) => Edge::Right,
        _ => return None,
    };
    let vertical = match (near_top, near_bottom) {
        (true, false) => Edge::Top,
        (false, true) => Edge::Bottom,
        _ => return None,
    };
    let want_h = horizontal.matching_anchor();
    let want_v = vertical.matching_anchor();
    if child.constraints.horizontal == want_h && child.constraints.vertical == want_v {
        return None;
    }
    Some(issue_for(
        child,
        parent,
        LayoutIssueKind::CornerNotPinned {
            horizontal,
            vertical,
        },
        Severity::High,
        format!(
            "\"{}\" hugs the {}-{} corner of \"{}\" but is anchored {}",
            child.name, vertical, horizontal, parent.name, child.constraints
        ),
        format!(
            "Pin it to the {}-{} corner so it stays put when \"{}\" resizes",
            vertical, horizontal, parent.name
        ),
        child.constraints.to_string(),
        format!("H: {}, V: {}", want_h, want_v),
    ))
}

#[allow(clippy::too_many_arguments)]
fn both_edges_issue(
    config: &LayoutConfig,
    child: &SceneNode,
    parent: &SceneNode,
    near_left: bool,
    near_right: bool,
    near_top: bool,
    near_bottom: bool,
) -> Option<LayoutIssue> {
    if !config.check_stretch {
        return None;
    }
    if near_left && near_right && !child.constraints.horizontal.is_stretchy() {
        return Some(issue_for(
            child,
            parent,
            LayoutIssueKind::WidthNotStretch,
            Severity::Medium,
            format!(
                "\"{}\" reaches both side edges of \"{}\" but its width is fixed",
                child.name, parent.name
            ),
            "Stretch it horizontally so it follows the container width".to_string(),
            format!("H: {}", child.constraints.horizontal),
            "H: STRETCH".to_string(),
        ));
    }
    if near_top && near_bottom && !child.constraints.vertical.is_stretchy() {
        return Some(issue_for(
            child,
            parent,
            LayoutIssueKind::HeightNotStretch,
            Severity::Medium,
            format!(
                "\"{}\" reaches both the top and bottom of \"{}\" but its height is fixed",
                child.name, parent.name
            ),
            "Stretch it vertically so it follows the container height".to_string(),
            format!("V: {}", child.constraints.vertical),
            "V: STRETCH".to_string(),
        ));
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn single_edge_issue(
    config: &LayoutConfig,
    child: &SceneNode,
    parent: &SceneNode,
    near_left: bool,
    near_right: bool,
    near_top: bool,
    near_bottom: bool,
) -> Option<LayoutIssue> {
    if !config.check_edge {
        return None;
    }
    let candidates = [
        (Edge::Left, near_left, near_right),
        (Edge::Right, near_right, near_left),
        (Edge::Top, near_top, near_bottom),
        (Edge::Bottom, near_bottom, near_top),
    ];
    for (edge, near, near_opposite) in candidates {
        if !near || near_opposite {
            continue;
        }
        let current = if edge.is_horizontal() {
            child.constraints.horizontal
        } else {
            child.constraints.vertical
        };
        let want = edge.matching_anchor();
        if current == want || current.is_stretchy() {
            continue;
        }
        return Some(issue_for(
            child,
            parent,
            LayoutIssueKind::EdgeNotPinned { edge },
            Severity::Medium,
            format!(
                "\"{}\" sits against the {} edge of \"{}\" but is anchored {}",
                child.name, edge, parent.name, current
            ),
            format!("Anchor it to the {} edge", edge),
            format!("{}: {}", edge.axis_prefix(), current),
            format!("{}: {}", edge.axis_prefix(), want),
        ));
    }
    None
}

/// Fill mismatch for one axis. Inside auto-layout the "fill" lever is
/// the grow flag (primary axis) or the stretch alignment (counter
/// axis); outside it is a STRETCH constraint.
fn fill_issue(child: &SceneNode, parent: &SceneNode, horizontal_axis: bool) -> Option<LayoutIssue> {
    let kind = if horizontal_axis {
        LayoutIssueKind::WideNotFill
    } else {
        LayoutIssueKind::TallNotFill
    };
    let axis_word = if horizontal_axis { "width" } else { "height" };
    let description = format!(
        "\"{}\" takes up nearly the full {} of \"{}\" but is fixed-size",
        child.name, axis_word, parent.name
    );

    let grow_is_lever = match parent.auto_layout.mode {
        LayoutMode::Horizontal => Some(horizontal_axis),
        LayoutMode::Vertical => Some(!horizontal_axis),
        LayoutMode::None => None,
    };
    match grow_is_lever {
        Some(true) => {
            if child.layout_grow != 0.0 {
                return None;
            }
            Some(issue_for(
                child,
                parent,
                kind,
                Severity::Medium,
                description,
                "Let it grow to fill the layout axis".to_string(),
                format!("GROW: {}", child.layout_grow),
                "GROW: 1".to_string(),
            ))
        }
        Some(false) => {
            if child.layout_align == LayoutAlign::Stretch {
                return None;
            }
            Some(issue_for(
                child,
                parent,
                kind,
                Severity::Medium,
                description,
                "Stretch it across the layout's counter axis".to_string(),
                "ALIGN: INHERIT".to_string(),
                "ALIGN: STRETCH".to_string(),
            ))
        }
        None => {
            let (prefix, current) = if horizontal_axis {
                ("H", child.constraints.horizontal)
            } else {
                ("V", child.constraints.vertical)
            };
            if current.is_stretchy() {
                return None;
            }
            Some(issue_for(
                child,
                parent,
                kind,
                Severity::Medium,
                description,
                format!("Use a stretch constraint so it follows the container {}", axis_word),
                format!("{}: {}", prefix, current),
                format!("{}: STRETCH", prefix),
            ))
        }
    }
}

fn center_issue(
    config: &LayoutConfig,
    child: &SceneNode,
    parent: &SceneNode,
) -> Option<LayoutIssue> {
    let (dx, dy) = center_offset(child, parent);
    let centered_h = dx.abs() <= config.center_tolerance_px;
    let centered_v = dy.abs() <= config.center_tolerance_px;
    let off_h = centered_h
        && child.constraints.horizontal != Anchor::Center
        && !child.constraints.horizontal.is_stretchy();
    let off_v = centered_v
        && child.constraints.vertical != Anchor::Center
        && !child.constraints.vertical.is_stretchy();
    if !off_h && !off_v {
        return None;
    }
    let mut actual = Vec::new();
    let mut expected = Vec::new();
    if off_h {
        actual.push(format!("H: {}", child.constraints.horizontal));
        expected.push("H: CENTER".to_string());
    }
    if off_v {
        actual.push(format!("V: {}", child.constraints.vertical));
        expected.push("V: CENTER".to_string());
    }
    let axis_word = match (off_h, off_v) {
        (true, true) => "both axes",
        (true, false) => "the horizontal axis",
        _ => "the vertical axis",
    };
    Some(issue_for(
        child,
        parent,
        LayoutIssueKind::NotCentered {
            horizontal: off_h,
            vertical: off_v,
        },
        Severity::Medium,
        format!(
            "\"{}\" is visually centered in \"{}\" on {} but not anchored to the center",
            child.name, parent.name, axis_word
        ),
        "Anchor it to the center so it stays centered when the container resizes".to_string(),
        actual.join(", "),
        expected.join(", "),
    ))
}

/// The widest child of a horizontal row that dominates its siblings at
/// a fixed width should usually flex instead.
fn check_sibling_fill(
    doc: &Document,
    config: &LayoutConfig,
    container: &SceneNode,
    issues: &mut Vec<LayoutIssue>,
    seen: &mut HashSet<(NodeId, &'static str)>,
) {
    let children: Vec<&SceneNode> = container
        .children
        .iter()
        .filter_map(|&id| doc.find(id))
        .filter(|n| n.node_type != NodeType::Vector)
        .collect();
    if children.len() < 2 {
        return;
    }
    let total: f64 = children.iter().map(|n| n.width).sum();
    if total <= 0.0 {
        return;
    }
    let widest = match children.iter().copied().max_by(|a, b| a.width.total_cmp(&b.width)) {
        Some(widest) => widest,
        None => return,
    };
    let has_small_sibling = children
        .iter()
        .any(|n| n.id != widest.id && n.width < 0.6 * widest.width);
    if widest.width < 0.5 * total || !has_small_sibling || widest.layout_grow != 0.0 {
        return;
    }
    if config.only_defaults && !widest.has_default_resize_behavior() {
        return;
    }
    push_issue(
        issues,
        seen,
        issue_for(
            widest,
            container,
            LayoutIssueKind::SiblingFillCandidate,
            Severity::High,
            format!(
                "\"{}\" takes up most of the row \"{}\" at a fixed width while its siblings stay small",
                widest.name, container.name
            ),
            "Let it grow so the row divides space instead of being dominated".to_string(),
            format!("GROW: {}", widest.layout_grow),
            "GROW: 1".to_string(),
        ),
    );
}
