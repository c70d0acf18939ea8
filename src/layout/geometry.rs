//! Box-model helpers for the layout heuristics
//!
//! Pure functions over a node and its container's box model. Containers
//! without auto-layout have no padding, so the inner content area is the
//! full box; missing padding always degrades to zero rather than
//! failing.

use crate::document::node::SceneNode;

/// A container's inner content area: its box minus padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerBox {
    pub width: f64,
    pub height: f64,
    pub padding_left: f64,
    pub padding_top: f64,
}

/// Distances from a node's edges to the inner edges of its container.
/// Negative gaps mean the node overhangs that edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeGaps {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Compute a container's inner content area.
pub fn inner_box(container: &SceneNode) -> InnerBox {
    let al = &container.auto_layout;
    let width = (container.width - al.padding_left - al.padding_right).max(0.0);
    let height = (container.height - al.padding_top - al.padding_bottom).max(0.0);
    InnerBox {
        width,
        height,
        padding_left: al.padding_left,
        padding_top: al.padding_top,
    }
}

/// Gaps from a child's edges to its container's inner edges.
pub fn edge_gaps(child: &SceneNode, container: &SceneNode) -> EdgeGaps {
    let inner = inner_box(container);
    let left = child.x - inner.padding_left;
    let top = child.y - inner.padding_top;
    EdgeGaps {
        left,
        right: inner.width - (left + child.width),
        top,
        bottom: inner.height - (top + child.height),
    }
}

/// Offset of a child's midpoint from its container's inner midpoint,
/// per axis. Values near zero mean the child is visually centered.
pub fn center_offset(child: &SceneNode, container: &SceneNode) -> (f64, f64) {
    let inner = inner_box(container);
    let (cx, cy) = child.center();
    let dx = cx - (inner.padding_left + inner.width / 2.0);
    let dy = cy - (inner.padding_top + inner.height / 2.0);
    (dx, dy)
}
