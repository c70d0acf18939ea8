//! Core node types for the scene document

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, opaque handle to a node in a [`Document`](super::Document).
///
/// Ids are never reused within a document. A `NodeId` held across a
/// removal simply stops resolving; it does not dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of node types in a scene document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Page,
    Frame,
    Group,
    Section,
    Component,
    ComponentSet,
    Instance,
    Rectangle,
    Ellipse,
    Vector,
    Text,
}

impl NodeType {
    /// Whether nodes of this type can carry children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Page
                | NodeType::Frame
                | NodeType::Group
                | NodeType::Section
                | NodeType::Component
                | NodeType::ComponentSet
                | NodeType::Instance
        )
    }

    /// Whether this type roots a protected subtree (reusable definition
    /// or stamped copy) that scans skip and mutations treat specially.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            NodeType::Component | NodeType::ComponentSet | NodeType::Instance
        )
    }

    /// Whether a node of this type can serve as an extraction source.
    pub fn is_extractable(self) -> bool {
        matches!(self, NodeType::Frame | NodeType::Group | NodeType::Component)
    }

    /// Display label, as the host would name a fresh node of this type.
    pub fn label(self) -> &'static str {
        match self {
            NodeType::Page => "Page",
            NodeType::Frame => "Frame",
            NodeType::Group => "Group",
            NodeType::Section => "Section",
            NodeType::Component => "Component",
            NodeType::ComponentSet => "Component set",
            NodeType::Instance => "Instance",
            NodeType::Rectangle => "Rectangle",
            NodeType::Ellipse => "Ellipse",
            NodeType::Vector => "Vector",
            NodeType::Text => "Text",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-axis resize rule describing how a node responds to its parent
/// being resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Anchor {
    Min,
    Max,
    Center,
    Stretch,
    Scale,
}

impl Anchor {
    /// Whether this anchor already makes the node track both edges.
    pub fn is_stretchy(self) -> bool {
        matches!(self, Anchor::Stretch | Anchor::Scale)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Anchor::Min => "MIN",
            Anchor::Max => "MAX",
            Anchor::Center => "CENTER",
            Anchor::Stretch => "STRETCH",
            Anchor::Scale => "SCALE",
        };
        write!(f, "{}", s)
    }
}

/// Horizontal + vertical anchor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub horizontal: Anchor,
    pub vertical: Anchor,
}

impl Default for Constraints {
    /// The host's out-of-the-box default: pinned top-left.
    fn default() -> Self {
        Self {
            horizontal: Anchor::Min,
            vertical: Anchor::Min,
        }
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H: {}, V: {}", self.horizontal, self.vertical)
    }
}

/// Axis of an auto-layout container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Counter-axis behavior of a child inside an auto-layout container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutAlign {
    #[default]
    Inherit,
    Stretch,
}

/// How an auto-layout container sizes itself along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMode {
    #[default]
    Fixed,
    Auto,
}

/// Auto-layout properties of a container node.
///
/// `mode == LayoutMode::None` means the container positions children by
/// absolute coordinates and the remaining fields are inert.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLayout {
    pub mode: LayoutMode,
    pub item_spacing: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub primary_sizing: SizingMode,
    pub counter_sizing: SizingMode,
}

/// An RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB channels.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Rgba = Rgba {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Per-channel comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Rgba, tolerance: f64) -> bool {
        (self.r - other.r).abs() <= tolerance
            && (self.g - other.g).abs() <= tolerance
            && (self.b - other.b).abs() <= tolerance
            && (self.a - other.a).abs() <= tolerance
    }

    /// Hex form `#rrggbb` (alpha is not encoded).
    pub fn to_hex(&self) -> String {
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

/// A stop in a gradient paint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Rgba,
}

/// A single paint in a fill or stroke array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Paint {
    Solid { color: Rgba },
    LinearGradient { stops: Vec<GradientStop> },
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Paint::Solid { color }
    }

    /// The solid color of this paint, if it is one.
    pub fn as_solid(&self) -> Option<&Rgba> {
        match self {
            Paint::Solid { color } => Some(color),
            Paint::LinearGradient { .. } => None,
        }
    }
}

/// A single node in the scene document.
///
/// Geometry (`x`, `y`) is relative to the parent; the absolute position
/// is derived by walking the ancestor chain
/// ([`Document::absolute_position`](super::Document::absolute_position)).
/// The parent link is a non-owning back-reference; ownership lives in
/// the parent's `children` order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub constraints: Constraints,
    pub auto_layout: AutoLayout,
    /// Primary-axis flex factor inside an auto-layout parent (0 = fixed).
    pub layout_grow: f64,
    /// Counter-axis behavior inside an auto-layout parent.
    pub layout_align: LayoutAlign,
    pub corner_radius: f64,
    pub clips_content: bool,
    /// Text content; `Some` only for `NodeType::Text`.
    pub characters: Option<String>,
    /// Definition this node is stamped from; `Some` only for instances.
    pub main_component: Option<NodeId>,
}

impl SceneNode {
    /// A fresh detached node with host-default properties.
    pub fn new(id: NodeId, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id,
            node_type,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            fills: Vec::new(),
            strokes: Vec::new(),
            constraints: Constraints::default(),
            auto_layout: AutoLayout::default(),
            layout_grow: 0.0,
            layout_align: LayoutAlign::Inherit,
            corner_radius: 0.0,
            clips_content: false,
            characters: if node_type == NodeType::Text {
                Some(String::new())
            } else {
                None
            },
            main_component: None,
        }
    }

    /// Whether all resize-behavior properties are still at the host's
    /// out-of-the-box defaults (the designer never touched them).
    pub fn has_default_resize_behavior(&self) -> bool {
        self.constraints == Constraints::default()
            && self.layout_grow == 0.0
            && self.layout_align == LayoutAlign::Inherit
    }

    /// Midpoint of this node in parent-relative coordinates.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(42).to_string(), "#42");
    }

    #[test]
    fn test_container_types() {
        assert!(NodeType::Frame.is_container());
        assert!(NodeType::Instance.is_container());
        assert!(!NodeType::Rectangle.is_container());
        assert!(!NodeType::Text.is_container());
    }

    #[test]
    fn test_protected_types() {
        assert!(NodeType::Component.is_protected());
        assert!(NodeType::ComponentSet.is_protected());
        assert!(NodeType::Instance.is_protected());
        assert!(!NodeType::Frame.is_protected());
    }

    #[test]
    fn test_default_constraints() {
        let c = Constraints::default();
        assert_eq!(c.horizontal, Anchor::Min);
        assert_eq!(c.vertical, Anchor::Min);
        assert_eq!(c.to_string(), "H: MIN, V: MIN");
    }

    #[test]
    fn test_rgba_approx_eq() {
        let a = Rgba::rgb(0.5, 0.5, 0.5);
        let b = Rgba::rgb(0.505, 0.5, 0.5);
        assert!(a.approx_eq(&b, 0.01));
        assert!(!a.approx_eq(&b, 0.001));
    }

    #[test]
    fn test_rgba_hex() {
        assert_eq!(Rgba::rgb(1.0, 0.0, 0.0).to_hex(), "#ff0000");
        assert_eq!(Rgba::rgb(0.0, 0.0, 0.0).to_hex(), "#000000");
    }

    #[test]
    fn test_default_resize_behavior() {
        let mut node = SceneNode::new(NodeId(1), NodeType::Rectangle, "Rectangle 1");
        assert!(node.has_default_resize_behavior());
        node.constraints.horizontal = Anchor::Max;
        assert!(!node.has_default_resize_behavior());
    }
}
