//! Scene Doctor - structural analysis and repair for layered design
//! documents
//!
//! This library scans a scene document (a tree of frames, groups,
//! shapes, and text) for layout-intent mismatches and naming problems,
//! finds structurally duplicated subtrees, and rewrites the tree to
//! replace duplicates with instances of a shared definition while
//! preserving positions, z-order, and per-copy content.
//!
//! # Example
//!
//! ```rust
//! use scene_doctor::document::{Document, NodeType};
//! use scene_doctor::layout::{scan_layout, LayoutConfig};
//!
//! let mut doc = Document::new();
//! let page = doc.create_page("Page 1");
//! let frame = doc.create_frame("Card");
//! doc.append_child(page, frame).unwrap();
//! {
//!     let f = doc.node_mut(frame).unwrap();
//!     f.width = 200.0;
//!     f.height = 100.0;
//! }
//! // A badge hugging the bottom-right corner, still anchored top-left.
//! let badge = doc.create_node(NodeType::Rectangle, "Badge");
//! doc.append_child(frame, badge).unwrap();
//! {
//!     let b = doc.node_mut(badge).unwrap();
//!     b.x = 175.0;
//!     b.y = 85.0;
//!     b.width = 20.0;
//!     b.height = 10.0;
//! }
//!
//! let issues = scan_layout(&doc, &LayoutConfig::default());
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].expected, "H: MAX, V: MAX");
//! ```

pub mod cleanup;
pub mod component;
pub mod document;
pub mod layout;
pub mod report;

pub use cleanup::{
    apply_cleanup_fix, fix_all_cleanup, scan_cleanup, CleanupIssue, CleanupIssueKind,
};
pub use component::{
    combine, convert, scan_components, CombineReport, CombineRequest, ComponentGroup,
    ConvertReport, ConvertRequest, DiffEntry, NodeSnapshot, ScanOptions,
};
pub use document::{Document, DocumentError, NodeId, NodeType, SceneNode};
pub use layout::{
    apply_fix, fix_all, scan_layout, BatchOutcome, LayoutConfig, LayoutIssue, LayoutIssueKind,
};
