//! Layout-intent analysis and repair
//!
//! This module infers the responsive behavior a node's geometry
//! suggests it should have, flags mismatches against the behavior the
//! node declares, and applies the one-step corrective mutation for each
//! mismatch kind.

pub mod config;
pub mod fix;
pub mod geometry;
pub mod heuristics;

pub use config::{ConfigError, LayoutConfig};
pub use fix::{apply_fix, fix_all, BatchOutcome, FixOutcome};
pub use geometry::{center_offset, edge_gaps, inner_box, EdgeGaps, InnerBox};
pub use heuristics::{scan_layout, Edge, LayoutIssue, LayoutIssueKind, Severity};
