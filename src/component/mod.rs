//! Duplicate detection and componentization
//!
//! Finds structurally equivalent subtrees anywhere in the document,
//! diffs their content, and rewrites the tree so the duplicates share
//! one reusable definition — or merges a hand-picked selection into a
//! discriminated variant family.

pub mod diff;
pub mod extract;
pub mod fingerprint;
pub mod variants;

pub use diff::{apply_overrides, diff_against_master, diff_group, DiffEntry, FillDiff, TextDiff};
pub use extract::{convert, ConvertReport, ConvertRequest, MemberFailure};
pub use fingerprint::{
    fingerprint, scan_components, ComponentGroup, NodeSnapshot, ScanOptions,
};
pub use variants::{combine, CombineReport, CombineRequest};
