//! One-shot fixers for hygiene issues
//!
//! Fixers are idempotent-guarded: applying one to a node that no longer
//! needs it fails loudly with a descriptive error instead of silently
//! doing nothing, so a batch UI can tell "already fine" from "fixed".

use crate::document::{Document, DocumentError};
use crate::layout::fix::{BatchOutcome, FixOutcome};

use super::{CleanupIssue, CleanupIssueKind};

/// Apply the paired fixer for a single hygiene issue.
pub fn apply_cleanup_fix(doc: &mut Document, issue: &CleanupIssue) -> Result<String, DocumentError> {
    match &issue.kind {
        CleanupIssueKind::DefaultName => Err(DocumentError::validation(
            "default names need a human-chosen replacement",
        )),
        CleanupIssueKind::ForeignCharacters { replacement }
        | CleanupIssueKind::CaseMismatch { replacement, .. } => {
            let node = doc.node_mut(issue.node_id)?;
            if node.name == *replacement {
                return Err(DocumentError::validation(format!(
                    "\"{}\" is already named that way",
                    node.name
                )));
            }
            node.name = replacement.clone();
            Ok(format!("renamed to \"{}\"", replacement))
        }
        CleanupIssueKind::EmptyContainer => {
            let node = doc.node(issue.node_id)?;
            if !node.children.is_empty() {
                return Err(DocumentError::validation(format!(
                    "\"{}\" is no longer empty",
                    node.name
                )));
            }
            doc.remove(issue.node_id)?;
            Ok("removed".to_string())
        }
        CleanupIssueKind::ZeroSize => {
            let node = doc.node(issue.node_id)?;
            if node.width > 0.0 && node.height > 0.0 {
                return Err(DocumentError::validation(format!(
                    "\"{}\" has a size now",
                    node.name
                )));
            }
            doc.remove(issue.node_id)?;
            Ok("removed".to_string())
        }
    }
}

/// Apply fixers for a whole issue list, sequentially and in caller
/// order. A failing item never aborts the rest.
pub fn fix_all_cleanup(doc: &mut Document, issues: &[CleanupIssue]) -> BatchOutcome {
    let mut batch = BatchOutcome::default();
    for issue in issues {
        let result = apply_cleanup_fix(doc, issue);
        match &result {
            Ok(_) => batch.fixed += 1,
            Err(err) => {
                log::warn!("cleanup fix for {} failed: {}", issue.node_id, err);
                batch.failed += 1;
            }
        }
        batch.outcomes.push(FixOutcome {
            node_id: issue.node_id,
            node_name: issue.node_name.clone(),
            kind: issue.kind.key(),
            result,
        });
    }
    batch
}
