//! Corrective mutations for layout mismatches
//!
//! Every [`LayoutIssue`] carries its remedy in the `expected` field,
//! written in a small `H: MAX, V: STRETCH` / `GROW: 1` / `ALIGN:
//! STRETCH` grammar. The dispatcher parses that and writes the implied
//! property values onto the node. Re-applying a fix that already took
//! effect is a no-op that still reports success, so batch UIs can
//! re-run safely.

use crate::document::node::{Anchor, LayoutAlign, NodeId, NodeType};
use crate::document::{Document, DocumentError};

use super::heuristics::LayoutIssue;

/// Result of fixing one issue.
#[derive(Debug)]
pub struct FixOutcome {
    pub node_id: NodeId,
    pub node_name: String,
    pub kind: &'static str,
    pub result: Result<String, DocumentError>,
}

/// Aggregate result of a fix-all run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outcomes: Vec<FixOutcome>,
    pub fixed: usize,
    pub failed: usize,
}

/// One property write implied by an `expected` clause.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Assignment {
    Horizontal(Anchor),
    Vertical(Anchor),
    Grow(f64),
    Align(LayoutAlign),
}

fn parse_anchor(value: &str) -> Option<Anchor> {
    match value {
        "MIN" => Some(Anchor::Min),
        "MAX" => Some(Anchor::Max),
        "CENTER" => Some(Anchor::Center),
        "STRETCH" => Some(Anchor::Stretch),
        "SCALE" => Some(Anchor::Scale),
        _ => None,
    }
}

fn parse_expected(expected: &str) -> Result<Vec<Assignment>, DocumentError> {
    let mut assignments = Vec::new();
    for clause in expected.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let (key, value) = clause.split_once(':').ok_or_else(|| {
            DocumentError::validation(format!("malformed expectation clause \"{}\"", clause))
        })?;
        let value = value.trim();
        let assignment = match key.trim() {
            "H" => parse_anchor(value).map(Assignment::Horizontal),
            "V" => parse_anchor(value).map(Assignment::Vertical),
            "GROW" => value.parse::<f64>().ok().map(Assignment::Grow),
            "ALIGN" => match value {
                "STRETCH" => Some(Assignment::Align(LayoutAlign::Stretch)),
                "INHERIT" => Some(Assignment::Align(LayoutAlign::Inherit)),
                _ => None,
            },
            _ => None,
        };
        match assignment {
            Some(a) => assignments.push(a),
            None => {
                return Err(DocumentError::validation(format!(
                    "malformed expectation clause \"{}\"",
                    clause
                )))
            }
        }
    }
    if assignments.is_empty() {
        return Err(DocumentError::validation(format!(
            "expectation \"{}\" contains nothing to apply",
            expected
        )));
    }
    Ok(assignments)
}

/// Apply the corrective mutation for a single issue.
///
/// Fails with `NotFound` when the node was deleted since the scan and
/// `Unsupported` when the node cannot carry the implied property; both
/// are per-item failures that callers should surface without aborting a
/// batch.
pub fn apply_fix(doc: &mut Document, issue: &LayoutIssue) -> Result<String, DocumentError> {
    let assignments = parse_expected(&issue.expected)?;
    let node = doc.node_mut(issue.node_id)?;
    if node.node_type == NodeType::Page {
        return Err(DocumentError::unsupported(
            issue.node_id,
            "a Page has no resize behavior to fix",
        ));
    }
    let mut changed = false;
    for assignment in assignments {
        match assignment {
            Assignment::Horizontal(anchor) => {
                if node.constraints.horizontal != anchor {
                    node.constraints.horizontal = anchor;
                    changed = true;
                }
            }
            Assignment::Vertical(anchor) => {
                if node.constraints.vertical != anchor {
                    node.constraints.vertical = anchor;
                    changed = true;
                }
            }
            Assignment::Grow(factor) => {
                if node.layout_grow != factor {
                    node.layout_grow = factor;
                    changed = true;
                }
            }
            Assignment::Align(align) => {
                if node.layout_align != align {
                    node.layout_align = align;
                    changed = true;
                }
            }
        }
    }
    Ok(if changed {
        format!("set {}", issue.expected)
    } else {
        "already satisfied".to_string()
    })
}

/// Apply fixes for a whole issue list, sequentially and in caller
/// order. A failing item never aborts the rest.
pub fn fix_all(doc: &mut Document, issues: &[LayoutIssue]) -> BatchOutcome {
    let mut batch = BatchOutcome::default();
    for issue in issues {
        let result = apply_fix(doc, issue);
        match &result {
            Ok(_) => batch.fixed += 1,
            Err(err) => {
                log::warn!("layout fix for {} failed: {}", issue.node_id, err);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::NodeType;
    use crate::layout::config::LayoutConfig;
    use crate::layout::heuristics::scan_layout;

    fn corner_fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let page = doc.create_page("Page 1");
        let frame = doc.create_frame("Card");
        doc.append_child(page, frame).unwrap();
        doc.node_mut(frame).unwrap().width = 200.0;
        doc.node_mut(frame).unwrap().height = 100.0;
        let child = doc.create_node(NodeType::Rectangle, "Badge");
        doc.append_child(frame, child).unwrap();
        {
            let c = doc.node_mut(child).unwrap();
            c.x = 175.0;
            c.y = 85.0;
            c.width = 20.0;
            c.height = 10.0;
        }
        (doc, child)
    }

    #[test]
    fn test_fix_applies_expected_anchors() {
        let (mut doc, child) = corner_fixture();
        let issues = scan_layout(&doc, &LayoutConfig::default());
        assert_eq!(issues.len(), 1);
        apply_fix(&mut doc, &issues[0]).unwrap();
        let c = doc.node(child).unwrap();
        assert_eq!(c.constraints.horizontal, Anchor::Max);
        assert_eq!(c.constraints.vertical, Anchor::Max);
        // The document is clean afterwards.
        assert!(scan_layout(&doc, &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn test_fix_is_idempotent() {
        let (mut doc, child) = corner_fixture();
        let issues = scan_layout(&doc, &LayoutConfig::default());
        assert_eq!(apply_fix(&mut doc, &issues[0]).unwrap(), "set H: MAX, V: MAX");
        assert_eq!(apply_fix(&mut doc, &issues[0]).unwrap(), "already satisfied");
        assert_eq!(
            doc.node(child).unwrap().constraints.horizontal,
            Anchor::Max
        );
    }

    #[test]
    fn test_batch_partial_failure() {
        let (mut doc, child) = corner_fixture();
        let mut issues = scan_layout(&doc, &LayoutConfig::default());
        // A stale issue referencing a node deleted after the scan,
        // deliberately placed first.
        let mut stale = issues[0].clone();
        let doomed = doc.create_frame("doomed");
        let page = doc.pages()[0];
        doc.append_child(page, doomed).unwrap();
        stale.node_id = doomed;
        doc.remove(doomed).unwrap();
        issues.insert(0, stale);

        let batch = fix_all(&mut doc, &issues);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.fixed, 1);
        assert!(matches!(
            batch.outcomes[0].result,
            Err(DocumentError::NotFound { .. })
        ));
        // The valid fix landed despite the stale entry before it.
        assert_eq!(
            doc.node(child).unwrap().constraints.horizontal,
            Anchor::Max
        );
    }

    #[test]
    fn test_malformed_expectation_is_validation_error() {
        let (mut doc, _) = corner_fixture();
        let mut issue = scan_layout(&doc, &LayoutConfig::default()).remove(0);
        issue.expected = "sideways".to_string();
        assert!(matches!(
            apply_fix(&mut doc, &issue),
            Err(DocumentError::Validation { .. })
        ));
    }

    #[test]
    fn test_grow_expectation() {
        let (mut doc, child) = corner_fixture();
        let mut issue = scan_layout(&doc, &LayoutConfig::default()).remove(0);
        issue.expected = "GROW: 1".to_string();
        apply_fix(&mut doc, &issue).unwrap();
        assert_eq!(doc.node(child).unwrap().layout_grow, 1.0);
    }
}
