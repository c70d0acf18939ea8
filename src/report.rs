//! Plain-text rendering of scan and mutation results
//!
//! The engines return structured data; this module turns it into the
//! stable, human-readable form the CLI prints. Formatting is
//! deterministic so reports can be snapshot-tested.

use crate::cleanup::CleanupIssue;
use crate::component::{CombineReport, ComponentGroup, ConvertReport};
use crate::layout::{BatchOutcome, LayoutIssue};

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Render the layout scan result.
pub fn render_layout_issues(issues: &[LayoutIssue]) -> String {
    if issues.is_empty() {
        return "No layout issues found.\n".to_string();
    }
    let mut out = format!("{} layout issue{}\n", issues.len(), plural(issues.len()));
    for issue in issues {
        out.push_str(&format!(
            "\n[{}] {} \"{}\" in \"{}\"\n",
            issue.severity,
            issue.kind.key(),
            issue.node_name,
            issue.parent_name
        ));
        out.push_str(&format!("  {}\n", issue.description));
        out.push_str(&format!("  now: {}  want: {}\n", issue.actual, issue.expected));
    }
    out
}

/// Render the cleanup scan result.
pub fn render_cleanup_issues(issues: &[CleanupIssue]) -> String {
    if issues.is_empty() {
        return "No cleanup issues found.\n".to_string();
    }
    let mut out = format!("{} cleanup issue{}\n", issues.len(), plural(issues.len()));
    for issue in issues {
        out.push_str(&format!(
            "\n[{}] \"{}\" ({})\n",
            issue.kind.key(),
            issue.node_name,
            issue.node_id
        ));
        out.push_str(&format!("  {}\n", issue.description));
        out.push_str(&format!("  {}\n", issue.suggestion));
    }
    out
}

/// Render the duplicate-group scan result.
pub fn render_groups(groups: &[ComponentGroup]) -> String {
    if groups.is_empty() {
        return "No duplicate groups found.\n".to_string();
    }
    let mut out = format!("{} duplicate group{}\n", groups.len(), plural(groups.len()));
    for group in groups {
        let pages = group.pages.join(", ");
        let marker = if group.has_diffs {
            " [content differs]"
        } else {
            ""
        };
        out.push_str(&format!(
            "\n\"{}\": {} matches across {}{}\n",
            group.label,
            group.nodes.len(),
            pages,
            marker
        ));
        for node in &group.nodes {
            out.push_str(&format!(
                "  {} \"{}\" at ({:.0}, {:.0}) in \"{}\"\n",
                node.id, node.name, node.absolute_x, node.absolute_y, node.parent_name
            ));
        }
    }
    out
}

/// Render a fix-all outcome, layout or cleanup.
pub fn render_batch(batch: &BatchOutcome) -> String {
    let mut out = format!("fixed {}, failed {}\n", batch.fixed, batch.failed);
    for outcome in &batch.outcomes {
        match &outcome.result {
            Ok(detail) => out.push_str(&format!(
                "  ok   {} \"{}\": {}\n",
                outcome.kind, outcome.node_name, detail
            )),
            Err(err) => out.push_str(&format!(
                "  fail {} \"{}\": {}\n",
                outcome.kind, outcome.node_name, err
            )),
        }
    }
    out
}

/// Render extraction outcomes.
pub fn render_convert_reports(reports: &[ConvertReport]) -> String {
    let mut out = String::new();
    for report in reports {
        match (&report.error, report.component) {
            (Some(error), _) => {
                out.push_str(&format!("\"{}\": aborted: {}\n", report.label, error));
            }
            (None, Some(component)) => {
                out.push_str(&format!(
                    "\"{}\": definition {}, {} instance{} placed\n",
                    report.label,
                    component,
                    report.instanced,
                    plural(report.instanced)
                ));
                for failure in &report.failures {
                    out.push_str(&format!(
                        "  failed {}: {}\n",
                        failure.node_id, failure.reason
                    ));
                }
            }
            (None, None) => {
                out.push_str(&format!("\"{}\": nothing converted\n", report.label));
            }
        }
    }
    out
}

/// Render a variant-combine outcome.
pub fn render_combine_report(report: &CombineReport) -> String {
    let mut out = format!(
        "component set {} with {} variant{}\n",
        report.component_set,
        report.variants,
        plural(report.variants)
    );
    for error in &report.errors {
        out.push_str(&format!("  problem: {}\n", error));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::{NodeId, NodeType};
    use crate::layout::heuristics::{Edge, LayoutIssueKind, Severity};
    use pretty_assertions::assert_eq;

    fn sample_issue() -> LayoutIssue {
        LayoutIssue {
            node_id: NodeId(7),
            node_name: "Badge".to_string(),
            node_type: NodeType::Rectangle,
            parent_id: NodeId(3),
            parent_name: "Card".to_string(),
            kind: LayoutIssueKind::CornerNotPinned {
                horizontal: Edge::Right,
                vertical: Edge::Bottom,
            },
            severity: Severity::High,
            description:
                "\"Badge\" hugs the bottom-right corner of \"Card\" but is anchored H: MIN, V: MIN"
                    .to_string(),
            suggestion: "Pin it to the bottom-right corner so it stays put when \"Card\" resizes"
                .to_string(),
            actual: "H: MIN, V: MIN".to_string(),
            expected: "H: MAX, V: MAX".to_string(),
        }
    }

    #[test]
    fn test_empty_reports() {
        assert_eq!(render_layout_issues(&[]), "No layout issues found.\n");
        assert_eq!(render_cleanup_issues(&[]), "No cleanup issues found.\n");
        assert_eq!(render_groups(&[]), "No duplicate groups found.\n");
    }

    #[test]
    fn test_layout_report_snapshot() {
        let rendered = render_layout_issues(&[sample_issue()]);
        insta::assert_snapshot!(rendered, @r###"
        1 layout issue

        [high] corner-not-pinned "Badge" in "Card"
          "Badge" hugs the bottom-right corner of "Card" but is anchored H: MIN, V: MIN
          now: H: MIN, V: MIN  want: H: MAX, V: MAX
        "###);
    }

    #[test]
    fn test_layout_report_counts() {
        let rendered = render_layout_issues(&[sample_issue(), sample_issue()]);
        assert!(rendered.starts_with("2 layout issues\n"));
    }
}
