//! Output rendering for lint results.

use crate::lint::LintResult;
use crate::resource::Source;
use crate::types::Issue;
use clap::ValueEnum;
use colored::Colorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text, findings grouped by owning resource.
    Plain,
    /// Machine-readable JSON.
    Json,
}

pub fn render(result: &LintResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => render_plain(result),
        OutputFormat::Json => render_json(result),
    }
}

fn source_label(source: &Source) -> String {
    match source.line {
        Some(line) => format!("{}:{}", source.file_path.display(), line),
        None => source.file_path.display().to_string(),
    }
}

/// Group issues by owning resource, preserving first-seen order.
fn group_by_owner(issues: &[Issue]) -> Vec<(&crate::types::ResourceRef, Vec<&Issue>)> {
    let mut groups: Vec<(&crate::types::ResourceRef, Vec<&Issue>)> = Vec::new();
    for issue in issues {
        match groups.iter_mut().find(|(owner, _)| **owner == issue.owner) {
            Some((_, members)) => members.push(issue),
            None => groups.push((&issue.owner, vec![issue])),
        }
    }
    groups
}

fn render_plain(result: &LintResult) -> String {
    let mut output = String::new();

    for (owner, issues) in group_by_owner(&result.issues) {
        output.push_str(&format!("{}\n", owner.to_string().bold()));
        for issue in issues {
            output.push_str(&format!(
                "  [{}] {}\n",
                issue.kind.to_string().yellow(),
                issue.message
            ));
        }
    }

    for doc in &result.malformed {
        output.push_str(&format!(
            "{} ({}): {} {}\n",
            doc.resource.to_string().bold(),
            source_label(&doc.source),
            "malformed:".red(),
            doc.detail
        ));
    }

    if result.passed() {
        output.push_str(&format!("{}\n", "No cross-reference issues found.".green()));
    } else {
        output.push_str(&format!(
            "\nFound {} issue(s) across {} resource(s).\n",
            result.issues.len() + result.malformed.len(),
            result.summary.resources_seen,
        ));
    }

    output
}

fn render_json(result: &LintResult) -> String {
    let resources: Vec<_> = group_by_owner(&result.issues)
        .into_iter()
        .map(|(owner, issues)| {
            json!({
                "kind": owner.kind,
                "name": owner.name,
                "issues": issues
                    .iter()
                    .map(|i| json!({ "kind": i.kind, "message": i.message }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    let malformed: Vec<_> = result
        .malformed
        .iter()
        .map(|doc| {
            json!({
                "kind": doc.resource.kind,
                "name": doc.resource.name,
                "source": source_label(&doc.source),
                "detail": doc.detail,
            })
        })
        .collect();

    let value = json!({
        "passed": result.passed(),
        "total": result.issues.len() + result.malformed.len(),
        "resourcesSeen": result.summary.resources_seen,
        "resourcesChecked": result.summary.resources_checked,
        "resources": resources,
        "malformed": malformed,
    });

    // json! never produces non-serializable values
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
