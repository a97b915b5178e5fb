//! Lint driver: parse a manifest collection, run every check, aggregate.

use crate::checks;
use crate::config::LintConfig;
use crate::parser::{
    MalformedDoc, ParseError, ParsedSet, parse_manifest_file, parse_manifest_path, parse_manifests,
};
use crate::types::Issue;
use log::{debug, info};
use std::path::Path;

/// The outcome of one lint run over a manifest collection.
#[derive(Debug, Clone)]
pub struct LintResult {
    /// Issues in resource order, check order within a resource.
    pub issues: Vec<Issue>,
    /// Documents of recognized kinds that failed shape validation. Each
    /// is reported and fails the run, but never aborts other documents.
    pub malformed: Vec<MalformedDoc>,
    pub summary: LintSummary,
}

#[derive(Debug, Clone, Default)]
pub struct LintSummary {
    /// Parsed documents, including unrecognized kinds.
    pub resources_seen: usize,
    /// Resources whose kind has a check.
    pub resources_checked: usize,
}

impl LintResult {
    /// True when nothing was found: no issues and no malformed documents.
    pub fn passed(&self) -> bool {
        self.issues.is_empty() && self.malformed.is_empty()
    }

    /// Whether the run should exit non-zero under the given config.
    pub fn should_fail(&self, config: &LintConfig) -> bool {
        !config.no_fail && !self.passed()
    }
}

/// Lint a collection read from a string (typically stdin).
pub fn lint_content(content: &str, config: &LintConfig) -> Result<LintResult, ParseError> {
    let set = parse_manifests(content)?;
    Ok(run_checks(set, config))
}

/// Lint a single manifest file.
pub fn lint_file(path: &Path, config: &LintConfig) -> Result<LintResult, ParseError> {
    let set = parse_manifest_file(path)?;
    Ok(run_checks(set, config))
}

/// Lint a file or a directory tree of `*.yaml`/`*.yml` files.
pub fn lint_path(path: &Path, config: &LintConfig) -> Result<LintResult, ParseError> {
    let set = parse_manifest_path(path)?;
    Ok(run_checks(set, config))
}

fn run_checks(set: ParsedSet, config: &LintConfig) -> LintResult {
    let mut issues = Vec::new();
    let mut resources_checked = 0;

    for resource in &set.resources {
        if !checks::is_checked_kind(resource) {
            debug!("skipping {} (no check for kind)", resource.reference());
            continue;
        }
        resources_checked += 1;
        issues.extend(checks::check_resource(resource, &set.resources, config));
    }

    info!(
        "checked {resources_checked}/{} resources, {} issue(s), {} malformed document(s)",
        set.resources.len(),
        issues.len(),
        set.malformed.len()
    );

    LintResult {
        issues,
        summary: LintSummary {
            resources_seen: set.resources.len(),
            resources_checked,
        },
        malformed: set.malformed,
    }
}
