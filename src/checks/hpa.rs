//! HorizontalPodAutoscaler scale target resolution.

use crate::resource::{HpaData, Resource};
use crate::types::{Issue, IssueKind, ResourceRef};
use log::debug;

/// Resolve `spec.scaleTargetRef` against the collection. Kind, apiVersion
/// and name must all match; an absent apiVersion on the ref leaves that
/// field unconstrained.
pub fn check_hpa(hpa: &HpaData, owner: &ResourceRef, resources: &[Resource]) -> Vec<Issue> {
    let target = &hpa.scale_target_ref;
    if target.api_version.is_none() {
        debug!("{owner}: scaleTargetRef has no apiVersion, matching kind and name only");
    }
    let exists = resources.iter().any(|r| {
        r.kind() == target.kind
            && r.name() == target.name
            && target
                .api_version
                .as_deref()
                .is_none_or(|v| r.api_version == v)
    });

    if exists {
        return Vec::new();
    }

    let api_version = target
        .api_version
        .as_deref()
        .map(|v| format!("{v} "))
        .unwrap_or_default();
    vec![Issue::new(
        owner.clone(),
        IssueKind::ReferenceMissing,
        format!(
            "spec.scaleTargetRef {api_version}{}/{} does not exist",
            target.kind, target.name
        ),
    )]
}
