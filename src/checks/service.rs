//! Service selector and port resolution.

use crate::checks::lookup::find_pod_template_owner;
use crate::checks::{as_workload, exposes_port_named, fmt_labels};
use crate::resource::{Resource, ServiceData};
use crate::types::{Issue, IssueKind, ResourceRef};

/// Resolve the Service selector to a pod-template-owning resource, then
/// verify every named port on the Service is exposed by some container of
/// that resource. A Service without a selector declares no reference.
pub fn check_service(service: &ServiceData, owner: &ResourceRef, resources: &[Resource]) -> Vec<Issue> {
    let mut issues = Vec::new();

    let Some(selector) = &service.selector else {
        return issues;
    };

    let Some(target) = find_pod_template_owner(selector, resources) else {
        issues.push(Issue::new(
            owner.clone(),
            IssueKind::SelectorEmptyMatch,
            format!(
                "spec.selector ({}) does not match any pod template",
                fmt_labels(selector)
            ),
        ));
        return issues;
    };

    // find_pod_template_owner only returns workloads
    let Some(workload) = as_workload(target) else {
        return issues;
    };

    for port in service.ports.iter().filter_map(|p| p.name.as_deref()) {
        if !exposes_port_named(workload, port) {
            issues.push(Issue::new(
                owner.clone(),
                IssueKind::PortMissing,
                format!(
                    "port {port} is not exposed by any container of {}",
                    target.reference()
                ),
            ));
        }
    }

    issues
}
