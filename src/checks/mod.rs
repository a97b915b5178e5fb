//! The reference-checking rule engine.
//!
//! One check per resource kind, each consuming one resource plus the full
//! collection and producing zero or more issues. Checks are pure: they
//! never mutate the collection and running one twice yields the same
//! issue list. Unrecognized kinds are never dispatched.

pub mod hpa;
pub mod ingress;
pub mod lookup;
pub mod pod_monitor;
pub mod service;
pub mod workload;

use crate::config::LintConfig;
use crate::resource::{ContainerSpec, LabelSet, Resource, ResourceData, WorkloadData};
use crate::types::Issue;

/// Dispatch a resource to the check for its kind. Unmatched kinds yield
/// no issues.
pub fn check_resource(resource: &Resource, resources: &[Resource], config: &LintConfig) -> Vec<Issue> {
    let owner = resource.reference();
    match &resource.data {
        ResourceData::Deployment(w) | ResourceData::StatefulSet(w) => {
            workload::check_workload(w, &owner, resources, config)
        }
        ResourceData::Service(s) => service::check_service(s, &owner, resources),
        ResourceData::Ingress(i) => ingress::check_ingress(i, &owner, resources, config),
        ResourceData::HorizontalPodAutoscaler(h) => hpa::check_hpa(h, &owner, resources),
        ResourceData::PodMonitor(p) => pod_monitor::check_pod_monitor(p, &owner, resources),
        _ => Vec::new(),
    }
}

/// Whether a resource's kind has a check at all.
pub fn is_checked_kind(resource: &Resource) -> bool {
    matches!(
        resource.data,
        ResourceData::Deployment(_)
            | ResourceData::StatefulSet(_)
            | ResourceData::Service(_)
            | ResourceData::Ingress(_)
            | ResourceData::HorizontalPodAutoscaler(_)
            | ResourceData::PodMonitor(_)
    )
}

pub(crate) fn fmt_labels(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn as_workload(resource: &Resource) -> Option<&WorkloadData> {
    match &resource.data {
        ResourceData::Deployment(w) | ResourceData::StatefulSet(w) => Some(w),
        _ => None,
    }
}

pub(crate) fn exposes_port_named(workload: &WorkloadData, port: &str) -> bool {
    workload
        .all_containers()
        .any(|c| c.ports.iter().any(|p| p.name.as_deref() == Some(port)))
}

pub(crate) fn container_label(container: &ContainerSpec) -> String {
    match &container.image {
        Some(image) => format!("{} ({})", container.name, image),
        None => container.name.clone(),
    }
}
