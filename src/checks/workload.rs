//! Deployment/StatefulSet reference resolution.
//!
//! Five independent sub-checks accumulate into one issue list:
//! selector/template label consistency, volume resolution, container
//! `envFrom` resolution, `env[].valueFrom.configMapKeyRef` resolution and
//! `env[].valueFrom.secretKeyRef` resolution. `fieldRef` value sources
//! are never checked. Containers are traversed regular-first, then init
//! containers.

use crate::checks::lookup::{find_by_kind_and_name, labels_match, secret_key_in_sops_template};
use crate::checks::{container_label, fmt_labels};
use crate::config::LintConfig;
use crate::resource::{
    ContainerSpec, EnvVarSource, KeySelector, Resource, ResourceData, WorkloadData,
};
use crate::types::{Issue, IssueKind, ResourceRef};

pub fn check_workload(
    workload: &WorkloadData,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    check_selector(workload, owner, &mut issues);
    check_volumes(workload, owner, resources, &mut issues);
    for container in workload.all_containers() {
        check_env_from(container, owner, resources, config, &mut issues);
        check_env_values(container, owner, resources, config, &mut issues);
    }

    issues
}

/// Every selector key must be present and equal in the template labels;
/// extra template labels are fine. `matchExpressions` is not supported.
fn check_selector(workload: &WorkloadData, owner: &ResourceRef, issues: &mut Vec<Issue>) {
    if !labels_match(&workload.match_labels, &workload.template_labels) {
        issues.push(Issue::new(
            owner.clone(),
            IssueKind::SelectorMismatch,
            format!(
                "spec.selector.matchLabels ({}) does not match spec.template.metadata.labels ({})",
                fmt_labels(&workload.match_labels),
                fmt_labels(&workload.template_labels)
            ),
        ));
    }
}

fn check_volumes(
    workload: &WorkloadData,
    owner: &ResourceRef,
    resources: &[Resource],
    issues: &mut Vec<Issue>,
) {
    for volume in &workload.volumes {
        if let Some(cm_source) = &volume.config_map {
            match find_by_kind_and_name("ConfigMap", &cm_source.name, resources) {
                None => issues.push(Issue::new(
                    owner.clone(),
                    IssueKind::ReferenceMissing,
                    format!(
                        "volume {} references ConfigMap {} which does not exist",
                        volume.name, cm_source.name
                    ),
                )),
                Some(found) => {
                    if let ResourceData::ConfigMap(cm) = &found.data {
                        for key in &cm_source.item_keys {
                            if !cm.data.contains_key(key) {
                                issues.push(Issue::new(
                                    owner.clone(),
                                    IssueKind::KeyMissing,
                                    format!(
                                        "volume {} references key {key} which does not exist in ConfigMap {}",
                                        volume.name, cm_source.name
                                    ),
                                ));
                            }
                        }
                    }
                }
            }
        }

        if let Some(pvc) = &volume.persistent_volume_claim {
            if find_by_kind_and_name("PersistentVolumeClaim", &pvc.claim_name, resources).is_none()
            {
                issues.push(Issue::new(
                    owner.clone(),
                    IssueKind::ReferenceMissing,
                    format!(
                        "volume {} references PersistentVolumeClaim {} which does not exist",
                        volume.name, pvc.claim_name
                    ),
                ));
            }
        }
    }
}

fn check_env_from(
    container: &ContainerSpec,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
    issues: &mut Vec<Issue>,
) {
    for entry in &container.env_from {
        if let Some(cm_ref) = &entry.config_map_ref {
            if !cm_ref.optional
                && !config.skip_configmaps.contains(&cm_ref.name)
                && find_by_kind_and_name("ConfigMap", &cm_ref.name, resources).is_none()
            {
                issues.push(Issue::new(
                    owner.clone(),
                    IssueKind::ReferenceMissing,
                    format!(
                        "container {}: envFrom[].configMapRef references ConfigMap {} which does not exist",
                        container_label(container),
                        cm_ref.name
                    ),
                ));
            }
        }

        if let Some(secret_ref) = &entry.secret_ref {
            if !secret_ref.optional
                && !config.skip_secrets.contains(&secret_ref.name)
                && find_by_kind_and_name("Secret", &secret_ref.name, resources).is_none()
            {
                issues.push(Issue::new(
                    owner.clone(),
                    IssueKind::ReferenceMissing,
                    format!(
                        "container {}: envFrom[].secretRef references Secret {} which does not exist",
                        container_label(container),
                        secret_ref.name
                    ),
                ));
            }
        }
    }
}

fn check_env_values(
    container: &ContainerSpec,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
    issues: &mut Vec<Issue>,
) {
    for env in &container.env {
        match &env.value_from {
            Some(EnvVarSource::ConfigMapKeyRef(selector)) => {
                check_config_map_key(container, &env.name, selector, owner, resources, config, issues);
            }
            Some(EnvVarSource::SecretKeyRef(selector)) => {
                check_secret_key(container, &env.name, selector, owner, resources, config, issues);
            }
            // fieldRef value sources are not checked
            Some(EnvVarSource::FieldRef { .. }) | None => {}
        }
    }
}

fn check_config_map_key(
    container: &ContainerSpec,
    env_name: &str,
    selector: &KeySelector,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
    issues: &mut Vec<Issue>,
) {
    if selector.optional || config.skip_configmaps.contains(&selector.name) {
        return;
    }

    match find_by_kind_and_name("ConfigMap", &selector.name, resources) {
        None => issues.push(Issue::new(
            owner.clone(),
            IssueKind::ReferenceMissing,
            format!(
                "container {}, env {env_name}: valueFrom.configMapKeyRef references ConfigMap {} which does not exist",
                container_label(container),
                selector.name
            ),
        )),
        Some(found) => {
            if let ResourceData::ConfigMap(cm) = &found.data {
                if !cm.data.contains_key(&selector.key) {
                    issues.push(Issue::new(
                        owner.clone(),
                        IssueKind::KeyMissing,
                        format!(
                            "container {}, env {env_name}: key {} does not exist in ConfigMap {}",
                            container_label(container),
                            selector.key,
                            selector.name
                        ),
                    ));
                }
            }
        }
    }
}

fn check_secret_key(
    container: &ContainerSpec,
    env_name: &str,
    selector: &KeySelector,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
    issues: &mut Vec<Issue>,
) {
    if selector.optional || config.skip_secrets.contains(&selector.name) {
        return;
    }

    // Secrets materialized by the sops operator never appear as plain
    // Secret resources in the collection.
    if secret_key_in_sops_template(&selector.name, &selector.key, resources) {
        return;
    }

    match find_by_kind_and_name("Secret", &selector.name, resources) {
        None => issues.push(Issue::new(
            owner.clone(),
            IssueKind::ReferenceMissing,
            format!(
                "container {}, env {env_name}: valueFrom.secretKeyRef references Secret {} which does not exist",
                container_label(container),
                selector.name
            ),
        )),
        Some(found) => {
            if let ResourceData::Secret(secret) = &found.data {
                if !secret.has_key(&selector.key) {
                    issues.push(Issue::new(
                        owner.clone(),
                        IssueKind::KeyMissing,
                        format!(
                            "container {}, env {env_name}: key {} does not exist in Secret {}",
                            container_label(container),
                            selector.key,
                            selector.name
                        ),
                    ));
                }
            }
        }
    }
}
