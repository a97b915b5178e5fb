//! Lookup primitives over the full resource collection.
//!
//! All lookups are linear scans; "not found" is an `Option`, never an
//! error. With duplicate kind+name pairs the first match in collection
//! order wins and later ones are silently ignored.

use crate::resource::{LabelSet, Resource, ResourceData};

/// One-directional subset match: every key in `selector` must be present
/// in `target` with an equal value. Keys only present in `target` are
/// ignored. An empty selector matches everything.
pub fn labels_match(selector: &LabelSet, target: &LabelSet) -> bool {
    selector
        .iter()
        .all(|(key, value)| target.get(key).is_some_and(|v| v == value))
}

/// Find the first resource whose kind tag AND name both match.
pub fn find_by_kind_and_name<'a>(
    kind: &str,
    name: &str,
    resources: &'a [Resource],
) -> Option<&'a Resource> {
    resources
        .iter()
        .find(|r| r.kind() == kind && r.name() == name)
}

/// Find the first Deployment or StatefulSet whose pod template labels are
/// a superset of the given selector.
pub fn find_pod_template_owner<'a>(
    selector: &LabelSet,
    resources: &'a [Resource],
) -> Option<&'a Resource> {
    resources
        .iter()
        .find(|r| template_labels(r).is_some_and(|labels| labels_match(selector, labels)))
}

fn template_labels(resource: &Resource) -> Option<&LabelSet> {
    match &resource.data {
        ResourceData::Deployment(w) | ResourceData::StatefulSet(w) => Some(&w.template_labels),
        _ => None,
    }
}

/// Whether any SopsSecret declares a secret template with the given name
/// carrying the given key in its `stringData` or `data`. Used to suppress
/// missing-Secret findings for secrets materialized by an external
/// operator.
pub fn secret_key_in_sops_template(name: &str, key: &str, resources: &[Resource]) -> bool {
    resources.iter().any(|r| match &r.data {
        ResourceData::SopsSecret(s) => s
            .secret_templates
            .iter()
            .any(|t| t.name == name && t.has_key(key)),
        _ => false,
    })
}
