//! PodMonitor selector and endpoint port resolution.
//!
//! Same selector semantics as Services, with the selector nested under
//! `matchLabels` and ports taken from `podMetricsEndpoints[].port`.

use crate::checks::lookup::find_pod_template_owner;
use crate::checks::{as_workload, exposes_port_named, fmt_labels};
use crate::resource::{PodMonitorData, Resource};
use crate::types::{Issue, IssueKind, ResourceRef};

pub fn check_pod_monitor(
    monitor: &PodMonitorData,
    owner: &ResourceRef,
    resources: &[Resource],
) -> Vec<Issue> {
    let mut issues = Vec::new();

    let Some(target) = find_pod_template_owner(&monitor.match_labels, resources) else {
        issues.push(Issue::new(
            owner.clone(),
            IssueKind::SelectorEmptyMatch,
            format!(
                "spec.selector.matchLabels ({}) does not match any pod template",
                fmt_labels(&monitor.match_labels)
            ),
        ));
        return issues;
    };

    let Some(workload) = as_workload(target) else {
        return issues;
    };

    for port in &monitor.endpoint_ports {
        if !exposes_port_named(workload, port) {
            issues.push(Issue::new(
                owner.clone(),
                IssueKind::PortMissing,
                format!(
                    "podMetricsEndpoints[].port {port} is not exposed by any container of {}",
                    target.reference()
                ),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_manifests;
    use crate::resource::ResourceData;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: flower
spec:
  selector:
    matchLabels:
      app: example
  template:
    metadata:
      labels:
        app: example
    spec:
      containers:
        - name: flower
          image: mher/flower:1.2
          ports:
            - name: api
              containerPort: 5555
"#;

    fn monitor_with_port(port: &str) -> String {
        format!(
            r#"
apiVersion: monitoring.coreos.com/v1
kind: PodMonitor
metadata:
  name: flower-monitor
spec:
  selector:
    matchLabels:
      app: example
  podMetricsEndpoints:
    - path: /metrics
      port: {port}
"#
        )
    }

    fn run(yaml: &str) -> Vec<Issue> {
        let set = parse_manifests(yaml).unwrap();
        assert!(set.malformed.is_empty());
        let monitor = set
            .resources
            .iter()
            .find(|r| r.kind() == "PodMonitor")
            .unwrap();
        let ResourceData::PodMonitor(data) = &monitor.data else {
            panic!("expected a PodMonitor");
        };
        check_pod_monitor(data, &monitor.reference(), &set.resources)
    }

    #[test]
    fn test_selector_and_port_resolve() {
        let yaml = format!("{DEPLOYMENT}\n---{}", monitor_with_port("api"));
        assert!(run(&yaml).is_empty());
    }

    #[test]
    fn test_selector_matching_nothing_is_one_issue() {
        let issues = run(&monitor_with_port("api"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::SelectorEmptyMatch);
    }

    #[test]
    fn test_missing_port_is_one_issue() {
        let yaml = format!("{DEPLOYMENT}\n---{}", monitor_with_port("doesnotexist"));
        let issues = run(&yaml);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PortMissing);
        assert!(issues[0].message.contains("doesnotexist"));
    }

    #[test]
    fn test_endpoint_without_port_is_skipped() {
        let yaml = format!(
            "{DEPLOYMENT}\n---\napiVersion: monitoring.coreos.com/v1\nkind: PodMonitor\nmetadata:\n  name: flower-monitor\nspec:\n  selector:\n    matchLabels:\n      app: example\n  podMetricsEndpoints:\n    - path: /metrics\n"
        );
        assert!(run(&yaml).is_empty());
    }
}
