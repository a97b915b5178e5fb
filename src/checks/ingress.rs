//! Ingress backend resolution.
//!
//! Only `rules[].http.paths[].backend.service` backends are checked. The
//! port name `use-annotation` is a sentinel for controller actions (e.g.
//! ALB ingress annotation actions) and is always treated as valid.

use crate::checks::lookup::find_by_kind_and_name;
use crate::config::LintConfig;
use crate::resource::{IngressData, Resource, ResourceData, ServiceBackendPort};
use crate::types::{Issue, IssueKind, ResourceRef};
use log::debug;

const USE_ANNOTATION_PORT: &str = "use-annotation";

pub fn check_ingress(
    ingress: &IngressData,
    owner: &ResourceRef,
    resources: &[Resource],
    config: &LintConfig,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for rule in &ingress.rules {
        let host = rule.host.as_deref().unwrap_or("*");
        for path in &rule.paths {
            let backend = &path.backend;
            let port_name = match &backend.port {
                ServiceBackendPort::Name(name) => name,
                ServiceBackendPort::Number(number) => {
                    debug!("{owner}: backend port {number} is numeric, not verified");
                    continue;
                }
            };

            if port_name == USE_ANNOTATION_PORT {
                continue;
            }
            if config.skip_services.contains(&backend.service_name) {
                continue;
            }

            let location = format!("host {host}, path {}", path.path.as_deref().unwrap_or("/"));
            match find_by_kind_and_name("Service", &backend.service_name, resources) {
                None => issues.push(Issue::new(
                    owner.clone(),
                    IssueKind::IngressBackendMissing,
                    format!(
                        "backend references Service {} which does not exist ({location})",
                        backend.service_name
                    ),
                )),
                Some(found) => {
                    let ResourceData::Service(service) = &found.data else {
                        continue;
                    };
                    let declared = service
                        .ports
                        .iter()
                        .any(|p| p.name.as_deref() == Some(port_name));
                    if !declared {
                        issues.push(Issue::new(
                            owner.clone(),
                            IssueKind::IngressBackendMissing,
                            format!(
                                "Service {} does not declare a port named {port_name} ({location})",
                                backend.service_name
                            ),
                        ));
                    }
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_manifests;

    const SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: flower
spec:
  selector:
    app: example
  ports:
    - name: api
      port: 42
"#;

    fn ingress_with_paths(paths: &str) -> String {
        format!(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: edge
spec:
  rules:
    - host: testhost
      http:
        paths:
{paths}
"#
        )
    }

    fn backend_path(path: &str, service: &str, port: &str) -> String {
        format!(
            "          - path: {path}\n            backend:\n              service:\n                name: {service}\n                port:\n                  name: {port}\n"
        )
    }

    fn run(yaml: &str, config: &LintConfig) -> Vec<Issue> {
        let set = parse_manifests(yaml).unwrap();
        assert!(set.malformed.is_empty());
        let ingress = set
            .resources
            .iter()
            .find(|r| r.kind() == "Ingress")
            .unwrap();
        let ResourceData::Ingress(data) = &ingress.data else {
            panic!("expected an Ingress");
        };
        check_ingress(data, &ingress.reference(), &set.resources, config)
    }

    #[test]
    fn test_existing_service_and_port() {
        let yaml = format!(
            "{SERVICE}\n---{}",
            ingress_with_paths(&backend_path("/", "flower", "api"))
        );
        assert!(run(&yaml, &LintConfig::default()).is_empty());
    }

    #[test]
    fn test_missing_service_is_one_issue() {
        let yaml = ingress_with_paths(&backend_path("/", "flower", "api"));
        let issues = run(&yaml, &LintConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::IngressBackendMissing);
        assert_eq!(issues[0].owner.to_string(), "Ingress/edge");
    }

    #[test]
    fn test_two_missing_ports_are_two_issues() {
        let paths = format!(
            "{}{}",
            backend_path("/", "flower", "doesnotexist"),
            backend_path("/api", "flower", "doesalsonotexist")
        );
        let yaml = format!("{SERVICE}\n---{}", ingress_with_paths(&paths));
        let issues = run(&yaml, &LintConfig::default());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("doesnotexist"));
        assert!(issues[1].message.contains("doesalsonotexist"));
    }

    #[test]
    fn test_use_annotation_sentinel_always_passes() {
        let yaml = ingress_with_paths(&backend_path("/", "ssl-redirect", "use-annotation"));
        assert!(run(&yaml, &LintConfig::default()).is_empty());
    }

    #[test]
    fn test_skip_listed_service_passes() {
        let yaml = ingress_with_paths(&backend_path("/", "external-svc", "http"));
        let config = LintConfig::new().skip_service("external-svc");
        assert!(run(&yaml, &config).is_empty());
    }

    #[test]
    fn test_numeric_port_is_not_verified() {
        let yaml = r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: edge
spec:
  rules:
    - host: testhost
      http:
        paths:
          - path: /
            backend:
              service:
                name: missing-svc
                port:
                  number: 8080
"#;
        assert!(run(yaml, &LintConfig::default()).is_empty());
    }
}
