//! End-to-end tests driving the `kuberef` binary over manifest files,
//! directories and stdin.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CONSISTENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: flower
spec:
  selector:
    matchLabels:
      app: flower
  template:
    metadata:
      labels:
        app: flower
    spec:
      containers:
        - name: flower
          image: mher/flower:1.2
          ports:
            - name: api
              containerPort: 5555
          env:
            - name: BROKER_PASSWORD
              valueFrom:
                secretKeyRef:
                  name: broker-credentials
                  key: password
---
apiVersion: v1
kind: Secret
metadata:
  name: broker-credentials
data:
  password: aHVudGVyMg==
---
apiVersion: v1
kind: Service
metadata:
  name: flower
spec:
  selector:
    app: flower
  ports:
    - name: api
      port: 5555
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: flower
spec:
  rules:
    - host: flower.example.com
      http:
        paths:
          - path: /
            backend:
              service:
                name: flower
                port:
                  name: api
---
apiVersion: monitoring.coreos.com/v1
kind: PodMonitor
metadata:
  name: flower
spec:
  selector:
    matchLabels:
      app: flower
  podMetricsEndpoints:
    - path: /metrics
      port: api
"#;

const BROKEN_SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: orphan
spec:
  selector:
    app: nothing-has-this-label
  ports:
    - name: http
      port: 80
"#;

fn kuberef() -> Command {
    Command::cargo_bin("kuberef").unwrap()
}

#[test]
fn consistent_collection_on_stdin_exits_zero() {
    kuberef()
        .write_stdin(CONSISTENT)
        .assert()
        .success()
        .stdout(predicate::str::contains("No cross-reference issues found."));
}

#[test]
fn broken_selector_on_stdin_exits_one() {
    kuberef()
        .write_stdin(BROKEN_SERVICE)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Service/orphan"))
        .stdout(predicate::str::contains("selector-empty-match"));
}

#[test]
fn no_fail_flag_exits_zero_but_still_reports() {
    kuberef()
        .arg("--no-fail")
        .write_stdin(BROKEN_SERVICE)
        .assert()
        .success()
        .stdout(predicate::str::contains("selector-empty-match"));
}

#[test]
fn missing_secret_is_reported_and_skippable() {
    let manifest = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: app
          image: app:1.0
          envFrom:
            - secretRef:
                name: external-credentials
"#;

    kuberef()
        .write_stdin(manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("external-credentials"));

    kuberef()
        .args(["--skip-secrets", "external-credentials"])
        .write_stdin(manifest)
        .assert()
        .success();
}

#[test]
fn directory_is_linted_as_one_collection() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("deployment.yaml"),
        r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: app
          image: app:1.0
          ports:
            - name: http
              containerPort: 8080
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("service.yml"),
        "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\nspec:\n  selector:\n    app: web\n  ports:\n    - name: http\n      port: 80\n",
    )
    .unwrap();

    kuberef().arg(dir.path()).assert().success();
}

#[test]
fn json_format_is_parseable() {
    let output = kuberef()
        .args(["--format", "json"])
        .write_stdin(BROKEN_SERVICE)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["passed"], false);
    assert_eq!(value["resources"][0]["name"], "orphan");
}

#[test]
fn config_file_skip_list_applies() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "skipSecrets:\n  - managed-elsewhere\n").unwrap();

    let manifest = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: app
          image: app:1.0
          env:
            - name: TOKEN
              valueFrom:
                secretKeyRef:
                  name: managed-elsewhere
                  key: token
"#;

    kuberef()
        .args(["--config", config_path.to_str().unwrap()])
        .write_stdin(manifest)
        .assert()
        .success();
}

#[test]
fn broken_default_config_exits_two() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".kuberef.yaml"), "skipConfigmaps: 42\n").unwrap();

    kuberef()
        .current_dir(dir.path())
        .write_stdin("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn default_config_location_is_honored() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".kuberef.yaml"),
        "skipSecrets:\n  - external-credentials\n",
    )
    .unwrap();

    let manifest = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: app
          image: app:1.0
          envFrom:
            - secretRef:
                name: external-credentials
"#;

    kuberef()
        .current_dir(dir.path())
        .write_stdin(manifest)
        .assert()
        .success();
}

#[test]
fn yaml_syntax_error_exits_two() {
    kuberef()
        .write_stdin("kind: [unclosed\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn missing_file_exits_two() {
    kuberef()
        .arg("/nonexistent/manifests.yaml")
        .assert()
        .code(2);
}

#[test]
fn malformed_document_exits_one_and_names_the_document() {
    let manifest = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: broken\nspec: {}\n";
    kuberef()
        .write_stdin(manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Deployment/broken"))
        .stdout(predicate::str::contains("malformed"));
}
