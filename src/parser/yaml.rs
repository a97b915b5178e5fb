//! YAML parsing for Kubernetes manifest collections.
//!
//! A YAML syntax error in the stream is fatal: nothing is checked. A
//! recognized-kind document missing a field its check needs fails only
//! that document; it is recorded as a `MalformedDoc` and the rest of the
//! collection is still linted. Documents of unrecognized kinds are kept
//! as `Unknown` so lookups see the full collection.

use crate::resource::*;
use crate::types::ResourceRef;
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Fatal parse failures. These abort the run before any checking occurs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("YAML syntax error {0}")]
    Syntax(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

/// A recognized-kind document that could not be loaded into the typed
/// model because a required field is missing.
#[derive(Debug, Clone)]
pub struct MalformedDoc {
    pub resource: ResourceRef,
    pub source: Source,
    pub detail: String,
}

/// The outcome of parsing a manifest stream.
#[derive(Debug, Clone, Default)]
pub struct ParsedSet {
    /// Resources in document order. Order is preserved but irrelevant to
    /// checks; lookups are full scans.
    pub resources: Vec<Resource>,
    pub malformed: Vec<MalformedDoc>,
}

impl ParsedSet {
    fn merge(&mut self, mut other: ParsedSet) {
        self.resources.append(&mut other.resources);
        self.malformed.append(&mut other.malformed);
    }
}

/// Parse a multi-document YAML string.
pub fn parse_manifests(content: &str) -> Result<ParsedSet, ParseError> {
    parse_manifests_with_path(content, Path::new("<stdin>"))
}

/// Parse a multi-document YAML string with a source file path.
pub fn parse_manifests_with_path(content: &str, path: &Path) -> Result<ParsedSet, ParseError> {
    let mut set = ParsedSet::default();
    let mut line_number = 1u32;

    for doc in content.split("\n---") {
        let doc_lines = doc.lines().count() as u32 + 1;
        let trimmed = doc.trim();
        if is_blank_document(trimmed) {
            line_number += doc_lines;
            continue;
        }

        let value: serde_yaml::Value = serde_yaml::from_str(trimmed)
            .map_err(|e| ParseError::Syntax(format!("at line {}: {}", line_number, e)))?;

        let source = Source::from_file(path).with_line(line_number);
        match parse_document(&value, source) {
            DocOutcome::Resource(resource) => set.resources.push(resource),
            DocOutcome::Malformed(doc) => set.malformed.push(doc),
            DocOutcome::Skipped => {}
        }

        line_number += doc_lines;
    }

    Ok(set)
}

/// Parse a single YAML file.
pub fn parse_manifest_file(path: &Path) -> Result<ParsedSet, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_manifests_with_path(&content, path)
}

/// Parse a file, or every `*.yaml`/`*.yml` file under a directory.
pub fn parse_manifest_path(path: &Path) -> Result<ParsedSet, ParseError> {
    if !path.is_dir() {
        return parse_manifest_file(path);
    }

    let mut files: Vec<std::path::PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            matches!(
                e.path().extension().and_then(|x| x.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    let mut set = ParsedSet::default();
    for file in files {
        set.merge(parse_manifest_file(&file)?);
    }
    Ok(set)
}

fn is_blank_document(doc: &str) -> bool {
    doc.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with('#') || l == "---"
    })
}

enum DocOutcome {
    Resource(Resource),
    Malformed(MalformedDoc),
    Skipped,
}

fn parse_document(value: &serde_yaml::Value, source: Source) -> DocOutcome {
    let Some(api_version) = get_string(value, "apiVersion") else {
        debug!("skipping document without apiVersion");
        return DocOutcome::Skipped;
    };
    let Some(kind) = get_string(value, "kind") else {
        debug!("skipping document without kind");
        return DocOutcome::Skipped;
    };

    let name = value
        .get("metadata")
        .and_then(|m| get_string(m, "name"))
        .unwrap_or_default();

    let parsed = match kind.as_str() {
        "Deployment" => require_name(&kind, &name)
            .and_then(|_| parse_workload(value, &name))
            .map(|d| ResourceData::Deployment(Box::new(d))),
        "StatefulSet" => require_name(&kind, &name)
            .and_then(|_| parse_workload(value, &name))
            .map(|d| ResourceData::StatefulSet(Box::new(d))),
        "Service" => require_name(&kind, &name)
            .and_then(|_| parse_service(value, &name))
            .map(|d| ResourceData::Service(Box::new(d))),
        "Ingress" => require_name(&kind, &name)
            .and_then(|_| parse_ingress(value, &name))
            .map(|d| ResourceData::Ingress(Box::new(d))),
        "HorizontalPodAutoscaler" => require_name(&kind, &name)
            .and_then(|_| parse_hpa(value, &name))
            .map(|d| ResourceData::HorizontalPodAutoscaler(Box::new(d))),
        "PodMonitor" => require_name(&kind, &name)
            .and_then(|_| parse_pod_monitor(value, &name))
            .map(|d| ResourceData::PodMonitor(Box::new(d))),
        "ConfigMap" => require_name(&kind, &name)
            .map(|_| ResourceData::ConfigMap(Box::new(parse_config_map(value, &name)))),
        "Secret" => require_name(&kind, &name)
            .map(|_| ResourceData::Secret(Box::new(parse_secret(value, &name)))),
        "PersistentVolumeClaim" => require_name(&kind, &name).map(|_| {
            ResourceData::PersistentVolumeClaim(Box::new(PvcData { name: name.clone() }))
        }),
        "SopsSecret" => require_name(&kind, &name)
            .map(|_| ResourceData::SopsSecret(Box::new(parse_sops_secret(value, &name)))),
        _ => Ok(ResourceData::Unknown(Box::new(UnknownData {
            kind: kind.clone(),
            name: name.clone(),
        }))),
    };

    match parsed {
        Ok(data) => DocOutcome::Resource(Resource::new(api_version, source, data)),
        Err(detail) => DocOutcome::Malformed(MalformedDoc {
            resource: ResourceRef::new(kind, name),
            source,
            detail,
        }),
    }
}

fn require_name(kind: &str, name: &str) -> Result<(), String> {
    if name.is_empty() {
        Err(format!("{kind} is missing metadata.name"))
    } else {
        Ok(())
    }
}

// ============================================================================
// Per-kind parsing
// ============================================================================

fn parse_workload(value: &serde_yaml::Value, name: &str) -> Result<WorkloadData, String> {
    let spec = value.get("spec").ok_or("spec is missing")?;

    let match_labels = spec
        .get("selector")
        .and_then(|s| s.get("matchLabels"))
        .and_then(string_map)
        .ok_or("spec.selector.matchLabels is missing (matchExpressions are not supported)")?;

    let template = spec.get("template").ok_or("spec.template is missing")?;
    let template_labels = template
        .get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(string_map)
        .ok_or("spec.template.metadata.labels is missing")?;

    let pod_spec = template
        .get("spec")
        .ok_or("spec.template.spec is missing")?;
    let containers = pod_spec
        .get("containers")
        .and_then(|c| c.as_sequence())
        .ok_or("spec.template.spec.containers is missing")?
        .iter()
        .map(parse_container)
        .collect::<Result<Vec<_>, _>>()?;

    let init_containers = match pod_spec.get("initContainers").and_then(|c| c.as_sequence()) {
        Some(seq) => seq
            .iter()
            .map(parse_container)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let volumes = match pod_spec.get("volumes").and_then(|v| v.as_sequence()) {
        Some(seq) => seq.iter().map(parse_volume).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(WorkloadData {
        name: name.to_string(),
        match_labels,
        template_labels,
        containers,
        init_containers,
        volumes,
    })
}

fn parse_container(c: &serde_yaml::Value) -> Result<ContainerSpec, String> {
    let name = get_string(c, "name").unwrap_or_default();

    let ports = c
        .get("ports")
        .and_then(|p| p.as_sequence())
        .map(|seq| {
            seq.iter()
                .map(|p| ContainerPort {
                    name: get_string(p, "name"),
                    container_port: get_i32(p, "containerPort").unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let env = match c.get("env").and_then(|e| e.as_sequence()) {
        Some(seq) => seq
            .iter()
            .map(|e| parse_env_var(e, &name))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let env_from = match c.get("envFrom").and_then(|e| e.as_sequence()) {
        Some(seq) => seq
            .iter()
            .map(|e| parse_env_from(e, &name))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(ContainerSpec {
        name,
        image: get_string(c, "image"),
        ports,
        env,
        env_from,
    })
}

fn parse_env_var(e: &serde_yaml::Value, container: &str) -> Result<EnvVar, String> {
    let name = get_string(e, "name").unwrap_or_default();
    let value_from = match e.get("valueFrom") {
        Some(vf) => parse_env_var_source(vf, container, &name)?,
        None => None,
    };
    Ok(EnvVar { name, value_from })
}

fn parse_env_var_source(
    vf: &serde_yaml::Value,
    container: &str,
    env: &str,
) -> Result<Option<EnvVarSource>, String> {
    if let Some(cm) = vf.get("configMapKeyRef") {
        return Ok(Some(EnvVarSource::ConfigMapKeyRef(parse_key_selector(
            cm,
            &format!("container {container}, env {env}: valueFrom.configMapKeyRef"),
        )?)));
    }
    if let Some(secret) = vf.get("secretKeyRef") {
        return Ok(Some(EnvVarSource::SecretKeyRef(parse_key_selector(
            secret,
            &format!("container {container}, env {env}: valueFrom.secretKeyRef"),
        )?)));
    }
    if let Some(field) = vf.get("fieldRef") {
        return Ok(Some(EnvVarSource::FieldRef {
            field_path: get_string(field, "fieldPath").unwrap_or_default(),
        }));
    }
    Ok(None)
}

fn parse_key_selector(v: &serde_yaml::Value, context: &str) -> Result<KeySelector, String> {
    Ok(KeySelector {
        name: get_string(v, "name").ok_or_else(|| format!("{context}.name is missing"))?,
        key: get_string(v, "key").ok_or_else(|| format!("{context}.key is missing"))?,
        optional: get_bool(v, "optional").unwrap_or(false),
    })
}

fn parse_env_from(e: &serde_yaml::Value, container: &str) -> Result<EnvFromSource, String> {
    let config_map_ref = match e.get("configMapRef") {
        Some(r) => Some(parse_name_ref(
            r,
            &format!("container {container}: envFrom[].configMapRef"),
        )?),
        None => None,
    };
    let secret_ref = match e.get("secretRef") {
        Some(r) => Some(parse_name_ref(
            r,
            &format!("container {container}: envFrom[].secretRef"),
        )?),
        None => None,
    };
    Ok(EnvFromSource {
        config_map_ref,
        secret_ref,
    })
}

fn parse_name_ref(v: &serde_yaml::Value, context: &str) -> Result<NameRef, String> {
    Ok(NameRef {
        name: get_string(v, "name").ok_or_else(|| format!("{context}.name is missing"))?,
        optional: get_bool(v, "optional").unwrap_or(false),
    })
}

fn parse_volume(v: &serde_yaml::Value) -> Result<Volume, String> {
    let name = get_string(v, "name").unwrap_or_default();

    let config_map = match v.get("configMap") {
        Some(cm) => {
            let cm_name = get_string(cm, "name")
                .ok_or_else(|| format!("volume {name}: configMap.name is missing"))?;
            let item_keys = match cm.get("items").and_then(|i| i.as_sequence()) {
                Some(seq) => seq
                    .iter()
                    .map(|i| {
                        get_string(i, "key").ok_or_else(|| {
                            format!("volume {name}: configMap.items[].key is missing")
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            Some(ConfigMapVolumeSource {
                name: cm_name,
                item_keys,
            })
        }
        None => None,
    };

    let persistent_volume_claim = match v.get("persistentVolumeClaim") {
        Some(pvc) => Some(PvcVolumeSource {
            claim_name: get_string(pvc, "claimName").ok_or_else(|| {
                format!("volume {name}: persistentVolumeClaim.claimName is missing")
            })?,
        }),
        None => None,
    };

    Ok(Volume {
        name,
        config_map,
        persistent_volume_claim,
    })
}

fn parse_service(value: &serde_yaml::Value, name: &str) -> Result<ServiceData, String> {
    let spec = value.get("spec");

    let selector = spec.and_then(|s| s.get("selector")).and_then(string_map);

    let ports = spec
        .and_then(|s| s.get("ports"))
        .and_then(|p| p.as_sequence())
        .map(|seq| {
            seq.iter()
                .map(|p| ServicePort {
                    name: get_string(p, "name"),
                    port: get_i32(p, "port").unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ServiceData {
        name: name.to_string(),
        selector,
        ports,
    })
}

fn parse_ingress(value: &serde_yaml::Value, name: &str) -> Result<IngressData, String> {
    let rules = match value
        .get("spec")
        .and_then(|s| s.get("rules"))
        .and_then(|r| r.as_sequence())
    {
        Some(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, r)| parse_ingress_rule(r, i))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(IngressData {
        name: name.to_string(),
        rules,
    })
}

fn parse_ingress_rule(rule: &serde_yaml::Value, index: usize) -> Result<IngressRule, String> {
    let paths = rule
        .get("http")
        .and_then(|h| h.get("paths"))
        .and_then(|p| p.as_sequence())
        .ok_or_else(|| format!("spec.rules[{index}].http.paths is missing"))?
        .iter()
        .map(|p| parse_http_path(p, index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IngressRule {
        host: get_string(rule, "host"),
        paths,
    })
}

fn parse_http_path(p: &serde_yaml::Value, rule_index: usize) -> Result<HttpIngressPath, String> {
    let backend = p
        .get("backend")
        .ok_or_else(|| format!("spec.rules[{rule_index}]: path without backend"))?;
    let service = backend.get("service").ok_or_else(|| {
        format!("spec.rules[{rule_index}]: only service backends are supported")
    })?;
    let service_name = get_string(service, "name")
        .ok_or_else(|| format!("spec.rules[{rule_index}]: backend service name is missing"))?;

    let port_value = service
        .get("port")
        .ok_or_else(|| format!("spec.rules[{rule_index}]: backend service port is missing"))?;
    let port = if let Some(port_name) = get_string(port_value, "name") {
        ServiceBackendPort::Name(port_name)
    } else if let Some(number) = get_i32(port_value, "number") {
        ServiceBackendPort::Number(number)
    } else {
        return Err(format!(
            "spec.rules[{rule_index}]: backend service port has neither name nor number"
        ));
    };

    Ok(HttpIngressPath {
        path: get_string(p, "path"),
        backend: IngressBackend { service_name, port },
    })
}

fn parse_hpa(value: &serde_yaml::Value, name: &str) -> Result<HpaData, String> {
    let target = value
        .get("spec")
        .and_then(|s| s.get("scaleTargetRef"))
        .ok_or("spec.scaleTargetRef is missing")?;

    Ok(HpaData {
        name: name.to_string(),
        scale_target_ref: ScaleTargetRef {
            api_version: get_string(target, "apiVersion"),
            kind: get_string(target, "kind").ok_or("spec.scaleTargetRef.kind is missing")?,
            name: get_string(target, "name").ok_or("spec.scaleTargetRef.name is missing")?,
        },
    })
}

fn parse_pod_monitor(value: &serde_yaml::Value, name: &str) -> Result<PodMonitorData, String> {
    let spec = value.get("spec").ok_or("spec is missing")?;

    let match_labels = spec
        .get("selector")
        .and_then(|s| s.get("matchLabels"))
        .and_then(string_map)
        .ok_or("spec.selector.matchLabels is missing (matchExpressions are not supported)")?;

    let endpoint_ports = spec
        .get("podMetricsEndpoints")
        .and_then(|e| e.as_sequence())
        .map(|seq| seq.iter().filter_map(|e| get_string(e, "port")).collect())
        .unwrap_or_default();

    Ok(PodMonitorData {
        name: name.to_string(),
        match_labels,
        endpoint_ports,
    })
}

fn parse_config_map(value: &serde_yaml::Value, name: &str) -> ConfigMapData {
    ConfigMapData {
        name: name.to_string(),
        data: key_map(value.get("data")),
    }
}

fn parse_secret(value: &serde_yaml::Value, name: &str) -> SecretData {
    SecretData {
        name: name.to_string(),
        data: key_map(value.get("data")),
        string_data: key_map(value.get("stringData")),
    }
}

fn parse_sops_secret(value: &serde_yaml::Value, name: &str) -> SopsSecretData {
    let secret_templates = value
        .get("spec")
        .and_then(|s| s.get("secretTemplates"))
        .and_then(|t| t.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|t| {
                    let Some(template_name) = get_string(t, "name") else {
                        debug!("SopsSecret {name}: skipping secret template without a name");
                        return None;
                    };
                    Some(SopsSecretTemplate {
                        name: template_name,
                        string_data: key_map(t.get("stringData")),
                        data: key_map(t.get("data")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SopsSecretData {
        name: name.to_string(),
        secret_templates,
    }
}

// ============================================================================
// Value helpers
// ============================================================================

fn get_string(value: &serde_yaml::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(|s| s.to_string())
}

fn get_i32(value: &serde_yaml::Value, key: &str) -> Option<i32> {
    value.get(key)?.as_i64().map(|n| n as i32)
}

fn get_bool(value: &serde_yaml::Value, key: &str) -> Option<bool> {
    value.get(key)?.as_bool()
}

/// A mapping of string keys to string values. Returns `None` when the
/// value is absent or not a mapping; an empty mapping is `Some`.
fn string_map(value: &serde_yaml::Value) -> Option<BTreeMap<String, String>> {
    let mapping = value.as_mapping()?;
    let mut map = BTreeMap::new();
    for (k, v) in mapping {
        if let (Some(key), Some(val)) = (k.as_str(), v.as_str()) {
            map.insert(key.to_string(), val.to_string());
        }
    }
    Some(map)
}

/// Data-mapping keys. Only key existence matters to the checks, so
/// non-string values are kept with an empty rendering.
fn key_map(value: Option<&serde_yaml::Value>) -> BTreeMap<String, String> {
    let Some(mapping) = value.and_then(|v| v.as_mapping()) else {
        return BTreeMap::new();
    };
    let mut map = BTreeMap::new();
    for (k, v) in mapping {
        if let Some(key) = k.as_str() {
            map.insert(
                key.to_string(),
                v.as_str().map(|s| s.to_string()).unwrap_or_default(),
            );
        }
    }
    map
}
