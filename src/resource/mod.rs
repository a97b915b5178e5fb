//! Typed in-memory model of parsed Kubernetes resources.
//!
//! Resources are a closed set of tagged variants behind a common header
//! (`kind`/`apiVersion`/`name`). Each check pattern-matches to the variant
//! it understands; kinds outside the set are kept as `Unknown` and never
//! checked. The model is pure data with no behavior beyond accessors, and
//! a collection is never mutated after construction.

use crate::types::ResourceRef;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mapping from label key to label value, used for both selectors and
/// target labels.
pub type LabelSet = BTreeMap<String, String>;

/// Where a resource came from, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// The file the document was read from (`<stdin>` when piped).
    pub file_path: PathBuf,
    /// 1-indexed line of the document start, when known.
    pub line: Option<u32>,
}

impl Source {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            line: None,
        }
    }

    pub fn stdin() -> Self {
        Self::from_file("<stdin>")
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

/// One parsed manifest document.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The `apiVersion` header field.
    pub api_version: String,
    /// Provenance of the document.
    pub source: Source,
    /// Kind-specific payload.
    pub data: ResourceData,
}

impl Resource {
    pub fn new(api_version: impl Into<String>, source: Source, data: ResourceData) -> Self {
        Self {
            api_version: api_version.into(),
            source,
            data,
        }
    }

    /// The kind tag of the resource.
    pub fn kind(&self) -> &str {
        self.data.kind()
    }

    /// The `metadata.name` of the resource.
    pub fn name(&self) -> &str {
        self.data.name()
    }

    /// Identity used to attribute issues to this resource.
    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind(), self.name())
    }
}

/// All resource kinds the linter understands, plus `Unknown` for the rest.
#[derive(Debug, Clone)]
pub enum ResourceData {
    Deployment(Box<WorkloadData>),
    StatefulSet(Box<WorkloadData>),
    Service(Box<ServiceData>),
    Ingress(Box<IngressData>),
    HorizontalPodAutoscaler(Box<HpaData>),
    PodMonitor(Box<PodMonitorData>),
    ConfigMap(Box<ConfigMapData>),
    Secret(Box<SecretData>),
    PersistentVolumeClaim(Box<PvcData>),
    SopsSecret(Box<SopsSecretData>),
    Unknown(Box<UnknownData>),
}

impl ResourceData {
    pub fn kind(&self) -> &str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::StatefulSet(_) => "StatefulSet",
            Self::Service(_) => "Service",
            Self::Ingress(_) => "Ingress",
            Self::HorizontalPodAutoscaler(_) => "HorizontalPodAutoscaler",
            Self::PodMonitor(_) => "PodMonitor",
            Self::ConfigMap(_) => "ConfigMap",
            Self::Secret(_) => "Secret",
            Self::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            Self::SopsSecret(_) => "SopsSecret",
            Self::Unknown(d) => &d.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Deployment(d) => &d.name,
            Self::StatefulSet(d) => &d.name,
            Self::Service(d) => &d.name,
            Self::Ingress(d) => &d.name,
            Self::HorizontalPodAutoscaler(d) => &d.name,
            Self::PodMonitor(d) => &d.name,
            Self::ConfigMap(d) => &d.name,
            Self::Secret(d) => &d.name,
            Self::PersistentVolumeClaim(d) => &d.name,
            Self::SopsSecret(d) => &d.name,
            Self::Unknown(d) => &d.name,
        }
    }
}

// ============================================================================
// Workloads (Deployment / StatefulSet)
// ============================================================================

/// Shared shape of Deployment and StatefulSet: a label selector plus a pod
/// template. `matchExpressions` selectors are not supported.
#[derive(Debug, Clone, Default)]
pub struct WorkloadData {
    pub name: String,
    pub match_labels: LabelSet,
    pub template_labels: LabelSet,
    pub containers: Vec<ContainerSpec>,
    pub init_containers: Vec<ContainerSpec>,
    pub volumes: Vec<Volume>,
}

impl WorkloadData {
    /// Regular containers first, then init containers.
    pub fn all_containers(&self) -> impl Iterator<Item = &ContainerSpec> {
        self.containers.iter().chain(self.init_containers.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContainerSpec {
    pub name: String,
    pub image: Option<String>,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    pub env_from: Vec<EnvFromSource>,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerPort {
    pub name: Option<String>,
    pub container_port: i32,
}

#[derive(Debug, Clone, Default)]
pub struct EnvVar {
    pub name: String,
    pub value_from: Option<EnvVarSource>,
}

/// Supported `env[].valueFrom` sources. `fieldRef` is carried but never
/// checked.
#[derive(Debug, Clone)]
pub enum EnvVarSource {
    ConfigMapKeyRef(KeySelector),
    SecretKeyRef(KeySelector),
    FieldRef { field_path: String },
}

/// A reference to a named key inside a ConfigMap or Secret.
#[derive(Debug, Clone, Default)]
pub struct KeySelector {
    pub name: String,
    pub key: String,
    pub optional: bool,
}

/// One `envFrom` entry. At most one of the two refs is set in practice,
/// but both are carried so a malformed-but-parseable entry still checks
/// whatever it declares.
#[derive(Debug, Clone, Default)]
pub struct EnvFromSource {
    pub config_map_ref: Option<NameRef>,
    pub secret_ref: Option<NameRef>,
}

/// A reference to a ConfigMap or Secret by name, with the Kubernetes
/// `optional` flag.
#[derive(Debug, Clone, Default)]
pub struct NameRef {
    pub name: String,
    pub optional: bool,
}

/// Only configMap and persistentVolumeClaim volume sources are checked.
#[derive(Debug, Clone, Default)]
pub struct Volume {
    pub name: String,
    pub config_map: Option<ConfigMapVolumeSource>,
    pub persistent_volume_claim: Option<PvcVolumeSource>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMapVolumeSource {
    pub name: String,
    /// Keys named by `items[].key`, each of which must exist in the
    /// ConfigMap's data.
    pub item_keys: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PvcVolumeSource {
    pub claim_name: String,
}

// ============================================================================
// Services & networking
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ServiceData {
    pub name: String,
    /// A Service without a selector (e.g. ExternalName) declares no
    /// reference and is skipped.
    pub selector: Option<LabelSet>,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePort {
    pub name: Option<String>,
    pub port: i32,
}

#[derive(Debug, Clone, Default)]
pub struct IngressData {
    pub name: String,
    pub rules: Vec<IngressRule>,
}

/// An HTTP rule. Rules without `http.paths` are rejected when the typed
/// model is built, so paths are always present here.
#[derive(Debug, Clone, Default)]
pub struct IngressRule {
    pub host: Option<String>,
    pub paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Clone, Default)]
pub struct HttpIngressPath {
    pub path: Option<String>,
    pub backend: IngressBackend,
}

/// Only service backends are supported.
#[derive(Debug, Clone)]
pub struct IngressBackend {
    pub service_name: String,
    pub port: ServiceBackendPort,
}

impl Default for IngressBackend {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            port: ServiceBackendPort::Name(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBackendPort {
    Name(String),
    /// Numeric backend ports are outside the supported scope and are not
    /// verified.
    Number(i32),
}

// ============================================================================
// Scaling & monitoring
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct HpaData {
    pub name: String,
    pub scale_target_ref: ScaleTargetRef,
}

/// Target of an HPA. `kind`, `apiVersion` and `name` must all match the
/// target resource; an absent `apiVersion` leaves that field
/// unconstrained.
#[derive(Debug, Clone, Default)]
pub struct ScaleTargetRef {
    pub api_version: Option<String>,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct PodMonitorData {
    pub name: String,
    pub match_labels: LabelSet,
    /// Named ports from `podMetricsEndpoints[].port`. Endpoints without a
    /// port name declare no reference.
    pub endpoint_ports: Vec<String>,
}

// ============================================================================
// Targets (ConfigMap / Secret / PVC / SopsSecret)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ConfigMapData {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct SecretData {
    pub name: String,
    pub data: BTreeMap<String, String>,
    pub string_data: BTreeMap<String, String>,
}

impl SecretData {
    /// Key lookup across both `data` and `stringData`.
    pub fn has_key(&self, key: &str) -> bool {
        self.data.contains_key(key) || self.string_data.contains_key(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PvcData {
    pub name: String,
}

/// The one custom kind recognized: secrets materialized indirectly by a
/// secrets-management operator. Its templates suppress missing-Secret
/// findings for keys they declare.
#[derive(Debug, Clone, Default)]
pub struct SopsSecretData {
    pub name: String,
    pub secret_templates: Vec<SopsSecretTemplate>,
}

#[derive(Debug, Clone, Default)]
pub struct SopsSecretTemplate {
    pub name: String,
    pub string_data: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

impl SopsSecretTemplate {
    pub fn has_key(&self, key: &str) -> bool {
        self.string_data.contains_key(key) || self.data.contains_key(key)
    }
}

/// Any kind outside the recognized set. Kept for collection completeness;
/// never dispatched to a check.
#[derive(Debug, Clone, Default)]
pub struct UnknownData {
    pub kind: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_name_accessors() {
        let r = Resource::new(
            "apps/v1",
            Source::stdin(),
            ResourceData::Deployment(Box::new(WorkloadData {
                name: "web".into(),
                ..Default::default()
            })),
        );
        assert_eq!(r.kind(), "Deployment");
        assert_eq!(r.name(), "web");
        assert_eq!(r.reference().to_string(), "Deployment/web");
    }

    #[test]
    fn test_unknown_keeps_kind_tag() {
        let r = Resource::new(
            "v1",
            Source::stdin(),
            ResourceData::Unknown(Box::new(UnknownData {
                kind: "List".into(),
                name: "things".into(),
            })),
        );
        assert_eq!(r.kind(), "List");
    }

    #[test]
    fn test_all_containers_order() {
        let w = WorkloadData {
            containers: vec![ContainerSpec {
                name: "main".into(),
                ..Default::default()
            }],
            init_containers: vec![ContainerSpec {
                name: "init".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let names: Vec<_> = w.all_containers().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["main", "init"]);
    }

    #[test]
    fn test_secret_key_lookup_covers_both_maps() {
        let mut s = SecretData {
            name: "creds".into(),
            ..Default::default()
        };
        s.data.insert("token".into(), "abc".into());
        s.string_data.insert("password".into(), "hunter2".into());
        assert!(s.has_key("token"));
        assert!(s.has_key("password"));
        assert!(!s.has_key("missing"));
    }
}
