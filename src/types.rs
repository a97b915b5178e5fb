//! Core types for the cross-reference linter.
//!
//! - `ResourceRef` - the identity (kind + name) of a resource that owns a finding
//! - `IssueKind` - machine-distinguishable categories of findings
//! - `Issue` - a single finding, always attributed to its owning resource

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of a resource within a collection: its kind tag and name.
///
/// Issues carry the identity of the resource that *declared* the broken
/// reference, not the missing target, so that reporting can group findings
/// by owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// The Kubernetes kind (e.g. "Deployment", "Service").
    pub kind: String,
    /// The `metadata.name` of the resource.
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Categories of cross-reference findings.
///
/// All findings are returned values, never control-flow errors: one
/// resource's problem must not abort checking of the rest of the
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// A referenced resource (ConfigMap, Secret, PVC, Service, scale
    /// target) does not exist in the collection.
    ReferenceMissing,
    /// The referenced resource exists but lacks the referenced data key.
    KeyMissing,
    /// A workload's `spec.selector.matchLabels` does not match its own
    /// `spec.template.metadata.labels`.
    SelectorMismatch,
    /// A Service or PodMonitor selector matches no pod-template-owning
    /// resource.
    SelectorEmptyMatch,
    /// The selector resolved, but no container exposes the named port.
    PortMissing,
    /// An Ingress path references a nonexistent Service or port.
    IngressBackendMissing,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReferenceMissing => "reference-missing",
            Self::KeyMissing => "key-missing",
            Self::SelectorMismatch => "selector-mismatch",
            Self::SelectorEmptyMatch => "selector-empty-match",
            Self::PortMissing => "port-missing",
            Self::IngressBackendMissing => "ingress-backend-missing",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cross-reference finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The resource that declared the broken reference.
    pub owner: ResourceRef,
    /// The category of the finding.
    pub kind: IssueKind,
    /// Human-readable description with enough embedded context (field
    /// path, reference name/key) to locate the problem.
    pub message: String,
}

impl Issue {
    pub fn new(owner: ResourceRef, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            owner,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.owner, self.kind, self.message)
    }
}
