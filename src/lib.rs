//! Static cross-reference checks for Kubernetes manifest collections.
//!
//! Given a set of YAML manifests (one file, a directory tree, or stdin),
//! this crate verifies that the references between resources resolve
//! within the set: workload selectors against their own pod templates,
//! Service and PodMonitor selectors and ports against workloads, env and
//! volume references against ConfigMaps, Secrets and
//! PersistentVolumeClaims, Ingress backends against Services, and HPA
//! scale targets against their named resource. Findings are plain values
//! grouped by the resource that declared the broken reference.
//!
//! The usual entry points are [`lint_content`] and [`lint_path`]:
//!
//! ```no_run
//! use kuberef::{lint_path, LintConfig};
//! use std::path::Path;
//!
//! let config = LintConfig::default();
//! let result = lint_path(Path::new("manifests/"), &config)?;
//! for issue in &result.issues {
//!     println!("{issue}");
//! }
//! # Ok::<(), kuberef::Error>(())
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod lint;
pub mod parser;
pub mod report;
pub mod resource;
pub mod types;

pub use config::LintConfig;
pub use lint::{LintResult, LintSummary, lint_content, lint_file, lint_path};
pub use parser::ParseError;
pub use report::OutputFormat;
pub use types::{Issue, IssueKind, ResourceRef};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level error type: everything that can abort a run, as opposed to
/// findings, which are values on [`LintResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] parser::ParseError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
