//! Parsing of multi-document YAML manifests into the typed resource model.

pub mod yaml;

pub use yaml::{
    MalformedDoc, ParseError, ParsedSet, parse_manifest_file, parse_manifest_path, parse_manifests,
};
