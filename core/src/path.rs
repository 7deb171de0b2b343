//! Path entries: the unit of input to the merge engine.
//!
//! A [`RawPathEntry`] is one `(host, path, pathType, backend)` tuple read from a
//! source record. Once its [`FeatureBundle`] has been extracted it becomes a
//! read-only [`PathEntry`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use k8s_gateway_api::HttpPathMatch;

use crate::{BackendRef, FeatureBundle};

/// Identity of the source record (e.g. an Ingress) a path came from.
///
/// Used for error attribution only, never for route-key computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef {
    /// Namespace of the record.
    pub namespace: String,
    /// Name of the record.
    pub name: String,
}

impl SourceRef {
    /// Create a source reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A source record with the annotations feature extraction reads from.
///
/// Shared (via `Arc`) by every path entry the record contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    /// Identity.
    pub id: SourceRef,
    /// Raw annotations.
    pub annotations: BTreeMap<String, String>,
}

impl Default for SourceRef {
    fn default() -> Self {
        Self::new("default", "")
    }
}

/// Ingress path-match type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathType {
    /// `Exact`
    Exact,
    /// `Prefix`
    Prefix,
    /// `ImplementationSpecific`
    ImplementationSpecific,
}

impl PathType {
    /// Parse an Ingress `pathType` string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Exact" => Some(Self::Exact),
            "Prefix" => Some(Self::Prefix),
            "ImplementationSpecific" => Some(Self::ImplementationSpecific),
            _ => None,
        }
    }

    /// The Ingress spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Prefix => "Prefix",
            Self::ImplementationSpecific => "ImplementationSpecific",
        }
    }

    /// Gateway path match for `path` under this type.
    ///
    /// `ImplementationSpecific` maps to `RegularExpression`.
    pub fn to_path_match(self, path: &str) -> HttpPathMatch {
        let value = path.to_owned();
        match self {
            Self::Exact => HttpPathMatch::Exact { value },
            Self::Prefix => HttpPathMatch::PathPrefix { value },
            Self::ImplementationSpecific => HttpPathMatch::RegularExpression { value },
        }
    }

    /// Strict comparison used to find reusable rules: only `Exact`→`Exact` and
    /// `Prefix`→`PathPrefix` are equal, everything else never matches.
    pub fn strictly_matches(self, path: &str, candidate: &HttpPathMatch) -> bool {
        match (self, candidate) {
            (Self::Exact, HttpPathMatch::Exact { value })
            | (Self::Prefix, HttpPathMatch::PathPrefix { value }) => value == path,
            _ => false,
        }
    }

    /// Loose comparison against the mapping of [`to_path_match`](Self::to_path_match).
    pub fn loosely_matches(self, path: &str, candidate: &HttpPathMatch) -> bool {
        match (self, candidate) {
            (Self::Exact, HttpPathMatch::Exact { value })
            | (Self::Prefix, HttpPathMatch::PathPrefix { value })
            | (Self::ImplementationSpecific, HttpPathMatch::RegularExpression { value }) => {
                value == path
            }
            _ => false,
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service backend of a path: name plus optional numeric port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceBackend {
    /// Service name.
    pub name: String,
    /// Service port number.
    pub port: Option<u16>,
}

impl ServiceBackend {
    /// Create a service backend.
    pub fn new(name: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }

    /// Unweighted backend reference to this service.
    pub fn to_backend_ref(&self) -> BackendRef {
        BackendRef::service(self.name.clone(), self.port)
    }

    /// Whether `backend` references this service (name and port).
    pub fn is_referenced_by(&self, backend: &BackendRef) -> bool {
        backend.namespace.is_none() && backend.name == self.name && backend.port == self.port
    }
}

impl fmt::Display for ServiceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Grouping key: path-match type plus path string. Excludes the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    /// Path-match type.
    pub path_type: PathType,
    /// Path string.
    pub path: String,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path_type, self.path)
    }
}

/// A path as read from a source record, before feature extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPathEntry {
    /// The owning record.
    pub source: Arc<SourceRecord>,
    /// Virtual host (may be empty for "all hosts").
    pub host: String,
    /// Path string.
    pub path: String,
    /// Path-match type.
    pub path_type: PathType,
    /// Target service.
    pub backend: ServiceBackend,
}

impl RawPathEntry {
    /// The grouping key of this entry.
    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            path_type: self.path_type,
            path: self.path.clone(),
        }
    }
}

/// A path entry with its extracted, read-only feature bundle.
#[derive(Debug, Clone)]
pub struct PathEntry {
    /// Identity of the owning record.
    pub source: SourceRef,
    /// Virtual host.
    pub host: String,
    /// Path string.
    pub path: String,
    /// Path-match type.
    pub path_type: PathType,
    /// Target service.
    pub backend: ServiceBackend,
    /// Extracted features, shared by all entries of one record.
    pub features: Arc<FeatureBundle>,
}

impl PathEntry {
    /// Attach `features` to a raw entry.
    pub fn from_raw(raw: RawPathEntry, features: Arc<FeatureBundle>) -> Self {
        Self {
            source: raw.source.id.clone(),
            host: raw.host,
            path: raw.path,
            path_type: raw.path_type,
            backend: raw.backend,
            features,
        }
    }

    /// Convenience constructor used by tests and benches.
    pub fn new(
        path_type: PathType,
        path: impl Into<String>,
        backend: ServiceBackend,
        features: FeatureBundle,
    ) -> Self {
        Self {
            source: SourceRef::default(),
            host: String::new(),
            path: path.into(),
            path_type,
            backend,
            features: Arc::new(features),
        }
    }

    /// Gateway path match built from this entry.
    pub fn path_match(&self) -> HttpPathMatch {
        self.path_type.to_path_match(&self.path)
    }

    /// Backend reference for this entry's service.
    pub fn backend_ref(&self) -> BackendRef {
        self.backend.to_backend_ref()
    }
}
