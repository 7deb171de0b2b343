//! Reading Ingress objects from YAML manifests.

use std::path::{Path, PathBuf};

use k8s_openapi::api::networking::v1::Ingress;
use serde::Deserialize;
use serde_yaml::Value;

use crate::annotations::INGRESS_CLASS;
use crate::ConvertOptions;

/// Namespace assumed for objects that do not set one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Failure to read or decode an input manifest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A document is not valid YAML.
    #[error("document {index}: invalid YAML: {source}")]
    Yaml {
        /// Zero-based document index in the stream.
        index: usize,
        /// Underlying error.
        source: serde_yaml::Error,
    },
    /// A document has `kind: Ingress` but does not decode as one.
    #[error("document {index}: invalid Ingress: {source}")]
    Ingress {
        /// Zero-based document index in the stream.
        index: usize,
        /// Underlying error.
        source: serde_yaml::Error,
    },
}

/// Ingresses selected for conversion, ordered by name then namespace.
#[derive(Debug, Clone, Default)]
pub struct IngressStore {
    ingresses: Vec<Ingress>,
}

impl IngressStore {
    /// Filter and order `ingresses`.
    pub fn from_ingresses(ingresses: impl IntoIterator<Item = Ingress>, options: &ConvertOptions) -> Self {
        let mut ingresses: Vec<Ingress> = ingresses
            .into_iter()
            .filter(|ing| {
                let keep = options.accepts_class(ingress_class(ing))
                    && options.accepts_namespace(namespace_of(ing));
                if !keep {
                    tracing::debug!(
                        ingress = name_of(ing),
                        class = ?ingress_class(ing),
                        "ingress filtered out"
                    );
                }
                keep
            })
            .collect();
        ingresses.sort_by(|a, b| {
            (name_of(a), namespace_of(a)).cmp(&(name_of(b), namespace_of(b)))
        });
        Self { ingresses }
    }

    /// Parse a multi-document YAML stream.
    ///
    /// `Ingress` documents are kept, `List` documents contribute their items,
    /// every other kind is skipped.
    pub fn from_yaml_str(input: &str, options: &ConvertOptions) -> Result<Self, LoadError> {
        let mut ingresses = Vec::new();
        for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
            let value = Value::deserialize(document).map_err(|source| LoadError::Yaml { index, source })?;
            collect(value, index, &mut ingresses)?;
        }
        Ok(Self::from_ingresses(ingresses, options))
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&input, options)
    }

    /// Ingresses in conversion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Ingress> {
        self.ingresses.iter()
    }

    /// Number of ingresses.
    pub fn len(&self) -> usize {
        self.ingresses.len()
    }

    /// Returns `true` if no ingress was selected.
    pub fn is_empty(&self) -> bool {
        self.ingresses.is_empty()
    }
}

fn collect(value: Value, index: usize, out: &mut Vec<Ingress>) -> Result<(), LoadError> {
    let kind = value.get("kind").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("Ingress") => {
            let ingress = serde_yaml::from_value(value).map_err(|source| LoadError::Ingress { index, source })?;
            out.push(ingress);
        }
        Some("List" | "IngressList") => {
            if let Value::Mapping(mut map) = value {
                if let Some(Value::Sequence(items)) = map.remove("items") {
                    for item in items {
                        collect(item, index, out)?;
                    }
                }
            }
        }
        Some(kind) => tracing::debug!(kind, index, "skipping non-Ingress document"),
        None if value.is_null() => {}
        None => tracing::debug!(index, "skipping document without kind"),
    }
    Ok(())
}

/// `spec.ingressClassName`, falling back to the legacy class annotation.
pub fn ingress_class(ingress: &Ingress) -> Option<&str> {
    ingress
        .spec
        .as_ref()
        .and_then(|s| s.ingress_class_name.as_deref())
        .or_else(|| {
            ingress
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(INGRESS_CLASS))
                .map(String::as_str)
        })
}

/// Namespace, [`DEFAULT_NAMESPACE`] when unset.
pub fn namespace_of(ingress: &Ingress) -> &str {
    ingress
        .metadata
        .namespace
        .as_deref()
        .unwrap_or(DEFAULT_NAMESPACE)
}

/// Name, empty when unset.
pub fn name_of(ingress: &Ingress) -> &str {
    ingress.metadata.name.as_deref().unwrap_or_default()
}
