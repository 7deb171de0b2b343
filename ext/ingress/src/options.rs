use serde::{Deserialize, Serialize};

/// Ingress class converted when none is configured.
pub const DEFAULT_INGRESS_CLASS: &str = "higress";

/// Annotation prefix shared with ingress-nginx.
pub const NGINX_ANNOTATION_PREFIX: &str = "nginx.ingress.kubernetes.io";

/// Annotation prefix specific to Higress.
pub const HIGRESS_ANNOTATION_PREFIX: &str = "higress.io";

/// Conversion settings.
///
/// Every field is defaulted, so an empty YAML or JSON document is a valid
/// configuration.
///
/// ```yaml
/// ingress_classes: [higress, nginx]
/// namespace: prod
/// annotation_prefixes: [nginx.ingress.kubernetes.io, higress.io]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Ingress classes to convert. Empty converts every classed Ingress.
    pub ingress_classes: Vec<String>,
    /// Only convert Ingresses in this namespace.
    pub namespace: Option<String>,
    /// Annotation prefixes, highest priority first.
    pub annotation_prefixes: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ingress_classes: vec![DEFAULT_INGRESS_CLASS.to_owned()],
            namespace: None,
            annotation_prefixes: vec![
                NGINX_ANNOTATION_PREFIX.to_owned(),
                HIGRESS_ANNOTATION_PREFIX.to_owned(),
            ],
        }
    }
}

impl ConvertOptions {
    /// Whether an Ingress of `class` should be converted.
    pub fn accepts_class(&self, class: Option<&str>) -> bool {
        match class {
            Some(class) => {
                self.ingress_classes.is_empty() || self.ingress_classes.iter().any(|c| c == class)
            }
            None => false,
        }
    }

    /// Whether an Ingress in `namespace` should be converted.
    pub fn accepts_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref().map_or(true, |ns| ns == namespace)
    }
}
