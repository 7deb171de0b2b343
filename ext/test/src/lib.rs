//! weave-test: Test domain for conversion conformance testing
//!
//! Provides an Ingress builder and a compact, comparable rendering of route
//! rules. The YAML fixture runner lives behind the `fixtures` feature.
//!
//! # Example
//!
//! ```
//! use weave_test::prelude::*;
//!
//! let store = IngressStore::from_ingresses(
//!     [
//!         TestIngress::new("web").path("foo.com", "/", "Prefix", "web", 80).build(),
//!         TestIngress::new("web-canary")
//!             .nginx("canary", "true")
//!             .nginx("canary-weight", "30")
//!             .path("foo.com", "/", "Prefix", "web-v2", 80)
//!             .build(),
//!     ],
//!     &ConvertOptions::default(),
//! );
//! let conversion = Converter::default().convert(&store);
//!
//! let route = &conversion.routes[&RouteKey::new("default", "web-foo-com")];
//! assert_eq!(
//!     summarize(route),
//!     vec![RuleSummary {
//!         matches: vec!["PathPrefix /".into()],
//!         filters: vec![],
//!         backends: vec!["web:80@70".into(), "web-v2:80@30".into()],
//!         timeout: None,
//!     }]
//! );
//! ```

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use weave::{describe_match, HttpRoute, RouteRule};
use weave_ingress::{DEFAULT_INGRESS_CLASS, NGINX_ANNOTATION_PREFIX};

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Builder for Ingress objects.
///
/// Defaults to the `default` namespace and the `higress` class.
#[derive(Debug, Clone)]
pub struct TestIngress {
    name: String,
    namespace: Option<String>,
    class: Option<String>,
    annotations: BTreeMap<String, String>,
    rules: Vec<(String, Vec<HTTPIngressPath>)>,
}

impl TestIngress {
    /// Ingress `name` in the default namespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            class: Some(DEFAULT_INGRESS_CLASS.to_owned()),
            annotations: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set `spec.ingressClassName`; `None` leaves it unset.
    #[must_use]
    pub fn class(mut self, class: Option<&str>) -> Self {
        self.class = class.map(str::to_owned);
        self
    }

    /// Add an annotation under its full key.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add an annotation under the nginx prefix.
    #[must_use]
    pub fn nginx(self, key: &str, value: impl Into<String>) -> Self {
        self.annotation(format!("{NGINX_ANNOTATION_PREFIX}/{key}"), value)
    }

    /// Add a path routed to `service:port` under `host` (empty for all hosts).
    #[must_use]
    pub fn path(mut self, host: &str, path: &str, path_type: &str, service: &str, port: i32) -> Self {
        let entry = HTTPIngressPath {
            path: Some(path.to_owned()),
            path_type: path_type.to_owned(),
            backend: IngressBackend {
                service: Some(IngressServiceBackend {
                    name: service.to_owned(),
                    port: Some(ServiceBackendPort {
                        number: Some(port),
                        name: None,
                    }),
                }),
                resource: None,
            },
        };
        match self.rules.iter_mut().find(|(h, _)| h == host) {
            Some((_, paths)) => paths.push(entry),
            None => self.rules.push((host.to_owned(), vec![entry])),
        }
        self
    }

    /// Build the Ingress.
    pub fn build(self) -> Ingress {
        let rules = self
            .rules
            .into_iter()
            .map(|(host, paths)| IngressRule {
                host: (!host.is_empty()).then_some(host),
                http: Some(HTTPIngressRuleValue { paths }),
            })
            .collect();
        Ingress {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                annotations: (!self.annotations.is_empty()).then_some(self.annotations),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                ingress_class_name: self.class,
                rules: Some(rules),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// One rule rendered as strings, in rule order.
///
/// Matches use [`describe_match`], filters their `Display`, backends the
/// `ns/name:port@weight` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "fixtures", derive(serde::Deserialize))]
#[cfg_attr(feature = "fixtures", serde(default))]
pub struct RuleSummary {
    pub matches: Vec<String>,
    pub filters: Vec<String>,
    pub backends: Vec<String>,
    pub timeout: Option<String>,
}

impl From<&RouteRule> for RuleSummary {
    fn from(rule: &RouteRule) -> Self {
        Self {
            matches: rule.matches.iter().map(describe_match).collect(),
            filters: rule.filters.iter().map(ToString::to_string).collect(),
            backends: rule.backend_refs.iter().map(ToString::to_string).collect(),
            timeout: rule.timeouts.as_ref().map(|t| t.request.clone()),
        }
    }
}

/// Summaries of every rule of `route`.
pub fn summarize(route: &HttpRoute) -> Vec<RuleSummary> {
    route.rules().iter().map(RuleSummary::from).collect()
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{summarize, RuleSummary, TestIngress};
    pub use weave_ingress::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ingress::{ConvertOptions, Converter, IngressStore};

    #[test]
    fn builder_fills_ingress() {
        let ingress = TestIngress::new("web")
            .namespace("prod")
            .nginx("timeout", "5")
            .path("foo.com", "/", "Prefix", "web", 80)
            .path("foo.com", "/api", "Exact", "api", 8080)
            .build();

        assert_eq!(ingress.metadata.namespace.as_deref(), Some("prod"));
        let annotations = ingress.metadata.annotations.unwrap();
        assert_eq!(annotations["nginx.ingress.kubernetes.io/timeout"], "5");

        let spec = ingress.spec.unwrap();
        assert_eq!(spec.ingress_class_name.as_deref(), Some("higress"));
        let rules = spec.rules.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].http.as_ref().unwrap().paths.len(), 2);
    }

    #[test]
    fn unclassed_ingress_is_not_converted() {
        let store = IngressStore::from_ingresses(
            [TestIngress::new("web")
                .class(None)
                .path("", "/", "Prefix", "web", 80)
                .build()],
            &ConvertOptions::default(),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn summary_of_timeout_rule() {
        let store = IngressStore::from_ingresses(
            [TestIngress::new("web")
                .nginx("timeout", "5")
                .path("", "/", "Exact", "web", 80)
                .build()],
            &ConvertOptions::default(),
        );
        let conversion = Converter::default().convert(&store);
        let route = &conversion.routes[&weave::RouteKey::new("default", "web-all-hosts")];

        assert_eq!(
            summarize(route),
            vec![RuleSummary {
                matches: vec!["Exact /".into()],
                filters: vec![],
                backends: vec!["web:80".into()],
                timeout: Some("5s".into()),
            }]
        );
    }
}
