//! weave-ingress: Ingress domain for weave
//!
//! Reads `networking.k8s.io/v1` Ingress manifests, extracts per-feature
//! configuration from their annotations and feeds both into the weave merge
//! engine.
//!
//! # Architecture
//!
//! ```text
//! YAML manifests
//!         ↓ IngressStore::from_path()      class/namespace filter, name order
//! Skeleton::build()                        one HTTPRoute per (namespace, host)
//!         ↓ group_paths(AnnotationExtractor)
//! Consolidator::consolidate()              header → canary → rewrite → mirror → timeout → redirect
//!         ↓
//! Conversion { routes, errors }
//! ```
//!
//! # Example
//!
//! ```
//! use weave_ingress::prelude::*;
//!
//! let input = r#"
//! apiVersion: networking.k8s.io/v1
//! kind: Ingress
//! metadata:
//!   name: web
//!   annotations:
//!     nginx.ingress.kubernetes.io/ssl-redirect: "true"
//! spec:
//!   ingressClassName: higress
//!   rules:
//!     - host: foo.com
//!       http:
//!         paths:
//!           - path: /
//!             pathType: Prefix
//!             backend: { service: { name: web, port: { number: 80 } } }
//! "#;
//!
//! let converter = Converter::default();
//! let store = IngressStore::from_yaml_str(input, converter.options()).unwrap();
//! let conversion = converter.convert(&store);
//!
//! assert!(conversion.is_clean());
//! let route = &conversion.routes[&RouteKey::new("default", "web-foo-com")];
//! assert_eq!(route.rules()[0].filters[0].to_string(), "RequestRedirect scheme=https status=308");
//! ```

pub mod annotations;
mod converter;
mod extract;
mod manifest;
mod options;
mod skeleton;
mod store;

pub use converter::{Conversion, Converter};
pub use extract::AnnotationExtractor;
pub use manifest::{Manifest, GATEWAY_API_VERSION, HTTP_ROUTE_KIND};
pub use options::{
    ConvertOptions, DEFAULT_INGRESS_CLASS, HIGRESS_ANNOTATION_PREFIX, NGINX_ANNOTATION_PREFIX,
};
pub use skeleton::{route_name, Skeleton, ALL_HOSTS, DEFAULT_PATH};
pub use store::{ingress_class, name_of, namespace_of, IngressStore, LoadError, DEFAULT_NAMESPACE};

// Re-export Ingress types for convenience
pub use k8s_openapi::api::networking::v1::Ingress;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        AnnotationExtractor, Conversion, ConvertOptions, Converter, Ingress, IngressStore,
        LoadError, Manifest,
    };
    pub use weave::{FieldError, FieldErrorKind, HttpRoute, RouteKey};
}
