//! weave - consolidates per-path route features into Gateway API `HTTPRoute` rules
//!
//! Independently annotated path entries that resolve to the same logical route
//! (same namespace, host, path and path-match type) are merged into one
//! minimal set of rules: one match predicate, ordered filters and weighted
//! backends per rule.
//!
//! # Architecture
//!
//! - [`group_paths`]: raw entries → route groups → match groups, extracting
//!   each source record's [`FeatureBundle`] once through a [`FeatureExtractor`]
//! - [`RuleList`]: the ordered rule sequence; lookup and mutation happen in
//!   one call, no positions are carried between handlers
//! - [`FeatureHandler`]: one per feature, run in [`Pipeline::standard`] order:
//!   header-mod → canary → rewrite → mirror → timeout → redirect
//! - [`Consolidator`]: runs the pipeline over every match group of a route
//!
//! # Key Design Insights
//!
//! 1. **Precedence is resolved at extraction**: [`CanaryKind`] and
//!    [`RedirectKind`] are closed enums; a URL or SSL redirect clears canary
//!    and rewrite before any handler runs.
//!
//! 2. **Sole-backend reuse**: a feature attaches to an existing rule only when
//!    that rule serves the entry's path with the entry's backend alone.
//!    Otherwise the backend is split out into a new rule.
//!
//! 3. **Nothing is fatal**: problems become [`FieldError`]s, the affected
//!    mutation is skipped and the rest of the merge proceeds.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use weave::prelude::*;
//!
//! struct Timeouts;
//!
//! impl FeatureExtractor for Timeouts {
//!     fn extract(&self, _record: &SourceRecord) -> (FeatureBundle, Vec<FieldError>) {
//!         let bundle = FeatureBundle {
//!             timeout: Some(TimeoutConfig { seconds: 30 }),
//!             ..Default::default()
//!         };
//!         (bundle, Vec::new())
//!     }
//! }
//!
//! let record = Arc::new(SourceRecord {
//!     id: SourceRef::new("default", "web"),
//!     annotations: BTreeMap::new(),
//! });
//! let entry = RawPathEntry {
//!     source: record,
//!     host: "foo.com".into(),
//!     path: "/".into(),
//!     path_type: PathType::Prefix,
//!     backend: ServiceBackend::new("web", Some(80)),
//! };
//! let (groups, _) = group_paths(vec![entry], &Timeouts);
//!
//! let mut route = HttpRoute::new(RouteKey::new("default", "web-foo-com"));
//! route.rules_mut().append(RouteRule::new(
//!     vec![path_only_match(PathType::Prefix.to_path_match("/"))],
//!     vec![],
//!     vec![BackendRef::service("web", Some(80))],
//! ));
//!
//! let errors = Consolidator::default().consolidate(&mut route, &groups[0]);
//! assert!(errors.is_empty());
//! assert_eq!(route.rules()[0].timeouts, Some(RouteTimeouts::from_seconds(30)));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod engine;
mod error;
mod features;
mod grouper;
mod handlers;
mod path;
mod route;
mod rule_list;
pub mod weight;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Engine
pub use engine::Consolidator;
pub use grouper::{group_paths, FeatureExtractor, HostKey, MatchGroup, NoFeatures, RouteGroup};
pub use handlers::{
    CanaryHandler, FeatureHandler, HeaderModHandler, MirrorHandler, Pipeline, RedirectHandler,
    RewriteHandler, TimeoutHandler, COOKIE_HEADER,
};

// Inputs
pub use features::{
    CanaryConfig, CanaryKind, FeatureBundle, HeaderModConfig, MirrorConfig, RedirectConfig,
    RedirectKind, RewriteConfig, TimeoutConfig, DEFAULT_WEIGHT_TOTAL, PERMANENT_REDIRECT_CODE,
    SSL_REDIRECT_CODE, TEMPORAL_REDIRECT_CODE,
};
pub use path::{MatchKey, PathEntry, PathType, RawPathEntry, ServiceBackend, SourceRecord, SourceRef};

// Route model
pub use route::{
    describe_match, path_only_match, BackendRef, HeaderModifier, HttpHeader, HttpRoute,
    HttpRouteSpec, ParentRef, PathModifier, RequestMirror, RequestRedirect, RouteFilter,
    RouteKey, RouteRule, RouteTimeouts, UrlRewrite,
};
pub use rule_list::{Removal, RuleList};

// Errors
pub use error::{FieldError, FieldErrorKind, ANNOTATIONS_FIELD};

// Gateway API match types used in rules
pub use k8s_gateway_api::{HttpHeaderMatch, HttpPathMatch, HttpRouteMatch};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use weave::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Engine
        group_paths,
        // Route model
        path_only_match,
        BackendRef,
        // Inputs
        CanaryConfig,
        CanaryKind,
        Consolidator,
        FeatureBundle,
        FeatureExtractor,
        FeatureHandler,
        // Errors
        FieldError,
        FieldErrorKind,
        HttpRoute,
        PathEntry,
        PathType,
        Pipeline,
        RawPathEntry,
        RedirectKind,
        RouteFilter,
        RouteKey,
        RouteRule,
        RouteTimeouts,
        RuleList,
        ServiceBackend,
        SourceRecord,
        SourceRef,
        TimeoutConfig,
    };
}
