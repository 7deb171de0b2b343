//! Feature handlers and the pipeline that runs them.
//!
//! Each handler receives the route already mutated by the handlers before it.
//! Nothing is rolled back; the order of [`Pipeline::standard`] is part of the
//! output contract.

mod canary;
mod header;
mod mirror;
mod redirect;
mod rewrite;
mod timeout;

pub use canary::{CanaryHandler, COOKIE_HEADER};
pub use header::HeaderModHandler;
pub use mirror::MirrorHandler;
pub use redirect::RedirectHandler;
pub use rewrite::RewriteHandler;
pub use timeout::TimeoutHandler;

use std::fmt;

use crate::{path_only_match, FieldError, HttpRoute, PathEntry, RouteFilter, RouteRule, RuleList};

/// One feature's merge step over a match group.
///
/// `entries` all share the same match key and are in encounter order.
pub trait FeatureHandler: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Merge this feature of `entries` into `route`, returning field errors.
    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError>;
}

/// Ordered list of feature handlers.
#[derive(Debug)]
pub struct Pipeline {
    handlers: Vec<Box<dyn FeatureHandler>>,
}

impl Pipeline {
    /// An empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// header-mod → canary → rewrite → mirror → timeout → redirect.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(HeaderModHandler)
            .with(CanaryHandler)
            .with(RewriteHandler)
            .with(MirrorHandler)
            .with(TimeoutHandler)
            .with(RedirectHandler)
    }

    /// Append a handler.
    #[must_use]
    pub fn with(mut self, handler: impl FeatureHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Handler names, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run every handler over one match group.
    pub fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for handler in &self.handlers {
            let errs = handler.apply(route, entries);
            if !errs.is_empty() {
                tracing::debug!(
                    route = %route.key(),
                    handler = handler.name(),
                    count = errs.len(),
                    "handler reported field errors"
                );
            }
            errors.extend(errs);
        }
        errors
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Attach `filter` to the entry's sole-backend rule, or split the entry's
/// backend out into a new rule carrying the filter.
pub(crate) fn attach_or_split(rules: &mut RuleList, entry: &PathEntry, filter: RouteFilter) {
    if let Some(rule) = rules.find_sole_backend_mut(entry) {
        tracing::debug!(path = %entry.path, backend = %entry.backend, filter = %filter, "filter attached");
        rule.attach_filter(filter);
        return;
    }
    rules.remove_backend_ref(entry);
    tracing::debug!(path = %entry.path, backend = %entry.backend, filter = %filter, "rule split out");
    rules.append(RouteRule::new(
        vec![path_only_match(entry.path_match())],
        vec![filter],
        vec![entry.backend_ref()],
    ));
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler tests.

    use crate::{
        path_only_match, BackendRef, FeatureBundle, HttpRoute, PathEntry, PathType, RouteKey,
        RouteRule, ServiceBackend,
    };

    pub(crate) fn entry(path: &str, svc: &str, features: FeatureBundle) -> PathEntry {
        PathEntry::new(
            PathType::Prefix,
            path,
            ServiceBackend::new(svc, Some(80)),
            features,
        )
    }

    pub(crate) fn rule(path: &str, svcs: &[&str]) -> RouteRule {
        RouteRule::new(
            vec![path_only_match(PathType::Prefix.to_path_match(path))],
            vec![],
            svcs.iter()
                .map(|s| BackendRef::service(*s, Some(80)))
                .collect(),
        )
    }

    pub(crate) fn route(rules: Vec<RouteRule>) -> HttpRoute {
        let mut route = HttpRoute::new(RouteKey::new("default", "web-foo-com"));
        route.rules_mut().extend(rules);
        route
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::{FeatureBundle, HeaderModConfig, TimeoutConfig};

    #[test]
    fn standard_order() {
        assert_eq!(
            Pipeline::standard().names(),
            vec!["header-mod", "canary", "rewrite", "mirror", "timeout", "redirect"]
        );
    }

    #[test]
    fn timeout_sees_rules_shaped_earlier() {
        let features = FeatureBundle {
            header_mod: Some(HeaderModConfig {
                remove: vec!["x-debug".into()],
                ..Default::default()
            }),
            timeout: Some(TimeoutConfig { seconds: 5 }),
            ..Default::default()
        };
        let mut route = route(vec![rule("/", &["a", "b"])]);
        let entries = vec![entry("/", "a", features), entry("/", "b", FeatureBundle::default())];

        let errors = Pipeline::standard().apply(&mut route, &entries);
        assert!(errors.is_empty());

        let rules = route.rules();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].timeouts.is_none());
        assert_eq!(
            rules[1].timeouts.as_ref().map(|t| t.request.as_str()),
            Some("5s")
        );
    }
}
