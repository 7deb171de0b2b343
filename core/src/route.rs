//! Gateway API `HTTPRoute` model the engine mutates.
//!
//! Matches reuse `k8s_gateway_api::HttpRouteMatch` directly. Filters, backend
//! references and timeouts are modelled here so the serialized shape follows
//! the `gateway.networking.k8s.io/v1` schema, including `timeouts`.

use std::fmt;

use k8s_gateway_api::{HttpHeaderMatch, HttpPathMatch, HttpRouteMatch};
use serde::{Deserialize, Serialize};

use crate::RuleList;

/// `(namespace, name)` of an `HTTPRoute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    /// Route name.
    pub name: String,
    /// Route namespace.
    pub namespace: String,
}

impl RouteKey {
    /// Create a route key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// An `HTTPRoute`: one per (namespace, host).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRoute {
    /// Name and namespace.
    pub metadata: RouteKey,
    /// Route spec.
    pub spec: HttpRouteSpec,
}

impl HttpRoute {
    /// Create an empty route.
    pub fn new(key: RouteKey) -> Self {
        Self {
            metadata: key,
            spec: HttpRouteSpec::default(),
        }
    }

    /// Route key.
    pub fn key(&self) -> &RouteKey {
        &self.metadata
    }

    /// Ordered rules.
    pub fn rules(&self) -> &RuleList {
        &self.spec.rules
    }

    /// Ordered rules, mutable.
    pub fn rules_mut(&mut self) -> &mut RuleList {
        &mut self.spec.rules
    }
}

/// `HTTPRoute.spec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteSpec {
    /// Gateways this route attaches to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_refs: Vec<ParentRef>,
    /// Hostnames served by this route.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    /// Rules, in evaluation order.
    #[serde(default)]
    pub rules: RuleList,
}

/// Reference to a parent Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Gateway name.
    pub name: String,
}

/// One routing rule: matches, filters, weighted backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    /// Match predicates (ORed).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<HttpRouteMatch>,
    /// Filters, in application order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<RouteFilter>,
    /// Weighted backends.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backend_refs: Vec<BackendRef>,
    /// Request timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<RouteTimeouts>,
}

impl RouteRule {
    /// A rule with one path match, filters and backends.
    pub fn new(
        matches: Vec<HttpRouteMatch>,
        filters: Vec<RouteFilter>,
        backend_refs: Vec<BackendRef>,
    ) -> Self {
        Self {
            matches,
            filters,
            backend_refs,
            timeouts: None,
        }
    }

    /// A rule is plain when it has one match, one backend and no filters.
    /// Plain rules can be removed outright once a feature rule supersedes them.
    pub fn is_plain(&self) -> bool {
        self.matches.len() == 1 && self.backend_refs.len() == 1 && self.filters.is_empty()
    }

    /// Append a filter (application order is list order).
    pub fn attach_filter(&mut self, filter: RouteFilter) {
        self.filters.push(filter);
    }

    /// Insert a filter ahead of every existing one.
    pub fn prepend_filter(&mut self, filter: RouteFilter) {
        self.filters.insert(0, filter);
    }

    /// Whether any filter is a request redirect.
    pub fn has_redirect_filter(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, RouteFilter::RequestRedirect { .. }))
    }

    /// The redirect filters of this rule.
    pub fn redirect_filters(&self) -> impl Iterator<Item = &RequestRedirect> {
        self.filters.iter().filter_map(|f| match f {
            RouteFilter::RequestRedirect { request_redirect } => Some(request_redirect),
            _ => None,
        })
    }
}

/// Build an `HttpRouteMatch` carrying only a path predicate.
pub fn path_only_match(path: HttpPathMatch) -> HttpRouteMatch {
    HttpRouteMatch {
        path: Some(path),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════════════════

/// `HTTPRouteFilter`, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum RouteFilter {
    /// Modify request headers.
    #[serde(rename_all = "camelCase")]
    RequestHeaderModifier {
        /// Header operations.
        request_header_modifier: HeaderModifier,
    },
    /// Rewrite host and/or path before forwarding.
    #[serde(rename = "URLRewrite", rename_all = "camelCase")]
    UrlRewrite {
        /// Rewrite parameters.
        url_rewrite: UrlRewrite,
    },
    /// Mirror requests to another backend.
    #[serde(rename_all = "camelCase")]
    RequestMirror {
        /// Mirror target.
        request_mirror: RequestMirror,
    },
    /// Answer with a redirect.
    #[serde(rename_all = "camelCase")]
    RequestRedirect {
        /// Redirect parameters.
        request_redirect: RequestRedirect,
    },
}

impl RouteFilter {
    /// Header modifier filter.
    pub fn header_modifier(modifier: HeaderModifier) -> Self {
        Self::RequestHeaderModifier {
            request_header_modifier: modifier,
        }
    }

    /// URL rewrite filter.
    pub fn url_rewrite(rewrite: UrlRewrite) -> Self {
        Self::UrlRewrite {
            url_rewrite: rewrite,
        }
    }

    /// Request mirror filter.
    pub fn request_mirror(mirror: RequestMirror) -> Self {
        Self::RequestMirror {
            request_mirror: mirror,
        }
    }

    /// Request redirect filter.
    pub fn request_redirect(redirect: RequestRedirect) -> Self {
        Self::RequestRedirect {
            request_redirect: redirect,
        }
    }
}

/// A `name: value` header pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// `HTTPHeaderFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderModifier {
    /// Headers to add.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<HttpHeader>,
    /// Headers to overwrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<HttpHeader>,
    /// Header names to drop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

/// `HTTPPathModifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathModifier {
    /// Replace the whole path.
    #[serde(rename_all = "camelCase")]
    ReplaceFullPath {
        /// Replacement path.
        replace_full_path: String,
    },
    /// Replace the matched prefix.
    #[serde(rename_all = "camelCase")]
    ReplacePrefixMatch {
        /// Replacement prefix.
        replace_prefix_match: String,
    },
}

impl PathModifier {
    /// The replacement full path, if this is a full-path modifier.
    pub fn full_path(&self) -> Option<&str> {
        match self {
            Self::ReplaceFullPath { replace_full_path } => Some(replace_full_path),
            Self::ReplacePrefixMatch { .. } => None,
        }
    }
}

/// `HTTPURLRewriteFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRewrite {
    /// New `Host` header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Path rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathModifier>,
}

/// `HTTPRequestMirrorFilter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMirror {
    /// Mirror target.
    pub backend_ref: BackendRef,
}

/// `HTTPRequestRedirectFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRedirect {
    /// Target scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Target hostname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Path rewrite for the `Location` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathModifier>,
    /// Target port; unset when the scheme's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// HTTP status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl RequestRedirect {
    /// Replacement full path, if any.
    pub fn full_path(&self) -> Option<&str> {
        self.path.as_ref().and_then(PathModifier::full_path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Backends and timeouts
// ═══════════════════════════════════════════════════════════════════════════════

/// `HTTPBackendRef` (service kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendRef {
    /// Service name.
    pub name: String,
    /// Service namespace (defaults to the route's).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Service port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Relative weight; absent means an implicit even split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

impl BackendRef {
    /// Unweighted reference to a service in the route's namespace.
    pub fn service(name: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            port,
            weight: None,
        }
    }

    /// Same reference with `weight` set.
    #[must_use]
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = Some(weight);
        self
    }
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}/")?;
        }
        f.write_str(&self.name)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        if let Some(weight) = self.weight {
            write!(f, "@{weight}")?;
        }
        Ok(())
    }
}

/// `HTTPRouteTimeouts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTimeouts {
    /// Request timeout as a Gateway API duration, e.g. `30s`.
    pub request: String,
}

impl RouteTimeouts {
    /// Request timeout of `seconds`.
    pub fn from_seconds(seconds: u32) -> Self {
        Self {
            request: format!("{seconds}s"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Summaries
// ═══════════════════════════════════════════════════════════════════════════════

/// One-line summary of a match, e.g. `PathPrefix /api x-canary=always`.
///
/// Exact header matches render as `name=value`, regex ones as `name~value`.
pub fn describe_match(m: &HttpRouteMatch) -> String {
    let mut out = match &m.path {
        Some(HttpPathMatch::Exact { value }) => format!("Exact {value}"),
        Some(HttpPathMatch::PathPrefix { value }) => format!("PathPrefix {value}"),
        Some(HttpPathMatch::RegularExpression { value }) => format!("RegularExpression {value}"),
        None => "*".to_owned(),
    };
    for header in m.headers.iter().flatten() {
        match header {
            HttpHeaderMatch::Exact { name, value } => out.push_str(&format!(" {name}={value}")),
            HttpHeaderMatch::RegularExpression { name, value } => {
                out.push_str(&format!(" {name}~{value}"));
            }
        }
    }
    out
}

impl fmt::Display for RouteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestHeaderModifier {
                request_header_modifier: m,
            } => {
                f.write_str("RequestHeaderModifier")?;
                let pairs = |headers: &[HttpHeader]| {
                    headers
                        .iter()
                        .map(|h| format!("{}={}", h.name, h.value))
                        .collect::<Vec<_>>()
                        .join(",")
                };
                if !m.add.is_empty() {
                    write!(f, " add{{{}}}", pairs(&m.add))?;
                }
                if !m.set.is_empty() {
                    write!(f, " set{{{}}}", pairs(&m.set))?;
                }
                if !m.remove.is_empty() {
                    write!(f, " remove{{{}}}", m.remove.join(","))?;
                }
                Ok(())
            }
            Self::UrlRewrite { url_rewrite: r } => {
                f.write_str("URLRewrite")?;
                if let Some(host) = &r.hostname {
                    write!(f, " hostname={host}")?;
                }
                match &r.path {
                    Some(PathModifier::ReplacePrefixMatch {
                        replace_prefix_match,
                    }) => write!(f, " prefix={replace_prefix_match}"),
                    Some(PathModifier::ReplaceFullPath { replace_full_path }) => {
                        write!(f, " fullPath={replace_full_path}")
                    }
                    None => Ok(()),
                }
            }
            Self::RequestMirror { request_mirror } => {
                write!(f, "RequestMirror {}", request_mirror.backend_ref)
            }
            Self::RequestRedirect { request_redirect: r } => {
                f.write_str("RequestRedirect")?;
                if let Some(scheme) = &r.scheme {
                    write!(f, " scheme={scheme}")?;
                }
                if let Some(host) = &r.hostname {
                    write!(f, " hostname={host}")?;
                }
                if let Some(port) = r.port {
                    write!(f, " port={port}")?;
                }
                if let Some(path) = r.full_path() {
                    write!(f, " fullPath={path}")?;
                }
                if let Some(code) = r.status_code {
                    write!(f, " status={code}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rule_detection() {
        let mut rule = RouteRule::new(
            vec![path_only_match(HttpPathMatch::PathPrefix {
                value: "/".into(),
            })],
            vec![],
            vec![BackendRef::service("web", Some(80))],
        );
        assert!(rule.is_plain());

        rule.attach_filter(RouteFilter::header_modifier(HeaderModifier::default()));
        assert!(!rule.is_plain());
    }

    #[test]
    fn prepend_puts_filter_first() {
        let mut rule = RouteRule::default();
        rule.attach_filter(RouteFilter::url_rewrite(UrlRewrite::default()));
        rule.prepend_filter(RouteFilter::request_redirect(RequestRedirect::default()));
        assert!(matches!(
            rule.filters[0],
            RouteFilter::RequestRedirect { .. }
        ));
        assert!(rule.has_redirect_filter());
    }

    #[test]
    fn filter_serializes_with_gateway_type_tag() {
        let filter = RouteFilter::url_rewrite(UrlRewrite {
            hostname: Some("backend.internal".into()),
            path: Some(PathModifier::ReplacePrefixMatch {
                replace_prefix_match: "/v2".into(),
            }),
        });
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "URLRewrite",
                "urlRewrite": {
                    "hostname": "backend.internal",
                    "path": { "type": "ReplacePrefixMatch", "replacePrefixMatch": "/v2" }
                }
            })
        );
    }

    #[test]
    fn backend_ref_omits_unset_fields() {
        let json = serde_json::to_value(BackendRef::service("web", Some(80)).with_weight(25))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "web", "port": 80, "weight": 25 })
        );
    }

    #[test]
    fn describe_match_renders_headers() {
        let m = HttpRouteMatch {
            path: Some(HttpPathMatch::Exact {
                value: "/login".into(),
            }),
            headers: Some(vec![HttpHeaderMatch::Exact {
                name: "x-canary".into(),
                value: "always".into(),
            }]),
            ..Default::default()
        };
        assert_eq!(describe_match(&m), "Exact /login x-canary=always");
    }

    #[test]
    fn redirect_summary() {
        let filter = RouteFilter::request_redirect(RequestRedirect {
            scheme: Some("https".into()),
            status_code: Some(308),
            ..Default::default()
        });
        assert_eq!(filter.to_string(), "RequestRedirect scheme=https status=308");
    }
}
