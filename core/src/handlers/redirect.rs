//! Redirect synthesis.
//!
//! Per entry, at most one of URL or SSL redirect applies, plus an optional
//! root (`app-root`) redirect. New rules are collected in a pending list and
//! appended once the entry is resolved: URL/SSL rules first, root rules last.

use k8s_gateway_api::HttpPathMatch;
use url::{Host, Url};

use crate::{
    path_only_match, FeatureHandler, FieldError, HttpRoute, PathEntry, PathModifier,
    RedirectKind, RequestRedirect, RouteFilter, RouteRule, RuleList, ANNOTATIONS_FIELD,
    PERMANENT_REDIRECT_CODE, SSL_REDIRECT_CODE,
};

const ROOT_PATH: &str = "/";
const HTTPS: &str = "https";

/// URL, SSL and root redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectHandler;

/// Build the redirect filter for `target`.
///
/// The port is left unset when it is the scheme's default or absent.
fn url_filter(target: &str, code: u16) -> Result<RequestRedirect, url::ParseError> {
    let url = Url::parse(target)?;
    Ok(RequestRedirect {
        scheme: Some(url.scheme().to_owned()),
        hostname: url.host().map(|host| match host {
            Host::Domain(domain) => domain.to_owned(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        }),
        path: Some(PathModifier::ReplaceFullPath {
            replace_full_path: url.path().to_owned(),
        }),
        port: url.port(),
        status_code: Some(code),
    })
}

fn ssl_filter() -> RequestRedirect {
    RequestRedirect {
        scheme: Some(HTTPS.to_owned()),
        status_code: Some(SSL_REDIRECT_CODE),
        ..Default::default()
    }
}

fn is_ssl_only(rule: &RouteRule) -> bool {
    match rule.filters.as_slice() {
        [RouteFilter::RequestRedirect { request_redirect }] => *request_redirect == ssl_filter(),
        _ => false,
    }
}

fn is_root_redirect(rule: &RouteRule) -> bool {
    let serves_root = rule.matches.iter().any(|m| {
        matches!(&m.path, Some(HttpPathMatch::Exact { value }) if value == ROOT_PATH)
    });
    serves_root && rule.redirect_filters().any(|r| r.full_path().is_some())
}

fn apply_url(
    rules: &mut RuleList,
    entry: &PathEntry,
    target: &str,
    code: u16,
    pending: &mut Vec<RouteRule>,
) -> Result<(), FieldError> {
    let redirect = url_filter(target, code)
        .map_err(|e| FieldError::invalid(ANNOTATIONS_FIELD, target, e.to_string()))?;

    if let Some(rule) = rules
        .find_sole_backend_mut(entry)
        .filter(|r| !r.has_redirect_filter())
    {
        rule.attach_filter(RouteFilter::request_redirect(redirect));
    } else if let Some(rule) = rules.find_mut(|r| {
        r.redirect_filters()
            .any(|f| f.hostname == redirect.hostname && f.full_path() == redirect.full_path())
    }) {
        tracing::debug!(path = %entry.path, target, "path joins existing redirect rule");
        rule.matches.push(path_only_match(entry.path_match()));
    } else {
        pending.push(RouteRule::new(
            vec![path_only_match(entry.path_match())],
            vec![RouteFilter::request_redirect(redirect)],
            Vec::new(),
        ));
    }
    rules.remove_backend_ref(entry);
    Ok(())
}

fn apply_ssl(rules: &mut RuleList, entry: &PathEntry, pending: &mut Vec<RouteRule>) {
    if let Some(rule) = rules
        .find_sole_backend_mut(entry)
        .filter(|r| !r.has_redirect_filter())
    {
        rule.prepend_filter(RouteFilter::request_redirect(ssl_filter()));
    } else if let Some(rule) = rules.find_mut(|r| is_ssl_only(r)) {
        rule.matches.push(path_only_match(entry.path_match()));
    } else {
        pending.insert(
            0,
            RouteRule::new(
                vec![path_only_match(entry.path_match())],
                vec![RouteFilter::request_redirect(ssl_filter())],
                Vec::new(),
            ),
        );
    }
    rules.remove_backend_ref(entry);
}

fn apply_root(rules: &RuleList, target: &str, pending: &mut Vec<RouteRule>) {
    if rules.any(is_root_redirect) || pending.iter().any(is_root_redirect) {
        tracing::debug!(target, "root redirect already present");
        return;
    }
    pending.push(RouteRule::new(
        vec![path_only_match(HttpPathMatch::Exact {
            value: ROOT_PATH.to_owned(),
        })],
        vec![RouteFilter::request_redirect(RequestRedirect {
            path: Some(PathModifier::ReplaceFullPath {
                replace_full_path: target.to_owned(),
            }),
            status_code: Some(PERMANENT_REDIRECT_CODE),
            ..Default::default()
        })],
        Vec::new(),
    ));
}

impl FeatureHandler for RedirectHandler {
    fn name(&self) -> &'static str {
        "redirect"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for entry in entries {
            let redirect = &entry.features.redirect;
            if !redirect.is_configured() {
                continue;
            }

            let rules = route.rules_mut();
            let mut pending = Vec::new();
            match &redirect.kind {
                RedirectKind::Url { target, code } => {
                    if let Err(err) = apply_url(rules, entry, target, *code, &mut pending) {
                        errors.push(err.with_source(&entry.source).logged());
                    }
                }
                RedirectKind::Ssl => apply_ssl(rules, entry, &mut pending),
                RedirectKind::None => {}
            }
            if let Some(root) = &redirect.root {
                apply_root(rules, root, &mut pending);
            }
            rules.extend(pending);
        }
        errors
    }
}
