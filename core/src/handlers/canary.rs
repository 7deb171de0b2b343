//! Canary splitting.
//!
//! Entries without an enabled canary are the baseline. Header and cookie
//! canaries get a dedicated rule whose match carries a header predicate;
//! weight canaries are merged with the baseline into one weighted split.

use k8s_gateway_api::{HttpHeaderMatch, HttpRouteMatch};

use crate::weight::{allocate, WeightSlot};
use crate::{
    path_only_match, CanaryKind, FeatureHandler, FieldError, HttpRoute, PathEntry, RouteRule,
    RuleList, DEFAULT_WEIGHT_TOTAL,
};

/// Header a cookie canary matches on.
pub const COOKIE_HEADER: &str = "cookie";

/// Header, cookie and weight canaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanaryHandler;

enum Role<'a> {
    Baseline,
    Header(&'a CanaryKind),
    Weight { weight: i32, total: i32 },
    Ignored,
}

fn role(entry: &PathEntry) -> Role<'_> {
    match &entry.features.canary {
        Some(canary) if canary.enabled => match &canary.kind {
            kind @ (CanaryKind::Header { .. } | CanaryKind::Cookie { .. }) => Role::Header(kind),
            CanaryKind::Weight { weight, total } => Role::Weight {
                weight: *weight,
                total: *total,
            },
            CanaryKind::None => Role::Ignored,
        },
        _ => Role::Baseline,
    }
}

/// Header predicate for a header or cookie canary.
fn header_match(kind: &CanaryKind) -> Option<HttpHeaderMatch> {
    match kind {
        CanaryKind::Header {
            name,
            value,
            regex: false,
        } => Some(HttpHeaderMatch::Exact {
            name: name.clone(),
            value: value.clone(),
        }),
        CanaryKind::Header {
            name,
            value,
            regex: true,
        } => Some(HttpHeaderMatch::RegularExpression {
            name: name.clone(),
            value: value.clone(),
        }),
        CanaryKind::Cookie { name } => Some(HttpHeaderMatch::RegularExpression {
            name: COOKIE_HEADER.to_owned(),
            value: format!(r"(?:^|;\s*){}=always(?:$|;|\s)", regex::escape(name)),
        }),
        CanaryKind::None | CanaryKind::Weight { .. } => None,
    }
}

fn apply_header(rules: &mut RuleList, entry: &PathEntry, kind: &CanaryKind) {
    let Some(header) = header_match(kind) else {
        return;
    };
    let m = HttpRouteMatch {
        path: Some(entry.path_match()),
        headers: Some(vec![header]),
        ..Default::default()
    };

    if let Some(rule) = rules.find_sole_backend_mut(entry) {
        tracing::debug!(path = %entry.path, backend = %entry.backend, "canary match replaces rule matches");
        rule.matches = vec![m];
        return;
    }
    rules.remove_backend_ref(entry);
    rules.append(RouteRule::new(vec![m], vec![], vec![entry.backend_ref()]));
}

fn apply_weights(rules: &mut RuleList, group: &PathEntry, slots: Vec<WeightSlot>, total: i32) {
    let Some(allocation) = allocate(slots, total) else {
        return;
    };
    tracing::debug!(path = %group.path, total, sum = allocation.sum(), "canary weights allocated");

    for backend in allocation.backends {
        let mut found = false;
        for rule in rules.iter_mut().filter(|r| r.serves_path_of(group)) {
            for existing in rule.backend_refs.iter_mut() {
                if existing.name == backend.name {
                    existing.weight = backend.weight;
                    found = true;
                }
            }
        }
        if !found {
            rules.append(RouteRule::new(
                vec![path_only_match(group.path_match())],
                vec![],
                vec![backend],
            ));
        }
    }
}

impl FeatureHandler for CanaryHandler {
    fn name(&self) -> &'static str {
        "canary"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        let Some(first) = entries.first() else {
            return Vec::new();
        };

        let mut baseline = Vec::new();
        let mut weighted = Vec::new();
        let mut total = DEFAULT_WEIGHT_TOTAL;

        for entry in entries {
            match role(entry) {
                Role::Baseline => baseline.push(WeightSlot {
                    backend: entry.backend_ref(),
                    explicit: None,
                }),
                Role::Header(kind) => apply_header(route.rules_mut(), entry, kind),
                Role::Weight { weight, total: t } => {
                    total = t;
                    weighted.push(WeightSlot {
                        backend: entry.backend_ref(),
                        explicit: Some(weight),
                    });
                }
                Role::Ignored => {
                    tracing::debug!(path = %entry.path, source = %entry.source, "canary enabled without discriminant");
                }
            }
        }

        if !weighted.is_empty() {
            baseline.extend(weighted);
            apply_weights(route.rules_mut(), first, baseline, total);
        }
        Vec::new()
    }
}
