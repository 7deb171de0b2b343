//! Annotation keys and prefixed lookup.

use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════════════════

pub const REQUEST_HEADER_ADD: &str = "request-header-control-add";
pub const REQUEST_HEADER_UPDATE: &str = "request-header-control-update";
pub const REQUEST_HEADER_REMOVE: &str = "request-header-control-remove";

pub const CANARY: &str = "canary";
pub const CANARY_BY_HEADER: &str = "canary-by-header";
pub const CANARY_BY_HEADER_VALUE: &str = "canary-by-header-value";
pub const CANARY_BY_HEADER_REGEX: &str = "canary-by-header-regex";
pub const CANARY_BY_COOKIE: &str = "canary-by-cookie";
pub const CANARY_WEIGHT: &str = "canary-weight";
pub const CANARY_WEIGHT_TOTAL: &str = "canary-weight-total";

pub const UPSTREAM_VHOST: &str = "upstream-vhost";
pub const REWRITE_TARGET: &str = "rewrite-target";

pub const MIRROR_TARGET_SERVICE: &str = "mirror-target-service";

pub const TIMEOUT: &str = "timeout";

pub const SSL_REDIRECT: &str = "ssl-redirect";
pub const FORCE_SSL_REDIRECT: &str = "force-ssl-redirect";
pub const PERMANENT_REDIRECT: &str = "permanent-redirect";
pub const PERMANENT_REDIRECT_CODE: &str = "permanent-redirect-code";
pub const TEMPORAL_REDIRECT: &str = "temporal-redirect";
pub const APP_ROOT: &str = "app-root";

/// Legacy annotation carrying the ingress class.
pub const INGRESS_CLASS: &str = "kubernetes.io/ingress.class";

// ═══════════════════════════════════════════════════════════════════════════════
// Lookup
// ═══════════════════════════════════════════════════════════════════════════════

/// Annotations of one record, read through an ordered list of prefixes.
#[derive(Debug, Clone, Copy)]
pub struct Annotations<'a> {
    map: &'a BTreeMap<String, String>,
    prefixes: &'a [String],
}

impl<'a> Annotations<'a> {
    pub fn new(map: &'a BTreeMap<String, String>, prefixes: &'a [String]) -> Self {
        Self { map, prefixes }
    }

    /// First non-empty value of `<prefix>/<key>`, trying prefixes in order.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.prefixes.iter().find_map(|prefix| {
            self.map
                .get(&format!("{}/{key}", prefix.trim_end_matches('/')))
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        })
    }

    /// [`get`](Self::get) with surrounding whitespace removed; blank is absent.
    pub fn get_trimmed(&self, key: &str) -> Option<&'a str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }
}
