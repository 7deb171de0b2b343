//! Annotation → [`FeatureBundle`] extraction.
//!
//! Each feature is parsed independently. A parse failure produces a
//! [`FieldError`] and leaves that feature (or the affected part of it) unset;
//! it never blocks the other features of the same record.

use std::collections::BTreeMap;

use regex::Regex;
use url::Url;
use weave::{
    CanaryConfig, CanaryKind, FeatureBundle, FeatureExtractor, FieldError, HeaderModConfig,
    MirrorConfig, RedirectConfig, RedirectKind, RewriteConfig, SourceRecord, TimeoutConfig,
    ANNOTATIONS_FIELD, DEFAULT_WEIGHT_TOTAL, PERMANENT_REDIRECT_CODE, TEMPORAL_REDIRECT_CODE,
};

use crate::annotations::{self as keys, Annotations};
use crate::ConvertOptions;

/// Extracts features from Ingress annotations.
#[derive(Debug, Clone)]
pub struct AnnotationExtractor {
    prefixes: Vec<String>,
}

impl AnnotationExtractor {
    /// Extractor reading annotations under `prefixes`, highest priority first.
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    /// Extractor using the prefixes of `options`.
    pub fn from_options(options: &ConvertOptions) -> Self {
        Self::new(options.annotation_prefixes.clone())
    }
}

impl Default for AnnotationExtractor {
    fn default() -> Self {
        Self::from_options(&ConvertOptions::default())
    }
}

impl FeatureExtractor for AnnotationExtractor {
    fn extract(&self, record: &SourceRecord) -> (FeatureBundle, Vec<FieldError>) {
        let annotations = Annotations::new(&record.annotations, &self.prefixes);
        let mut errors = Vec::new();

        let redirect = parse_redirect(&annotations, &mut errors);
        let (canary, rewrite) = if redirect.kind.is_active() {
            (None, None)
        } else {
            (
                parse_canary(&annotations, &mut errors),
                parse_rewrite(&annotations),
            )
        };

        let bundle = FeatureBundle {
            header_mod: parse_header_mod(&annotations, &mut errors),
            canary,
            rewrite,
            mirror: parse_mirror(&annotations, &mut errors),
            timeout: parse_timeout(&annotations, &mut errors),
            redirect,
        };
        (bundle, errors)
    }
}

fn invalid(key: &str, value: &str, reason: impl std::fmt::Display) -> FieldError {
    FieldError::invalid(ANNOTATIONS_FIELD, value, format!("{key}: {reason}"))
}

fn type_invalid(key: &str, value: &str, reason: impl std::fmt::Display) -> FieldError {
    FieldError::type_invalid(ANNOTATIONS_FIELD, value, format!("{key}: {reason}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Header modification
// ═══════════════════════════════════════════════════════════════════════════════

fn trim_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// One `name value` pair per line; the last value of a repeated name wins.
fn parse_header_lines(key: &str, value: &str, errors: &mut Vec<FieldError>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for line in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(char::is_whitespace) {
            Some((name, val)) => {
                headers.insert(
                    trim_quotes(name.trim()).to_owned(),
                    trim_quotes(val.trim()).to_owned(),
                );
            }
            None => errors.push(invalid(key, line, "invalid header format, expected `name value`")),
        }
    }
    headers
}

fn parse_header_mod(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> Option<HeaderModConfig> {
    let mut config = HeaderModConfig::default();
    if let Some(add) = a.get(keys::REQUEST_HEADER_ADD) {
        config.add = parse_header_lines(keys::REQUEST_HEADER_ADD, add, errors);
    }
    if let Some(update) = a.get(keys::REQUEST_HEADER_UPDATE) {
        config.set = parse_header_lines(keys::REQUEST_HEADER_UPDATE, update, errors);
    }
    if let Some(remove) = a.get(keys::REQUEST_HEADER_REMOVE) {
        config.remove = remove
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
    }
    (!config.is_empty()).then_some(config)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Canary
// ═══════════════════════════════════════════════════════════════════════════════

const DEFAULT_CANARY_HEADER_VALUE: &str = "always";

fn parse_canary(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> Option<CanaryConfig> {
    if a.get(keys::CANARY) != Some("true") {
        return None;
    }

    let kind = if let Some(name) = a.get(keys::CANARY_BY_HEADER) {
        if let Some(value) = a.get(keys::CANARY_BY_HEADER_VALUE) {
            CanaryKind::Header {
                name: name.to_owned(),
                value: value.to_owned(),
                regex: false,
            }
        } else if let Some(pattern) = a.get(keys::CANARY_BY_HEADER_REGEX) {
            match Regex::new(pattern) {
                Ok(_) => CanaryKind::Header {
                    name: name.to_owned(),
                    value: pattern.to_owned(),
                    regex: true,
                },
                Err(e) => {
                    errors.push(invalid(keys::CANARY_BY_HEADER_REGEX, pattern, e));
                    CanaryKind::None
                }
            }
        } else {
            CanaryKind::Header {
                name: name.to_owned(),
                value: DEFAULT_CANARY_HEADER_VALUE.to_owned(),
                regex: false,
            }
        }
    } else if let Some(name) = a.get(keys::CANARY_BY_COOKIE) {
        CanaryKind::Cookie {
            name: name.to_owned(),
        }
    } else if let Some(weight) = a.get(keys::CANARY_WEIGHT) {
        match weight.trim().parse::<i32>() {
            Ok(weight) if weight >= 0 => CanaryKind::Weight {
                weight,
                total: parse_weight_total(a, errors),
            },
            Ok(_) => {
                errors.push(invalid(keys::CANARY_WEIGHT, weight, "must not be negative"));
                CanaryKind::None
            }
            Err(e) => {
                errors.push(type_invalid(keys::CANARY_WEIGHT, weight, e));
                CanaryKind::None
            }
        }
    } else {
        CanaryKind::None
    };

    Some(CanaryConfig {
        enabled: true,
        kind,
    })
}

fn parse_weight_total(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> i32 {
    let Some(total) = a.get(keys::CANARY_WEIGHT_TOTAL) else {
        return DEFAULT_WEIGHT_TOTAL;
    };
    match total.trim().parse::<i32>() {
        Ok(total) if total > 0 => total,
        Ok(_) => {
            errors.push(invalid(keys::CANARY_WEIGHT_TOTAL, total, "must be positive"));
            DEFAULT_WEIGHT_TOTAL
        }
        Err(e) => {
            errors.push(type_invalid(keys::CANARY_WEIGHT_TOTAL, total, e));
            DEFAULT_WEIGHT_TOTAL
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rewrite, mirror, timeout
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_rewrite(a: &Annotations<'_>) -> Option<RewriteConfig> {
    let config = RewriteConfig {
        hostname: a.get_trimmed(keys::UPSTREAM_VHOST).map(str::to_owned),
        path: a.get_trimmed(keys::REWRITE_TARGET).map(str::to_owned),
    };
    (!config.is_empty()).then_some(config)
}

/// `[namespace/]name[:port]`
fn parse_mirror_target(target: &str) -> Result<MirrorConfig, String> {
    let (service, port) = match target.split_once(':') {
        Some((_, port)) if port.contains(':') => return Err("invalid service format".into()),
        Some((service, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| format!("invalid port: {e}"))?;
            (service, Some(port))
        }
        None => (target, None),
    };

    let (namespace, name) = match service.split('/').collect::<Vec<_>>().as_slice() {
        [name] => (None, *name),
        [namespace, name] => (Some((*namespace).to_owned()), *name),
        _ => return Err("invalid service format".into()),
    };
    if name.is_empty() {
        return Err("missing service name".into());
    }

    Ok(MirrorConfig {
        namespace,
        service: name.to_owned(),
        port,
    })
}

fn parse_mirror(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> Option<MirrorConfig> {
    let target = a.get_trimmed(keys::MIRROR_TARGET_SERVICE)?;
    match parse_mirror_target(target) {
        Ok(config) => Some(config),
        Err(reason) => {
            errors.push(invalid(keys::MIRROR_TARGET_SERVICE, target, reason));
            None
        }
    }
}

fn parse_timeout(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> Option<TimeoutConfig> {
    let value = a.get(keys::TIMEOUT)?;
    match value.trim().parse::<i64>() {
        Ok(seconds) => Some(TimeoutConfig { seconds }),
        Err(_) => {
            errors.push(invalid(keys::TIMEOUT, value, "timeout must be an integer"));
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Redirect
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_flag(a: &Annotations<'_>, key: &str, errors: &mut Vec<FieldError>) -> bool {
    match a.get(key).map(str::trim) {
        None | Some("false") => false,
        Some("true") => true,
        Some(other) => {
            errors.push(type_invalid(key, other, "expected `true` or `false`"));
            false
        }
    }
}

/// Redirect targets must be absolute `http` or `https` URLs.
fn parse_redirect_url(a: &Annotations<'_>, key: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let target = a.get_trimmed(key)?;
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(target.to_owned()),
        Ok(url) => {
            errors.push(invalid(
                key,
                target,
                format!("only http and https are valid protocols ({})", url.scheme()),
            ));
            None
        }
        Err(e) => {
            errors.push(invalid(key, target, e));
            None
        }
    }
}

fn parse_redirect(a: &Annotations<'_>, errors: &mut Vec<FieldError>) -> RedirectConfig {
    let ssl = parse_flag(a, keys::SSL_REDIRECT, errors) | parse_flag(a, keys::FORCE_SSL_REDIRECT, errors);

    let mut url = parse_redirect_url(a, keys::PERMANENT_REDIRECT, errors).map(|target| {
        let code = match a.get(keys::PERMANENT_REDIRECT_CODE) {
            Some(code) => code.trim().parse::<u16>().unwrap_or_else(|e| {
                errors.push(type_invalid(keys::PERMANENT_REDIRECT_CODE, code, e));
                PERMANENT_REDIRECT_CODE
            }),
            None => PERMANENT_REDIRECT_CODE,
        };
        (target, code)
    });
    if let Some(target) = parse_redirect_url(a, keys::TEMPORAL_REDIRECT, errors) {
        url = Some((target, TEMPORAL_REDIRECT_CODE));
    }

    let kind = match url {
        Some((target, code)) => RedirectKind::Url { target, code },
        None if ssl => RedirectKind::Ssl,
        None => RedirectKind::None,
    };

    RedirectConfig {
        kind,
        root: a.get_trimmed(keys::APP_ROOT).map(str::to_owned),
    }
}
