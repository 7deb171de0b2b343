//! Typed per-entry feature configuration.
//!
//! Precedence questions (which canary discriminant wins, URL vs SSL redirect)
//! are answered once, at extraction time, by choosing a variant of
//! [`CanaryKind`] or [`RedirectKind`]. Handlers only branch on the variant.

use std::collections::BTreeMap;

/// Default denominator for weight-based canaries.
pub const DEFAULT_WEIGHT_TOTAL: i32 = 100;

/// Status code used for SSL redirects.
pub const SSL_REDIRECT_CODE: u16 = 308;

/// Default status code for permanent redirects and root redirects.
pub const PERMANENT_REDIRECT_CODE: u16 = 301;

/// Default status code for temporal redirects.
pub const TEMPORAL_REDIRECT_CODE: u16 = 302;

/// The six optional feature configs attached to a path entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureBundle {
    /// Request header modification.
    pub header_mod: Option<HeaderModConfig>,
    /// Canary selection.
    pub canary: Option<CanaryConfig>,
    /// URL rewrite.
    pub rewrite: Option<RewriteConfig>,
    /// Request mirroring.
    pub mirror: Option<MirrorConfig>,
    /// Request timeout.
    pub timeout: Option<TimeoutConfig>,
    /// Redirects.
    pub redirect: RedirectConfig,
}

impl FeatureBundle {
    /// Clear canary and rewrite when a URL or SSL redirect is configured.
    ///
    /// Returns `true` when something was cleared.
    pub fn enforce_redirect_precedence(&mut self) -> bool {
        if !self.redirect.kind.is_active() {
            return false;
        }
        let cleared = self.canary.is_some() || self.rewrite.is_some();
        self.canary = None;
        self.rewrite = None;
        cleared
    }

    /// Non-empty header modification config.
    pub fn header_mod(&self) -> Option<&HeaderModConfig> {
        self.header_mod.as_ref().filter(|h| !h.is_empty())
    }

    /// Non-empty rewrite config.
    pub fn rewrite(&self) -> Option<&RewriteConfig> {
        self.rewrite.as_ref().filter(|r| !r.is_empty())
    }

    /// Mirror config with a target service.
    pub fn mirror(&self) -> Option<&MirrorConfig> {
        self.mirror.as_ref().filter(|m| !m.service.is_empty())
    }

    /// Positive timeout in seconds.
    pub fn timeout_seconds(&self) -> Option<u32> {
        self.timeout
            .and_then(|t| u32::try_from(t.seconds).ok())
            .filter(|s| *s > 0)
    }
}

/// Header add / set / remove lists.
///
/// Maps are keyed by header name; a repeated name within one annotation value
/// keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderModConfig {
    /// Headers to add.
    pub add: BTreeMap<String, String>,
    /// Headers to overwrite.
    pub set: BTreeMap<String, String>,
    /// Header names to remove.
    pub remove: Vec<String>,
}

impl HeaderModConfig {
    /// No operation configured.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.set.is_empty() && self.remove.is_empty()
    }
}

/// Canary configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanaryConfig {
    /// `canary: "true"` was set.
    pub enabled: bool,
    /// The selected discriminant.
    pub kind: CanaryKind,
}

/// Which canary discriminant applies.
///
/// Header beats cookie beats weight; lower-priority settings are dropped when
/// the variant is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanaryKind {
    /// Enabled but no usable discriminant.
    None,
    /// Match on a request header.
    Header {
        /// Header name.
        name: String,
        /// Exact value or regex, depending on `regex`.
        value: String,
        /// Value is a regular expression.
        regex: bool,
    },
    /// Match when the named cookie equals `always`.
    Cookie {
        /// Cookie name.
        name: String,
    },
    /// Percentage split.
    Weight {
        /// Weight of this canary backend.
        weight: i32,
        /// Total the weights are relative to.
        total: i32,
    },
}

/// URL rewrite configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Upstream `Host` override.
    pub hostname: Option<String>,
    /// Prefix replacement.
    pub path: Option<String>,
}

impl RewriteConfig {
    /// Nothing to rewrite.
    pub fn is_empty(&self) -> bool {
        self.hostname.as_deref().map_or(true, str::is_empty)
            && self.path.as_deref().map_or(true, str::is_empty)
    }
}

/// Mirror target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Target namespace.
    pub namespace: Option<String>,
    /// Target service.
    pub service: String,
    /// Target port.
    pub port: Option<u16>,
}

/// Request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Seconds; only positive values are applied.
    pub seconds: i64,
}

/// Redirect configuration: one [`RedirectKind`] plus an orthogonal root target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectConfig {
    /// URL or SSL redirect.
    pub kind: RedirectKind,
    /// `app-root` target path.
    pub root: Option<String>,
}

impl RedirectConfig {
    /// Any redirect configured.
    pub fn is_configured(&self) -> bool {
        self.kind.is_active() || self.root.is_some()
    }
}

/// URL and SSL redirects are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RedirectKind {
    /// No redirect.
    #[default]
    None,
    /// Redirect to a fixed URL.
    Url {
        /// Target URL.
        target: String,
        /// Status code.
        code: u16,
    },
    /// Upgrade to HTTPS.
    Ssl,
}

impl RedirectKind {
    /// `Url` or `Ssl`.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canary_weight(weight: i32) -> CanaryConfig {
        CanaryConfig {
            enabled: true,
            kind: CanaryKind::Weight {
                weight,
                total: DEFAULT_WEIGHT_TOTAL,
            },
        }
    }

    #[test]
    fn redirect_clears_canary_and_rewrite() {
        let mut bundle = FeatureBundle {
            canary: Some(canary_weight(10)),
            rewrite: Some(RewriteConfig {
                hostname: Some("h".into()),
                path: None,
            }),
            redirect: RedirectConfig {
                kind: RedirectKind::Ssl,
                root: None,
            },
            ..Default::default()
        };
        assert!(bundle.enforce_redirect_precedence());
        assert!(bundle.canary.is_none());
        assert!(bundle.rewrite.is_none());
    }

    #[test]
    fn root_redirect_alone_keeps_canary() {
        let mut bundle = FeatureBundle {
            canary: Some(canary_weight(10)),
            redirect: RedirectConfig {
                kind: RedirectKind::None,
                root: Some("/app".into()),
            },
            ..Default::default()
        };
        assert!(!bundle.enforce_redirect_precedence());
        assert!(bundle.canary.is_some());
    }

    #[test]
    fn zero_and_negative_timeouts_are_ignored() {
        let mut bundle = FeatureBundle::default();
        bundle.timeout = Some(TimeoutConfig { seconds: 0 });
        assert_eq!(bundle.timeout_seconds(), None);
        bundle.timeout = Some(TimeoutConfig { seconds: -3 });
        assert_eq!(bundle.timeout_seconds(), None);
        bundle.timeout = Some(TimeoutConfig { seconds: 30 });
        assert_eq!(bundle.timeout_seconds(), Some(30));
    }

    #[test]
    fn empty_configs_are_filtered() {
        let bundle = FeatureBundle {
            header_mod: Some(HeaderModConfig::default()),
            rewrite: Some(RewriteConfig::default()),
            mirror: Some(MirrorConfig::default()),
            ..Default::default()
        };
        assert!(bundle.header_mod().is_none());
        assert!(bundle.rewrite().is_none());
        assert!(bundle.mirror().is_none());
    }
}
