//! Path grouper: raw entries → route groups → match groups.
//!
//! Feature extraction happens here, once per source record. Every entry of a
//! record shares the resulting [`FeatureBundle`] through an `Arc`, and the
//! redirect precedence rule is enforced before the bundle is shared.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{FeatureBundle, FieldError, MatchKey, PathEntry, RawPathEntry, SourceRecord, SourceRef};

/// Parses the per-feature configuration of a source record.
///
/// Parse failures are returned next to the bundle; the affected feature is
/// left unset and extraction carries on with the others.
pub trait FeatureExtractor {
    /// Extract the feature bundle of `record`.
    fn extract(&self, record: &SourceRecord) -> (FeatureBundle, Vec<FieldError>);
}

/// Extractor that configures nothing. Every entry becomes a baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeatures;

impl FeatureExtractor for NoFeatures {
    fn extract(&self, _record: &SourceRecord) -> (FeatureBundle, Vec<FieldError>) {
        (FeatureBundle::default(), Vec::new())
    }
}

/// Route key before naming: namespace plus virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostKey {
    /// Namespace.
    pub namespace: String,
    /// Host; empty for "all hosts".
    pub host: String,
}

/// Entries sharing one match key, in encounter order.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    /// `(pathType, path)`.
    pub key: MatchKey,
    /// Entries in first-encounter order.
    pub entries: Vec<PathEntry>,
}

/// All match groups of one (namespace, host).
#[derive(Debug, Clone)]
pub struct RouteGroup {
    /// Namespace and host.
    pub key: HostKey,
    /// Match groups in first-encounter order.
    pub groups: Vec<MatchGroup>,
}

impl RouteGroup {
    /// Total number of entries across all match groups.
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

/// Group `entries` by host key, then by match key.
///
/// Ordering is stable: route groups and match groups appear in the order their
/// first entry was seen, entries within a group keep input order. Extraction
/// errors are returned attributed to the record; no entry is dropped for them.
pub fn group_paths(
    entries: impl IntoIterator<Item = RawPathEntry>,
    extractor: &dyn FeatureExtractor,
) -> (Vec<RouteGroup>, Vec<FieldError>) {
    let mut routes: Vec<RouteGroup> = Vec::new();
    let mut route_index: HashMap<HostKey, usize> = HashMap::new();
    let mut match_index: HashMap<(usize, MatchKey), usize> = HashMap::new();
    let mut bundles: HashMap<SourceRef, Arc<FeatureBundle>> = HashMap::new();
    let mut errors = Vec::new();

    for raw in entries {
        let features = bundles
            .entry(raw.source.id.clone())
            .or_insert_with(|| {
                let (mut bundle, errs) = extractor.extract(&raw.source);
                errors.extend(errs.into_iter().map(|e| e.with_source(&raw.source.id).logged()));
                if bundle.enforce_redirect_precedence() {
                    tracing::debug!(
                        source = %raw.source.id,
                        "redirect configured, canary and rewrite dropped"
                    );
                }
                Arc::new(bundle)
            })
            .clone();

        let host_key = HostKey {
            namespace: raw.source.id.namespace.clone(),
            host: raw.host.clone(),
        };
        let route_idx = *route_index.entry(host_key.clone()).or_insert_with(|| {
            routes.push(RouteGroup {
                key: host_key,
                groups: Vec::new(),
            });
            routes.len() - 1
        });

        let match_key = raw.match_key();
        let group_idx = *match_index
            .entry((route_idx, match_key.clone()))
            .or_insert_with(|| {
                let groups = &mut routes[route_idx].groups;
                groups.push(MatchGroup {
                    key: match_key,
                    entries: Vec::new(),
                });
                groups.len() - 1
            });

        routes[route_idx].groups[group_idx]
            .entries
            .push(PathEntry::from_raw(raw, features));
    }

    (routes, errors)
}
