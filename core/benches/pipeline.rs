//! Pipeline benchmarks: match-group consolidation.
//!
//! Measures merging a single match group into its skeleton route, scaling
//! with the number of entries sharing the path.

use std::sync::Arc;

use weave::prelude::*;
use weave::{HeaderModConfig, MatchGroup, MatchKey, RedirectConfig};

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════════

fn entry(svc: &str, features: FeatureBundle) -> PathEntry {
    PathEntry {
        source: SourceRef::new("default", svc),
        host: "foo.com".into(),
        path: "/".into(),
        path_type: PathType::Prefix,
        backend: ServiceBackend::new(svc, Some(80)),
        features: Arc::new(features),
    }
}

fn skeleton(entries: &[PathEntry]) -> HttpRoute {
    let mut route = HttpRoute::new(RouteKey::new("default", "web-foo-com"));
    route.rules_mut().append(RouteRule::new(
        vec![path_only_match(PathType::Prefix.to_path_match("/"))],
        vec![],
        entries.iter().map(PathEntry::backend_ref).collect(),
    ));
    route
}

fn weighted(n: usize) -> Vec<PathEntry> {
    (0..n)
        .map(|i| {
            let features = if i % 2 == 0 {
                FeatureBundle::default()
            } else {
                FeatureBundle {
                    canary: Some(CanaryConfig {
                        enabled: true,
                        kind: CanaryKind::Weight {
                            weight: 5,
                            total: 100,
                        },
                    }),
                    ..Default::default()
                }
            };
            entry(&format!("svc-{i}"), features)
        })
        .collect()
}

fn mixed(n: usize) -> Vec<PathEntry> {
    (0..n)
        .map(|i| {
            let features = match i % 3 {
                0 => FeatureBundle {
                    header_mod: Some(HeaderModConfig {
                        remove: vec!["x-debug".into()],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                1 => FeatureBundle {
                    timeout: Some(TimeoutConfig { seconds: 10 }),
                    ..Default::default()
                },
                _ => FeatureBundle {
                    redirect: RedirectConfig {
                        kind: RedirectKind::Ssl,
                        root: Some("/app".into()),
                    },
                    ..Default::default()
                },
            };
            entry(&format!("svc-{i}"), features)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [2, 16, 64])]
fn canary_weights(bencher: divan::Bencher, n: usize) {
    let pipeline = Pipeline::standard();
    let entries = weighted(n);
    let route = skeleton(&entries);
    bencher
        .with_inputs(|| route.clone())
        .bench_local_values(|mut route| {
            let errors = pipeline.apply(&mut route, &entries);
            (route, errors)
        });
}

#[divan::bench(args = [3, 15, 60])]
fn mixed_features(bencher: divan::Bencher, n: usize) {
    let pipeline = Pipeline::standard();
    let entries = mixed(n);
    let route = skeleton(&entries);
    bencher
        .with_inputs(|| route.clone())
        .bench_local_values(|mut route| {
            let errors = pipeline.apply(&mut route, &entries);
            (route, errors)
        });
}

#[divan::bench]
fn consolidate_group(bencher: divan::Bencher) {
    let consolidator = Consolidator::default();
    let entries = mixed(12);
    let route = skeleton(&entries);
    let group = weave::RouteGroup {
        key: weave::HostKey {
            namespace: "default".into(),
            host: "foo.com".into(),
        },
        groups: vec![MatchGroup {
            key: MatchKey {
                path_type: PathType::Prefix,
                path: "/".into(),
            },
            entries,
        }],
    };
    bencher
        .with_inputs(|| route.clone())
        .bench_local_values(|mut route| {
            let errors = consolidator.consolidate(&mut route, &group);
            (route, errors)
        });
}
