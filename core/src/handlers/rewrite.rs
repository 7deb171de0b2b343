use crate::{
    FeatureHandler, FieldError, HttpRoute, PathEntry, PathModifier, RewriteConfig, RouteFilter,
    UrlRewrite, ANNOTATIONS_FIELD,
};

use super::attach_or_split;

/// Host and prefix rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteHandler;

/// Rewrite targets using regex capture groups cannot be expressed as a prefix
/// replacement.
fn uses_capture_group(path: &str) -> bool {
    path.contains('(') && path.contains(')')
}

fn filter(config: &RewriteConfig) -> RouteFilter {
    RouteFilter::url_rewrite(UrlRewrite {
        hostname: config.hostname.clone().filter(|h| !h.is_empty()),
        path: config
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .map(|p| PathModifier::ReplacePrefixMatch {
                replace_prefix_match: p,
            }),
    })
}

impl FeatureHandler for RewriteHandler {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for entry in entries {
            let Some(config) = entry.features.rewrite() else {
                continue;
            };
            if let Some(path) = config.path.as_deref().filter(|p| uses_capture_group(p)) {
                errors.push(
                    FieldError::invalid(ANNOTATIONS_FIELD, path, "group capture not supported")
                        .with_source(&entry.source)
                        .logged(),
                );
                continue;
            }
            attach_or_split(route.rules_mut(), entry, filter(config));
        }
        errors
    }
}
