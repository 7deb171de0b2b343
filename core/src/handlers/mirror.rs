use crate::{
    BackendRef, FeatureHandler, FieldError, HttpRoute, MirrorConfig, PathEntry, RequestMirror,
    RouteFilter,
};

use super::attach_or_split;

/// Request mirroring to a second service.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorHandler;

fn filter(config: &MirrorConfig) -> RouteFilter {
    RouteFilter::request_mirror(RequestMirror {
        backend_ref: BackendRef {
            name: config.service.clone(),
            namespace: config.namespace.clone().filter(|ns| !ns.is_empty()),
            port: config.port.filter(|p| *p != 0),
            weight: None,
        },
    })
}

impl FeatureHandler for MirrorHandler {
    fn name(&self) -> &'static str {
        "mirror"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        for entry in entries {
            if let Some(config) = entry.features.mirror() {
                attach_or_split(route.rules_mut(), entry, filter(config));
            }
        }
        Vec::new()
    }
}
