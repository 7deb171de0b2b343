use std::collections::BTreeMap;

use crate::{
    FeatureHandler, FieldError, HeaderModConfig, HeaderModifier, HttpHeader, HttpRoute,
    PathEntry, RouteFilter,
};

use super::attach_or_split;

/// Request header add / set / remove.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderModHandler;

impl HeaderModHandler {
    fn filter(config: &HeaderModConfig) -> RouteFilter {
        let headers = |map: &BTreeMap<String, String>| {
            map.iter()
                .map(|(name, value)| HttpHeader {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect()
        };
        RouteFilter::header_modifier(HeaderModifier {
            add: headers(&config.add),
            set: headers(&config.set),
            remove: config.remove.clone(),
        })
    }
}

impl FeatureHandler for HeaderModHandler {
    fn name(&self) -> &'static str {
        "header-mod"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        for entry in entries {
            if let Some(config) = entry.features.header_mod() {
                attach_or_split(route.rules_mut(), entry, Self::filter(config));
            }
        }
        Vec::new()
    }
}
