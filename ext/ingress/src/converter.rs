//! End-to-end conversion: store → skeleton → grouped entries → merged routes.

use std::collections::BTreeMap;
use std::path::Path;

use weave::{group_paths, Consolidator, FieldError, HttpRoute, Pipeline, RouteKey};

use crate::{AnnotationExtractor, ConvertOptions, IngressStore, LoadError, Manifest, Skeleton};

/// Converted routes plus every field error reported on the way.
#[derive(Debug, Default)]
pub struct Conversion {
    /// Routes by `(namespace, name)`.
    pub routes: BTreeMap<RouteKey, HttpRoute>,
    /// Field errors in the order they were reported.
    pub errors: Vec<FieldError>,
}

impl Conversion {
    /// Returns `true` if no field error was reported.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Routes as `HTTPRoute` documents, ordered by key.
    pub fn manifests(&self) -> impl Iterator<Item = Manifest<'_>> {
        self.routes.values().map(Manifest::from)
    }
}

/// Converts Ingress objects into merged `HTTPRoute`s.
#[derive(Debug)]
pub struct Converter {
    options: ConvertOptions,
    extractor: AnnotationExtractor,
    consolidator: Consolidator,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// Converter running the standard pipeline.
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            extractor: AnnotationExtractor::from_options(&options),
            consolidator: Consolidator::default(),
            options,
        }
    }

    /// Replace the feature pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.consolidator = Consolidator::new(pipeline);
        self
    }

    /// Options in use.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Read the Ingresses of a manifest file selected by these options.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<IngressStore, LoadError> {
        IngressStore::from_path(path, &self.options)
    }

    /// Convert every Ingress of `store`.
    pub fn convert(&self, store: &IngressStore) -> Conversion {
        let mut skeleton = Skeleton::build(store);
        let mut errors = std::mem::take(&mut skeleton.errors);
        let mut routes = std::mem::take(&mut skeleton.routes);

        let (groups, extract_errors) =
            group_paths(std::mem::take(&mut skeleton.entries), &self.extractor);
        errors.extend(extract_errors);

        for group in &groups {
            let Some(route) = skeleton
                .route_key(&group.key)
                .and_then(|key| routes.get_mut(key))
            else {
                tracing::debug!(host = %group.key.host, "no route for host group");
                continue;
            };
            errors.extend(self.consolidator.consolidate(route, group));
        }

        tracing::debug!(
            ingresses = store.len(),
            routes = routes.len(),
            errors = errors.len(),
            "conversion finished"
        );
        Conversion { routes, errors }
    }
}
