use crate::{FieldError, HttpRoute, Pipeline, RouteGroup};

/// Runs a [`Pipeline`] over every match group of a route group.
///
/// Match groups are processed to completion, in order, before the next one
/// starts.
#[derive(Debug, Default)]
pub struct Consolidator {
    pipeline: Pipeline,
}

impl Consolidator {
    /// Consolidator over a custom pipeline.
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// The pipeline in use.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Merge every feature of `group` into `route`.
    pub fn consolidate(&self, route: &mut HttpRoute, group: &RouteGroup) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for matches in &group.groups {
            tracing::debug!(
                route = %route.key(),
                key = %matches.key,
                entries = matches.entries.len(),
                "consolidating match group"
            );
            errors.extend(self.pipeline.apply(route, &matches.entries));
        }
        errors
    }
}
