use crate::{FeatureHandler, FieldError, HttpRoute, PathEntry, RouteTimeouts, ANNOTATIONS_FIELD};

/// Request timeouts. Runs after every handler that reshapes rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutHandler;

impl FeatureHandler for TimeoutHandler {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn apply(&self, route: &mut HttpRoute, entries: &[PathEntry]) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for entry in entries {
            let Some(seconds) = entry.features.timeout_seconds() else {
                continue;
            };
            match route.rules_mut().find_by_path_mut(entry) {
                Some(rule) => rule.timeouts = Some(RouteTimeouts::from_seconds(seconds)),
                None => errors.push(
                    FieldError::not_found(ANNOTATIONS_FIELD, entry.path.clone(), "rule not found")
                        .with_source(&entry.source)
                        .logged(),
                ),
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::{FeatureBundle, FieldErrorKind, TimeoutConfig};

    fn timeout(seconds: i64) -> FeatureBundle {
        FeatureBundle {
            timeout: Some(TimeoutConfig { seconds }),
            ..Default::default()
        }
    }

    #[test]
    fn sets_request_timeout_on_shared_rule() {
        let mut route = route(vec![rule("/", &["a", "b"])]);
        let errors = TimeoutHandler.apply(&mut route, &[entry("/", "b", timeout(30))]);
        assert!(errors.is_empty());
        assert_eq!(route.rules()[0].timeouts, Some(RouteTimeouts::from_seconds(30)));
    }

    #[test]
    fn missing_rule_is_reported() {
        let mut route = route(vec![rule("/other", &["a"])]);
        let errors = TimeoutHandler.apply(&mut route, &[entry("/", "a", timeout(30))]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, FieldErrorKind::NotFound);
        assert_eq!(errors[0].message, "rule not found");
    }

    #[test]
    fn non_positive_timeouts_are_skipped() {
        let mut route = route(vec![rule("/", &["a"])]);
        let errors = TimeoutHandler.apply(&mut route, &[entry("/", "a", timeout(0))]);
        assert!(errors.is_empty());
        assert!(route.rules()[0].timeouts.is_none());
    }
}
