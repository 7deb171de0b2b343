//! Conformance fixture runner
//!
//! Loads YAML fixtures (Ingress input plus expected routes and errors) and
//! runs them through the converter.

use serde::Deserialize;
use weave::{FieldError, RouteKey};
use weave_ingress::{ConvertOptions, Converter, IngressStore};

use crate::{summarize, RuleSummary};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: ConvertOptions,
    /// Multi-document Ingress YAML.
    pub input: String,
    pub expect: Expectation,
}

/// Expected conversion output
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Expectation {
    /// Every route, in key order.
    pub routes: Vec<ExpectedRoute>,
    /// Every field error, in report order.
    pub errors: Vec<ExpectedError>,
}

/// Expected route
#[derive(Debug, Deserialize)]
pub struct ExpectedRoute {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Checked only when present.
    #[serde(default)]
    pub hostnames: Option<Vec<String>>,
    pub rules: Vec<RuleSummary>,
}

/// Expected field error
#[derive(Debug, Deserialize)]
pub struct ExpectedError {
    /// `namespace/name` of the offending Ingress.
    pub ingress: String,
    /// `Invalid`, `TypeInvalid`, `NotFound` or `NotSupported`.
    pub kind: String,
    /// Substring of the rendered error.
    #[serde(default)]
    pub contains: Option<String>,
}

fn default_namespace() -> String {
    weave_ingress::DEFAULT_NAMESPACE.to_owned()
}

impl ExpectedError {
    fn matches(&self, err: &FieldError) -> bool {
        let origin = err.origin.as_ref().map(ToString::to_string);
        origin.as_deref() == Some(self.ingress.as_str())
            && format!("{:?}", err.kind) == self.kind
            && self
                .contains
                .as_ref()
                .map_or(true, |needle| err.to_string().contains(needle.as_str()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// One difference between expected and actual output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub what: String,
    pub expected: String,
    pub actual: String,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Convert the input and compare against the expectation
    pub fn run(&self) -> Vec<Mismatch> {
        let store = match IngressStore::from_yaml_str(&self.input, &self.options) {
            Ok(store) => store,
            Err(e) => {
                return vec![Mismatch {
                    what: "input".into(),
                    expected: "valid Ingress YAML".into(),
                    actual: e.to_string(),
                }];
            }
        };
        let conversion = Converter::new(self.options.clone()).convert(&store);
        let mut mismatches = Vec::new();

        let expected_keys: Vec<_> = self
            .expect
            .routes
            .iter()
            .map(|r| r.key().to_string())
            .collect();
        let actual_keys: Vec<_> = conversion.routes.keys().map(ToString::to_string).collect();
        if expected_keys != actual_keys {
            mismatches.push(Mismatch {
                what: "routes".into(),
                expected: format!("{expected_keys:?}"),
                actual: format!("{actual_keys:?}"),
            });
        }

        for expected in &self.expect.routes {
            let Some(route) = conversion.routes.get(&expected.key()) else {
                continue;
            };
            if let Some(hostnames) = &expected.hostnames {
                if *hostnames != route.spec.hostnames {
                    mismatches.push(Mismatch {
                        what: format!("{} hostnames", route.key()),
                        expected: format!("{hostnames:?}"),
                        actual: format!("{:?}", route.spec.hostnames),
                    });
                }
            }
            let actual = summarize(route);
            if actual != expected.rules {
                mismatches.push(Mismatch {
                    what: format!("{} rules", route.key()),
                    expected: format!("{:#?}", expected.rules),
                    actual: format!("{actual:#?}"),
                });
            }
        }

        let errors_match = self.expect.errors.len() == conversion.errors.len()
            && self
                .expect
                .errors
                .iter()
                .zip(&conversion.errors)
                .all(|(want, got)| want.matches(got));
        if !errors_match {
            mismatches.push(Mismatch {
                what: "errors".into(),
                expected: format!("{:#?}", self.expect.errors),
                actual: conversion
                    .errors
                    .iter()
                    .map(|e| {
                        let origin = e.origin.as_ref().map(ToString::to_string);
                        format!("{} [{:?}] {e}", origin.unwrap_or_default(), e.kind)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            });
        }

        mismatches
    }

    /// Run the fixture and panic on the first mismatch
    pub fn run_and_assert(&self) {
        if let Some(m) = self.run().into_iter().next() {
            panic!(
                "Fixture '{}' mismatch in {}:\nexpected: {}\nactual:   {}",
                self.name, m.what, m.expected, m.actual
            );
        }
    }
}

impl ExpectedRoute {
    fn key(&self) -> RouteKey {
        RouteKey::new(self.namespace.clone(), self.name.clone())
    }
}
