//! `RuleList`: the ordered, shared rule sequence every handler mutates.
//!
//! Lookups and the mutation they gate happen inside one call
//! ([`find_sole_backend_mut`](RuleList::find_sole_backend_mut) followed by an
//! in-place edit, or [`remove_backend_ref`](RuleList::remove_backend_ref)).
//! Positions are never carried across calls, so a removal performed by one
//! handler cannot invalidate state held by another.
//!
//! # Matching
//!
//! | Operation | Path comparison | Backend condition |
//! |-----------|-----------------|-------------------|
//! | [`find_sole_backend`](RuleList::find_sole_backend) | strict | exactly one backend, equal to the entry's |
//! | [`find_by_path`](RuleList::find_by_path) | strict | entry's backend among the rule's |
//! | [`remove_backend_ref`](RuleList::remove_backend_ref) | loose | entry's backend among the rule's |
//!
//! Strict comparison maps `Exact`→`Exact` and `Prefix`→`PathPrefix` only; loose
//! comparison additionally maps `ImplementationSpecific`→`RegularExpression`,
//! the way the skeleton built those rules.

use std::ops::Index;

use k8s_gateway_api::HttpRouteMatch;
use serde::{Deserialize, Serialize};

use crate::{PathEntry, RouteRule};

/// Outcome of [`RuleList::remove_backend_ref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A plain rule was deleted outright.
    Rule,
    /// One backend reference was removed; the rule stays.
    BackendRef,
}

/// Ordered list of route rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleList(Vec<RouteRule>);

impl RuleList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate rules in order.
    pub fn iter(&self) -> std::slice::Iter<'_, RouteRule> {
        self.0.iter()
    }

    /// Iterate rules mutably in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RouteRule> {
        self.0.iter_mut()
    }

    /// Rules as a slice.
    pub fn as_slice(&self) -> &[RouteRule] {
        &self.0
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rule matcher
    // ═══════════════════════════════════════════════════════════════════════

    /// The rule serving exactly `entry`'s path with `entry`'s backend as its
    /// only backend.
    pub fn find_sole_backend(&self, entry: &PathEntry) -> Option<&RouteRule> {
        self.position_sole_backend(entry).map(|i| &self.0[i])
    }

    /// Mutable variant of [`find_sole_backend`](Self::find_sole_backend).
    pub fn find_sole_backend_mut(&mut self, entry: &PathEntry) -> Option<&mut RouteRule> {
        self.position_sole_backend(entry).map(|i| &mut self.0[i])
    }

    /// First rule with `entry`'s path that carries `entry`'s backend, whatever
    /// the backend count.
    pub fn find_by_path_mut(&mut self, entry: &PathEntry) -> Option<&mut RouteRule> {
        self.0.iter_mut().find(|rule| {
            has_strict_path(&rule.matches, entry) && carries_backend(rule, entry)
        })
    }

    /// Immutable variant of [`find_by_path_mut`](Self::find_by_path_mut).
    pub fn find_by_path(&self, entry: &PathEntry) -> Option<&RouteRule> {
        self.0.iter().find(|rule| {
            has_strict_path(&rule.matches, entry) && carries_backend(rule, entry)
        })
    }

    fn position_sole_backend(&self, entry: &PathEntry) -> Option<usize> {
        self.0.iter().position(|rule| {
            rule.backend_refs.len() == 1
                && has_strict_path(&rule.matches, entry)
                && entry.backend.is_referenced_by(&rule.backend_refs[0])
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Rule mutator
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove `entry`'s backend from the first rule serving its path.
    ///
    /// Plain rules are deleted outright; otherwise only the one reference goes.
    /// Returns `None` when no rule carried the backend.
    pub fn remove_backend_ref(&mut self, entry: &PathEntry) -> Option<Removal> {
        let (rule_idx, ref_idx) = self.0.iter().enumerate().find_map(|(i, rule)| {
            if rule.matches.is_empty() || !has_loose_path(&rule.matches, entry) {
                return None;
            }
            rule.backend_refs
                .iter()
                .position(|b| entry.backend.is_referenced_by(b))
                .map(|j| (i, j))
        })?;

        if self.0[rule_idx].is_plain() {
            self.0.remove(rule_idx);
            tracing::debug!(path = %entry.path, backend = %entry.backend, "removed plain rule");
            Some(Removal::Rule)
        } else {
            self.0[rule_idx].backend_refs.remove(ref_idx);
            tracing::debug!(path = %entry.path, backend = %entry.backend, "removed backend reference");
            Some(Removal::BackendRef)
        }
    }

    /// Append a fully formed rule.
    pub fn append(&mut self, rule: RouteRule) {
        self.0.push(rule);
    }

    /// Append every rule of `rules`, keeping their order.
    pub fn extend(&mut self, rules: impl IntoIterator<Item = RouteRule>) {
        self.0.extend(rules);
    }

    /// Whether any rule satisfies `pred`.
    pub fn any(&self, pred: impl FnMut(&RouteRule) -> bool) -> bool {
        self.0.iter().any(pred)
    }

    /// First rule satisfying `pred`, mutable.
    pub fn find_mut(&mut self, pred: impl FnMut(&&mut RouteRule) -> bool) -> Option<&mut RouteRule> {
        self.0.iter_mut().find(pred)
    }
}

impl RouteRule {
    /// Whether one of this rule's matches serves `entry`'s path (loose mapping).
    pub fn serves_path_of(&self, entry: &PathEntry) -> bool {
        has_loose_path(&self.matches, entry)
    }
}

fn has_strict_path(matches: &[HttpRouteMatch], entry: &PathEntry) -> bool {
    matches.iter().any(|m| {
        m.path
            .as_ref()
            .is_some_and(|p| entry.path_type.strictly_matches(&entry.path, p))
    })
}

fn has_loose_path(matches: &[HttpRouteMatch], entry: &PathEntry) -> bool {
    matches.iter().any(|m| {
        m.path
            .as_ref()
            .is_some_and(|p| entry.path_type.loosely_matches(&entry.path, p))
    })
}

fn carries_backend(rule: &RouteRule, entry: &PathEntry) -> bool {
    rule.backend_refs
        .iter()
        .any(|b| entry.backend.is_referenced_by(b))
}

impl From<Vec<RouteRule>> for RuleList {
    fn from(rules: Vec<RouteRule>) -> Self {
        Self(rules)
    }
}

impl Index<usize> for RuleList {
    type Output = RouteRule;

    fn index(&self, index: usize) -> &RouteRule {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a RuleList {
    type Item = &'a RouteRule;
    type IntoIter = std::slice::Iter<'a, RouteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
