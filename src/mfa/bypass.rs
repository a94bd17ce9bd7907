//! Bypass policy evaluation.
//!
//! Flow Overview:
//! - A provider's policy is an ordered rule list; the first matching rule
//!   bypasses the provider and later rules are not consulted.
//! - Rules are total over their inputs: a missing or malformed attribute is
//!   "rule does not match", never an error.
//! - An evaluator that cannot complete surfaces [`BypassError`]; the
//!   execution plan converts that to "do not bypass" and a warning.

use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::authn::credential::CredentialKind;
use crate::authn::principal::Principal;

/// Inputs a bypass rule may read.
#[derive(Clone, Copy, Debug)]
pub struct BypassContext<'a> {
    /// Principal from a prior primary-factor success, when present.
    pub principal: Option<&'a Principal>,
    /// Provider ids already recorded as satisfied for this request.
    pub satisfied_methods: &'a BTreeSet<String>,
    /// Class of the credential being presented.
    pub credential_kind: CredentialKind,
}

/// Internal failure of a bypass evaluator, e.g. an attribute source that
/// could not be reached. Never turns into a bypass.
#[derive(Clone, Debug, Error)]
#[error("bypass evaluation failed: {0}")]
pub struct BypassError(pub String);

/// Decides whether a provider's requirement may be skipped.
pub trait BypassEvaluator: Send + Sync {
    /// Evaluate the provider's policy against the request context.
    ///
    /// # Errors
    /// Returns [`BypassError`] when evaluation itself cannot complete; the
    /// caller must treat that as "do not bypass".
    fn should_bypass(
        &self,
        ctx: &BypassContext<'_>,
        provider_id: &str,
    ) -> Result<bool, BypassError>;
}

/// One compiled bypass rule.
#[derive(Clone, Debug)]
pub enum BypassRule {
    /// Principal attribute `name` has a value matching `pattern`.
    PrincipalAttribute { name: String, pattern: Regex },
    /// Principal is a member of `group` (exact match on `memberOf`).
    Group { group: String },
    /// The named method already satisfied this request.
    AlreadySatisfiedMethod { method: String },
    /// The presented credential is of class `kind`.
    CredentialClass { kind: CredentialKind },
}

impl BypassRule {
    /// Whether the rule matches. Total: anything missing is a non-match.
    #[must_use]
    pub fn matches(&self, ctx: &BypassContext<'_>) -> bool {
        match self {
            Self::PrincipalAttribute { name, pattern } => ctx
                .principal
                .and_then(|principal| principal.attribute(name))
                .is_some_and(|values| values.iter().any(|value| pattern.is_match(value))),
            Self::Group { group } => ctx
                .principal
                .is_some_and(|principal| principal.in_group(group)),
            Self::AlreadySatisfiedMethod { method } => ctx.satisfied_methods.contains(method),
            Self::CredentialClass { kind } => ctx.credential_kind == *kind,
        }
    }
}

/// Ordered rule set; any match bypasses. Rule order is part of the contract:
/// the first match wins and is the one reported in logs.
#[derive(Clone, Debug, Default)]
pub struct BypassPolicy {
    rules: Vec<BypassRule>,
}

impl BypassPolicy {
    #[must_use]
    pub fn new(rules: Vec<BypassRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the first matching rule, if any.
    #[must_use]
    pub fn first_match(&self, ctx: &BypassContext<'_>) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(ctx))
    }
}

/// Stock evaluator over a compiled [`BypassPolicy`].
#[derive(Clone, Debug, Default)]
pub struct PolicyBypassEvaluator {
    policy: BypassPolicy,
}

impl PolicyBypassEvaluator {
    #[must_use]
    pub fn new(policy: BypassPolicy) -> Self {
        Self { policy }
    }
}

impl BypassEvaluator for PolicyBypassEvaluator {
    fn should_bypass(
        &self,
        ctx: &BypassContext<'_>,
        provider_id: &str,
    ) -> Result<bool, BypassError> {
        match self.policy.first_match(ctx) {
            Some(rule) => {
                debug!(provider = provider_id, rule, "bypass rule matched");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
