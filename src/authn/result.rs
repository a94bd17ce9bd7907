//! Authentication result assembly.
//!
//! One request evaluation owns one result. The result starts from whatever a
//! prior primary-factor success already recorded, gains a principal and a
//! factor outcome during evaluation, and is annotated by metadata populators
//! before it becomes terminal.

use std::collections::{BTreeMap, BTreeSet};

use super::principal::Principal;

/// Default result attribute recording the satisfying factor.
pub const DEFAULT_CONTEXT_ATTRIBUTE: &str = "authn-method";
/// Value prefix marking a factor that was bypassed rather than verified.
pub const BYPASSED_PREFIX: &str = "bypassed:";
/// Attribute flagging a permissive outcome from an unavailable provider.
pub const DEGRADED_ATTRIBUTE: &str = "degraded";

/// How the selected provider was satisfied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FactorDisposition {
    /// The provider's validator verified the credential.
    Verified,
    /// A bypass rule matched; verification was deliberately skipped.
    Bypassed,
    /// The provider was unavailable and its failure mode admitted the request.
    Degraded,
}

/// The provider outcome of the current evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FactorOutcome {
    provider_id: String,
    disposition: FactorDisposition,
}

impl FactorOutcome {
    pub(crate) fn new(provider_id: impl Into<String>, disposition: FactorDisposition) -> Self {
        Self {
            provider_id: provider_id.into(),
            disposition,
        }
    }

    #[must_use]
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    #[must_use]
    pub fn disposition(&self) -> FactorDisposition {
        self.disposition
    }
}

/// The principal plus attributes accumulated during one request evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthenticationResult {
    principal: Option<Principal>,
    attributes: BTreeMap<String, Vec<String>>,
    outcome: Option<FactorOutcome>,
}

impl AuthenticationResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Keep a principal from the primary factor; a step-up factor only fills
    /// the slot when it is empty.
    pub(crate) fn set_principal_if_empty(&mut self, principal: Principal) {
        if self.principal.is_none() {
            self.principal = Some(principal);
        }
    }

    /// Append `value` under `name`, skipping exact duplicates.
    pub fn add_attribute(&mut self, name: &str, value: &str) {
        let values = self.attributes.entry(name.to_string()).or_default();
        if !values.iter().any(|existing| existing == value) {
            values.push(value.to_string());
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.attributes
    }

    /// Values for `name`, if the attribute is present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&FactorOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn set_outcome(&mut self, outcome: FactorOutcome) {
        self.outcome = Some(outcome);
    }

    /// Provider ids already recorded under `context_attribute`.
    ///
    /// Bypassed entries count: a requirement skipped by policy is not
    /// consulted again, even though its attribute value stays distinct.
    #[must_use]
    pub fn satisfied_methods(&self, context_attribute: &str) -> BTreeSet<String> {
        self.attributes
            .get(context_attribute)
            .into_iter()
            .flatten()
            .map(|value| value.strip_prefix(BYPASSED_PREFIX).unwrap_or(value).to_string())
            .collect()
    }
}
