//! Plan configuration snapshot.
//!
//! An immutable snapshot supplied at build time. Reload means: parse a new
//! snapshot, build a new plan, publish atomically. Nothing here is consulted
//! at request time.

use serde::{Deserialize, Serialize};

use crate::authn::credential::CredentialKind;
use crate::authn::result::DEFAULT_CONTEXT_ATTRIBUTE;
use crate::mfa::provider::FailureMode;

/// Top-level plan configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Result attribute under which the satisfying factor is recorded.
    #[serde(default = "default_context_attribute")]
    pub context_attribute: String,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            context_attribute: default_context_attribute(),
            providers: Vec::new(),
        }
    }
}

fn default_context_attribute() -> String {
    DEFAULT_CONTEXT_ATTRIBUTE.to_string()
}

/// One provider entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub rank: u32,
    #[serde(default)]
    pub failure_mode: FailureMode,
    /// Feature flag, evaluated once at plan build.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ordered rules; order is significant, the first match bypasses.
    #[serde(default)]
    pub bypass_rules: Vec<BypassRuleConfig>,
}

const fn default_enabled() -> bool {
    true
}

/// One bypass rule, in configuration form.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassRuleConfig {
    /// Principal attribute `name` has a value matching `value_pattern`.
    PrincipalAttribute { name: String, value_pattern: String },
    /// Principal is a member of the group.
    Group { name: String },
    /// The named method already satisfied the request.
    AlreadySatisfiedMethod { method: String },
    /// The presented credential is of this class.
    CredentialClass { kind: CredentialKind },
}
