//! Authentication execution plan: the immutable composition consulted at
//! request time.
//!
//! Flow Overview:
//! 1) Handler selection: providers whose validator supports the credential
//!    become ranked candidates; without any, the standalone validators are
//!    consulted in plan order.
//! 2) Bypass check: the selected provider's evaluator may skip verification;
//!    a bypassed factor is recorded distinctly from a verified one.
//! 3) Validation: the surviving validator runs; failures are modulated by
//!    the provider's failure mode, which governs unavailability only.
//! 4) Metadata population: best-effort annotators run in plan order.
//!
//! Security boundaries:
//! - A bypass evaluator that cannot complete never bypasses (fail closed).
//! - An invalid credential or locked principal denies under every failure
//!   mode; only collaborator unavailability is negotiable.
//!
//! The plan writes nothing shared; each evaluation owns its result, so any
//! number of requests evaluate concurrently against the same plan.

pub mod builder;
pub mod handle;
pub mod metadata;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::authn::credential::Credential;
use crate::authn::result::{
    AuthenticationResult, DEGRADED_ATTRIBUTE, FactorDisposition, FactorOutcome,
};
use crate::authn::validator::{AuthenticationFailure, CredentialValidator, ValidationError};
use crate::mfa::bypass::BypassContext;
use crate::mfa::provider::{FailureMode, MultifactorProvider};
use crate::mfa::registry::ProviderRegistry;

use self::metadata::MetadataPopulator;

/// The ordered composition of validators, populators, and providers.
/// Immutable after construction; replaced wholesale on reload.
pub struct ExecutionPlan {
    context_attribute: String,
    validators: Vec<Arc<dyn CredentialValidator>>,
    populators: Vec<Arc<dyn MetadataPopulator>>,
    registry: ProviderRegistry,
}

impl std::fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("context_attribute", &self.context_attribute)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .field(
                "populators",
                &self.populators.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ExecutionPlan {
    pub(crate) fn new(
        context_attribute: String,
        validators: Vec<Arc<dyn CredentialValidator>>,
        populators: Vec<Arc<dyn MetadataPopulator>>,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            context_attribute,
            validators,
            populators,
            registry,
        }
    }

    /// Result attribute under which the satisfying factor is recorded.
    #[must_use]
    pub fn context_attribute(&self) -> &str {
        &self.context_attribute
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Evaluate one credential against the plan.
    ///
    /// `result` carries whatever a prior primary-factor success already
    /// recorded; the evaluation extends it and returns it on success.
    ///
    /// # Errors
    /// Returns [`AuthenticationFailure`] with the stable failure kind and,
    /// when the credential mapped to a provider, that provider's id.
    pub async fn evaluate(
        &self,
        credential: &Credential,
        mut result: AuthenticationResult,
    ) -> Result<AuthenticationResult, AuthenticationFailure> {
        let satisfied = result.satisfied_methods(&self.context_attribute);
        let mut candidates: BTreeSet<String> = self
            .registry
            .iter()
            .filter(|provider| provider.validator().supports(credential))
            .map(|provider| provider.id().to_string())
            .collect();

        debug!(
            kind = credential.kind().as_str(),
            user = credential.username(),
            candidates = candidates.len(),
            "selecting handler"
        );

        // Handler selection re-runs after a phantom failure drops a candidate.
        while !candidates.is_empty() {
            let Some(provider) = self.registry.resolve(&candidates, &satisfied) else {
                // Every remaining candidate is already satisfied.
                debug!("step-up already satisfied, skipping verification");
                self.populate(&mut result);
                return Ok(result);
            };
            let provider_id = provider.id().to_string();

            if self.bypassed(provider, credential, &result, &satisfied) {
                result.set_outcome(FactorOutcome::new(&provider_id, FactorDisposition::Bypassed));
                self.populate(&mut result);
                return Ok(result);
            }

            match provider.validator().validate(credential).await {
                Ok(principal) => {
                    result.set_principal_if_empty(principal);
                    result.set_outcome(FactorOutcome::new(
                        &provider_id,
                        FactorDisposition::Verified,
                    ));
                    self.populate(&mut result);
                    return Ok(result);
                }
                Err(ValidationError::CollaboratorUnavailable) => match provider.failure_mode() {
                    FailureMode::Closed => {
                        return Err(AuthenticationFailure::new(
                            ValidationError::CollaboratorUnavailable,
                            Some(provider_id),
                        ));
                    }
                    FailureMode::Open => {
                        warn!(
                            provider = %provider_id,
                            "provider unavailable, admitting request as degraded"
                        );
                        result.add_attribute(DEGRADED_ATTRIBUTE, "true");
                        result.set_outcome(FactorOutcome::new(
                            &provider_id,
                            FactorDisposition::Degraded,
                        ));
                        self.populate(&mut result);
                        return Ok(result);
                    }
                    FailureMode::Phantom => {
                        warn!(
                            provider = %provider_id,
                            "provider unavailable, withdrawing it from selection"
                        );
                        candidates.remove(&provider_id);
                    }
                },
                Err(kind) => {
                    return Err(AuthenticationFailure::new(kind, Some(provider_id)));
                }
            }
        }

        // No (remaining) provider claims the credential: plain validators.
        let Some(validator) = self
            .validators
            .iter()
            .find(|validator| validator.supports(credential))
        else {
            return Err(AuthenticationFailure::new(
                ValidationError::UnsupportedCredential,
                None,
            ));
        };

        debug!(validator = validator.name(), "validating primary credential");
        match validator.validate(credential).await {
            Ok(principal) => {
                result.set_principal_if_empty(principal);
                self.populate(&mut result);
                Ok(result)
            }
            Err(kind) => Err(AuthenticationFailure::new(kind, None)),
        }
    }

    fn bypassed(
        &self,
        provider: &MultifactorProvider,
        credential: &Credential,
        result: &AuthenticationResult,
        satisfied: &BTreeSet<String>,
    ) -> bool {
        let ctx = BypassContext {
            principal: result.principal(),
            satisfied_methods: satisfied,
            credential_kind: credential.kind(),
        };
        match provider.bypass().should_bypass(&ctx, provider.id()) {
            Ok(decision) => decision,
            Err(err) => {
                // Fail closed: an evaluator that cannot complete never bypasses.
                warn!(
                    provider = provider.id(),
                    "bypass evaluation failed, not bypassing: {err}"
                );
                false
            }
        }
    }

    fn populate(&self, result: &mut AuthenticationResult) {
        for populator in &self.populators {
            if let Err(err) = populator.populate(result) {
                warn!(
                    populator = populator.name(),
                    "metadata populator failed: {err}"
                );
            }
        }
    }
}
