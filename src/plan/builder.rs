//! Plan construction from a configuration snapshot.
//!
//! The builder replaces implicit container wiring: it takes an immutable
//! configuration snapshot plus explicitly registered components and returns
//! a fully formed plan. Provider `enabled` flags are evaluated here, once,
//! never at request time. Build-time errors reject the whole plan; the
//! caller keeps whatever plan was previously published.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::authn::validator::CredentialValidator;
use crate::config::{BypassRuleConfig, PlanConfig, ProviderConfig};
use crate::mfa::bypass::{BypassPolicy, BypassRule, PolicyBypassEvaluator};
use crate::mfa::provider::MultifactorProvider;
use crate::mfa::registry::{ProviderRegistry, RegistryError};

use super::ExecutionPlan;
use super::metadata::{ContextAttributePopulator, MetadataPopulator};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("unresolved provider reference: {0}")]
    UnresolvedProviderReference(String),
    #[error("no factor registered for provider id: {0}")]
    UnknownFactor(String),
    #[error("invalid bypass pattern for provider {provider}")]
    InvalidBypassPattern {
        provider: String,
        #[source]
        source: regex::Error,
    },
}

/// Assembles an [`ExecutionPlan`] from a configuration snapshot and
/// explicitly registered components.
pub struct PlanBuilder {
    config: PlanConfig,
    factors: BTreeMap<String, Arc<dyn CredentialValidator>>,
    validators: Vec<Arc<dyn CredentialValidator>>,
    populators: Vec<Arc<dyn MetadataPopulator>>,
}

impl PlanBuilder {
    #[must_use]
    pub fn new(config: PlanConfig) -> Self {
        Self {
            config,
            factors: BTreeMap::new(),
            validators: Vec::new(),
            populators: Vec::new(),
        }
    }

    /// Register the validator backing a configured provider id.
    #[must_use]
    pub fn with_factor(
        mut self,
        provider_id: impl Into<String>,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        self.factors.insert(provider_id.into(), validator);
        self
    }

    /// Register a standalone (non-multifactor) validator; registration order
    /// is plan order.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Register an additional metadata populator; registration order is plan
    /// order, after the per-provider context-attribute populators.
    #[must_use]
    pub fn with_populator(mut self, populator: Arc<dyn MetadataPopulator>) -> Self {
        self.populators.push(populator);
        self
    }

    /// Build the immutable plan.
    ///
    /// # Errors
    /// Returns [`BuildError`] on duplicate provider ids, unresolved provider
    /// references, missing factors, or bypass patterns that do not compile.
    pub fn build(self) -> Result<ExecutionPlan, BuildError> {
        let Self {
            config,
            factors,
            validators,
            populators: extra_populators,
        } = self;

        let mut registry = ProviderRegistry::new();
        let mut populators: Vec<Arc<dyn MetadataPopulator>> = Vec::new();

        for provider_config in &config.providers {
            if !provider_config.enabled {
                debug!(provider = %provider_config.id, "provider disabled, skipping");
                continue;
            }
            let validator = factors
                .get(&provider_config.id)
                .ok_or_else(|| BuildError::UnknownFactor(provider_config.id.clone()))?
                .clone();
            let policy = compile_policy(provider_config)?;
            let provider = MultifactorProvider::new(
                &provider_config.id,
                provider_config.rank,
                provider_config.failure_mode,
                Arc::new(PolicyBypassEvaluator::new(policy)),
                validator,
            );
            registry.register(Arc::new(provider))?;
            populators.push(Arc::new(ContextAttributePopulator::new(
                &config.context_attribute,
                &provider_config.id,
            )));
        }
        populators.extend(extra_populators);

        // Build-time invariant: every referenced provider id must resolve.
        for provider_config in config.providers.iter().filter(|p| p.enabled) {
            for rule in &provider_config.bypass_rules {
                if let BypassRuleConfig::AlreadySatisfiedMethod { method } = rule {
                    if !registry.contains(method) {
                        return Err(BuildError::UnresolvedProviderReference(method.clone()));
                    }
                }
            }
        }
        for populator in &populators {
            if let Some(reference) = populator.provider_reference() {
                if !registry.contains(reference) {
                    return Err(BuildError::UnresolvedProviderReference(
                        reference.to_string(),
                    ));
                }
            }
        }

        info!(
            providers = registry.len(),
            validators = validators.len(),
            populators = populators.len(),
            "execution plan built"
        );
        Ok(ExecutionPlan::new(
            config.context_attribute,
            validators,
            populators,
            registry,
        ))
    }
}

fn compile_policy(config: &ProviderConfig) -> Result<BypassPolicy, BuildError> {
    let mut rules = Vec::with_capacity(config.bypass_rules.len());
    for rule in &config.bypass_rules {
        rules.push(match rule {
            BypassRuleConfig::PrincipalAttribute {
                name,
                value_pattern,
            } => BypassRule::PrincipalAttribute {
                name: name.clone(),
                pattern: Regex::new(value_pattern).map_err(|source| {
                    BuildError::InvalidBypassPattern {
                        provider: config.id.clone(),
                        source,
                    }
                })?,
            },
            BypassRuleConfig::Group { name } => BypassRule::Group {
                group: name.clone(),
            },
            BypassRuleConfig::AlreadySatisfiedMethod { method } => {
                BypassRule::AlreadySatisfiedMethod {
                    method: method.clone(),
                }
            }
            BypassRuleConfig::CredentialClass { kind } => {
                BypassRule::CredentialClass { kind: *kind }
            }
        });
    }
    Ok(BypassPolicy::new(rules))
}

#[cfg(test)]
mod tests {
    use super::{BuildError, PlanBuilder};
    use crate::authn::credential::Credential;
    use crate::authn::principal::Principal;
    use crate::authn::validator::{CredentialValidator, ValidationError};
    use crate::config::{BypassRuleConfig, PlanConfig, ProviderConfig};
    use crate::mfa::registry::RegistryError;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NullValidator;

    #[async_trait]
    impl CredentialValidator for NullValidator {
        fn name(&self) -> &str {
            "null"
        }

        fn supports(&self, _credential: &Credential) -> bool {
            false
        }

        async fn validate(
            &self,
            _credential: &Credential,
        ) -> Result<Principal, ValidationError> {
            Err(ValidationError::UnsupportedCredential)
        }
    }

    fn provider_entry(id: &str, rank: u32) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            rank,
            failure_mode: Default::default(),
            enabled: true,
            bypass_rules: Vec::new(),
        }
    }

    fn config(providers: Vec<ProviderConfig>) -> PlanConfig {
        PlanConfig {
            context_attribute: "authn-method".to_string(),
            providers,
        }
    }

    #[test]
    fn duplicate_provider_id_aborts_build() {
        let err = PlanBuilder::new(config(vec![
            provider_entry("u2f", 10),
            provider_entry("u2f", 20),
        ]))
        .with_factor("u2f", Arc::new(NullValidator))
        .build()
        .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Registry(RegistryError::DuplicateProviderId(id)) if id == "u2f"
        ));
    }

    #[test]
    fn missing_factor_aborts_build() {
        let err = PlanBuilder::new(config(vec![provider_entry("u2f", 10)]))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownFactor(id) if id == "u2f"));
    }

    #[test]
    fn unresolved_satisfied_method_reference_aborts_build() {
        let mut entry = provider_entry("u2f", 10);
        entry.bypass_rules = vec![BypassRuleConfig::AlreadySatisfiedMethod {
            method: "ghost".to_string(),
        }];
        let err = PlanBuilder::new(config(vec![entry]))
            .with_factor("u2f", Arc::new(NullValidator))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedProviderReference(id) if id == "ghost"
        ));
    }

    #[test]
    fn invalid_bypass_pattern_aborts_build() {
        let mut entry = provider_entry("u2f", 10);
        entry.bypass_rules = vec![BypassRuleConfig::PrincipalAttribute {
            name: "memberOf".to_string(),
            value_pattern: "(".to_string(),
        }];
        let err = PlanBuilder::new(config(vec![entry]))
            .with_factor("u2f", Arc::new(NullValidator))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidBypassPattern { provider, .. } if provider == "u2f"
        ));
    }

    #[test]
    fn disabled_provider_is_left_out() {
        let mut entry = provider_entry("u2f", 10);
        entry.enabled = false;
        let plan = PlanBuilder::new(config(vec![entry])).build().unwrap();
        assert!(plan.registry().is_empty());
    }

    #[test]
    fn build_composes_registry_and_populators() {
        let plan = PlanBuilder::new(config(vec![
            provider_entry("token", 5),
            provider_entry("u2f", 10),
        ]))
        .with_factor("token", Arc::new(NullValidator))
        .with_factor("u2f", Arc::new(NullValidator))
        .build()
        .unwrap();
        assert_eq!(plan.registry().len(), 2);
        assert_eq!(plan.context_attribute(), "authn-method");
    }
}
