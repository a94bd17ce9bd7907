//! Validate a plan configuration snapshot and describe the composed plan.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::authn::credential::Credential;
use crate::authn::principal::Principal;
use crate::authn::validator::{CredentialValidator, ValidationError};
use crate::config::PlanConfig;
use crate::plan::builder::PlanBuilder;

#[derive(Debug)]
pub struct Args {
    pub config_path: PathBuf,
    pub check_only: bool,
}

/// Validator stand-in used to lint a configuration without real
/// collaborators. Never selected at request time; the check action only
/// builds the plan, it does not evaluate credentials.
struct LintValidator;

#[async_trait]
impl CredentialValidator for LintValidator {
    fn name(&self) -> &str {
        "lint"
    }

    fn supports(&self, _credential: &Credential) -> bool {
        false
    }

    async fn validate(&self, _credential: &Credential) -> Result<Principal, ValidationError> {
        Err(ValidationError::UnsupportedCredential)
    }
}

/// Execute the check action.
///
/// # Errors
/// Returns an error if the snapshot cannot be read, parsed, or composed
/// into a plan.
pub async fn execute(args: Args) -> Result<()> {
    let plan = compose(&args.config_path)?;

    info!(
        providers = plan.registry().len(),
        context_attribute = plan.context_attribute(),
        "plan configuration is valid"
    );

    if args.check_only {
        return Ok(());
    }

    // Consultation order: rank first, ties by id.
    let mut providers: Vec<_> = plan.registry().iter().collect();
    providers.sort_by_key(|provider| (provider.rank(), provider.id().to_string()));
    for provider in providers {
        info!(
            id = provider.id(),
            rank = provider.rank(),
            failure_mode = provider.failure_mode().as_str(),
            "provider"
        );
    }

    Ok(())
}

fn compose(config_path: &std::path::Path) -> Result<crate::plan::ExecutionPlan> {
    let raw = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config: PlanConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid plan configuration in {}", config_path.display()))?;

    let lint: Arc<dyn CredentialValidator> = Arc::new(LintValidator);
    let mut builder = PlanBuilder::new(config.clone());
    for provider in config.providers.iter().filter(|provider| provider.enabled) {
        builder = builder.with_factor(&provider.id, lint.clone());
    }
    builder.build().context("plan construction failed")
}
