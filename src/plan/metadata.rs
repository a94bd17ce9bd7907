//! Metadata populators: best-effort annotators of successful results.

use anyhow::Result;

use crate::authn::result::{AuthenticationResult, BYPASSED_PREFIX, FactorDisposition};

/// Annotates a successful authentication result with auxiliary attributes.
///
/// Populators never gate success: the plan logs a failed populator and keeps
/// going. A populator naming a provider id exposes it through
/// [`provider_reference`](MetadataPopulator::provider_reference) so plan
/// construction can verify the reference resolves.
pub trait MetadataPopulator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Provider id this populator writes about, if any.
    fn provider_reference(&self) -> Option<&str> {
        None
    }

    /// Annotate the result.
    ///
    /// # Errors
    /// Returns an error when the annotation cannot be computed; the plan
    /// logs it and continues.
    fn populate(&self, result: &mut AuthenticationResult) -> Result<()>;
}

/// Records which factor handled the request under the configured context
/// attribute: the provider id for a verified or degraded factor, or
/// `bypassed:<id>` when the requirement was skipped by policy.
pub struct ContextAttributePopulator {
    attribute: String,
    provider_id: String,
}

impl ContextAttributePopulator {
    #[must_use]
    pub fn new(attribute: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            provider_id: provider_id.into(),
        }
    }
}

impl MetadataPopulator for ContextAttributePopulator {
    fn name(&self) -> &str {
        "context-attribute"
    }

    fn provider_reference(&self) -> Option<&str> {
        Some(&self.provider_id)
    }

    fn populate(&self, result: &mut AuthenticationResult) -> Result<()> {
        let Some(outcome) = result.outcome() else {
            return Ok(());
        };
        if outcome.provider_id() != self.provider_id {
            return Ok(());
        }
        let value = match outcome.disposition() {
            FactorDisposition::Verified | FactorDisposition::Degraded => self.provider_id.clone(),
            FactorDisposition::Bypassed => format!("{BYPASSED_PREFIX}{}", self.provider_id),
        };
        result.add_attribute(&self.attribute, &value);
        Ok(())
    }
}
