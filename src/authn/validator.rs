//! Credential validation contract.
//!
//! Flow Overview:
//! - A validator declares the credential class it handles via `supports` and
//!   produces a principal or a typed failure via `validate`.
//! - Validators are pure functions of the credential plus the collaborators
//!   they are explicitly given; no hidden global state.
//! - Failures are never swallowed here; only the plan's failure-mode policy
//!   may convert them downstream.

use async_trait::async_trait;
use thiserror::Error;

use super::credential::Credential;
use super::principal::Principal;

/// Typed failure of one credential validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("unsupported credential")]
    UnsupportedCredential,
    #[error("invalid credential")]
    InvalidCredential,
    #[error("locked principal")]
    LockedPrincipal,
    #[error("collaborator unavailable")]
    CollaboratorUnavailable,
}

/// Transport-level failure of an external collaborator. Validators map this
/// to [`ValidationError::CollaboratorUnavailable`], never to a raw I/O error.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Terminal denial carrying the stable failure kind and the provider that
/// produced it, so the caller can render factor-specific guidance.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("authentication failed: {kind}")]
pub struct AuthenticationFailure {
    kind: ValidationError,
    provider: Option<String>,
}

impl AuthenticationFailure {
    pub(crate) fn new(kind: ValidationError, provider: Option<String>) -> Self {
        Self { kind, provider }
    }

    #[must_use]
    pub fn kind(&self) -> ValidationError {
        self.kind
    }

    /// Id of the provider whose validation produced the denial, when the
    /// credential mapped to a multifactor provider.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

/// Validates one credential class, producing a principal or a typed failure.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Short name used in logs and plan summaries.
    fn name(&self) -> &str;

    /// Whether this validator can handle the credential's class.
    fn supports(&self, credential: &Credential) -> bool;

    /// Validate the credential.
    ///
    /// # Errors
    /// Returns the typed failure kind; collaborator timeouts and transport
    /// errors surface as [`ValidationError::CollaboratorUnavailable`].
    async fn validate(&self, credential: &Credential) -> Result<Principal, ValidationError>;
}
