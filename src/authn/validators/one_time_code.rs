//! One-time code validation against an external verifier.
//!
//! Code issuance, storage, and replay bookkeeping live in the collaborator;
//! the validator only classifies its answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::time::timeout;
use tracing::warn;

use crate::authn::credential::{Credential, CredentialKind};
use crate::authn::principal::Principal;
use crate::authn::validator::{
    CollaboratorError, CredentialValidator, ValidationError,
};

/// Outcome of a one-time code check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodeCheck {
    /// The code matched and was consumed.
    Accepted,
    /// Unknown, expired, or already-used code.
    Rejected,
}

/// External verifier that consumes one-time codes.
#[async_trait]
pub trait CodeVerifier: Send + Sync {
    /// Consume `code` for `username`.
    ///
    /// # Errors
    /// Returns [`CollaboratorError`] on transport failure.
    async fn consume(
        &self,
        username: &str,
        code: &SecretString,
    ) -> Result<CodeCheck, CollaboratorError>;
}

/// One-time code factor validator.
pub struct OneTimeCodeValidator {
    name: String,
    codes: Arc<dyn CodeVerifier>,
    call_timeout: Duration,
}

impl OneTimeCodeValidator {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        codes: Arc<dyn CodeVerifier>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            codes,
            call_timeout,
        }
    }
}

#[async_trait]
impl CredentialValidator for OneTimeCodeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, credential: &Credential) -> bool {
        credential.kind() == CredentialKind::OneTimeCode
    }

    async fn validate(&self, credential: &Credential) -> Result<Principal, ValidationError> {
        let Credential::OneTimeCode { username, code } = credential else {
            return Err(ValidationError::UnsupportedCredential);
        };

        let checked = timeout(self.call_timeout, self.codes.consume(username, code))
            .await
            .map_err(|_| {
                warn!(validator = %self.name, "code verifier timed out");
                ValidationError::CollaboratorUnavailable
            })?
            .map_err(|err| {
                warn!(validator = %self.name, "code verifier unavailable: {err}");
                ValidationError::CollaboratorUnavailable
            })?;

        match checked {
            CodeCheck::Accepted => Ok(Principal::new(username.clone())),
            CodeCheck::Rejected => Err(ValidationError::InvalidCredential),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CodeCheck, CodeVerifier, OneTimeCodeValidator};
    use crate::authn::credential::Credential;
    use crate::authn::validator::{CollaboratorError, CredentialValidator, ValidationError};
    use async_trait::async_trait;
    use secrecy::{ExposeSecret, SecretString};
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticCodes {
        expected: &'static str,
        available: bool,
    }

    #[async_trait]
    impl CodeVerifier for StaticCodes {
        async fn consume(
            &self,
            _username: &str,
            code: &SecretString,
        ) -> Result<CodeCheck, CollaboratorError> {
            if !self.available {
                return Err(CollaboratorError("verifier offline".to_string()));
            }
            if code.expose_secret() == self.expected {
                Ok(CodeCheck::Accepted)
            } else {
                Ok(CodeCheck::Rejected)
            }
        }
    }

    fn one_time_code(code: &str) -> Credential {
        Credential::OneTimeCode {
            username: "ana".to_string(),
            code: SecretString::from(code),
        }
    }

    #[tokio::test]
    async fn accepted_code_yields_principal() {
        let validator = OneTimeCodeValidator::new(
            "otp",
            Arc::new(StaticCodes {
                expected: "123456",
                available: true,
            }),
            Duration::from_secs(1),
        );
        let principal = validator.validate(&one_time_code("123456")).await.unwrap();
        assert_eq!(principal.id(), "ana");
    }

    #[tokio::test]
    async fn rejected_code_is_invalid_credential() {
        let validator = OneTimeCodeValidator::new(
            "otp",
            Arc::new(StaticCodes {
                expected: "123456",
                available: true,
            }),
            Duration::from_secs(1),
        );
        let err = validator
            .validate(&one_time_code("000000"))
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidCredential);
    }

    #[tokio::test]
    async fn offline_verifier_maps_to_collaborator_unavailable() {
        let validator = OneTimeCodeValidator::new(
            "otp",
            Arc::new(StaticCodes {
                expected: "123456",
                available: false,
            }),
            Duration::from_secs(1),
        );
        let err = validator
            .validate(&one_time_code("123456"))
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::CollaboratorUnavailable);
    }
}
