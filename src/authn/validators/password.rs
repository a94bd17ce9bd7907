//! Password validation against an external account store.

use std::collections::BTreeMap;
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

/// Outcome of an account-store password check.
#[derive(Clone, Debug)]
pub enum AccountStatus {
    /// Password verified; the store resolved the principal's attributes.
    Valid {
        attributes: BTreeMap<String, Vec<String>>,
    },
    /// Unknown username or wrong password.
    Invalid,
    /// The account exists but is administratively locked.
    Locked,
}

/// External source of account records and password verification.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Check `password` for `username`.
    ///
    /// # Errors
    /// Returns [`CollaboratorError`] on transport failure.
    async fn verify(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AccountStatus, CollaboratorError>;
}

/// Primary-factor validator backed by an external account store.
pub struct PasswordValidator {
    name: String,
    accounts: Arc<dyn AccountStore>,
    call_timeout: Duration,
}

impl PasswordValidator {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        accounts: Arc<dyn AccountStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            accounts,
            call_timeout,
        }
    }
}

#[async_trait]
impl CredentialValidator for PasswordValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, credential: &Credential) -> bool {
        credential.kind() == CredentialKind::Password
    }

    async fn validate(&self, credential: &Credential) -> Result<Principal, ValidationError> {
        let Credential::Password { username, password } = credential else {
            return Err(ValidationError::UnsupportedCredential);
        };

        let checked = timeout(self.call_timeout, self.accounts.verify(username, password))
            .await
            .map_err(|_| {
                warn!(validator = %self.name, "account store timed out");
                ValidationError::CollaboratorUnavailable
            })?
            .map_err(|err| {
                warn!(validator = %self.name, "account store unavailable: {err}");
                ValidationError::CollaboratorUnavailable
            })?;

        match checked {
            AccountStatus::Valid { attributes } => {
                Ok(Principal::with_attributes(username.clone(), attributes))
            }
            AccountStatus::Invalid => Err(ValidationError::InvalidCredential),
            AccountStatus::Locked => Err(ValidationError::LockedPrincipal),
        }
    }
}
