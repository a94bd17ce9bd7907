//! Hardware security key validation against the device repository.
//!
//! The cryptographic handshake of a concrete token protocol lives outside
//! the core. This validator checks that the presented key handle belongs to
//! a device registered for the principal; everything else is the protocol
//! layer's problem.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::authn::credential::{Credential, CredentialKind};
use crate::authn::device::{DeviceError, DeviceRepository};
use crate::authn::principal::Principal;
use crate::authn::validator::{CredentialValidator, ValidationError};

/// Security key factor validator backed by the device repository.
pub struct SecurityKeyValidator {
    name: String,
    devices: Arc<dyn DeviceRepository>,
    call_timeout: Duration,
}

impl SecurityKeyValidator {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        devices: Arc<dyn DeviceRepository>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            devices,
            call_timeout,
        }
    }

    fn repository_error(&self, err: &DeviceError) -> ValidationError {
        warn!(validator = %self.name, "device repository call failed: {err}");
        ValidationError::CollaboratorUnavailable
    }
}

#[async_trait]
impl CredentialValidator for SecurityKeyValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, credential: &Credential) -> bool {
        credential.kind() == CredentialKind::SecurityKey
    }

    async fn validate(&self, credential: &Credential) -> Result<Principal, ValidationError> {
        let Credential::SecurityKey {
            username,
            key_handle,
            assertion,
        } = credential
        else {
            return Err(ValidationError::UnsupportedCredential);
        };

        // Signature verification is the protocol layer's; an absent
        // assertion can never validate there either.
        if assertion.expose_secret().is_empty() {
            debug!(validator = %self.name, user = %username, "empty assertion");
            return Err(ValidationError::InvalidCredential);
        }

        let registered = timeout(self.call_timeout, self.devices.is_registered_for(username))
            .await
            .map_err(|_| {
                warn!(validator = %self.name, "device repository timed out");
                ValidationError::CollaboratorUnavailable
            })?
            .map_err(|err| self.repository_error(&err))?;

        if !registered {
            debug!(validator = %self.name, user = %username, "no registered device");
            return Err(ValidationError::InvalidCredential);
        }

        let devices = timeout(self.call_timeout, self.devices.list_devices(username))
            .await
            .map_err(|_| {
                warn!(validator = %self.name, "device repository timed out");
                ValidationError::CollaboratorUnavailable
            })?
            .map_err(|err| self.repository_error(&err))?;

        if devices.iter().any(|device| device.key_handle == *key_handle) {
            Ok(Principal::new(username.clone()))
        } else {
            debug!(validator = %self.name, user = %username, "key handle does not match any device");
            Err(ValidationError::InvalidCredential)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SecurityKeyValidator;
    use crate::authn::credential::Credential;
    use crate::authn::device::{Device, DeviceError, DeviceRepository};
    use crate::authn::validator::{CredentialValidator, ValidationError};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct InMemoryDevices {
        devices: Mutex<HashMap<String, Vec<Device>>>,
        available: std::sync::atomic::AtomicBool,
    }

    impl InMemoryDevices {
        fn online() -> Self {
            let repo = Self::default();
            repo.available
                .store(true, std::sync::atomic::Ordering::SeqCst);
            repo
        }

        fn check(&self) -> Result<(), DeviceError> {
            if self.available.load(std::sync::atomic::Ordering::SeqCst) {
                Ok(())
            } else {
                Err(DeviceError::Unavailable("repository offline".to_string()))
            }
        }
    }

    #[async_trait]
    impl DeviceRepository for InMemoryDevices {
        async fn is_registered_for(&self, principal_id: &str) -> Result<bool, DeviceError> {
            self.check()?;
            Ok(self
                .devices
                .lock()
                .unwrap()
                .get(principal_id)
                .is_some_and(|devices| !devices.is_empty()))
        }

        async fn list_devices(&self, principal_id: &str) -> Result<Vec<Device>, DeviceError> {
            self.check()?;
            Ok(self
                .devices
                .lock()
                .unwrap()
                .get(principal_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn register_device(
            &self,
            principal_id: &str,
            device: Device,
        ) -> Result<(), DeviceError> {
            self.check()?;
            let mut devices = self.devices.lock().unwrap();
            let entry = devices.entry(principal_id.to_string()).or_default();
            if entry.iter().any(|known| known.key_handle == device.key_handle) {
                return Err(DeviceError::Duplicate(device.key_handle));
            }
            entry.push(device);
            Ok(())
        }
    }

    fn assertion(key_handle: &str) -> Credential {
        Credential::SecurityKey {
            username: "ana".to_string(),
            key_handle: key_handle.to_string(),
            assertion: SecretString::from("signed-assertion"),
        }
    }

    #[tokio::test]
    async fn registered_key_handle_is_valid() {
        let repo = Arc::new(InMemoryDevices::online());
        repo.register_device("ana", Device::new("yubikey", "kh-1"))
            .await
            .unwrap();
        let validator = SecurityKeyValidator::new("u2f", repo, Duration::from_secs(1));

        let principal = validator.validate(&assertion("kh-1")).await.unwrap();
        assert_eq!(principal.id(), "ana");
    }

    #[tokio::test]
    async fn unknown_key_handle_is_invalid() {
        let repo = Arc::new(InMemoryDevices::online());
        repo.register_device("ana", Device::new("yubikey", "kh-1"))
            .await
            .unwrap();
        let validator = SecurityKeyValidator::new("u2f", repo, Duration::from_secs(1));

        let err = validator.validate(&assertion("kh-2")).await.unwrap_err();
        assert_eq!(err, ValidationError::InvalidCredential);
    }

    #[tokio::test]
    async fn empty_assertion_is_invalid() {
        let repo = Arc::new(InMemoryDevices::online());
        repo.register_device("ana", Device::new("yubikey", "kh-1"))
            .await
            .unwrap();
        let validator = SecurityKeyValidator::new("u2f", repo, Duration::from_secs(1));

        let credential = Credential::SecurityKey {
            username: "ana".to_string(),
            key_handle: "kh-1".to_string(),
            assertion: SecretString::from(""),
        };
        let err = validator.validate(&credential).await.unwrap_err();
        assert_eq!(err, ValidationError::InvalidCredential);
    }

    #[tokio::test]
    async fn unregistered_principal_is_invalid() {
        let repo = Arc::new(InMemoryDevices::online());
        let validator = SecurityKeyValidator::new("u2f", repo, Duration::from_secs(1));

        let err = validator.validate(&assertion("kh-1")).await.unwrap_err();
        assert_eq!(err, ValidationError::InvalidCredential);
    }

    #[tokio::test]
    async fn offline_repository_maps_to_collaborator_unavailable() {
        let repo = Arc::new(InMemoryDevices::default());
        let validator = SecurityKeyValidator::new("u2f", repo, Duration::from_secs(1));

        let err = validator.validate(&assertion("kh-1")).await.unwrap_err();
        assert_eq!(err, ValidationError::CollaboratorUnavailable);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let repo = InMemoryDevices::online();
        repo.register_device("ana", Device::new("yubikey", "kh-1"))
            .await
            .unwrap();
        let err = repo
            .register_device("ana", Device::new("backup", "kh-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Duplicate(_)));
    }
}
