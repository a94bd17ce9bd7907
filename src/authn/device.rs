//! Device registration collaborator boundary.
//!
//! The execution plan core never persists device state. A hardware-token
//! validator is handed a repository implementation and calls it at
//! validation time; repository failures surface as
//! [`DeviceError::Unavailable`] and are mapped to
//! `CollaboratorUnavailable` by the calling validator.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A registered hardware token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Device {
    pub id: Uuid,
    pub label: String,
    pub key_handle: String,
}

impl Device {
    #[must_use]
    pub fn new(label: impl Into<String>, key_handle: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            key_handle: key_handle.into(),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum DeviceError {
    #[error("device already registered: {0}")]
    Duplicate(String),
    #[error("device repository unavailable: {0}")]
    Unavailable(String),
}

/// External registry of hardware tokens per principal.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Whether the principal has at least one registered device.
    async fn is_registered_for(&self, principal_id: &str) -> Result<bool, DeviceError>;

    /// All devices registered for the principal.
    async fn list_devices(&self, principal_id: &str) -> Result<Vec<Device>, DeviceError>;

    /// Register a new device.
    ///
    /// # Errors
    /// Returns [`DeviceError::Duplicate`] when the key handle is already
    /// registered for the principal.
    async fn register_device(&self, principal_id: &str, device: Device)
        -> Result<(), DeviceError>;
}
