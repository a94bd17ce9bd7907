//! Credential types presented by login requests.
//!
//! Each variant carries the material for one factor and is tagged with a
//! [`CredentialKind`] so validators can declare support without runtime type
//! inspection. Secret material is held as [`SecretString`] and stays redacted
//! in debug output.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Concrete credential classes the gateway understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Password,
    OneTimeCode,
    SecurityKey,
}

impl CredentialKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::OneTimeCode => "one_time_code",
            Self::SecurityKey => "security_key",
        }
    }
}

/// A typed credential to be validated.
#[derive(Clone, Debug)]
pub enum Credential {
    Password {
        username: String,
        password: SecretString,
    },
    OneTimeCode {
        username: String,
        code: SecretString,
    },
    /// A hardware-token response. The assertion is carried opaquely for the
    /// protocol layer that verifies its signature outside the core; the key
    /// handle identifies the registered device it must come from.
    SecurityKey {
        username: String,
        key_handle: String,
        assertion: SecretString,
    },
}

impl Credential {
    /// The credential's class tag.
    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Password { .. } => CredentialKind::Password,
            Self::OneTimeCode { .. } => CredentialKind::OneTimeCode,
            Self::SecurityKey { .. } => CredentialKind::SecurityKey,
        }
    }

    /// The username the credential claims.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. }
            | Self::OneTimeCode { username, .. }
            | Self::SecurityKey { username, .. } => username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Credential, CredentialKind};
    use secrecy::SecretString;

    #[test]
    fn kind_tags_match_variants() {
        let password = Credential::Password {
            username: "ana".to_string(),
            password: SecretString::from("hunter2"),
        };
        assert_eq!(password.kind(), CredentialKind::Password);
        assert_eq!(password.username(), "ana");

        let key = Credential::SecurityKey {
            username: "ana".to_string(),
            key_handle: "kh-1".to_string(),
            assertion: SecretString::from("signed-assertion"),
        };
        assert_eq!(key.kind(), CredentialKind::SecurityKey);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credential = Credential::Password {
            username: "ana".to_string(),
            password: SecretString::from("hunter2"),
        };
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
