//! Multifactor provider: a validator bundled with identity and policy.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::bypass::BypassEvaluator;
use crate::authn::validator::CredentialValidator;

/// Policy governing how a provider's unavailability converts into an
/// allow/deny outcome. Invalid credentials and locked principals deny under
/// every mode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Unavailability admits the request, flagged as degraded.
    Open,
    /// Unavailability is a hard denial.
    #[default]
    Closed,
    /// The provider behaves as if it were never eligible.
    Phantom,
}

impl FailureMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Phantom => "phantom",
        }
    }
}

/// One pluggable authentication factor.
///
/// Identity is stable across reloads. Rank decides precedence when several
/// providers could satisfy the same step-up requirement: lower rank wins,
/// ties break by ascending id.
pub struct MultifactorProvider {
    id: String,
    rank: u32,
    failure_mode: FailureMode,
    bypass: Arc<dyn BypassEvaluator>,
    validator: Arc<dyn CredentialValidator>,
}

impl MultifactorProvider {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        rank: u32,
        failure_mode: FailureMode,
        bypass: Arc<dyn BypassEvaluator>,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        Self {
            id: id.into(),
            rank,
            failure_mode,
            bypass,
            validator,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    #[must_use]
    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    #[must_use]
    pub fn bypass(&self) -> &dyn BypassEvaluator {
        self.bypass.as_ref()
    }

    #[must_use]
    pub fn validator(&self) -> &Arc<dyn CredentialValidator> {
        &self.validator
    }
}

impl fmt::Debug for MultifactorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultifactorProvider")
            .field("id", &self.id)
            .field("rank", &self.rank)
            .field("failure_mode", &self.failure_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::FailureMode;

    #[test]
    fn failure_mode_defaults_to_closed() {
        assert_eq!(FailureMode::default(), FailureMode::Closed);
        assert_eq!(FailureMode::Phantom.as_str(), "phantom");
    }
}
