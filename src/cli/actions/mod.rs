//! CLI actions.

pub mod check;

/// What this invocation of `pordego` was asked to do.
#[derive(Debug)]
pub enum Action {
    /// Validate a plan configuration snapshot, optionally describing the
    /// composed plan.
    Check(check::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Check(args) => check::execute(args).await,
        }
    }
}
