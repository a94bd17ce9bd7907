//! CLI entry point: parse arguments, install telemetry, hand back the
//! requested action.

use anyhow::Result;

use crate::cli::{actions::Action, commands, dispatch, telemetry};

/// Parse the command line and prepare the [`Action`] to run.
///
/// # Errors
/// Returns an error if telemetry installation fails or the arguments do not
/// map to an action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();
    telemetry::init(matches.get_count(commands::ARG_VERBOSITY))?;
    dispatch::handler(&matches)
}
