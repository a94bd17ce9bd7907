//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the appropriate action.

use crate::cli::actions::{Action, check};
use crate::cli::commands;
use anyhow::{Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let config_path = matches
        .get_one::<String>(commands::ARG_CONFIG)
        .cloned()
        .context("missing required argument: --config")?;
    let check_only = matches.get_flag(commands::ARG_CHECK);

    Ok(Action::Check(check::Args {
        config_path: config_path.into(),
        check_only,
    }))
}
