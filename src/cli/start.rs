use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if argument parsing, environment validation, telemetry
/// initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    // 1. Parse command-line arguments
    let matches = commands::new().get_matches();

    // 2. Load and validate the environment
    let action = dispatch::handler(&matches)?;

    // 3. Initialize telemetry with the requested level and the validated dev settings
    let dev = &action.config().dev;
    telemetry::init(
        commands::logging::requested_level(&matches, dev.debug),
        !dev.telemetry_disabled,
    )?;

    // 4. Return the action for execution by the binary
    Ok(action)
}
