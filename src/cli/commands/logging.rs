//! `-v` / `FINEPRINT_LOG_LEVEL` and how they map onto tracing levels.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a count (0-5) or a level name. `warning` is read as `warn`.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim();
        if let Ok(count) = level.parse::<u8>() {
            return if count <= 5 {
                Ok(count)
            } else {
                Err(format!("log level count must be between 0 and 5, received {count}"))
            };
        }

        let lowered = level.to_lowercase();
        let name = match lowered.as_str() {
            "warning" => "warn",
            other => other,
        };

        LEVEL_NAMES
            .iter()
            .position(|known| *known == name)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| {
                format!(
                    "invalid log level '{level}', expected one of: {}",
                    LEVEL_NAMES.join(", ")
                )
            })
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("FINEPRINT_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

/// 0 keeps the subscriber default.
const fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

fn with_debug_floor(level: Option<Level>, debug_mode: bool) -> Option<Level> {
    if !debug_mode {
        return level;
    }

    // tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR
    Some(level.map_or(Level::DEBUG, |level| level.max(Level::DEBUG)))
}

/// Level requested on the command line, raised to at least DEBUG under `DEBUG_MODE`.
#[must_use]
pub fn requested_level(matches: &ArgMatches, debug_mode: bool) -> Option<Level> {
    let verbosity = matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0);
    with_debug_floor(level_for(verbosity), debug_mode)
}
