pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_ENV_FILE: &str = "env-file";
pub const CMD_CHECK: &str = "check";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("fineprint")
        .about("AI-powered legal document analysis")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("FINEPRINT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ENV_FILE)
                .long("env-file")
                .help("Load application variables from this dotenv file")
                .long_help(
                    "Load application variables from this dotenv file. Without it, .env.local and .env are loaded when present. Variables already set in the environment win.",
                )
                .env("FINEPRINT_ENV_FILE")
                .global(true),
        )
        .subcommand(
            Command::new(CMD_CHECK)
                .about("Validate the environment, print a redacted summary and exit"),
        );

    logging::with_args(command)
}
