use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_CONFIG: &str = "config";
pub const ARG_CHECK: &str = "check";
pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("pordego")
        .about("Multifactor authentication execution plan engine")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_CONFIG)
                .short('c')
                .long("config")
                .help("Path to the plan configuration snapshot (JSON)")
                .env("PORDEGO_CONFIG")
                .required(true),
        )
        .arg(
            Arg::new(ARG_CHECK)
                .long("check")
                .help("Validate the configuration and exit without describing the plan")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv and up trace)")
                .global(true)
                .action(ArgAction::Count),
        )
}
