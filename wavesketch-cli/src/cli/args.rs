//! CLI argument definitions for `wavesketch`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser.
pub fn build_cli() -> Command {
    Command::new("wavesketch")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Adam Howard <adam.thomas.howard@gmail.com>")
        .about("Extract waveform amplitude envelopes from audio")
        .arg_required_else_help(true)
        .arg(
            Arg::new("points-per-second")
                .long("pps")
                .short('p')
                .value_name("POINTS")
                .value_parser(value_parser!(f64))
                .conflicts_with("min-points-per-second")
                .help("Envelope points per second of audio"),
        )
        .arg(
            Arg::new("min-points-per-second")
                .long("min-pps")
                .value_name("POINTS")
                .value_parser(value_parser!(f64))
                .requires("min-points")
                .help("Lowest density used when fitting the envelope to --min-points"),
        )
        .arg(
            Arg::new("min-points")
                .long("min-points")
                .value_name("COUNT")
                .value_parser(value_parser!(f64))
                .requires("min-points-per-second")
                .help("Raise the density so short audio yields at least this many points"),
        )
        .arg(
            Arg::new("progress-interval")
                .long("progress-interval")
                .value_name("ITERATIONS")
                .value_parser(value_parser!(usize))
                .help("Loop iterations between progress snapshots"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .short('s')
                .value_name("PATH")
                .help("Path to a JSON file with operation settings"),
        )
        .arg(
            Arg::new("track")
                .long("track")
                .short('t')
                .value_name("INDEX")
                .value_parser(value_parser!(usize))
                .help("Only print the envelope of this track"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Log the size of each progress snapshot"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .action(ArgAction::SetTrue)
                .help("Pretty-print the JSON output"),
        )
        .arg(
            Arg::new("INPUT")
                .help("The input audio file path")
                .required(true)
                .index(1),
        )
}
