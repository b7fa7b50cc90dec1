//! # Wavesketch
//!
//! Extracts per-track amplitude envelopes from an audio file and prints them as JSON.

use log::error;

mod cli;
mod logging;
mod runner;

fn main() {
    logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
