//! samshee command line entry point.

use clap::Parser;
use std::io;
use std::process::ExitCode;

use samshee::cli::{self, Cli};
use samshee::logging::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose, cli.quiet));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli::run(&cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("{}", failure);
            ExitCode::from(failure.code)
        }
    }
}
