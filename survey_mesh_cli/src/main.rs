#![warn(clippy::all, rust_2018_idioms)]

mod agd;
mod args;
mod convert;
mod ply;
mod progress;
mod projection;
mod utils;

use std::process::ExitCode;

use args::Command;

fn main() -> ExitCode {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    match args::parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", args::USAGE);
            Ok(())
        }
        Command::Convert(config) => convert::run(&config),
    }
}
