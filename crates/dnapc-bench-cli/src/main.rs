use std::process::ExitCode;

mod cli;
mod commands;
mod logging;

fn main() -> ExitCode {
    cli::cli()
}
