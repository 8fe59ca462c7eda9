use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::commands::align::handle_align;
use crate::commands::run::handle_run;
use crate::commands::tasks::handle_tasks;
use crate::logging::setup_logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Log at debug level",
        long_help = "Log at debug level unless RUST_LOG says otherwise."
    )]
    verbose: bool,

    #[arg(
        long = "log-dir",
        value_name = "DIR",
        global = true,
        default_value = "logs",
        help = "Directory for the daily rolling log file"
    )]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one benchmark task
    #[command(about = "Run one benchmark task")]
    Run {
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Configuration file (yaml, toml or json)"
        )]
        config: PathBuf,

        #[arg(
            short,
            long,
            value_name = "NAME",
            help = "Task to run instead of the one named in the config",
            long_help = "Task to run. Overrides the `task` key of the configuration. Use `dnapc-bench tasks` to list the choices."
        )]
        task: Option<String>,

        #[arg(
            short = 's',
            long = "set",
            value_name = "KEY=VALUE",
            action = clap::ArgAction::Append,
            help = "Override a configuration value",
            long_help = "Override a configuration value with a dotted key, e.g. --set blocks.resolution=32. May be repeated; later values win."
        )]
        overrides: Vec<String>,

        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Save the task report as JSON"
        )]
        report: Option<PathBuf>,
    },

    /// List the available tasks
    #[command(about = "List the available tasks")]
    Tasks,

    /// Show how the io directories align
    #[command(about = "Show how the io directories align")]
    Align {
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Configuration file (yaml, toml or json)"
        )]
        config: PathBuf,

        #[arg(
            short = 's',
            long = "set",
            value_name = "KEY=VALUE",
            action = clap::ArgAction::Append,
            help = "Override a configuration value"
        )]
        overrides: Vec<String>,

        #[arg(
            short,
            long,
            value_name = "ROLE",
            action = clap::ArgAction::Append,
            value_delimiter = ',',
            help = "Leave these io roles out"
        )]
        except: Vec<String>,

        #[arg(
            short,
            long,
            help = "Decode every aligned file and print its shape",
            long_help = "Decode every aligned file up front and print its kind and shape. Uses the rayon pool when parallel_load is set in the configuration."
        )]
        load: bool,
    },
}

/// Run the parsed command. Failures are reported once on stderr and turn
/// into a non-zero exit code.
pub fn cli() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match setup_logging(&cli.log_dir, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", failure_line(&e));
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Run {
            config,
            task,
            overrides,
            report,
        } => handle_run(&config, task, &overrides, report).map(|_| ()),
        Command::Tasks => {
            handle_tasks();
            Ok(())
        }
        Command::Align {
            config,
            overrides,
            except,
            load,
        } => handle_align(&config, &overrides, &except, load).map(|_| ()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{}", failure_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// The one line printed for a failed command, context chain included.
fn failure_line(error: &anyhow::Error) -> String {
    format!("{} {:#}", style("Error:").red().bold(), error)
}
