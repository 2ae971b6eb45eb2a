// restorer-cli/src/main.rs
//
// Entry point for the `restorer` binary: parses arguments, installs the
// console logger, dispatches to a command and maps failures to exit codes.

use clap::Parser;
use restorer_cli::commands::{info, run, show_config};
use restorer_cli::error::exit_code_for;
use restorer_cli::logging::init_logging;
use restorer_cli::terminal::print_error;
use restorer_cli::{Cli, Commands};

use std::process;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run::run(args).map(|_| ()),
        Commands::Config(args) => show_config::run(&args),
        Commands::Info => info::run(),
    };

    if let Err(e) = result {
        print_error(format!("{e:#}"));
        process::exit(exit_code_for(&e));
    }
}
