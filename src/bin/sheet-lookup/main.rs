//! `sheet-lookup` command line tool.

use std::io::{self, IsTerminal};

use clap::Parser;
use sheet_lookup::logging::{init_logging, LogConfig, LogFormat};
use sheet_lookup::response::ErrorResponse;
use sheet_lookup::source::FileStore;
use tracing::{error, Level};

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg};
use crate::commands::{
    print_json, run_delete, run_export, run_info, run_list, run_read, run_search, run_sheet, run_upload, SheetOutput,
};

fn main() {
    let cli = Cli::parse();
    if let Err(failure) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: cannot open log file: {failure}");
        std::process::exit(1);
    }
    let store = FileStore::new(&cli.store);

    let outcome = match &cli.command {
        Command::Upload(args) => run_upload(&store, args).and_then(|uploaded| print_json(&uploaded)).map(|()| true),
        Command::List(args) => run_list(&store, args).and_then(|uploads| print_json(&uploads)).map(|()| true),
        Command::Info(args) => run_info(&store, args).and_then(|metadata| print_json(&metadata)).map(|()| true),
        Command::Delete(args) => run_delete(&store, args).and_then(|response| print_json(&response)).map(|()| true),
        Command::Read(args) => run_read(&store, args).and_then(|contents| print_json(&contents)).map(|()| true),
        Command::Search(args) => run_search(&store, args).and_then(|response| {
            print_json(&response)?;
            Ok(response.success)
        }),
        Command::Sheet(args) => run_sheet(args).and_then(|output| match output {
            SheetOutput::View(contents) => print_json(&contents).map(|()| true),
            SheetOutput::Search(response) => {
                print_json(&response)?;
                Ok(response.success)
            }
        }),
        Command::Export(args) => run_export(&store, args).map(|()| true),
    };

    let exit_code = match outcome {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(failure) => {
            error!("{failure:#}");
            // the JSON body goes to stdout like any other command output
            if let Err(print_failure) = print_json(&ErrorResponse::new(format!("{failure:#}"))) {
                eprintln!("error: {print_failure}");
            }
            1
        }
    };
    std::process::exit(exit_code);
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::default()
        .with_level(cli.verbosity.tracing_level().unwrap_or(Level::ERROR))
        .with_format(format)
        .with_ansi(cli.log_file.is_none() && io::stderr().is_terminal())
        .with_timestamps(cli.log_timestamps)
        .with_log_values(cli.log_values)
        .with_log_file(cli.log_file.clone())
}
