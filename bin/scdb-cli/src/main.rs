//! CLI for inspecting deposits, params and sidechain DB traces.

mod cli;
mod handlers;
mod params;
mod trace;

use anyhow::{Error, Result};
use clap::Parser;
use scdb_common::logging::{self, LoggerConfig};

use crate::handlers::{deposit, params as params_handler, replay};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = cli::Cli::parse();

    let mut logger = LoggerConfig::with_base_name("scdb-cli");
    if cli.verbose {
        logger.set_default_directive("debug");
    }
    logging::init(logger);

    match cli.command {
        cli::Commands::Deposit(args) => deposit::handle_deposit(args),
        cli::Commands::Params(args) => params_handler::handle_params(args),
        cli::Commands::Replay(args) => replay::handle_replay(args).await,
    }
}
