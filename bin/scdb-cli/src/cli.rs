use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scdb-cli",
    about = "Inspect sidechain deposits and replay sidechain DB traces",
    version
)]
pub(crate) struct Cli {
    #[arg(long, short, global = true, help = "log at debug level unless RUST_LOG is set")]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Deposit(DepositArgs),

    Params(ParamsArgs),

    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ParamsFile {
    #[arg(
        long,
        env = "SCDB_PARAMS",
        help = "the path to the params file, defaults to the built-in params"
    )]
    pub(crate) params: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Recognize sidechain deposits in a script or a transaction", version)]
pub(crate) struct DepositArgs {
    #[arg(
        long,
        conflicts_with = "tx",
        required_unless_present = "tx",
        help = "a hex-encoded output script"
    )]
    pub(crate) script: Option<String>,

    #[arg(long, help = "a hex-encoded, consensus-serialized transaction")]
    pub(crate) tx: Option<String>,

    #[clap(flatten)]
    pub(crate) params: ParamsFile,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Validate and print the effective params as TOML", version)]
pub(crate) struct ParamsArgs {
    #[clap(flatten)]
    pub(crate) params: ParamsFile,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Replay a JSON trace of packages and blocks", version)]
pub(crate) struct ReplayArgs {
    #[arg(help = "the path to the trace file")]
    pub(crate) trace: PathBuf,

    #[arg(long, help = "print every event as a JSON line")]
    pub(crate) events: bool,

    #[clap(flatten)]
    pub(crate) params: ParamsFile,
}
