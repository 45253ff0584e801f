mod commands;
mod error;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use storefront_workflows::RefundConfig;
use storefront_workflows::providers::{InMemoryCommerceStore, SeedData};
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;
use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Run storefront workflows against an in-memory store", long_about = None)]
struct Cli {
    /// JSON fixture used to seed the in-memory store
    #[arg(long, value_name = "PATH")]
    fixture: PathBuf,

    /// TOML file with a `[refund]` table (default: built-in settings)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); `RUST_LOG` takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let store = Arc::new(load_fixture(&cli.fixture)?);
    let config = match cli.config.as_deref() {
        Some(path) => RefundConfig::load(path).map_err(CliError::Config)?,
        None => RefundConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(cli.command.execute(store, config))
}

fn load_fixture(path: &Path) -> Result<InMemoryCommerceStore> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::FixtureRead {
        path: path.to_path_buf(),
        source,
    })?;
    let seed: SeedData =
        serde_json::from_str(&content).map_err(|source| CliError::FixtureParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(InMemoryCommerceStore::from_seed(seed))
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
