use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod error;
mod output;
mod rc;
mod response;
mod status;
mod utils;

use error::Result;

#[derive(Parser)]
#[command(name = "tpmwire")]
#[command(about = "TPM 2.0 wire protocol toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a TPM response code
    Rc {
        #[command(flatten)]
        config: rc::Config,
    },
    /// Split a TPM response packet and classify its response code
    Response {
        #[command(flatten)]
        config: response::Config,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rc { config } => rc::execute(config)?,
        Commands::Response { config } => response::execute(config)?,
    }

    Ok(())
}
