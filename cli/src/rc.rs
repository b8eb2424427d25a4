use clap::Args;
use tpm2::{CommandCode, ResponseCode};

use crate::error::Result;
use crate::output::OutputFormat;
use crate::status::StatusReport;
use crate::utils::{parse_command, parse_u32};

#[derive(Args)]
pub(crate) struct Config {
    /// Response code, hexadecimal with a 0x prefix or decimal
    #[arg(value_parser = parse_u32)]
    code: u32,

    /// Command the response code was returned for, by name or number
    #[arg(short, long, value_parser = parse_command)]
    command: Option<CommandCode>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let report = StatusReport::new(config.command, ResponseCode(config.code));

    match config.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => report.print_text(),
    }

    Ok(())
}
