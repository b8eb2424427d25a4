use clap::Args;
use serde::Serialize;
use tpm2::{CommandCode, RawResponse, Response};
use tpmwire::decoder::Decoder;
use tracing::debug;

use crate::error::Result;
use crate::output::OutputFormat;
use crate::status::StatusReport;
use crate::utils::{decode_hex, format_hex_dump, parse_command, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the response packet. If not specified, reads from stdin
    file: Option<String>,

    /// Command the response was returned for, by name or number
    #[arg(short, long, value_parser = parse_command)]
    command: Option<CommandCode>,

    /// Treat the input as hexadecimal text instead of binary
    #[arg(long)]
    hex_input: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Serialize)]
struct ResponseReport {
    tag: String,
    size: u32,
    sessions: bool,
    status: StatusReport,
    payload: String,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let bytes = if config.hex_input {
        decode_hex(&input)?
    } else {
        input
    };
    debug!(len = bytes.len(), "read response packet");

    let raw = RawResponse::new(config.command.unwrap_or_default(), bytes);
    let response: Response = raw.decode()?;

    let report = ResponseReport {
        tag: response.tag.to_string(),
        size: response.size,
        sessions: response.has_sessions(),
        status: StatusReport::new(config.command, response.code),
        payload: hex::encode(&response.payload),
    };

    match config.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Tag: {}", report.tag);
            println!("Size: {}", report.size);
            report.status.print_text();
            println!("Payload: {} bytes", response.payload.len());
            print!("{}", format_hex_dump(&response.payload));
        }
    }

    Ok(())
}
