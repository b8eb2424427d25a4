use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};

use tpm2::CommandCode;

use crate::error::{Error, Result};

/// Read input from a file or stdin
pub(crate) fn read_input(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Decode hexadecimal text into bytes.
///
/// Whitespace is ignored and a leading `0x` is accepted, so the output of
/// `xxd -p` and space separated byte lists both work.
pub(crate) fn decode_hex(text: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let digits = digits
        .strip_prefix(b"0x")
        .or_else(|| digits.strip_prefix(b"0X"))
        .unwrap_or(digits.as_slice());

    hex::decode(digits).map_err(|e| Error::InvalidInput(format!("invalid hex input: {e}")))
}

/// Parse a `0x` prefixed hexadecimal or a decimal number
pub(crate) fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

/// Parse a command code given by number or by name (`ReadClock`,
/// `TPM2_ReadClock`)
pub(crate) fn parse_command(s: &str) -> std::result::Result<CommandCode, String> {
    if let Some(code) = CommandCode::from_name(s) {
        return Ok(code);
    }
    parse_u32(s)
        .map(CommandCode)
        .map_err(|_| format!("unknown command {s:?}"))
}

/// Format binary data as a hexadecimal dump in the style of `xxd`
pub(crate) fn format_hex_dump(data: &[u8]) -> String {
    const BYTES_PER_LINE: usize = 16;
    let mut output = String::new();

    for (line, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        let _ = write!(output, "{:08x}  ", line * BYTES_PER_LINE);

        for i in 0..BYTES_PER_LINE {
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(output, "{byte:02x} ");
                }
                None => output.push_str("   "),
            }
            if i == 7 {
                output.push(' ');
            }
        }

        output.push_str(" |");
        output.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        output.push_str("|\n");
    }

    output
}
