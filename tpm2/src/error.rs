use thiserror::Error;

use crate::constants::{CommandCode, ResponseCode};
use crate::rc::{ErrorCode0, ErrorCode1, WarningCode};

fn describe(description: Option<&str>) -> String {
    description.map(|d| format!(" ({d})")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum Error {
    // Response codes
    #[error("TPM returned a 1.2 error whilst executing command {command}: {code}")]
    Tpm1 {
        command: CommandCode,
        code: ResponseCode,
    },
    #[error("TPM returned a vendor defined error whilst executing command {command}: {code}")]
    Vendor {
        command: CommandCode,
        code: ResponseCode,
    },
    #[error("TPM returned a warning whilst executing command {command}: {code}{}", describe(.code.description()))]
    Warning {
        command: CommandCode,
        code: WarningCode,
    },
    #[error("TPM returned an error whilst executing command {command}: {code}{}", describe(.code.description()))]
    Error {
        command: CommandCode,
        code: ErrorCode0,
    },
    #[error("TPM returned an error for parameter {index} whilst executing command {command}: {code}{}", describe(.code.description()))]
    Parameter {
        command: CommandCode,
        code: ErrorCode1,
        index: u8,
    },
    #[error("TPM returned an error for session {index} whilst executing command {command}: {code}{}", describe(.code.description()))]
    Session {
        command: CommandCode,
        code: ErrorCode1,
        index: u8,
    },
    #[error("TPM returned an error for handle {index} whilst executing command {command}: {code}{}", describe(.code.description()))]
    Handle {
        command: CommandCode,
        code: ErrorCode1,
        index: u8,
    },

    // Response framing
    #[error("TPM returned an invalid header for command {command}: {reason}")]
    InvalidResponseHeader {
        command: CommandCode,
        reason: String,
    },
    #[error("TPM returned an invalid payload for command {command}: {source}")]
    InvalidResponsePayload {
        command: CommandCode,
        bytes: Vec<u8>,
        #[source]
        source: mu::Error,
    },
}

impl Error {
    /// Command the failing response belongs to.
    pub fn command(&self) -> CommandCode {
        match self {
            Error::Tpm1 { command, .. }
            | Error::Vendor { command, .. }
            | Error::Warning { command, .. }
            | Error::Error { command, .. }
            | Error::Parameter { command, .. }
            | Error::Session { command, .. }
            | Error::Handle { command, .. }
            | Error::InvalidResponseHeader { command, .. }
            | Error::InvalidResponsePayload { command, .. } => *command,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Error::Warning { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
