use serde::Serialize;
use tpm2::{CommandCode, ResponseCode, decode_response_code};

/// Classification of a response code, as printed by the `rc` and
/// `response` commands.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    pub(crate) response_code: String,
    pub(crate) command: Option<String>,
    pub(crate) class: &'static str,
    pub(crate) code: Option<String>,
    pub(crate) index: Option<u8>,
    pub(crate) description: Option<&'static str>,
    pub(crate) message: Option<String>,
}

impl StatusReport {
    pub(crate) fn new(command: Option<CommandCode>, rc: ResponseCode) -> Self {
        let mut report = StatusReport {
            response_code: rc.to_string(),
            command: command.map(|c| c.to_string()),
            class: "success",
            code: None,
            index: None,
            description: None,
            message: None,
        };

        let Err(err) = decode_response_code(command.unwrap_or_default(), rc) else {
            return report;
        };
        report.message = Some(err.to_string());

        match err {
            tpm2::Error::Tpm1 { .. } => report.class = "tpm1",
            tpm2::Error::Vendor { .. } => report.class = "vendor",
            tpm2::Error::Warning { code, .. } => {
                report.class = "warning";
                report.code = Some(code.to_string());
                report.description = code.description();
            }
            tpm2::Error::Error { code, .. } => {
                report.class = "error";
                report.code = Some(code.to_string());
                report.description = code.description();
            }
            tpm2::Error::Parameter { code, index, .. }
            | tpm2::Error::Session { code, index, .. }
            | tpm2::Error::Handle { code, index, .. } => {
                report.class = match err {
                    tpm2::Error::Parameter { .. } => "parameter",
                    tpm2::Error::Session { .. } => "session",
                    _ => "handle",
                };
                report.code = Some(code.to_string());
                report.index = Some(index);
                report.description = code.description();
            }
            tpm2::Error::InvalidResponseHeader { .. }
            | tpm2::Error::InvalidResponsePayload { .. } => report.class = "invalid",
        }
        report
    }

    pub(crate) fn print_text(&self) {
        println!("Response code: {}", self.response_code);
        if let Some(command) = &self.command {
            println!("Command: {command}");
        }
        println!("Class: {}", self.class);
        if let Some(code) = &self.code {
            println!("Code: {code}");
        }
        if let Some(index) = self.index {
            println!("Index: {index}");
        }
        if let Some(description) = self.description {
            println!("Description: {description}");
        }
        if let Some(message) = &self.message {
            println!("Message: {message}");
        }
    }
}
