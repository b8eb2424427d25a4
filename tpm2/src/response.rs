//! Response packets.
//!
//! A response is a 10-byte header followed by the payload:
//!
//! ```text
//! tag: u16 | responseSize: u32 | responseCode: u32 | payload
//! ```
//!
//! `responseSize` counts the whole packet, header included.

use mu::{MarshalValues, UnmarshalValues};
use nom::{IResult, Parser};
use serde::Serialize;
use tpmwire::decoder::{DecodableFrom, Decoder};
use tpmwire::encoder::{EncodableTo, Encoder};
use tracing::{debug, trace};

use crate::constants::{CommandCode, ResponseCode, StructTag};
use crate::error::{Error, Result};
use crate::rc::decode_response_code;

pub const HEADER_SIZE: usize = 10;

/// Bytes received from the TPM for `command`, not yet split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub command: CommandCode,
    pub bytes: Vec<u8>,
}

impl RawResponse {
    pub fn new(command: CommandCode, bytes: Vec<u8>) -> Self {
        RawResponse { command, bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub command: CommandCode,
    pub tag: StructTag,
    pub size: u32,
    pub code: ResponseCode,
    pub payload: Vec<u8>,
}

fn parse_header(input: &[u8]) -> IResult<&[u8], (u16, u32, u32)> {
    (
        nom::number::be_u16(),
        nom::number::be_u32(),
        nom::number::be_u32(),
    )
        .parse(input)
}

impl DecodableFrom<RawResponse> for Response {}

impl Decoder<RawResponse, Response> for RawResponse {
    type Error = Error;

    fn decode(&self) -> Result<Response> {
        let invalid = |reason: String| Error::InvalidResponseHeader {
            command: self.command,
            reason,
        };

        if self.bytes.len() < HEADER_SIZE {
            return Err(invalid(format!(
                "insufficient bytes for header: got {}, need {HEADER_SIZE}",
                self.bytes.len()
            )));
        }

        let (payload, (tag, size, code)) =
            parse_header(&self.bytes).map_err(|e| invalid(e.to_string()))?;

        if size as usize != self.bytes.len() {
            return Err(invalid(format!(
                "responseSize field ({size}) does not match the number of bytes received ({})",
                self.bytes.len()
            )));
        }

        let response = Response {
            command: self.command,
            tag: StructTag(tag),
            size,
            code: ResponseCode(code),
            payload: payload.to_vec(),
        };
        debug!(
            command = %response.command,
            tag = %response.tag,
            code = %response.code,
            payload_len = response.payload.len(),
            "decoded response header"
        );
        Ok(response)
    }
}

fn packet_size(payload_len: usize) -> mu::Result<u32> {
    let len = HEADER_SIZE + payload_len;
    u32::try_from(len).map_err(|_| mu::Error::TooLong {
        what: "Response",
        len,
        max: 4,
    })
}

impl EncodableTo<Response> for Vec<u8> {}

impl Encoder<Response, Vec<u8>> for Response {
    type Error = mu::Error;

    /// Encodes the packet. `responseSize` is computed from the payload, the
    /// stored `size` is ignored.
    fn encode(&self) -> mu::Result<Vec<u8>> {
        let size = packet_size(self.payload.len())?;
        let mut bytes = mu::marshal_to_bytes((&self.tag, &size, &self.code))?;
        bytes.extend_from_slice(&self.payload);
        trace!(command = %self.command, len = bytes.len(), "encoded response");
        Ok(bytes)
    }
}

impl Response {
    /// Decodes the response code.
    pub fn check(&self) -> Result<()> {
        decode_response_code(self.command, self.code)
    }

    /// Whether the payload carries a parameter size and an authorization
    /// area.
    pub fn has_sessions(&self) -> bool {
        self.tag == StructTag::SESSIONS
    }

    /// Decodes the payload into `values` in order and returns the number of
    /// bytes consumed.
    pub fn unmarshal_payload(&self, values: impl UnmarshalValues) -> Result<usize> {
        mu::unmarshal_from_bytes(&self.payload, values).map_err(|source| {
            Error::InvalidResponsePayload {
                command: self.command,
                bytes: self.payload.clone(),
                source,
            }
        })
    }

    /// Builds a successful response carrying `values` as its payload.
    pub fn with_payload(
        command: CommandCode,
        tag: StructTag,
        values: impl MarshalValues,
    ) -> mu::Result<Self> {
        let payload = mu::marshal_to_bytes(values)?;
        let size = packet_size(payload.len())?;
        Ok(Response {
            command,
            tag,
            size,
            code: ResponseCode::SUCCESS,
            payload,
        })
    }
}
