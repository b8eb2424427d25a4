//! # tpm2
//!
//! TPM 2.0 vocabulary on top of the [`mu`] codec.
//!
//! - [`constants`]: command codes, response codes, algorithm identifiers,
//!   structure tags, handles and session types
//! - [`types`]: structures, unions and buffers used as command parameters
//!   and response values
//! - [`rc`]: classification of response codes into [`Error`]s
//! - [`response`]: splitting response packets into header and payload
//!
//! ## Example
//!
//! ```
//! use tpm2::{CommandCode, RawResponse, Response, TimeInfo};
//! use tpmwire::decoder::Decoder;
//!
//! let mut bytes = vec![0x80, 0x01, 0x00, 0x00, 0x00, 0x23, 0x00, 0x00, 0x00, 0x00];
//! bytes.extend_from_slice(&[0u8; 25]);
//!
//! let response: Response = RawResponse::new(CommandCode::READ_CLOCK, bytes)
//!     .decode()
//!     .unwrap();
//! response.check().unwrap();
//!
//! let mut time = TimeInfo::default();
//! response.unmarshal_payload(&mut time).unwrap();
//! assert!(!time.clock_info.safe);
//! ```

#![forbid(unsafe_code)]

pub mod constants;
pub mod error;
pub mod rc;
pub mod response;
pub mod types;

pub use constants::{
    AlgorithmId, CommandCode, Handle, HandleType, ResponseCode, SessionType, StructTag,
};
pub use error::{Error, Result};
pub use rc::{ErrorCode0, ErrorCode1, WarningCode, decode_response_code};
pub use response::{HEADER_SIZE, RawResponse, Response};
pub use types::{
    Auth, ClockInfo, Data, Digest, EncryptedSecret, Name, Nonce, PcrSelect, PcrSelection,
    PcrSelectionList, SymDef, SymKeyBits, SymMode, TimeInfo,
};
