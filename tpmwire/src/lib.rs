//! # tpmwire
//!
//! Core traits for moving between the layers of the tpmwire TPM 2.0
//! wire-protocol toolkit.
//!
//! This crate defines the `Decoder` and `Encoder` traits that establish the
//! type-safe conversion pattern used between the crates of the workspace.
//!
//! ## Overview
//!
//! A response travels through the layers like this:
//! ```text
//! Vec<u8> → Response (header + payload) → status check → typed values
//! ```
//!
//! Each step that turns one representation into the next uses the `Decoder`
//! trait, and the `Encoder` trait converts in the reverse direction. The
//! byte-level marshalling of typed values lives in the `mu` crate.
//!
//! ## Example
//!
//! ```ignore
//! use tpmwire::decoder::Decoder;
//! use tpm2::{CommandCode, RawResponse, Response};
//!
//! let bytes = vec![0x80, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00];
//! let response: Response = RawResponse::new(CommandCode::GET_RANDOM, bytes)
//!     .decode()
//!     .unwrap();
//! response.check().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
