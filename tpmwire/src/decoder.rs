//! Decoder trait for type-safe conversions.
//!
//! The `Decoder` trait converts a source type `T` into a destination type
//! `D`. The `tpm2` crate uses it to split raw response bytes into a
//! `Response`.
//!
//! # Design Pattern
//!
//! The decoder uses a two-trait pattern for type safety:
//!
//! 1. `Decoder<T, D>` - Performs the actual conversion
//! 2. `DecodableFrom<T>` - Marker trait constraining valid conversions
//!
//! Only pairs that are explicitly marked can be converted, so an invalid
//! conversion is a compile error rather than a runtime failure.
//!
//! # Implementation Guide
//!
//! ```no_run
//! use tpmwire::decoder::{Decoder, DecodableFrom};
//!
//! struct Packet(Vec<u8>);
//! struct Header(u16);
//!
//! #[derive(Debug)]
//! struct ShortPacket;
//!
//! impl DecodableFrom<Packet> for Header {}
//!
//! impl Decoder<Packet, Header> for Packet {
//!     type Error = ShortPacket;
//!
//!     fn decode(&self) -> Result<Header, Self::Error> {
//!         match self.0.as_slice() {
//!             [hi, lo, ..] => Ok(Header(u16::from_be_bytes([*hi, *lo]))),
//!             _ => Err(ShortPacket),
//!         }
//!     }
//! }
//! ```

/// Decoder trait for converting from type `T` to type `D`.
///
/// This trait is implemented by the source type `T`. The destination type
/// must implement `DecodableFrom<T>`.
///
/// # Type Parameters
///
/// * `T` - The source type (usually `Self`)
/// * `D` - The destination type that can be decoded from `T`
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The specific error
    /// conditions depend on the implementing type.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// The trait has no methods. It exists so that the compiler can reject a
/// `Decoder` implementation for a pair that was never declared valid.
pub trait DecodableFrom<T> {}
