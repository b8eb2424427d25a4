//! # mu
//!
//! Marshalling and unmarshalling of values in the TPM 2.0 wire format.
//!
//! Every codec type implements [`Marshal`] and [`Unmarshal`] and declares
//! its traversal strategy, a [`Kind`], as an associated constant:
//!
//! | Kind | Rust type | Wire format |
//! |------|-----------|-------------|
//! | Primitive | `u8`..`u64`, `i8`..`i64`, `bool`, [`mu_primitive!`] newtypes | big-endian, fixed width |
//! | Pointer | `Option<T>`, `Box<T>` | the pointee |
//! | Struct | [`mu_struct!`] | fields in declaration order |
//! | Union | [`mu_union!`] | payload of the variant chosen by a sibling field |
//! | RawBuffer | [`RawBytes`] | bytes, no length |
//! | SizedByteBuffer | `Vec<u8>` | 16-bit length, bytes |
//! | List | `Vec<T>` | 32-bit length, elements |
//! | Custom | [`custom_marshaller!`] | defined by [`CustomMarshaller`] |
//!
//! Struct fields may carry options that change how their value is framed:
//! `selector` names the sibling field that picks the variant of a union,
//! `sized` frames a struct reached through a pointer with a 16-bit length
//! (a length of zero meaning the pointer is empty), and `raw` drops the
//! length prefix of a list or buffer.
//!
//! ## Example
//!
//! ```
//! use mu::{marshal_to_bytes, unmarshal_from_bytes};
//!
//! mu::mu_struct! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Nested {
//!         pub a: u8,
//!         pub b: u32,
//!     }
//! }
//!
//! mu::mu_struct! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Outer {
//!         pub tag: u16,
//!         #[mu(sized)]
//!         pub nested: Option<Nested>,
//!     }
//! }
//!
//! let value = Outer { tag: 1, nested: Some(Nested { a: 2, b: 3 }) };
//! let bytes = marshal_to_bytes((&value, &vec![0xaau8])).unwrap();
//! assert_eq!(
//!     vec![0, 1, 0, 5, 2, 0, 0, 0, 3, 0, 1, 0xaa],
//!     bytes
//! );
//!
//! let mut decoded = Outer::default();
//! let mut buffer: Vec<u8> = Vec::new();
//! let n = unmarshal_from_bytes(&bytes, (&mut decoded, &mut buffer)).unwrap();
//! assert_eq!(value, decoded);
//! assert_eq!(vec![0xaa], buffer);
//! assert_eq!(bytes.len(), n);
//! ```

#![forbid(unsafe_code)]

pub mod context;
pub mod custom;
pub mod error;
pub mod kind;
pub mod marshal;
pub mod schema;
pub mod union;
pub mod unmarshal;

use std::io::{Read, Write};

use tracing::trace;

pub use context::{Container, Context, MAX_DEPTH};
pub use custom::CustomMarshaller;
pub use error::{Error, Op, Result};
pub use kind::{FieldDescriptor, FieldOptions, Kind, TypeDescriptor, classify, descriptor};
pub use marshal::{Marshal, RawBytes};
pub use union::Union;
pub use unmarshal::Unmarshal;

/// Values that can be marshalled in sequence: a single `&T` or a tuple of
/// up to eight references.
pub trait MarshalValues {
    fn marshal_values(&self, w: &mut dyn Write) -> Result<()>;
}

/// Destinations that can be decoded in sequence: a single `&mut T` or a
/// tuple of up to eight mutable references.
pub trait UnmarshalValues {
    fn unmarshal_values(&mut self, r: &mut dyn Read) -> Result<()>;
}

impl<T: Marshal + ?Sized> MarshalValues for &T {
    fn marshal_values(&self, w: &mut dyn Write) -> Result<()> {
        (**self).marshal(w, &Context::root())
    }
}

impl<T: Unmarshal> UnmarshalValues for &mut T {
    fn unmarshal_values(&mut self, r: &mut dyn Read) -> Result<()> {
        (**self).unmarshal_into(r, &Context::root())
    }
}

macro_rules! impl_values_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Marshal),+> MarshalValues for ($(&$name,)+) {
            fn marshal_values(&self, w: &mut dyn Write) -> Result<()> {
                $(
                    self.$idx
                        .marshal(w, &Context::root())
                        .map_err(|e| e.in_value(Op::Marshal, $idx))?;
                )+
                Ok(())
            }
        }

        impl<$($name: Unmarshal),+> UnmarshalValues for ($(&mut $name,)+) {
            fn unmarshal_values(&mut self, r: &mut dyn Read) -> Result<()> {
                $(
                    self.$idx
                        .unmarshal_into(r, &Context::root())
                        .map_err(|e| e.in_value(Op::Unmarshal, $idx))?;
                )+
                Ok(())
            }
        }
    };
}

impl_values_tuple!(A 0);
impl_values_tuple!(A 0, B 1);
impl_values_tuple!(A 0, B 1, C 2);
impl_values_tuple!(A 0, B 1, C 2, D 3);
impl_values_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_values_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_values_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_values_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

/// Marshals `values` in order to `w`.
///
/// Nothing is rolled back on error: whatever was written before the failing
/// value stays in `w`.
pub fn marshal_to_writer<W: Write>(w: &mut W, values: impl MarshalValues) -> Result<()> {
    trace!("marshalling values to writer");
    values.marshal_values(w)
}

/// Marshals `values` in order into a new buffer.
pub fn marshal_to_bytes(values: impl MarshalValues) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    values.marshal_values(&mut buf)?;
    trace!(len = buf.len(), "marshalled values");
    Ok(buf)
}

/// Decodes from `r` into each of `values` in order.
pub fn unmarshal_from_reader<R: Read>(r: &mut R, mut values: impl UnmarshalValues) -> Result<()> {
    trace!("unmarshalling values from reader");
    values.unmarshal_values(r)
}

/// Decodes from `data` into each of `values` in order and returns the
/// number of bytes consumed.
pub fn unmarshal_from_bytes(data: &[u8], mut values: impl UnmarshalValues) -> Result<usize> {
    let mut cursor = data;
    values.unmarshal_values(&mut cursor)?;
    let consumed = data.len() - cursor.len();
    trace!(len = data.len(), consumed, "unmarshalled values");
    Ok(consumed)
}
