//! Marshal engine.

use std::any::type_name;
use std::io::Write;
use std::ops::{Deref, DerefMut};

use crate::context::Context;
use crate::error::{Error, Op, Result};
use crate::kind::{FieldDescriptor, Kind};

/// A type that can be written in the TPM wire format.
///
/// Implementations exist for the fixed-width integers, `bool`, `Vec<T>`,
/// [`RawBytes`], `Option<T>` and `Box<T>`. Structs, unions, integer
/// newtypes and custom-codec types get theirs from [`mu_struct!`],
/// [`mu_union!`], [`mu_primitive!`] and [`custom_marshaller!`].
///
/// [`mu_struct!`]: crate::mu_struct
/// [`mu_union!`]: crate::mu_union
/// [`mu_primitive!`]: crate::mu_primitive
/// [`custom_marshaller!`]: crate::custom_marshaller
pub trait Marshal {
    /// Traversal strategy of the type.
    const KIND: Kind;

    /// Field table of a plain struct.
    const FIELDS: &'static [FieldDescriptor] = &[];

    /// Set for single-byte primitives, whose sequences are sized byte
    /// buffers rather than lists.
    #[doc(hidden)]
    const OCTET: bool = false;

    /// Writes `self` to `w`.
    fn marshal(&self, w: &mut dyn Write, ctx: &Context) -> Result<()>;

    /// Value of `self` when it is named as the selector of a union.
    fn selector_value(&self) -> Option<u32> {
        None
    }

    /// Marshals `self` as a top-level value.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.marshal(&mut buf, &Context::root())?;
        Ok(buf)
    }
}

pub(crate) fn write_all(w: &mut dyn Write, buf: &[u8], what: &'static str) -> Result<()> {
    w.write_all(buf).map_err(|e| Error::from_io(e, what))
}

/// Writes the length prefix of a sequence of `kind`.
pub(crate) fn write_size(
    w: &mut dyn Write,
    kind: Kind,
    len: usize,
    what: &'static str,
) -> Result<()> {
    match kind {
        Kind::List => {
            let len = u32::try_from(len).map_err(|_| Error::TooLong { what, len, max: 4 })?;
            write_all(w, &len.to_be_bytes(), what)
        }
        _ => {
            let len = u16::try_from(len).map_err(|_| Error::TooLong { what, len, max: 2 })?;
            write_all(w, &len.to_be_bytes(), what)
        }
    }
}

macro_rules! impl_marshal_int {
    ($($ty:ty => $octet:expr),* $(,)?) => {$(
        impl Marshal for $ty {
            const KIND: Kind = Kind::Primitive;
            const OCTET: bool = $octet;

            fn marshal(&self, w: &mut dyn Write, _ctx: &Context) -> Result<()> {
                write_all(w, &self.to_be_bytes(), stringify!($ty))
            }

            fn selector_value(&self) -> Option<u32> {
                u32::try_from(*self).ok()
            }
        }
    )*};
}

impl_marshal_int! {
    u8 => true,
    u16 => false,
    u32 => false,
    u64 => false,
    i8 => false,
    i16 => false,
    i32 => false,
    i64 => false,
}

impl Marshal for bool {
    const KIND: Kind = Kind::Primitive;

    fn marshal(&self, w: &mut dyn Write, _ctx: &Context) -> Result<()> {
        write_all(w, &[u8::from(*self)], "bool")
    }

    fn selector_value(&self) -> Option<u32> {
        Some(u32::from(*self))
    }
}

impl<T: Marshal> Marshal for Vec<T> {
    const KIND: Kind = if T::OCTET {
        Kind::SizedByteBuffer
    } else {
        Kind::List
    };

    fn marshal(&self, w: &mut dyn Write, ctx: &Context) -> Result<()> {
        let name = type_name::<Self>();
        if !ctx.options().raw {
            write_size(w, Self::KIND, self.len(), name)?;
        }

        let elem_ctx = ctx.list_element(name)?;
        for (i, elem) in self.iter().enumerate() {
            elem.marshal(w, &elem_ctx)
                .map_err(|e| e.at_index(Op::Marshal, name, i))?;
        }
        Ok(())
    }
}

/// Bytes copied verbatim with no length prefix.
///
/// The length is implied by context. To decode, pre-size the buffer and use
/// [`Unmarshal::unmarshal_into`](crate::Unmarshal::unmarshal_into).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawBytes(pub Vec<u8>);

impl RawBytes {
    /// A zeroed buffer of `len` bytes, ready to be decoded into.
    pub fn with_len(len: usize) -> Self {
        RawBytes(vec![0; len])
    }
}

impl From<Vec<u8>> for RawBytes {
    fn from(v: Vec<u8>) -> Self {
        RawBytes(v)
    }
}

impl From<RawBytes> for Vec<u8> {
    fn from(v: RawBytes) -> Self {
        v.0
    }
}

impl Deref for RawBytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RawBytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<[u8]> for RawBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Marshal for RawBytes {
    const KIND: Kind = Kind::RawBuffer;

    fn marshal(&self, w: &mut dyn Write, _ctx: &Context) -> Result<()> {
        write_all(w, &self.0, "RawBytes")
    }
}

/// A nullable pointer.
///
/// `None` behind a `sized` field whose pointee is struct-shaped is the
/// absent sized struct and marshals to a zero length. Any other `None`
/// marshals the pointee's default value. A pointer to a custom-codec type is
/// itself custom and must not be `None`.
impl<T: Marshal + Default> Marshal for Option<T> {
    const KIND: Kind = match T::KIND {
        Kind::Custom => Kind::Custom,
        _ => Kind::Pointer,
    };

    fn marshal(&self, w: &mut dyn Write, ctx: &Context) -> Result<()> {
        let ty = type_name::<T>();
        if T::KIND == Kind::Custom {
            return match self {
                Some(v) => v.marshal(w, ctx),
                None => Err(Error::NilCustom { ty }),
            };
        }

        match self {
            Some(v) => v.marshal(w, &ctx.pointee(ty)?),
            None if ctx.options().sized && T::KIND.is_struct() => {
                write_all(w, &0u16.to_be_bytes(), "size of absent sized struct")
            }
            None => T::default().marshal(w, &ctx.pointee(ty)?),
        }
    }

    fn selector_value(&self) -> Option<u32> {
        self.as_ref().and_then(|v| v.selector_value())
    }
}

/// A non-null pointer.
impl<T: Marshal> Marshal for Box<T> {
    const KIND: Kind = match T::KIND {
        Kind::Custom => Kind::Custom,
        _ => Kind::Pointer,
    };

    fn marshal(&self, w: &mut dyn Write, ctx: &Context) -> Result<()> {
        if T::KIND == Kind::Custom {
            return (**self).marshal(w, ctx);
        }
        (**self).marshal(w, &ctx.pointee(type_name::<T>())?)
    }

    fn selector_value(&self) -> Option<u32> {
        (**self).selector_value()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::kind::FieldOptions;

    fn sized_field() -> Context {
        Context::root()
            .struct_field("Outer", None, FieldOptions::NONE.with_sized())
            .unwrap()
    }

    fn raw_field() -> Context {
        Context::root()
            .struct_field("Outer", None, FieldOptions::NONE.with_raw())
            .unwrap()
    }

    #[rstest(value, expected,
        case(0x12u8.to_bytes().unwrap(), vec![0x12]),
        case(0x1234u16.to_bytes().unwrap(), vec![0x12, 0x34]),
        case(0x1234_5678u32.to_bytes().unwrap(), vec![0x12, 0x34, 0x56, 0x78]),
        case(0x0102_0304_0506_0708u64.to_bytes().unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]),
        case((-2i16).to_bytes().unwrap(), vec![0xff, 0xfe]),
        case(true.to_bytes().unwrap(), vec![0x01]),
        case(false.to_bytes().unwrap(), vec![0x00]),
    )]
    fn test_marshal_primitive(value: Vec<u8>, expected: Vec<u8>) {
        assert_eq!(expected, value);
    }

    #[rstest(value, expected,
        case(vec![], vec![0x00, 0x00]),
        case(vec![0xaa], vec![0x00, 0x01, 0xaa]),
        case(vec![1, 2, 3], vec![0x00, 0x03, 1, 2, 3]),
    )]
    fn test_marshal_sized_byte_buffer(value: Vec<u8>, expected: Vec<u8>) {
        let buf = value.to_bytes().unwrap();
        assert_eq!(2 + value.len(), buf.len());
        assert_eq!(expected, buf);
    }

    #[rstest(value, expected,
        case(vec![], vec![0, 0, 0, 0]),
        case(vec![0x0102], vec![0, 0, 0, 1, 0x01, 0x02]),
        case(vec![1, 2, 3], vec![0, 0, 0, 3, 0, 1, 0, 2, 0, 3]),
    )]
    fn test_marshal_list(value: Vec<u16>, expected: Vec<u8>) {
        let buf = value.to_bytes().unwrap();
        assert_eq!(4 + value.len() * 2, buf.len());
        assert_eq!(expected, buf);
    }

    #[test]
    fn test_marshal_raw_tagged() {
        let mut buf = Vec::new();
        vec![1u8, 2, 3].marshal(&mut buf, &raw_field()).unwrap();
        vec![4u32].marshal(&mut buf, &raw_field()).unwrap();
        assert_eq!(vec![1, 2, 3, 0, 0, 0, 4], buf);
    }

    #[test]
    fn test_marshal_raw_bytes() {
        let buf = RawBytes(vec![0xde, 0xad]).to_bytes().unwrap();
        assert_eq!(vec![0xde, 0xad], buf);
    }

    #[test]
    fn test_marshal_sized_byte_buffer_too_long() {
        let err = vec![0u8; 0x1_0000].to_bytes().unwrap_err();
        assert!(matches!(
            err,
            Error::TooLong {
                len: 0x1_0000,
                max: 2,
                ..
            }
        ));
    }

    #[rstest(value, expected,
        case(Some(0x0102u16), vec![0x01, 0x02]),
        case(None, vec![0x00, 0x00]),
    )]
    fn test_marshal_pointer(value: Option<u16>, expected: Vec<u8>) {
        assert_eq!(expected, value.to_bytes().unwrap());
    }

    #[test]
    fn test_marshal_sized_non_struct_nil_pointer() {
        // Only struct pointees may be absent; anything else marshals its
        // zero value.
        let mut buf = Vec::new();
        None::<u32>.marshal(&mut buf, &sized_field()).unwrap();
        assert_eq!(vec![0, 0, 0, 0], buf);
    }

    #[test]
    fn test_marshal_nested_list_element_error() {
        let value = vec![vec![0u8; 0x1_0000]];
        let err = value.to_bytes().unwrap_err();
        assert!(matches!(err, Error::Element { index: 0, .. }));
        assert!(matches!(err.root(), Error::TooLong { max: 2, .. }));
    }

    #[test]
    fn test_box_is_pointer() {
        assert_eq!(Kind::Pointer, <Box<u16>>::KIND);
        assert_eq!(vec![0, 7], Box::new(7u16).to_bytes().unwrap());
        assert_eq!(Some(7), Box::new(7u16).selector_value());
    }
}
