//! Unmarshal engine.
//!
//! Decoding comes in two flavours. [`Unmarshal::unmarshal`] allocates and
//! returns a new value, while [`Unmarshal::unmarshal_into`] decodes into an
//! existing one. Raw buffers and `raw` sequences have no length on the wire,
//! so they can only be decoded into a destination that the caller sized
//! beforehand.

use std::any::type_name;
use std::io::{self, Read};

use tracing::debug;

use crate::context::Context;
use crate::error::{Error, Op, Result};
use crate::kind::Kind;
use crate::marshal::{Marshal, RawBytes};

/// Upper bound on the number of elements reserved ahead of decoding a
/// sequence. Longer sequences grow as their elements are read.
const PREALLOC_LIMIT: usize = 4096;

/// A type that can be read from the TPM wire format.
pub trait Unmarshal: Marshal + Sized {
    /// Decodes a new value from `r`.
    fn unmarshal(r: &mut dyn Read, ctx: &Context) -> Result<Self>;

    /// Decodes into `self`.
    ///
    /// Structs decode field by field in place and `raw` sequences and
    /// [`RawBytes`] read exactly as many elements as they already hold. An
    /// empty raw destination inside a value the engine allocated is
    /// [`Error::UnsizedRaw`].
    /// Everything else is replaced by a freshly decoded value.
    fn unmarshal_into(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()> {
        *self = Self::unmarshal(r, ctx)?;
        Ok(())
    }

    /// Decodes a top-level value from the front of `data`.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        Self::unmarshal(&mut cursor, &Context::root())
    }
}

pub(crate) fn read_exact(r: &mut dyn Read, buf: &mut [u8], what: &'static str) -> Result<()> {
    r.read_exact(buf).map_err(|e| Error::from_io(e, what))
}

/// Reads the length prefix of a sequence of `kind`.
pub(crate) fn read_size(r: &mut dyn Read, kind: Kind, what: &'static str) -> Result<usize> {
    match kind {
        Kind::List => {
            let mut buf = [0u8; 4];
            read_exact(r, &mut buf, what)?;
            Ok(u32::from_be_bytes(buf) as usize)
        }
        _ => {
            let mut buf = [0u8; 2];
            read_exact(r, &mut buf, what)?;
            Ok(u16::from_be_bytes(buf) as usize)
        }
    }
}

macro_rules! impl_unmarshal_int {
    ($($ty:ty),* $(,)?) => {$(
        impl Unmarshal for $ty {
            fn unmarshal(r: &mut dyn Read, _ctx: &Context) -> Result<Self> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                read_exact(r, &mut buf, stringify!($ty))?;
                Ok(<$ty>::from_be_bytes(buf))
            }
        }
    )*};
}

impl_unmarshal_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Unmarshal for bool {
    fn unmarshal(r: &mut dyn Read, _ctx: &Context) -> Result<Self> {
        let mut buf = [0u8; 1];
        read_exact(r, &mut buf, "bool")?;
        Ok(buf[0] != 0)
    }
}

impl<T: Unmarshal> Unmarshal for Vec<T> {
    fn unmarshal(r: &mut dyn Read, ctx: &Context) -> Result<Self> {
        let name = type_name::<Self>();
        if ctx.options().raw {
            return Err(Error::UnsizedRaw { ty: name });
        }

        let len = read_size(r, Self::KIND, name)?;
        let elem_ctx = ctx.list_element(name)?;
        let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for i in 0..len {
            let elem = T::unmarshal(r, &elem_ctx).map_err(|e| e.at_index(Op::Unmarshal, name, i))?;
            out.push(elem);
        }
        Ok(out)
    }

    fn unmarshal_into(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()> {
        if !ctx.options().raw {
            *self = Self::unmarshal(r, ctx)?;
            return Ok(());
        }

        let name = type_name::<Self>();
        if self.is_empty() && ctx.is_allocated() {
            return Err(Error::UnsizedRaw { ty: name });
        }
        let elem_ctx = ctx.list_element(name)?;
        for (i, elem) in self.iter_mut().enumerate() {
            elem.unmarshal_into(r, &elem_ctx)
                .map_err(|e| e.at_index(Op::Unmarshal, name, i))?;
        }
        Ok(())
    }
}

impl Unmarshal for RawBytes {
    fn unmarshal(_r: &mut dyn Read, _ctx: &Context) -> Result<Self> {
        Err(Error::UnsizedRaw { ty: "RawBytes" })
    }

    fn unmarshal_into(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()> {
        if self.0.is_empty() && ctx.is_allocated() {
            return Err(Error::UnsizedRaw { ty: "RawBytes" });
        }
        read_exact(r, &mut self.0, "RawBytes")
    }
}

/// Runs `decode` over the value behind a pointer.
///
/// A `sized` struct-shaped pointee is preceded by its 16-bit length. A zero
/// length means the pointee is absent: `decode` is not called and `false` is
/// returned. Otherwise `decode` reads from a sub-stream bounded to that
/// length, and any bytes it leaves unread are skipped.
fn decode_pointee<T, F>(r: &mut dyn Read, ctx: &Context, decode: F) -> Result<bool>
where
    T: Marshal,
    F: FnOnce(&mut dyn Read, &Context) -> Result<()>,
{
    let ty = type_name::<T>();
    let pointee_ctx = ctx.pointee(ty)?;
    if !(ctx.options().sized && T::KIND.is_struct()) {
        decode(r, &pointee_ctx)?;
        return Ok(true);
    }

    let mut size = [0u8; 2];
    read_exact(r, &mut size, "size of sized struct")?;
    let size = u16::from_be_bytes(size);
    if size == 0 {
        return Ok(false);
    }

    let mut sub = (&mut *r).take(u64::from(size));
    decode(&mut sub, &pointee_ctx)?;

    let skipped = io::copy(&mut sub, &mut io::sink()).map_err(|e| Error::from_io(e, ty))?;
    if sub.limit() > 0 {
        return Err(Error::Truncated { what: ty });
    }
    if skipped > 0 {
        debug!(ty, size, skipped, "skipped unread bytes of sized struct");
    }
    Ok(true)
}

impl<T: Unmarshal + Default> Unmarshal for Option<T> {
    fn unmarshal(r: &mut dyn Read, ctx: &Context) -> Result<Self> {
        if T::KIND == Kind::Custom {
            return T::unmarshal(r, ctx).map(Some);
        }

        let mut out = None;
        decode_pointee::<T, _>(r, ctx, |r, ctx| {
            out = Some(T::unmarshal(r, ctx)?);
            Ok(())
        })?;
        Ok(out)
    }

    fn unmarshal_into(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()> {
        if T::KIND == Kind::Custom {
            return match self {
                Some(v) => v.unmarshal_into(r, ctx),
                None => {
                    *self = Some(T::unmarshal(r, ctx)?);
                    Ok(())
                }
            };
        }

        decode_pointee::<T, _>(r, ctx, |r, ctx| match self {
            Some(v) => v.unmarshal_into(r, ctx),
            None => {
                *self = Some(T::unmarshal(r, ctx)?);
                Ok(())
            }
        })?;
        Ok(())
    }
}

/// An absent sized pointee decodes to the default value, as a box cannot be
/// empty.
impl<T: Unmarshal + Default> Unmarshal for Box<T> {
    fn unmarshal(r: &mut dyn Read, ctx: &Context) -> Result<Self> {
        if T::KIND == Kind::Custom {
            return T::unmarshal(r, ctx).map(Box::new);
        }

        let mut out = None;
        decode_pointee::<T, _>(r, ctx, |r, ctx| {
            out = Some(T::unmarshal(r, ctx)?);
            Ok(())
        })?;
        Ok(Box::new(out.unwrap_or_default()))
    }

    fn unmarshal_into(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()> {
        if T::KIND == Kind::Custom {
            return (**self).unmarshal_into(r, ctx);
        }

        decode_pointee::<T, _>(r, ctx, |r, ctx| (**self).unmarshal_into(r, ctx))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::kind::FieldOptions;

    fn raw_field() -> Context {
        Context::root()
            .struct_field("Outer", None, FieldOptions::NONE.with_raw())
            .unwrap()
    }

    #[rstest(input, expected,
        case(vec![0x12, 0x34], 0x1234),
        case(vec![0xff, 0xff, 0x00], 0xffff),
    )]
    fn test_unmarshal_u16(input: Vec<u8>, expected: u16) {
        assert_eq!(expected, u16::from_bytes(&input).unwrap());
    }

    #[rstest(input, expected,
        case(vec![0x00], false),
        case(vec![0x01], true),
        case(vec![0x02], true),
    )]
    fn test_unmarshal_bool(input: Vec<u8>, expected: bool) {
        assert_eq!(expected, bool::from_bytes(&input).unwrap());
    }

    #[rstest(input, expected,
        case(vec![0x00, 0x00], vec![]),
        case(vec![0x00, 0x02, 0xaa, 0xbb], vec![0xaa, 0xbb]),
        case(vec![0x00, 0x01, 0xaa, 0xbb], vec![0xaa]),
    )]
    fn test_unmarshal_sized_byte_buffer(input: Vec<u8>, expected: Vec<u8>) {
        assert_eq!(expected, Vec::<u8>::from_bytes(&input).unwrap());
    }

    #[test]
    fn test_unmarshal_list() {
        let input = [0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2];
        assert_eq!(vec![1u32, 2], Vec::<u32>::from_bytes(&input).unwrap());
    }

    #[rstest(input, what,
        case(vec![0x12], "u16"),
        case(vec![], "u16"),
    )]
    fn test_unmarshal_truncated_primitive(input: Vec<u8>, what: &'static str) {
        let err = u16::from_bytes(&input).unwrap_err();
        assert!(matches!(err, Error::Truncated { what: w } if w == what));
    }

    #[rstest(input,
        case(vec![0x00, 0x03, 0xaa, 0xbb]),
        case(vec![0x00]),
    )]
    fn test_unmarshal_truncated_sized_byte_buffer(input: Vec<u8>) {
        let err = Vec::<u8>::from_bytes(&input).unwrap_err();
        assert!(matches!(err.root(), Error::Truncated { .. }));
    }

    #[test]
    fn test_unmarshal_truncated_list() {
        let err = Vec::<u32>::from_bytes(&[0, 0, 0, 2, 0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, Error::Element { index: 1, .. }));
        assert!(matches!(err.root(), Error::Truncated { what: "u32" }));
    }

    #[test]
    fn test_unmarshal_huge_list_prefix_is_truncated() {
        let err = Vec::<u16>::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err.root(), Error::Truncated { .. }));
    }

    #[test]
    fn test_unmarshal_raw_requires_destination() {
        let mut input: &[u8] = &[1, 2, 3];
        let err = Vec::<u8>::unmarshal(&mut input, &raw_field()).unwrap_err();
        assert!(matches!(err, Error::UnsizedRaw { .. }));

        let err = RawBytes::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::UnsizedRaw { ty: "RawBytes" }));
    }

    #[test]
    fn test_unmarshal_into_raw_keeps_length() {
        let mut input: &[u8] = &[1, 2, 3, 0, 4, 9];
        let mut bytes = vec![0u8; 3];
        let mut words = vec![0u16; 1];
        let mut raw = RawBytes::with_len(1);
        bytes.unmarshal_into(&mut input, &raw_field()).unwrap();
        words.unmarshal_into(&mut input, &raw_field()).unwrap();
        raw.unmarshal_into(&mut input, &Context::root()).unwrap();

        assert_eq!(vec![1, 2, 3], bytes);
        assert_eq!(vec![4], words);
        assert_eq!(RawBytes(vec![9]), raw);
        assert!(input.is_empty());
    }

    #[test]
    fn test_unmarshal_into_raw_allocated_destination() {
        let allocated = raw_field().allocating();
        let mut input: &[u8] = &[1, 2];

        let err = Vec::<u8>::new()
            .unmarshal_into(&mut input, &allocated)
            .unwrap_err();
        assert!(matches!(err, Error::UnsizedRaw { .. }));
        let err = RawBytes::default()
            .unmarshal_into(&mut input, &allocated)
            .unwrap_err();
        assert!(matches!(err, Error::UnsizedRaw { ty: "RawBytes" }));

        let mut sized = RawBytes::with_len(2);
        sized.unmarshal_into(&mut input, &allocated).unwrap();
        assert_eq!(RawBytes(vec![1, 2]), sized);
    }

    #[test]
    fn test_unmarshal_into_sized_reallocates() {
        let mut value = vec![0u8; 8];
        let mut input: &[u8] = &[0x00, 0x01, 0x07];
        value.unmarshal_into(&mut input, &Context::root()).unwrap();
        assert_eq!(vec![0x07], value);
    }

    #[test]
    fn test_unmarshal_pointer() {
        assert_eq!(Some(0x0102u16), Option::<u16>::from_bytes(&[1, 2]).unwrap());

        let mut value: Option<u16> = None;
        let mut input: &[u8] = &[0, 9];
        value.unmarshal_into(&mut input, &Context::root()).unwrap();
        assert_eq!(Some(9), value);

        assert_eq!(Box::new(3u32), Box::<u32>::from_bytes(&[0, 0, 0, 3]).unwrap());
    }
}
