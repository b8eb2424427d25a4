//! Types with their own wire encoding.

use std::io::{Read, Write};

use crate::error::Result;

/// Hand-written codec for a type whose layout the generic traversal cannot
/// express.
///
/// Register implementors with [`custom_marshaller!`](crate::custom_marshaller).
/// Custom types are encoded the same way wherever they appear: at the top
/// level, behind pointers, in struct fields, list elements and union
/// payloads.
pub trait CustomMarshaller: Sized {
    fn marshal_to(&self, w: &mut dyn Write) -> Result<()>;

    fn unmarshal_from(r: &mut dyn Read) -> Result<Self>;
}

/// Implements [`Marshal`](crate::Marshal) and [`Unmarshal`](crate::Unmarshal)
/// for types implementing [`CustomMarshaller`].
#[macro_export]
macro_rules! custom_marshaller {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Marshal for $ty {
            const KIND: $crate::Kind = $crate::Kind::Custom;

            fn marshal(
                &self,
                w: &mut dyn ::std::io::Write,
                _ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::CustomMarshaller::marshal_to(self, w)
                    .map_err(|e| $crate::Error::custom($crate::Op::Marshal, stringify!($ty), e))
            }
        }

        impl $crate::Unmarshal for $ty {
            fn unmarshal(
                r: &mut dyn ::std::io::Read,
                _ctx: &$crate::Context,
            ) -> $crate::Result<Self> {
                <$ty as $crate::CustomMarshaller>::unmarshal_from(r)
                    .map_err(|e| $crate::Error::custom($crate::Op::Unmarshal, stringify!($ty), e))
            }
        }
    )+};
}
