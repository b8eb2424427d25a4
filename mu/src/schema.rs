//! Struct schemas.
//!
//! [`mu_struct!`](crate::mu_struct) declares a struct together with its
//! field table and codec implementation. Field options are given with a
//! `#[mu(...)]` attribute:
//!
//! ```
//! mu::mu_struct! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Pair {
//!         pub first: u16,
//!         #[mu(raw)]
//!         pub second: Vec<u8>,
//!     }
//! }
//!
//! let pair = Pair { first: 1, second: vec![2, 3] };
//! assert_eq!(vec![0, 1, 2, 3], mu::Marshal::to_bytes(&pair).unwrap());
//! ```
//!
//! The accepted options are `selector = field`, `sized` and `raw`, separated
//! by commas. Declared structs must implement `Default`, which is the
//! starting point of an allocating decode. A `raw` field left empty by
//! `Default` cannot be decoded that way, since nothing on the wire gives its
//! length; decode into a value whose raw fields are already sized instead.

use std::io::{Read, Write};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::kind::Kind;
use crate::marshal::{write_all, write_size};

/// Field-level codec of a declared struct.
#[doc(hidden)]
pub trait Record {
    /// Selector value of the field `name`, if it exists and can select.
    fn selector(&self, name: &str) -> Option<u32>;

    fn marshal_fields(&self, w: &mut dyn Write, ctx: &Context) -> Result<()>;

    fn unmarshal_fields(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()>;
}

fn check_sized(ty: &'static str, ctx: &Context) -> Result<()> {
    if !ctx.arrived_from_pointer() {
        return Err(Error::SizedNotPointer {
            ty,
            container: ctx.container().name(),
        });
    }
    Ok(())
}

#[doc(hidden)]
pub fn marshal_struct<T: Record>(
    value: &T,
    ty: &'static str,
    w: &mut dyn Write,
    ctx: &Context,
) -> Result<()> {
    if !ctx.options().sized {
        return value.marshal_fields(w, ctx);
    }

    check_sized(ty, ctx)?;
    let mut scratch = Vec::new();
    value.marshal_fields(&mut scratch, ctx)?;
    write_size(w, Kind::Struct, scratch.len(), ty)?;
    write_all(w, &scratch, ty)
}

/// The length prefix of a sized struct has already been consumed by the
/// pointer that leads here.
#[doc(hidden)]
pub fn unmarshal_struct<T: Record>(
    value: &mut T,
    ty: &'static str,
    r: &mut dyn Read,
    ctx: &Context,
) -> Result<()> {
    if ctx.options().sized {
        check_sized(ty, ctx)?;
    }
    value.unmarshal_fields(r, ctx)
}

/// Builds the [`FieldOptions`](crate::FieldOptions) of a `#[mu(...)]`
/// attribute.
#[doc(hidden)]
#[macro_export]
macro_rules! field_options {
    (@munch $acc:expr;) => { $acc };
    (@munch $acc:expr; sized $(, $($rest:tt)*)?) => {
        $crate::field_options!(@munch $acc.with_sized(); $($($rest)*)?)
    };
    (@munch $acc:expr; raw $(, $($rest:tt)*)?) => {
        $crate::field_options!(@munch $acc.with_raw(); $($($rest)*)?)
    };
    (@munch $acc:expr; selector = $sel:ident $(, $($rest:tt)*)?) => {
        $crate::field_options!(@munch $acc.with_selector(stringify!($sel)); $($($rest)*)?)
    };
    () => { $crate::FieldOptions::NONE };
    ($($opt:tt)+) => { $crate::field_options!(@munch $crate::FieldOptions::NONE; $($opt)+) };
}

/// Declares a struct encoded field by field in declaration order.
///
/// See the [module documentation](crate::schema) for the option syntax.
#[macro_export]
macro_rules! mu_struct {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[doc = $doc:expr])*
                $(#[mu($($opt:tt)*)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $(
                $(#[doc = $doc])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::schema::Record for $name {
            #[allow(unused_variables)]
            fn selector(&self, name: &str) -> ::std::option::Option<u32> {
                $(
                    if name == stringify!($field) {
                        return $crate::Marshal::selector_value(&self.$field);
                    }
                )*
                None
            }

            #[allow(unused_variables)]
            fn marshal_fields(
                &self,
                w: &mut dyn ::std::io::Write,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $(
                    {
                        const OPTIONS: $crate::FieldOptions =
                            $crate::field_options!($($($opt)*)?);
                        let selector = OPTIONS
                            .selector
                            .and_then(|s| $crate::schema::Record::selector(self, s));
                        let field_ctx = ctx.struct_field(stringify!($name), selector, OPTIONS)?;
                        $crate::Marshal::marshal(&self.$field, w, &field_ctx).map_err(|e| {
                            e.in_field($crate::Op::Marshal, stringify!($name), stringify!($field))
                        })?;
                    }
                )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn unmarshal_fields(
                &mut self,
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $(
                    {
                        const OPTIONS: $crate::FieldOptions =
                            $crate::field_options!($($($opt)*)?);
                        let selector = OPTIONS
                            .selector
                            .and_then(|s| $crate::schema::Record::selector(&*self, s));
                        let field_ctx = ctx.struct_field(stringify!($name), selector, OPTIONS)?;
                        $crate::Unmarshal::unmarshal_into(&mut self.$field, r, &field_ctx)
                            .map_err(|e| {
                                e.in_field(
                                    $crate::Op::Unmarshal,
                                    stringify!($name),
                                    stringify!($field),
                                )
                            })?;
                    }
                )*
                Ok(())
            }
        }

        impl $crate::Marshal for $name {
            const KIND: $crate::Kind = $crate::Kind::Struct;
            const FIELDS: &'static [$crate::FieldDescriptor] = &[
                $(
                    $crate::FieldDescriptor {
                        name: stringify!($field),
                        options: $crate::field_options!($($($opt)*)?),
                    },
                )*
            ];

            fn marshal(
                &self,
                w: &mut dyn ::std::io::Write,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::schema::marshal_struct(self, stringify!($name), w, ctx)
            }
        }

        impl $crate::Unmarshal for $name {
            fn unmarshal(
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<Self> {
                let mut value = <Self as ::std::default::Default>::default();
                $crate::Unmarshal::unmarshal_into(&mut value, r, &ctx.allocating())?;
                Ok(value)
            }

            fn unmarshal_into(
                &mut self,
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::schema::unmarshal_struct(self, stringify!($name), r, ctx)
            }
        }
    };
}

/// Declares integer newtypes that encode exactly like the wrapped integer.
#[macro_export]
macro_rules! mu_primitive {
    ($(
        $(#[$attr:meta])*
        $vis:vis struct $name:ident($fvis:vis $inner:ty);
    )+) => {$(
        $(#[$attr])*
        $vis struct $name($fvis $inner);

        impl $crate::Marshal for $name {
            const KIND: $crate::Kind = $crate::Kind::Primitive;
            const OCTET: bool = <$inner as $crate::Marshal>::OCTET;

            fn marshal(
                &self,
                w: &mut dyn ::std::io::Write,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::Marshal::marshal(&self.0, w, ctx)
            }

            fn selector_value(&self) -> ::std::option::Option<u32> {
                $crate::Marshal::selector_value(&self.0)
            }
        }

        impl $crate::Unmarshal for $name {
            fn unmarshal(
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<Self> {
                <$inner as $crate::Unmarshal>::unmarshal(r, ctx).map($name)
            }
        }
    )+};
}
