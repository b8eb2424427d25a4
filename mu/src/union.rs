//! Discriminated unions.
//!
//! A union is an enum whose variant is chosen by the value of a sibling
//! field of the enclosing struct, named with `#[mu(selector = field)]`.
//! [`mu_union!`](crate::mu_union) maps selector values to variants:
//!
//! ```
//! mu::mu_union! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum KeyBits {
//!         Aes(u16) = [0x0006u16],
//!         Xor(u16) = [0x000au16],
//!     }
//!     empty Null = [0x0010u16];
//! }
//!
//! mu::mu_struct! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct SymDef {
//!         pub algorithm: u16,
//!         #[mu(selector = algorithm)]
//!         pub key_bits: KeyBits,
//!     }
//! }
//!
//! let def = SymDef { algorithm: 0x0006, key_bits: KeyBits::Aes(128) };
//! assert_eq!(vec![0x00, 0x06, 0x00, 0x80], mu::Marshal::to_bytes(&def).unwrap());
//! ```
//!
//! Selectors listed for the empty variant carry no data: nothing is written
//! or read. A selector listed nowhere is an error.

use std::io::{Read, Write};

use crate::context::{Container, Context};
use crate::error::{Error, Result};

/// Variant resolution and payload codec of a union.
pub trait Union: Sized {
    /// Resolves `selector` to the default value of the selected variant, or
    /// to `None` when the selector carries no data.
    fn select(selector: u32) -> Result<Option<Self>>;

    /// Whether `self` is the empty variant.
    fn is_empty(&self) -> bool;

    fn variant(&self) -> &'static str;

    fn marshal_payload(&self, w: &mut dyn Write, ctx: &Context) -> Result<()>;

    fn unmarshal_payload(&mut self, r: &mut dyn Read, ctx: &Context) -> Result<()>;
}

/// Returns the selector value for the union `ty` from its context.
pub fn resolve_selector(ty: &'static str, ctx: &Context) -> Result<u32> {
    let (container, selector) = match *ctx.container() {
        Container::None => return Err(Error::NoContainer { ty }),
        Container::List { name } => {
            return Err(Error::InvalidContainer {
                ty,
                container: name,
            });
        }
        Container::Struct { name, selector } => (name, selector),
        Container::Union { name } => (name, None),
    };

    let field = ctx
        .options()
        .selector
        .ok_or(Error::NoSelector { ty, container })?;
    selector.ok_or(Error::InvalidSelectorField { container, field })
}

#[doc(hidden)]
pub fn marshal_union<U: Union>(
    value: &U,
    ty: &'static str,
    w: &mut dyn Write,
    ctx: &Context,
) -> Result<()> {
    if ctx.options().sized {
        return Err(Error::SizedUnion { ty });
    }

    let selector = resolve_selector(ty, ctx)?;
    let Some(selected) = U::select(selector)? else {
        return Ok(());
    };
    if value.is_empty() {
        return selected.marshal_payload(w, ctx);
    }
    if value.variant() != selected.variant() {
        return Err(Error::VariantMismatch {
            ty,
            expected: selected.variant(),
            actual: value.variant(),
        });
    }
    value.marshal_payload(w, ctx)
}

/// A selector without data leaves `value` untouched. A value that already
/// holds the selected variant is decoded in place.
#[doc(hidden)]
pub fn unmarshal_union<U: Union>(
    value: &mut U,
    ty: &'static str,
    r: &mut dyn Read,
    ctx: &Context,
) -> Result<()> {
    if ctx.options().sized {
        return Err(Error::SizedUnion { ty });
    }

    let selector = resolve_selector(ty, ctx)?;
    let Some(mut selected) = U::select(selector)? else {
        return Ok(());
    };
    if !value.is_empty() && value.variant() == selected.variant() {
        return value.unmarshal_payload(r, ctx);
    }
    selected.unmarshal_payload(r, &ctx.allocating())?;
    *value = selected;
    Ok(())
}

/// Declares a union enum.
///
/// Each variant lists the selector values that pick it. Selector values are
/// compared through [`Marshal::selector_value`](crate::Marshal::selector_value),
/// so integer newtypes work as well as plain integers. Payload types must
/// implement `Default`. The enum gets a `Default` implementation returning the
/// empty variant.
#[macro_export]
macro_rules! mu_union {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[doc = $doc:expr])*
                $variant:ident($ty:ty) = [$($sel:expr),+ $(,)?]
            ),+ $(,)?
        }
        empty $empty:ident $(= [$($esel:expr),+ $(,)?])?;
    ) => {
        $(#[$attr])*
        $vis enum $name {
            $(
                $(#[doc = $doc])*
                $variant($ty),
            )+
            /// No data.
            $empty,
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                $name::$empty
            }
        }

        impl $crate::union::Union for $name {
            fn select(selector: u32) -> $crate::Result<::std::option::Option<Self>> {
                $(
                    if false $(|| $crate::Marshal::selector_value(&$sel) == Some(selector))+ {
                        return Ok(Some($name::$variant(<$ty as ::std::default::Default>::default())));
                    }
                )+
                $(
                    if false $(|| $crate::Marshal::selector_value(&$esel) == Some(selector))+ {
                        return Ok(None);
                    }
                )?
                Err($crate::Error::InvalidSelector {
                    ty: stringify!($name),
                    value: selector,
                })
            }

            fn is_empty(&self) -> bool {
                matches!(self, $name::$empty)
            }

            fn variant(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => stringify!($variant),)+
                    $name::$empty => stringify!($empty),
                }
            }

            fn marshal_payload(
                &self,
                w: &mut dyn ::std::io::Write,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                let payload_ctx = ctx.union_payload(stringify!($name))?;
                match self {
                    $(
                        $name::$variant(v) => $crate::Marshal::marshal(v, w, &payload_ctx)
                            .map_err(|e| {
                                e.in_field($crate::Op::Marshal, stringify!($name), stringify!($variant))
                            }),
                    )+
                    $name::$empty => Ok(()),
                }
            }

            fn unmarshal_payload(
                &mut self,
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                let payload_ctx = ctx.union_payload(stringify!($name))?;
                match self {
                    $(
                        $name::$variant(v) => $crate::Unmarshal::unmarshal_into(v, r, &payload_ctx)
                            .map_err(|e| {
                                e.in_field($crate::Op::Unmarshal, stringify!($name), stringify!($variant))
                            }),
                    )+
                    $name::$empty => Ok(()),
                }
            }
        }

        impl $crate::Marshal for $name {
            const KIND: $crate::Kind = $crate::Kind::Union;

            fn marshal(
                &self,
                w: &mut dyn ::std::io::Write,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::union::marshal_union(self, stringify!($name), w, ctx)
            }
        }

        impl $crate::Unmarshal for $name {
            fn unmarshal(
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<Self> {
                let mut value = $name::$empty;
                $crate::union::unmarshal_union(
                    &mut value,
                    stringify!($name),
                    r,
                    &ctx.allocating(),
                )?;
                Ok(value)
            }

            fn unmarshal_into(
                &mut self,
                r: &mut dyn ::std::io::Read,
                ctx: &$crate::Context,
            ) -> $crate::Result<()> {
                $crate::union::unmarshal_union(self, stringify!($name), r, ctx)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{Context, Error, Kind, Marshal, Unmarshal};

    crate::mu_primitive! {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct Alg(pub u16);
    }

    impl Alg {
        const AES: Alg = Alg(0x0006);
        const SM4: Alg = Alg(0x0013);
        const XOR: Alg = Alg(0x000a);
        const NULL: Alg = Alg(0x0010);
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct Digested {
            pub hash: Alg,
            pub digest: Vec<u8>,
        }
    }

    crate::mu_union! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Bits {
            /// Key size of a block cipher.
            Sym(u16) = [Alg::AES, Alg::SM4],
            Xor(Alg) = [Alg::XOR],
            Keyed(Digested) = [0x0020u16],
        }
        empty Null = [Alg::NULL];
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct Def {
            pub algorithm: Alg,
            #[mu(selector = algorithm)]
            pub bits: Bits,
            pub trailer: u8,
        }
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct MissingSelector {
            pub algorithm: Alg,
            pub bits: Bits,
        }
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct WrongSelector {
            pub algorithm: Alg,
            #[mu(selector = mode)]
            pub bits: Bits,
        }
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct SizedUnion {
            pub algorithm: Alg,
            #[mu(selector = algorithm, sized)]
            pub bits: Option<Bits>,
        }
    }

    crate::mu_struct! {
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct PointerUnion {
            pub algorithm: Alg,
            #[mu(selector = algorithm)]
            pub bits: Option<Bits>,
        }
    }

    #[rstest(value, expected,
        case(
            Def { algorithm: Alg::AES, bits: Bits::Sym(128), trailer: 0xff },
            vec![0x00, 0x06, 0x00, 0x80, 0xff],
        ),
        case(
            Def { algorithm: Alg::SM4, bits: Bits::Sym(256), trailer: 0xff },
            vec![0x00, 0x13, 0x01, 0x00, 0xff],
        ),
        case(
            Def { algorithm: Alg::XOR, bits: Bits::Xor(Alg(0x000b)), trailer: 0xff },
            vec![0x00, 0x0a, 0x00, 0x0b, 0xff],
        ),
        case(
            Def {
                algorithm: Alg(0x0020),
                bits: Bits::Keyed(Digested { hash: Alg(0x000b), digest: vec![1, 2] }),
                trailer: 0xff,
            },
            vec![0x00, 0x20, 0x00, 0x0b, 0x00, 0x02, 0x01, 0x02, 0xff],
        ),
        case(
            Def { algorithm: Alg::NULL, bits: Bits::Null, trailer: 0xff },
            vec![0x00, 0x10, 0xff],
        ),
    )]
    fn test_union_round_trip(value: Def, expected: Vec<u8>) {
        let bytes = value.to_bytes().unwrap();
        assert_eq!(expected, bytes);
        assert_eq!(value, Def::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_union_kind() {
        assert_eq!(Kind::Union, Bits::KIND);
        assert_eq!(Bits::Null, Bits::default());
    }

    #[test]
    fn test_marshal_empty_value_uses_selected_variant() {
        let value = Def {
            algorithm: Alg::AES,
            bits: Bits::Null,
            trailer: 1,
        };
        assert_eq!(vec![0x00, 0x06, 0x00, 0x00, 0x01], value.to_bytes().unwrap());
    }

    #[test]
    fn test_marshal_variant_mismatch() {
        let value = Def {
            algorithm: Alg::XOR,
            bits: Bits::Sym(128),
            trailer: 0,
        };
        let err = value.to_bytes().unwrap_err();
        assert!(matches!(
            err.root(),
            Error::VariantMismatch {
                ty: "Bits",
                expected: "Xor",
                actual: "Sym"
            }
        ));
    }

    #[test]
    fn test_no_data_leaves_value_untouched() {
        let mut value = Def {
            algorithm: Alg::AES,
            bits: Bits::Sym(128),
            trailer: 0,
        };
        let mut input: &[u8] = &[0x00, 0x10, 0x07];
        value.unmarshal_into(&mut input, &Context::root()).unwrap();
        assert_eq!(Alg::NULL, value.algorithm);
        assert_eq!(Bits::Sym(128), value.bits);
        assert_eq!(7, value.trailer);
    }

    #[test]
    fn test_unmarshal_replaces_other_variant() {
        let mut value = Def {
            algorithm: Alg::AES,
            bits: Bits::Sym(128),
            trailer: 0,
        };
        let mut input: &[u8] = &[0x00, 0x0a, 0x00, 0x0b, 0x00];
        value.unmarshal_into(&mut input, &Context::root()).unwrap();
        assert_eq!(Bits::Xor(Alg(0x000b)), value.bits);
    }

    #[rstest(input,
        case(vec![0x00, 0x99, 0x00]),
        case(vec![0x00, 0x00, 0x00]),
    )]
    fn test_invalid_selector(input: Vec<u8>) {
        let err = Def::from_bytes(&input).unwrap_err();
        assert!(matches!(err, Error::Field { field: "bits", .. }));
        assert!(matches!(err.root(), Error::InvalidSelector { ty: "Bits", .. }));
    }

    #[test]
    fn test_truncated_union_payload() {
        let err = Def::from_bytes(&[0x00, 0x06, 0x00]).unwrap_err();
        assert!(matches!(err.root(), Error::Truncated { what: "u16" }));
    }

    #[test]
    fn test_union_without_container() {
        let err = Bits::Sym(1).to_bytes().unwrap_err();
        assert!(matches!(err, Error::NoContainer { ty: "Bits" }));

        let err = vec![Bits::Sym(1)].to_bytes().unwrap_err();
        assert!(matches!(
            err.root(),
            Error::InvalidContainer { ty: "Bits", .. }
        ));
    }

    #[test]
    fn test_union_without_selector_option() {
        let err = MissingSelector::default().to_bytes().unwrap_err();
        assert!(matches!(
            err.root(),
            Error::NoSelector {
                ty: "Bits",
                container: "MissingSelector"
            }
        ));
    }

    #[test]
    fn test_union_with_unknown_selector_field() {
        let err = WrongSelector::default().to_bytes().unwrap_err();
        assert!(matches!(
            err.root(),
            Error::InvalidSelectorField {
                container: "WrongSelector",
                field: "mode"
            }
        ));
    }

    #[test]
    fn test_sized_union() {
        let value = SizedUnion {
            algorithm: Alg::AES,
            bits: Some(Bits::Sym(128)),
        };
        let err = value.to_bytes().unwrap_err();
        assert!(matches!(err.root(), Error::SizedUnion { ty: "Bits" }));

        // An absent sized pointer is written before the union is reached.
        let value = SizedUnion {
            algorithm: Alg::AES,
            bits: None,
        };
        assert_eq!(vec![0x00, 0x06, 0x00, 0x00], value.to_bytes().unwrap());
    }

    #[test]
    fn test_union_behind_pointer() {
        let value = PointerUnion {
            algorithm: Alg::AES,
            bits: Some(Bits::Sym(128)),
        };
        let bytes = value.to_bytes().unwrap();
        assert_eq!(vec![0x00, 0x06, 0x00, 0x80], bytes);
        assert_eq!(value, PointerUnion::from_bytes(&bytes).unwrap());
    }
}
