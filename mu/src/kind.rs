//! Type classification.
//!
//! Every codec type carries its [`Kind`] as an associated constant of
//! [`Marshal`], so classification is resolved at compile time. Struct types
//! additionally carry a table of [`FieldDescriptor`]s describing the options
//! attached to each field.

use std::fmt::{self, Display};

use crate::marshal::Marshal;

/// Traversal strategy of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Fixed-width big-endian scalar.
    Primitive,
    /// Nullable or boxed reference to another codec type.
    Pointer,
    /// Record whose fields are encoded in declaration order.
    Struct,
    /// Discriminated union whose variant is chosen by a sibling field.
    Union,
    /// Byte sequence copied verbatim, without a length prefix.
    RawBuffer,
    /// Byte sequence with a 16-bit length prefix.
    SizedByteBuffer,
    /// Sequence of any other element type with a 32-bit length prefix.
    List,
    /// Type with its own marshaller, bypassing generic traversal.
    Custom,
}

impl Kind {
    /// Returns true for the struct-shaped kinds.
    pub const fn is_struct(self) -> bool {
        matches!(self, Kind::Struct | Kind::Union)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Primitive => "primitive",
            Kind::Pointer => "pointer",
            Kind::Struct => "struct",
            Kind::Union => "union",
            Kind::RawBuffer => "raw buffer",
            Kind::SizedByteBuffer => "sized byte buffer",
            Kind::List => "list",
            Kind::Custom => "custom",
        };
        write!(f, "{name}")
    }
}

/// Options attached to a struct field.
///
/// Options apply to the field's value and are inherited through pointers,
/// but never by the fields of a nested struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Name of the sibling field that selects the variant of a union.
    pub selector: Option<&'static str>,
    /// The value is framed with a 16-bit length prefix.
    pub sized: bool,
    /// Lists and buffers are encoded without a length prefix.
    pub raw: bool,
}

impl FieldOptions {
    pub const NONE: FieldOptions = FieldOptions {
        selector: None,
        sized: false,
        raw: false,
    };

    pub const fn with_selector(self, selector: &'static str) -> Self {
        FieldOptions {
            selector: Some(selector),
            ..self
        }
    }

    pub const fn with_sized(self) -> Self {
        FieldOptions {
            sized: true,
            ..self
        }
    }

    pub const fn with_raw(self) -> Self {
        FieldOptions { raw: true, ..self }
    }
}

/// Static description of a single struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub options: FieldOptions,
}

/// Static description of a codec type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub kind: Kind,
    /// Field table, empty for anything but plain structs.
    pub fields: &'static [FieldDescriptor],
}

impl TypeDescriptor {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Returns the traversal strategy of `T`.
pub const fn classify<T: Marshal + ?Sized>() -> Kind {
    T::KIND
}

/// Returns the static description of `T`.
pub fn descriptor<T: Marshal + ?Sized>() -> TypeDescriptor {
    TypeDescriptor {
        name: std::any::type_name::<T>(),
        kind: T::KIND,
        fields: T::FIELDS,
    }
}
