//! Error types for marshalling and unmarshalling.

use std::fmt::{self, Display};
use std::io;

use thiserror::Error;

/// Direction of the codec operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Marshal,
    Unmarshal,
}

impl Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Marshal => write!(f, "marshal"),
            Op::Unmarshal => write!(f, "unmarshal"),
        }
    }
}

/// Errors that can occur while marshalling or unmarshalling a value.
///
/// Leaf variants describe the fault itself. `Field`, `Element` and `Value`
/// wrap a fault with the location it happened at; [`Error::root`] strips
/// those layers again.
#[derive(Debug, Error)]
pub enum Error {
    // Input errors
    #[error("truncated input while reading {what}")]
    Truncated { what: &'static str },
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    #[error("{what}: length {len} does not fit in a {max}-byte size field")]
    TooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    // Union errors
    #[error("invalid selector value {value:#x} for union {ty}")]
    InvalidSelector { ty: &'static str, value: u32 },
    #[error("union {ty} is not inside a container")]
    NoContainer { ty: &'static str },
    #[error("union {ty} is not inside a valid union container ({container})")]
    InvalidContainer {
        ty: &'static str,
        container: &'static str,
    },
    #[error("no selector member defined in container {container} for union {ty}")]
    NoSelector {
        ty: &'static str,
        container: &'static str,
    },
    #[error("invalid selector member name {field} in container {container}")]
    InvalidSelectorField {
        container: &'static str,
        field: &'static str,
    },
    #[error("union {ty} holds variant {actual} but the selector picks {expected}")]
    VariantMismatch {
        ty: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    // Framing errors
    #[error("sized struct {ty} inside container type {container} is not referenced via a pointer")]
    SizedNotPointer {
        ty: &'static str,
        container: &'static str,
    },
    #[error("{ty} cannot be both sized and a union")]
    SizedUnion { ty: &'static str },
    #[error("raw buffer {ty} must be pre-sized by the caller")]
    UnsizedRaw { ty: &'static str },
    #[error("cannot marshal nil pointer type {ty} with custom marshaller")]
    NilCustom { ty: &'static str },
    #[error("nesting depth limit of {limit} exceeded at {ty}")]
    DepthExceeded { ty: &'static str, limit: usize },

    // Value errors
    #[error("invalid {ty} value: {reason}")]
    InvalidValue { ty: &'static str, reason: String },

    // Context
    #[error("cannot {op} type {ty} with custom marshaller: {source}")]
    Custom {
        op: Op,
        ty: &'static str,
        #[source]
        source: Box<Error>,
    },
    #[error("cannot {op} field {field} of {ty}: {source}")]
    Field {
        op: Op,
        ty: &'static str,
        field: &'static str,
        #[source]
        source: Box<Error>,
    },
    #[error("cannot {op} element {index} of {ty}: {source}")]
    Element {
        op: Op,
        ty: &'static str,
        index: usize,
        #[source]
        source: Box<Error>,
    },
    #[error("cannot {op} value {index}: {source}")]
    Value {
        op: Op,
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Maps an I/O failure, turning an early end of input into [`Error::Truncated`].
    pub fn from_io(err: io::Error, what: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated { what },
            _ => Error::Io(err),
        }
    }

    /// Returns the fault at the bottom of the context chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        loop {
            match err {
                Error::Custom { source, .. }
                | Error::Field { source, .. }
                | Error::Element { source, .. }
                | Error::Value { source, .. } => err = source,
                _ => return err,
            }
        }
    }

    #[doc(hidden)]
    pub fn custom(op: Op, ty: &'static str, source: Error) -> Self {
        Error::Custom {
            op,
            ty,
            source: Box::new(source),
        }
    }

    #[doc(hidden)]
    pub fn in_field(self, op: Op, ty: &'static str, field: &'static str) -> Self {
        Error::Field {
            op,
            ty,
            field,
            source: Box::new(self),
        }
    }

    #[doc(hidden)]
    pub fn at_index(self, op: Op, ty: &'static str, index: usize) -> Self {
        Error::Element {
            op,
            ty,
            index,
            source: Box::new(self),
        }
    }

    #[doc(hidden)]
    pub fn in_value(self, op: Op, index: usize) -> Self {
        Error::Value {
            op,
            index,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
