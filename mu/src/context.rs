//! Traversal context.
//!
//! A [`Context`] is built fresh for every step of the recursion and passed
//! down by reference. It records the enclosing container (where a union
//! looks up its selector), the options of the field being encoded, the kind
//! of the value the current one was reached through, and the nesting depth.
//! It also records whether the destination being decoded into was freshly
//! allocated by the engine rather than supplied by the caller.

use crate::error::{Error, Result};
use crate::kind::{FieldOptions, Kind};

/// Maximum number of nested descents before traversal is aborted.
pub const MAX_DEPTH: usize = 64;

/// The value enclosing the one currently being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Top-level value.
    None,
    /// Field of a struct. `selector` holds the value of the sibling field
    /// named by the field's selector option, if that field exists and can
    /// act as a selector.
    Struct {
        name: &'static str,
        selector: Option<u32>,
    },
    /// Element of a list.
    List { name: &'static str },
    /// Payload of a union.
    Union { name: &'static str },
}

impl Container {
    pub fn name(&self) -> &'static str {
        match self {
            Container::None => "<none>",
            Container::Struct { name, .. }
            | Container::List { name }
            | Container::Union { name } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    depth: usize,
    container: Container,
    parent: Option<Kind>,
    options: FieldOptions,
    allocated: bool,
}

impl Default for Context {
    fn default() -> Self {
        Context::root()
    }
}

impl Context {
    /// Context of a value handed directly to an entry point.
    pub const fn root() -> Self {
        Context {
            depth: 0,
            container: Container::None,
            parent: None,
            options: FieldOptions::NONE,
            allocated: false,
        }
    }

    /// The same context, marking the destination as freshly allocated.
    /// Descents inherit the mark.
    pub fn allocating(&self) -> Context {
        Context {
            allocated: true,
            ..*self
        }
    }

    /// Context of a field of the struct `name`.
    pub fn struct_field(
        &self,
        name: &'static str,
        selector: Option<u32>,
        options: FieldOptions,
    ) -> Result<Context> {
        Ok(Context {
            depth: self.descend(name)?,
            container: Container::Struct { name, selector },
            parent: Some(Kind::Struct),
            options,
            allocated: self.allocated,
        })
    }

    /// Context of the payload of the union `name`.
    pub fn union_payload(&self, name: &'static str) -> Result<Context> {
        Ok(Context {
            depth: self.descend(name)?,
            container: Container::Union { name },
            parent: Some(Kind::Union),
            options: FieldOptions::NONE,
            allocated: self.allocated,
        })
    }

    /// Context of an element of the list `name`.
    pub fn list_element(&self, name: &'static str) -> Result<Context> {
        Ok(Context {
            depth: self.descend(name)?,
            container: Container::List { name },
            parent: Some(Kind::List),
            options: FieldOptions::NONE,
            allocated: self.allocated,
        })
    }

    /// Context of the value behind a pointer. The container and options of
    /// the pointer carry over to the pointee.
    pub fn pointee(&self, ty: &'static str) -> Result<Context> {
        Ok(Context {
            depth: self.descend(ty)?,
            container: self.container,
            parent: Some(Kind::Pointer),
            options: self.options,
            allocated: self.allocated,
        })
    }

    fn descend(&self, ty: &'static str) -> Result<usize> {
        let depth = self.depth + 1;
        if depth > MAX_DEPTH {
            return Err(Error::DepthExceeded {
                ty,
                limit: MAX_DEPTH,
            });
        }
        Ok(depth)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn parent(&self) -> Option<Kind> {
        self.parent
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Whether the destination was allocated by the engine, in which case
    /// raw sequences within it have not been sized by the caller.
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Whether the current value was reached by dereferencing a pointer.
    pub fn arrived_from_pointer(&self) -> bool {
        self.parent == Some(Kind::Pointer)
    }
}
