use alloc::borrow::Cow;
use core::fmt;

use thiserror::Error;

use crate::info::{Getter, Setter, Type};
use crate::value::{Object, Value};

// -----------------------------------------------------------------------------
// AccessMode

/// Which members of a class are exposed as properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Accessor pairs plus fields that are not [`Hidden`](crate::info::Exposure::Hidden).
    #[default]
    Properties,
    /// Every declared field, read and write, accessor pairs ignored.
    Fields,
}

// -----------------------------------------------------------------------------
// PropertyFault

/// Failure reported by a getter or setter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PropertyFault {
    /// The runtime type of the given value is not accepted.
    #[error("value of type `{found}` is not accepted")]
    TypeClash { found: String },

    #[error("{0}")]
    Failed(String),
}

// -----------------------------------------------------------------------------
// PropertyHandle

/// How a [`PropertyHandle`] reaches its value.
#[derive(Clone)]
pub enum HandleKind {
    /// Getter and setter closures declared with [`PropertyDef`](crate::info::PropertyDef).
    AccessorPair {
        getter: Option<Getter>,
        setter: Option<Setter>,
    },
    /// A slot of the holder object.
    Field {
        slot: usize,
        readable: bool,
        writable: bool,
    },
}

/// Read and write capability over one named property of a class.
///
/// The declared type is already resolved against the concrete holder class,
/// so generic parameters of ancestors are replaced by actual type arguments.
#[derive(Clone)]
pub struct PropertyHandle {
    name: Cow<'static, str>,
    ty: Type,
    kind: HandleKind,
}

impl PropertyHandle {
    #[inline]
    pub(crate) fn new(name: Cow<'static, str>, ty: Type, kind: HandleKind) -> Self {
        Self { name, ty, kind }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn declared_type(&self) -> &Type {
        &self.ty
    }

    /// The generic type at nesting `level`: 1 is the declared type, 2 its
    /// element (or map value) type, and so on.
    #[inline]
    pub fn nested_type(&self, level: usize) -> Type {
        self.ty.nested(level)
    }

    /// The key type of the map reached at nesting `level`.
    pub fn map_key_type(&self, level: usize) -> Type {
        self.nested_type(level)
            .map_key()
            .cloned()
            .unwrap_or(Type::Any)
    }

    #[inline]
    pub fn kind(&self) -> &HandleKind {
        &self.kind
    }

    pub fn is_readable(&self) -> bool {
        match &self.kind {
            HandleKind::AccessorPair { getter, .. } => getter.is_some(),
            HandleKind::Field { readable, .. } => *readable,
        }
    }

    pub fn is_writable(&self) -> bool {
        match &self.kind {
            HandleKind::AccessorPair { setter, .. } => setter.is_some(),
            HandleKind::Field { writable, .. } => *writable,
        }
    }

    /// Reads the property from `holder`.
    pub fn get(&self, holder: &Object) -> Result<Value, PropertyFault> {
        match &self.kind {
            HandleKind::AccessorPair {
                getter: Some(getter),
                ..
            } => getter(holder),
            HandleKind::Field {
                slot,
                readable: true,
                ..
            } => holder
                .slot(*slot)
                .ok_or_else(|| PropertyFault::Failed(format!("slot {slot} is out of range"))),
            _ => Err(PropertyFault::Failed("property is not readable".into())),
        }
    }

    /// Writes `value` to `holder`; `value` must already be an instance of the declared type.
    pub fn set(&self, holder: &Object, value: Value) -> Result<(), PropertyFault> {
        if !self.ty.accepts(&value) {
            return Err(PropertyFault::TypeClash {
                found: value.type_name(),
            });
        }
        match &self.kind {
            HandleKind::AccessorPair {
                setter: Some(setter),
                ..
            } => setter(holder, value),
            HandleKind::Field {
                slot,
                writable: true,
                ..
            } => {
                if holder.set_slot(*slot, value) {
                    Ok(())
                } else {
                    Err(PropertyFault::Failed(format!("slot {slot} is out of range")))
                }
            }
            _ => Err(PropertyFault::Failed("property is not writable".into())),
        }
    }
}

impl fmt::Debug for PropertyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            HandleKind::AccessorPair { .. } => "accessor pair",
            HandleKind::Field { .. } => "field",
        };
        f.debug_struct("PropertyHandle")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("kind", &kind)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}
