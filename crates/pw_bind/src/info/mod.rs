//! Runtime type information for dynamic object graphs.
//!
//! Without compile-time knowledge of the object shape, every class, enum and
//! property type is described at runtime. Holders are [`Object`]s whose layout is
//! given by a [`ClassInfo`]; all declared and required types are [`Type`]s.
//!
//! ## Menu
//!
//! - [`Type`]: type descriptor, with assignability and instance checks.
//! - [`ClassInfo`] / [`ClassBuilder`]: fields, accessor-pair properties, generics, construction.
//! - [`EnumInfo`]: enumeration constants.
//!
//! [`Object`]: crate::value::Object

use core::sync::atomic::{AtomicU64, Ordering};

// -----------------------------------------------------------------------------
// Modules

mod class;
mod enum_info;
mod ty;

// -----------------------------------------------------------------------------
// Exports

pub use class::{ClassBuilder, ClassId, ClassInfo, Exposure, FieldInfo, PropertyDef};
pub use class::{Getter, Initializer, Setter, TextConstructor};
pub use enum_info::EnumInfo;
pub use ty::{ListShape, MapShape, NumberKind, SetShape, Type};

/// Identity source shared by classes and enums.
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
pub(crate) fn next_type_id() -> u64 {
    NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)
}
