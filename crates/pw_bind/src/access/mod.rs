//! Read and write values of an object graph through property paths.
//!
//! An [`Accessor`] wraps a root object. Every nesting boundary crossed by a path
//! creates a nested accessor, cached per canonical segment and rebuilt whenever
//! the value at that segment is replaced by another object.
//!
//! With auto-growing enabled, null intermediates are materialized with the
//! default value of their declared type, and arrays and lists grow up to the
//! collection limit of the [`AccessorConfig`].
//!
//! ## Menu
//!
//! - [`Accessor`]: path resolution, conversion and writes over one root.
//! - [`Engine`]: shared default converters and conversion service.
//! - [`AccessorConfig`]: auto-growing and access mode.
//! - [`PropertyValue`] / [`PropertyValues`]: batch input, loadable from documents.
//! - [`resolve`] / [`apply`] / [`batch_apply`]: one-shot operations.

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod batch;
mod cache;
mod config;
mod engine;

#[cfg(test)]
mod tests;

// -----------------------------------------------------------------------------
// Exports

pub use accessor::Accessor;
pub use batch::{PropertyValue, PropertyValues};
pub use config::AccessorConfig;
pub use engine::Engine;

use crate::error::BindError;
use crate::value::{ObjectRef, Value};

// -----------------------------------------------------------------------------
// One-shot operations

/// Reads the value at `path` of `root`, without auto-growing.
///
/// # Examples
///
/// ```
/// use pw_bind::info::{ClassInfo, Type};
/// use pw_bind::value::Value;
///
/// let class = ClassInfo::builder("demo.Named").field("name", Type::Str).build();
/// let root = class.instantiate().unwrap();
///
/// pw_bind::apply(&root, "name", "Ada").unwrap();
/// assert_eq!(pw_bind::resolve(&root, "name").unwrap(), Value::from("Ada"));
/// ```
#[inline]
pub fn resolve(root: &ObjectRef, path: &str) -> Result<Value, BindError> {
    Accessor::new(root.clone()).resolve(path)
}

/// Converts `raw` to the type at `path` of `root` and writes it, without auto-growing.
#[inline]
pub fn apply(root: &ObjectRef, path: &str, raw: impl Into<Value>) -> Result<(), BindError> {
    Accessor::new(root.clone()).apply(path, raw)
}

/// Writes a batch to `root`, see [`Accessor::set_property_values`].
#[inline]
pub fn batch_apply(
    root: &ObjectRef,
    values: &PropertyValues,
    ignore_unknown: bool,
    ignore_invalid: bool,
) -> Result<(), BindError> {
    Accessor::new(root.clone()).set_property_values(values, ignore_unknown, ignore_invalid)
}
