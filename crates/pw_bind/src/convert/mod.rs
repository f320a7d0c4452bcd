//! Conversion of raw values to the types required by properties.
//!
//! ## Menu
//!
//! - [`Converter`]: a strategy turning text or values into a required type.
//! - [`CustomConverters`]: per-accessor registrations scoped by type and path.
//! - [`DefaultConverters`]: the default table shared by every accessor of an engine.
//! - [`ConversionService`] / [`GenericConversionService`]: a general conversion facility.
//! - [`TypeConverter`]: the cascade combining all of the above with the standard rules.
//! - [`SimpleTypeConverter`]: standalone conversion without an object graph.
//! - [`convert_number`] / [`parse_number`]: checked numeric conversion.

// -----------------------------------------------------------------------------
// Modules

pub mod builtin;

mod cascade;
mod convention;
mod converter;
mod defaults;
mod number;
mod registry;
mod service;
mod simple;

// -----------------------------------------------------------------------------
// Exports

pub use cascade::TypeConverter;
pub use convention::ConventionConverter;
pub use converter::{ConvertFailure, Converter, text_converter};
pub use defaults::DefaultConverters;
pub use number::{convert_number, parse_number};
pub use registry::CustomConverters;
pub use service::{ConversionService, GenericConversionService};
pub use simple::SimpleTypeConverter;
