//! Tokenize property paths such as `a.b[2].c` or `map['key']`.
//!
//! A [`PropertyPath`] is an ordered list of [`Segment`]s plus the canonical
//! string form, which is used as the cache key for nested accessors and as
//! the lookup key for path-scoped converters.
//!
//! ## Menu
//!
//! - [`PropertyPath`]: a parsed path and its canonical form.
//! - [`Segment`]: one property name with its index/key list.
//! - [`stripped_paths`]: path variants with keys removed, for converter lookup.
//! - [`matches_property`]: whether a registered path targets a collection path.

// -----------------------------------------------------------------------------
// Modules

mod segment;
mod utils;

// -----------------------------------------------------------------------------
// Exports

pub use segment::{PropertyPath, Segment, join_canonical};
pub use utils::{matches_property, stripped_paths};
