//! Property handles of runtime classes.
//!
//! A [`PropertyHandle`] is the capability to read and write one named property
//! of a holder. The handles of a class are computed on first use and cached
//! process-wide per [`ClassId`](crate::info::ClassId), see [`handles_for`].
//!
//! ## Menu
//!
//! - [`PropertyHandle`] / [`HandleKind`]: accessor-pair or direct field handle.
//! - [`ClassHandles`]: every handle of one class.
//! - [`AccessMode`]: which members are exposed.
//! - [`forget_class`] / [`clear_handle_cache`]: invalidation.

// -----------------------------------------------------------------------------
// Modules

mod handle;
mod table;

// -----------------------------------------------------------------------------
// Exports

pub use handle::{AccessMode, HandleKind, PropertyFault, PropertyHandle};
pub use table::{ClassHandles, clear_handle_cache, forget_class, handles_for};
