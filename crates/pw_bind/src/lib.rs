#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Lets exported macros refer to `pw_bind` from inside the crate and its tests.
extern crate self as pw_bind;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

pub mod access;
pub mod collection;
pub mod convert;
pub mod error;
pub mod info;
pub mod path;
pub mod property;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use access::{Accessor, Engine, apply, batch_apply, resolve};
pub use error::{BindError, ErrorKind};
