//! Re-exports [`fastvec`]'s containers.
//!
//! Path segments and handle tables are short, so they are collected
//! on the stack first and then moved into a boxed slice.

pub use fastvec::{FastVec, fast_vec};
