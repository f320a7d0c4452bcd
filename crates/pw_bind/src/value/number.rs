use core::fmt;

use crate::info::NumberKind;

/// A primitive number tagged with its exact kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Number {
    pub const fn kind(self) -> NumberKind {
        match self {
            Number::I8(_) => NumberKind::I8,
            Number::I16(_) => NumberKind::I16,
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::U8(_) => NumberKind::U8,
            Number::U16(_) => NumberKind::U16,
            Number::U32(_) => NumberKind::U32,
            Number::U64(_) => NumberKind::U64,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
        }
    }

    pub const fn zero(kind: NumberKind) -> Number {
        match kind {
            NumberKind::I8 => Number::I8(0),
            NumberKind::I16 => Number::I16(0),
            NumberKind::I32 => Number::I32(0),
            NumberKind::I64 => Number::I64(0),
            NumberKind::U8 => Number::U8(0),
            NumberKind::U16 => Number::U16(0),
            NumberKind::U32 => Number::U32(0),
            NumberKind::U64 => Number::U64(0),
            NumberKind::F32 => Number::F32(0.0),
            NumberKind::F64 => Number::F64(0.0),
        }
    }

    /// The exact integer value, `None` for floats.
    pub const fn to_i128(self) -> Option<i128> {
        match self {
            Number::I8(v) => Some(v as i128),
            Number::I16(v) => Some(v as i128),
            Number::I32(v) => Some(v as i128),
            Number::I64(v) => Some(v as i128),
            Number::U8(v) => Some(v as i128),
            Number::U16(v) => Some(v as i128),
            Number::U32(v) => Some(v as i128),
            Number::U64(v) => Some(v as i128),
            Number::F32(_) | Number::F64(_) => None,
        }
    }

    pub const fn to_f64(self) -> f64 {
        match self {
            Number::I8(v) => v as f64,
            Number::I16(v) => v as f64,
            Number::I32(v) => v as f64,
            Number::I64(v) => v as f64,
            Number::U8(v) => v as f64,
            Number::U16(v) => v as f64,
            Number::U32(v) => v as f64,
            Number::U64(v) => v as f64,
            Number::F32(v) => v as f64,
            Number::F64(v) => v,
        }
    }

    /// Builds a number of `kind` from an integer already known to be in range.
    pub(crate) fn from_i128_unchecked(value: i128, kind: NumberKind) -> Number {
        match kind {
            NumberKind::I8 => Number::I8(value as i8),
            NumberKind::I16 => Number::I16(value as i16),
            NumberKind::I32 => Number::I32(value as i32),
            NumberKind::I64 => Number::I64(value as i64),
            NumberKind::U8 => Number::U8(value as u8),
            NumberKind::U16 => Number::U16(value as u16),
            NumberKind::U32 => Number::U32(value as u32),
            NumberKind::U64 => Number::U64(value as u64),
            NumberKind::F32 => Number::F32(value as f32),
            NumberKind::F64 => Number::F64(value as f64),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(v) => fmt::Display::fmt(v, f),
            Number::I16(v) => fmt::Display::fmt(v, f),
            Number::I32(v) => fmt::Display::fmt(v, f),
            Number::I64(v) => fmt::Display::fmt(v, f),
            Number::U8(v) => fmt::Display::fmt(v, f),
            Number::U16(v) => fmt::Display::fmt(v, f),
            Number::U32(v) => fmt::Display::fmt(v, f),
            Number::U64(v) => fmt::Display::fmt(v, f),
            Number::F32(v) => fmt::Display::fmt(v, f),
            Number::F64(v) => fmt::Display::fmt(v, f),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                #[inline]
                fn from(value: $ty) -> Self {
                    Number::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}
