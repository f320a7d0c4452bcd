//! Dynamic values of an object graph.
//!
//! Scalars are stored inline; objects and containers are shared references
//! and compare by identity, which is what the accessor cache relies on.
//!
//! ## Menu
//!
//! - [`Value`]: any value, including null.
//! - [`Number`]: a number tagged with its [`NumberKind`](crate::info::NumberKind).
//! - [`EnumValue`]: one constant of an [`EnumInfo`].
//! - [`Object`] / [`ObjectRef`]: an instance of a [`ClassInfo`](crate::info::ClassInfo).
//! - [`ArrayRef`], [`ListRef`], [`SetRef`], [`MapRef`]: shared containers.

// -----------------------------------------------------------------------------
// Modules

mod containers;
mod de;
mod number;
mod object;

// -----------------------------------------------------------------------------
// Exports

pub use containers::{ArrayRef, ListRef, MapRef, SetRef};
pub use number::Number;
pub use object::{Object, ObjectRef};

use alloc::sync::Arc;
use core::cmp::Ordering;
use core::fmt;

use crate::info::{EnumInfo, ListShape, MapShape, SetShape, Type};

// -----------------------------------------------------------------------------
// EnumValue

/// A constant of an enumeration.
#[derive(Debug, Clone)]
pub struct EnumValue {
    info: Arc<EnumInfo>,
    index: usize,
}

impl EnumValue {
    /// The constant `name` of `info`.
    pub fn of(info: &Arc<EnumInfo>, name: &str) -> Option<EnumValue> {
        info.value_of(name).map(|index| EnumValue::at(info, index))
    }

    #[inline]
    pub(crate) fn at(info: &Arc<EnumInfo>, index: usize) -> EnumValue {
        EnumValue {
            info: info.clone(),
            index,
        }
    }

    #[inline]
    pub fn info(&self) -> &Arc<EnumInfo> {
        &self.info
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.info.constants()[self.index]
    }
}

impl PartialEq for EnumValue {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.info.id() == other.info.id() && self.index == other.index
    }
}

// -----------------------------------------------------------------------------
// Value

/// A dynamic value.
///
/// Equality compares scalars by value and references by identity.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    Number(Number),
    Str(String),
    Enum(EnumValue),
    Object(ObjectRef),
    Array(ArrayRef),
    List(ListRef),
    Set(SetRef),
    Map(MapRef),
}

impl Value {
    /// A new `Vec`-shaped list.
    #[inline]
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(ListRef::new(ListShape::Vec, items))
    }

    /// A new insertion-ordered set.
    #[inline]
    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(SetRef::new(SetShape::Linked, items))
    }

    /// A new insertion-ordered map.
    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(MapRef::new(MapShape::Linked, entries))
    }

    #[inline]
    pub fn array(elem: Type, items: Vec<Value>) -> Value {
        Value::Array(ArrayRef::new(elem, items))
    }

    /// The constant `name` of `info`, `None` if it has no such constant.
    #[inline]
    pub fn enum_constant(info: &Arc<EnumInfo>, name: &str) -> Option<Value> {
        EnumValue::of(info, name).map(Value::Enum)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Bool, char or number.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Char(_) | Value::Number(_))
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether this is an array of strings.
    pub(crate) fn is_string_array(&self) -> bool {
        matches!(self, Value::Array(a) if *a.elem() == Type::Str)
    }

    /// Elements of an array, list or set.
    pub(crate) fn collection_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(a) => Some(a.items()),
            Value::List(l) => Some(l.items()),
            Value::Set(s) => Some(s.items()),
            _ => None,
        }
    }

    /// Identity for references, equality for scalars.
    #[inline]
    pub fn same_ref(&self, other: &Value) -> bool {
        self == other
    }

    /// Describes the runtime type for messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Char(_) => "char".into(),
            Value::Number(n) => n.kind().name().into(),
            Value::Str(_) => "String".into(),
            Value::Enum(e) => e.info().path().into(),
            Value::Object(o) => o.class().path().into(),
            Value::Array(a) => format!("[{}]", a.elem()),
            Value::List(l) => l.shape().name().into(),
            Value::Set(s) => s.shape().name().into(),
            Value::Map(m) => m.shape().name().into(),
        }
    }

    /// The runtime type; element types of lists, sets and maps are unknown.
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Null => Type::Any,
            Value::Bool(_) => Type::Bool,
            Value::Char(_) => Type::Char,
            Value::Number(n) => Type::Number(n.kind()),
            Value::Str(_) => Type::Str,
            Value::Enum(e) => Type::Enum(e.info().clone()),
            Value::Object(o) => Type::Class(o.class().clone()),
            Value::Array(a) => Type::Array(Box::new(a.elem().clone())),
            Value::List(l) => Type::List(l.shape(), Box::new(Type::Any)),
            Value::Set(s) => Type::Set(s.shape(), Box::new(Type::Any)),
            Value::Map(m) => Type::Map(m.shape(), Box::new(Type::Any), Box::new(Type::Any)),
        }
    }

    /// Total order used by sorted sets and maps.
    ///
    /// Values of different variants order by variant; references order by address.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => match (a.to_i128(), b.to_i128()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a.to_f64().total_cmp(&b.to_f64()),
            },
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => (a.info().id(), a.index()).cmp(&(b.info().id(), b.index())),
            _ => self
                .rank()
                .cmp(&other.rank())
                .then_with(|| self.address().cmp(&other.address())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Char(_) => 2,
            Value::Number(_) => 3,
            Value::Str(_) => 4,
            Value::Enum(_) => 5,
            Value::Object(_) => 6,
            Value::Array(_) => 7,
            Value::List(_) => 8,
            Value::Set(_) => 9,
            Value::Map(_) => 10,
        }
    }

    fn address(&self) -> usize {
        match self {
            Value::Object(o) => o.addr(),
            Value::Array(a) => a.addr(),
            Value::List(l) => l.addr(),
            Value::Set(s) => s.addr(),
            Value::Map(m) => m.addr(),
            _ => 0,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::Char(c) => fmt::Display::fmt(c, f),
            Value::Number(n) => fmt::Display::fmt(n, f),
            Value::Str(s) => f.write_str(s),
            Value::Enum(e) => f.write_str(e.name()),
            Value::Object(o) => fmt::Display::fmt(o, f),
            Value::Array(a) => fmt::Display::fmt(a, f),
            Value::List(l) => fmt::Display::fmt(l, f),
            Value::Set(s) => fmt::Display::fmt(s, f),
            Value::Map(m) => fmt::Display::fmt(m, f),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from {
    ($($ty:ty => $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    let f: fn($ty) -> Value = $body;
                    f(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Value::Bool,
    char => Value::Char,
    i8 => |v| Value::Number(v.into()),
    i16 => |v| Value::Number(v.into()),
    i32 => |v| Value::Number(v.into()),
    i64 => |v| Value::Number(v.into()),
    u8 => |v| Value::Number(v.into()),
    u16 => |v| Value::Number(v.into()),
    u32 => |v| Value::Number(v.into()),
    u64 => |v| Value::Number(v.into()),
    f32 => |v| Value::Number(v.into()),
    f64 => |v| Value::Number(v.into()),
    Number => Value::Number,
    String => Value::Str,
    &str => |v| Value::Str(v.into()),
    EnumValue => Value::Enum,
    ObjectRef => Value::Object,
    ArrayRef => Value::Array,
    ListRef => Value::List,
    SetRef => Value::Set,
    MapRef => Value::Map,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ClassInfo, NumberKind};

    #[test]
    fn scalar_and_identity_equality() {
        assert_eq!(Value::from("a"), Value::from(String::from("a")));
        assert_ne!(Value::from(1_i32), Value::from(1_i64));
        assert_eq!(Value::from(None::<i32>), Value::Null);

        let class = ClassInfo::builder("demo.Item").build();
        let a = class.instantiate().unwrap();
        let b = class.instantiate().unwrap();
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(3_u8).type_name(), "u8");
        assert_eq!(Value::list(Vec::new()).type_name(), "Vec");
        assert_eq!(Value::array(Type::Str, Vec::new()).type_name(), "[String]");
        assert_eq!(
            Value::from(1.5_f32).runtime_type(),
            Type::Number(NumberKind::F32)
        );
    }

    #[test]
    fn numbers_sort_across_kinds() {
        let small = Value::from(2_u8);
        let big = Value::from(10_i64);
        assert_eq!(small.sort_cmp(&big), Ordering::Less);
        assert_eq!(Value::from(2.5_f64).sort_cmp(&Value::from(2_i32)), Ordering::Greater);
    }
}
