use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem::discriminant;

use crate::info::{ClassInfo, EnumInfo};
use crate::value::{Number, Value};

// -----------------------------------------------------------------------------
// NumberKind

/// The primitive numeric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumberKind {
    /// All kinds, integers first.
    pub const ALL: [NumberKind; 10] = [
        NumberKind::I8,
        NumberKind::I16,
        NumberKind::I32,
        NumberKind::I64,
        NumberKind::U8,
        NumberKind::U16,
        NumberKind::U32,
        NumberKind::U64,
        NumberKind::F32,
        NumberKind::F64,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }

    /// Inclusive range of an integer kind, `None` for floats.
    pub const fn int_range(self) -> Option<(i128, i128)> {
        match self {
            NumberKind::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            NumberKind::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            NumberKind::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            NumberKind::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            NumberKind::U8 => Some((0, u8::MAX as i128)),
            NumberKind::U16 => Some((0, u16::MAX as i128)),
            NumberKind::U32 => Some((0, u32::MAX as i128)),
            NumberKind::U64 => Some((0, u64::MAX as i128)),
            NumberKind::F32 | NumberKind::F64 => None,
        }
    }
}

impl fmt::Display for NumberKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Shapes

/// Concrete layout of a list. `Abstract` only appears in declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListShape {
    #[default]
    Abstract,
    Vec,
    Linked,
}

/// Concrete layout of a set. `Abstract` only appears in declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SetShape {
    #[default]
    Abstract,
    Hash,
    Linked,
    Sorted,
}

/// Concrete layout of a map. `Abstract` only appears in declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapShape {
    #[default]
    Abstract,
    Hash,
    Linked,
    Sorted,
}

macro_rules! impl_shape {
    ($shape:ident, $concrete:expr, { $($variant:ident => $name:literal),* $(,)? }) => {
        impl $shape {
            /// The shape used when a new instance is created for this declared shape.
            #[inline]
            pub const fn concrete(self) -> Self {
                match self {
                    $shape::Abstract => $concrete,
                    other => other,
                }
            }

            /// Whether a value of shape `other` is an instance of `self`.
            #[inline]
            pub fn accepts(self, other: $shape) -> bool {
                self == $shape::Abstract || self == other
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $($shape::$variant => $name,)*
                }
            }
        }
    };
}

impl_shape!(ListShape, ListShape::Vec, {
    Abstract => "List",
    Vec => "Vec",
    Linked => "LinkedList",
});

impl_shape!(SetShape, SetShape::Linked, {
    Abstract => "Set",
    Hash => "HashSet",
    Linked => "LinkedHashSet",
    Sorted => "SortedSet",
});

impl_shape!(MapShape, MapShape::Linked, {
    Abstract => "Map",
    Hash => "HashMap",
    Linked => "LinkedHashMap",
    Sorted => "SortedMap",
});

// -----------------------------------------------------------------------------
// Type

/// A runtime type descriptor.
///
/// Declared types of properties, required types of conversions and the runtime
/// type of values are all described with this enum. Container types carry their
/// generic element types, which drive element-wise conversion.
///
/// `Bool`, `Char` and `Number` are primitives and never hold null;
/// [`Type::Optional`] is their nullable form.
#[derive(Debug, Clone)]
pub enum Type {
    /// Any value, including null.
    Any,
    Bool,
    Char,
    Str,
    Number(NumberKind),
    /// Nullable wrapper of a primitive type.
    Optional(Box<Type>),
    Enum(Arc<EnumInfo>),
    Class(Arc<ClassInfo>),
    Array(Box<Type>),
    List(ListShape, Box<Type>),
    Set(SetShape, Box<Type>),
    Map(MapShape, Box<Type>, Box<Type>),
    /// A generic type parameter, resolved against the concrete holder class.
    Param(Cow<'static, str>),
    /// The class currently being declared, for recursive structures.
    SelfType,
}

impl Type {
    pub const I8: Type = Type::Number(NumberKind::I8);
    pub const I16: Type = Type::Number(NumberKind::I16);
    pub const I32: Type = Type::Number(NumberKind::I32);
    pub const I64: Type = Type::Number(NumberKind::I64);
    pub const U8: Type = Type::Number(NumberKind::U8);
    pub const U16: Type = Type::Number(NumberKind::U16);
    pub const U32: Type = Type::Number(NumberKind::U32);
    pub const U64: Type = Type::Number(NumberKind::U64);
    pub const F32: Type = Type::Number(NumberKind::F32);
    pub const F64: Type = Type::Number(NumberKind::F64);

    #[inline]
    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    #[inline]
    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    /// An abstract list of `elem`.
    #[inline]
    pub fn list(elem: Type) -> Type {
        Type::List(ListShape::Abstract, Box::new(elem))
    }

    /// An abstract set of `elem`.
    #[inline]
    pub fn set(elem: Type) -> Type {
        Type::Set(SetShape::Abstract, Box::new(elem))
    }

    /// An abstract map from `key` to `value`.
    #[inline]
    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(MapShape::Abstract, Box::new(key), Box::new(value))
    }

    #[inline]
    pub fn class(class: &Arc<ClassInfo>) -> Type {
        Type::Class(class.clone())
    }

    #[inline]
    pub fn enumeration(info: &Arc<EnumInfo>) -> Type {
        Type::Enum(info.clone())
    }

    #[inline]
    pub fn param(name: &'static str) -> Type {
        Type::Param(Cow::Borrowed(name))
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Char | Type::Number(_))
    }

    /// Whether nothing is known about this type.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Any | Type::Param(_) | Type::SelfType)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self.unwrap_optional(), Type::Array(_))
    }

    /// List or set.
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self.unwrap_optional(), Type::List(..) | Type::Set(..))
    }

    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self.unwrap_optional(), Type::Map(..))
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        matches!(self.unwrap_optional(), Type::Enum(_))
    }

    /// Strips one [`Type::Optional`] wrapper.
    #[inline]
    pub fn unwrap_optional(&self) -> &Type {
        match self {
            Type::Optional(inner) => inner,
            other => other,
        }
    }

    /// Element type of arrays and collections, value type of maps.
    pub fn element(&self) -> Option<&Type> {
        match self.unwrap_optional() {
            Type::Array(elem) | Type::List(_, elem) | Type::Set(_, elem) => Some(elem),
            Type::Map(_, _, value) => Some(value),
            _ => None,
        }
    }

    /// Key type of maps.
    pub fn map_key(&self) -> Option<&Type> {
        match self.unwrap_optional() {
            Type::Map(_, key, _) => Some(key),
            _ => None,
        }
    }

    /// The type reached after `level - 1` element steps; level 1 is `self`.
    ///
    /// ```
    /// use pw_bind::info::Type;
    ///
    /// let ty = Type::map(Type::Str, Type::list(Type::I32));
    /// assert_eq!(ty.nested(1), ty);
    /// assert_eq!(ty.nested(2), Type::list(Type::I32));
    /// assert_eq!(ty.nested(3), Type::I32);
    /// assert_eq!(ty.nested(4), Type::Any);
    /// ```
    pub fn nested(&self, level: usize) -> Type {
        let mut current = self;
        for _ in 1..level {
            match current.element() {
                Some(elem) => current = elem,
                None => return Type::Any,
            }
        }
        current.clone()
    }

    /// Replaces the generic element types of lists, sets and maps with
    /// [`Type::Any`]; used as registry key.
    pub fn erased(&self) -> Type {
        match self {
            Type::Param(_) | Type::SelfType => Type::Any,
            Type::Optional(inner) => Type::Optional(Box::new(inner.erased())),
            Type::Array(elem) => Type::Array(Box::new(elem.erased())),
            Type::List(shape, _) => Type::List(*shape, Box::new(Type::Any)),
            Type::Set(shape, _) => Type::Set(*shape, Box::new(Type::Any)),
            Type::Map(shape, ..) => Type::Map(*shape, Box::new(Type::Any), Box::new(Type::Any)),
            other => other.clone(),
        }
    }

    /// Whether a value of type `other` may be stored where `self` is required.
    ///
    /// Generic element types of lists, sets and maps are not compared.
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        match (self, other) {
            (a, _) if a.is_unknown() => true,
            (Type::Optional(a), Type::Optional(b)) => a.is_assignable_from(b),
            (Type::Optional(a), b) => a.is_assignable_from(b),
            (a, Type::Optional(b)) => a.is_assignable_from(b),
            (Type::Class(a), Type::Class(b)) => b.is_subclass_of(a),
            (Type::Array(a), Type::Array(b)) => a.is_assignable_from(b),
            (Type::List(a, _), Type::List(b, _)) => a.accepts(*b),
            (Type::Set(a, _), Type::Set(b, _)) => a.accepts(*b),
            (Type::Map(a, ..), Type::Map(b, ..)) => a.accepts(*b),
            (a, b) => a == b,
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ty, _) if ty.is_unknown() => true,
            (ty, Value::Null) => !ty.is_primitive(),
            (Type::Optional(inner), value) => inner.accepts(value),
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Char, Value::Char(_)) => true,
            (Type::Str, Value::Str(_)) => true,
            (Type::Number(kind), Value::Number(n)) => n.kind() == *kind,
            (Type::Enum(info), Value::Enum(e)) => e.info().id() == info.id(),
            (Type::Class(class), Value::Object(o)) => o.class().is_subclass_of(class),
            (Type::Array(elem), Value::Array(a)) => elem.is_assignable_from(a.elem()),
            (Type::List(shape, _), Value::List(l)) => shape.accepts(l.shape()),
            (Type::Set(shape, _), Value::Set(s)) => shape.accepts(s.shape()),
            (Type::Map(shape, ..), Value::Map(m)) => shape.accepts(m.shape()),
            _ => false,
        }
    }

    /// The default value of a fresh slot of this type: zero for primitives, null otherwise.
    pub fn zero_value(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::Char => Value::Char('\0'),
            Type::Number(kind) => Value::Number(Number::zero(*kind)),
            _ => Value::Null,
        }
    }

    /// Resolves generic parameters with `bindings` and, when given, [`Type::SelfType`] with `this`.
    pub(crate) fn substitute(
        &self,
        bindings: &[(Cow<'static, str>, Type)],
        this: Option<&Arc<ClassInfo>>,
    ) -> Type {
        let sub = |ty: &Type| Box::new(ty.substitute(bindings, this));
        match self {
            Type::Param(name) => bindings
                .iter()
                .find(|(param, _)| param == name)
                .map_or_else(|| self.clone(), |(_, ty)| ty.clone()),
            Type::SelfType => this.map_or(Type::SelfType, |class| Type::Class(class.clone())),
            Type::Optional(inner) => Type::Optional(sub(inner)),
            Type::Array(elem) => Type::Array(sub(elem)),
            Type::List(shape, elem) => Type::List(*shape, sub(elem)),
            Type::Set(shape, elem) => Type::Set(*shape, sub(elem)),
            Type::Map(shape, key, value) => Type::Map(*shape, sub(key), sub(value)),
            other => other.clone(),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Any, Type::Any)
            | (Type::Bool, Type::Bool)
            | (Type::Char, Type::Char)
            | (Type::Str, Type::Str)
            | (Type::SelfType, Type::SelfType) => true,
            (Type::Number(a), Type::Number(b)) => a == b,
            (Type::Optional(a), Type::Optional(b)) | (Type::Array(a), Type::Array(b)) => a == b,
            (Type::Enum(a), Type::Enum(b)) => a.id() == b.id(),
            (Type::Class(a), Type::Class(b)) => a.id() == b.id(),
            (Type::List(sa, a), Type::List(sb, b)) => sa == sb && a == b,
            (Type::Set(sa, a), Type::Set(sb, b)) => sa == sb && a == b,
            (Type::Map(sa, ka, va), Type::Map(sb, kb, vb)) => sa == sb && ka == kb && va == vb,
            (Type::Param(a), Type::Param(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
        match self {
            Type::Number(kind) => kind.hash(state),
            Type::Optional(inner) | Type::Array(inner) => inner.hash(state),
            Type::Enum(info) => info.id().hash(state),
            Type::Class(class) => class.id().hash(state),
            Type::List(shape, elem) => {
                shape.hash(state);
                elem.hash(state);
            }
            Type::Set(shape, elem) => {
                shape.hash(state);
                elem.hash(state);
            }
            Type::Map(shape, key, value) => {
                shape.hash(state);
                key.hash(state);
                value.hash(state);
            }
            Type::Param(name) => name.hash(state),
            Type::Any | Type::Bool | Type::Char | Type::Str | Type::SelfType => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Bool => f.write_str("bool"),
            Type::Char => f.write_str("char"),
            Type::Str => f.write_str("String"),
            Type::Number(kind) => f.write_str(kind.name()),
            Type::Optional(inner) => write!(f, "Option<{inner}>"),
            Type::Enum(info) => f.write_str(info.path()),
            Type::Class(class) => f.write_str(class.path()),
            Type::Array(elem) => write!(f, "[{elem}]"),
            Type::List(shape, elem) => write!(f, "{}<{elem}>", shape.name()),
            Type::Set(shape, elem) => write!(f, "{}<{elem}>", shape.name()),
            Type::Map(shape, key, value) => write!(f, "{}<{key}, {value}>", shape.name()),
            Type::Param(name) => f.write_str(name),
            Type::SelfType => f.write_str("Self"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::EnumInfo;

    #[test]
    fn assignability() {
        assert!(Type::Any.is_assignable_from(&Type::I32));
        assert!(Type::optional(Type::I32).is_assignable_from(&Type::I32));
        assert!(Type::I32.is_assignable_from(&Type::optional(Type::I32)));
        assert!(!Type::I32.is_assignable_from(&Type::I64));
        assert!(Type::list(Type::Str).is_assignable_from(&Type::List(ListShape::Linked, Box::new(Type::I32))));
        assert!(!Type::List(ListShape::Vec, Box::new(Type::Any)).is_assignable_from(&Type::list(Type::Any)));
        assert!(!Type::list(Type::Str).is_assignable_from(&Type::set(Type::Str)));
    }

    #[test]
    fn accepts_values() {
        assert!(Type::I32.accepts(&Value::from(1_i32)));
        assert!(!Type::I32.accepts(&Value::from(1_i64)));
        assert!(!Type::I32.accepts(&Value::Null));
        assert!(Type::optional(Type::I32).accepts(&Value::Null));
        assert!(Type::Str.accepts(&Value::Null));
        assert!(Type::list(Type::Str).accepts(&Value::list(Vec::new())));
        assert!(!Type::set(Type::Str).accepts(&Value::list(Vec::new())));
        assert!(Type::array(Type::Any).accepts(&Value::array(Type::Str, Vec::new())));
        assert!(!Type::array(Type::I32).accepts(&Value::array(Type::Str, Vec::new())));
    }

    #[test]
    fn erased_and_hash_consistency() {
        use core::hash::BuildHasher;
        use pw_utils::hash::StableState;

        let a = Type::map(Type::Str, Type::I32).erased();
        let b = Type::map(Type::Any, Type::Bool).erased();
        assert_eq!(a, b);
        assert_eq!(StableState.hash_one(&a), StableState.hash_one(&b));

        let color = EnumInfo::new("demo.Color", ["RED", "GREEN"]);
        let other = EnumInfo::new("demo.Color", ["RED", "GREEN"]);
        assert_ne!(Type::enumeration(&color), Type::enumeration(&other));
    }

    #[test]
    fn display() {
        assert_eq!(Type::map(Type::Str, Type::list(Type::I32)).to_string(), "Map<String, List<i32>>");
        assert_eq!(Type::optional(Type::Bool).to_string(), "Option<bool>");
        assert_eq!(Type::array(Type::U8).to_string(), "[u8]");
    }
}
