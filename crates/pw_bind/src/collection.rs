//! Default values for auto-growing and index handling of containers.
//!
//! - [`default_value`]: materializes a missing intermediate value of a type.
//! - [`parse_index`]: reads an array or list index from a path key.
//! - [`grown_array`]: copies an array into longer storage.

use crate::error::InstantiateError;
use crate::info::Type;
use crate::value::{ArrayRef, ListRef, MapRef, SetRef, Value};

/// Materializes the default value of `ty` for auto-growing.
///
/// - arrays: zero length; an array of arrays gets a single empty inner array.
/// - lists, sets and maps: empty, with the concrete shape approximating an abstract one.
/// - classes: default construction.
/// - strings: the empty string; primitives: their zero value.
///
/// Enums, nullable primitives and unknown types have no default value.
///
/// # Examples
///
/// ```
/// use pw_bind::collection::default_value;
/// use pw_bind::info::{SetShape, Type};
/// use pw_bind::value::Value;
///
/// let Value::Set(set) = default_value(&Type::set(Type::Str)).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(set.shape(), SetShape::Linked);
/// assert!(set.is_empty());
/// ```
pub fn default_value(ty: &Type) -> Result<Value, InstantiateError> {
    match ty {
        Type::Array(elem) => {
            let items = match &**elem {
                Type::Array(inner) => vec![Value::array((**inner).clone(), Vec::new())],
                _ => Vec::new(),
            };
            Ok(Value::array((**elem).clone(), items))
        }
        Type::List(shape, _) => Ok(Value::List(ListRef::new(*shape, Vec::new()))),
        Type::Set(shape, _) => Ok(Value::Set(SetRef::new(*shape, Vec::new()))),
        Type::Map(shape, ..) => Ok(Value::Map(MapRef::new(*shape, Vec::new()))),
        Type::Class(class) => class.instantiate().map(Value::Object),
        Type::Str => Ok(Value::from("")),
        Type::Bool | Type::Char | Type::Number(_) => Ok(ty.zero_value()),
        _ => Err(InstantiateError::Unsupported),
    }
}

/// A fresh element for a grown array slot: the default value, or the zero
/// value when the type has none.
fn filler(elem: &Type) -> Result<Value, InstantiateError> {
    match default_value(elem) {
        Err(InstantiateError::Unsupported) => Ok(elem.zero_value()),
        other => other,
    }
}

/// Parses an array or list index.
#[inline]
pub fn parse_index(key: &str) -> Option<usize> {
    key.parse().ok()
}

/// A copy of `array` extended to `len` elements, new slots filled with default values.
pub fn grown_array(array: &ArrayRef, len: usize) -> Result<ArrayRef, InstantiateError> {
    let mut items = array.items();
    while items.len() < len {
        items.push(filler(array.elem())?);
    }
    Ok(ArrayRef::new(array.elem().clone(), items))
}

/// Appends default elements of `elem` to `list` until `index` is a valid position.
pub(crate) fn grow_list(list: &ListRef, elem: &Type, index: usize) -> Result<(), InstantiateError> {
    while list.len() <= index {
        list.push(default_value(elem)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ClassInfo, ListShape, MapShape};

    #[test]
    fn two_dimensional_array() {
        let ty = Type::array(Type::array(Type::I32));
        let Value::Array(outer) = default_value(&ty).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(outer.len(), 1);
        let Some(Value::Array(inner)) = outer.get(0) else {
            panic!("expected an inner array");
        };
        assert!(inner.is_empty());
        assert_eq!(inner.elem(), &Type::I32);
    }

    #[test]
    fn abstract_containers_become_concrete() {
        let Value::List(list) = default_value(&Type::list(Type::I32)).unwrap() else {
            panic!("expected a list");
        };
        assert_eq!(list.shape(), ListShape::Vec);

        let sorted = Type::Map(MapShape::Sorted, Box::new(Type::Str), Box::new(Type::I32));
        let Value::Map(map) = default_value(&sorted).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.shape(), MapShape::Sorted);
    }

    #[test]
    fn construction_failures() {
        let single = ClassInfo::builder("demo.Singleton").private_constructor().build();
        assert_eq!(
            default_value(&Type::class(&single)).unwrap_err(),
            InstantiateError::PrivateConstructor
        );
        assert_eq!(
            default_value(&Type::optional(Type::I32)).unwrap_err(),
            InstantiateError::Unsupported
        );
    }

    #[test]
    fn grown_array_fills_defaults() {
        let array = ArrayRef::new(Type::optional(Type::I32), vec![Value::from(1_i32)]);
        let grown = grown_array(&array, 3).unwrap();
        assert_eq!(grown.items(), vec![Value::from(1_i32), Value::Null, Value::Null]);

        let names = ArrayRef::new(Type::Str, Vec::new());
        assert_eq!(grown_array(&names, 1).unwrap().get(0), Some(Value::from("")));
    }

    #[test]
    fn indices() {
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("key"), None);
    }
}
