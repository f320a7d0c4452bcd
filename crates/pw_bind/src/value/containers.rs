use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::info::{ListShape, MapShape, SetShape, Type};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Shared behaviour

macro_rules! impl_shared {
    ($name:ident, $open:literal, $close:literal) => {
        impl $name {
            /// Whether both references point to the same instance.
            #[inline]
            pub fn ptr_eq(&self, other: &$name) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }

            #[inline]
            pub(crate) fn addr(&self) -> usize {
                Rc::as_ptr(&self.0) as *const () as usize
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.0.items.borrow().len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.items.borrow().is_empty()
            }
        }

        impl PartialEq for $name {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str($open)?;
                for (index, item) in self.0.items.borrow().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write_item(f, item)?;
                }
                f.write_str($close)
            }
        }
    };
}

trait WriteItem {
    fn write_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl WriteItem for Value {
    #[inline]
    fn write_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl WriteItem for (Value, Value) {
    #[inline]
    fn write_to(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.0, self.1)
    }
}

#[inline]
fn write_item(f: &mut fmt::Formatter<'_>, item: &impl WriteItem) -> fmt::Result {
    item.write_to(f)
}

// -----------------------------------------------------------------------------
// ArrayRef

struct ArrayData {
    elem: Type,
    items: RefCell<Vec<Value>>,
}

/// A fixed-length array with a runtime component type.
#[derive(Clone)]
pub struct ArrayRef(Rc<ArrayData>);

impl ArrayRef {
    pub fn new(elem: Type, items: Vec<Value>) -> Self {
        Self(Rc::new(ArrayData {
            elem,
            items: RefCell::new(items),
        }))
    }

    /// The component type.
    #[inline]
    pub fn elem(&self) -> &Type {
        &self.0.elem
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Replaces the element at `index`, returns `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.items.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// A snapshot of the elements.
    #[inline]
    pub fn items(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }
}

impl_shared!(ArrayRef, "[", "]");

// -----------------------------------------------------------------------------
// ListRef

struct ListData {
    shape: ListShape,
    items: RefCell<Vec<Value>>,
}

/// A growable list.
#[derive(Clone)]
pub struct ListRef(Rc<ListData>);

impl ListRef {
    /// Creates a list; an abstract shape is replaced by its concrete default.
    pub fn new(shape: ListShape, items: Vec<Value>) -> Self {
        Self(Rc::new(ListData {
            shape: shape.concrete(),
            items: RefCell::new(items),
        }))
    }

    #[inline]
    pub fn shape(&self) -> ListShape {
        self.0.shape
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Replaces the element at `index`, returns `false` when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.items.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn push(&self, value: Value) {
        self.0.items.borrow_mut().push(value);
    }

    /// A snapshot of the elements.
    #[inline]
    pub fn items(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }
}

impl_shared!(ListRef, "[", "]");

// -----------------------------------------------------------------------------
// SetRef

struct SetData {
    shape: SetShape,
    items: RefCell<Vec<Value>>,
}

/// A set of distinct values in insertion order, or sorted for [`SetShape::Sorted`].
#[derive(Clone)]
pub struct SetRef(Rc<SetData>);

impl SetRef {
    /// Creates a set, dropping duplicates; an abstract shape is replaced by its concrete default.
    pub fn new(shape: SetShape, items: Vec<Value>) -> Self {
        let set = Self(Rc::new(SetData {
            shape: shape.concrete(),
            items: RefCell::new(Vec::with_capacity(items.len())),
        }));
        for item in items {
            set.insert(item);
        }
        set
    }

    #[inline]
    pub fn shape(&self) -> SetShape {
        self.0.shape
    }

    #[inline]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.items.borrow().contains(value)
    }

    /// Inserts `value`, returns `false` if an equal value is already present.
    pub fn insert(&self, value: Value) -> bool {
        let mut items = self.0.items.borrow_mut();
        if items.contains(&value) {
            return false;
        }
        if self.0.shape == SetShape::Sorted {
            let at = items.partition_point(|item| item.sort_cmp(&value).is_lt());
            items.insert(at, value);
        } else {
            items.push(value);
        }
        true
    }

    /// The element at iteration position `index`.
    #[inline]
    pub fn nth(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// A snapshot of the elements in iteration order.
    #[inline]
    pub fn items(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }
}

impl_shared!(SetRef, "[", "]");

// -----------------------------------------------------------------------------
// MapRef

struct MapData {
    shape: MapShape,
    items: RefCell<Vec<(Value, Value)>>,
}

/// A map with insertion-ordered entries, or key-sorted for [`MapShape::Sorted`].
#[derive(Clone)]
pub struct MapRef(Rc<MapData>);

impl MapRef {
    /// Creates a map, later entries replace earlier ones with an equal key.
    pub fn new(shape: MapShape, entries: Vec<(Value, Value)>) -> Self {
        let map = Self(Rc::new(MapData {
            shape: shape.concrete(),
            items: RefCell::new(Vec::with_capacity(entries.len())),
        }));
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    #[inline]
    pub fn shape(&self) -> MapShape {
        self.0.shape
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .items
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[inline]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.items.borrow().iter().any(|(k, _)| k == key)
    }

    /// Inserts an entry, returns the replaced value.
    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        let mut items = self.0.items.borrow_mut();
        if let Some((_, slot)) = items.iter_mut().find(|(k, _)| *k == key) {
            return Some(core::mem::replace(slot, value));
        }
        if self.0.shape == MapShape::Sorted {
            let at = items.partition_point(|(k, _)| k.sort_cmp(&key).is_lt());
            items.insert(at, (key, value));
        } else {
            items.push((key, value));
        }
        None
    }

    /// A snapshot of the entries in iteration order.
    #[inline]
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.items.borrow().clone()
    }
}

impl_shared!(MapRef, "{", "}");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_set_orders_and_dedups() {
        let set = SetRef::new(
            SetShape::Sorted,
            vec![Value::from(3_i32), Value::from(1_i32), Value::from(3_i32)],
        );
        assert_eq!(set.items(), vec![Value::from(1_i32), Value::from(3_i32)]);
        assert!(!set.insert(Value::from(1_i32)));
        assert!(set.insert(Value::from(2_i32)));
        assert_eq!(set.nth(1), Some(Value::from(2_i32)));
    }

    #[test]
    fn map_insert_replaces() {
        let map = MapRef::new(MapShape::Abstract, Vec::new());
        assert_eq!(map.shape(), MapShape::Linked);
        assert_eq!(map.insert(Value::from("a"), Value::from(1_i32)), None);
        assert_eq!(
            map.insert(Value::from("a"), Value::from(2_i32)),
            Some(Value::from(1_i32))
        );
        assert_eq!(map.get(&Value::from("a")), Some(Value::from(2_i32)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.to_string(), "{a=2}");
    }

    #[test]
    fn identity_equality() {
        let a = ListRef::new(ListShape::Vec, vec![Value::from(1_i32)]);
        let b = ListRef::new(ListShape::Vec, vec![Value::from(1_i32)]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
