use alloc::rc::Rc;
use alloc::sync::Arc;
use core::cell::RefCell;
use core::fmt;
use core::ops::Deref;

use crate::info::ClassInfo;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Object

/// An instance of a [`ClassInfo`]: one slot per declared field.
///
/// Slots are not type checked here; typed writes go through property handles.
pub struct Object {
    class: Arc<ClassInfo>,
    slots: RefCell<Vec<Value>>,
}

impl Object {
    #[inline]
    pub(crate) fn with_slots(class: Arc<ClassInfo>, slots: Vec<Value>) -> Self {
        Self {
            class,
            slots: RefCell::new(slots),
        }
    }

    #[inline]
    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    /// Reads the field `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.class.field_index(name).and_then(|index| self.slot(index))
    }

    /// Writes the field `name`, returns `false` if there is no such field.
    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.class.field_index(name) {
            Some(index) => self.set_slot(index, value),
            None => false,
        }
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<Value> {
        self.slots.borrow().get(index).cloned()
    }

    pub fn set_slot(&self, index: usize, value: Value) -> bool {
        match self.slots.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

// -----------------------------------------------------------------------------
// ObjectRef

/// A shared reference to an [`Object`]. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<Object>);

impl ObjectRef {
    #[inline]
    pub(crate) fn new(object: Object) -> Self {
        Self(Rc::new(object))
    }

    /// Whether both references point to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl Deref for ObjectRef {
    type Target = Object;

    #[inline]
    fn deref(&self) -> &Object {
        &self.0
    }
}

impl PartialEq for ObjectRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class.path(), Rc::as_ptr(&self.0))
    }
}

impl fmt::Display for ObjectRef {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
