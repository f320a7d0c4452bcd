use alloc::sync::Arc;
use std::sync::{PoisonError, RwLock};

use pw_utils::hash::{HashMap, IdMap, IdState};

use crate::info::{ClassId, ClassInfo, Exposure, Type};
use crate::property::{AccessMode, HandleKind, PropertyHandle};

// -----------------------------------------------------------------------------
// ClassHandles

/// All property handles of one class for one [`AccessMode`].
#[derive(Debug)]
pub struct ClassHandles {
    class: ClassId,
    handles: Box<[PropertyHandle]>,
    index: HashMap<String, usize>,
}

impl ClassHandles {
    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&PropertyHandle> {
        self.index.get(name).map(|&at| &self.handles[at])
    }

    #[inline]
    pub fn handles(&self) -> &[PropertyHandle] {
        &self.handles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    fn build(class: &Arc<ClassInfo>, mode: AccessMode) -> Self {
        let mut ancestors: Vec<&Arc<ClassInfo>> = Vec::new();
        let mut current = Some(class);
        while let Some(c) = current {
            ancestors.push(c);
            current = c.parent();
        }

        let mut handles: Vec<PropertyHandle> = Vec::new();
        let mut upsert = |handle: PropertyHandle| {
            match handles.iter().position(|h| h.name() == handle.name()) {
                Some(at) => handles[at] = handle,
                None => handles.push(handle),
            }
        };

        // Later declarations shadow earlier ones.
        for (slot, field) in class.fields().iter().enumerate() {
            let (readable, writable) = match mode {
                AccessMode::Fields => (true, true),
                AccessMode::Properties if field.exposure() == Exposure::Hidden => continue,
                AccessMode::Properties => {
                    (field.exposure().is_readable(), field.exposure().is_writable())
                }
            };
            let owner = ancestors.iter().find(|c| c.id() == field.owner()).copied();
            let ty = class
                .slot_type(slot)
                .map_or(Type::Any, |ty| ty.substitute(&[], owner));
            upsert(PropertyHandle::new(
                field.name().to_owned().into(),
                ty,
                HandleKind::Field {
                    slot,
                    readable,
                    writable,
                },
            ));
        }

        if mode == AccessMode::Properties {
            let chain = class.binding_chain();
            for declaring in ancestors.iter().rev() {
                let bindings = chain
                    .iter()
                    .find(|(id, _)| *id == declaring.id())
                    .map_or(&[][..], |(_, bindings)| &bindings[..]);
                for def in declaring.properties() {
                    let (getter, setter) = def.accessors();
                    upsert(PropertyHandle::new(
                        def.name().to_owned().into(),
                        def.ty().substitute(bindings, Some(*declaring)),
                        HandleKind::AccessorPair {
                            getter: getter.cloned(),
                            setter: setter.cloned(),
                        },
                    ));
                }
            }
        }

        let index = handles
            .iter()
            .enumerate()
            .map(|(at, handle)| (handle.name().to_owned(), at))
            .collect();

        Self {
            class: class.id(),
            handles: handles.into_boxed_slice(),
            index,
        }
    }
}

// -----------------------------------------------------------------------------
// Process-wide tables

type Tables = RwLock<IdMap<ClassId, Arc<ClassHandles>>>;

static PROPERTY_TABLES: Tables = RwLock::new(IdMap::with_hasher(IdState));
static FIELD_TABLES: Tables = RwLock::new(IdMap::with_hasher(IdState));

#[inline]
fn tables(mode: AccessMode) -> &'static Tables {
    match mode {
        AccessMode::Properties => &PROPERTY_TABLES,
        AccessMode::Fields => &FIELD_TABLES,
    }
}

/// Returns the handle table of `class`, building it on first use.
pub fn handles_for(class: &Arc<ClassInfo>, mode: AccessMode) -> Arc<ClassHandles> {
    let tables = tables(mode);

    if let Some(handles) = tables
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&class.id())
    {
        return handles.clone();
    }

    let built = Arc::new(ClassHandles::build(class, mode));
    log::trace!("built {} {mode:?} handle(s) for `{}`", built.len(), class.path());

    tables
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(class.id())
        .or_insert(built)
        .clone()
}

/// Drops the cached handle tables of `class`.
pub fn forget_class(class: ClassId) {
    for mode in [AccessMode::Properties, AccessMode::Fields] {
        tables(mode)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&class);
    }
}

/// Drops every cached handle table.
pub fn clear_handle_cache() {
    for mode in [AccessMode::Properties, AccessMode::Fields] {
        tables(mode)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
