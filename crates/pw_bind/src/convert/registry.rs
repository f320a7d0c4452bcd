use alloc::sync::Arc;
use core::fmt;

use log::trace;
use pw_utils::hash::HashMap;

use crate::convert::Converter;
use crate::error::RegistrationError;
use crate::info::Type;
use crate::path::{PropertyPath, Segment, matches_property, stripped_paths};

// -----------------------------------------------------------------------------
// PathScope

#[derive(Clone)]
struct PathScope {
    path: PropertyPath,
    entries: Vec<(Option<Type>, Arc<dyn Converter>)>,
}

impl PathScope {
    fn upsert(&mut self, ty: Option<Type>, converter: Arc<dyn Converter>) {
        let ty = ty.map(|ty| ty.erased());
        match self.entries.iter_mut().find(|(registered, _)| *registered == ty) {
            Some(entry) => entry.1 = converter,
            None => self.entries.push((ty, converter)),
        }
    }

    fn converter_for(&self, required: &Type) -> Option<&Arc<dyn Converter>> {
        self.entries
            .iter()
            .find(|(registered, _)| applies_to(registered.as_ref(), required))
            .map(|(_, converter)| converter)
    }
}

/// Whether a converter registered for `registered` serves a conversion to `required`.
///
/// Without a registered type it always applies. For an unknown required type,
/// typically a collection element, it applies unless registered for a
/// collection or array as a whole.
fn applies_to(registered: Option<&Type>, required: &Type) -> bool {
    match registered {
        None => true,
        Some(registered) if required.is_unknown() => {
            !registered.is_collection() && !registered.is_array()
        }
        Some(registered) => {
            registered.is_assignable_from(required) || required.is_assignable_from(registered)
        }
    }
}

// -----------------------------------------------------------------------------
// CustomConverters

/// Converters registered on one accessor, scoped by type, by property path, or both.
///
/// A later registration for the same scope replaces the earlier one.
/// Path-scoped registrations win over type-scoped ones.
///
/// # Examples
///
/// ```
/// use pw_bind::convert::{CustomConverters, text_converter};
/// use pw_bind::info::Type;
/// use pw_bind::value::Value;
///
/// let mut converters = CustomConverters::new();
/// let cents = text_converter("cents", |text, _| Ok(Value::from(text.len() as i64)));
/// converters.register(Some(Type::I64), Some("items.price"), cents).unwrap();
///
/// assert!(converters.find(&Type::I64, Some("items[0].price")).is_some());
/// assert!(converters.find(&Type::I64, Some("total")).is_none());
/// ```
#[derive(Clone, Default)]
pub struct CustomConverters {
    by_type: HashMap<Type, Arc<dyn Converter>>,
    by_path: HashMap<String, PathScope>,
}

impl CustomConverters {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_path.is_empty()
    }

    /// Registers `converter` for values of type `ty` (any type if `None`)
    /// at `path` (any path if `None`).
    pub fn register(
        &mut self,
        ty: Option<Type>,
        path: Option<&str>,
        converter: Arc<dyn Converter>,
    ) -> Result<(), RegistrationError> {
        match (ty, path) {
            (None, None) => Err(RegistrationError::MissingScope),
            (ty, Some(path)) => {
                let path = PropertyPath::parse(path)?;
                self.by_path
                    .entry(path.canonical().to_owned())
                    .or_insert_with(|| PathScope {
                        path,
                        entries: Vec::new(),
                    })
                    .upsert(ty, converter);
                Ok(())
            }
            (Some(ty), None) => {
                self.by_type.insert(ty.erased(), converter);
                Ok(())
            }
        }
    }

    /// Finds the converter for a conversion to `required` at `path`.
    ///
    /// Tries the exact path, then the path with index and key suffixes stripped,
    /// then the registered types.
    pub fn find(&self, required: &Type, path: Option<&str>) -> Option<Arc<dyn Converter>> {
        if let Some(path) = path
            && !self.by_path.is_empty()
        {
            if let Some(converter) = self.find_at(path, required) {
                return Some(converter);
            }
            if let Ok(parsed) = PropertyPath::parse(path) {
                for stripped in stripped_paths(&parsed) {
                    if let Some(converter) = self.find_at(&stripped, required) {
                        trace!("converter for `{path}` found at stripped path `{stripped}`");
                        return Some(converter);
                    }
                }
            }
        }
        self.find_by_type(required)
    }

    fn find_at(&self, path: &str, required: &Type) -> Option<Arc<dyn Converter>> {
        self.by_path
            .get(path)
            .and_then(|scope| scope.converter_for(required))
            .cloned()
    }

    fn find_by_type(&self, required: &Type) -> Option<Arc<dyn Converter>> {
        if required.is_unknown() || self.by_type.is_empty() {
            return None;
        }
        if let Some(converter) = self.by_type.get(&required.erased()) {
            return Some(converter.clone());
        }
        self.by_type
            .iter()
            .find(|(registered, _)| registered.is_assignable_from(required))
            .map(|(_, converter)| converter.clone())
    }

    /// Whether elements of the collection at `path` have a converter of their own.
    pub fn has_element_converter(&self, elem: Option<&Type>, path: Option<&str>) -> bool {
        let required = elem.unwrap_or(&Type::Any);
        if let Some(path) = path {
            let scoped = self.by_path.iter().any(|(registered, scope)| {
                matches_property(registered, path) && scope.converter_for(required).is_some()
            });
            if scoped {
                return true;
            }
        }
        elem.is_some_and(|elem| self.by_type.contains_key(&elem.erased()))
    }

    /// The registrations seen by the child accessor of the property `nested`.
    ///
    /// Type-scoped converters are copied as they are. A path-scoped converter is
    /// copied when its first segment is `nested` itself or the bare name of
    /// `nested`, with that segment removed from its path.
    pub(crate) fn copy_to(&self, nested: &Segment) -> CustomConverters {
        let mut child = CustomConverters {
            by_type: self.by_type.clone(),
            by_path: HashMap::default(),
        };
        let canonical = nested.canonical();
        let name = nested.canonical_name();

        for scope in self.by_path.values() {
            let Some((head, rest)) = scope.path.split_first() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let head = head.canonical();
            if head != canonical && head != name {
                continue;
            }
            let path = PropertyPath::from_segments(rest.to_vec());
            let target = child
                .by_path
                .entry(path.canonical().to_owned())
                .or_insert_with(|| PathScope {
                    path,
                    entries: Vec::new(),
                });
            for (ty, converter) in &scope.entries {
                target.upsert(ty.clone(), converter.clone());
            }
        }
        child
    }
}

impl fmt::Debug for CustomConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConverters")
            .field("types", &self.by_type.keys().collect::<Vec<_>>())
            .field("paths", &self.by_path.keys().collect::<Vec<_>>())
            .finish()
    }
}
