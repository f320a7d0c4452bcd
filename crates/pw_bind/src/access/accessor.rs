use alloc::sync::Arc;
use core::fmt;

use log::{debug, warn};

use crate::access::cache::AccessorCache;
use crate::access::{AccessorConfig, PropertyValue, PropertyValues};
use crate::collection::{default_value, grow_list, grown_array, parse_index};
use crate::convert::{ConversionService, Converter, CustomConverters, DefaultConverters, TypeConverter};
use crate::error::{
    BatchError, BindError, ConvertError, ErrorKind, InstantiateError, PropertyFailure,
    RegistrationError,
};
use crate::info::Type;
use crate::path::{PropertyPath, Segment};
use crate::property::{AccessMode, PropertyFault, PropertyHandle, handles_for};
use crate::value::{ArrayRef, ListRef, ObjectRef, Value};

/// Reads and writes properties of an object graph through string paths.
///
/// An accessor wraps one object. Crossing a nesting boundary (`a.b`) goes through
/// a nested accessor wrapping the value of `a`, which is cached until that value
/// is replaced by another object.
///
/// Raw values written to a property are converted to its declared type, see
/// [`TypeConverter`] for the strategies.
///
/// # Examples
///
/// ```
/// use pw_bind::Accessor;
/// use pw_bind::info::{ClassInfo, Type};
/// use pw_bind::value::Value;
///
/// let address = ClassInfo::builder("demo.Address").field("city", Type::Str).build();
/// let person = ClassInfo::builder("demo.Person")
///     .field("age", Type::U8)
///     .field("address", Type::class(&address))
///     .build();
///
/// let mut accessor = Accessor::new(person.instantiate().unwrap());
/// accessor.set_auto_grow(true, 16);
///
/// accessor.apply("age", "42").unwrap();
/// accessor.apply("address.city", "Paris").unwrap();
///
/// assert_eq!(accessor.resolve("age").unwrap(), Value::from(42_u8));
/// assert_eq!(accessor.resolve("address.city").unwrap(), Value::from("Paris"));
/// ```
pub struct Accessor {
    wrapped: ObjectRef,
    root: ObjectRef,
    nested_path: String,
    config: AccessorConfig,
    defaults: Arc<DefaultConverters>,
    service: Option<Arc<dyn ConversionService>>,
    converters: CustomConverters,
    children: AccessorCache,
}

// -----------------------------------------------------------------------------
// Construction and settings

fn registered_defaults() -> Arc<DefaultConverters> {
    let mut defaults = DefaultConverters::new();
    defaults.auto_register();
    Arc::new(defaults)
}

impl Accessor {
    /// An accessor over `root` with the built-in default converters and the
    /// submitted convention converters.
    #[inline]
    pub fn new(root: ObjectRef) -> Self {
        Self::with_parts(root, AccessorConfig::default(), registered_defaults(), None)
    }

    /// An accessor resolving properties from declared fields only.
    pub fn direct(root: ObjectRef) -> Self {
        let config = AccessorConfig {
            mode: AccessMode::Fields,
            ..AccessorConfig::default()
        };
        Self::with_parts(root, config, registered_defaults(), None)
    }

    pub(crate) fn with_parts(
        root: ObjectRef,
        config: AccessorConfig,
        defaults: Arc<DefaultConverters>,
        service: Option<Arc<dyn ConversionService>>,
    ) -> Self {
        Self {
            wrapped: root.clone(),
            root,
            nested_path: String::new(),
            config,
            defaults,
            service,
            converters: CustomConverters::new(),
            children: AccessorCache::default(),
        }
    }

    /// The object this accessor reads and writes.
    #[inline]
    pub fn wrapped(&self) -> &ObjectRef {
        &self.wrapped
    }

    /// The object at the top of the graph, named in errors.
    #[inline]
    pub fn root(&self) -> &ObjectRef {
        &self.root
    }

    /// The path from the root to the wrapped object, with a trailing `.`;
    /// empty for the root accessor.
    #[inline]
    pub fn nested_path(&self) -> &str {
        &self.nested_path
    }

    #[inline]
    pub fn config(&self) -> &AccessorConfig {
        &self.config
    }

    /// Enables or disables auto-growing and sets the collection limit, for this
    /// accessor and its cached nested accessors.
    pub fn set_auto_grow(&mut self, enabled: bool, limit: usize) {
        self.config.auto_grow_nested_paths = enabled;
        self.config.auto_grow_collection_limit = limit;
        self.children
            .for_each_mut(|child| child.set_auto_grow(enabled, limit));
    }

    /// Registers a custom converter, see [`CustomConverters::register`].
    ///
    /// Nested accessors receive the registrations when they are created.
    #[inline]
    pub fn register_converter(
        &mut self,
        ty: Option<Type>,
        path: Option<&str>,
        converter: Arc<dyn Converter>,
    ) -> Result<(), RegistrationError> {
        self.converters.register(ty, path, converter)
    }

    #[inline]
    pub fn set_conversion_service(&mut self, service: Option<Arc<dyn ConversionService>>) {
        self.service = service;
    }

    /// The nested accessor cached for `path`, e.g. `a.b` for the accessor
    /// wrapping the value of `a.b`.
    pub fn cached_child(&self, path: &str) -> Option<&Accessor> {
        let path = PropertyPath::parse(path).ok()?;
        let mut current = self;
        for segment in path.segments() {
            current = current.children.get(&segment.canonical())?;
        }
        Some(current)
    }
}

// -----------------------------------------------------------------------------
// Public operations

impl Accessor {
    /// Reads the value at `path`.
    pub fn resolve(&mut self, path: &str) -> Result<Value, BindError> {
        let path = PropertyPath::parse(path)?;
        let (accessor, last) = self.accessor_for(path.segments())?;
        accessor.read_segment(last)
    }

    /// Converts `raw` to the type at `path` and writes it.
    #[inline]
    pub fn apply(&mut self, path: &str, raw: impl Into<Value>) -> Result<(), BindError> {
        self.set_property_value(&PropertyValue::new(path, raw))
    }

    /// Writes one [`PropertyValue`].
    pub fn set_property_value(&mut self, pv: &PropertyValue) -> Result<(), BindError> {
        let path = PropertyPath::parse(pv.name())?;
        let bean = self.bean();
        let full = self.full_path(path.canonical());
        let (accessor, last) = self
            .accessor_for(path.segments())
            .map_err(|e| e.into_not_writable(&bean, &full))?;
        accessor.write_segment(last, pv.value())
    }

    /// Writes every value of a batch.
    ///
    /// Not writable paths are skipped when `ignore_unknown` is set or the value is
    /// optional; null intermediates are skipped when `ignore_invalid` is set.
    /// Conversion, type clash and access failures are collected and raised together
    /// as [`BindError::Batch`] once every value was processed; any other failure
    /// is raised at once.
    pub fn set_property_values(
        &mut self,
        values: &PropertyValues,
        ignore_unknown: bool,
        ignore_invalid: bool,
    ) -> Result<(), BindError> {
        let mut failures = Vec::new();
        for pv in values {
            let Err(error) = self.set_property_value(pv) else {
                continue;
            };
            match error.kind() {
                ErrorKind::NotWritable if ignore_unknown || pv.is_optional() => {
                    debug!("skipping `{}`: {error}", pv.name());
                }
                ErrorKind::NullIntermediate if ignore_invalid => {
                    debug!("skipping `{}`: {error}", pv.name());
                }
                _ if error.is_property_access() => failures.push(PropertyFailure {
                    path: pv.name().to_owned(),
                    error,
                }),
                _ => return Err(error),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(BatchError { failures }.into())
        }
    }

    /// Whether `path` can be read. Never fails; auto-growing may still
    /// materialize intermediates.
    pub fn is_readable_property(&mut self, path: &str) -> bool {
        let Ok(path) = PropertyPath::parse(path) else {
            return false;
        };
        let Ok((accessor, last)) = self.accessor_for(path.segments()) else {
            return false;
        };
        if !last.is_indexed() {
            return accessor.handle(last.name()).is_some_and(|h| h.is_readable());
        }
        accessor.read_segment(last).is_ok()
    }

    /// Whether `path` can be written. Never fails; an indexed path is writable
    /// when the container holding the element can be read and is present, or
    /// would be materialized by auto-growing.
    pub fn is_writable_property(&mut self, path: &str) -> bool {
        let Ok(path) = PropertyPath::parse(path) else {
            return false;
        };
        let Ok((accessor, last)) = self.accessor_for(path.segments()) else {
            return false;
        };
        if !last.is_indexed() {
            return accessor.handle(last.name()).is_some_and(|h| h.is_writable());
        }
        let holder = last.with_keys(last.keys().len() - 1);
        let auto_grow = accessor.config.auto_grow_nested_paths;
        matches!(accessor.read_segment(&holder), Ok(value) if auto_grow || !value.is_null())
    }

    /// The declared type at `path`, `None` if the path does not resolve.
    pub fn property_type(&mut self, path: &str) -> Option<Type> {
        let path = PropertyPath::parse(path).ok()?;
        let (accessor, last) = self.accessor_for(path.segments()).ok()?;
        let handle = accessor.handle(last.name())?;
        Some(handle.nested_type(last.keys().len() + 1))
    }

    /// Converts `value` with this accessor's converters, outside of any property.
    #[inline]
    pub fn convert_if_necessary(&self, value: &Value, required: &Type) -> Result<Value, BindError> {
        Ok(self.type_converter().convert_if_necessary(None, value, required)?)
    }
}

// -----------------------------------------------------------------------------
// Resolution

impl Accessor {
    #[inline]
    fn bean(&self) -> String {
        self.root.class().path().to_owned()
    }

    #[inline]
    fn full_path(&self, local: &str) -> String {
        format!("{}{local}", self.nested_path)
    }

    #[inline]
    fn type_converter(&self) -> TypeConverter<'_> {
        TypeConverter::new(&self.converters, &self.defaults, self.service.as_deref())
    }

    fn handle(&self, name: &str) -> Option<PropertyHandle> {
        handles_for(self.wrapped.class(), self.config.mode)
            .get(name)
            .cloned()
    }

    /// Walks all but the last segment, returning the accessor that holds it.
    fn accessor_for<'p>(
        &mut self,
        segments: &'p [Segment],
    ) -> Result<(&mut Accessor, &'p Segment), BindError> {
        let Some((last, parents)) = segments.split_last() else {
            return Err(BindError::NotReadable {
                bean: self.bean(),
                path: self.nested_path.clone(),
            });
        };
        let mut current = self;
        for segment in parents {
            current = current.nested_accessor(segment)?;
        }
        Ok((current, last))
    }

    /// The cached accessor for the value of `segment`, materializing a null
    /// value when auto-growing.
    fn nested_accessor(&mut self, segment: &Segment) -> Result<&mut Accessor, BindError> {
        let canonical = segment.canonical();
        let mut value = self.read_segment(segment)?;
        if value.is_null() {
            if !self.config.auto_grow_nested_paths {
                return Err(BindError::NullIntermediate {
                    bean: self.bean(),
                    path: self.full_path(&canonical),
                });
            }
            value = self.set_default_value(segment)?;
        }
        let object = match value {
            Value::Object(object) => object,
            other => {
                debug!("value of `{}` is a `{}`, not an object", self.full_path(&canonical), other.type_name());
                return Err(BindError::NotReadable {
                    bean: self.bean(),
                    path: self.full_path(&canonical),
                });
            }
        };

        let nested_path = format!("{}{canonical}.", self.nested_path);
        let (root, config, defaults, service) = (&self.root, self.config, &self.defaults, &self.service);
        let converters = &self.converters;
        Ok(self.children.get_or_build(canonical, &object, || Accessor {
            wrapped: object.clone(),
            root: root.clone(),
            nested_path,
            config,
            defaults: defaults.clone(),
            service: service.clone(),
            converters: converters.copy_to(segment),
            children: AccessorCache::default(),
        }))
    }

    /// Reads a segment of the wrapped object, following its keys.
    fn read_segment(&mut self, segment: &Segment) -> Result<Value, BindError> {
        let canonical = segment.canonical();
        let Some(handle) = self.handle(segment.name()).filter(PropertyHandle::is_readable) else {
            return Err(BindError::NotReadable {
                bean: self.bean(),
                path: self.full_path(&canonical),
            });
        };
        let mut value = handle
            .get(&self.wrapped)
            .map_err(|fault| self.access_error(&canonical, handle.declared_type(), fault))?;
        if !segment.is_indexed() {
            return Ok(value);
        }

        if value.is_null() {
            if !self.config.auto_grow_nested_paths {
                return Err(self.null_indexed(&canonical));
            }
            value = self.set_default_value(&Segment::named(segment.name()))?;
        }

        for (at, key) in segment.keys().iter().enumerate() {
            let prefix = segment.with_keys(at);
            value = match value {
                Value::Null => return Err(self.null_indexed(&canonical)),
                Value::Array(array) => {
                    let index = self.index(key, &canonical)?;
                    let array = self.grow_array_if_necessary(array, index, &prefix)?;
                    array
                        .get(index)
                        .ok_or_else(|| self.out_of_bounds(&canonical))?
                }
                Value::List(list) => {
                    let index = self.index(key, &canonical)?;
                    self.grow_list_if_necessary(&list, index, &handle.nested_type(at + 2), &prefix)?;
                    list.get(index)
                        .ok_or_else(|| self.out_of_bounds(&canonical))?
                }
                Value::Set(set) => {
                    let index = self.index(key, &canonical)?;
                    set.nth(index).ok_or_else(|| self.invalid_index(
                        &canonical,
                        format!("cannot get element with index {index} from set of size {}", set.len()),
                    ))?
                }
                Value::Map(map) => {
                    let key_type = handle.map_key_type(at + 1);
                    let map_key = self
                        .type_converter()
                        .convert_if_necessary(None, &Value::from(key.as_str()), &key_type)
                        .map_err(|e| self.invalid_index(&canonical, e.to_string()))?;
                    match map.get(&map_key) {
                        Some(found) => found,
                        None if self.config.auto_grow_nested_paths => Value::Null,
                        None => {
                            return Err(self.invalid_index(
                                &canonical,
                                format!("map has no entry for key `{key}`"),
                            ));
                        }
                    }
                }
                other => {
                    return Err(BindError::InvalidTargetType {
                        bean: self.bean(),
                        path: self.full_path(&canonical),
                        found: other.type_name(),
                    });
                }
            };
        }
        Ok(value)
    }

    /// Writes `raw` to a segment of the wrapped object, converting it first.
    fn write_segment(&mut self, segment: &Segment, raw: &Value) -> Result<(), BindError> {
        if segment.is_indexed() {
            self.write_keyed(segment, raw)
        } else {
            self.write_local(segment, raw)
        }
    }

    fn write_local(&mut self, segment: &Segment, raw: &Value) -> Result<(), BindError> {
        let canonical = segment.canonical();
        let handle = match self.handle(segment.name()) {
            Some(handle) if handle.is_writable() => handle,
            found => {
                let reason = if found.is_some() {
                    "the property has no setter"
                } else {
                    "the property does not exist"
                };
                return Err(BindError::NotWritable {
                    bean: self.bean(),
                    path: self.full_path(&canonical),
                    reason: reason.into(),
                });
            }
        };
        let value = self.convert_for_property(&canonical, raw, handle.declared_type())?;
        handle
            .set(&self.wrapped, value)
            .map_err(|fault| self.access_error(&canonical, handle.declared_type(), fault))
    }

    fn write_keyed(&mut self, segment: &Segment, raw: &Value) -> Result<(), BindError> {
        let canonical = segment.canonical();
        let level = segment.keys().len();
        let holder = segment.with_keys(level - 1);
        let last = &segment.keys()[level - 1];
        let limit = self.config.auto_grow_collection_limit;

        let holding = self.property_holding_value(segment, &holder)?;
        match holding {
            Value::Array(array) => {
                let value = self.convert_for_property(&canonical, raw, array.elem())?;
                let index = self.index(last, &canonical)?;
                let mut target = array;
                if index >= target.len() {
                    if index < limit {
                        let grown = grown_array(&target, index + 1)
                            .map_err(|source| self.uninstantiable(&canonical, target.elem(), source))?;
                        self.write_segment(&holder, &Value::Array(grown.clone()))?;
                        target = grown;
                    } else {
                        warn!("not growing `{}` to index {index}: the limit is {limit}", self.full_path(&canonical));
                    }
                }
                if !target.set(index, value) {
                    return Err(self.invalid_index(&canonical, "array index out of bounds".into()));
                }
                Ok(())
            }
            Value::List(list) => {
                let elem = self.handle(segment.name()).map_or(Type::Any, |h| h.nested_type(level + 1));
                let value = self.convert_for_property(&canonical, raw, &elem)?;
                let index = self.index(last, &canonical)?;
                let len = list.len();
                if index >= len && index < limit {
                    for _ in len..index {
                        list.push(Value::Null);
                    }
                    list.push(value);
                    return Ok(());
                }
                if index >= limit {
                    warn!("not growing `{}` to index {index}: the limit is {limit}", self.full_path(&canonical));
                }
                if !list.set(index, value) {
                    return Err(self.invalid_index(&canonical, "list index out of bounds".into()));
                }
                Ok(())
            }
            Value::Map(map) => {
                let (key_type, value_type) = match self.handle(segment.name()) {
                    Some(handle) => (handle.map_key_type(level), handle.nested_type(level + 1)),
                    None => (Type::Any, Type::Any),
                };
                let key = self
                    .type_converter()
                    .convert_if_necessary(None, &Value::from(last.as_str()), &key_type)
                    .map_err(|e| self.conversion_error(&canonical, e))?;
                let value = self.convert_for_property(&canonical, raw, &value_type)?;
                map.insert(key, value);
                Ok(())
            }
            other => Err(BindError::InvalidTargetType {
                bean: self.bean(),
                path: self.full_path(&canonical),
                found: other.type_name(),
            }),
        }
    }

    /// The container holding the element addressed by the last key of `segment`.
    fn property_holding_value(&mut self, segment: &Segment, holder: &Segment) -> Result<Value, BindError> {
        let canonical = segment.canonical();
        let value = self.read_segment(holder).map_err(|e| match e {
            BindError::NotReadable { .. } => BindError::NotWritable {
                bean: self.bean(),
                path: self.full_path(&canonical),
                reason: format!("cannot access the container referenced in indexed path `{canonical}`"),
            },
            other => other,
        })?;
        if !value.is_null() {
            return Ok(value);
        }
        if self.config.auto_grow_nested_paths {
            self.set_default_value(holder)
        } else {
            Err(self.null_indexed(&canonical))
        }
    }

    /// Materializes the default value of the type at `segment`, writes it and reads it back.
    fn set_default_value(&mut self, segment: &Segment) -> Result<Value, BindError> {
        let canonical = segment.canonical();
        let ty = self
            .handle(segment.name())
            .map(|handle| handle.nested_type(segment.keys().len() + 1))
            .filter(|ty| !ty.is_unknown());
        let Some(ty) = ty else {
            return Err(BindError::NullIntermediate {
                bean: self.bean(),
                path: self.full_path(&canonical),
            });
        };
        let value = default_value(&ty).map_err(|source| self.uninstantiable(&canonical, &ty, source))?;
        debug!("auto-growing `{}` with a new `{ty}`", self.full_path(&canonical));
        self.write_segment(segment, &value)?;
        let value = self.read_segment(segment)?;
        if value.is_null() {
            return Err(BindError::NullIntermediate {
                bean: self.bean(),
                path: self.full_path(&canonical),
            });
        }
        Ok(value)
    }

    fn grow_array_if_necessary(
        &mut self,
        array: ArrayRef,
        index: usize,
        prefix: &Segment,
    ) -> Result<ArrayRef, BindError> {
        let limit = self.config.auto_grow_collection_limit;
        if !self.config.auto_grow_nested_paths || index < array.len() {
            return Ok(array);
        }
        let canonical = prefix.canonical();
        if index >= limit {
            warn!("not growing `{}` to index {index}: the limit is {limit}", self.full_path(&canonical));
            return Ok(array);
        }
        let grown = grown_array(&array, index + 1)
            .map_err(|source| self.uninstantiable(&canonical, array.elem(), source))?;
        self.write_segment(prefix, &Value::Array(grown.clone()))?;
        Ok(grown)
    }

    fn grow_list_if_necessary(
        &self,
        list: &ListRef,
        index: usize,
        elem: &Type,
        prefix: &Segment,
    ) -> Result<(), BindError> {
        let limit = self.config.auto_grow_collection_limit;
        if !self.config.auto_grow_nested_paths || index < list.len() || elem.is_unknown() {
            return Ok(());
        }
        if index >= limit {
            warn!("not growing `{}` to index {index}: the limit is {limit}", self.full_path(&prefix.canonical()));
            return Ok(());
        }
        grow_list(list, elem, index).map_err(|source| self.uninstantiable(&prefix.canonical(), elem, source))
    }

    fn convert_for_property(&self, path: &str, raw: &Value, required: &Type) -> Result<Value, BindError> {
        self.type_converter()
            .convert_if_necessary(Some(path), raw, required)
            .map_err(|e| self.conversion_error(path, e))
    }
}

// -----------------------------------------------------------------------------
// Errors

impl Accessor {
    #[inline]
    fn index(&self, key: &str, canonical: &str) -> Result<usize, BindError> {
        parse_index(key).ok_or_else(|| self.invalid_index(canonical, format!("`{key}` is not a valid index")))
    }

    fn invalid_index(&self, canonical: &str, reason: String) -> BindError {
        BindError::InvalidIndex {
            bean: self.bean(),
            path: self.full_path(canonical),
            reason,
        }
    }

    #[inline]
    fn out_of_bounds(&self, canonical: &str) -> BindError {
        self.invalid_index(canonical, "index out of bounds".into())
    }

    fn null_indexed(&self, canonical: &str) -> BindError {
        BindError::NullIntermediate {
            bean: self.bean(),
            path: self.full_path(canonical),
        }
    }

    fn uninstantiable(&self, canonical: &str, ty: &Type, source: InstantiateError) -> BindError {
        BindError::Uninstantiable {
            path: self.full_path(canonical),
            type_name: ty.to_string(),
            source,
        }
    }

    fn access_error(&self, canonical: &str, required: &Type, fault: PropertyFault) -> BindError {
        match fault {
            PropertyFault::TypeClash { found } => BindError::TypeClash {
                path: self.full_path(canonical),
                required: required.clone(),
                found,
            },
            other => BindError::Access {
                bean: self.bean(),
                path: self.full_path(canonical),
                message: other.to_string(),
            },
        }
    }

    fn conversion_error(&self, canonical: &str, error: ConvertError) -> BindError {
        match error {
            ConvertError::Conversion(error) => {
                BindError::Conversion(error.with_path(self.full_path(canonical)))
            }
            other => other.into(),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("wrapped", &self.wrapped.class().path())
            .field("nested_path", &self.nested_path)
            .field("config", &self.config)
            .field("converters", &self.converters)
            .field("children", &self.children.len())
            .finish()
    }
}
