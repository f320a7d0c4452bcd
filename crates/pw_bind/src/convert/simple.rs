use alloc::sync::Arc;

use crate::convert::{ConversionService, Converter, CustomConverters, DefaultConverters, TypeConverter};
use crate::error::{BindError, RegistrationError};
use crate::info::Type;
use crate::value::Value;

/// A standalone converter, for conversions outside of any object graph.
///
/// Owns its custom registrations; the default table may be shared with an
/// [`Engine`](crate::Engine).
///
/// # Examples
///
/// ```
/// use pw_bind::convert::SimpleTypeConverter;
/// use pw_bind::info::Type;
/// use pw_bind::value::Value;
///
/// let converter = SimpleTypeConverter::new();
/// let value = converter.convert_if_necessary(&Value::from("0x10"), &Type::U16).unwrap();
/// assert_eq!(value, Value::from(16_u16));
/// ```
#[derive(Clone, Default)]
pub struct SimpleTypeConverter {
    custom: CustomConverters,
    defaults: Arc<DefaultConverters>,
    service: Option<Arc<dyn ConversionService>>,
}

impl SimpleTypeConverter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A converter sharing an existing default table.
    #[inline]
    pub fn with_defaults(defaults: Arc<DefaultConverters>) -> Self {
        Self {
            custom: CustomConverters::new(),
            defaults,
            service: None,
        }
    }

    /// See [`CustomConverters::register`].
    #[inline]
    pub fn register_converter(
        &mut self,
        ty: Option<Type>,
        path: Option<&str>,
        converter: Arc<dyn Converter>,
    ) -> Result<(), RegistrationError> {
        self.custom.register(ty, path, converter)
    }

    #[inline]
    pub fn set_conversion_service(&mut self, service: Option<Arc<dyn ConversionService>>) {
        self.service = service;
    }

    /// The default table, copied first if it is shared.
    #[inline]
    pub fn defaults_mut(&mut self) -> &mut DefaultConverters {
        Arc::make_mut(&mut self.defaults)
    }

    #[inline]
    fn type_converter(&self) -> TypeConverter<'_> {
        TypeConverter::new(&self.custom, &self.defaults, self.service.as_deref())
    }

    /// Converts `value` to `required`.
    #[inline]
    pub fn convert_if_necessary(&self, value: &Value, required: &Type) -> Result<Value, BindError> {
        Ok(self.type_converter().convert_if_necessary(None, value, required)?)
    }

    /// Converts `value` to `required` as if it were assigned to `path`, so that
    /// converters scoped to that path apply.
    #[inline]
    pub fn convert_for_property(
        &self,
        value: &Value,
        required: &Type,
        path: &str,
    ) -> Result<Value, BindError> {
        Ok(self.type_converter().convert_if_necessary(Some(path), value, required)?)
    }
}

impl core::fmt::Debug for SimpleTypeConverter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimpleTypeConverter")
            .field("custom", &self.custom)
            .field("defaults", &self.defaults)
            .field("service", &self.service.is_some())
            .finish()
    }
}
