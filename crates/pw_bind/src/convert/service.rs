use alloc::boxed::Box;
use core::fmt;

use log::trace;
use pw_utils::hash::HashMap;

use crate::convert::ConvertFailure;
use crate::info::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// ConversionService

/// A general-purpose conversion facility consulted before the default converters.
///
/// A failure of a service that declared it can convert is deferred: the rest of
/// the cascade still runs, and the failure is only reported if nothing else
/// produces a value of the required type.
pub trait ConversionService: Send + Sync {
    /// Whether values of type `source` can be converted to `target`.
    fn can_convert(&self, source: &Type, target: &Type) -> bool;

    /// Converts `value`, of runtime type `source`, to `target`.
    fn convert(&self, value: &Value, source: &Type, target: &Type) -> Result<Value, ConvertFailure>;
}

// -----------------------------------------------------------------------------
// GenericConversionService

type ConvertFn = Box<dyn Fn(&Value, &Type) -> Result<Value, ConvertFailure> + Send + Sync>;

/// A [`ConversionService`] backed by functions registered per source and target type.
///
/// Lookup uses the erased types, so a function registered for `List<?>` serves
/// every list element type. When no exact pair is registered, the first
/// registration whose source type is assignable from the actual source is used.
///
/// # Examples
///
/// ```
/// use pw_bind::convert::{ConversionService, GenericConversionService};
/// use pw_bind::info::Type;
/// use pw_bind::value::Value;
///
/// let mut service = GenericConversionService::new();
/// service.add_converter(Type::Bool, Type::Str, |value, _| {
///     Ok(Value::from(if value.as_bool() == Some(true) { "Y" } else { "N" }))
/// });
///
/// assert!(service.can_convert(&Type::Bool, &Type::Str));
/// let converted = service.convert(&Value::Bool(true), &Type::Bool, &Type::Str).unwrap();
/// assert_eq!(converted, Value::from("Y"));
/// ```
#[derive(Default)]
pub struct GenericConversionService {
    converters: HashMap<(Type, Type), ConvertFn>,
    order: Vec<(Type, Type)>,
}

impl GenericConversionService {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for conversions from `source` to `target`, replacing a
    /// previous registration of the same pair.
    pub fn add_converter<F>(&mut self, source: Type, target: Type, f: F)
    where
        F: Fn(&Value, &Type) -> Result<Value, ConvertFailure> + Send + Sync + 'static,
    {
        let key = (source.erased(), target.erased());
        if self.converters.insert(key.clone(), Box::new(f)).is_none() {
            self.order.push(key);
        }
    }

    fn lookup(&self, source: &Type, target: &Type) -> Option<&ConvertFn> {
        let target = target.erased();
        if let Some(f) = self.converters.get(&(source.erased(), target.clone())) {
            return Some(f);
        }
        let key = self
            .order
            .iter()
            .find(|(from, to)| *to == target && from.is_assignable_from(source))?;
        trace!("conversion from `{source}` to `{target}` served by `{}`", key.0);
        self.converters.get(key)
    }
}

impl ConversionService for GenericConversionService {
    #[inline]
    fn can_convert(&self, source: &Type, target: &Type) -> bool {
        self.lookup(source, target).is_some()
    }

    fn convert(&self, value: &Value, source: &Type, target: &Type) -> Result<Value, ConvertFailure> {
        match self.lookup(source, target) {
            Some(f) => f(value, target),
            None => Err(ConvertFailure::Invalid(format!(
                "no conversion from `{source}` to `{target}`"
            ))),
        }
    }
}

impl fmt::Debug for GenericConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericConversionService")
            .field("pairs", &self.order)
            .finish()
    }
}
