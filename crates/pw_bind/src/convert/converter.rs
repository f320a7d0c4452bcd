use alloc::borrow::Cow;
use alloc::sync::Arc;

use thiserror::Error;

use crate::error::NumericOverflowError;
use crate::info::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// ConvertFailure

/// Failure reported by a [`Converter`] or a conversion service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertFailure {
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Overflow(#[from] NumericOverflowError),
}

// -----------------------------------------------------------------------------
// Converter

/// Turns a raw value, most often text, into a value of a required type.
///
/// Converters are shared between accessors, so they must be stateless or
/// internally synchronized.
pub trait Converter: Send + Sync + 'static {
    /// Converts `text` to `required`.
    fn from_text(&self, text: &str, required: &Type) -> Result<Value, ConvertFailure>;

    /// Converts a value that is not text.
    ///
    /// The default keeps `value` unchanged, which leaves the decision to
    /// the standard conversion rules.
    fn from_value(&self, value: &Value, required: &Type) -> Result<Value, ConvertFailure> {
        let _ = required;
        Ok(value.clone())
    }

    /// Name used in error messages.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(core::any::type_name::<Self>())
    }
}

struct TextConverter<F> {
    name: &'static str,
    f: F,
}

impl<F> Converter for TextConverter<F>
where
    F: Fn(&str, &Type) -> Result<Value, ConvertFailure> + Send + Sync + 'static,
{
    #[inline]
    fn from_text(&self, text: &str, required: &Type) -> Result<Value, ConvertFailure> {
        (self.f)(text, required)
    }

    #[inline]
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.name)
    }
}

/// Wraps a text conversion closure into a shared [`Converter`].
///
/// # Examples
///
/// ```
/// use pw_bind::convert::{Converter, text_converter};
/// use pw_bind::info::Type;
/// use pw_bind::value::Value;
///
/// let upper = text_converter("upper", |text, _| Ok(Value::from(text.to_uppercase())));
/// assert_eq!(upper.from_text("eur", &Type::Str).unwrap(), Value::from("EUR"));
/// assert_eq!(upper.name(), "upper");
/// ```
pub fn text_converter<F>(name: &'static str, f: F) -> Arc<dyn Converter>
where
    F: Fn(&str, &Type) -> Result<Value, ConvertFailure> + Send + Sync + 'static,
{
    Arc::new(TextConverter { name, f })
}
