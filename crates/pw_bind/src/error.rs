//! Error types raised while resolving paths, converting values and applying batches.
//!
//! Every fallible operation of this crate reports a [`BindError`]. Callers that need
//! to branch on the outcome should match on [`BindError::kind`] instead of the variant
//! payloads, which may grow over time.
//!
//! ## Menu
//!
//! - [`BindError`] / [`ErrorKind`]: top-level error and its fieldless kind.
//! - [`MalformedPathError`]: a path string could not be tokenized.
//! - [`ConversionError`] / [`ConversionReason`]: no strategy produced the required type.
//! - [`NumericOverflowError`]: a number does not fit the required numeric type.
//! - [`InstantiateError`]: a type cannot be constructed during auto-growing.
//! - [`BatchError`] / [`PropertyFailure`]: failures collected by a batch update.
//! - [`RegistrationError`]: a converter registration without any scope.

use alloc::borrow::Cow;
use core::fmt;

use thiserror::Error;

use crate::info::{NumberKind, Type};
use crate::value::Value;

// -----------------------------------------------------------------------------
// MalformedPathError

/// A path string that could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedPathError {
    /// The full path being parsed.
    pub path: String,
    /// Byte offset in `path` where parsing failed.
    pub offset: usize,
    /// The underlying reason.
    pub reason: Cow<'static, str>,
}

impl fmt::Display for MalformedPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Encountered an error at offset {} while parsing property path `{}`: {}",
            self.offset, self.path, self.reason,
        )
    }
}

impl core::error::Error for MalformedPathError {}

// -----------------------------------------------------------------------------
// ConversionError

/// Why a [`ConversionError`] was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConversionReason {
    /// No converter, conversion service or standard rule matched.
    NoStrategy,
    /// A converter ran but its result is not an instance of the required type.
    InappropriateValue {
        converter: Cow<'static, str>,
        produced: String,
    },
    /// A converter rejected the text it was given.
    ConverterFailed {
        converter: Cow<'static, str>,
        message: String,
    },
    /// The conversion service declared it could convert, then failed.
    ServiceFailed { message: String },
}

/// A raw value could not be converted to the required type.
///
/// Carries the original raw value, the required type and, when the conversion
/// was performed for a property, the property path.
#[derive(Debug, Clone)]
pub struct ConversionError {
    pub value: Value,
    pub required: Type,
    pub path: Option<String>,
    pub reason: ConversionReason,
}

impl ConversionError {
    #[inline]
    pub(crate) fn new(
        value: Value,
        required: &Type,
        path: Option<&str>,
        reason: ConversionReason,
    ) -> Self {
        Self {
            value,
            required: required.clone(),
            path: path.map(String::from),
            reason,
        }
    }

    /// Replaces the property path, used when a nested accessor reports the failure
    /// with its local name.
    #[inline]
    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = Some(path);
        self
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot convert value `{}` of type `{}` to required type `{}`",
            self.value,
            self.value.type_name(),
            self.required,
        )?;
        if let Some(path) = &self.path {
            write!(f, " for property `{path}`")?;
        }
        match &self.reason {
            ConversionReason::NoStrategy => {
                f.write_str(": no matching converter or conversion strategy found")
            }
            ConversionReason::InappropriateValue {
                converter,
                produced,
            } => write!(
                f,
                ": converter `{converter}` returned inappropriate value of type `{produced}`"
            ),
            ConversionReason::ConverterFailed { converter, message } => {
                write!(f, ": converter `{converter}` failed: {message}")
            }
            ConversionReason::ServiceFailed { message } => {
                write!(f, ": conversion service failed: {message}")
            }
        }
    }
}

impl core::error::Error for ConversionError {}

// -----------------------------------------------------------------------------
// NumericOverflowError

/// A number that does not fit into the required numeric type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Numeric value `{value}` does not fit into `{target}`")]
pub struct NumericOverflowError {
    pub value: String,
    pub target: NumberKind,
}

// -----------------------------------------------------------------------------
// ConvertError

/// Error produced by the conversion cascade.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ConvertError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Overflow(#[from] NumericOverflowError),
}

// -----------------------------------------------------------------------------
// InstantiateError

/// Why a type could not be instantiated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InstantiateError {
    #[error("the type is abstract")]
    Abstract,

    #[error("auto-growing is not allowed with a private constructor")]
    PrivateConstructor,

    #[error("the type has no default constructor")]
    NoDefaultConstructor,

    #[error("the type has no constructible default value")]
    Unsupported,
}

// -----------------------------------------------------------------------------
// RegistrationError

/// A converter registration that cannot be accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("either a required type or a property path must be given")]
    MissingScope,

    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),
}

// -----------------------------------------------------------------------------
// BatchError

/// A single failure collected while applying a batch.
#[derive(Debug, Clone)]
pub struct PropertyFailure {
    pub path: String,
    pub error: BindError,
}

/// All per-property failures of one batch update.
///
/// Raised after the whole batch has been processed; every path that did not
/// fail stays applied.
#[derive(Debug, Clone, Default)]
pub struct BatchError {
    pub failures: Vec<PropertyFailure>,
}

impl BatchError {
    #[inline]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the failure recorded for `path`, if any.
    pub fn failure_for(&self, path: &str) -> Option<&BindError> {
        self.failures
            .iter()
            .find(|failure| failure.path == path)
            .map(|failure| &failure.error)
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed properties: {} failure(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; `{}`: {}", failure.path, failure.error)?;
        }
        Ok(())
    }
}

impl core::error::Error for BatchError {}

// -----------------------------------------------------------------------------
// BindError

/// Error raised by path resolution, property access and conversion.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum BindError {
    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),

    #[error("Value of nested property `{path}` is null on bean `{bean}`")]
    NullIntermediate { bean: String, path: String },

    #[error("Invalid index or key in property path `{path}` of bean `{bean}`: {reason}")]
    InvalidIndex {
        bean: String,
        path: String,
        reason: String,
    },

    #[error(
        "Property referenced in indexed path `{path}` of bean `{bean}` is neither an array nor a list, set or map; found `{found}`"
    )]
    InvalidTargetType {
        bean: String,
        path: String,
        found: String,
    },

    #[error("Property `{path}` of bean `{bean}` is not readable")]
    NotReadable { bean: String, path: String },

    #[error("Property `{path}` of bean `{bean}` is not writable: {reason}")]
    NotWritable {
        bean: String,
        path: String,
        reason: String,
    },

    #[error("Failed to access property `{path}` of bean `{bean}`: {message}")]
    Access {
        bean: String,
        path: String,
        message: String,
    },

    #[error("Property `{path}` requires `{required}` but was given `{found}`")]
    TypeClash {
        path: String,
        required: Type,
        found: String,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    NumericOverflow(#[from] NumericOverflowError),

    #[error("Could not instantiate `{type_name}` to auto-grow property path `{path}`: {source}")]
    Uninstantiable {
        path: String,
        type_name: String,
        source: InstantiateError,
    },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl From<ConvertError> for BindError {
    #[inline]
    fn from(value: ConvertError) -> Self {
        match value {
            ConvertError::Conversion(e) => BindError::Conversion(e),
            ConvertError::Overflow(e) => BindError::NumericOverflow(e),
        }
    }
}

/// The outcome category of a [`BindError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    MalformedPath,
    NullIntermediate,
    InvalidIndex,
    InvalidTargetType,
    NotReadable,
    NotWritable,
    Access,
    TypeClash,
    Conversion,
    NumericOverflow,
    Uninstantiable,
    Batch,
}

impl BindError {
    /// Returns the fieldless category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::MalformedPath(_) => ErrorKind::MalformedPath,
            BindError::NullIntermediate { .. } => ErrorKind::NullIntermediate,
            BindError::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            BindError::InvalidTargetType { .. } => ErrorKind::InvalidTargetType,
            BindError::NotReadable { .. } => ErrorKind::NotReadable,
            BindError::NotWritable { .. } => ErrorKind::NotWritable,
            BindError::Access { .. } => ErrorKind::Access,
            BindError::TypeClash { .. } => ErrorKind::TypeClash,
            BindError::Conversion(_) => ErrorKind::Conversion,
            BindError::NumericOverflow(_) => ErrorKind::NumericOverflow,
            BindError::Uninstantiable { .. } => ErrorKind::Uninstantiable,
            BindError::Batch(_) => ErrorKind::Batch,
        }
    }

    /// Whether this is a failure of a single property that a batch collects
    /// instead of aborting.
    #[inline]
    pub fn is_property_access(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Access
                | ErrorKind::TypeClash
                | ErrorKind::Conversion
                | ErrorKind::NumericOverflow
        )
    }

    /// Maps a failure to read an intermediate into the write-side equivalent.
    pub(crate) fn into_not_writable(self, bean: &str, path: &str) -> Self {
        match self {
            BindError::NotReadable { path: inner, .. } => BindError::NotWritable {
                bean: bean.into(),
                path: path.into(),
                reason: format!("nested property `{inner}` does not exist"),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_property_access() {
        let err = BindError::NullIntermediate {
            bean: "demo.Person".into(),
            path: "address.city".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NullIntermediate);
        assert!(!err.is_property_access());

        let err: BindError = NumericOverflowError {
            value: "300".into(),
            target: NumberKind::U8,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NumericOverflow);
        assert!(err.is_property_access());
    }

    #[test]
    fn not_readable_becomes_not_writable() {
        let err = BindError::NotReadable {
            bean: "demo.Person".into(),
            path: "address".into(),
        };
        let err = err.into_not_writable("demo.Person", "address.city");
        match err {
            BindError::NotWritable { path, .. } => assert_eq!(path, "address.city"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn conversion_message() {
        let err = ConversionError::new(
            Value::from("abc"),
            &Type::Number(NumberKind::I32),
            Some("count"),
            ConversionReason::NoStrategy,
        );
        let text = err.to_string();
        assert!(text.contains("`abc`"));
        assert!(text.contains("`i32`"));
        assert!(text.contains("property `count`"));
    }

    #[test]
    fn malformed_path_message() {
        let err = MalformedPathError {
            path: "a[0".into(),
            offset: 1,
            reason: Cow::Borrowed("unclosed `[`"),
        };
        assert_eq!(
            err.to_string(),
            "Encountered an error at offset 1 while parsing property path `a[0`: unclosed `[`"
        );
    }
}
