//! Converters installed by [`DefaultConverters`](crate::convert::DefaultConverters).

use crate::convert::{ConvertFailure, Converter, convert_number, parse_number};
use crate::info::{NumberKind, Type};
use crate::value::{ListRef, MapRef, SetRef, Value};

// -----------------------------------------------------------------------------
// Primitives

/// `true`, `on`, `yes`, `1` and `false`, `off`, `no`, `0`, ignoring case
/// and surrounding whitespace.
pub struct BoolConverter {
    /// Blank text converts to null.
    pub allow_empty: bool,
}

impl Converter for BoolConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        let input = text.trim();
        if self.allow_empty && input.is_empty() {
            return Ok(Value::Null);
        }
        const TRUE: [&str; 4] = ["true", "on", "yes", "1"];
        const FALSE: [&str; 4] = ["false", "off", "no", "0"];
        if TRUE.iter().any(|t| t.eq_ignore_ascii_case(input)) {
            Ok(Value::Bool(true))
        } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(input)) {
            Ok(Value::Bool(false))
        } else {
            Err(ConvertFailure::Invalid(format!("invalid boolean value `{text}`")))
        }
    }
}

/// A single character or a `\uXXXX` escape.
pub struct CharConverter {
    /// Empty text converts to null.
    pub allow_empty: bool,
}

impl Converter for CharConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        if self.allow_empty && text.is_empty() {
            return Ok(Value::Null);
        }
        if let Some(code) = text.strip_prefix("\\u")
            && code.len() == 4
        {
            return u32::from_str_radix(code, 16)
                .ok()
                .and_then(char::from_u32)
                .map(Value::Char)
                .ok_or_else(|| ConvertFailure::Invalid(format!("invalid unicode escape `{text}`")));
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(ConvertFailure::Invalid(format!(
                "`{text}` is neither a single character nor a unicode escape"
            ))),
        }
    }
}

/// Numbers of one [`NumberKind`], see [`parse_number`].
pub struct NumberConverter {
    pub kind: NumberKind,
    /// Blank text converts to null.
    pub allow_empty: bool,
}

impl Converter for NumberConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        if self.allow_empty && text.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse_number(text, self.kind).map(Value::Number)
    }

    fn from_value(&self, value: &Value, _: &Type) -> Result<Value, ConvertFailure> {
        match value {
            Value::Number(number) => Ok(Value::Number(convert_number(*number, self.kind)?)),
            other => Ok(other.clone()),
        }
    }
}

// -----------------------------------------------------------------------------
// Arrays

/// The UTF-8 bytes of the text, as `[u8]`.
pub struct BytesConverter;

impl Converter for BytesConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        let bytes = text.bytes().map(Value::from).collect();
        Ok(Value::array(Type::U8, bytes))
    }
}

/// The characters of the text, as `[char]`.
pub struct CharsConverter;

impl Converter for CharsConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        let chars = text.chars().map(Value::Char).collect();
        Ok(Value::array(Type::Char, chars))
    }
}

/// Comma-separated text as `[String]`, elements trimmed.
///
/// Registered for string and integer arrays; the elements of the
/// result are converted to the required element type afterwards.
pub struct StringArrayConverter;

impl Converter for StringArrayConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        Ok(split_csv(text))
    }
}

/// Splits comma-separated text into a `[String]` with trimmed elements; empty
/// text yields an empty array.
pub(crate) fn split_csv(text: &str) -> Value {
    let items = if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').map(|item| Value::from(item.trim())).collect()
    };
    Value::array(Type::Str, items)
}

// -----------------------------------------------------------------------------
// Containers

/// Reshapes values into the required list or set.
///
/// An instance of the required type is kept; another collection or an array
/// is copied into a new instance; any other value becomes its single element.
pub struct CollectionConverter;

impl Converter for CollectionConverter {
    #[inline]
    fn from_text(&self, text: &str, required: &Type) -> Result<Value, ConvertFailure> {
        self.from_value(&Value::from(text), required)
    }

    fn from_value(&self, value: &Value, required: &Type) -> Result<Value, ConvertFailure> {
        if value.is_null() || required.accepts(value) {
            return Ok(value.clone());
        }
        let items = value
            .collection_items()
            .unwrap_or_else(|| vec![value.clone()]);
        match required.unwrap_optional() {
            Type::List(shape, _) => Ok(Value::List(ListRef::new(*shape, items))),
            Type::Set(shape, _) => Ok(Value::Set(SetRef::new(*shape, items))),
            _ => Ok(value.clone()),
        }
    }
}

/// Copies a map into the required map shape.
pub struct MapConverter;

impl Converter for MapConverter {
    fn from_text(&self, text: &str, _: &Type) -> Result<Value, ConvertFailure> {
        Err(ConvertFailure::Invalid(format!("text `{text}` cannot be converted to a map")))
    }

    fn from_value(&self, value: &Value, required: &Type) -> Result<Value, ConvertFailure> {
        if value.is_null() || required.accepts(value) {
            return Ok(value.clone());
        }
        match (value, required.unwrap_optional()) {
            (Value::Map(map), Type::Map(shape, ..)) => {
                Ok(Value::Map(MapRef::new(*shape, map.entries())))
            }
            _ => Err(ConvertFailure::Invalid(format!(
                "value of type `{}` cannot be converted to a map",
                value.type_name()
            ))),
        }
    }
}
