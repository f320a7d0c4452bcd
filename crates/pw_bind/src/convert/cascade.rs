use alloc::sync::Arc;
use core::fmt;

use log::{debug, trace, warn};

use crate::convert::builtin::split_csv;
use crate::convert::{
    ConversionService, ConvertFailure, Converter, CustomConverters, DefaultConverters,
    convert_number,
};
use crate::error::{ConversionError, ConversionReason, ConvertError};
use crate::info::{ListShape, MapShape, SetShape, Type};
use crate::value::{EnumValue, ListRef, MapRef, SetRef, Value};

/// The path of element `key` of the collection at `path`.
#[inline]
fn keyed_path(path: Option<&str>, key: impl fmt::Display) -> Option<String> {
    path.map(|path| format!("{path}[{key}]"))
}

/// Converts raw values to required types.
///
/// Strategies are tried in this order:
///
/// 1. a custom converter registered for the required type or the property path;
/// 2. the conversion service, if it declares it can convert, a failure being deferred;
/// 3. the default converter of the required type;
/// 4. standard rules: element-wise conversion of arrays, collections and maps,
///    single-string construction, enum constants and numeric narrowing.
///
/// A deferred service failure is reported when nothing later produces an
/// instance of the required type.
pub struct TypeConverter<'a> {
    custom: &'a CustomConverters,
    defaults: &'a DefaultConverters,
    service: Option<&'a dyn ConversionService>,
}

impl<'a> TypeConverter<'a> {
    #[inline]
    pub fn new(
        custom: &'a CustomConverters,
        defaults: &'a DefaultConverters,
        service: Option<&'a dyn ConversionService>,
    ) -> Self {
        Self {
            custom,
            defaults,
            service,
        }
    }

    /// Converts `value` to `required`; `path` selects path-scoped converters.
    ///
    /// Values that already are instances of `required` are returned as they are,
    /// unless a custom converter applies.
    pub fn convert_if_necessary(
        &self,
        path: Option<&str>,
        value: &Value,
        required: &Type,
    ) -> Result<Value, ConvertError> {
        let mut converter = self.custom.find(required, path);
        let mut deferred: Option<ConversionError> = None;

        if converter.is_none()
            && !value.is_null()
            && let Some(service) = self.service
        {
            let source = value.runtime_type();
            if service.can_convert(&source, required) {
                match service.convert(value, &source, required) {
                    Ok(converted) => return Ok(converted),
                    Err(failure) => {
                        let reason = ConversionReason::ServiceFailed {
                            message: failure.to_string(),
                        };
                        deferred = Some(ConversionError::new(value.clone(), required, path, reason));
                    }
                }
            }
        }

        let mut converted = value.clone();
        let mut standard = false;

        if converter.is_some() || !required.accepts(&converted) {
            if required.is_collection()
                && required.element().is_some_and(Type::is_enum)
                && let Some(text) = converted.as_str()
            {
                converted = split_csv(text);
            }
            if converter.is_none() {
                converter = self.defaults.find(required);
            }
            converted = self.do_convert_value(value, converted, required, converter.as_ref(), path)?;
        }

        if !converted.is_null() {
            if required.is_unknown() {
                return Ok(converted);
            }
            if let Type::Array(elem) = required.unwrap_optional() {
                if elem.is_enum()
                    && let Some(text) = converted.as_str()
                {
                    converted = split_csv(text);
                }
                return self.convert_to_typed_array(converted, path, elem);
            }
            if matches!(converted, Value::List(_) | Value::Set(_)) {
                converted = self.convert_to_typed_collection(converted, path, required)?;
                standard = true;
            } else if matches!(converted, Value::Map(_)) {
                converted = self.convert_to_typed_map(converted, path, required)?;
                standard = true;
            }
            if let Value::Array(array) = &converted
                && array.len() == 1
                && let Some(sole) = array.get(0)
            {
                converted = sole;
                standard = true;
            }

            if *required == Type::Str && converted.is_primitive() {
                return Ok(Value::Str(converted.to_string()));
            }
            if let Value::Str(text) = &converted
                && !required.accepts(&converted)
            {
                if deferred.is_none()
                    && let Type::Class(class) = required
                    && !class.is_abstract()
                    && let Some(result) = class.construct_from_text(text)
                {
                    match result {
                        Ok(constructed) => return Ok(constructed),
                        Err(message) => {
                            debug!("construction of `{}` from text `{text}` failed: {message}", class.path());
                        }
                    }
                }
                let trimmed = text.trim();
                if let Type::Enum(info) = required.unwrap_optional() {
                    if trimmed.is_empty() {
                        return Ok(Value::Null);
                    }
                    if let Some(index) = info
                        .value_of_qualified(trimmed)
                        .or_else(|| info.value_of(trimmed))
                    {
                        converted = Value::Enum(EnumValue::at(info, index));
                    }
                }
                standard = true;
            } else if let Value::Number(number) = &converted
                && let Type::Number(kind) = required.unwrap_optional()
            {
                converted = Value::Number(convert_number(*number, *kind)?);
                standard = true;
            }
        }

        if !required.accepts(&converted) {
            if let Some(error) = deferred {
                warn!("{error}, raised by the conversion service");
                return Err(error.into());
            }
            if let Some(service) = self.service
                && !value.is_null()
            {
                let source = value.runtime_type();
                if service.can_convert(&source, required) {
                    return service.convert(value, &source, required).map_err(|failure| {
                        let reason = ConversionReason::ServiceFailed {
                            message: failure.to_string(),
                        };
                        ConversionError::new(value.clone(), required, path, reason).into()
                    });
                }
            }
            let reason = match &converter {
                Some(converter) => ConversionReason::InappropriateValue {
                    converter: converter.name(),
                    produced: converted.type_name(),
                },
                None => ConversionReason::NoStrategy,
            };
            return Err(ConversionError::new(value.clone(), required, path, reason).into());
        }

        if let Some(error) = deferred {
            if converter.is_none() && !standard && !required.is_unknown() {
                return Err(error.into());
            }
            debug!("conversion service failure ignored, the value was converted otherwise: {error}");
        }
        Ok(converted)
    }

    /// Applies `converter`, text values through [`Converter::from_text`], other
    /// values through [`Converter::from_value`].
    fn do_convert_value(
        &self,
        original: &Value,
        current: Value,
        required: &Type,
        converter: Option<&Arc<dyn Converter>>,
        path: Option<&str>,
    ) -> Result<Value, ConvertError> {
        let mut converter = converter;
        let mut current = current;

        if let Some(active) = converter
            && !matches!(current, Value::Str(_))
        {
            match active.from_value(&current, required) {
                Ok(result) => {
                    if result != current {
                        current = result;
                        converter = None;
                    }
                }
                Err(failure) => {
                    debug!(
                        "converter `{}` does not support values of type `{}`: {failure}",
                        active.name(),
                        current.type_name(),
                    );
                }
            }
        }

        let mut result = current.clone();
        if !required.is_array()
            && current.is_string_array()
            && let Some(items) = current.collection_items()
        {
            let joined: Vec<String> = items.iter().map(Value::to_string).collect();
            trace!("joining string array into comma-separated text for `{required}`");
            current = Value::Str(joined.join(","));
        }

        if let Value::Str(text) = &current {
            if let Some(active) = converter {
                return active.from_text(text, required).map_err(|failure| match failure {
                    ConvertFailure::Overflow(overflow) => ConvertError::Overflow(overflow),
                    ConvertFailure::Invalid(message) => {
                        let reason = ConversionReason::ConverterFailed {
                            converter: active.name(),
                            message,
                        };
                        ConversionError::new(original.clone(), required, path, reason).into()
                    }
                });
            }
            if *required == Type::Str {
                result = current.clone();
            }
        }
        Ok(result)
    }

    fn convert_to_typed_array(
        &self,
        input: Value,
        path: Option<&str>,
        elem: &Type,
    ) -> Result<Value, ConvertError> {
        let items = match &input {
            Value::List(_) | Value::Set(_) => input.collection_items().unwrap_or_default(),
            Value::Array(array) => {
                if array.elem() == elem && !self.custom.has_element_converter(Some(elem), path) {
                    return Ok(input);
                }
                array.items()
            }
            _ => vec![input],
        };
        let mut converted = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = keyed_path(path, index);
            converted.push(self.convert_if_necessary(item_path.as_deref(), item, elem)?);
        }
        Ok(Value::array(elem.clone(), converted))
    }

    fn convert_to_typed_collection(
        &self,
        original: Value,
        path: Option<&str>,
        required: &Type,
    ) -> Result<Value, ConvertError> {
        let Some(elem) = required.element().filter(|_| required.is_collection()) else {
            return Ok(original);
        };
        let mut original_allowed = required.accepts(&original);
        if elem.is_unknown()
            && original_allowed
            && !self.custom.has_element_converter(None, path)
        {
            return Ok(original);
        }
        let Some(items) = original.collection_items() else {
            return Ok(original);
        };

        let mut converted = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = keyed_path(path, index);
            let value = self.convert_if_necessary(item_path.as_deref(), item, elem)?;
            original_allowed = original_allowed && value == *item;
            converted.push(value);
        }
        if original_allowed {
            return Ok(original);
        }

        Ok(match (required.unwrap_optional(), &original) {
            (Type::List(ListShape::Abstract, _), Value::List(list)) => {
                Value::List(ListRef::new(list.shape(), converted))
            }
            (Type::Set(SetShape::Abstract, _), Value::Set(set)) => {
                Value::Set(SetRef::new(set.shape(), converted))
            }
            (Type::Set(shape, _), _) => Value::Set(SetRef::new(*shape, converted)),
            (Type::List(shape, _), _) => Value::List(ListRef::new(*shape, converted)),
            _ => Value::list(converted),
        })
    }

    fn convert_to_typed_map(
        &self,
        original: Value,
        path: Option<&str>,
        required: &Type,
    ) -> Result<Value, ConvertError> {
        let (Type::Map(shape, key_type, value_type), Value::Map(map)) =
            (required.unwrap_optional(), &original)
        else {
            return Ok(original);
        };
        let mut original_allowed = required.accepts(&original);
        if key_type.is_unknown()
            && value_type.is_unknown()
            && original_allowed
            && !self.custom.has_element_converter(None, path)
        {
            return Ok(original);
        }

        let entries = map.entries();
        let mut converted = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let entry_path = keyed_path(path, key);
            let new_key = self.convert_if_necessary(entry_path.as_deref(), key, key_type)?;
            let new_value = self.convert_if_necessary(entry_path.as_deref(), value, value_type)?;
            original_allowed = original_allowed && new_key == *key && new_value == *value;
            converted.push((new_key, new_value));
        }
        if original_allowed {
            return Ok(original);
        }

        let shape = match shape {
            MapShape::Abstract => map.shape(),
            other => *other,
        };
        Ok(Value::Map(MapRef::new(shape, converted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{GenericConversionService, text_converter};
    use crate::info::{ClassInfo, EnumInfo, NumberKind};

    fn convert(value: Value, required: &Type) -> Result<Value, ConvertError> {
        let custom = CustomConverters::new();
        let defaults = DefaultConverters::new();
        TypeConverter::new(&custom, &defaults, None).convert_if_necessary(None, &value, required)
    }

    fn reason(result: Result<Value, ConvertError>) -> ConversionReason {
        match result {
            Err(ConvertError::Conversion(error)) => error.reason,
            other => panic!("expected a conversion error, got {other:?}"),
        }
    }

    #[test]
    fn text_to_primitives() {
        assert_eq!(convert(Value::from("42"), &Type::I32).unwrap(), Value::from(42_i32));
        assert_eq!(convert(Value::from("yes"), &Type::Bool).unwrap(), Value::Bool(true));
        assert_eq!(convert(Value::from(" "), &Type::optional(Type::I64)).unwrap(), Value::Null);
        assert_eq!(convert(Value::from(7_i64), &Type::Str).unwrap(), Value::from("7"));
    }

    #[test]
    fn numbers_narrow_with_overflow_check() {
        assert_eq!(convert(Value::from(42_i64), &Type::U8).unwrap(), Value::from(42_u8));
        assert!(matches!(
            convert(Value::from(300_i64), &Type::U8),
            Err(ConvertError::Overflow(_))
        ));
        assert!(matches!(
            convert(Value::from("70000"), &Type::I16),
            Err(ConvertError::Overflow(_))
        ));
    }

    #[test]
    fn converter_failure_keeps_original_value() {
        let ConversionReason::ConverterFailed { message, .. } = reason(convert(Value::from("x1"), &Type::I32))
        else {
            panic!("expected a converter failure");
        };
        assert!(message.contains("x1"));
    }

    #[test]
    fn enums() {
        let color = EnumInfo::new("demo.Color", ["RED", "GREEN"]);
        let required = Type::enumeration(&color);
        assert_eq!(convert(Value::from("  "), &required).unwrap(), Value::Null);
        assert_eq!(
            convert(Value::from(" GREEN "), &required).unwrap(),
            Value::enum_constant(&color, "GREEN").unwrap()
        );
        assert_eq!(
            convert(Value::from("Color.RED"), &required).unwrap(),
            Value::enum_constant(&color, "RED").unwrap()
        );
        assert_eq!(reason(convert(Value::from("BLUE"), &required)), ConversionReason::NoStrategy);

        let Value::List(list) = convert(Value::from("RED, GREEN"), &Type::list(required)).unwrap() else {
            panic!("expected a list");
        };
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn text_constructor() {
        let money = ClassInfo::builder("demo.Money")
            .field("cents", Type::I64)
            .text_constructor(|class, text| {
                let cents: i64 = text.parse().map_err(|_| format!("bad amount `{text}`"))?;
                let object = class.instantiate().map_err(|e| e.to_string())?;
                object.set("cents", Value::from(cents));
                Ok(Value::Object(object))
            })
            .build();
        let required = Type::class(&money);

        let Value::Object(object) = convert(Value::from("125"), &required).unwrap() else {
            panic!("expected an object");
        };
        assert_eq!(object.get("cents"), Some(Value::from(125_i64)));
        assert_eq!(reason(convert(Value::from("abc"), &required)), ConversionReason::NoStrategy);
    }

    #[test]
    fn single_element_array_is_unwrapped() {
        let array = Value::array(Type::Str, vec![Value::from("5")]);
        assert_eq!(convert(array, &Type::I32).unwrap(), Value::from(5_i32));
    }

    #[test]
    fn typed_arrays() {
        let Value::Array(array) = convert(Value::list(vec![Value::from("1"), Value::from("2")]), &Type::array(Type::I32)).unwrap()
        else {
            panic!("expected an array");
        };
        assert_eq!(array.items(), vec![Value::from(1_i32), Value::from(2_i32)]);

        let same = Value::array(Type::I32, vec![Value::from(1_i32)]);
        assert_eq!(convert(same.clone(), &Type::array(Type::I32)).unwrap(), same);

        let Value::Array(single) = convert(Value::from("9"), &Type::array(Type::I64)).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(single.items(), vec![Value::from(9_i64)]);
    }

    #[test]
    fn collections_are_not_copied_without_need() {
        let list = Value::list(vec![Value::from(1_i32), Value::from(2_i32)]);
        assert_eq!(convert(list.clone(), &Type::list(Type::I32)).unwrap(), list);

        let texts = Value::list(vec![Value::from("1"), Value::from("2")]);
        let Value::List(converted) = convert(texts.clone(), &Type::list(Type::I64)).unwrap() else {
            panic!("expected a list");
        };
        assert_ne!(Value::List(converted.clone()), texts);
        assert_eq!(converted.items(), vec![Value::from(1_i64), Value::from(2_i64)]);

        let map = Value::map(vec![(Value::from("a"), Value::from("1"))]);
        let Value::Map(typed) = convert(map, &Type::map(Type::Str, Type::U16)).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(typed.get(&Value::from("a")), Some(Value::from(1_u16)));
    }

    #[test]
    fn inappropriate_converter_result() {
        let mut custom = CustomConverters::new();
        custom
            .register(Some(Type::I32), None, text_converter("broken", |text, _| Ok(Value::from(text))))
            .unwrap();
        let defaults = DefaultConverters::new();
        let converter = TypeConverter::new(&custom, &defaults, None);

        let result = converter.convert_if_necessary(Some("count"), &Value::from("x"), &Type::I32);
        let Err(ConvertError::Conversion(error)) = result else {
            panic!("expected a conversion error");
        };
        assert_eq!(error.path.as_deref(), Some("count"));
        assert_eq!(
            error.reason,
            ConversionReason::InappropriateValue {
                converter: "broken".into(),
                produced: "String".into(),
            }
        );
    }

    #[test]
    fn deferred_service_failure() {
        let point = ClassInfo::builder("demo.Point").build();
        let mut service = GenericConversionService::new();
        service.add_converter(Type::Str, Type::class(&point), |_, _| {
            Err(ConvertFailure::Invalid("not a point".into()))
        });
        service.add_converter(Type::Str, Type::I32, |_, _| {
            Err(ConvertFailure::Invalid("service refuses".into()))
        });

        let custom = CustomConverters::new();
        let defaults = DefaultConverters::new();
        let converter = TypeConverter::new(&custom, &defaults, Some(&service));

        // Nothing else converts: the deferred failure surfaces.
        let result = converter.convert_if_necessary(None, &Value::from("1,2"), &Type::class(&point));
        assert_eq!(
            reason(result),
            ConversionReason::ServiceFailed {
                message: "not a point".into()
            }
        );

        // The default number converter still runs after the service failed.
        let result = converter.convert_if_necessary(None, &Value::from("12"), &Type::I32);
        assert_eq!(result.unwrap(), Value::from(12_i32));
    }

    #[test]
    fn service_result_is_used() {
        let mut service = GenericConversionService::new();
        service.add_converter(Type::Str, Type::I64, |_, _| Ok(Value::from(-1_i64)));
        let custom = CustomConverters::new();
        let defaults = DefaultConverters::new();
        let converter = TypeConverter::new(&custom, &defaults, Some(&service));
        assert_eq!(
            converter.convert_if_necessary(None, &Value::from("5"), &Type::I64).unwrap(),
            Value::from(-1_i64)
        );
        assert_eq!(
            converter.convert_if_necessary(None, &Value::from("5"), &Type::Number(NumberKind::I32)).unwrap(),
            Value::from(5_i32)
        );
    }
}
