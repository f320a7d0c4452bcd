use alloc::sync::Arc;
use core::fmt;

use pw_utils::hash::HashMap;

use crate::convert::Converter;
use crate::convert::builtin::{BoolConverter, BytesConverter, CharConverter, CharsConverter};
use crate::convert::builtin::{CollectionConverter, MapConverter, NumberConverter};
use crate::convert::builtin::StringArrayConverter;
use crate::info::{ListShape, MapShape, NumberKind, SetShape, Type};

/// The default converter table, consulted after custom registrations.
///
/// Lookup order for a required type: overrides, built-in table, then the
/// naming convention `<type path>Converter` for classes and enums.
///
/// One table is shared read-only by every accessor of an
/// [`Engine`](crate::Engine); mutate it through [`Engine::defaults_mut`](crate::Engine::defaults_mut).
#[derive(Clone)]
pub struct DefaultConverters {
    table: HashMap<Type, Arc<dyn Converter>>,
    overrides: HashMap<Type, Arc<dyn Converter>>,
    conventions: HashMap<String, Arc<dyn Converter>>,
}

impl Default for DefaultConverters {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultConverters {
    /// A table with the built-in converters.
    pub fn new() -> Self {
        let mut this = Self::empty();
        this.register_builtins();
        this
    }

    /// A table without any converter.
    pub fn empty() -> Self {
        Self {
            table: HashMap::default(),
            overrides: HashMap::default(),
            conventions: HashMap::default(),
        }
    }

    #[inline]
    fn put(&mut self, ty: Type, converter: Arc<dyn Converter>) {
        self.table.insert(ty.erased(), converter);
    }

    fn register_builtins(&mut self) {
        self.put(Type::Bool, Arc::new(BoolConverter { allow_empty: false }));
        self.put(Type::optional(Type::Bool), Arc::new(BoolConverter { allow_empty: true }));
        self.put(Type::Char, Arc::new(CharConverter { allow_empty: false }));
        self.put(Type::optional(Type::Char), Arc::new(CharConverter { allow_empty: true }));
        for kind in NumberKind::ALL {
            let strict = NumberConverter {
                kind,
                allow_empty: false,
            };
            let lenient = NumberConverter {
                kind,
                allow_empty: true,
            };
            self.put(Type::Number(kind), Arc::new(strict));
            self.put(Type::optional(Type::Number(kind)), Arc::new(lenient));
        }

        self.put(Type::array(Type::U8), Arc::new(BytesConverter));
        self.put(Type::array(Type::Char), Arc::new(CharsConverter));

        let collections: Arc<dyn Converter> = Arc::new(CollectionConverter);
        for shape in [ListShape::Abstract, ListShape::Vec, ListShape::Linked] {
            self.put(Type::List(shape, Box::new(Type::Any)), collections.clone());
        }
        for shape in [SetShape::Abstract, SetShape::Hash, SetShape::Linked, SetShape::Sorted] {
            self.put(Type::Set(shape, Box::new(Type::Any)), collections.clone());
        }

        let maps: Arc<dyn Converter> = Arc::new(MapConverter);
        for shape in [MapShape::Abstract, MapShape::Hash, MapShape::Linked, MapShape::Sorted] {
            self.put(Type::Map(shape, Box::new(Type::Any), Box::new(Type::Any)), maps.clone());
        }
    }

    /// Adds converters commonly needed for configuration values: comma-separated
    /// text to string and integer arrays.
    pub fn register_config_value_converters(&mut self) {
        let strings: Arc<dyn Converter> = Arc::new(StringArrayConverter);
        for elem in [Type::Str, Type::I16, Type::I32, Type::I64] {
            self.put(Type::array(elem), strings.clone());
        }
    }

    /// Replaces the default converter of `ty` without touching the built-in table.
    pub fn override_converter(&mut self, ty: &Type, converter: Arc<dyn Converter>) {
        self.overrides.insert(ty.erased(), converter);
    }

    /// Registers the converter found by naming convention, e.g. `demo.MoneyConverter`
    /// for the class `demo.Money`.
    pub fn register_convention(&mut self, name: impl Into<String>, converter: Arc<dyn Converter>) {
        self.conventions.insert(name.into(), converter);
    }

    /// Registers every convention converter submitted with
    /// `submit_convention_converter!`.
    ///
    /// Returns `false` if none was submitted. Requires the `auto_register`
    /// feature; without it this does nothing and returns `false`.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::convert::ConventionConverter;

            let mut registered = false;
            for convention in inventory::iter::<ConventionConverter> {
                self.conventions
                    .insert(convention.name.to_owned(), (convention.create)());
                registered = true;
            }
            registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Restores the built-in state, dropping overrides, conventions and config-value converters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The default converter for `required`, if any.
    pub fn find(&self, required: &Type) -> Option<Arc<dyn Converter>> {
        let key = required.erased();
        if let Some(converter) = self.overrides.get(&key).or_else(|| self.table.get(&key)) {
            return Some(converter.clone());
        }
        let path = match required.unwrap_optional() {
            Type::Class(class) => class.path(),
            Type::Enum(info) => info.path(),
            _ => return None,
        };
        self.conventions.get(&format!("{path}Converter")).cloned()
    }
}

impl fmt::Debug for DefaultConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConverters")
            .field("table", &self.table.len())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .field("conventions", &self.conventions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::text_converter;
    use crate::info::ClassInfo;
    use crate::value::Value;

    #[test]
    fn builtins_by_erased_type() {
        let defaults = DefaultConverters::new();
        assert!(defaults.find(&Type::I32).is_some());
        assert!(defaults.find(&Type::optional(Type::F64)).is_some());
        assert!(defaults.find(&Type::map(Type::Str, Type::I32)).is_some());
        assert!(defaults.find(&Type::Str).is_none());
        assert!(defaults.find(&Type::array(Type::Str)).is_none());
        assert!(DefaultConverters::empty().find(&Type::I32).is_none());
    }

    #[test]
    fn config_values_and_reset() {
        let mut defaults = DefaultConverters::new();
        defaults.register_config_value_converters();
        assert!(defaults.find(&Type::array(Type::I32)).is_some());
        defaults.reset();
        assert!(defaults.find(&Type::array(Type::I32)).is_none());
    }

    #[test]
    fn override_and_convention() {
        let money = ClassInfo::builder("demo.Money").build();
        let mut defaults = DefaultConverters::new();
        assert!(defaults.find(&Type::class(&money)).is_none());

        defaults.register_convention(
            "demo.MoneyConverter",
            text_converter("money", |_, _| Ok(Value::Null)),
        );
        assert_eq!(defaults.find(&Type::class(&money)).unwrap().name(), "money");

        defaults.override_converter(&Type::Bool, text_converter("flag", |_, _| Ok(Value::Null)));
        assert_eq!(defaults.find(&Type::Bool).unwrap().name(), "flag");
    }

    #[cfg(feature = "auto_register")]
    crate::submit_convention_converter!("demo.auto.PercentConverter", || {
        text_converter("percent", |text, _| Ok(Value::from(text.trim_end_matches('%'))))
    });

    #[cfg(feature = "auto_register")]
    #[test]
    fn submitted_conventions_are_collected() {
        let percent = ClassInfo::builder("demo.auto.Percent").build();
        let mut defaults = DefaultConverters::new();
        assert!(defaults.auto_register());
        assert_eq!(defaults.find(&Type::class(&percent)).unwrap().name(), "percent");
    }
}
