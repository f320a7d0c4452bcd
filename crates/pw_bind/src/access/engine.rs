use alloc::sync::Arc;
use core::fmt;

use log::debug;

use crate::access::{Accessor, AccessorConfig};
use crate::convert::{ConversionService, DefaultConverters, SimpleTypeConverter};
use crate::value::ObjectRef;

/// Builds accessors sharing one default converter table and conversion service.
///
/// The default table is shared read-only by every accessor created from this
/// engine. Mutating it through [`Engine::defaults_mut`] affects accessors
/// created afterwards only.
///
/// # Examples
///
/// ```
/// use pw_bind::Engine;
/// use pw_bind::info::{ClassInfo, Type};
/// use pw_bind::value::Value;
///
/// let class = ClassInfo::builder("demo.Limits").field("ids", Type::array(Type::I32)).build();
///
/// let mut engine = Engine::new();
/// engine.defaults_mut().register_config_value_converters();
///
/// let mut accessor = engine.accessor(class.instantiate().unwrap());
/// accessor.apply("ids", "1, 2,3").unwrap();
///
/// let Value::Array(ids) = accessor.resolve("ids").unwrap() else { unreachable!() };
/// assert_eq!(ids.items(), [Value::from(1_i32), Value::from(2_i32), Value::from(3_i32)]);
/// ```
#[derive(Clone)]
pub struct Engine {
    defaults: Arc<DefaultConverters>,
    service: Option<Arc<dyn ConversionService>>,
    config: AccessorConfig,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the built-in default converters, the submitted convention
    /// converters and the default [`AccessorConfig`].
    pub fn new() -> Self {
        Self::with_config(AccessorConfig::default())
    }

    pub fn with_config(config: AccessorConfig) -> Self {
        let mut defaults = DefaultConverters::new();
        if defaults.auto_register() {
            debug!("registered submitted convention converters");
        }
        Self {
            defaults: Arc::new(defaults),
            service: None,
            config,
        }
    }

    /// The configuration given to new accessors.
    #[inline]
    pub fn config(&self) -> &AccessorConfig {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut AccessorConfig {
        &mut self.config
    }

    #[inline]
    pub fn defaults(&self) -> &DefaultConverters {
        &self.defaults
    }

    /// The default table, copied first if accessors still share it.
    #[inline]
    pub fn defaults_mut(&mut self) -> &mut DefaultConverters {
        Arc::make_mut(&mut self.defaults)
    }

    #[inline]
    pub fn set_conversion_service(&mut self, service: Option<Arc<dyn ConversionService>>) {
        self.service = service;
    }

    /// A new accessor over `root`.
    #[inline]
    pub fn accessor(&self, root: ObjectRef) -> Accessor {
        Accessor::with_parts(root, self.config, self.defaults.clone(), self.service.clone())
    }

    /// A standalone converter sharing this engine's defaults and service.
    pub fn simple_converter(&self) -> SimpleTypeConverter {
        let mut converter = SimpleTypeConverter::with_defaults(self.defaults.clone());
        converter.set_conversion_service(self.service.clone());
        converter
    }

    /// Restores the built-in default converters and the default configuration,
    /// and drops the conversion service.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("defaults", &self.defaults)
            .field("service", &self.service.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::text_converter;
    use crate::info::{ClassInfo, Type};
    use crate::value::Value;

    #[test]
    fn accessors_share_defaults_until_mutated() {
        let class = ClassInfo::builder("demo.Flag").field("on", Type::Bool).build();
        let mut engine = Engine::new();
        let mut before = engine.accessor(class.instantiate().unwrap());

        engine.defaults_mut().override_converter(
            &Type::Bool,
            text_converter("inverted", |text, _| Ok(Value::from(text == "off"))),
        );
        let mut after = engine.accessor(class.instantiate().unwrap());

        before.apply("on", "off").unwrap();
        after.apply("on", "off").unwrap();
        assert_eq!(before.resolve("on").unwrap(), Value::from(false));
        assert_eq!(after.resolve("on").unwrap(), Value::from(true));

        engine.reset();
        assert_ne!(engine.defaults().find(&Type::Bool).unwrap().name(), "inverted");
    }

    #[test]
    fn config_is_inherited() {
        let mut engine = Engine::with_config(AccessorConfig::auto_growing());
        engine.config_mut().auto_grow_collection_limit = 4;
        let class = ClassInfo::builder("demo.Empty").build();
        let accessor = engine.accessor(class.instantiate().unwrap());
        assert!(accessor.config().auto_grow_nested_paths);
        assert_eq!(accessor.config().auto_grow_collection_limit, 4);
    }
}
