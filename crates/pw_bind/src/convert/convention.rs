use alloc::sync::Arc;

use crate::convert::Converter;

/// A converter discovered by naming convention, submitted at link time.
///
/// The converter named `demo.MoneyConverter` serves the class or enum `demo.Money`.
/// Use [`submit_convention_converter!`](crate::submit_convention_converter) instead
/// of constructing this directly.
pub struct ConventionConverter {
    /// Full name of the converter, the class path followed by `Converter`.
    pub name: &'static str,
    pub create: fn() -> Arc<dyn Converter>,
}

#[cfg(feature = "auto_register")]
inventory::collect!(ConventionConverter);

/// Submits a naming-convention converter, collected by
/// [`DefaultConverters::auto_register`](crate::convert::DefaultConverters::auto_register).
///
/// Requires the `auto_register` feature.
///
/// # Examples
///
/// ```
/// use pw_bind::convert::text_converter;
/// use pw_bind::value::Value;
///
/// pw_bind::submit_convention_converter!("demo.SizeConverter", || {
///     text_converter("size", |text, _| Ok(Value::from(text.len() as i64)))
/// });
/// # fn main() {}
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_convention_converter {
    ($name:literal, $create:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::__macro_exports::ConventionConverter {
                name: $name,
                create: $create,
            }
        }
    };
}
