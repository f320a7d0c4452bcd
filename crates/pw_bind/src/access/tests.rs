use alloc::sync::Arc;

use super::*;
use crate::convert::{ConvertFailure, GenericConversionService, text_converter};
use crate::error::{ConversionReason, ErrorKind};
use crate::info::{ClassInfo, EnumInfo, Exposure, PropertyDef, Type};
use crate::property::PropertyFault;

// -----------------------------------------------------------------------------
// Fixtures

fn address_class() -> Arc<ClassInfo> {
    ClassInfo::builder("demo.Address")
        .field("city", Type::Str)
        .field("zip", Type::I32)
        .build()
}

fn person_class(address: &Arc<ClassInfo>) -> Arc<ClassInfo> {
    ClassInfo::builder("demo.Person")
        .field("name", Type::Str)
        .field("age", Type::U8)
        .field("address", Type::class(address))
        .field("tags", Type::list(Type::Str))
        .field("scores", Type::array(Type::I32))
        .field("ranks", Type::map(Type::I32, Type::Str))
        .field("prices", Type::map(Type::Str, Type::F64))
        .field("codes", Type::set(Type::Str))
        .field_with("nickname", Type::Str, Exposure::ReadOnly)
        .field_with("token", Type::class(address), Exposure::WriteOnly)
        .field_with("secret", Type::Str, Exposure::Hidden)
        .build()
}

/// A person whose containers start empty instead of null.
fn person() -> ObjectRef {
    let address = address_class();
    let class = ClassInfo::builder("demo.Member")
        .extends(&person_class(&address), [])
        .init(|object| {
            object.set("name", Value::from("Ada"));
            object.set("tags", Value::list(Vec::new()));
            object.set("scores", Value::array(Type::I32, Vec::new()));
            object.set("codes", Value::set(vec![Value::from("a"), Value::from("b")]));
        })
        .build();
    class.instantiate().unwrap()
}

fn growing(root: ObjectRef, limit: usize) -> Accessor {
    let mut accessor = Accessor::new(root);
    accessor.set_auto_grow(true, limit);
    accessor
}

fn kind<T: core::fmt::Debug>(result: Result<T, BindError>) -> ErrorKind {
    match result {
        Ok(value) => panic!("expected an error, got {value:?}"),
        Err(error) => error.kind(),
    }
}

// -----------------------------------------------------------------------------
// Scenarios

#[test]
fn null_intermediate_is_materialized() {
    let root = person_class(&address_class()).instantiate().unwrap();
    let mut accessor = growing(root, 16);

    accessor.apply("address.city", "Paris").unwrap();

    let address = accessor.resolve("address").unwrap();
    let address = address.as_object().unwrap();
    assert_eq!(address.get("city"), Some(Value::from("Paris")));
    assert_eq!(accessor.cached_child("address").unwrap().nested_path(), "address.");
    assert!(accessor.cached_child("address").unwrap().wrapped().ptr_eq(address));
}

#[test]
fn null_intermediate_without_auto_grow() {
    let root = person_class(&address_class()).instantiate().unwrap();
    let mut accessor = Accessor::new(root);

    let Err(BindError::NullIntermediate { bean, path }) = accessor.apply("address.city", "Paris")
    else {
        panic!("expected a null intermediate");
    };
    assert_eq!(bean, "demo.Person");
    assert_eq!(path, "address");
    assert_eq!(kind(accessor.resolve("tags[0]")), ErrorKind::NullIntermediate);
}

#[test]
fn list_grows_on_write() {
    let mut accessor = growing(person(), 10);
    accessor.apply("tags[3]", "x").unwrap();

    let Value::List(tags) = accessor.resolve("tags").unwrap() else {
        panic!("expected a list");
    };
    assert_eq!(tags.len(), 4);
    assert_eq!(tags.get(3), Some(Value::from("x")));
    assert_eq!(tags.get(0), Some(Value::Null));

    let mut accessor = growing(person(), 2);
    assert_eq!(kind(accessor.apply("tags[3]", "x")), ErrorKind::InvalidIndex);
}

#[test]
fn text_is_converted_to_declared_type() {
    let mut accessor = Accessor::new(person());
    accessor.apply("age", "42").unwrap();
    assert_eq!(accessor.resolve("age").unwrap(), Value::from(42_u8));

    assert_eq!(kind(accessor.apply("age", "300")), ErrorKind::NumericOverflow);
    assert_eq!(kind(accessor.apply("age", "old")), ErrorKind::Conversion);
    assert_eq!(accessor.resolve("age").unwrap(), Value::from(42_u8));
}

#[test]
fn empty_text_resets_enum() {
    let color = EnumInfo::new("demo.Color", ["RED", "GREEN"]);
    let green = Value::enum_constant(&color, "GREEN").unwrap();
    let info = color.clone();
    let class = ClassInfo::builder("demo.Pen")
        .field("color", Type::enumeration(&color))
        .init(move |object| {
            object.set("color", Value::enum_constant(&info, "GREEN").unwrap_or_default());
        })
        .build();
    let mut accessor = Accessor::new(class.instantiate().unwrap());

    assert_eq!(accessor.resolve("color").unwrap(), green);
    accessor.apply("color", "").unwrap();
    assert_eq!(accessor.resolve("color").unwrap(), Value::Null);
    accessor.apply("color", "Color.RED").unwrap();
    assert_eq!(accessor.resolve("color").unwrap(), Value::enum_constant(&color, "RED").unwrap());
}

fn order_class() -> Arc<ClassInfo> {
    let item = ClassInfo::builder("demo.Item").field("price", Type::I64).build();
    ClassInfo::builder("demo.Order")
        .field("items", Type::list(Type::class(&item)))
        .field("total", Type::I64)
        .init(|object| {
            object.set("items", Value::list(Vec::new()));
        })
        .build()
}

fn cents() -> Arc<dyn crate::convert::Converter> {
    text_converter("cents", |text, _| {
        let (units, fraction) = text.split_once('.').unwrap_or((text, "0"));
        let units: i64 = units.parse().map_err(|_| ConvertFailure::Invalid(text.into()))?;
        let fraction: i64 = fraction.parse().map_err(|_| ConvertFailure::Invalid(text.into()))?;
        Ok(Value::from(units * 100 + fraction))
    })
}

#[test]
fn path_scoped_converter_wins_over_default() {
    let mut accessor = growing(order_class().instantiate().unwrap(), 16);
    accessor
        .register_converter(Some(Type::I64), Some("items.price"), cents())
        .unwrap();

    accessor.apply("items[0].price", "12.34").unwrap();
    assert_eq!(accessor.resolve("items[0].price").unwrap(), Value::from(1234_i64));

    accessor.apply("total", "12").unwrap();
    assert_eq!(accessor.resolve("total").unwrap(), Value::from(12_i64));
    assert_eq!(kind(accessor.apply("total", "12.34")), ErrorKind::Conversion);
}

// -----------------------------------------------------------------------------
// Auto-grow limit

#[test]
fn limit_applies_with_and_without_auto_grow() {
    for enabled in [true, false] {
        let mut accessor = Accessor::new(person());
        accessor.set_auto_grow(enabled, 4);

        accessor.apply("tags[3]", "last").unwrap();
        assert_eq!(kind(accessor.apply("tags[4]", "over")), ErrorKind::InvalidIndex);

        accessor.apply("scores[3]", "5").unwrap();
        assert_eq!(kind(accessor.apply("scores[4]", "6")), ErrorKind::InvalidIndex);

        assert_eq!(accessor.resolve("scores[3]").unwrap(), Value::from(5_i32));
        assert_eq!(accessor.resolve("scores[0]").unwrap(), Value::from(0_i32));
        assert_eq!(kind(accessor.resolve("scores[4]")), ErrorKind::InvalidIndex);
    }
}

#[test]
fn read_grows_list_with_default_elements() {
    let mut accessor = growing(order_class().instantiate().unwrap(), 8);
    let item = accessor.resolve("items[2]").unwrap();
    assert!(item.as_object().is_some());

    let Value::List(items) = accessor.resolve("items").unwrap() else {
        panic!("expected a list");
    };
    assert_eq!(items.len(), 3);
    assert_eq!(kind(accessor.resolve("items[8]")), ErrorKind::InvalidIndex);

    let mut plain = Accessor::new(order_class().instantiate().unwrap());
    assert_eq!(kind(plain.resolve("items[0]")), ErrorKind::InvalidIndex);
}

// -----------------------------------------------------------------------------
// Cache

#[test]
fn replaced_object_rebuilds_child_and_keeps_registration() {
    let leaf = ClassInfo::builder("demo.Leaf").field("c", Type::I64).build();
    let middle = ClassInfo::builder("demo.Middle").field("b", Type::class(&leaf)).build();
    let root = ClassInfo::builder("demo.Root").field("a", Type::class(&middle)).build();

    let mut accessor = growing(root.instantiate().unwrap(), 8);
    accessor.register_converter(None, Some("a.b.c"), cents()).unwrap();

    accessor.apply("a.b.c", "1.5").unwrap();
    let first = accessor.cached_child("a.b").unwrap().wrapped().clone();
    assert_eq!(first.get("c"), Some(Value::from(105_i64)));

    accessor.apply("a.b.c", "2.0").unwrap();
    assert!(accessor.cached_child("a.b").unwrap().wrapped().ptr_eq(&first));

    let replacement = leaf.instantiate().unwrap();
    accessor.apply("a.b", Value::Object(replacement.clone())).unwrap();
    accessor.apply("a.b.c", "3.25").unwrap();

    let rebuilt = accessor.cached_child("a.b").unwrap();
    assert!(rebuilt.wrapped().ptr_eq(&replacement));
    assert!(!rebuilt.wrapped().ptr_eq(&first));
    assert_eq!(replacement.get("c"), Some(Value::from(325_i64)));
    assert_eq!(first.get("c"), Some(Value::from(200_i64)));
}

#[test]
fn auto_grow_reaches_cached_children() {
    let root = person_class(&address_class()).instantiate().unwrap();
    let mut accessor = growing(root, 16);
    accessor.apply("address.city", "Oslo").unwrap();

    accessor.set_auto_grow(false, 3);
    let child = accessor.cached_child("address").unwrap();
    assert!(!child.config().auto_grow_nested_paths);
    assert_eq!(child.config().auto_grow_collection_limit, 3);
}

// -----------------------------------------------------------------------------
// Indexed access

#[test]
fn maps_convert_keys() {
    let mut accessor = growing(person(), 16);
    accessor.apply("ranks[7]", "seven").unwrap();
    accessor.apply("prices['EUR']", "1.5").unwrap();

    assert_eq!(accessor.resolve("ranks[7]").unwrap(), Value::from("seven"));
    assert_eq!(accessor.resolve("prices[EUR]").unwrap(), Value::from(1.5_f64));
    assert_eq!(
        accessor.resolve("prices[\"EUR\"]").unwrap(),
        accessor.resolve("prices[EUR]").unwrap()
    );
    assert_eq!(accessor.resolve("ranks[8]").unwrap(), Value::Null);

    accessor.set_auto_grow(false, 16);
    assert_eq!(kind(accessor.resolve("ranks[8]")), ErrorKind::InvalidIndex);
    assert_eq!(kind(accessor.resolve("ranks[x]")), ErrorKind::InvalidIndex);
    assert_eq!(kind(accessor.apply("ranks[x]", "?")), ErrorKind::Conversion);
}

#[test]
fn sets_are_read_by_position() {
    let mut accessor = Accessor::new(person());
    assert_eq!(accessor.resolve("codes[1]").unwrap(), Value::from("b"));
    assert_eq!(kind(accessor.resolve("codes[2]")), ErrorKind::InvalidIndex);
    assert_eq!(kind(accessor.resolve("codes[first]")), ErrorKind::InvalidIndex);
    assert_eq!(kind(accessor.apply("codes[0]", "z")), ErrorKind::InvalidTargetType);
}

#[test]
fn indexing_a_scalar() {
    let mut accessor = Accessor::new(person());
    let Err(BindError::InvalidTargetType { path, found, .. }) = accessor.resolve("name[0]") else {
        panic!("expected an invalid target type");
    };
    assert_eq!(path, "name[0]");
    assert_eq!(found, "String");
    assert_eq!(kind(accessor.apply("name[0]", "x")), ErrorKind::InvalidTargetType);
}

#[test]
fn generic_element_type_follows_concrete_holder() {
    let boxed = ClassInfo::builder("demo.Boxed")
        .type_param("T")
        .field("values", Type::list(Type::param("T")))
        .build();
    let numbers = ClassInfo::builder("demo.Numbers")
        .extends(&boxed, [Type::I32])
        .build();

    let mut accessor = growing(numbers.instantiate().unwrap(), 8);
    accessor.apply("values[0]", "5").unwrap();
    assert_eq!(accessor.resolve("values[0]").unwrap(), Value::from(5_i32));
    assert_eq!(accessor.property_type("values[0]"), Some(Type::I32));
}

#[test]
fn uninstantiable_intermediate() {
    let vault = ClassInfo::builder("demo.Vault")
        .field("code", Type::Str)
        .private_constructor()
        .build();
    let bank = ClassInfo::builder("demo.Bank").field("vault", Type::class(&vault)).build();

    let mut accessor = growing(bank.instantiate().unwrap(), 8);
    let Err(BindError::Uninstantiable { path, source, .. }) = accessor.apply("vault.code", "1234")
    else {
        panic!("expected an uninstantiable type");
    };
    assert_eq!(path, "vault");
    assert_eq!(source, crate::error::InstantiateError::PrivateConstructor);
}

// -----------------------------------------------------------------------------
// Readability and errors

#[test]
fn not_readable_and_not_writable() {
    let mut accessor = Accessor::new(person());

    assert_eq!(kind(accessor.resolve("missing")), ErrorKind::NotReadable);
    assert_eq!(kind(accessor.resolve("token")), ErrorKind::NotReadable);
    assert_eq!(kind(accessor.resolve("secret")), ErrorKind::NotReadable);

    let Err(BindError::NotWritable { reason, .. }) = accessor.apply("nickname", "Lovelace") else {
        panic!("expected a read-only property");
    };
    assert!(reason.contains("setter"));
    assert_eq!(kind(accessor.apply("missing", "x")), ErrorKind::NotWritable);

    let Err(BindError::NotWritable { path, .. }) = accessor.apply("token.city", "Rome") else {
        panic!("expected the unreadable intermediate to be reported as not writable");
    };
    assert_eq!(path, "token.city");
}

#[test]
fn probes_never_fail() {
    let mut accessor = Accessor::new(person());

    assert!(accessor.is_readable_property("name"));
    assert!(accessor.is_readable_property("nickname"));
    assert!(!accessor.is_readable_property("token"));
    assert!(!accessor.is_readable_property("address.city"));
    assert!(!accessor.is_readable_property("tags[0]"));
    assert!(!accessor.is_readable_property("a[0"));

    assert!(accessor.is_writable_property("name"));
    assert!(!accessor.is_writable_property("nickname"));
    assert!(accessor.is_writable_property("tags[0]"));
    assert!(!accessor.is_writable_property("ranks[1]"));

    assert_eq!(accessor.property_type("tags[0]"), Some(Type::Str));
    assert_eq!(accessor.property_type("prices"), Some(Type::map(Type::Str, Type::F64)));
    assert_eq!(accessor.property_type("missing"), None);
}

#[test]
fn field_mode_ignores_exposure() {
    let mut accessor = Accessor::direct(person());
    accessor.apply("secret", "hidden").unwrap();
    accessor.apply("nickname", "Countess").unwrap();
    assert_eq!(accessor.resolve("secret").unwrap(), Value::from("hidden"));
    assert_eq!(accessor.resolve("nickname").unwrap(), Value::from("Countess"));
}

#[test]
fn setter_faults_are_classified() {
    let class = ClassInfo::builder("demo.Guarded")
        .property(
            PropertyDef::new("locked", Type::Str)
                .getter(|_| Ok(Value::from("locked")))
                .setter(|_, _| Err(PropertyFault::Failed("the value is locked".into()))),
        )
        .property(
            PropertyDef::new("strict", Type::Any)
                .setter(|_, value| Err(PropertyFault::TypeClash { found: value.type_name() })),
        )
        .build();
    let mut accessor = Accessor::new(class.instantiate().unwrap());

    let Err(BindError::Access { message, .. }) = accessor.apply("locked", "open") else {
        panic!("expected an access error");
    };
    assert_eq!(message, "the value is locked");
    assert_eq!(kind(accessor.apply("strict", "x")), ErrorKind::TypeClash);
    assert_eq!(kind(accessor.resolve("strict")), ErrorKind::NotReadable);
}

#[test]
fn nested_conversion_error_reports_full_path() {
    let root = person_class(&address_class()).instantiate().unwrap();
    let mut accessor = growing(root, 8);
    let Err(BindError::Conversion(error)) = accessor.apply("address.zip", "north") else {
        panic!("expected a conversion error");
    };
    assert_eq!(error.path.as_deref(), Some("address.zip"));
    assert_eq!(error.value, Value::from("north"));
}

#[test]
fn deferred_service_failure_surfaces() {
    let point = ClassInfo::builder("demo.Point").build();
    let shape = ClassInfo::builder("demo.Shape")
        .field("origin", Type::class(&point))
        .field("sides", Type::I32)
        .build();

    let mut service = GenericConversionService::new();
    service.add_converter(Type::Str, Type::class(&point), |_, _| {
        Err(ConvertFailure::Invalid("not a point".into()))
    });
    service.add_converter(Type::Str, Type::I32, |_, _| {
        Err(ConvertFailure::Invalid("service refuses".into()))
    });
    let mut engine = Engine::new();
    engine.set_conversion_service(Some(Arc::new(service)));
    let mut accessor = engine.accessor(shape.instantiate().unwrap());

    let Err(BindError::Conversion(error)) = accessor.apply("origin", "1,2") else {
        panic!("expected a conversion error");
    };
    assert_eq!(error.path.as_deref(), Some("origin"));
    assert!(matches!(error.reason, ConversionReason::ServiceFailed { .. }));

    accessor.apply("sides", "4").unwrap();
    assert_eq!(accessor.resolve("sides").unwrap(), Value::from(4_i32));
}

#[test]
fn standalone_conversion() {
    let accessor = Accessor::new(person());
    assert_eq!(
        accessor.convert_if_necessary(&Value::from("0x10"), &Type::I32).unwrap(),
        Value::from(16_i32)
    );
    assert!(accessor.convert_if_necessary(&Value::from("x"), &Type::Bool).is_err());
}

// -----------------------------------------------------------------------------
// Batches

#[test]
fn batch_collects_property_failures() {
    let root = person();
    let mut values = PropertyValues::new();
    values
        .add("name", "Grace")
        .add("age", "old")
        .add("missing", "1")
        .add("scores[0]", "x")
        .add("tags[0]", "first");

    let Err(BindError::Batch(batch)) = batch_apply(&root, &values, true, false) else {
        panic!("expected a batch error");
    };
    assert_eq!(batch.len(), 2);
    assert!(batch.failure_for("age").is_some());
    assert!(batch.failure_for("scores[0]").is_some());
    assert!(batch.failure_for("missing").is_none());

    assert_eq!(resolve(&root, "name").unwrap(), Value::from("Grace"));
    assert_eq!(resolve(&root, "tags[0]").unwrap(), Value::from("first"));
}

#[test]
fn batch_raises_other_failures_at_once() {
    let root = person();
    let mut values = PropertyValues::new();
    values.add("missing", "1").add("name", "Grace");
    assert_eq!(kind(batch_apply(&root, &values, false, false)), ErrorKind::NotWritable);
    assert_eq!(resolve(&root, "name").unwrap(), Value::from("Ada"));

    let mut values = PropertyValues::new();
    values.push(PropertyValue::new("missing", "1").optional());
    values.add("address.city", "Lima").add("name", "Grace");
    assert_eq!(kind(batch_apply(&root, &values, false, false)), ErrorKind::NullIntermediate);

    batch_apply(&root, &values, false, true).unwrap();
    assert_eq!(resolve(&root, "name").unwrap(), Value::from("Grace"));
}

#[test]
fn batch_from_json() {
    let values: PropertyValues = serde_json::from_str(
        r#"{
            "name": "Hedy",
            "age": 36,
            "address.city": "Vienna",
            "tags[1]": "inventor",
            "ranks[1]": "first"
        }"#,
    )
    .unwrap();

    let mut engine = Engine::with_config(AccessorConfig::auto_growing());
    engine.config_mut().auto_grow_collection_limit = 8;
    let mut accessor = engine.accessor(person());
    accessor.set_property_values(&values, false, false).unwrap();

    assert_eq!(accessor.resolve("age").unwrap(), Value::from(36_u8));
    assert_eq!(accessor.resolve("address.city").unwrap(), Value::from("Vienna"));
    assert_eq!(accessor.resolve("tags[1]").unwrap(), Value::from("inventor"));
    assert_eq!(accessor.resolve("ranks[1]").unwrap(), Value::from("first"));
}

#[test]
fn batch_from_ron() {
    let values: PropertyValues =
        ron::from_str(r#"{ "age": "7", "scores": ["1", "2"], "codes": ["x"] }"#).unwrap();
    let root = person();
    batch_apply(&root, &values, false, false).unwrap();

    assert_eq!(resolve(&root, "age").unwrap(), Value::from(7_u8));
    assert_eq!(resolve(&root, "scores[1]").unwrap(), Value::from(2_i32));
    assert_eq!(resolve(&root, "codes[0]").unwrap(), Value::from("x"));
}
