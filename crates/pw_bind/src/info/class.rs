use alloc::borrow::Cow;
use alloc::sync::Arc;
use core::fmt;

use crate::error::InstantiateError;
use crate::info::{Type, next_type_id};
use crate::property::PropertyFault;
use crate::value::{Object, ObjectRef, Value};

// -----------------------------------------------------------------------------
// Aliases

/// Reads an accessor-pair property.
pub type Getter = Arc<dyn Fn(&Object) -> Result<Value, PropertyFault> + Send + Sync>;

/// Writes an accessor-pair property.
pub type Setter = Arc<dyn Fn(&Object, Value) -> Result<(), PropertyFault> + Send + Sync>;

/// Runs after the slots of a new instance have been zeroed.
pub type Initializer = Arc<dyn Fn(&Object) + Send + Sync>;

/// Builds an instance from a single string argument.
pub type TextConstructor =
    Arc<dyn Fn(&Arc<ClassInfo>, &str) -> Result<Value, String> + Send + Sync>;

// -----------------------------------------------------------------------------
// ClassId

/// Unique identity of a [`ClassInfo`] within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// How a declared field is exposed as a bean property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Exposure {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
    /// Only reachable through direct field access.
    Hidden,
}

impl Exposure {
    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self, Exposure::ReadWrite | Exposure::ReadOnly)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        matches!(self, Exposure::ReadWrite | Exposure::WriteOnly)
    }
}

/// A declared data slot of a class.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    name: Cow<'static, str>,
    ty: Type,
    exposure: Exposure,
    owner: ClassId,
}

impl FieldInfo {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type as written in the declaring class.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    /// The class that declared this field.
    #[inline]
    pub fn owner(&self) -> ClassId {
        self.owner
    }
}

// -----------------------------------------------------------------------------
// PropertyDef

/// A property backed by a getter and/or a setter instead of a field.
#[derive(Clone)]
pub struct PropertyDef {
    name: Cow<'static, str>,
    ty: Type,
    getter: Option<Getter>,
    setter: Option<Setter>,
    owner: Option<ClassId>,
}

impl PropertyDef {
    pub fn new(name: &'static str, ty: Type) -> Self {
        Self {
            name: Cow::Borrowed(name),
            ty,
            getter: None,
            setter: None,
            owner: None,
        }
    }

    pub fn getter(
        mut self,
        f: impl Fn(&Object) -> Result<Value, PropertyFault> + Send + Sync + 'static,
    ) -> Self {
        self.getter = Some(Arc::new(f));
        self
    }

    pub fn setter(
        mut self,
        f: impl Fn(&Object, Value) -> Result<(), PropertyFault> + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(f));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub(crate) fn accessors(&self) -> (Option<&Getter>, Option<&Setter>) {
        (self.getter.as_ref(), self.setter.as_ref())
    }

    #[inline]
    pub(crate) fn owner(&self) -> Option<ClassId> {
        self.owner
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassInfo

#[derive(Clone)]
enum Construction {
    Public(Option<Initializer>),
    Private,
    Missing,
}

/// Runtime description of a class: fields, accessor-pair properties,
/// generic parameters, parent class and construction policy.
///
/// Fields are flattened, inherited fields come first; the slot index of a
/// field on an [`Object`] is its position in [`ClassInfo::fields`].
///
/// # Examples
///
/// ```
/// use pw_bind::info::{ClassInfo, Type};
///
/// let base = ClassInfo::builder("demo.Holder")
///     .type_param("T")
///     .field("value", Type::param("T"))
///     .build();
///
/// let ints = ClassInfo::builder("demo.IntHolder")
///     .extends(&base, [Type::I32])
///     .field("label", Type::Str)
///     .build();
///
/// assert!(ints.is_subclass_of(&base));
/// assert_eq!(ints.fields().len(), 2);
/// assert_eq!(ints.slot_type(0), Some(&Type::I32));
/// ```
pub struct ClassInfo {
    id: ClassId,
    path: Cow<'static, str>,
    type_params: Box<[Cow<'static, str>]>,
    parent: Option<(Arc<ClassInfo>, Box<[Type]>)>,
    fields: Box<[FieldInfo]>,
    slot_types: Box<[Type]>,
    properties: Box<[PropertyDef]>,
    is_abstract: bool,
    construction: Construction,
    text_constructor: Option<TextConstructor>,
}

impl ClassInfo {
    /// Starts declaring a class with the fully qualified `path`, e.g. `demo.Person`.
    #[inline]
    pub fn builder(path: &'static str) -> ClassBuilder {
        ClassBuilder::new(Cow::Borrowed(path))
    }

    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last component of the path.
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    #[inline]
    pub fn type_params(&self) -> &[Cow<'static, str>] {
        &self.type_params
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<ClassInfo>> {
        self.parent.as_ref().map(|(parent, _)| parent)
    }

    /// All fields, inherited first.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// The type of slot `index` with generic parameters of ancestors resolved.
    #[inline]
    pub fn slot_type(&self, index: usize) -> Option<&Type> {
        self.slot_types.get(index)
    }

    /// Slot index of the field `name`; a field redeclared by a subclass shadows the inherited one.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().rposition(|field| field.name == name)
    }

    /// Accessor-pair properties declared by this class only.
    #[inline]
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[inline]
    pub fn has_text_constructor(&self) -> bool {
        self.text_constructor.is_some()
    }

    /// Whether `self` is `other` or one of its descendants.
    pub fn is_subclass_of(&self, other: &ClassInfo) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.id == other.id {
                return true;
            }
            current = class.parent().map(|parent| &**parent);
        }
        false
    }

    /// Generic bindings for this class and each ancestor, nearest first.
    ///
    /// The bindings of an ancestor map its type parameters to the type
    /// arguments given by its direct subclass, resolved as far as this
    /// class allows.
    pub(crate) fn binding_chain(&self) -> Vec<(ClassId, Vec<(Cow<'static, str>, Type)>)> {
        let mut chain = vec![(self.id, Vec::new())];
        let mut bindings: Vec<(Cow<'static, str>, Type)> = Vec::new();
        let mut link = self.parent.as_ref();
        while let Some((parent, args)) = link {
            let resolved: Vec<_> = parent
                .type_params
                .iter()
                .cloned()
                .zip(args.iter().map(|arg| arg.substitute(&bindings, None)))
                .collect();
            chain.push((parent.id, resolved.clone()));
            bindings = resolved;
            link = parent.parent.as_ref();
        }
        chain
    }

    /// Creates an instance through the default constructor.
    ///
    /// Slots start with the zero value of their type, then the initializer runs.
    pub fn instantiate(self: &Arc<Self>) -> Result<ObjectRef, InstantiateError> {
        if self.is_abstract {
            return Err(InstantiateError::Abstract);
        }
        match &self.construction {
            Construction::Private => Err(InstantiateError::PrivateConstructor),
            Construction::Missing => Err(InstantiateError::NoDefaultConstructor),
            Construction::Public(init) => {
                let slots = self.slot_types.iter().map(Type::zero_value).collect();
                let object = ObjectRef::new(Object::with_slots(self.clone(), slots));
                if let Some(init) = init {
                    init(&object);
                }
                Ok(object)
            }
        }
    }

    /// Runs the single-string constructor, `None` when the class has none.
    pub fn construct_from_text(self: &Arc<Self>, text: &str) -> Option<Result<Value, String>> {
        self.text_constructor.as_ref().map(|ctor| ctor(self, text))
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("parent", &self.parent().map(|p| p.path()))
            .field("fields", &self.fields)
            .field("properties", &self.properties)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ClassBuilder

/// Builder returned by [`ClassInfo::builder`].
pub struct ClassBuilder {
    id: ClassId,
    path: Cow<'static, str>,
    type_params: Vec<Cow<'static, str>>,
    parent: Option<(Arc<ClassInfo>, Box<[Type]>)>,
    fields: Vec<FieldInfo>,
    properties: Vec<PropertyDef>,
    is_abstract: bool,
    construction: Construction,
    text_constructor: Option<TextConstructor>,
}

impl ClassBuilder {
    fn new(path: Cow<'static, str>) -> Self {
        Self {
            id: ClassId(next_type_id()),
            path,
            type_params: Vec::new(),
            parent: None,
            fields: Vec::new(),
            properties: Vec::new(),
            is_abstract: false,
            construction: Construction::Public(None),
            text_constructor: None,
        }
    }

    /// Declares a generic type parameter.
    pub fn type_param(mut self, name: &'static str) -> Self {
        self.type_params.push(Cow::Borrowed(name));
        self
    }

    /// Sets the parent class and the type arguments for its parameters.
    pub fn extends(mut self, parent: &Arc<ClassInfo>, args: impl IntoIterator<Item = Type>) -> Self {
        self.parent = Some((parent.clone(), args.into_iter().collect()));
        self
    }

    /// Declares a readable and writable field.
    #[inline]
    pub fn field(self, name: &'static str, ty: Type) -> Self {
        self.field_with(name, ty, Exposure::ReadWrite)
    }

    pub fn field_with(mut self, name: &'static str, ty: Type, exposure: Exposure) -> Self {
        self.fields.push(FieldInfo {
            name: Cow::Borrowed(name),
            ty,
            exposure,
            owner: self.id,
        });
        self
    }

    /// Declares an accessor-pair property.
    pub fn property(mut self, mut def: PropertyDef) -> Self {
        def.owner = Some(self.id);
        self.properties.push(def);
        self
    }

    /// Runs `f` on every new instance after its slots are zeroed.
    pub fn init(mut self, f: impl Fn(&Object) + Send + Sync + 'static) -> Self {
        self.construction = Construction::Public(Some(Arc::new(f)));
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn private_constructor(mut self) -> Self {
        self.construction = Construction::Private;
        self
    }

    pub fn no_default_constructor(mut self) -> Self {
        self.construction = Construction::Missing;
        self
    }

    /// Declares a constructor taking a single string.
    pub fn text_constructor(
        mut self,
        f: impl Fn(&Arc<ClassInfo>, &str) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.text_constructor = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Arc<ClassInfo> {
        let mut fields: Vec<FieldInfo> = match &self.parent {
            Some((parent, _)) => parent.fields.to_vec(),
            None => Vec::new(),
        };
        fields.extend(self.fields);

        let mut class = ClassInfo {
            id: self.id,
            path: self.path,
            type_params: self.type_params.into_boxed_slice(),
            parent: self.parent,
            fields: fields.into_boxed_slice(),
            slot_types: Box::new([]),
            properties: self.properties.into_boxed_slice(),
            is_abstract: self.is_abstract,
            construction: self.construction,
            text_constructor: self.text_constructor,
        };

        let chain = class.binding_chain();
        class.slot_types = class
            .fields
            .iter()
            .map(|field| {
                let bindings = chain
                    .iter()
                    .find(|(id, _)| *id == field.owner)
                    .map_or(&[][..], |(_, bindings)| &bindings[..]);
                field.ty.substitute(bindings, None)
            })
            .collect();

        Arc::new(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_parameters_resolve_through_chain() {
        let pair = ClassInfo::builder("demo.Pair")
            .type_param("A")
            .type_param("B")
            .field("left", Type::param("A"))
            .field("right", Type::list(Type::param("B")))
            .build();
        let named = ClassInfo::builder("demo.Named")
            .type_param("V")
            .extends(&pair, [Type::Str, Type::param("V")])
            .build();
        let concrete = ClassInfo::builder("demo.NamedInts")
            .extends(&named, [Type::I64])
            .build();

        assert_eq!(concrete.slot_type(0), Some(&Type::Str));
        assert_eq!(concrete.slot_type(1), Some(&Type::list(Type::I64)));
        assert_eq!(named.slot_type(1), Some(&Type::list(Type::param("V"))));
        assert_eq!(pair.slot_type(0), Some(&Type::param("A")));
    }

    #[test]
    fn construction_policies() {
        let open = ClassInfo::builder("demo.Open")
            .field("count", Type::I32)
            .field("name", Type::Str)
            .build();
        let object = open.instantiate().unwrap();
        assert_eq!(object.get("count"), Some(Value::from(0_i32)));
        assert_eq!(object.get("name"), Some(Value::Null));

        let shape = ClassInfo::builder("demo.Shape").abstract_class().build();
        assert_eq!(shape.instantiate().unwrap_err(), InstantiateError::Abstract);

        let single = ClassInfo::builder("demo.Single").private_constructor().build();
        assert_eq!(single.instantiate().unwrap_err(), InstantiateError::PrivateConstructor);

        let value = ClassInfo::builder("demo.Money").no_default_constructor().build();
        assert_eq!(value.instantiate().unwrap_err(), InstantiateError::NoDefaultConstructor);
    }

    #[test]
    fn initializer_runs_after_zeroing() {
        let class = ClassInfo::builder("demo.Counter")
            .field("count", Type::I32)
            .init(|object| {
                object.set("count", Value::from(7_i32));
            })
            .build();
        let object = class.instantiate().unwrap();
        assert_eq!(object.get("count"), Some(Value::from(7_i32)));
    }

    #[test]
    fn shadowed_field_and_names() {
        let base = ClassInfo::builder("demo.Base").field("id", Type::I32).build();
        let child = ClassInfo::builder("demo.sub.Child")
            .extends(&base, [])
            .field("id", Type::I64)
            .build();
        assert_eq!(child.field_index("id"), Some(1));
        assert_eq!(child.simple_name(), "Child");
        assert!(!base.is_subclass_of(&child));
    }
}
