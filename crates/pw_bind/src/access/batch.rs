use core::fmt::{self, Formatter};

use serde_core::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::value::Value;

// -----------------------------------------------------------------------------
// PropertyValue

/// A raw value to be written at a property path.
#[derive(Debug, Clone)]
pub struct PropertyValue {
    name: String,
    value: Value,
    optional: bool,
}

impl PropertyValue {
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            optional: false,
        }
    }

    /// Marks the value as optional: a batch skips it when its path is not writable.
    #[inline]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The property path as given.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

// -----------------------------------------------------------------------------
// PropertyValues

/// An ordered batch of [`PropertyValue`]s, one per path.
///
/// Deserializes from a map of `path -> value`, keeping the document order.
///
/// # Examples
///
/// ```
/// use pw_bind::access::PropertyValues;
///
/// let values: PropertyValues =
///     serde_json::from_str(r#"{ "name": "Ada", "address.city": "Paris" }"#).unwrap();
/// let names: Vec<_> = values.iter().map(|pv| pv.name()).collect();
/// assert_eq!(names, ["name", "address.city"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyValues {
    values: Vec<PropertyValue>,
}

impl PropertyValues {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value`, replacing a value already present for the same path.
    pub fn push(&mut self, value: PropertyValue) -> &mut Self {
        match self.values.iter_mut().find(|pv| pv.name == value.name) {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
        self
    }

    /// Shorthand for pushing a required [`PropertyValue`].
    #[inline]
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.push(PropertyValue::new(name, value))
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.iter().find(|pv| pv.name == name)
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, PropertyValue> {
        self.values.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyValues {
    type Item = &'a PropertyValue;
    type IntoIter = core::slice::Iter<'a, PropertyValue>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl FromIterator<PropertyValue> for PropertyValues {
    fn from_iter<T: IntoIterator<Item = PropertyValue>>(iter: T) -> Self {
        let mut values = PropertyValues::new();
        for value in iter {
            values.push(value);
        }
        values
    }
}

impl<'de> Deserialize<'de> for PropertyValues {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PropertyValuesVisitor)
    }
}

struct PropertyValuesVisitor;

impl<'de> Visitor<'de> for PropertyValuesVisitor {
    type Value = PropertyValues;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a map of property paths to raw values")
    }

    fn visit_map<V>(self, mut map: V) -> Result<PropertyValues, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut values = PropertyValues::new();
        while let Some((name, value)) = map.next_entry::<String, Value>()? {
            values.add(name, value);
        }
        Ok(values)
    }
}
