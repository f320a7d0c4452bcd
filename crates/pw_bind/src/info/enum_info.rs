use alloc::borrow::Cow;
use alloc::sync::Arc;

use crate::info::next_type_id;

/// Runtime description of an enumeration: its path and ordered constant names.
#[derive(Debug)]
pub struct EnumInfo {
    id: u64,
    path: Cow<'static, str>,
    constants: Box<[Cow<'static, str>]>,
}

impl EnumInfo {
    /// Declares an enumeration.
    ///
    /// ```
    /// use pw_bind::info::EnumInfo;
    ///
    /// let color = EnumInfo::new("demo.Color", ["RED", "GREEN"]);
    /// assert_eq!(color.value_of("GREEN"), Some(1));
    /// assert_eq!(color.simple_name(), "Color");
    /// ```
    pub fn new(
        path: &'static str,
        constants: impl IntoIterator<Item = &'static str>,
    ) -> Arc<EnumInfo> {
        Arc::new(EnumInfo {
            id: next_type_id(),
            path: Cow::Borrowed(path),
            constants: constants.into_iter().map(Cow::Borrowed).collect(),
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    #[inline]
    pub fn constants(&self) -> &[Cow<'static, str>] {
        &self.constants
    }

    /// Index of the constant `name`.
    pub fn value_of(&self, name: &str) -> Option<usize> {
        self.constants.iter().position(|c| c == name)
    }

    /// Resolves `<type>.<CONSTANT>`, where `<type>` is the full or simple name of this enum.
    pub fn value_of_qualified(&self, text: &str) -> Option<usize> {
        let (owner, constant) = text.rsplit_once('.')?;
        if owner == self.path() || owner == self.simple_name() {
            self.value_of(constant)
        } else {
            None
        }
    }
}
