use crate::property::AccessMode;

/// Settings of an [`Accessor`](crate::Accessor), inherited by its nested accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorConfig {
    /// Materialize null intermediates and grow containers on read.
    pub auto_grow_nested_paths: bool,
    /// Containers never grow to this index or beyond, whether auto-growing or not.
    pub auto_grow_collection_limit: usize,
    pub mode: AccessMode,
}

impl AccessorConfig {
    pub const DEFAULT_COLLECTION_LIMIT: usize = 256;

    /// Enables auto-growing with the default collection limit.
    #[inline]
    pub const fn auto_growing() -> Self {
        Self {
            auto_grow_nested_paths: true,
            auto_grow_collection_limit: Self::DEFAULT_COLLECTION_LIMIT,
            mode: AccessMode::Properties,
        }
    }
}

impl Default for AccessorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            auto_grow_nested_paths: false,
            auto_grow_collection_limit: Self::DEFAULT_COLLECTION_LIMIT,
            mode: AccessMode::Properties,
        }
    }
}
