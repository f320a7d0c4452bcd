//! Provide hash containers, re-exports *hashbrown* and *foldhash*.
//!
//! - [`StableState`]: `foldhash` with a fixed seed, hash results only depend on the input.
//! - [`IdState`]: passes a `u64` key straight through, for keys that already are unique ids.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// StableState

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x5A17_C0DE_9E37_79B9);

/// Hasher produced by [`StableState`].
pub type StableHasher = FoldHasher<'static>;

/// Fixed hash state based upon a random but fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use pw_utils::hash::StableState;
///
/// assert_eq!(StableState.hash_one("a.b"), StableState.hash_one("a.b"));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct StableState;

impl BuildHasher for StableState {
    type Hasher = StableHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// IdState

/// A no-op hasher that directly uses the written `u64`.
#[derive(Copy, Clone, Default, Debug)]
pub struct IdHasher {
    hash: u64,
}

impl Hasher for IdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Builds [`IdHasher`].
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use pw_utils::hash::IdState;
///
/// assert_eq!(IdState.hash_one(7_u64), 7);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct IdState;

impl BuildHasher for IdState {
    type Hasher = IdHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        IdHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// Containers

/// A [`hashbrown::HashMap`] using [`StableState`] by default.
pub type HashMap<K, V, S = StableState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`StableState`] by default.
pub type HashSet<T, S = StableState> = hashbrown::HashSet<T, S>;

/// A map keyed by unique `u64`-like ids.
pub type IdMap<K, V> = hashbrown::HashMap<K, V, IdState>;

pub use hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_state_passes_through() {
        assert_eq!(IdState.hash_one(42_u64), 42);
    }

    #[test]
    fn stable_map_round_trip() {
        let mut map: HashMap<&str, u32> = HashMap::default();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.len(), 2);
    }
}
