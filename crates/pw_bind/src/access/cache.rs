use log::{debug, trace};
use pw_utils::hash::{Entry, HashMap};

use crate::access::Accessor;
use crate::value::ObjectRef;

/// Nested accessors of one [`Accessor`], keyed by the canonical segment they wrap.
///
/// An entry is only reused while the live value at its segment is the very
/// object it wraps. Otherwise the entry is rebuilt, so registrations copied
/// for the old object never apply to the new one.
#[derive(Default)]
pub(crate) struct AccessorCache {
    entries: HashMap<String, Accessor>,
}

impl AccessorCache {
    /// The child for `segment`, rebuilt with `build` when absent or stale.
    pub(crate) fn get_or_build(
        &mut self,
        segment: String,
        live: &ObjectRef,
        build: impl FnOnce() -> Accessor,
    ) -> &mut Accessor {
        match self.entries.entry(segment) {
            Entry::Occupied(entry) => {
                let child = entry.into_mut();
                if !child.wrapped().ptr_eq(live) {
                    debug!(
                        "discarding cached accessor for `{}`: the value at its path was replaced",
                        child.nested_path()
                    );
                    *child = build();
                }
                child
            }
            Entry::Vacant(entry) => {
                let child = build();
                trace!("created nested accessor for `{}`", child.nested_path());
                entry.insert(child)
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, segment: &str) -> Option<&Accessor> {
        self.entries.get(segment)
    }

    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&mut Accessor)) {
        self.entries.values_mut().for_each(&mut f);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
