use std::sync::atomic::{AtomicU64, Ordering};

use crate::FastHashMap;

/// Opaque identity of a shader program, used as the key of per-mesh
/// binding caches. Identity is assigned at shader creation and never
/// reused within a process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(u64);

impl ShaderId {
    pub(crate) fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a [`BindingCache::prepare`] call was satisfied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingDisposition {
    /// Same shader as the previous draw; nothing was looked up.
    Unchanged,
    /// A previously built binding was switched to.
    Switched,
    /// A binding was built for a shader this mesh had never seen.
    Created,
}

/// Per-mesh map from shader identity to the GPU binding object wiring the
/// mesh's buffers into that shader's inputs.
///
/// Attribute locations are not stable across shader programs, so binding
/// state cannot be shared between them; rebuilding it every draw would be
/// wasteful. The cache bounds the cost to the number of *distinct*
/// shaders ever used to draw the mesh, and an identity check against the
/// last-used shader makes the common same-shader-again path free of even
/// the map lookup.
#[derive(Debug)]
pub struct BindingCache<B> {
    bindings: FastHashMap<ShaderId, B>,
    last: Option<ShaderId>,
}

impl<B> Default for BindingCache<B> {
    fn default() -> Self {
        Self {
            bindings: FastHashMap::default(),
            last: None,
        }
    }
}

impl<B> BindingCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `shader` the active binding, building it with `create` only
    /// if this is the first time the mesh meets this shader.
    pub fn prepare(&mut self, shader: ShaderId, create: impl FnOnce() -> B) -> BindingDisposition {
        if self.last == Some(shader) {
            return BindingDisposition::Unchanged;
        }

        let disposition = if self.bindings.contains_key(&shader) {
            BindingDisposition::Switched
        } else {
            let binding = create();
            self.bindings.insert(shader, binding);
            BindingDisposition::Created
        };

        self.last = Some(shader);
        disposition
    }

    /// The binding selected by the last [`BindingCache::prepare`] call.
    pub fn current(&self) -> Option<&B> {
        self.bindings.get(&self.last?)
    }

    /// The number of distinct shaders this cache has built bindings for.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{BindingCache, BindingDisposition, ShaderId};

    #[test]
    fn creations_match_distinct_shaders_not_draw_count() {
        let a = ShaderId::allocate();
        let b = ShaderId::allocate();
        let mut cache = BindingCache::new();
        let creations = Cell::new(0_u32);

        let draw = |cache: &mut BindingCache<u32>, shader: ShaderId| {
            cache.prepare(shader, || {
                creations.set(creations.get() + 1);
                creations.get()
            })
        };

        // A, B, A, B, A: five draws, two distinct shaders.
        assert_eq!(draw(&mut cache, a), BindingDisposition::Created);
        assert_eq!(draw(&mut cache, b), BindingDisposition::Created);
        assert_eq!(draw(&mut cache, a), BindingDisposition::Switched);
        assert_eq!(draw(&mut cache, b), BindingDisposition::Switched);
        assert_eq!(draw(&mut cache, a), BindingDisposition::Switched);

        assert_eq!(creations.get(), 2);
        assert_eq!(cache.len(), 2);
        // The binding for A is the one built on the first A draw.
        assert_eq!(cache.current(), Some(&1));
    }

    #[test]
    fn repeat_shader_takes_the_fast_path() {
        let a = ShaderId::allocate();
        let mut cache: BindingCache<()> = BindingCache::new();

        assert_eq!(cache.prepare(a, || ()), BindingDisposition::Created);
        for _ in 0..100 {
            assert_eq!(
                cache.prepare(a, || unreachable!("binding must not be rebuilt")),
                BindingDisposition::Unchanged
            );
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn current_is_none_before_any_prepare() {
        let cache: BindingCache<u32> = BindingCache::new();
        assert_eq!(cache.current(), None);
        assert!(cache.is_empty());
    }
}
