use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet, FxHasher};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Arena backend owning every dart and cell of a mesh.
///
/// Abstracts over the concrete slotmap so the choice between `SlotMap`
/// (**default**) and `DenseSlotMap` does not leak into public signatures.
/// Releasing a slot bumps its version, so a key held across a removal
/// resolves to `None` instead of aliasing a recycled slot.
///
/// # Feature Flags
///
/// - **default**: `SlotMap` (O(1) removal, sparse iteration)
/// - **dense-slotmap**: `DenseSlotMap` (contiguous iteration, slightly slower removal)
///
/// # Examples
///
/// ```rust,ignore
/// // Internal use - meshes expose iterators rather than the map itself
/// let darts: StorageMap<DartKey, SurfaceDart<()>> = StorageMap::with_key();
/// ```
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for deduplication indices and id lookups.
/// Uses `FastHasher` (`rustc_hash::FxHasher`) for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// ⚠️ **Not DoS-resistant**: Do not use with attacker-controlled keys.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<usize, &str> = FastHashMap::default();
/// map.insert(7, "vertex");
/// assert_eq!(map.get(&7), Some(&"vertex"));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast non-cryptographic hasher alias for internal collections.
///
/// Wraps [`rustc_hash::FxHasher`] to ensure consistent hashing behavior
/// across [`FastHashMap`] and [`FastHashSet`].
pub type FastHasher = FxHasher;

/// Build hasher that instantiates [`FastHasher`].
pub type FastBuildHasher = FxBuildHasher;

/// Re-export the Entry enum for `FastHashMap`.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::{Entry, FastHashMap};
///
/// let mut map: FastHashMap<usize, usize> = FastHashMap::default();
/// if let Entry::Vacant(e) = map.entry(1) {
///     e.insert(10);
/// }
/// assert_eq!(map[&1], 10);
/// ```
pub use std::collections::hash_map::Entry;

/// Optimized `HashSet` type for membership tests during traversal.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::FastHashSet;
///
/// let mut visited: FastHashSet<usize> = FastHashSet::default();
/// assert!(visited.insert(3));
/// assert!(!visited.insert(3));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=3**: Triangle corners, tet faces sharing an edge
/// - **N=4**: Tet corners and faces
/// - **N=8**: Typical vertex fans (valence ≈ 6 on triangle meshes)
/// - **N=16**: Removal batches and cap loops
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::SmallBuffer;
///
/// let mut fan: SmallBuffer<usize, 8> = SmallBuffer::new();
/// for i in 0..6 {
///     fan.push(i);
/// }
/// assert!(!fan.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SIZE CONSTANTS
// =============================================================================

/// Inline capacity used for vertex-centered traversal buffers.
///
/// Regular triangle meshes average six faces per vertex, so eight covers
/// the common case without spilling to the heap.
pub const FAN_BUFFER_SIZE: usize = 8;

/// Inline capacity used for face-centered traversal buffers.
pub const FACE_BUFFER_SIZE: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_map_invalidates_released_keys() {
        slotmap::new_key_type! { struct TestKey; }

        let mut map: StorageMap<TestKey, i32> = StorageMap::with_key();
        let first = map.insert(1);
        map.remove(first);
        let second = map.insert(2);

        assert!(map.get(first).is_none());
        assert_eq!(map.get(second), Some(&2));
    }

    #[test]
    fn small_buffer_stays_inline_for_typical_fans() {
        let mut fan: SmallBuffer<u32, FAN_BUFFER_SIZE> = SmallBuffer::new();
        fan.extend(0..6);
        assert_eq!(fan.len(), 6);
        assert!(!fan.spilled());

        fan.extend(6..12);
        assert!(fan.spilled());
    }

    #[test]
    fn fast_collections_behave_like_std() {
        let mut map: FastHashMap<(usize, usize), usize> = FastHashMap::default();
        map.insert((1, 2), 3);
        assert_eq!(map.get(&(1, 2)), Some(&3));

        let mut set: FastHashSet<usize> = FastHashSet::default();
        set.insert(5);
        assert!(set.contains(&5));
    }
}
