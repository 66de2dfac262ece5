use super::{FastBuildHasher, FastHashMap, FastHashSet};

// =============================================================================
// UTILITY FUNCTIONS
// =============================================================================

/// Creates a `FastHashMap` with pre-allocated capacity using the optimal hasher.
///
/// Bulk loaders know their vertex and face counts up front, so the id maps
/// and deduplication indices are sized once instead of rehashing.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::fast_hash_map_with_capacity;
///
/// let map = fast_hash_map_with_capacity::<usize, usize>(1000);
/// assert!(map.capacity() >= 1000);
/// ```
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a `FastHashSet` with pre-allocated capacity using the optimal hasher.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::collections::fast_hash_set_with_capacity;
///
/// let set = fast_hash_set_with_capacity::<usize>(64);
/// assert!(set.capacity() >= 64);
/// ```
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_helpers_preallocate() {
        let map = fast_hash_map_with_capacity::<u32, u32>(100);
        assert!(map.capacity() >= 100);
        assert!(map.is_empty());

        let set = fast_hash_set_with_capacity::<u32>(50);
        assert!(set.capacity() >= 50);
        assert!(set.is_empty());
    }

    #[test]
    fn zero_capacity_is_allowed() {
        let map = fast_hash_map_with_capacity::<u32, u32>(0);
        let set = fast_hash_set_with_capacity::<u32>(0);
        assert!(map.is_empty());
        assert!(set.is_empty());
    }
}
