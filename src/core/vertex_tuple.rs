//! Canonical vertex tuples used as deduplication keys.
//!
//! Construction must recognise that the segment `(a, b)` created by one face
//! and `(b, a)` created by its neighbour are the same edge, and likewise for
//! the three corners of a shared tet face. Both tuple types here:
//!
//! - identify a sub-cell purely by its bounding [`VertexKey`]s
//! - canonicalize ordering so every permutation maps to the same value
//! - are `Copy`/`Hash`/`Ord` for use in the indices of [`crate::core::collections`]
//!
//! ## Determinism
//!
//! Ordering is derived from raw slotmap key data. It is stable for the life of
//! a mesh but is **not** meaningful across meshes or serialization round-trips.

use crate::core::cell::VertexKey;
use slotmap::Key;

#[inline]
fn raw(key: VertexKey) -> u64 {
    key.data().as_ffi()
}

/// Canonical identifier for an unordered pair of vertices (an edge).
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::cell::VertexKey;
/// use dartmesh::core::vertex_tuple::VertexPair;
/// use slotmap::KeyData;
///
/// let a = VertexKey::from(KeyData::from_ffi(1));
/// let b = VertexKey::from(KeyData::from_ffi(2));
/// assert_eq!(VertexPair::new(a, b), VertexPair::new(b, a));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexPair {
    v0: VertexKey,
    v1: VertexKey,
}

impl VertexPair {
    /// Creates a new canonical pair, reordering so that `v0 <= v1` under the raw key order.
    #[must_use]
    pub fn new(a: VertexKey, b: VertexKey) -> Self {
        if raw(a) <= raw(b) {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Returns the first (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> VertexKey {
        self.v0
    }

    /// Returns the second (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> VertexKey {
        self.v1
    }

    /// Returns `true` if `v` is one of the two endpoints.
    #[inline]
    #[must_use]
    pub fn contains(self, v: VertexKey) -> bool {
        self.v0 == v || self.v1 == v
    }
}

impl From<(VertexKey, VertexKey)> for VertexPair {
    #[inline]
    fn from((a, b): (VertexKey, VertexKey)) -> Self {
        Self::new(a, b)
    }
}

/// Canonical identifier for an unordered triple of vertices (a triangular face).
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::cell::VertexKey;
/// use dartmesh::core::vertex_tuple::VertexTriple;
/// use slotmap::KeyData;
///
/// let a = VertexKey::from(KeyData::from_ffi(1));
/// let b = VertexKey::from(KeyData::from_ffi(2));
/// let c = VertexKey::from(KeyData::from_ffi(3));
/// assert_eq!(VertexTriple::new(a, b, c), VertexTriple::new(c, a, b));
/// assert_eq!(VertexTriple::new(a, b, c), VertexTriple::new(b, a, c));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexTriple {
    vertices: [VertexKey; 3],
}

impl VertexTriple {
    /// Creates a new canonical triple sorted by raw key order.
    #[must_use]
    pub fn new(a: VertexKey, b: VertexKey, c: VertexKey) -> Self {
        let mut vertices = [a, b, c];
        vertices.sort_unstable_by_key(|&v| raw(v));
        Self { vertices }
    }

    /// Returns the three corners in canonical order.
    #[inline]
    #[must_use]
    pub const fn vertices(self) -> [VertexKey; 3] {
        self.vertices
    }
}

impl From<[VertexKey; 3]> for VertexTriple {
    #[inline]
    fn from([a, b, c]: [VertexKey; 3]) -> Self {
        Self::new(a, b, c)
    }
}
