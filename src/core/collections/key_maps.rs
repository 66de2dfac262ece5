use super::{FastHashMap, FastHashSet};
use crate::core::cell::{EdgeKey, FaceKey, VertexKey, VolumeKey};
use crate::core::dart::DartKey;
use crate::core::vertex_tuple::{VertexPair, VertexTriple};

// =============================================================================
// DEDUPLICATION INDICES
// =============================================================================

/// Deduplication index from an unordered endpoint pair to its edge cell.
///
/// Consulted while creating a face so that two faces bounding the same
/// segment share one [`EdgeKey`]. Entries are removed when the edge is
/// released.
pub type EdgeIndex = FastHashMap<VertexPair, EdgeKey>;

/// Deduplication index from an unordered corner triple to its face cell.
///
/// Used by tetrahedral meshes only; surface meshes identify faces by id.
pub type FaceIndex = FastHashMap<VertexTriple, FaceKey>;

// =============================================================================
// ID-KEY MAPPING TYPES
// =============================================================================

/// Mapping from user-facing vertex ids to arena keys.
pub type VertexIdMap = FastHashMap<usize, VertexKey>;

/// Mapping from user-facing face ids to arena keys (surface meshes).
pub type FaceIdMap = FastHashMap<usize, FaceKey>;

/// Mapping from user-facing volume ids to arena keys (tetrahedral meshes).
pub type VolumeIdMap = FastHashMap<usize, VolumeKey>;

// =============================================================================
// KEY SETS
// =============================================================================

/// Set of dart keys, used to mark consumed darts while tracing boundary loops.
pub type DartKeySet = FastHashSet<DartKey>;

/// Set of face keys, used by visibility flood fills.
pub type FaceKeySet = FastHashSet<FaceKey>;

/// Set of volume keys, used by the breadth-first walk around a vertex.
pub type VolumeKeySet = FastHashSet<VolumeKey>;
