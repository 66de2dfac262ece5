//! Local traversal iterators.
//!
//! Each iterator walks the combinatorial map once, when it is created, and
//! stores the visited keys in a [`SmallBuffer`]. Iteration is then a plain
//! slice walk: finite, cheap to restart with [`Incident::reset`], and
//! independent of the mesh borrow. A structural mutation of the mesh makes
//! the stored keys stale; released keys simply stop resolving.
//!
//! Vertex fans are walked with `β1` followed by `β2` from the vertex's
//! representative in-dart. On a closed fan the walk stops when it returns to
//! the start; on an open fan it stops at the boundary, and the edge iterator
//! emits the trailing boundary edge as one extra element.

use crate::core::cell::{EdgeKey, FaceKey, VertexKey, VolumeKey};
use crate::core::collections::{FAN_BUFFER_SIZE, FastHashSet, SmallBuffer};
use crate::core::dart::DartKey;
use crate::core::surface_mesh::SurfaceMesh;
use crate::core::tet_mesh::TetMesh;
use crate::core::traits::attribute_codec::MeshTraits;
use std::iter::FusedIterator;

/// Materialized sequence of cells or darts incident to one cell.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::surface_mesh::SurfaceMesh;
/// use dartmesh::geometry::point::Point;
///
/// let vertices = [
///     (1, Point::new([0.0, 0.0, 0.0])),
///     (2, Point::new([1.0, 0.0, 0.0])),
///     (3, Point::new([1.0, 1.0, 0.0])),
///     (4, Point::new([0.0, 1.0, 0.0])),
/// ];
/// let faces = [(1, vec![1, 2, 3]), (2, vec![1, 3, 4])];
/// let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &faces).unwrap();
///
/// let a = mesh.id_vertex(1).unwrap();
/// let mut fan = mesh.vertex_faces(a);
/// assert_eq!(fan.len(), 2);
/// assert_eq!(fan.by_ref().count(), 2);
/// fan.reset();
/// assert_eq!(fan.count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incident<K> {
    items: SmallBuffer<K, FAN_BUFFER_SIZE>,
    position: usize,
}

impl<K: Copy> Incident<K> {
    pub(crate) const fn new(items: SmallBuffer<K, FAN_BUFFER_SIZE>) -> Self {
        Self { items, position: 0 }
    }

    /// Rewinds to the first element.
    pub const fn reset(&mut self) {
        self.position = 0;
    }

    /// The whole sequence, regardless of the current position.
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.items
    }

    /// Returns `true` if the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Copy> Iterator for Incident<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let item = self.items.get(self.position).copied()?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<K: Copy> ExactSizeIterator for Incident<K> {}

impl<K: Copy> FusedIterator for Incident<K> {}

// Keeps the first occurrence of each key.
fn dedup_in_order<K: Copy + Eq + std::hash::Hash>(
    keys: impl IntoIterator<Item = K>,
) -> SmallBuffer<K, FAN_BUFFER_SIZE> {
    let mut seen = FastHashSet::default();
    keys.into_iter().filter(|k| seen.insert(*k)).collect()
}

// =============================================================================
// SURFACE MESH ITERATORS
// =============================================================================

impl<M: MeshTraits> SurfaceMesh<M> {
    // Walks in-darts of `v` from its representative, calling `visit` on each,
    // and returns the last dart of an open fan.
    fn walk_in_darts(&self, v: VertexKey, mut visit: impl FnMut(DartKey)) -> Option<DartKey> {
        let start = self.vertex_dart(v)?;
        let mut d = start;
        for _ in 0..self.number_of_darts() {
            visit(d);
            match self.dart_next(d).and_then(|n| self.dart_sym(n)) {
                None => return Some(d),
                Some(n) if n == start => return None,
                Some(n) => d = n,
            }
        }
        None
    }

    /// Darts ending at `v`, in fan order.
    #[must_use]
    pub fn vertex_in_darts(&self, v: VertexKey) -> Incident<DartKey> {
        let mut items = SmallBuffer::new();
        self.walk_in_darts(v, |d| items.push(d));
        Incident::new(items)
    }

    /// Darts leaving `v`, in fan order.
    #[must_use]
    pub fn vertex_out_darts(&self, v: VertexKey) -> Incident<DartKey> {
        let mut items = SmallBuffer::new();
        self.walk_in_darts(v, |d| {
            if let Some(n) = self.dart_next(d) {
                items.push(n);
            }
        });
        Incident::new(items)
    }

    /// Faces around `v`, in fan order.
    #[must_use]
    pub fn vertex_faces(&self, v: VertexKey) -> Incident<FaceKey> {
        let mut items = SmallBuffer::new();
        self.walk_in_darts(v, |d| {
            if let Some(f) = self.dart_face(d) {
                items.push(f);
            }
        });
        Incident::new(items)
    }

    /// Edges around `v`, in fan order. An open fan yields one edge more
    /// than it has faces.
    #[must_use]
    pub fn vertex_edges(&self, v: VertexKey) -> Incident<EdgeKey> {
        let mut items = SmallBuffer::new();
        let last = self.walk_in_darts(v, |d| {
            if let Some(e) = self.dart_edge(d) {
                items.push(e);
            }
        });
        if let Some(e) = last
            .and_then(|d| self.dart_next(d))
            .and_then(|n| self.dart_edge(n))
        {
            items.push(e);
        }
        Incident::new(items)
    }

    /// Neighbours of `v`. A boundary vertex starts with the source of its
    /// boundary in-dart.
    #[must_use]
    pub fn vertex_vertices(&self, v: VertexKey) -> Incident<VertexKey> {
        let mut items = SmallBuffer::new();
        let Some(d) = self.vertex_dart(v) else {
            return Incident::new(items);
        };
        if self.is_boundary_dart(d)
            && let Some(source) = self.dart_source(d)
        {
            items.push(source);
        }
        let Some(start) = self.dart_next(d) else {
            return Incident::new(items);
        };
        let mut o = start;
        for _ in 0..self.number_of_darts() {
            if let Some(t) = self.dart_target(o) {
                items.push(t);
            }
            match self.dart_sym(o).and_then(|s| self.dart_next(s)) {
                Some(n) if n != start => o = n,
                _ => break,
            }
        }
        Incident::new(items)
    }

    /// Darts of `f` in `β1` order.
    #[must_use]
    pub fn face_darts(&self, f: FaceKey) -> Incident<DartKey> {
        Incident::new(self.face_cycle(f).into_iter().collect())
    }

    /// Corners of `f` in winding order, starting at the target of its
    /// representative dart.
    #[must_use]
    pub fn face_vertices(&self, f: FaceKey) -> Incident<VertexKey> {
        Incident::new(
            self.face_cycle(f)
                .into_iter()
                .filter_map(|d| self.dart_target(d))
                .collect(),
        )
    }

    /// Sides of `f` in winding order.
    #[must_use]
    pub fn face_edges(&self, f: FaceKey) -> Incident<EdgeKey> {
        Incident::new(
            self.face_cycle(f)
                .into_iter()
                .filter_map(|d| self.dart_edge(d))
                .collect(),
        )
    }
}

// =============================================================================
// TET MESH ITERATORS
// =============================================================================

impl<M: MeshTraits> TetMesh<M> {
    /// Tets around `v`, in breadth-first order.
    #[must_use]
    pub fn vertex_volumes(&self, v: VertexKey) -> Incident<VolumeKey> {
        let darts = self.vertex_incident_darts(v);
        Incident::new(dedup_in_order(
            darts.into_iter().filter_map(|d| self.dart_volume(d)),
        ))
    }

    /// Edges incident to `v`.
    #[must_use]
    pub fn vertex_edges(&self, v: VertexKey) -> Incident<EdgeKey> {
        let darts = self.vertex_incident_darts(v);
        Incident::new(dedup_in_order(
            darts.into_iter().filter_map(|d| self.dart_edge(d)),
        ))
    }

    /// Vertices sharing an edge with `v`.
    #[must_use]
    pub fn vertex_vertices(&self, v: VertexKey) -> Incident<VertexKey> {
        let darts = self.vertex_incident_darts(v);
        Incident::new(dedup_in_order(
            darts.into_iter().filter_map(|d| self.dart_source(d)),
        ))
    }

    /// Corners of a triangle, starting at the target of its dart.
    #[must_use]
    pub fn face_vertices(&self, f: FaceKey) -> Incident<VertexKey> {
        let mut items = SmallBuffer::new();
        let mut d = self.face_dart(f);
        for _ in 0..3 {
            let Some(dart) = d else { break };
            if let Some(t) = self.dart_target(dart) {
                items.push(t);
            }
            d = self.dart_next(dart);
        }
        Incident::new(items)
    }

    /// Sides of a triangle.
    #[must_use]
    pub fn face_edges(&self, f: FaceKey) -> Incident<EdgeKey> {
        let mut items = SmallBuffer::new();
        let mut d = self.face_dart(f);
        for _ in 0..3 {
            let Some(dart) = d else { break };
            if let Some(e) = self.dart_edge(dart) {
                items.push(e);
            }
            d = self.dart_next(dart);
        }
        Incident::new(items)
    }

    /// The four corners of a tet in its input winding.
    #[must_use]
    pub fn volume_vertices(&self, vol: VolumeKey) -> Incident<VertexKey> {
        Incident::new(
            self.volume_corners(vol)
                .map(|c| c.into_iter().collect())
                .unwrap_or_default(),
        )
    }

    /// The four triangles of a tet.
    #[must_use]
    pub fn volume_faces(&self, vol: VolumeKey) -> Incident<FaceKey> {
        Incident::new(
            self.volume_face_darts(vol)
                .map(|darts| darts.into_iter().filter_map(|d| self.dart_face(d)).collect())
                .unwrap_or_default(),
        )
    }
}
