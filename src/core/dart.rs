//! Darts: the oriented incidence elements of a combinatorial map.
//!
//! A dart belongs to exactly one vertex, edge, and face (and one volume for
//! tetrahedral meshes). Its vertex is the **target** of the oriented edge it
//! represents. Adjacency between darts is stored in the beta array:
//!
//! | beta | meaning |
//! |------|---------|
//! | β1 | next dart around the same face |
//! | β2 | opposite dart across the edge (2D) or across the adjacent face of the same tet (3D) |
//! | β3 | opposite dart across the face shared with the neighbouring tet (3D only) |
//!
//! A dart is on the boundary when its top beta (β2 for surfaces, β3 for
//! tetrahedral meshes) is unset. β0 is never stored; the predecessor is
//! recovered by walking the face cycle.

use crate::core::cell::{EdgeKey, FaceKey, VertexKey, VolumeKey};
use slotmap::new_key_type;

new_key_type! {
    /// Key type for accessing darts in the storage map.
    ///
    /// Keys are versioned: a key whose dart has been released no longer
    /// resolves, even after its slot is reused.
    pub struct DartKey;
}

/// Reference to a cell of any dimension, as returned by [`Dart::cell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellRef {
    /// 0-cell.
    Vertex(VertexKey),
    /// 1-cell.
    Edge(EdgeKey),
    /// 2-cell.
    Face(FaceKey),
    /// 3-cell.
    Volume(VolumeKey),
}

/// An oriented incidence element of an `N`-dimensional combinatorial map.
///
/// `A` is the decoded attribute type selected by
/// [`MeshTraits::Dart`](crate::core::traits::attribute_codec::MeshTraits::Dart).
/// Darts are created and linked only by the owning mesh; the public API is
/// read-only apart from the attribute payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Dart<A, const N: usize> {
    vertex: VertexKey,
    edge: EdgeKey,
    face: FaceKey,
    volume: Option<VolumeKey>,
    beta: [Option<DartKey>; N],
    string: String,
    attributes: A,
}

/// Dart of a surface (2-manifold) mesh.
pub type SurfaceDart<A> = Dart<A, 2>;

/// Dart of a tetrahedral (3-manifold) mesh.
pub type TetDart<A> = Dart<A, 3>;

impl<A: Default, const N: usize> Dart<A, N> {
    pub(crate) fn new(
        vertex: VertexKey,
        edge: EdgeKey,
        face: FaceKey,
        volume: Option<VolumeKey>,
    ) -> Self {
        Self {
            vertex,
            edge,
            face,
            volume,
            beta: [None; N],
            string: String::new(),
            attributes: A::default(),
        }
    }
}

impl<A, const N: usize> Dart<A, N> {
    /// Returns `β_i` of this dart, or `None` if unset or `i` is not in `1..=N`.
    #[inline]
    #[must_use]
    pub fn beta(&self, i: usize) -> Option<DartKey> {
        if i == 0 {
            return None;
        }
        self.beta.get(i - 1).copied().flatten()
    }

    #[inline]
    pub(crate) fn set_beta(&mut self, i: usize, dart: Option<DartKey>) {
        if i >= 1 && i <= N {
            self.beta[i - 1] = dart;
        }
    }

    /// Returns the incident `i`-cell, or `None` when `i > N`.
    ///
    /// ```rust
    /// use dartmesh::core::dart::CellRef;
    /// use dartmesh::core::surface_mesh::SurfaceMesh;
    /// use dartmesh::geometry::point::Point;
    ///
    /// let mut mesh: SurfaceMesh = SurfaceMesh::new();
    /// for (id, xyz) in [(1, [0.0, 0.0, 0.0]), (2, [1.0, 0.0, 0.0]), (3, [0.0, 1.0, 0.0])] {
    ///     mesh.create_vertex(id, Point::new(xyz)).unwrap();
    /// }
    /// let face = mesh.create_face(&[1, 2, 3], 1).unwrap();
    /// let dart = mesh.face_dart(face).unwrap();
    /// assert_eq!(mesh.dart(dart).unwrap().cell(2), Some(CellRef::Face(face)));
    /// ```
    #[must_use]
    pub fn cell(&self, i: usize) -> Option<CellRef> {
        match i {
            0 => Some(CellRef::Vertex(self.vertex)),
            1 => Some(CellRef::Edge(self.edge)),
            2 if N >= 2 => Some(CellRef::Face(self.face)),
            3 if N >= 3 => self.volume.map(CellRef::Volume),
            _ => None,
        }
    }

    /// Target vertex of the dart.
    #[inline]
    #[must_use]
    pub const fn vertex(&self) -> VertexKey {
        self.vertex
    }

    /// Edge the dart lies on.
    #[inline]
    #[must_use]
    pub const fn edge(&self) -> EdgeKey {
        self.edge
    }

    /// Face the dart belongs to.
    #[inline]
    #[must_use]
    pub const fn face(&self) -> FaceKey {
        self.face
    }

    /// Volume the dart belongs to (tetrahedral meshes only).
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> Option<VolumeKey> {
        self.volume
    }

    /// `β1`: the next dart around the face.
    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<DartKey> {
        self.beta(1)
    }

    /// `β2`: the opposite dart on the same edge.
    #[inline]
    #[must_use]
    pub fn sym(&self) -> Option<DartKey> {
        self.beta(2)
    }

    /// `true` if the top-dimensional beta is unset.
    #[inline]
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.beta[N - 1].is_none()
    }

    /// Raw attribute string.
    #[inline]
    #[must_use]
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Replaces the raw attribute string.
    pub fn set_string(&mut self, string: impl Into<String>) {
        self.string = string.into();
    }

    /// Decoded attributes.
    #[inline]
    #[must_use]
    pub const fn attributes(&self) -> &A {
        &self.attributes
    }

    /// Mutable access to the decoded attributes.
    #[inline]
    pub const fn attributes_mut(&mut self) -> &mut A {
        &mut self.attributes
    }
}
