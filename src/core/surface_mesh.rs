//! Combinatorial-map surface mesh (2-manifold with or without boundary).
//!
//! [`SurfaceMesh`] owns every vertex, edge, face, and dart of one surface in
//! slotmap arenas, and keeps three indices next to them: vertex id → key,
//! face id → key, and an [`EdgeIndex`] from unordered endpoint pairs to edge
//! keys used while wiring new faces.
//!
//! # Construction
//!
//! Faces are created one at a time from vertex-id sequences. Each boundary
//! segment of a new face gets its own dart; segments already present in the
//! edge index reuse the existing edge and pair the two darts with `β2`. The
//! whole face is validated before anything is mutated, so a rejected face
//! leaves the mesh unchanged.
//!
//! After a bulk [`load`](SurfaceMesh::load) a post-pass makes the
//! representative dart of every boundary vertex a boundary in-dart, which
//! is where fan traversal starts.
//!
//! # Examples
//!
//! ```rust
//! use dartmesh::core::surface_mesh::SurfaceMesh;
//! use dartmesh::geometry::point::Point;
//!
//! // Unit square split along the diagonal AC.
//! let vertices = [
//!     (1, Point::new([0.0, 0.0, 0.0])),
//!     (2, Point::new([1.0, 0.0, 0.0])),
//!     (3, Point::new([1.0, 1.0, 0.0])),
//!     (4, Point::new([0.0, 1.0, 0.0])),
//! ];
//! let faces = [(1, vec![1, 2, 3]), (2, vec![1, 3, 4])];
//! let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &faces).unwrap();
//!
//! assert_eq!(mesh.number_of_vertices(), 4);
//! assert_eq!(mesh.number_of_edges(), 5);
//! assert_eq!(mesh.number_of_faces(), 2);
//! assert_eq!(mesh.number_of_darts(), 6);
//! ```

use crate::core::cell::{Edge, EdgeKey, Face, FaceKey, Vertex, VertexKey};
use crate::core::collections::{
    EdgeIndex, FACE_BUFFER_SIZE, FaceIdMap, SmallBuffer, StorageMap, VertexIdMap,
};
use crate::core::dart::{Dart, DartKey, SurfaceDart};
use crate::core::traits::attribute_codec::{AttributeCodec, AttributeError, MeshTraits, NoAttributes};
use crate::core::vertex_tuple::VertexPair;
use crate::geometry::point::Point;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while building a mesh.
///
/// Construction validates its input before mutating, so any of these leaves
/// the target mesh exactly as it was.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshConstructionError {
    /// A vertex with this id already exists.
    #[error("Duplicate vertex id {id}")]
    DuplicateVertexId {
        /// The repeated id.
        id: usize,
    },
    /// A face references a vertex id that does not exist.
    #[error("Unknown vertex id {id}")]
    UnknownVertexId {
        /// The missing id.
        id: usize,
    },
    /// A tetrahedron references a vertex index past the end of the point list.
    #[error("Vertex index {index} out of range for {count} vertices")]
    UnknownVertexIndex {
        /// The offending index.
        index: usize,
        /// Number of vertices loaded.
        count: usize,
    },
    /// A face with this id already exists.
    #[error("Duplicate face id {id}")]
    DuplicateFaceId {
        /// The repeated id.
        id: usize,
    },
    /// Attributes reference a face id that does not exist.
    #[error("Unknown face id {id}")]
    UnknownFaceId {
        /// The missing id.
        id: usize,
    },
    /// A volume with this id already exists.
    #[error("Duplicate volume id {id}")]
    DuplicateVolumeId {
        /// The repeated id.
        id: usize,
    },
    /// Attributes reference a volume id that does not exist.
    #[error("Unknown volume id {id}")]
    UnknownVolumeId {
        /// The missing id.
        id: usize,
    },
    /// A face has fewer than three corners.
    #[error("Face {face_id} has {corners} corners; at least 3 are required")]
    DegenerateFace {
        /// The face id.
        face_id: usize,
        /// Number of corners supplied.
        corners: usize,
    },
    /// A face visits the same vertex twice.
    #[error("Face {face_id} repeats vertex {vertex_id}")]
    RepeatedVertex {
        /// The face id.
        face_id: usize,
        /// The repeated vertex id.
        vertex_id: usize,
    },
    /// A tetrahedron does not reference exactly four distinct vertices.
    #[error("Tetrahedron {volume_index} must reference 4 distinct vertices, got {vertices:?}")]
    InvalidTetrahedron {
        /// Position of the tetrahedron in the input.
        volume_index: usize,
        /// The supplied vertex indices.
        vertices: Vec<usize>,
    },
    /// An edge would be shared by more than two faces.
    #[error("Edge ({v0}, {v1}) already bounds two faces")]
    NonManifoldEdge {
        /// First endpoint id.
        v0: usize,
        /// Second endpoint id.
        v1: usize,
    },
    /// A triangle would be shared by more than two tetrahedra.
    #[error("Face {vertices:?} already bounds two volumes")]
    NonManifoldFace {
        /// Corner ids of the shared face.
        vertices: [usize; 3],
    },
    /// A shared edge is traversed in the same direction by both faces.
    #[error("Edge ({v0}, {v1}) has the same orientation in both incident faces")]
    InconsistentOrientation {
        /// Source id of the new half.
        v0: usize,
        /// Target id of the new half.
        v1: usize,
    },
    /// No shared edge was found while pairing two faces.
    #[error("Could not find the edge shared with face {face_id}")]
    FaceLinkFailed {
        /// Id of the face being linked.
        face_id: usize,
    },
    /// Pairing two volumes across a triangle matched the wrong number of darts.
    #[error("Linking volumes across a shared triangle matched {found} dart pairs instead of 3")]
    VolumeLinkFailed {
        /// Number of matched pairs.
        found: usize,
    },
    /// Attributes reference an edge that does not exist.
    #[error("No edge between vertices {v0} and {v1}")]
    UnknownEdge {
        /// First endpoint id.
        v0: usize,
        /// Second endpoint id.
        v1: usize,
    },
    /// Attributes reference a corner that does not exist.
    #[error("Vertex {vertex_id} is not a corner of face {face_id}")]
    UnknownCorner {
        /// The vertex id.
        vertex_id: usize,
        /// The face id.
        face_id: usize,
    },
    /// An attribute payload could not be decoded.
    #[error("Attribute decoding failed: {source}")]
    Attribute {
        /// The codec error.
        #[from]
        source: AttributeError,
    },
}

// =============================================================================
// ATTRIBUTE RECORDS
// =============================================================================

/// Raw attribute strings for a surface mesh, keyed the way the `.m` format
/// stores them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceAttributes {
    /// `(vertex id, payload)`.
    pub vertices: Vec<(usize, String)>,
    /// `(face id, payload)`.
    pub faces: Vec<(usize, String)>,
    /// `(vertex id, vertex id, payload)`.
    pub edges: Vec<(usize, usize, String)>,
    /// `(vertex id, face id, payload)`.
    pub corners: Vec<(usize, usize, String)>,
}

impl SurfaceAttributes {
    /// Returns `true` if no record is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
            && self.faces.is_empty()
            && self.edges.is_empty()
            && self.corners.is_empty()
    }
}

// =============================================================================
// MESH CONTAINER
// =============================================================================

/// Owner of all darts and cells of a 2-manifold mesh.
///
/// `M` selects the attribute codecs; see
/// [`MeshTraits`](crate::core::traits::attribute_codec::MeshTraits).
#[derive(Clone, Debug)]
pub struct SurfaceMesh<M: MeshTraits = NoAttributes> {
    pub(crate) vertices: StorageMap<VertexKey, Vertex<M::Vertex>>,
    pub(crate) edges: StorageMap<EdgeKey, Edge<M::Edge>>,
    pub(crate) faces: StorageMap<FaceKey, Face<M::Face>>,
    pub(crate) darts: StorageMap<DartKey, SurfaceDart<M::Dart>>,
    pub(crate) vertex_ids: VertexIdMap,
    pub(crate) face_ids: FaceIdMap,
    pub(crate) edge_index: EdgeIndex,
}

impl<M: MeshTraits> Default for SurfaceMesh<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MeshTraits> SurfaceMesh<M> {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: StorageMap::with_key(),
            edges: StorageMap::with_key(),
            faces: StorageMap::with_key(),
            darts: StorageMap::with_key(),
            vertex_ids: VertexIdMap::default(),
            face_ids: FaceIdMap::default(),
            edge_index: EdgeIndex::default(),
        }
    }

    /// Builds a mesh from `(id, position)` vertices and `(id, vertex ids)`
    /// faces. See [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if the input is not a consistently
    /// oriented 2-manifold.
    pub fn from_faces(
        vertices: &[(usize, Point<f64, 3>)],
        faces: &[(usize, Vec<usize>)],
    ) -> Result<Self, MeshConstructionError> {
        let mut mesh = Self::new();
        mesh.load(vertices, faces)?;
        Ok(mesh)
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Adds an isolated vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshConstructionError::DuplicateVertexId`] if `id` is taken.
    pub fn create_vertex(
        &mut self,
        id: usize,
        point: Point<f64, 3>,
    ) -> Result<VertexKey, MeshConstructionError> {
        if self.vertex_ids.contains_key(&id) {
            return Err(MeshConstructionError::DuplicateVertexId { id });
        }
        let key = self.vertices.insert(Vertex::new(id, point));
        self.vertex_ids.insert(id, key);
        Ok(key)
    }

    /// Adds a face through the given vertex ids, in winding order.
    ///
    /// The new face's representative dart is the one ending at `ids[1]`.
    /// Boundary representatives of existing vertices are not refreshed; use
    /// [`insert_face`](Self::insert_face) on a finished mesh.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if the id is taken, a vertex is
    /// unknown or repeated, a shared edge already has two faces, or a shared
    /// edge has the same direction in both faces. The mesh is unchanged on
    /// error.
    pub fn create_face(
        &mut self,
        ids: &[usize],
        face_id: usize,
    ) -> Result<FaceKey, MeshConstructionError> {
        let corners = self.validate_face(ids, face_id)?;
        let n = corners.len();

        let face = self.faces.insert(Face::new(face_id));
        self.face_ids.insert(face_id, face);

        let mut darts: SmallBuffer<DartKey, FACE_BUFFER_SIZE> = SmallBuffer::new();
        for i in 0..n {
            let dart = self.create_edge(face, corners[i], corners[(i + 1) % n])?;
            darts.push(dart);
        }
        if let Some(face_cell) = self.faces.get_mut(face) {
            face_cell.set_dart(Some(darts[0]));
        }
        for i in 0..n {
            self.link_edges(darts[i], darts[(i + 1) % n]);
        }
        Ok(face)
    }

    fn validate_face(
        &self,
        ids: &[usize],
        face_id: usize,
    ) -> Result<SmallBuffer<VertexKey, FACE_BUFFER_SIZE>, MeshConstructionError> {
        if self.face_ids.contains_key(&face_id) {
            return Err(MeshConstructionError::DuplicateFaceId { id: face_id });
        }
        if ids.len() < 3 {
            return Err(MeshConstructionError::DegenerateFace {
                face_id,
                corners: ids.len(),
            });
        }
        let mut corners: SmallBuffer<VertexKey, FACE_BUFFER_SIZE> = SmallBuffer::new();
        for (i, &id) in ids.iter().enumerate() {
            let key = self
                .id_vertex(id)
                .ok_or(MeshConstructionError::UnknownVertexId { id })?;
            if ids[..i].contains(&id) {
                return Err(MeshConstructionError::RepeatedVertex {
                    face_id,
                    vertex_id: id,
                });
            }
            corners.push(key);
        }

        let n = corners.len();
        for i in 0..n {
            let (source, target) = (corners[i], corners[(i + 1) % n]);
            let Some(existing) = self
                .edge_index
                .get(&VertexPair::new(source, target))
                .and_then(|&e| self.edges.get(e))
                .and_then(Edge::dart)
            else {
                continue;
            };
            let (v0, v1) = (ids[i], ids[(i + 1) % n]);
            if !self.is_boundary_dart(existing) {
                return Err(MeshConstructionError::NonManifoldEdge { v0, v1 });
            }
            if self.dart_target(existing) != Some(source) {
                return Err(MeshConstructionError::InconsistentOrientation { v0, v1 });
            }
        }
        Ok(corners)
    }

    /// Creates the dart `source → target` on `face`, reusing the edge cell if
    /// the segment already exists and pairing the two darts.
    pub(crate) fn create_edge(
        &mut self,
        face: FaceKey,
        source: VertexKey,
        target: VertexKey,
    ) -> Result<DartKey, MeshConstructionError> {
        let pair = VertexPair::new(source, target);
        let (edge, existing) = if let Some(&edge) = self.edge_index.get(&pair) {
            (edge, self.edges.get(edge).and_then(Edge::dart))
        } else {
            let edge = self.edges.insert(Edge::new());
            self.edge_index.insert(pair, edge);
            (edge, None)
        };

        let dart = self.darts.insert(Dart::new(target, edge, face, None));

        if let Some(vertex) = self.vertices.get_mut(target)
            && vertex.dart().is_none()
        {
            vertex.set_dart(Some(dart));
        }

        match existing {
            Some(partner) => self.link_faces(partner, dart)?,
            None => {
                if let Some(edge_cell) = self.edges.get_mut(edge) {
                    edge_cell.set_dart(Some(dart));
                }
            }
        }
        Ok(dart)
    }

    /// Pairs the darts of two faces that lie on their shared edge (`β2`).
    ///
    /// Up to three darts around each face are compared.
    pub(crate) fn link_faces(
        &mut self,
        d1: DartKey,
        d2: DartKey,
    ) -> Result<(), MeshConstructionError> {
        let mut a = d1;
        for _ in 0..3 {
            let mut b = d2;
            for _ in 0..3 {
                if self.dart_edge(a).is_some() && self.dart_edge(a) == self.dart_edge(b) {
                    self.set_beta(a, 2, Some(b));
                    self.set_beta(b, 2, Some(a));
                    return Ok(());
                }
                match self.dart_next(b) {
                    Some(next) => b = next,
                    None => break,
                }
            }
            match self.dart_next(a) {
                Some(next) => a = next,
                None => break,
            }
        }
        let face_id = self
            .dart_face(d2)
            .and_then(|f| self.faces.get(f))
            .map_or(0, Face::id);
        Err(MeshConstructionError::FaceLinkFailed { face_id })
    }

    /// Sets `β1(d1) = d2`.
    pub(crate) fn link_edges(&mut self, d1: DartKey, d2: DartKey) {
        self.set_beta(d1, 1, Some(d2));
    }

    #[inline]
    pub(crate) fn set_beta(&mut self, dart: DartKey, i: usize, value: Option<DartKey>) {
        if let Some(d) = self.darts.get_mut(dart) {
            d.set_beta(i, value);
        }
    }

    /// Makes every boundary dart the representative of its target vertex.
    ///
    /// After this pass a boundary vertex is represented by a boundary
    /// in-dart, the starting point of its fan.
    pub fn assign_boundary_representatives(&mut self) {
        let boundary: Vec<(VertexKey, DartKey)> = self
            .darts
            .iter()
            .filter(|(_, d)| d.is_boundary())
            .map(|(k, d)| (d.vertex(), k))
            .collect();
        for (vertex, dart) in boundary {
            if let Some(v) = self.vertices.get_mut(vertex) {
                v.set_dart(Some(dart));
            }
        }
    }

    /// Replaces the mesh content with the given vertices and faces.
    ///
    /// Vertices and faces are created in ascending id order, then boundary
    /// representatives are assigned. The mesh is rebuilt on the side and only
    /// swapped in on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshConstructionError`] encountered; the mesh is
    /// unchanged in that case.
    pub fn load(
        &mut self,
        vertices: &[(usize, Point<f64, 3>)],
        faces: &[(usize, Vec<usize>)],
    ) -> Result<(), MeshConstructionError> {
        let mut fresh = Self::new();

        let mut ordered_vertices: Vec<&(usize, Point<f64, 3>)> = vertices.iter().collect();
        ordered_vertices.sort_by_key(|(id, _)| *id);
        for &(id, point) in ordered_vertices {
            fresh.create_vertex(id, point)?;
        }

        let mut ordered_faces: Vec<&(usize, Vec<usize>)> = faces.iter().collect();
        ordered_faces.sort_by_key(|(id, _)| *id);
        for (id, ids) in ordered_faces {
            fresh.create_face(ids, *id)?;
        }

        fresh.assign_boundary_representatives();
        *self = fresh;
        Ok(())
    }

    /// Assigns raw attribute strings and decodes them.
    ///
    /// Every record is resolved and decoded before anything is assigned.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if a record references a missing
    /// cell or a payload fails to decode. No attribute is changed on error.
    pub fn load_attributes(
        &mut self,
        attributes: &SurfaceAttributes,
    ) -> Result<(), MeshConstructionError> {
        let mut vertex_updates = Vec::with_capacity(attributes.vertices.len());
        for (id, payload) in &attributes.vertices {
            let key = self
                .id_vertex(*id)
                .ok_or(MeshConstructionError::UnknownVertexId { id: *id })?;
            let mut decoded = M::Vertex::default();
            decoded.decode(payload)?;
            vertex_updates.push((key, payload.clone(), decoded));
        }

        let mut face_updates = Vec::with_capacity(attributes.faces.len());
        for (id, payload) in &attributes.faces {
            let key = self
                .id_face(*id)
                .ok_or(MeshConstructionError::UnknownFaceId { id: *id })?;
            let mut decoded = M::Face::default();
            decoded.decode(payload)?;
            face_updates.push((key, payload.clone(), decoded));
        }

        let mut edge_updates = Vec::with_capacity(attributes.edges.len());
        for (v0, v1, payload) in &attributes.edges {
            let key = self
                .id_vertex(*v0)
                .zip(self.id_vertex(*v1))
                .and_then(|(a, b)| self.vertex_edge(a, b))
                .ok_or(MeshConstructionError::UnknownEdge { v0: *v0, v1: *v1 })?;
            let mut decoded = M::Edge::default();
            decoded.decode(payload)?;
            edge_updates.push((key, payload.clone(), decoded));
        }

        let mut corner_updates = Vec::with_capacity(attributes.corners.len());
        for (vertex_id, face_id, payload) in &attributes.corners {
            let key = self
                .id_vertex(*vertex_id)
                .zip(self.id_face(*face_id))
                .and_then(|(v, f)| self.corner(v, f))
                .ok_or(MeshConstructionError::UnknownCorner {
                    vertex_id: *vertex_id,
                    face_id: *face_id,
                })?;
            let mut decoded = M::Dart::default();
            decoded.decode(payload)?;
            corner_updates.push((key, payload.clone(), decoded));
        }

        for (key, payload, decoded) in vertex_updates {
            if let Some(v) = self.vertices.get_mut(key) {
                v.set_string(payload);
                *v.attributes_mut() = decoded;
            }
        }
        for (key, payload, decoded) in face_updates {
            if let Some(f) = self.faces.get_mut(key) {
                f.set_string(payload);
                *f.attributes_mut() = decoded;
            }
        }
        for (key, payload, decoded) in edge_updates {
            if let Some(e) = self.edges.get_mut(key) {
                e.set_string(payload);
                *e.attributes_mut() = decoded;
            }
        }
        for (key, payload, decoded) in corner_updates {
            if let Some(d) = self.darts.get_mut(key) {
                d.set_string(payload);
                *d.attributes_mut() = decoded;
            }
        }
        Ok(())
    }

    /// Re-encodes every decoded attribute value into its raw string.
    pub fn encode_attributes(&mut self) {
        for (_, v) in &mut self.vertices {
            let s = v.attributes().encode(v.string());
            v.set_string(s);
        }
        for (_, e) in &mut self.edges {
            let s = e.attributes().encode(e.string());
            e.set_string(s);
        }
        for (_, f) in &mut self.faces {
            let s = f.attributes().encode(f.string());
            f.set_string(s);
        }
        for (_, d) in &mut self.darts {
            let s = d.attributes().encode(d.string());
            d.set_string(s);
        }
    }

    // =========================================================================
    // CELL ACCESS
    // =========================================================================

    /// Number of vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of darts.
    #[must_use]
    pub fn number_of_darts(&self) -> usize {
        self.darts.len()
    }

    /// Returns `true` if the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Looks up a vertex by key.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex<M::Vertex>> {
        self.vertices.get(key)
    }

    /// Mutable vertex lookup. Only position and attributes are writable.
    pub fn vertex_mut(&mut self, key: VertexKey) -> Option<&mut Vertex<M::Vertex>> {
        self.vertices.get_mut(key)
    }

    /// Looks up an edge by key.
    #[must_use]
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge<M::Edge>> {
        self.edges.get(key)
    }

    /// Mutable edge lookup.
    pub fn edge_mut(&mut self, key: EdgeKey) -> Option<&mut Edge<M::Edge>> {
        self.edges.get_mut(key)
    }

    /// Looks up a face by key.
    #[must_use]
    pub fn face(&self, key: FaceKey) -> Option<&Face<M::Face>> {
        self.faces.get(key)
    }

    /// Mutable face lookup.
    pub fn face_mut(&mut self, key: FaceKey) -> Option<&mut Face<M::Face>> {
        self.faces.get_mut(key)
    }

    /// Looks up a dart by key.
    #[must_use]
    pub fn dart(&self, key: DartKey) -> Option<&SurfaceDart<M::Dart>> {
        self.darts.get(key)
    }

    /// Mutable dart lookup.
    pub fn dart_mut(&mut self, key: DartKey) -> Option<&mut SurfaceDart<M::Dart>> {
        self.darts.get_mut(key)
    }

    /// Vertex with the given user id.
    #[must_use]
    pub fn id_vertex(&self, id: usize) -> Option<VertexKey> {
        self.vertex_ids.get(&id).copied()
    }

    /// Face with the given user id.
    #[must_use]
    pub fn id_face(&self, id: usize) -> Option<FaceKey> {
        self.face_ids.get(&id).copied()
    }

    /// All vertices, in storage order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex<M::Vertex>)> {
        self.vertices.iter()
    }

    /// All edges, in storage order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge<M::Edge>)> {
        self.edges.iter()
    }

    /// All faces, in storage order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face<M::Face>)> {
        self.faces.iter()
    }

    /// All darts, in storage order.
    pub fn darts(&self) -> impl Iterator<Item = (DartKey, &SurfaceDart<M::Dart>)> {
        self.darts.iter()
    }

    /// Position of a vertex.
    #[must_use]
    pub fn point(&self, v: VertexKey) -> Option<&Point<f64, 3>> {
        self.vertices.get(v).map(Vertex::point)
    }

    /// Id of a vertex.
    #[must_use]
    pub fn vertex_id(&self, v: VertexKey) -> Option<usize> {
        self.vertices.get(v).map(Vertex::id)
    }

    /// Id of a face.
    #[must_use]
    pub fn face_id(&self, f: FaceKey) -> Option<usize> {
        self.faces.get(f).map(Face::id)
    }

    // =========================================================================
    // DART NAVIGATION
    // =========================================================================

    /// `β_i(dart)`.
    #[must_use]
    pub fn beta(&self, i: usize, dart: DartKey) -> Option<DartKey> {
        self.darts.get(dart).and_then(|d| d.beta(i))
    }

    /// `true` if the dart exists and has no `β2` partner.
    #[must_use]
    pub fn is_boundary_dart(&self, dart: DartKey) -> bool {
        self.darts.get(dart).is_some_and(Dart::is_boundary)
    }

    /// Vertex the dart points to.
    #[must_use]
    pub fn dart_target(&self, dart: DartKey) -> Option<VertexKey> {
        self.darts.get(dart).map(Dart::vertex)
    }

    /// Vertex the dart starts from.
    ///
    /// Interior darts read it off their `β2` partner; boundary darts walk
    /// the face cycle back to the predecessor.
    #[must_use]
    pub fn dart_source(&self, dart: DartKey) -> Option<VertexKey> {
        let d = self.darts.get(dart)?;
        match d.sym() {
            Some(sym) => self.dart_target(sym),
            None => self.dart_prev(dart).and_then(|p| self.dart_target(p)),
        }
    }

    /// `β1(dart)`: next dart around the face.
    #[must_use]
    pub fn dart_next(&self, dart: DartKey) -> Option<DartKey> {
        self.beta(1, dart)
    }

    /// Predecessor around the face, found by walking the cycle.
    #[must_use]
    pub fn dart_prev(&self, dart: DartKey) -> Option<DartKey> {
        let mut d = dart;
        for _ in 0..self.darts.len() {
            let next = self.dart_next(d)?;
            if next == dart {
                return Some(d);
            }
            d = next;
        }
        None
    }

    /// `β2(dart)`: the opposite dart across the edge.
    #[must_use]
    pub fn dart_sym(&self, dart: DartKey) -> Option<DartKey> {
        self.beta(2, dart)
    }

    /// Edge the dart lies on.
    #[must_use]
    pub fn dart_edge(&self, dart: DartKey) -> Option<EdgeKey> {
        self.darts.get(dart).map(Dart::edge)
    }

    /// Face the dart belongs to.
    #[must_use]
    pub fn dart_face(&self, dart: DartKey) -> Option<FaceKey> {
        self.darts.get(dart).map(Dart::face)
    }

    // =========================================================================
    // CELL NAVIGATION
    // =========================================================================

    /// Representative (incoming) dart of a vertex.
    #[must_use]
    pub fn vertex_dart(&self, v: VertexKey) -> Option<DartKey> {
        self.vertices.get(v).and_then(Vertex::dart)
    }

    /// Representative dart of a face.
    #[must_use]
    pub fn face_dart(&self, f: FaceKey) -> Option<DartKey> {
        self.faces.get(f).and_then(Face::dart)
    }

    /// Dart of an edge: `0` is the representative, `1` its `β2` partner
    /// (`None` on the boundary).
    #[must_use]
    pub fn edge_dart(&self, e: EdgeKey, index: usize) -> Option<DartKey> {
        let d = self.edges.get(e).and_then(Edge::dart)?;
        match index {
            0 => Some(d),
            1 => self.dart_sym(d),
            _ => None,
        }
    }

    /// Endpoint of an edge: `0` is the target of the representative dart,
    /// `1` its source.
    #[must_use]
    pub fn edge_vertex(&self, e: EdgeKey, index: usize) -> Option<VertexKey> {
        let d = self.edges.get(e).and_then(Edge::dart)?;
        match index {
            0 => self.dart_target(d),
            1 => self.dart_prev(d).and_then(|p| self.dart_target(p)),
            _ => None,
        }
    }

    /// Face on side `index` of an edge; side `1` is `None` on the boundary.
    #[must_use]
    pub fn edge_face(&self, e: EdgeKey, index: usize) -> Option<FaceKey> {
        self.edge_dart(e, index).and_then(|d| self.dart_face(d))
    }

    /// `true` if the vertex's representative dart is a boundary dart.
    #[must_use]
    pub fn is_boundary_vertex(&self, v: VertexKey) -> bool {
        self.vertex_dart(v).is_some_and(|d| self.is_boundary_dart(d))
    }

    /// `true` if the edge has a single incident face.
    #[must_use]
    pub fn is_boundary_edge(&self, e: EdgeKey) -> bool {
        self.edge_dart(e, 0).is_some_and(|d| self.is_boundary_dart(d))
    }

    /// `true` if the face has at least one boundary dart.
    #[must_use]
    pub fn is_boundary_face(&self, f: FaceKey) -> bool {
        self.face_cycle(f)
            .iter()
            .any(|&d| self.is_boundary_dart(d))
    }

    /// Euclidean length of an edge.
    #[must_use]
    pub fn edge_length(&self, e: EdgeKey) -> Option<f64> {
        let a = self.edge_vertex(e, 0).and_then(|v| self.point(v))?;
        let b = self.edge_vertex(e, 1).and_then(|v| self.point(v))?;
        Some(a.distance(b))
    }

    /// Edge joining `v0` and `v1`, found by walking the fan of `v0`.
    #[must_use]
    pub fn vertex_edge(&self, v0: VertexKey, v1: VertexKey) -> Option<EdgeKey> {
        let d0 = self.vertex_dart(v0)?;
        if self.is_boundary_dart(d0) && self.dart_source(d0) == Some(v1) {
            return self.dart_edge(d0);
        }
        self.vertex_dart_to(v0, v1).and_then(|d| self.dart_edge(d))
    }

    /// Outgoing dart `source → target`, found by walking the out-fan of
    /// `source`.
    #[must_use]
    pub fn vertex_dart_to(&self, source: VertexKey, target: VertexKey) -> Option<DartKey> {
        let start = self.vertex_dart(source).and_then(|d| self.dart_next(d))?;
        let mut d = start;
        for _ in 0..self.darts.len() {
            if self.dart_target(d) == Some(target) {
                return Some(d);
            }
            let sym = self.dart_sym(d)?;
            d = self.dart_next(sym)?;
            if d == start {
                return None;
            }
        }
        None
    }

    /// Dart of face `f` that ends at vertex `v` (the corner `(v, f)`).
    #[must_use]
    pub fn corner(&self, v: VertexKey, f: FaceKey) -> Option<DartKey> {
        self.face_cycle(f)
            .into_iter()
            .find(|&d| self.dart_target(d) == Some(v))
    }

    /// Clockwise-most outgoing dart of a vertex.
    ///
    /// For a boundary vertex this is its outgoing boundary dart; for an
    /// interior vertex it is the successor of the representative.
    #[must_use]
    pub fn vertex_most_clw_out_dart(&self, v: VertexKey) -> Option<DartKey> {
        let d = self.vertex_dart(v)?;
        let out = self.dart_next(d)?;
        if !self.is_boundary_dart(d) {
            return Some(out);
        }
        let mut o = out;
        for _ in 0..self.darts.len() {
            if self.is_boundary_dart(o) {
                return Some(o);
            }
            o = self.dart_sym(o).and_then(|s| self.dart_next(s))?;
        }
        None
    }

    /// Darts of a face in `β1` order, starting at its representative.
    #[must_use]
    pub fn face_cycle(&self, f: FaceKey) -> SmallBuffer<DartKey, FACE_BUFFER_SIZE> {
        let mut cycle = SmallBuffer::new();
        let Some(start) = self.face_dart(f) else {
            return cycle;
        };
        let mut d = start;
        for _ in 0..self.darts.len() {
            cycle.push(d);
            match self.dart_next(d) {
                Some(next) if next != start => d = next,
                _ => break,
            }
        }
        cycle
    }

    /// Vertex ids of a face in winding order, starting at the target of its
    /// representative dart.
    #[must_use]
    pub fn face_vertex_ids(&self, f: FaceKey) -> Vec<usize> {
        self.face_cycle(f)
            .iter()
            .filter_map(|&d| self.dart_target(d).and_then(|v| self.vertex_id(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> SurfaceMesh {
        SurfaceMesh::from_faces(
            &[
                (1, Point::new([0.0, 0.0, 0.0])),
                (2, Point::new([1.0, 0.0, 0.0])),
                (3, Point::new([0.0, 1.0, 0.0])),
            ],
            &[(1, vec![1, 2, 3])],
        )
        .unwrap()
    }

    fn square() -> SurfaceMesh {
        SurfaceMesh::from_faces(
            &[
                (1, Point::new([0.0, 0.0, 0.0])),
                (2, Point::new([1.0, 0.0, 0.0])),
                (3, Point::new([1.0, 1.0, 0.0])),
                (4, Point::new([0.0, 1.0, 0.0])),
            ],
            &[(1, vec![1, 2, 3]), (2, vec![1, 3, 4])],
        )
        .unwrap()
    }

    fn key(mesh: &SurfaceMesh, id: usize) -> VertexKey {
        mesh.id_vertex(id).unwrap()
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    #[test]
    fn single_triangle_is_all_boundary() {
        let mesh = triangle();
        assert_eq!(mesh.number_of_vertices(), 3);
        assert_eq!(mesh.number_of_edges(), 3);
        assert_eq!(mesh.number_of_faces(), 1);
        assert_eq!(mesh.number_of_darts(), 3);
        assert!(mesh.darts().all(|(_, d)| d.is_boundary()));

        let face = mesh.id_face(1).unwrap();
        assert_eq!(mesh.face_vertex_ids(face), vec![2, 3, 1]);
    }

    #[test]
    fn shared_edge_links_one_pair() {
        let mesh = square();
        assert_eq!(mesh.number_of_edges(), 5);
        let linked: Vec<DartKey> = mesh
            .darts()
            .filter(|(_, d)| !d.is_boundary())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(linked.len(), 2);
        assert_eq!(mesh.dart_sym(linked[0]), Some(linked[1]));
        assert_eq!(mesh.dart_sym(linked[1]), Some(linked[0]));
        assert_eq!(mesh.dart_edge(linked[0]), mesh.dart_edge(linked[1]));
    }

    #[test]
    fn boundary_vertices_get_boundary_representatives() {
        let mesh = square();
        for (_, v) in mesh.vertices() {
            let d = v.dart().unwrap();
            assert!(mesh.is_boundary_dart(d));
            assert_eq!(mesh.dart_target(d), mesh.id_vertex(v.id()));
        }
    }

    #[test]
    fn construction_rejects_bad_faces_without_mutation() {
        let mut mesh = square();
        mesh.create_vertex(5, Point::new([2.0, 2.0, 0.0])).unwrap();
        let (edges, darts) = (mesh.number_of_edges(), mesh.number_of_darts());

        assert_eq!(
            mesh.create_face(&[1, 2], 7),
            Err(MeshConstructionError::DegenerateFace {
                face_id: 7,
                corners: 2
            })
        );
        assert_eq!(
            mesh.create_face(&[1, 2, 9], 7),
            Err(MeshConstructionError::UnknownVertexId { id: 9 })
        );
        assert_eq!(
            mesh.create_face(&[1, 2, 1], 7),
            Err(MeshConstructionError::RepeatedVertex {
                face_id: 7,
                vertex_id: 1
            })
        );
        assert_eq!(
            mesh.create_face(&[2, 3, 4], 1),
            Err(MeshConstructionError::DuplicateFaceId { id: 1 })
        );
        // Edge 1-3 already has two faces.
        assert_eq!(
            mesh.create_face(&[3, 1, 5], 7),
            Err(MeshConstructionError::NonManifoldEdge { v0: 3, v1: 1 })
        );
        // Edge 1-2 is traversed 1→2 by face 1 already.
        assert_eq!(
            mesh.create_face(&[1, 2, 5], 7),
            Err(MeshConstructionError::InconsistentOrientation { v0: 1, v1: 2 })
        );

        assert_eq!(mesh.number_of_faces(), 2);
        assert_eq!(mesh.number_of_edges(), edges);
        assert_eq!(mesh.number_of_darts(), darts);
        assert!(mesh.id_face(7).is_none());
    }

    #[test]
    fn failed_load_keeps_previous_content() {
        let mut mesh = triangle();
        let err = mesh
            .load(&[(1, Point::default())], &[(1, vec![1, 2, 3])])
            .unwrap_err();
        assert_eq!(err, MeshConstructionError::UnknownVertexId { id: 2 });
        assert_eq!(mesh.number_of_faces(), 1);
        assert_eq!(mesh.number_of_vertices(), 3);
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    #[test]
    fn source_and_target_agree_with_winding() {
        let mesh = square();
        let face = mesh.id_face(1).unwrap();
        let cycle = mesh.face_cycle(face);
        assert_eq!(cycle.len(), 3);
        for (i, &d) in cycle.iter().enumerate() {
            let prev = cycle[(i + cycle.len() - 1) % cycle.len()];
            assert_eq!(mesh.dart_prev(d), Some(prev));
            assert_eq!(mesh.dart_source(d), mesh.dart_target(prev));
        }
    }

    #[test]
    fn edge_queries() {
        let mesh = square();
        let (a, b, c, d) = (key(&mesh, 1), key(&mesh, 2), key(&mesh, 3), key(&mesh, 4));

        let diagonal = mesh.vertex_edge(a, c).unwrap();
        assert_eq!(mesh.vertex_edge(c, a), Some(diagonal));
        assert!(!mesh.is_boundary_edge(diagonal));
        assert!(mesh.edge_face(diagonal, 1).is_some());
        assert_relative_eq!(mesh.edge_length(diagonal).unwrap(), 2.0_f64.sqrt());

        let ab = mesh.vertex_edge(a, b).unwrap();
        assert!(mesh.is_boundary_edge(ab));
        assert!(mesh.edge_face(ab, 1).is_none());
        assert!(mesh.edge_dart(ab, 1).is_none());
        let ends = [mesh.edge_vertex(ab, 0).unwrap(), mesh.edge_vertex(ab, 1).unwrap()];
        assert!(ends.contains(&a) && ends.contains(&b));

        assert!(mesh.vertex_edge(b, d).is_none());
    }

    #[test]
    fn out_dart_and_corner_lookups() {
        let mesh = square();
        let (a, c) = (key(&mesh, 1), key(&mesh, 3));
        let ac = mesh.vertex_dart_to(a, c).unwrap();
        assert_eq!(mesh.dart_source(ac), Some(a));
        assert_eq!(mesh.dart_target(ac), Some(c));

        let f2 = mesh.id_face(2).unwrap();
        let corner = mesh.corner(a, f2).unwrap();
        assert_eq!(mesh.dart_target(corner), Some(a));
        assert_eq!(mesh.dart_face(corner), Some(f2));
    }

    #[test]
    fn most_clockwise_out_dart_is_boundary_on_boundary_vertices() {
        let mesh = square();
        for (v, _) in mesh.vertices() {
            let out = mesh.vertex_most_clw_out_dart(v).unwrap();
            assert_eq!(mesh.dart_source(out), Some(v));
            assert!(mesh.is_boundary_dart(out));
        }
    }

    // =========================================================================
    // ATTRIBUTES
    // =========================================================================

    #[test]
    fn load_attributes_is_all_or_nothing() {
        let mut mesh = square();
        let bad = SurfaceAttributes {
            vertices: vec![(1, "fixed".to_string())],
            edges: vec![(2, 4, "crease".to_string())],
            ..SurfaceAttributes::default()
        };
        assert_eq!(
            mesh.load_attributes(&bad),
            Err(MeshConstructionError::UnknownEdge { v0: 2, v1: 4 })
        );
        assert!(mesh.vertex(key(&mesh, 1)).unwrap().string().is_empty());

        let good = SurfaceAttributes {
            vertices: vec![(1, "fixed".to_string())],
            faces: vec![(2, "label=(3)".to_string())],
            edges: vec![(1, 3, "crease".to_string())],
            corners: vec![(4, 2, "uv=(0 1)".to_string())],
        };
        mesh.load_attributes(&good).unwrap();
        assert_eq!(mesh.vertex(key(&mesh, 1)).unwrap().string(), "fixed");
        let f2 = mesh.id_face(2).unwrap();
        assert_eq!(mesh.face(f2).unwrap().string(), "label=(3)");
        let corner = mesh.corner(key(&mesh, 4), f2).unwrap();
        assert_eq!(mesh.dart(corner).unwrap().string(), "uv=(0 1)");
    }
}
