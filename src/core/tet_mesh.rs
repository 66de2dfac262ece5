//! Combinatorial-map tetrahedral mesh (3-manifold with boundary).
//!
//! Every tetrahedron contributes four triangles of three darts each. Inside a
//! tet, `β1` walks a triangle and `β2` pairs the two darts of a tet edge that
//! lie on adjacent triangles. Across tets, `β3` pairs the darts of a shared
//! triangle, so a dart is on the boundary exactly when its `β3` is unset.
//!
//! Edges and triangles are deduplicated through the [`EdgeIndex`] and
//! [`FaceIndex`]: a triangle shared by two tets is one [`Face`] cell whose
//! representative dart belongs to the first tet that created it.

use crate::core::cell::{Edge, EdgeKey, Face, FaceKey, Vertex, VertexKey, Volume, VolumeKey};
use crate::core::collections::{
    EdgeIndex, FAN_BUFFER_SIZE, FaceIndex, SmallBuffer, StorageMap, VertexIdMap, VolumeIdMap,
    VolumeKeySet,
};
use crate::core::dart::{Dart, DartKey, TetDart};
use crate::core::surface_mesh::MeshConstructionError;
use crate::core::traits::attribute_codec::{AttributeCodec, MeshTraits, NoAttributes};
use crate::core::vertex_tuple::{VertexPair, VertexTriple};
use crate::geometry::point::Point;
use std::collections::VecDeque;

/// Corner indices of the four triangles of a tet. When `v3` lies on the
/// positive side of `[v0, v1, v2]`, every triangle's right-handed normal
/// points inward, toward the corner it leaves out.
const TET_FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]];

/// Raw attribute records for a tetrahedral mesh, keyed the way the `.t`
/// format stores them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TetAttributes {
    /// `(vertex id, position in the load order)`. Applied only when it covers
    /// every vertex.
    pub vertex_ids: Vec<(usize, usize)>,
    /// `(vertex id, payload)`.
    pub vertices: Vec<(usize, String)>,
    /// `(volume id, position in the load order)`. Applied only when it covers
    /// every volume.
    pub volume_ids: Vec<(usize, usize)>,
    /// `(volume id, payload)`.
    pub volumes: Vec<(usize, String)>,
    /// `(vertex id, vertex id, payload)`.
    pub edges: Vec<(usize, usize, String)>,
}

/// Owner of all darts and cells of a tetrahedral mesh.
#[derive(Clone, Debug)]
pub struct TetMesh<M: MeshTraits = NoAttributes> {
    pub(crate) vertices: StorageMap<VertexKey, Vertex<M::Vertex>>,
    pub(crate) edges: StorageMap<EdgeKey, Edge<M::Edge>>,
    pub(crate) faces: StorageMap<FaceKey, Face<M::Face>>,
    pub(crate) volumes: StorageMap<VolumeKey, Volume<M::Volume>>,
    pub(crate) darts: StorageMap<DartKey, TetDart<M::Dart>>,
    pub(crate) vertex_order: Vec<VertexKey>,
    pub(crate) volume_order: Vec<VolumeKey>,
    pub(crate) vertex_ids: VertexIdMap,
    pub(crate) volume_ids: VolumeIdMap,
    pub(crate) edge_index: EdgeIndex,
    pub(crate) face_index: FaceIndex,
}

impl<M: MeshTraits> Default for TetMesh<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MeshTraits> TetMesh<M> {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertices: StorageMap::with_key(),
            edges: StorageMap::with_key(),
            faces: StorageMap::with_key(),
            volumes: StorageMap::with_key(),
            darts: StorageMap::with_key(),
            vertex_order: Vec::new(),
            volume_order: Vec::new(),
            vertex_ids: VertexIdMap::default(),
            volume_ids: VolumeIdMap::default(),
            edge_index: EdgeIndex::default(),
            face_index: FaceIndex::default(),
        }
    }

    /// Builds a mesh from positions and tets given as indices into `points`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_tets<V: AsRef<[usize]>>(
        points: &[Point<f64, 3>],
        tets: &[V],
    ) -> Result<Self, MeshConstructionError> {
        let mut mesh = Self::new();
        mesh.load(points, tets)?;
        Ok(mesh)
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Replaces the mesh content with the given points and tets.
    ///
    /// Vertex `i` receives id `i + 1` and tet `j` id `j + 1`;
    /// [`load_attributes`](Self::load_attributes) may reassign both. After
    /// all tets are linked, every boundary dart becomes the representative
    /// of its edge.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if a tet references an index out
    /// of range, repeats a vertex, or would give a triangle a third tet. The
    /// mesh is unchanged on error.
    pub fn load<V: AsRef<[usize]>>(
        &mut self,
        points: &[Point<f64, 3>],
        tets: &[V],
    ) -> Result<(), MeshConstructionError> {
        let mut fresh = Self::new();
        for (index, point) in points.iter().enumerate() {
            let key = fresh.vertices.insert(Vertex::new(index + 1, *point));
            fresh.vertex_order.push(key);
            fresh.vertex_ids.insert(index + 1, key);
        }
        for (index, tet) in tets.iter().enumerate() {
            fresh.create_volume(tet.as_ref(), index + 1)?;
        }
        fresh.assign_boundary_representatives();
        *self = fresh;
        Ok(())
    }

    /// Adds a tet over four vertex positions (indices into the load order).
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if the tet is malformed or one of
    /// its triangles already bounds two tets. The mesh is unchanged on error.
    pub fn create_volume(
        &mut self,
        indices: &[usize],
        id: usize,
    ) -> Result<VolumeKey, MeshConstructionError> {
        let corners = self.validate_volume(indices, id)?;

        let volume = self.volumes.insert(Volume::new(id));
        self.volume_order.push(volume);
        self.volume_ids.insert(id, volume);

        let mut faces = [DartKey::default(); 4];
        for (slot, table) in faces.iter_mut().zip(TET_FACES) {
            *slot = self.add_face(volume, table.map(|j| corners[j]))?;
        }

        if let Some(v) = self.volumes.get_mut(volume) {
            v.set_dart(Some(faces[0]));
        }
        for i in 0..4 {
            for j in (i + 1)..4 {
                self.link_faces(faces[i], faces[j])?;
            }
        }
        Ok(volume)
    }

    fn validate_volume(
        &self,
        indices: &[usize],
        id: usize,
    ) -> Result<[VertexKey; 4], MeshConstructionError> {
        if self.volume_ids.contains_key(&id) {
            return Err(MeshConstructionError::DuplicateVolumeId { id });
        }
        let invalid = || MeshConstructionError::InvalidTetrahedron {
            volume_index: id.saturating_sub(1),
            vertices: indices.to_vec(),
        };
        if indices.len() != 4 {
            return Err(invalid());
        }
        let mut corners = [VertexKey::default(); 4];
        for (i, &index) in indices.iter().enumerate() {
            if indices[..i].contains(&index) {
                return Err(invalid());
            }
            corners[i] = *self.vertex_order.get(index).ok_or(
                MeshConstructionError::UnknownVertexIndex {
                    index,
                    count: self.vertex_order.len(),
                },
            )?;
        }
        for table in TET_FACES {
            let triple = VertexTriple::from(table.map(|j| corners[j]));
            let shared = self
                .face_index
                .get(&triple)
                .and_then(|&f| self.faces.get(f))
                .and_then(Face::dart);
            if shared.is_some_and(|d| !self.is_boundary_dart(d)) {
                return Err(MeshConstructionError::NonManifoldFace {
                    vertices: table.map(|j| self.vertex_id(corners[j]).unwrap_or_default()),
                });
            }
        }
        Ok(corners)
    }

    fn add_face(
        &mut self,
        volume: VolumeKey,
        corners: [VertexKey; 3],
    ) -> Result<DartKey, MeshConstructionError> {
        let triple = VertexTriple::from(corners);
        let (face, existing) = if let Some(&face) = self.face_index.get(&triple) {
            (face, self.faces.get(face).and_then(Face::dart))
        } else {
            let face = self.faces.insert(Face::new(self.faces.len() + 1));
            self.face_index.insert(triple, face);
            (face, None)
        };

        let mut darts = [DartKey::default(); 3];
        for (i, slot) in darts.iter_mut().enumerate() {
            *slot = self.add_edge(volume, face, corners[i], corners[(i + 1) % 3]);
        }
        if existing.is_none()
            && let Some(f) = self.faces.get_mut(face)
        {
            f.set_dart(Some(darts[0]));
        }
        for i in 0..3 {
            self.link_edges(darts[i], darts[(i + 1) % 3]);
        }
        if let Some(shared) = existing {
            self.link_volumes(shared, darts[0])?;
        }
        Ok(darts[0])
    }

    fn add_edge(
        &mut self,
        volume: VolumeKey,
        face: FaceKey,
        source: VertexKey,
        target: VertexKey,
    ) -> DartKey {
        let pair = VertexPair::new(source, target);
        let (edge, is_new) = if let Some(&edge) = self.edge_index.get(&pair) {
            (edge, false)
        } else {
            let edge = self.edges.insert(Edge::new());
            self.edge_index.insert(pair, edge);
            (edge, true)
        };

        let dart = self
            .darts
            .insert(Dart::new(target, edge, face, Some(volume)));
        if let Some(v) = self.vertices.get_mut(target)
            && v.dart().is_none()
        {
            v.set_dart(Some(dart));
        }
        if is_new && let Some(e) = self.edges.get_mut(edge) {
            e.set_dart(Some(dart));
        }
        dart
    }

    /// Pairs the darts of two triangles of the same tet along their shared
    /// edge (`β2`).
    pub(crate) fn link_faces(
        &mut self,
        d1: DartKey,
        d2: DartKey,
    ) -> Result<(), MeshConstructionError> {
        let mut a = d1;
        for _ in 0..3 {
            let mut b = d2;
            for _ in 0..3 {
                if self.dart_edge(a) == self.dart_edge(b) {
                    self.set_beta(a, 2, Some(b));
                    self.set_beta(b, 2, Some(a));
                    return Ok(());
                }
                b = self.dart_next(b).unwrap_or(b);
            }
            a = self.dart_next(a).unwrap_or(a);
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

    /// Pairs the darts of a triangle shared by two tets (`β3`).
    ///
    /// All nine dart pairs are compared; exactly three must share an edge.
    pub(crate) fn link_volumes(
        &mut self,
        d1: DartKey,
        d2: DartKey,
    ) -> Result<(), MeshConstructionError> {
        let mut pairs: SmallBuffer<(DartKey, DartKey), 4> = SmallBuffer::new();
        let mut a = d1;
        for _ in 0..3 {
            let mut b = d2;
            for _ in 0..3 {
                if self.dart_edge(a) == self.dart_edge(b) {
                    pairs.push((a, b));
                }
                b = self.dart_next(b).unwrap_or(b);
            }
            a = self.dart_next(a).unwrap_or(a);
        }
        if pairs.len() != 3 {
            return Err(MeshConstructionError::VolumeLinkFailed { found: pairs.len() });
        }
        for (a, b) in pairs {
            self.set_beta(a, 3, Some(b));
            self.set_beta(b, 3, Some(a));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn set_beta(&mut self, dart: DartKey, i: usize, value: Option<DartKey>) {
        if let Some(d) = self.darts.get_mut(dart) {
            d.set_beta(i, value);
        }
    }

    /// Makes every boundary dart the representative of its edge.
    pub fn assign_boundary_representatives(&mut self) {
        let boundary: Vec<(EdgeKey, DartKey)> = self
            .darts
            .iter()
            .filter(|(_, d)| d.is_boundary())
            .map(|(k, d)| (d.edge(), k))
            .collect();
        for (edge, dart) in boundary {
            if let Some(e) = self.edges.get_mut(edge) {
                e.set_dart(Some(dart));
            }
        }
    }

    /// Assigns ids and raw attribute strings, then decodes them.
    ///
    /// Id tables are applied only when they cover every vertex (volume).
    /// String records are resolved against the ids in effect after that.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshConstructionError`] if a record references a missing
    /// cell or a payload fails to decode. Nothing is changed on error.
    pub fn load_attributes(
        &mut self,
        attributes: &TetAttributes,
    ) -> Result<(), MeshConstructionError> {
        let vertex_ids = if attributes.vertex_ids.len() == self.vertices.len() {
            let mut ids = VertexIdMap::default();
            for &(id, index) in &attributes.vertex_ids {
                let key = self.vertex_at(index).ok_or(
                    MeshConstructionError::UnknownVertexIndex {
                        index,
                        count: self.vertex_order.len(),
                    },
                )?;
                if ids.insert(id, key).is_some() {
                    return Err(MeshConstructionError::DuplicateVertexId { id });
                }
            }
            Some(ids)
        } else {
            None
        };
        let volume_ids = if attributes.volume_ids.len() == self.volumes.len() {
            let mut ids = VolumeIdMap::default();
            for &(id, index) in &attributes.volume_ids {
                let key = self
                    .volume_order
                    .get(index)
                    .copied()
                    .ok_or(MeshConstructionError::UnknownVolumeId { id })?;
                if ids.insert(id, key).is_some() {
                    return Err(MeshConstructionError::DuplicateVolumeId { id });
                }
            }
            Some(ids)
        } else {
            None
        };

        let vertex_lookup = vertex_ids.as_ref().unwrap_or(&self.vertex_ids);
        let volume_lookup = volume_ids.as_ref().unwrap_or(&self.volume_ids);

        let mut vertex_updates = Vec::with_capacity(attributes.vertices.len());
        for (id, payload) in &attributes.vertices {
            let key = *vertex_lookup
                .get(id)
                .ok_or(MeshConstructionError::UnknownVertexId { id: *id })?;
            let mut decoded = M::Vertex::default();
            decoded.decode(payload)?;
            vertex_updates.push((key, payload.clone(), decoded));
        }
        let mut volume_updates = Vec::with_capacity(attributes.volumes.len());
        for (id, payload) in &attributes.volumes {
            let key = *volume_lookup
                .get(id)
                .ok_or(MeshConstructionError::UnknownVolumeId { id: *id })?;
            let mut decoded = M::Volume::default();
            decoded.decode(payload)?;
            volume_updates.push((key, payload.clone(), decoded));
        }
        let mut edge_updates = Vec::with_capacity(attributes.edges.len());
        for (v0, v1, payload) in &attributes.edges {
            let key = vertex_lookup
                .get(v0)
                .zip(vertex_lookup.get(v1))
                .and_then(|(&a, &b)| self.vertex_edge(a, b))
                .ok_or(MeshConstructionError::UnknownEdge { v0: *v0, v1: *v1 })?;
            let mut decoded = M::Edge::default();
            decoded.decode(payload)?;
            edge_updates.push((key, payload.clone(), decoded));
        }

        if let Some(ids) = vertex_ids {
            for (&id, &key) in &ids {
                if let Some(v) = self.vertices.get_mut(key) {
                    v.set_id(id);
                }
            }
            self.vertex_ids = ids;
        }
        if let Some(ids) = volume_ids {
            for (&id, &key) in &ids {
                if let Some(v) = self.volumes.get_mut(key) {
                    v.set_id(id);
                }
            }
            self.volume_ids = ids;
        }
        for (key, payload, decoded) in vertex_updates {
            if let Some(v) = self.vertices.get_mut(key) {
                v.set_string(payload);
                *v.attributes_mut() = decoded;
            }
        }
        for (key, payload, decoded) in volume_updates {
            if let Some(v) = self.volumes.get_mut(key) {
                v.set_string(payload);
                *v.attributes_mut() = decoded;
            }
        }
        for (key, payload, decoded) in edge_updates {
            if let Some(e) = self.edges.get_mut(key) {
                e.set_string(payload);
                *e.attributes_mut() = decoded;
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
        for (_, v) in &mut self.volumes {
            let s = v.attributes().encode(v.string());
            v.set_string(s);
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

    /// Number of distinct triangles.
    #[must_use]
    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of tets.
    #[must_use]
    pub fn number_of_volumes(&self) -> usize {
        self.volumes.len()
    }

    /// Number of darts (twelve per tet).
    #[must_use]
    pub fn number_of_darts(&self) -> usize {
        self.darts.len()
    }

    /// Vertex at position `index` of the load order.
    #[must_use]
    pub fn vertex_at(&self, index: usize) -> Option<VertexKey> {
        self.vertex_order.get(index).copied()
    }

    /// Tet at position `index` of the load order.
    #[must_use]
    pub fn volume_at(&self, index: usize) -> Option<VolumeKey> {
        self.volume_order.get(index).copied()
    }

    /// Vertex with the given id.
    #[must_use]
    pub fn id_vertex(&self, id: usize) -> Option<VertexKey> {
        self.vertex_ids.get(&id).copied()
    }

    /// Tet with the given id.
    #[must_use]
    pub fn id_volume(&self, id: usize) -> Option<VolumeKey> {
        self.volume_ids.get(&id).copied()
    }

    /// Looks up a vertex by key.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex<M::Vertex>> {
        self.vertices.get(key)
    }

    /// Mutable vertex lookup.
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

    /// Looks up a triangle by key.
    #[must_use]
    pub fn face(&self, key: FaceKey) -> Option<&Face<M::Face>> {
        self.faces.get(key)
    }

    /// Looks up a tet by key.
    #[must_use]
    pub fn volume(&self, key: VolumeKey) -> Option<&Volume<M::Volume>> {
        self.volumes.get(key)
    }

    /// Mutable tet lookup.
    pub fn volume_mut(&mut self, key: VolumeKey) -> Option<&mut Volume<M::Volume>> {
        self.volumes.get_mut(key)
    }

    /// Looks up a dart by key.
    #[must_use]
    pub fn dart(&self, key: DartKey) -> Option<&TetDart<M::Dart>> {
        self.darts.get(key)
    }

    /// Vertices in load order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex<M::Vertex>)> {
        self.vertex_order
            .iter()
            .filter_map(|&k| self.vertices.get(k).map(|v| (k, v)))
    }

    /// All edges, in storage order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge<M::Edge>)> {
        self.edges.iter()
    }

    /// All triangles, in storage order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &Face<M::Face>)> {
        self.faces.iter()
    }

    /// Tets in load order.
    pub fn volumes(&self) -> impl Iterator<Item = (VolumeKey, &Volume<M::Volume>)> {
        self.volume_order
            .iter()
            .filter_map(|&k| self.volumes.get(k).map(|v| (k, v)))
    }

    /// All darts, in storage order.
    pub fn darts(&self) -> impl Iterator<Item = (DartKey, &TetDart<M::Dart>)> {
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

    // =========================================================================
    // DART NAVIGATION
    // =========================================================================

    /// `β_i(dart)`.
    #[must_use]
    pub fn beta(&self, i: usize, dart: DartKey) -> Option<DartKey> {
        self.darts.get(dart).and_then(|d| d.beta(i))
    }

    /// `true` if the dart exists and has no `β3` partner.
    #[must_use]
    pub fn is_boundary_dart(&self, dart: DartKey) -> bool {
        self.darts.get(dart).is_some_and(Dart::is_boundary)
    }

    /// Vertex the dart points to.
    #[must_use]
    pub fn dart_target(&self, dart: DartKey) -> Option<VertexKey> {
        self.darts.get(dart).map(Dart::vertex)
    }

    /// Vertex the dart starts from (target of its predecessor).
    #[must_use]
    pub fn dart_source(&self, dart: DartKey) -> Option<VertexKey> {
        self.dart_prev(dart).and_then(|p| self.dart_target(p))
    }

    /// `β1(dart)`.
    #[must_use]
    pub fn dart_next(&self, dart: DartKey) -> Option<DartKey> {
        self.beta(1, dart)
    }

    /// Predecessor around the triangle.
    #[must_use]
    pub fn dart_prev(&self, dart: DartKey) -> Option<DartKey> {
        let mut d = dart;
        for _ in 0..3 {
            let next = self.dart_next(d)?;
            if next == dart {
                return Some(d);
            }
            d = next;
        }
        None
    }

    /// `β2(dart)`: the dart of the same tet edge on the adjacent triangle.
    #[must_use]
    pub fn dart_sym(&self, dart: DartKey) -> Option<DartKey> {
        self.beta(2, dart)
    }

    /// Edge of a dart.
    #[must_use]
    pub fn dart_edge(&self, dart: DartKey) -> Option<EdgeKey> {
        self.darts.get(dart).map(Dart::edge)
    }

    /// Triangle of a dart.
    #[must_use]
    pub fn dart_face(&self, dart: DartKey) -> Option<FaceKey> {
        self.darts.get(dart).map(Dart::face)
    }

    /// Tet of a dart.
    #[must_use]
    pub fn dart_volume(&self, dart: DartKey) -> Option<VolumeKey> {
        self.darts.get(dart).and_then(Dart::volume)
    }

    // =========================================================================
    // CELL NAVIGATION
    // =========================================================================

    /// Representative (incoming) dart of a vertex.
    #[must_use]
    pub fn vertex_dart(&self, v: VertexKey) -> Option<DartKey> {
        self.vertices.get(v).and_then(Vertex::dart)
    }

    /// Representative dart of an edge; a boundary dart on boundary edges.
    #[must_use]
    pub fn edge_dart(&self, e: EdgeKey) -> Option<DartKey> {
        self.edges.get(e).and_then(Edge::dart)
    }

    /// Representative dart of a triangle.
    #[must_use]
    pub fn face_dart(&self, f: FaceKey) -> Option<DartKey> {
        self.faces.get(f).and_then(Face::dart)
    }

    /// Representative dart of a tet.
    #[must_use]
    pub fn volume_dart(&self, vol: VolumeKey) -> Option<DartKey> {
        self.volumes.get(vol).and_then(Volume::dart)
    }

    /// Endpoint of an edge: `0` is the target of its dart, `1` the source.
    #[must_use]
    pub fn edge_vertex(&self, e: EdgeKey, index: usize) -> Option<VertexKey> {
        let d = self.edge_dart(e)?;
        match index {
            0 => self.dart_target(d),
            1 => self.dart_sym(d).and_then(|s| self.dart_target(s)),
            _ => None,
        }
    }

    /// `true` if the triangle bounds a single tet.
    #[must_use]
    pub fn is_boundary_face(&self, f: FaceKey) -> bool {
        self.face_dart(f).is_some_and(|d| self.is_boundary_dart(d))
    }

    /// `true` if the edge lies on a boundary triangle.
    #[must_use]
    pub fn is_boundary_edge(&self, e: EdgeKey) -> bool {
        self.edge_dart(e).is_some_and(|d| self.is_boundary_dart(d))
    }

    /// Edge joining two vertices, found among the darts incident to `v1`.
    #[must_use]
    pub fn vertex_edge(&self, v0: VertexKey, v1: VertexKey) -> Option<EdgeKey> {
        self.vertex_incident_darts(v1)
            .into_iter()
            .find(|&d| self.dart_source(d) == Some(v0))
            .and_then(|d| self.dart_edge(d))
    }

    /// One representative dart per triangle of a tet.
    ///
    /// The first three rotate around the target of the tet's dart; the last
    /// is the opposite triangle.
    #[must_use]
    pub fn volume_face_darts(&self, vol: VolumeKey) -> Option<[DartKey; 4]> {
        let start = self.volume_dart(vol)?;
        let mut darts = [start; 4];
        let mut d = start;
        for slot in darts.iter_mut().take(3) {
            *slot = d;
            d = self.dart_next(d).and_then(|n| self.dart_sym(n))?;
        }
        darts[3] = self
            .dart_next(d)
            .and_then(|n| self.dart_next(n))
            .and_then(|n| self.dart_sym(n))?;
        Some(darts)
    }

    /// The three darts of tet `vol` that end at `v`.
    #[must_use]
    pub fn vertex_incident_darts_in(
        &self,
        v: VertexKey,
        vol: VolumeKey,
    ) -> SmallBuffer<DartKey, 3> {
        let mut result = SmallBuffer::new();
        let start = self
            .vertex_dart(v)
            .filter(|&d| self.dart_volume(d) == Some(vol))
            .or_else(|| {
                self.volume_face_darts(vol)?.into_iter().find_map(|face| {
                    let mut d = face;
                    for _ in 0..3 {
                        if self.dart_target(d) == Some(v) {
                            return Some(d);
                        }
                        d = self.dart_next(d)?;
                    }
                    None
                })
            });
        let Some(mut d) = start else {
            return result;
        };
        for _ in 0..3 {
            result.push(d);
            match self.dart_next(d).and_then(|n| self.dart_sym(n)) {
                Some(next) => d = next,
                None => break,
            }
        }
        result
    }

    /// Every dart ending at `v`, three per incident tet, gathered by a
    /// breadth-first walk over tets across `β3`.
    #[must_use]
    pub fn vertex_incident_darts(&self, v: VertexKey) -> SmallBuffer<DartKey, FAN_BUFFER_SIZE> {
        let mut darts = SmallBuffer::new();
        let Some(first) = self.vertex_dart(v).and_then(|d| self.dart_volume(d)) else {
            return darts;
        };
        let mut visited = VolumeKeySet::default();
        let mut queue = VecDeque::from([first]);
        visited.insert(first);
        while let Some(vol) = queue.pop_front() {
            for d in self.vertex_incident_darts_in(v, vol) {
                darts.push(d);
                if let Some(neighbor) = self.beta(3, d).and_then(|o| self.dart_volume(o))
                    && visited.insert(neighbor)
                {
                    queue.push_back(neighbor);
                }
            }
        }
        darts
    }

    /// Corner vertices of a tet in its original winding.
    #[must_use]
    pub fn volume_corners(&self, vol: VolumeKey) -> Option<[VertexKey; 4]> {
        let d = self.volume_dart(vol)?;
        let next = self.dart_next(d)?;
        let apex = self
            .dart_sym(d)
            .and_then(|s| self.dart_next(s))
            .and_then(|n| self.dart_target(n))?;
        Some([
            self.dart_source(d)?,
            self.dart_target(d)?,
            self.dart_target(next)?,
            apex,
        ])
    }

    /// Vertex ids of a triangle, starting at the target of its dart.
    #[must_use]
    pub fn face_vertex_ids(&self, f: FaceKey) -> Option<[usize; 3]> {
        let d0 = self.face_dart(f)?;
        let d1 = self.dart_next(d0)?;
        let d2 = self.dart_next(d1)?;
        let id = |d: DartKey| self.dart_target(d).and_then(|v| self.vertex_id(v));
        Some([id(d0)?, id(d1)?, id(d2)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tet() -> Vec<Point<f64, 3>> {
        vec![
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
        ]
    }

    fn two_tets() -> TetMesh {
        let mut points = unit_tet();
        points.push(Point::new([1.0, 1.0, 1.0]));
        TetMesh::from_tets(&points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap()
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    #[test]
    fn single_tet_counts() {
        let mesh: TetMesh = TetMesh::from_tets(&unit_tet(), &[[0, 1, 2, 3]]).unwrap();
        assert_eq!(mesh.number_of_vertices(), 4);
        assert_eq!(mesh.number_of_edges(), 6);
        assert_eq!(mesh.number_of_faces(), 4);
        assert_eq!(mesh.number_of_volumes(), 1);
        assert_eq!(mesh.number_of_darts(), 12);
        assert!(mesh.darts().all(|(_, d)| d.is_boundary()));
        assert!(mesh.darts().all(|(k, _)| mesh.dart_sym(k).is_some()));
        assert_eq!(mesh.vertex_id(mesh.vertex_at(2).unwrap()), Some(3));
    }

    #[test]
    fn face_table_winds_toward_the_left_out_corner() {
        use crate::geometry::predicates::signed_volume;
        let p = unit_tet();
        for face in TET_FACES {
            let opposite = (0..4).find(|i| !face.contains(i)).unwrap();
            let volume = signed_volume(&p[face[0]], &p[face[1]], &p[face[2]], &p[opposite]);
            assert!(volume > 0.0, "face {face:?}");
        }
    }

    #[test]
    fn shared_triangle_is_linked_across_tets() {
        let mesh = two_tets();
        assert_eq!(mesh.number_of_faces(), 7);
        assert_eq!(mesh.number_of_edges(), 9);
        let interior: Vec<_> = mesh
            .darts()
            .filter(|(_, d)| !d.is_boundary())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(interior.len(), 6);
        for d in interior {
            let o = mesh.beta(3, d).unwrap();
            assert_eq!(mesh.beta(3, o), Some(d));
            assert_eq!(mesh.dart_edge(o), mesh.dart_edge(d));
            assert_ne!(mesh.dart_volume(o), mesh.dart_volume(d));
        }
        assert_eq!(mesh.faces().filter(|(f, _)| mesh.is_boundary_face(*f)).count(), 6);
        assert!(mesh.edges().all(|(e, _)| mesh.is_boundary_edge(e)));
    }

    #[test]
    fn malformed_tets_are_rejected() {
        let points = unit_tet();
        assert!(matches!(
            TetMesh::<NoAttributes>::from_tets(&points, &[[0, 1, 2, 2]]),
            Err(MeshConstructionError::InvalidTetrahedron { .. })
        ));
        assert_eq!(
            TetMesh::<NoAttributes>::from_tets(&points, &[[0, 1, 2, 9]]).unwrap_err(),
            MeshConstructionError::UnknownVertexIndex { index: 9, count: 4 }
        );
        let mut points = unit_tet();
        points.push(Point::new([1.0, 1.0, 1.0]));
        points.push(Point::new([-1.0, -1.0, -1.0]));
        assert!(matches!(
            TetMesh::<NoAttributes>::from_tets(
                &points,
                &[[0, 1, 2, 3], [1, 2, 3, 4], [1, 2, 3, 5]]
            ),
            Err(MeshConstructionError::NonManifoldFace { .. })
        ));
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    #[test]
    fn volume_face_darts_cover_all_triangles() {
        let mesh: TetMesh = TetMesh::from_tets(&unit_tet(), &[[0, 1, 2, 3]]).unwrap();
        let vol = mesh.volume_at(0).unwrap();
        let darts = mesh.volume_face_darts(vol).unwrap();
        let mut faces: Vec<_> = darts.iter().map(|&d| mesh.dart_face(d).unwrap()).collect();
        faces.sort();
        faces.dedup();
        assert_eq!(faces.len(), 4);
    }

    #[test]
    fn corners_reproduce_input_winding() {
        let mesh = two_tets();
        for (index, expected) in [[0, 1, 2, 3], [1, 2, 3, 4]].into_iter().enumerate() {
            let vol = mesh.volume_at(index).unwrap();
            let corners = mesh.volume_corners(vol).unwrap();
            assert_eq!(corners, expected.map(|i| mesh.vertex_at(i).unwrap()));
        }
    }

    #[test]
    fn incident_darts_span_neighbouring_tets() {
        let mesh = two_tets();
        let shared = mesh.vertex_at(1).unwrap();
        let darts = mesh.vertex_incident_darts(shared);
        assert_eq!(darts.len(), 6);
        assert!(darts.iter().all(|&d| mesh.dart_target(d) == Some(shared)));

        let apex = mesh.vertex_at(0).unwrap();
        assert_eq!(mesh.vertex_incident_darts(apex).len(), 3);
    }

    #[test]
    fn edge_lookup_and_endpoints() {
        let mesh = two_tets();
        let (a, b) = (mesh.vertex_at(1).unwrap(), mesh.vertex_at(4).unwrap());
        let e = mesh.vertex_edge(a, b).unwrap();
        assert_eq!(mesh.vertex_edge(b, a), Some(e));
        let ends = [mesh.edge_vertex(e, 0).unwrap(), mesh.edge_vertex(e, 1).unwrap()];
        assert!(ends.contains(&a) && ends.contains(&b));
        assert!(mesh
            .vertex_edge(mesh.vertex_at(0).unwrap(), mesh.vertex_at(4).unwrap())
            .is_none());
    }

    // =========================================================================
    // ATTRIBUTES
    // =========================================================================

    #[test]
    fn load_attributes_reassigns_ids_when_complete() {
        let mut mesh: TetMesh = TetMesh::from_tets(&unit_tet(), &[[0, 1, 2, 3]]).unwrap();
        let attributes = TetAttributes {
            vertex_ids: vec![(10, 0), (20, 1), (30, 2), (40, 3)],
            vertices: vec![(20, "fixed".to_string())],
            volume_ids: vec![(7, 0)],
            volumes: vec![(7, "material=(2)".to_string())],
            edges: vec![(10, 40, "crease".to_string())],
        };
        mesh.load_attributes(&attributes).unwrap();

        let v = mesh.id_vertex(20).unwrap();
        assert_eq!(v, mesh.vertex_at(1).unwrap());
        assert_eq!(mesh.vertex(v).unwrap().string(), "fixed");
        assert!(mesh.id_vertex(2).is_none());
        let vol = mesh.id_volume(7).unwrap();
        assert_eq!(mesh.volume(vol).unwrap().string(), "material=(2)");
        let e = mesh
            .vertex_edge(mesh.id_vertex(10).unwrap(), mesh.id_vertex(40).unwrap())
            .unwrap();
        assert_eq!(mesh.edge(e).unwrap().string(), "crease");
    }

    #[test]
    fn partial_id_tables_are_ignored() {
        let mut mesh: TetMesh = TetMesh::from_tets(&unit_tet(), &[[0, 1, 2, 3]]).unwrap();
        let attributes = TetAttributes {
            vertex_ids: vec![(10, 0)],
            vertices: vec![(1, "kept".to_string())],
            ..TetAttributes::default()
        };
        mesh.load_attributes(&attributes).unwrap();
        assert!(mesh.id_vertex(10).is_none());
        let v = mesh.id_vertex(1).unwrap();
        assert_eq!(mesh.vertex(v).unwrap().string(), "kept");
    }
}
