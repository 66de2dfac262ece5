//! Insertion and removal on an existing surface mesh.
//!
//! Every operation here either completes and leaves the mesh satisfying all
//! structural invariants, or fails and leaves it as it was. Single-face
//! removal guarantees this with a guard evaluated before any mutation.
//! Batch removal retries guard rejections in a different order and, if it
//! still cannot finish, restores the faces it already removed from
//! snapshots.

use crate::core::cell::{Edge, EdgeKey, Face, FaceKey, Vertex, VertexKey};
use crate::core::collections::{FACE_BUFFER_SIZE, FaceKeySet, SmallBuffer};
use crate::core::dart::{DartKey, SurfaceDart};
use crate::core::surface_mesh::{MeshConstructionError, SurfaceMesh};
use crate::core::traits::attribute_codec::MeshTraits;
use crate::core::vertex_tuple::VertexPair;
use crate::geometry::point::Point;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by the removal operations.
///
/// Every variant leaves the mesh unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemovalError {
    /// The face key does not resolve.
    #[error("Face does not exist")]
    UnknownFace,
    /// The edge key does not resolve.
    #[error("Edge does not exist")]
    UnknownEdge,
    /// The vertex key does not resolve.
    #[error("Vertex does not exist")]
    UnknownVertex,
    /// Removing the face would leave a vertex with two disconnected fans.
    #[error("Removing face {face_id} would pinch vertex {vertex_id}")]
    NonManifold {
        /// The face that was rejected.
        face_id: usize,
        /// The vertex that would become non-manifold.
        vertex_id: usize,
    },
    /// A batch could not be ordered so that every face passes the guard.
    #[error("Batch removal stalled with {remaining} faces left")]
    Stalled {
        /// Faces still in the queue when progress stopped.
        remaining: usize,
    },
    /// Restoring removed faces failed.
    #[error("Rollback failed: {source}")]
    Rollback {
        /// The construction error raised while re-inserting.
        #[from]
        source: MeshConstructionError,
    },
}

// Everything needed to re-insert one removed face.
#[derive(Clone, Debug)]
struct FaceSnapshot<M: MeshTraits> {
    face: Face<M::Face>,
    corners: SmallBuffer<CornerSnapshot<M>, FACE_BUFFER_SIZE>,
}

// Faces taken out by a successful batch removal, newest last.
#[derive(Clone, Debug)]
pub(crate) struct DetachedFaces<M: MeshTraits>(Vec<FaceSnapshot<M>>);

// One dart of the face, with its target vertex and edge.
#[derive(Clone, Debug)]
struct CornerSnapshot<M: MeshTraits> {
    vertex: Vertex<M::Vertex>,
    edge: Edge<M::Edge>,
    dart: SurfaceDart<M::Dart>,
}

impl<M: MeshTraits> SurfaceMesh<M> {
    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Adds an isolated vertex to an existing mesh.
    ///
    /// # Errors
    ///
    /// Returns [`MeshConstructionError::DuplicateVertexId`] if `id` is taken.
    pub fn insert_vertex(
        &mut self,
        id: usize,
        point: Point<f64, 3>,
    ) -> Result<VertexKey, MeshConstructionError> {
        self.create_vertex(id, point)
    }

    /// Adds a face to an existing mesh and refreshes the boundary
    /// representatives of its corners.
    ///
    /// # Errors
    ///
    /// See [`create_face`](Self::create_face). The mesh is unchanged on error.
    pub fn insert_face(
        &mut self,
        ids: &[usize],
        face_id: usize,
    ) -> Result<FaceKey, MeshConstructionError> {
        let face = self.create_face(ids, face_id)?;
        let corners: SmallBuffer<VertexKey, FACE_BUFFER_SIZE> = self
            .face_cycle(face)
            .into_iter()
            .filter_map(|d| self.dart_target(d))
            .collect();
        for v in corners {
            self.refresh_boundary_representative(v);
        }
        Ok(face)
    }

    // Walks the in-darts of `v` backwards; the first one without a `β2`
    // partner becomes the representative. Closed fans keep theirs.
    fn refresh_boundary_representative(&mut self, v: VertexKey) {
        let Some(start) = self.vertex_dart(v) else {
            return;
        };
        let mut d = start;
        for _ in 0..self.number_of_darts() {
            let Some(sym) = self.dart_sym(d) else {
                if let Some(vertex) = self.vertices.get_mut(v) {
                    vertex.set_dart(Some(d));
                }
                return;
            };
            match self.dart_prev(sym) {
                Some(prev) if prev != start => d = prev,
                _ => return,
            }
        }
    }

    // =========================================================================
    // SINGLE-FACE REMOVAL
    // =========================================================================

    /// Removes one face.
    ///
    /// Edges left without a face and vertices left without a face are
    /// released; surviving vertices that move onto the boundary get a
    /// boundary in-dart as representative.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::UnknownFace`] if `face` does not resolve, and
    /// [`RemovalError::NonManifold`] if a boundary corner of the face has
    /// both of its face edges in the interior. The mesh is unchanged on
    /// error.
    pub fn remove_face(&mut self, face: FaceKey) -> Result<(), RemovalError> {
        let face_id = self.face_id(face).ok_or(RemovalError::UnknownFace)?;
        let darts = self.face_cycle(face);
        let n = darts.len();

        // Guard: a boundary corner must keep a boundary edge of this face.
        for i in 0..n {
            let incoming = darts[i];
            let outgoing = darts[(i + 1) % n];
            let Some(b) = self.dart_target(incoming) else {
                continue;
            };
            if self.is_boundary_vertex(b)
                && !self.is_boundary_dart(incoming)
                && !self.is_boundary_dart(outgoing)
            {
                let vertex_id = self.vertex_id(b).unwrap_or_default();
                tracing::debug!(face_id, vertex_id, "face removal rejected by manifold guard");
                return Err(RemovalError::NonManifold { face_id, vertex_id });
            }
        }

        struct Corner {
            dart: DartKey,
            sym: Option<DartKey>,
            edge: EdgeKey,
            pair: VertexPair,
            target: VertexKey,
            boundary: bool,
            valence: usize,
        }
        let mut corners: SmallBuffer<Corner, FACE_BUFFER_SIZE> = SmallBuffer::new();
        for i in 0..n {
            let dart = darts[i];
            let source = darts[(i + n - 1) % n];
            let (Some(edge), Some(target), Some(from)) = (
                self.dart_edge(dart),
                self.dart_target(dart),
                self.dart_target(source),
            ) else {
                continue;
            };
            corners.push(Corner {
                dart,
                sym: self.dart_sym(dart),
                edge,
                pair: VertexPair::new(from, target),
                target,
                boundary: self.is_boundary_vertex(target),
                valence: self.vertex_faces(target).len(),
            });
        }

        for corner in &corners {
            match corner.sym {
                Some(sym) => {
                    if let Some(e) = self.edges.get_mut(corner.edge)
                        && e.dart() == Some(corner.dart)
                    {
                        e.set_dart(Some(sym));
                    }
                }
                None => {
                    self.edges.remove(corner.edge);
                    self.edge_index.remove(&corner.pair);
                }
            }
        }

        for corner in &corners {
            let v = corner.target;
            let current = self.vertex_dart(v);
            let replacement = if current.is_some_and(|d| darts.contains(&d)) {
                Some(self.dart_next(corner.dart).and_then(|o| self.dart_sym(o)))
            } else if corner.boundary {
                None
            } else {
                Some(self.dart_next(corner.dart).and_then(|o| self.dart_sym(o)))
            };
            if let Some(dart) = replacement
                && let Some(vertex) = self.vertices.get_mut(v)
            {
                vertex.set_dart(dart);
            }
            if corner.valence <= 1
                && let Some(vertex) = self.vertices.remove(v)
            {
                self.vertex_ids.remove(&vertex.id());
            }
        }

        self.faces.remove(face);
        self.face_ids.remove(&face_id);
        for corner in &corners {
            if let Some(sym) = corner.sym {
                self.set_beta(sym, 2, None);
            }
            self.darts.remove(corner.dart);
        }
        tracing::debug!(face_id, "removed face");
        Ok(())
    }

    // =========================================================================
    // BATCH REMOVAL
    // =========================================================================

    /// Removes a set of faces as one operation.
    ///
    /// Faces are visited breadth-first from the first one, across shared
    /// edges within the batch. A face rejected by the manifold guard is
    /// moved to the back of the queue; once a whole pass makes no progress,
    /// every face removed so far is restored and the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::UnknownFace`] if a key does not resolve and
    /// [`RemovalError::Stalled`] if no valid order exists. The mesh is
    /// unchanged on error, up to the keys of restored cells.
    pub fn remove_faces(&mut self, faces: &[FaceKey]) -> Result<(), RemovalError> {
        self.detach_faces(faces).map(|_| ())
    }

    // Batch removal that hands back what it removed, so a caller whose
    // follow-up step fails can put the faces back.
    pub(crate) fn detach_faces(
        &mut self,
        faces: &[FaceKey],
    ) -> Result<DetachedFaces<M>, RemovalError> {
        if faces.iter().any(|&f| !self.faces.contains_key(f)) {
            return Err(RemovalError::UnknownFace);
        }
        let mut queue = self.breadth_first_order(faces);
        let mut removed: Vec<FaceSnapshot<M>> = Vec::with_capacity(queue.len());
        let mut failures = 0;

        while let Some(face) = queue.pop_front() {
            let snapshot = self.snapshot_face(face);
            match self.remove_face(face) {
                Ok(()) => {
                    removed.push(snapshot);
                    failures = 0;
                }
                Err(RemovalError::NonManifold { .. }) => {
                    queue.push_back(face);
                    failures += 1;
                    if failures >= queue.len() {
                        let remaining = queue.len();
                        tracing::warn!(remaining, "batch removal stalled; rolling back");
                        self.restore_faces(removed)?;
                        return Err(RemovalError::Stalled { remaining });
                    }
                    tracing::debug!(pending = queue.len(), "deferred face removal");
                }
                Err(err) => {
                    self.restore_faces(removed)?;
                    return Err(err);
                }
            }
        }
        Ok(DetachedFaces(removed))
    }

    pub(crate) fn reattach_faces(&mut self, detached: DetachedFaces<M>) -> Result<(), RemovalError> {
        self.restore_faces(detached.0)
    }

    /// Removes an edge together with its one or two incident faces.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::UnknownEdge`] if `edge` does not resolve, or
    /// any error of [`remove_faces`](Self::remove_faces).
    pub fn remove_edge(&mut self, edge: EdgeKey) -> Result<(), RemovalError> {
        if !self.edges.contains_key(edge) {
            return Err(RemovalError::UnknownEdge);
        }
        let faces: SmallBuffer<FaceKey, 2> = [self.edge_face(edge, 0), self.edge_face(edge, 1)]
            .into_iter()
            .flatten()
            .collect();
        let pair = self
            .edge_vertex(edge, 0)
            .zip(self.edge_vertex(edge, 1))
            .map(|(a, b)| VertexPair::new(a, b));
        self.remove_faces(&faces)?;
        if self.edges.remove(edge).is_some()
            && let Some(pair) = pair
        {
            self.edge_index.remove(&pair);
        }
        Ok(())
    }

    /// Removes a vertex together with every face around it.
    ///
    /// # Errors
    ///
    /// Returns [`RemovalError::UnknownVertex`] if `vertex` does not resolve,
    /// or any error of [`remove_faces`](Self::remove_faces).
    pub fn remove_vertex(&mut self, vertex: VertexKey) -> Result<(), RemovalError> {
        if !self.vertices.contains_key(vertex) {
            return Err(RemovalError::UnknownVertex);
        }
        let faces: Vec<FaceKey> = self.vertex_faces(vertex).collect();
        self.remove_faces(&faces)?;
        if let Some(v) = self.vertices.remove(vertex) {
            self.vertex_ids.remove(&v.id());
        }
        Ok(())
    }

    // Breadth-first order over the batch, restarting at the next unvisited
    // face when a component is exhausted.
    fn breadth_first_order(&self, faces: &[FaceKey]) -> VecDeque<FaceKey> {
        let batch: FaceKeySet = faces.iter().copied().collect();
        let mut visited = FaceKeySet::default();
        let mut order = VecDeque::with_capacity(batch.len());
        for &seed in faces {
            if !visited.insert(seed) {
                continue;
            }
            let mut frontier = VecDeque::from([seed]);
            while let Some(face) = frontier.pop_front() {
                order.push_back(face);
                for d in self.face_cycle(face) {
                    if let Some(neighbor) = self.dart_sym(d).and_then(|s| self.dart_face(s))
                        && batch.contains(&neighbor)
                        && visited.insert(neighbor)
                    {
                        frontier.push_back(neighbor);
                    }
                }
            }
        }
        order
    }

    fn snapshot_face(&self, face: FaceKey) -> FaceSnapshot<M> {
        let corners = self
            .face_cycle(face)
            .into_iter()
            .filter_map(|d| {
                let dart = self.darts.get(d)?;
                Some(CornerSnapshot {
                    vertex: self.vertices.get(dart.vertex())?.clone(),
                    edge: self.edges.get(dart.edge())?.clone(),
                    dart: dart.clone(),
                })
            })
            .collect();
        FaceSnapshot {
            face: self.faces.get(face).cloned().unwrap_or_default(),
            corners,
        }
    }

    // Re-inserts snapshots newest first, so each face finds the neighbours
    // it was removed from.
    fn restore_faces(&mut self, snapshots: Vec<FaceSnapshot<M>>) -> Result<(), RemovalError> {
        for snapshot in snapshots.into_iter().rev() {
            let n = snapshot.corners.len();
            let mut targets: SmallBuffer<VertexKey, FACE_BUFFER_SIZE> = SmallBuffer::new();
            for corner in &snapshot.corners {
                let key = match self.id_vertex(corner.vertex.id()) {
                    Some(key) => key,
                    None => {
                        let key =
                            self.create_vertex(corner.vertex.id(), *corner.vertex.point())?;
                        if let Some(v) = self.vertices.get_mut(key) {
                            v.set_string(corner.vertex.string());
                            *v.attributes_mut() = corner.vertex.attributes().clone();
                        }
                        key
                    }
                };
                targets.push(key);
            }

            // Rotate so the restored representative ends at the first corner.
            let ids: Vec<usize> = (0..n)
                .map(|i| snapshot.corners[(i + n - 1) % n].vertex.id())
                .collect();
            let face = self.insert_face(&ids, snapshot.face.id())?;
            if let Some(f) = self.faces.get_mut(face) {
                f.set_string(snapshot.face.string());
                *f.attributes_mut() = snapshot.face.attributes().clone();
            }

            for (corner, &target) in snapshot.corners.iter().zip(&targets) {
                let Some(dart) = self.corner(target, face) else {
                    continue;
                };
                if let Some(d) = self.darts.get_mut(dart) {
                    d.set_string(corner.dart.string());
                    *d.attributes_mut() = corner.dart.attributes().clone();
                }
                if let Some(e) = self.dart_edge(dart).and_then(|e| self.edges.get_mut(e)) {
                    e.set_string(corner.edge.string());
                    *e.attributes_mut() = corner.edge.attributes().clone();
                }
            }
            tracing::debug!(face_id = snapshot.face.id(), "restored face");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The first `n` triangles of a hexagonal fan around vertex 7.
    fn fan(n: usize) -> SurfaceMesh {
        let rim = (n + 1).min(6);
        let mut vertices = Vec::new();
        for i in 0..rim {
            let angle = i as f64 * std::f64::consts::FRAC_PI_3;
            vertices.push((i + 1, Point::new([angle.cos(), angle.sin(), 0.0])));
        }
        vertices.push((7, Point::new([0.0, 0.0, 0.0])));
        let faces: Vec<(usize, Vec<usize>)> = (0..n)
            .map(|i| (i + 1, vec![7, i + 1, (i + 1) % 6 + 1]))
            .collect();
        SurfaceMesh::from_faces(&vertices, &faces).unwrap()
    }

    fn face(mesh: &SurfaceMesh, id: usize) -> FaceKey {
        mesh.id_face(id).unwrap()
    }

    fn counts(mesh: &SurfaceMesh) -> [usize; 4] {
        [
            mesh.number_of_vertices(),
            mesh.number_of_edges(),
            mesh.number_of_faces(),
            mesh.number_of_darts(),
        ]
    }

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

    // =========================================================================
    // SINGLE-FACE REMOVAL
    // =========================================================================

    #[test]
    fn removing_the_only_face_empties_the_mesh() {
        let mut mesh = triangle();
        let f = face(&mesh, 1);
        mesh.remove_face(f).unwrap();
        assert_eq!(counts(&mesh), [0, 0, 0, 0]);
        assert!(mesh.id_vertex(1).is_none());
        assert_eq!(mesh.remove_face(f), Err(RemovalError::UnknownFace));
    }

    #[test]
    fn interior_vertex_moves_to_boundary() {
        let mut mesh = fan(6);
        let center = mesh.id_vertex(7).unwrap();
        assert!(!mesh.is_boundary_vertex(center));

        mesh.remove_face(face(&mesh, 1)).unwrap();
        assert_eq!(counts(&mesh), [7, 11, 5, 15]);
        assert!(mesh.is_boundary_vertex(center));
        assert_eq!(mesh.vertex_faces(center).len(), 5);
        assert_eq!(mesh.vertex_edges(center).len(), 6);

        for (v, _) in mesh.vertices() {
            let d = mesh.vertex_dart(v).unwrap();
            assert_eq!(mesh.dart_target(d), Some(v));
            assert!(mesh.is_boundary_dart(d));
        }
    }

    #[test]
    fn pinching_removal_is_rejected_without_mutation() {
        let mut mesh = fan(6);
        mesh.remove_face(face(&mesh, 1)).unwrap();
        let before = counts(&mesh);

        let f3 = face(&mesh, 3);
        assert_eq!(
            mesh.remove_face(f3),
            Err(RemovalError::NonManifold {
                face_id: 3,
                vertex_id: 7
            })
        );
        assert_eq!(counts(&mesh), before);
        assert!(mesh.face(f3).is_some());
    }

    #[test]
    fn orphaned_vertices_are_released() {
        let mut mesh = fan(2);
        // Vertex 1 only touches face 1.
        mesh.remove_face(face(&mesh, 1)).unwrap();
        assert!(mesh.id_vertex(1).is_none());
        assert_eq!(counts(&mesh), [3, 3, 1, 3]);
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    #[test]
    fn insert_face_refreshes_boundary_representatives() {
        let mut mesh = fan(5);
        let center = mesh.id_vertex(7).unwrap();
        assert!(mesh.is_boundary_vertex(center));

        mesh.insert_face(&[7, 6, 1], 6).unwrap();
        assert!(!mesh.is_boundary_vertex(center));
        for id in 1..=6 {
            let v = mesh.id_vertex(id).unwrap();
            assert!(mesh.is_boundary_vertex(v), "rim vertex {id}");
        }
        assert_eq!(mesh.vertex_faces(center).len(), 6);
    }

    // =========================================================================
    // BATCH REMOVAL
    // =========================================================================

    #[test]
    fn batch_defers_rejected_faces() {
        let mut mesh = fan(4);
        let batch = [face(&mesh, 3), face(&mesh, 2), face(&mesh, 1)];
        mesh.remove_faces(&batch).unwrap();
        assert_eq!(mesh.number_of_faces(), 1);
        assert!(mesh.id_face(4).is_some());
        assert_eq!(mesh.number_of_vertices(), 3);
    }

    #[test]
    fn stalled_batch_changes_nothing() {
        let mut mesh = fan(4);
        let before = counts(&mesh);
        let batch = [face(&mesh, 2), face(&mesh, 3)];
        assert_eq!(
            mesh.remove_faces(&batch),
            Err(RemovalError::Stalled { remaining: 2 })
        );
        assert_eq!(counts(&mesh), before);
    }

    #[test]
    fn stalled_batch_restores_removed_faces() {
        let mut mesh = fan(6);
        let f1 = face(&mesh, 1);
        mesh.face_mut(f1).unwrap().set_string("label=(1)");
        let two = mesh.id_vertex(2).unwrap();
        let corner = mesh.corner(two, f1).unwrap();
        mesh.dart_mut(corner).unwrap().set_string("uv=(0.5 0.5)");
        let ids_before = mesh.face_vertex_ids(f1);
        let before = counts(&mesh);

        let batch = [f1, face(&mesh, 3)];
        assert_eq!(
            mesh.remove_faces(&batch),
            Err(RemovalError::Stalled { remaining: 1 })
        );
        assert_eq!(counts(&mesh), before);

        let restored = face(&mesh, 1);
        assert_eq!(mesh.face_vertex_ids(restored), ids_before);
        assert_eq!(mesh.face(restored).unwrap().string(), "label=(1)");
        let corner = mesh.corner(two, restored).unwrap();
        assert_eq!(mesh.dart(corner).unwrap().string(), "uv=(0.5 0.5)");

        let center = mesh.id_vertex(7).unwrap();
        assert!(!mesh.is_boundary_vertex(center));
        assert!(mesh.is_boundary_vertex(two));
        assert!(mesh.is_boundary_dart(mesh.vertex_dart(two).unwrap()));
    }

    #[test]
    fn remove_edge_takes_both_faces() {
        let mut mesh = fan(6);
        let a = mesh.id_vertex(7).unwrap();
        let b = mesh.id_vertex(2).unwrap();
        let spoke = mesh.vertex_edge(a, b).unwrap();
        mesh.remove_edge(spoke).unwrap();
        assert_eq!(mesh.number_of_faces(), 4);
        assert!(mesh.edge(spoke).is_none());
        assert!(mesh.id_vertex(2).is_none());
    }

    #[test]
    fn remove_boundary_edge_takes_one_face() {
        let mut mesh = fan(6);
        let a = mesh.id_vertex(1).unwrap();
        let b = mesh.id_vertex(2).unwrap();
        let rim = mesh.vertex_edge(a, b).unwrap();
        assert!(mesh.is_boundary_edge(rim));
        mesh.remove_edge(rim).unwrap();
        assert_eq!(mesh.number_of_faces(), 5);
        assert_eq!(mesh.remove_edge(rim), Err(RemovalError::UnknownEdge));
    }

    #[test]
    fn remove_vertex_takes_its_star() {
        let mut mesh = fan(6);
        let center = mesh.id_vertex(7).unwrap();
        mesh.remove_vertex(center).unwrap();
        assert_eq!(counts(&mesh), [0, 0, 0, 0]);

        let mut lonely = triangle();
        let v = lonely.insert_vertex(9, Point::default()).unwrap();
        lonely.remove_vertex(v).unwrap();
        assert!(lonely.id_vertex(9).is_none());
        assert_eq!(lonely.number_of_faces(), 1);
    }
}
