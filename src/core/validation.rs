//! Structural invariant checks for surface and tetrahedral meshes.
//!
//! Each check returns the first violation it finds for its invariant.
//! [`SurfaceMesh::validation_report`] and [`TetMesh::validation_report`]
//! run all of them and collect one violation per failed invariant;
//! `is_valid` returns only the first.
//!
//! ```rust
//! use dartmesh::core::surface_mesh::SurfaceMesh;
//! use dartmesh::core::validation::ValidationOptions;
//! use dartmesh::geometry::point::Point;
//!
//! let vertices = [
//!     (1, Point::new([0.0, 0.0, 0.0])),
//!     (2, Point::new([1.0, 0.0, 0.0])),
//!     (3, Point::new([0.0, 1.0, 0.0])),
//! ];
//! let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &[(1, vec![1, 2, 3])]).unwrap();
//! assert!(mesh.is_valid().is_ok());
//! assert!(mesh.validation_report(ValidationOptions::default()).is_ok());
//! ```

use crate::core::cell::{Edge, Face, Vertex, Volume};
use crate::core::surface_mesh::SurfaceMesh;
use crate::core::tet_mesh::TetMesh;
use crate::core::traits::attribute_codec::MeshTraits;
use crate::core::vertex_tuple::{VertexPair, VertexTriple};
use thiserror::Error;

// =============================================================================
// ERROR AND REPORT TYPES
// =============================================================================

/// A violated structural invariant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshValidationError {
    /// A dart refers to a released cell or dart.
    #[error("Dangling reference: {message}")]
    DanglingReference {
        /// Description of the reference.
        message: String,
    },
    /// `β_i` is not an involution, or pairs darts of different edges.
    #[error("β{beta} is not an involution: {message}")]
    BrokenInvolution {
        /// Which beta failed.
        beta: usize,
        /// Description of the failure.
        message: String,
    },
    /// A face cycle does not close or has the wrong length.
    #[error("Face {face:?} has a broken dart cycle: {message}")]
    BrokenFaceCycle {
        /// Debug rendering of the face key.
        face: String,
        /// Description of the failure.
        message: String,
    },
    /// A cell's representative dart does not belong to the cell.
    #[error("Invalid representative: {message}")]
    InvalidRepresentative {
        /// Description of the failure.
        message: String,
    },
    /// A boundary cell is represented by an interior dart.
    #[error("Boundary representative rule violated: {message}")]
    BoundaryRepresentative {
        /// Description of the failure.
        message: String,
    },
    /// An id map or deduplication index disagrees with the cells.
    #[error("Index '{index}' is inconsistent: {message}")]
    IndexInconsistency {
        /// Name of the index.
        index: &'static str,
        /// Description of the failure.
        message: String,
    },
}

/// Which invariant a [`InvariantViolation`] belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantKind {
    /// Every dart refers to live cells and darts.
    DartReferences,
    /// `β2` (and `β3` on tet meshes) are fixed-point-free involutions.
    Involution,
    /// `β1` closes every face into a cycle of the right length.
    FaceCycles,
    /// Every cell's representative dart points back to it.
    Representatives,
    /// Boundary cells are represented by boundary darts.
    BoundaryRepresentatives,
    /// Id maps and deduplication indices match the stored cells.
    Indices,
}

/// A single invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The kind of invariant that failed.
    pub kind: InvariantKind,
    /// The first failure found for it.
    pub error: MeshValidationError,
}

/// Every invariant violation found by a validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshValidationReport {
    /// Violations in check order.
    pub violations: Vec<InvariantViolation>,
}

impl MeshValidationReport {
    /// Returns `true` if no violations were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    fn record(&mut self, kind: InvariantKind, result: Result<(), MeshValidationError>) {
        if let Err(error) = result {
            self.violations.push(InvariantViolation { kind, error });
        }
    }

    fn finish(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Configuration for `validation_report`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Check that boundary cells are represented by boundary darts.
    /// Enabled by default.
    pub check_boundary_representatives: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_boundary_representatives: true,
        }
    }
}

impl ValidationOptions {
    /// Sets [`check_boundary_representatives`](Self::check_boundary_representatives).
    #[must_use]
    pub const fn with_boundary_representatives(mut self, enabled: bool) -> Self {
        self.check_boundary_representatives = enabled;
        self
    }
}

fn first_violation(report: MeshValidationReport) -> MeshValidationError {
    report.violations.into_iter().next().map_or_else(
        || MeshValidationError::DanglingReference {
            message: "empty validation report".to_string(),
        },
        |v| v.error,
    )
}

// =============================================================================
// SURFACE MESH
// =============================================================================

impl<M: MeshTraits> SurfaceMesh<M> {
    /// Runs every structural check and collects all violations.
    ///
    /// Later checks are skipped when dart references are broken, since they
    /// would only report follow-up failures.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshValidationReport`] listing one violation per failed
    /// invariant.
    pub fn validation_report(&self, options: ValidationOptions) -> Result<(), MeshValidationReport> {
        let mut report = MeshValidationReport::default();
        report.record(InvariantKind::DartReferences, self.validate_dart_references());
        if !report.is_empty() {
            return report.finish();
        }
        report.record(InvariantKind::Involution, self.validate_involution());
        report.record(InvariantKind::FaceCycles, self.validate_face_cycles());
        report.record(InvariantKind::Representatives, self.validate_representatives());
        if options.check_boundary_representatives {
            report.record(
                InvariantKind::BoundaryRepresentatives,
                self.validate_boundary_representatives(),
            );
        }
        report.record(InvariantKind::Indices, self.validate_indices());
        report.finish()
    }

    /// Returns the first structural violation, if any.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshValidationError`] reported by
    /// [`validation_report`](Self::validation_report) with default options.
    pub fn is_valid(&self) -> Result<(), MeshValidationError> {
        self.validation_report(ValidationOptions::default())
            .map_err(first_violation)
    }

    /// Every dart's cells and betas exist.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::DanglingReference`] on the first dead
    /// reference.
    pub fn validate_dart_references(&self) -> Result<(), MeshValidationError> {
        for (d, dart) in &self.darts {
            let cells_alive = self.vertices.contains_key(dart.vertex())
                && self.edges.contains_key(dart.edge())
                && self.faces.contains_key(dart.face());
            let betas_alive = (1..=2)
                .filter_map(|i| dart.beta(i))
                .all(|b| self.darts.contains_key(b));
            if !cells_alive || !betas_alive {
                return Err(MeshValidationError::DanglingReference {
                    message: format!("dart {d:?} refers to a released cell or dart"),
                });
            }
        }
        Ok(())
    }

    /// `β2` is a fixed-point-free involution pairing opposite darts of one
    /// edge.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BrokenInvolution`] on the first bad
    /// pair.
    pub fn validate_involution(&self) -> Result<(), MeshValidationError> {
        for (d, dart) in &self.darts {
            let Some(s) = dart.sym() else { continue };
            let broken = |message: String| MeshValidationError::BrokenInvolution { beta: 2, message };
            if s == d || self.dart_sym(s) != Some(d) {
                return Err(broken(format!("β2(β2({d:?})) != {d:?}")));
            }
            if self.dart_edge(s) != Some(dart.edge()) {
                return Err(broken(format!("{d:?} and {s:?} lie on different edges")));
            }
            if self.dart_source(s) != Some(dart.vertex()) {
                return Err(broken(format!("{d:?} and {s:?} are not opposite")));
            }
        }
        Ok(())
    }

    /// `β1` closes each face into a cycle of at least three darts that all
    /// belong to that face, and every dart is on some face cycle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BrokenFaceCycle`].
    pub fn validate_face_cycles(&self) -> Result<(), MeshValidationError> {
        let mut total = 0;
        for (f, face) in &self.faces {
            let broken = |message: &str| MeshValidationError::BrokenFaceCycle {
                face: format!("{f:?}"),
                message: message.to_string(),
            };
            let start = face.dart().ok_or_else(|| broken("no representative dart"))?;
            let mut d = start;
            let mut length = 0;
            loop {
                if self.dart_face(d) != Some(f) {
                    return Err(broken("cycle leaves the face"));
                }
                length += 1;
                if length > self.darts.len() {
                    return Err(broken("cycle does not close"));
                }
                d = self.dart_next(d).ok_or_else(|| broken("missing β1"))?;
                if d == start {
                    break;
                }
            }
            if length < 3 {
                return Err(broken("fewer than three darts"));
            }
            total += length;
        }
        if total != self.darts.len() {
            return Err(MeshValidationError::BrokenFaceCycle {
                face: "*".to_string(),
                message: format!("{} darts, {total} on face cycles", self.darts.len()),
            });
        }
        Ok(())
    }

    /// Each vertex, edge, and face is represented by one of its own darts.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::InvalidRepresentative`].
    pub fn validate_representatives(&self) -> Result<(), MeshValidationError> {
        let bad = |message: String| MeshValidationError::InvalidRepresentative { message };
        for (v, vertex) in &self.vertices {
            if vertex.dart().is_some_and(|d| self.dart_target(d) != Some(v)) {
                return Err(bad(format!("vertex {} is not the target of its dart", vertex.id())));
            }
        }
        for (e, edge) in &self.edges {
            if edge.dart().and_then(|d| self.dart_edge(d)) != Some(e) {
                return Err(bad(format!("edge {e:?} has a foreign dart")));
            }
        }
        for (f, face) in &self.faces {
            if face.dart().and_then(|d| self.dart_face(d)) != Some(f) {
                return Err(bad(format!("face {} has a foreign dart", face.id())));
            }
        }
        Ok(())
    }

    /// Boundary vertices and edges are represented by boundary darts.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BoundaryRepresentative`].
    pub fn validate_boundary_representatives(&self) -> Result<(), MeshValidationError> {
        for (_, dart) in self.darts.iter().filter(|(_, d)| d.is_boundary()) {
            let edge_ok = self
                .edges
                .get(dart.edge())
                .and_then(Edge::dart)
                .is_some_and(|d| self.is_boundary_dart(d));
            let vertex_ok = self
                .vertices
                .get(dart.vertex())
                .and_then(Vertex::dart)
                .is_some_and(|d| self.is_boundary_dart(d));
            if !edge_ok || !vertex_ok {
                let id = self.vertex_id(dart.vertex()).unwrap_or_default();
                return Err(MeshValidationError::BoundaryRepresentative {
                    message: format!("boundary cell at vertex {id} has an interior representative"),
                });
            }
        }
        Ok(())
    }

    /// The id maps and the edge index match the stored cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::IndexInconsistency`].
    pub fn validate_indices(&self) -> Result<(), MeshValidationError> {
        let bad = |index: &'static str, message: String| MeshValidationError::IndexInconsistency {
            index,
            message,
        };
        if self.vertex_ids.len() != self.vertices.len() {
            return Err(bad("vertex ids", "size differs from vertex count".to_string()));
        }
        for (&id, &v) in &self.vertex_ids {
            if self.vertices.get(v).map(Vertex::id) != Some(id) {
                return Err(bad("vertex ids", format!("id {id} maps to another vertex")));
            }
        }
        if self.face_ids.len() != self.faces.len() {
            return Err(bad("face ids", "size differs from face count".to_string()));
        }
        for (&id, &f) in &self.face_ids {
            if self.faces.get(f).map(Face::id) != Some(id) {
                return Err(bad("face ids", format!("id {id} maps to another face")));
            }
        }
        if self.edge_index.len() != self.edges.len() {
            return Err(bad("edges", "size differs from edge count".to_string()));
        }
        for (&pair, &e) in &self.edge_index {
            let endpoints = self
                .edge_vertex(e, 0)
                .zip(self.edge_vertex(e, 1))
                .map(|(a, b)| VertexPair::new(a, b));
            if endpoints != Some(pair) {
                return Err(bad("edges", format!("edge {e:?} has other endpoints")));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TET MESH
// =============================================================================

impl<M: MeshTraits> TetMesh<M> {
    /// Runs every structural check and collects all violations.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshValidationReport`] listing one violation per failed
    /// invariant.
    pub fn validation_report(&self, options: ValidationOptions) -> Result<(), MeshValidationReport> {
        let mut report = MeshValidationReport::default();
        report.record(InvariantKind::DartReferences, self.validate_dart_references());
        if !report.is_empty() {
            return report.finish();
        }
        report.record(InvariantKind::Involution, self.validate_involution());
        report.record(InvariantKind::FaceCycles, self.validate_face_cycles());
        report.record(InvariantKind::Representatives, self.validate_representatives());
        if options.check_boundary_representatives {
            report.record(
                InvariantKind::BoundaryRepresentatives,
                self.validate_boundary_representatives(),
            );
        }
        report.record(InvariantKind::Indices, self.validate_indices());
        report.finish()
    }

    /// Returns the first structural violation, if any.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshValidationError`] reported by
    /// [`validation_report`](Self::validation_report) with default options.
    pub fn is_valid(&self) -> Result<(), MeshValidationError> {
        self.validation_report(ValidationOptions::default())
            .map_err(first_violation)
    }

    /// Every dart's cells and betas exist.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::DanglingReference`].
    pub fn validate_dart_references(&self) -> Result<(), MeshValidationError> {
        for (d, dart) in &self.darts {
            let cells_alive = self.vertices.contains_key(dart.vertex())
                && self.edges.contains_key(dart.edge())
                && self.faces.contains_key(dart.face())
                && dart.volume().is_some_and(|vol| self.volumes.contains_key(vol));
            let betas_alive = (1..=3)
                .filter_map(|i| dart.beta(i))
                .all(|b| self.darts.contains_key(b));
            if !cells_alive || !betas_alive {
                return Err(MeshValidationError::DanglingReference {
                    message: format!("dart {d:?} refers to a released cell or dart"),
                });
            }
        }
        Ok(())
    }

    /// `β2` pairs darts of one tet, `β3` pairs darts of adjacent tets, and
    /// both are fixed-point-free involutions between opposite darts of one
    /// edge.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BrokenInvolution`].
    pub fn validate_involution(&self) -> Result<(), MeshValidationError> {
        for (d, dart) in &self.darts {
            for beta in 2..=3 {
                let broken = |message: String| MeshValidationError::BrokenInvolution { beta, message };
                let Some(s) = dart.beta(beta) else {
                    if beta == 2 {
                        return Err(broken(format!("{d:?} has no β2 partner")));
                    }
                    continue;
                };
                if s == d || self.beta(beta, s) != Some(d) {
                    return Err(broken(format!("β{beta}(β{beta}({d:?})) != {d:?}")));
                }
                if self.dart_edge(s) != Some(dart.edge()) {
                    return Err(broken(format!("{d:?} and {s:?} lie on different edges")));
                }
                if self.dart_source(s) != Some(dart.vertex()) {
                    return Err(broken(format!("{d:?} and {s:?} are not opposite")));
                }
                let same_volume = self.dart_volume(s) == dart.volume();
                if (beta == 2) != same_volume {
                    return Err(broken(format!("{d:?} and {s:?} pair the wrong tets")));
                }
                if beta == 3 && self.dart_face(s) != Some(dart.face()) {
                    return Err(broken(format!("{d:?} and {s:?} lie on different faces")));
                }
            }
        }
        Ok(())
    }

    /// Every triangle dart cycle has length three and every tet owns twelve
    /// darts.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BrokenFaceCycle`].
    pub fn validate_face_cycles(&self) -> Result<(), MeshValidationError> {
        for (d, dart) in &self.darts {
            let mut cursor = d;
            for _ in 0..3 {
                cursor = self.dart_next(cursor).unwrap_or(cursor);
            }
            let closes = cursor == d && self.dart_next(d) != Some(d);
            let same_face = self
                .dart_next(d)
                .is_some_and(|n| self.dart_face(n) == Some(dart.face()));
            if !closes || !same_face {
                return Err(MeshValidationError::BrokenFaceCycle {
                    face: format!("{:?}", dart.face()),
                    message: format!("dart {d:?} is not on a closed triangle"),
                });
            }
        }
        if self.darts.len() != 12 * self.volumes.len() {
            return Err(MeshValidationError::BrokenFaceCycle {
                face: "*".to_string(),
                message: format!(
                    "{} darts for {} tets",
                    self.darts.len(),
                    self.volumes.len()
                ),
            });
        }
        Ok(())
    }

    /// Each cell is represented by one of its own darts.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::InvalidRepresentative`].
    pub fn validate_representatives(&self) -> Result<(), MeshValidationError> {
        let bad = |message: String| MeshValidationError::InvalidRepresentative { message };
        for (v, vertex) in &self.vertices {
            if vertex.dart().is_some_and(|d| self.dart_target(d) != Some(v)) {
                return Err(bad(format!("vertex {} is not the target of its dart", vertex.id())));
            }
        }
        for (e, edge) in &self.edges {
            if edge.dart().and_then(|d| self.dart_edge(d)) != Some(e) {
                return Err(bad(format!("edge {e:?} has a foreign dart")));
            }
        }
        for (f, face) in &self.faces {
            if face.dart().and_then(|d| self.dart_face(d)) != Some(f) {
                return Err(bad(format!("face {f:?} has a foreign dart")));
            }
        }
        for (vol, volume) in &self.volumes {
            if volume.dart().and_then(|d| self.dart_volume(d)) != Some(vol) {
                return Err(bad(format!("volume {} has a foreign dart", volume.id())));
            }
        }
        Ok(())
    }

    /// Boundary triangles and edges are represented by boundary darts.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::BoundaryRepresentative`].
    pub fn validate_boundary_representatives(&self) -> Result<(), MeshValidationError> {
        for (_, dart) in self.darts.iter().filter(|(_, d)| d.is_boundary()) {
            let face_ok = self
                .faces
                .get(dart.face())
                .and_then(Face::dart)
                .is_some_and(|d| self.is_boundary_dart(d));
            let edge_ok = self
                .edges
                .get(dart.edge())
                .and_then(Edge::dart)
                .is_some_and(|d| self.is_boundary_dart(d));
            if !face_ok || !edge_ok {
                return Err(MeshValidationError::BoundaryRepresentative {
                    message: format!("face {:?} has an interior representative", dart.face()),
                });
            }
        }
        Ok(())
    }

    /// The id maps and the edge and face indices match the stored cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::IndexInconsistency`].
    pub fn validate_indices(&self) -> Result<(), MeshValidationError> {
        let bad = |index: &'static str, message: String| MeshValidationError::IndexInconsistency {
            index,
            message,
        };
        if self.vertex_ids.len() != self.vertices.len() || self.vertex_order.len() != self.vertices.len() {
            return Err(bad("vertex ids", "size differs from vertex count".to_string()));
        }
        for (&id, &v) in &self.vertex_ids {
            if self.vertices.get(v).map(Vertex::id) != Some(id) {
                return Err(bad("vertex ids", format!("id {id} maps to another vertex")));
            }
        }
        if self.volume_ids.len() != self.volumes.len() || self.volume_order.len() != self.volumes.len() {
            return Err(bad("volume ids", "size differs from volume count".to_string()));
        }
        for (&id, &vol) in &self.volume_ids {
            if self.volumes.get(vol).map(Volume::id) != Some(id) {
                return Err(bad("volume ids", format!("id {id} maps to another volume")));
            }
        }
        if self.edge_index.len() != self.edges.len() {
            return Err(bad("edges", "size differs from edge count".to_string()));
        }
        for (&pair, &e) in &self.edge_index {
            let endpoints = self
                .edge_vertex(e, 0)
                .zip(self.edge_vertex(e, 1))
                .map(|(a, b)| VertexPair::new(a, b));
            if endpoints != Some(pair) {
                return Err(bad("edges", format!("edge {e:?} has other endpoints")));
            }
        }
        if self.face_index.len() != self.faces.len() {
            return Err(bad("faces", "size differs from face count".to_string()));
        }
        for (&triple, &f) in &self.face_index {
            let corners = self.face_vertices(f);
            let key = match corners.as_slice() {
                &[a, b, c] => Some(VertexTriple::new(a, b, c)),
                _ => None,
            };
            if key != Some(triple) {
                return Err(bad("faces", format!("face {f:?} has other corners")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::attribute_codec::NoAttributes;
    use crate::core::traits::boundary_analysis::BoundaryAnalysis;
    use crate::geometry::point::Point;

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

    fn two_tets() -> TetMesh {
        let points = [
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
            Point::new([1.0, 1.0, 1.0]),
        ];
        TetMesh::from_tets(&points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap()
    }

    // =========================================================================
    // SURFACE MESH
    // =========================================================================

    #[test]
    fn valid_surface_passes_every_check() {
        let mesh = square();
        assert_eq!(mesh.is_valid(), Ok(()));
        assert_eq!(SurfaceMesh::<NoAttributes>::new().is_valid(), Ok(()));
    }

    #[test]
    fn broken_sym_is_reported() {
        let mut mesh = square();
        let d = mesh
            .darts()
            .find(|(_, d)| d.sym().is_some())
            .map(|(k, _)| k)
            .unwrap();
        mesh.set_beta(d, 2, None);

        let report = mesh
            .validation_report(ValidationOptions::default())
            .unwrap_err();
        assert!(
            report
                .violations
                .iter()
                .any(|v| v.kind == InvariantKind::Involution)
        );
        assert!(matches!(
            mesh.is_valid(),
            Err(MeshValidationError::BrokenInvolution { beta: 2, .. })
        ));
    }

    #[test]
    fn boundary_rule_can_be_skipped() {
        let mut mesh = square();
        let boundary_vertex = mesh.id_vertex(1).unwrap();
        let interior = mesh
            .vertex_in_darts(boundary_vertex)
            .find(|&d| !mesh.is_boundary_dart(d))
            .unwrap();
        mesh.vertex_mut(boundary_vertex)
            .unwrap()
            .set_dart(Some(interior));

        assert!(matches!(
            mesh.is_valid(),
            Err(MeshValidationError::BoundaryRepresentative { .. })
        ));
        let relaxed = ValidationOptions::default().with_boundary_representatives(false);
        assert!(mesh.validation_report(relaxed).is_ok());
        assert_eq!(mesh.number_of_boundary_cells(), 4);
    }

    // =========================================================================
    // TET MESH
    // =========================================================================

    #[test]
    fn valid_tet_mesh_passes_every_check() {
        let mesh = two_tets();
        assert_eq!(mesh.is_valid(), Ok(()));
    }

    #[test]
    fn missing_tet_sym_is_reported() {
        let mut mesh = two_tets();
        let d = mesh.darts().map(|(k, _)| k).next().unwrap();
        mesh.set_beta(d, 2, None);
        let report = mesh
            .validation_report(ValidationOptions::default())
            .unwrap_err();
        assert_eq!(report.violations[0].kind, InvariantKind::Involution);
    }
}
