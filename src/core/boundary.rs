//! Boundary extraction for surface and tetrahedral meshes.
//!
//! On a surface mesh the boundary is a set of closed loops of boundary
//! darts. [`SurfaceBoundary`] traces every loop with
//! [`vertex_most_clw_out_dart`](SurfaceMesh::vertex_most_clw_out_dart) and
//! orders the loops by decreasing length, so the first loop is the outer
//! boundary of a planar domain. A loop can be cut into segments between
//! marker vertices.
//!
//! On a tetrahedral mesh the boundary is the set of triangles bounding a
//! single tet. [`TetBoundary`] collects them and can rebuild them as a
//! standalone [`SurfaceMesh`].

use crate::core::cell::{EdgeKey, FaceKey, VertexKey};
use crate::core::collections::DartKeySet;
use crate::core::dart::DartKey;
use crate::core::surface_mesh::{MeshConstructionError, SurfaceAttributes, SurfaceMesh};
use crate::core::tet_mesh::TetMesh;
use crate::core::traits::attribute_codec::{AttributeCodec, MeshTraits};
use crate::core::traits::boundary_analysis::BoundaryAnalysis;
use crate::geometry::point::Point;
use std::collections::{BTreeMap, VecDeque};
use std::io::{BufRead, Write};
use thiserror::Error;

/// Errors raised while tracing or dividing boundaries.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// No dart of the loop starts at the first marker.
    #[error("Marker vertex {vertex_id} is not on the loop")]
    MarkerNotFound {
        /// Id of the missing marker.
        vertex_id: usize,
    },
    /// The loop ran out before reaching the next marker.
    #[error("Segment {segment} does not reach the next marker")]
    SegmentUnterminated {
        /// Index of the unfinished segment.
        segment: usize,
    },
    /// `divide` was called without markers.
    #[error("At least one marker is required to divide a loop")]
    EmptyMarkers,
    /// Tracing a loop did not return to its start.
    #[error("Boundary loop starting at vertex {vertex_id} does not close")]
    UnclosedLoop {
        /// Target id of the starting dart.
        vertex_id: usize,
    },
    /// A loop file names an edge that is not on the boundary.
    #[error("Line {line}: no boundary edge from {v0} to {v1}")]
    UnknownEdge {
        /// 1-based line number.
        line: usize,
        /// Source id.
        v0: usize,
        /// Target id.
        v1: usize,
    },
    /// A loop file line is malformed.
    #[error("Line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// Reading or writing a loop failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Building the extracted surface failed.
    #[error("Surface extraction failed: {0}")]
    Construction(#[from] MeshConstructionError),
}

// =============================================================================
// LOOPS AND SEGMENTS
// =============================================================================

/// Consecutive boundary darts between two markers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopSegment {
    darts: Vec<DartKey>,
}

impl LoopSegment {
    /// Darts of the segment, in loop order.
    #[must_use]
    pub fn darts(&self) -> &[DartKey] {
        &self.darts
    }

    /// Source of the first dart.
    #[must_use]
    pub fn start<M: MeshTraits>(&self, mesh: &SurfaceMesh<M>) -> Option<VertexKey> {
        self.darts.first().and_then(|&d| mesh.dart_source(d))
    }

    /// Target of the last dart.
    #[must_use]
    pub fn end<M: MeshTraits>(&self, mesh: &SurfaceMesh<M>) -> Option<VertexKey> {
        self.darts.last().and_then(|&d| mesh.dart_target(d))
    }
}

/// A closed loop of boundary darts with its total edge length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundaryLoop {
    darts: Vec<DartKey>,
    length: f64,
    segments: Vec<LoopSegment>,
}

impl BoundaryLoop {
    /// Traces the loop through `start`, a boundary dart.
    ///
    /// The first dart of the loop is the successor of `start`; `start`
    /// itself comes last.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::UnclosedLoop`] if the walk does not come
    /// back to `start`.
    pub fn trace<M: MeshTraits>(
        mesh: &SurfaceMesh<M>,
        start: DartKey,
    ) -> Result<Self, BoundaryError> {
        let unclosed = || BoundaryError::UnclosedLoop {
            vertex_id: mesh
                .dart_target(start)
                .and_then(|v| mesh.vertex_id(v))
                .unwrap_or_default(),
        };
        let mut darts = Vec::new();
        let mut length = 0.0;
        let mut d = start;
        for _ in 0..mesh.number_of_darts() {
            d = mesh
                .dart_target(d)
                .and_then(|v| mesh.vertex_most_clw_out_dart(v))
                .ok_or_else(unclosed)?;
            darts.push(d);
            length += mesh
                .dart_edge(d)
                .and_then(|e| mesh.edge_length(e))
                .unwrap_or_default();
            if d == start {
                return Ok(Self {
                    darts,
                    length,
                    segments: Vec::new(),
                });
            }
        }
        Err(unclosed())
    }

    /// Darts of the loop, in traversal order.
    #[must_use]
    pub fn darts(&self) -> &[DartKey] {
        &self.darts
    }

    /// Sum of the edge lengths along the loop.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Number of darts in the loop.
    #[must_use]
    pub fn len(&self) -> usize {
        self.darts.len()
    }

    /// Returns `true` if the loop has no darts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.darts.is_empty()
    }

    /// Segments computed by the last successful [`divide`](Self::divide).
    #[must_use]
    pub fn segments(&self) -> &[LoopSegment] {
        &self.segments
    }

    /// Cuts the loop into one segment per marker.
    ///
    /// Segment `i` starts at `markers[i]` and ends at the next marker
    /// (wrapping around). Markers must appear on the loop in this order.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::EmptyMarkers`] for an empty marker list,
    /// [`BoundaryError::MarkerNotFound`] if no dart starts at `markers[0]`,
    /// and [`BoundaryError::SegmentUnterminated`] if the loop is exhausted
    /// before a marker is reached. Existing segments are kept on error.
    pub fn divide<M: MeshTraits>(
        &mut self,
        mesh: &SurfaceMesh<M>,
        markers: &[VertexKey],
    ) -> Result<&[LoopSegment], BoundaryError> {
        let Some(&first) = markers.first() else {
            return Err(BoundaryError::EmptyMarkers);
        };
        let mut queue: VecDeque<DartKey> = self.darts.iter().copied().collect();

        let mut rotations = 0;
        while queue.front().and_then(|&d| mesh.dart_source(d)) != Some(first) {
            queue.rotate_left(1.min(queue.len()));
            rotations += 1;
            if rotations > queue.len() {
                let vertex_id = mesh.vertex_id(first).unwrap_or_default();
                tracing::warn!(vertex_id, "loop division could not find the first marker");
                return Err(BoundaryError::MarkerNotFound { vertex_id });
            }
        }

        let mut segments = Vec::with_capacity(markers.len());
        for i in 0..markers.len() {
            let stop = markers[(i + 1) % markers.len()];
            let mut darts = Vec::new();
            loop {
                let Some(d) = queue.pop_front() else {
                    tracing::warn!(segment = i, "loop exhausted before next marker");
                    return Err(BoundaryError::SegmentUnterminated { segment: i });
                };
                darts.push(d);
                if mesh.dart_target(d) == Some(stop) {
                    break;
                }
            }
            segments.push(LoopSegment { darts });
        }
        self.segments = segments;
        Ok(&self.segments)
    }

    /// Writes the loop as one `source target` id pair per line.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Io`] if writing fails.
    pub fn write<M: MeshTraits, W: Write>(
        &self,
        mesh: &SurfaceMesh<M>,
        mut writer: W,
    ) -> Result<(), BoundaryError> {
        for &d in &self.darts {
            let id = |v: Option<VertexKey>| v.and_then(|v| mesh.vertex_id(v)).unwrap_or_default();
            writeln!(writer, "{} {}", id(mesh.dart_source(d)), id(mesh.dart_target(d)))?;
        }
        Ok(())
    }

    /// Reads a loop written by [`write`](Self::write).
    ///
    /// Blank lines are skipped. Each pair must name a boundary edge.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Parse`], [`BoundaryError::UnknownEdge`], or
    /// [`BoundaryError::Io`].
    pub fn read<M: MeshTraits, R: BufRead>(
        mesh: &SurfaceMesh<M>,
        reader: R,
    ) -> Result<Self, BoundaryError> {
        let mut darts = Vec::new();
        let mut length = 0.0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            let ids: Vec<usize> = line
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|e| BoundaryError::Parse {
                    line: number,
                    message: format!("{e}"),
                })?;
            match ids.as_slice() {
                [] => continue,
                &[v0, v1] => {
                    let edge = mesh
                        .id_vertex(v0)
                        .zip(mesh.id_vertex(v1))
                        .and_then(|(a, b)| mesh.vertex_edge(a, b))
                        .filter(|&e| mesh.is_boundary_edge(e));
                    let Some((edge, dart)) =
                        edge.and_then(|e| mesh.edge_dart(e, 0).map(|d| (e, d)))
                    else {
                        return Err(BoundaryError::UnknownEdge {
                            line: number,
                            v0,
                            v1,
                        });
                    };
                    darts.push(dart);
                    length += mesh.edge_length(edge).unwrap_or_default();
                }
                _ => {
                    return Err(BoundaryError::Parse {
                        line: number,
                        message: format!("expected 2 vertex ids, found {}", ids.len()),
                    });
                }
            }
        }
        Ok(Self {
            darts,
            length,
            segments: Vec::new(),
        })
    }
}

// =============================================================================
// SURFACE BOUNDARY
// =============================================================================

/// All boundary loops of a surface mesh, longest first.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::boundary::SurfaceBoundary;
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
/// let boundary = SurfaceBoundary::new(&mesh).unwrap();
/// assert_eq!(boundary.loops().len(), 1);
/// assert!((boundary.loops()[0].length() - 4.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceBoundary {
    loops: Vec<BoundaryLoop>,
}

impl SurfaceBoundary {
    /// Traces every boundary loop of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::UnclosedLoop`] if the boundary
    /// representatives are inconsistent.
    pub fn new<M: MeshTraits>(mesh: &SurfaceMesh<M>) -> Result<Self, BoundaryError> {
        let pending: Vec<DartKey> = mesh
            .edges()
            .filter(|(e, _)| mesh.is_boundary_edge(*e))
            .filter_map(|(e, _)| mesh.edge_dart(e, 0))
            .collect();
        let mut consumed = DartKeySet::default();
        let mut loops = Vec::new();
        for &start in &pending {
            if consumed.contains(&start) {
                continue;
            }
            let traced = BoundaryLoop::trace(mesh, start)?;
            consumed.extend(traced.darts.iter().copied());
            loops.push(traced);
        }
        loops.sort_by(|a, b| b.length.total_cmp(&a.length));
        tracing::debug!(loops = loops.len(), "traced boundary loops");
        Ok(Self { loops })
    }

    /// Loops ordered by decreasing length.
    #[must_use]
    pub fn loops(&self) -> &[BoundaryLoop] {
        &self.loops
    }

    /// Mutable access, for [`BoundaryLoop::divide`].
    pub fn loops_mut(&mut self) -> &mut [BoundaryLoop] {
        &mut self.loops
    }

    /// Takes ownership of the loops.
    #[must_use]
    pub fn into_loops(self) -> Vec<BoundaryLoop> {
        self.loops
    }
}

// =============================================================================
// TET BOUNDARY
// =============================================================================

/// Boundary triangles of a tetrahedral mesh.
#[derive(Clone, Debug)]
pub struct TetBoundary<'a, M: MeshTraits> {
    mesh: &'a TetMesh<M>,
    faces: Vec<FaceKey>,
}

impl<'a, M: MeshTraits> TetBoundary<'a, M> {
    /// Collects the triangles of `mesh` that bound a single tet.
    #[must_use]
    pub fn new(mesh: &'a TetMesh<M>) -> Self {
        Self {
            mesh,
            faces: mesh.boundary_cells(),
        }
    }

    /// The boundary triangles, in storage order.
    #[must_use]
    pub fn faces(&self) -> &[FaceKey] {
        &self.faces
    }

    /// Builds a standalone surface mesh from the boundary triangles.
    ///
    /// Vertices keep their tet-mesh ids and attribute strings (re-encoded
    /// from the tet mesh and decoded with the surface codecs). Faces keep
    /// the winding of the boundary darts and are numbered from 1.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::Construction`] if the boundary is not a
    /// 2-manifold or an attribute string fails to decode.
    pub fn extract_surface<S: MeshTraits>(&self) -> Result<SurfaceMesh<S>, BoundaryError> {
        let mesh = self.mesh;
        let mut vertices: BTreeMap<usize, VertexKey> = BTreeMap::new();
        let mut faces = Vec::with_capacity(self.faces.len());
        for (index, &f) in self.faces.iter().enumerate() {
            let mut ids = Vec::with_capacity(3);
            for v in mesh.face_vertices(f) {
                if let Some(id) = mesh.vertex_id(v) {
                    vertices.insert(id, v);
                    ids.push(id);
                }
            }
            faces.push((index + 1, ids));
        }

        let points: Vec<(usize, Point<f64, 3>)> = vertices
            .iter()
            .filter_map(|(&id, &v)| mesh.point(v).map(|p| (id, *p)))
            .collect();
        let mut surface = SurfaceMesh::from_faces(&points, &faces)?;

        let records = vertices
            .iter()
            .filter_map(|(&id, &v)| {
                let vertex = mesh.vertex(v)?;
                Some((id, vertex.attributes().encode(vertex.string())))
            })
            .filter(|(_, payload)| !payload.is_empty())
            .collect();
        surface.load_attributes(&SurfaceAttributes {
            vertices: records,
            ..SurfaceAttributes::default()
        })?;
        Ok(surface)
    }
}

// =============================================================================
// BOUNDARY ANALYSIS
// =============================================================================

impl<M: MeshTraits> BoundaryAnalysis for SurfaceMesh<M> {
    type BoundaryCell = EdgeKey;

    fn boundary_cells(&self) -> Vec<EdgeKey> {
        self.edges()
            .map(|(e, _)| e)
            .filter(|&e| self.is_boundary_edge(e))
            .collect()
    }

    fn is_boundary_cell(&self, cell: EdgeKey) -> bool {
        self.is_boundary_edge(cell)
    }
}

impl<M: MeshTraits> BoundaryAnalysis for TetMesh<M> {
    type BoundaryCell = FaceKey;

    fn boundary_cells(&self) -> Vec<FaceKey> {
        self.faces()
            .map(|(f, _)| f)
            .filter(|&f| self.is_boundary_face(f))
            .collect()
    }

    fn is_boundary_cell(&self, cell: FaceKey) -> bool {
        self.is_boundary_face(cell)
    }
}
