//! Euler characteristic computation for combinatorial-map meshes.
//!
//! χ = Σ(-1)^k · `f_k`, where `f_k` counts the `k`-cells: vertices, edges,
//! faces and, on tetrahedral meshes, tets.
//!
//! # Examples
//!
//! ```rust
//! use dartmesh::core::surface_mesh::SurfaceMesh;
//! use dartmesh::geometry::point::Point;
//! use dartmesh::topology::characteristics::euler;
//!
//! let vertices = [
//!     (1, Point::new([0.0, 0.0, 0.0])),
//!     (2, Point::new([1.0, 0.0, 0.0])),
//!     (3, Point::new([0.0, 1.0, 0.0])),
//! ];
//! let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &[(1, vec![1, 2, 3])]).unwrap();
//!
//! let counts = euler::count_cells(&mesh);
//! assert_eq!(euler::euler_characteristic(&counts), 1);
//! ```

use crate::core::boundary::{BoundaryError, SurfaceBoundary};
use crate::core::surface_mesh::SurfaceMesh;
use crate::core::tet_mesh::TetMesh;
use crate::core::traits::attribute_codec::MeshTraits;
use crate::core::traits::boundary_analysis::BoundaryAnalysis;
use thiserror::Error;

/// Errors from topological queries.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Boundary loops could not be traced.
    #[error("Failed to trace boundary loops: {0}")]
    Boundary(#[from] BoundaryError),
}

/// Counts of `k`-cells for `0 ≤ k ≤ D`.
///
/// In the topology literature this is commonly called the **f-vector**.
///
/// # Examples
///
/// ```rust
/// use dartmesh::topology::characteristics::euler::FVector;
///
/// // Tetrahedron surface: 4 vertices, 6 edges, 4 faces
/// let counts = FVector {
///     by_dim: vec![4, 6, 4],
/// };
///
/// assert_eq!(counts.count(1), 6);
/// assert_eq!(counts.count(3), 0); // out of range
/// assert_eq!(counts.dimension(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FVector {
    /// `by_dim[k]` = `f_k` = number of `k`-cells
    pub by_dim: Vec<usize>,
}

impl FVector {
    /// Number of `k`-cells; 0 if `k` is out of range.
    #[must_use]
    #[inline]
    pub fn count(&self, k: usize) -> usize {
        self.by_dim.get(k).copied().unwrap_or(0)
    }

    /// Dimension of the complex.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.by_dim.len().saturating_sub(1)
    }
}

/// Meshes whose cells can be counted by dimension.
pub trait CellComplex: BoundaryAnalysis {
    /// Dimension of the top cells.
    const DIMENSION: usize;

    /// The f-vector of the mesh.
    fn f_vector(&self) -> FVector;

    /// Number of top-dimensional cells.
    fn number_of_top_cells(&self) -> usize {
        self.f_vector().count(Self::DIMENSION)
    }
}

impl<M: MeshTraits> CellComplex for SurfaceMesh<M> {
    const DIMENSION: usize = 2;

    fn f_vector(&self) -> FVector {
        FVector {
            by_dim: vec![
                self.number_of_vertices(),
                self.number_of_edges(),
                self.number_of_faces(),
            ],
        }
    }

    fn number_of_top_cells(&self) -> usize {
        self.number_of_faces()
    }
}

impl<M: MeshTraits> CellComplex for TetMesh<M> {
    const DIMENSION: usize = 3;

    fn f_vector(&self) -> FVector {
        FVector {
            by_dim: vec![
                self.number_of_vertices(),
                self.number_of_edges(),
                self.number_of_faces(),
                self.number_of_volumes(),
            ],
        }
    }

    fn number_of_top_cells(&self) -> usize {
        self.number_of_volumes()
    }
}

/// Topological classification of a mesh.
///
/// - `Empty`: no top cells (χ = 0)
/// - `SingleCell(D)`: one top cell (χ = 1)
/// - `Ball(D)`: D-ball with boundary (χ = 1)
/// - `ClosedSphere(D)`: closed D-sphere (χ = 1 + (-1)^D)
/// - `Unknown`: does not fit the categories above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyClassification {
    /// No top cells.
    Empty,

    /// Exactly one top cell of dimension D.
    SingleCell(usize),

    /// Topological D-ball.
    Ball(usize),

    /// Closed D-sphere, assumed for any mesh without boundary.
    ClosedSphere(usize),

    /// Cannot determine or doesn't fit known categories.
    Unknown,
}

/// Counts the cells of a mesh by dimension.
#[must_use]
pub fn count_cells<C: CellComplex>(mesh: &C) -> FVector {
    mesh.f_vector()
}

/// Alternating sum χ = Σ(-1)^k · `f_k`.
///
/// # Examples
///
/// ```rust
/// use dartmesh::topology::characteristics::euler::{FVector, euler_characteristic};
///
/// assert_eq!(euler_characteristic(&FVector { by_dim: vec![4, 6, 4] }), 2);
/// assert_eq!(euler_characteristic(&FVector { by_dim: vec![4, 6, 4, 1] }), 1);
/// ```
#[must_use]
#[allow(clippy::cast_possible_wrap)] // Cell counts won't exceed isize::MAX in practice
pub fn euler_characteristic(counts: &FVector) -> isize {
    counts
        .by_dim
        .iter()
        .enumerate()
        .map(|(k, &f_k)| {
            let sign = if k % 2 == 0 { 1 } else { -1 };
            sign * (f_k as isize)
        })
        .sum()
}

/// Classifies a mesh by its number of top cells and boundary.
///
/// A mesh with boundary is taken to be a ball and one without boundary a
/// sphere; [`validate_euler`](super::validation::validate_euler) checks the
/// assumption against χ.
#[must_use]
pub fn classify<C: CellComplex>(mesh: &C) -> TopologyClassification {
    match mesh.number_of_top_cells() {
        0 => TopologyClassification::Empty,
        1 => TopologyClassification::SingleCell(C::DIMENSION),
        _ if mesh.is_closed() => TopologyClassification::ClosedSphere(C::DIMENSION),
        _ => TopologyClassification::Ball(C::DIMENSION),
    }
}

/// Classifies a surface mesh, using its boundary loops.
///
/// A surface with more than one boundary loop is not a disk and is reported
/// as `Unknown`.
///
/// # Errors
///
/// Returns [`TopologyError::Boundary`] if the boundary cannot be traced.
pub fn classify_surface<M: MeshTraits>(
    mesh: &SurfaceMesh<M>,
) -> Result<TopologyClassification, TopologyError> {
    let classification = classify(mesh);
    if matches!(classification, TopologyClassification::Ball(_)) {
        let loops = SurfaceBoundary::new(mesh)?.loops().len();
        if loops > 1 {
            return Ok(TopologyClassification::Unknown);
        }
    }
    Ok(classification)
}

/// Expected χ for a classification.
///
/// # Examples
///
/// ```rust
/// use dartmesh::topology::characteristics::euler::{TopologyClassification, expected_chi_for};
///
/// assert_eq!(expected_chi_for(&TopologyClassification::Ball(2)), Some(1));
/// assert_eq!(expected_chi_for(&TopologyClassification::ClosedSphere(2)), Some(2));
/// assert_eq!(expected_chi_for(&TopologyClassification::ClosedSphere(3)), Some(0));
/// assert_eq!(expected_chi_for(&TopologyClassification::Unknown), None);
/// ```
#[must_use]
pub const fn expected_chi_for(classification: &TopologyClassification) -> Option<isize> {
    match classification {
        TopologyClassification::Empty => Some(0),
        TopologyClassification::SingleCell(_) | TopologyClassification::Ball(_) => Some(1),
        TopologyClassification::ClosedSphere(d) => Some(1 + if *d % 2 == 0 { 1 } else { -1 }),
        TopologyClassification::Unknown => None,
    }
}
