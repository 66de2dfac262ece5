//! Euler characteristic validation for meshes.
//!
//! Combines cell counting, classification, and the χ check into one result.

use crate::core::surface_mesh::SurfaceMesh;
use crate::core::traits::attribute_codec::MeshTraits;
use crate::topology::characteristics::euler::{
    CellComplex, FVector, TopologyClassification, TopologyError, classify, classify_surface,
    count_cells, euler_characteristic, expected_chi_for,
};

/// Result of Euler characteristic validation.
///
/// # Examples
///
/// ```rust
/// use dartmesh::topology::characteristics::euler::{FVector, TopologyClassification};
/// use dartmesh::topology::characteristics::validation::TopologyCheckResult;
///
/// let result = TopologyCheckResult {
///     chi: 0,
///     expected: Some(2),
///     classification: TopologyClassification::ClosedSphere(2),
///     counts: FVector { by_dim: vec![9, 27, 18] },
///     notes: vec![],
/// };
/// assert!(!result.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyCheckResult {
    /// Computed Euler characteristic.
    pub chi: isize,

    /// Expected χ based on classification (None if unknown).
    pub expected: Option<isize>,

    /// Topological classification.
    pub classification: TopologyClassification,

    /// Full cell counts (f-vector).
    pub counts: FVector,

    /// Diagnostic notes or warnings.
    pub notes: Vec<String>,
}

impl TopologyCheckResult {
    /// Returns `true` if χ matches expectation.
    ///
    /// An unknown classification has no expectation and always passes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.expected.is_none_or(|exp| self.chi == exp)
    }

    fn new(counts: FVector, classification: TopologyClassification) -> Self {
        let chi = euler_characteristic(&counts);
        let expected = expected_chi_for(&classification);
        let mut notes = Vec::new();
        if let Some(exp) = expected.filter(|&exp| chi != exp) {
            notes.push(format!(
                "Euler characteristic mismatch: computed {chi}, expected {exp}"
            ));
        }
        Self {
            chi,
            expected,
            classification,
            counts,
            notes,
        }
    }
}

/// Validates the Euler characteristic of any mesh against [`classify`].
#[must_use]
pub fn validate_euler<C: CellComplex>(mesh: &C) -> TopologyCheckResult {
    TopologyCheckResult::new(count_cells(mesh), classify(mesh))
}

/// Validates the Euler characteristic of a surface mesh against
/// [`classify_surface`].
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::surface_mesh::SurfaceMesh;
/// use dartmesh::geometry::point::Point;
/// use dartmesh::topology::characteristics::validation::validate_surface_euler;
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
/// let result = validate_surface_euler(&mesh).unwrap();
/// assert_eq!(result.chi, 1);
/// assert!(result.is_valid());
/// ```
///
/// # Errors
///
/// Returns [`TopologyError::Boundary`] if the boundary cannot be traced.
pub fn validate_surface_euler<M: MeshTraits>(
    mesh: &SurfaceMesh<M>,
) -> Result<TopologyCheckResult, TopologyError> {
    let result = TopologyCheckResult::new(count_cells(mesh), classify_surface(mesh)?);
    if !result.is_valid() {
        tracing::debug!(chi = result.chi, expected = ?result.expected, "surface Euler check failed");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tet_mesh::TetMesh;
    use crate::geometry::point::Point;

    // 3x3 grid of quads on a torus.
    fn torus() -> SurfaceMesh {
        let mut vertices = Vec::new();
        for j in 0..3_u32 {
            for i in 0..3_u32 {
                let (u, v) = (
                    std::f64::consts::TAU * f64::from(i) / 3.0,
                    std::f64::consts::TAU * f64::from(j) / 3.0,
                );
                let r = 2.0 + v.cos();
                let id = usize::try_from(3 * j + i + 1).unwrap();
                vertices.push((id, Point::new([r * u.cos(), r * u.sin(), v.sin()])));
            }
        }
        let id = |i: u32, j: u32| usize::try_from(3 * (j % 3) + (i % 3) + 1).unwrap();
        let mut faces = Vec::new();
        for j in 0..3_u32 {
            for i in 0..3_u32 {
                faces.push((
                    faces.len() + 1,
                    vec![id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)],
                ));
            }
        }
        SurfaceMesh::from_faces(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_topology_check_result_is_valid() {
        let unknown_result = TopologyCheckResult {
            chi: 42,
            expected: None,
            classification: TopologyClassification::Unknown,
            counts: FVector { by_dim: vec![1] },
            notes: vec![],
        };
        assert!(unknown_result.is_valid());
    }

    #[test]
    fn test_torus_is_flagged() {
        let result = validate_surface_euler(&torus()).unwrap();
        assert_eq!(result.counts.by_dim, vec![9, 18, 9]);
        assert_eq!(result.chi, 0);
        assert_eq!(result.classification, TopologyClassification::ClosedSphere(2));
        assert!(!result.is_valid());
        assert_eq!(result.notes.len(), 1);
    }

    #[test]
    fn test_two_tets_form_a_ball() {
        let points = [
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
            Point::new([1.0, 1.0, 1.0]),
        ];
        let mesh: TetMesh = TetMesh::from_tets(&points, &[[0, 1, 2, 3], [1, 2, 3, 4]]).unwrap();
        let result = validate_euler(&mesh);
        assert_eq!(result.counts.by_dim, vec![5, 9, 7, 2]);
        assert_eq!(result.classification, TopologyClassification::Ball(3));
        assert_eq!(result.chi, 1);
        assert!(result.is_valid());
    }
}
