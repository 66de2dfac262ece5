//! Boundary analysis trait for combinatorial-map meshes.

/// Trait for boundary queries shared by surface and tetrahedral meshes.
///
/// A boundary cell is a codimension-1 cell that belongs to only one
/// top-dimensional cell: an edge with a single face on a surface mesh, a
/// triangle with a single tet on a tetrahedral mesh.
///
/// # Examples
///
/// ```
/// use dartmesh::core::surface_mesh::SurfaceMesh;
/// use dartmesh::core::traits::boundary_analysis::BoundaryAnalysis;
/// use dartmesh::geometry::point::Point;
///
/// let vertices = [
///     (1, Point::new([0.0, 0.0, 0.0])),
///     (2, Point::new([1.0, 0.0, 0.0])),
///     (3, Point::new([0.0, 1.0, 0.0])),
/// ];
/// let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &[(1, vec![1, 2, 3])]).unwrap();
///
/// assert_eq!(mesh.number_of_boundary_cells(), 3);
/// assert!(!mesh.is_closed());
/// ```
pub trait BoundaryAnalysis {
    /// Key of a boundary cell (`EdgeKey` in 2D, `FaceKey` in 3D).
    type BoundaryCell: Copy;

    /// Every boundary cell, in storage order.
    fn boundary_cells(&self) -> Vec<Self::BoundaryCell>;

    /// Returns `true` if `cell` exists and lies on the boundary.
    fn is_boundary_cell(&self, cell: Self::BoundaryCell) -> bool;

    /// Number of boundary cells.
    fn number_of_boundary_cells(&self) -> usize {
        self.boundary_cells().len()
    }

    /// Returns `true` if the mesh has no boundary.
    fn is_closed(&self) -> bool {
        self.number_of_boundary_cells() == 0
    }
}
