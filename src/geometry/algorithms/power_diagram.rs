//! Delaunay triangulation and Voronoi duals of planar sites by lifting.
//!
//! Sites are lifted onto the paraboloid `z = (x² + y²) / 2` and their convex
//! hull is built. The faces whose unit normal points up are removed; the lower
//! hull, projected back to the plane, is the Delaunay triangulation. The
//! circumcenter of each triangle is its Voronoi dual.
//!
//! Triangles keep the winding of the lower hull, so they appear clockwise when
//! viewed from `+z` and their normals are `(0, 0, -1)`.

use crate::core::cell::{FaceKey, VertexKey};
use crate::core::dynamic::RemovalError;
use crate::core::traits::attribute_codec::{HasDualPoint, HasNormal};
use crate::geometry::algorithms::convex_hull::{
    ConvexHull, ConvexHullError, ConvexHullOptions, HullMesh, compute_normal, face_points,
};
use crate::geometry::point::Point;
use crate::geometry::predicates::{CircumcenterError, circumcenter_2d};
use crate::geometry::util::point_generation::random_points_in_disk;
use rand::Rng;
use thiserror::Error;

/// Errors from building a power diagram.
#[derive(Debug, Error)]
pub enum PowerDiagramError {
    /// The lifted hull could not be built.
    #[error(transparent)]
    Hull(#[from] ConvexHullError),
    /// The upper hull could not be removed.
    #[error("Failed to remove the upper hull: {0}")]
    Removal(#[from] RemovalError),
    /// A Delaunay face is not a triangle.
    #[error("Face {face_id} is not a triangle")]
    NotTriangle {
        /// Identifier of the face.
        face_id: usize,
    },
    /// A Delaunay triangle has collinear corners.
    #[error("Face {face_id} has no circumcenter: {source}")]
    Circumcenter {
        /// Identifier of the face.
        face_id: usize,
        /// Underlying failure.
        #[source]
        source: CircumcenterError,
    },
}

/// Lifts a planar site onto the paraboloid `z = (x² + y²) / 2`.
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::algorithms::power_diagram::lift;
/// use dartmesh::geometry::point::Point;
///
/// assert_eq!(lift(&Point::new([1.0, 2.0, 7.0])), Point::new([1.0, 2.0, 2.5]));
/// ```
#[must_use]
pub fn lift(site: &Point<f64, 3>) -> Point<f64, 3> {
    let [x, y, _] = site.to_array();
    Point::new([x, y, 0.5 * x.mul_add(x, y * y)])
}

/// Delaunay triangulation and Voronoi duals of a planar point set.
#[derive(Clone, Debug)]
pub struct PowerDiagram {
    sites: Vec<Point<f64, 3>>,
    mesh: HullMesh,
    options: ConvexHullOptions,
}

impl PowerDiagram {
    /// Creates a diagram over `sites`; their `z` coordinates are dropped.
    #[must_use]
    pub fn new(sites: Vec<Point<f64, 3>>) -> Self {
        let sites = sites
            .into_iter()
            .map(|p| {
                let [x, y, _] = p.to_array();
                Point::new([x, y, 0.0])
            })
            .collect();
        Self {
            sites,
            mesh: HullMesh::new(),
            options: ConvexHullOptions::default(),
        }
    }

    /// Samples `n` sites uniformly in the unit disk.
    #[must_use]
    pub fn random_in_disk<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        Self::new(random_points_in_disk(n, rng))
    }

    /// Sets the options used for the lifted hull.
    #[must_use]
    pub const fn with_hull_options(mut self, options: ConvexHullOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the Delaunay triangulation of the sites.
    ///
    /// Replaces any previous triangulation. Vertex `i + 1` is site `i`.
    ///
    /// # Errors
    ///
    /// Returns [`PowerDiagramError::Hull`] if the lifted hull fails (for
    /// example when the first three sites are collinear) and
    /// [`PowerDiagramError::Removal`] if the upper hull cannot be removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dartmesh::geometry::algorithms::power_diagram::PowerDiagram;
    /// use dartmesh::geometry::point::Point;
    ///
    /// let mut diagram = PowerDiagram::new(vec![
    ///     Point::new([0.0, 0.0, 0.0]),
    ///     Point::new([2.0, 0.0, 0.0]),
    ///     Point::new([0.0, 2.0, 0.0]),
    ///     Point::new([2.0, 3.0, 0.0]),
    /// ]);
    /// diagram.calc_delaunay().unwrap();
    /// assert_eq!(diagram.mesh().number_of_faces(), 2);
    /// ```
    pub fn calc_delaunay(&mut self) -> Result<(), PowerDiagramError> {
        let lifted: Vec<Point<f64, 3>> = self.sites.iter().map(lift).collect();
        let mut hull = ConvexHull::new(lifted, self.options)?;
        hull.construct()?;
        let mut mesh = hull.into_mesh();

        let upper: Vec<FaceKey> = mesh
            .faces()
            .filter(|(_, f)| f.attributes().normal().is_some_and(|n| n.coords()[2] > 0.0))
            .map(|(k, _)| k)
            .collect();
        mesh.remove_faces(&upper)?;

        let vertices: Vec<VertexKey> = mesh.vertices().map(|(v, _)| v).collect();
        for v in vertices {
            if let Some(vertex) = mesh.vertex_mut(v) {
                let [x, y, _] = vertex.point().to_array();
                vertex.set_point(Point::new([x, y, 0.0]));
            }
        }
        let faces: Vec<FaceKey> = mesh.faces().map(|(f, _)| f).collect();
        for f in faces {
            compute_normal(&mut mesh, f);
        }

        tracing::debug!(
            sites = self.sites.len(),
            removed = upper.len(),
            triangles = mesh.number_of_faces(),
            "Delaunay triangulation computed"
        );
        self.mesh = mesh;
        Ok(())
    }

    /// Stores the circumcenter of every Delaunay triangle as its dual point.
    ///
    /// # Errors
    ///
    /// Returns [`PowerDiagramError::NotTriangle`] or
    /// [`PowerDiagramError::Circumcenter`] for a face without a
    /// circumcenter. No dual point is written in that case.
    pub fn calc_voronoi(&mut self) -> Result<(), PowerDiagramError> {
        let mut duals = Vec::with_capacity(self.mesh.number_of_faces());
        for (f, face) in self.mesh.faces() {
            let face_id = face.id();
            let [a, b, c] = face_points(&self.mesh, f).ok_or(PowerDiagramError::NotTriangle { face_id })?;
            let [x, y] = circumcenter_2d(xy(&a), xy(&b), xy(&c))
                .map_err(|source| PowerDiagramError::Circumcenter { face_id, source })?;
            duals.push((f, Point::new([x, y, 0.0])));
        }
        for (f, dual) in duals {
            if let Some(face) = self.mesh.face_mut(f) {
                face.attributes_mut().set_dual_point(Some(dual));
            }
        }
        Ok(())
    }

    /// Dual points of the triangles around `v`, in fan order.
    ///
    /// For a site on the convex hull of the input the cell is unbounded and
    /// the sequence is open.
    #[must_use]
    pub fn voronoi_cell(&self, v: VertexKey) -> Vec<Point<f64, 3>> {
        self.mesh
            .vertex_faces(v)
            .filter_map(|f| self.mesh.face(f)?.attributes().dual_point())
            .collect()
    }

    /// The input sites, projected to `z = 0`.
    #[must_use]
    pub fn sites(&self) -> &[Point<f64, 3>] {
        &self.sites
    }

    /// The Delaunay triangulation; empty until
    /// [`calc_delaunay`](Self::calc_delaunay) runs.
    #[must_use]
    pub const fn mesh(&self) -> &HullMesh {
        &self.mesh
    }
}

#[inline]
fn xy(p: &Point<f64, 3>) -> [f64; 2] {
    let [x, y, _] = p.to_array();
    [x, y]
}
