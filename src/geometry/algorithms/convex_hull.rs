//! Incremental 3D convex hull on a dynamic surface mesh.
//!
//! The hull starts as a closed double-sided triangle over the first three
//! sites. While every site lies in that seed plane the hull is a flat convex
//! polygon covered by two sheets of triangles with opposite winding, and a
//! coplanar site outside the polygon grows it within the plane. The first
//! site off the plane sees one whole sheet. From then on each site that sees
//! at least one face removes the connected visible region with
//! [`SurfaceMesh::remove_faces`] and closes the horizon left behind with a
//! cone of new triangles to the site.
//!
//! ```rust
//! use dartmesh::geometry::algorithms::convex_hull::{ConvexHull, ConvexHullOptions};
//! use dartmesh::geometry::point::Point;
//!
//! let sites = vec![
//!     Point::new([0.0, 0.0, 0.0]),
//!     Point::new([1.0, 0.0, 0.0]),
//!     Point::new([0.0, 1.0, 0.0]),
//!     Point::new([0.0, 0.0, 1.0]),
//!     Point::new([0.1, 0.1, 0.1]),
//! ];
//! let mut hull = ConvexHull::new(sites, ConvexHullOptions::default()).unwrap();
//! hull.construct().unwrap();
//!
//! let mesh = hull.mesh();
//! assert_eq!(mesh.number_of_vertices(), 4);
//! assert_eq!(mesh.number_of_faces(), 4);
//! assert!(hull.is_inside(&Point::new([0.2, 0.2, 0.2])));
//! ```

use crate::core::cell::{FaceKey, VertexKey};
use crate::core::collections::{FaceKeySet, FastHashMap, FastHashSet};
use crate::core::dart::DartKey;
use crate::core::dynamic::RemovalError;
use crate::core::surface_mesh::{MeshConstructionError, SurfaceMesh};
use crate::core::traits::attribute_codec::{DualPoint, HasNormal, MeshTraits, Normal};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation, triangle_normal};
use crate::geometry::util::point_generation::random_points_in_ball;
use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building a convex hull.
///
/// A failed [`ConvexHull::insert`] leaves the hull as it was, up to the keys
/// of restored cells.
#[derive(Debug, Error)]
pub enum ConvexHullError {
    /// Fewer than three sites were given.
    #[error("At least 3 sites are required to seed a hull, found {found}")]
    TooFewSites {
        /// Number of sites supplied.
        found: usize,
    },
    /// The first three sites are collinear.
    #[error("The first three sites are collinear and cannot seed a hull")]
    DegenerateSeed,
    /// The edges around the visible region do not form exactly one loop.
    #[error("Expected one horizon loop around the visible faces, found {loops}")]
    UnexpectedBoundary {
        /// Number of loops found.
        loops: usize,
    },
    /// The horizon passes through a vertex twice.
    #[error("The horizon passes through vertex {vertex_id} more than once")]
    PinchedHorizon {
        /// Id of the vertex.
        vertex_id: usize,
    },
    /// Removing or restoring the visible region failed.
    #[error("Failed to remove visible faces: {0}")]
    Removal(#[from] RemovalError),
    /// Creating a cap face or vertex failed.
    #[error("Failed to close the cap: {0}")]
    Construction(#[from] MeshConstructionError),
}

// =============================================================================
// MESH TYPE
// =============================================================================

/// Attribute selection for hull meshes: faces carry a unit normal and a
/// dual point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HullTraits;

impl MeshTraits for HullTraits {
    type Vertex = ();
    type Edge = ();
    type Face = (Normal, DualPoint);
    type Volume = ();
    type Dart = ();
}

/// Surface mesh used by the hull and the power diagram.
pub type HullMesh = SurfaceMesh<HullTraits>;

/// Corner positions of a triangle, starting at the target of its dart.
pub(crate) fn face_points<M: MeshTraits>(
    mesh: &SurfaceMesh<M>,
    f: FaceKey,
) -> Option<[Point<f64, 3>; 3]> {
    let position = |d: DartKey| mesh.dart_target(d).and_then(|v| mesh.point(v)).copied();
    match mesh.face_cycle(f).as_slice() {
        &[d0, d1, d2] => Some([position(d0)?, position(d1)?, position(d2)?]),
        _ => None,
    }
}

/// Recomputes the unit normal attribute of a triangle.
///
/// A triangle with zero area gets no normal.
pub fn compute_normal<M: MeshTraits>(mesh: &mut SurfaceMesh<M>, f: FaceKey)
where
    M::Face: HasNormal,
{
    let normal = face_points(mesh, f).and_then(|[a, b, c]| triangle_normal(&a, &b, &c));
    if let Some(face) = mesh.face_mut(f) {
        face.attributes_mut().set_normal(normal);
    }
}

fn insert_with_normal(
    mesh: &mut HullMesh,
    ids: &[usize],
    face_id: usize,
) -> Result<FaceKey, MeshConstructionError> {
    let f = mesh.insert_face(ids, face_id)?;
    compute_normal(mesh, f);
    Ok(f)
}

// Faces reachable from the first face passing `sees`, stepping only across
// edges into faces that pass it too.
fn visible_region<M: MeshTraits>(
    mesh: &SurfaceMesh<M>,
    sees: impl Fn(FaceKey) -> bool,
) -> Vec<FaceKey> {
    let Some(seed) = mesh.faces().map(|(f, _)| f).find(|&f| sees(f)) else {
        return Vec::new();
    };
    let mut seen: FaceKeySet = std::iter::once(seed).collect();
    let mut region = vec![seed];
    let mut frontier = VecDeque::from([seed]);
    while let Some(f) = frontier.pop_front() {
        for d in mesh.face_cycle(f) {
            if let Some(g) = mesh.dart_sym(d).and_then(|s| mesh.dart_face(s))
                && seen.insert(g)
                && sees(g)
            {
                region.push(g);
                frontier.push_back(g);
            }
        }
    }
    region
}

// Two sheets over a strictly convex polygon given counterclockwise about the
// front normal. The front is fanned from the first corner and the back from
// the second, so the sheets share only the polygon's edges.
fn flat_mesh(
    polygon: &[(usize, Point<f64, 3>)],
    first_face_id: usize,
) -> Result<(HullMesh, Vec<VertexKey>), MeshConstructionError> {
    let mut mesh = HullMesh::new();
    let mut keys = Vec::with_capacity(polygon.len());
    for &(id, point) in polygon {
        keys.push(mesh.insert_vertex(id, point)?);
    }
    let m = polygon.len();
    let id = |k: usize| polygon[k % m].0;
    let front = (1..m - 1).map(|k| [id(0), id(k), id(k + 1)]);
    let back = (2..m).map(|k| [id(1), id(k + 1), id(k)]);
    for (face_id, corners) in (first_face_id..).zip(front.chain(back)) {
        insert_with_normal(&mut mesh, &corners, face_id)?;
    }
    Ok((mesh, keys))
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Tunables for [`ConvexHull`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConvexHullOptions {
    /// Signed volumes with magnitude at most this value count as coplanar,
    /// and coplanar faces are not visible. `0.0` keeps exact sign semantics.
    pub coplanarity_tolerance: f64,
}

impl ConvexHullOptions {
    /// Sets [`coplanarity_tolerance`](Self::coplanarity_tolerance).
    #[must_use]
    pub const fn with_coplanarity_tolerance(mut self, tolerance: f64) -> Self {
        self.coplanarity_tolerance = tolerance;
        self
    }
}

/// What [`ConvexHull::insert`] did with a site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The site lies inside the hull or on its boundary; the hull is
    /// unchanged.
    Inside,
    /// The site became a hull vertex.
    Inserted {
        /// The new vertex.
        vertex: VertexKey,
        /// Faces removed to make room for the site.
        removed: usize,
        /// Faces added.
        added: usize,
    },
}

// =============================================================================
// FLAT STAGE
// =============================================================================

// The seed plane of a hull that has not left it yet.
#[derive(Clone, Debug)]
struct FlatHull {
    seed: [Point<f64, 3>; 3],
    normal: Point<f64, 3>,
    // Vertex ids, strictly convex and counterclockwise about `normal`.
    polygon: Vec<usize>,
}

impl FlatHull {
    fn contains(&self, p: &Point<f64, 3>, tolerance: f64) -> bool {
        let [a, b, c] = &self.seed;
        orientation(a, b, c, p, tolerance) == Orientation::DEGENERATE
    }

    // `p` lies strictly outside the edge `s -> t`, measured against the wall
    // standing on the edge along the plane normal.
    fn sees_edge(
        &self,
        s: &Point<f64, 3>,
        t: &Point<f64, 3>,
        p: &Point<f64, 3>,
        tolerance: f64,
    ) -> bool {
        orientation(s, t, &(*s + self.normal), p, tolerance) == Orientation::POSITIVE
    }

    // Drops corners that stopped being strictly convex. The last corner is
    // the new site and stays.
    fn prune(&self, polygon: &mut Vec<(usize, Point<f64, 3>)>, tolerance: f64) {
        let mut k = 0;
        while k + 1 < polygon.len() && polygon.len() > 3 {
            let n = polygon.len();
            let prev = polygon[(k + n - 1) % n].1;
            let next = polygon[k + 1].1;
            if self.sees_edge(&prev, &next, &polygon[k].1, tolerance) {
                k += 1;
            } else {
                polygon.remove(k);
                k = k.saturating_sub(1);
            }
        }
    }
}

// =============================================================================
// CONVEX HULL
// =============================================================================

/// Incremental convex hull of a set of 3D sites.
#[derive(Clone, Debug)]
pub struct ConvexHull {
    sites: Vec<Point<f64, 3>>,
    mesh: HullMesh,
    options: ConvexHullOptions,
    max_vertex_id: usize,
    max_face_id: usize,
    flat: Option<FlatHull>,
}

impl ConvexHull {
    /// Seeds a hull from the first three sites.
    ///
    /// The seed is the triangle `(1, 2, 3)` glued to its reverse
    /// `(2, 1, 3)`, a closed surface with two faces. Call
    /// [`construct`](Self::construct) to insert the remaining sites.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::TooFewSites`] for fewer than three sites and
    /// [`ConvexHullError::DegenerateSeed`] if the first three are collinear.
    pub fn new(
        sites: Vec<Point<f64, 3>>,
        options: ConvexHullOptions,
    ) -> Result<Self, ConvexHullError> {
        let [a, b, c, ..] = sites.as_slice() else {
            return Err(ConvexHullError::TooFewSites { found: sites.len() });
        };
        let Some(normal) = triangle_normal(a, b, c) else {
            return Err(ConvexHullError::DegenerateSeed);
        };
        let seed = [*a, *b, *c];
        let (mesh, _) = flat_mesh(&[(1, seed[0]), (2, seed[1]), (3, seed[2])], 1)?;
        Ok(Self {
            sites,
            mesh,
            options,
            max_vertex_id: 3,
            max_face_id: 2,
            flat: Some(FlatHull {
                seed,
                normal,
                polygon: vec![1, 2, 3],
            }),
        })
    }

    /// Samples `n` sites uniformly in the unit ball and seeds a hull with
    /// default options.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn random_in_ball<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self, ConvexHullError> {
        Self::new(random_points_in_ball(n, rng), ConvexHullOptions::default())
    }

    /// Inserts every site after the seed.
    ///
    /// # Errors
    ///
    /// Propagates the first [`ConvexHullError`] from [`insert`](Self::insert).
    pub fn construct(&mut self) -> Result<(), ConvexHullError> {
        let total = self.sites.len();
        let pending: Vec<Point<f64, 3>> = self.sites.iter().skip(3).copied().collect();
        for (i, site) in pending.into_iter().enumerate() {
            let outcome = self.insert(site)?;
            tracing::trace!(site = i + 4, total, ?outcome, "hull insertion");
        }
        tracing::debug!(
            sites = total,
            vertices = self.mesh.number_of_vertices(),
            faces = self.mesh.number_of_faces(),
            flat = self.is_flat(),
            "convex hull constructed"
        );
        Ok(())
    }

    /// Adds one site to the hull.
    ///
    /// While the hull is flat, a site in its plane and outside the polygon
    /// grows the polygon; corners left on or inside the new boundary are
    /// released. Otherwise the connected region of faces visible from the
    /// site is replaced by a cone to it.
    ///
    /// # Errors
    ///
    /// Returns [`ConvexHullError::UnexpectedBoundary`] or
    /// [`ConvexHullError::PinchedHorizon`] if the visible region is not a
    /// disk, [`ConvexHullError::Removal`] if it cannot be removed, and
    /// [`ConvexHullError::Construction`] if the cap cannot be built. The hull
    /// is unchanged in every case.
    pub fn insert(&mut self, site: Point<f64, 3>) -> Result<InsertOutcome, ConvexHullError> {
        let Some(mut flat) = self.flat.take() else {
            return self.insert_spatial(site);
        };
        if flat.contains(&site, self.options.coplanarity_tolerance) {
            let outcome = self.extend_flat(&mut flat, site);
            self.flat = Some(flat);
            return outcome;
        }
        let outcome = self.insert_spatial(site);
        if matches!(outcome, Ok(InsertOutcome::Inserted { .. })) {
            tracing::debug!(
                vertices = self.mesh.number_of_vertices(),
                "hull left the seed plane"
            );
        } else {
            self.flat = Some(flat);
        }
        outcome
    }

    /// Orientation of `p` relative to face `f`; `POSITIVE` means `f` is
    /// visible from `p`. `None` if `f` is not a triangle of the hull.
    #[must_use]
    pub fn volume_sign(&self, f: FaceKey, p: &Point<f64, 3>) -> Option<Orientation> {
        let [a, b, c] = face_points(&self.mesh, f)?;
        Some(orientation(&a, &b, &c, p, self.options.coplanarity_tolerance))
    }

    /// The connected region of faces visible from `p`, grown from the first
    /// visible face.
    ///
    /// A site in the plane of a flat hull sees no face; use
    /// [`is_inside`](Self::is_inside) to classify it.
    #[must_use]
    pub fn visible_faces(&self, p: &Point<f64, 3>) -> Vec<FaceKey> {
        visible_region(&self.mesh, |f| {
            self.volume_sign(f, p) == Some(Orientation::POSITIVE)
        })
    }

    /// `true` if `p` lies inside the hull or on its boundary.
    #[must_use]
    pub fn is_inside(&self, p: &Point<f64, 3>) -> bool {
        let tolerance = self.options.coplanarity_tolerance;
        match &self.flat {
            Some(flat) if flat.contains(p, tolerance) => {
                let corners = self.corners(flat);
                let m = corners.len();
                (0..m).all(|k| !flat.sees_edge(&corners[k].1, &corners[(k + 1) % m].1, p, tolerance))
            }
            _ => self
                .mesh
                .faces()
                .all(|(f, _)| self.volume_sign(f, p) != Some(Orientation::POSITIVE)),
        }
    }

    /// `true` while every inserted site lies in the plane of the seed.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.flat.is_some()
    }

    /// Recomputes the normal attribute of `f`.
    pub fn compute_normal(&mut self, f: FaceKey) {
        compute_normal(&mut self.mesh, f);
    }

    /// The input sites.
    #[must_use]
    pub fn sites(&self) -> &[Point<f64, 3>] {
        &self.sites
    }

    /// The hull mesh.
    #[must_use]
    pub const fn mesh(&self) -> &HullMesh {
        &self.mesh
    }

    /// The options the hull was built with.
    #[must_use]
    pub const fn options(&self) -> ConvexHullOptions {
        self.options
    }

    /// Takes ownership of the hull mesh.
    #[must_use]
    pub fn into_mesh(self) -> HullMesh {
        self.mesh
    }

    // -------------------------------------------------------------------------
    // Flat stage
    // -------------------------------------------------------------------------

    fn corners(&self, flat: &FlatHull) -> Vec<(usize, Point<f64, 3>)> {
        flat.polygon
            .iter()
            .filter_map(|&id| Some((id, *self.mesh.point(self.mesh.id_vertex(id)?)?)))
            .collect()
    }

    // Rebuilds both sheets over the polygon grown by a coplanar site. The new
    // mesh replaces the old one only once it is complete.
    fn extend_flat(
        &mut self,
        flat: &mut FlatHull,
        site: Point<f64, 3>,
    ) -> Result<InsertOutcome, ConvexHullError> {
        let tolerance = self.options.coplanarity_tolerance;
        let corners = self.corners(flat);
        let m = corners.len();
        let visible: Vec<bool> = (0..m)
            .map(|k| flat.sees_edge(&corners[k].1, &corners[(k + 1) % m].1, &site, tolerance))
            .collect();
        // The edges a convex polygon shows to an outside point form one chain.
        let Some(first) = (0..m).find(|&k| visible[k] && !visible[(k + m - 1) % m]) else {
            return Ok(InsertOutcome::Inside);
        };
        let mut last = first;
        while visible[(last + 1) % m] {
            last = (last + 1) % m;
        }

        let apex = self.max_vertex_id + 1;
        let mut polygon = Vec::with_capacity(m + 1);
        let mut k = (last + 1) % m;
        loop {
            polygon.push(corners[k]);
            if k == first {
                break;
            }
            k = (k + 1) % m;
        }
        polygon.push((apex, site));
        flat.prune(&mut polygon, tolerance);

        let (mesh, keys) = flat_mesh(&polygon, self.max_face_id + 1)?;
        let vertex = keys[keys.len() - 1];
        let removed = self.mesh.number_of_faces();
        let added = mesh.number_of_faces();
        tracing::debug!(apex, corners = polygon.len(), "flat hull extended");

        self.mesh = mesh;
        self.max_vertex_id = apex;
        self.max_face_id += added;
        flat.polygon = polygon.iter().map(|&(id, _)| id).collect();
        Ok(InsertOutcome::Inserted {
            vertex,
            removed,
            added,
        })
    }

    // -------------------------------------------------------------------------
    // Spatial stage
    // -------------------------------------------------------------------------

    fn insert_spatial(&mut self, site: Point<f64, 3>) -> Result<InsertOutcome, ConvexHullError> {
        let visible = self.visible_faces(&site);
        if visible.is_empty() {
            return Ok(InsertOutcome::Inside);
        }
        let horizon = self.horizon(&visible)?;
        let detached = self.mesh.detach_faces(&visible)?;
        match self.close_cap(site, &horizon) {
            Ok(vertex) => Ok(InsertOutcome::Inserted {
                vertex,
                removed: visible.len(),
                added: horizon.len(),
            }),
            Err(err) => {
                tracing::warn!(%err, "closing the cap failed; restoring the visible region");
                self.mesh.reattach_faces(detached)?;
                Err(err)
            }
        }
    }

    // Edges between `region` and the rest of the hull, as `(source, target)`
    // ids of the surviving darts in loop order.
    fn horizon(&self, region: &[FaceKey]) -> Result<Vec<(usize, usize)>, ConvexHullError> {
        let inside: FaceKeySet = region.iter().copied().collect();
        let id = |v: Option<VertexKey>| v.and_then(|v| self.mesh.vertex_id(v));
        let mut next: FastHashMap<usize, usize> = FastHashMap::default();
        for &f in region {
            for d in self.mesh.face_cycle(f) {
                let Some(sym) = self.mesh.dart_sym(d) else {
                    continue;
                };
                if self.mesh.dart_face(sym).is_some_and(|g| inside.contains(&g)) {
                    continue;
                }
                let (Some(source), Some(target)) =
                    (id(self.mesh.dart_source(sym)), id(self.mesh.dart_target(sym)))
                else {
                    continue;
                };
                if next.insert(source, target).is_some() {
                    return Err(ConvexHullError::PinchedHorizon { vertex_id: source });
                }
            }
        }

        let mut loops = 0;
        let mut seen = FastHashSet::default();
        for &start in next.keys() {
            if seen.contains(&start) {
                continue;
            }
            loops += 1;
            let mut v = start;
            while seen.insert(v) {
                match next.get(&v) {
                    Some(&t) => v = t,
                    None => break,
                }
            }
        }
        let (1, Some(&start)) = (loops, next.keys().next()) else {
            tracing::warn!(loops, "visible region is not a disk");
            return Err(ConvexHullError::UnexpectedBoundary { loops });
        };

        let mut edges = Vec::with_capacity(next.len());
        let mut v = start;
        for _ in 0..next.len() {
            let Some(&t) = next.get(&v) else {
                break;
            };
            edges.push((v, t));
            v = t;
        }
        if v != start || edges.len() != next.len() {
            return Err(ConvexHullError::UnexpectedBoundary { loops });
        }
        Ok(edges)
    }

    // Cones the horizon to a new vertex at `site`. On failure the faces and
    // the vertex added so far are taken out again.
    fn close_cap(
        &mut self,
        site: Point<f64, 3>,
        horizon: &[(usize, usize)],
    ) -> Result<VertexKey, ConvexHullError> {
        let apex = self.max_vertex_id + 1;
        let vertex = self.mesh.insert_vertex(apex, site)?;
        let max_face_id = self.max_face_id;
        let mut cap = Vec::with_capacity(horizon.len());
        for &(source, target) in horizon {
            match self.add_face(&[target, source, apex]) {
                Ok(f) => cap.push(f),
                Err(err) => {
                    self.mesh.remove_faces(&cap)?;
                    if self.mesh.vertex(vertex).is_some() {
                        self.mesh.remove_vertex(vertex)?;
                    }
                    self.max_face_id = max_face_id;
                    return Err(err.into());
                }
            }
        }
        self.max_vertex_id = apex;
        Ok(vertex)
    }

    fn add_face(&mut self, ids: &[usize]) -> Result<FaceKey, MeshConstructionError> {
        let f = insert_with_normal(&mut self.mesh, ids, self.max_face_id + 1)?;
        self.max_face_id += 1;
        Ok(f)
    }
}
