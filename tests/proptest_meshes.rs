//! Property-based tests for mesh construction, editing, and the hull.
//!
//! ## Test Properties
//!
//! 1. **Grid Topology**: triangulated grids are valid disks with one boundary loop
//! 2. **Removal Safety**: a face removal either keeps the mesh valid or leaves every
//!    dart, cell, and representative exactly as it was
//! 3. **Hull Topology**: hulls of random sites are closed spheres

use approx::relative_eq;
use dartmesh::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

// =============================================================================
// FIXTURES
// =============================================================================

/// `w × h` unit squares, each split along its rising diagonal.
fn grid(w: usize, h: usize) -> SurfaceMesh {
    let id = |i: usize, j: usize| j * (w + 1) + i + 1;
    let mut vertices = Vec::new();
    for (j, y) in (0..=h).zip((0_u32..).map(f64::from)) {
        for (i, x) in (0..=w).zip((0_u32..).map(f64::from)) {
            vertices.push((id(i, j), Point::new([x, y, 0.0])));
        }
    }
    let mut faces = Vec::new();
    for j in 0..h {
        for i in 0..w {
            let (a, b, c, d) = (id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1));
            faces.push((faces.len() + 1, vec![a, b, c]));
            faces.push((faces.len() + 1, vec![a, c, d]));
        }
    }
    SurfaceMesh::from_faces(&vertices, &faces).unwrap()
}

fn counts(mesh: &SurfaceMesh) -> FVector {
    count_cells(mesh)
}

type Snapshot = (
    Vec<(VertexKey, Vertex<()>)>,
    Vec<(EdgeKey, Edge<()>)>,
    Vec<(FaceKey, Face<()>)>,
    Vec<(DartKey, SurfaceDart<()>)>,
);

/// Every cell and dart under its key, with links and representatives.
fn snapshot(mesh: &SurfaceMesh) -> Snapshot {
    (
        mesh.vertices().map(|(k, v)| (k, v.clone())).collect(),
        mesh.edges().map(|(k, e)| (k, e.clone())).collect(),
        mesh.faces().map(|(k, f)| (k, f.clone())).collect(),
        mesh.darts().map(|(k, d)| (k, d.clone())).collect(),
    )
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Property: a triangulated grid is a disk whose boundary is the frame.
    #[test]
    fn prop_grid_is_a_disk(w in 1_usize..6, h in 1_usize..6) {
        let mesh = grid(w, h);
        prop_assert!(mesh.is_valid().is_ok());
        prop_assert_eq!(mesh.number_of_faces(), 2 * w * h);
        prop_assert_eq!(euler_characteristic(&counts(&mesh)), 1);

        let boundary = SurfaceBoundary::new(&mesh).unwrap();
        prop_assert_eq!(boundary.loops().len(), 1);
        let perimeter = f64::from(u32::try_from(2 * (w + h)).unwrap());
        prop_assert!(relative_eq!(boundary.loops()[0].length(), perimeter, epsilon = 1e-9));
    }

    /// Property: removing one face never leaves an invalid mesh.
    #[test]
    fn prop_face_removal_is_safe(
        w in 1_usize..5,
        h in 1_usize..5,
        pick in any::<prop::sample::Index>(),
    ) {
        let mut mesh = grid(w, h);
        let before = snapshot(&mesh);
        let face_id = pick.index(2 * w * h) + 1;
        let f = mesh.id_face(face_id).unwrap();
        match mesh.remove_face(f) {
            Ok(()) => {
                prop_assert!(mesh.id_face(face_id).is_none());
                prop_assert_eq!(mesh.number_of_faces(), 2 * w * h - 1);
            }
            Err(RemovalError::NonManifold { .. }) => {
                prop_assert_eq!(snapshot(&mesh), before);
            }
            Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {other}"))),
        }
        prop_assert!(mesh.is_valid().is_ok());
    }

    /// Property: the hull of random sites in the ball is a closed sphere.
    #[test]
    fn prop_random_hull_is_a_sphere(seed in any::<u64>(), n in 4_usize..40) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hull = ConvexHull::random_in_ball(n, &mut rng).unwrap();
        hull.construct().unwrap();
        let mesh = hull.mesh();
        prop_assert!(mesh.is_closed());
        prop_assert_eq!(euler_characteristic(&count_cells(mesh)), 2);
        prop_assert!(mesh.number_of_vertices() <= n);
    }
}
