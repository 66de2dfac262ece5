//! Integration tests for insertion and removal on surface meshes.
//!
//! Every successful edit must leave a mesh that passes the full validation
//! report; every failed edit must leave the mesh untouched.

use dartmesh::prelude::*;

/// `n × n` grid of unit squares, each split into two triangles.
fn grid(n: usize) -> SurfaceMesh {
    let mut vertices = Vec::new();
    let mut y = 0.0;
    for j in 0..=n {
        let mut x = 0.0;
        for i in 0..=n {
            vertices.push((j * (n + 1) + i + 1, Point::new([x, y, 0.0])));
            x += 1.0;
        }
        y += 1.0;
    }
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * (n + 1) + i + 1;
            let (b, c, d) = (a + 1, a + n + 2, a + n + 1);
            faces.push((faces.len() + 1, vec![a, b, c]));
            faces.push((faces.len() + 1, vec![a, c, d]));
        }
    }
    SurfaceMesh::from_faces(&vertices, &faces).unwrap()
}

fn snapshot(mesh: &SurfaceMesh) -> (usize, usize, usize, usize) {
    (
        mesh.number_of_vertices(),
        mesh.number_of_edges(),
        mesh.number_of_faces(),
        mesh.number_of_darts(),
    )
}

fn chi(mesh: &SurfaceMesh) -> isize {
    euler_characteristic(&count_cells(mesh))
}

#[test]
fn removing_an_interior_star_opens_a_hole() {
    let mut mesh = grid(4);
    // Vertex 13 is the center of the 5x5 vertex grid; its link is interior.
    let center = mesh.id_vertex(13).unwrap();
    assert!(!mesh.is_boundary_vertex(center));
    let star: Vec<FaceKey> = mesh.vertex_faces(center).collect();
    assert_eq!(star.len(), 6);

    mesh.remove_vertex(center).unwrap();
    assert!(mesh.id_vertex(13).is_none());
    assert_eq!(mesh.number_of_faces(), 26);
    assert_eq!(chi(&mesh), 0);
    assert_eq!(SurfaceBoundary::new(&mesh).unwrap().loops().len(), 2);
    assert!(
        mesh.validation_report(ValidationOptions::default())
            .is_ok()
    );
}

#[test]
fn star_touching_the_boundary_is_rolled_back() {
    let mut mesh = grid(2);
    let before = snapshot(&mesh);
    // Every order over the star of the center pinches an outer vertex.
    let center = mesh.id_vertex(5).unwrap();
    assert!(matches!(
        mesh.remove_vertex(center),
        Err(RemovalError::Stalled { .. })
    ));
    assert_eq!(snapshot(&mesh), before);
    assert!(mesh.is_valid().is_ok());
}

#[test]
fn faces_can_be_removed_and_reinserted() {
    let mut mesh = grid(3);
    let before = snapshot(&mesh);
    let f = mesh.id_face(9).unwrap();
    let ids = mesh.face_vertex_ids(f);

    mesh.remove_face(f).unwrap();
    assert_eq!(chi(&mesh), 0);
    assert_eq!(SurfaceBoundary::new(&mesh).unwrap().loops().len(), 2);
    assert!(mesh.is_valid().is_ok());

    mesh.insert_face(&ids, 9).unwrap();
    assert_eq!(snapshot(&mesh), before);
    assert_eq!(chi(&mesh), 1);
    assert!(mesh.is_valid().is_ok());
}

#[test]
fn batch_removal_of_a_region_keeps_a_valid_mesh() {
    let mut mesh = grid(4);
    let region: Vec<FaceKey> = (1..=8).filter_map(|id| mesh.id_face(id)).collect();
    mesh.remove_faces(&region).unwrap();
    assert_eq!(mesh.number_of_faces(), 24);
    assert!(mesh.is_valid().is_ok());
    assert_eq!(chi(&mesh), 1);
}

#[test]
fn failed_batch_leaves_the_mesh_unchanged() {
    let mut mesh = grid(2);
    let before = snapshot(&mesh);
    // The two diagonal corner squares of the center vertex: removing both
    // pinches vertex 5 whatever the order.
    let batch: Vec<FaceKey> = [1, 2, 7, 8]
        .iter()
        .filter_map(|&id| mesh.id_face(id))
        .collect();
    let result = mesh.remove_faces(&batch);
    assert!(matches!(result, Err(RemovalError::Stalled { .. })));
    assert_eq!(snapshot(&mesh), before);
    assert!(mesh.is_valid().is_ok());
    for id in 1..=8 {
        assert!(mesh.id_face(id).is_some(), "face {id} should be present");
    }
}

#[test]
fn removing_an_edge_takes_its_faces() {
    let mut mesh = grid(1);
    let a = mesh.id_vertex(1).unwrap();
    let c = mesh.id_vertex(4).unwrap();
    let diagonal = mesh.vertex_edge(a, c).unwrap();
    mesh.remove_edge(diagonal).unwrap();
    assert!(mesh.is_empty());
    assert_eq!(mesh.remove_edge(diagonal), Err(RemovalError::UnknownEdge));
}

#[test]
fn inserting_faces_builds_a_closed_surface() {
    let mut mesh: SurfaceMesh = SurfaceMesh::new();
    let points = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    for (i, p) in points.iter().enumerate() {
        mesh.insert_vertex(i + 1, Point::new(*p)).unwrap();
    }
    let faces = [[1, 3, 2], [1, 2, 4], [2, 3, 4], [3, 1, 4]];
    for (i, ids) in faces.iter().enumerate() {
        mesh.insert_face(ids, i + 1).unwrap();
        assert!(mesh.is_valid().is_ok(), "after face {}", i + 1);
    }
    assert!(mesh.is_closed());
    assert_eq!(chi(&mesh), 2);
    assert!(matches!(
        mesh.insert_face(&[1, 3, 2], 5),
        Err(MeshConstructionError::NonManifoldEdge { .. })
    ));
}
