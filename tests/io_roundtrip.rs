//! File round trips for the `.m` and `.t` formats.

use approx::assert_relative_eq;
use dartmesh::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("dartmesh_{}_{name}", std::process::id()))
}

/// `true` if `b` is a rotation of `a`.
fn same_cycle(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len() && (0..a.len()).any(|k| a.iter().cycle().skip(k).take(a.len()).eq(b))
}

#[test]
fn hull_normals_survive_a_file_round_trip() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut hull = ConvexHull::random_in_ball(40, &mut rng).unwrap();
    hull.construct().unwrap();
    let mesh = hull.mesh();

    let path = temp_path("hull.m");
    write_surface_mesh(mesh, &path).unwrap();
    let loaded: HullMesh = read_surface_mesh(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.number_of_vertices(), mesh.number_of_vertices());
    assert_eq!(loaded.number_of_edges(), mesh.number_of_edges());
    assert_eq!(loaded.number_of_faces(), mesh.number_of_faces());
    assert!(loaded.is_closed());
    assert!(loaded.is_valid().is_ok());

    for (f, face) in mesh.faces() {
        let g = loaded.id_face(face.id()).unwrap();
        assert!(same_cycle(
            &loaded.face_vertex_ids(g),
            &mesh.face_vertex_ids(f)
        ));
        let expected = face.attributes().normal().unwrap().to_array();
        let actual = loaded
            .face(g)
            .unwrap()
            .attributes()
            .normal()
            .unwrap()
            .to_array();
        for k in 0..3 {
            assert_relative_eq!(actual[k], expected[k], epsilon = 1e-12);
        }
    }
}

#[test]
fn tet_mesh_round_trip_keeps_ids_and_winding() {
    let text = "\
Vertex 1 0 0 0
Vertex 2 1 0 0
Vertex 3 0 1 0
Vertex 4 0 0 1
Vertex 5 1 1 1 {fixed}
Tet 10 1 2 3 4
Tet 20 2 3 4 5 {material=(2)}
";
    let mesh: TetMesh = read_t(text.as_bytes()).unwrap();
    assert_eq!(mesh.number_of_volumes(), 2);
    assert_eq!(mesh.number_of_faces(), 7);

    let path = temp_path("pair.t");
    write_tet_mesh(&mesh, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    let loaded: TetMesh = read_tet_mesh(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(written.contains("Tet 10 1 2 3 4"));
    assert!(written.contains("Tet 20 2 3 4 5 {material=(2)}"));
    assert!(written.contains("Vertex 5 1 1 1 {fixed}"));
    assert_eq!(loaded.number_of_vertices(), 5);
    assert_eq!(loaded.number_of_edges(), 9);
    assert_eq!(loaded.number_of_faces(), 7);
    assert!(loaded.id_volume(20).is_some());
    assert!(loaded.is_valid().is_ok());

    let surface: SurfaceMesh = TetBoundary::new(&loaded).extract_surface().unwrap();
    assert_eq!(surface.number_of_faces(), 6);
    assert!(surface.is_closed());
    assert_eq!(euler_characteristic(&count_cells(&surface)), 2);
}

#[test]
fn wrong_extensions_are_rejected() {
    let mesh: SurfaceMesh = SurfaceMesh::new();
    let path = temp_path("mesh.obj");
    assert!(matches!(
        write_surface_mesh(&mesh, &path),
        Err(MeshIoError::UnsupportedExtension { expected: "m", .. })
    ));
    assert!(!path.exists());
    assert!(matches!(
        read_tet_mesh::<NoAttributes>(temp_path("mesh.m")),
        Err(MeshIoError::UnsupportedExtension { expected: "t", .. })
    ));
}

#[test]
fn missing_files_report_io_errors() {
    let path = temp_path("missing.m");
    assert!(matches!(
        read_surface_mesh::<NoAttributes>(&path),
        Err(MeshIoError::Io(_))
    ));
}
