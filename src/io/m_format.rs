//! Reader and writer for the `.m` surface mesh format.
//!
//! ```text
//! # comment
//! Vertex 1 0 0 0 {uv=(0 0)}
//! Vertex 2 1 0 0
//! Vertex 3 0 1 0
//! Face 1 1 2 3 {normal=(0 0 1)}
//! Edge 1 2 {sharp}
//! Corner 2 1 {uv=(1 0)}
//! ```
//!
//! `Vertex id x y z`, `Face id v1 v2 ... vn`, `Edge v0 v1`, and
//! `Corner vertex_id face_id` each take an optional `{...}` attribute
//! payload. Unknown records are ignored.

use crate::core::cell::VertexKey;
use crate::core::surface_mesh::{SurfaceAttributes, SurfaceMesh};
use crate::core::traits::attribute_codec::{AttributeCodec, MeshTraits};
use crate::geometry::point::Point;
use crate::io::records::{MeshIoError, check_extension, parse_record, payload_suffix};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reads a surface mesh from `.m` records.
///
/// Faces are created in ascending id order after all vertices, then the
/// attribute payloads are assigned and decoded with the codecs of `M`.
///
/// # Errors
///
/// Returns [`MeshIoError::Parse`] for a malformed record and
/// [`MeshIoError::Construction`] if the records do not describe a
/// 2-manifold mesh.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::surface_mesh::SurfaceMesh;
/// use dartmesh::io::m_format::read_m;
///
/// let text = "Vertex 1 0 0 0\nVertex 2 1 0 0\nVertex 3 0 1 0\nFace 1 1 2 3 {tag}\n";
/// let mesh: SurfaceMesh = read_m(text.as_bytes()).unwrap();
/// assert_eq!(mesh.number_of_faces(), 1);
/// assert_eq!(mesh.face(mesh.id_face(1).unwrap()).unwrap().string(), "tag");
/// ```
pub fn read_m<M: MeshTraits, R: BufRead>(reader: R) -> Result<SurfaceMesh<M>, MeshIoError> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let mut attributes = SurfaceAttributes::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(record) = parse_record(&line, index + 1)? else {
            continue;
        };
        match record.keyword {
            "Vertex" => {
                let id = record.field::<usize>(0, "vertex id")?;
                let x = record.field::<f64>(1, "x coordinate")?;
                let y = record.field::<f64>(2, "y coordinate")?;
                let z = record.field::<f64>(3, "z coordinate")?;
                vertices.push((id, Point::new([x, y, z])));
                if record.payload.is_some() {
                    attributes.vertices.push((id, record.payload_string()));
                }
            }
            "Face" => {
                let id = record.field::<usize>(0, "face id")?;
                faces.push((id, record.fields_from::<usize>(1, "vertex id")?));
                if record.payload.is_some() {
                    attributes.faces.push((id, record.payload_string()));
                }
            }
            "Edge" => {
                let v0 = record.field::<usize>(0, "vertex id")?;
                let v1 = record.field::<usize>(1, "vertex id")?;
                attributes.edges.push((v0, v1, record.payload_string()));
            }
            "Corner" => {
                let v = record.field::<usize>(0, "vertex id")?;
                let f = record.field::<usize>(1, "face id")?;
                attributes.corners.push((v, f, record.payload_string()));
            }
            other => tracing::debug!(line = record.line, keyword = other, "skipping unknown record"),
        }
    }

    let mut mesh = SurfaceMesh::new();
    mesh.load(&vertices, &faces)?;
    if !attributes.is_empty() {
        mesh.load_attributes(&attributes)?;
    }
    tracing::debug!(
        vertices = mesh.number_of_vertices(),
        faces = mesh.number_of_faces(),
        "read .m mesh"
    );
    Ok(mesh)
}

/// Writes a surface mesh as `.m` records.
///
/// Vertices and faces are written in id order. Payloads are produced by
/// encoding each cell's decoded attributes over its raw string. Edge and
/// corner records are written only when their payload is non-empty.
///
/// # Errors
///
/// Returns [`MeshIoError::Io`] if writing fails.
pub fn write_m<M: MeshTraits, W: Write>(
    mesh: &SurfaceMesh<M>,
    mut writer: W,
) -> Result<(), MeshIoError> {
    let mut vertices: Vec<_> = mesh.vertices().collect();
    vertices.sort_by_key(|(_, v)| v.id());
    for (_, vertex) in vertices {
        let [x, y, z] = vertex.point().to_array();
        let payload = vertex.attributes().encode(vertex.string());
        writeln!(
            writer,
            "Vertex {} {x} {y} {z}{}",
            vertex.id(),
            payload_suffix(&payload)
        )?;
    }

    let mut faces: Vec<_> = mesh.faces().collect();
    faces.sort_by_key(|(_, f)| f.id());
    for (key, face) in faces {
        let ids: Vec<String> = mesh
            .face_vertex_ids(key)
            .iter()
            .map(ToString::to_string)
            .collect();
        let payload = face.attributes().encode(face.string());
        writeln!(
            writer,
            "Face {} {}{}",
            face.id(),
            ids.join(" "),
            payload_suffix(&payload)
        )?;
    }

    let id = |v: VertexKey| mesh.vertex_id(v).unwrap_or_default();
    let mut edges: Vec<(usize, usize, String)> = mesh
        .edges()
        .filter_map(|(e, edge)| {
            let payload = edge.attributes().encode(edge.string());
            let v0 = mesh.edge_vertex(e, 0)?;
            let v1 = mesh.edge_vertex(e, 1)?;
            (!payload.is_empty()).then(|| (id(v0), id(v1), payload))
        })
        .collect();
    edges.sort();
    for (v0, v1, payload) in edges {
        writeln!(writer, "Edge {v0} {v1} {{{payload}}}")?;
    }

    let mut corners: Vec<(usize, usize, String)> = mesh
        .darts()
        .filter_map(|(d, dart)| {
            let payload = dart.attributes().encode(dart.string());
            let v = mesh.dart_target(d)?;
            let f = mesh.dart_face(d).and_then(|f| mesh.face_id(f))?;
            (!payload.is_empty()).then(|| (id(v), f, payload))
        })
        .collect();
    corners.sort();
    for (v, f, payload) in corners {
        writeln!(writer, "Corner {v} {f} {{{payload}}}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a `.m` file.
///
/// # Errors
///
/// Returns [`MeshIoError::UnsupportedExtension`] unless the path ends in
/// `.m`, plus the errors of [`read_m`].
pub fn read_surface_mesh<M: MeshTraits>(path: impl AsRef<Path>) -> Result<SurfaceMesh<M>, MeshIoError> {
    let path = path.as_ref();
    check_extension(path, "m")?;
    read_m(BufReader::new(File::open(path)?))
}

/// Writes a `.m` file.
///
/// # Errors
///
/// Returns [`MeshIoError::UnsupportedExtension`] unless the path ends in
/// `.m`, plus the errors of [`write_m`].
pub fn write_surface_mesh<M: MeshTraits>(
    mesh: &SurfaceMesh<M>,
    path: impl AsRef<Path>,
) -> Result<(), MeshIoError> {
    let path = path.as_ref();
    check_extension(path, "m")?;
    write_m(mesh, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::surface_mesh::MeshConstructionError;
    use crate::core::traits::attribute_codec::{NoAttributes, Normal, Uv};

    #[derive(Clone, Debug, Default)]
    struct Decorated;

    impl MeshTraits for Decorated {
        type Vertex = Uv;
        type Edge = ();
        type Face = Normal;
        type Volume = ();
        type Dart = Uv;
    }

    const SQUARE: &str = "\
# unit square
Vertex 1 0 0 0 {uv=(0 0)}
Vertex 2 1 0 0 {uv=(1 0)}
Vertex 3 1 1 0
Vertex 4 0 1 0
Face 1 1 2 3 {normal=(0 0 1)}
Face 2 1 3 4
Edge 1 3 {sharp}
Corner 3 2 {uv=(0.5 0.5)}
Comment ignored
";

    #[test]
    fn reads_cells_and_decodes_payloads() {
        let mesh: SurfaceMesh<Decorated> = read_m(SQUARE.as_bytes()).unwrap();
        assert_eq!(mesh.number_of_vertices(), 4);
        assert_eq!(mesh.number_of_faces(), 2);
        assert_eq!(mesh.number_of_edges(), 5);

        let v2 = mesh.id_vertex(2).unwrap();
        assert_eq!(mesh.vertex(v2).unwrap().attributes().uv, Some([1.0, 0.0]));
        let f1 = mesh.id_face(1).unwrap();
        assert_eq!(
            mesh.face(f1).unwrap().attributes().normal,
            Some(Point::new([0.0, 0.0, 1.0]))
        );
        let e = mesh
            .vertex_edge(mesh.id_vertex(1).unwrap(), mesh.id_vertex(3).unwrap())
            .unwrap();
        assert_eq!(mesh.edge(e).unwrap().string(), "sharp");
        let corner = mesh
            .corner(mesh.id_vertex(3).unwrap(), mesh.id_face(2).unwrap())
            .unwrap();
        assert_eq!(mesh.dart(corner).unwrap().attributes().uv, Some([0.5, 0.5]));
    }

    #[test]
    fn write_then_read_preserves_the_mesh() {
        let mesh: SurfaceMesh<Decorated> = read_m(SQUARE.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_m(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Edge 1 3 {sharp}"));
        assert!(text.contains("Corner 3 2 {uv=(0.5 0.5)}"));

        let again: SurfaceMesh<Decorated> = read_m(text.as_bytes()).unwrap();
        assert_eq!(again.number_of_edges(), mesh.number_of_edges());
        for (_, face) in mesh.faces() {
            let other = again.id_face(face.id()).unwrap();
            assert_eq!(again.face(other).unwrap().string(), face.string());
        }
        for id in 1..=4 {
            let a = mesh.id_vertex(id).unwrap();
            let b = again.id_vertex(id).unwrap();
            assert_eq!(mesh.point(a), again.point(b));
            assert_eq!(mesh.vertex(a).unwrap().string(), again.vertex(b).unwrap().string());
        }
    }

    #[test]
    fn bad_records_are_rejected() {
        let missing = "Vertex 1 0 0\n";
        assert!(matches!(
            read_m::<NoAttributes, _>(missing.as_bytes()),
            Err(MeshIoError::Parse { line: 1, .. })
        ));
        let dangling = "Vertex 1 0 0 0\nVertex 2 1 0 0\nFace 1 1 2 9\n";
        assert!(matches!(
            read_m::<NoAttributes, _>(dangling.as_bytes()),
            Err(MeshIoError::Construction(
                MeshConstructionError::UnknownVertexId { id: 9 }
            ))
        ));
    }

    #[test]
    fn path_helpers_reject_other_extensions() {
        let mesh: SurfaceMesh = SurfaceMesh::new();
        assert!(matches!(
            write_surface_mesh(&mesh, "mesh.obj"),
            Err(MeshIoError::UnsupportedExtension { .. })
        ));
        assert!(matches!(
            read_surface_mesh::<NoAttributes>("mesh.off"),
            Err(MeshIoError::UnsupportedExtension { .. })
        ));
    }
}
