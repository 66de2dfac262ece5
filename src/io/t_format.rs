//! Reader and writer for the `.t` tetrahedral mesh format.
//!
//! ```text
//! Vertex 1 0 0 0
//! Vertex 2 1 0 0 {fixed}
//! Vertex 3 0 1 0
//! Vertex 4 0 0 1
//! Tet 1 1 2 3 4 {material=(1)}
//! Edge 1 2 {sharp}
//! ```
//!
//! Tets refer to vertices by id. Vertex and tet ids are kept as read.

use crate::core::collections::FastHashMap;
use crate::core::surface_mesh::MeshConstructionError;
use crate::core::tet_mesh::{TetAttributes, TetMesh};
use crate::core::traits::attribute_codec::{AttributeCodec, MeshTraits};
use crate::geometry::point::Point;
use crate::io::records::{MeshIoError, check_extension, parse_record, payload_suffix};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reads a tetrahedral mesh from `.t` records.
///
/// Records may appear in any order. Tets are created in file order.
///
/// # Errors
///
/// Returns [`MeshIoError::Parse`] for a malformed record and
/// [`MeshIoError::Construction`] for unknown or duplicate ids and invalid
/// tets.
///
/// # Examples
///
/// ```rust
/// use dartmesh::core::tet_mesh::TetMesh;
/// use dartmesh::io::t_format::read_t;
///
/// let text = "Vertex 10 0 0 0\nVertex 20 1 0 0\nVertex 30 0 1 0\nVertex 40 0 0 1\nTet 5 10 20 30 40\n";
/// let mesh: TetMesh = read_t(text.as_bytes()).unwrap();
/// assert_eq!(mesh.number_of_volumes(), 1);
/// assert!(mesh.id_vertex(30).is_some());
/// assert!(mesh.id_volume(5).is_some());
/// ```
pub fn read_t<M: MeshTraits, R: BufRead>(reader: R) -> Result<TetMesh<M>, MeshIoError> {
    let mut points = Vec::new();
    let mut vertex_index: FastHashMap<usize, usize> = FastHashMap::default();
    let mut raw_tets: Vec<(usize, [usize; 4])> = Vec::new();
    let mut attributes = TetAttributes::default();

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
                if vertex_index.insert(id, points.len()).is_some() {
                    return Err(MeshConstructionError::DuplicateVertexId { id }.into());
                }
                attributes.vertex_ids.push((id, points.len()));
                points.push(Point::new([x, y, z]));
                if record.payload.is_some() {
                    attributes.vertices.push((id, record.payload_string()));
                }
            }
            "Tet" => {
                let id = record.field::<usize>(0, "tet id")?;
                let mut corners = [0; 4];
                for (k, slot) in corners.iter_mut().enumerate() {
                    *slot = record.field::<usize>(k + 1, "vertex id")?;
                }
                if record.fields.len() != 5 {
                    return Err(MeshIoError::Parse {
                        line: record.line,
                        message: format!("Tet record has {} vertex ids", record.fields.len() - 1),
                    });
                }
                attributes.volume_ids.push((id, raw_tets.len()));
                raw_tets.push((id, corners));
                if record.payload.is_some() {
                    attributes.volumes.push((id, record.payload_string()));
                }
            }
            "Edge" => {
                let v0 = record.field::<usize>(0, "vertex id")?;
                let v1 = record.field::<usize>(1, "vertex id")?;
                attributes.edges.push((v0, v1, record.payload_string()));
            }
            other => tracing::debug!(line = record.line, keyword = other, "skipping unknown record"),
        }
    }

    let mut tets = Vec::with_capacity(raw_tets.len());
    for (_, corners) in &raw_tets {
        let mut indices = [0; 4];
        for (slot, &id) in indices.iter_mut().zip(corners) {
            *slot = *vertex_index
                .get(&id)
                .ok_or(MeshConstructionError::UnknownVertexId { id })?;
        }
        tets.push(indices);
    }

    let mut mesh = TetMesh::new();
    mesh.load(&points, &tets)?;
    mesh.load_attributes(&attributes)?;
    tracing::debug!(
        vertices = mesh.number_of_vertices(),
        tets = mesh.number_of_volumes(),
        "read .t mesh"
    );
    Ok(mesh)
}

/// Writes a tetrahedral mesh as `.t` records.
///
/// Vertices and tets are written in load order; each tet lists its corners
/// in the winding it was created with. Edge records are written only for
/// edges with a non-empty payload.
///
/// # Errors
///
/// Returns [`MeshIoError::Io`] if writing fails.
pub fn write_t<M: MeshTraits, W: Write>(mesh: &TetMesh<M>, mut writer: W) -> Result<(), MeshIoError> {
    for (_, vertex) in mesh.vertices() {
        let [x, y, z] = vertex.point().to_array();
        let payload = vertex.attributes().encode(vertex.string());
        writeln!(
            writer,
            "Vertex {} {x} {y} {z}{}",
            vertex.id(),
            payload_suffix(&payload)
        )?;
    }

    for (key, volume) in mesh.volumes() {
        let ids: Vec<String> = mesh
            .volume_vertices(key)
            .filter_map(|v| mesh.vertex_id(v))
            .map(|id| id.to_string())
            .collect();
        let payload = volume.attributes().encode(volume.string());
        writeln!(
            writer,
            "Tet {} {}{}",
            volume.id(),
            ids.join(" "),
            payload_suffix(&payload)
        )?;
    }

    let mut edges: Vec<(usize, usize, String)> = mesh
        .edges()
        .filter_map(|(e, edge)| {
            let payload = edge.attributes().encode(edge.string());
            let v0 = mesh.edge_vertex(e, 0).and_then(|v| mesh.vertex_id(v))?;
            let v1 = mesh.edge_vertex(e, 1).and_then(|v| mesh.vertex_id(v))?;
            (!payload.is_empty()).then_some((v0, v1, payload))
        })
        .collect();
    edges.sort();
    for (v0, v1, payload) in edges {
        writeln!(writer, "Edge {v0} {v1} {{{payload}}}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a `.t` file.
///
/// # Errors
///
/// Returns [`MeshIoError::UnsupportedExtension`] unless the path ends in
/// `.t`, plus the errors of [`read_t`].
pub fn read_tet_mesh<M: MeshTraits>(path: impl AsRef<Path>) -> Result<TetMesh<M>, MeshIoError> {
    let path = path.as_ref();
    check_extension(path, "t")?;
    read_t(BufReader::new(File::open(path)?))
}

/// Writes a `.t` file.
///
/// # Errors
///
/// Returns [`MeshIoError::UnsupportedExtension`] unless the path ends in
/// `.t`, plus the errors of [`write_t`].
pub fn write_tet_mesh<M: MeshTraits>(
    mesh: &TetMesh<M>,
    path: impl AsRef<Path>,
) -> Result<(), MeshIoError> {
    let path = path.as_ref();
    check_extension(path, "t")?;
    write_t(mesh, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::attribute_codec::NoAttributes;

    const TWO_TETS: &str = "\
Vertex 10 0 0 0
Vertex 20 1 0 0 {fixed}
Vertex 30 0 1 0
Vertex 40 0 0 1
Vertex 50 1 1 1
Tet 1 10 20 30 40 {material=(1)}
Tet 2 20 30 40 50
Edge 10 20 {sharp}
";

    #[test]
    fn reads_ids_and_payloads() {
        let mesh: TetMesh = read_t(TWO_TETS.as_bytes()).unwrap();
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.number_of_volumes(), 2);
        assert_eq!(mesh.number_of_faces(), 7);
        assert_eq!(mesh.number_of_edges(), 9);

        let v = mesh.id_vertex(20).unwrap();
        assert_eq!(mesh.vertex(v).unwrap().string(), "fixed");
        assert_eq!(mesh.vertex_at(1), Some(v));
        let tet = mesh.id_volume(1).unwrap();
        assert_eq!(mesh.volume(tet).unwrap().string(), "material=(1)");
        let e = mesh.vertex_edge(mesh.id_vertex(10).unwrap(), v).unwrap();
        assert_eq!(mesh.edge(e).unwrap().string(), "sharp");
    }

    #[test]
    fn write_keeps_tet_winding() {
        let mesh: TetMesh = read_t(TWO_TETS.as_bytes()).unwrap();
        let mut buffer = Vec::new();
        write_t(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Tet 1 10 20 30 40 {material=(1)}"));
        assert!(text.contains("Tet 2 20 30 40 50\n"));
        assert!(text.contains("Vertex 20 1 0 0 {fixed}"));

        let again: TetMesh = read_t(text.as_bytes()).unwrap();
        assert_eq!(again.number_of_faces(), mesh.number_of_faces());
        assert_eq!(again.number_of_edges(), mesh.number_of_edges());
    }

    #[test]
    fn unknown_vertex_ids_are_rejected() {
        let text = "Vertex 1 0 0 0\nVertex 2 1 0 0\nVertex 3 0 1 0\nTet 1 1 2 3 4\n";
        assert!(matches!(
            read_t::<NoAttributes, _>(text.as_bytes()),
            Err(MeshIoError::Construction(
                MeshConstructionError::UnknownVertexId { id: 4 }
            ))
        ));
        let short = "Tet 1 1 2 3\n";
        assert!(matches!(
            read_t::<NoAttributes, _>(short.as_bytes()),
            Err(MeshIoError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_tet_mesh::<NoAttributes>("mesh.m"),
            Err(MeshIoError::UnsupportedExtension { expected: "t", .. })
        ));
    }
}
