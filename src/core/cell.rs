//! Cells of a combinatorial map: vertices, edges, faces, and volumes.
//!
//! A cell never owns darts. It holds one representative dart, from which
//! every incident dart is reachable by local navigation, plus its domain
//! data: a user-facing id, a position (vertices only), the raw attribute
//! string, and the decoded attributes.
//!
//! The representative is `None` only transiently, while the owning mesh is
//! wiring a new cell.

use crate::core::dart::DartKey;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// =============================================================================
// KEY TYPES
// =============================================================================

new_key_type! {
    /// Key type for accessing vertices in the storage map.
    pub struct VertexKey;
}

new_key_type! {
    /// Key type for accessing edges in the storage map.
    pub struct EdgeKey;
}

new_key_type! {
    /// Key type for accessing faces in the storage map.
    pub struct FaceKey;
}

new_key_type! {
    /// Key type for accessing volumes (tetrahedra) in the storage map.
    pub struct VolumeKey;
}

// =============================================================================
// CELL STRUCTS
// =============================================================================

/// A 0-cell with an id and a position in 3D space.
///
/// The representative dart is an **incoming** dart (one whose target is this
/// vertex). For a vertex on the boundary of a surface mesh it is the boundary
/// in-dart, where the fan rotation starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex<A> {
    id: usize,
    point: Point<f64, 3>,
    dart: Option<DartKey>,
    string: String,
    attributes: A,
}

/// A 1-cell. Its representative dart is a boundary dart when the edge lies on
/// the boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge<A> {
    dart: Option<DartKey>,
    string: String,
    attributes: A,
}

/// A 2-cell (polygon of a surface mesh or triangle of a tetrahedral mesh).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Face<A> {
    id: usize,
    dart: Option<DartKey>,
    string: String,
    attributes: A,
}

/// A 3-cell (tetrahedron).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume<A> {
    id: usize,
    dart: Option<DartKey>,
    string: String,
    attributes: A,
}

// Shared accessors for the representative dart and the attribute payload.
macro_rules! impl_cell_common {
    ($cell:ident) => {
        impl<A> $cell<A> {
            /// Representative dart of the cell.
            #[inline]
            #[must_use]
            pub const fn dart(&self) -> Option<DartKey> {
                self.dart
            }

            #[inline]
            pub(crate) const fn set_dart(&mut self, dart: Option<DartKey>) {
                self.dart = dart;
            }

            /// Raw attribute string.
            #[inline]
            #[must_use]
            pub fn string(&self) -> &str {
                &self.string
            }

            /// Replaces the raw attribute string.
            pub fn set_string(&mut self, string: impl Into<String>) {
                self.string = string.into();
            }

            /// Decoded attributes.
            #[inline]
            #[must_use]
            pub const fn attributes(&self) -> &A {
                &self.attributes
            }

            /// Mutable access to the decoded attributes.
            #[inline]
            pub const fn attributes_mut(&mut self) -> &mut A {
                &mut self.attributes
            }
        }
    };
}

impl_cell_common!(Vertex);
impl_cell_common!(Edge);
impl_cell_common!(Face);
impl_cell_common!(Volume);

macro_rules! impl_cell_id {
    ($cell:ident) => {
        impl<A> $cell<A> {
            /// User-facing identifier.
            #[inline]
            #[must_use]
            pub const fn id(&self) -> usize {
                self.id
            }

            #[inline]
            pub(crate) const fn set_id(&mut self, id: usize) {
                self.id = id;
            }
        }
    };
}

impl_cell_id!(Vertex);
impl_cell_id!(Face);
impl_cell_id!(Volume);

impl<A: Default> Vertex<A> {
    pub(crate) fn new(id: usize, point: Point<f64, 3>) -> Self {
        Self {
            id,
            point,
            dart: None,
            string: String::new(),
            attributes: A::default(),
        }
    }
}

impl<A> Vertex<A> {
    /// Position of the vertex.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> &Point<f64, 3> {
        &self.point
    }

    /// Moves the vertex. Topology is unaffected.
    #[inline]
    pub const fn set_point(&mut self, point: Point<f64, 3>) {
        self.point = point;
    }
}

impl<A: Default> Edge<A> {
    pub(crate) fn new() -> Self {
        Self {
            dart: None,
            string: String::new(),
            attributes: A::default(),
        }
    }
}

impl<A: Default> Face<A> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            dart: None,
            string: String::new(),
            attributes: A::default(),
        }
    }
}

impl<A: Default> Volume<A> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            dart: None,
            string: String::new(),
            attributes: A::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn new_cells_have_no_representative() {
        let vertex: Vertex<()> = Vertex::new(4, Point::new([1.0, 2.0, 3.0]));
        assert_eq!(vertex.id(), 4);
        assert_eq!(vertex.point(), &Point::new([1.0, 2.0, 3.0]));
        assert!(vertex.dart().is_none());

        let edge: Edge<()> = Edge::new();
        assert!(edge.dart().is_none());
        assert!(edge.string().is_empty());

        let face: Face<()> = Face::new(9);
        let volume: Volume<()> = Volume::new(2);
        assert_eq!((face.id(), volume.id()), (9, 2));
    }

    #[test]
    fn representative_and_payload_are_updatable() {
        let mut darts: SlotMap<DartKey, ()> = SlotMap::with_key();
        let d = darts.insert(());

        let mut face: Face<u32> = Face::new(1);
        face.set_dart(Some(d));
        face.set_id(5);
        face.set_string("normal=(0 0 1)");
        *face.attributes_mut() = 7;

        assert_eq!(face.dart(), Some(d));
        assert_eq!(face.id(), 5);
        assert_eq!(face.string(), "normal=(0 0 1)");
        assert_eq!(*face.attributes(), 7);

        let mut vertex: Vertex<()> = Vertex::new(1, Point::default());
        vertex.set_point(Point::new([0.0, 0.0, 1.0]));
        assert_eq!(vertex.point().coords()[2], 1.0);
    }

    #[test]
    fn cells_serialize_with_their_payload() {
        let mut vertex: Vertex<()> = Vertex::new(3, Point::new([0.5, 0.0, 0.0]));
        vertex.set_string("fixed");
        let json = serde_json::to_string(&vertex).unwrap();
        let back: Vertex<()> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vertex);
    }
}
