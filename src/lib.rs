//! # dartmesh
//!
//! A combinatorial-map mesh kernel for oriented 2-manifold surfaces and
//! tetrahedral 3-manifolds, with an incremental 3D convex hull and a power
//! diagram (Delaunay/Voronoi by lifting) built on top of it.
//!
//! Connectivity lives entirely in **darts**: one dart per (face, edge)
//! incidence on a surface, one per (tet, face, edge) incidence in a volume.
//! Each dart points to the vertex it ends at and to its partners through the
//! `β` operators. Vertices, edges, faces, and tets only store one
//! representative dart.
//!
//! # Features
//!
//! - Surface meshes with polygonal faces and tetrahedral meshes in one dart model
//! - Constant-time navigation (`next`, `prev`, `sym`) and local fan iterators
//! - Boundary loop tracing and division, boundary surface extraction from tets
//! - Dynamic editing: vertex and face insertion, face/edge/vertex removal
//!   with manifold guards and rollback
//! - `.m` and `.t` text formats with per-cell attribute payloads
//! - Incremental convex hull and lifted power diagram
//!
//! # Basic Usage
//!
//! ```rust
//! use dartmesh::prelude::*;
//!
//! let vertices = [
//!     (1, Point::new([0.0, 0.0, 0.0])),
//!     (2, Point::new([1.0, 0.0, 0.0])),
//!     (3, Point::new([1.0, 1.0, 0.0])),
//!     (4, Point::new([0.0, 1.0, 0.0])),
//! ];
//! let faces = [(1, vec![1, 2, 3]), (2, vec![1, 3, 4])];
//! let mesh: SurfaceMesh = SurfaceMesh::from_faces(&vertices, &faces).unwrap();
//!
//! assert_eq!(mesh.number_of_edges(), 5);
//! assert!(mesh.is_valid().is_ok());
//!
//! let boundary = SurfaceBoundary::new(&mesh).unwrap();
//! assert_eq!(boundary.loops().len(), 1);
//! assert_eq!(boundary.loops()[0].len(), 4);
//! ```
//!
//! # Convex Hull
//!
//! ```rust
//! use dartmesh::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut hull = ConvexHull::random_in_ball(64, &mut rng).unwrap();
//! hull.construct().unwrap();
//!
//! let chi = euler_characteristic(&count_cells(hull.mesh()));
//! assert_eq!(chi, 2);
//! assert!(hull.mesh().is_closed());
//! ```
//!
//! # Mesh Invariants
//!
//! The structural invariants are checked by
//! [`SurfaceMesh::validation_report`](core::surface_mesh::SurfaceMesh::validation_report)
//! and [`TetMesh::validation_report`](core::tet_mesh::TetMesh::validation_report):
//!
//! | Invariant | Helper method |
//! |---|---|
//! | Dart references resolve | `validate_dart_references` |
//! | `β2` (and `β3`) are involutions without fixed points | `validate_involution` |
//! | Face cycles close with the right length | `validate_face_cycles` |
//! | Cell representatives belong to their cell | `validate_representatives` |
//! | Boundary vertices use a boundary in-dart | `validate_boundary_representatives` |
//! | Deduplication indices match the darts | `validate_indices` |
//!
//! `is_valid()` runs all of them and returns only the first failure.

// Allow multiple crate versions due to transitive dependencies
#![expect(clippy::multiple_crate_versions)]
// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

/// The `core` module contains the dart-based mesh containers and their
/// navigation, editing, boundary, and validation operations.
pub mod core {
    pub mod boundary;
    pub mod cell;
    /// Hash maps, small buffers, and arenas used by the mesh containers
    pub mod collections;
    pub mod dart;
    /// Vertex and face insertion, face/edge/vertex removal
    pub mod dynamic;
    pub mod iterators;
    pub mod surface_mesh;
    pub mod tet_mesh;
    pub mod validation;
    pub mod vertex_tuple;
    /// Traits for attribute payloads and boundary queries.
    pub mod traits {
        pub mod attribute_codec;
        pub mod boundary_analysis;
        pub use attribute_codec::*;
        pub use boundary_analysis::*;
    }
    // Re-export the `core` modules.
    pub use boundary::*;
    pub use cell::*;
    pub use dart::*;
    pub use dynamic::*;
    pub use iterators::*;
    pub use surface_mesh::*;
    pub use tet_mesh::*;
    pub use traits::*;
    pub use validation::*;
    pub use vertex_tuple::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Contains geometric types including the `Point` struct, predicates, and the
/// hull and power-diagram algorithms.
pub mod geometry {
    /// Geometric algorithms on surface meshes
    pub mod algorithms {
        /// Incremental 3D convex hull
        pub mod convex_hull;
        /// Delaunay triangulation and Voronoi duals by lifting
        pub mod power_diagram;
        pub use convex_hull::*;
        pub use power_diagram::*;
    }
    pub mod point;
    pub mod predicates;
    /// Random point generation
    pub mod util;
    /// Traits module containing the coordinate scalar abstraction.
    pub mod traits {
        pub mod coordinate;
        pub use coordinate::*;
    }
    pub use algorithms::*;
    pub use point::*;
    pub use predicates::*;
    pub use traits::*;
    pub use util::*;
}

/// Readers and writers for the `.m` surface and `.t` tetrahedral formats.
pub mod io {
    pub mod m_format;
    mod records;
    pub mod t_format;
    pub use m_format::*;
    pub use records::MeshIoError;
    pub use t_format::*;
}

/// Topological characteristics of meshes.
pub mod topology {
    /// Euler characteristic computation and validation
    pub mod characteristics {
        pub mod euler;
        pub mod validation;
        pub use euler::*;
        pub use validation::*;
    }
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        boundary::*,
        cell::*,
        dart::*,
        dynamic::*,
        iterators::*,
        surface_mesh::*,
        tet_mesh::*,
        traits::{attribute_codec::*, boundary_analysis::*},
        validation::*,
        vertex_tuple::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{
        algorithms::*, point::*, predicates::*, traits::coordinate::*, util::*,
    };

    pub use crate::io::{MeshIoError, m_format::*, t_format::*};
    pub use crate::topology::characteristics::{euler::*, validation::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{surface_mesh::SurfaceMesh, tet_mesh::TetMesh},
        geometry::{ConvexHull, Point, PowerDiagram},
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point<f64, 3>>());
        assert!(is_normal::<SurfaceMesh>());
        assert!(is_normal::<TetMesh>());
        assert!(is_normal::<ConvexHull>());
        assert!(is_normal::<PowerDiagram>());
    }

    #[test]
    fn test_prelude_collections_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut set: FastHashSet<u64> = FastHashSet::default();
        set.insert(789);
        assert!(set.contains(&789));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);
    }

    #[test]
    fn test_prelude_topology_exports() {
        use crate::prelude::*;

        let points = [
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
            Point::new([0.0, 0.0, 1.0]),
        ];
        let mesh: TetMesh = TetMesh::from_tets(&points, &[[0, 1, 2, 3]]).unwrap();
        let surface: SurfaceMesh = TetBoundary::new(&mesh).extract_surface().unwrap();
        let result = validate_surface_euler(&surface).unwrap();
        assert_eq!(result.chi, 2);
        assert!(result.is_valid());
    }
}
