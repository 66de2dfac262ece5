//! Collection aliases shared by the mesh containers.
//!
//! Hash-based lookups use `rustc_hash`, short traversal buffers use `smallvec`,
//! and arenas use `slotmap` through [`StorageMap`].

mod aliases;
mod helpers;
mod key_maps;

pub use aliases::*;
pub use helpers::*;
pub use key_maps::*;
