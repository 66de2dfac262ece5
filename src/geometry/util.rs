//! Geometric utilities shared by the hull and power-diagram builders.

pub mod point_generation;

pub use point_generation::*;
