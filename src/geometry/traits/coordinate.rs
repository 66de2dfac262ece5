//! Coordinate scalar abstraction.
//!
//! [`CoordinateScalar`] gathers the bounds every coordinate type must satisfy
//! so that [`Point`](crate::geometry::point::Point) can be generic over `f32`
//! and `f64` while still supporting hashing, equality, and serialization.

use num_traits::Float;
use num_traits::float::FloatCore;
use ordered_float::{OrderedFloat, PrimitiveFloat};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::{Debug, Display};

/// Errors that can occur during coordinate validation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordinateValidationError {
    /// A coordinate value is invalid (NaN or infinite).
    #[error(
        "Invalid coordinate at index {coordinate_index} in dimension {dimension}: {coordinate_value}"
    )]
    InvalidCoordinate {
        /// Index of the invalid coordinate.
        coordinate_index: usize,
        /// Value of the invalid coordinate, as a string.
        coordinate_value: String,
        /// The dimensionality of the coordinate system.
        dimension: usize,
    },
}

/// Default tolerance for f32 floating-point comparisons.
pub const DEFAULT_TOLERANCE_F32: f32 = 1e-6;

/// Default tolerance for f64 floating-point comparisons.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-15;

/// Scalar type usable as a point coordinate.
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::traits::coordinate::CoordinateScalar;
///
/// fn close<T: CoordinateScalar>(a: T, b: T) -> bool {
///     num_traits::Float::abs(a - b) <= T::default_tolerance()
/// }
///
/// assert!(close(1.0_f64, 1.0));
/// assert_eq!(f32::default_tolerance(), 1e-6);
/// ```
pub trait CoordinateScalar:
    Float
    + FloatCore
    + PrimitiveFloat
    + Default
    + Debug
    + Display
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Returns the default comparison tolerance for this type.
    fn default_tolerance() -> Self;

    /// Wraps the value for total ordering, equality, and hashing.
    ///
    /// All NaN bit patterns compare equal under this wrapper.
    #[inline]
    fn ordered(self) -> OrderedFloat<Self> {
        OrderedFloat(self)
    }
}

impl CoordinateScalar for f32 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F32
    }
}

impl CoordinateScalar for f64 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerances_match_precision() {
        assert_eq!(f32::default_tolerance(), DEFAULT_TOLERANCE_F32);
        assert_eq!(f64::default_tolerance(), DEFAULT_TOLERANCE_F64);
    }

    #[test]
    fn ordered_wrapper_treats_nan_as_equal() {
        assert_eq!(f64::NAN.ordered(), f64::NAN.ordered());
        assert!(1.0_f64.ordered() < 2.0_f64.ordered());
    }

    #[test]
    fn validation_error_message_names_the_coordinate() {
        let err = CoordinateValidationError::InvalidCoordinate {
            coordinate_index: 2,
            coordinate_value: "NaN".to_string(),
            dimension: 3,
        };
        assert!(err.to_string().contains("index 2"));
    }
}
