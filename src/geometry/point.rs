//! Positions attached to mesh vertices.
//!
//! # Floating-Point Equality
//!
//! `Point` equality and hashing go through [`ordered_float::OrderedFloat`], so
//! `NaN == NaN` holds for points and they can be used as hash keys. Compare the
//! raw coordinates when IEEE 754 semantics are required.

use crate::geometry::traits::coordinate::{CoordinateScalar, CoordinateValidationError};
use serde::de::{Error, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Add, Sub};
use num_traits::Float;

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point in `D`-dimensional space with coordinates of type `T`.
///
/// Meshes store vertex positions as `Point<f64, 3>`; planar inputs carry
/// `z = 0`. Coordinates are private so a point is immutable once built.
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::point::Point;
///
/// let a = Point::new([0.0, 0.0, 0.0]);
/// let b = Point::new([3.0, 4.0, 0.0]);
/// assert_eq!(a.distance(&b), 5.0);
/// assert_eq!(b.coords(), &[3.0, 4.0, 0.0]);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Point<T, const D: usize>
where
    T: CoordinateScalar,
{
    coords: [T; D],
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<T, const D: usize> Point<T, D>
where
    T: CoordinateScalar,
{
    /// Creates a point from its coordinate array.
    #[inline]
    #[must_use]
    pub const fn new(coords: [T; D]) -> Self {
        Self { coords }
    }

    /// Returns the coordinates without copying.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[T; D] {
        &self.coords
    }

    /// Returns an owned copy of the coordinates.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [T; D] {
        self.coords
    }

    /// Returns the coordinate at `index`, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.coords.get(index).copied()
    }

    /// Checks that every coordinate is finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateValidationError::InvalidCoordinate`] for the first
    /// NaN or infinite coordinate.
    pub fn validate(&self) -> Result<(), CoordinateValidationError> {
        for (index, coord) in self.coords.iter().enumerate() {
            if !Float::is_finite(*coord) {
                return Err(CoordinateValidationError::InvalidCoordinate {
                    coordinate_index: index,
                    coordinate_value: format!("{coord:?}"),
                    dimension: D,
                });
            }
        }
        Ok(())
    }

    /// Returns `true` if every coordinate is finite.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Multiplies every coordinate by `factor`.
    #[must_use]
    pub fn scale(&self, factor: T) -> Self {
        Self::new(self.coords.map(|c| c * factor))
    }

    /// Dot product with `other`, treating both points as vectors.
    #[must_use]
    pub fn dot(&self, other: &Self) -> T {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
    }

    /// Euclidean norm of the position vector.
    #[must_use]
    pub fn norm(&self) -> T {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> T {
        (*self - *other).norm()
    }

    /// Returns the unit vector in the same direction, or `None` for a zero vector.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let n = self.norm();
        if n > T::zero() && Float::is_finite(n) {
            Some(self.scale(Float::recip(n)))
        } else {
            None
        }
    }
}

impl<T> Point<T, 3>
where
    T: CoordinateScalar,
{
    /// Cross product, treating both points as vectors.
    ///
    /// ```rust
    /// use dartmesh::geometry::point::Point;
    ///
    /// let x = Point::new([1.0, 0.0, 0.0]);
    /// let y = Point::new([0.0, 1.0, 0.0]);
    /// assert_eq!(x.cross(&y), Point::new([0.0, 0.0, 1.0]));
    /// ```
    #[must_use]
    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az] = self.coords;
        let [bx, by, bz] = other.coords;
        Self::new([ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx])
    }
}

// =============================================================================
// ARITHMETIC
// =============================================================================

impl<T, const D: usize> Sub for Point<T, D>
where
    T: CoordinateScalar,
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut out = self.coords;
        for (o, r) in out.iter_mut().zip(rhs.coords) {
            *o = *o - r;
        }
        Self::new(out)
    }
}

impl<T, const D: usize> Add for Point<T, D>
where
    T: CoordinateScalar,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut out = self.coords;
        for (o, r) in out.iter_mut().zip(rhs.coords) {
            *o = *o + r;
        }
        Self::new(out)
    }
}

// =============================================================================
// STANDARD TRAIT IMPLEMENTATIONS
// =============================================================================

impl<T, const D: usize> Hash for Point<T, D>
where
    T: CoordinateScalar,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &coord in &self.coords {
            coord.ordered().hash(state);
        }
    }
}

impl<T, const D: usize> PartialEq for Point<T, D>
where
    T: CoordinateScalar,
{
    fn eq(&self, other: &Self) -> bool {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .all(|(&a, &b)| a.ordered() == b.ordered())
    }
}

impl<T, const D: usize> Eq for Point<T, D> where T: CoordinateScalar {}

// Lexicographic, with the total order of `OrderedFloat` per coordinate.
impl<T, const D: usize> PartialOrd for Point<T, D>
where
    T: CoordinateScalar,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        for (&a, &b) in self.coords.iter().zip(other.coords.iter()) {
            match a.ordered().cmp(&b.ordered()) {
                Ordering::Equal => {}
                ordering => return Some(ordering),
            }
        }
        Some(Ordering::Equal)
    }
}

impl<T, const D: usize> Default for Point<T, D>
where
    T: CoordinateScalar,
{
    fn default() -> Self {
        Self {
            coords: [T::default(); D],
        }
    }
}

impl<T, const D: usize> From<[T; D]> for Point<T, D>
where
    T: CoordinateScalar,
{
    #[inline]
    fn from(coords: [T; D]) -> Self {
        Self::new(coords)
    }
}

impl<T, const D: usize> From<Point<T, D>> for [T; D]
where
    T: CoordinateScalar,
{
    #[inline]
    fn from(point: Point<T, D>) -> [T; D] {
        point.coords
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

// Non-finite values are written as `null` (NaN) or "Infinity"/"-Infinity".
impl<T, const D: usize> Serialize for Point<T, D>
where
    T: CoordinateScalar,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(D)?;
        for coord in &self.coords {
            if Float::is_finite(*coord) {
                tuple.serialize_element(coord)?;
            } else if Float::is_infinite(*coord) {
                let repr = if Float::is_sign_positive(*coord) {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                tuple.serialize_element(repr)?;
            } else {
                tuple.serialize_element(&Option::<T>::None)?;
            }
        }
        tuple.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordRepr<T> {
    Num(T),
    Str(String),
    Null,
}

impl<'de, T, const D: usize> Deserialize<'de> for Point<T, D>
where
    T: CoordinateScalar,
{
    fn deserialize<DE>(deserializer: DE) -> Result<Self, DE::Error>
    where
        DE: serde::Deserializer<'de>,
    {
        struct ArrayVisitor<T, const D: usize>(PhantomData<T>);

        impl<'de, T, const D: usize> Visitor<'de> for ArrayVisitor<T, D>
        where
            T: CoordinateScalar,
        {
            type Value = Point<T, D>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "an array of {D} coordinates (numbers, null, \"Infinity\" or \"-Infinity\")"
                )
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut coords = [T::zero(); D];
                for (i, slot) in coords.iter_mut().enumerate() {
                    let element: CoordRepr<T> = seq
                        .next_element()?
                        .ok_or_else(|| Error::invalid_length(i, &self))?;
                    *slot = match element {
                        CoordRepr::Num(value) => value,
                        CoordRepr::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                            "infinity" | "inf" => <T as Float>::infinity(),
                            "-infinity" | "-inf" => <T as Float>::neg_infinity(),
                            "nan" => <T as Float>::nan(),
                            _ => return Err(Error::custom(format!("Unknown special value: {s}"))),
                        },
                        CoordRepr::Null => <T as Float>::nan(),
                    };
                }
                Ok(Point::new(coords))
            }
        }

        deserializer.deserialize_tuple(D, ArrayVisitor(PhantomData))
    }
}
