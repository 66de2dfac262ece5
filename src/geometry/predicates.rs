//! Geometric predicates used by the hull and the power diagram.
//!
//! Inputs are plain [`Point<f64, 3>`] positions taken from mesh vertices.
//! Small dense linear algebra goes through `nalgebra`.

use crate::geometry::point::Point;
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

/// Represents the orientation of a point with respect to an oriented triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The point lies behind the triangle (signed volume < 0)
    NEGATIVE,
    /// The point lies on the triangle's plane (within tolerance)
    DEGENERATE,
    /// The point lies in front of the triangle (signed volume > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Errors from circumcenter computation.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum CircumcenterError {
    /// The three points are collinear, so no unique circle passes through them.
    #[error("Degenerate triangle: points are collinear (determinant {determinant})")]
    DegenerateTriangle {
        /// Determinant of the 2×2 system.
        determinant: f64,
    },
}

#[inline]
fn vector(p: &Point<f64, 3>) -> Vector3<f64> {
    Vector3::from(p.to_array())
}

/// Signed volume of the tetrahedron spanned by the oriented triangle
/// `(v0, v1, v2)` and the point `p`.
///
/// Computed as `((v1 - v0) × (v2 - v1)) · (p - v0) / 6`. The value is
/// positive when `p` lies on the side the triangle's right-handed normal
/// points to.
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::point::Point;
/// use dartmesh::geometry::predicates::signed_volume;
///
/// let v0 = Point::new([0.0, 0.0, 0.0]);
/// let v1 = Point::new([1.0, 0.0, 0.0]);
/// let v2 = Point::new([0.0, 1.0, 0.0]);
/// let above = Point::new([0.0, 0.0, 1.0]);
/// assert!((signed_volume(&v0, &v1, &v2, &above) - 1.0 / 6.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn signed_volume(
    v0: &Point<f64, 3>,
    v1: &Point<f64, 3>,
    v2: &Point<f64, 3>,
    p: &Point<f64, 3>,
) -> f64 {
    let a = vector(v0);
    let b = vector(v1);
    let c = vector(v2);
    let m = Matrix3::from_rows(&[
        (b - a).transpose(),
        (c - b).transpose(),
        (vector(p) - a).transpose(),
    ]);
    m.determinant() / 6.0
}

/// Classifies `p` against the oriented triangle `(v0, v1, v2)`.
///
/// Volumes with magnitude at most `tolerance` are reported as
/// [`Orientation::DEGENERATE`]. A tolerance of `0.0` keeps exact sign
/// semantics.
#[must_use]
pub fn orientation(
    v0: &Point<f64, 3>,
    v1: &Point<f64, 3>,
    v2: &Point<f64, 3>,
    p: &Point<f64, 3>,
    tolerance: f64,
) -> Orientation {
    let volume = signed_volume(v0, v1, v2, p);
    if volume > tolerance {
        Orientation::POSITIVE
    } else if volume < -tolerance {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Unit normal `(p1 - p0) × (p2 - p0)` of a triangle, or `None` if the
/// triangle has zero area.
#[must_use]
pub fn triangle_normal(
    p0: &Point<f64, 3>,
    p1: &Point<f64, 3>,
    p2: &Point<f64, 3>,
) -> Option<Point<f64, 3>> {
    (*p1 - *p0).cross(&(*p2 - *p0)).normalized()
}

/// Circumcenter of the planar triangle `(a, b, c)`, using only the `x` and `y`
/// coordinates.
///
/// # Errors
///
/// Returns [`CircumcenterError::DegenerateTriangle`] when the points are
/// collinear.
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::predicates::circumcenter_2d;
///
/// let center = circumcenter_2d([0.0, 0.0], [2.0, 0.0], [0.0, 2.0]).unwrap();
/// assert!((center[0] - 1.0).abs() < 1e-12);
/// assert!((center[1] - 1.0).abs() < 1e-12);
/// ```
pub fn circumcenter_2d(
    a: [f64; 2],
    b: [f64; 2],
    c: [f64; 2],
) -> Result<[f64; 2], CircumcenterError> {
    let ab = Vector2::new(b[0] - a[0], b[1] - a[1]);
    let ac = Vector2::new(c[0] - a[0], c[1] - a[1]);
    let m = Matrix2::new(ab.x, ab.y, ac.x, ac.y);
    let determinant = m.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(CircumcenterError::DegenerateTriangle { determinant });
    }
    let rhs = Vector2::new(ab.norm_squared() / 2.0, ac.norm_squared() / 2.0);
    let offset = m
        .lu()
        .solve(&rhs)
        .ok_or(CircumcenterError::DegenerateTriangle { determinant })?;
    Ok([a[0] + offset.x, a[1] + offset.y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point<f64, 3> {
        Point::new([x, y, z])
    }

    // =========================================================================
    // ORIENTATION
    // =========================================================================

    #[test]
    fn signed_volume_sign_follows_winding() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let above = p(0.2, 0.2, 1.0);
        assert!(signed_volume(&a, &b, &c, &above) > 0.0);
        assert!(signed_volume(&a, &c, &b, &above) < 0.0);
        assert_relative_eq!(signed_volume(&a, &b, &c, &p(0.3, 0.3, 0.0)), 0.0);
    }

    #[test]
    fn orientation_respects_tolerance() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let nearly = p(0.1, 0.1, 1e-9);
        assert_eq!(orientation(&a, &b, &c, &nearly, 0.0), Orientation::POSITIVE);
        assert_eq!(
            orientation(&a, &b, &c, &nearly, 1e-6),
            Orientation::DEGENERATE
        );
        assert_eq!(
            orientation(&a, &b, &c, &p(0.0, 0.0, -1.0), 0.0),
            Orientation::NEGATIVE
        );
        assert_eq!(Orientation::POSITIVE.to_string(), "POSITIVE");
    }

    // =========================================================================
    // NORMALS AND CIRCUMCENTERS
    // =========================================================================

    #[test]
    fn triangle_normal_is_unit_and_right_handed() {
        let n = triangle_normal(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &p(0.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(n.coords()[2], 1.0);
        assert_relative_eq!(n.norm(), 1.0);
        assert!(triangle_normal(&p(0.0, 0.0, 0.0), &p(1.0, 1.0, 1.0), &p(2.0, 2.0, 2.0)).is_none());
    }

    #[test]
    fn circumcenter_is_equidistant() {
        let (a, b, c) = ([0.3, -1.0], [2.0, 0.5], [-0.7, 1.9]);
        let center = circumcenter_2d(a, b, c).unwrap();
        let dist = |q: [f64; 2]| (q[0] - center[0]).hypot(q[1] - center[1]);
        assert_relative_eq!(dist(a), dist(b), epsilon = 1e-12);
        assert_relative_eq!(dist(a), dist(c), epsilon = 1e-12);
    }

    #[test]
    fn circumcenter_rejects_collinear_points() {
        let err = circumcenter_2d([0.0, 0.0], [1.0, 1.0], [2.0, 2.0]).unwrap_err();
        assert!(matches!(err, CircumcenterError::DegenerateTriangle { .. }));
    }
}
