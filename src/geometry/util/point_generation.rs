//! Random point generation for hull and power-diagram inputs.
//!
//! Every sampler takes an explicit [`rand::Rng`], so callers control
//! reproducibility. The `_seeded` variants build a [`StdRng`] from a `u64`.

use rand::distr::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Errors that can occur during random point generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum RandomPointGenerationError {
    /// The coordinate range is empty or inverted.
    #[error("Invalid coordinate range: minimum {min} must be less than maximum {max}")]
    InvalidRange {
        /// The minimum value of the range.
        min: String,
        /// The maximum value of the range.
        max: String,
    },
}

/// Samples one point uniformly from the closed unit ball.
///
/// Uses `r = cbrt(u)`, `phi = acos(2v - 1)`, `theta = 2πw` so that the
/// density is uniform in volume rather than clustered at the center.
pub fn random_point_in_ball<R: Rng + ?Sized>(rng: &mut R) -> Point<f64, 3> {
    let r = rng.random::<f64>().cbrt();
    let phi = 2.0_f64.mul_add(rng.random::<f64>(), -1.0).acos();
    let theta = TAU * rng.random::<f64>();
    Point::new([
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    ])
}

/// Samples one point uniformly from the closed unit disk, with `z = 0`.
pub fn random_point_in_disk<R: Rng + ?Sized>(rng: &mut R) -> Point<f64, 3> {
    let r = rng.random::<f64>().sqrt();
    let angle = TAU * rng.random::<f64>();
    Point::new([r * angle.cos(), r * angle.sin(), 0.0])
}

/// Samples `n` points uniformly from the unit ball.
pub fn random_points_in_ball<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Point<f64, 3>> {
    (0..n).map(|_| random_point_in_ball(rng)).collect()
}

/// Samples `n` points uniformly from the unit disk.
pub fn random_points_in_disk<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Point<f64, 3>> {
    (0..n).map(|_| random_point_in_disk(rng)).collect()
}

/// Reproducible variant of [`random_points_in_ball`].
///
/// # Examples
///
/// ```rust
/// use dartmesh::geometry::util::random_points_in_ball_seeded;
///
/// let a = random_points_in_ball_seeded(20, 7);
/// let b = random_points_in_ball_seeded(20, 7);
/// assert_eq!(a, b);
/// assert!(a.iter().all(|p| p.norm() <= 1.0));
/// ```
#[must_use]
pub fn random_points_in_ball_seeded(n: usize, seed: u64) -> Vec<Point<f64, 3>> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_points_in_ball(n, &mut rng)
}

/// Reproducible variant of [`random_points_in_disk`].
#[must_use]
pub fn random_points_in_disk_seeded(n: usize, seed: u64) -> Vec<Point<f64, 3>> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_points_in_disk(n, &mut rng)
}

/// Generate random points in an axis-aligned box with a seeded RNG.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidRange` if min >= max
///
/// # Examples
///
/// ```
/// use dartmesh::geometry::util::generate_random_points_seeded;
///
/// let points1 = generate_random_points_seeded::<f64, 3>(100, (-5.0, 5.0), 42).unwrap();
/// let points2 = generate_random_points_seeded::<f64, 3>(100, (-5.0, 5.0), 42).unwrap();
/// assert_eq!(points1, points2);
///
/// assert!(generate_random_points_seeded::<f64, 2>(10, (1.0, -1.0), 42).is_err());
/// ```
pub fn generate_random_points_seeded<T: CoordinateScalar + SampleUniform, const D: usize>(
    n_points: usize,
    range: (T, T),
    seed: u64,
) -> Result<Vec<Point<T, D>>, RandomPointGenerationError> {
    if range.0 >= range.1 {
        return Err(RandomPointGenerationError::InvalidRange {
            min: format!("{:?}", range.0),
            max: format!("{:?}", range.1),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(n_points);
    for _ in 0..n_points {
        let coords = [T::zero(); D].map(|_| rng.random_range(range.0..range.1));
        points.push(Point::new(coords));
    }
    Ok(points)
}
