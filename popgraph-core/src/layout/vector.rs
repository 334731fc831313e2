//! Minimal vector maths shared by the 2D and 3D layouts.

use std::{
    f64::consts::TAU,
    fmt::Debug,
    ops::{Add, Mul, Sub},
};

use rand::Rng;
use serde::Serialize;

/// Golden angle in radians; successive spiral points never line up.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Vector operations the relaxation needs, implemented for [`Vec2`] and
/// [`Vec3`].
pub trait Vector:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + 'static
{
    /// Number of spatial dimensions.
    const DIM: usize;

    /// Scalar product.
    fn dot(self, other: Self) -> f64;

    /// Euclidean length.
    fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Uniformly distributed unit vector.
    fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Point `index` of `count` on a space-filling spiral (2D) or shell of
    /// Fibonacci spheres (3D), rotated by `phase`.
    fn spiral(index: usize, count: usize, phase: f64) -> Self;
}

/// Planar position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Creates a vector from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Vector for Vec2 {
    const DIM: usize = 2;

    fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        Self::new(angle.cos(), angle.sin())
    }

    fn spiral(index: usize, _count: usize, phase: f64) -> Self {
        let radius = (index as f64).sqrt();
        let angle = index as f64 * GOLDEN_ANGLE + phase;
        Self::new(radius * angle.cos(), radius * angle.sin())
    }
}

/// Spatial position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec3 {
    /// First coordinate.
    pub x: f64,
    /// Second coordinate.
    pub y: f64,
    /// Third coordinate.
    pub z: f64,
}

impl Vec3 {
    /// Creates a vector from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Vector for Vec3 {
    const DIM: usize = 3;

    fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let z: f64 = rng.gen_range(-1.0..=1.0);
        let angle = rng.gen_range(0.0..TAU);
        let ring = (1.0 - z * z).max(0.0).sqrt();
        Self::new(ring * angle.cos(), ring * angle.sin(), z)
    }

    fn spiral(index: usize, count: usize, phase: f64) -> Self {
        let count = count.max(1) as f64;
        let height = 1.0 - 2.0 * (index as f64 + 0.5) / count;
        let ring = (1.0 - height * height).max(0.0).sqrt();
        let angle = index as f64 * GOLDEN_ANGLE + phase;
        let radius = (index as f64).cbrt();
        Self::new(ring * angle.cos(), ring * angle.sin(), height) * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn random_units_have_unit_length() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..32 {
            assert!((Vec2::random_unit(&mut rng).length() - 1.0).abs() < 1e-12);
            assert!((Vec3::random_unit(&mut rng).length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn spiral_starts_at_origin_and_spreads() {
        assert_eq!(Vec2::spiral(0, 10, 0.3), Vec2::default());
        assert_eq!(Vec3::spiral(0, 10, 0.3).length(), 0.0);
        let far = Vec2::spiral(9, 10, 0.0).length();
        assert!((far - 3.0).abs() < 1e-12);
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vec3::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vec3::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.dot(b), 4.5);
    }
}
