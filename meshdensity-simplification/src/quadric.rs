//! Plane quadrics
//!
//! A quadric stores `E(v) = vᵀAv + 2bᵀv + c`, the sum of squared distances
//! from `v` to a set of planes. For a plane `n·v + d = 0` with unit `n` the
//! terms are `A = nnᵀ`, `b = d·n` and `c = d²`.

use meshdensity_core::{Point3d, Vector3d};
use nalgebra::Matrix3;
use std::ops::{Add, AddAssign};

/// Below this `|det(A)| / ‖A‖³` the minimiser is considered undefined.
const SINGULAR_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadric {
    pub a: Matrix3<f64>,
    pub b: Vector3d,
    pub c: f64,
}

impl Default for Quadric {
    fn default() -> Self {
        Self {
            a: Matrix3::zeros(),
            b: Vector3d::zeros(),
            c: 0.0,
        }
    }
}

impl Quadric {
    /// Quadric of the plane `normal · v + offset = 0`. `normal` must be unit length.
    pub fn from_plane(normal: &Vector3d, offset: f64) -> Self {
        Self {
            a: normal * normal.transpose(),
            b: normal * offset,
            c: offset * offset,
        }
    }

    /// Quadric of the plane through a triangle, or `None` for a degenerate one.
    pub fn from_triangle(p0: &Point3d, p1: &Point3d, p2: &Point3d) -> Option<Self> {
        let normal = (p1 - p0).cross(&(p2 - p0)).try_normalize(f64::EPSILON)?;
        Some(Self::from_plane(&normal, -normal.dot(&p0.coords)))
    }

    /// Squared-distance error at `v`, clamped at zero against rounding.
    pub fn evaluate(&self, v: &Point3d) -> f64 {
        let p = &v.coords;
        (p.dot(&(self.a * p)) + 2.0 * self.b.dot(p) + self.c).max(0.0)
    }

    /// Point minimising the error, solving `A v = -b`. `None` when `A` is
    /// (numerically) singular, e.g. all planes parallel or sharing a line.
    pub fn minimizer(&self) -> Option<Point3d> {
        let scale = self.a.norm();
        if scale <= 0.0 || self.a.determinant().abs() <= SINGULAR_TOLERANCE * scale.powi(3) {
            return None;
        }
        let inverse = self.a.try_inverse()?;
        let v = -(inverse * self.b);
        v.iter().all(|x| x.is_finite()).then(|| Point3d::from(v))
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, other: Self) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn axis_planes_through(p: &Point3d) -> Quadric {
        Quadric::from_plane(&Vector3d::x(), -p.x)
            + Quadric::from_plane(&Vector3d::y(), -p.y)
            + Quadric::from_plane(&Vector3d::z(), -p.z)
    }

    #[test]
    fn test_plane_distance() {
        let q = Quadric::from_plane(&Vector3d::z(), -2.0);
        assert_relative_eq!(q.evaluate(&Point3d::new(5.0, -3.0, 2.0)), 0.0);
        assert_relative_eq!(q.evaluate(&Point3d::new(0.0, 0.0, 5.0)), 9.0);
    }

    #[test]
    fn test_triangle_quadric_vanishes_on_plane() {
        let q = Quadric::from_triangle(
            &Point3d::new(0.0, 0.0, 1.0),
            &Point3d::new(1.0, 0.0, 1.0),
            &Point3d::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(q.evaluate(&Point3d::new(7.0, 7.0, 1.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.evaluate(&Point3d::new(0.0, 0.0, 3.0)), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_triangle_has_no_quadric() {
        let p = Point3d::new(1.0, 2.0, 3.0);
        assert!(Quadric::from_triangle(&p, &p, &Point3d::new(2.0, 4.0, 6.0)).is_none());
    }

    #[test]
    fn test_minimizer_of_three_planes_is_their_intersection() {
        let corner = Point3d::new(1.5, -2.0, 0.25);
        let q = axis_planes_through(&corner);
        let v = q.minimizer().unwrap();
        assert_relative_eq!(v, corner, epsilon = 1e-12);
        assert_relative_eq!(q.evaluate(&v), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coplanar_quadric_is_singular() {
        let q = Quadric::from_plane(&Vector3d::z(), 0.0) + Quadric::from_plane(&Vector3d::z(), 0.0);
        assert!(q.minimizer().is_none());
        assert!(Quadric::default().minimizer().is_none());
    }

    #[test]
    fn test_sum_accumulates_error() {
        let p = Point3d::new(0.0, 0.0, 0.0);
        let q = axis_planes_through(&Point3d::new(1.0, 1.0, 1.0));
        assert_relative_eq!(q.evaluate(&p), 3.0, epsilon = 1e-12);
    }
}
