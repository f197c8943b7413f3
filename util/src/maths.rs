//! Utility maths functions
//!
//! Scalar helpers are generic over `num_traits::Float`, the planar vector helpers work on
//! `nalgebra::Vector2<f64>` as used throughout the control code.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use num_traits::Float;

// ---------------------------------------------------------------------------
// SCALAR FUNCTIONS
// ---------------------------------------------------------------------------

/// Limit a value to the closed range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Sign of a value: `-1`, `0` or `+1`.
///
/// Unlike `f64::signum` a zero input gives a zero output.
pub fn sign<T>(value: T) -> T
where
    T: Float,
{
    if value > T::zero() {
        T::one()
    } else if value < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}

/// Round a value to the given number of decimal places.
pub fn round_dp(value: f64, decimal_places: i32) -> f64 {
    let scale = 10f64.powi(decimal_places);
    (value * scale).round() / scale
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into the range `[-pi, pi)`.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

// ---------------------------------------------------------------------------
// PLANAR VECTOR FUNCTIONS
// ---------------------------------------------------------------------------

/// Unit vector in the direction of `v`, or `None` if `v` has zero length.
pub fn unit2(v: &Vector2<f64>) -> Option<Vector2<f64>> {
    let norm = v.norm();
    if norm > 0.0 && norm.is_finite() {
        Some(v / norm)
    } else {
        None
    }
}

/// Angle of the vector to the positive X axis, in `[-pi, pi]`.
pub fn heading2(v: &Vector2<f64>) -> f64 {
    v[1].atan2(v[0])
}

/// Unit vector pointing along the given heading.
pub fn from_heading2(heading_rad: f64) -> Vector2<f64> {
    Vector2::new(heading_rad.cos(), heading_rad.sin())
}

/// Scalar projection of `point - origin` onto the unit direction `dir`.
pub fn project2(point: &Vector2<f64>, origin: &Vector2<f64>, dir: &Vector2<f64>) -> f64 {
    (point - origin).dot(dir)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_wrap_to_pi() {
        assert_approx_eq!(wrap_to_pi(0f64), 0f64);
        assert_approx_eq!(wrap_to_pi(PI / 2.0), PI / 2.0);
        assert_approx_eq!(wrap_to_pi(3.0 * PI / 2.0), -PI / 2.0);
        assert_approx_eq!(wrap_to_pi(-3.0 * PI / 2.0), PI / 2.0);
        assert_approx_eq!(wrap_to_pi(2.0 * PI + 0.25), 0.25);
        assert_approx_eq!(wrap_to_pi(-10.0 * PI - 0.25), -0.25);

        // The upper bound maps onto the lower one
        assert_approx_eq!(wrap_to_pi(PI), -PI);

        for i in -100..100 {
            let a = i as f64 * 0.37;
            let w = wrap_to_pi(a);
            assert!(w >= -PI && w < PI, "{} wrapped to {}", a, w);
            assert_approx_eq!(a.cos(), w.cos(), 1e-9);
            assert_approx_eq!(a.sin(), w.sin(), 1e-9);
        }
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.2f64), 1.0);
        assert_eq!(sign(-0.1f64), -1.0);
        assert_eq!(sign(0f64), 0.0);
        assert_eq!(sign(-0f64), 0.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.5f64, -0.3, 0.3), 0.3);
        assert_eq!(clamp(-0.5f64, -0.3, 0.3), -0.3);
        assert_eq!(clamp(0.1f64, -0.3, 0.3), 0.1);
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(0.123456, 3), 0.123);
        assert_eq!(round_dp(25.0, 3), 25.0);
        assert_eq!(round_dp(0.5555, 3), 0.556);
    }

    #[test]
    fn test_vectors() {
        assert!(unit2(&Vector2::new(0.0, 0.0)).is_none());

        let u = unit2(&Vector2::new(3.0, 4.0)).unwrap();
        assert_approx_eq!(u.norm(), 1.0);
        assert_approx_eq!(u[0], 0.6);

        assert_approx_eq!(heading2(&Vector2::new(0.0, 2.0)), PI / 2.0);
        assert_approx_eq!(heading2(&from_heading2(-2.0)), -2.0);

        let s = project2(
            &Vector2::new(2.0, 5.0),
            &Vector2::new(1.0, 1.0),
            &Vector2::new(1.0, 0.0),
        );
        assert_approx_eq!(s, 1.0);
    }
}
