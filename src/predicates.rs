//! Geometric predicates.
//!
//! The circumcircle and its containment test use the plain determinant formula together with
//! [`EPSILON`], which is also the tolerance of every point comparison in this crate.
//! Orientation and the strict incircle test used for validation are exact, via [robust].

use nalgebra::Vector2;
use robust::{incircle, orient2d, Coord};

use crate::utils::types::Vertex3;

/// Per-axis tolerance of point equality and the degeneracy bound of the circumcircle determinant.
pub const EPSILON: f64 = 1e-10;

/// Tolerant point equality, i.e. every axis differs by less than [`EPSILON`].
#[inline]
pub fn approx_eq(a: &Vertex3, b: &Vertex3) -> bool {
    (a[0] - b[0]).abs() < EPSILON && (a[1] - b[1]).abs() < EPSILON && (a[2] - b[2]).abs() < EPSILON
}

/// Tolerant equality of the xy-projections, with the same per-axis [`EPSILON`].
#[inline]
pub fn approx_eq_2d(a: &Vertex3, b: &Vertex3) -> bool {
    (a[0] - b[0]).abs() < EPSILON && (a[1] - b[1]).abs() < EPSILON
}

/// Normalize predicate result to sign: -1.0, 0.0, or 1.0 so that `==` compares signs.
#[inline]
fn sign_f64(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
fn coord2(p: &Vertex3) -> Coord<f64> {
    Coord { x: p[0], y: p[1] }
}

/// Exact orientation of `c` w.r.t. the directed line `a -> b` in the xy-plane.
///
/// `1.0` for counter-clockwise, `-1.0` for clockwise and `0.0` for collinear.
#[inline]
pub fn orient_2d(a: &Vertex3, b: &Vertex3, c: &Vertex3) -> f64 {
    sign_f64(orient2d(coord2(a), coord2(b), coord2(c)))
}

/// Exact incircle test: `1.0` iff `p` lies strictly inside the circle through the
/// counter-clockwise triangle `abc`, `0.0` if it is co-circular.
#[inline]
pub fn in_circle_2d(a: &Vertex3, b: &Vertex3, c: &Vertex3, p: &Vertex3) -> f64 {
    sign_f64(incircle(coord2(a), coord2(b), coord2(c), coord2(p)))
}

/// The circle through the three vertices of a non-degenerate triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumcircle {
    pub center: Vector2<f64>,
    pub radius_squared: f64,
}

impl Circumcircle {
    /// Check if `p` lies in the closed disc, i.e. co-circular points count as inside.
    #[inline]
    pub fn contains(&self, p: &Vertex3) -> bool {
        (Vector2::new(p[0], p[1]) - self.center).norm_squared() <= self.radius_squared
    }
}

/// Computes the circumcircle of `abc` in the xy-plane.
///
/// Returns `None` if the triangle is degenerate, i.e. the absolute determinant
/// `2 * ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax))` is below [`EPSILON`].
pub fn circumcircle(a: &Vertex3, b: &Vertex3, c: &Vertex3) -> Option<Circumcircle> {
    let origin = Vector2::new(a[0], a[1]);
    // relative to `a`, which keeps precision for large absolute coordinates
    let b = Vector2::new(b[0], b[1]) - origin;
    let c = Vector2::new(c[0], c[1]) - origin;

    let d = 2.0 * (b.x * c.y - b.y * c.x);
    if d.abs() < EPSILON {
        return None;
    }

    let b_sq = b.norm_squared();
    let c_sq = c.norm_squared();
    let offset = Vector2::new(c.y * b_sq - b.y * c_sq, b.x * c_sq - c.x * b_sq) / d;

    Some(Circumcircle {
        center: origin + offset,
        radius_squared: offset.norm_squared(),
    })
}

/// Checks if `p` lies inside or on `circle`.
///
/// A degenerate triangle has no circumcircle and never contains a point.
#[inline]
pub fn is_point_in_circumcircle(p: &Vertex3, circle: Option<&Circumcircle>) -> bool {
    circle.is_some_and(|circle| circle.contains(p))
}

/// A triangle given by the coordinates of its three vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex3; 3],
}

impl Triangle {
    pub const fn new(v0: Vertex3, v1: Vertex3, v2: Vertex3) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    pub fn circumcircle(&self) -> Option<Circumcircle> {
        let [a, b, c] = &self.vertices;
        circumcircle(a, b, c)
    }

    pub fn is_degenerate(&self) -> bool {
        self.circumcircle().is_none()
    }

    /// Tolerant vertex membership.
    pub fn contains_vertex(&self, p: &Vertex3) -> bool {
        self.vertices.iter().any(|v| approx_eq(v, p))
    }

    pub fn contains_any_vertex(&self, points: &[Vertex3]) -> bool {
        points.iter().any(|p| self.contains_vertex(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_is_per_axis() {
        let p = [1.0, 2.0, 3.0];

        assert!(approx_eq(&p, &[1.0 + 1e-11, 2.0 - 1e-11, 3.0]));
        assert!(!approx_eq(&p, &[1.0, 2.0, 3.0 + 1e-9]));
        assert!(!approx_eq(&p, &[1.0 + 2e-10, 2.0, 3.0]));

        assert!(approx_eq_2d(&p, &[1.0, 2.0, 3.0 + 1e-9]));
        assert!(!approx_eq_2d(&p, &[1.0, 2.0 + 1e-9, 3.0]));
    }

    #[test]
    fn test_circumcircle_right_triangle() {
        let circle = circumcircle(&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0], &[0.0, 2.0, 0.0]).unwrap();

        assert!((circle.center.x - 1.0).abs() < 1e-12);
        assert!((circle.center.y - 1.0).abs() < 1e-12);
        assert!((circle.radius_squared - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_circumcircle_ignores_elevation() {
        let flat = circumcircle(&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0], &[0.0, 2.0, 0.0]);
        let lifted = circumcircle(&[0.0, 0.0, 5.0], &[2.0, 0.0, -3.0], &[0.0, 2.0, 10.0]);

        assert_eq!(flat, lifted);
    }

    #[test]
    fn test_degenerate_triangle_contains_nothing() {
        let tri = Triangle::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);

        assert!(tri.is_degenerate());
        // the origin would be "inside" a zero circle at the origin
        assert!(!is_point_in_circumcircle(&[0.0, 0.0, 0.0], tri.circumcircle().as_ref()));
        assert!(!is_point_in_circumcircle(&[1.0, 0.0, 0.0], tri.circumcircle().as_ref()));
    }

    #[test]
    fn test_in_circumcircle_is_inclusive() {
        let tri = Triangle::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
        let circle = tri.circumcircle();

        assert!(is_point_in_circumcircle(&[0.5, 0.5, 0.0], circle.as_ref()));
        // co-circular 4th corner of the unit square
        assert!(is_point_in_circumcircle(&[0.0, 1.0, 0.0], circle.as_ref()));
        assert!(!is_point_in_circumcircle(&[2.0, 2.0, 0.0], circle.as_ref()));
    }

    #[test]
    fn test_exact_predicates() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];

        assert_eq!(orient_2d(&a, &b, &c), 1.0);
        assert_eq!(orient_2d(&a, &c, &b), -1.0);
        assert_eq!(orient_2d(&a, &b, &[2.0, 0.0, 0.0]), 0.0);

        assert_eq!(in_circle_2d(&a, &b, &c, &[0.4, 0.4, 0.0]), 1.0);
        assert_eq!(in_circle_2d(&a, &b, &c, &[1.0, 1.0, 0.0]), 0.0);
        assert_eq!(in_circle_2d(&a, &b, &c, &[3.0, 3.0, 0.0]), -1.0);
    }

    #[test]
    fn test_triangle_membership() {
        let tri = Triangle::new([0.0, 0.0, 1.0], [1.0, 0.0, 2.0], [0.0, 1.0, 3.0]);

        assert!(tri.contains_vertex(&[1.0, 0.0, 2.0 + 1e-12]));
        assert!(!tri.contains_vertex(&[1.0, 0.0, 0.0]));
        assert!(tri.contains_any_vertex(&[[5.0, 5.0, 5.0], [0.0, 1.0, 3.0]]));
        assert!(!tri.contains_any_vertex(&[[5.0, 5.0, 5.0]]));
    }
}
