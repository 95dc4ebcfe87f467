use crate::error::Result;
use crate::math::{Point3, Vector3, TOLERANCE};

/// A line defined by an origin point and a unit direction vector.
///
/// The parametric form is `P(t) = origin + t * direction`. A line is
/// infinite by default; [`with_min_abscissa`](Line::with_min_abscissa)
/// restricts it to the semi-finite range `t >= min_abscissa` (a ray).
#[derive(Debug, Clone)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
    min_abscissa: Option<f64>,
}

impl Line {
    /// Creates a new infinite line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(crate::error::GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
            min_abscissa: None,
        })
    }

    /// Creates a semi-finite ray starting at `origin` (minimum abscissa 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn ray(origin: Point3, direction: Vector3) -> Result<Self> {
        Ok(Self::new(origin, direction)?.with_min_abscissa(0.0))
    }

    /// Creates a ray from `from` through `to`, starting at `from`.
    ///
    /// The abscissa of `to` is `(to - from).norm()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the two points coincide.
    pub fn through_points(from: Point3, to: Point3) -> Result<Self> {
        Self::ray(from, to - from)
    }

    /// Restricts the line to abscissas `t >= min_abscissa`.
    #[must_use]
    pub fn with_min_abscissa(mut self, min_abscissa: f64) -> Self {
        self.min_abscissa = Some(min_abscissa);
        self
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Returns the minimum usable abscissa, if the line is semi-finite.
    #[must_use]
    pub fn min_abscissa(&self) -> Option<f64> {
        self.min_abscissa
    }

    /// Evaluates the line at abscissa `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Abscissa of the orthogonal projection of `p` onto the line.
    #[must_use]
    pub fn abscissa_of(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Whether abscissa `t` lies in the line's usable range.
    #[must_use]
    pub fn contains_abscissa(&self, t: f64) -> bool {
        self.min_abscissa.is_none_or(|m| t >= m - TOLERANCE)
    }

    /// Euclidean distance from `p` to the (possibly clipped) line.
    #[must_use]
    pub fn distance_to_point(&self, p: &Point3) -> f64 {
        let mut t = self.abscissa_of(p);
        if let Some(m) = self.min_abscissa {
            t = t.max(m);
        }
        (p - self.point_at(t)).norm()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    #[test]
    fn direction_is_normalized() {
        let line = Line::new(p(0.0, 0.0, 0.0), v(0.0, 3.0, 0.0)).unwrap();
        assert!((line.direction().norm() - 1.0).abs() < TOLERANCE);
        assert!((line.point_at(2.0) - p(0.0, 2.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Line::new(p(0.0, 0.0, 0.0), v(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn abscissa_roundtrip() {
        let line = Line::new(p(1.0, 0.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();
        let q = line.point_at(7.5);
        assert!((line.abscissa_of(&q) - 7.5).abs() < TOLERANCE);
    }

    #[test]
    fn ray_excludes_negative_abscissas() {
        let ray = Line::ray(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!(ray.contains_abscissa(0.0));
        assert!(ray.contains_abscissa(5.0));
        assert!(!ray.contains_abscissa(-1.0));
    }

    #[test]
    fn clipped_distance_uses_start_point() {
        let ray = Line::ray(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        // Projection falls at t = -3, clamped to the ray start.
        assert!((ray.distance_to_point(&p(-3.0, 4.0, 0.0)) - 5.0).abs() < TOLERANCE);
        // Unclipped line projects freely.
        let line = Line::new(p(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0)).unwrap();
        assert!((line.distance_to_point(&p(-3.0, 4.0, 0.0)) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn through_points_measures_target() {
        let ray = Line::through_points(p(0.0, 0.0, 0.0), p(0.0, 0.0, 10.0)).unwrap();
        assert!((ray.abscissa_of(&p(0.0, 0.0, 10.0)) - 10.0).abs() < TOLERANCE);
        assert_eq!(ray.min_abscissa(), Some(0.0));
    }
}
