use crate::body::BodyShape;
use crate::error::{QueryError, Result};
use crate::geometry::FitReport;
use crate::math::{Point3, TOLERANCE};

/// A controlled, signed geometric offset applied to a whole body shape.
///
/// Each variant carries its own validation rule and vertex transform; both
/// displace every vertex along its own radial (origin-relative) direction.
#[derive(Debug, Clone, Copy)]
pub enum Margin {
    /// Add this (signed) distance to every vertex norm.
    Distance(f64),
    /// Multiply every vertex position by this (positive) factor.
    ScaleFactor(f64),
}

impl Margin {
    /// Checks the margin against the body it would be applied to.
    fn validate(&self, body: &BodyShape) -> Result<()> {
        match *self {
            Margin::Distance(value) => {
                if body.min_norm() < TOLERANCE {
                    return Err(QueryError::InvalidMargin(
                        "distance margin needs a radial direction at every vertex, \
                         but a vertex sits at the origin"
                            .into(),
                    )
                    .into());
                }
                // Equality collapses the closest vertex onto the origin and
                // degenerates its facets.
                if body.min_norm() + value <= TOLERANCE {
                    return Err(QueryError::InvalidMargin(format!(
                        "distance margin {value} collapses the body (minimum vertex norm {})",
                        body.min_norm()
                    ))
                    .into());
                }
                Ok(())
            }
            Margin::ScaleFactor(value) => {
                if value <= 0.0 {
                    return Err(QueryError::InvalidMargin(format!(
                        "scale factor must be positive, got {value}"
                    ))
                    .into());
                }
                Ok(())
            }
        }
    }

    /// Displaces one vertex position.
    fn apply(&self, position: &Point3) -> Point3 {
        match *self {
            Margin::Distance(value) => {
                let norm = position.coords.norm();
                Point3::from(position.coords * ((norm + value) / norm))
            }
            Margin::ScaleFactor(value) => Point3::from(position.coords * value),
        }
    }
}

/// Produces a new body shape with every vertex displaced along its radial
/// direction by a margin. The source shape is untouched.
///
/// A scale factor rescales the fitted reference ellipsoid exactly
/// (flattening preserved); a distance margin changes the shape
/// non-uniformly, so the returned body refits its reference surfaces.
pub struct Resize {
    margin: Margin,
}

impl Resize {
    /// Creates a new `Resize` operation.
    #[must_use]
    pub fn new(margin: Margin) -> Self {
        Self { margin }
    }

    /// Executes the resize, returning a new, independent body shape.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidMargin`] for a destructive distance
    /// margin (`-value >= min_norm`) or a non-positive scale factor.
    pub fn execute(&self, body: &BodyShape) -> Result<BodyShape> {
        self.margin.validate(body)?;

        let (positions, facets) = body.raw();
        let displaced: Vec<Point3> = positions.iter().map(|p| self.margin.apply(p)).collect();

        let fit = match self.margin {
            Margin::ScaleFactor(value) => {
                let fitted = body.fitted_ellipsoid();
                Some(FitReport {
                    equatorial_radius: fitted.equatorial_radius() * value,
                    flattening: fitted.flattening(),
                    converged: true,
                    iterations: 0,
                })
            }
            Margin::Distance(_) => None,
        };

        BodyShape::build(displaced, facets, fit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::uv_sphere;

    const RADIUS: f64 = 10_000.0;

    #[test]
    fn distance_margin_shifts_every_norm() {
        let body = uv_sphere(RADIUS, 8, 16);
        let grown = Resize::new(Margin::Distance(250.0)).execute(&body).unwrap();

        assert_eq!(grown.vertex_count(), body.vertex_count());
        assert_eq!(grown.triangle_count(), body.triangle_count());
        for (_, vertex) in grown.vertices() {
            assert!((vertex.position.coords.norm() - (RADIUS + 250.0)).abs() < 1e-6);
        }
        // The source is untouched.
        assert!((body.max_norm() - RADIUS).abs() < 1e-6);
    }

    #[test]
    fn distance_margin_roundtrips() {
        let body = uv_sphere(RADIUS, 8, 16);
        let there = Resize::new(Margin::Distance(300.0)).execute(&body).unwrap();
        let back = Resize::new(Margin::Distance(-300.0)).execute(&there).unwrap();

        for ((_, original), (_, restored)) in body.vertices().zip(back.vertices()) {
            assert_eq!(original.id, restored.id);
            assert!((original.position - restored.position).norm() < 1e-6);
        }
    }

    #[test]
    fn scale_factor_scales_norms_exactly() {
        let body = uv_sphere(RADIUS, 8, 16);
        let scaled = Resize::new(Margin::ScaleFactor(2.5)).execute(&body).unwrap();

        for ((_, original), (_, scaled)) in body.vertices().zip(scaled.vertices()) {
            assert!(
                (scaled.position.coords.norm() - 2.5 * original.position.coords.norm()).abs()
                    < 1e-6
            );
        }
    }

    #[test]
    fn scale_factor_rescales_reference_ellipsoids() {
        let body = uv_sphere(RADIUS, 8, 16);
        let scaled = Resize::new(Margin::ScaleFactor(3.0)).execute(&body).unwrap();

        let before = body.fitted_ellipsoid();
        let after = scaled.fitted_ellipsoid();
        assert!(
            (after.equatorial_radius() - 3.0 * before.equatorial_radius()).abs() < 1e-6
        );
        assert!((after.flattening() - before.flattening()).abs() < TOLERANCE);
        assert!((scaled.outer_sphere().equatorial_radius()
            - 3.0 * body.outer_sphere().equatorial_radius())
        .abs()
            < 1e-6);
    }

    #[test]
    fn destructive_distance_margin_is_rejected() {
        let body = uv_sphere(RADIUS, 8, 16);
        let result = Resize::new(Margin::Distance(-1.5 * RADIUS)).execute(&body);
        assert!(matches!(
            result,
            Err(crate::RegolithError::Query(QueryError::InvalidMargin(_)))
        ));
        // Exactly collapsing the closest vertex is also rejected.
        assert!(Resize::new(Margin::Distance(-RADIUS)).execute(&body).is_err());
    }

    #[test]
    fn non_positive_scale_factor_is_rejected() {
        let body = uv_sphere(RADIUS, 8, 16);
        assert!(Resize::new(Margin::ScaleFactor(0.0)).execute(&body).is_err());
        assert!(Resize::new(Margin::ScaleFactor(-2.0)).execute(&body).is_err());
    }

    #[test]
    fn shrinking_within_bounds_is_allowed() {
        let body = uv_sphere(RADIUS, 8, 16);
        let shrunk = Resize::new(Margin::Distance(-0.5 * RADIUS)).execute(&body).unwrap();
        assert!((shrunk.min_norm() - 0.5 * RADIUS).abs() < 1e-6);
    }
}
