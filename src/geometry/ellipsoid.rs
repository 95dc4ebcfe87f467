use crate::error::{GeometryError, Result};
use crate::math::{Point3, TOLERANCE};

/// Maximum iterations for the geodetic latitude fixed point.
const MAX_GEODETIC_ITERATIONS: usize = 16;

/// An ellipsoid of revolution about the body +Z axis, centered at the
/// origin of the working frame.
///
/// Defined by its equatorial radius `a` and flattening `f`; the polar
/// radius is `b = a * (1 - f)`. A flattening of 0 is a sphere; negative
/// flattening (prolate body) is accepted.
///
/// These are the smooth analytic companions of a triangulated body shape:
/// bounding spheres/ellipsoids used as cheap pre-filters, and the
/// least-squares fit exposed to callers as a coarse alternative shape.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceEllipsoid {
    equatorial_radius: f64,
    flattening: f64,
}

/// A point expressed in geodetic coordinates relative to a
/// [`ReferenceEllipsoid`]: latitude and longitude in radians, altitude in
/// the same unit as the ellipsoid radii, measured along the ellipsoid
/// normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPoint {
    /// Geodetic latitude, in `[-pi/2, pi/2]`.
    pub latitude: f64,
    /// Longitude, in `(-pi, pi]`.
    pub longitude: f64,
    /// Signed height above the ellipsoid surface.
    pub altitude: f64,
}

impl ReferenceEllipsoid {
    /// Creates a new reference ellipsoid.
    ///
    /// # Errors
    ///
    /// Returns an error if the equatorial radius is non-positive or the
    /// flattening is not below 1 (polar radius would vanish or flip).
    pub fn new(equatorial_radius: f64, flattening: f64) -> Result<Self> {
        if equatorial_radius < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "ellipsoid equatorial radius must be positive".into(),
            )
            .into());
        }
        if flattening >= 1.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "flattening",
                value: flattening,
                min: f64::NEG_INFINITY,
                max: 1.0,
            }
            .into());
        }
        Ok(Self {
            equatorial_radius,
            flattening,
        })
    }

    /// Creates a sphere (flattening 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn sphere(radius: f64) -> Result<Self> {
        Self::new(radius, 0.0)
    }

    /// Returns the equatorial radius.
    #[must_use]
    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    /// Returns the flattening.
    #[must_use]
    pub fn flattening(&self) -> f64 {
        self.flattening
    }

    /// Returns the polar radius `a * (1 - f)`.
    #[must_use]
    pub fn polar_radius(&self) -> f64 {
        self.equatorial_radius * (1.0 - self.flattening)
    }

    /// Geocentric radius of the ellipsoid surface at the given geocentric
    /// latitude.
    #[must_use]
    pub fn radius_at(&self, geocentric_latitude: f64) -> f64 {
        let a = self.equatorial_radius;
        let b = self.polar_radius();
        let (sin_lat, cos_lat) = geocentric_latitude.sin_cos();
        a * b / (a * a * sin_lat * sin_lat + b * b * cos_lat * cos_lat).sqrt()
    }

    /// Whether `point` lies inside or on the ellipsoid (within tolerance).
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        let a = self.equatorial_radius;
        let b = self.polar_radius();
        let s2 = point.x * point.x + point.y * point.y;
        s2 / (a * a) + (point.z * point.z) / (b * b) <= 1.0 + TOLERANCE
    }

    /// Returns a copy with the equatorial radius scaled by `factor`,
    /// preserving the flattening.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor` makes the radius non-positive.
    pub fn scaled(&self, factor: f64) -> Result<Self> {
        Self::new(self.equatorial_radius * factor, self.flattening)
    }

    /// Converts a Cartesian point to geodetic coordinates.
    ///
    /// Uses the standard normal-foot fixed point for an ellipsoid of
    /// revolution; exact in one step for flattening 0.
    #[must_use]
    pub fn geodetic_of(&self, point: &Point3) -> GeodeticPoint {
        let a = self.equatorial_radius;
        let e2 = self.flattening * (2.0 - self.flattening);
        let s = point.x.hypot(point.y);

        // On or near the polar axis the longitude is undefined; fix it to 0.
        if s < TOLERANCE * a {
            return GeodeticPoint {
                latitude: std::f64::consts::FRAC_PI_2.copysign(point.z),
                longitude: 0.0,
                altitude: point.z.abs() - self.polar_radius(),
            };
        }

        let longitude = point.y.atan2(point.x);
        let mut latitude = point.z.atan2(s * (1.0 - e2));

        for _ in 0..MAX_GEODETIC_ITERATIONS {
            let sin_lat = latitude.sin();
            let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let altitude = s / latitude.cos() - n;
            let next = point.z.atan2(s * (1.0 - e2 * n / (n + altitude)));
            let done = (next - latitude).abs() < TOLERANCE;
            latitude = next;
            if done {
                break;
            }
        }

        // The altitude is steep in latitude; evaluate it at the converged
        // value, not the last iterate.
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        GeodeticPoint {
            latitude,
            longitude,
            altitude: s / latitude.cos() - n,
        }
    }

    /// Converts geodetic coordinates back to a Cartesian point.
    #[must_use]
    pub fn cartesian_of(&self, geodetic: &GeodeticPoint) -> Point3 {
        let a = self.equatorial_radius;
        let e2 = self.flattening * (2.0 - self.flattening);
        let (sin_lat, cos_lat) = geodetic.latitude.sin_cos();
        let (sin_lon, cos_lon) = geodetic.longitude.sin_cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = geodetic.altitude;
        Point3::new(
            (n + h) * cos_lat * cos_lon,
            (n + h) * cos_lat * sin_lon,
            (n * (1.0 - e2) + h) * sin_lat,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn sphere_radius_is_uniform() {
        let e = ReferenceEllipsoid::sphere(100.0).unwrap();
        assert!((e.radius_at(0.0) - 100.0).abs() < TOLERANCE);
        assert!((e.radius_at(0.7) - 100.0).abs() < 1e-9);
        assert!((e.polar_radius() - 100.0).abs() < TOLERANCE);
    }

    #[test]
    fn radius_at_poles_and_equator() {
        let e = ReferenceEllipsoid::new(1000.0, 0.1).unwrap();
        assert!((e.radius_at(0.0) - 1000.0).abs() < 1e-9);
        assert!((e.radius_at(FRAC_PI_2) - 900.0).abs() < 1e-9);
        assert!((e.radius_at(-FRAC_PI_2) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn flattening_bounds() {
        assert!(ReferenceEllipsoid::new(10.0, 1.0).is_err());
        assert!(ReferenceEllipsoid::new(-1.0, 0.0).is_err());
        // Prolate (negative flattening) is allowed.
        assert!(ReferenceEllipsoid::new(10.0, -0.2).is_ok());
    }

    #[test]
    fn containment() {
        let e = ReferenceEllipsoid::new(10.0, 0.5).unwrap();
        assert!(e.contains(&Point3::new(9.9, 0.0, 0.0)));
        assert!(e.contains(&Point3::new(10.0, 0.0, 0.0)));
        assert!(!e.contains(&Point3::new(0.0, 0.0, 6.0)));
        assert!(e.contains(&Point3::new(0.0, 0.0, 4.9)));
    }

    #[test]
    fn scaled_preserves_flattening() {
        let e = ReferenceEllipsoid::new(10.0, 0.25).unwrap();
        let s = e.scaled(3.0).unwrap();
        assert!((s.equatorial_radius() - 30.0).abs() < TOLERANCE);
        assert!((s.flattening() - 0.25).abs() < TOLERANCE);
        assert!(e.scaled(0.0).is_err());
    }

    // ── geodetic conversion ──

    #[test]
    fn geodetic_on_equator_and_pole() {
        let e = ReferenceEllipsoid::new(6_378_137.0, 1.0 / 298.257).unwrap();

        let g = e.geodetic_of(&Point3::new(6_378_237.0, 0.0, 0.0));
        assert!(g.latitude.abs() < 1e-9);
        assert!(g.longitude.abs() < 1e-9);
        assert_relative_eq!(g.altitude, 100.0, epsilon = 1e-6);

        let g = e.geodetic_of(&Point3::new(0.0, 0.0, e.polar_radius() + 50.0));
        assert!((g.latitude - FRAC_PI_2).abs() < 1e-9);
        assert_relative_eq!(g.altitude, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn geodetic_roundtrip() {
        let e = ReferenceEllipsoid::new(6_378_137.0, 1.0 / 298.257).unwrap();
        let g = GeodeticPoint {
            latitude: 0.8,
            longitude: -2.1,
            altitude: 12_345.0,
        };
        let p = e.cartesian_of(&g);
        let back = e.geodetic_of(&p);
        assert_relative_eq!(back.latitude, g.latitude, epsilon = 1e-9);
        assert_relative_eq!(back.longitude, g.longitude, epsilon = 1e-9);
        assert_relative_eq!(back.altitude, g.altitude, epsilon = 1e-5);
    }

    #[test]
    fn longitude_covers_full_circle() {
        let e = ReferenceEllipsoid::sphere(1000.0).unwrap();
        let g = e.geodetic_of(&Point3::new(-1000.0, -1e-7, 0.0));
        assert!((g.longitude.abs() - PI).abs() < 1e-6);
    }
}
