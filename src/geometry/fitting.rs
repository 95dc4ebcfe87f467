use nalgebra::{Matrix2, Vector2};
use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, TOLERANCE};

/// Convergence tolerance of the ellipsoid fit, relative to the mean
/// vertex norm.
pub const EPS_OPTIMIZER: f64 = 1e-10;

/// Iteration cap for the Gauss-Newton solver.
const MAX_ITERATIONS: usize = 100;

/// Outcome of a least-squares ellipsoid-of-revolution fit.
#[derive(Debug, Clone, Copy)]
pub struct FitReport {
    /// Fitted equatorial radius.
    pub equatorial_radius: f64,
    /// Fitted flattening (negative for prolate bodies).
    pub flattening: f64,
    /// Whether the solver reached [`EPS_OPTIMIZER`] before the iteration cap.
    pub converged: bool,
    /// Iterations actually performed.
    pub iterations: usize,
}

/// Fits an ellipsoid of revolution (about +Z, centered at the origin) to
/// the given positions by least squares on the geocentric radius.
///
/// The model is `m(a, b; lat) = a*b / sqrt(a^2 sin^2 lat + b^2 cos^2 lat)`
/// and the solver is Gauss-Newton on `(a, b)` with the analytic Jacobian
/// `dm/da = b^3 cos^2 lat / D^3`, `dm/db = a^3 sin^2 lat / D^3`.
///
/// When the latitude spread of the samples is too small to separate the
/// two radii (all samples effectively at one latitude), the fit falls back
/// to the spherical solution at the mean radius.
///
/// # Errors
///
/// Returns an error if fewer than two positions have a usable (non-zero)
/// norm.
pub fn fit_ellipsoid(positions: &[Point3]) -> Result<FitReport> {
    // (radius, sin^2 lat, cos^2 lat) per usable sample.
    let mut samples: Vec<(f64, f64, f64)> = Vec::with_capacity(positions.len());
    for p in positions {
        let r = p.coords.norm();
        if r < TOLERANCE {
            continue;
        }
        let s2 = (p.z / r).powi(2);
        samples.push((r, s2, 1.0 - s2));
    }
    if samples.len() < 2 {
        return Err(GeometryError::Degenerate(
            "ellipsoid fit needs at least two off-origin positions".into(),
        )
        .into());
    }

    #[allow(clippy::cast_precision_loss)]
    let mean_r = samples.iter().map(|(r, _, _)| r).sum::<f64>() / samples.len() as f64;
    let step_tol = EPS_OPTIMIZER * mean_r;

    let mut a = mean_r;
    let mut b = mean_r;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        // Normal equations of the Gauss-Newton step.
        let mut jtj = Matrix2::<f64>::zeros();
        let mut jtr = Vector2::<f64>::zeros();
        for &(r, s2, c2) in &samples {
            let d = (a * a * s2 + b * b * c2).sqrt();
            let d3 = d * d * d;
            let ja = b * b * b * c2 / d3;
            let jb = a * a * a * s2 / d3;
            let res = r - a * b / d;
            jtj[(0, 0)] += ja * ja;
            jtj[(0, 1)] += ja * jb;
            jtj[(1, 1)] += jb * jb;
            jtr[0] += ja * res;
            jtr[1] += jb * res;
        }
        jtj[(1, 0)] = jtj[(0, 1)];

        // A vanishing determinant relative to the matrix scale means the
        // latitude spread cannot separate the two radii (all samples at one
        // latitude): fall back to the spherical solution.
        let det = jtj[(0, 0)] * jtj[(1, 1)] - jtj[(0, 1)] * jtj[(1, 0)];
        let det_scale = (jtj[(0, 0)] * jtj[(1, 1)]).max(f64::MIN_POSITIVE);
        if det.abs() <= 1e-12 * det_scale {
            debug!(samples = samples.len(), "ellipsoid fit fell back to sphere");
            return Ok(FitReport {
                equatorial_radius: mean_r,
                flattening: 0.0,
                converged: true,
                iterations,
            });
        }
        let delta = Vector2::new(
            (jtr[0] * jtj[(1, 1)] - jtr[1] * jtj[(0, 1)]) / det,
            (jtr[1] * jtj[(0, 0)] - jtr[0] * jtj[(0, 1)]) / det,
        );

        a = (a + delta[0]).max(TOLERANCE);
        b = (b + delta[1]).max(TOLERANCE);

        if delta[0].abs().max(delta[1].abs()) < step_tol {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(iterations, "ellipsoid fit did not converge");
    }

    Ok(FitReport {
        equatorial_radius: a,
        flattening: 1.0 - b / a,
        converged,
        iterations,
    })
}
