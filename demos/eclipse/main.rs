//! Regolith eclipse demo — sweeps an observer orbit around a synthetic
//! body and reports eclipse status and field-of-view statistics.
//!
//! Usage:
//! ```text
//! cargo run --example eclipse
//! RUST_LOG=regolith=debug cargo run --example eclipse
//! ```

use std::f64::consts::PI;

use regolith::body::BodyShape;
use regolith::math::Point3;
use regolith::operations::{
    is_in_eclipse, Epoch, FieldOfViewQuery, OmniFieldOfView,
};
use regolith::RegolithError;

/// Builds a coarse closed UV sphere the way a mesh loader would hand it
/// over: positions in file order, facets as 1-based vertex-id triples.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn synthetic_body(radius: f64, n_bands: usize, n_slices: usize) -> Result<BodyShape, RegolithError> {
    let mut positions = Vec::new();
    positions.push(Point3::new(0.0, 0.0, radius));
    for k in 1..n_bands {
        let lat = PI / 2.0 - PI * (k as f64) / (n_bands as f64);
        for j in 0..n_slices {
            let lon = 2.0 * PI * (j as f64) / (n_slices as f64);
            positions.push(Point3::new(
                radius * lat.cos() * lon.cos(),
                radius * lat.cos() * lon.sin(),
                radius * lat.sin(),
            ));
        }
    }
    positions.push(Point3::new(0.0, 0.0, -radius));

    let ring = |k: usize, j: usize| ((k - 1) * n_slices + (j % n_slices) + 2) as u32;
    let south = ((n_bands - 1) * n_slices + 2) as u32;

    let mut facets = Vec::new();
    for j in 0..n_slices {
        facets.push([1, ring(1, j), ring(1, j + 1)]);
    }
    for k in 1..n_bands - 1 {
        for j in 0..n_slices {
            facets.push([ring(k, j), ring(k + 1, j), ring(k + 1, j + 1)]);
            facets.push([ring(k, j), ring(k + 1, j + 1), ring(k, j + 1)]);
        }
    }
    for j in 0..n_slices {
        facets.push([south, ring(n_bands - 1, j + 1), ring(n_bands - 1, j)]);
    }

    BodyShape::from_raw(positions, facets)
}

fn main() -> Result<(), RegolithError> {
    // Default: INFO for regolith. Override with RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("regolith=info".parse().unwrap_or_default())
        .add_directive("eclipse=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let radius = 10_000.0;
    let body = synthetic_body(radius, 16, 32)?;
    println!(
        "body: {} vertices, {} facets, surface {:.3e} m^2, fitted radius {:.1} m",
        body.vertex_count(),
        body.triangle_count(),
        body.surface_area(),
        body.fitted_ellipsoid().equatorial_radius(),
    );

    // Sun fixed along +X, observer on a circular orbit in the XZ plane.
    let sun = |_: Epoch| Point3::new(1.0e11, 0.0, 0.0);
    let orbit_radius = 5.0 * radius;
    let n_samples = 24;

    for i in 0..n_samples {
        let angle = 2.0 * PI * f64::from(i) / f64::from(n_samples);
        let epoch = Epoch(60.0 * f64::from(i));
        let observer = Point3::new(
            orbit_radius * angle.cos(),
            0.0,
            orbit_radius * angle.sin(),
        );

        let eclipsed = is_in_eclipse(&body, epoch, &observer, &sun)?;
        let field = FieldOfViewQuery::new(observer, epoch, &OmniFieldOfView).execute(&body);
        println!(
            "t = {:6.0} s  angle = {:5.1} deg  visible = {:4}  surface = {:.3e} m^2  contour loops = {}  eclipse = {}",
            epoch.0,
            angle.to_degrees(),
            field.visible.len(),
            field.visible_surface,
            field.contour.len(),
            eclipsed,
        );
    }

    Ok(())
}
