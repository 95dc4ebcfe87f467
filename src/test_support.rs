//! Synthetic closed meshes for the test suite.

use std::f64::consts::PI;

use crate::body::BodyShape;
use crate::math::Point3;

/// Builds a closed UV sphere: pole fans plus quad bands, outward winding.
///
/// `n_bands` latitude bands (>= 2) and `n_slices` longitude slices (>= 3);
/// the facet count is `2 * n_slices * (n_bands - 1)`. For even `n_bands`
/// one vertex ring lies exactly on the equator.
#[allow(clippy::cast_precision_loss, clippy::unwrap_used)]
pub fn uv_sphere(radius: f64, n_bands: usize, n_slices: usize) -> BodyShape {
    assert!(n_bands >= 2 && n_slices >= 3);

    let mut positions = Vec::with_capacity(2 + (n_bands - 1) * n_slices);
    positions.push(Point3::new(0.0, 0.0, radius));
    for k in 1..n_bands {
        let lat = PI / 2.0 - PI * (k as f64) / (n_bands as f64);
        let (sin_lat, cos_lat) = lat.sin_cos();
        for j in 0..n_slices {
            let lon = 2.0 * PI * (j as f64) / (n_slices as f64);
            positions.push(Point3::new(
                radius * cos_lat * lon.cos(),
                radius * cos_lat * lon.sin(),
                radius * sin_lat,
            ));
        }
    }
    positions.push(Point3::new(0.0, 0.0, -radius));

    #[allow(clippy::cast_possible_truncation)]
    let ring = |k: usize, j: usize| ((k - 1) * n_slices + (j % n_slices) + 2) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let south = ((n_bands - 1) * n_slices + 2) as u32;

    let mut facets = Vec::with_capacity(2 * n_slices * (n_bands - 1));
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

    BodyShape::from_raw(positions, facets).unwrap()
}

/// Builds a regular tetrahedron centered at the origin, outward winding.
#[allow(clippy::unwrap_used)]
pub fn tetrahedron(scale: f64) -> BodyShape {
    let positions = vec![
        Point3::new(scale, scale, scale),
        Point3::new(scale, -scale, -scale),
        Point3::new(-scale, scale, -scale),
        Point3::new(-scale, -scale, scale),
    ];
    let facets = vec![[1, 2, 3], [1, 3, 4], [1, 4, 2], [2, 4, 3]];
    BodyShape::from_raw(positions, facets).unwrap()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sphere_facets_face_outward() {
        let body = uv_sphere(100.0, 6, 8);
        for (_, tri) in body.triangles() {
            let radial = tri.center.coords.normalize();
            assert!(
                tri.normal.dot(&radial) > 0.5,
                "facet {} normal not outward",
                tri.id
            );
        }
    }

    #[test]
    fn sphere_is_closed() {
        // Every edge must be shared by exactly two facets, which shows up
        // as exactly three neighbors per facet.
        let body = uv_sphere(100.0, 5, 7);
        assert_eq!(body.triangle_count(), 2 * 7 * 4);
        for (_, tri) in body.triangles() {
            assert_eq!(tri.neighbors.len(), 3);
        }
    }

    #[test]
    fn tetrahedron_faces_outward() {
        let body = tetrahedron(2.0);
        for (_, tri) in body.triangles() {
            assert!(tri.normal.dot(&tri.center.coords) > 0.0);
        }
    }
}
