pub mod triangle;
pub mod vertex;

pub use triangle::{TriangleData, TriangleKey};
pub use vertex::{VertexData, VertexKey};

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::geometry::{fit_ellipsoid, FitReport, ReferenceEllipsoid};
use crate::math::{Point3, TOLERANCE};

/// The triangulated surface of an irregular body.
///
/// Central arena owning all vertices and facets; entities reference each
/// other via typed keys. The shape is immutable once built: construction
/// eagerly computes facet adjacency, the vertex norm range and the five
/// analytic reference surfaces, and every query is a pure read. Operations
/// that look mutating (resize) return a new `BodyShape`.
#[derive(Debug)]
pub struct BodyShape {
    vertices: SlotMap<VertexKey, VertexData>,
    triangles: SlotMap<TriangleKey, TriangleData>,
    vertex_order: Vec<VertexKey>,
    triangle_order: Vec<TriangleKey>,
    min_norm: f64,
    max_norm: f64,
    inner_sphere: ReferenceEllipsoid,
    outer_sphere: ReferenceEllipsoid,
    inner_ellipsoid: ReferenceEllipsoid,
    outer_ellipsoid: ReferenceEllipsoid,
    fitted_ellipsoid: ReferenceEllipsoid,
}

impl BodyShape {
    /// Builds a body shape from loader output: vertex positions in file
    /// order (1-based ids) and facets as triples of vertex ids (facet id =
    /// file position, 1-based).
    ///
    /// # Errors
    ///
    /// Returns an error if a facet references a vertex id outside
    /// `1..=positions.len()`, if the input is empty, if a facet is
    /// degenerate (zero area), or if the ellipsoid fit cannot be set up.
    /// Construction never yields a partially-valid shape.
    pub fn from_raw(positions: Vec<Point3>, facets: Vec<[u32; 3]>) -> Result<Self> {
        Self::build(positions, facets, None)
    }

    /// Construction core; `fit` short-circuits the least-squares fit when
    /// the caller already knows the fitted ellipsoid (uniform rescaling).
    pub(crate) fn build(
        positions: Vec<Point3>,
        facets: Vec<[u32; 3]>,
        fit: Option<FitReport>,
    ) -> Result<Self> {
        if positions.len() < 3 || facets.is_empty() {
            return Err(MeshError::Empty {
                vertices: positions.len(),
                facets: facets.len(),
            }
            .into());
        }
        let max_id = u32::try_from(positions.len()).map_err(|_| MeshError::Empty {
            vertices: positions.len(),
            facets: facets.len(),
        })?;

        for (i, facet) in facets.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let facet_id = (i + 1) as u32;
            for &vertex_id in facet {
                if vertex_id == 0 || vertex_id > max_id {
                    return Err(MeshError::VertexIdOutOfRange {
                        facet: facet_id,
                        vertex_id,
                        max: max_id,
                    }
                    .into());
                }
            }
        }

        let mut vertices = SlotMap::with_key();
        let mut vertex_order = Vec::with_capacity(positions.len());
        for (i, position) in positions.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = (i + 1) as u32;
            vertex_order.push(vertices.insert(VertexData::new(id, *position)));
        }

        let mut triangles = SlotMap::with_key();
        let mut triangle_order = Vec::with_capacity(facets.len());
        for (i, facet) in facets.iter().enumerate() {
            let corners = facet.map(|vertex_id| {
                let index = vertex_id as usize - 1;
                (vertex_order[index], vertex_id, positions[index])
            });
            #[allow(clippy::cast_possible_truncation)]
            let data = TriangleData::new((i + 1) as u32, corners)?;
            triangle_order.push(triangles.insert(data));
        }

        // Adjacency: facets sharing an (unordered) vertex-id edge. For
        // triangles this is exactly the shared-two-vertex-ids relation.
        let mut edge_map: HashMap<(u32, u32), Vec<TriangleKey>> = HashMap::new();
        for &key in &triangle_order {
            for [a, b] in triangles[key].edge_vertex_ids() {
                let edge = if a < b { (a, b) } else { (b, a) };
                edge_map.entry(edge).or_default().push(key);
            }
        }
        for owners in edge_map.values() {
            for (i, &first) in owners.iter().enumerate() {
                for &second in &owners[i + 1..] {
                    if !triangles[first].neighbors.contains(&second) {
                        triangles[first].neighbors.push(second);
                    }
                    if !triangles[second].neighbors.contains(&first) {
                        triangles[second].neighbors.push(first);
                    }
                }
            }
        }

        let mut min_norm = f64::INFINITY;
        let mut max_norm = 0.0_f64;
        for position in &positions {
            let norm = position.coords.norm();
            min_norm = min_norm.min(norm);
            max_norm = max_norm.max(norm);
        }

        let report = match fit {
            Some(report) => report,
            None => fit_ellipsoid(&positions)?,
        };
        let fitted_ellipsoid =
            ReferenceEllipsoid::new(report.equatorial_radius, report.flattening)?;

        // Inscribed/circumscribed copies of the fit: scale so every vertex
        // lies outside the inner and inside the outer ellipsoid.
        let mut ratio_min = f64::INFINITY;
        let mut ratio_max = 0.0_f64;
        for position in &positions {
            let norm = position.coords.norm();
            if norm < TOLERANCE {
                continue;
            }
            let latitude = (position.z / norm).asin();
            let ratio = norm / fitted_ellipsoid.radius_at(latitude);
            ratio_min = ratio_min.min(ratio);
            ratio_max = ratio_max.max(ratio);
        }

        let shape = Self {
            inner_sphere: ReferenceEllipsoid::sphere(min_norm)?,
            outer_sphere: ReferenceEllipsoid::sphere(max_norm)?,
            inner_ellipsoid: fitted_ellipsoid.scaled(ratio_min)?,
            outer_ellipsoid: fitted_ellipsoid.scaled(ratio_max)?,
            fitted_ellipsoid,
            vertices,
            triangles,
            vertex_order,
            triangle_order,
            min_norm,
            max_norm,
        };

        debug!(
            vertices = shape.vertex_order.len(),
            facets = shape.triangle_order.len(),
            min_norm,
            max_norm,
            fit_converged = report.converged,
            "built body shape"
        );
        Ok(shape)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not in this arena.
    pub fn vertex(&self, key: VertexKey) -> Result<&VertexData> {
        self.vertices
            .get(key)
            .ok_or_else(|| MeshError::EntityNotFound("vertex".into()).into())
    }

    /// Returns a reference to the triangle data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not in this arena.
    pub fn triangle(&self, key: TriangleKey) -> Result<&TriangleData> {
        self.triangles
            .get(key)
            .ok_or_else(|| MeshError::EntityNotFound("triangle".into()).into())
    }

    /// Iterates vertices in loader file order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &VertexData)> {
        self.vertex_order.iter().map(|&k| (k, &self.vertices[k]))
    }

    /// Iterates triangles in loader file order.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &TriangleData)> {
        self.triangle_order.iter().map(|&k| (k, &self.triangles[k]))
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_order.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_order.len()
    }

    /// Smallest vertex norm.
    #[must_use]
    pub fn min_norm(&self) -> f64 {
        self.min_norm
    }

    /// Largest vertex norm.
    #[must_use]
    pub fn max_norm(&self) -> f64 {
        self.max_norm
    }

    /// Sphere of radius [`min_norm`](Self::min_norm).
    #[must_use]
    pub fn inner_sphere(&self) -> ReferenceEllipsoid {
        self.inner_sphere
    }

    /// Sphere of radius [`max_norm`](Self::max_norm).
    #[must_use]
    pub fn outer_sphere(&self) -> ReferenceEllipsoid {
        self.outer_sphere
    }

    /// Largest fitted-flattening ellipsoid with every vertex outside it.
    #[must_use]
    pub fn inner_ellipsoid(&self) -> ReferenceEllipsoid {
        self.inner_ellipsoid
    }

    /// Smallest fitted-flattening ellipsoid with every vertex inside it.
    #[must_use]
    pub fn outer_ellipsoid(&self) -> ReferenceEllipsoid {
        self.outer_ellipsoid
    }

    /// Least-squares ellipsoid of revolution fit to the vertex cloud.
    #[must_use]
    pub fn fitted_ellipsoid(&self) -> ReferenceEllipsoid {
        self.fitted_ellipsoid
    }

    /// Total surface area (sum of facet areas).
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangle_order
            .iter()
            .map(|&k| self.triangles[k].area)
            .sum()
    }

    /// The triangle whose center is nearest to `point`.
    #[must_use]
    pub fn nearest_triangle(&self, point: &Point3) -> Option<TriangleKey> {
        let mut best: Option<(f64, TriangleKey)> = None;
        for &key in &self.triangle_order {
            let d2 = (self.triangles[key].center - point).norm_squared();
            if best.is_none_or(|(bd, _)| d2 < bd) {
                best = Some((d2, key));
            }
        }
        best.map(|(_, key)| key)
    }

    /// Raw loader-shaped data (positions in id order, facets as vertex-id
    /// triples) for rebuilding displaced copies.
    pub(crate) fn raw(&self) -> (Vec<Point3>, Vec<[u32; 3]>) {
        let positions = self
            .vertex_order
            .iter()
            .map(|&k| self.vertices[k].position)
            .collect();
        let facets = self
            .triangle_order
            .iter()
            .map(|&k| self.triangles[k].vertex_ids)
            .collect();
        (positions, facets)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{tetrahedron, uv_sphere};
    use std::f64::consts::PI;

    #[test]
    fn rejects_bad_vertex_references() {
        let positions = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let out_of_range = BodyShape::from_raw(positions.clone(), vec![[1, 2, 4]]);
        assert!(matches!(
            out_of_range,
            Err(crate::RegolithError::Mesh(MeshError::VertexIdOutOfRange {
                vertex_id: 4,
                ..
            }))
        ));
        let zero_based = BodyShape::from_raw(positions, vec![[0, 1, 2]]);
        assert!(zero_based.is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(BodyShape::from_raw(Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn tetrahedron_adjacency_is_complete() {
        let body = tetrahedron(10.0);
        assert_eq!(body.triangle_count(), 4);
        for (key, tri) in body.triangles() {
            assert_eq!(tri.neighbors.len(), 3, "every face borders the other 3");
            assert!(!tri.neighbors.contains(&key), "never its own neighbor");
        }
    }

    #[test]
    fn adjacency_matches_vertex_id_predicate() {
        let body = uv_sphere(100.0, 6, 8);
        for (key, tri) in body.triangles() {
            for &n in &tri.neighbors {
                let other = body.triangle(n).unwrap();
                assert!(tri.is_neighbor_by_vertex_id(other));
            }
            // Closed manifold: exactly three edge neighbors.
            assert_eq!(tri.neighbors.len(), 3, "facet {key:?}");
        }
    }

    #[test]
    fn sphere_norms_and_reference_surfaces() {
        let radius = 10_000.0;
        let body = uv_sphere(radius, 8, 16);
        assert!((body.min_norm() - radius).abs() < 1e-6);
        assert!((body.max_norm() - radius).abs() < 1e-6);
        assert!((body.outer_sphere().equatorial_radius() - radius).abs() < 1e-6);
        assert!((body.inner_sphere().equatorial_radius() - radius).abs() < 1e-6);

        let fitted = body.fitted_ellipsoid();
        assert!((fitted.equatorial_radius() - radius).abs() < radius * 1e-6);
        assert!(fitted.flattening().abs() < 1e-6);

        // Every vertex inside the outer and outside the inner ellipsoid.
        let inner = body.inner_ellipsoid();
        let outer = body.outer_ellipsoid();
        for (_, vertex) in body.vertices() {
            assert!(outer.contains(&vertex.position));
            let norm = vertex.position.coords.norm();
            let latitude = (vertex.position.z / norm).asin();
            assert!(norm >= inner.radius_at(latitude) - 1e-6);
        }
    }

    #[test]
    fn sphere_area_approaches_analytic_value() {
        let radius = 10_000.0;
        let coarse = uv_sphere(radius, 8, 16);
        let fine = uv_sphere(radius, 24, 48);
        let exact = 4.0 * PI * radius * radius;

        let coarse_err = (coarse.surface_area() - exact).abs() / exact;
        let fine_err = (fine.surface_area() - exact).abs() / exact;
        assert!(coarse_err < 0.05, "coarse error {coarse_err}");
        assert!(fine_err < 0.005, "fine error {fine_err}");
        assert!(fine_err < coarse_err, "refinement must reduce the error");
    }

    #[test]
    fn nearest_triangle_finds_pole_fan() {
        let body = uv_sphere(1_000.0, 8, 16);
        let key = body.nearest_triangle(&Point3::new(0.0, 0.0, 2_000.0)).unwrap();
        let tri = body.triangle(key).unwrap();
        // A north pole fan facet: one corner is the pole vertex (id 1).
        assert!(tri.vertex_ids.contains(&1));
    }

    #[test]
    fn accessors_reject_foreign_keys() {
        let body = tetrahedron(1.0);
        assert!(body.triangle(TriangleKey::default()).is_err());
        assert!(body.vertex(VertexKey::default()).is_err());
    }
}
