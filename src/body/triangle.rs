use crate::error::{GeometryError, Result};
use crate::geometry::Line;
use crate::math::intersect_3d::{
    closest_point_in_triangle, closest_points_line_segment, line_plane_intersect,
    point_in_triangle, LinePlaneRelation,
};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::vertex::VertexKey;

slotmap::new_key_type! {
    /// Unique identifier for a triangle in the body arena.
    pub struct TriangleKey;
}

/// A mesh facet: three vertices plus derived quantities.
///
/// The normal follows the vertex winding order (right-hand rule) and points
/// away from the body interior for a valid closed mesh. `neighbors` holds
/// the edge-adjacent facets (exactly two shared vertex ids) and is populated
/// once, after all facets are built.
#[derive(Debug, Clone)]
pub struct TriangleData {
    /// Stable 1-based identifier, assigned in load order.
    pub id: u32,
    /// Arena keys of the three corner vertices.
    pub vertices: [VertexKey; 3],
    /// Loader ids of the three corner vertices.
    pub vertex_ids: [u32; 3],
    /// Corner positions, cached for the geometric predicates.
    pub positions: [Point3; 3],
    /// Unit winding normal.
    pub normal: Vector3,
    /// Centroid.
    pub center: Point3,
    /// Surface area.
    pub area: f64,
    /// Edge-adjacent facets.
    pub neighbors: Vec<TriangleKey>,
}

impl TriangleData {
    /// Builds a facet from its three corners, computing normal, centroid
    /// and area.
    ///
    /// # Errors
    ///
    /// Returns an error if the corners are collinear (zero area).
    pub fn new(id: u32, corners: [(VertexKey, u32, Point3); 3]) -> Result<Self> {
        let positions = [corners[0].2, corners[1].2, corners[2].2];
        let cross = (positions[1] - positions[0]).cross(&(positions[2] - positions[0]));
        let cross_norm = cross.norm();
        if cross_norm < TOLERANCE {
            return Err(
                GeometryError::Degenerate(format!("facet {id} has zero area")).into(),
            );
        }

        let center = Point3::from(
            (positions[0].coords + positions[1].coords + positions[2].coords) / 3.0,
        );

        Ok(Self {
            id,
            vertices: [corners[0].0, corners[1].0, corners[2].0],
            vertex_ids: [corners[0].1, corners[1].1, corners[2].1],
            positions,
            normal: cross / cross_norm,
            center,
            area: cross_norm / 2.0,
            neighbors: Vec::new(),
        })
    }

    /// Intersection of the (possibly semi-finite) line with this facet.
    ///
    /// Closed predicate: points exactly on an edge or vertex count as
    /// intersecting. Returns `None` when the line is parallel to (or lies
    /// in) the facet plane, when the plane crossing falls outside the facet,
    /// or when the line's minimum abscissa excludes it.
    #[must_use]
    pub fn intersection(&self, line: &Line) -> Option<Point3> {
        match line_plane_intersect(
            line.origin(),
            line.direction(),
            &self.positions[0],
            &self.normal,
        ) {
            LinePlaneRelation::Point { point, t } => {
                if line.contains_abscissa(t)
                    && point_in_triangle(
                        &point,
                        &self.positions[0],
                        &self.positions[1],
                        &self.positions[2],
                    )
                {
                    Some(point)
                } else {
                    None
                }
            }
            LinePlaneRelation::Parallel | LinePlaneRelation::OnPlane => None,
        }
    }

    /// Closest pair `(point_on_line, point_on_facet)` between the line and
    /// this facet; both coincide when the line intersects it.
    ///
    /// For a non-intersecting line the minimum is attained on a facet edge
    /// or, for a semi-finite line, opposite its start point; the candidate
    /// set below contains a global minimizer in every configuration,
    /// including coplanar and parallel-offset lines.
    #[must_use]
    pub fn closest_point_to(&self, line: &Line) -> (Point3, Point3) {
        if let Some(point) = self.intersection(line) {
            return (point, point);
        }

        let [a, b, c] = &self.positions;
        let mut best: Option<(f64, Point3, Point3)> = None;

        for (u, v) in [(a, b), (b, c), (c, a)] {
            let (pl, pt) = closest_points_line_segment(
                line.origin(),
                line.direction(),
                line.min_abscissa(),
                u,
                v,
            );
            let d2 = (pl - pt).norm_squared();
            if best.as_ref().is_none_or(|(bd, _, _)| d2 < *bd) {
                best = Some((d2, pl, pt));
            }
        }

        if let Some(t0) = line.min_abscissa() {
            let start = line.point_at(t0);
            let pt = closest_point_in_triangle(&start, a, b, c, &self.normal);
            let d2 = (start - pt).norm_squared();
            if best.as_ref().is_none_or(|(bd, _, _)| d2 < *bd) {
                best = Some((d2, start, pt));
            }
        }

        // The edge candidates always exist.
        best.map_or((*line.origin(), *a), |(_, pl, pt)| (pl, pt))
    }

    /// Back-face test: whether this facet faces the observer.
    ///
    /// Strict boundary convention: a direction exactly perpendicular to the
    /// normal (tangential view) is NOT visible.
    #[must_use]
    pub fn is_visible(&self, observer: &Point3) -> bool {
        (observer - self.center).dot(&self.normal) > 0.0
    }

    /// Whether the two facets share exactly two vertex ids (an edge) and
    /// are distinct.
    #[must_use]
    pub fn is_neighbor_by_vertex_id(&self, other: &TriangleData) -> bool {
        if self.id == other.id {
            return false;
        }
        let shared = self
            .vertex_ids
            .iter()
            .filter(|id| other.vertex_ids.contains(id))
            .count();
        shared == 2
    }

    /// The three edges as (unsorted) vertex-id pairs, in winding order.
    #[must_use]
    pub fn edge_vertex_ids(&self) -> [[u32; 2]; 3] {
        let [a, b, c] = self.vertex_ids;
        [[a, b], [b, c], [c, a]]
    }
}
