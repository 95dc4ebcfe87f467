use crate::body::{BodyShape, TriangleData, TriangleKey};
use crate::error::{QueryError, Result};
use crate::geometry::{GeodeticPoint, Line, ReferenceEllipsoid};
use crate::math::{Point3, TOLERANCE};

/// Relative tolerance (w.r.t. the body's largest vertex norm) under which
/// two hits are numerically coincident — e.g. a ray through a shared vertex
/// reported by every incident facet.
const COINCIDENCE_EPS: f64 = 1e-8;

/// A surface hit: intersection point, its line abscissa, and the facet
/// that owns it. Transient; not owned by the body shape.
#[derive(Debug, Clone, Copy)]
pub struct FacetPoint {
    /// Intersection point in the working frame.
    pub point: Point3,
    /// Line abscissa of the point.
    pub abscissa: f64,
    /// Facet the point lies on.
    pub triangle: TriangleKey,
}

impl FacetPoint {
    /// Expresses the hit in geodetic coordinates relative to `ellipsoid`.
    #[must_use]
    pub fn geodetic(&self, ellipsoid: &ReferenceEllipsoid) -> GeodeticPoint {
        ellipsoid.geodetic_of(&self.point)
    }
}

/// First intersection of a line with the body surface.
///
/// Among all facet hits in the line's usable range, returns the one with
/// the smallest non-negative abscissa (closest to the origin/observer);
/// `None` when no facet is hit. Hits behind the origin are ignored; use
/// [`IntersectionPoints`] for the full line geometry.
pub struct SurfaceIntersection {
    line: Line,
}

impl SurfaceIntersection {
    /// Creates a new `SurfaceIntersection` query.
    #[must_use]
    pub fn new(line: Line) -> Self {
        Self { line }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, body: &BodyShape) -> Option<FacetPoint> {
        // The line cannot reach the mesh if it stays outside the
        // circumscribed sphere. Slack keeps exact tangents inside.
        if outside_outer_sphere(&self.line, body) {
            return None;
        }

        let mut best: Option<FacetPoint> = None;
        for (key, tri) in body.triangles() {
            if let Some(hit) = first_hit(tri, key, &self.line) {
                if best.as_ref().is_none_or(|b| hit.abscissa < b.abscissa) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Intersects the virtual surface displaced radially by `altitude`
    /// from the mesh; the returned point lies on that offset surface, with
    /// the owning (undisplaced) facet.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::AltitudeUnreachable`] when the offset surface
    /// cannot be constructed (the altitude drives part of the mesh through
    /// the origin). A clean miss is `Ok(None)`.
    pub fn execute_at_altitude(
        &self,
        body: &BodyShape,
        altitude: f64,
    ) -> Result<Option<FacetPoint>> {
        if altitude.abs() < TOLERANCE {
            return Ok(self.execute(body));
        }
        if body.min_norm() + altitude <= TOLERANCE {
            return Err(QueryError::AltitudeUnreachable {
                altitude,
                min_norm: body.min_norm(),
            }
            .into());
        }

        let mut best: Option<FacetPoint> = None;
        for (key, tri) in body.triangles() {
            let corners: [(_, _, Point3); 3] = [0usize, 1, 2].map(|i| {
                let p = tri.positions[i];
                let norm = p.coords.norm();
                (
                    tri.vertices[i],
                    tri.vertex_ids[i],
                    Point3::from(p.coords * ((norm + altitude) / norm)),
                )
            });
            // A displaced facet can degenerate for extreme negative
            // altitudes; such facets simply cannot be hit.
            let Ok(displaced) = TriangleData::new(tri.id, corners) else {
                continue;
            };
            if let Some(hit) = first_hit(&displaced, key, &self.line) {
                if best.as_ref().is_none_or(|b| hit.abscissa < b.abscissa) {
                    best = Some(hit);
                }
            }
        }
        Ok(best)
    }
}

/// All distinct intersection points of a line with the body surface,
/// sorted by increasing abscissa, numerically coincident duplicates
/// collapsed.
///
/// Unlike [`SurfaceIntersection`], hits at negative abscissas of an
/// unclipped line are reported.
pub struct IntersectionPoints {
    line: Line,
}

impl IntersectionPoints {
    /// Creates a new `IntersectionPoints` query.
    #[must_use]
    pub fn new(line: Line) -> Self {
        Self { line }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, body: &BodyShape) -> Vec<FacetPoint> {
        if outside_outer_sphere(&self.line, body) {
            return Vec::new();
        }

        let mut hits: Vec<FacetPoint> = Vec::new();
        for (key, tri) in body.triangles() {
            if let Some(point) = tri.intersection(&self.line) {
                hits.push(FacetPoint {
                    point,
                    abscissa: self.line.abscissa_of(&point),
                    triangle: key,
                });
            }
        }
        hits.sort_by(|a, b| a.abscissa.total_cmp(&b.abscissa));

        let merge_dist = COINCIDENCE_EPS * body.max_norm().max(1.0);
        let mut distinct: Vec<FacetPoint> = Vec::with_capacity(hits.len());
        for hit in hits {
            if distinct
                .last()
                .is_none_or(|kept| (hit.point - kept.point).norm() > merge_dist)
            {
                distinct.push(hit);
            }
        }
        distinct
    }
}

fn outside_outer_sphere(line: &Line, body: &BodyShape) -> bool {
    let slack = COINCIDENCE_EPS * body.max_norm().max(1.0);
    line.distance_to_point(&Point3::origin()) > body.max_norm() + slack
}

fn first_hit(tri: &TriangleData, key: TriangleKey, line: &Line) -> Option<FacetPoint> {
    let point = tri.intersection(line)?;
    let abscissa = line.abscissa_of(&point);
    if abscissa < -TOLERANCE {
        return None;
    }
    Some(FacetPoint {
        point,
        abscissa,
        triangle: key,
    })
}
