use crate::body::BodyShape;
use crate::geometry::Line;
use crate::math::{Point3, TOLERANCE};

/// Result of a closest-approach query between a line and the body surface.
#[derive(Debug, Clone, Copy)]
pub struct ClosestPair {
    /// The closest point on the line.
    pub point_on_line: Point3,
    /// The closest point on the body surface.
    pub point_on_body: Point3,
    /// The distance between them; exactly 0 when the line intersects.
    pub distance: f64,
}

/// Minimum Euclidean distance between a (possibly semi-finite) line and
/// the body surface, minimized over all facets.
pub struct DistanceQuery {
    line: Line,
}

impl DistanceQuery {
    /// Creates a new `DistanceQuery`.
    #[must_use]
    pub fn new(line: Line) -> Self {
        Self { line }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, body: &BodyShape) -> ClosestPair {
        let mut best = ClosestPair {
            point_on_line: *self.line.origin(),
            point_on_body: Point3::origin(),
            distance: f64::INFINITY,
        };

        for (_, tri) in body.triangles() {
            let (point_on_line, point_on_body) = tri.closest_point_to(&self.line);
            let distance = (point_on_line - point_on_body).norm();
            if distance < best.distance {
                best = ClosestPair {
                    point_on_line,
                    point_on_body,
                    distance,
                };
                // An intersecting line cannot get any closer.
                if best.distance < TOLERANCE {
                    best.distance = 0.0;
                    break;
                }
            }
        }
        best
    }
}
