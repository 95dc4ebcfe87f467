use super::{Point3, Vector3, TOLERANCE};

/// Tolerance for barycentric containment tests.
///
/// Barycentric coordinates are scale-free, so a fixed epsilon keeps the
/// closed boundary convention (points on an edge or vertex count as inside)
/// independent of the body's physical size.
const BARYCENTRIC_EPS: f64 = 1e-9;

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line crosses the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with the plane
/// through `plane_point` with unit normal `plane_normal`.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane_point: &Point3,
    plane_normal: &Vector3,
) -> LinePlaneRelation {
    let denom = plane_normal.dot(dir);

    let diff = plane_point - origin;
    let numer = plane_normal.dot(&diff);

    if denom.abs() < TOLERANCE {
        // Line is parallel to the plane
        if numer.abs() < TOLERANCE {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        let point = origin + dir * t;
        LinePlaneRelation::Point { point, t }
    }
}

/// Barycentric coordinates of `p` with respect to triangle `(a, b, c)`.
///
/// Returns `(u, v, w)` such that `p = u*a + v*b + w*c` with `u + v + w = 1`
/// when `p` lies in the triangle's plane, or `None` if the triangle is
/// degenerate.
#[must_use]
pub fn barycentric(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Option<(f64, f64, f64)> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < TOLERANCE * d00.max(d11).max(1.0) {
        return None;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some((1.0 - v - w, v, w))
}

/// Closed point-in-triangle test for a point already in the triangle's plane.
///
/// Points on an edge or at a vertex count as inside.
#[must_use]
pub fn point_in_triangle(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> bool {
    barycentric(p, a, b, c).is_some_and(|(u, v, w)| {
        u >= -BARYCENTRIC_EPS && v >= -BARYCENTRIC_EPS && w >= -BARYCENTRIC_EPS
    })
}

/// Closest point to `p` on the segment `[a, b]`.
#[must_use]
pub fn closest_point_on_segment(p: &Point3, a: &Point3, b: &Point3) -> Point3 {
    let e = b - a;
    let len2 = e.norm_squared();
    if len2 < TOLERANCE {
        return *a;
    }
    let s = ((p - a).dot(&e) / len2).clamp(0.0, 1.0);
    a + e * s
}

/// Closest pair between a (possibly semi-finite) line and the segment
/// `[a, b]`.
///
/// The line is `origin + t * dir` with unit `dir`; when `min_abscissa` is
/// given, only `t >= min_abscissa` is usable. Returns
/// `(point_on_line, point_on_segment)`.
///
/// The minimum over a clipped line and a segment is attained either at the
/// unconstrained critical point or on one of the boundaries (`s = 0`,
/// `s = 1`, `t = min_abscissa`); all candidates are evaluated.
#[must_use]
pub fn closest_points_line_segment(
    origin: &Point3,
    dir: &Vector3,
    min_abscissa: Option<f64>,
    a: &Point3,
    b: &Point3,
) -> (Point3, Point3) {
    let e = b - a;
    let ee = e.norm_squared();
    let w0 = origin - a;

    let mut candidates: Vec<(f64, f64)> = Vec::with_capacity(4);

    if ee < TOLERANCE {
        // Degenerate segment: a single point.
        let t = clamp_abscissa((a - origin).dot(dir), min_abscissa);
        candidates.push((t, 0.0));
    } else {
        let de = dir.dot(&e);
        let det = de * de - ee;

        if det.abs() > TOLERANCE * ee {
            // Unconstrained critical point of the squared distance.
            let dw = dir.dot(&w0);
            let ew = e.dot(&w0);
            let t = (ee * dw - de * ew) / det;
            let s = (de * dw - ew) / det;
            if (0.0..=1.0).contains(&s) && in_abscissa_range(t, min_abscissa) {
                candidates.push((t, s));
            }
        }

        // Segment endpoints.
        candidates.push((clamp_abscissa((a - origin).dot(dir), min_abscissa), 0.0));
        candidates.push((clamp_abscissa((b - origin).dot(dir), min_abscissa), 1.0));

        // Clipped line start.
        if let Some(t0) = min_abscissa {
            let p0 = origin + dir * t0;
            let s = ((p0 - a).dot(&e) / ee).clamp(0.0, 1.0);
            candidates.push((t0, s));
        }
    }

    let mut best: Option<(f64, Point3, Point3)> = None;
    for (t, s) in candidates {
        let pl = origin + dir * t;
        let ps = a + e * s;
        let d2 = (pl - ps).norm_squared();
        if best.as_ref().is_none_or(|(bd, _, _)| d2 < *bd) {
            best = Some((d2, pl, ps));
        }
    }

    // candidates is never empty
    best.map_or((*origin, *a), |(_, pl, ps)| (pl, ps))
}

/// Closest point to `p` within the (closed) triangle `(a, b, c)`.
#[must_use]
pub fn closest_point_in_triangle(
    p: &Point3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
    normal: &Vector3,
) -> Point3 {
    let projected = p - normal * (p - a).dot(normal);
    if point_in_triangle(&projected, a, b, c) {
        return projected;
    }

    let mut best = closest_point_on_segment(p, a, b);
    let mut best_d2 = (p - best).norm_squared();
    for (u, v) in [(b, c), (c, a)] {
        let q = closest_point_on_segment(p, u, v);
        let d2 = (p - q).norm_squared();
        if d2 < best_d2 {
            best = q;
            best_d2 = d2;
        }
    }
    best
}

fn in_abscissa_range(t: f64, min_abscissa: Option<f64>) -> bool {
    min_abscissa.is_none_or(|m| t >= m - TOLERANCE)
}

fn clamp_abscissa(t: f64, min_abscissa: Option<f64>) -> f64 {
    min_abscissa.map_or(t, |m| t.max(m))
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

    // ── line_plane_intersect ──

    #[test]
    fn line_hits_plane() {
        let result = line_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &v(0.0, 0.0, 1.0),
            &p(0.0, 0.0, 5.0),
            &v(0.0, 0.0, 1.0),
        );
        match result {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 5.0).abs() < TOLERANCE);
                assert!((point.z - 5.0).abs() < TOLERANCE);
            }
            other => panic!("expected Point, got {other:?}"),
        }
    }

    #[test]
    fn line_parallel_to_plane() {
        let result = line_plane_intersect(
            &p(0.0, 0.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 5.0),
            &v(0.0, 0.0, 1.0),
        );
        assert!(matches!(result, LinePlaneRelation::Parallel));
    }

    #[test]
    fn line_on_plane() {
        let result = line_plane_intersect(
            &p(1.0, 2.0, 0.0),
            &v(1.0, 0.0, 0.0),
            &p(0.0, 0.0, 0.0),
            &v(0.0, 0.0, 1.0),
        );
        assert!(matches!(result, LinePlaneRelation::OnPlane));
    }

    // ── barycentric / point_in_triangle ──

    #[test]
    fn barycentric_at_vertices_and_centroid() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));

        let (u, _, _) = barycentric(&a, &a, &b, &c).unwrap();
        assert!((u - 1.0).abs() < TOLERANCE);

        let centroid = p(1.0 / 3.0, 1.0 / 3.0, 0.0);
        let (u, v, w) = barycentric(&centroid, &a, &b, &c).unwrap();
        assert!((u - 1.0 / 3.0).abs() < 1e-9);
        assert!((v - 1.0 / 3.0).abs() < 1e-9);
        assert!((w - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn point_on_edge_counts_as_inside() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert!(point_in_triangle(&p(0.5, 0.0, 0.0), &a, &b, &c));
        assert!(point_in_triangle(&p(0.5, 0.5, 0.0), &a, &b, &c));
        assert!(point_in_triangle(&a, &a, &b, &c));
    }

    #[test]
    fn point_outside_triangle() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert!(!point_in_triangle(&p(0.6, 0.6, 0.0), &a, &b, &c));
        assert!(!point_in_triangle(&p(-0.1, 0.5, 0.0), &a, &b, &c));
    }

    #[test]
    fn degenerate_triangle_rejects() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        assert!(barycentric(&p(0.5, 0.0, 0.0), &a, &b, &c).is_none());
    }

    // ── closest points ──

    #[test]
    fn segment_closest_point_clamps() {
        let (a, b) = (p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0));
        let q = closest_point_on_segment(&p(5.0, 3.0, 0.0), &a, &b);
        assert!((q.x - 5.0).abs() < TOLERANCE);
        let q = closest_point_on_segment(&p(-5.0, 3.0, 0.0), &a, &b);
        assert!(q.x.abs() < TOLERANCE);
        let q = closest_point_on_segment(&p(15.0, 3.0, 0.0), &a, &b);
        assert!((q.x - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn skew_line_segment_pair() {
        // Line along X at z = 1; segment along Y at z = 0 crossing underneath.
        let (pl, ps) = closest_points_line_segment(
            &p(-5.0, 0.0, 1.0),
            &v(1.0, 0.0, 0.0),
            None,
            &p(0.0, -1.0, 0.0),
            &p(0.0, 1.0, 0.0),
        );
        assert!((pl - p(0.0, 0.0, 1.0)).norm() < 1e-9);
        assert!((ps - p(0.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn clipped_line_uses_start_point() {
        // The unconstrained optimum is at t = -5 but the line starts at t = 0.
        let (pl, ps) = closest_points_line_segment(
            &p(5.0, 0.0, 1.0),
            &v(1.0, 0.0, 0.0),
            Some(0.0),
            &p(0.0, -1.0, 0.0),
            &p(0.0, 1.0, 0.0),
        );
        assert!((pl - p(5.0, 0.0, 1.0)).norm() < 1e-9);
        assert!((ps - p(0.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn parallel_line_segment_pair() {
        let (pl, ps) = closest_points_line_segment(
            &p(-5.0, 0.0, 2.0),
            &v(1.0, 0.0, 0.0),
            None,
            &p(0.0, 0.0, 0.0),
            &p(3.0, 0.0, 0.0),
        );
        assert!((pl - ps).norm() > 2.0 - 1e-9);
        assert!((pl - ps).norm() < 2.0 + 1e-9);
    }

    #[test]
    fn triangle_closest_point_projects_inside() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let n = v(0.0, 0.0, 1.0);
        let q = closest_point_in_triangle(&p(0.25, 0.25, 3.0), &a, &b, &c, &n);
        assert!((q - p(0.25, 0.25, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn triangle_closest_point_clamps_to_edge() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        let n = v(0.0, 0.0, 1.0);
        let q = closest_point_in_triangle(&p(1.0, 1.0, 0.0), &a, &b, &c, &n);
        assert!((q - p(0.5, 0.5, 0.0)).norm() < 1e-9);
    }
}
