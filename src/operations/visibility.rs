use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{trace, warn};

use crate::body::{BodyShape, TriangleData, TriangleKey};
use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::ephemeris::Epoch;

/// An observer-relative angular acceptance region used to cull facets
/// before the back-face test.
///
/// The direction is the observer-to-target vector in the working frame; it
/// need not be unit length, and implementations must reject zero vectors.
/// The core treats this as an opaque predicate: cones, omnidirectional
/// sensors and custom shapes are all valid implementations.
pub trait FieldOfView {
    /// Whether the given direction lies inside the field of view.
    fn contains(&self, direction: &Vector3) -> bool;
}

/// A field of view accepting every direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmniFieldOfView;

impl FieldOfView for OmniFieldOfView {
    fn contains(&self, _direction: &Vector3) -> bool {
        true
    }
}

/// A circular cone around a boresight direction.
///
/// Acceptance is strict (`angle < half_angle`): a vanishing half-angle
/// accepts nothing.
#[derive(Debug, Clone)]
pub struct CircularFieldOfView {
    boresight: Vector3,
    half_angle: f64,
}

impl CircularFieldOfView {
    /// Creates a new circular field of view.
    ///
    /// # Errors
    ///
    /// Returns an error if the boresight is zero-length or the half-angle
    /// is negative.
    pub fn new(boresight: Vector3, half_angle: f64) -> Result<Self> {
        let len = boresight.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        if half_angle < 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "half_angle",
                value: half_angle,
                min: 0.0,
                max: std::f64::consts::PI,
            }
            .into());
        }
        Ok(Self {
            boresight: boresight / len,
            half_angle,
        })
    }
}

impl FieldOfView for CircularFieldOfView {
    fn contains(&self, direction: &Vector3) -> bool {
        let len = direction.norm();
        if len < TOLERANCE {
            return false;
        }
        let cos = (self.boresight.dot(direction) / len).clamp(-1.0, 1.0);
        cos.acos() < self.half_angle
    }
}

/// Result of one visibility query: the visible facets (in file order),
/// their summed area, and the silhouette of the visible region as one or
/// more closed loops. Transient; does not reference query state.
#[derive(Debug, Clone)]
pub struct FieldData {
    /// Epoch the observer state was sampled at.
    pub epoch: Epoch,
    /// Facets passing both the field-of-view and back-face tests.
    pub visible: Vec<TriangleKey>,
    /// Sum of the visible facet areas.
    pub visible_surface: f64,
    /// Boundary polygon(s) of the visible set, one point per boundary
    /// edge, first point not repeated at the end.
    pub contour: Vec<Vec<Point3>>,
}

/// Classifies every facet of a body against an observer and a field of
/// view, and extracts the contour of the visible set.
pub struct FieldOfViewQuery<'a, F: FieldOfView + ?Sized> {
    observer: Point3,
    epoch: Epoch,
    fov: &'a F,
}

impl<'a, F: FieldOfView + ?Sized> FieldOfViewQuery<'a, F> {
    /// Creates a new `FieldOfViewQuery`.
    #[must_use]
    pub fn new(observer: Point3, epoch: Epoch, fov: &'a F) -> Self {
        Self {
            observer,
            epoch,
            fov,
        }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, body: &BodyShape) -> FieldData {
        let mut visible = Vec::new();
        let mut visible_surface = 0.0;
        for (key, tri) in body.triangles() {
            if is_triangle_visible(tri, &self.observer, self.fov) {
                visible.push(key);
                visible_surface += tri.area;
            }
        }

        let contour = contour_of(body, &visible);
        trace!(
            visible = visible.len(),
            total = body.triangle_count(),
            loops = contour.len(),
            "field-of-view query"
        );

        FieldData {
            epoch: self.epoch,
            visible,
            visible_surface,
            contour,
        }
    }
}

/// A facet is visible iff the field of view accepts the observer-to-center
/// direction and the facet faces the observer.
pub(crate) fn is_triangle_visible<F: FieldOfView + ?Sized>(
    tri: &TriangleData,
    observer: &Point3,
    fov: &F,
) -> bool {
    let direction = tri.center - observer;
    fov.contains(&direction) && tri.is_visible(observer)
}

/// Extracts the boundary polygon(s) of a visible facet set.
///
/// An edge is a boundary edge iff it belongs to exactly one visible facet.
/// Loops are chained by shared-facet adjacency: from the incoming edge's
/// owner, the walk crosses the fan of visible facets around the current
/// vertex over interior edges until it reaches the next boundary edge.
/// This keeps the trace on the outer perimeter at vertices with more than
/// two boundary incidences (pinched visible sets).
fn contour_of(body: &BodyShape, visible: &[TriangleKey]) -> Vec<Vec<Point3>> {
    // Edge (sorted vertex-id pair) -> visible facets owning it.
    let mut edge_owners: BTreeMap<(u32, u32), Vec<TriangleKey>> = BTreeMap::new();
    let mut positions: HashMap<u32, Point3> = HashMap::new();
    for &key in visible {
        let Ok(tri) = body.triangle(key) else { continue };
        for (vertex_id, position) in tri.vertex_ids.iter().zip(tri.positions.iter()) {
            positions.insert(*vertex_id, *position);
        }
        for [a, b] in tri.edge_vertex_ids() {
            edge_owners.entry(sorted(a, b)).or_default().push(key);
        }
    }

    let boundary: BTreeMap<(u32, u32), TriangleKey> = edge_owners
        .iter()
        .filter(|(_, owners)| owners.len() == 1)
        .map(|(&edge, owners)| (edge, owners[0]))
        .collect();

    let mut used: HashSet<(u32, u32)> = HashSet::new();
    let mut loops = Vec::new();

    for (&start_edge, &start_owner) in &boundary {
        if used.contains(&start_edge) {
            continue;
        }
        used.insert(start_edge);

        let (anchor, mut at) = start_edge;
        let mut points = vec![positions[&anchor]];
        let mut edge = start_edge;
        let mut owner = start_owner;

        // Each iteration consumes one boundary edge; the guard bounds a
        // walk through a malformed set.
        for _ in 0..boundary.len() {
            if at == anchor {
                break;
            }
            points.push(positions[&at]);

            let Some((next_edge, next_owner)) =
                next_boundary_edge(body, &edge_owners, edge, owner, at)
            else {
                warn!(vertex = at, "contour walk stopped at an open fan");
                break;
            };
            used.insert(next_edge);
            at = other_endpoint(next_edge, at);
            edge = next_edge;
            owner = next_owner;
        }
        loops.push(points);
    }
    loops
}

/// Walks the visible fan around `at`, starting inside `owner` at `edge`,
/// crossing interior edges until the next boundary edge.
fn next_boundary_edge(
    body: &BodyShape,
    edge_owners: &BTreeMap<(u32, u32), Vec<TriangleKey>>,
    edge: (u32, u32),
    owner: TriangleKey,
    at: u32,
) -> Option<((u32, u32), TriangleKey)> {
    let mut current_edge = edge;
    let mut current = owner;

    // A fan around one vertex has at most its valence of facets.
    for _ in 0..edge_owners.len() {
        let tri = body.triangle(current).ok()?;
        let candidate = other_edge_at(tri, current_edge, at)?;
        let owners = edge_owners.get(&candidate)?;
        if owners.len() == 1 {
            return Some((candidate, current));
        }
        current = owners.iter().copied().find(|&k| k != current)?;
        current_edge = candidate;
    }
    None
}

/// The facet's other edge incident to vertex `at`.
fn other_edge_at(tri: &TriangleData, edge: (u32, u32), at: u32) -> Option<(u32, u32)> {
    tri.edge_vertex_ids()
        .into_iter()
        .map(|[a, b]| sorted(a, b))
        .find(|&e| e != edge && (e.0 == at || e.1 == at))
}

fn other_endpoint(edge: (u32, u32), at: u32) -> u32 {
    if edge.0 == at {
        edge.1
    } else {
        edge.0
    }
}

fn sorted(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
