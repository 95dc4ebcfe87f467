use tracing::trace;

use crate::body::{BodyShape, TriangleKey};
use crate::error::Result;
use crate::geometry::Line;
use crate::math::{Point3, TOLERANCE};

use super::intersection::SurfaceIntersection;
use super::visibility::{is_triangle_visible, FieldOfView};

/// A timestamp in the caller's timescale, in seconds.
///
/// The kernel is frame- and time-agnostic: epochs are carried through to
/// providers and results untouched.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Epoch(pub f64);

/// A time-tagged observer position in the working frame.
#[derive(Debug, Clone, Copy)]
pub struct TimedState {
    /// Sample epoch.
    pub epoch: Epoch,
    /// Observer position.
    pub position: Point3,
}

/// Supplier of the Sun position in the working frame.
///
/// Implemented for any closure `Fn(Epoch) -> Point3`, which is how the
/// (excluded) ephemeris collaborator plugs in.
pub trait SunProvider {
    /// Sun position at the given epoch.
    fn position_at(&self, epoch: Epoch) -> Point3;
}

impl<F: Fn(Epoch) -> Point3> SunProvider for F {
    fn position_at(&self, epoch: Epoch) -> Point3 {
        self(epoch)
    }
}

/// Whether the observer is in the body's shadow at `epoch`: true iff the
/// segment between the Sun and the observer is blocked by the surface.
///
/// Closed boundary convention: a hit exactly at either end of the segment
/// counts as blocked.
///
/// # Errors
///
/// Returns an error if the Sun and observer positions coincide.
pub fn is_in_eclipse(
    body: &BodyShape,
    epoch: Epoch,
    observer: &Point3,
    sun: &impl SunProvider,
) -> Result<bool> {
    let sun_position = sun.position_at(epoch);
    let length = (observer - sun_position).norm();
    let line = Line::through_points(sun_position, *observer)?;
    let blocked = SurfaceIntersection::new(line)
        .execute(body)
        .is_some_and(|hit| hit.abscissa <= length + TOLERANCE);
    Ok(blocked)
}

/// Facets that are invisible at *every* sampled observer state — the
/// complement of the union of the per-state visible sets.
pub fn never_visible<F: FieldOfView + ?Sized>(
    body: &BodyShape,
    states: &[TimedState],
    fov: &F,
) -> Vec<TriangleKey> {
    let result: Vec<TriangleKey> = body
        .triangles()
        .filter(|(_, tri)| {
            states
                .iter()
                .all(|state| !is_triangle_visible(tri, &state.position, fov))
        })
        .map(|(key, _)| key)
        .collect();
    trace!(
        states = states.len(),
        never_visible = result.len(),
        "never-visible sweep"
    );
    result
}

/// Facets never illuminated over the given epochs: a facet is enlightened
/// at an epoch iff it faces the Sun position (omnidirectional visibility).
pub fn never_enlightened(
    body: &BodyShape,
    epochs: &[Epoch],
    sun: &impl SunProvider,
) -> Vec<TriangleKey> {
    let sun_positions: Vec<Point3> = epochs.iter().map(|&e| sun.position_at(e)).collect();
    body.triangles()
        .filter(|(_, tri)| sun_positions.iter().all(|sun| !tri.is_visible(sun)))
        .map(|(key, _)| key)
        .collect()
}

/// Facets both visible from the observer and illuminated by the Sun at
/// some sampled state — the union over the ephemeris of the per-state
/// intersections.
pub fn visible_and_enlightened<F: FieldOfView + ?Sized>(
    body: &BodyShape,
    states: &[TimedState],
    sun: &impl SunProvider,
    fov: &F,
) -> Vec<TriangleKey> {
    let sun_positions: Vec<Point3> = states
        .iter()
        .map(|state| sun.position_at(state.epoch))
        .collect();
    body.triangles()
        .filter(|(_, tri)| {
            states.iter().zip(&sun_positions).any(|(state, sun)| {
                is_triangle_visible(tri, &state.position, fov) && tri.is_visible(sun)
            })
        })
        .map(|(key, _)| key)
        .collect()
}
