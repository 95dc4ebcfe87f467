use std::collections::{HashSet, VecDeque};

use crate::body::{BodyShape, TriangleKey};
use crate::error::Result;
use crate::math::Point3;

/// Origin of a neighbor search.
///
/// Every seed form normalizes to a BFS start facet plus a metric reference
/// point: a facet seed references its own center, a point seed (body
/// surface point or arbitrary 3-vector) references the given point and
/// starts from the facet whose center is nearest to it.
#[derive(Debug, Clone, Copy)]
pub enum Seed {
    /// Start from this facet.
    Triangle(TriangleKey),
    /// Start from the facet nearest to this point.
    Point(Point3),
}

/// Breadth-first neighbor search over the facet adjacency graph.
///
/// Both query families include the seed facet at distance/order 0 and
/// return an unordered set of facet keys.
pub struct NeighborSearch {
    seed: Seed,
}

impl NeighborSearch {
    /// Creates a new `NeighborSearch` from the given seed.
    #[must_use]
    pub fn new(seed: Seed) -> Self {
        Self { seed }
    }

    /// Facets whose centers lie within `max_distance` of the seed
    /// reference point, connected to the seed through facets that also
    /// pass the distance test.
    ///
    /// Expansion is pruned at rejected facets: the distance test is
    /// monotone along adjacency paths for convex-ish bodies, so facets
    /// beyond a rejected one are only reached through shorter paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a facet seed key is not in this body's arena.
    pub fn within_distance(
        &self,
        body: &BodyShape,
        max_distance: f64,
    ) -> Result<Vec<TriangleKey>> {
        let (start, reference) = self.resolve(body)?;

        let mut visited: HashSet<TriangleKey> = HashSet::new();
        let mut queue: VecDeque<TriangleKey> = VecDeque::new();
        let mut result = vec![start];
        visited.insert(start);
        queue.push_back(start);

        while let Some(key) = queue.pop_front() {
            for &next in &body.triangle(key)?.neighbors {
                if !visited.insert(next) {
                    continue;
                }
                let center = body.triangle(next)?.center;
                if (center - reference).norm() <= max_distance {
                    result.push(next);
                    queue.push_back(next);
                }
            }
        }
        Ok(result)
    }

    /// Facets within `order` adjacency hops of the seed (order 0 = the
    /// seed alone, order 1 adds direct neighbors, and so on).
    ///
    /// # Errors
    ///
    /// Returns an error if a facet seed key is not in this body's arena.
    pub fn within_order(&self, body: &BodyShape, order: usize) -> Result<Vec<TriangleKey>> {
        let (start, _) = self.resolve(body)?;

        let mut visited: HashSet<TriangleKey> = HashSet::new();
        let mut queue: VecDeque<(TriangleKey, usize)> = VecDeque::new();
        let mut result = vec![start];
        visited.insert(start);
        queue.push_back((start, 0));

        while let Some((key, depth)) = queue.pop_front() {
            if depth == order {
                continue;
            }
            for &next in &body.triangle(key)?.neighbors {
                if visited.insert(next) {
                    result.push(next);
                    queue.push_back((next, depth + 1));
                }
            }
        }
        Ok(result)
    }

    fn resolve(&self, body: &BodyShape) -> Result<(TriangleKey, Point3)> {
        match self.seed {
            Seed::Triangle(key) => Ok((key, body.triangle(key)?.center)),
            Seed::Point(point) => {
                let key = body.nearest_triangle(&point).ok_or_else(|| {
                    crate::error::MeshError::EntityNotFound("seed triangle".into())
                })?;
                Ok((key, point))
            }
        }
    }
}
