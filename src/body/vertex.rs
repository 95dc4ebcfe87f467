use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the body arena.
    pub struct VertexKey;
}

/// A mesh vertex: stable 1-based loader id plus position.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// Stable 1-based identifier from the load input.
    pub id: u32,
    /// The 3D position of the vertex in the working frame.
    pub position: Point3,
}

impl VertexData {
    /// Creates a new vertex.
    #[must_use]
    pub fn new(id: u32, position: Point3) -> Self {
        Self { id, position }
    }
}
