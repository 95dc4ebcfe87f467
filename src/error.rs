use thiserror::Error;

/// Top-level error type for the Regolith body-shape kernel.
#[derive(Debug, Error)]
pub enum RegolithError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised while building a body shape from loader data.
///
/// These are fatal: construction never produces a partially-valid mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("facet {facet} references vertex id {vertex_id}, valid range is 1..={max}")]
    VertexIdOutOfRange { facet: u32, vertex_id: u32, max: u32 },

    #[error("mesh needs at least 3 vertices and 1 facet, got {vertices} and {facets}")]
    Empty { vertices: usize, facets: usize },

    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Domain errors raised by queries against a built body shape.
///
/// Query *misses* (no intersection, empty neighbor set, zero visible
/// facets) are not errors; they are `None`/empty results.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid margin: {0}")]
    InvalidMargin(String),

    #[error(
        "altitude {altitude} cannot be resolved: offset surface collapses below minimum vertex norm {min_norm}"
    )]
    AltitudeUnreachable { altitude: f64, min_norm: f64 },
}

/// Convenience type alias for results using [`RegolithError`].
pub type Result<T> = std::result::Result<T, RegolithError>;
