pub mod distance;
pub mod ephemeris;
pub mod intersection;
pub mod neighbors;
pub mod resize;
pub mod visibility;

pub use distance::{ClosestPair, DistanceQuery};
pub use ephemeris::{
    is_in_eclipse, never_enlightened, never_visible, visible_and_enlightened, Epoch,
    SunProvider, TimedState,
};
pub use intersection::{FacetPoint, IntersectionPoints, SurfaceIntersection};
pub use neighbors::{NeighborSearch, Seed};
pub use resize::{Margin, Resize};
pub use visibility::{
    CircularFieldOfView, FieldData, FieldOfView, FieldOfViewQuery, OmniFieldOfView,
};
