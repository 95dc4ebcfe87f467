pub mod ellipsoid;
pub mod fitting;
pub mod line;

pub use ellipsoid::{GeodeticPoint, ReferenceEllipsoid};
pub use fitting::{fit_ellipsoid, FitReport, EPS_OPTIMIZER};
pub use line::Line;
