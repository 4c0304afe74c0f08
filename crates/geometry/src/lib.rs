pub mod centroid;
pub mod error;
pub mod interpolator;
pub mod intervals;
pub mod line_reducer;
pub mod mesh;

// Geometry crate: pure functions over projected coordinates. No rendering state.
pub use centroid::*;
pub use error::*;
pub use interpolator::*;
pub use intervals::*;
pub use line_reducer::*;
pub use mesh::*;
