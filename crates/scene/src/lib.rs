pub mod highlight;
pub mod selection;
pub mod spatial;

pub use highlight::*;
pub use selection::*;
pub use spatial::*;
