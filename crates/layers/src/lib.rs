pub mod colors;
pub mod faultline;
pub mod field;
pub mod geojson;
pub mod highlight;
pub mod labels;
pub mod layer;
pub mod outline;
pub mod resize;
pub mod symbology;
pub mod wellbores;

pub use layer::*;
