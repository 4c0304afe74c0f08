//! GeoJSON features: parsing plus one collection per geometry type.

pub mod config;
pub mod document;
pub mod linestring;
pub mod module;
pub mod point;
pub mod polygon;

pub use config::*;
pub use document::*;
pub use linestring::*;
pub use module::*;
pub use point::*;
pub use polygon::*;
