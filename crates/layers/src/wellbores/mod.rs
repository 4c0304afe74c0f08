//! Wellbore paths grouped by category, sharing roots at the surface.

pub mod config;
pub mod data;
pub mod group;
pub mod label;
pub mod module;
pub mod root;

pub use config::*;
pub use data::*;
pub use group::*;
pub use label::*;
pub use module::*;
pub use root::*;
