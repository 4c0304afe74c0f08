pub mod renderer;
pub mod store;

pub use renderer::*;
pub use store::*;
