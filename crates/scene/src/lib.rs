pub mod engine;
pub mod memory;
pub mod paint;

pub use engine::*;
pub use memory::*;
pub use paint::*;
