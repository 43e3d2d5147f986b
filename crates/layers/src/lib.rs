pub mod config;
pub mod error;
pub mod extent_fit;
pub mod layer;
pub mod loading;
pub mod normalize;
pub mod options;
pub mod raster;
pub mod registry;
pub mod swipe;
pub mod sync;
pub mod vector;

pub use config::*;
pub use error::*;
pub use layer::*;
pub use normalize::*;
pub use options::*;
pub use registry::*;
pub use sync::*;
