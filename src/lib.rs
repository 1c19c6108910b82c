pub mod blob;
pub mod canvas;
pub mod cave;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod logging;
pub mod noise;
pub mod raster;
pub mod render;
pub mod rng;

pub use canvas::Canvas;
pub use cave::Cave;
pub use config::Params;
pub use engine::Engine;
pub use error::EngineError;
