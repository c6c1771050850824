pub mod image;
pub mod project;
pub mod settings;

pub use image::*;
pub use project::*;
pub use settings::*;
