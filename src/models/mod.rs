pub mod image;
pub mod profile;
pub mod prompt;
pub mod workflow;

pub use image::*;
pub use profile::*;
pub use prompt::*;
pub use workflow::*;
