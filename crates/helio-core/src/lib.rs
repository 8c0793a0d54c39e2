//! Core types shared by Helio crates: errors, bounding volumes, the camera
//! and render-target viewports.

pub mod bounds;
pub mod camera;
pub mod error;
pub mod viewport;

pub use bounds::{Aabb, Sphere};
pub use camera::Camera;
pub use error::{HelioError, Result};
pub use viewport::Viewport;
