//! Helio - cascaded directional shadow mapping for real-time renderers
//!
//! The core types live in [`core`], light setup and the shadow pass in
//! [`lighting`].

pub use helio_core as core;
pub use helio_lighting as lighting;

pub mod prelude {
    pub use crate::core::{Aabb, Camera, HelioError, Sphere, Viewport};
    pub use crate::lighting::{
        CascadeFitter, CullingResults, DepthConvention, FilterQuality, HeadlessContext, Light, LightShadows,
        Lighting, RenderContext, SceneCulling, ShadowSettings, Shadows, VisibleLight,
    };
    pub use glam;
}
