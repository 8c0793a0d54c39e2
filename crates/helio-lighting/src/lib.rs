//! Helio lighting: per-camera directional light setup and cascaded
//! directional shadow maps.
//!
//! The crate never touches a graphics API. Culling, cascade fitting, render
//! target allocation and command execution are provided by the host through
//! the traits in [`culling`] and [`context`]; [`headless::HeadlessContext`]
//! is an in-process host that records everything it is asked to do.

pub mod commands;
pub mod context;
pub mod culling;
pub mod headless;
pub mod lighting_system;
pub mod lights;
pub mod shadows;
pub mod uniforms;

pub use commands::{Command, CommandBuffer, ShadowDrawSettings};
pub use context::{RenderContext, RenderTargetAllocator, UniformSink};
pub use culling::{CascadeFitter, CascadeFrustum, CullingResults, SceneCulling, ShadowSplitData};
pub use headless::{HeadlessContext, UniformValue};
pub use lighting_system::{Lighting, LightingFrame, MAX_DIRECTIONAL_LIGHTS};
pub use lights::{Light, LightShadows, LightType, VisibleLight};
pub use shadows::{
    DepthConvention, DirectionalShadowSettings, FilterQuality, ShadowData, ShadowFrameReport, ShadowSettings,
    Shadows, MAX_SHADOWED_DIRECTIONAL_LIGHTS,
};
pub use uniforms::{properties, ShaderPropertyId};
