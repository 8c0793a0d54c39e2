//! Host interfaces the lighting passes drive
//!
//! The host renderer implements [`RenderContext`]: it owns the GPU, executes
//! recorded command buffers and holds the global shader state. Lighting code
//! never touches a device directly.

use glam::{Mat4, Vec4};
use helio_core::Result;

use crate::commands::CommandBuffer;
use crate::shadows::resource::{AtlasDescriptor, RenderTargetHandle};
use crate::uniforms::ShaderPropertyId;

/// Global shader state written by the lighting passes.
///
/// Array setters receive the full fixed-capacity arrays every frame; readers
/// gate by the matching published count.
pub trait UniformSink {
    fn set_global_int(&mut self, id: ShaderPropertyId, value: i32);
    fn set_global_vector(&mut self, id: ShaderPropertyId, value: Vec4);
    fn set_global_vector_array(&mut self, id: ShaderPropertyId, values: &[Vec4]);
    fn set_global_matrix_array(&mut self, id: ShaderPropertyId, values: &[Mat4]);
    fn set_global_texture(&mut self, id: ShaderPropertyId, texture: RenderTargetHandle);
    fn enable_keyword(&mut self, keyword: &str);
    fn disable_keyword(&mut self, keyword: &str);
}

pub trait RenderTargetAllocator {
    /// Failing here is fatal for the frame: there is no fallback once the
    /// shadow pass has decided between the real atlas and the placeholder.
    fn allocate_shadow_atlas(&mut self, desc: &AtlasDescriptor) -> Result<RenderTargetHandle>;

    fn release(&mut self, handle: RenderTargetHandle);
}

pub trait RenderContext: UniformSink + RenderTargetAllocator {
    /// Execute and drain every command recorded in `buffer`.
    fn execute_command_buffer(&mut self, buffer: &mut CommandBuffer) -> Result<()>;
}
