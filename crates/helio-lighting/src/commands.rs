//! Recorded render commands
//!
//! Passes record into a [`CommandBuffer`] they own and hand it to
//! [`RenderContext::execute_command_buffer`](crate::context::RenderContext::execute_command_buffer),
//! which drains it. The buffer keeps its allocation between frames.

use glam::Mat4;
use helio_core::Viewport;

use crate::culling::ShadowSplitData;
use crate::shadows::resource::RenderTargetHandle;

/// Request to draw the shadow casters of one light for one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDrawSettings {
    pub visible_light_index: usize,
    pub split: ShadowSplitData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    BeginSample(&'static str),
    EndSample(&'static str),
    SetRenderTarget(RenderTargetHandle),
    ClearDepth(f32),
    SetViewport(Viewport),
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetDepthBias { bias: f32, slope_scale: f32 },
    DrawShadows(ShadowDrawSettings),
}

#[derive(Debug, Clone)]
pub struct CommandBuffer {
    name: &'static str,
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn begin_sample(&mut self) {
        self.push(Command::BeginSample(self.name));
    }

    pub fn end_sample(&mut self) {
        self.push(Command::EndSample(self.name));
    }

    pub fn set_render_target(&mut self, target: RenderTargetHandle) {
        self.push(Command::SetRenderTarget(target));
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.push(Command::ClearDepth(depth));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.push(Command::SetViewport(viewport));
    }

    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.push(Command::SetViewProjection { view, projection });
    }

    pub fn set_depth_bias(&mut self, bias: f32, slope_scale: f32) {
        self.push(Command::SetDepthBias { bias, slope_scale });
    }

    pub fn draw_shadows(&mut self, settings: ShadowDrawSettings) {
        self.push(Command::DrawShadows(settings));
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.commands.drain(..)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
