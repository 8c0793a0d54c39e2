//! In-process render context
//!
//! Records what the lighting passes ask of the host instead of talking to a
//! GPU. Used for tests and for planning shadows without a device.

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec4};
use helio_core::{HelioError, Result};

use crate::commands::{Command, CommandBuffer};
use crate::context::{RenderContext, RenderTargetAllocator, UniformSink};
use crate::shadows::resource::{AtlasDescriptor, RenderTargetHandle};
use crate::uniforms::ShaderPropertyId;

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Vector(Vec4),
    VectorArray(Vec<Vec4>),
    MatrixArray(Vec<Mat4>),
    Texture(RenderTargetHandle),
}

#[derive(Debug)]
pub struct HeadlessContext {
    max_texture_size: u32,
    fail_execution: bool,
    next_handle: u64,
    live: HashMap<RenderTargetHandle, AtlasDescriptor>,
    allocation_count: u64,
    uniforms: HashMap<ShaderPropertyId, UniformValue>,
    keywords: HashSet<String>,
    executed: Vec<Command>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            max_texture_size: 16384,
            fail_execution: false,
            next_handle: 1,
            live: HashMap::new(),
            allocation_count: 0,
            uniforms: HashMap::new(),
            keywords: HashSet::new(),
            executed: Vec::new(),
        }
    }

    /// Allocations above this size fail with [`HelioError::OutOfMemory`].
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Make every command buffer execution fail.
    pub fn with_failing_execution(mut self) -> Self {
        self.fail_execution = true;
        self
    }

    /// Commands of the most recently executed buffer.
    pub fn executed(&self) -> &[Command] {
        &self.executed
    }

    /// Successful allocations since creation, released or not.
    pub fn allocation_count(&self) -> u64 {
        self.allocation_count
    }

    pub fn live_render_targets(&self) -> usize {
        self.live.len()
    }

    pub fn descriptor(&self, handle: RenderTargetHandle) -> Option<&AtlasDescriptor> {
        self.live.get(&handle)
    }

    pub fn int(&self, id: ShaderPropertyId) -> Option<i32> {
        match self.uniforms.get(&id)? {
            UniformValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn vector(&self, id: ShaderPropertyId) -> Option<Vec4> {
        match self.uniforms.get(&id)? {
            UniformValue::Vector(value) => Some(*value),
            _ => None,
        }
    }

    pub fn vector_array(&self, id: ShaderPropertyId) -> Option<&[Vec4]> {
        match self.uniforms.get(&id)? {
            UniformValue::VectorArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn matrix_array(&self, id: ShaderPropertyId) -> Option<&[Mat4]> {
        match self.uniforms.get(&id)? {
            UniformValue::MatrixArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn texture(&self, id: ShaderPropertyId) -> Option<RenderTargetHandle> {
        match self.uniforms.get(&id)? {
            UniformValue::Texture(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformSink for HeadlessContext {
    fn set_global_int(&mut self, id: ShaderPropertyId, value: i32) {
        self.uniforms.insert(id, UniformValue::Int(value));
    }

    fn set_global_vector(&mut self, id: ShaderPropertyId, value: Vec4) {
        self.uniforms.insert(id, UniformValue::Vector(value));
    }

    fn set_global_vector_array(&mut self, id: ShaderPropertyId, values: &[Vec4]) {
        match self.uniforms.get_mut(&id) {
            Some(UniformValue::VectorArray(stored)) => {
                stored.clear();
                stored.extend_from_slice(values);
            }
            _ => {
                self.uniforms.insert(id, UniformValue::VectorArray(values.to_vec()));
            }
        }
    }

    fn set_global_matrix_array(&mut self, id: ShaderPropertyId, values: &[Mat4]) {
        match self.uniforms.get_mut(&id) {
            Some(UniformValue::MatrixArray(stored)) => {
                stored.clear();
                stored.extend_from_slice(values);
            }
            _ => {
                self.uniforms.insert(id, UniformValue::MatrixArray(values.to_vec()));
            }
        }
    }

    fn set_global_texture(&mut self, id: ShaderPropertyId, texture: RenderTargetHandle) {
        self.uniforms.insert(id, UniformValue::Texture(texture));
    }

    fn enable_keyword(&mut self, keyword: &str) {
        self.keywords.insert(keyword.to_owned());
    }

    fn disable_keyword(&mut self, keyword: &str) {
        self.keywords.remove(keyword);
    }
}

impl RenderTargetAllocator for HeadlessContext {
    fn allocate_shadow_atlas(&mut self, desc: &AtlasDescriptor) -> Result<RenderTargetHandle> {
        if desc.size > self.max_texture_size {
            return Err(HelioError::OutOfMemory(format!(
                "{} ({}x{}) exceeds the {}px texture limit",
                desc.label, desc.size, desc.size, self.max_texture_size
            )));
        }
        let handle = RenderTargetHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(handle, *desc);
        self.allocation_count += 1;
        Ok(handle)
    }

    fn release(&mut self, handle: RenderTargetHandle) {
        if self.live.remove(&handle).is_none() {
            log::warn!("release of unknown render target {:?}", handle);
        }
    }
}

impl RenderContext for HeadlessContext {
    fn execute_command_buffer(&mut self, buffer: &mut CommandBuffer) -> Result<()> {
        if self.fail_execution {
            buffer.clear();
            return Err(HelioError::GpuDeviceError(format!(
                "command buffer '{}' rejected",
                buffer.name()
            )));
        }
        self.executed.clear();
        self.executed.extend(buffer.drain());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_submission_is_kept() {
        let mut ctx = HeadlessContext::new();
        let mut buffer = CommandBuffer::new("Test");

        buffer.begin_sample();
        buffer.clear_depth(1.0);
        buffer.end_sample();
        ctx.execute_command_buffer(&mut buffer).unwrap();
        assert_eq!(ctx.executed().len(), 3);

        buffer.clear_depth(0.0);
        ctx.execute_command_buffer(&mut buffer).unwrap();
        assert_eq!(ctx.executed(), [Command::ClearDepth(0.0)]);
    }

    #[test]
    fn allocations_are_counted_not_stored() {
        let mut ctx = HeadlessContext::new();
        for _ in 0..3 {
            let handle = ctx.allocate_shadow_atlas(&AtlasDescriptor::shadow_atlas(512)).unwrap();
            ctx.release(handle);
        }
        assert_eq!(ctx.allocation_count(), 3);
        assert_eq!(ctx.live_render_targets(), 0);
    }
}
