//! Render snapshot handed to the draw collaborator
//!
//! The simulation never draws. After each frame it produces one
//! `RenderInstance` per visible entity; the platform uploads them as-is.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque visual id the render collaborator maps to a sprite or mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(pub u32);

impl RenderHandle {
    pub const PLAYER: RenderHandle = RenderHandle(1);
    pub const BULLET: RenderHandle = RenderHandle(2);
    pub const SHARK: RenderHandle = RenderHandle(3);
    pub const SNAKE_PART: RenderHandle = RenderHandle(4);
    pub const FRUIT: RenderHandle = RenderHandle(5);
    pub const SHOT_POWERUP: RenderHandle = RenderHandle(6);
}

/// One entity as the renderer sees it (24 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub position: [f32; 2],
    /// Degrees, counter-clockwise from +x
    pub rotation: f32,
    pub size: [f32; 2],
    pub handle: u32,
}

impl RenderInstance {
    pub fn new(position: Vec2, rotation: f32, size: Vec2, handle: RenderHandle) -> Self {
        Self {
            position: position.to_array(),
            rotation,
            size: size.to_array(),
            handle: handle.0,
        }
    }
}

/// Raw bytes for a GPU instance buffer
pub fn instance_bytes(instances: &[RenderInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}

/// The render collaborator. Called once per frame with the settled state.
pub trait RenderSink {
    fn draw(&mut self, instances: &[RenderInstance]);
}

/// Keeps the last frame, for tests and headless runs
#[derive(Debug, Default, Clone)]
pub struct LastFrame {
    pub instances: Vec<RenderInstance>,
    pub frames: u64,
}

impl RenderSink for LastFrame {
    fn draw(&mut self, instances: &[RenderInstance]) {
        self.instances.clear();
        self.instances.extend_from_slice(instances);
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<RenderInstance>(), 24);
        let instances = [RenderInstance::new(Vec2::new(1.0, 2.0), 90.0, Vec2::splat(0.5), RenderHandle::SHARK); 2];
        let bytes = instance_bytes(&instances);
        assert_eq!(bytes.len(), 48);
        let back: &[RenderInstance] = bytemuck::cast_slice(bytes);
        assert_eq!(back[1].handle, 3);
        assert_eq!(back[0].position, [1.0, 2.0]);
    }
}
