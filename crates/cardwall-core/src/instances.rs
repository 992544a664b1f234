//! Static per-instance attributes for the card field.
//!
//! The layout is built once after the atlas is ready and never mutated;
//! per-frame motion is delegated to the shader, driven by the time, drag and
//! scroll uniforms. [`animated_position`] is the CPU mirror of the shader's
//! wrap-around drift, used by the hover hit test.

use glam::Vec3;
use rand::prelude::*;
use thiserror::Error;

use crate::atlas::Atlas;
use crate::constants::{
    DEFAULT_FIELD_MAX_X, DEFAULT_FIELD_MAX_Y, DEFAULT_FIELD_Z_FAR, DEFAULT_FIELD_Z_NEAR,
    INSTANCE_SPEED_MAX, INSTANCE_SPEED_MIN,
};

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("atlas has no entries to assign")]
    NoAtlasEntries,
}

/// World-space extent of the instance field. `z_far` is the more negative
/// (distant) bound.
#[derive(Clone, Copy, Debug)]
pub struct FieldBounds {
    pub max_x: f32,
    pub max_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            max_x: DEFAULT_FIELD_MAX_X,
            max_y: DEFAULT_FIELD_MAX_Y,
            z_near: DEFAULT_FIELD_Z_NEAR,
            z_far: DEFAULT_FIELD_Z_FAR,
        }
    }
}

/// Per-instance vertex data, uploaded once as a step-per-instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub position: [f32; 3],
    pub speed: f32,
    /// x_start, x_end, y_start, y_end of the card's atlas UV rectangle.
    pub uv_rect: [f32; 4],
}

#[derive(Clone, Debug, Default)]
pub struct InstanceBuffers {
    pub instances: Vec<InstanceData>,
}

impl InstanceBuffers {
    pub fn len(&self) -> usize {
        self.instances.len()
    }
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Assign each of `count` instances a uniform random position inside
/// `bounds`, a speed scalar in [0.5, 1.0], and the UV rectangle of atlas
/// entry `i mod m`. Deterministic for a given rng seed.
pub fn build_instances(
    atlas: &Atlas,
    count: usize,
    bounds: &FieldBounds,
    rng: &mut StdRng,
) -> Result<InstanceBuffers, InstanceError> {
    let m = atlas.entries.len();
    if m == 0 {
        return Err(InstanceError::NoAtlasEntries);
    }
    let mut instances = Vec::with_capacity(count);
    for i in 0..count {
        let uv = atlas.entries[i % m].uv;
        instances.push(InstanceData {
            position: [
                rng.gen_range(-bounds.max_x..=bounds.max_x),
                rng.gen_range(-bounds.max_y..=bounds.max_y),
                rng.gen_range(bounds.z_far..=bounds.z_near),
            ],
            speed: rng.gen_range(INSTANCE_SPEED_MIN..=INSTANCE_SPEED_MAX),
            uv_rect: [uv.x_start, uv.x_end, uv.y_start, uv.y_end],
        });
    }
    Ok(InstanceBuffers { instances })
}

/// Where the shader places this instance at `time`/`scroll`: cards drift
/// down by their speed and wrap inside the field's vertical span. Must stay
/// in sync with `cards.wgsl`.
pub fn animated_position(inst: &InstanceData, time: f32, scroll: f32, bounds: &FieldBounds) -> Vec3 {
    let span = bounds.max_y * 2.0;
    let raw = inst.position[1] - (time + scroll) * inst.speed;
    let wrapped = (raw + bounds.max_y).rem_euclid(span) - bounds.max_y;
    Vec3::new(inst.position[0], wrapped, inst.position[2])
}
