//! Per-texel particle state layouts.
//!
//! The particle set is not an explicit array of structs: it is two
//! same-sized grids of 4-component float texels, one for position and one
//! for velocity. A particle's identity is its texel index, stable for the
//! lifetime of the simulation. Both layouts match `vec4<f32>` on the GPU.

use bytemuck::{Pod, Zeroable};

/// One position texel: `(x, y, z, lifetime)`.
///
/// `lifetime` is carried through both passes untouched; it is reserved for
/// the rendering collaborator.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PositionTexel {
    pub pos: [f32; 3],
    pub lifetime: f32,
}

impl PositionTexel {
    pub fn new(x: f32, y: f32, z: f32, lifetime: f32) -> Self {
        Self {
            pos: [x, y, z],
            lifetime,
        }
    }
}

/// One velocity texel: `(vx, vy, vz, unused)`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct VelocityTexel {
    pub vel: [f32; 3],
    pub unused: f32,
}

impl VelocityTexel {
    pub const ZERO: Self = Self {
        vel: [0.0; 3],
        unused: 0.0,
    };
}
