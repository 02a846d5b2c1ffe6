//! GPU device ownership and the double-buffered simulation state.
//!
//! The engine runs headless: no surface, no swapchain. A [`GpuContext`] owns
//! the adapter, device and queue; [`SimGpuState`] owns the four state
//! buffers (two position, two velocity), the uniform buffer and the two
//! compute pipelines, and records both passes of a frame into one command
//! encoder.
//!
//! The velocity pipeline is field-specific because coefficients are baked
//! into its WGSL as literals; it is rebuilt whenever the active field
//! changes. The position pipeline never changes.

use bytemuck::{Pod, Zeroable};

use crate::buffers::DoubleBuffer;
use crate::error::GpuError;
use crate::field::VectorField;
use crate::integrator::{position_pass_source, velocity_pass_source, WORKGROUP_SIZE};
use crate::particle::{PositionTexel, VelocityTexel};

/// Uniforms shared by both passes. Layout must match `SimUniforms` in the
/// generated WGSL (std140: 8 floats, 32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SimUniforms {
    pub time: f32,
    pub delta_time: f32,
    pub bounds: f32,
    pub damping: f32,
    pub entropy: f32,
    pub strength: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

/// Owns the wgpu adapter, device and queue for headless compute.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("driftfield device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self { device, queue })
    }

    /// Blocking constructor for callers without an executor.
    pub fn new_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::new())
    }
}

fn state_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::VERTEX
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    source: &str,
) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

/// Double-buffered particle state plus the two compute pipelines.
pub struct SimGpuState {
    positions: DoubleBuffer<wgpu::Buffer>,
    velocities: DoubleBuffer<wgpu::Buffer>,
    uniform_buffer: wgpu::Buffer,
    velocity_layout: wgpu::BindGroupLayout,
    position_layout: wgpu::BindGroupLayout,
    velocity_pipeline: wgpu::ComputePipeline,
    position_pipeline: wgpu::ComputePipeline,
    particle_count: u32,
    buffer_size: u64,
}

impl SimGpuState {
    pub fn new(
        ctx: &GpuContext,
        field: &VectorField,
        initial_positions: &[PositionTexel],
        initial_velocities: &[VelocityTexel],
    ) -> Self {
        let device = &ctx.device;
        let particle_count = initial_positions.len() as u32;
        let buffer_size = (initial_positions.len() * std::mem::size_of::<PositionTexel>()) as u64;

        let positions = DoubleBuffer::new(
            state_buffer(device, "positions a", buffer_size),
            state_buffer(device, "positions b", buffer_size),
        );
        let velocities = DoubleBuffer::new(
            state_buffer(device, "velocities a", buffer_size),
            state_buffer(device, "velocities b", buffer_size),
        );

        ctx.queue.write_buffer(
            positions.read(),
            0,
            bytemuck::cast_slice(initial_positions),
        );
        ctx.queue.write_buffer(
            velocities.read(),
            0,
            bytemuck::cast_slice(initial_velocities),
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sim uniforms"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let velocity_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("velocity pass layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                uniform_entry(3),
            ],
        });
        let position_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("position pass layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                uniform_entry(4),
            ],
        });

        let velocity_pipeline = compute_pipeline(
            device,
            "velocity pass",
            &velocity_layout,
            &velocity_pass_source(field),
        );
        let position_pipeline = compute_pipeline(
            device,
            "position pass",
            &position_layout,
            &position_pass_source(),
        );

        Self {
            positions,
            velocities,
            uniform_buffer,
            velocity_layout,
            position_layout,
            velocity_pipeline,
            position_pipeline,
            particle_count,
            buffer_size,
        }
    }

    /// Recompile the velocity pipeline for a new field. The position
    /// pipeline is untouched.
    pub fn rebuild_velocity_pipeline(&mut self, ctx: &GpuContext, field: &VectorField) {
        log::info!("rebuilding velocity pipeline for field {}", field.name());
        self.velocity_pipeline = compute_pipeline(
            &ctx.device,
            "velocity pass",
            &self.velocity_layout,
            &velocity_pass_source(field),
        );
    }

    pub fn write_uniforms(&self, ctx: &GpuContext, uniforms: &SimUniforms) {
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record both passes of one step into `encoder`.
    ///
    /// Reads the committed position/velocity buffers, writes the other halves.
    /// The caller submits and then calls [`swap`](Self::swap).
    pub fn encode_step(&self, ctx: &GpuContext, encoder: &mut wgpu::CommandEncoder) {
        let device = &ctx.device;
        let workgroups = self.particle_count.div_ceil(WORKGROUP_SIZE);

        let velocity_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("velocity pass bind group"),
            layout: &self.velocity_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.positions.read().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.velocities.read().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.velocities.write().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let position_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("position pass bind group"),
            layout: &self.position_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.positions.read().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.velocities.read().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.velocities.write().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.positions.write().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("velocity pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.velocity_pipeline);
            pass.set_bind_group(0, &velocity_bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("position pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.position_pipeline);
            pass.set_bind_group(0, &position_bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
    }

    /// Commit the frame: both grids flip roles together.
    pub fn swap(&mut self) {
        self.positions.swap();
        self.velocities.swap();
    }

    /// Committed position buffer, for rendering or readback.
    pub fn position_buffer(&self) -> &wgpu::Buffer {
        self.positions.read()
    }

    /// Committed velocity buffer.
    pub fn velocity_buffer(&self) -> &wgpu::Buffer {
        self.velocities.read()
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// Copy the committed position grid back to the CPU.
    ///
    /// Synchronous; meant for diagnostics and headless runs, not the
    /// per-frame path.
    pub fn read_positions(&self, ctx: &GpuContext) -> Result<Vec<PositionTexel>, GpuError> {
        self.read_state(ctx, self.positions.read())
    }

    /// Copy the committed velocity grid back to the CPU.
    pub fn read_velocities(&self, ctx: &GpuContext) -> Result<Vec<VelocityTexel>, GpuError> {
        self.read_state(ctx, self.velocities.read())
    }

    fn read_state<T: Pod>(
        &self,
        ctx: &GpuContext,
        source: &wgpu::Buffer,
    ) -> Result<Vec<T>, GpuError> {
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging"),
            size: self.buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, self.buffer_size);
        ctx.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::BufferMapping("map callback dropped".into()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let data = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        staging.unmap();
        Ok(data)
    }

    /// Explicitly release every GPU resource this state owns.
    pub fn destroy(&self) {
        let (pa, pb) = self.positions.both();
        let (va, vb) = self.velocities.both();
        pa.destroy();
        pb.destroy();
        va.destroy();
        vb.destroy();
        self.uniform_buffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_are_32_bytes() {
        assert_eq!(std::mem::size_of::<SimUniforms>(), 32);
    }

    #[test]
    fn uniforms_cast_to_bytes() {
        let u = SimUniforms {
            time: 1.0,
            delta_time: 0.016,
            bounds: 3.0,
            damping: 0.99,
            entropy: 0.5,
            strength: 1.0,
            _pad0: 0.0,
            _pad1: 0.0,
        };
        assert_eq!(bytemuck::bytes_of(&u).len(), 32);
    }
}
