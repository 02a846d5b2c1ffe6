//! Frame orchestration.
//!
//! One [`Orchestrator`] owns the GPU state, the clock and a handle to the
//! shared parameter store, and drives the fixed per-frame sequence:
//! snapshot parameters, apply tension, rebuild the velocity pipeline if the
//! field changed, write uniforms, encode both passes, submit, swap, publish
//! handles. Collaborators (rendering, UI, gesture input) only ever see
//! committed state through [`StateHandles`].

use crate::clock::SimClock;
use crate::error::EngineError;
use crate::gpu::{GpuContext, SimGpuState, SimUniforms};
use crate::integrator::StepPhase;
use crate::params::{FrameInput, ParameterStore, SimulationParameters, TensionMapping};
use crate::spawn::InitialDistribution;

/// Construction-time engine settings.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Grid dimension N; the particle count is N*N.
    pub grid_dim: u32,
    pub distribution: InitialDistribution,
    pub tension_mapping: TensionMapping,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_dim: 256,
            distribution: InitialDistribution::default(),
            tension_mapping: TensionMapping::default(),
        }
    }
}

/// Committed state published after each frame.
///
/// The buffers hold the state every collaborator must agree on this frame;
/// the next simulation step writes elsewhere, so readers need no
/// synchronization beyond queue ordering.
pub struct StateHandles<'a> {
    pub positions: &'a wgpu::Buffer,
    pub velocities: &'a wgpu::Buffer,
    pub particle_count: u32,
    pub frame: u64,
    pub elapsed: f32,
    /// Hue rotation for the rendering collaborator, from the tension mapping.
    pub color_shift: f32,
}

pub struct Orchestrator {
    ctx: GpuContext,
    state: SimGpuState,
    clock: SimClock,
    store: ParameterStore,
    tension_mapping: TensionMapping,
    last_params: SimulationParameters,
    phase: StepPhase,
    color_shift: f32,
    disposed: bool,
}

impl Orchestrator {
    /// Build the engine: acquire a device, spawn the initial grids, compile
    /// both pipelines.
    pub fn new(config: EngineConfig, store: ParameterStore) -> Result<Self, EngineError> {
        if config.grid_dim == 0 {
            return Err(EngineError::EmptyGrid);
        }

        let ctx = GpuContext::new_blocking()?;

        let params = store.try_snapshot().unwrap_or_default();
        let positions = config.distribution.positions(config.grid_dim);
        let velocities = config.distribution.velocities(config.grid_dim);

        log::info!(
            "driftfield: {} particles ({}x{} grid), field {}",
            positions.len(),
            config.grid_dim,
            config.grid_dim,
            params.field.name()
        );

        let state = SimGpuState::new(&ctx, &params.field, &positions, &velocities);

        Ok(Self {
            ctx,
            state,
            clock: SimClock::default(),
            store,
            tension_mapping: config.tension_mapping,
            last_params: params,
            phase: StepPhase::Idle,
            color_shift: 0.0,
            disposed: false,
        })
    }

    /// Run one simulation frame and publish the committed state.
    pub fn frame(&mut self, input: FrameInput) -> StateHandles<'_> {
        assert!(!self.disposed, "frame() after dispose()");
        assert_eq!(self.phase, StepPhase::Idle);

        // One snapshot per frame; a contended store reuses the last one.
        let params = match self.store.try_snapshot() {
            Some(p) => p,
            None => self.last_params,
        };

        let effects = self.tension_mapping.apply(input.tension, &params);
        self.color_shift = effects.color_shift;

        if params.field != self.last_params.field {
            self.state.rebuild_velocity_pipeline(&self.ctx, &params.field);
        }
        self.last_params = params;

        let (elapsed, delta) = self.clock.tick(input.tracking_lost, effects.time_scale);

        self.state.write_uniforms(
            &self.ctx,
            &SimUniforms {
                time: elapsed,
                delta_time: delta,
                bounds: params.bounds,
                damping: params.damping,
                entropy: effects.entropy,
                strength: effects.strength,
                _pad0: 0.0,
                _pad1: 0.0,
            },
        );

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sim frame"),
            });

        self.phase = self.phase.next();
        debug_assert_eq!(self.phase, StepPhase::VelocityPass);
        self.state.encode_step(&self.ctx, &mut encoder);
        self.phase = self.phase.next();
        debug_assert_eq!(self.phase, StepPhase::PositionPass);

        self.ctx.queue.submit(Some(encoder.finish()));

        self.state.swap();
        self.phase = self.phase.next();
        debug_assert_eq!(self.phase, StepPhase::Swapped);
        self.phase = self.phase.next();

        self.handles()
    }

    /// Handles to the most recently committed state.
    pub fn handles(&self) -> StateHandles<'_> {
        StateHandles {
            positions: self.state.position_buffer(),
            velocities: self.state.velocity_buffer(),
            particle_count: self.state.particle_count(),
            frame: self.clock.frame(),
            elapsed: self.clock.elapsed(),
            color_shift: self.color_shift,
        }
    }

    /// Read the committed position grid back to the CPU. Diagnostics only.
    pub fn read_positions(&self) -> Result<Vec<crate::particle::PositionTexel>, EngineError> {
        Ok(self.state.read_positions(&self.ctx)?)
    }

    /// Read the committed velocity grid back to the CPU.
    pub fn read_velocities(&self) -> Result<Vec<crate::particle::VelocityTexel>, EngineError> {
        Ok(self.state.read_velocities(&self.ctx)?)
    }

    /// Force a fixed delta for deterministic headless stepping.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.clock.set_fixed_delta(delta);
    }

    /// Release all GPU state deterministically. Further frames panic.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::info!("driftfield: disposing after {} frames", self.clock.frame());
        self.state.destroy();
        self.disposed = true;
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}
