//! # driftfield - GPU-resident particle flow engine
//!
//! A headless compute engine that keeps a grid of N*N particles entirely on
//! the GPU and steers them through a selectable family of vector fields:
//! curl noise plus eight strange attractors (Lorenz, Aizawa, Rossler, Chen,
//! Thomas, gravity lattice, Halvorsen, four-wing).
//!
//! Particle state never round-trips through the CPU: positions and
//! velocities live in two double-buffered `vec4<f32>` grids, each frame runs
//! a velocity pass and a position pass over them, and collaborators
//! (rendering, UI, gesture input) receive buffer handles to the committed
//! state.
//!
//! ## Quick Start
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let store = ParameterStore::default();
//!     store.update(|p| p.field = VectorField::from_selector(1)); // Lorenz
//!
//!     let mut engine = Orchestrator::new(EngineConfig::default(), store.clone())?;
//!     loop {
//!         let input = FrameInput { tension: 0.3, tracking_lost: false };
//!         let handles = engine.frame(input);
//!         // hand handles.positions / handles.velocities to the renderer
//!         # break;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! - **Fields**: [`VectorField`] is a closed set of acceleration fields with
//!   their coefficient bundles. Coefficients are baked into the generated
//!   WGSL as literals, so changing the field recompiles one pipeline.
//! - **Entropy**: an external tension scalar in `[0, 1]` blends the
//!   organized field with per-particle hash noise, from fully coherent at
//!   zero to fully chaotic at one.
//! - **Toroidal bounds**: positions wrap into `[-bounds, bounds)` on every
//!   axis, so no trajectory escapes and no energy is injected at walls.
//!
//! The CPU-side field and integration functions mirror the generated WGSL
//! exactly and serve as the numerical reference for tests and headless
//! traces.

pub mod buffers;
pub mod clock;
pub mod entropy;
pub mod error;
pub mod field;
pub mod gpu;
pub mod integrator;
pub mod noise;
pub mod orchestrator;
pub mod params;
pub mod particle;
pub mod spawn;

pub use error::{EngineError, GpuError};
pub use field::VectorField;
pub use orchestrator::{EngineConfig, Orchestrator, StateHandles};
pub use params::{FrameInput, ParameterStore, SimulationParameters, TensionMapping};
pub use spawn::InitialDistribution;

/// Common imports for driving the engine.
pub mod prelude {
    pub use crate::error::{EngineError, GpuError};
    pub use crate::field::VectorField;
    pub use crate::orchestrator::{EngineConfig, Orchestrator, StateHandles};
    pub use crate::params::{
        FrameInput, ParameterStore, SimulationParameters, TensionMapping,
    };
    pub use crate::spawn::InitialDistribution;
}
