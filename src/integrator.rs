//! Two-pass integration with toroidal boundaries.
//!
//! One simulation step is two compute passes over the particle grids:
//!
//! - **Velocity pass**: sample the vector field at the particle's previous
//!   position, blend with entropy noise, integrate and damp. Writes the
//!   velocity write-buffer.
//! - **Position pass**: advance the previous position by the average of the
//!   previous and freshly written velocities (Verlet-style averaging, chosen
//!   for stability over stiff attractor fields), then wrap each axis into
//!   `[-bounds, bounds)`.
//!
//! The split exists because a pass may never read and write the same
//! storage; each pass reads only committed buffers and writes only the
//! other half of the double buffer. Positions that diverge to NaN stay
//! confined to their own texel since every texel is computed independently
//! from the same-frame read buffers.
//!
//! The CPU functions here are the numerical reference for the generated
//! WGSL; [`velocity_pass_source`] and [`position_pass_source`] emit the
//! compute shaders the GPU actually runs.

use glam::Vec3;

use crate::entropy;
use crate::field::VectorField;
use crate::noise;
use crate::params::SimulationParameters;

/// Workgroup size shared by both compute passes.
pub const WORKGROUP_SIZE: u32 = 256;

/// Frame phase bookkeeping. `PositionPass` always immediately follows
/// `VelocityPass` within the same frame; no transition may be skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepPhase {
    Idle,
    VelocityPass,
    PositionPass,
    Swapped,
}

impl StepPhase {
    pub fn next(self) -> StepPhase {
        match self {
            StepPhase::Idle => StepPhase::VelocityPass,
            StepPhase::VelocityPass => StepPhase::PositionPass,
            StepPhase::PositionPass => StepPhase::Swapped,
            StepPhase::Swapped => StepPhase::Idle,
        }
    }
}

/// Wrap one coordinate into `[-bounds, bounds)` (toroidal topology).
///
/// Exactly idempotent: a value already inside the range maps to itself.
#[inline]
pub fn wrap_axis(x: f32, bounds: f32) -> f32 {
    let span = 2.0 * bounds;
    x - ((x + bounds) / span).floor() * span
}

/// Wrap all three axes.
#[inline]
pub fn wrap(p: Vec3, bounds: f32) -> Vec3 {
    Vec3::new(
        wrap_axis(p.x, bounds),
        wrap_axis(p.y, bounds),
        wrap_axis(p.z, bounds),
    )
}

/// Velocity update: integrate acceleration, then damp.
#[inline]
pub fn velocity_step(vel: Vec3, accel: Vec3, dt: f32, damping: f32) -> Vec3 {
    (vel + accel * dt) * damping
}

/// Position update: Verlet-style averaged velocity, then toroidal wrap.
#[inline]
pub fn position_step(pos: Vec3, vel_prev: Vec3, vel_next: Vec3, dt: f32, bounds: f32) -> Vec3 {
    let avg = (vel_prev + vel_next) * 0.5;
    wrap(pos + avg * dt, bounds)
}

/// CPU reference for one full simulation step of a single particle.
///
/// Mirrors the two GPU passes exactly; used by tests and headless tracing.
pub fn step_particle(
    params: &SimulationParameters,
    pos: Vec3,
    vel: Vec3,
    time: f32,
    dt: f32,
) -> (Vec3, Vec3) {
    let organized = params.field.eval(pos, time);
    let accel = entropy::mix(organized, pos, time, params.entropy) * params.strength;
    let vel_next = velocity_step(vel, accel, dt, params.damping);
    let pos_next = position_step(pos, vel, vel_next, dt, params.bounds);
    (pos_next, vel_next)
}

const UNIFORMS_WGSL: &str = r#"
struct SimUniforms {
    time: f32,
    delta_time: f32,
    bounds: f32,
    damping: f32,
    entropy: f32,
    strength: f32,
    pad0: f32,
    pad1: f32,
};
"#;

/// Generate the velocity-pass compute shader for a field.
///
/// Bindings: 0 = positions (read), 1 = velocities (read), 2 = velocities
/// (write), 3 = uniforms. Field coefficients are baked in as literals.
pub fn velocity_pass_source(field: &VectorField) -> String {
    let noise_wgsl = if field.uses_noise() {
        format!("{}{}", noise::NOISE_WGSL, noise::CURL_WGSL)
    } else {
        String::new()
    };

    format!(
        r#"{noise_wgsl}{entropy_wgsl}{uniforms_wgsl}
@group(0) @binding(0) var<storage, read> positions_in: array<vec4<f32>>;
@group(0) @binding(1) var<storage, read> velocities_in: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read_write> velocities_out: array<vec4<f32>>;
@group(0) @binding(3) var<uniform> sim: SimUniforms;

{field_fn}
@compute @workgroup_size({workgroup})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&positions_in) {{
        return;
    }}

    let pos = positions_in[index].xyz;
    let vel = velocities_in[index].xyz;

    let organized = field_accel(pos, sim.time);
    let accel = entropy_mix(organized, pos, sim.time, sim.entropy) * sim.strength;
    let next = (vel + accel * sim.delta_time) * sim.damping;

    velocities_out[index] = vec4<f32>(next, velocities_in[index].w);
}}
"#,
        noise_wgsl = noise_wgsl,
        entropy_wgsl = entropy::ENTROPY_WGSL,
        uniforms_wgsl = UNIFORMS_WGSL,
        field_fn = field.to_wgsl(),
        workgroup = WORKGROUP_SIZE,
    )
}

/// Generate the position-pass compute shader (field-independent).
///
/// Bindings: 0 = positions (read), 1 = previous velocities (read), 2 =
/// freshly written velocities (read), 3 = positions (write), 4 = uniforms.
pub fn position_pass_source() -> String {
    format!(
        r#"{uniforms_wgsl}
@group(0) @binding(0) var<storage, read> positions_in: array<vec4<f32>>;
@group(0) @binding(1) var<storage, read> velocities_prev: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read> velocities_next: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read_write> positions_out: array<vec4<f32>>;
@group(0) @binding(4) var<uniform> sim: SimUniforms;

fn wrap_axis(x: f32, bounds: f32) -> f32 {{
    let span = 2.0 * bounds;
    return x - floor((x + bounds) / span) * span;
}}

@compute @workgroup_size({workgroup})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= arrayLength(&positions_in) {{
        return;
    }}

    let pos = positions_in[index].xyz;
    let avg = (velocities_prev[index].xyz + velocities_next[index].xyz) * 0.5;
    let moved = pos + avg * sim.delta_time;
    let wrapped = vec3<f32>(
        wrap_axis(moved.x, sim.bounds),
        wrap_axis(moved.y, sim.bounds),
        wrap_axis(moved.z, sim.bounds)
    );

    positions_out[index] = vec4<f32>(wrapped, positions_in[index].w);
}}
"#,
        uniforms_wgsl = UNIFORMS_WGSL,
        workgroup = WORKGROUP_SIZE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn velocity_pass_valid_for_all_nine_fields() {
        for sel in 0..VectorField::COUNT {
            let field = VectorField::from_selector(sel);
            let source = velocity_pass_source(&field);
            validate_wgsl(&source)
                .unwrap_or_else(|e| panic!("{} velocity pass invalid: {}", field.name(), e));
            assert!(source.contains(field.name()));
        }
    }

    #[test]
    fn position_pass_is_valid_wgsl() {
        let source = position_pass_source();
        validate_wgsl(&source).expect("position pass should be valid");
        assert!(source.contains("wrap_axis"));
    }

    #[test]
    fn wrap_is_idempotent() {
        let bounds = [0.5_f32, 1.0, 3.0, 30.0];
        let xs = [-1000.0_f32, -30.0, -3.0001, -0.1, 0.0, 0.1, 2.9999, 3.0, 42.5, 1e6];
        for b in bounds {
            for x in xs {
                let once = wrap_axis(x, b);
                let twice = wrap_axis(once, b);
                assert_eq!(once, twice, "wrap not idempotent for x={}, b={}", x, b);
                assert!((-b..b).contains(&once), "wrap({}, {}) = {} out of range", x, b, once);
            }
        }
    }

    #[test]
    fn wrap_reenters_opposite_edge() {
        assert_eq!(wrap_axis(1.25, 1.0), -0.75);
        assert_eq!(wrap_axis(-1.25, 1.0), 0.75);
        assert_eq!(wrap_axis(1.0, 1.0), -1.0);
    }

    // With damping < 1 and no acceleration, speed never increases.
    #[test]
    fn damping_bounds_kinetic_energy() {
        let mut vel = Vec3::new(3.0, -2.0, 5.0);
        let mut prev_speed = vel.length();
        for _ in 0..1000 {
            vel = velocity_step(vel, Vec3::ZERO, 1.0 / 60.0, 0.99);
            let speed = vel.length();
            assert!(speed <= prev_speed);
            prev_speed = speed;
        }
        assert!(prev_speed < 1e-3);
    }

    // sigma=10, rho=28, beta=8/3, damping=0.99, dt=1/60: a particle seeded
    // near the origin stays finite and inside the wrapped box for 10k steps.
    #[test]
    fn lorenz_remains_bounded_for_ten_thousand_steps() {
        let params = SimulationParameters {
            field: VectorField::Lorenz {
                sigma: 10.0,
                rho: 28.0,
                beta: 8.0 / 3.0,
            },
            damping: 0.99,
            bounds: 30.0,
            entropy: 0.0,
            strength: 1.0,
            time_scale: 1.0,
        };
        let dt = 1.0 / 60.0;
        let mut pos = Vec3::new(0.1, 0.0, 0.0);
        let mut vel = Vec3::ZERO;
        for step in 0..10_000 {
            let (p, v) = step_particle(&params, pos, vel, step as f32 * dt, dt);
            pos = p;
            vel = v;
            assert!(pos.is_finite(), "position diverged at step {}", step);
            assert!(vel.is_finite(), "velocity diverged at step {}", step);
            assert!(
                pos.abs().max_element() <= params.bounds * 2.0,
                "escaped the box at step {}: {:?}",
                step,
                pos
            );
        }
    }

    // Zero acceleration and zero entropy: nothing to damp, nothing moves.
    #[test]
    fn zero_field_zero_entropy_stays_stationary() {
        let params = SimulationParameters {
            field: VectorField::CurlNoise {
                scale: 1.0,
                speed: 0.0,
                strength: 0.0,
            },
            entropy: 0.0,
            ..Default::default()
        };
        let start = Vec3::new(0.4, -0.7, 0.2);
        let mut pos = start;
        let mut vel = Vec3::ZERO;
        for step in 0..500 {
            let (p, v) = step_particle(&params, pos, vel, step as f32 / 60.0, 1.0 / 60.0);
            pos = p;
            vel = v;
        }
        assert_eq!(pos, start);
        assert_eq!(vel, Vec3::ZERO);
    }

    #[test]
    fn global_strength_zero_also_freezes_motion() {
        let params = SimulationParameters {
            field: VectorField::from_selector(1),
            strength: 0.0,
            entropy: 0.0,
            ..Default::default()
        };
        let start = Vec3::splat(0.3);
        let (pos, vel) = step_particle(&params, start, Vec3::ZERO, 0.0, 1.0 / 60.0);
        assert_eq!(pos, start);
        assert_eq!(vel, Vec3::ZERO);
    }

    #[test]
    fn phase_cycle_is_fixed_order() {
        let mut phase = StepPhase::Idle;
        let expected = [
            StepPhase::VelocityPass,
            StepPhase::PositionPass,
            StepPhase::Swapped,
            StepPhase::Idle,
        ];
        for want in expected {
            phase = phase.next();
            assert_eq!(phase, want);
        }
    }
}
