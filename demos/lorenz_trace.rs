//! # Lorenz Trace (CPU, no GPU required)
//!
//! Steps one particle through the Lorenz field with the CPU reference
//! integrator and prints the trajectory. Useful for eyeballing attractor
//! behavior and damping without a device.
//!
//! Run with: `cargo run --example lorenz_trace`

use driftfield::field::VectorField;
use driftfield::integrator::step_particle;
use driftfield::params::SimulationParameters;
use glam::Vec3;

fn main() {
    env_logger::init();

    let params = SimulationParameters {
        field: VectorField::Lorenz {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        },
        damping: 0.99,
        bounds: 30.0,
        ..Default::default()
    };

    let dt = 1.0 / 60.0;
    let mut pos = Vec3::new(0.1, 0.0, 0.0);
    let mut vel = Vec3::ZERO;

    println!("step      x        y        z      speed");
    for step in 0..600 {
        let (p, v) = step_particle(&params, pos, vel, step as f32 * dt, dt);
        pos = p;
        vel = v;
        if step % 20 == 0 {
            println!(
                "{:4}  {:7.3}  {:7.3}  {:7.3}  {:7.3}",
                step,
                pos.x,
                pos.y,
                pos.z,
                vel.length()
            );
        }
    }
}
