//! # Curl Flow (headless GPU)
//!
//! Runs the full engine on the default curl-noise field for a few hundred
//! frames, ramping the tension input up and back down, and prints grid
//! statistics from periodic readbacks.
//!
//! Run with: `cargo run --example curl_flow`

use driftfield::prelude::*;

fn main() -> Result<(), EngineError> {
    env_logger::init();

    let store = ParameterStore::default();
    let config = EngineConfig {
        grid_dim: 64,
        ..Default::default()
    };

    let mut engine = Orchestrator::new(config, store.clone())?;
    engine.set_fixed_delta(Some(1.0 / 60.0));

    println!("frame  tension  mean_speed  max_|pos|");
    for frame in 0..300u32 {
        // Triangle wave: calm, tense, calm again.
        let tension = 1.0 - ((frame as f32 / 150.0) - 1.0).abs();
        let handles = engine.frame(FrameInput {
            tension,
            tracking_lost: false,
        });
        let particle_count = handles.particle_count;

        if frame % 50 == 0 {
            let velocities = engine.read_velocities()?;
            let positions = engine.read_positions()?;
            let mean_speed: f32 = velocities
                .iter()
                .map(|v| {
                    let [x, y, z] = v.vel;
                    (x * x + y * y + z * z).sqrt()
                })
                .sum::<f32>()
                / velocities.len() as f32;
            let max_pos = positions
                .iter()
                .flat_map(|p| p.pos)
                .fold(0.0f32, |m, c| m.max(c.abs()));
            println!(
                "{:5}  {:7.2}  {:10.4}  {:9.4}  ({} particles)",
                frame, tension, mean_speed, max_pos, particle_count
            );
        }
    }

    engine.dispose();
    Ok(())
}
