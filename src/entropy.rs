//! Entropy mixing: organized motion blended with decorrelated noise.
//!
//! The external tension scalar arrives as `entropy` in [0, 1]. At 0 the
//! particle follows the organized vector field untouched; at 1 it follows a
//! per-particle pseudo-random vector hashed from its position and the frame
//! time. The blend is a stateless lerp written so both endpoints are exact
//! in floating point.

use glam::Vec3;

/// Integer avalanche hash. Matches the WGSL `hash` below bit for bit.
#[inline]
pub fn hash(mut x: u32) -> u32 {
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

#[inline]
fn rand_signed(seed: u32) -> f32 {
    hash(seed) as f32 / 2147483647.5 - 1.0
}

/// Uncorrelated pseudo-random vector in [-1, 1] per axis, hashed from
/// position bits and time bits.
pub fn chaos_vector(position: Vec3, time: f32) -> Vec3 {
    let seed = hash(
        position.x.to_bits()
            ^ hash(position.y.to_bits() ^ hash(position.z.to_bits() ^ time.to_bits())),
    );
    Vec3::new(
        rand_signed(seed),
        rand_signed(seed.wrapping_add(1)),
        rand_signed(seed.wrapping_add(2)),
    )
}

/// Blend the organized field with decorrelated noise.
///
/// `entropy = 0` returns `organized` exactly; `entropy = 1` returns the
/// hashed vector exactly, independent of `organized`.
pub fn mix(organized: Vec3, position: Vec3, time: f32, entropy: f32) -> Vec3 {
    let chaos = chaos_vector(position, time);
    organized * (1.0 - entropy) + chaos * entropy
}

/// WGSL source for the entropy mixer (`hash`, `chaos_vector`, `entropy_mix`).
pub const ENTROPY_WGSL: &str = r#"
fn hash(n: u32) -> u32 {
    var x = n;
    x = x ^ (x >> 17u);
    x = x * 0xed5ad4bbu;
    x = x ^ (x >> 11u);
    x = x * 0xac4c1b51u;
    x = x ^ (x >> 15u);
    x = x * 0x31848babu;
    x = x ^ (x >> 14u);
    return x;
}

fn rand_signed(seed: u32) -> f32 {
    return f32(hash(seed)) / 2147483647.5 - 1.0;
}

fn chaos_vector(position: vec3<f32>, time: f32) -> vec3<f32> {
    let seed = hash(bitcast<u32>(position.x)
        ^ hash(bitcast<u32>(position.y)
        ^ hash(bitcast<u32>(position.z) ^ bitcast<u32>(time))));
    return vec3<f32>(
        rand_signed(seed),
        rand_signed(seed + 1u),
        rand_signed(seed + 2u)
    );
}

fn entropy_mix(organized: vec3<f32>, position: vec3<f32>, time: f32, entropy: f32) -> vec3<f32> {
    return organized * (1.0 - entropy) + chaos_vector(position, time) * entropy;
}
"#;
