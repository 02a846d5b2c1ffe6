//! Smooth noise kernel and its divergence-free curl.
//!
//! `smooth_noise3` is a deterministic simplex-type scalar field,
//! approximately zero-mean with values in roughly [-1, 1]. `curl` builds a
//! three-channel vector potential from offset copies of the scalar field and
//! takes its curl with symmetric finite differences, which is divergence-free
//! to within discretization error. That property is what gives the curl-noise
//! flow its fluid-like, non-pooling motion.
//!
//! The CPU implementation is the numerical reference for the WGSL kernels in
//! [`NOISE_WGSL`] and [`CURL_WGSL`]; it runs its internals in f64 so the
//! finite differences stay clean at small `eps`.

use glam::{DVec3, DVec4, Vec3};
use glam::{Vec3Swizzles, Vec4Swizzles};

/// Default finite-difference step, expressed as a fraction of noise-space
/// units. Must stay small relative to the sampling scale (ratio <= 1%) or
/// the curl estimate degrades into uncorrelated noise.
pub const DEFAULT_CURL_EPS: f32 = 0.01;

/// Offsets decorrelating the three channels of the vector potential.
const CHANNEL_X: DVec3 = DVec3::new(100.0, 0.0, 0.0);
const CHANNEL_Y: DVec3 = DVec3::new(0.0, 100.0, 0.0);
const CHANNEL_Z: DVec3 = DVec3::new(0.0, 0.0, 100.0);

fn step3(edge: DVec3, x: DVec3) -> DVec3 {
    DVec3::select(x.cmpge(edge), DVec3::ONE, DVec3::ZERO)
}

fn step4(edge: DVec4, x: DVec4) -> DVec4 {
    DVec4::select(x.cmpge(edge), DVec4::ONE, DVec4::ZERO)
}

fn mod289_3(x: DVec3) -> DVec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: DVec4) -> DVec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute4(x: DVec4) -> DVec4 {
    mod289_4(((x * 34.0) + 1.0) * x)
}

fn taylor_inv_sqrt4(r: DVec4) -> DVec4 {
    1.79284291400159 - 0.85373472095314 * r
}

fn noise3_f64(v: DVec3) -> f64 {
    const C_X: f64 = 1.0 / 6.0;
    const C_Y: f64 = 1.0 / 3.0;

    // First corner
    let mut i = (v + v.dot(DVec3::splat(C_Y))).floor();
    let x0 = v - i + i.dot(DVec3::splat(C_X));

    // Other corners
    let g = step3(x0.yzx(), x0);
    let l = 1.0 - g;
    let i1 = g.min(l.zxy());
    let i2 = g.max(l.zxy());

    let x1 = x0 - i1 + C_X;
    let x2 = x0 - i2 + C_Y;
    let x3 = x0 - 0.5;

    // Permutations
    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(DVec4::splat(i.z) + DVec4::new(0.0, i1.z, i2.z, 1.0))
                + DVec4::splat(i.y)
                + DVec4::new(0.0, i1.y, i2.y, 1.0),
        ) + DVec4::splat(i.x)
            + DVec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients
    let n_ = 1.0 / 7.0;
    let ns = DVec3::new(2.0 * n_, 0.5 * n_ - 1.0, n_);

    let j = p - 49.0 * (p * ns.z * ns.z).floor();

    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + ns.y;
    let y = y_ * ns.x + ns.y;
    let h = 1.0 - x.abs() - y.abs();

    let b0 = DVec4::new(x.x, x.y, y.x, y.y);
    let b1 = DVec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + 1.0;
    let s1 = b1.floor() * 2.0 + 1.0;
    let sh = -step4(h, DVec4::ZERO);

    let a0 = b0.xzyw() + s0.xzyw() * sh.xxyy();
    let a1 = b1.xzyw() + s1.xzyw() * sh.zzww();

    let mut p0 = DVec3::new(a0.x, a0.y, h.x);
    let mut p1 = DVec3::new(a0.z, a0.w, h.y);
    let mut p2 = DVec3::new(a1.x, a1.y, h.z);
    let mut p3 = DVec3::new(a1.z, a1.w, h.w);

    // Normalize gradients
    let norm = taylor_inv_sqrt4(DVec4::new(
        p0.dot(p0),
        p1.dot(p1),
        p2.dot(p2),
        p3.dot(p3),
    ));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix contributions from the four corners
    let m = (DVec4::splat(0.6)
        - DVec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
    .max(DVec4::ZERO);
    let m2 = m * m;
    42.0 * (m2 * m2).dot(DVec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Deterministic, continuous, approximately zero-mean scalar noise.
pub fn smooth_noise3(p: Vec3) -> f32 {
    noise3_f64(p.as_dvec3()) as f32
}

fn potential(q: DVec3) -> DVec3 {
    DVec3::new(
        noise3_f64(q + CHANNEL_X),
        noise3_f64(q + CHANNEL_Y),
        noise3_f64(q + CHANNEL_Z),
    )
}

/// Curl of the three-channel noise potential sampled at `p * scale`.
///
/// Uses six symmetric offset points (`q +- eps` along each axis) and central
/// differences; the discrete cross-derivatives commute, so the discrete
/// divergence of the result cancels to rounding error.
pub fn curl(p: Vec3, scale: f32, eps: f32) -> Vec3 {
    let q = p.as_dvec3() * scale as f64;
    let e = eps as f64;

    let px = potential(q + DVec3::X * e);
    let mx = potential(q - DVec3::X * e);
    let py = potential(q + DVec3::Y * e);
    let my = potential(q - DVec3::Y * e);
    let pz = potential(q + DVec3::Z * e);
    let mz = potential(q - DVec3::Z * e);

    let c = DVec3::new(
        (py.z - my.z) - (pz.y - mz.y),
        (pz.x - mz.x) - (px.z - mx.z),
        (px.y - mx.y) - (py.x - my.x),
    ) / (2.0 * e);
    c.as_vec3()
}

/// Multi-octave curl field.
///
/// Sums `octaves` curl layers at doubling frequency and halving amplitude,
/// each with its own phase offset. A single octave shows a directional bias
/// from the underlying simplex lattice; two or three octaves wash it out.
pub fn curl_octaves(p: Vec3, scale: f32, eps: f32, octaves: u32) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut amp = 1.0;
    let mut freq = scale;
    for i in 0..octaves {
        let phase = i as f32 * 19.1;
        let offset = Vec3::new(phase, phase * 0.7, -phase);
        sum += curl(p + offset, freq, eps) * amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    sum
}

/// WGSL source for the simplex noise kernel (`noise3`).
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

// 3D simplex noise, approximately in [-1, 1]
fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#;

/// WGSL source for the curl kernel (`curl_noise`, `curl_octaves`).
/// Requires [`NOISE_WGSL`] to be present in the same module.
pub const CURL_WGSL: &str = r#"
fn noise_potential(q: vec3<f32>) -> vec3<f32> {
    return vec3<f32>(
        noise3(q + vec3<f32>(100.0, 0.0, 0.0)),
        noise3(q + vec3<f32>(0.0, 100.0, 0.0)),
        noise3(q + vec3<f32>(0.0, 0.0, 100.0))
    );
}

// Divergence-free curl of the noise potential at p * scale
fn curl_noise(p: vec3<f32>, scale: f32, eps: f32) -> vec3<f32> {
    let q = p * scale;
    let dx = vec3<f32>(eps, 0.0, 0.0);
    let dy = vec3<f32>(0.0, eps, 0.0);
    let dz = vec3<f32>(0.0, 0.0, eps);

    let px = noise_potential(q + dx);
    let mx = noise_potential(q - dx);
    let py = noise_potential(q + dy);
    let my = noise_potential(q - dy);
    let pz = noise_potential(q + dz);
    let mz = noise_potential(q - dz);

    return vec3<f32>(
        (py.z - my.z) - (pz.y - mz.y),
        (pz.x - mz.x) - (px.z - mx.z),
        (px.y - mx.y) - (py.x - my.x)
    ) / (2.0 * eps);
}

fn curl_octaves(p: vec3<f32>, scale: f32, eps: f32, octaves: i32) -> vec3<f32> {
    var sum = vec3<f32>(0.0);
    var amp = 1.0;
    var freq = scale;
    for (var i = 0; i < octaves; i++) {
        let phase = f32(i) * 19.1;
        let offset = vec3<f32>(phase, phase * 0.7, -phase);
        sum += curl_noise(p + offset, freq, eps) * amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    return sum;
}
"#;
