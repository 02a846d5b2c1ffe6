//! Vector field catalogue.
//!
//! Nine acceleration fields share one execution path: a tagged enum whose
//! variant carries the user-tunable coefficients. Each variant knows how to
//! evaluate itself on the CPU (the numerical reference, used by tests and
//! headless tracing) and how to emit itself as the WGSL `field_accel`
//! function baked into the velocity-pass compute shader. Coefficients are
//! baked as literals at codegen time; changing them means regenerating the
//! shader, which the orchestrator does when the frame snapshot differs from
//! the compiled field.
//!
//! The attractor variants are closed-form ODE right-hand sides evaluated at
//! the particle's own position. There is no shared attractor state: every
//! particle independently orbits or diverges under the same formula, which
//! is why the integrator's damping and toroidal wrap exist.

use glam::Vec3;

use crate::noise;

/// Acceleration field selected per frame, with its coefficient bundle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VectorField {
    /// Incompressible curl-noise flow.
    CurlNoise { scale: f32, speed: f32, strength: f32 },
    /// Lorenz attractor (sigma, rho, beta).
    Lorenz { sigma: f32, rho: f32, beta: f32 },
    /// Aizawa attractor.
    Aizawa { a: f32, b: f32, c: f32, d: f32, e: f32, f: f32 },
    /// Roessler attractor.
    Rossler { a: f32, b: f32, c: f32 },
    /// Chen attractor.
    Chen { a: f32, b: f32, c: f32 },
    /// Thomas cyclically-symmetric attractor.
    Thomas { b: f32 },
    /// Inverse-power attraction toward the nearest lattice point and its six
    /// axis-aligned neighbors, summed so cell transitions stay smooth.
    GravityLattice { spacing: f32, strength: f32, decay: f32, offset: Vec3 },
    /// Halvorsen attractor.
    Halvorsen { alpha: f32 },
    /// Four-wing attractor.
    FourWing { a: f32, b: f32, c: f32, d: f32, k: f32 },
}

impl Default for VectorField {
    fn default() -> Self {
        VectorField::CurlNoise {
            scale: 1.5,
            speed: 0.15,
            strength: 1.0,
        }
    }
}

/// Format an f32 as a WGSL float literal (always keeps a decimal point).
fn lit(v: f32) -> String {
    format!("{:?}", v)
}

impl VectorField {
    /// Number of field families in the catalogue.
    pub const COUNT: u32 = 9;

    /// Selector integer for this field (0-8).
    pub fn selector(&self) -> u32 {
        match self {
            VectorField::CurlNoise { .. } => 0,
            VectorField::Lorenz { .. } => 1,
            VectorField::Aizawa { .. } => 2,
            VectorField::Rossler { .. } => 3,
            VectorField::Chen { .. } => 4,
            VectorField::Thomas { .. } => 5,
            VectorField::GravityLattice { .. } => 6,
            VectorField::Halvorsen { .. } => 7,
            VectorField::FourWing { .. } => 8,
        }
    }

    /// Field with canonical coefficients for a selector. Out-of-range
    /// selectors fall back to the curl-noise flow rather than failing;
    /// a bad selector from the parameter store should never halt a frame.
    pub fn from_selector(selector: u32) -> Self {
        match selector {
            1 => VectorField::Lorenz {
                sigma: 10.0,
                rho: 28.0,
                beta: 8.0 / 3.0,
            },
            2 => VectorField::Aizawa {
                a: 0.95,
                b: 0.7,
                c: 0.6,
                d: 3.5,
                e: 0.25,
                f: 0.1,
            },
            3 => VectorField::Rossler {
                a: 0.2,
                b: 0.2,
                c: 5.7,
            },
            4 => VectorField::Chen {
                a: 35.0,
                b: 3.0,
                c: 28.0,
            },
            5 => VectorField::Thomas { b: 0.208186 },
            6 => VectorField::GravityLattice {
                spacing: 2.0,
                strength: 1.0,
                decay: 2.0,
                offset: Vec3::ZERO,
            },
            7 => VectorField::Halvorsen { alpha: 1.89 },
            8 => VectorField::FourWing {
                a: 0.2,
                b: 0.01,
                c: -0.4,
                d: 1.0,
                k: 1.0,
            },
            _ => VectorField::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VectorField::CurlNoise { .. } => "curl-noise",
            VectorField::Lorenz { .. } => "lorenz",
            VectorField::Aizawa { .. } => "aizawa",
            VectorField::Rossler { .. } => "rossler",
            VectorField::Chen { .. } => "chen",
            VectorField::Thomas { .. } => "thomas",
            VectorField::GravityLattice { .. } => "gravity-lattice",
            VectorField::Halvorsen { .. } => "halvorsen",
            VectorField::FourWing { .. } => "four-wing",
        }
    }

    /// Whether the generated shader needs the noise/curl kernels.
    pub fn uses_noise(&self) -> bool {
        matches!(self, VectorField::CurlNoise { .. })
    }

    /// Evaluate the acceleration at `pos` and simulation time `time`.
    ///
    /// CPU reference for the WGSL emitted by [`to_wgsl`](Self::to_wgsl).
    pub fn eval(&self, pos: Vec3, time: f32) -> Vec3 {
        let (x, y, z) = (pos.x, pos.y, pos.z);
        match *self {
            VectorField::CurlNoise {
                scale,
                speed,
                strength,
            } => {
                let drifted = pos + Vec3::Z * (time * speed);
                noise::curl_octaves(drifted, scale, noise::DEFAULT_CURL_EPS, 3) * strength
            }
            VectorField::Lorenz { sigma, rho, beta } => Vec3::new(
                sigma * (y - x),
                x * (rho - z) - y,
                x * y - beta * z,
            ),
            VectorField::Aizawa { a, b, c, d, e, f } => Vec3::new(
                (z - b) * x - d * y,
                d * x + (z - b) * y,
                c + a * z - z * z * z / 3.0 - (x * x + y * y) * (1.0 + e * z) + f * z * x * x * x,
            ),
            VectorField::Rossler { a, b, c } => {
                Vec3::new(-y - z, x + a * y, b + z * (x - c))
            }
            VectorField::Chen { a, b, c } => Vec3::new(
                a * (y - x),
                (c - a) * x - x * z + c * y,
                x * y - b * z,
            ),
            VectorField::Thomas { b } => Vec3::new(
                y.sin() - b * x,
                z.sin() - b * y,
                x.sin() - b * z,
            ),
            VectorField::GravityLattice {
                spacing,
                strength,
                decay,
                offset,
            } => {
                let home = ((pos - offset) / spacing).round();
                let mut acc = Vec3::ZERO;
                for n in LATTICE_NEIGHBORS {
                    let center = (home + n) * spacing + offset;
                    let d = center - pos;
                    let r = d.length();
                    // The weight reaches zero at r = 0.85 * spacing, before
                    // any cell can enter or leave the 7-cell stencil (that
                    // happens at r >= 0.866 * spacing), so the summed field
                    // is continuous across cell transitions.
                    let w = 1.0 - smoothstep(0.4 * spacing, 0.85 * spacing, r);
                    acc += d * (w * strength / (r.powf(decay) * r + 1e-4));
                }
                acc
            }
            VectorField::Halvorsen { alpha } => Vec3::new(
                -alpha * x - 4.0 * y - 4.0 * z - y * y,
                -alpha * y - 4.0 * z - 4.0 * x - z * z,
                -alpha * z - 4.0 * x - 4.0 * y - x * x,
            ),
            VectorField::FourWing { a, b, c, d, k } => Vec3::new(
                a * x + d * y * z,
                b * x + c * y - x * z,
                -k * z - x * y,
            ),
        }
    }

    /// Emit the complete WGSL `field_accel` function for this field.
    pub fn to_wgsl(&self) -> String {
        let body = self.wgsl_body();
        format!(
            "// {} field\nfn field_accel(pos: vec3<f32>, t: f32) -> vec3<f32> {{\n{}\n}}\n",
            self.name(),
            body
        )
    }

    fn wgsl_body(&self) -> String {
        match *self {
            VectorField::CurlNoise {
                scale,
                speed,
                strength,
            } => format!(
                "    let drifted = pos + vec3<f32>(0.0, 0.0, t * {speed});\n    \
                 return curl_octaves(drifted, {scale}, {eps}, 3) * {strength};",
                speed = lit(speed),
                scale = lit(scale),
                eps = lit(noise::DEFAULT_CURL_EPS),
                strength = lit(strength),
            ),
            VectorField::Lorenz { sigma, rho, beta } => format!(
                "    return vec3<f32>(\n        \
                 {sigma} * (pos.y - pos.x),\n        \
                 pos.x * ({rho} - pos.z) - pos.y,\n        \
                 pos.x * pos.y - {beta} * pos.z\n    );",
                sigma = lit(sigma),
                rho = lit(rho),
                beta = lit(beta),
            ),
            VectorField::Aizawa { a, b, c, d, e, f } => format!(
                "    let zb = pos.z - {b};\n    \
                 return vec3<f32>(\n        \
                 zb * pos.x - {d} * pos.y,\n        \
                 {d} * pos.x + zb * pos.y,\n        \
                 {c} + {a} * pos.z - pos.z * pos.z * pos.z / 3.0\n            \
                 - (pos.x * pos.x + pos.y * pos.y) * (1.0 + {e} * pos.z)\n            \
                 + {f} * pos.z * pos.x * pos.x * pos.x\n    );",
                a = lit(a),
                b = lit(b),
                c = lit(c),
                d = lit(d),
                e = lit(e),
                f = lit(f),
            ),
            VectorField::Rossler { a, b, c } => format!(
                "    return vec3<f32>(\n        \
                 -pos.y - pos.z,\n        \
                 pos.x + {a} * pos.y,\n        \
                 {b} + pos.z * (pos.x - {c})\n    );",
                a = lit(a),
                b = lit(b),
                c = lit(c),
            ),
            VectorField::Chen { a, b, c } => format!(
                "    return vec3<f32>(\n        \
                 {a} * (pos.y - pos.x),\n        \
                 ({c} - {a}) * pos.x - pos.x * pos.z + {c} * pos.y,\n        \
                 pos.x * pos.y - {b} * pos.z\n    );",
                a = lit(a),
                b = lit(b),
                c = lit(c),
            ),
            VectorField::Thomas { b } => format!(
                "    return vec3<f32>(\n        \
                 sin(pos.y) - {b} * pos.x,\n        \
                 sin(pos.z) - {b} * pos.y,\n        \
                 sin(pos.x) - {b} * pos.z\n    );",
                b = lit(b),
            ),
            VectorField::GravityLattice {
                spacing,
                strength,
                decay,
                offset,
            } => format!(
                "    let spacing = {spacing};\n    \
                 let origin = vec3<f32>({ox}, {oy}, {oz});\n    \
                 let home = round((pos - origin) / spacing);\n    \
                 var neighbors = array<vec3<f32>, 7>(\n        \
                 vec3<f32>(0.0, 0.0, 0.0),\n        \
                 vec3<f32>(1.0, 0.0, 0.0),\n        \
                 vec3<f32>(-1.0, 0.0, 0.0),\n        \
                 vec3<f32>(0.0, 1.0, 0.0),\n        \
                 vec3<f32>(0.0, -1.0, 0.0),\n        \
                 vec3<f32>(0.0, 0.0, 1.0),\n        \
                 vec3<f32>(0.0, 0.0, -1.0)\n    );\n    \
                 var acc = vec3<f32>(0.0);\n    \
                 for (var i = 0; i < 7; i++) {{\n        \
                 let center = (home + neighbors[i]) * spacing + origin;\n        \
                 let d = center - pos;\n        \
                 let r = length(d);\n        \
                 // weight hits zero before any cell can enter or leave the stencil\n        \
                 let w = 1.0 - smoothstep(0.4 * spacing, 0.85 * spacing, r);\n        \
                 acc += d * (w * {strength} / (pow(r, {decay}) * r + 1e-4));\n    \
                 }}\n    \
                 return acc;",
                spacing = lit(spacing),
                ox = lit(offset.x),
                oy = lit(offset.y),
                oz = lit(offset.z),
                strength = lit(strength),
                decay = lit(decay),
            ),
            VectorField::Halvorsen { alpha } => format!(
                "    return vec3<f32>(\n        \
                 -({alpha}) * pos.x - 4.0 * pos.y - 4.0 * pos.z - pos.y * pos.y,\n        \
                 -({alpha}) * pos.y - 4.0 * pos.z - 4.0 * pos.x - pos.z * pos.z,\n        \
                 -({alpha}) * pos.z - 4.0 * pos.x - 4.0 * pos.y - pos.x * pos.x\n    );",
                alpha = lit(alpha),
            ),
            VectorField::FourWing { a, b, c, d, k } => format!(
                "    return vec3<f32>(\n        \
                 {a} * pos.x + {d} * pos.y * pos.z,\n        \
                 {b} * pos.x + {c} * pos.y - pos.x * pos.z,\n        \
                 -({k}) * pos.z - pos.x * pos.y\n    );",
                a = lit(a),
                b = lit(b),
                c = lit(c),
                d = lit(d),
                k = lit(k),
            ),
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

const LATTICE_NEIGHBORS: [Vec3; 7] = [
    Vec3::ZERO,
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_round_trips_for_all_nine() {
        for sel in 0..VectorField::COUNT {
            let field = VectorField::from_selector(sel);
            assert_eq!(field.selector(), sel);
        }
    }

    #[test]
    fn out_of_range_selector_falls_back() {
        assert_eq!(VectorField::from_selector(99), VectorField::default());
    }

    #[test]
    fn attractors_vanish_at_their_fixed_points() {
        let origin = Vec3::ZERO;
        assert_eq!(
            VectorField::from_selector(1).eval(origin, 0.0),
            Vec3::ZERO,
            "lorenz origin"
        );
        assert_eq!(
            VectorField::from_selector(5).eval(origin, 0.0),
            Vec3::ZERO,
            "thomas origin"
        );
        assert_eq!(
            VectorField::from_selector(7).eval(origin, 0.0),
            Vec3::ZERO,
            "halvorsen origin"
        );
    }

    #[test]
    fn all_fields_finite_over_sample_box() {
        for sel in 0..VectorField::COUNT {
            let field = VectorField::from_selector(sel);
            for i in 0..27 {
                let p = Vec3::new(
                    (i % 3) as f32 - 1.0,
                    ((i / 3) % 3) as f32 - 1.0,
                    (i / 9) as f32 - 1.0,
                ) * 1.3;
                let a = field.eval(p, 0.7);
                assert!(a.is_finite(), "{} not finite at {:?}", field.name(), p);
            }
        }
    }

    #[test]
    fn lattice_pull_points_toward_cell_center() {
        let field = VectorField::from_selector(6);
        // Slightly off the cell center at the origin: net pull back toward it.
        let a = field.eval(Vec3::new(0.3, 0.0, 0.0), 0.0);
        assert!(a.x < 0.0, "expected pull toward lattice center, got {:?}", a);
    }

    #[test]
    fn lattice_field_is_continuous_across_cell_boundary() {
        let field = VectorField::from_selector(6);
        // spacing 2.0 puts a cell boundary at x = 1.0
        let before = field.eval(Vec3::new(1.0 - 1e-4, 0.4, 0.2), 0.0);
        let after = field.eval(Vec3::new(1.0 + 1e-4, 0.4, 0.2), 0.0);
        assert!(
            (before - after).length() < 1e-2,
            "lattice field jumped across cell boundary: {:?} vs {:?}",
            before,
            after
        );
    }

    #[test]
    fn curl_noise_strength_scales_output() {
        let weak = VectorField::CurlNoise {
            scale: 1.0,
            speed: 0.0,
            strength: 1.0,
        };
        let strong = VectorField::CurlNoise {
            scale: 1.0,
            speed: 0.0,
            strength: 2.0,
        };
        let p = Vec3::new(0.3, -0.2, 0.8);
        let a = weak.eval(p, 0.0);
        let b = strong.eval(p, 0.0);
        assert!((b - a * 2.0).length() < 1e-5);
    }

    #[test]
    fn wgsl_emits_named_function_for_every_field() {
        for sel in 0..VectorField::COUNT {
            let field = VectorField::from_selector(sel);
            let wgsl = field.to_wgsl();
            assert!(wgsl.contains("fn field_accel"), "{}", field.name());
            assert!(wgsl.contains(field.name()), "{}", field.name());
        }
    }
}
