//! Per-frame parameter snapshots and the shared parameter store.
//!
//! UI code mutates the store from its own thread; the orchestrator reads one
//! immutable snapshot at the top of each frame and never holds a reference
//! across frames, so the simulation core can never observe a half-applied
//! update. If the store is momentarily unavailable the orchestrator reuses
//! its previous snapshot instead of failing the frame.

use std::sync::{Arc, Mutex};

use crate::field::VectorField;

/// Immutable-per-frame simulation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParameters {
    /// Active acceleration field with its coefficient bundle.
    pub field: VectorField,
    /// Multiplicative velocity damping per step, normally just below 1.
    pub damping: f32,
    /// Boundary half-size; positions wrap toroidally into `[-bounds, bounds)`.
    pub bounds: f32,
    /// Organized/chaos blend in [0, 1]. Usually driven by the tension input.
    pub entropy: f32,
    /// Global field strength multiplier.
    pub strength: f32,
    /// Simulation clock rate multiplier.
    pub time_scale: f32,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            field: VectorField::default(),
            damping: 0.99,
            bounds: 3.0,
            entropy: 0.0,
            strength: 1.0,
            time_scale: 1.0,
        }
    }
}

/// Shared, concurrently mutable parameter store.
///
/// Cloning is cheap and shares state; hand a clone to the UI thread and keep
/// one in the orchestrator.
#[derive(Clone, Default)]
pub struct ParameterStore {
    inner: Arc<Mutex<SimulationParameters>>,
}

impl ParameterStore {
    pub fn new(params: SimulationParameters) -> Self {
        Self {
            inner: Arc::new(Mutex::new(params)),
        }
    }

    /// Mutate the stored parameters (UI side).
    pub fn update(&self, f: impl FnOnce(&mut SimulationParameters)) {
        if let Ok(mut guard) = self.inner.lock() {
            f(&mut guard);
        }
    }

    /// Copy out the current parameters without blocking.
    ///
    /// Returns `None` when the store is contended or poisoned; the caller
    /// falls back to its last good snapshot.
    pub fn try_snapshot(&self) -> Option<SimulationParameters> {
        self.inner.try_lock().ok().map(|guard| *guard)
    }
}

/// Per-frame external inputs from the gesture/vision collaborator.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// Tension scalar in [0, 1].
    pub tension: f32,
    /// True while gesture tracking is lost; freezes the simulation clock
    /// for the frame instead of erroring.
    pub tracking_lost: bool,
}

/// Opt-in mappings from the tension scalar onto simulation knobs.
///
/// Tension always drives entropy. Each optional mapping is a `(at_zero,
/// at_one)` pair lerped by tension; when absent the corresponding base
/// parameter is used unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct TensionMapping {
    pub time_scale: Option<(f32, f32)>,
    pub strength: Option<(f32, f32)>,
    /// Color-shift angle in radians, published to the rendering collaborator.
    pub color_shift: Option<(f32, f32)>,
}

/// Resolved per-frame values after applying a [`TensionMapping`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TensionEffects {
    pub entropy: f32,
    pub time_scale: f32,
    pub strength: f32,
    pub color_shift: f32,
}

impl TensionMapping {
    pub fn apply(&self, tension: f32, base: &SimulationParameters) -> TensionEffects {
        let t = tension.clamp(0.0, 1.0);
        let lerp = |range: (f32, f32)| range.0 + (range.1 - range.0) * t;
        TensionEffects {
            entropy: t,
            time_scale: self.time_scale.map(lerp).unwrap_or(base.time_scale),
            strength: self.strength.map(lerp).unwrap_or(base.strength),
            color_shift: self.color_shift.map(lerp).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_isolated_from_later_updates() {
        let store = ParameterStore::default();
        let snap = store.try_snapshot().unwrap();
        store.update(|p| p.damping = 0.5);
        assert_eq!(snap.damping, 0.99);
        assert_eq!(store.try_snapshot().unwrap().damping, 0.5);
    }

    #[test]
    fn store_clones_share_state() {
        let store = ParameterStore::default();
        let ui_side = store.clone();
        ui_side.update(|p| p.entropy = 0.7);
        assert_eq!(store.try_snapshot().unwrap().entropy, 0.7);
    }

    #[test]
    fn tension_always_drives_entropy() {
        let mapping = TensionMapping::default();
        let base = SimulationParameters::default();
        assert_eq!(mapping.apply(0.0, &base).entropy, 0.0);
        assert_eq!(mapping.apply(1.0, &base).entropy, 1.0);
        assert_eq!(mapping.apply(7.0, &base).entropy, 1.0, "tension is clamped");
    }

    #[test]
    fn optional_mappings_fall_back_to_base() {
        let mapping = TensionMapping {
            time_scale: Some((1.0, 0.2)),
            ..Default::default()
        };
        let base = SimulationParameters {
            strength: 2.5,
            ..Default::default()
        };
        let effects = mapping.apply(0.5, &base);
        assert!((effects.time_scale - 0.6).abs() < 1e-6);
        assert_eq!(effects.strength, 2.5);
        assert_eq!(effects.color_shift, 0.0);
    }
}
