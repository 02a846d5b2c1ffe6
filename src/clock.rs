//! Simulation clock with clamped frame deltas.
//!
//! The clock only ever moves forward. Raw frame deltas are clamped into a
//! configured range so a stalled tab or debugger pause cannot feed the
//! integrator a giant step, and a lost gesture-tracking signal freezes the
//! clock for the frame (delta zero) rather than erroring.

use std::time::Instant;

/// Default clamp range for per-frame deltas, in seconds.
pub const DEFAULT_MIN_DELTA: f32 = 1.0 / 240.0;
pub const DEFAULT_MAX_DELTA: f32 = 1.0 / 30.0;

#[derive(Debug)]
pub struct SimClock {
    last_frame: Option<Instant>,
    elapsed_secs: f32,
    frame_count: u64,
    min_delta: f32,
    max_delta: f32,
    fixed_delta: Option<f32>,
}

impl SimClock {
    pub fn new(min_delta: f32, max_delta: f32) -> Self {
        Self {
            last_frame: None,
            elapsed_secs: 0.0,
            frame_count: 0,
            min_delta,
            max_delta,
            fixed_delta: None,
        }
    }

    /// Advance using wall-clock time. Call once per display frame.
    ///
    /// Returns `(elapsed, delta)` in seconds, both already scaled by
    /// `time_scale` and clamped.
    pub fn tick(&mut self, tracking_lost: bool, time_scale: f32) -> (f32, f32) {
        let now = Instant::now();
        let raw = match self.last_frame {
            Some(last) => now.duration_since(last).as_secs_f32(),
            // First frame has no history; assume a nominal 60 Hz step.
            None => 1.0 / 60.0,
        };
        self.last_frame = Some(now);
        self.advance(raw, tracking_lost, time_scale)
    }

    /// Advance by an explicit raw delta. Used by `tick` and by headless
    /// stepping where wall-clock time is irrelevant.
    pub fn advance(&mut self, raw_delta: f32, tracking_lost: bool, time_scale: f32) -> (f32, f32) {
        if tracking_lost {
            // Treat loss of tracking as a deliberate pause: the field keeps
            // its shape and the particles hold still.
            return (self.elapsed_secs, 0.0);
        }
        let clamped = self
            .fixed_delta
            .unwrap_or(raw_delta)
            .clamp(self.min_delta, self.max_delta);
        let delta = clamped * time_scale.max(0.0);
        self.elapsed_secs += delta;
        self.frame_count += 1;
        (self.elapsed_secs, delta)
    }

    /// Total simulated seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Frames advanced (frozen frames do not count).
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Force a fixed delta for deterministic stepping; `None` restores
    /// wall-clock timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELTA, DEFAULT_MAX_DELTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped_after_stall() {
        let mut clock = SimClock::default();
        let (_, dt) = clock.advance(5.0, false, 1.0);
        assert_eq!(dt, DEFAULT_MAX_DELTA);
        let (_, dt) = clock.advance(0.0, false, 1.0);
        assert_eq!(dt, DEFAULT_MIN_DELTA);
    }

    #[test]
    fn tracking_lost_freezes_clock() {
        let mut clock = SimClock::default();
        clock.advance(1.0 / 60.0, false, 1.0);
        let before = clock.elapsed();
        let frames = clock.frame();
        let (elapsed, dt) = clock.advance(1.0 / 60.0, true, 1.0);
        assert_eq!(dt, 0.0);
        assert_eq!(elapsed, before);
        assert_eq!(clock.frame(), frames);
    }

    #[test]
    fn elapsed_is_monotonic() {
        let mut clock = SimClock::default();
        let mut prev = 0.0;
        for i in 0..100 {
            let lost = i % 7 == 0;
            let (elapsed, _) = clock.advance(0.016, lost, 1.0);
            assert!(elapsed >= prev);
            prev = elapsed;
        }
    }

    #[test]
    fn fixed_delta_overrides_raw() {
        let mut clock = SimClock::default();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        let (_, dt) = clock.advance(123.0, false, 1.0);
        assert!((dt - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn time_scale_slows_the_clock() {
        let mut clock = SimClock::default();
        let (_, dt) = clock.advance(1.0 / 60.0, false, 0.5);
        assert!((dt - 0.5 / 60.0).abs() < 1e-7);
        // Negative scales clamp to zero rather than running backwards.
        let before = clock.elapsed();
        let (elapsed, dt) = clock.advance(1.0 / 60.0, false, -1.0);
        assert_eq!(dt, 0.0);
        assert_eq!(elapsed, before);
    }
}
