//! Fixed-step accumulator
//!
//! Converts wall-clock frame times into a whole number of fixed ticks. When
//! the simulation falls too far behind (tab in background, long GC pause) the
//! backlog is dropped instead of replayed.

use crate::consts::{MAX_UPDATES_PER_FRAME, TIME_STEP};

/// Ticks run during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTicks {
    pub ticks: u32,
    /// Simulated time was snapped forward to the frame time
    pub snapped: bool,
}

#[derive(Debug, Clone)]
pub struct FixedStepLoop {
    /// Simulated time in ms; `None` until the first frame
    simulated_ms: Option<f64>,
    step: f32,
    max_updates: u32,
}

impl Default for FixedStepLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedStepLoop {
    pub fn new() -> Self {
        Self::with_step(TIME_STEP, MAX_UPDATES_PER_FRAME)
    }

    pub fn with_step(step: f32, max_updates: u32) -> Self {
        assert!(step > 0.0, "time step must be positive");
        Self {
            simulated_ms: None,
            step,
            max_updates,
        }
    }

    pub fn simulated_ms(&self) -> Option<f64> {
        self.simulated_ms
    }

    /// Run `update(dt)` until simulated time catches up with `now_ms`
    ///
    /// The first frame only anchors the clock. At most `max_updates` ticks
    /// run per frame; past that, simulated time jumps to `now_ms`.
    pub fn advance(&mut self, now_ms: f64, mut update: impl FnMut(f32)) -> FrameTicks {
        let step_ms = self.step as f64 * 1000.0;
        let mut simulated = self.simulated_ms.unwrap_or(now_ms);
        let mut frame = FrameTicks::default();

        while simulated < now_ms {
            if frame.ticks == self.max_updates {
                log::debug!(
                    "Dropping {:.1}ms of simulation backlog",
                    now_ms - simulated
                );
                simulated = now_ms;
                frame.snapped = true;
                break;
            }
            update(self.step);
            simulated += step_ms;
            frame.ticks += 1;
        }

        self.simulated_ms = Some(simulated);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STEP_MS: f64 = TIME_STEP as f64 * 1000.0;

    #[test]
    fn test_first_frame_only_anchors() {
        let mut game_loop = FixedStepLoop::new();
        let frame = game_loop.advance(5000.0, |_| panic!("no tick on first frame"));
        assert_eq!(frame.ticks, 0);
        assert_eq!(game_loop.simulated_ms(), Some(5000.0));
    }

    #[test]
    fn test_one_frame_one_tick() {
        let mut game_loop = FixedStepLoop::new();
        game_loop.advance(0.0, |_| {});
        let mut dts = Vec::new();
        let frame = game_loop.advance(STEP_MS, |dt| dts.push(dt));
        assert_eq!(frame.ticks, 1);
        assert_eq!(dts, vec![TIME_STEP]);
    }

    #[test]
    fn test_partial_step_runs_ahead() {
        let mut game_loop = FixedStepLoop::new();
        game_loop.advance(0.0, |_| {});
        // Any lag at all runs one whole tick
        assert_eq!(game_loop.advance(1.0, |_| {}).ticks, 1);
        // Simulation is now ahead of the clock
        assert_eq!(game_loop.advance(10.0, |_| {}).ticks, 0);
    }

    #[test]
    fn test_long_stall_snaps() {
        let mut game_loop = FixedStepLoop::new();
        game_loop.advance(0.0, |_| {});
        let mut count = 0;
        let frame = game_loop.advance(10_000.0, |_| count += 1);
        assert_eq!(count, MAX_UPDATES_PER_FRAME);
        assert!(frame.snapped);
        assert_eq!(game_loop.simulated_ms(), Some(10_000.0));

        // Back to normal pacing
        let frame = game_loop.advance(10_000.0 + STEP_MS, |_| {});
        assert_eq!(frame.ticks, 1);
        assert!(!frame.snapped);
    }

    #[test]
    fn test_exact_backlog_does_not_snap() {
        let mut game_loop = FixedStepLoop::with_step(0.125, 10);
        game_loop.advance(0.0, |_| {});
        let frame = game_loop.advance(1250.0, |_| {});
        assert_eq!(frame.ticks, 10);
        assert!(!frame.snapped);
    }

    proptest! {
        #[test]
        fn prop_never_more_than_max_ticks(
            deltas in prop::collection::vec(0.0f64..2000.0, 1..50)
        ) {
            let mut game_loop = FixedStepLoop::new();
            let mut now = 0.0;
            game_loop.advance(now, |_| {});
            for delta in deltas {
                now += delta;
                let frame = game_loop.advance(now, |_| {});
                prop_assert!(frame.ticks <= MAX_UPDATES_PER_FRAME);
                let simulated = game_loop.simulated_ms().unwrap();
                // Never behind the clock after a frame
                prop_assert!(simulated >= now);
                prop_assert!(simulated < now + STEP_MS + 1e-6);
            }
        }
    }
}
