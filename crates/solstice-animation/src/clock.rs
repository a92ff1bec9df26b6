//! Pausable animation clock.
//!
//! The clock is fed wall-clock seconds by the host on every tick. While
//! running, elapsed time is `wall - start`. While paused, elapsed time is
//! frozen but the last wall time is still tracked, so resuming moves the
//! start reference forward by the paused interval and elapsed time continues
//! from the frozen value.

/// Elapsed-seconds counter driving the sun orbit and the day/night blend.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    /// Wall time that corresponds to elapsed = 0. Unset until the first tick.
    start: Option<f64>,
    /// Wall time of the most recent tick, paused or not.
    last_wall: Option<f64>,
    elapsed: f64,
    paused: bool,
}

impl AnimationClock {
    /// Creates a running clock. The start reference is taken on the first tick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock to `wall_seconds` and return the elapsed time.
    pub fn tick(&mut self, wall_seconds: f64) -> f64 {
        let start = *self.start.get_or_insert(wall_seconds);
        self.last_wall = Some(wall_seconds);
        if !self.paused {
            self.elapsed = wall_seconds - start;
        }
        self.elapsed
    }

    /// Pause or resume. Redundant calls are no-ops.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        if !paused && let Some(wall) = self.last_wall {
            self.start = Some(wall - self.elapsed);
        }
    }

    /// Flip the paused flag and return the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    /// Whether the clock is currently frozen.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Elapsed seconds as of the last tick.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_reads_zero() {
        let mut clock = AnimationClock::new();
        assert_eq!(clock.tick(123.5), 0.0);
        assert_eq!(clock.tick(125.0), 1.5);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0);
        clock.tick(5.0);
        clock.set_paused(true);
        assert_eq!(clock.tick(6.0), 5.0);
        assert_eq!(clock.tick(60.0), 5.0);
        assert!(clock.is_paused());
    }

    #[test]
    fn test_resume_continues_from_frozen_value() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0);
        clock.tick(4.0);
        clock.set_paused(true);
        clock.tick(10.0);
        // Still ticking while paused, 30 seconds of real time later.
        assert_eq!(clock.tick(34.0), 4.0);
        clock.set_paused(false);
        assert_eq!(clock.tick(35.5), 5.5);
    }

    #[test]
    fn test_toggle_pause_reports_state() {
        let mut clock = AnimationClock::new();
        assert!(clock.toggle_pause());
        assert!(!clock.toggle_pause());
    }

    #[test]
    fn test_redundant_resume_does_not_rewind() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0);
        clock.tick(3.0);
        clock.set_paused(false);
        assert_eq!(clock.tick(4.0), 4.0);
    }

    #[test]
    fn test_paused_before_first_tick() {
        let mut clock = AnimationClock::new();
        clock.set_paused(true);
        assert_eq!(clock.tick(50.0), 0.0);
        assert_eq!(clock.tick(80.0), 0.0);
        clock.set_paused(false);
        assert_eq!(clock.tick(81.0), 1.0);
    }

    #[test]
    fn test_pause_resume_scenario() {
        let mut clock = AnimationClock::new();
        let mut readings = vec![clock.tick(0.0), clock.tick(5.0)];
        clock.set_paused(true);
        for _ in 0..3 {
            readings.push(clock.tick(5.0));
        }
        clock.set_paused(false);
        readings.push(clock.tick(7.0));
        assert_eq!(readings, vec![0.0, 5.0, 5.0, 5.0, 5.0, 7.0]);
    }
}
