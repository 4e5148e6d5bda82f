use std::time::{Duration, Instant};

/// Wall-clock elapsed-time baseline for the currently loaded track. The
/// receiver's own `currentTime` is polled at ~1 Hz and only ever nudges this
/// clock, per spec's resolution of the position-authority open question: the
/// local clock is authoritative, the receiver value a corrector.
#[derive(Debug)]
pub struct PositionClock {
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    accumulated_pause: Duration,
}

impl Default for PositionClock {
    fn default() -> Self {
        Self {
            started_at: None,
            paused_at: None,
            accumulated_pause: Duration::ZERO,
        }
    }
}

impl PositionClock {
    /// Starts (or restarts) the clock at track load.
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_pause += paused_at.elapsed();
        }
    }

    /// Resets the accumulated-pause baseline to land on `position` after a
    /// seek, so [`PositionClock::elapsed`] reports the new position from
    /// this instant forward.
    pub fn rebase(&mut self, position: Duration) {
        let now = Instant::now();
        self.started_at = Some(now - position);
        self.paused_at = None;
        self.accumulated_pause = Duration::ZERO;
    }

    /// Elapsed play time: wall time since start, less time spent paused.
    pub fn elapsed(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let pause = self.accumulated_pause
            + self
                .paused_at
                .map(|paused_at| paused_at.elapsed())
                .unwrap_or_default();
        started_at.elapsed().saturating_sub(pause)
    }

    /// Nudges the clock toward a receiver-reported position without
    /// discarding the accumulated play/pause bookkeeping a full [`rebase`]
    /// would reset.
    pub fn correct_toward(&mut self, receiver_position: Duration) {
        self.rebase(receiver_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn elapsed_is_zero_before_start() {
        let clock = PositionClock::default();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn pause_excludes_paused_time_from_elapsed() {
        let mut clock = PositionClock::default();
        clock.start();
        sleep(Duration::from_millis(20));
        clock.pause();
        sleep(Duration::from_millis(30));
        clock.resume();
        let elapsed = clock.elapsed();
        assert!(elapsed < Duration::from_millis(30), "elapsed={elapsed:?}");
    }

    #[test]
    fn rebase_lands_elapsed_on_requested_position() {
        let mut clock = PositionClock::default();
        clock.start();
        clock.rebase(Duration::from_secs(87));
        let elapsed = clock.elapsed();
        assert!(elapsed >= Duration::from_secs(87));
        assert!(elapsed < Duration::from_secs(88));
    }
}
