use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source for the session stopwatch
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset.get()
    }
}

/// Accumulates running time only; paused and stopped intervals are excluded.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Starts on first call, resumes on later ones.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started_at.is_some() && self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn stop(&mut self, now: Instant) {
        self.pause(now);
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.accumulated + running
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_unstarted_stopwatch_reads_zero() {
        let clock = ManualClock::new();
        let sw = Stopwatch::default();
        clock.advance(secs(5));
        assert_eq!(sw.elapsed(clock.now()), Duration::ZERO);
        assert!(!sw.has_started());
    }

    #[test]
    fn test_pause_excludes_time() {
        let clock = ManualClock::new();
        let mut sw = Stopwatch::default();

        sw.start(clock.now());
        clock.advance(secs(10));
        sw.pause(clock.now());
        clock.advance(secs(100));
        assert_eq!(sw.elapsed(clock.now()), secs(10));

        sw.resume(clock.now());
        clock.advance(secs(5));
        assert_eq!(sw.elapsed(clock.now()), secs(15));
    }

    #[test]
    fn test_start_after_stop_resumes_and_keeps_origin() {
        let clock = ManualClock::new();
        let mut sw = Stopwatch::default();

        sw.start(clock.now());
        let origin = sw.started_at();
        clock.advance(secs(3));
        sw.stop(clock.now());
        clock.advance(secs(30));
        sw.start(clock.now());
        clock.advance(secs(2));

        assert_eq!(sw.elapsed(clock.now()), secs(5));
        assert_eq!(sw.started_at(), origin);
    }

    #[test]
    fn test_resume_before_start_is_ignored() {
        let clock = ManualClock::new();
        let mut sw = Stopwatch::default();
        sw.resume(clock.now());
        assert!(!sw.is_running());
    }

    #[test]
    fn test_reset_clears_everything() {
        let clock = ManualClock::new();
        let mut sw = Stopwatch::default();
        sw.start(clock.now());
        clock.advance(secs(4));
        sw.reset();
        assert!(!sw.has_started());
        assert_eq!(sw.elapsed(clock.now()), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        let before = b.now();
        a.advance(secs(1));
        assert_eq!(b.now() - before, secs(1));
    }
}
