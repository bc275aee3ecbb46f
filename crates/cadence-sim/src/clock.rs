/// Tracks simulation time: a step counter and the `[prev, now)` window of the
/// most recent tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    step: u64,
    prev: i64,
    now: i64,
    interval: i64,
}

impl SimClock {
    /// Create a clock at `start` that advances by `interval` per tick.
    pub fn new(start: i64, interval: i64) -> Self {
        Self {
            step: 0,
            prev: start,
            now: start,
            interval,
        }
    }

    /// Advance by one tick and return the elapsed window `(prev, now)`.
    pub fn advance(&mut self) -> (i64, i64) {
        self.step += 1;
        self.prev = self.now;
        self.now = self.now.saturating_add(self.interval);
        (self.prev, self.now)
    }

    /// Number of ticks taken so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Start of the most recent window.
    pub fn prev(&self) -> i64 {
        self.prev
    }

    /// Current timestamp (end of the most recent window).
    pub fn now(&self) -> i64 {
        self.now
    }

    /// Time units per tick.
    pub fn interval(&self) -> i64 {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_initial_state() {
        let clock = SimClock::new(100, 60);
        assert_eq!(clock.step(), 0);
        assert_eq!(clock.prev(), 100);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn clock_advance_moves_window() {
        let mut clock = SimClock::new(0, 3600);
        assert_eq!(clock.advance(), (0, 3600));
        assert_eq!(clock.advance(), (3600, 7200));
        assert_eq!(clock.step(), 2);
        assert_eq!(clock.interval(), 3600);
    }

    #[test]
    fn clock_saturates_instead_of_wrapping() {
        let mut clock = SimClock::new(i64::MAX - 10, 100);
        assert_eq!(clock.advance(), (i64::MAX - 10, i64::MAX));
        assert!(clock.prev() <= clock.now());
    }
}
