use std::time::Duration;

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(15_000);

/// Reconnect delay state for one subscription.
///
/// The delay only returns to the floor through [`Backoff::reset`] (a
/// successful open). Between resets it never decreases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(floor: Duration, cap: Duration) -> Self {
        let cap = cap.max(floor);
        Self {
            floor,
            cap,
            current: floor,
        }
    }

    /// The delay the next failure will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Consume the current delay for a scheduled reconnect and double it, clamped at the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.cap);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY, DEFAULT_MAX_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_failure_waits_min_of_cap_and_doubled_floor() {
        let mut backoff = Backoff::default();
        let delays: Vec<u128> = (0..7).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 15_000, 15_000, 15_000]);

        for n in 1..=12u32 {
            let mut backoff = Backoff::default();
            let mut delay = Duration::ZERO;
            for _ in 0..n {
                delay = backoff.next_delay();
            }
            let expected = (1_000u64 << (n - 1)).min(15_000);
            assert_eq!(delay, Duration::from_millis(expected), "failure #{n}");
        }
    }

    #[test]
    fn reset_returns_to_floor() {
        let mut backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(2));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.current(), Duration::from_millis(1_000));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
    }

    #[test]
    fn cap_below_floor_is_raised_to_floor() {
        let mut backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }
}
