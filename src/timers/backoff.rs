use rand::Rng;
use std::cmp;
use tokio::time::Duration;

/// Exponential backoff with jitter, used by every retry loop that talks to the lease backend or
/// to a primary's replication stream.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(min: Duration, max: Duration) -> Self {
        Backoff { min, max, current: min }
    }

    /// Returns a delay in `[current / 2, current]`, then doubles `current` up to `max`.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let ceiling = self.current;
        self.current = cmp::min(self.current * 2, self.max);

        rand::thread_rng().gen_range((ceiling / 2)..=ceiling)
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.min;
    }

    pub(crate) fn max(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_until_capped() {
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(700);
        let mut backoff = Backoff::new(min, max);

        let expected_ceilings = [100, 200, 400, 700, 700];
        for ceiling in expected_ceilings.iter() {
            let ceiling = Duration::from_millis(*ceiling);
            let delay = backoff.next_delay();
            assert!(delay <= ceiling, "{:?} > {:?}", delay, ceiling);
            assert!(delay >= ceiling / 2, "{:?} < {:?}", delay, ceiling / 2);
        }
    }

    #[test]
    fn reset_starts_over_from_min() {
        let min = Duration::from_millis(10);
        let mut backoff = Backoff::new(min, Duration::from_secs(1));
        for _ in 0..6 {
            backoff.next_delay();
        }

        backoff.reset();
        assert!(backoff.next_delay() <= min);
    }
}
