use std::time::Duration;

use tokio::time::Instant;

/// Monotonic microsecond clock anchored at simulation start.
///
/// Every timestamp the engine produces is relative to the anchor, so event
/// consumers never need a reference-time subtraction. Built on
/// [`tokio::time::Instant`] so tests running under a paused runtime clock
/// observe the same time the workers do.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    origin: Instant,
}

impl SimClock {
    /// Anchors a new clock at the current instant.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Microseconds elapsed since the anchor.
    pub fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    /// Absolute wake-up instant `delta_us` microseconds from now, for use
    /// with [`tokio::time::sleep_until`].
    pub fn deadline_after_us(&self, delta_us: u64) -> Instant {
        Instant::now() + Duration::from_micros(delta_us)
    }
}

#[cfg(test)]
mod tests {
    use super::SimClock;

    #[tokio::test(start_paused = true)]
    async fn now_follows_the_runtime_clock() {
        let clock = SimClock::start();
        assert_eq!(clock.now_us(), 0);

        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        assert_eq!(clock.now_us(), 250_000);
    }

    #[tokio::test(start_paused = true)]
    async fn deadlines_are_absolute() {
        let clock = SimClock::start();
        let deadline = clock.deadline_after_us(2_000);
        tokio::time::sleep_until(deadline).await;
        assert_eq!(clock.now_us(), 2_000);
    }
}
