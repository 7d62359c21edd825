//! Pacing of requests to the bibliographic service.

use std::{thread, time::Duration};

/// Default pause after each request.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Called once after every request, whether it succeeded or not.
pub trait Throttle {
    /// Blocks for as long as the policy requires.
    fn pause(&self);
}

/// Sleeps the current thread for a fixed duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_DELAY)
    }
}

impl Throttle for FixedDelay {
    fn pause(&self) {
        if !self.0.is_zero() {
            thread::sleep(self.0);
        }
    }
}

/// Never waits, useful when the remote service is mocked.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelay;

impl Throttle for NoDelay {
    fn pause(&self) {}
}

impl<T: Throttle + ?Sized> Throttle for &T {
    fn pause(&self) {
        (**self).pause();
    }
}

#[test]
fn fixed_delay_waits_at_least_its_duration() {
    let delay = FixedDelay(Duration::from_millis(20));
    let start = std::time::Instant::now();
    delay.pause();

    assert!(start.elapsed() >= Duration::from_millis(20));
}
