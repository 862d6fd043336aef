use std::fmt;
use std::time::{Duration, SystemTime};

/// Source of wall clock time used to expire sessions.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// [`Clock`] backed by [`SystemTime::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// `time + duration`, clamped to the latest time the platform can represent.
pub(crate) fn saturating_add(time: SystemTime, duration: Duration) -> SystemTime {
    if let Some(sum) = time.checked_add(duration) {
        return sum;
    }

    let mut latest = time;
    let mut step = duration;
    while !step.is_zero() {
        match latest.checked_add(step) {
            Some(next) => latest = next,
            None => step /= 2,
        }
    }
    latest
}
