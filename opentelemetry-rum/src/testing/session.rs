//! Session test doubles.
use crate::session::{Clock, RotationRecorder, SessionId, SessionIdGenerator, SessionRotation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// [`Clock`] that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<SystemTime>>);

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: SystemTime) -> Self {
        ManualClock(Arc::new(Mutex::new(now)))
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap()
    }
}

/// [`SessionIdGenerator`] implementation that increments a counter for each
/// new id. This helps produce predictable ids for testing.
#[derive(Clone, Debug)]
pub struct IncrementSessionIdGenerator(Arc<AtomicU64>);

impl IncrementSessionIdGenerator {
    /// Create a generator whose first id is `1`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        IncrementSessionIdGenerator(Arc::new(AtomicU64::new(first)))
    }
}

impl Default for IncrementSessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdGenerator for IncrementSessionIdGenerator {
    fn new_session_id(&self) -> SessionId {
        SessionId::from(self.0.fetch_add(1, Ordering::SeqCst) as u128)
    }
}

/// [`RotationRecorder`] keeping every record in memory. Clones share storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRotationRecorder(Arc<Mutex<Vec<SessionRotation>>>);

impl InMemoryRotationRecorder {
    /// All rotations recorded so far, oldest first.
    pub fn rotations(&self) -> Vec<SessionRotation> {
        self.0.lock().unwrap().clone()
    }
}

impl RotationRecorder for InMemoryRotationRecorder {
    fn record(&self, rotation: &SessionRotation) {
        self.0.lock().unwrap().push(*rotation);
    }
}
