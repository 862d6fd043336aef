use crate::session::clock::saturating_add;
use crate::session::{SessionConfig, SessionRegistry};
use opentelemetry::otel_info;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Starts a new session when the application returns to the foreground
/// after staying in the background longer than the inactivity timeout.
///
/// The embedding application reports lifecycle transitions through
/// [`on_background`] and [`on_foreground`]; platform event plumbing is left
/// to the caller.
///
/// [`on_background`]: InactivityTracker::on_background
/// [`on_foreground`]: InactivityTracker::on_foreground
#[derive(Debug)]
pub struct InactivityTracker {
    registry: Arc<SessionRegistry>,
    timeout: Duration,
    deadline: Mutex<SystemTime>,
}

impl InactivityTracker {
    /// Create a tracker rotating sessions of `registry` after `timeout` of
    /// inactivity.
    pub fn new(registry: Arc<SessionRegistry>, timeout: Duration) -> Self {
        let deadline = saturating_add(registry.now(), timeout);
        InactivityTracker {
            registry,
            timeout,
            deadline: Mutex::new(deadline),
        }
    }

    /// Create a tracker using the inactivity timeout of a [`SessionConfig`].
    pub fn with_config(registry: Arc<SessionRegistry>, config: &SessionConfig) -> Self {
        Self::new(registry, config.inactivity_timeout)
    }

    /// The application is about to leave the foreground.
    pub fn on_background(&self) {
        let deadline = saturating_add(self.registry.now(), self.timeout);
        *self.deadline.lock().unwrap_or_else(|err| err.into_inner()) = deadline;
    }

    /// The application is returning to the foreground.
    ///
    /// Returns `true` when the inactivity deadline has passed and a new
    /// session was started.
    pub fn on_foreground(&self) -> bool {
        let deadline = *self.deadline.lock().unwrap_or_else(|err| err.into_inner());
        if self.registry.now() <= deadline {
            return false;
        }

        let session_id = self.registry.current_session_id(true);
        otel_info!(
            name: "InactivityTracker.SessionRotated",
            session_id = session_id.to_string()
        );
        true
    }
}
