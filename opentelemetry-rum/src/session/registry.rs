//! # Session Registry
//!
//! The [`SessionRegistry`] is the single source of truth for the session the
//! process is currently in. The current id and its expiry are replaced
//! together under one lock; rotation listeners and the [`RotationRecorder`]
//! are invoked only after that lock has been released, so they may call back
//! into the registry freely.
use crate::session::clock::saturating_add;
use crate::session::config::OTEL_RUM_SESSION_MAX_AGE_DEFAULT;
use crate::session::{
    Clock, NoopRotationRecorder, RandomSessionIdGenerator, RotationRecorder, SessionConfig,
    SessionId, SessionIdGenerator, SessionRotation, SystemClock,
};
use opentelemetry::{otel_debug, otel_warn};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

type RotationListener = Arc<dyn Fn() + Send + Sync>;

/// The live session: replaced wholesale, never partially updated.
#[derive(Clone, Copy, Debug)]
struct SessionState {
    id: SessionId,
    expires_at: SystemTime,
}

struct RegistryInner {
    state: SessionState,
    listeners: Vec<RotationListener>,
}

/// Everything captured under the lock that is needed to publish a rotation.
struct PendingRotation {
    rotation: SessionRotation,
    listeners: Vec<RotationListener>,
}

/// Owns the current [`SessionId`], its expiry and the rotation listeners.
///
/// A process is expected to create one registry and share it, usually as an
/// `Arc<SessionRegistry>`, with every component that tags or samples
/// telemetry by session.
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    max_session_age: Duration,
    clock: Box<dyn Clock>,
    id_generator: Box<dyn SessionIdGenerator>,
    recorder: Box<dyn RotationRecorder>,
}

impl SessionRegistry {
    /// Create a new [`SessionRegistryBuilder`].
    pub fn builder() -> SessionRegistryBuilder {
        SessionRegistryBuilder::default()
    }

    /// Returns the current session id.
    ///
    /// The session rotates first when `force_new` is set or when it has
    /// expired. On rotation every registered listener is invoked once and a
    /// [`SessionRotation`] is handed to the configured recorder, both after
    /// the new session has been committed and the lock released.
    pub fn current_session_id(&self, force_new: bool) -> SessionId {
        let (current, pending) = {
            let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            let now = self.clock.now();
            if force_new || now > inner.state.expires_at {
                let previous = inner.state.id;
                inner.state = self.new_state(now);
                let pending = PendingRotation {
                    rotation: SessionRotation {
                        previous,
                        current: inner.state.id,
                        timestamp: now,
                    },
                    listeners: inner.listeners.clone(),
                };
                (inner.state.id, Some(pending))
            } else {
                (inner.state.id, None)
            }
        };

        if let Some(pending) = pending {
            self.publish(pending, force_new);
        }

        current
    }

    /// Register a callback invoked after every rotation.
    ///
    /// Listeners live as long as the registry. They are called without any
    /// lock held and may call back into the registry, typically
    /// [`peek_session_id`] to read the new session.
    ///
    /// [`peek_session_id`]: SessionRegistry::peek_session_id
    pub fn register_on_rotation<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        inner.listeners.push(Arc::new(listener));
    }

    /// Returns the current session id without checking its expiry.
    ///
    /// Never rotates, so it is safe to call from rotation listeners even when
    /// the configured session age is tiny.
    pub fn peek_session_id(&self) -> SessionId {
        self.inner
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .state
            .id
    }

    /// When the current session expires, without triggering a rotation.
    pub fn session_expires_at(&self) -> SystemTime {
        self.inner
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .state
            .expires_at
    }

    /// The configured maximum session age.
    pub fn max_session_age(&self) -> Duration {
        self.max_session_age
    }

    pub(crate) fn now(&self) -> SystemTime {
        self.clock.now()
    }

    fn new_state(&self, now: SystemTime) -> SessionState {
        SessionState {
            id: self.id_generator.new_session_id(),
            expires_at: saturating_add(now, self.max_session_age),
        }
    }

    fn publish(&self, pending: PendingRotation, forced: bool) {
        let PendingRotation {
            rotation,
            listeners,
        } = pending;

        otel_debug!(
            name: "SessionRegistry.Rotated",
            previous_session_id = rotation.previous.to_string(),
            session_id = rotation.current.to_string(),
            forced = forced
        );

        for listener in &listeners {
            listener();
        }
        self.recorder.record(&rotation);
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        f.debug_struct("SessionRegistry")
            .field("session_id", &inner.state.id)
            .field("expires_at", &inner.state.expires_at)
            .field("listeners", &inner.listeners.len())
            .field("max_session_age", &self.max_session_age)
            .field("clock", &self.clock)
            .field("id_generator", &self.id_generator)
            .field("recorder", &self.recorder)
            .finish()
    }
}

/// Builder for [`SessionRegistry`].
#[derive(Debug)]
pub struct SessionRegistryBuilder {
    max_session_age: Duration,
    clock: Box<dyn Clock>,
    id_generator: Box<dyn SessionIdGenerator>,
    recorder: Box<dyn RotationRecorder>,
}

impl Default for SessionRegistryBuilder {
    fn default() -> Self {
        SessionRegistryBuilder {
            max_session_age: OTEL_RUM_SESSION_MAX_AGE_DEFAULT,
            clock: Box::new(SystemClock),
            id_generator: Box::<RandomSessionIdGenerator>::default(),
            recorder: Box::new(NoopRotationRecorder),
        }
    }
}

impl SessionRegistryBuilder {
    /// Use the session age from a [`SessionConfig`].
    pub fn with_config(self, config: &SessionConfig) -> Self {
        self.with_max_session_age(config.max_session_age)
    }

    /// Set the age after which a session rotates. Defaults to 4 hours.
    ///
    /// A zero age is ignored. Ages reaching past the latest representable
    /// time keep a session until forced to rotate.
    pub fn with_max_session_age(mut self, max_session_age: Duration) -> Self {
        if max_session_age.is_zero() {
            otel_warn!(
                name: "SessionRegistry.InvalidMaxSessionAge",
                message = "Max session age must be greater than zero. Keeping the previous value"
            );
        } else {
            self.max_session_age = max_session_age;
        }
        self
    }

    /// Set the clock used to expire sessions.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Set the generator for new session ids.
    pub fn with_id_generator<G: SessionIdGenerator + 'static>(mut self, id_generator: G) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Set the recorder receiving a [`SessionRotation`] per rotation.
    pub fn with_rotation_recorder<R: RotationRecorder + 'static>(mut self, recorder: R) -> Self {
        self.recorder = Box::new(recorder);
        self
    }

    /// Create the registry and its first session.
    pub fn build(self) -> SessionRegistry {
        let now = self.clock.now();
        let state = SessionState {
            id: self.id_generator.new_session_id(),
            expires_at: saturating_add(now, self.max_session_age),
        };
        SessionRegistry {
            inner: Mutex::new(RegistryInner {
                state,
                listeners: Vec::new(),
            }),
            max_session_age: self.max_session_age,
            clock: self.clock,
            id_generator: self.id_generator,
            recorder: self.recorder,
        }
    }
}
