use crate::session::{
    Clock, InactivityTracker, RotationRecorder, SessionConfig, SessionId, SessionIdGenerator,
    SessionRegistry, SessionRegistryBuilder,
};
use crate::trace::{SessionSampler, SessionSpanProcessor};
use std::sync::Arc;

/// Entry point wiring a [`SessionRegistry`], a [`SessionSampler`] and an
/// [`InactivityTracker`] together from one [`SessionConfig`].
///
/// Create one per process and hand it, or the parts returned by
/// [`sampler`] and [`span_processor`], to the components producing
/// telemetry.
///
/// [`sampler`]: RumSession::sampler
/// [`span_processor`]: RumSession::span_processor
#[derive(Debug)]
pub struct RumSession {
    registry: Arc<SessionRegistry>,
    sampler: SessionSampler,
    inactivity: InactivityTracker,
}

impl RumSession {
    /// Create a new [`RumSessionBuilder`].
    pub fn builder() -> RumSessionBuilder {
        RumSessionBuilder::default()
    }

    /// The id of the current session, starting a new session first when
    /// `force_new` is set or the current one expired.
    pub fn current_session_id(&self, force_new: bool) -> SessionId {
        self.registry.current_session_id(force_new)
    }

    /// Register a callback invoked after every session rotation.
    pub fn register_on_rotation<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_on_rotation(listener)
    }

    /// Whether telemetry of the current session should be kept.
    ///
    /// Consult once per trace root; the answer only changes when the session
    /// rotates.
    pub fn should_sample_this_session(&self) -> bool {
        self.sampler.should_sample_session()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// A sampler for `SdkTracerProvider::builder().with_sampler(..)`. Shares
    /// its cached decision with this session.
    pub fn sampler(&self) -> SessionSampler {
        self.sampler.clone()
    }

    /// A span processor stamping `session.id` on every span.
    pub fn span_processor(&self) -> SessionSpanProcessor {
        SessionSpanProcessor::new(self.registry.clone())
    }

    /// Tracker to report the application moving to the background and back.
    pub fn inactivity(&self) -> &InactivityTracker {
        &self.inactivity
    }
}

/// Builder for [`RumSession`].
#[derive(Debug, Default)]
pub struct RumSessionBuilder {
    config: Option<SessionConfig>,
    registry: SessionRegistryBuilder,
}

impl RumSessionBuilder {
    /// Use `config` instead of [`SessionConfig::default`].
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the clock used to expire sessions and track inactivity.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.registry = self.registry.with_clock(clock);
        self
    }

    /// Set the generator for new session ids.
    pub fn with_id_generator<G: SessionIdGenerator + 'static>(mut self, id_generator: G) -> Self {
        self.registry = self.registry.with_id_generator(id_generator);
        self
    }

    /// Set the recorder receiving a record of every rotation.
    pub fn with_rotation_recorder<R: RotationRecorder + 'static>(mut self, recorder: R) -> Self {
        self.registry = self.registry.with_rotation_recorder(recorder);
        self
    }

    /// Create the session.
    pub fn build(self) -> RumSession {
        let config = self.config.unwrap_or_default();
        let registry = Arc::new(self.registry.with_config(&config).build());
        let sampler = SessionSampler::new(registry.clone(), config.sample_ratio);
        let inactivity = InactivityTracker::with_config(registry.clone(), &config);
        RumSession {
            registry,
            sampler,
            inactivity,
        }
    }
}
