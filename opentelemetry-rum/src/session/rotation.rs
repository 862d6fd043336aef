use crate::semconv;
use crate::session::SessionId;
use opentelemetry::trace::{Span, Tracer};
use opentelemetry::KeyValue;
use std::fmt;
use std::time::SystemTime;

/// Record of a single session rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionRotation {
    /// The session id that was replaced.
    pub previous: SessionId,
    /// The session id that replaced it.
    pub current: SessionId,
    /// When the rotation was committed.
    pub timestamp: SystemTime,
}

/// Receives a [`SessionRotation`] for every rotation committed by a
/// [`SessionRegistry`].
///
/// Called without any registry lock held, after rotation listeners ran.
///
/// [`SessionRegistry`]: crate::SessionRegistry
pub trait RotationRecorder: Send + Sync + fmt::Debug {
    /// Record a rotation.
    fn record(&self, rotation: &SessionRotation);
}

/// A [`RotationRecorder`] that discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRotationRecorder;

impl RotationRecorder for NoopRotationRecorder {
    fn record(&self, _rotation: &SessionRotation) {}
}

/// A [`RotationRecorder`] that emits a zero length `session.id.change` span
/// through a [`Tracer`].
///
/// The span carries `previous.session.id` and `session.id` attributes.
pub struct SpanRotationRecorder<T> {
    tracer: T,
}

impl<T> SpanRotationRecorder<T>
where
    T: Tracer + Send + Sync,
{
    /// Create a recorder emitting spans through `tracer`.
    pub fn new(tracer: T) -> Self {
        SpanRotationRecorder { tracer }
    }
}

impl<T> fmt::Debug for SpanRotationRecorder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanRotationRecorder").finish_non_exhaustive()
    }
}

impl<T> RotationRecorder for SpanRotationRecorder<T>
where
    T: Tracer + Send + Sync,
{
    fn record(&self, rotation: &SessionRotation) {
        let mut span = self
            .tracer
            .span_builder(semconv::SESSION_ID_CHANGE)
            .with_start_time(rotation.timestamp)
            .with_attributes([
                KeyValue::new(semconv::PREVIOUS_SESSION_ID, rotation.previous.to_string()),
                KeyValue::new(semconv::SESSION_ID, rotation.current.to_string()),
            ])
            .start(&self.tracer);
        span.end_with_timestamp(rotation.timestamp);
    }
}
