use crate::semconv;
use crate::session::SessionRegistry;
use opentelemetry::trace::Span as _;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{Span, SpanData, SpanProcessor};
use std::sync::Arc;
use std::time::Duration;

/// A [`SpanProcessor`] that adds the current session id to every span as the
/// `session.id` attribute.
///
/// Reading the session id may rotate an expired session. It does not export
/// anything; register an exporting processor next to it.
#[derive(Debug, Clone)]
pub struct SessionSpanProcessor {
    registry: Arc<SessionRegistry>,
}

impl SessionSpanProcessor {
    /// Create a processor tagging spans with sessions of `registry`.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        SessionSpanProcessor { registry }
    }
}

impl SpanProcessor for SessionSpanProcessor {
    fn on_start(&self, span: &mut Span, _cx: &Context) {
        let session_id = self.registry.current_session_id(false);
        span.set_attribute(KeyValue::new(semconv::SESSION_ID, session_id.to_string()));
    }

    fn on_end(&self, _span: SpanData) {}

    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        Ok(())
    }
}
