//! Attribute keys and span names used for session telemetry.

/// The identifier of the session a span belongs to.
///
/// Value: the 32 character lowercase hex form of a [`SessionId`].
///
/// [`SessionId`]: crate::SessionId
pub const SESSION_ID: &str = "session.id";

/// The identifier of the session that was replaced by a rotation.
pub const PREVIOUS_SESSION_ID: &str = "previous.session.id";

/// Name of the span recorded whenever the session id rotates.
pub const SESSION_ID_CHANGE: &str = "session.id.change";

/// Instrumentation scope name used for spans created by this crate.
pub const INSTRUMENTATION_NAME: &str = "opentelemetry-rum";
