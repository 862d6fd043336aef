//! # OpenTelemetry RUM Sessions
//!
//! Session identity and session-level sampling for client side (real user
//! monitoring) telemetry built on the OpenTelemetry SDK.
//!
//! Every span, log and metric emitted by a RUM application belongs to a
//! *session*: a bounded stretch of application usage identified by a random
//! 128-bit [`SessionId`]. Sessions expire after a configurable age and may be
//! rotated early, for example after the application stayed in the background
//! for too long. Sampling is decided once per session, so either all of a
//! session's telemetry is kept or none of it is.
//!
//! The crate consists of a few main types:
//!
//! * [`SessionRegistry`] owns the current session id, rotates it and notifies
//!   rotation listeners.
//! * [`SessionSampler`] derives a stable keep/drop decision from the session
//!   id. It implements the SDK's [`ShouldSample`] so it can be installed on a
//!   tracer provider.
//! * [`SessionSpanProcessor`] stamps `session.id` on every started span.
//! * [`RumSession`] wires all of the above together from a [`SessionConfig`].
//!
//! ```
//! use opentelemetry_rum::RumSession;
//! use opentelemetry_sdk::trace::SdkTracerProvider;
//!
//! let session = RumSession::builder().build();
//! let provider = SdkTracerProvider::builder()
//!     .with_sampler(session.sampler())
//!     .with_span_processor(session.span_processor())
//!     .build();
//!
//! let id = session.current_session_id(false);
//! assert_eq!(id.to_string().len(), 32);
//! # drop(provider);
//! ```
//!
//! [`ShouldSample`]: opentelemetry_sdk::trace::ShouldSample
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

pub mod error;
mod rum_session;
pub mod semconv;
pub mod session;
#[cfg(any(test, feature = "testing"))]
#[doc(hidden)]
pub mod testing;
pub mod trace;

pub use error::{ConfigError, SessionIdError};
pub use rum_session::{RumSession, RumSessionBuilder};
pub use session::{
    InactivityTracker, SessionConfig, SessionConfigBuilder, SessionId, SessionRegistry,
    SessionRegistryBuilder, SessionRotation,
};
pub use trace::{SessionSampler, SessionSpanProcessor};
