//! # Session aware tracing
//!
//! Plugs sessions into the OpenTelemetry trace SDK:
//!
//! * [`SessionSampler`] is a [`ShouldSample`] implementation keeping or
//!   dropping whole sessions.
//! * [`SessionSpanProcessor`] tags every span with the current session id.
//!
//! [`ShouldSample`]: opentelemetry_sdk::trace::ShouldSample
mod sampler;
mod span_processor;

pub use sampler::{fold_hash, SessionSampler};
pub use span_processor::SessionSpanProcessor;
