//! # Session lifecycle
//!
//! A session is identified by a [`SessionId`] owned by the [`SessionRegistry`].
//! The registry rotates the id once it is older than the configured maximum
//! session age, or when a caller asks for a new session, and tells every
//! registered listener about the rotation.
//!
//! * [`SessionId`] and [`SessionIdGenerator`] produce identifiers.
//! * [`Clock`] abstracts the wall clock used for expiry.
//! * [`RotationRecorder`] receives a [`SessionRotation`] record per rotation.
//! * [`InactivityTracker`] forces a rotation after prolonged backgrounding.
//! * [`SessionConfig`] holds the tunables, overridable through the
//!   environment.
mod clock;
mod config;
mod id;
mod id_generator;
mod inactivity;
mod registry;
mod rotation;

pub use clock::{Clock, SystemClock};
pub use config::{SessionConfig, SessionConfigBuilder};
pub(crate) use id::SESSION_ID_HEX_LEN;
pub use id::SessionId;
pub use id_generator::{RandomSessionIdGenerator, SessionIdGenerator};
pub use inactivity::InactivityTracker;
pub use registry::{SessionRegistry, SessionRegistryBuilder};
pub use rotation::{NoopRotationRecorder, RotationRecorder, SessionRotation, SpanRotationRecorder};
