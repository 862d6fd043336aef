//! Session configuration
//!
//! Defaults can be overridden through environment variables, read when a
//! [`SessionConfigBuilder`] is created. Values set explicitly on the builder
//! take precedence over the environment.
use crate::error::ConfigError;
use opentelemetry::otel_warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Maximum age of a session before it is rotated, in milliseconds.
pub(crate) const OTEL_RUM_SESSION_MAX_AGE: &str = "OTEL_RUM_SESSION_MAX_AGE";
/// Default maximum session age: 4 hours.
pub(crate) const OTEL_RUM_SESSION_MAX_AGE_DEFAULT: Duration = Duration::from_secs(4 * 60 * 60);
/// Fraction of sessions to keep, between 0.0 and 1.0.
pub(crate) const OTEL_RUM_SESSION_SAMPLE_RATIO: &str = "OTEL_RUM_SESSION_SAMPLE_RATIO";
/// Default sample ratio: keep every session.
pub(crate) const OTEL_RUM_SESSION_SAMPLE_RATIO_DEFAULT: f64 = 1.0;
/// Time spent in the background after which the session rotates, in milliseconds.
pub(crate) const OTEL_RUM_SESSION_INACTIVITY_TIMEOUT: &str = "OTEL_RUM_SESSION_INACTIVITY_TIMEOUT";
/// Default inactivity timeout: 15 minutes.
pub(crate) const OTEL_RUM_SESSION_INACTIVITY_TIMEOUT_DEFAULT: Duration =
    Duration::from_secs(15 * 60);

/// Session configuration.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct SessionConfig {
    /// Age after which a session expires and a new session id is generated.
    pub max_session_age: Duration,

    /// Fraction of sessions whose telemetry is kept.
    pub sample_ratio: f64,

    /// Time spent in the background after which returning to the foreground
    /// starts a new session.
    pub inactivity_timeout: Duration,
}

impl SessionConfig {
    /// Create a [`SessionConfigBuilder`] seeded from the environment.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfigBuilder::default().into_config()
    }
}

/// A builder for creating [`SessionConfig`] instances.
#[derive(Debug)]
pub struct SessionConfigBuilder {
    max_session_age: Duration,
    sample_ratio: f64,
    inactivity_timeout: Duration,
}

impl Default for SessionConfigBuilder {
    /// Create a new [`SessionConfigBuilder`] initialized with default session config values as per the specs.
    /// The values are overridden by environment variables if set.
    /// The supported environment variables are:
    /// * `OTEL_RUM_SESSION_MAX_AGE`
    /// * `OTEL_RUM_SESSION_SAMPLE_RATIO`
    /// * `OTEL_RUM_SESSION_INACTIVITY_TIMEOUT`
    fn default() -> Self {
        SessionConfigBuilder {
            max_session_age: OTEL_RUM_SESSION_MAX_AGE_DEFAULT,
            sample_ratio: OTEL_RUM_SESSION_SAMPLE_RATIO_DEFAULT,
            inactivity_timeout: OTEL_RUM_SESSION_INACTIVITY_TIMEOUT_DEFAULT,
        }
        .init_from_env_vars()
    }
}

impl SessionConfigBuilder {
    /// Set max_session_age for [`SessionConfigBuilder`].
    /// Sessions older than this are rotated on the next access.
    /// The default value is 4 hours.
    pub fn with_max_session_age(mut self, max_session_age: Duration) -> Self {
        self.max_session_age = max_session_age;
        self
    }

    /// Set sample_ratio for [`SessionConfigBuilder`].
    /// The value must be between 0.0 (drop every session) and 1.0 (keep every
    /// session). The default value is 1.0.
    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    /// Set inactivity_timeout for [`SessionConfigBuilder`].
    /// The default value is 15 minutes.
    pub fn with_inactivity_timeout(mut self, inactivity_timeout: Duration) -> Self {
        self.inactivity_timeout = inactivity_timeout;
        self
    }

    /// Builds a [`SessionConfig`], validating the configured values.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        if !is_valid_ratio(self.sample_ratio) {
            return Err(ConfigError::InvalidSampleRatio(self.sample_ratio));
        }
        if self.max_session_age.is_zero() {
            return Err(ConfigError::ZeroMaxSessionAge);
        }
        Ok(self.into_config())
    }

    fn into_config(self) -> SessionConfig {
        SessionConfig {
            max_session_age: self.max_session_age,
            sample_ratio: self.sample_ratio,
            inactivity_timeout: self.inactivity_timeout,
        }
    }

    fn init_from_env_vars(mut self) -> Self {
        if let Ok(max_session_age) = env::var(OTEL_RUM_SESSION_MAX_AGE) {
            match u64::from_str(&max_session_age) {
                Ok(millis) if millis > 0 => self.max_session_age = Duration::from_millis(millis),
                _ => {
                    otel_warn!(
                        name: "SessionConfig.InvalidMaxSessionAge",
                        message = "OTEL_RUM_SESSION_MAX_AGE must be a number of milliseconds greater than zero. Using the default of 4 hours",
                        otel_rum_session_max_age = max_session_age.as_str()
                    );
                }
            }
        }

        if let Ok(sample_ratio) = env::var(OTEL_RUM_SESSION_SAMPLE_RATIO) {
            match f64::from_str(&sample_ratio) {
                Ok(ratio) if is_valid_ratio(ratio) => self.sample_ratio = ratio,
                _ => {
                    otel_warn!(
                        name: "SessionConfig.InvalidSampleRatio",
                        message = "OTEL_RUM_SESSION_SAMPLE_RATIO must be a float between 0.0 and 1.0. Falling back to default ratio: 1.0",
                        otel_rum_session_sample_ratio = sample_ratio.as_str()
                    );
                }
            }
        }

        if let Ok(inactivity_timeout) = env::var(OTEL_RUM_SESSION_INACTIVITY_TIMEOUT) {
            match u64::from_str(&inactivity_timeout) {
                Ok(millis) => self.inactivity_timeout = Duration::from_millis(millis),
                Err(_) => {
                    otel_warn!(
                        name: "SessionConfig.InvalidInactivityTimeout",
                        message = "OTEL_RUM_SESSION_INACTIVITY_TIMEOUT must be a number of milliseconds. Using the default of 15 minutes",
                        otel_rum_session_inactivity_timeout = inactivity_timeout.as_str()
                    );
                }
            }
        }

        self
    }
}

fn is_valid_ratio(ratio: f64) -> bool {
    (0.0..=1.0).contains(&ratio)
}
