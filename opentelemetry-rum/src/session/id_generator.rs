//! Session id generation
use crate::session::SessionId;
use rand::{rngs, Rng, SeedableRng};
use std::cell::RefCell;
use std::fmt;

/// Interface for generating session ids.
///
/// Session ids are sampling and correlation keys, not secrets, so
/// implementations do not need a cryptographically secure source.
pub trait SessionIdGenerator: Send + Sync + fmt::Debug {
    /// Generate a new `SessionId`
    fn new_session_id(&self) -> SessionId;
}

/// Default [`SessionIdGenerator`] implementation.
///
/// Generates session ids using a thread local random number generator.
#[derive(Clone, Debug, Default)]
pub struct RandomSessionIdGenerator {
    _private: (),
}

impl SessionIdGenerator for RandomSessionIdGenerator {
    fn new_session_id(&self) -> SessionId {
        CURRENT_RNG.with(|rng| SessionId::from(rng.borrow_mut().random::<u128>()))
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_os_rng());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_ids_are_distinct() {
        let generator = RandomSessionIdGenerator::default();
        let ids: HashSet<SessionId> = (0..1_000).map(|_| generator.new_session_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn random_ids_are_canonical() {
        let generator = RandomSessionIdGenerator::default();
        for _ in 0..100 {
            let text = generator.new_session_id().to_string();
            assert_eq!(text.len(), 32);
            assert!(text.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        }
    }
}
