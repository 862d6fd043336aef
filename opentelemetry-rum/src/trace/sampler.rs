use crate::session::SESSION_ID_HEX_LEN;
use crate::session::{SessionId, SessionRegistry};
use opentelemetry::trace::{
    Link, SamplingDecision, SamplingResult, SpanKind, TraceContextExt, TraceId, TraceState,
};
use opentelemetry::{otel_debug, otel_warn, Context, KeyValue};
use opentelemetry_sdk::trace::ShouldSample;
use std::sync::{Arc, Mutex, Weak};

/// Folds a session id string into a 32-bit value by XOR-ing its 8 character
/// hex chunks together. Lengths and chunks count `char`s, not bytes.
///
/// Identifiers shorter than 32 characters fold to `0`. Chunks that are not
/// valid hex contribute `0`, and a trailing chunk shorter than 8 characters
/// is parsed as is. See [`SessionSampler`] for how the value is compared.
///
/// Note that a malformed 31 character id folds exactly like an all-zero id.
/// The rule is kept so hashes stay identical to already deployed agents;
/// [`SessionSampler`] never keeps such ids unless its ratio is `1.0`.
pub fn fold_hash(session_id: &str) -> u32 {
    let chars: Vec<char> = session_id.chars().collect();
    if chars.len() < SESSION_ID_HEX_LEN {
        return 0;
    }

    chars
        .chunks(8)
        .map(|chunk| {
            let chunk: String = chunk.iter().collect();
            u32::from_str_radix(&chunk, 16).unwrap_or(0)
        })
        .fold(0, |acc, value| acc ^ value)
}

/// Sampling decision for one session.
#[derive(Clone, Copy, Debug)]
struct SampleCache {
    session_id: SessionId,
    decision: bool,
}

#[derive(Debug)]
struct SamplerInner {
    registry: Arc<SessionRegistry>,
    ratio: f64,
    upper_bound: u32,
    cache: Mutex<Option<SampleCache>>,
}

impl SamplerInner {
    fn decide(&self, session_id: &str) -> bool {
        if self.ratio == 0.0 {
            false
        } else if self.ratio == 1.0 {
            true
        } else if session_id.chars().count() < SESSION_ID_HEX_LEN {
            // fold_hash maps these to 0, which every bound would keep.
            false
        } else {
            fold_hash(session_id) < self.upper_bound
        }
    }

    /// Returns the cached decision for `session_id`, computing and caching it
    /// if the cache belongs to another session.
    fn decision_for(&self, session_id: SessionId) -> bool {
        let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());
        match *cache {
            Some(cached) if cached.session_id == session_id => cached.decision,
            _ => {
                let decision = self.decide(&session_id.to_string());
                otel_debug!(
                    name: "SessionSampler.Decided",
                    session_id = session_id.to_string(),
                    sampled = decision
                );
                *cache = Some(SampleCache {
                    session_id,
                    decision,
                });
                decision
            }
        }
    }
}

/// Session based sampler.
///
/// Keeps or drops *sessions* rather than individual traces: the decision is
/// derived from the current [`SessionId`] and is the same for every trace of
/// a session.
///
/// * a ratio of `0.0` drops every session,
/// * a ratio of `1.0` keeps every session, including malformed ids,
/// * ids shorter than 32 characters are dropped by every other ratio,
/// * otherwise a session is kept when [`fold_hash`] of its id is below
///   `floor(ratio * 0xFFFFFFFF)`.
///
/// The decision is cached per session. The sampler subscribes to rotations of
/// its [`SessionRegistry`] and recomputes the decision for the new session as
/// soon as it starts. Clones share the same cache.
///
/// The parent span's sampling flag is not consulted; every span of a sampled
/// session is sampled.
#[derive(Clone, Debug)]
pub struct SessionSampler {
    inner: Arc<SamplerInner>,
}

impl SessionSampler {
    /// Create a sampler keeping `ratio` of the sessions of `registry`.
    ///
    /// Ratios outside of `[0.0, 1.0]` are clamped; `NaN` keeps every session.
    ///
    /// Every call registers a rotation listener that stays on `registry` after
    /// the sampler is dropped. Build one sampler per registry and share it
    /// through [`Clone`].
    pub fn new(registry: Arc<SessionRegistry>, ratio: f64) -> Self {
        let ratio = sanitize_ratio(ratio);
        let inner = Arc::new(SamplerInner {
            registry,
            ratio,
            upper_bound: (ratio * u32::MAX as f64).floor() as u32,
            cache: Mutex::new(None),
        });

        let weak: Weak<SamplerInner> = Arc::downgrade(&inner);
        inner.registry.register_on_rotation(move || {
            if let Some(inner) = weak.upgrade() {
                let session_id = inner.registry.peek_session_id();
                inner.decision_for(session_id);
            }
        });

        SessionSampler { inner }
    }

    /// The configured ratio, after clamping.
    pub fn ratio(&self) -> f64 {
        self.inner.ratio
    }

    /// Whether telemetry of the current session should be kept.
    ///
    /// May rotate the session if it has expired.
    pub fn should_sample_session(&self) -> bool {
        let session_id = self.inner.registry.current_session_id(false);
        self.inner.decision_for(session_id)
    }

    /// The decision this sampler makes for `session_id`, without caching.
    ///
    /// Useful for identifiers received from elsewhere, which may be
    /// malformed.
    pub fn should_sample_id(&self, session_id: &str) -> bool {
        self.inner.decide(session_id)
    }

    #[cfg(test)]
    fn cached(&self) -> Option<SampleCache> {
        *self.inner.cache.lock().unwrap()
    }
}

fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        otel_warn!(
            name: "SessionSampler.InvalidRatio",
            message = "Session sample ratio is NaN. Keeping every session"
        );
        1.0
    } else if !(0.0..=1.0).contains(&ratio) {
        let clamped = ratio.clamp(0.0, 1.0);
        otel_warn!(
            name: "SessionSampler.InvalidRatio",
            message = "Session sample ratio must be between 0.0 and 1.0. Clamping",
            ratio = ratio,
            clamped = clamped
        );
        clamped
    } else {
        ratio
    }
}

impl ShouldSample for SessionSampler {
    fn should_sample(
        &self,
        parent_context: Option<&Context>,
        _trace_id: TraceId,
        _name: &str,
        _span_kind: &SpanKind,
        _attributes: &[KeyValue],
        _links: &[Link],
    ) -> SamplingResult {
        let decision = if self.should_sample_session() {
            SamplingDecision::RecordAndSample
        } else {
            SamplingDecision::Drop
        };
        SamplingResult {
            decision,
            attributes: Vec::new(),
            trace_state: match parent_context {
                Some(ctx) => ctx.span().span_context().trace_state().clone(),
                None => TraceState::default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{RandomSessionIdGenerator, SessionIdGenerator};
    use crate::testing::session::{IncrementSessionIdGenerator, ManualClock};
    use rstest::rstest;
    use std::time::Duration;

    const ALL_ZERO: &str = "00000000000000000000000000000000";
    const ALL_F: &str = "ffffffffffffffffffffffffffffffff";

    fn registry_starting_at(first: u64) -> Arc<SessionRegistry> {
        Arc::new(
            SessionRegistry::builder()
                .with_id_generator(IncrementSessionIdGenerator::starting_at(first))
                .build(),
        )
    }

    #[rstest]
    #[case(ALL_ZERO, 0)]
    #[case(ALL_F, 0)]
    #[case("ffffffff00000000ffffffff00000000", 0)]
    #[case("00000001000000020000000400000008", 0xf)]
    #[case("deadbeef000000000000000000000000", 0xdeadbeef)]
    #[case("0000000000000000000000000000beef", 0xbeef)]
    #[case("0123456789abcdef0011223344556677", 0x01234567 ^ 0x89abcdef ^ 0x00112233 ^ 0x44556677)]
    #[case("0000000000000000000000000000000", 0)]
    #[case("", 0)]
    #[case("deadbeef", 0)]
    #[case("zzzzzzzz00000000000000000000abcd", 0xabcd)]
    #[case("00000000000000000000000000000000ff", 0xff)]
    fn fold_hash_cases(#[case] session_id: &str, #[case] expected: u32) {
        assert_eq!(fold_hash(session_id), expected);
    }

    #[test]
    fn fold_hash_matches_session_id_words() {
        let generator = RandomSessionIdGenerator::default();
        for _ in 0..100 {
            let id = generator.new_session_id();
            let bytes = id.to_bytes();
            let expected = bytes
                .chunks(4)
                .map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
                .fold(0, |acc, word| acc ^ word);
            assert_eq!(fold_hash(&id.to_string()), expected);
        }
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.5, 0x7fff_ffff)]
    #[case(0.25, 0x3fff_ffff)]
    #[case(1.0, u32::MAX)]
    #[case(-1.0, 0)]
    #[case(2.0, u32::MAX)]
    fn upper_bound_is_floored(#[case] ratio: f64, #[case] expected: u32) {
        let sampler = SessionSampler::new(registry_starting_at(1), ratio);
        assert_eq!(sampler.inner.upper_bound, expected);
    }

    #[rstest]
    #[case(ALL_ZERO)]
    #[case(ALL_F)]
    #[case("0123456789abcdef0011223344556677")]
    #[case("abc")]
    fn ratio_zero_never_samples(#[case] session_id: &str) {
        let sampler = SessionSampler::new(registry_starting_at(1), 0.0);
        assert!(!sampler.should_sample_id(session_id));
        assert!(!sampler.should_sample_session());
    }

    #[rstest]
    #[case(ALL_ZERO)]
    #[case("fedcba9876543210fedcba9876543211")]
    #[case("abc")]
    #[case("")]
    fn ratio_one_always_samples(#[case] session_id: &str) {
        let sampler = SessionSampler::new(registry_starting_at(0xffff_ffff), 1.0);
        assert!(sampler.should_sample_id(session_id));
        assert!(sampler.should_sample_session());
    }

    #[test]
    fn short_ids_are_dropped() {
        let sampler = SessionSampler::new(registry_starting_at(1), 0.5);
        assert_eq!(fold_hash("0123456789abcdef"), 0);
        assert!(!sampler.should_sample_id("0123456789abcdef"));
        assert!(!sampler.should_sample_id("0000000000000000000000000000000"));
        assert!(!sampler.should_sample_id(""));
    }

    #[rstest]
    #[case(format!("é{}", "0".repeat(30)))]
    #[case(format!("{}ü", "0".repeat(30)))]
    #[case("日".repeat(16))]
    fn multibyte_short_ids_are_dropped(#[case] session_id: String) {
        assert!(session_id.chars().count() < 32);
        assert!(session_id.len() >= 32);
        assert_eq!(fold_hash(&session_id), 0);
        let sampler = SessionSampler::new(registry_starting_at(1), 0.5);
        assert!(!sampler.should_sample_id(&session_id));
    }

    #[test]
    fn fold_hash_chunks_by_char() {
        let session_id = format!("é0000000{}", "deadbeef".repeat(3));
        assert_eq!(session_id.chars().count(), 32);
        assert_eq!(fold_hash(&session_id), 0xdeadbeef);
    }

    #[rstest]
    #[case(ALL_ZERO)]
    #[case("ffffffff00000000ffffffff00000000")]
    fn zero_hash_is_sampled(#[case] session_id: &str) {
        for ratio in [1e-6, 0.25, 0.5, 0.99] {
            let sampler = SessionSampler::new(registry_starting_at(1), ratio);
            assert!(sampler.should_sample_id(session_id));
        }
    }

    #[test]
    fn zero_hash_sampled_for_tiny_ratio() {
        let sampler = SessionSampler::new(registry_starting_at(1), 1e-9);
        assert!(sampler.should_sample_id(ALL_ZERO));
        assert!(!sampler.should_sample_id("0000000000000000000000000000beef"));
    }

    #[test]
    fn decision_is_deterministic_across_instances() {
        let first = SessionSampler::new(registry_starting_at(1), 0.5);
        let second = SessionSampler::new(registry_starting_at(1), 0.5);
        let generator = RandomSessionIdGenerator::default();
        for _ in 0..1_000 {
            let id = generator.new_session_id().to_string();
            let decision = first.should_sample_id(&id);
            assert_eq!(decision, first.should_sample_id(&id));
            assert_eq!(decision, second.should_sample_id(&id));
        }
    }

    #[test]
    fn session_decision_is_stable() {
        let sampler = SessionSampler::new(registry_starting_at(0xffff_ffff), 0.5);
        let first = sampler.should_sample_session();
        assert!(!first);
        for _ in 0..100 {
            assert_eq!(sampler.should_sample_session(), first);
        }
        let cloned = sampler.clone();
        assert_eq!(cloned.should_sample_session(), first);
    }

    #[test]
    fn rotation_recomputes_decision_eagerly() {
        // 0xffffffff folds to 0xffffffff (dropped), 0x1_0000_0000 folds to 1 (kept).
        let registry = registry_starting_at(0xffff_ffff);
        let sampler = SessionSampler::new(registry.clone(), 0.5);
        assert!(sampler.cached().is_none());
        assert!(!sampler.should_sample_session());

        let rotated = registry.current_session_id(true);

        let cached = sampler.cached().expect("decision recomputed on rotation");
        assert_eq!(cached.session_id, rotated);
        assert!(cached.decision);
        assert!(sampler.should_sample_session());
    }

    #[test]
    fn expiry_rotation_changes_decision() {
        let clock = ManualClock::default();
        let registry = Arc::new(
            SessionRegistry::builder()
                .with_max_session_age(Duration::from_secs(60))
                .with_clock(clock.clone())
                .with_id_generator(IncrementSessionIdGenerator::starting_at(0xffff_ffff))
                .build(),
        );
        let sampler = SessionSampler::new(registry, 0.5);
        assert!(!sampler.should_sample_session());

        clock.advance(Duration::from_secs(61));

        assert!(sampler.should_sample_session());
    }

    #[test]
    fn sampler_does_not_keep_registry_listener_alive() {
        let registry = registry_starting_at(1);
        let sampler = SessionSampler::new(registry.clone(), 0.5);
        let weak = Arc::downgrade(&sampler.inner);
        drop(sampler);
        assert!(weak.upgrade().is_none());
        // The stale listener is a no-op.
        registry.current_session_id(true);
    }

    #[test]
    fn sampled_fraction_converges_to_ratio() {
        let total = 10_000;
        let generator = RandomSessionIdGenerator::default();
        for ratio in [0.1, 0.25, 0.5, 0.75, 0.9] {
            let sampler = SessionSampler::new(registry_starting_at(1), ratio);
            let sampled = (0..total)
                .filter(|_| sampler.should_sample_id(&generator.new_session_id().to_string()))
                .count();
            let got = sampled as f64 / total as f64;
            // See https://en.wikipedia.org/wiki/Binomial_proportion_confidence_interval
            let z = 4.75342; // This should succeed 99.9999% of the time
            let tolerance = z * (got * (1.0 - got) / total as f64).sqrt();
            let diff = (got - ratio).abs();
            assert!(
                diff <= tolerance,
                "ratio {} got {:?} (diff: {}), tolerance {}",
                ratio,
                got,
                diff,
                tolerance
            );
        }
    }

    #[test]
    fn out_of_range_ratios_are_clamped() {
        assert_eq!(SessionSampler::new(registry_starting_at(1), -0.5).ratio(), 0.0);
        assert_eq!(SessionSampler::new(registry_starting_at(1), 3.0).ratio(), 1.0);
        assert_eq!(
            SessionSampler::new(registry_starting_at(1), f64::NAN).ratio(),
            1.0
        );
    }

    #[test]
    fn should_sample_maps_session_decision() {
        let kept = SessionSampler::new(registry_starting_at(1), 0.5);
        let dropped = SessionSampler::new(registry_starting_at(0xffff_ffff), 0.5);
        let sample = |sampler: &SessionSampler| {
            sampler
                .should_sample(
                    None,
                    TraceId::from(1u128),
                    "span",
                    &SpanKind::Internal,
                    &[],
                    &[],
                )
                .decision
        };

        assert_eq!(sample(&kept), SamplingDecision::RecordAndSample);
        assert_eq!(sample(&dropped), SamplingDecision::Drop);
        // Trace ids do not matter, only the session.
        assert_eq!(
            kept.should_sample(
                None,
                TraceId::from(u128::MAX),
                "span",
                &SpanKind::Server,
                &[],
                &[],
            )
            .decision,
            SamplingDecision::RecordAndSample
        );
    }
}
