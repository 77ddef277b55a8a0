//! Injectable randomness source.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

/// Lower bound of the simulated backend latency.
pub const MIN_BACKEND_LATENCY: Duration = Duration::from_millis(50);
/// Upper bound of the simulated backend latency.
pub const MAX_BACKEND_LATENCY: Duration = Duration::from_millis(500);
/// Probability that a data request fails.
pub const ERROR_RATE: f64 = 0.1;
/// Range of the payload `value` field.
pub const VALUE_RANGE: RangeInclusive<u32> = 1..=100;

/// Source of every random decision taken while serving `/api/data`.
pub trait Randomness: Send + Sync {
    /// Duration of the simulated backend call.
    fn backend_latency(&self) -> Duration;

    /// Whether this request should hit the simulated failure.
    fn should_fail(&self) -> bool;

    /// Value returned in a successful payload.
    fn payload_value(&self) -> u32;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn backend_latency(&self) -> Duration {
        let secs = rand::thread_rng()
            .gen_range(MIN_BACKEND_LATENCY.as_secs_f64()..=MAX_BACKEND_LATENCY.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    fn should_fail(&self) -> bool {
        rand::thread_rng().gen::<f64>() < ERROR_RATE
    }

    fn payload_value(&self) -> u32 {
        rand::thread_rng().gen_range(VALUE_RANGE)
    }
}

/// Deterministic source: the same decisions on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedRandomness {
    pub latency: Duration,
    pub fail: bool,
    pub value: u32,
}

impl ScriptedRandomness {
    /// Always succeed with `value`.
    pub fn success(value: u32) -> Self {
        Self {
            latency: Duration::ZERO,
            fail: false,
            value,
        }
    }

    /// Always take the simulated failure branch.
    pub fn failing() -> Self {
        Self {
            latency: Duration::ZERO,
            fail: true,
            value: *VALUE_RANGE.start(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Randomness for ScriptedRandomness {
    fn backend_latency(&self) -> Duration {
        self.latency
    }

    fn should_fail(&self) -> bool {
        self.fail
    }

    fn payload_value(&self) -> u32 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_within_bounds() {
        let source = ThreadRandomness;
        for _ in 0..1000 {
            let latency = source.backend_latency();
            assert!(latency >= MIN_BACKEND_LATENCY, "latency {:?} below bound", latency);
            assert!(latency <= MAX_BACKEND_LATENCY, "latency {:?} above bound", latency);
        }
    }

    #[test]
    fn test_payload_value_within_range() {
        let source = ThreadRandomness;
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..5000 {
            let value = source.payload_value();
            assert!(VALUE_RANGE.contains(&value));
            seen_low |= value <= 10;
            seen_high |= value >= 90;
        }
        assert!(seen_low && seen_high, "values should spread across the range");
    }

    #[test]
    fn test_error_rate_converges() {
        let source = ThreadRandomness;
        let draws = 10_000;
        let failures = (0..draws).filter(|_| source.should_fail()).count();
        let rate = failures as f64 / draws as f64;
        assert!((0.08..=0.12).contains(&rate), "observed error rate {}", rate);
    }

    #[test]
    fn test_scripted_is_deterministic() {
        let source = ScriptedRandomness::success(42).with_latency(Duration::from_millis(5));
        for _ in 0..3 {
            assert_eq!(source.payload_value(), 42);
            assert!(!source.should_fail());
            assert_eq!(source.backend_latency(), Duration::from_millis(5));
        }
        assert!(ScriptedRandomness::failing().should_fail());
    }
}
