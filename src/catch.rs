//! Catch probability
//!
//! The chance of catching a creature falls off logarithmically with its base
//! experience: `1.95 - 0.279 * ln(base_experience)`. The curve gives roughly
//! 95% at the lowest base experience in the games (36) and 15% at the highest
//! (635); results are clamped to that range so outliers stay catchable.

use rand::Rng;

/// Intercept of the catch-rate curve
const CATCH_RATE_A: f64 = 1.95;

/// Slope of the catch-rate curve against `ln(base_experience)`
const CATCH_RATE_B: f64 = 0.279;

/// Lowest catch rate, reached by the strongest creatures
pub const MIN_CATCH_RATE: f64 = 0.15;

/// Highest catch rate, reached by the weakest creatures
pub const MAX_CATCH_RATE: f64 = 0.95;

/// Probability in `[MIN_CATCH_RATE, MAX_CATCH_RATE]` of catching a creature
///
/// A base experience of zero (unknown) yields the maximum rate.
pub fn catch_rate(base_experience: u32) -> f64 {
    if base_experience == 0 {
        return MAX_CATCH_RATE;
    }
    let rate = CATCH_RATE_A - CATCH_RATE_B * f64::from(base_experience).ln();
    rate.clamp(MIN_CATCH_RATE, MAX_CATCH_RATE)
}

/// Rolls a single catch attempt
///
/// # Returns
/// `true` if a uniform draw from `[0, 1)` falls below the catch rate
pub fn attempt_catch<R: Rng + ?Sized>(base_experience: u32, rng: &mut R) -> bool {
    rng.gen::<f64>() < catch_rate(base_experience)
}
