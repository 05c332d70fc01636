//! Exponential half-life decay: `decayed = weight * 2^(-age / half_life)`.
//!
//! Age and half-life share a unit (the pipeline uses seconds). Negative ages
//! come from clock skew and count as zero, so decay never amplifies.

use crate::error::{EngineError, Result};
use crate::time::days_to_secs;

/// A validated, strictly positive, finite half-life.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct HalfLife(f64);

impl HalfLife {
    pub fn new(half_life: f64) -> Result<Self> {
        if half_life.is_finite() && half_life > 0.0 {
            Ok(Self(half_life))
        } else {
            Err(EngineError::config(format!(
                "half-life must be a positive, finite number (got {half_life})"
            )))
        }
    }

    /// Half-life given in days, stored in seconds.
    pub fn from_days(days: f64) -> Result<Self> {
        Self::new(days_to_secs(days))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// Multiplier in `(0, 1]` for an item of the given age.
    pub fn factor(&self, age: f64) -> f64 {
        let age = if age > 0.0 { age } else { 0.0 };
        (-age / self.0).exp2()
    }

    pub fn apply(&self, weight: f64, age: f64) -> f64 {
        weight * self.factor(age)
    }
}

/// Decay `weight` by `age` with the given half-life.
/// Fails only when `half_life` is not a positive, finite number.
pub fn decay(weight: f64, age: f64, half_life: f64) -> Result<f64> {
    Ok(HalfLife::new(half_life)?.apply(weight, age))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_age_is_identity() {
        assert_eq!(decay(3.25, 0.0, 10.0).unwrap(), 3.25);
    }

    #[test]
    fn test_one_half_life_halves() {
        assert_eq!(decay(8.0, 10.0, 10.0).unwrap(), 4.0);
        assert_eq!(decay(8.0, 20.0, 10.0).unwrap(), 2.0);
    }

    #[test]
    fn test_fractional_age() {
        assert_relative_eq!(
            decay(1.0, 5.0, 10.0).unwrap(),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_negative_age_never_amplifies() {
        assert_eq!(decay(2.0, -100.0, 10.0).unwrap(), 2.0);
        assert_eq!(decay(2.0, f64::NAN, 10.0).unwrap(), 2.0);
    }

    #[test]
    fn test_non_positive_half_life_rejected() {
        for hl in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = decay(1.0, 1.0, hl).unwrap_err();
            assert!(matches!(err, EngineError::Configuration { .. }), "{hl}");
        }
    }

    #[test]
    fn test_from_days() {
        let hl = HalfLife::from_days(365.0).unwrap();
        assert_eq!(hl.get(), 365.0 * 86_400.0);
        assert_eq!(hl.apply(1.0, 365.0 * 86_400.0), 0.5);
        assert!(HalfLife::from_days(0.0).is_err());
    }

    #[test]
    fn test_very_old_decays_to_zero_not_negative() {
        let w = decay(1.0, 1e12, 1.0).unwrap();
        assert_eq!(w, 0.0);
    }
}
