//! Allowance policy: expected amount per distance and the variance rule used
//! by bulk approval.
//!
//! Everything in this module is pure; the engine reads the configured rate
//! once at build time.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Default allowance: 2.00 per kilometre.
pub const DEFAULT_RATE_PER_KM_MINOR: i64 = 200;

/// Default tolerance of the bulk sweep, in percent.
pub const DEFAULT_VARIANCE_PERCENT: f64 = 10.0;

/// Variance assigned to a non-zero claim against a zero expected amount.
///
/// Large enough that any realistic tolerance rejects the claim.
pub const ZERO_EXPECTED_VARIANCE: f64 = 100_000.0;

const MICRO: i128 = 1_000_000;

/// Money granted per kilometre, in minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowanceRate(i64);

impl AllowanceRate {
    pub fn new(rate_per_km_minor: i64) -> ResultEngine<Self> {
        if rate_per_km_minor < 0 {
            return Err(EngineError::InvalidArgument(
                "allowance rate must be >= 0".to_string(),
            ));
        }
        Ok(Self(rate_per_km_minor))
    }

    pub fn per_km(self) -> Money {
        Money::new(self.0)
    }

    /// Expected allowance for a journey of `distance_km`.
    ///
    /// Distances are validated when a journey is written (finite, between 0
    /// and a million kilometres), so anything else collapses to zero. A product
    /// beyond the money range saturates instead.
    pub fn expected_amount(self, distance_km: f64) -> Money {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Money::ZERO;
        }
        let minor = distance_km * self.0 as f64;
        Money::from_minor_f64(minor).unwrap_or(Money::new(i64::MAX))
    }
}

impl Default for AllowanceRate {
    fn default() -> Self {
        Self(DEFAULT_RATE_PER_KM_MINOR)
    }
}

/// Percentage deviation of `amount` from `expected`.
pub fn variance_percent(amount: Money, expected: Money) -> f64 {
    if expected.is_zero() {
        return if amount.is_zero() {
            0.0
        } else {
            ZERO_EXPECTED_VARIANCE
        };
    }
    let amount = amount.minor() as f64;
    let expected = expected.minor() as f64;
    (amount - expected) / expected * 100.0
}

/// Rounds a variance to two decimals for reporting.
pub fn round_variance(variance: f64) -> f64 {
    (variance * 100.0).round() / 100.0
}

/// Outcome of the variance rule for one expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDecision {
    Approved,
    Rejected,
}

/// Validated tolerance for the bulk sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VarianceTolerance(f64);

impl VarianceTolerance {
    /// Sign is ignored: `-10` and `10` are the same tolerance.
    pub fn new(percent: f64) -> ResultEngine<Self> {
        if !percent.is_finite() {
            return Err(EngineError::InvalidArgument(
                "variance percent must be a finite number".to_string(),
            ));
        }
        Ok(Self(percent.abs()))
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    /// Tolerance in millionths of a percent, the precision decisions use.
    /// The cast saturates for very large tolerances.
    fn micro_percent(self) -> i128 {
        (self.0 * MICRO as f64).round() as i128
    }

    /// Approve when `|variance_percent(amount, expected)| <= tolerance`;
    /// equality approves.
    ///
    /// Decided on integers, `|amount - expected| * 100 <= tolerance * expected`,
    /// so a claim exactly at the tolerance is never lost to rounding.
    pub fn decide(self, amount: Money, expected: Money) -> VarianceDecision {
        let approved = if expected.is_zero() {
            amount.is_zero() || ZERO_EXPECTED_VARIANCE <= self.0
        } else {
            let deviation = (i128::from(amount.minor()) - i128::from(expected.minor())).abs();
            // an allowed deviation beyond i128 covers every possible claim
            self.micro_percent()
                .checked_mul(i128::from(expected.minor()).abs())
                .is_none_or(|allowed| deviation * 100 * MICRO <= allowed)
        };
        if approved {
            VarianceDecision::Approved
        } else {
            VarianceDecision::Rejected
        }
    }
}

impl Default for VarianceTolerance {
    fn default() -> Self {
        Self(DEFAULT_VARIANCE_PERCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(minor: i64) -> AllowanceRate {
        AllowanceRate::new(minor).unwrap()
    }

    #[test]
    fn expected_is_distance_times_rate() {
        assert_eq!(rate(200).expected_amount(50.0), Money::new(10_000));
        assert_eq!(rate(35).expected_amount(12.0), Money::new(420));
        for r in [0, 1, 200, 999] {
            assert_eq!(rate(r).expected_amount(0.0), Money::ZERO);
        }
    }

    #[test]
    fn expected_rounds_to_nearest_minor_unit() {
        assert_eq!(rate(200).expected_amount(12.345), Money::new(2469));
        assert_eq!(rate(3).expected_amount(0.5), Money::new(2));
    }

    #[test]
    fn negative_rate_is_rejected() {
        assert!(matches!(
            AllowanceRate::new(-1),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    fn decide(tolerance: f64, amount: i64, expected: i64) -> VarianceDecision {
        VarianceTolerance::new(tolerance)
            .unwrap()
            .decide(Money::new(amount), Money::new(expected))
    }

    #[test]
    fn boundary_is_inclusive() {
        let variance = variance_percent(Money::new(11_000), Money::new(10_000));
        assert_eq!(round_variance(variance), 10.0);
        assert_eq!(decide(10.0, 11_000, 10_000), VarianceDecision::Approved);
        assert_eq!(decide(9.0, 11_000, 10_000), VarianceDecision::Rejected);
    }

    #[test]
    fn exact_ties_approve_despite_float_error() {
        // (10_700 - 10_000) / 10_000 * 100 is 7.000000000000001 in f64
        assert!(variance_percent(Money::new(10_700), Money::new(10_000)) > 7.0);
        assert_eq!(decide(7.0, 10_700, 10_000), VarianceDecision::Approved);
        assert_eq!(decide(7.0, 10_701, 10_000), VarianceDecision::Rejected);
        assert_eq!(decide(7.0, 9_300, 10_000), VarianceDecision::Approved);

        assert_eq!(decide(3.0, 10_300, 10_000), VarianceDecision::Approved);
        assert_eq!(decide(3.0, 10_301, 10_000), VarianceDecision::Rejected);

        assert_eq!(decide(0.07, 10_007, 10_000), VarianceDecision::Approved);
        assert_eq!(decide(0.07, 10_008, 10_000), VarianceDecision::Rejected);
    }

    #[test]
    fn under_claims_use_absolute_variance() {
        let variance = variance_percent(Money::new(9_500), Money::new(10_000));
        assert_eq!(round_variance(variance), -5.0);
        assert_eq!(
            VarianceTolerance::default().decide(Money::new(9_500), Money::new(10_000)),
            VarianceDecision::Approved
        );
        assert_eq!(decide(-4.0, 9_500, 10_000), VarianceDecision::Rejected);
    }

    #[test]
    fn zero_expected_uses_sentinel() {
        assert_eq!(variance_percent(Money::ZERO, Money::ZERO), 0.0);
        let variance = variance_percent(Money::new(5_000), Money::ZERO);
        assert_eq!(variance, ZERO_EXPECTED_VARIANCE);
        assert_eq!(decide(99_999.0, 5_000, 0), VarianceDecision::Rejected);
        assert_eq!(decide(100_000.0, 5_000, 0), VarianceDecision::Approved);
        assert_eq!(decide(0.0, 0, 0), VarianceDecision::Approved);
    }

    #[test]
    fn huge_tolerance_and_amounts_do_not_overflow() {
        assert_eq!(
            decide(f64::MAX, i64::MAX, 1),
            VarianceDecision::Approved
        );
        assert_eq!(decide(10.0, i64::MAX, i64::MAX), VarianceDecision::Approved);
    }

    #[test]
    fn expected_amount_saturates_instead_of_vanishing() {
        assert_eq!(rate(200).expected_amount(1e300), Money::new(i64::MAX));
    }

    #[test]
    fn tolerance_must_be_finite() {
        assert!(VarianceTolerance::new(f64::NAN).is_err());
        assert!(VarianceTolerance::new(f64::INFINITY).is_err());
    }
}
