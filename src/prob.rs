//!
//! probability values used in model tables and in the Viterbi trellis
//!
use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

///
/// Wrapper of f64 that represents probability `0 <= p <= 1`
///
/// The value is kept in linear space. Products are evaluated in the same
/// order as the recurrence is written, so that ties between candidate paths
/// are decided on exactly the same floating point values every time.
///
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prob(f64);

///
/// short-hand of `Prob::from_prob`
///
pub fn p(p: f64) -> Prob {
    Prob::from_prob(p)
}

impl Prob {
    ///
    /// Create `Prob` from a probability value in `[0, 1]`
    ///
    pub fn from_prob(value: f64) -> Prob {
        Prob(value)
    }
    ///
    /// `weight / total` of two integer weights.
    ///
    /// `total` must be nonzero; zero-mass rows are handled by the caller.
    pub fn from_ratio(weight: u64, total: u64) -> Prob {
        debug_assert!(total > 0, "zero division in from_ratio");
        Prob(weight as f64 / total as f64)
    }
    ///
    /// Get the probability (in `[0, 1]`)
    pub fn to_value(self) -> f64 {
        self.0
    }
    ///
    /// Is `p == 0` or not?
    ///
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
    ///
    /// Is `p > 0`?
    ///
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
    ///
    /// prob=0.0
    ///
    pub fn zero() -> Prob {
        Prob(0.0)
    }
    ///
    /// prob=1.0
    ///
    pub fn one() -> Prob {
        Prob(1.0)
    }
    ///
    /// Get the log probability `ln p` (`-inf` for `p = 0`)
    ///
    pub fn to_log_value(self) -> f64 {
        self.0.ln()
    }
    ///
    /// `p * 2^exp`
    ///
    /// Multiplying by a power of two only shifts the exponent, so the
    /// relative order of rescaled values is kept exactly.
    ///
    pub fn mul_pow2(self, exp: i32) -> Prob {
        Prob(self.0 * 2f64.powi(exp))
    }
}

/// p=0 as a default value
impl Default for Prob {
    fn default() -> Self {
        Prob::zero()
    }
}

// display
impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl std::ops::Add for Prob {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Prob(self.0 + other.0)
    }
}

/// Multiplication of two probabilities `px * py`
impl std::ops::Mul for Prob {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Prob(self.0 * other.0)
    }
}

// assign
impl std::ops::AddAssign for Prob {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::MulAssign for Prob {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}
// sum/prod
impl std::iter::Sum for Prob {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Prob::zero(), |a, b| a + b)
    }
}
impl<'a> std::iter::Sum<&'a Self> for Prob {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Prob::zero(), |a, b| a + *b)
    }
}
impl std::iter::Product for Prob {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Prob::one(), |a, b| a * b)
    }
}

/// for approx `assert_abs_diff_eq`
impl AbsDiffEq for Prob {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        f64::abs_diff_eq(&self.0, &other.0, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prob_add_mul() {
        assert_eq!(p(0.0) + p(1.0), p(1.0));
        assert_eq!(p(0.0) * p(1.0), p(0.0));
        assert_abs_diff_eq!(p(0.3) + p(0.3), p(0.6));
        assert_abs_diff_eq!(p(0.3) * p(0.3), p(0.09));
        assert_abs_diff_eq!(p(0.5) * p(0.00001), p(0.000005));
    }
    #[test]
    fn prob_sum_prod() {
        // sum/prod of zero element vec
        let xs: Vec<Prob> = vec![];
        let sum: Prob = xs.iter().sum();
        let product: Prob = xs.into_iter().product();
        assert_eq!(sum, p(0.0));
        assert_eq!(product, p(1.0));

        let xs = vec![p(0.1), p(0.1), p(0.1)];
        let sum: Prob = xs.iter().sum();
        assert_abs_diff_eq!(sum, p(0.3), epsilon = 1e-12);
    }
    #[test]
    fn prob_ratio() {
        assert_eq!(Prob::from_ratio(9, 10), p(0.9));
        assert_eq!(Prob::from_ratio(0, 10), Prob::zero());
        assert_eq!(Prob::from_ratio(3, 3), Prob::one());
    }
    #[test]
    fn prob_zero_and_order() {
        assert!(Prob::default().is_zero());
        assert!(!p(0.00001).is_zero());
        assert!(p(0.00001).is_positive());
        assert!(p(0.2) > p(0.1));
        assert!(!(p(0.1) > p(0.1)));
        assert_eq!(p(0.25).to_string(), "0.250000");
    }
    #[test]
    fn prob_log_and_pow2() {
        assert_abs_diff_eq!(p(0.5).to_log_value(), -std::f64::consts::LN_2);
        assert_eq!(Prob::zero().to_log_value(), f64::NEG_INFINITY);
        assert_eq!(p(0.75).mul_pow2(2), p(3.0));
        let tiny = p(1e-200);
        assert_eq!(tiny.mul_pow2(500).mul_pow2(-500), tiny);
        assert!(p(3e-201).mul_pow2(500) < tiny.mul_pow2(500));
    }
    #[test]
    fn prob_json() {
        let s = serde_json::to_string(&p(0.5)).unwrap();
        assert_eq!(s, "0.5");
        let x: Prob = serde_json::from_str("0.25").unwrap();
        assert_eq!(x, p(0.25));
    }
}
