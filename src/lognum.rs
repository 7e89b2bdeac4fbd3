//! Non-negative reals stored as natural logarithms.
//!
//! All weights and partial sums in the samplers are [`LogProb`] values: the
//! dynamic programs multiply hundreds of binomials and weights together, which
//! overflows `f64` long before `n = 100`, while the logarithms stay small.
//!
//! The representation is `ln(x)`, with `-inf` standing for exact zero.
//!
//! ```text
//! a + b = max + ln(1 + exp(min - max))   (log-sum-exp)
//! a * b = ln(a) + ln(b)
//! a ^ k = k * ln(a)
//! ```

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign};
use std::sync::LazyLock;

use rand::Rng;
use rand_distr::{Distribution, Exp1};
use statrs::function::gamma::ln_gamma;

/// Size of the precomputed `ln(k!)` table.
const LOG_FACTORIAL_TABLE_SIZE: usize = 16384;

static LOG_FACTORIAL: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut table = Vec::with_capacity(LOG_FACTORIAL_TABLE_SIZE);
    let mut acc = 0.0;
    table.push(acc);
    for k in 1..LOG_FACTORIAL_TABLE_SIZE {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
});

fn log_factorial(n: usize) -> f64 {
    match LOG_FACTORIAL.get(n) {
        Some(&value) => value,
        None => ln_gamma(n as f64 + 1.0),
    }
}

/// A non-negative real number stored as its natural logarithm.
#[derive(Debug, Copy, Clone)]
pub struct LogProb(f64);

impl LogProb {
    /// The additive identity (`ln 0 = -inf`).
    pub const fn zero() -> Self {
        Self(f64::NEG_INFINITY)
    }

    /// The multiplicative identity (`ln 1 = 0`).
    pub const fn one() -> Self {
        Self(0.0)
    }

    /// Wraps a real value `x >= 0`.
    pub fn from_real(x: f64) -> Self {
        debug_assert!(x >= 0.0, "LogProb must be non-negative, got {}", x);
        Self(x.ln())
    }

    /// Wraps an already logarithmic value. `-inf` is zero.
    pub const fn from_log(l: f64) -> Self {
        Self(l)
    }

    /// Returns the stored logarithm.
    pub const fn ln(self) -> f64 {
        self.0
    }

    /// Converts back to a real value (may overflow to `inf`).
    pub fn to_real(self) -> f64 {
        self.0.exp()
    }

    pub fn is_zero(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    /// Raises to a non-negative integer power.
    ///
    /// `x^0` is one for every `x`, zero included.
    pub fn powi(self, exponent: usize) -> Self {
        if exponent == 0 {
            return Self::one();
        }
        Self(self.0 * exponent as f64)
    }

    /// Binomial coefficient `C(n, k)`.
    ///
    /// The caller guarantees `k <= n`. Outside that range the factorial identity
    /// is meaningless, so it is never evaluated there.
    pub fn binomial(n: usize, k: usize) -> Self {
        debug_assert!(k <= n, "binomial({}, {}) is out of range", n, k);
        Self(log_factorial(n) - log_factorial(k) - log_factorial(n - k))
    }

    /// Draws the logarithm of a Uniform(0, 1] variate.
    ///
    /// If `E ~ Exp(1)` then `exp(-E)` is uniform on (0, 1], so `-E` is the
    /// logarithm we want without ever leaving log space.
    pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let e: f64 = Exp1.sample(rng);
        Self(-e)
    }

    /// Draws uniformly from (0, `upper_bound`].
    pub fn uniform_below<R: Rng + ?Sized>(upper_bound: Self, rng: &mut R) -> Self {
        Self::uniform(rng) * upper_bound
    }
}

impl Default for LogProb {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for LogProb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let (hi, lo) = if self.0 >= rhs.0 { (self.0, rhs.0) } else { (rhs.0, self.0) };
        if hi == f64::NEG_INFINITY {
            return Self::zero();
        }
        Self(hi + (lo - hi).exp().ln_1p())
    }
}

impl AddAssign for LogProb {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for LogProb {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        // -inf + inf would be NaN, but weights are never infinite.
        Self(self.0 + rhs.0)
    }
}

impl MulAssign for LogProb {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for LogProb {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl Product for LogProb {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::one(), Mul::mul)
    }
}

impl PartialEq for LogProb {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LogProb {}

impl PartialOrd for LogProb {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogProb {
    fn cmp(&self, other: &Self) -> Ordering {
        // Zero (-inf) is the smallest value; `0.0 == -0.0` still compares equal.
        self.0.partial_cmp(&other.0).unwrap_or_else(|| self.0.total_cmp(&other.0))
    }
}

impl Display for LogProb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "exp({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn assert_close(a: LogProb, b: LogProb) {
        assert!((a.ln() - b.ln()).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_identities() {
        assert!(LogProb::zero().is_zero());
        assert_eq!(LogProb::one().to_real(), 1.0);
        assert_eq!(LogProb::zero().to_real(), 0.0);
        assert_eq!(LogProb::default(), LogProb::zero());
    }

    #[test]
    fn test_from_real_round_trip() {
        for &x in &[1e-300, 0.001, 0.5, 1.0, 3.25, 1e10, 1e300] {
            let y = LogProb::from_real(x).to_real();
            assert!((y - x).abs() <= x * 1e-12, "{} -> {}", x, y);
        }
        assert!(LogProb::from_real(0.0).is_zero());
    }

    #[test]
    fn test_add() {
        let a = LogProb::from_real(2.0);
        let b = LogProb::from_real(3.0);
        let c = LogProb::from_real(7.5);

        assert_close(a + b, LogProb::from_real(5.0));
        assert_close(a + b, b + a);
        assert_close((a + b) + c, a + (b + c));
        assert_eq!(a + LogProb::zero(), a);
        assert_eq!(LogProb::zero() + a, a);
        assert!((LogProb::zero() + LogProb::zero()).is_zero());
    }

    #[test]
    fn test_add_disparate_magnitudes() {
        let big = LogProb::from_log(10_000.0);
        let small = LogProb::from_log(-10_000.0);
        assert_eq!(big + small, big);
        assert_eq!(small + big, big);

        // Far beyond f64 range, but still exact in log space.
        let x = LogProb::from_log(5000.0);
        assert_close(x + x, LogProb::from_log(5000.0 + 2f64.ln()));
    }

    #[test]
    fn test_mul_and_powi() {
        let a = LogProb::from_real(2.0);
        let b = LogProb::from_real(3.0);
        assert_close(a * b, LogProb::from_real(6.0));
        assert!((a * LogProb::zero()).is_zero());
        assert_close(a.powi(10), LogProb::from_real(1024.0));
        assert_eq!(a.powi(0), LogProb::one());
        assert_eq!(LogProb::zero().powi(0), LogProb::one());
        assert!(LogProb::zero().powi(3).is_zero());
    }

    #[test]
    fn test_sum_and_product() {
        let xs = [1.0, 2.0, 3.0, 4.0].map(LogProb::from_real);
        assert_close(xs.iter().copied().sum(), LogProb::from_real(10.0));
        assert_close(xs.iter().copied().product(), LogProb::from_real(24.0));
        assert!(std::iter::empty::<LogProb>().sum::<LogProb>().is_zero());
    }

    #[test]
    fn test_ordering() {
        let zero = LogProb::zero();
        let one = LogProb::one();
        let two = LogProb::from_real(2.0);
        assert!(zero < one);
        assert!(one < two);
        assert!(zero <= zero);
        assert_eq!(zero.cmp(&zero), Ordering::Equal);
        assert_eq!(one, LogProb::from_log(-0.0));
        let mut v = vec![two, zero, one];
        v.sort();
        assert_eq!(v, vec![zero, one, two]);
    }

    #[test]
    fn test_binomial() {
        for n in 0..40 {
            assert_eq!(LogProb::binomial(n, 0), LogProb::one());
            assert_close(LogProb::binomial(n, n), LogProb::one());
        }
        assert_close(LogProb::binomial(5, 2), LogProb::from_real(10.0));
        assert_close(LogProb::binomial(10, 3), LogProb::from_real(120.0));
        assert_close(LogProb::binomial(52, 5), LogProb::from_real(2_598_960.0));
    }

    #[test]
    fn test_binomial_beyond_table() {
        let n = LOG_FACTORIAL_TABLE_SIZE + 10;
        let c = LogProb::binomial(n, 1);
        assert!((c.ln() - (n as f64).ln()).abs() < 1e-6);
        let c = LogProb::binomial(n, n);
        assert!(c.ln().abs() < 1e-6);
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let bound = LogProb::from_real(3.0);
        let mut total = 0.0;
        let trials = 20_000;
        for _ in 0..trials {
            let u = LogProb::uniform(&mut rng);
            assert!(u <= LogProb::one());
            assert!(!u.is_zero());
            let v = LogProb::uniform_below(bound, &mut rng);
            assert!(v <= bound);
            total += u.to_real();
        }
        let mean = total / trials as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean = {}", mean);
    }
}
