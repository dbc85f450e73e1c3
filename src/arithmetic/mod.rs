//! "low level" digit extraction routines
//!
//! The pencil-and-paper long division generalized to nth roots: the
//! radicand is consumed in groups of base = 10^n, and each group yields
//! exactly one decimal digit of the root.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

pub(crate) mod cbrt;
pub(crate) mod sqrt;

/// Per-degree state of the digit extraction.
///
/// `incr` is the trial increment deciding whether one more unit of the
/// current digit fits under the remainder. The two hooks advance it
/// within a digit and across digit boundaries; they are the only place
/// where the degree of the root enters the arithmetic.
pub(crate) trait RootManager {
    /// The grouping base, 10^n for the nth root.
    fn base(&self) -> BigInt;

    /// Advances `incr` to the increment for the next unit of the
    /// current digit.
    fn next(&mut self, incr: &mut BigInt);

    /// Rescales `incr` to the start-of-next-digit form.
    fn next_digit(&mut self, incr: &mut BigInt);
}

/// Streams the base^k groups of num / denom, most significant first.
///
/// The stream ends once the running numerator reaches zero; a rational
/// whose expansion in the base does not terminate streams forever.
pub(crate) struct Groups {
    num: BigInt,
    denom: BigInt,
    base: BigInt,
}

impl Iterator for Groups {
    type Item = BigInt;

    fn next(&mut self) -> Option<BigInt> {
        if self.num.is_zero() {
            return None;
        }
        self.num *= &self.base;
        let (group, rest) = self.num.div_rem(&self.denom);
        self.num = rest;
        Some(group)
    }
}

/// Normalizes num / denom against `base` and returns the group stream
/// along with the decimal exponent of the result.
///
/// After normalization denom exceeds num, so every group is less than
/// base and the very first group is non-zero.
pub(crate) fn groups_from_rational(num: &BigInt, denom: &BigInt, base: &BigInt) -> (Groups, i64) {
    let mut num = num.clone();
    let mut denom = denom.clone();
    let mut exp: i64 = 0;
    while num < denom {
        exp -= 1;
        num *= base;
    }
    if exp < 0 {
        exp += 1;
        num /= base;
    }
    while num >= denom {
        exp += 1;
        denom *= base;
    }
    let groups = Groups { num, denom, base: base.clone() };
    (groups, exp)
}

/// Iterator over the decimal digits of the root, one group consumed per
/// digit. Ends when the group stream is exhausted and the remainder has
/// reached zero, which happens exactly when the root is a terminating
/// decimal.
pub(crate) struct RootDigits<M> {
    groups: Groups,
    manager: M,
    base: BigInt,
    incr: BigInt,
    remainder: BigInt,
}

impl<M: RootManager> RootDigits<M> {
    pub(crate) fn new(groups: Groups, manager: M) -> RootDigits<M> {
        let base = manager.base();
        RootDigits {
            groups,
            manager,
            base,
            incr: BigInt::one(),
            remainder: BigInt::zero(),
        }
    }
}

impl<M: RootManager> Iterator for RootDigits<M> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let group = self.groups.next();
        if group.is_none() && self.remainder.is_zero() {
            return None;
        }
        self.remainder *= &self.base;
        if let Some(group) = group {
            self.remainder += group;
        }
        let mut digit = 0u8;
        while self.remainder >= self.incr {
            self.remainder -= &self.incr;
            digit += 1;
            self.manager.next(&mut self.incr);
        }
        self.manager.next_digit(&mut self.incr);
        Some(digit)
    }
}

#[cfg(test)]
pub(crate) fn ten_to_the(power: usize) -> BigInt {
    num_traits::pow::pow(BigInt::from(10), power)
}

#[cfg(test)]
mod test {
    use super::cbrt::CbrtManager;
    use super::sqrt::SqrtManager;
    use super::*;

    fn root_digits<M: RootManager + Default>(num: i64, denom: i64, count: usize) -> (Vec<u8>, i64) {
        let manager = M::default();
        let (groups, exp) = groups_from_rational(&BigInt::from(num), &BigInt::from(denom), &manager.base());
        (RootDigits::new(groups, manager).take(count).collect(), exp)
    }

    #[test]
    fn sqrt_of_two() {
        let (digits, exp) = root_digits::<SqrtManager>(2, 1, 10);
        assert_eq!(exp, 1);
        assert_eq!(digits, vec![1, 4, 1, 4, 2, 1, 3, 5, 6, 2]);
    }

    #[test]
    fn sqrt_of_perfect_square_terminates() {
        let (digits, exp) = root_digits::<SqrtManager>(100489, 1, 10);
        assert_eq!(exp, 3);
        assert_eq!(digits, vec![3, 1, 7]);
    }

    #[test]
    fn sqrt_exponents() {
        assert_eq!(root_digits::<SqrtManager>(1, 1, 4).1, 1);
        assert_eq!(root_digits::<SqrtManager>(256, 1, 4).1, 2);
        assert_eq!(root_digits::<SqrtManager>(2600, 1000000, 4).1, -1);
        assert_eq!(root_digits::<SqrtManager>(26, 1000, 4).1, 0);
        assert_eq!(root_digits::<SqrtManager>(3, 70000, 4).1, -2);
    }

    #[test]
    fn cbrt_of_two() {
        let (digits, exp) = root_digits::<CbrtManager>(2, 1, 15);
        assert_eq!(exp, 1);
        assert_eq!(digits, vec![1, 2, 5, 9, 9, 2, 1, 0, 4, 9, 8, 9, 4, 8, 7]);
    }

    #[test]
    fn cbrt_of_perfect_cube_terminates() {
        let (digits, exp) = root_digits::<CbrtManager>(35223040952, 1, 10);
        assert_eq!(exp, 4);
        assert_eq!(digits, vec![3, 2, 7, 8]);
    }

    // For every emitted prefix d1..dk with exponent e, the underestimate
    // (0.d1..dk * 10^e)^n must not exceed num/denom while bumping the last
    // digit must overshoot it.
    fn assert_truncated_root(n: u32, num: i64, denom: i64, count: usize) {
        let (digits, exp) = match n {
            2 => root_digits::<SqrtManager>(num, denom, count),
            3 => root_digits::<CbrtManager>(num, denom, count),
            _ => unreachable!(),
        };
        let num = BigInt::from(num);
        let denom = BigInt::from(denom);
        let mut prefix = BigInt::zero();
        for (k, digit) in digits.iter().enumerate() {
            let k = k as i64 + 1;
            prefix = &prefix * 10 + BigInt::from(*digit);
            // prefix represents prefix * 10^(exp - k); cross-multiply so
            // both bounds stay integral whichever sign exp - k has.
            let shift = k - exp;
            let (prefix_scale, radicand_scale) = if shift >= 0 {
                (BigInt::one(), ten_to_the(shift as usize * n as usize))
            } else {
                (ten_to_the((-shift) as usize * n as usize), BigInt::one())
            };
            let low = num_traits::pow::pow(prefix.clone(), n as usize) * &prefix_scale * &denom;
            let high = num_traits::pow::pow(&prefix + 1, n as usize) * &prefix_scale * &denom;
            let radicand = &num * &radicand_scale;
            assert!(low <= radicand, "prefix overestimates the root");
            assert!(high > radicand, "prefix is not the tightest underestimate");
        }
    }

    #[test]
    fn truncated_root_invariant() {
        for &(num, denom) in &[(2, 1), (3, 1), (5, 1), (7, 1), (40, 1), (3, 7), (2401, 4), (100489, 1)] {
            assert_truncated_root(2, num, denom, 30);
            assert_truncated_root(3, num, denom, 30);
        }
    }

    #[cfg(property_tests)]
    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sqrt_prefix_is_truncation(num in 1i64..1_000_000, denom in 1i64..10_000) {
                assert_truncated_root(2, num, denom, 12);
            }

            #[test]
            fn cbrt_prefix_is_truncation(num in 1i64..1_000_000, denom in 1i64..10_000) {
                assert_truncated_root(3, num, denom, 12);
            }
        }
    }
}
