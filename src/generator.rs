//! Digit generators behind the Number factories
//!

use std::marker::PhantomData;

use num_bigint::BigInt;

use crate::arithmetic::{groups_from_rational, RootDigits, RootManager};
use crate::memoize::DigitProducer;

/// Lazily generates the digits of a Number.
///
/// `generate` returns the mantissa digit stream and the exponent for a
/// Number of the form mantissa * 10^exp, where the mantissa lies
/// between 0.1 inclusive and 1.0 exclusive. The first digit yielded
/// must therefore not be 0. The end of the stream means there are no
/// more mantissa digits, and so does any yielded value above 9.
///
/// Each call to `generate` must produce a fresh stream starting at the
/// first mantissa digit.
pub trait Generator {
    fn generate(&self) -> (DigitProducer, i64);
}

/// Generator for the nth root of num / denom, with the degree encoded
/// by the manager type.
pub(crate) struct RootGenerator<M> {
    num: BigInt,
    denom: BigInt,
    manager: PhantomData<fn() -> M>,
}

impl<M> RootGenerator<M> {
    /// The radicand is captured by value, so later changes to the
    /// caller's integers cannot perturb the digit stream.
    pub(crate) fn new(num: BigInt, denom: BigInt) -> RootGenerator<M> {
        RootGenerator { num, denom, manager: PhantomData }
    }
}

impl<M: RootManager + Default + Send + 'static> Generator for RootGenerator<M> {
    fn generate(&self) -> (DigitProducer, i64) {
        let manager = M::default();
        let (groups, exp) = groups_from_rational(&self.num, &self.denom, &manager.base());
        (Box::new(RootDigits::new(groups, manager)), exp)
    }
}

/// Generator yielding a run of fixed digits followed by a repeating
/// block, cycled forever. An empty repeating block makes the mantissa
/// finite.
pub(crate) struct RepeatingGenerator {
    fixed: Vec<u8>,
    repeating: Vec<u8>,
    exp: i64,
}

impl RepeatingGenerator {
    pub(crate) fn new(fixed: &[u8], repeating: &[u8], exp: i64) -> RepeatingGenerator {
        RepeatingGenerator {
            fixed: fixed.to_vec(),
            repeating: repeating.to_vec(),
            exp,
        }
    }
}

impl Generator for RepeatingGenerator {
    fn generate(&self) -> (DigitProducer, i64) {
        let digits = self
            .fixed
            .clone()
            .into_iter()
            .chain(self.repeating.clone().into_iter().cycle());
        (Box::new(digits), self.exp)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arithmetic::sqrt::SqrtManager;

    #[test]
    fn repeating_generator_cycles() {
        let gen = RepeatingGenerator::new(&[1, 0, 2], &[0, 0, 3, 4], 2);
        let (digits, exp) = gen.generate();
        assert_eq!(exp, 2);
        let prefix: Vec<u8> = digits.take(11).collect();
        assert_eq!(prefix, vec![1, 0, 2, 0, 0, 3, 4, 0, 0, 3, 4]);
    }

    #[test]
    fn repeating_generator_without_repeat_ends() {
        let gen = RepeatingGenerator::new(&[1, 0, 2], &[], -1);
        let (digits, exp) = gen.generate();
        assert_eq!(exp, -1);
        assert_eq!(digits.collect::<Vec<u8>>(), vec![1, 0, 2]);
    }

    #[test]
    fn root_generator_restarts() {
        let gen = RootGenerator::<SqrtManager>::new(BigInt::from(2), BigInt::from(1));
        let (digits, exp) = gen.generate();
        assert_eq!(exp, 1);
        assert_eq!(digits.take(4).collect::<Vec<u8>>(), vec![1, 4, 1, 4]);
        // A second stream starts over at the first digit.
        let (digits, _) = gen.generate();
        assert_eq!(digits.take(4).collect::<Vec<u8>>(), vec![1, 4, 1, 4]);
    }
}
