// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Square roots and cube roots to arbitrary precision
//!
//! [`Number`] is the main type of this crate. It represents a lazily
//! evaluated non negative real number that generally has an infinite
//! number of digits, computed on demand by a background worker and
//! cached, so a digit is only ever computed once no matter how many
//! readers ask for it. Number instances are cheap to clone and safe to
//! share across threads.
//!
//! [`FiniteNumber`] works like Number except that it always has a
//! finite number of digits, which additionally allows reverse
//! traversal and exact rendering. A FiniteNumber is obtained from a
//! Number with [`Number::with_significant`] or [`Number::with_end`],
//! or built directly with [`new_finite_number`].
//!
//! A [`Sequence`] is a cheap view of a contiguous subset of the digits
//! of a Number. [`FiniteSequence`] is the finite-length refinement.
//!
//! Because the workers behind the free factory functions live until
//! process end, prefer creating Numbers through a [`Context`], which
//! can free them in bulk.
//!
//! # Example
//!
//! ```
//! use sqroot::Context;
//!
//! let ctx = Context::new();
//!
//! // 100 significant digits of the square root of 13.
//! let n = ctx.sqrt(13);
//! assert_eq!(
//!     format!("{:.100}", n),
//!     "3.605551275463989293119221267470495946251296573845246212710453056227166948293010445204619082018490717",
//! );
//!
//! // Digits are positions in the mantissa: sqrt(13) = 0.3605... * 10^1
//! assert_eq!(n.exponent(), 1);
//! assert_eq!(n.at(0), Some(3));
//! ctx.close();
//! ```
#![allow(clippy::style)]

pub extern crate num_bigint;
pub extern crate num_rational;
pub extern crate num_traits;
extern crate num_integer;

#[cfg(test)]
extern crate paste;

use std::error::Error;
use std::fmt;
use std::iter;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

// "low level" digit extraction
mod arithmetic;

// digit generators feeding the memoizers
mod generator;

// the lazy digit cache and its worker
mod memoize;

// worker lifecycle management
mod context;

// digit sequence views and iterators
mod sequence;

// implementations of std::fmt traits and stringification routines
mod impl_fmt;

pub use context::{num_workers, Context};
pub use generator::Generator;
pub use impl_fmt::{Formatted, Verb};
pub use sequence::{
    as_string, BackwardDigits, Digits, DigitValues, FiniteSequence, FiniteSequenceView, Sequence,
    SequenceView,
};

use arithmetic::cbrt::CbrtManager;
use arithmetic::sqrt::SqrtManager;
use arithmetic::RootManager;
use context::global_memo_spec;
use generator::{RepeatingGenerator, RootGenerator};
use impl_fmt::FormatSpec;
use memoize::{DigitProducer, MemoSpec};

/// Error returned when explicitly provided mantissa digits cannot form
/// a Number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidDigitError {
    /// A digit was outside the range 0 to 9.
    DigitOutOfRange,
    /// The first mantissa digit was zero; mantissas lie between 0.1
    /// inclusive and 1.0 exclusive.
    LeadingZero,
}

impl fmt::Display for InvalidDigitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidDigitError::DigitOutOfRange => write!(f, "digits must be between 0 and 9"),
            InvalidDigitError::LeadingZero => write!(f, "leading zeros not allowed in digits"),
        }
    }
}

impl Error for InvalidDigitError {}

/// Reference to a non-negative real number of the form
/// mantissa * 10^exponent, with the mantissa between 0.1 inclusive and
/// 1.0 exclusive. The mantissa digits are computed lazily, cached, and
/// shared by every clone of the same Number.
///
/// A Number may have infinitely many digits; nothing about it reveals
/// whether it happens to be finite. Truncating with
/// [`with_significant`](Number::with_significant) or
/// [`with_end`](Number::with_end) is the only way to obtain a value of
/// the finite-only type [`FiniteNumber`].
///
/// A Number can be 0, in which case [`is_zero`](Number::is_zero)
/// returns true, the exponent is 0, `at` always returns None and the
/// digit iterators are empty, but it still prints as `0`.
#[derive(Clone, PartialEq)]
pub struct Number(FiniteNumber);

impl Number {
    /// The significant digit at the given 0 based position of the
    /// mantissa, or None when the mantissa has `posit` or fewer digits.
    ///
    /// Blocks until the digit is computed or the mantissa is found to
    /// end before it.
    pub fn at(&self, posit: usize) -> Option<u8> {
        self.0.at(posit)
    }

    /// A view of this Number truncated toward zero to at most `limit`
    /// significant digits.
    pub fn with_significant(&self, limit: usize) -> FiniteNumber {
        self.0.with_significant(limit)
    }

    /// The exponent of this Number.
    pub fn exponent(&self) -> i64 {
        self.0.exponent()
    }

    /// True if this Number is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// A view of the mantissa digits at and past position `start`.
    pub fn with_start(&self, start: usize) -> SequenceView {
        SequenceView::new(self.0.mantissa.clone(), start)
    }

    /// This Number truncated to the mantissa digits before position
    /// `end`.
    pub fn with_end(&self, end: usize) -> FiniteNumber {
        self.0.with_end(end)
    }

    /// Binds this Number to a print [`Verb`].
    pub fn fmt_as(&self, verb: Verb) -> Formatted<'_> {
        self.0.fmt_as(verb)
    }
}

impl sequence::Sealed for Number {}

impl Sequence for Number {
    fn all(&self) -> Digits {
        self.0.all()
    }

    fn all_in_range(&self, start: usize, end: usize) -> Digits {
        self.0.all_in_range(start, end)
    }

    fn values(&self) -> DigitValues {
        self.0.values()
    }
}

/// A [`Number`] with a finite number of digits, making reverse
/// traversal and exact rendering available. The default value is 0.
#[derive(Clone, Default, PartialEq)]
pub struct FiniteNumber {
    mantissa: Mantissa,
    exponent: i64,
}

impl FiniteNumber {
    /// The significant digit at the given 0 based position of the
    /// mantissa, or None when the mantissa has `posit` or fewer digits.
    pub fn at(&self, posit: usize) -> Option<u8> {
        self.mantissa.at(posit)
    }

    /// A view of this number truncated toward zero to at most `limit`
    /// significant digits. Truncating to anything at or above the
    /// current significance returns a structurally identical number.
    pub fn with_significant(&self, limit: usize) -> FiniteNumber {
        self.with_mantissa(self.mantissa.with_limit(limit))
    }

    /// The exponent of this number.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// True if this number is zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// A view of the mantissa digits at and past position `start`.
    pub fn with_start(&self, start: usize) -> FiniteSequenceView {
        FiniteSequenceView::new(self.mantissa.clone(), start)
    }

    /// Works like `with_start`.
    pub fn finite_with_start(&self, start: usize) -> FiniteSequenceView {
        self.with_start(start)
    }

    /// This number truncated to the mantissa digits before position
    /// `end`.
    pub fn with_end(&self, end: usize) -> FiniteNumber {
        self.with_mantissa(self.mantissa.with_limit(end))
    }

    /// Renders this number with as many significant digits as it takes
    /// to be exact, where `to_string` caps them at the default
    /// precision.
    ///
    /// ```
    /// use sqroot::sqrt;
    ///
    /// let n = sqrt(2).with_significant(60);
    /// assert_eq!(
    ///     n.exact(),
    ///     "1.41421356237309504880168872420969807856967187537694807317667",
    /// );
    /// ```
    pub fn exact(&self) -> String {
        let mut result = String::new();
        // Writing to a String cannot fail.
        let _ = FormatSpec::for_g(usize::MAX, self.exponent, false).print_number(&mut result, self);
        result
    }

    /// Binds this number to a print [`Verb`].
    pub fn fmt_as(&self, verb: Verb) -> Formatted<'_> {
        Formatted::new(self, verb)
    }

    fn with_mantissa(&self, mantissa: Mantissa) -> FiniteNumber {
        if mantissa.same(&self.mantissa) {
            return self.clone();
        }
        if mantissa.is_zero() {
            return FiniteNumber::default();
        }
        FiniteNumber { mantissa, exponent: self.exponent }
    }
}

impl sequence::Sealed for FiniteNumber {}

impl Sequence for FiniteNumber {
    fn all(&self) -> Digits {
        self.mantissa.digits(0, usize::MAX)
    }

    fn all_in_range(&self, start: usize, end: usize) -> Digits {
        self.mantissa.digits(start, end)
    }

    fn values(&self) -> DigitValues {
        self.mantissa.values(0)
    }
}

impl FiniteSequence for FiniteNumber {
    fn backward(&self) -> BackwardDigits {
        self.mantissa.backward(0)
    }
}

#[cfg(test)]
impl FiniteNumber {
    pub(crate) fn with_exponent(&self, exponent: i64) -> FiniteNumber {
        if exponent == self.exponent || self.is_zero() {
            return self.clone();
        }
        FiniteNumber { mantissa: self.mantissa.clone(), exponent }
    }
}

#[cfg(test)]
impl Number {
    pub(crate) fn with_exponent(&self, exponent: i64) -> Number {
        Number(self.0.with_exponent(exponent))
    }
}

/// The digit store of a number: nothing for zero, otherwise a memoizer
/// handle with an optional significance cap.
#[derive(Clone, Default, PartialEq)]
pub(crate) struct Mantissa {
    spec: Option<MemoSpec>,
}

impl Mantissa {
    fn from_spec(spec: MemoSpec) -> Mantissa {
        Mantissa { spec: Some(spec) }
    }

    fn at(&self, posit: usize) -> Option<u8> {
        self.spec.as_ref().and_then(|spec| spec.at(posit))
    }

    fn is_zero(&self) -> bool {
        self.spec.is_none()
    }

    pub(crate) fn with_limit(&self, limit: usize) -> Mantissa {
        Mantissa { spec: self.spec.as_ref().and_then(|spec| spec.with_limit(limit)) }
    }

    /// True when both mantissas share storage and carry the same cap;
    /// no-op view operations preserve this.
    pub(crate) fn same(&self, other: &Mantissa) -> bool {
        match (&self.spec, &other.spec) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same(b),
            _ => false,
        }
    }

    pub(crate) fn digits(&self, start: usize, end: usize) -> Digits {
        Digits::new(self.spec.clone(), start, end)
    }

    pub(crate) fn values(&self, start: usize) -> DigitValues {
        DigitValues(self.digits(start, usize::MAX))
    }

    pub(crate) fn backward(&self, start: usize) -> BackwardDigits {
        BackwardDigits::new(self.spec.clone(), start)
    }
}

/// The square root of `radicand`.
///
/// Prefer [`Context::sqrt`]: the digit worker behind a Number created
/// here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative.
///
/// ```
/// use sqroot::sqrt;
///
/// assert_eq!(format!("{:.10}", sqrt(2)), "1.414213562");
/// ```
pub fn sqrt(radicand: i64) -> Number {
    n_root::<SqrtManager>(None, BigInt::from(radicand), BigInt::one())
}

/// The square root of `num` / `denom`.
///
/// Prefer [`Context::sqrt_rat`]: the digit worker behind a Number
/// created here is never freed.
///
/// # Panics
///
/// Panics unless `denom` is positive and `num` is non-negative.
pub fn sqrt_rat(num: i64, denom: i64) -> Number {
    n_root::<SqrtManager>(None, BigInt::from(num), BigInt::from(denom))
}

/// The square root of `radicand`.
///
/// Prefer [`Context::sqrt_big_int`]: the digit worker behind a Number
/// created here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative.
pub fn sqrt_big_int(radicand: &BigInt) -> Number {
    n_root::<SqrtManager>(None, radicand.clone(), BigInt::one())
}

/// The square root of `radicand`.
///
/// Prefer [`Context::sqrt_big_rat`]: the digit worker behind a Number
/// created here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative.
pub fn sqrt_big_rat(radicand: &BigRational) -> Number {
    n_root::<SqrtManager>(None, radicand.numer().clone(), radicand.denom().clone())
}

/// The cube root of `radicand`.
///
/// Prefer [`Context::cube_root`]: the digit worker behind a Number
/// created here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative, as Number only holds non-negative
/// results.
pub fn cube_root(radicand: i64) -> Number {
    n_root::<CbrtManager>(None, BigInt::from(radicand), BigInt::one())
}

/// The cube root of `num` / `denom`.
///
/// Prefer [`Context::cube_root_rat`]: the digit worker behind a Number
/// created here is never freed.
///
/// # Panics
///
/// Panics unless `denom` is positive and `num` is non-negative.
pub fn cube_root_rat(num: i64, denom: i64) -> Number {
    n_root::<CbrtManager>(None, BigInt::from(num), BigInt::from(denom))
}

/// The cube root of `radicand`.
///
/// Prefer [`Context::cube_root_big_int`]: the digit worker behind a
/// Number created here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative.
pub fn cube_root_big_int(radicand: &BigInt) -> Number {
    n_root::<CbrtManager>(None, radicand.clone(), BigInt::one())
}

/// The cube root of `radicand`.
///
/// Prefer [`Context::cube_root_big_rat`]: the digit worker behind a
/// Number created here is never freed.
///
/// # Panics
///
/// Panics if `radicand` is negative.
pub fn cube_root_big_rat(radicand: &BigRational) -> Number {
    n_root::<CbrtManager>(None, radicand.numer().clone(), radicand.denom().clone())
}

/// Creates an arbitrary Number for tests. `fixed` holds the
/// non-repeating digits right after the decimal point of the mantissa,
/// `repeating` the digits cycled forever after them, and `exponent`
/// scales the result. Both lists empty yields zero, whatever the
/// exponent.
///
/// Prefer [`Context::new_number_for_testing`]: the digit worker behind
/// a Number created here is never freed.
///
/// ```
/// use sqroot::new_number_for_testing;
///
/// let n = new_number_for_testing(&[1, 0, 2], &[0, 0, 3, 4], 2).unwrap();
/// assert_eq!(n.to_string(), "10.20034003400340");
/// ```
pub fn new_number_for_testing(
    fixed: &[u8],
    repeating: &[u8],
    exponent: i64,
) -> Result<Number, InvalidDigitError> {
    number_for_testing(None, fixed, repeating, exponent)
}

/// Works like [`new_number_for_testing`] but returns a
/// [`FiniteNumber`]. There is no repeating part because FiniteNumbers
/// have finitely many digits.
///
/// Prefer [`Context::new_finite_number`]: the digit worker behind a
/// number created here is never freed.
pub fn new_finite_number(fixed: &[u8], exponent: i64) -> Result<FiniteNumber, InvalidDigitError> {
    number_for_testing(None, fixed, &[], exponent).map(|number| number.0)
}

/// A Number drawing its digits from `gen`. If the first digit yielded
/// is 0 or out of range the result is zero; a later out-of-range digit
/// just ends the mantissa. `gen` is consulted exactly once.
///
/// Prefer [`Context::new_number`]: the digit worker behind a Number
/// created here is never freed.
pub fn new_number<G: Generator>(gen: &G) -> Number {
    number_from_generator(None, gen)
}

impl Context {
    /// The square root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn sqrt(&self, radicand: i64) -> Number {
        n_root::<SqrtManager>(Some(self), BigInt::from(radicand), BigInt::one())
    }

    /// The square root of `num` / `denom`.
    ///
    /// # Panics
    ///
    /// Panics unless `denom` is positive and `num` is non-negative,
    /// and panics if this Context is closed.
    pub fn sqrt_rat(&self, num: i64, denom: i64) -> Number {
        n_root::<SqrtManager>(Some(self), BigInt::from(num), BigInt::from(denom))
    }

    /// The square root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn sqrt_big_int(&self, radicand: &BigInt) -> Number {
        n_root::<SqrtManager>(Some(self), radicand.clone(), BigInt::one())
    }

    /// The square root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn sqrt_big_rat(&self, radicand: &BigRational) -> Number {
        n_root::<SqrtManager>(Some(self), radicand.numer().clone(), radicand.denom().clone())
    }

    /// The cube root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn cube_root(&self, radicand: i64) -> Number {
        n_root::<CbrtManager>(Some(self), BigInt::from(radicand), BigInt::one())
    }

    /// The cube root of `num` / `denom`.
    ///
    /// # Panics
    ///
    /// Panics unless `denom` is positive and `num` is non-negative,
    /// and panics if this Context is closed.
    pub fn cube_root_rat(&self, num: i64, denom: i64) -> Number {
        n_root::<CbrtManager>(Some(self), BigInt::from(num), BigInt::from(denom))
    }

    /// The cube root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn cube_root_big_int(&self, radicand: &BigInt) -> Number {
        n_root::<CbrtManager>(Some(self), radicand.clone(), BigInt::one())
    }

    /// The cube root of `radicand`.
    ///
    /// # Panics
    ///
    /// Panics if `radicand` is negative or this Context is closed.
    pub fn cube_root_big_rat(&self, radicand: &BigRational) -> Number {
        n_root::<CbrtManager>(Some(self), radicand.numer().clone(), radicand.denom().clone())
    }

    /// Works like [`new_number_for_testing`] with workers owned by this
    /// Context.
    ///
    /// # Panics
    ///
    /// Panics if this Context is closed.
    pub fn new_number_for_testing(
        &self,
        fixed: &[u8],
        repeating: &[u8],
        exponent: i64,
    ) -> Result<Number, InvalidDigitError> {
        number_for_testing(Some(self), fixed, repeating, exponent)
    }

    /// Works like [`new_finite_number`] with workers owned by this
    /// Context.
    ///
    /// # Panics
    ///
    /// Panics if this Context is closed.
    pub fn new_finite_number(
        &self,
        fixed: &[u8],
        exponent: i64,
    ) -> Result<FiniteNumber, InvalidDigitError> {
        number_for_testing(Some(self), fixed, &[], exponent).map(|number| number.0)
    }

    /// Works like [`new_number`] with workers owned by this Context.
    ///
    /// # Panics
    ///
    /// Panics if this Context is closed.
    pub fn new_number<G: Generator>(&self, gen: &G) -> Number {
        number_from_generator(Some(self), gen)
    }
}

fn check_num_denom(num: &BigInt, denom: &BigInt) {
    if !denom.is_positive() {
        panic!("Denominator must be positive");
    }
    if num.is_negative() {
        panic!("Numerator must be non-negative");
    }
}

fn n_root<M>(owner: Option<&Context>, num: BigInt, denom: BigInt) -> Number
where
    M: RootManager + Default + Send + 'static,
{
    check_num_denom(&num, &denom);
    if num.is_zero() {
        return Number(FiniteNumber::default());
    }
    let gen = RootGenerator::<M>::new(num, denom);
    let (digits, exponent) = gen.generate();
    Number(finite_from_producer(owner, digits, exponent))
}

fn number_from_generator<G: Generator>(owner: Option<&Context>, gen: &G) -> Number {
    let (mut digits, exponent) = gen.generate();
    match digits.next() {
        Some(first) if (1..=9).contains(&first) => {
            let producer: DigitProducer = Box::new(iter::once(first).chain(digits));
            Number(finite_from_producer(owner, producer, exponent))
        }
        _ => Number(FiniteNumber::default()),
    }
}

fn number_for_testing(
    owner: Option<&Context>,
    fixed: &[u8],
    repeating: &[u8],
    exponent: i64,
) -> Result<Number, InvalidDigitError> {
    if fixed.is_empty() && repeating.is_empty() {
        return Ok(Number(FiniteNumber::default()));
    }
    if !valid_digits(fixed) || !valid_digits(repeating) {
        return Err(InvalidDigitError::DigitOutOfRange);
    }
    let gen = RepeatingGenerator::new(fixed, repeating, exponent);
    let (mut digits, _) = gen.generate();
    if digits.next() == Some(0) {
        return Err(InvalidDigitError::LeadingZero);
    }
    let (digits, exponent) = gen.generate();
    Ok(Number(finite_from_producer(owner, digits, exponent)))
}

fn finite_from_producer(
    owner: Option<&Context>,
    producer: DigitProducer,
    exponent: i64,
) -> FiniteNumber {
    let spec = match owner {
        Some(ctx) => ctx.new_memo_spec(producer),
        None => global_memo_spec(producer),
    };
    FiniteNumber { mantissa: Mantissa::from_spec(spec), exponent }
}

fn valid_digits(digits: &[u8]) -> bool {
    digits.iter().all(|&digit| digit <= 9)
}
