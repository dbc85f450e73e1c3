//! Implementation of std::fmt traits & other stringification routines
//!
//! All notations round by truncation toward zero, never half-even,
//! because pulling one digit more than requested is the only rounding a
//! lazily computed mantissa can afford.

use std::cmp;
use std::fmt;

use crate::{FiniteNumber, Mantissa, Number};

// const DEFAULT_PRECISION: usize = ${RUST_SQROOT_DEFAULT_PRECISION} or 16;
include!(concat!(env!("OUT_DIR"), "/default_precision.rs"));

/// Default significant digit count of the fixed and exponent notations.
const F_PRECISION: usize = 6;

/// Print notation for [`Formatted`], covering the classic printf float
/// verbs. `F` is fixed notation, `E` is exponent notation, and `G`
/// switches to exponent notation when the decimal point would stray too
/// far from the digits; `V` is an alias for `G` and is what `Display`
/// uses. The `Upper` variants emit an `E` separator instead of `e`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    F,
    UpperF,
    G,
    UpperG,
    E,
    UpperE,
    V,
}

/// Pairs a number with a [`Verb`] so the standard format machinery can
/// render it; precision, width and `<` alignment of the format spec all
/// apply.
///
/// ```
/// use sqroot::{sqrt, Verb};
///
/// let n = sqrt(10);
/// assert_eq!(format!("{}", n.fmt_as(Verb::F)), "3.162277");
/// assert_eq!(format!("{:.2}", n.fmt_as(Verb::E)), "0.31e+01");
/// ```
pub struct Formatted<'a> {
    number: &'a FiniteNumber,
    verb: Verb,
}

impl<'a> Formatted<'a> {
    pub(crate) fn new(number: &'a FiniteNumber, verb: Verb) -> Formatted<'a> {
        Formatted { number, verb }
    }
}

impl fmt::Display for Formatted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        FormatSpec::new(self.verb, f.precision(), self.number.exponent).print_field(f, self.number)
    }
}

impl fmt::Display for FiniteNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        FormatSpec::new(Verb::V, f.precision(), self.exponent).print_field(f, self)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerExp for FiniteNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        FormatSpec::new(Verb::E, f.precision(), self.exponent).print_field(f, self)
    }
}

impl fmt::LowerExp for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerExp::fmt(&self.0, f)
    }
}

impl fmt::UpperExp for FiniteNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        FormatSpec::new(Verb::UpperE, f.precision(), self.exponent).print_field(f, self)
    }
}

impl fmt::UpperExp for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::UpperExp::fmt(&self.0, f)
    }
}

impl fmt::Debug for FiniteNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FiniteNumber({})", self)
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Number({})", self.0)
    }
}

/// Resolved rendering parameters of one print request.
#[derive(Clone, Copy)]
pub(crate) struct FormatSpec {
    sig_digits: i64,
    exact_digit_count: bool,
    sci: bool,
    capital: bool,
}

impl FormatSpec {
    fn new(verb: Verb, precision: Option<usize>, exponent: i64) -> FormatSpec {
        match verb {
            Verb::F | Verb::UpperF => Self::for_f(precision.unwrap_or(F_PRECISION), exponent),
            Verb::G | Verb::V => Self::for_g(precision.unwrap_or(DEFAULT_PRECISION), exponent, false),
            Verb::UpperG => Self::for_g(precision.unwrap_or(DEFAULT_PRECISION), exponent, true),
            Verb::E => Self::for_e(precision.unwrap_or(F_PRECISION), false),
            Verb::UpperE => Self::for_e(precision.unwrap_or(F_PRECISION), true),
        }
    }

    fn for_f(precision: usize, exponent: i64) -> FormatSpec {
        FormatSpec {
            sig_digits: clamp_precision(precision).saturating_add(exponent),
            exact_digit_count: true,
            sci: false,
            capital: false,
        }
    }

    pub(crate) fn for_g(precision: usize, exponent: i64, capital: bool) -> FormatSpec {
        let sig_digits = cmp::max(clamp_precision(precision), 1);
        let sci = sig_digits < exponent || big_exponent(exponent);
        FormatSpec { sig_digits, exact_digit_count: false, sci, capital }
    }

    fn for_e(precision: usize, capital: bool) -> FormatSpec {
        FormatSpec {
            sig_digits: clamp_precision(precision),
            exact_digit_count: true,
            sci: true,
            capital,
        }
    }

    /// Renders the number, honoring any width and alignment of `f`.
    /// Left alignment pads on the right; everything else pads on the
    /// left, which is also the default.
    pub(crate) fn print_field(&self, f: &mut fmt::Formatter, n: &FiniteNumber) -> fmt::Result {
        let width = match f.width() {
            Some(width) => width,
            None => return self.print_number(f, n),
        };
        let mut field = String::new();
        self.print_number(&mut field, n)?;
        let padding = width.saturating_sub(field.len());
        if f.align() == Some(fmt::Alignment::Left) {
            f.write_str(&field)?;
            write_spaces(f, padding)
        } else {
            write_spaces(f, padding)?;
            f.write_str(&field)
        }
    }

    pub(crate) fn print_number<W: fmt::Write>(&self, w: &mut W, n: &FiniteNumber) -> fmt::Result {
        if self.sci {
            self.print_fixed(w, &n.mantissa, 0)?;
            w.write_str(if self.capital { "E" } else { "e" })?;
            write!(w, "{:+03}", n.exponent)
        } else {
            self.print_fixed(w, &n.mantissa, n.exponent)
        }
    }

    fn print_fixed<W: fmt::Write>(&self, w: &mut W, mantissa: &Mantissa, exponent: i64) -> fmt::Result {
        let mut formatter = FixedFormatter::new(w, self.sig_digits, exponent, self.exact_digit_count);
        if formatter.can_consume() {
            for digit in mantissa.values(0) {
                formatter.consume(digit)?;
                if !formatter.can_consume() {
                    break;
                }
            }
        }
        formatter.finish()
    }
}

fn big_exponent(exponent: i64) -> bool {
    exponent < -3 || exponent > 6
}

fn clamp_precision(precision: usize) -> i64 {
    i64::try_from(precision).unwrap_or(i64::MAX)
}

fn write_spaces(f: &mut fmt::Formatter, count: usize) -> fmt::Result {
    for _ in 0..count {
        f.write_str(" ")?;
    }
    Ok(())
}

/// Consumes mantissa digits one at a time and lays down the fixed-form
/// rendering: leading zeros for a non-positive exponent, the decimal
/// point once `exponent` digits have passed, right padding per the
/// digit count rules.
struct FixedFormatter<'a, W: fmt::Write> {
    writer: &'a mut W,
    sig_digits: i64,
    exponent: i64,
    exact_digit_count: bool,
    index: i64,
}

impl<'a, W: fmt::Write> FixedFormatter<'a, W> {
    fn new(writer: &'a mut W, sig_digits: i64, exponent: i64, exact_digit_count: bool) -> FixedFormatter<'a, W> {
        // The integer part must fit within the significant digits.
        assert!(
            sig_digits >= exponent,
            "sig_digits must be at least the exponent"
        );
        FixedFormatter { writer, sig_digits, exponent, exact_digit_count, index: 0 }
    }

    fn can_consume(&self) -> bool {
        self.index < self.sig_digits
    }

    fn consume(&mut self, digit: u8) -> fmt::Result {
        if !self.can_consume() {
            return Ok(());
        }
        self.add(digit)
    }

    fn finish(&mut self) -> fmt::Result {
        let max_digits = if self.exact_digit_count { self.sig_digits } else { self.exponent };
        while self.index < max_digits {
            self.add(0)?;
        }
        // Nothing written at all: the number is zero.
        if self.index == 0 {
            let count = if self.exact_digit_count {
                self.sig_digits - self.exponent
            } else {
                -self.exponent
            };
            self.add_leading_zeros(count)?;
        }
        Ok(())
    }

    fn add(&mut self, digit: u8) -> fmt::Result {
        if self.index == 0 && self.exponent <= 0 {
            self.add_leading_zeros(-self.exponent)?;
        }
        if self.index == self.exponent {
            self.writer.write_char('.')?;
        }
        self.writer.write_char(char::from(b'0' + digit))?;
        self.index += 1;
        Ok(())
    }

    fn add_leading_zeros(&mut self, count: i64) -> fmt::Result {
        self.writer.write_char('0')?;
        if count <= 0 {
            return Ok(());
        }
        self.writer.write_char('.')?;
        for _ in 0..count {
            self.writer.write_char('0')?;
        }
        Ok(())
    }
}
