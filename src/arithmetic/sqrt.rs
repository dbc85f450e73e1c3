//! square root digit recurrences
//!
//! The classic doubling method: within a digit each extra unit costs two
//! more than the last, and moving to the next digit rescales the odd
//! increment by ten.

use num_bigint::BigInt;

use super::RootManager;

#[derive(Default)]
pub(crate) struct SqrtManager;

impl RootManager for SqrtManager {
    fn base(&self) -> BigInt {
        BigInt::from(100)
    }

    fn next(&mut self, incr: &mut BigInt) {
        *incr += 2;
    }

    fn next_digit(&mut self, incr: &mut BigInt) {
        *incr -= 1;
        *incr *= 10;
        *incr += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn increment_sequence() {
        // Consuming the digit 1 and crossing a digit boundary must walk
        // the odd increments 1, 3 -> 21.
        let mut m = SqrtManager;
        let mut incr = BigInt::from(1);
        m.next(&mut incr);
        assert_eq!(incr, BigInt::from(3));
        m.next_digit(&mut incr);
        assert_eq!(incr, BigInt::from(21));
    }
}
