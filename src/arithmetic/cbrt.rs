//! cube root digit recurrences
//!
//! Third powers grow with a second difference, so the manager carries an
//! auxiliary increment `incr2` alongside the trial increment itself.

use num_bigint::BigInt;

use super::RootManager;

pub(crate) struct CbrtManager {
    incr2: BigInt,
}

impl Default for CbrtManager {
    fn default() -> CbrtManager {
        CbrtManager { incr2: BigInt::from(6) }
    }
}

impl RootManager for CbrtManager {
    fn base(&self) -> BigInt {
        BigInt::from(1000)
    }

    fn next(&mut self, incr: &mut BigInt) {
        *incr += &self.incr2;
        self.incr2 += 6;
    }

    fn next_digit(&mut self, incr: &mut BigInt) {
        *incr *= 100;
        *incr -= &self.incr2 * 45;
        *incr += 171;

        self.incr2 *= 10;
        self.incr2 -= 54;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn increment_sequence() {
        // First digit 1 of cbrt(2): one unit consumed, then the digit
        // boundary rescale. incr 1 -> 7 -> 331, incr2 6 -> 12 -> 66.
        let mut m = CbrtManager::default();
        let mut incr = BigInt::from(1);
        m.next(&mut incr);
        assert_eq!(incr, BigInt::from(7));
        assert_eq!(m.incr2, BigInt::from(12));
        m.next_digit(&mut incr);
        assert_eq!(incr, BigInt::from(331));
        assert_eq!(m.incr2, BigInt::from(66));
    }
}
