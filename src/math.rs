//! Math utilities over usize

/// Extension trait for math operations on usize
pub trait Math {
    /// Returns the position of the highest set bit (exact log2 for powers of two)
    fn log_2(self) -> usize;
    /// Returns 2^self
    fn pow2(self) -> usize;
    /// MSB-first binary decomposition into `num_bits` bits
    fn get_bits(self, num_bits: usize) -> Vec<bool>;
}

impl Math for usize {
    fn log_2(self) -> usize {
        assert!(self > 0);
        (std::mem::size_of::<usize>() * 8) - (self.leading_zeros() as usize) - 1
    }

    fn pow2(self) -> usize {
        1 << self
    }

    fn get_bits(self, num_bits: usize) -> Vec<bool> {
        (0..num_bits)
            .map(|shift_amount| (self & (1 << (num_bits - shift_amount - 1))) > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_2() {
        assert_eq!(1usize.log_2(), 0);
        assert_eq!(2usize.log_2(), 1);
        assert_eq!(4usize.log_2(), 2);
        assert_eq!(8usize.log_2(), 3);
        assert_eq!(1024usize.log_2(), 10);
    }

    #[test]
    fn test_pow2() {
        assert_eq!(0usize.pow2(), 1);
        assert_eq!(1usize.pow2(), 2);
        assert_eq!(10usize.pow2(), 1024);
    }

    #[test]
    fn test_get_bits() {
        assert_eq!(0usize.get_bits(4), vec![false, false, false, false]);
        assert_eq!(1usize.get_bits(4), vec![false, false, false, true]);
        assert_eq!(5usize.get_bits(4), vec![false, true, false, true]);
        assert_eq!(15usize.get_bits(4), vec![true, true, true, true]);
    }
}
