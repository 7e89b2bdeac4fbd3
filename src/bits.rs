//! Bit tricks over node-set masks.
//!
//! A set of nodes is a `u32` whose bit `i` marks node `i`. The dynamic programs
//! need three primitives on such masks:
//!
//! - enumerate the nonempty submasks of a mask,
//! - enumerate the positions of the set bits,
//! - compress / expand the bits of a value through a mask (`pext` / `pdep`).
//!
//! On x86_64 compiled with BMI2 the compress/expand pair maps to single
//! instructions; every other target uses the portable loops below. Both give
//! identical results.

/// A set of nodes, bit `i` standing for node `i`.
pub type Mask = u32;

/// Mask with the lowest `n` bits set.
pub const fn full_mask(n: usize) -> Mask {
    if n >= Mask::BITS as usize {
        Mask::MAX
    } else {
        (1 << n) - 1
    }
}

/// Descending iterator over the nonempty submasks of a mask.
///
/// ```
/// use dag_sampler::bits::Submasks;
///
/// let subs: Vec<u32> = Submasks::new(0b101).collect();
/// assert_eq!(subs, vec![0b101, 0b100, 0b001]);
/// ```
#[derive(Debug, Clone)]
pub struct Submasks {
    mask: Mask,
    next: Mask,
}

impl Submasks {
    pub fn new(mask: Mask) -> Self {
        Self { mask, next: mask }
    }

    /// Rewinds to the first (largest) submask.
    pub fn restart(&mut self) {
        self.next = self.mask;
    }
}

impl Iterator for Submasks {
    type Item = Mask;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 {
            return None;
        }
        let current = self.next;
        self.next = (current - 1) & self.mask;
        Some(current)
    }
}

/// Ascending iterator over the positions of the set bits of a mask.
#[derive(Debug, Clone)]
pub struct Ones(Mask);

impl Ones {
    pub fn new(mask: Mask) -> Self {
        Self(mask)
    }
}

impl Iterator for Ones {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1; // Clear lowest set bit
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Ones {}

/// Gathers the bits of `value` found at the positions set in `mask` into the
/// low bits of the result (`pext`).
#[inline]
pub fn compress_bits(value: Mask, mask: Mask) -> Mask {
    imp::compress_bits(value, mask)
}

/// Scatters the low bits of `value` to the positions set in `mask` (`pdep`).
#[inline]
pub fn expand_bits(value: Mask, mask: Mask) -> Mask {
    imp::expand_bits(value, mask)
}

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
mod imp {
    use core::arch::x86_64::{_pdep_u32, _pext_u32};

    use super::Mask;

    #[inline]
    pub fn compress_bits(value: Mask, mask: Mask) -> Mask {
        // SAFETY: the `bmi2` target feature is enabled at compile time.
        unsafe { _pext_u32(value, mask) }
    }

    #[inline]
    pub fn expand_bits(value: Mask, mask: Mask) -> Mask {
        // SAFETY: the `bmi2` target feature is enabled at compile time.
        unsafe { _pdep_u32(value, mask) }
    }
}

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
mod imp {
    pub use super::portable::{compress_bits, expand_bits};
}

#[allow(dead_code)]
mod portable {
    use super::Mask;

    #[inline]
    pub fn compress_bits(value: Mask, mask: Mask) -> Mask {
        let mut result = 0;
        let mut out = 1;
        let mut m = mask;
        while m != 0 {
            let low = m & m.wrapping_neg();
            if value & low != 0 {
                result |= out;
            }
            out <<= 1;
            m &= m - 1;
        }
        result
    }

    #[inline]
    pub fn expand_bits(value: Mask, mask: Mask) -> Mask {
        let mut result = 0;
        let mut inp = 1;
        let mut m = mask;
        while m != 0 {
            let low = m & m.wrapping_neg();
            if value & inp != 0 {
                result |= low;
            }
            inp <<= 1;
            m &= m - 1;
        }
        result
    }
}
