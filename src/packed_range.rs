//! Packing of inclusive `[from, to]` code point pairs into a single integer.
//!
//! A range is stored in the narrowest tier able to hold both bounds:
//! single-byte ranges in a `u16` (8 + 8 bits), double-byte ranges in a
//! `u32` (16 + 16 bits) and everything else in a `u64` (32 + 32 bits).
//! The lower bound always occupies the high half, so sorting packed values
//! sorts ranges by their lower bound first.

use std::fmt::{self, Write};

pub(crate) const SINGLE_BYTE_MAX: u32 = 0xFF;
pub(crate) const DOUBLE_BYTE_MAX: u32 = 0xFFFF;
pub(crate) const MAX_CODE_POINT: u32 = 0x10FFFF;

const SINGLE_BYTE_SHIFT: u32 = 8;
const DOUBLE_BYTE_SHIFT: u32 = 16;
const TRIPLE_BYTE_SHIFT: u32 = 32;

/// The packing width a range is stored with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Both bounds are at most `0xFF`.
    SingleByte,
    /// Both bounds are at most `0xFFFF`.
    DoubleByte,
    /// Bounds up to `0x10FFFF`.
    TripleByte,
}

impl Tier {
    /// Returns the tier a single code point belongs to.
    #[inline]
    pub fn of(code_point: u32) -> Tier {
        if code_point <= SINGLE_BYTE_MAX {
            Tier::SingleByte
        } else if code_point <= DOUBLE_BYTE_MAX {
            Tier::DoubleByte
        } else {
            Tier::TripleByte
        }
    }

    /// The largest code point this tier can hold.
    pub const fn max_code_point(self) -> u32 {
        match self {
            Tier::SingleByte => SINGLE_BYTE_MAX,
            Tier::DoubleByte => DOUBLE_BYTE_MAX,
            Tier::TripleByte => MAX_CODE_POINT,
        }
    }
}

/// An inclusive code point range packed into an unsigned integer.
pub(crate) trait PackedRange: Copy + Ord + fmt::LowerHex {
    /// Number of hex digits needed to print a packed value.
    const HEX_WIDTH: usize;

    fn pack(from: u32, to: u32) -> Self;

    fn from(self) -> u32;

    fn to(self) -> u32;

    #[inline]
    fn len(self) -> u32 {
        self.to() - self.from() + 1
    }

    #[inline]
    fn contains(self, code_point: u32) -> bool {
        self.from() <= code_point && code_point <= self.to()
    }
}

impl PackedRange for u16 {
    const HEX_WIDTH: usize = 4;

    #[inline]
    fn pack(from: u32, to: u32) -> Self {
        debug_assert!(from <= to && to <= SINGLE_BYTE_MAX);
        ((from as u16) << SINGLE_BYTE_SHIFT) | (to as u16 & 0xFF)
    }

    #[inline]
    fn from(self) -> u32 {
        (self >> SINGLE_BYTE_SHIFT) as u32
    }

    #[inline]
    fn to(self) -> u32 {
        (self & 0xFF) as u32
    }
}

impl PackedRange for u32 {
    const HEX_WIDTH: usize = 8;

    #[inline]
    fn pack(from: u32, to: u32) -> Self {
        debug_assert!(from <= to && to <= DOUBLE_BYTE_MAX);
        (from << DOUBLE_BYTE_SHIFT) | (to & 0xFFFF)
    }

    #[inline]
    fn from(self) -> u32 {
        self >> DOUBLE_BYTE_SHIFT
    }

    #[inline]
    fn to(self) -> u32 {
        self & 0xFFFF
    }
}

impl PackedRange for u64 {
    const HEX_WIDTH: usize = 16;

    #[inline]
    fn pack(from: u32, to: u32) -> Self {
        debug_assert!(from <= to && to <= MAX_CODE_POINT);
        ((from as u64) << TRIPLE_BYTE_SHIFT) | to as u64
    }

    #[inline]
    fn from(self) -> u32 {
        (self >> TRIPLE_BYTE_SHIFT) as u32
    }

    #[inline]
    fn to(self) -> u32 {
        (self & 0xFFFF_FFFF) as u32
    }
}

/// Binary search over sorted, disjoint packed ranges.
pub(crate) fn ranges_contain<P: PackedRange>(ranges: &[P], code_point: u32) -> bool {
    let (first, last) = match ranges {
        [] => return false,
        [first, .., last] => (*first, *last),
        [only] => (*only, *only),
    };
    if code_point < first.from() || code_point > last.to() {
        return false;
    }
    let mut low = 0;
    let mut high = ranges.len();
    while low < high {
        let mid = low + (high - low) / 2;
        let range = ranges[mid];
        if range.contains(code_point) {
            return true;
        } else if code_point < range.from() {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    false
}

const VALUES_PER_LINE: usize = 8;

/// Renders `values` as a labeled array literal, hex padded to `width` digits, eight per line.
pub(crate) fn write_array_literal<T: fmt::LowerHex>(
    out: &mut String,
    label: &str,
    element_type: &str,
    width: usize,
    values: &[T],
) {
    // Writing to a `String` cannot fail.
    let _ = writeln!(out, "{}: [{}; {}] = [", label, element_type, values.len());
    for line in values.chunks(VALUES_PER_LINE) {
        out.push_str("   ");
        for v in line {
            let _ = write!(out, " 0x{:0width$x},", v, width = width);
        }
        out.push('\n');
    }
    out.push_str("];\n");
}

#[cfg(test)]
mod tests {
    use super::{ranges_contain, write_array_literal, PackedRange, Tier};

    #[test]
    fn test_pack_unpack_per_tier() {
        let single = <u16 as PackedRange>::pack(0x41, 0x5A);
        assert_eq!(0x415A, single);
        assert_eq!((0x41, 0x5A), (single.from(), single.to()));

        let double = <u32 as PackedRange>::pack(0x0100, 0xFFFF);
        assert_eq!(0x0100_FFFF, double);
        assert_eq!((0x100, 0xFFFF), (double.from(), double.to()));

        let triple = <u64 as PackedRange>::pack(0x10000, 0x10FFFF);
        assert_eq!((0x10000, 0x10FFFF), (triple.from(), triple.to()));
        assert_eq!(0x10_0000, triple.len());
    }

    #[test]
    fn test_packed_order_follows_lower_bound() {
        let mut v: Vec<u32> = vec![
            PackedRange::pack(0x300, 0x310),
            PackedRange::pack(0x100, 0x2FF),
            PackedRange::pack(0x100, 0x120),
        ];
        v.sort_unstable();
        let bounds: Vec<_> = v.iter().map(|r| (r.from(), r.to())).collect();
        assert_eq!(vec![(0x100, 0x120), (0x100, 0x2FF), (0x300, 0x310)], bounds);
    }

    #[test]
    fn test_tier_of() {
        assert_eq!(Tier::SingleByte, Tier::of(0xFF));
        assert_eq!(Tier::DoubleByte, Tier::of(0x100));
        assert_eq!(Tier::DoubleByte, Tier::of(0xFFFF));
        assert_eq!(Tier::TripleByte, Tier::of(0x10000));
    }

    #[test]
    fn test_ranges_contain() {
        let ranges: Vec<u16> = vec![
            PackedRange::pack(0x30, 0x39),
            PackedRange::pack(0x41, 0x5A),
            PackedRange::pack(0x61, 0x7A),
        ];
        for cp in 0..=0xFFu32 {
            let expected = (0x30..=0x39).contains(&cp)
                || (0x41..=0x5A).contains(&cp)
                || (0x61..=0x7A).contains(&cp);
            assert_eq!(expected, ranges_contain(&ranges, cp), "code point {:#x}", cp);
        }
        assert!(!ranges_contain::<u16>(&[], 0x41));
    }

    #[test]
    fn test_array_literal_layout() {
        let mut out = String::new();
        let values: Vec<u16> = (0..10).collect();
        write_array_literal(&mut out, "KEYS", "u16", 4, &values);
        assert_eq!(
            "KEYS: [u16; 10] = [\n    0x0000, 0x0001, 0x0002, 0x0003, 0x0004, 0x0005, 0x0006, 0x0007,\n    0x0008, 0x0009,\n];\n",
            out
        );
    }
}
