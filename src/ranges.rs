use crate::category::{category_of, mask_contains};
use crate::packed_range::{PackedRange, Tier, DOUBLE_BYTE_MAX, MAX_CODE_POINT, SINGLE_BYTE_MAX};
use crate::UnicodeCategory;
use std::fmt;

/// A mutable accumulator of packed code point ranges, one vector per tier.
///
/// Ranges may overlap or be unsorted until [`Ranges::compact`] is called.
#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct Ranges {
    pub(crate) single_byte: Vec<u16>,
    pub(crate) double_byte: Vec<u32>,
    pub(crate) triple_byte: Vec<u64>,
}

impl Ranges {
    pub(crate) fn is_empty(&self) -> bool {
        self.single_byte.is_empty() && self.double_byte.is_empty() && self.triple_byte.is_empty()
    }

    /// Adds `[from, to]`, splitting it where it straddles a tier boundary.
    pub(crate) fn add(&mut self, from: u32, to: u32) {
        debug_assert!(from <= to && to <= MAX_CODE_POINT);
        match (Tier::of(from), Tier::of(to)) {
            (Tier::SingleByte, Tier::SingleByte) => self.single_byte.push(PackedRange::pack(from, to)),
            (Tier::DoubleByte, Tier::DoubleByte) => self.double_byte.push(PackedRange::pack(from, to)),
            (Tier::TripleByte, Tier::TripleByte) => self.triple_byte.push(PackedRange::pack(from, to)),
            (Tier::SingleByte, _) => {
                self.add(from, SINGLE_BYTE_MAX);
                self.add(SINGLE_BYTE_MAX + 1, to);
            }
            (Tier::DoubleByte, _) => {
                self.add(from, DOUBLE_BYTE_MAX);
                self.add(DOUBLE_BYTE_MAX + 1, to);
            }
            (Tier::TripleByte, _) => unreachable!("from > to"),
        }
    }

    /// Removes `[from, to]` from every range it overlaps.
    pub(crate) fn remove(&mut self, from: u32, to: u32) {
        remove_from_tier(&mut self.single_byte, from, to);
        remove_from_tier(&mut self.double_byte, from, to);
        remove_from_tier(&mut self.triple_byte, from, to);
    }

    /// Removes every covered code point whose general category is in `mask`.
    pub(crate) fn remove_category(&mut self, mask: u64) {
        if mask == 0 {
            return;
        }
        let matching: Vec<u32> = self
            .iter_raw()
            .flat_map(|(from, to)| from..=to)
            .filter(|&cp| mask_contains(mask, category_of(cp)))
            .collect();
        for cp in matching {
            self.remove(cp, cp);
        }
    }

    /// Removes every range in `other`. `other` should be compacted first.
    pub(crate) fn subtract(&mut self, other: &Ranges) {
        for (from, to) in other.iter_raw() {
            self.remove(from, to);
        }
    }

    /// Sorts each tier and merges overlapping or adjacent ranges.
    ///
    /// Returns the number of code points covered across all tiers.
    pub(crate) fn compact(&mut self) -> u32 {
        compact_tier(&mut self.single_byte)
            + compact_tier(&mut self.double_byte)
            + compact_tier(&mut self.triple_byte)
    }

    /// Iterates `(from, to)` pairs tier by tier, in storage order.
    pub(crate) fn iter_raw(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let single = self.single_byte.iter().map(|r| (r.from(), r.to()));
        let double = self.double_byte.iter().map(|r| (r.from(), r.to()));
        let triple = self.triple_byte.iter().map(|r| (r.from(), r.to()));
        single.chain(double).chain(triple)
    }

    /// Accepts every code point of `category` by enumerating the whole code space.
    pub(crate) fn add_category_members(&mut self, category: UnicodeCategory) {
        let mut run: Option<(u32, u32)> = None;
        for cp in 0..=MAX_CODE_POINT {
            if category_of(cp) == category {
                run = match run {
                    Some((from, to)) if to + 1 == cp => Some((from, cp)),
                    Some((from, to)) => {
                        self.add(from, to);
                        Some((cp, cp))
                    }
                    None => Some((cp, cp)),
                };
            }
        }
        if let Some((from, to)) = run {
            self.add(from, to);
        }
    }
}

fn remove_from_tier<P: PackedRange>(tier: &mut Vec<P>, from: u32, to: u32) {
    let mut idx = 0;
    while idx < tier.len() {
        let range = tier[idx];
        let (r_from, r_to) = (range.from(), range.to());
        if to < r_from || from > r_to {
            idx += 1;
        } else if from <= r_from && to >= r_to {
            tier.swap_remove(idx);
        } else if from > r_from && to < r_to {
            // The removal bisects the range; the remainder goes to the end.
            tier[idx] = P::pack(r_from, from - 1);
            tier.push(P::pack(to + 1, r_to));
            idx += 1;
        } else if from <= r_from {
            tier[idx] = P::pack(to + 1, r_to);
            idx += 1;
        } else {
            tier[idx] = P::pack(r_from, from - 1);
            idx += 1;
        }
    }
}

fn compact_tier<P: PackedRange>(tier: &mut Vec<P>) -> u32 {
    if tier.is_empty() {
        return 0;
    }
    tier.sort_unstable();
    let mut write = 0;
    for read in 1..tier.len() {
        let current = tier[write];
        let next = tier[read];
        if next.from() <= current.to().saturating_add(1) {
            if next.to() > current.to() {
                tier[write] = P::pack(current.from(), next.to());
            }
        } else {
            write += 1;
            tier[write] = next;
        }
    }
    tier.truncate(write + 1);
    tier.shrink_to_fit();
    tier.iter().map(|r| r.len()).sum()
}

impl fmt::Debug for Ranges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ranges(")?;
        f.debug_list()
            .entries(self.iter_raw().map(|(from, to)| from..=to))
            .finish()?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::Ranges;

    fn raw(ranges: &Ranges) -> Vec<(u32, u32)> {
        ranges.iter_raw().collect()
    }

    #[test]
    fn test_add_splits_across_tiers() {
        let mut ranges = Ranges::default();
        ranges.add(0xF0, 0x10010);
        assert_eq!(
            vec![(0xF0, 0xFF), (0x100, 0xFFFF), (0x10000, 0x10010)],
            raw(&ranges)
        );
    }

    #[test]
    fn test_compact_merges_overlap_and_adjacency() {
        let mut ranges = Ranges::default();
        ranges.add(0x61, 0x7A);
        ranges.add(0x41, 0x5A);
        ranges.add(0x5B, 0x5B);
        ranges.add(0x45, 0x50);
        ranges.add(0x30, 0x39);
        let covered = ranges.compact();
        assert_eq!(vec![(0x30, 0x39), (0x41, 0x5B), (0x61, 0x7A)], raw(&ranges));
        assert_eq!(10 + 27 + 26, covered);
    }

    #[test]
    fn test_compact_counts_every_tier() {
        let mut ranges = Ranges::default();
        ranges.add(0x41, 0x42);
        ranges.add(0x391, 0x392);
        ranges.add(0x1F600, 0x1F601);
        assert_eq!(6, ranges.compact());
    }

    #[test]
    fn test_remove_shapes() {
        let mut ranges = Ranges::default();
        ranges.add(0x10, 0x20);
        ranges.add(0x30, 0x40);
        ranges.add(0x50, 0x60);
        ranges.add(0x70, 0x80);
        // bisect, trim left, trim right, delete
        ranges.remove(0x15, 0x16);
        ranges.remove(0x2A, 0x35);
        ranges.remove(0x5A, 0x65);
        ranges.remove(0x70, 0x80);
        ranges.compact();
        assert_eq!(
            vec![(0x10, 0x14), (0x17, 0x20), (0x36, 0x40), (0x50, 0x59)],
            raw(&ranges)
        );
    }

    #[test]
    fn test_remove_across_tiers() {
        let mut ranges = Ranges::default();
        ranges.add(0x00, 0x10FFFF);
        ranges.remove(0x80, 0x1FFFF);
        ranges.compact();
        assert_eq!(vec![(0x00, 0x7F), (0x20000, 0x10FFFF)], raw(&ranges));
    }

    #[test]
    fn test_remove_category() {
        use crate::UnicodeCategory;
        let mut ranges = Ranges::default();
        ranges.add(0x30, 0x7A);
        ranges.remove_category(UnicodeCategory::UppercaseLetter.bit());
        ranges.compact();
        assert_eq!(vec![(0x30, 0x40), (0x5B, 0x7A)], raw(&ranges));
    }

    #[test]
    fn test_add_category_members() {
        use crate::UnicodeCategory;
        let mut ranges = Ranges::default();
        ranges.add_category_members(UnicodeCategory::LineSeparator);
        ranges.compact();
        assert_eq!(vec![(0x2028, 0x2028)], raw(&ranges));
    }
}
