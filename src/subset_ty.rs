use crate::category::{category_of, mask_contains};
use crate::error::BuildError;
use crate::packed_range::{
    ranges_contain, write_array_literal, PackedRange, Tier, MAX_CODE_POINT,
};
use crate::ranges::Ranges;
use crate::subset_optimiser::{
    self, bucket_of, BlockStatistics, Choice, Strategy, BLOCK_SHIFT, OFFSET_MASK,
};
use crate::UnicodeCategory;
use std::{fmt, iter::FusedIterator, ops::RangeInclusive};

/// Marks an unused bucket in an optimally hashed subset. Real block keys never exceed `0x10FF`.
const EMPTY_BLOCK_KEY: u16 = 0xFFFF;

/// An immutable set of code points.
///
/// Membership is the union of packed code point ranges and an optional mask
/// of Unicode general categories. The ranges are stored in one of three
/// layouts, see [`SubsetRepresentation`]; every layout accepts exactly the
/// same code points.
#[derive(Clone)]
pub struct Subset {
    repr: SubsetRepr,
    categories: u64,
    code_point_count: u32,
}

/// The storage layout of a [`Subset`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubsetRepresentation {
    /// Sorted packed ranges per tier, searched by bisection.
    Ranged,
    /// Block keys hashed into buckets that may hold several keys.
    Hashed,
    /// Block keys hashed into buckets holding at most one key each.
    OptimalHashed,
}

#[derive(Clone, PartialEq, Eq)]
enum SubsetRepr {
    Ranged(RangedSubset),
    Hashed(HashedRangedSubset),
    OptimalHashed(OptimalHashedRangedSubset),
}

#[derive(Clone, Default, PartialEq, Eq)]
struct RangedSubset {
    single_byte: Box<[u16]>,
    double_byte: Box<[u32]>,
    triple_byte: Box<[u64]>,
}

impl RangedSubset {
    fn from_ranges(ranges: Ranges) -> Self {
        RangedSubset {
            single_byte: ranges.single_byte.into_boxed_slice(),
            double_byte: ranges.double_byte.into_boxed_slice(),
            triple_byte: ranges.triple_byte.into_boxed_slice(),
        }
    }

    #[inline]
    fn contains(&self, code_point: u32) -> bool {
        match Tier::of(code_point) {
            Tier::SingleByte => ranges_contain(&self.single_byte[..], code_point),
            Tier::DoubleByte => ranges_contain(&self.double_byte[..], code_point),
            Tier::TripleByte => ranges_contain(&self.triple_byte[..], code_point),
        }
    }

    fn pieces(&self) -> Vec<(u32, u32)> {
        let single = self.single_byte.iter().map(|r| (r.from(), r.to()));
        let double = self.double_byte.iter().map(|r| (r.from(), r.to()));
        let triple = self.triple_byte.iter().map(|r| (r.from(), r.to()));
        single.chain(double).chain(triple).collect()
    }

    fn tier_sizes(&self) -> (usize, usize, usize) {
        (
            self.single_byte.len(),
            self.double_byte.len(),
            self.triple_byte.len(),
        )
    }
}

/// Buckets may hold several block keys; `bucket_starts` indexes `keys`,
/// `key_range_starts` indexes `offset_ranges`.
#[derive(Clone, PartialEq, Eq)]
struct HashedRangedSubset {
    bucket_starts: Box<[u32]>,
    keys: Box<[u16]>,
    key_range_starts: Box<[u32]>,
    offset_ranges: Box<[u16]>,
}

impl HashedRangedSubset {
    fn new(stats: &BlockStatistics, bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        let mut order: Vec<usize> = (0..stats.blocks.len()).collect();
        order.sort_by_key(|&i| {
            let key = stats.blocks[i].0;
            (bucket_of(key, bucket_count), key)
        });

        let mut bucket_starts = vec![0u32; bucket_count + 1];
        let mut keys = Vec::with_capacity(order.len());
        let mut key_range_starts = Vec::with_capacity(order.len() + 1);
        let mut offset_ranges = Vec::with_capacity(stats.piece_count);
        key_range_starts.push(0u32);
        for &i in &order {
            let (key, pieces) = &stats.blocks[i];
            bucket_starts[bucket_of(*key, bucket_count) + 1] += 1;
            keys.push(*key);
            offset_ranges.extend_from_slice(pieces);
            key_range_starts.push(offset_ranges.len() as u32);
        }
        for b in 0..bucket_count {
            bucket_starts[b + 1] += bucket_starts[b];
        }
        HashedRangedSubset {
            bucket_starts: bucket_starts.into_boxed_slice(),
            keys: keys.into_boxed_slice(),
            key_range_starts: key_range_starts.into_boxed_slice(),
            offset_ranges: offset_ranges.into_boxed_slice(),
        }
    }

    #[inline]
    fn contains(&self, code_point: u32) -> bool {
        if code_point > MAX_CODE_POINT {
            return false;
        }
        let key = (code_point >> BLOCK_SHIFT) as u16;
        let bucket = bucket_of(key, self.bucket_starts.len() - 1);
        let slots = self.bucket_starts[bucket] as usize..self.bucket_starts[bucket + 1] as usize;
        for slot in slots {
            if self.keys[slot] == key {
                let ranges = self.key_range_starts[slot] as usize
                    ..self.key_range_starts[slot + 1] as usize;
                return ranges_contain(&self.offset_ranges[ranges], code_point & OFFSET_MASK);
            }
        }
        false
    }

    fn pieces(&self) -> Vec<(u32, u32)> {
        let mut pieces = Vec::with_capacity(self.offset_ranges.len());
        for (slot, &key) in self.keys.iter().enumerate() {
            let ranges =
                self.key_range_starts[slot] as usize..self.key_range_starts[slot + 1] as usize;
            push_block_pieces(&mut pieces, key, &self.offset_ranges[ranges]);
        }
        pieces.sort_unstable();
        pieces
    }
}

/// Every bucket holds at most one block key, so a lookup is a single array index.
#[derive(Clone, PartialEq, Eq)]
struct OptimalHashedRangedSubset {
    bucket_keys: Box<[u16]>,
    range_starts: Box<[u32]>,
    offset_ranges: Box<[u16]>,
}

impl OptimalHashedRangedSubset {
    fn new(stats: &BlockStatistics, bucket_count: usize) -> Option<Self> {
        let bucket_count = bucket_count.max(1);
        let mut slots: Vec<Option<usize>> = vec![None; bucket_count];
        for (i, (key, _)) in stats.blocks.iter().enumerate() {
            let slot = &mut slots[bucket_of(*key, bucket_count)];
            if slot.is_some() {
                return None;
            }
            *slot = Some(i);
        }
        let mut bucket_keys = Vec::with_capacity(bucket_count);
        let mut range_starts = Vec::with_capacity(bucket_count + 1);
        let mut offset_ranges = Vec::with_capacity(stats.piece_count);
        range_starts.push(0u32);
        for slot in slots {
            match slot {
                Some(i) => {
                    let (key, pieces) = &stats.blocks[i];
                    bucket_keys.push(*key);
                    offset_ranges.extend_from_slice(pieces);
                }
                None => bucket_keys.push(EMPTY_BLOCK_KEY),
            }
            range_starts.push(offset_ranges.len() as u32);
        }
        Some(OptimalHashedRangedSubset {
            bucket_keys: bucket_keys.into_boxed_slice(),
            range_starts: range_starts.into_boxed_slice(),
            offset_ranges: offset_ranges.into_boxed_slice(),
        })
    }

    #[inline]
    fn contains(&self, code_point: u32) -> bool {
        if code_point > MAX_CODE_POINT {
            return false;
        }
        let key = (code_point >> BLOCK_SHIFT) as u16;
        let bucket = bucket_of(key, self.bucket_keys.len());
        if self.bucket_keys[bucket] != key {
            return false;
        }
        let ranges = self.range_starts[bucket] as usize..self.range_starts[bucket + 1] as usize;
        ranges_contain(&self.offset_ranges[ranges], code_point & OFFSET_MASK)
    }

    fn pieces(&self) -> Vec<(u32, u32)> {
        let mut pieces = Vec::with_capacity(self.offset_ranges.len());
        for (bucket, &key) in self.bucket_keys.iter().enumerate() {
            if key == EMPTY_BLOCK_KEY {
                continue;
            }
            let ranges = self.range_starts[bucket] as usize..self.range_starts[bucket + 1] as usize;
            push_block_pieces(&mut pieces, key, &self.offset_ranges[ranges]);
        }
        pieces.sort_unstable();
        pieces
    }
}

fn push_block_pieces(pieces: &mut Vec<(u32, u32)>, key: u16, offset_ranges: &[u16]) {
    let base = <u32 as From<u16>>::from(key) << BLOCK_SHIFT;
    pieces.extend(
        offset_ranges
            .iter()
            .map(|r| (base | r.from(), base | r.to())),
    );
}

impl SubsetRepr {
    #[inline]
    fn contains(&self, code_point: u32) -> bool {
        match self {
            SubsetRepr::Ranged(r) => r.contains(code_point),
            SubsetRepr::Hashed(h) => h.contains(code_point),
            SubsetRepr::OptimalHashed(o) => o.contains(code_point),
        }
    }

    /// Sorted `(from, to)` pieces; adjacent pieces are not merged yet.
    fn pieces(&self) -> Vec<(u32, u32)> {
        match self {
            SubsetRepr::Ranged(r) => r.pieces(),
            SubsetRepr::Hashed(h) => h.pieces(),
            SubsetRepr::OptimalHashed(o) => o.pieces(),
        }
    }
}

impl Default for Subset {
    fn default() -> Self {
        Subset::empty()
    }
}

impl Subset {
    /// The subset accepting nothing.
    pub fn empty() -> Self {
        Subset {
            repr: SubsetRepr::Ranged(RangedSubset::default()),
            categories: 0,
            code_point_count: 0,
        }
    }

    /// Returns a builder for a new subset.
    pub fn builder() -> SubsetBuilder {
        SubsetBuilder::new()
    }

    /// Whether `code_point` is accepted.
    #[inline]
    pub fn contains(&self, code_point: u32) -> bool {
        self.repr.contains(code_point)
            || (self.categories != 0 && mask_contains(self.categories, category_of(code_point)))
    }

    /// Whether `ch` is accepted.
    #[inline]
    pub fn contains_char(&self, ch: char) -> bool {
        self.contains(ch as u32)
    }

    /// Whether nothing at all is accepted.
    pub fn is_empty(&self) -> bool {
        self.categories == 0 && self.code_point_count == 0
    }

    /// The mask of accepted general categories, one bit per [`UnicodeCategory::ordinal`].
    pub fn categories(&self) -> u64 {
        self.categories
    }

    /// The accepted general categories.
    pub fn category_list(&self) -> Vec<UnicodeCategory> {
        UnicodeCategory::ALL
            .iter()
            .copied()
            .filter(|c| mask_contains(self.categories, *c))
            .collect()
    }

    /// Number of code points covered by the ranges, category members excluded.
    pub fn code_point_count(&self) -> u32 {
        self.code_point_count
    }

    /// The current storage layout.
    pub fn representation(&self) -> SubsetRepresentation {
        match self.repr {
            SubsetRepr::Ranged(_) => SubsetRepresentation::Ranged,
            SubsetRepr::Hashed(_) => SubsetRepresentation::Hashed,
            SubsetRepr::OptimalHashed(_) => SubsetRepresentation::OptimalHashed,
        }
    }

    /// Iterates the accepted ranges in ascending order, merged across tiers and blocks.
    pub fn ranges(&self) -> CodePointRanges {
        CodePointRanges {
            pieces: self.repr.pieces().into_iter(),
            pending: None,
        }
    }

    fn block_statistics(&self) -> BlockStatistics {
        BlockStatistics::from_ranges(self.ranges().map(|r| (*r.start(), *r.end())))
    }

    fn with_repr(&self, repr: SubsetRepr) -> Subset {
        Subset {
            repr,
            categories: self.categories,
            code_point_count: self.code_point_count,
        }
    }

    /// The same subset stored as flat sorted ranges.
    pub fn to_ranged(&self) -> Subset {
        if let SubsetRepr::Ranged(_) = self.repr {
            return self.clone();
        }
        let mut ranges = Ranges::default();
        for r in self.ranges() {
            ranges.add(*r.start(), *r.end());
        }
        ranges.compact();
        self.with_repr(SubsetRepr::Ranged(RangedSubset::from_ranges(ranges)))
    }

    /// The same subset hashed by block key into `bucket_count` buckets.
    pub fn to_hashed(&self, bucket_count: usize) -> Subset {
        let stats = self.block_statistics();
        self.with_repr(SubsetRepr::Hashed(HashedRangedSubset::new(&stats, bucket_count)))
    }

    /// The same subset with one block key per bucket, if a collision-free
    /// bucket count exists in the search window.
    pub fn to_optimal_hashed(&self) -> Option<Subset> {
        let stats = self.block_statistics();
        let bucket_count = subset_optimiser::find_optimal_bucket_count(&stats)?;
        let optimal = OptimalHashedRangedSubset::new(&stats, bucket_count)?;
        Some(self.with_repr(SubsetRepr::OptimalHashed(optimal)))
    }

    /// The same subset in the layout with the lowest modelled memory cost.
    pub fn optimised(&self) -> Subset {
        let ranged = self.to_ranged();
        let tier_sizes = match &ranged.repr {
            SubsetRepr::Ranged(r) => r.tier_sizes(),
            _ => unreachable!("to_ranged always yields a ranged subset"),
        };
        let stats = ranged.block_statistics();
        let Choice {
            strategy,
            ranged_cost,
            hashed_cost,
        } = subset_optimiser::choose(&stats, tier_sizes);
        tracing::debug!(
            ranges = stats.range_count,
            block_keys = stats.key_count(),
            ranged_cost,
            ?hashed_cost,
            ?strategy,
            "chose subset layout"
        );
        match strategy {
            Strategy::Ranged => ranged,
            Strategy::Hashed { bucket_count } => {
                ranged.with_repr(SubsetRepr::Hashed(HashedRangedSubset::new(&stats, bucket_count)))
            }
            Strategy::OptimalHashed { bucket_count } => {
                match OptimalHashedRangedSubset::new(&stats, bucket_count) {
                    Some(optimal) => ranged.with_repr(SubsetRepr::OptimalHashed(optimal)),
                    None => ranged,
                }
            }
        }
    }

    /// Renders the compiled arrays as labeled source literals, hex padded,
    /// eight values per line.
    pub fn to_data_structure_string(&self, label: &str) -> String {
        let mut out = String::new();
        match &self.repr {
            SubsetRepr::Ranged(r) => {
                if !r.single_byte.is_empty() {
                    let name = format!("{}_SINGLE_BYTE_RANGES", label);
                    write_array_literal(&mut out, &name, "u16", u16::HEX_WIDTH, &r.single_byte);
                }
                if !r.double_byte.is_empty() {
                    let name = format!("{}_DOUBLE_BYTE_RANGES", label);
                    write_array_literal(&mut out, &name, "u32", u32::HEX_WIDTH, &r.double_byte);
                }
                if !r.triple_byte.is_empty() {
                    let name = format!("{}_TRIPLE_BYTE_RANGES", label);
                    write_array_literal(&mut out, &name, "u64", u64::HEX_WIDTH, &r.triple_byte);
                }
            }
            SubsetRepr::Hashed(h) => {
                let name = format!("{}_BUCKET_STARTS", label);
                write_array_literal(&mut out, &name, "u32", 8, &h.bucket_starts);
                let name = format!("{}_BLOCK_KEYS", label);
                write_array_literal(&mut out, &name, "u16", 4, &h.keys);
                let name = format!("{}_KEY_RANGE_STARTS", label);
                write_array_literal(&mut out, &name, "u32", 8, &h.key_range_starts);
                let name = format!("{}_OFFSET_RANGES", label);
                write_array_literal(&mut out, &name, "u16", 4, &h.offset_ranges);
            }
            SubsetRepr::OptimalHashed(o) => {
                let name = format!("{}_BLOCK_KEYS", label);
                write_array_literal(&mut out, &name, "u16", 4, &o.bucket_keys);
                let name = format!("{}_RANGE_STARTS", label);
                write_array_literal(&mut out, &name, "u32", 8, &o.range_starts);
                let name = format!("{}_OFFSET_RANGES", label);
                write_array_literal(&mut out, &name, "u16", 4, &o.offset_ranges);
            }
        }
        if self.categories != 0 {
            out.push_str(&format!("{}_CATEGORIES: u64 = 0x{:016x};\n", label, self.categories));
        }
        out
    }
}

impl fmt::Debug for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subset({:?}, ", self.representation())?;
        f.debug_list().entries(self.ranges()).finish()?;
        if self.categories != 0 {
            write!(f, ", ")?;
            f.debug_list()
                .entries(self.category_list().iter().map(|c| c.abbreviation()))
                .finish()?;
        }
        write!(f, ")")
    }
}

/// An iterator over the ranges of a [`Subset`].
#[derive(Clone, Debug)]
pub struct CodePointRanges {
    pieces: std::vec::IntoIter<(u32, u32)>,
    pending: Option<(u32, u32)>,
}

impl Iterator for CodePointRanges {
    type Item = RangeInclusive<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let (from, mut to) = match self.pending.take().or_else(|| self.pieces.next()) {
            Some(piece) => piece,
            None => return None,
        };
        for (next_from, next_to) in self.pieces.by_ref() {
            if next_from <= to.saturating_add(1) {
                to = to.max(next_to);
            } else {
                self.pending = Some((next_from, next_to));
                break;
            }
        }
        Some(from..=to)
    }
}

impl FusedIterator for CodePointRanges {}

/// Accumulates included and excluded code points, then compiles a [`Subset`].
///
/// Exclusions win over inclusions regardless of the order calls are made in.
#[derive(Clone, Debug, Default)]
pub struct SubsetBuilder {
    include: Ranges,
    exclude: Ranges,
    include_categories: u64,
    exclude_categories: u64,
    error: Option<BuildError>,
}

impl SubsetBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn checked_range(&mut self, from: u32, to: u32) -> bool {
        if from > to || to > MAX_CODE_POINT {
            if self.error.is_none() {
                self.error = Some(BuildError::InvalidCodePointRange { from, to });
            }
            return false;
        }
        true
    }

    pub(crate) fn add_range(&mut self, from: u32, to: u32) {
        if self.checked_range(from, to) {
            self.include.add(from, to);
        }
    }

    pub(crate) fn add_category(&mut self, category: UnicodeCategory) {
        self.include_categories |= category.bit();
    }

    pub(crate) fn add_subset(&mut self, subset: &Subset) {
        for r in subset.ranges() {
            self.include.add(*r.start(), *r.end());
        }
        self.include_categories |= subset.categories;
    }

    pub(crate) fn remove_range(&mut self, from: u32, to: u32) {
        if self.checked_range(from, to) {
            self.exclude.add(from, to);
        }
    }

    /// Accepts a single code point.
    pub fn include_code_point(mut self, code_point: u32) -> Self {
        self.add_range(code_point, code_point);
        self
    }

    /// Accepts the inclusive range `[from, to]`.
    pub fn include_range(mut self, from: u32, to: u32) -> Self {
        self.add_range(from, to);
        self
    }

    /// Accepts one character.
    pub fn include_char(mut self, ch: char) -> Self {
        self.add_range(ch as u32, ch as u32);
        self
    }

    /// Accepts every character of `chars`.
    pub fn include_chars(mut self, chars: &str) -> Self {
        for ch in chars.chars() {
            self.add_range(ch as u32, ch as u32);
        }
        self
    }

    /// Accepts the inclusive character range `[from, to]`.
    pub fn include_char_range(mut self, from: char, to: char) -> Self {
        self.add_range(from as u32, to as u32);
        self
    }

    /// Accepts every code point of a general category.
    pub fn include_category(mut self, category: UnicodeCategory) -> Self {
        self.add_category(category);
        self
    }

    /// Accepts everything another subset accepts.
    pub fn include_subset(mut self, subset: &Subset) -> Self {
        self.add_subset(subset);
        self
    }

    /// Rejects a single code point.
    pub fn exclude_code_point(mut self, code_point: u32) -> Self {
        self.remove_range(code_point, code_point);
        self
    }

    /// Rejects the inclusive range `[from, to]`.
    pub fn exclude_range(mut self, from: u32, to: u32) -> Self {
        self.remove_range(from, to);
        self
    }

    /// Rejects one character.
    pub fn exclude_char(mut self, ch: char) -> Self {
        self.remove_range(ch as u32, ch as u32);
        self
    }

    /// Rejects every character of `chars`.
    pub fn exclude_chars(mut self, chars: &str) -> Self {
        for ch in chars.chars() {
            self.remove_range(ch as u32, ch as u32);
        }
        self
    }

    /// Rejects every code point of a general category.
    pub fn exclude_category(mut self, category: UnicodeCategory) -> Self {
        self.exclude_categories |= category.bit();
        self
    }

    /// Rejects everything another subset accepts.
    pub fn exclude_subset(mut self, subset: &Subset) -> Self {
        for r in subset.ranges() {
            self.exclude.add(*r.start(), *r.end());
        }
        self.exclude_categories |= subset.categories;
        self
    }

    /// Compiles into the flat ranged layout without running the optimiser.
    pub fn build_ranged(self) -> Result<Subset, BuildError> {
        let SubsetBuilder {
            mut include,
            mut exclude,
            include_categories,
            exclude_categories,
            error,
        } = self;
        if let Some(e) = error {
            return Err(e);
        }
        exclude.compact();
        include.subtract(&exclude);
        include.remove_category(exclude_categories);

        let mut categories = include_categories & !exclude_categories;
        if categories != 0 && !exclude.is_empty() {
            // Excluded code points inside an accepted category can only be
            // honoured once that category is materialised as ranges.
            let excluded_categories = exclude
                .iter_raw()
                .flat_map(|(from, to)| from..=to)
                .fold(0u64, |mask, cp| mask | category_of(cp).bit());
            for category in UnicodeCategory::ALL {
                if mask_contains(categories & excluded_categories, category) {
                    include.add_category_members(category);
                    categories &= !category.bit();
                }
            }
            include.subtract(&exclude);
        }

        let code_point_count = include.compact();
        Ok(Subset {
            repr: SubsetRepr::Ranged(RangedSubset::from_ranges(include)),
            categories,
            code_point_count,
        })
    }

    /// Compiles and picks the cheapest layout.
    pub fn build(self) -> Result<Subset, BuildError> {
        Ok(self.build_ranged()?.optimised())
    }
}

#[cfg(test)]
mod tests {
    use super::{Subset, SubsetBuilder, SubsetRepresentation};
    use crate::{BuildError, UnicodeCategory};

    fn ranges_of(subset: &Subset) -> Vec<(u32, u32)> {
        subset.ranges().map(|r| (*r.start(), *r.end())).collect()
    }

    fn scattered() -> Subset {
        let mut builder = SubsetBuilder::new();
        for block in 0..60u32 {
            let base = 0x2000 + block * 0x100;
            for offset in [3u32, 17, 40, 41, 42, 60, 90, 120, 150, 200, 230, 250] {
                builder = builder.include_code_point(base + offset);
            }
        }
        builder
            .include_range(0x1F300, 0x1F3FF)
            .include_char_range('a', 'z')
            .build_ranged()
            .unwrap()
    }

    #[test]
    fn test_contains_letters() {
        let subset = SubsetBuilder::new()
            .include_char_range('A', 'Z')
            .include_char_range('a', 'z')
            .build()
            .unwrap();
        assert_eq!(SubsetRepresentation::Ranged, subset.representation());
        assert!(subset.contains_char('A'));
        assert!(subset.contains_char('q'));
        assert!(!subset.contains_char('1'));
        assert!(!subset.contains_char('['));
        assert!(!subset.contains(0x110000));
        assert_eq!(52, subset.code_point_count());
    }

    #[test]
    fn test_ranges_merge_across_tier_boundary() {
        let subset = SubsetBuilder::new()
            .include_range(0xF0, 0x100FF)
            .include_range(0x10100, 0x10110)
            .build_ranged()
            .unwrap();
        assert_eq!(vec![(0xF0, 0x10110)], ranges_of(&subset));
    }

    #[test]
    fn test_exclusions_win() {
        let subset = SubsetBuilder::new()
            .exclude_chars("aeiou")
            .include_char_range('a', 'z')
            .build()
            .unwrap();
        assert!(subset.contains_char('b'));
        assert!(!subset.contains_char('e'));
        assert_eq!(21, subset.code_point_count());
    }

    #[test]
    fn test_category_path() {
        let subset = SubsetBuilder::new()
            .include_category(UnicodeCategory::DecimalNumber)
            .include_char('-')
            .build()
            .unwrap();
        assert!(subset.contains_char('7'));
        assert!(subset.contains_char('٣')); // ARABIC-INDIC DIGIT THREE
        assert!(subset.contains_char('-'));
        assert!(!subset.contains_char('x'));
        assert_eq!(vec![UnicodeCategory::DecimalNumber], subset.category_list());
    }

    #[test]
    fn test_excluding_category_from_ranges() {
        let subset = SubsetBuilder::new()
            .include_range(0x20, 0x7E)
            .exclude_category(UnicodeCategory::UppercaseLetter)
            .build()
            .unwrap();
        assert!(subset.contains_char('a'));
        assert!(!subset.contains_char('Q'));
    }

    #[test]
    fn test_excluding_code_point_inside_accepted_category() {
        let subset = SubsetBuilder::new()
            .include_category(UnicodeCategory::UppercaseLetter)
            .exclude_char('Q')
            .build()
            .unwrap();
        assert!(subset.contains_char('A'));
        assert!(subset.contains_char('Ω'));
        assert!(!subset.contains_char('Q'));
        assert_eq!(0, subset.categories());
    }

    #[test]
    fn test_invalid_range_is_a_build_error() {
        let err = SubsetBuilder::new()
            .include_range(0x50, 0x40)
            .build()
            .unwrap_err();
        assert_eq!(BuildError::InvalidCodePointRange { from: 0x50, to: 0x40 }, err);
        assert!(SubsetBuilder::new()
            .include_range(0, 0x110000)
            .build()
            .is_err());
    }

    #[test]
    fn test_representations_agree() {
        let ranged = scattered();
        let hashed = ranged.to_hashed(13);
        let optimal = ranged.to_optimal_hashed().expect("collision-free bucket count");
        assert_eq!(SubsetRepresentation::Hashed, hashed.representation());
        assert_eq!(SubsetRepresentation::OptimalHashed, optimal.representation());
        for cp in 0..=0x20000u32 {
            let expected = ranged.contains(cp);
            assert_eq!(expected, hashed.contains(cp), "hashed {:#x}", cp);
            assert_eq!(expected, optimal.contains(cp), "optimal {:#x}", cp);
        }
        assert_eq!(ranges_of(&ranged), ranges_of(&hashed));
        assert_eq!(ranges_of(&ranged), ranges_of(&optimal));
        assert_eq!(ranges_of(&ranged), ranges_of(&optimal.to_ranged()));
    }

    #[test]
    fn test_optimiser_hashes_scattered_subset() {
        let optimised = scattered().optimised();
        assert_ne!(SubsetRepresentation::Ranged, optimised.representation());
        assert!(optimised.contains(0x2000 + 3));
        assert!(!optimised.contains(0x2000 + 4));
        assert!(optimised.contains(0x1F3AB));
    }

    #[test]
    fn test_include_subset() {
        let digits = SubsetBuilder::new().include_char_range('0', '9').build().unwrap();
        let hex = SubsetBuilder::new()
            .include_subset(&digits)
            .include_char_range('A', 'F')
            .exclude_subset(&SubsetBuilder::new().include_char('5').build().unwrap())
            .build()
            .unwrap();
        assert_eq!(vec![(0x30, 0x34), (0x36, 0x39), (0x41, 0x46)], ranges_of(&hex));
    }

    #[test]
    fn test_data_structure_string() {
        let subset = SubsetBuilder::new()
            .include_char_range('A', 'Z')
            .include_range(0x391, 0x3A9)
            .build_ranged()
            .unwrap();
        let text = subset.to_data_structure_string("GREEK");
        assert_eq!(
            "GREEK_SINGLE_BYTE_RANGES: [u16; 1] = [\n    0x415a,\n];\n\
             GREEK_DOUBLE_BYTE_RANGES: [u32; 1] = [\n    0x039103a9,\n];\n",
            text
        );
    }

    #[test]
    fn test_debug_fmt() {
        let subset = SubsetBuilder::new()
            .include_char_range('a', 'c')
            .include_category(UnicodeCategory::DashPunctuation)
            .build()
            .unwrap();
        assert_eq!("Subset(Ranged, [97..=99], [\"Pd\"])", format!("{:?}", subset));
    }
}
