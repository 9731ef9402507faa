//! Chooses the storage layout of a compiled [`Subset`](crate::Subset).
//!
//! Code points are split into a block key (`cp >> 8`) and an 8-bit offset.
//! A hashed layout maps each block key to the single-byte ranges inside that
//! block. The optimiser simulates hashing the block keys into a range of
//! bucket counts and compares the modelled memory cost of the best hashed
//! layout against the flat sorted-range layout.

use smallvec::SmallVec;

pub(crate) const BLOCK_SHIFT: u32 = 8;
pub(crate) const OFFSET_MASK: u32 = 0xFF;

/// At or below this many block keys hashing never pays off.
const MAX_BLOCK_KEYS_FOR_RANGED: usize = 2;
/// At or below this many ranges a binary search is always cheaper.
const MAX_RANGES_FOR_RANGED: usize = 32;

const BUCKET_UPPER_FACTOR: f64 = 2.6;
const BUCKET_LOWER_FACTOR: f64 = 0.7;

const ARRAY_REFERENCE_BYTES: u64 = 8;
const ARRAY_HEADER_BYTES: u64 = 16;

/// The ranges of a subset regrouped by block key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct BlockStatistics {
    /// Sorted by key; offsets are packed single-byte ranges.
    pub(crate) blocks: Vec<(u16, SmallVec<[u16; 4]>)>,
    pub(crate) range_count: usize,
    pub(crate) piece_count: usize,
}

impl BlockStatistics {
    /// Regroups sorted, disjoint `(from, to)` ranges by block key.
    pub(crate) fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut stats = BlockStatistics::default();
        for (from, to) in ranges {
            stats.range_count += 1;
            for key in (from >> BLOCK_SHIFT)..=(to >> BLOCK_SHIFT) {
                let block_start = key << BLOCK_SHIFT;
                let lo = from.max(block_start) & OFFSET_MASK;
                let hi = to.min(block_start | OFFSET_MASK) & OFFSET_MASK;
                let piece = ((lo as u16) << 8) | hi as u16;
                match stats.blocks.last_mut() {
                    Some((last_key, pieces)) if *last_key as u32 == key => pieces.push(piece),
                    _ => stats.blocks.push((key as u16, smallvec::smallvec![piece])),
                }
                stats.piece_count += 1;
            }
        }
        stats
    }

    pub(crate) fn key_count(&self) -> usize {
        self.blocks.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = u16> + '_ {
        self.blocks.iter().map(|(key, _)| *key)
    }
}

/// How many buckets hold 0, 1, 2, or 3+ block keys for one bucket count.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct BucketHistogram {
    pub(crate) bucket_count: usize,
    pub(crate) empty: usize,
    pub(crate) single: usize,
    pub(crate) double: usize,
    pub(crate) crowded: usize,
    /// Sum of `(keys - 1)^2` over buckets with more than one key.
    pub(crate) collision_penalty: u64,
}

impl BucketHistogram {
    pub(crate) fn simulate(keys: impl Iterator<Item = u16>, bucket_count: usize) -> Self {
        let mut per_bucket = vec![0u32; bucket_count];
        for key in keys {
            per_bucket[bucket_of(key, bucket_count)] += 1;
        }
        let mut histogram = BucketHistogram {
            bucket_count,
            ..Default::default()
        };
        for &n in &per_bucket {
            match n {
                0 => histogram.empty += 1,
                1 => histogram.single += 1,
                2 => histogram.double += 1,
                _ => histogram.crowded += 1,
            }
            if n > 1 {
                histogram.collision_penalty += u64::from(n - 1) * u64::from(n - 1);
            }
        }
        histogram
    }

    pub(crate) fn is_collision_free(&self) -> bool {
        self.double == 0 && self.crowded == 0
    }

    fn multi_key_buckets(&self) -> u64 {
        (self.double + self.crowded) as u64
    }
}

#[inline]
pub(crate) fn bucket_of(key: u16, bucket_count: usize) -> usize {
    (u32::from(key) & 0x7FFF_FFFF) as usize % bucket_count
}

/// The layout picked for a subset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    Ranged,
    Hashed { bucket_count: usize },
    OptimalHashed { bucket_count: usize },
}

/// Modelled byte cost of the flat layout, given range counts per tier.
pub(crate) fn ranged_cost(single: usize, double: usize, triple: usize) -> u64 {
    3 * (ARRAY_REFERENCE_BYTES + ARRAY_HEADER_BYTES)
        + 2 * single as u64
        + 4 * double as u64
        + 8 * triple as u64
}

/// Byte cost of the one-key-per-bucket layout: key slots, range offsets, ranges.
pub(crate) fn optimal_hashed_cost(bucket_count: usize, piece_count: usize) -> u64 {
    3 * (ARRAY_REFERENCE_BYTES + ARRAY_HEADER_BYTES)
        + 2 * bucket_count as u64
        + 4 * (bucket_count as u64 + 1)
        + 2 * piece_count as u64
}

/// Byte cost of the general hashed layout, with a penalty for crowded buckets.
pub(crate) fn hashed_cost(histogram: &BucketHistogram, key_count: usize, piece_count: usize) -> u64 {
    5 * (ARRAY_REFERENCE_BYTES + ARRAY_HEADER_BYTES)
        + 4 * (histogram.bucket_count as u64 + 1)
        + 2 * key_count as u64
        + 4 * (key_count as u64 + 1)
        + 2 * piece_count as u64
        + histogram.multi_key_buckets() * (ARRAY_REFERENCE_BYTES + ARRAY_HEADER_BYTES)
        + histogram.collision_penalty * ARRAY_REFERENCE_BYTES
}

fn upper_bucket_bound(key_count: usize) -> usize {
    (key_count as f64 * BUCKET_UPPER_FACTOR).ceil() as usize
}

fn lower_bucket_bound(key_count: usize) -> usize {
    ((key_count as f64 * BUCKET_LOWER_FACTOR).ceil() as usize).max(1)
}

/// First bucket count in `key_count..=⌈key_count × 2.6⌉` with no shared bucket.
pub(crate) fn find_optimal_bucket_count(stats: &BlockStatistics) -> Option<usize> {
    let key_count = stats.key_count();
    if key_count == 0 {
        return Some(1);
    }
    (key_count..=upper_bucket_bound(key_count))
        .find(|&n| BucketHistogram::simulate(stats.keys(), n).is_collision_free())
}

/// The cheapest general hashed layout in `⌈key_count × 0.7⌉..=⌈key_count × 2.6⌉`.
pub(crate) fn cheapest_hashed_bucket_count(stats: &BlockStatistics) -> (usize, u64) {
    let key_count = stats.key_count();
    (lower_bucket_bound(key_count)..=upper_bucket_bound(key_count).max(1))
        .map(|n| {
            let histogram = BucketHistogram::simulate(stats.keys(), n);
            (n, hashed_cost(&histogram, key_count, stats.piece_count))
        })
        .min_by_key(|&(n, cost)| (cost, n))
        .unwrap_or((1, u64::MAX))
}

/// The outcome of the cost comparison.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Choice {
    pub(crate) strategy: Strategy,
    pub(crate) ranged_cost: u64,
    pub(crate) hashed_cost: Option<u64>,
}

/// Picks the layout for a subset whose flat form has the given tier sizes.
pub(crate) fn choose(stats: &BlockStatistics, tier_sizes: (usize, usize, usize)) -> Choice {
    let ranged = ranged_cost(tier_sizes.0, tier_sizes.1, tier_sizes.2);
    if stats.key_count() <= MAX_BLOCK_KEYS_FOR_RANGED || stats.range_count <= MAX_RANGES_FOR_RANGED {
        return Choice {
            strategy: Strategy::Ranged,
            ranged_cost: ranged,
            hashed_cost: None,
        };
    }
    let (strategy, cost) = match find_optimal_bucket_count(stats) {
        Some(n) => (
            Strategy::OptimalHashed { bucket_count: n },
            optimal_hashed_cost(n, stats.piece_count),
        ),
        None => {
            let (n, cost) = cheapest_hashed_bucket_count(stats);
            (Strategy::Hashed { bucket_count: n }, cost)
        }
    };
    let strategy = if cost < ranged { strategy } else { Strategy::Ranged };
    Choice {
        strategy,
        ranged_cost: ranged,
        hashed_cost: Some(cost),
    }
}

#[cfg(test)]
mod tests {
    use super::{choose, find_optimal_bucket_count, BlockStatistics, BucketHistogram, Strategy};

    #[test]
    fn test_block_statistics_split_ranges_by_block() {
        let stats = BlockStatistics::from_ranges(vec![(0x41, 0x5A), (0xF0, 0x210), (0x300, 0x300)]);
        assert_eq!(3, stats.range_count);
        assert_eq!(5, stats.piece_count);
        let keys: Vec<u16> = stats.keys().collect();
        assert_eq!(vec![0, 1, 2, 3], keys);
        assert_eq!(&[0x415A, 0xF0FF][..], &stats.blocks[0].1[..]);
        assert_eq!(&[0x00FF][..], &stats.blocks[1].1[..]);
        assert_eq!(&[0x0010][..], &stats.blocks[2].1[..]);
        assert_eq!(&[0x0000][..], &stats.blocks[3].1[..]);
    }

    #[test]
    fn test_histogram() {
        let keys = [0u16, 4, 8, 1];
        let histogram = BucketHistogram::simulate(keys.iter().copied(), 4);
        assert_eq!(2, histogram.empty);
        assert_eq!(1, histogram.single);
        assert_eq!(0, histogram.double);
        assert_eq!(1, histogram.crowded);
        assert_eq!(4, histogram.collision_penalty);
        assert!(!histogram.is_collision_free());
    }

    #[test]
    fn test_small_subsets_stay_ranged() {
        let stats = BlockStatistics::from_ranges(vec![(0x41, 0x5A), (0x61, 0x7A)]);
        assert_eq!(Strategy::Ranged, choose(&stats, (2, 0, 0)).strategy);
    }

    #[test]
    fn test_sparse_blocks_prefer_hashing() {
        // 40 blocks, each holding eight scattered code points.
        let ranges: Vec<(u32, u32)> = (0..40u32)
            .flat_map(|block| {
                let base = 0x1000 + block * 0x100;
                [1u32, 5, 9, 13, 20, 30, 40, 50]
                    .into_iter()
                    .map(move |offset| (base + offset, base + offset))
            })
            .collect();
        let stats = BlockStatistics::from_ranges(ranges.iter().copied());
        assert_eq!(Some(40), find_optimal_bucket_count(&stats));
        let choice = choose(&stats, (0, ranges.len(), 0));
        assert_eq!(Strategy::OptimalHashed { bucket_count: 40 }, choice.strategy);
        assert!(choice.hashed_cost.unwrap() < choice.ranged_cost);
    }
}
