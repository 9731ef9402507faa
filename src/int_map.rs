//! Open-hashing maps from `i32` keys to `i32` values or code point sequences.
//!
//! The mutable builders hash into small per-bucket arrays and grow by
//! rehashing. `build()` then searches for a bucket count at which every key
//! lands in its own bucket; when one exists the result is a single flat pair
//! of arrays ("optimal"), otherwise the buckets are flattened into one key
//! array indexed through a bucket offset table.

use crate::packed_range::write_array_literal;
use crate::sequence_arena::SequenceArena;
use smallvec::SmallVec;
use std::fmt;

/// Marks an unused slot in an optimal map.
pub(crate) const EMPTY_KEY: i32 = i32::MIN;

const INITIAL_BUCKET_COUNT: usize = 11;
const LOAD_FACTOR: f64 = 0.75;
const OPTIMAL_SEARCH_FACTOR: usize = 4;

#[inline]
pub(crate) fn hash_index(key: i32, bucket_count: usize) -> usize {
    (key & 0x7FFF_FFFF) as usize % bucket_count
}

#[derive(Clone, Default)]
struct Bucket {
    keys: SmallVec<[i32; 2]>,
    values: SmallVec<[i32; 2]>,
}

/// A mutable `i32 → i32` open-hashing map.
#[derive(Clone)]
pub struct IntMapBuilder {
    buckets: Vec<Bucket>,
    size: usize,
    threshold: usize,
}

impl Default for IntMapBuilder {
    fn default() -> Self {
        Self::with_bucket_count(INITIAL_BUCKET_COUNT)
    }
}

impl IntMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with a given initial bucket count.
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        IntMapBuilder {
            buckets: vec![Bucket::default(); bucket_count],
            size: 0,
            threshold: threshold_for(bucket_count),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    pub fn insert(&mut self, key: i32, value: i32) -> Option<i32> {
        let idx = hash_index(key, self.buckets.len());
        let bucket = &mut self.buckets[idx];
        if let Some(pos) = bucket.keys.iter().position(|&k| k == key) {
            return Some(std::mem::replace(&mut bucket.values[pos], value));
        }
        bucket.keys.push(key);
        bucket.values.push(value);
        self.size += 1;
        if self.size > self.threshold {
            self.rehash();
        }
        None
    }

    /// Looks up `key`.
    pub fn get(&self, key: i32) -> Option<i32> {
        let bucket = &self.buckets[hash_index(key, self.buckets.len())];
        bucket
            .keys
            .iter()
            .position(|&k| k == key)
            .map(|pos| bucket.values[pos])
    }

    /// Iterates over all entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.buckets
            .iter()
            .flat_map(|b| b.keys.iter().copied().zip(b.values.iter().copied()))
    }

    fn rehash(&mut self) {
        let new_count = self.buckets.len() * 3 / 2 + 1;
        let old = std::mem::replace(&mut self.buckets, vec![Bucket::default(); new_count]);
        for bucket in old {
            for (key, value) in bucket.keys.into_iter().zip(bucket.values) {
                let idx = hash_index(key, new_count);
                self.buckets[idx].keys.push(key);
                self.buckets[idx].values.push(value);
            }
        }
        self.threshold = threshold_for(new_count);
    }

    /// Freezes the map, preferring a collision-free flat layout.
    pub fn build(self) -> IntMap {
        let keys: Vec<i32> = self.iter().map(|(k, _)| k).collect();
        let optimal = if keys.contains(&EMPTY_KEY) {
            None
        } else {
            find_collision_free_bucket_count(&keys, keys.len(), keys.len() * OPTIMAL_SEARCH_FACTOR)
        };
        let map = match optimal {
            Some(bucket_count) => {
                let mut slot_keys = vec![EMPTY_KEY; bucket_count];
                let mut slot_values = vec![0; bucket_count];
                for (key, value) in self.iter() {
                    let idx = hash_index(key, bucket_count);
                    slot_keys[idx] = key;
                    slot_values[idx] = value;
                }
                IntMap {
                    repr: IntMapRepr::Optimal {
                        keys: slot_keys.into_boxed_slice(),
                        values: slot_values.into_boxed_slice(),
                    },
                    len: self.size,
                }
            }
            None => {
                let mut bucket_starts = Vec::with_capacity(self.buckets.len() + 1);
                let mut flat_keys = Vec::with_capacity(self.size);
                let mut flat_values = Vec::with_capacity(self.size);
                bucket_starts.push(0u32);
                for bucket in &self.buckets {
                    flat_keys.extend_from_slice(&bucket.keys);
                    flat_values.extend_from_slice(&bucket.values);
                    bucket_starts.push(flat_keys.len() as u32);
                }
                IntMap {
                    repr: IntMapRepr::Bucketed {
                        bucket_starts: bucket_starts.into_boxed_slice(),
                        keys: flat_keys.into_boxed_slice(),
                        values: flat_values.into_boxed_slice(),
                    },
                    len: self.size,
                }
            }
        };
        tracing::debug!(
            entries = map.len,
            optimal = map.is_optimal(),
            buckets = map.bucket_count(),
            "built int map"
        );
        map
    }
}

impl fmt::Debug for IntMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn threshold_for(bucket_count: usize) -> usize {
    (bucket_count as f64 * LOAD_FACTOR) as usize
}

/// Tries bucket counts in `from..=to` and returns the first at which no two
/// keys share a bucket.
pub(crate) fn find_collision_free_bucket_count(
    keys: &[i32],
    from: usize,
    to: usize,
) -> Option<usize> {
    if keys.is_empty() {
        return Some(1);
    }
    let mut occupied = Vec::new();
    (from.max(1)..=to.max(1)).find(|&bucket_count| {
        occupied.clear();
        occupied.resize(bucket_count, false);
        keys.iter().all(|&key| {
            let idx = hash_index(key, bucket_count);
            !std::mem::replace(&mut occupied[idx], true)
        })
    })
}

/// An immutable `i32 → i32` map.
#[derive(Clone, PartialEq, Eq)]
pub struct IntMap {
    repr: IntMapRepr,
    len: usize,
}

#[derive(Clone, PartialEq, Eq)]
enum IntMapRepr {
    Optimal {
        keys: Box<[i32]>,
        values: Box<[i32]>,
    },
    Bucketed {
        bucket_starts: Box<[u32]>,
        keys: Box<[i32]>,
        values: Box<[i32]>,
    },
}

impl Default for IntMap {
    fn default() -> Self {
        IntMapBuilder::new().build()
    }
}

impl IntMap {
    /// Looks up `key`.
    #[inline]
    pub fn get(&self, key: i32) -> Option<i32> {
        match &self.repr {
            IntMapRepr::Optimal { keys, values } => {
                if keys.is_empty() || key == EMPTY_KEY {
                    return None;
                }
                let idx = hash_index(key, keys.len());
                if keys[idx] == key {
                    Some(values[idx])
                } else {
                    None
                }
            }
            IntMapRepr::Bucketed {
                bucket_starts,
                keys,
                values,
            } => {
                let bucket_count = bucket_starts.len() - 1;
                let idx = hash_index(key, bucket_count);
                let range = bucket_starts[idx] as usize..bucket_starts[idx + 1] as usize;
                keys[range.clone()]
                    .iter()
                    .position(|&k| k == key)
                    .map(|pos| values[range.start + pos])
            }
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: i32) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every key has a bucket of its own.
    pub fn is_optimal(&self) -> bool {
        matches!(self.repr, IntMapRepr::Optimal { .. })
    }

    /// Number of buckets (slots for the optimal layout).
    pub fn bucket_count(&self) -> usize {
        match &self.repr {
            IntMapRepr::Optimal { keys, .. } => keys.len(),
            IntMapRepr::Bucketed { bucket_starts, .. } => bucket_starts.len() - 1,
        }
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (keys, values) = match &self.repr {
            IntMapRepr::Optimal { keys, values } => (keys, values),
            IntMapRepr::Bucketed { keys, values, .. } => (keys, values),
        };
        keys.iter()
            .copied()
            .zip(values.iter().copied())
            .filter(|&(k, _)| k != EMPTY_KEY)
    }

    /// Renders the compiled arrays as labeled source literals.
    pub fn to_data_structure_string(&self, label: &str) -> String {
        let mut out = String::new();
        match &self.repr {
            IntMapRepr::Optimal { keys, values } => {
                write_array_literal(&mut out, &format!("{}_KEYS", label), "i32", 8, keys);
                write_array_literal(&mut out, &format!("{}_VALUES", label), "i32", 8, values);
            }
            IntMapRepr::Bucketed {
                bucket_starts,
                keys,
                values,
            } => {
                write_array_literal(
                    &mut out,
                    &format!("{}_BUCKET_STARTS", label),
                    "u32",
                    8,
                    bucket_starts,
                );
                write_array_literal(&mut out, &format!("{}_KEYS", label), "i32", 8, keys);
                write_array_literal(&mut out, &format!("{}_VALUES", label), "i32", 8, values);
            }
        }
        out
    }
}

impl fmt::Debug for IntMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntMap(")?;
        f.debug_map().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

/// A mutable `i32 → [u32]` map; sequences live in a shared arena.
#[derive(Clone, Default)]
pub struct IntArrayMapBuilder {
    index: IntMapBuilder,
    arena: SequenceArena,
}

impl IntArrayMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Inserts `sequence` under `key`, replacing any previous sequence.
    pub fn insert(&mut self, key: i32, sequence: &[u32]) {
        let idx = self.arena.append(sequence);
        self.index.insert(key, idx as i32);
    }

    /// Looks up `key`.
    pub fn get(&self, key: i32) -> Option<&[u32]> {
        self.index.get(key).map(|idx| self.arena.get(idx as u32))
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[u32])> + '_ {
        self.index
            .iter()
            .map(move |(key, idx)| (key, self.arena.get(idx as u32)))
    }

    /// Freezes the map. Sequences replaced during building are dropped.
    pub fn build(self) -> IntArrayMap {
        let mut arena = SequenceArena::default();
        let mut index = IntMapBuilder::with_bucket_count(self.index.bucket_count());
        for (key, sequence) in self.iter() {
            index.insert(key, arena.append(sequence) as i32);
        }
        arena.shrink_to_fit();
        IntArrayMap {
            index: index.build(),
            arena,
        }
    }
}

impl fmt::Debug for IntArrayMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// An immutable `i32 → [u32]` map.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IntArrayMap {
    index: IntMap,
    arena: SequenceArena,
}

impl IntArrayMap {
    /// Looks up `key`.
    #[inline]
    pub fn get(&self, key: i32) -> Option<&[u32]> {
        self.index
            .get(key)
            .filter(|&idx| self.arena.is_valid_idx(idx as u32))
            .map(|idx| self.arena.get(idx as u32))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether the key index is collision-free.
    pub fn is_optimal(&self) -> bool {
        self.index.is_optimal()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[u32])> + '_ {
        self.index
            .iter()
            .map(move |(key, idx)| (key, self.arena.get(idx as u32)))
    }
}

impl fmt::Debug for IntArrayMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntArrayMap(")?;
        f.debug_map().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::{find_collision_free_bucket_count, hash_index, IntArrayMapBuilder, IntMapBuilder};

    #[test]
    fn test_insert_get_replace() {
        let mut builder = IntMapBuilder::new();
        assert_eq!(None, builder.insert(0x41, 10));
        assert_eq!(None, builder.insert(0x61, 10));
        assert_eq!(Some(10), builder.insert(0x41, 11));
        assert_eq!(2, builder.len());
        assert_eq!(Some(11), builder.get(0x41));
        assert_eq!(None, builder.get(0x42));
    }

    #[test]
    fn test_rehash_keeps_entries() {
        let mut builder = IntMapBuilder::new();
        for key in 0..1000 {
            builder.insert(key * 7, key);
        }
        assert!(builder.bucket_count() > 11);
        for key in 0..1000 {
            assert_eq!(Some(key), builder.get(key * 7));
        }
    }

    #[test]
    fn test_build_optimal() {
        let mut builder = IntMapBuilder::new();
        for (digit, ch) in "0123456789ABCDEF".chars().enumerate() {
            builder.insert(ch as i32, digit as i32);
        }
        let map = builder.build();
        assert!(map.is_optimal());
        assert_eq!(16, map.len());
        assert_eq!(Some(15), map.get('F' as i32));
        assert_eq!(Some(0), map.get('0' as i32));
        assert_eq!(None, map.get('G' as i32));
        assert_eq!(None, map.get(i32::MIN));
        assert_eq!(16, map.iter().count());
    }

    #[test]
    fn test_build_bucketed_when_no_perfect_count() {
        // Keys congruent modulo every candidate bucket count in 2..=8.
        let mut builder = IntMapBuilder::new();
        builder.insert(0, 1);
        builder.insert(840, 2);
        let map = builder.build();
        assert!(!map.is_optimal());
        assert_eq!(Some(1), map.get(0));
        assert_eq!(Some(2), map.get(840));
        assert_eq!(None, map.get(1));
    }

    #[test]
    fn test_find_collision_free_bucket_count() {
        let keys = [0, 3, 6];
        let found = find_collision_free_bucket_count(&keys, 3, 12).unwrap();
        assert_eq!(4, found);
        let mut seen = std::collections::HashSet::new();
        for &k in &keys {
            assert!(seen.insert(hash_index(k, found)));
        }
    }

    #[test]
    fn test_empty_map() {
        let map = IntMapBuilder::new().build();
        assert!(map.is_empty());
        assert_eq!(None, map.get(0));
    }

    #[test]
    fn test_array_map() {
        let mut builder = IntArrayMapBuilder::new();
        builder.insert('-' as i32, &['_' as u32]);
        builder.insert('ß' as i32, &['s' as u32, 's' as u32]);
        builder.insert('-' as i32, &['~' as u32]);
        let map = builder.build();
        assert_eq!(2, map.len());
        assert_eq!(Some(&['~' as u32][..]), map.get('-' as i32));
        assert_eq!(Some(&['s' as u32, 's' as u32][..]), map.get('ß' as i32));
        assert_eq!(None, map.get('x' as i32));
    }

    #[test]
    fn test_data_structure_string() {
        let mut builder = IntMapBuilder::new();
        builder.insert(1, 2);
        let text = builder.build().to_data_structure_string("DIGITS");
        assert!(text.starts_with("DIGITS_KEYS: [i32; 1] = [\n    0x00000001,\n];\n"));
        assert!(text.contains("DIGITS_VALUES: [i32; 1] = [\n    0x00000002,\n];\n"));
    }
}
