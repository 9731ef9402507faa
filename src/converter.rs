use crate::category::category_of;
use crate::error::BuildError;
use crate::int_map::{IntArrayMap, IntArrayMapBuilder};
use crate::sequence_arena::SequenceArena;
use crate::UnicodeCategory;
use smallvec::SmallVec;
use std::fmt;

const ROOT: u32 = 0;

/// An immutable table of code point substitutions.
///
/// A converter either maps single code points (the direct variant, an O(1)
/// lookup) or, once any multi-code-point source is registered, walks an
/// n-ary trie of source sequences (the sequence variant). Both fall back to
/// a per-category substitution when no code point rule applies.
#[derive(Clone, Default)]
pub struct Converter {
    repr: ConverterRepr,
    categories: IntArrayMap,
}

#[derive(Clone)]
enum ConverterRepr {
    Direct(IntArrayMap),
    Sequence(Trie),
}

impl Default for ConverterRepr {
    fn default() -> Self {
        ConverterRepr::Direct(IntArrayMap::default())
    }
}

#[derive(Clone, Default)]
struct TrieNode {
    /// Sorted by code point.
    children: SmallVec<[(u32, u32); 4]>,
    /// Index into the trie arena when a source sequence ends here.
    replacement: Option<u32>,
}

#[derive(Clone)]
struct Trie {
    nodes: Box<[TrieNode]>,
    arena: SequenceArena,
}

impl Trie {
    #[inline]
    fn child(&self, node: u32, code_point: u32) -> Option<u32> {
        let children = &self.nodes[node as usize].children;
        children
            .binary_search_by_key(&code_point, |&(cp, _)| cp)
            .ok()
            .map(|pos| children[pos].1)
    }

    /// Finds the substitutions to apply, anchored left to right.
    ///
    /// Every step re-anchors the root at the current position and advances
    /// all partial matches ("nodes in play"). The earliest-starting match
    /// wins, and among matches with that start the longest one; a match is
    /// committed once no partial match starting at or before it remains.
    fn find_matches(&self, input: &[char]) -> Vec<SequenceMatch> {
        let mut matches = Vec::new();
        let mut in_play: SmallVec<[(usize, u32); 8]> = SmallVec::new();
        let mut best: Option<SequenceMatch> = None;
        let mut pos = 0;
        while pos < input.len() {
            let code_point = input[pos] as u32;
            in_play.push((pos, ROOT));
            let mut k = in_play.len();
            while k > 0 {
                k -= 1;
                let (start, node) = in_play[k];
                let child = match self.child(node, code_point) {
                    Some(child) => child,
                    None => {
                        in_play.remove(k);
                        continue;
                    }
                };
                let child_node = &self.nodes[child as usize];
                if let Some(replacement) = child_node.replacement {
                    if best.map_or(true, |b| start <= b.start) {
                        best = Some(SequenceMatch {
                            start,
                            end: pos + 1,
                            replacement,
                        });
                    }
                }
                if child_node.children.is_empty() {
                    in_play.remove(k);
                } else {
                    in_play[k].1 = child;
                }
            }
            pos += 1;

            if let Some(b) = best {
                in_play.retain(|&mut (start, _)| start <= b.start);
                if in_play.is_empty() || pos == input.len() {
                    matches.push(b);
                    best = None;
                    in_play.clear();
                    pos = b.end;
                }
            }
        }
        matches
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct SequenceMatch {
    start: usize,
    end: usize,
    replacement: u32,
}

impl Converter {
    /// Returns a builder for a new converter.
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    /// Whether no rule at all is registered.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && match &self.repr {
                ConverterRepr::Direct(map) => map.is_empty(),
                ConverterRepr::Sequence(trie) => trie.nodes[ROOT as usize].children.is_empty(),
            }
    }

    /// Whether multi-code-point sources are registered.
    pub fn is_sequence_converter(&self) -> bool {
        matches!(self.repr, ConverterRepr::Sequence(_))
    }

    /// The replacement for a lone code point, if any.
    pub fn conversion_for(&self, code_point: u32) -> Option<&[u32]> {
        let direct = match &self.repr {
            ConverterRepr::Direct(map) => map.get(code_point as i32),
            ConverterRepr::Sequence(trie) => trie
                .child(ROOT, code_point)
                .and_then(|node| trie.nodes[node as usize].replacement)
                .map(|idx| trie.arena.get(idx)),
        };
        direct.or_else(|| self.category_conversion(code_point))
    }

    /// Whether a lone code point has a replacement.
    pub fn is_code_point_conversion_required(&self, code_point: u32) -> bool {
        self.conversion_for(code_point).is_some()
    }

    #[inline]
    fn category_conversion(&self, code_point: u32) -> Option<&[u32]> {
        if self.categories.is_empty() {
            return None;
        }
        self.categories.get(category_of(code_point).ordinal() as i32)
    }

    /// Prepares the substitutions for one input.
    ///
    /// The scan holds all per-call state, so one converter can serve any
    /// number of concurrent callers.
    pub fn scan(&self, input: &[char]) -> ConversionScan<'_> {
        let matches = match &self.repr {
            ConverterRepr::Direct(_) => Vec::new(),
            ConverterRepr::Sequence(trie) => trie.find_matches(input),
        };
        ConversionScan {
            converter: self,
            matches,
            next_match: 0,
        }
    }

    /// Applies every substitution to `input`; other characters pass through.
    pub fn convert(&self, input: &str) -> String {
        let chars: Vec<char> = input.chars().collect();
        let mut scan = self.scan(&chars);
        let mut out = String::with_capacity(input.len());
        let mut idx = 0;
        while idx < chars.len() {
            match scan.conversion_for(idx, chars[idx] as u32) {
                Some((replacement, consumed)) => {
                    out.extend(replacement.iter().filter_map(|&cp| char::from_u32(cp)));
                    idx += consumed;
                }
                None => {
                    out.push(chars[idx]);
                    idx += 1;
                }
            }
        }
        out
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ConverterRepr::Direct(map) => write!(f, "Converter(Direct, {} code points", map.len())?,
            ConverterRepr::Sequence(trie) => {
                write!(f, "Converter(Sequence, {} trie nodes", trie.nodes.len())?
            }
        }
        write!(f, ", {} categories)", self.categories.len())
    }
}

/// The substitutions of one input, produced by [`Converter::scan`].
#[derive(Debug)]
pub struct ConversionScan<'a> {
    converter: &'a Converter,
    matches: Vec<SequenceMatch>,
    next_match: usize,
}

impl<'a> ConversionScan<'a> {
    /// The replacement starting at `index` and how many input code points it
    /// consumes. Positions must be queried in ascending order.
    pub fn conversion_at(&mut self, index: usize) -> Option<(&'a [u32], usize)> {
        while self.next_match < self.matches.len() && self.matches[self.next_match].start < index {
            self.next_match += 1;
        }
        if let ConverterRepr::Sequence(trie) = &self.converter.repr {
            if let Some(m) = self.matches.get(self.next_match) {
                if m.start == index {
                    self.next_match += 1;
                    return Some((trie.arena.get(m.replacement), m.end - m.start));
                }
            }
        }
        None
    }

    /// Like [`ConversionScan::conversion_at`], then falls back to the
    /// single code point and category rules for `code_point`.
    pub fn conversion_for(&mut self, index: usize, code_point: u32) -> Option<(&'a [u32], usize)> {
        if let Some(found) = self.conversion_at(index) {
            return Some(found);
        }
        let converter = self.converter;
        let single = match &converter.repr {
            ConverterRepr::Direct(map) => map.get(code_point as i32),
            // Single code point rules are trie leaves, already in `matches`.
            ConverterRepr::Sequence(_) => None,
        };
        single
            .or_else(|| converter.category_conversion(code_point))
            .map(|replacement| (replacement, 1))
    }
}

/// Collects substitution rules, then compiles a [`Converter`].
///
/// A later rule for the same source replaces an earlier one. A rule naming
/// a surrogate or a value above U+10FFFF is dropped and reported by
/// [`build`].
///
/// [`build`]: ConverterBuilder::build
#[derive(Clone, Debug, Default)]
pub struct ConverterBuilder {
    code_points: IntArrayMapBuilder,
    sequences: Vec<(Vec<u32>, Vec<u32>)>,
    categories: IntArrayMapBuilder,
    error: Option<BuildError>,
}

impl ConverterBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn checked_code_points(&mut self, code_points: &[u32]) -> bool {
        match code_points.iter().find(|&&cp| char::from_u32(cp).is_none()) {
            Some(&bad) => {
                if self.error.is_none() {
                    self.error = Some(BuildError::InvalidCodePointRange { from: bad, to: bad });
                }
                false
            }
            None => true,
        }
    }

    pub(crate) fn add_code_point(&mut self, from: u32, to: &[u32]) {
        if self.checked_code_points(&[from]) && self.checked_code_points(to) {
            self.code_points.insert(from as i32, to);
        }
    }

    pub(crate) fn add_sequence(&mut self, from: &[u32], to: &[u32]) {
        if !self.checked_code_points(from) || !self.checked_code_points(to) {
            return;
        }
        match from {
            [] => {}
            [single] => self.add_code_point(*single, to),
            _ => {
                self.sequences.retain(|(existing, _)| existing != from);
                self.sequences.push((from.to_vec(), to.to_vec()));
            }
        }
    }

    pub(crate) fn add_category(&mut self, category: UnicodeCategory, to: &[u32]) {
        if self.checked_code_points(to) {
            self.categories.insert(category.ordinal() as i32, to);
        }
    }

    /// Replaces one code point with a sequence.
    pub fn convert_code_point(mut self, from: u32, to: &[u32]) -> Self {
        self.add_code_point(from, to);
        self
    }

    /// Replaces one character with a string (possibly empty).
    pub fn convert_char(mut self, from: char, to: &str) -> Self {
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.add_code_point(from as u32, &to);
        self
    }

    /// Replaces a character sequence with a string.
    pub fn convert_sequence(mut self, from: &str, to: &str) -> Self {
        let from: Vec<u32> = from.chars().map(u32::from).collect();
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.add_sequence(&from, &to);
        self
    }

    /// Replaces every member of a general category that has no code point rule.
    pub fn convert_category(mut self, category: UnicodeCategory, to: &str) -> Self {
        let to: Vec<u32> = to.chars().map(u32::from).collect();
        self.add_category(category, &to);
        self
    }

    /// Compiles the rules, or reports the first invalid code point.
    pub fn build(self) -> Result<Converter, BuildError> {
        let ConverterBuilder {
            code_points,
            sequences,
            categories,
            error,
        } = self;
        if let Some(e) = error {
            return Err(e);
        }
        let categories = categories.build();
        if sequences.is_empty() {
            let map = code_points.build();
            tracing::debug!(
                code_points = map.len(),
                categories = categories.len(),
                "built direct converter"
            );
            return Ok(Converter {
                repr: ConverterRepr::Direct(map),
                categories,
            });
        }

        let mut nodes = vec![TrieNode::default()];
        let mut arena = SequenceArena::default();
        let rules = code_points
            .iter()
            .map(|(from, to)| (vec![from as u32], to.to_vec()))
            .chain(sequences);
        for (from, to) in rules {
            let mut node = ROOT;
            for &cp in &from {
                let children = &nodes[node as usize].children;
                node = match children.binary_search_by_key(&cp, |&(c, _)| c) {
                    Ok(pos) => children[pos].1,
                    Err(pos) => {
                        let child = nodes.len() as u32;
                        nodes[node as usize].children.insert(pos, (cp, child));
                        nodes.push(TrieNode::default());
                        child
                    }
                };
            }
            nodes[node as usize].replacement = Some(arena.append(&to));
        }
        arena.shrink_to_fit();
        tracing::debug!(
            trie_nodes = nodes.len(),
            categories = categories.len(),
            "built sequence converter"
        );
        Ok(Converter {
            repr: ConverterRepr::Sequence(Trie {
                nodes: nodes.into_boxed_slice(),
                arena,
            }),
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ConverterBuilder;
    use crate::{BuildError, UnicodeCategory};

    fn trie_converter() -> super::Converter {
        ConverterBuilder::new()
            .convert_sequence("abc", "")
            .convert_sequence("abcd", "xyz")
            .convert_sequence("abef", "tuv")
            .convert_char('a', "b")
            .build()
            .unwrap()
    }

    #[test]
    fn test_longest_match_from_earliest_start() {
        let converter = trie_converter();
        assert!(converter.is_sequence_converter());
        assert_eq!("xyz", converter.convert("abcd"));
        assert_eq!("tuv", converter.convert("abef"));
        assert_eq!("bce", converter.convert("ace"));
        assert_eq!("", converter.convert("abc"));
        assert_eq!("bb", converter.convert("ab"));
        assert_eq!("xyzxyz", converter.convert("abcdabcd"));
        assert_eq!("qxyzq", converter.convert("qabcdq"));
    }

    #[test]
    fn test_earlier_start_beats_longer_later_match() {
        let converter = ConverterBuilder::new()
            .convert_sequence("ab", "1")
            .convert_sequence("bcd", "2")
            .build()
            .unwrap();
        assert_eq!("1cd", converter.convert("abcd"));
        assert_eq!("2", converter.convert("bcd"));
    }

    #[test]
    fn test_match_inside_abandoned_candidate() {
        let converter = ConverterBuilder::new()
            .convert_sequence("abcx", "1")
            .convert_sequence("bc", "2")
            .build()
            .unwrap();
        assert_eq!("a2d", converter.convert("abcd"));
        assert_eq!("1", converter.convert("abcx"));
    }

    #[test]
    fn test_direct_converter() {
        let converter = ConverterBuilder::new()
            .convert_char('ß', "ss")
            .convert_char('-', "")
            .build()
            .unwrap();
        assert!(!converter.is_sequence_converter());
        assert_eq!("strasse", converter.convert("stra-ße"));
        assert!(converter.is_code_point_conversion_required('ß' as u32));
        assert!(!converter.is_code_point_conversion_required('s' as u32));
    }

    #[test]
    fn test_category_fallback() {
        let converter = ConverterBuilder::new()
            .convert_category(UnicodeCategory::DashPunctuation, "-")
            .convert_char('\u{2014}', "--")
            .build()
            .unwrap();
        assert_eq!("a-b-c--d", converter.convert("a\u{2010}b\u{2013}c\u{2014}d"));
        assert_eq!(Some(&['-' as u32][..]), converter.conversion_for(0x2011));
    }

    #[test]
    fn test_category_fallback_with_trie() {
        let converter = ConverterBuilder::new()
            .convert_sequence("--", "\u{2014}")
            .convert_category(UnicodeCategory::DashPunctuation, "-")
            .build()
            .unwrap();
        assert_eq!("a\u{2014}b-c", converter.convert("a--b\u{2013}c"));
    }

    #[test]
    fn test_later_rule_wins() {
        let converter = ConverterBuilder::new()
            .convert_sequence("ab", "1")
            .convert_sequence("ab", "2")
            .build()
            .unwrap();
        assert_eq!("2", converter.convert("ab"));
    }

    #[test]
    fn test_rejects_invalid_code_points() {
        let err = ConverterBuilder::new()
            .convert_code_point('x' as u32, &[0xD800, 'y' as u32, 0x110000])
            .build()
            .unwrap_err();
        assert_eq!(BuildError::InvalidCodePointRange { from: 0xD800, to: 0xD800 }, err);

        let err = ConverterBuilder::new()
            .convert_char('a', "b")
            .convert_code_point(0x110000, &['z' as u32])
            .convert_code_point('q' as u32, &[0xDFFF])
            .build()
            .unwrap_err();
        assert_eq!(
            BuildError::InvalidCodePointRange { from: 0x110000, to: 0x110000 },
            err
        );
    }

    #[test]
    fn test_empty_converter() {
        let converter = ConverterBuilder::new().build().unwrap();
        assert!(converter.is_empty());
        assert_eq!("abc", converter.convert("abc"));
    }
}
