use std::{convert::TryFrom, fmt};

/// Append-only storage for many short code point sequences.
///
/// All sequences share one data store; sequence `i` occupies
/// `data[startpos[i]..startpos[i + 1]]`.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct SequenceArena {
    startpos_list: Vec<u32>,
    data_store: Vec<u32>,
}

impl Default for SequenceArena {
    fn default() -> Self {
        SequenceArena {
            startpos_list: vec![0],
            data_store: Vec::default(),
        }
    }
}

impl SequenceArena {
    pub(crate) fn len(&self) -> usize {
        self.startpos_list.len() - 1
    }

    pub(crate) fn is_valid_idx(&self, idx: u32) -> bool {
        (idx as usize) < self.len()
    }

    /// Appends a sequence and returns its index.
    pub(crate) fn append(&mut self, sequence: &[u32]) -> u32 {
        let idx = u32::try_from(self.len()).expect("sequence arena index overflow");
        self.data_store.extend_from_slice(sequence);
        let end = u32::try_from(self.data_store.len()).expect("sequence arena data overflow");
        self.startpos_list.push(end);
        idx
    }

    pub(crate) fn get(&self, idx: u32) -> &[u32] {
        let idx = idx as usize;
        let start = self.startpos_list[idx] as usize;
        let end = self.startpos_list[idx + 1] as usize;
        &self.data_store[start..end]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.startpos_list
            .windows(2)
            .map(move |w| &self.data_store[w[0] as usize..w[1] as usize])
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.startpos_list.shrink_to_fit();
        self.data_store.shrink_to_fit();
    }
}

impl fmt::Debug for SequenceArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceArena(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceArena;

    #[test]
    fn test_append_and_get() {
        let mut arena = SequenceArena::default();
        assert_eq!(0, arena.len());
        let a = arena.append(&[0x41, 0x42]);
        let empty = arena.append(&[]);
        let c = arena.append(&[0x1F600]);
        assert_eq!((0, 1, 2), (a, empty, c));
        assert_eq!(&[0x41, 0x42], arena.get(a));
        assert!(arena.get(empty).is_empty());
        assert_eq!(&[0x1F600], arena.get(c));
        assert!(arena.is_valid_idx(2));
        assert!(!arena.is_valid_idx(3));
        assert_eq!(3, arena.iter().count());
    }
}
