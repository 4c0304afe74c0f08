use foundation::FeatureId;

/// Set of features backed by a bitset, e.g. the wellbores currently
/// multi-highlighted at a root or the selected ones.
///
/// Ordering contract:
/// - Iteration yields ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    words: Vec<u64>,
    len: usize,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = FeatureId>) -> Self {
        let mut s = Self::default();
        for id in ids {
            s.insert(id);
        }
        s
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        let (word, bit) = word_bit(id);
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: FeatureId) -> bool {
        let (word, bit) = word_bit(id);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: FeatureId) -> bool {
        let (word, bit) = word_bit(id);
        let Some(w) = self.words.get_mut(word) else {
            return false;
        };
        let mask = 1u64 << bit;
        if (*w & mask) == 0 {
            return false;
        }
        *w &= !mask;
        self.len -= 1;
        true
    }

    /// Ids in `self` but not in `other`.
    pub fn diff(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (idx, ow) in other.words.iter().enumerate() {
            if let Some(w) = out.words.get_mut(idx) {
                *w &= !ow;
            }
        }
        out.len = out.words.iter().map(|w| w.count_ones() as usize).sum();
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let base = (word_index as u32) * 64;
            BitIter(word).map(move |bit| FeatureId(base + bit))
        })
    }
}

fn word_bit(id: FeatureId) -> (usize, u32) {
    ((id.0 / 64) as usize, id.0 % 64)
}

struct BitIter(u64);

impl Iterator for BitIter {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let tz = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(tz)
    }
}
