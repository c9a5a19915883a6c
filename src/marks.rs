//! Node marker set used as scratch space during cycle decomposition.
//!
//! One bit per node, packed into `u64` words. The set has a fixed size (the
//! number of graph nodes); marking a node out of range is a bug.

#[derive(Debug, Clone)]
pub struct Marks {
    words: Vec<u64>,
    size: usize,
    /// Number of marked nodes (cached for O(1) `count()`).
    count: usize,
}

impl Marks {
    const BITS_PER_WORD: usize = 64;

    /// Creates an all-unmarked set for nodes `0..size`.
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(Self::BITS_PER_WORD)],
            size,
            count: 0,
        }
    }

    #[inline]
    fn word_and_bit(node: usize) -> (usize, u64) {
        (node / Self::BITS_PER_WORD, 1u64 << (node % Self::BITS_PER_WORD))
    }

    /// Number of nodes the set covers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of marked nodes.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns true if no node is marked.
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_marked(&self, node: usize) -> bool {
        debug_assert!(node < self.size, "node {} out of range {}", node, self.size);
        let (word, mask) = Self::word_and_bit(node);
        self.words[word] & mask != 0
    }

    /// Marks a node. Returns true if it was not marked before.
    #[inline]
    pub fn mark(&mut self, node: usize) -> bool {
        debug_assert!(node < self.size, "node {} out of range {}", node, self.size);
        let (word, mask) = Self::word_and_bit(node);
        let was_clear = self.words[word] & mask == 0;
        if was_clear {
            self.words[word] |= mask;
            self.count += 1;
        }
        was_clear
    }

    /// Unmarks a node. Returns true if it was marked before.
    #[inline]
    pub fn unmark(&mut self, node: usize) -> bool {
        debug_assert!(node < self.size, "node {} out of range {}", node, self.size);
        let (word, mask) = Self::word_and_bit(node);
        let was_set = self.words[word] & mask != 0;
        if was_set {
            self.words[word] &= !mask;
            self.count -= 1;
        }
        was_set
    }

    /// Unmarks the given nodes only; cheaper than [`Marks::clear`] for sparse use.
    pub fn unmark_all(&mut self, nodes: impl IntoIterator<Item = usize>) {
        for node in nodes {
            self.unmark(node);
        }
    }

    /// Unmarks everything.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.count = 0;
    }
}
