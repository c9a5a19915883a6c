//! Ordered partitions of graph nodes and their refinement.
//!
//! A partition is stored as a sequence of nodes (`lab`) cut into contiguous
//! cells. A cell is identified by the position of its first node, which never
//! changes when the cell is split: the first fragment keeps the start.
//!
//! Every split is recorded on a trail, so the search can go back to an earlier
//! partition with [`Partition::undo`] instead of keeping copies. Undoing only
//! moves cell boundaries back; the order of nodes inside a cell may differ from
//! what it was before.
//!
//! Refinement only looks at cell positions and neighbor counts, never at node
//! numbers, so refining the images of a partition under an automorphism gives
//! the image of the refined partition, with the same trail of splits. The
//! search relies on this.

use std::collections::VecDeque;

use crate::graph::ColoredGraph;

/// Which non-singleton cell to individualize next.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TargetCell {
    /// The first non-singleton cell.
    #[default]
    First,
    /// The first among the smallest non-singleton cells.
    Smallest,
    /// The first among the largest cells.
    Largest,
}

/// The cell starting at `start` was split off the cell starting at `parent`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Split {
    pub parent: usize,
    pub start: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Partition {
    /// Nodes in cell order.
    lab: Vec<usize>,
    /// Position of every node in `lab`.
    pos: Vec<usize>,
    /// Cell start of every node.
    cell_of: Vec<usize>,
    /// End (exclusive) of the cell starting at a position; stale elsewhere.
    cell_end: Vec<usize>,
    num_cells: usize,
    trail: Vec<Split>,
}

impl Partition {
    /// Unit partition refined by node colors, cells ordered by color.
    pub fn from_colors(colors: &[usize]) -> Self {
        let n = colors.len();
        let mut lab: Vec<usize> = (0..n).collect();
        lab.sort_by_key(|&v| colors[v]);
        let mut pos = vec![0; n];
        for (i, &v) in lab.iter().enumerate() {
            pos[v] = i;
        }

        let mut partition = Self {
            lab,
            pos,
            cell_of: vec![0; n],
            cell_end: vec![0; n],
            num_cells: 0,
            trail: Vec::new(),
        };
        let mut start = 0;
        for i in 1..=n {
            if i == n || colors[partition.lab[i]] != colors[partition.lab[start]] {
                partition.cell_end[start] = i;
                for j in start..i {
                    partition.cell_of[partition.lab[j]] = start;
                }
                partition.num_cells += 1;
                start = i;
            }
        }
        partition
    }

    pub fn len(&self) -> usize {
        self.lab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lab.is_empty()
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn is_discrete(&self) -> bool {
        self.num_cells == self.lab.len()
    }

    /// Nodes in cell order; for a discrete partition this is the leaf labeling.
    pub fn lab(&self) -> &[usize] {
        &self.lab
    }

    /// Nodes of the cell starting at `start`.
    pub fn cell(&self, start: usize) -> &[usize] {
        &self.lab[start..self.cell_end[start]]
    }

    /// Start of the cell containing `v`.
    pub fn cell_of(&self, v: usize) -> usize {
        self.cell_of[v]
    }

    /// Start positions of all cells, in order.
    pub fn cell_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.num_cells);
        let mut start = 0;
        while start < self.lab.len() {
            starts.push(start);
            start = self.cell_end[start];
        }
        starts
    }

    /// Start of the cell to individualize next, or `None` if discrete.
    pub fn target_cell(&self, strategy: TargetCell) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        let mut start = 0;
        while start < self.lab.len() {
            let end = self.cell_end[start];
            let size = end - start;
            if size > 1 {
                let better = match (strategy, best) {
                    (_, None) => true,
                    (TargetCell::First, Some(_)) => false,
                    (TargetCell::Smallest, Some((_, best_size))) => size < best_size,
                    (TargetCell::Largest, Some((_, best_size))) => size > best_size,
                };
                if better {
                    best = Some((start, size));
                    if strategy == TargetCell::First {
                        break;
                    }
                }
            }
            start = end;
        }
        best.map(|(start, _)| start)
    }

    /// Splits recorded so far, oldest first.
    pub fn splits(&self) -> &[Split] {
        &self.trail
    }

    /// Current length of the trail, to [`undo`](Partition::undo) back to later.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Merges back every split made after `mark`.
    pub fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(split) = self.trail.pop() else { break };
            let end = self.cell_end[split.start];
            self.cell_end[split.parent] = end;
            for &v in &self.lab[split.start..end] {
                self.cell_of[v] = split.parent;
            }
            self.num_cells -= 1;
        }
    }

    /// Splits `v` off its cell into a singleton placed last. Returns its position.
    pub fn individualize(&mut self, v: usize) -> usize {
        let start = self.cell_of[v];
        let end = self.cell_end[start];
        debug_assert!(end - start > 1, "node {} is already a singleton", v);
        if end - start < 2 {
            return start;
        }
        self.swap_to(v, end - 1);
        self.split_off(start, end - 1);
        end - 1
    }

    /// Moves `v` to position `i`, swapping with the node there.
    fn swap_to(&mut self, v: usize, i: usize) {
        let j = self.pos[v];
        let u = self.lab[i];
        self.lab.swap(i, j);
        self.pos[v] = i;
        self.pos[u] = j;
    }

    /// Cuts the cell starting at `parent` at position `start`.
    fn split_off(&mut self, parent: usize, start: usize) {
        let end = self.cell_end[parent];
        self.cell_end[parent] = start;
        self.cell_end[start] = end;
        for &v in &self.lab[start..end] {
            self.cell_of[v] = start;
        }
        self.num_cells += 1;
        self.trail.push(Split { parent, start });
    }
}

/// Scratch space for refinement, reused across calls.
///
/// All buffers are back to their clear state whenever [`Refiner::refine`] returns.
#[derive(Debug, Clone, Default)]
pub struct Refiner {
    /// Neighbors of every node in the current splitter cell.
    count: Vec<usize>,
    /// Whether the cell starting at a position is waiting in `queue`.
    queued: Vec<bool>,
    /// Number of touched nodes moved to the back of the cell starting at a position.
    moved: Vec<usize>,
    queue: VecDeque<usize>,
    touched: Vec<usize>,
    cells: Vec<usize>,
    fragments: Vec<usize>,
}

impl Refiner {
    pub fn new(n: usize) -> Self {
        let mut refiner = Self::default();
        refiner.reset(n);
        refiner
    }

    /// Prepares the buffers for partitions of `n` nodes.
    pub fn reset(&mut self, n: usize) {
        self.count.clear();
        self.count.resize(n, 0);
        self.queued.clear();
        self.queued.resize(n, false);
        self.moved.clear();
        self.moved.resize(n, 0);
        self.queue.clear();
        self.touched.clear();
        self.cells.clear();
        self.fragments.clear();
    }

    /// Refines `partition` until it is equitable, starting from the given
    /// splitter cells.
    ///
    /// A cell is split by the number of neighbors its nodes have in a splitter
    /// cell; fragments are ordered by increasing count. The partition must be
    /// equitable with respect to every cell that is not a splitter, so when a
    /// cell that is not queued splits, its largest fragment need not be queued.
    pub fn refine(&mut self, partition: &mut Partition, graph: &ColoredGraph, splitters: impl IntoIterator<Item = usize>) {
        debug_assert_eq!(self.count.len(), partition.len());
        for start in splitters {
            self.enqueue(start);
        }

        while let Some(splitter) = self.queue.pop_front() {
            self.queued[splitter] = false;
            if partition.is_discrete() {
                break;
            }

            for i in splitter..partition.cell_end[splitter] {
                for &w in graph.neighbors(partition.lab[i]) {
                    if self.count[w] == 0 {
                        self.touched.push(w);
                    }
                    self.count[w] += 1;
                }
            }

            // Gather the touched nodes of every cell at its back.
            for &w in &self.touched {
                let cell = partition.cell_of[w];
                if self.moved[cell] == 0 {
                    self.cells.push(cell);
                }
                let back = partition.cell_end[cell] - 1 - self.moved[cell];
                partition.swap_to(w, back);
                self.moved[cell] += 1;
            }

            self.cells.sort_unstable();
            for i in 0..self.cells.len() {
                let cell = self.cells[i];
                let moved = std::mem::take(&mut self.moved[cell]);
                self.split(partition, cell, moved);
            }

            for &w in &self.touched {
                self.count[w] = 0;
            }
            self.touched.clear();
            self.cells.clear();
        }

        while let Some(start) = self.queue.pop_front() {
            self.queued[start] = false;
        }
    }

    fn enqueue(&mut self, start: usize) {
        if !self.queued[start] {
            self.queued[start] = true;
            self.queue.push_back(start);
        }
    }

    /// Splits the cell at `start` whose last `moved` nodes were touched.
    fn split(&mut self, partition: &mut Partition, start: usize, moved: usize) {
        let end = partition.cell_end[start];
        let first_touched = end - moved;
        let count = &self.count;
        partition.lab[first_touched..end].sort_unstable_by_key(|&v| count[v]);
        for i in first_touched..end {
            partition.pos[partition.lab[i]] = i;
        }

        self.fragments.clear();
        if first_touched > start {
            self.fragments.push(start);
        }
        for i in first_touched..end {
            if i == first_touched || count[partition.lab[i]] != count[partition.lab[i - 1]] {
                self.fragments.push(i);
            }
        }
        if self.fragments.len() < 2 {
            return;
        }

        // Cut from the back, so every node is relabeled once.
        for &fragment in self.fragments[1..].iter().rev() {
            partition.split_off(start, fragment);
        }

        let size = |k: usize, fragments: &[usize]| fragments.get(k + 1).copied().unwrap_or(end) - fragments[k];
        // A queued cell keeps its place in the queue; all new fragments join it.
        let skip = if self.queued[start] {
            None
        } else {
            (0..self.fragments.len()).rev().max_by_key(|&k| size(k, &self.fragments))
        };
        for k in 0..self.fragments.len() {
            if Some(k) != skip {
                let fragment = self.fragments[k];
                self.enqueue(fragment);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::qcir::parse_str;

    fn encode(text: &str) -> ColoredGraph {
        ColoredGraph::from_circuit(parse_str(text).unwrap())
    }

    fn refined(graph: &ColoredGraph) -> (Partition, Refiner) {
        let mut partition = Partition::from_colors(graph.colors());
        let mut refiner = Refiner::new(graph.num_nodes());
        let starts = partition.cell_starts();
        refiner.refine(&mut partition, graph, starts);
        (partition, refiner)
    }

    fn equitable(partition: &Partition, graph: &ColoredGraph) -> bool {
        let starts = partition.cell_starts();
        for &cell in &starts {
            for &splitter in &starts {
                let counts: Vec<usize> = partition
                    .cell(cell)
                    .iter()
                    .map(|&v| graph.neighbors(v).iter().filter(|&&w| partition.cell_of(w) == splitter).count())
                    .collect();
                if counts.iter().any(|&c| c != counts[0]) {
                    return false;
                }
            }
        }
        true
    }

    fn cells(partition: &Partition) -> Vec<Vec<usize>> {
        partition
            .cell_starts()
            .into_iter()
            .map(|start| {
                let mut cell = partition.cell(start).to_vec();
                cell.sort_unstable();
                cell
            })
            .collect()
    }

    #[test]
    fn test_from_colors() {
        let partition = Partition::from_colors(&[1, 0, 1, 2, 0]);
        assert_eq!(partition.num_cells(), 3);
        assert_eq!(partition.cell_starts(), vec![0, 2, 4]);
        assert_eq!(partition.cell(0), &[1, 4]);
        assert_eq!(partition.cell(2), &[0, 2]);
        assert_eq!(partition.cell(4), &[3]);
        assert_eq!(partition.cell_of(3), 4);
        assert!(!partition.is_discrete());
        assert!(partition.splits().is_empty());
    }

    #[test]
    fn test_target_cell() {
        let partition = Partition::from_colors(&[0, 0, 0, 1, 2, 2, 3, 3, 3, 3]);
        assert_eq!(partition.target_cell(TargetCell::First), Some(0));
        assert_eq!(partition.target_cell(TargetCell::Smallest), Some(4));
        assert_eq!(partition.target_cell(TargetCell::Largest), Some(6));

        let discrete = Partition::from_colors(&[0, 1, 2]);
        assert!(discrete.is_discrete());
        assert_eq!(discrete.target_cell(TargetCell::First), None);
    }

    #[test]
    fn test_individualize() {
        let mut partition = Partition::from_colors(&[0, 0, 0, 1]);
        let start = partition.individualize(0);
        assert_eq!(start, 2);
        assert_eq!(partition.cell(2), &[0]);
        assert_eq!(partition.cell(0).len(), 2);
        assert!(partition.cell(0).contains(&1));
        assert!(partition.cell(0).contains(&2));
        assert_eq!(partition.num_cells(), 3);
        assert_eq!(partition.cell_of(0), 2);
        assert_eq!(partition.cell_of(2), 0);
        assert_eq!(partition.splits(), &[Split { parent: 0, start: 2 }]);
    }

    #[test]
    fn test_undo_restores_cells() {
        let graph = encode("#QCIR-G14\nforall(1, 2, 3)\nexists(4)\noutput(6)\n5 = and(1, 2, -4)\n6 = or(5, 3)\n");
        let (mut partition, mut refiner) = refined(&graph);
        let before = cells(&partition);
        let mark = partition.mark();

        let target = partition.target_cell(TargetCell::First).unwrap();
        let start = partition.individualize(partition.cell(target)[0]);
        refiner.refine(&mut partition, &graph, [start]);
        assert!(partition.mark() > mark);
        assert_ne!(cells(&partition), before);

        partition.undo(mark);
        assert_eq!(partition.mark(), mark);
        assert_eq!(cells(&partition), before);
        assert_eq!(partition.num_cells(), before.len());
        for (start, cell) in partition.cell_starts().into_iter().zip(&before) {
            for &v in cell {
                assert_eq!(partition.cell_of(v), start);
            }
        }
    }

    #[test]
    fn test_refine_splits_by_degree() {
        // Literal pairs of 1, 2, 3 all share a color, but only 1 and 2 feed the gate.
        let graph = encode("#QCIR-G14\nexists(1, 2, 3)\noutput(4)\n4 = or(1, 2)\n5 = and(-3)\n");
        let (partition, _) = refined(&graph);
        assert!(equitable(&partition, &graph));

        assert_eq!(partition.cell_of(0), partition.cell_of(2));
        assert_ne!(partition.cell_of(0), partition.cell_of(4));
        assert_ne!(partition.cell_of(0), partition.cell_of(1));
    }

    #[test]
    fn test_refine_after_individualize_is_discrete() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(5)\n5 = or(1, 2)\n");
        let (mut partition, mut refiner) = refined(&graph);
        assert!(equitable(&partition, &graph));
        assert!(!partition.is_discrete());

        let target = partition.target_cell(TargetCell::First).unwrap();
        let v = partition.cell(target)[0];
        let start = partition.individualize(v);
        refiner.refine(&mut partition, &graph, [start]);
        assert!(partition.is_discrete());
    }

    #[test]
    fn test_refine_path_stays_equitable() {
        // A 6-cycle and a path of four nodes, all in one color.
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (6, 7), (7, 8), (8, 9)];
        let graph = ColoredGraph::from_edges(vec![0; 10], &edges);
        let (mut partition, mut refiner) = refined(&graph);
        while let Some(target) = partition.target_cell(TargetCell::First) {
            let start = partition.individualize(partition.cell(target)[0]);
            refiner.refine(&mut partition, &graph, [start]);
            assert!(equitable(&partition, &graph));
            for (i, &v) in partition.lab().iter().enumerate() {
                assert_eq!(partition.pos[v], i);
            }
        }
        assert!(partition.is_discrete());
        assert_eq!(partition.mark(), partition.splits().len());
    }
}
