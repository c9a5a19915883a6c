//! Built-in automorphism search by individualization and refinement.
//!
//! The search tree is explored the way the classic graph canonization tools
//! explore it for generators:
//!
//! 1. The root is the color partition, refined to an equitable partition.
//! 2. The *first path* individualizes the first node of the target cell at every
//!    level until the partition is discrete; its leaf is the reference labeling.
//!    The individualized nodes are the *base points*.
//! 3. Levels of the first path are revisited deepest first. At a level, every
//!    other node of the target cell is tried in place of the base point, unless
//!    it is already known to be in the same orbit. The subtree is searched for a
//!    leaf whose positional correspondence with the reference leaf is an
//!    automorphism; the first one found is a new generator.
//!
//! Every generator found at a level fixes the base points above it, so after a
//! level has been processed the generators found so far generate the pointwise
//! stabilizer of the base points above it, and the orbit of the base point under
//! them is its full orbit. The group order is the product of those orbit sizes.

use log::{debug, trace};
use num_bigint::BigUint;

use crate::engine::{Automorphism, Control, SearchStats, SymmetryEngine};
use crate::graph::ColoredGraph;
use crate::partition::{Partition, Refiner, Split, TargetCell};

/// Configuration of the built-in search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Cell to individualize at each node of the search tree.
    pub target_cell: TargetCell,
}

/// The built-in [`SymmetryEngine`].
#[derive(Debug, Clone, Default)]
pub struct RefinementSearch {
    config: SearchConfig,
    refiner: Refiner,
}

impl RefinementSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            refiner: Refiner::default(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

/// The first path of the search tree.
#[derive(Debug)]
struct FirstPath {
    /// Target cell at every level.
    targets: Vec<usize>,
    /// Base point individualized at every level.
    bases: Vec<usize>,
    /// Trail length on entry to every level, and at the leaf.
    marks: Vec<usize>,
    /// Splits from the root to the leaf.
    trail: Vec<Split>,
    leaf: Vec<usize>,
}

impl FirstPath {
    fn depth(&self) -> usize {
        self.bases.len()
    }

    /// Splits made by individualizing and refining at `level`.
    fn splits(&self, level: usize) -> &[Split] {
        &self.trail[self.marks[level]..self.marks[level + 1]]
    }
}

/// Candidates left to try at one level of a subtree search.
#[derive(Debug)]
struct Frame {
    level: usize,
    first: usize,
    started: bool,
    /// Whether the rest of the target cell is tried once `first` fails.
    expand: bool,
    rest: Option<Vec<usize>>,
}

impl Frame {
    fn new(level: usize, first: usize, expand: bool) -> Self {
        Self {
            level,
            first,
            started: false,
            expand,
            rest: None,
        }
    }

    fn next(&mut self, partition: &Partition, target: usize) -> Option<usize> {
        if !self.started {
            self.started = true;
            return Some(self.first);
        }
        if !self.expand {
            return None;
        }
        let first = self.first;
        self.rest
            .get_or_insert_with(|| partition.cell(target).iter().rev().copied().filter(|&v| v != first).collect())
            .pop()
    }
}

/// Union-find over nodes, tracking the orbits of the generators found so far.
#[derive(Debug)]
struct Orbits {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Orbits {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return false;
        }
        let (big, small) = if self.size[rx] >= self.size[ry] { (rx, ry) } else { (ry, rx) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }

    fn same(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    fn size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

impl SymmetryEngine for RefinementSearch {
    fn search(
        &mut self,
        graph: &ColoredGraph,
        on_automorphism: &mut dyn FnMut(&Automorphism<'_>) -> Control,
    ) -> SearchStats {
        let mut stats = SearchStats::default();
        let n = graph.num_nodes();
        if n == 0 {
            return stats;
        }

        self.refiner.reset(n);
        let mut partition = Partition::from_colors(graph.colors());
        let starts = partition.cell_starts();
        self.refiner.refine(&mut partition, graph, starts);
        stats.nodes += 1;

        // First path.
        let mut targets = Vec::new();
        let mut bases = Vec::new();
        let mut marks = Vec::new();
        while let Some(target) = partition.target_cell(self.config.target_cell) {
            let base = partition.cell(target)[0];
            marks.push(partition.mark());
            targets.push(target);
            bases.push(base);
            self.descend(&mut partition, graph, base);
            stats.nodes += 1;
        }
        marks.push(partition.mark());
        let path = FirstPath {
            targets,
            bases,
            marks,
            trail: partition.splits().to_vec(),
            leaf: partition.lab().to_vec(),
        };
        stats.levels = path.depth();
        debug!("first path: {} levels, {} nodes", path.depth(), n);

        let mut orbits = Orbits::new(n);
        for depth in (0..path.depth()).rev() {
            let base = path.bases[depth];
            partition.undo(path.marks[depth]);
            let candidates = partition.cell(path.targets[depth]).to_vec();
            for v in candidates {
                if v == base || orbits.same(v, base) {
                    continue;
                }
                let found = self.search_subtree(&mut partition, graph, &path, depth, v, &mut stats);
                partition.undo(path.marks[depth]);
                let Some((perm, support)) = found else {
                    trace!("level {}: {} is not in the orbit of {}", depth, v, base);
                    continue;
                };

                for &u in &support {
                    orbits.union(u, perm[u]);
                }
                stats.generators += 1;
                debug!(
                    "level {}: generator #{} maps {} to {}, support {}",
                    depth,
                    stats.generators,
                    base,
                    v,
                    support.len()
                );

                let automorphism = Automorphism {
                    permutation: &perm,
                    support: &support,
                };
                if on_automorphism(&automorphism) == Control::Stop {
                    debug!("search stopped by callback");
                    stats.complete = false;
                    return stats;
                }
            }
            stats.group_order *= BigUint::from(orbits.size(base));
        }

        debug!("search done: {} generators, group size {}", stats.generators, stats.group_order);
        stats
    }
}

impl RefinementSearch {
    fn descend(&mut self, partition: &mut Partition, graph: &ColoredGraph, v: usize) {
        let start = partition.individualize(v);
        self.refiner.refine(partition, graph, [start]);
    }

    /// Searches the subtree rooted at individualizing `v` at level `depth`
    /// for a leaf matching the first leaf.
    ///
    /// Nodes whose splits differ from the first path at the same level cannot
    /// lead to an automorphism and are pruned. Below `depth`, the base point of
    /// the first path is tried first whenever it is in the target cell, which
    /// keeps the support of generators small.
    fn search_subtree(
        &mut self,
        partition: &mut Partition,
        graph: &ColoredGraph,
        path: &FirstPath,
        depth: usize,
        v: usize,
        stats: &mut SearchStats,
    ) -> Option<(Vec<usize>, Vec<usize>)> {
        let mut frames = vec![Frame::new(depth, v, false)];
        while let Some(frame) = frames.last_mut() {
            let level = frame.level;
            partition.undo(path.marks[level]);
            let Some(u) = frame.next(partition, path.targets[level]) else {
                frames.pop();
                continue;
            };

            self.descend(partition, graph, u);
            stats.nodes += 1;
            if &partition.splits()[path.marks[level]..] != path.splits(level) {
                continue;
            }

            if level + 1 == path.depth() {
                let mut perm = vec![0; path.leaf.len()];
                for (&from, &to) in path.leaf.iter().zip(partition.lab()) {
                    perm[from] = to;
                }
                let support: Vec<usize> = (0..perm.len()).filter(|&w| perm[w] != w).collect();
                if graph.is_automorphism_on(&perm, &support) {
                    return Some((perm, support));
                }
                stats.bad_leaves += 1;
                continue;
            }

            let target = path.targets[level + 1];
            let preferred = path.bases[level + 1];
            let first = if partition.cell_of(preferred) == target {
                preferred
            } else {
                partition.cell(target)[0]
            };
            frames.push(Frame::new(level + 1, first, true));
        }
        None
    }
}
