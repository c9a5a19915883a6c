//! Interface to automorphism search engines.
//!
//! An engine searches the automorphism group of a [`ColoredGraph`] and reports
//! a set of generators of that group, one callback invocation per generator.
//! Nothing is assumed about the order in which generators are discovered.
//!
//! The callback is invoked synchronously from inside the search loop. It must
//! not block and must not call back into the engine; it returns a [`Control`]
//! telling the engine whether to go on.

use std::fmt;

use num_bigint::BigUint;

use crate::graph::ColoredGraph;

/// A generator reported by an engine.
#[derive(Debug, Copy, Clone)]
pub struct Automorphism<'a> {
    /// Image of every node: `permutation[v]` is where `v` goes.
    pub permutation: &'a [usize],
    /// Nodes actually moved by the permutation, in no particular order.
    pub support: &'a [usize],
}

impl Automorphism<'_> {
    pub fn is_identity(&self) -> bool {
        self.support.is_empty()
    }
}

/// Answer of the callback to the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Control {
    Continue,
    Stop,
}

/// Statistics of one search.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SearchStats {
    /// Order of the automorphism group (exact only if `complete`).
    pub group_order: BigUint,
    /// Number of generators reported.
    pub generators: usize,
    /// Number of search tree nodes visited.
    pub nodes: usize,
    /// Number of leaves that did not yield an automorphism.
    pub bad_leaves: usize,
    /// Depth of the first path of the search tree.
    pub levels: usize,
    /// False if the callback stopped the search early.
    pub complete: bool,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            group_order: BigUint::from(1u32),
            generators: 0,
            nodes: 0,
            bad_leaves: 0,
            levels: 0,
            complete: true,
        }
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "group size = {}", self.group_order)?;
        writeln!(f, "generators = {}", self.generators)?;
        writeln!(f, "levels = {}", self.levels)?;
        writeln!(f, "nodes = {}", self.nodes)?;
        write!(f, "bad leaves = {}", self.bad_leaves)?;
        if !self.complete {
            write!(f, " (search stopped early)")?;
        }
        Ok(())
    }
}

/// An automorphism search engine over colored graphs.
pub trait SymmetryEngine {
    /// Searches the automorphism group of `graph` (respecting node colors),
    /// invoking `on_automorphism` once per generator found.
    fn search(
        &mut self,
        graph: &ColoredGraph,
        on_automorphism: &mut dyn FnMut(&Automorphism<'_>) -> Control,
    ) -> SearchStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats() {
        let stats = SearchStats::default();
        assert_eq!(stats.group_order, BigUint::from(1u32));
        assert!(stats.complete);
        assert!(stats.to_string().starts_with("group size = 1\n"));
    }

    #[test]
    fn test_identity() {
        let perm = [0, 1, 2];
        let automorphism = Automorphism {
            permutation: &perm,
            support: &[],
        };
        assert!(automorphism.is_identity());
    }
}
