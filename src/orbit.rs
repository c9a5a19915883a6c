//! Orbit decoding: from engine generators to variable permutations.
//!
//! During the search, an [`OrbitCollector`] turns every generator into its
//! cycles over node indices. Afterwards the cycles are mapped back to file-level
//! identifiers, gate nodes are dropped, and each generator is rendered as one
//! line such as `(1 2)(-1 -2)`.

use log::trace;

use crate::engine::{Automorphism, Control};
use crate::graph::ColoredGraph;
use crate::marks::Marks;

/// Cycles of one generator, over node indices.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct OrbitGroup {
    cycles: Vec<Vec<usize>>,
}

impl OrbitGroup {
    pub fn new(cycles: Vec<Vec<usize>>) -> Self {
        Self { cycles }
    }

    /// Decomposes a permutation into its cycles.
    ///
    /// Only the support is visited, in increasing order; each cycle starts at its
    /// smallest node and follows the permutation from there. `marks` must be
    /// clear on entry and is clear again on return.
    pub fn from_permutation(permutation: &[usize], support: &[usize], marks: &mut Marks) -> Self {
        let mut support = support.to_vec();
        support.sort_unstable();

        let mut cycles = Vec::new();
        for &start in &support {
            if !marks.mark(start) {
                continue;
            }
            let mut cycle = vec![start];
            let mut next = permutation[start];
            while next != start {
                marks.mark(next);
                cycle.push(next);
                next = permutation[next];
            }
            cycles.push(cycle);
        }

        marks.unmark_all(support.iter().copied());
        debug_assert!(marks.is_clear());
        Self { cycles }
    }

    pub fn cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }

    /// Cycles restricted to literal nodes and mapped to file-level identifiers.
    /// Cycles without any literal node are dropped.
    pub fn variable_orbits(&self, graph: &ColoredGraph) -> Vec<Vec<i32>> {
        self.cycles
            .iter()
            .filter_map(|cycle| {
                let orbit: Vec<i32> = cycle
                    .iter()
                    .filter(|&&v| graph.is_literal(v))
                    .map(|&v| graph.label(v))
                    .collect();
                if orbit.is_empty() {
                    trace!("cycle {:?} moves gates only", cycle);
                    None
                } else {
                    Some(orbit)
                }
            })
            .collect()
    }

    /// Renders the variable orbits as `(a b)(c d)`; `None` if there are none.
    pub fn render(&self, graph: &ColoredGraph) -> Option<String> {
        let orbits = self.variable_orbits(graph);
        if orbits.is_empty() {
            return None;
        }
        let mut line = String::new();
        for orbit in &orbits {
            line.push('(');
            for (i, id) in orbit.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push_str(&id.to_string());
            }
            line.push(')');
        }
        Some(line)
    }
}

/// Accumulates orbit groups during a search.
///
/// The collector owns the marker scratch space, so the callback of the
/// search engine needs nothing but a `&mut` to it.
#[derive(Debug)]
pub struct OrbitCollector {
    marks: Marks,
    groups: Vec<OrbitGroup>,
}

impl OrbitCollector {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            marks: Marks::new(num_nodes),
            groups: Vec::new(),
        }
    }

    /// Records one generator. Always asks the engine to continue.
    pub fn record(&mut self, automorphism: &Automorphism<'_>) -> Control {
        if automorphism.is_identity() {
            trace!("identity generator skipped");
            return Control::Continue;
        }
        let group = OrbitGroup::from_permutation(automorphism.permutation, automorphism.support, &mut self.marks);
        self.groups.push(group);
        Control::Continue
    }

    pub fn groups(&self) -> &[OrbitGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<OrbitGroup> {
        self.groups
    }
}

/// Renders every group with at least one variable orbit, one line each,
/// in discovery order.
pub fn render_groups(groups: &[OrbitGroup], graph: &ColoredGraph) -> Vec<String> {
    groups.iter().filter_map(|group| group.render(graph)).collect()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::qcir::parse_str;

    fn encode(text: &str) -> ColoredGraph {
        ColoredGraph::from_circuit(parse_str(text).unwrap())
    }

    #[test]
    fn test_cycles_from_permutation() {
        let mut marks = Marks::new(6);
        // (0 3 4)(1 5), node 2 fixed.
        let perm = [3, 5, 2, 4, 0, 1];
        let group = OrbitGroup::from_permutation(&perm, &[5, 4, 3, 1, 0], &mut marks);
        assert_eq!(group.cycles(), &[vec![0, 3, 4], vec![1, 5]]);
        assert!(marks.is_clear());
    }

    #[test]
    fn test_collector_resets_marks_between_generators() {
        let perm = [1, 0, 2];
        let mut collector = OrbitCollector::new(3);
        for _ in 0..2 {
            let automorphism = Automorphism {
                permutation: &perm,
                support: &[0, 1],
            };
            assert_eq!(collector.record(&automorphism), Control::Continue);
        }
        assert_eq!(collector.groups().len(), 2);
        assert_eq!(collector.groups()[0], collector.groups()[1]);
        assert_eq!(collector.into_groups()[1].cycles(), &[vec![0, 1]]);
    }

    #[test]
    fn test_collector_skips_identity() {
        let perm = [0, 1, 2];
        let mut collector = OrbitCollector::new(3);
        let identity = Automorphism {
            permutation: &perm,
            support: &[],
        };
        assert_eq!(collector.record(&identity), Control::Continue);
        assert!(collector.groups().is_empty());
    }

    #[test]
    fn test_render_filters_gate_nodes() {
        // Nodes: 1, -1, 2, -2, gate 3, gate 4.
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(5)\n3 = and(1)\n4 = and(2)\n5 = or(3, 4)\n");
        let group = OrbitGroup::new(vec![vec![0, 2], vec![1, 3], vec![4, 5]]);
        assert_eq!(group.variable_orbits(&graph), vec![vec![1, 2], vec![-1, -2]]);
        assert_eq!(group.render(&graph).as_deref(), Some("(1 2)(-1 -2)"));
    }

    #[test]
    fn test_render_mixed_cycle_keeps_literals_only() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(5)\n3 = and(1)\n4 = and(2)\n5 = or(3, 4)\n");
        let group = OrbitGroup::new(vec![vec![0, 4, 2, 5]]);
        assert_eq!(group.render(&graph).as_deref(), Some("(1 2)"));
    }

    #[test]
    fn test_gate_only_group_renders_nothing() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(5)\n3 = and(1)\n4 = and(2)\n5 = or(3, 4)\n");
        let gates_only = OrbitGroup::new(vec![vec![4, 5]]);
        let literals = OrbitGroup::new(vec![vec![0, 2]]);
        assert_eq!(gates_only.render(&graph), None);

        let lines = render_groups(&[gates_only, literals.clone(), OrbitGroup::default(), literals], &graph);
        assert_eq!(lines, vec!["(1 2)".to_string(), "(1 2)".to_string()]);
    }
}
