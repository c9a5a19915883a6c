//! Colored graph encoding of a circuit.
//!
//! The graph is stored in compressed adjacency form: the neighbors of node `v`
//! are `neighbors[offsets[v]..offsets[v + 1]]`. Every edge is stored at both of
//! its endpoints, and each node's neighbor list is sorted.
//!
//! # Coloring
//!
//! - Colors `0..num_colors` are quantifier blocks: both literals of a variable
//!   get the color of the block that quantifies it.
//! - Colors `num_colors`, `num_colors + 1`, `num_colors + 2` are AND, OR and
//!   NOT gates.
//!
//! An automorphism of the colored graph therefore only permutes variables
//! within a quantifier block, and only maps gates to gates of the same kind.

use log::debug;

use crate::circuit::Circuit;
use crate::types::NodeKind;

/// Number of colors reserved for gate kinds (AND, OR, NOT).
pub const GATE_COLORS: usize = 3;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColoredGraph {
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
    colors: Vec<usize>,
    /// Signed file-level identifier of every node.
    labels: Vec<i32>,
    /// Kind of every node; empty for plain graphs built from edge lists.
    kinds: Vec<NodeKind>,
    num_literals: usize,
    num_colors: usize,
}

impl ColoredGraph {
    /// Encodes a circuit. The circuit is consumed; its node order is kept.
    pub fn from_circuit(circuit: Circuit) -> Self {
        let num_nodes = circuit.num_nodes();
        let num_literals = circuit.num_literals();
        let num_colors = circuit.num_colors();

        let mut offsets = Vec::with_capacity(num_nodes + 1);
        let mut neighbors = Vec::new();
        let mut labels = Vec::with_capacity(num_nodes);
        let mut kinds = Vec::with_capacity(num_nodes);
        let mut colors = Vec::with_capacity(num_nodes);

        // Literals of the same variable are consecutive, in class order.
        for (color, class) in circuit.color_classes().iter().enumerate() {
            for _ in &class.vars {
                colors.push(color);
                colors.push(color);
            }
        }
        debug_assert_eq!(colors.len(), num_literals);

        for node in circuit.nodes {
            offsets.push(neighbors.len());
            let start = neighbors.len();
            neighbors.extend(node.neighbors);
            neighbors[start..].sort_unstable();
            labels.push(node.file_id);
            kinds.push(node.kind);
            if let Some(offset) = node.kind.gate_offset() {
                colors.push(num_colors + offset);
            }
        }
        offsets.push(neighbors.len());

        let graph = Self {
            offsets,
            neighbors,
            colors,
            labels,
            kinds,
            num_literals,
            num_colors,
        };
        debug!(
            "encoded graph: {} nodes ({} literal), {} edges, {} colors",
            graph.num_nodes(),
            graph.num_literals(),
            graph.num_edges(),
            graph.num_colors() + GATE_COLORS
        );
        graph
    }

    /// Builds a graph from an edge list, for engines and tests that work on
    /// plain colored graphs. There are no literal nodes and node `v` is labeled
    /// `v`.
    pub fn from_edges(colors: Vec<usize>, edges: &[(usize, usize)]) -> Self {
        let num_nodes = colors.len();
        let mut lists = vec![Vec::new(); num_nodes];
        for &(u, v) in edges {
            lists[u].push(v);
            lists[v].push(u);
        }

        let mut offsets = Vec::with_capacity(num_nodes + 1);
        let mut neighbors = Vec::with_capacity(2 * edges.len());
        for mut list in lists {
            offsets.push(neighbors.len());
            list.sort_unstable();
            neighbors.extend(list);
        }
        offsets.push(neighbors.len());

        Self {
            offsets,
            neighbors,
            colors,
            labels: (0..num_nodes).map(|v| v as i32).collect(),
            kinds: Vec::new(),
            num_literals: 0,
            num_colors: 0,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.colors.len()
    }

    /// Number of undirected edges; each one is stored at both of its ends.
    pub fn num_edges(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// Number of literal nodes; they occupy indices `0..num_literals`.
    pub fn num_literals(&self) -> usize {
        self.num_literals
    }

    /// Number of quantifier-block colors.
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn adjacency(&self) -> &[usize] {
        &self.neighbors
    }

    pub fn colors(&self) -> &[usize] {
        &self.colors
    }

    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.neighbors[self.offsets[v]..self.offsets[v + 1]]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    pub fn color(&self, v: usize) -> usize {
        self.colors[v]
    }

    /// Signed file-level identifier of a node.
    pub fn label(&self, v: usize) -> i32 {
        self.labels[v]
    }

    pub fn is_literal(&self, v: usize) -> bool {
        v < self.num_literals
    }

    /// Circuit node kind; `None` for graphs built with [`ColoredGraph::from_edges`].
    pub fn kind(&self, v: usize) -> Option<NodeKind> {
        self.kinds.get(v).copied()
    }

    /// Whether `perm` (node -> node) preserves colors and adjacency.
    pub fn is_automorphism(&self, perm: &[usize]) -> bool {
        perm.len() == self.num_nodes() && self.preserves(perm, 0..self.num_nodes())
    }

    /// Same as [`is_automorphism`](ColoredGraph::is_automorphism) for a
    /// permutation that fixes every node outside `support`; only the
    /// neighborhoods of moved nodes are compared.
    pub fn is_automorphism_on(&self, perm: &[usize], support: &[usize]) -> bool {
        perm.len() == self.num_nodes() && self.preserves(perm, support.iter().copied())
    }

    fn preserves(&self, perm: &[usize], nodes: impl Iterator<Item = usize>) -> bool {
        let mut image = Vec::new();
        for v in nodes {
            let w = perm[v];
            if self.colors[v] != self.colors[w] || self.degree(v) != self.degree(w) {
                return false;
            }
            image.clear();
            image.extend(self.neighbors(v).iter().map(|&u| perm[u]));
            image.sort_unstable();
            if image != self.neighbors(w) {
                return false;
            }
        }
        true
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

    #[test]
    fn test_literal_pairs_share_private_color() {
        let graph = encode("#QCIR-G14\nforall(1, 2)\nexists(3)\noutput(4)\n4 = and(1, -2, 3)\n5 = or(-4, 2)\n");
        assert_eq!(graph.num_literals(), 6);
        assert_eq!(graph.num_colors(), 2);

        for v in (0..graph.num_literals()).step_by(2) {
            assert!(graph.neighbors(v).contains(&(v + 1)));
            assert!(graph.neighbors(v + 1).contains(&v));
            assert_eq!(graph.color(v), graph.color(v + 1));
            assert!(graph.color(v) < graph.num_colors());
        }
        for v in graph.num_literals()..graph.num_nodes() {
            assert!(graph.color(v) >= graph.num_colors());
        }
        assert_eq!(graph.colors(), &[0, 0, 0, 0, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn test_gate_kind_colors() {
        let graph = encode("#QCIR-G14\nexists(1)\noutput(3)\n2 = and(1)\n3 = or(-2)\n");
        // Nodes: 1, -1, gate 2, gate 3, NOT -2.
        assert_eq!(graph.kind(0), Some(NodeKind::Literal));
        assert_eq!(graph.kind(2), Some(NodeKind::And));
        assert_eq!(graph.kind(3), Some(NodeKind::Or));
        assert_eq!(graph.kind(4), Some(NodeKind::Not));
        assert_eq!(graph.color(2), 1);
        assert_eq!(graph.color(3), 2);
        assert_eq!(graph.color(4), 3);
        assert_eq!(graph.label(4), -2);
    }

    #[test]
    fn test_graph_is_undirected() {
        let graph = encode("#QCIR-G14\nforall(1, 2)\nexists(3, 4)\noutput(7)\n5 = and(1, -3)\n6 = or(2, 4, -5)\n7 = and(-5, -6, 1)\n");
        for v in 0..graph.num_nodes() {
            for &w in graph.neighbors(v) {
                let back = graph.neighbors(w).iter().filter(|&&u| u == v).count();
                let forth = graph.neighbors(v).iter().filter(|&&u| u == w).count();
                assert_eq!(back, forth, "edge {} -- {}", v, w);
            }
        }
        assert_eq!(graph.offsets().len(), graph.num_nodes() + 1);
        assert_eq!(graph.adjacency().len() % 2, 0);
    }

    #[test]
    fn test_empty_gate_has_no_edges() {
        let graph = encode("#QCIR-G14\nexists(1)\noutput(2)\n2 = or()\n");
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.degree(2), 0);
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn test_is_automorphism() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(5)\n5 = or(1, 2)\n");
        assert!(graph.is_automorphism(&[0, 1, 2, 3, 4]));
        assert!(graph.is_automorphism(&[2, 3, 0, 1, 4]));
        // Swaps positive and negative literal of the same variable only.
        assert!(!graph.is_automorphism(&[1, 0, 2, 3, 4]));
        // Maps a literal to the gate.
        assert!(!graph.is_automorphism(&[4, 1, 2, 3, 0]));
        assert!(!graph.is_automorphism(&[0, 1, 2]));
    }

    #[test]
    fn test_is_automorphism_on_support() {
        let graph = encode("#QCIR-G14\nexists(1, 2, 3)\noutput(7)\n7 = or(1, 2, -3)\n");
        // Nodes: 1, -1, 2, -2, 3, -3, gate 7.
        assert!(graph.is_automorphism_on(&[2, 3, 0, 1, 4, 5, 6], &[0, 1, 2, 3]));
        // Swapping 1 and 3 breaks the edge to the gate.
        assert!(!graph.is_automorphism_on(&[4, 5, 2, 3, 0, 1, 6], &[0, 1, 4, 5]));
    }

    #[test]
    fn test_from_edges() {
        let graph = ColoredGraph::from_edges(vec![0, 0, 1], &[(0, 1), (1, 2)]);
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.num_literals(), 0);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.label(2), 2);
        assert_eq!(graph.kind(0), None);
        assert!(!graph.is_automorphism(&[2, 1, 0]));
    }
}
