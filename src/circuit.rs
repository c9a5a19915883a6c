//! Intermediate representation of a parsed QCIR circuit.
//!
//! A [`Circuit`] is a flat list of nodes in the final node order of the
//! encoding graph: first the literal nodes of all quantified variables (two per
//! variable, positive first), then the gate nodes, including the NOT nodes
//! synthesized for negated gate references, in creation order.

use std::collections::HashMap;

use crate::types::{NodeKind, Quantifier, Var};

/// A node of the circuit, with its neighbors already resolved to node indices.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    /// Signed file-level identifier (negative for negated literals and NOT nodes).
    pub file_id: i32,
    pub kind: NodeKind,
    /// Adjacent node indices, in insertion order. Every edge appears at both ends.
    pub neighbors: Vec<usize>,
}

/// Variables of one quantifier block. All their literals share one color.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColorClass {
    pub quantifier: Quantifier,
    pub vars: Vec<Var>,
}

/// Mapping between signed file-level identifiers and node indices.
#[derive(Debug, Clone, Default)]
pub struct VarMap {
    map: HashMap<i32, usize>,
}

impl VarMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i32) -> Option<usize> {
        self.map.get(&id).copied()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.map.contains_key(&id)
    }

    /// Records `id -> index`; returns `false` if `id` was already mapped.
    pub fn insert(&mut self, id: i32, index: usize) -> bool {
        match self.map.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(index);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A parsed circuit, ready to be encoded as a colored graph.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub(crate) nodes: Vec<Node>,
    pub(crate) color_classes: Vec<ColorClass>,
    pub(crate) var_map: VarMap,
    pub(crate) num_literals: usize,
    pub(crate) output: String,
}

impl Circuit {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn color_classes(&self) -> &[ColorClass] {
        &self.color_classes
    }

    pub fn var_map(&self) -> &VarMap {
        &self.var_map
    }

    /// Number of quantifier-block colors.
    pub fn num_colors(&self) -> usize {
        self.color_classes.len()
    }

    /// Number of literal nodes (twice the number of quantified variables).
    pub fn num_literals(&self) -> usize {
        self.num_literals
    }

    /// Number of gate nodes, synthesized NOT nodes included.
    pub fn num_gates(&self) -> usize {
        self.nodes.len() - self.num_literals
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node index of a signed file-level identifier.
    pub fn node_of(&self, file_id: i32) -> Option<usize> {
        self.var_map.get(file_id)
    }

    /// Signed file-level identifier of a node.
    pub fn file_id(&self, index: usize) -> i32 {
        self.nodes[index].file_id
    }

    /// Raw content of the `output` line after the keyword.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_literal(&self, index: usize) -> bool {
        index < self.num_literals
    }
}
