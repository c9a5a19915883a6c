//! # qcir-sym: symmetry detection for quantified Boolean circuits
//!
//! **`qcir-sym`** finds structural symmetries of circuits in the QCIR-G14
//! format, to be used for symmetry breaking in QBF solvers.
//!
//! ## How it works
//!
//! A circuit is encoded as a colored undirected graph whose automorphisms are
//! exactly the permutations of circuit variables (and gates) that leave the
//! circuit unchanged:
//!
//! - every literal is a node, connected to the node of its negation;
//! - every gate is a node, connected to its inputs;
//! - a negated gate input goes through a synthesized NOT node;
//! - literals are colored by their quantifier block, gates by their kind.
//!
//! An automorphism search engine then reports generators of the automorphism
//! group, and each generator is printed as its cycles over literals, with gates
//! filtered out.
//!
//! ## Basic Usage
//!
//! ```rust
//! use qcir_sym::detect_symmetries;
//! use qcir_sym::search::SearchConfig;
//!
//! let text = "#QCIR-G14\nexists(1, 2)\noutput(3)\n3 = or(1, 2)\n";
//! let symmetries = detect_symmetries(text, &SearchConfig::default()).unwrap();
//!
//! // Swapping 1 and 2 (and hence -1 and -2) leaves the circuit unchanged.
//! assert_eq!(symmetries.lines, vec!["(1 2)(-1 -2)"]);
//! ```
//!
//! ## Core Components
//!
//! - **[`qcir`]**: Reader for the QCIR-G14 format.
//! - **[`graph`]**: The colored graph encoding.
//! - **[`engine`]**: Interface of automorphism search engines; **[`search`]** is the built-in one.
//! - **[`orbit`]**: Cycle decomposition and rendering of generators.

pub mod circuit;
pub mod dot;
pub mod engine;
pub mod error;
pub mod graph;
pub mod marks;
pub mod orbit;
pub mod partition;
pub mod qcir;
pub mod search;
pub mod types;

use log::info;

use crate::engine::{SearchStats, SymmetryEngine};
use crate::error::FormatError;
use crate::graph::ColoredGraph;
use crate::orbit::{render_groups, OrbitCollector, OrbitGroup};
use crate::search::{RefinementSearch, SearchConfig};

/// Result of a symmetry detection run.
#[derive(Debug, Clone)]
pub struct Symmetries {
    /// One rendered line per generator that moves at least one literal.
    pub lines: Vec<String>,
    /// Cycles of every non-identity generator, in discovery order.
    pub groups: Vec<OrbitGroup>,
    pub stats: SearchStats,
}

/// Runs `engine` on `graph` and collects the cycles of every generator.
pub fn find_orbits(graph: &ColoredGraph, engine: &mut dyn SymmetryEngine) -> (Vec<OrbitGroup>, SearchStats) {
    let mut collector = OrbitCollector::new(graph.num_nodes());
    let stats = engine.search(graph, &mut |automorphism| collector.record(automorphism));
    info!(
        "search found {} generators, group size {}",
        stats.generators, stats.group_order
    );
    (collector.into_groups(), stats)
}

/// Detects the symmetries of an encoded circuit with the given engine.
pub fn detect_with(graph: &ColoredGraph, engine: &mut dyn SymmetryEngine) -> Symmetries {
    let (groups, stats) = find_orbits(graph, engine);
    let lines = render_groups(&groups, graph);
    Symmetries { lines, groups, stats }
}

/// Parses a QCIR text and detects its symmetries with the built-in engine.
pub fn detect_symmetries(text: &str, config: &SearchConfig) -> Result<Symmetries, FormatError> {
    let circuit = qcir::parse_str(text)?;
    let graph = ColoredGraph::from_circuit(circuit);
    let mut engine = RefinementSearch::new(config.clone());
    Ok(detect_with(&graph, &mut engine))
}
