//! Encoding graph to DOT (Graphviz) conversion.
//!
//! Useful to inspect by eye how a circuit was encoded: which nodes were
//! created, how gates are wired, and which nodes share a color.
//!
//! # DOT Format
//!
//! - **Literal nodes** are circles labeled with their signed identifier, grouped
//!   per variable (both literals of a variable share a rank)
//! - **Gate nodes** are boxes labeled `and 5`, `or 6`; synthesized NOT nodes are
//!   labeled `not -5`
//! - **Fill color** encodes the node color: nodes that may be mapped onto each
//!   other by an automorphism have the same fill
//! - Each undirected edge is written once
//!
//! # Examples
//!
//! ```
//! use qcir_sym::graph::ColoredGraph;
//! use qcir_sym::qcir::parse_str;
//!
//! let circuit = parse_str("#QCIR-G14\nexists(1, 2)\noutput(3)\n3 = or(1, 2)\n").unwrap();
//! let graph = ColoredGraph::from_circuit(circuit);
//!
//! let dot = graph.to_dot().unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("graph {"));
//! ```

use std::fmt::Write as _;

use crate::graph::ColoredGraph;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for literal nodes (default: "circle")
    pub literal_shape: &'static str,
    /// Shape for gate nodes, NOT nodes included (default: "box")
    pub gate_shape: &'static str,
    /// Fill colors, indexed by node color modulo the palette length
    pub palette: &'static [&'static str],
    /// Whether to put both literals of a variable on the same rank (default: true)
    pub rank_literal_pairs: bool,
}

const PALETTE: &[&str] = &[
    "lightblue",
    "lightpink",
    "palegreen",
    "khaki",
    "lightsalmon",
    "plum",
    "lightcyan",
    "wheat",
];

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            literal_shape: "circle",
            gate_shape: "box",
            palette: PALETTE,
            rank_literal_pairs: true,
        }
    }
}

impl ColoredGraph {
    /// Converts the graph to DOT format with the default configuration.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the graph to DOT format.
    ///
    /// # Examples
    ///
    /// ```
    /// use qcir_sym::dot::DotConfig;
    /// use qcir_sym::graph::ColoredGraph;
    /// use qcir_sym::qcir::parse_str;
    ///
    /// let circuit = parse_str("#QCIR-G14\nexists(1)\noutput(2)\n2 = and(1)\n").unwrap();
    /// let graph = ColoredGraph::from_circuit(circuit);
    ///
    /// let config = DotConfig {
    ///     gate_shape: "diamond",
    ///     ..DotConfig::default()
    /// };
    /// let dot = graph.to_dot_with_config(&config).unwrap();
    /// assert!(dot.contains("shape=diamond"));
    /// ```
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [style=filled];")?;

        let fill = |v: usize| {
            if config.palette.is_empty() {
                "white"
            } else {
                config.palette[self.color(v) % config.palette.len()]
            }
        };

        for v in (0..self.num_literals()).step_by(2) {
            if config.rank_literal_pairs {
                writeln!(dot, "{{ rank=same")?;
            }
            for u in [v, v + 1] {
                writeln!(
                    dot,
                    "{} [shape={}, label=\"{}\", fillcolor={}];",
                    u,
                    config.literal_shape,
                    self.label(u),
                    fill(u)
                )?;
            }
            if config.rank_literal_pairs {
                writeln!(dot, "}}")?;
            }
        }

        for v in self.num_literals()..self.num_nodes() {
            match self.kind(v) {
                Some(kind) => {
                    debug_assert!(kind.is_gate());
                    writeln!(
                        dot,
                        "{} [shape={}, label=\"{} {}\", fillcolor={}];",
                        v,
                        config.gate_shape,
                        kind,
                        self.label(v),
                        fill(v)
                    )?;
                }
                // Plain graph: no circuit semantics to show.
                None => writeln!(dot, "{} [label=\"{}\", fillcolor={}];", v, self.label(v), fill(v))?,
            }
        }

        // Every edge is stored at both ends; print it from the smaller one.
        // A self-loop is stored twice at the same node, so skip every other copy.
        for v in 0..self.num_nodes() {
            let mut loops = 0;
            for &w in self.neighbors(v) {
                if w == v {
                    loops += 1;
                    if loops % 2 == 0 {
                        continue;
                    }
                }
                if v <= w {
                    writeln!(dot, "{} -- {};", v, w)?;
                }
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qcir::parse_str;

    fn encode(text: &str) -> ColoredGraph {
        ColoredGraph::from_circuit(parse_str(text).unwrap())
    }

    /// Basic test: verify DOT output is generated without errors
    #[test]
    fn test_to_dot_basic() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(3)\n3 = or(1, -2)\n");
        let dot = graph.to_dot().unwrap();

        assert!(dot.starts_with("graph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"-2\""));
        assert!(dot.contains("label=\"or 3\""));
    }

    /// Each undirected edge is written exactly once
    #[test]
    fn test_to_dot_edges_once() {
        let graph = encode("#QCIR-G14\nexists(1, 2)\noutput(4)\n3 = and(1, 2)\n4 = or(-3, 1)\n");
        let dot = graph.to_dot().unwrap();
        let edges = dot.lines().filter(|line| line.contains(" -- ")).count();
        assert_eq!(edges, graph.num_edges());
        assert!(dot.contains("label=\"not -3\""));
    }

    #[test]
    fn test_to_dot_plain_graph() {
        let graph = ColoredGraph::from_edges(vec![0, 0, 1], &[(0, 1), (1, 2)]);
        let dot = graph.to_dot().unwrap();
        assert!(dot.contains("0 [label=\"0\", fillcolor=lightblue];"));
        assert!(dot.contains("2 [label=\"2\", fillcolor=lightpink];"));
        assert!(!dot.contains("and"));
        assert!(!dot.contains("shape=box"));
    }

    /// Test with custom configuration
    #[test]
    fn test_to_dot_with_config() {
        let graph = encode("#QCIR-G14\nexists(1)\noutput(2)\n2 = and(1)\n");
        let config = DotConfig {
            rank_literal_pairs: false,
            palette: &[],
            ..DotConfig::default()
        };
        let dot = graph.to_dot_with_config(&config).unwrap();
        assert!(!dot.contains("rank=same"));
        assert!(dot.contains("fillcolor=white"));
    }

    /// Helper test to write DOT file for manual inspection (disabled by default)
    #[test]
    #[ignore]
    fn test_write_dot_file() {
        let graph = encode("#QCIR-G14\nforall(1, 2)\nexists(3, 4)\noutput(7)\n5 = and(1, -3)\n6 = and(2, -4)\n7 = or(5, 6)\n");
        let dot = graph.to_dot().unwrap();
        std::fs::write("test_output.dot", &dot).unwrap();
        println!("DOT output:\n{}", dot);
    }
}
