//! Small value types shared by the reader, the graph builder and the decoder.
//!
//! File-level identifiers are plain signed integers (`i32`), exactly as they
//! appear in a QCIR file: a positive number names a variable or a gate, a
//! negative number names its negation. Node indices are `usize` positions in
//! the contiguous node space of the encoding graph.
use std::fmt;

/// A quantified variable (1-indexed, positive file-level identifier).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 and negative numbers denote no variable)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Converts a signed file-level identifier into a variable, if it is positive.
    pub fn from_file_id(id: i32) -> Option<Self> {
        if id > 0 {
            Some(Var(id as u32))
        } else {
            None
        }
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Signed identifier of the positive literal.
    pub fn pos(self) -> i32 {
        self.0 as i32
    }

    /// Signed identifier of the negated literal.
    pub fn neg(self) -> i32 {
        -(self.0 as i32)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// Quantifier of a quantifier block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Quantifier {
    Forall,
    Exists,
}

impl Quantifier {
    pub const fn keyword(self) -> &'static str {
        match self {
            Quantifier::Forall => "forall",
            Quantifier::Exists => "exists",
        }
    }

    /// Recognizes a quantifier keyword at the start of a line.
    pub fn from_line(line: &str) -> Option<Self> {
        [Quantifier::Forall, Quantifier::Exists]
            .into_iter()
            .find(|q| line.starts_with(q.keyword()))
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Kind of a node in the encoding graph.
///
/// Gate kinds get colors of their own, placed right after the quantifier-block
/// colors, in declaration order: AND, OR, NOT.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Literal,
    And,
    Or,
    Not,
}

impl NodeKind {
    /// Color offset of a gate kind, relative to the number of quantifier colors.
    pub const fn gate_offset(self) -> Option<usize> {
        match self {
            NodeKind::Literal => None,
            NodeKind::And => Some(0),
            NodeKind::Or => Some(1),
            NodeKind::Not => Some(2),
        }
    }

    pub const fn is_gate(self) -> bool {
        !matches!(self, NodeKind::Literal)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Literal => "lit",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.pos(), 2);
        assert_eq!(v2.neg(), -2);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_var_from_file_id() {
        assert_eq!(Var::from_file_id(7), Some(Var::new(7)));
        assert_eq!(Var::from_file_id(0), None);
        assert_eq!(Var::from_file_id(-7), None);
    }

    #[test]
    fn test_quantifier_from_line() {
        assert_eq!(Quantifier::from_line("forall(1,2)"), Some(Quantifier::Forall));
        assert_eq!(Quantifier::from_line("exists(3)"), Some(Quantifier::Exists));
        assert_eq!(Quantifier::from_line("output(4)"), None);
        assert_eq!(Quantifier::from_line(" forall(1)"), None);
    }

    #[test]
    fn test_gate_offsets() {
        let offsets: Vec<_> = [NodeKind::And, NodeKind::Or, NodeKind::Not]
            .into_iter()
            .map(|kind| {
                assert!(kind.is_gate());
                kind.gate_offset()
            })
            .collect();
        assert_eq!(offsets, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(NodeKind::Literal.gate_offset(), None);
        assert!(!NodeKind::Literal.is_gate());
    }
}
