//! Reader for the QCIR-G14 circuit format.
//!
//! # Format
//!
//! ```text
//! #QCIR-G14                 # header, trailing content ignored
//! forall(1, 2)              # quantifier blocks, one color each
//! exists(3, 4)
//! output(7)                 # content after `output` is not checked
//! 5 = and(1, -3)            # gates: `and` / `or` over signed literals
//! 6 = or(2, 4)
//! 7 = and(-5, 6)
//! ```
//!
//! A line is a comment when its first `#` comes before its first `)`, or when
//! it has a `#` and no `)` at all. This means `# note (x)` is a comment while
//! `5 = and(1, 2) # note` is a gate. Blank lines are skipped.
//!
//! Gate arguments may reference any gate of the file, also one defined further
//! down: identifiers are only resolved to node indices once the whole file has
//! been read. A negated reference to a gate (`-5` above) has no node of its own,
//! so a NOT node is synthesized for it, once per distinct gate.

use std::path::Path;

use log::{debug, trace};

use crate::circuit::{Circuit, ColorClass, Node, VarMap};
use crate::error::{Error, FormatError, FormatErrorKind};
use crate::types::{NodeKind, Quantifier, Var};

/// Magic header every QCIR-G14 file starts with.
pub const HEADER: &str = "#QCIR-G14";

const OUTPUT: &str = "output";

/// Reads and parses a QCIR file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Circuit, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_str(&text)?)
}

/// Parses the full text of a QCIR file.
pub fn parse_str(text: &str) -> Result<Circuit, FormatError> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));

    match lines.next() {
        Some((_, header)) if header.starts_with(HEADER) => {}
        _ => return Err(FormatError::new(1, FormatErrorKind::BadHeader)),
    }

    let mut reader = Reader::default();
    let mut lines = lines.filter(|(_, line)| !is_comment(line));

    // Quantifier prefix, terminated by the `output` line.
    let mut output = None;
    for (number, line) in lines.by_ref() {
        if let Some(quantifier) = Quantifier::from_line(line) {
            reader.read_quantifier(number, quantifier, &line[quantifier.keyword().len()..])?;
            continue;
        }
        match line.strip_prefix(OUTPUT) {
            Some(rest) => {
                output = Some(rest.trim().to_string());
                break;
            }
            None => return Err(FormatError::new(number, FormatErrorKind::MissingOutput)),
        }
    }
    let Some(output) = output else {
        let number = text.lines().count() + 1;
        return Err(FormatError::new(number, FormatErrorKind::MissingOutput));
    };

    for (number, line) in lines {
        reader.read_gate(number, line)?;
    }

    reader.finish(output)
}

/// Whether a line is skipped as a comment.
///
/// Only the first `#` and the first `)` of the line matter, so a line such as
/// `5 = and(1, 2) # note` is a gate while `# see f(x)` and `# note` are
/// comments.
pub fn is_comment(line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    match line.find('#') {
        None => false,
        Some(hash) => line.find(')').map_or(true, |paren| hash <= paren),
    }
}

fn parse_int(token: &str, line: usize) -> Result<i32, FormatError> {
    let token = token.trim();
    token
        .parse()
        .map_err(|_| FormatError::new(line, FormatErrorKind::InvalidToken(token.to_string())))
}

/// A node whose neighbors are still signed file-level identifiers.
#[derive(Debug)]
struct PendingNode {
    file_id: i32,
    kind: NodeKind,
    line: usize,
    adj: Vec<i32>,
}

impl PendingNode {
    fn new(file_id: i32, kind: NodeKind, line: usize) -> Self {
        Self {
            file_id,
            kind,
            line,
            adj: Vec::new(),
        }
    }
}

/// Edge `from -> to` recorded during the gate pass, applied after it.
#[derive(Debug, Copy, Clone)]
struct BackEdge {
    from: i32,
    to: i32,
    line: usize,
}

#[derive(Debug, Default)]
struct Reader {
    nodes: Vec<PendingNode>,
    color_classes: Vec<ColorClass>,
    var_map: VarMap,
    num_literals: usize,
    back_edges: Vec<BackEdge>,
}

impl Reader {
    /// Reads `(v1, ..., vk)` after a quantifier keyword; opens a new color class.
    fn read_quantifier(&mut self, line: usize, quantifier: Quantifier, rest: &str) -> Result<(), FormatError> {
        let list = rest
            .strip_prefix('(')
            .ok_or_else(|| FormatError::new(line, FormatErrorKind::ExpectedParen))?;
        let close = list
            .find(')')
            .ok_or_else(|| FormatError::new(line, FormatErrorKind::Unterminated))?;

        self.color_classes.push(ColorClass { quantifier, vars: Vec::new() });
        for token in list[..close].split(',') {
            let id = parse_int(token, line)?;
            let var = Var::from_file_id(id).ok_or_else(|| FormatError::new(line, FormatErrorKind::InvalidIdentifier(id)))?;
            self.store_variable(line, var)?;
        }
        debug!(
            "{} block {} with {} variables",
            quantifier,
            self.color_classes.len() - 1,
            self.color_classes.last().map_or(0, |class| class.vars.len())
        );
        Ok(())
    }

    /// Registers both literals of a variable as new, mutually adjacent nodes.
    fn store_variable(&mut self, line: usize, var: Var) -> Result<(), FormatError> {
        let pos = self.nodes.len();
        if !self.var_map.insert(var.pos(), pos) {
            return Err(FormatError::new(line, FormatErrorKind::DuplicateIdentifier(var.pos())));
        }
        self.var_map.insert(var.neg(), pos + 1);

        let mut positive = PendingNode::new(var.pos(), NodeKind::Literal, line);
        let mut negative = PendingNode::new(var.neg(), NodeKind::Literal, line);
        positive.adj.push(var.neg());
        negative.adj.push(var.pos());
        self.nodes.push(positive);
        self.nodes.push(negative);
        self.num_literals += 2;

        // Both literals share the color of the class, so only the variable is stored.
        if let Some(class) = self.color_classes.last_mut() {
            class.vars.push(var);
        }
        Ok(())
    }

    /// Reads `<gateId> = and(<lits>)` or `<gateId> = or(<lits>)`.
    fn read_gate(&mut self, line: usize, text: &str) -> Result<(), FormatError> {
        let eq = text
            .find('=')
            .ok_or_else(|| FormatError::new(line, FormatErrorKind::MissingEquals))?;
        let gate_id = parse_int(&text[..eq], line)?;
        if gate_id <= 0 {
            return Err(FormatError::new(line, FormatErrorKind::InvalidIdentifier(gate_id)));
        }

        let rest = &text[eq + 1..];
        let (keyword, args) = match rest.find('(') {
            Some(open) => (&rest[..open], Some(&rest[open + 1..])),
            None => (rest, None),
        };
        let keyword: String = keyword.chars().filter(|c| !c.is_whitespace()).collect();
        let kind = match keyword.as_str() {
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            _ => return Err(FormatError::new(line, FormatErrorKind::UnsupportedGate(keyword))),
        };
        let args = args.ok_or_else(|| FormatError::new(line, FormatErrorKind::Unterminated))?;
        let close = args
            .find(')')
            .ok_or_else(|| FormatError::new(line, FormatErrorKind::Unterminated))?;
        let args = &args[..close];

        let gate_index = self.nodes.len();
        if !self.var_map.insert(gate_id, gate_index) {
            return Err(FormatError::new(line, FormatErrorKind::DuplicateIdentifier(gate_id)));
        }
        self.nodes.push(PendingNode::new(gate_id, kind, line));

        if args.trim().is_empty() {
            trace!("gate {} = {}() has no inputs", gate_id, kind);
            return Ok(());
        }
        for token in args.split(',') {
            let lit = parse_int(token, line)?;
            // Both polarities of an input must be representable.
            if lit == 0 || lit.checked_neg().is_none() {
                return Err(FormatError::new(line, FormatErrorKind::InvalidIdentifier(lit)));
            }
            self.read_gate_input(line, gate_id, gate_index, lit);
        }
        Ok(())
    }

    /// Connects the gate at `gate_index` to the input literal `lit`.
    fn read_gate_input(&mut self, line: usize, gate_id: i32, gate_index: usize, lit: i32) {
        let names_literal = self.var_map.get(-lit).is_some_and(|index| index < self.num_literals);

        if lit < 0 && !names_literal {
            // Negated gate: route the edge through a NOT node, created once.
            let not_index = match self.var_map.get(lit) {
                Some(index) => index,
                None => {
                    let index = self.nodes.len();
                    self.var_map.insert(lit, index);
                    let mut not = PendingNode::new(lit, NodeKind::Not, line);
                    not.adj.push(-lit);
                    self.nodes.push(not);
                    self.back_edges.push(BackEdge { from: -lit, to: lit, line });
                    trace!("synthesized NOT node {} for gate {}", index, -lit);
                    index
                }
            };
            self.nodes[not_index].adj.push(gate_id);
            self.nodes[gate_index].adj.push(lit);
        } else {
            self.nodes[gate_index].adj.push(lit);
            self.back_edges.push(BackEdge { from: lit, to: gate_id, line });
        }
    }

    /// Applies the back-edges and resolves identifiers to node indices.
    fn finish(mut self, output: String) -> Result<Circuit, FormatError> {
        for edge in std::mem::take(&mut self.back_edges) {
            let index = self
                .var_map
                .get(edge.from)
                .ok_or_else(|| FormatError::new(edge.line, FormatErrorKind::UndefinedIdentifier(edge.from)))?;
            self.nodes[index].adj.push(edge.to);
        }

        let var_map = self.var_map;
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| {
                let neighbors = node
                    .adj
                    .iter()
                    .map(|&id| {
                        var_map
                            .get(id)
                            .ok_or_else(|| FormatError::new(node.line, FormatErrorKind::UndefinedIdentifier(id)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node {
                    file_id: node.file_id,
                    kind: node.kind,
                    neighbors,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        debug!(
            "parsed circuit: {} blocks, {} literal nodes, {} gate nodes, output {:?}",
            self.color_classes.len(),
            self.num_literals,
            nodes.len() - self.num_literals,
            output
        );

        Ok(Circuit {
            nodes,
            color_classes: self.color_classes,
            var_map,
            num_literals: self.num_literals,
            output,
        })
    }
}
