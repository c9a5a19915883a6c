//! Error types.
//!
//! Reading a circuit fails fast: the first problem aborts the whole run, so a
//! single error value describes it completely.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error of the symmetry detection pipeline.
#[derive(Debug)]
pub enum Error {
    /// The input file cannot be opened or read.
    File { path: PathBuf, source: io::Error },
    /// The input text is not a valid QCIR circuit.
    Format(FormatError),
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::File { path, source } => write!(f, "Couldn't open {}: {}", path.display(), source),
            Error::Format(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::File { source, .. } => Some(source),
            Error::Format(e) => Some(e),
        }
    }
}

/// A malformed line in a QCIR file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormatError {
    /// 1-based number of the offending line.
    pub line: usize,
    pub kind: FormatErrorKind,
}

impl FormatError {
    pub fn new(line: usize, kind: FormatErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormatErrorKind {
    /// The first line does not start with the `#QCIR-G14` header.
    BadHeader,
    /// A quantifier keyword is not directly followed by `(`.
    ExpectedParen,
    /// A token that should be a signed integer is not one.
    InvalidToken(String),
    /// Zero, or a non-positive variable or gate identifier.
    InvalidIdentifier(i32),
    /// A variable quantified twice, or a gate id that is already taken.
    DuplicateIdentifier(i32),
    /// Neither a quantifier line nor an `output` line.
    MissingOutput,
    /// A gate line without `=`.
    MissingEquals,
    /// A gate keyword other than `and` / `or`.
    UnsupportedGate(String),
    /// A list that is not closed by `)`.
    Unterminated,
    /// A gate argument that names neither a variable nor a gate.
    UndefinedIdentifier(i32),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line;
        match &self.kind {
            FormatErrorKind::BadHeader => write!(f, "Not a valid QCIR file: expected header \"#QCIR-G14\" at line {}", line),
            FormatErrorKind::ExpectedParen => write!(f, "Not a valid QCIR file: expected \"(\" at line {}", line),
            FormatErrorKind::InvalidToken(token) => write!(f, "Not a valid variable {:?} at line {}", token, line),
            FormatErrorKind::InvalidIdentifier(id) => write!(f, "Invalid identifier {} at line {}", id, line),
            FormatErrorKind::DuplicateIdentifier(id) => write!(f, "Identifier {} is already defined, at line {}", id, line),
            FormatErrorKind::MissingOutput => write!(f, "Not a valid QCIR file: expected keyword \"output\" at line {}", line),
            FormatErrorKind::MissingEquals => write!(f, "Not a valid QCIR file: missing \"=\" at line {}", line),
            FormatErrorKind::UnsupportedGate(name) => write!(f, "Only \"and\" and \"or\" gates are allowed, found {:?} at line {}", name, line),
            FormatErrorKind::Unterminated => write!(f, "Not a valid QCIR file: missing \")\" at line {}", line),
            FormatErrorKind::UndefinedIdentifier(id) => write!(f, "Undefined variable or gate {} at line {}", id, line),
        }
    }
}

impl std::error::Error for FormatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_mentions_line() {
        let e = FormatError::new(7, FormatErrorKind::MissingEquals);
        assert_eq!(e.to_string(), "Not a valid QCIR file: missing \"=\" at line 7");

        let e = FormatError::new(3, FormatErrorKind::UnsupportedGate("xor".into()));
        assert!(e.to_string().contains("\"xor\""));
        assert!(e.to_string().ends_with("line 3"));
    }

    #[test]
    fn test_error_from_format_error() {
        let e: Error = FormatError::new(1, FormatErrorKind::BadHeader).into();
        assert!(matches!(e, Error::Format(FormatError { line: 1, .. })));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn test_file_error_display() {
        let e = Error::File {
            path: PathBuf::from("missing.qcir"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(e.to_string().starts_with("Couldn't open missing.qcir"));
    }
}
