use core::fmt;

use thiserror::Error;

/// Compile-time diagnostic categories. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("undefined name `{0}`")]
    Undefined(String),
    #[error("`{0}` defined twice")]
    Duplicate(String),
    #[error("{0}")]
    Grammar(String),
    #[error("unsupported composition: {0}")]
    Composition(String),
    #[error("bad array count {0}")]
    BadCount(i64),
    #[error("undefined flats or variants remain after parse: {0}")]
    Lingering(String),
    #[error("recursive definition of flat `{0}`")]
    Recursive(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Source line, when the failure happened while reading one.
    pub line: Option<u32>,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub fn new(line: u32, kind: CompileErrorKind) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }

    pub fn no_line(kind: CompileErrorKind) -> Self {
        Self { line: None, kind }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
