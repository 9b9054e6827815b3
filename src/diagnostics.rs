//! Diagnostics (§12): source locations and the per-phase error kinds.
//!
//! Grounded on the corpus's hand-rolled error enum pattern (see
//! `codegen::CodeGenError`): small `Display`/`Error` enums rather than a
//! `thiserror`/`anyhow` stack, unified here under [`CompileError`].

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        SourceLocation { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub loc: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.loc, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub loc: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.loc, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaError {
    pub message: String,
    pub loc: SourceLocation,
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.loc, self.message)
    }
}

/// Top-level error unifying every compiler phase. Codegen failures keep
/// their own type (`codegen::CodeGenError`) since, per §7, they indicate a
/// compiler bug rather than a user-facing diagnostic about the source
/// program; `Codegen` here only exists so the `cfrontc` binary has one
/// `Result` to match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Sema(Vec<SemaError>),
    Codegen(String),
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(e) => write!(f, "{}", e),
            CompileError::Parse(e) => write!(f, "{}", e),
            CompileError::Sema(errs) => {
                for (i, e) in errs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            CompileError::Codegen(s) => write!(f, "internal compiler error: {}", s),
            CompileError::Io(s) => write!(f, "{}", s),
        }
    }
}
impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}
impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}
impl From<crate::codegen::CodeGenError> for CompileError {
    fn from(e: crate::codegen::CodeGenError) -> Self {
        CompileError::Codegen(e.to_string())
    }
}

/// Accumulates semantic errors until a statement boundary (§7 policy):
/// the analyzer keeps walking the current statement's subtree to surface
/// as many problems as possible, then the phase driver checks
/// `has_errors()` before handing off to codegen.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<SemaError>,
    path: Option<PathBuf>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: PathBuf) -> Self {
        Diagnostics {
            errors: Vec::new(),
            path: Some(path),
        }
    }

    pub fn error(&mut self, loc: SourceLocation, message: impl Into<String>) {
        self.errors.push(SemaError {
            message: message.into(),
            loc,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), CompileError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CompileError::Sema(self.errors))
        }
    }

    /// Render each diagnostic as `<path>:<line>:<col>: error: <message>` for
    /// the CLI driver's stderr stream.
    pub fn render_lines(&self) -> Vec<String> {
        let prefix = self
            .path
            .as_ref()
            .map(|p| format!("{}:", p.display()))
            .unwrap_or_default();
        self.errors
            .iter()
            .map(|e| format!("{}{}: error: {}", prefix, e.loc, e.message))
            .collect()
    }
}
