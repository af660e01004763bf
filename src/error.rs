//! Shared diagnostic types used by every pass.
//!
//! Every `AsmError` carries a [`Span`] (file + line + column) and an
//! [`ErrorKind`] category drawn from spec §7. Passes collect independent
//! errors into a `Vec<AsmError>` instead of aborting on the first one; only
//! I/O failures and other non-source-position conditions are propagated as
//! [`LoadError`] / `io::Error` instead.

use std::path::PathBuf;

use thiserror::Error;

/// Index into the file table maintained by the source loader.
pub type FileId = u32;

/// A source location: which file, which line, which column (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub file: FileId,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(file: FileId, line: usize, col: usize) -> Self {
        Self { file, line, col }
    }
}

/// Category of a diagnostic, per spec §7. Carries no data itself — the
/// human-readable detail lives in `AsmError::message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    IncludeResolution,
    NameResolution,
    Range,
    Alignment,
    InstructionForm,
    ExplicitAbort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsmError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
}

impl AsmError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn name_resolution(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::NameResolution, message, span)
    }

    pub fn range(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Range, message, span)
    }

    pub fn alignment(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Alignment, message, span)
    }

    pub fn instruction_form(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::InstructionForm, message, span)
    }

    pub fn undefined_identifier(name: &str, span: Span) -> Self {
        Self::name_resolution(format!("undefined identifier '{name}'"), span)
    }

    pub fn duplicate_constant(name: &str, first: Span, span: Span) -> Self {
        Self::name_resolution(
            format!(
                "constant '{name}' redefined (first defined at {}:{})",
                first.line, first.col
            ),
            span,
        )
    }
}

impl std::fmt::Display for AsmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error ({}:{}): {}", self.span.line, self.span.col, self.message)
    }
}

impl std::error::Error for AsmError {}

/// Non-diagnostic failures: these abort assembly immediately rather than
/// being collected alongside `AsmError`s, since they carry no meaningful
/// source position within the program being assembled.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("include '{0}' not found (searched: {1:?})")]
    IncludeNotFound(String, Vec<PathBuf>),

    #[error("circular include detected: '{0}'")]
    CircularInclude(String),
}

/// Everything that can stop assembly before a byte is produced.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{} error(s) during assembly", .0.len())]
    Diagnostics(Vec<AsmError>),
}
