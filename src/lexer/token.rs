//! Token vocabulary, per spec §3/§4.2.

use crate::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    /// Scalar value of a single-quoted character literal.
    Char(i64),
    /// Rest-of-line payload captured verbatim after `string` and a single
    /// separating whitespace character.
    StringRest(String),
    /// Rest-of-line payload captured verbatim after `error` and a single
    /// separating whitespace character.
    ErrorRest(String),
    /// Rest-of-line payload captured verbatim after `include` and a single
    /// separating whitespace character: the unresolved include path.
    IncludeRest(String),
    /// Rest-of-line payload captured verbatim after `include_bytes` and a
    /// single separating whitespace character: the unresolved path.
    IncludeBytesRest(String),
    /// Never produced by the lexer. The source loader resolves an
    /// `IncludeBytesRest` token by reading the target file and replacing it
    /// with this token, carrying the file's raw bytes straight through to
    /// the parser as an `IncludeBytes` item.
    IncludeBytesLiteral(Vec<u8>),
    Colon,
    Comma,
    Eq,
    LParen,
    RParen,
    Op(OpKind),
    Percent,
    /// A single, un-doubled `<` or `>`: only legal as the endianness marker
    /// of a `pack` directive's FORMAT token (spec §4.3). Anywhere else the
    /// parser rejects it.
    Lt,
    Gt,
    Newline,
    Eof,
}

/// Arithmetic/bitwise operators. `%` is deliberately absent — the lexer
/// emits a distinct `Percent` token for it (spec §3's token vocabulary),
/// since it serves double duty as the modulo operator and as the prefix of
/// the `%hi`/`%lo`/`%position` modifier nodes; the parser disambiguates by
/// lookahead (`% ident (` is a modifier, anything else is binary modulo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Plus,
    Minus,
    Tilde,
    Star,
    Slash,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
}

impl TokenKind {
    pub fn is_newline(&self) -> bool {
        matches!(self, TokenKind::Newline)
    }
}
