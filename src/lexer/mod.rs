//! # Tokenizer
//!
//! Segments one source file's text into the token vocabulary of spec §3/§4.2.
//! Line-oriented: a `#` outside a captured region starts a comment running to
//! end-of-line; commas are whitespace (emitted as tokens but ignored by the
//! parser wherever they separate operands); the `string`/`error`/`include`/
//! `include_bytes` keywords capture everything from the first separating
//! whitespace character to the end of the line as one opaque lexeme, `#`
//! included. `include`/`include_bytes` payloads are unresolved file paths;
//! the source loader, not this module, turns them into spliced tokens or
//! raw bytes.
//!
//! Two's-complement handling is not needed here (unlike a 16-bit ISA's
//! lexer): all arithmetic is carried in signed 64-bit integers (spec §4.4)
//! and range-checked later by the consumer of each value.

pub mod cursor;
pub mod token;


use crate::error::{AsmError, FileId, Span};
use cursor::Cursor;
use token::{OpKind, Token, TokenKind};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<AsmError>,
}

#[must_use]
pub fn tokenize(source: &str, file: FileId) -> LexResult {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !cursor.is_at_end() {
        match lex_token(&mut cursor, file) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let (l, c) = cursor.current_pos();
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        span: Span::new(file, l, c),
    });

    LexResult { tokens, errors }
}

fn lex_token(cursor: &mut Cursor, file: FileId) -> Result<Option<Token>, AsmError> {
    while matches!(cursor.peek(), Some(' ' | '\t')) {
        cursor.advance();
    }

    if cursor.is_at_end() {
        return Ok(None);
    }

    let (sl, sc) = cursor.current_pos();
    let span = Span::new(file, sl, sc);
    let ch = cursor.peek().unwrap();

    match ch {
        '\n' | '\r' => lex_newline(cursor, span),
        '#' => lex_comment(cursor, span),
        ',' => simple(cursor, span, TokenKind::Comma, ","),
        ':' => simple(cursor, span, TokenKind::Colon, ":"),
        '=' => simple(cursor, span, TokenKind::Eq, "="),
        '(' => simple(cursor, span, TokenKind::LParen, "("),
        ')' => simple(cursor, span, TokenKind::RParen, ")"),
        '+' => simple(cursor, span, TokenKind::Op(OpKind::Plus), "+"),
        '-' => simple(cursor, span, TokenKind::Op(OpKind::Minus), "-"),
        '~' => simple(cursor, span, TokenKind::Op(OpKind::Tilde), "~"),
        '*' => simple(cursor, span, TokenKind::Op(OpKind::Star), "*"),
        '&' => simple(cursor, span, TokenKind::Op(OpKind::Amp), "&"),
        '|' => simple(cursor, span, TokenKind::Op(OpKind::Pipe), "|"),
        '^' => simple(cursor, span, TokenKind::Op(OpKind::Caret), "^"),
        '%' => simple(cursor, span, TokenKind::Percent, "%"),
        '/' => lex_slash(cursor, span),
        '<' => lex_shift(cursor, span, '<', OpKind::Shl, "<<", TokenKind::Lt),
        '>' => lex_shift(cursor, span, '>', OpKind::Shr, ">>", TokenKind::Gt),
        '\'' => lex_char(cursor, span),
        '0'..='9' => lex_number(cursor, span),
        c if is_ident_start(c) => lex_word(cursor, span),
        _ => {
            cursor.advance();
            Err(AsmError::syntax(format!("unexpected character '{}'", ch), span))
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn simple(
    cursor: &mut Cursor,
    span: Span,
    kind: TokenKind,
    lexeme: &str,
) -> Result<Option<Token>, AsmError> {
    cursor.advance();
    Ok(Some(Token {
        kind,
        lexeme: lexeme.into(),
        span,
    }))
}

fn lex_newline(cursor: &mut Cursor, span: Span) -> Result<Option<Token>, AsmError> {
    if cursor.peek() == Some('\r') {
        cursor.advance();
        if cursor.peek() == Some('\n') {
            cursor.advance();
        }
    } else {
        cursor.advance();
    }
    Ok(Some(Token {
        kind: TokenKind::Newline,
        lexeme: "\n".into(),
        span,
    }))
}

fn lex_comment(cursor: &mut Cursor, _span: Span) -> Result<Option<Token>, AsmError> {
    while let Some(ch) = cursor.peek() {
        if ch == '\n' || ch == '\r' {
            break;
        }
        cursor.advance();
    }
    Ok(None)
}

fn lex_slash(cursor: &mut Cursor, span: Span) -> Result<Option<Token>, AsmError> {
    cursor.advance();
    Ok(Some(Token {
        kind: TokenKind::Op(OpKind::Slash),
        lexeme: "/".into(),
        span,
    }))
}

/// A doubled `<</>>` is the shift operator; a single `</` `>` is the `pack`
/// FORMAT endianness marker (spec §4.3) and is returned as `single_kind`
/// rather than rejected, since only the parser knows whether it is in a
/// context that allows it.
fn lex_shift(
    cursor: &mut Cursor,
    span: Span,
    c: char,
    kind: OpKind,
    lexeme: &str,
    single_kind: TokenKind,
) -> Result<Option<Token>, AsmError> {
    cursor.advance();
    if cursor.peek() == Some(c) {
        cursor.advance();
        Ok(Some(Token {
            kind: TokenKind::Op(kind),
            lexeme: lexeme.into(),
            span,
        }))
    } else {
        Ok(Some(Token {
            kind: single_kind,
            lexeme: c.to_string(),
            span,
        }))
    }
}

fn lex_char(cursor: &mut Cursor, span: Span) -> Result<Option<Token>, AsmError> {
    cursor.advance(); // opening quote
    let mut scalar: Option<char> = None;
    let mut count = 0usize;

    loop {
        match cursor.peek() {
            None | Some('\n') | Some('\r') => {
                return Err(AsmError::syntax("unterminated character literal", span));
            }
            Some('\'') => {
                cursor.advance();
                break;
            }
            Some(ch) => {
                cursor.advance();
                count += 1;
                if count == 1 {
                    scalar = Some(ch);
                }
            }
        }
    }

    if count != 1 {
        return Err(AsmError::syntax(
            "character literal must contain exactly one Unicode scalar value",
            span,
        ));
    }

    Ok(Some(Token {
        kind: TokenKind::Char(scalar.unwrap() as i64),
        lexeme: format!("'{}'", scalar.unwrap()),
        span,
    }))
}

fn lex_number(cursor: &mut Cursor, span: Span) -> Result<Option<Token>, AsmError> {
    let mut raw = String::new();

    if cursor.peek() == Some('0') && matches!(cursor.peek2(), Some('x') | Some('X')) {
        raw.push(cursor.advance().unwrap());
        raw.push(cursor.advance().unwrap());
        let mut digits = String::new();
        while matches!(cursor.peek(), Some(c) if c.is_ascii_hexdigit()) {
            digits.push(cursor.advance().unwrap());
        }
        if digits.is_empty() {
            return Err(AsmError::syntax("expected hex digits after 0x", span));
        }
        let value = i64::from_str_radix(&digits, 16)
            .map_err(|_| AsmError::syntax(format!("invalid hex literal: 0x{digits}"), span))?;
        raw.push_str(&digits);
        return Ok(Some(Token {
            kind: TokenKind::Int(value),
            lexeme: raw,
            span,
        }));
    }

    if cursor.peek() == Some('0') && matches!(cursor.peek2(), Some('b') | Some('B')) {
        raw.push(cursor.advance().unwrap());
        raw.push(cursor.advance().unwrap());
        let mut digits = String::new();
        while matches!(cursor.peek(), Some('0' | '1')) {
            digits.push(cursor.advance().unwrap());
        }
        if digits.is_empty() {
            return Err(AsmError::syntax("expected binary digits after 0b", span));
        }
        let value = i64::from_str_radix(&digits, 2)
            .map_err(|_| AsmError::syntax(format!("invalid binary literal: 0b{digits}"), span))?;
        raw.push_str(&digits);
        return Ok(Some(Token {
            kind: TokenKind::Int(value),
            lexeme: raw,
            span,
        }));
    }

    let mut digits = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        digits.push(cursor.advance().unwrap());
    }
    let value = digits
        .parse::<i64>()
        .map_err(|_| AsmError::syntax(format!("invalid decimal literal: {digits}"), span))?;
    Ok(Some(Token {
        kind: TokenKind::Int(value),
        lexeme: digits,
        span,
    }))
}

/// Keywords whose remainder of line is captured verbatim as a single opaque
/// lexeme once a single separating whitespace character is consumed.
const CAPTURE_KEYWORDS: [&str; 4] = ["string", "error", "include", "include_bytes"];

fn lex_word(cursor: &mut Cursor, span: Span) -> Result<Option<Token>, AsmError> {
    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if is_ident_continue(c)) {
        word.push(cursor.advance().unwrap());
    }

    if CAPTURE_KEYWORDS.contains(&word.as_str()) {
        // A single separating whitespace character, then everything up to
        // (not including) the newline is the payload, verbatim.
        if matches!(cursor.peek(), Some(' ' | '\t')) {
            cursor.advance();
        }
        let rest = cursor.rest_of_line();
        let payload = String::from_utf8_lossy(rest).into_owned();
        cursor.advance_bytes(rest.len());
        let kind = match word.as_str() {
            "string" => TokenKind::StringRest(payload.clone()),
            "error" => TokenKind::ErrorRest(payload.clone()),
            "include" => TokenKind::IncludeRest(payload.clone()),
            _ => TokenKind::IncludeBytesRest(payload.clone()),
        };
        return Ok(Some(Token {
            kind,
            lexeme: format!("{word} {payload}"),
            span,
        }));
    }

    Ok(Some(Token {
        kind: TokenKind::Ident(word.clone()),
        lexeme: word,
        span,
    }))
}
