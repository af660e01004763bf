//! # Parser
//!
//! Turns a token stream into the program IR of spec §3 (one [`ast::Item`]
//! per line). Line-oriented like the lexer: each production in spec §4.3's
//! grammar table is recognized from its leading token, and a line that does
//! not end at a newline/eof after its production is a syntax error rather
//! than silently dropping trailing tokens.
//!
//! Mnemonics are resolved against [`crate::isa::MNEMONICS`] and
//! [`crate::isa::PSEUDO_MNEMONICS`] rather than one grammar rule per
//! instruction: RV32IMAC's mnemonic surface is an order of magnitude larger
//! than a grammar built from individual productions would stay readable at.

pub mod ast;

#[cfg(test)]
mod tests;

use crate::error::{AsmError, Span};
use crate::isa;
use crate::lexer::token::{OpKind, Token, TokenKind};
use ast::{BinOp, Endian, Expr, Item, Operand, PackType, UnaryOp};

pub struct ParseResult {
    pub items: Vec<Item>,
    pub errors: Vec<AsmError>,
}

pub fn parse(tokens: &[Token], default_endian: Endian) -> ParseResult {
    let mut p = Parser {
        tokens,
        pos: 0,
        endian: default_endian,
        errors: Vec::new(),
    };
    let mut items = Vec::new();

    while !p.at_eof() {
        p.skip_blank_lines();
        if p.at_eof() {
            break;
        }
        match p.parse_line() {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => {
                p.errors.push(e);
                p.recover_to_next_line();
            }
        }
    }

    ParseResult {
        items,
        errors: p.errors,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    endian: Endian,
    errors: Vec<AsmError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek2(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn peek3(&self) -> &Token {
        let idx = (self.pos + 2).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn skip_blank_lines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_commas(&mut self) {
        while matches!(self.peek().kind, TokenKind::Comma) {
            self.advance();
        }
    }

    fn expect_end_of_line(&mut self) -> Result<(), AsmError> {
        self.skip_commas();
        match self.peek().kind {
            TokenKind::Newline | TokenKind::Eof => {
                if matches!(self.peek().kind, TokenKind::Newline) {
                    self.advance();
                }
                Ok(())
            }
            _ => Err(AsmError::syntax(
                format!("unexpected trailing token '{}'", self.peek().lexeme),
                self.peek().span,
            )),
        }
    }

    fn recover_to_next_line(&mut self) {
        while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
        if matches!(self.peek().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn parse_line(&mut self) -> Result<Option<Item>, AsmError> {
        let start = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Ident(word) => {
                // label: IDENT ':'
                if matches!(self.peek2().kind, TokenKind::Colon) {
                    self.advance();
                    self.advance();
                    self.expect_end_of_line()?;
                    return Ok(Some(Item::Label { name: word, span: start }));
                }
                // constant-def: IDENT '=' expr
                if matches!(self.peek2().kind, TokenKind::Eq) {
                    self.advance(); // ident
                    self.advance(); // '='
                    let expr = self.parse_expr()?;
                    self.expect_end_of_line()?;
                    return Ok(Some(Item::ConstantDef {
                        name: word,
                        expr,
                        span: start,
                    }));
                }
                self.parse_keyword_or_instruction(word, start)
            }
            TokenKind::IncludeBytesLiteral(bytes) => {
                self.advance();
                self.expect_end_of_line()?;
                Ok(Some(Item::IncludeBytes { bytes, span: start }))
            }
            TokenKind::IncludeRest(_) | TokenKind::IncludeBytesRest(_) => Err(AsmError::syntax(
                "'include'/'include_bytes' directive must be resolved before parsing",
                start,
            )),
            _ => Err(AsmError::syntax(
                format!("unexpected token '{}'", self.peek().lexeme),
                start,
            )),
        }
    }

    fn parse_keyword_or_instruction(&mut self, word: String, start: Span) -> Result<Option<Item>, AsmError> {
        match word.as_str() {
            "bytes" => self.parse_data_list(|values, span| Item::Bytes { values, span }, start),
            "shorts" => self.parse_data_list(|values, span| Item::Shorts { values, span }, start),
            "ints" => self.parse_data_list(|values, span| Item::Ints { values, span }, start),
            "longs" => self.parse_data_list(|values, span| Item::Longs { values, span }, start),
            "longlongs" => self.parse_data_list(|values, span| Item::LongLongs { values, span }, start),
            "db" => self.parse_shorthand(PackType::I8, start),
            "dh" => self.parse_shorthand(PackType::I16, start),
            "dw" => self.parse_shorthand(PackType::I32, start),
            "dd" => self.parse_shorthand(PackType::I64, start),
            "pack" => self.parse_pack(start),
            "align" => {
                self.advance();
                let amount = self.parse_expr()?;
                self.expect_end_of_line()?;
                Ok(Some(Item::Align { amount, span: start }))
            }
            "string" => {
                self.advance();
                let bytes = match &self.advance().kind {
                    TokenKind::StringRest(s) => s.clone().into_bytes(),
                    _ => Vec::new(),
                };
                self.expect_end_of_line()?;
                Ok(Some(Item::StringLiteral { bytes, span: start }))
            }
            "error" => {
                self.advance();
                let message = match &self.advance().kind {
                    TokenKind::ErrorRest(s) => s.clone(),
                    _ => String::new(),
                };
                self.expect_end_of_line()?;
                Ok(Some(Item::ErrorDirective { message, span: start }))
            }
            _ => self.parse_instruction(word, start),
        }
    }

    fn parse_data_list(
        &mut self,
        ctor: impl FnOnce(Vec<Expr>, Span) -> Item,
        start: Span,
    ) -> Result<Option<Item>, AsmError> {
        self.advance();
        let mut values = Vec::new();
        loop {
            self.skip_commas();
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            values.push(self.parse_expr()?);
        }
        if values.is_empty() {
            return Err(AsmError::syntax("expected at least one value", start));
        }
        self.expect_end_of_line()?;
        Ok(Some(ctor(values, start)))
    }

    fn parse_shorthand(&mut self, ty: PackType, start: Span) -> Result<Option<Item>, AsmError> {
        self.advance();
        let expr = self.parse_expr()?;
        self.expect_end_of_line()?;
        // Signedness is derived from the resolved value (spec §4.3), which
        // is not known until evaluation; the evaluator/encoder select the
        // signed-vs-unsigned format character at that point. Here the type
        // only fixes width.
        Ok(Some(Item::Pack {
            endian: self.endian,
            ty,
            expr,
            span: start,
        }))
    }

    fn parse_pack(&mut self, start: Span) -> Result<Option<Item>, AsmError> {
        self.advance();
        let (endian, fmt_char) = self.parse_pack_format(start)?;
        let ty = PackType::from_char(fmt_char)
            .ok_or_else(|| AsmError::syntax(format!("unknown pack format '{fmt_char}'"), start))?;
        let expr = self.parse_expr()?;
        self.expect_end_of_line()?;
        Ok(Some(Item::Pack {
            endian,
            ty,
            expr,
            span: start,
        }))
    }

    /// `FORMAT` is `<X` or `>X`: a single (un-doubled) `<`/`>` endianness
    /// marker immediately followed by one format character, the latter
    /// lexed as an ordinary identifier.
    fn parse_pack_format(&mut self, start: Span) -> Result<(Endian, char), AsmError> {
        let endian = match self.peek().kind {
            TokenKind::Lt => Endian::Little,
            TokenKind::Gt => Endian::Big,
            _ => {
                return Err(AsmError::syntax(
                    "expected pack format endianness marker '<' or '>'",
                    start,
                ))
            }
        };
        self.advance();
        match &self.advance().kind {
            TokenKind::Ident(s) if s.chars().count() == 1 => Ok((endian, s.chars().next().unwrap())),
            _ => Err(AsmError::syntax("expected pack format character", start)),
        }
    }

    fn parse_instruction(&mut self, mnemonic: String, start: Span) -> Result<Option<Item>, AsmError> {
        self.advance();
        let mut operands = Vec::new();
        loop {
            self.skip_commas();
            if matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            operands.push(self.parse_operand()?);
        }
        self.expect_end_of_line()?;

        if isa::is_pseudo(&mnemonic) {
            return Ok(Some(Item::PseudoInstruction {
                mnemonic,
                operands,
                span: start,
            }));
        }
        if isa::lookup(&mnemonic).is_none() {
            return Err(AsmError::instruction_form(
                format!("unknown mnemonic '{mnemonic}'"),
                start,
            ));
        }
        Ok(Some(Item::Instruction {
            mnemonic,
            operands,
            span: start,
        }))
    }

    fn parse_operand(&mut self) -> Result<Operand, AsmError> {
        // `imm(rs)` memory sugar: look ahead for a '(' after an expression
        // that isn't itself a bare register, by trying register first.
        if let TokenKind::Ident(name) = &self.peek().kind {
            if let Some(r) = isa::resolve_register(name) {
                // Could still be the start of `reg` alone, never `reg(...)`
                // per spec's grammar (memory sugar is immediate-based).
                self.advance();
                return Ok(Operand::Reg(r));
            }
        }
        // `(rs1)` with no leading immediate: the zero-offset addressing
        // atomics write (`lr.w rd, (rs1)`, `amoswap.w rd, rs2, (rs1)`).
        if matches!(self.peek().kind, TokenKind::LParen) {
            if let TokenKind::Ident(name) = &self.peek2().kind {
                if let (Some(base), TokenKind::RParen) = (isa::resolve_register(name), &self.peek3().kind) {
                    self.advance(); // '('
                    self.advance(); // register
                    self.advance(); // ')'
                    return Ok(Operand::Mem { offset: Expr::Int(0), base });
                }
            }
        }
        let offset = self.parse_expr()?;
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            let base_span = self.peek().span;
            let base_name = match &self.advance().kind {
                TokenKind::Ident(s) => s.clone(),
                _ => return Err(AsmError::syntax("expected register inside '(...)'", base_span)),
            };
            let base = isa::resolve_register(&base_name)
                .ok_or_else(|| AsmError::syntax(format!("unknown register '{base_name}'"), base_span))?;
            if !matches!(self.peek().kind, TokenKind::RParen) {
                return Err(AsmError::syntax("expected ')'", self.peek().span));
            }
            self.advance();
            return Ok(Operand::Mem { offset, base });
        }
        Ok(Operand::Expr(offset))
    }

    // --- Expression grammar (spec §4.4 precedence, low to high as parsed):
    // or -> xor -> and -> shift -> add -> mul -> unary -> atom

    fn parse_expr(&mut self) -> Result<Expr, AsmError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_xor()?;
        while matches!(self.peek().kind, TokenKind::Op(OpKind::Pipe)) {
            let span = self.advance().span;
            let rhs = self.parse_xor()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek().kind, TokenKind::Op(OpKind::Caret)) {
            let span = self.advance().span;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Xor, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_shift()?;
        while matches!(self.peek().kind, TokenKind::Op(OpKind::Amp)) {
            let span = self.advance().span;
            let rhs = self.parse_shift()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Op(OpKind::Shl) => BinOp::Shl,
                TokenKind::Op(OpKind::Shr) => BinOp::Shr,
                _ => break,
            };
            let span = self.advance().span;
            let rhs = self.parse_add()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Op(OpKind::Plus) => BinOp::Add,
                TokenKind::Op(OpKind::Minus) => BinOp::Sub,
                _ => break,
            };
            let span = self.advance().span;
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, AsmError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Op(OpKind::Star) => BinOp::Mul,
                TokenKind::Op(OpKind::Slash) => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            // `%` here is only modulo if it is not immediately followed by
            // an identifier-then-'(' (the %hi/%lo/%position modifier
            // shape); that shape only ever appears in atom position, so by
            // the time we're looking for an infix operator, a bare Percent
            // is unambiguously modulo.
            let span = self.advance().span;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, AsmError> {
        let (op, span) = match self.peek().kind {
            TokenKind::Op(OpKind::Plus) => (Some(UnaryOp::Plus), self.peek().span),
            TokenKind::Op(OpKind::Minus) => (Some(UnaryOp::Neg), self.peek().span),
            TokenKind::Op(OpKind::Tilde) => (Some(UnaryOp::Not), self.peek().span),
            _ => (None, Span::default()),
        };
        if let Some(op) = op {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(op, Box::new(inner), span));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, AsmError> {
        let span = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(Expr::Int(v))
            }
            TokenKind::Char(v) => {
                self.advance();
                Ok(Expr::Int(v))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                if !matches!(self.peek().kind, TokenKind::RParen) {
                    return Err(AsmError::syntax("expected ')'", self.peek().span));
                }
                self.advance();
                Ok(inner)
            }
            TokenKind::Percent => self.parse_modifier(span),
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name, span))
            }
            _ => Err(AsmError::syntax(
                format!("unexpected token '{}' in expression", self.peek().lexeme),
                span,
            )),
        }
    }

    /// `%hi(expr)`, `%lo(expr)`, `%position(label, expr)`.
    fn parse_modifier(&mut self, span: Span) -> Result<Expr, AsmError> {
        self.advance(); // '%'
        let name_span = self.peek().span;
        let name = match &self.advance().kind {
            TokenKind::Ident(s) => s.clone(),
            _ => return Err(AsmError::syntax("expected modifier name after '%'", name_span)),
        };
        if !matches!(self.peek().kind, TokenKind::LParen) {
            return Err(AsmError::syntax("expected '(' after modifier name", self.peek().span));
        }
        self.advance();

        match name.as_str() {
            "hi" => {
                let inner = self.parse_expr()?;
                self.close_paren()?;
                Ok(Expr::Hi(Box::new(inner), span))
            }
            "lo" => {
                let inner = self.parse_expr()?;
                self.close_paren()?;
                Ok(Expr::Lo(Box::new(inner), span))
            }
            "position" => {
                let label_span = self.peek().span;
                let label = match &self.advance().kind {
                    TokenKind::Ident(s) => s.clone(),
                    _ => return Err(AsmError::syntax("expected label name", label_span)),
                };
                self.skip_commas();
                let base = self.parse_expr()?;
                self.close_paren()?;
                Ok(Expr::Position(label, Box::new(base), span))
            }
            other => Err(AsmError::syntax(format!("unknown modifier '%{other}'"), span)),
        }
    }

    fn close_paren(&mut self) -> Result<(), AsmError> {
        if !matches!(self.peek().kind, TokenKind::RParen) {
            return Err(AsmError::syntax("expected ')'", self.peek().span));
        }
        self.advance();
        Ok(())
    }
}
