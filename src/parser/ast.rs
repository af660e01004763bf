//! # Program IR
//!
//! Defines the data structures the parser produces and every later pass
//! rewrites: [`Expr`] (the expression tree, §3) and [`Item`] (the program IR
//! element, §3). The `Item` sequence is totally ordered and no item is ever
//! dropped, only rewritten or encoded.

use crate::error::Span;

/// An arithmetic/bitwise expression tree, evaluated over signed 64-bit
/// integers (spec §4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    /// An identifier reference: a named constant or a label.
    Ident(String, Span),
    Unary(UnaryOp, Box<Expr>, Span),
    Binary(BinOp, Box<Expr>, Box<Expr>, Span),
    /// `%hi(e)`: sign-adjusted upper 20 bits of the 32-bit resolved value.
    Hi(Box<Expr>, Span),
    /// `%lo(e)`: sign-adjusted lower 12 bits, consistent with `%hi`.
    Lo(Box<Expr>, Span),
    /// `%position(label, base)`. Not permitted in a constant definition's
    /// right-hand side.
    Position(String, Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_) => Span::default(),
            Expr::Ident(_, s)
            | Expr::Unary(_, _, s)
            | Expr::Binary(_, _, _, s)
            | Expr::Hi(_, s)
            | Expr::Lo(_, s)
            | Expr::Position(_, _, s) => *s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

/// Binary operators, highest precedence first (spec §4.4):
/// `* / %` ; `+ -` ; `<< >>` ; `&` ; `^` ; `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    And,
    Xor,
    Or,
}

/// A register reference, `x0`-`x31` or an ABI alias.
pub type Reg = u8;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(Reg),
    Expr(Expr),
    /// `imm(rs)` sugar for load/store/`jalr`.
    Mem { offset: Expr, base: Reg },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// `pack` format-type character (spec §4.8, open question 9c resolved:
/// `f`/`d` write IEEE-754 bit patterns. Their operand is still evaluated by
/// the same integer expression grammar as every other directive — there is
/// no float-literal syntax — so a `pack <f`/`pack <d` value is the integer
/// the expression evaluates to, cast to `f32`/`f64`, not an arbitrary
/// decimal literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PackType {
    pub fn width(self) -> usize {
        match self {
            PackType::I8 | PackType::U8 => 1,
            PackType::I16 | PackType::U16 => 2,
            PackType::I32 | PackType::U32 | PackType::F32 => 4,
            PackType::I64 | PackType::U64 | PackType::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, PackType::F32 | PackType::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, PackType::I8 | PackType::I16 | PackType::I32 | PackType::I64)
    }

    /// Parse a `struct`-style format character (`b/B`, `h/H`, `i/I`, `q/Q`,
    /// `f`, `d`).
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'b' => PackType::I8,
            'B' => PackType::U8,
            'h' => PackType::I16,
            'H' => PackType::U16,
            'i' => PackType::I32,
            'I' => PackType::U32,
            'q' => PackType::I64,
            'Q' => PackType::U64,
            'f' => PackType::F32,
            'd' => PackType::F64,
            _ => return None,
        })
    }
}

/// One element of the program IR (spec §3). Every variant carries its
/// origin `Span` directly or through its inner fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    ConstantDef {
        name: String,
        expr: Expr,
        span: Span,
    },
    Label {
        name: String,
        span: Span,
    },
    Instruction {
        mnemonic: String,
        operands: Vec<Operand>,
        span: Span,
    },
    /// A pseudo-instruction not yet rewritten by the expander.
    PseudoInstruction {
        mnemonic: String,
        operands: Vec<Operand>,
        span: Span,
    },
    /// `li rd, imm` after expansion: size-variable, resolved during layout.
    Li {
        rd: Reg,
        imm: Expr,
        span: Span,
    },
    /// `call off` after expansion: size-variable, resolved during layout.
    Call { target: Expr, span: Span },
    /// `tail off` after expansion: size-variable, resolved during layout.
    Tail { target: Expr, span: Span },
    Bytes {
        values: Vec<Expr>,
        span: Span,
    },
    Shorts {
        values: Vec<Expr>,
        span: Span,
    },
    Ints {
        values: Vec<Expr>,
        span: Span,
    },
    Longs {
        values: Vec<Expr>,
        span: Span,
    },
    LongLongs {
        values: Vec<Expr>,
        span: Span,
    },
    /// Content is the literal text after the single separating space,
    /// preserved verbatim: no backslash-escape interpretation is performed
    /// (design note §9, open question (a): "no interpretation" chosen).
    StringLiteral {
        bytes: Vec<u8>,
        span: Span,
    },
    Pack {
        endian: Endian,
        ty: PackType,
        expr: Expr,
        span: Span,
    },
    Align {
        amount: Expr,
        span: Span,
    },
    ErrorDirective {
        message: String,
        span: Span,
    },
    IncludeBytes {
        bytes: Vec<u8>,
        span: Span,
    },
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::ConstantDef { span, .. }
            | Item::Label { span, .. }
            | Item::Instruction { span, .. }
            | Item::PseudoInstruction { span, .. }
            | Item::Li { span, .. }
            | Item::Call { span, .. }
            | Item::Tail { span, .. }
            | Item::Bytes { span, .. }
            | Item::Shorts { span, .. }
            | Item::Ints { span, .. }
            | Item::Longs { span, .. }
            | Item::LongLongs { span, .. }
            | Item::StringLiteral { span, .. }
            | Item::Pack { span, .. }
            | Item::Align { span, .. }
            | Item::ErrorDirective { span, .. }
            | Item::IncludeBytes { span, .. } => *span,
        }
    }
}
