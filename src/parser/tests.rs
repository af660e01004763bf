use super::ast::*;
use super::*;
use crate::lexer::tokenize;

fn parse_ok(src: &str) -> Vec<Item> {
    let lexed = tokenize(src, 0);
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    let r = parse(&lexed.tokens, Endian::Little);
    assert!(r.errors.is_empty(), "parse errors: {:?}", r.errors);
    r.items
}

fn parse_err(src: &str) -> Vec<AsmError> {
    let lexed = tokenize(src, 0);
    let r = parse(&lexed.tokens, Endian::Little);
    if !lexed.errors.is_empty() {
        return lexed.errors;
    }
    r.errors
}

#[test]
fn constant_def() {
    let items = parse_ok("FOO = 1 + 2\n");
    assert_eq!(items.len(), 1);
    match &items[0] {
        Item::ConstantDef { name, expr, .. } => {
            assert_eq!(name, "FOO");
            assert_eq!(
                *expr,
                Expr::Binary(BinOp::Add, Box::new(Expr::Int(1)), Box::new(Expr::Int(2)), expr.span())
            );
        }
        other => panic!("expected ConstantDef, got {other:?}"),
    }
}

#[test]
fn label_then_instruction() {
    let items = parse_ok("loop:\n  addi x1, zero, 12\n");
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[0], Item::Label { name, .. } if name == "loop"));
    match &items[1] {
        Item::Instruction { mnemonic, operands, .. } => {
            assert_eq!(mnemonic, "addi");
            assert_eq!(operands.len(), 3);
            assert_eq!(operands[0], Operand::Reg(1));
            assert_eq!(operands[1], Operand::Reg(0));
            assert_eq!(operands[2], Operand::Expr(Expr::Int(12)));
        }
        other => panic!("expected Instruction, got {other:?}"),
    }
}

#[test]
fn instruction_without_commas() {
    let items = parse_ok("addi x1 zero 12\n");
    assert!(matches!(&items[0], Item::Instruction { .. }));
}

#[test]
fn unknown_mnemonic_is_instruction_form_error() {
    let errs = parse_err("frobnicate x1\n");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::InstructionForm);
}

#[test]
fn pseudo_instruction_is_tagged_separately() {
    let items = parse_ok("nop\n");
    assert!(matches!(&items[0], Item::PseudoInstruction { mnemonic, .. } if mnemonic == "nop"));
}

#[test]
fn memory_operand_sugar() {
    let items = parse_ok("lw x5, 4(x2)\n");
    match &items[0] {
        Item::Instruction { operands, .. } => {
            assert_eq!(operands[0], Operand::Reg(5));
            assert_eq!(operands[1], Operand::Mem { offset: Expr::Int(4), base: 2 });
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn atomic_bare_register_memory_operand() {
    let items = parse_ok("lr.w x5, (x2)\n");
    match &items[0] {
        Item::Instruction { operands, .. } => {
            assert_eq!(operands[0], Operand::Reg(5));
            assert_eq!(operands[1], Operand::Mem { offset: Expr::Int(0), base: 2 });
        }
        other => panic!("{other:?}"),
    }

    let items2 = parse_ok("amoswap.w x5, x6, (x2)\n");
    match &items2[0] {
        Item::Instruction { operands, .. } => {
            assert_eq!(operands.len(), 3);
            assert_eq!(operands[2], Operand::Mem { offset: Expr::Int(0), base: 2 });
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn data_directives() {
    let items = parse_ok("bytes 1 2 3 4\n");
    match &items[0] {
        Item::Bytes { values, .. } => assert_eq!(values.len(), 4),
        other => panic!("{other:?}"),
    }
}

#[test]
fn data_directive_requires_one_value() {
    let errs = parse_err("bytes\n");
    assert_eq!(errs.len(), 1);
}

#[test]
fn shorthand_directives_become_pack() {
    let items = parse_ok("dw 0x1000\n");
    match &items[0] {
        Item::Pack { ty, endian, .. } => {
            assert_eq!(*ty, PackType::I32);
            assert_eq!(*endian, Endian::Little);
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn pack_directive_parses_format_and_endianness() {
    let items = parse_ok("pack <I 0x01020304\n");
    match &items[0] {
        Item::Pack { ty, endian, .. } => {
            assert_eq!(*ty, PackType::U32);
            assert_eq!(*endian, Endian::Little);
        }
        other => panic!("{other:?}"),
    }
    let items2 = parse_ok("pack >I 0x01020304\n");
    match &items2[0] {
        Item::Pack { endian, .. } => assert_eq!(*endian, Endian::Big),
        other => panic!("{other:?}"),
    }
}

#[test]
fn align_directive() {
    let items = parse_ok("align 4\n");
    assert!(matches!(&items[0], Item::Align { amount: Expr::Int(4), .. }));
}

#[test]
fn string_directive_captures_rest_verbatim() {
    let items = parse_ok("string hello, world # not a comment\n");
    match &items[0] {
        Item::StringLiteral { bytes, .. } => {
            assert_eq!(bytes, b"hello, world # not a comment");
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn error_directive_captures_message() {
    let items = parse_ok("error something went wrong\n");
    match &items[0] {
        Item::ErrorDirective { message, .. } => assert_eq!(message, "something went wrong"),
        other => panic!("{other:?}"),
    }
}

#[test]
fn percent_hi_lo_and_position_modifiers() {
    let items = parse_ok("li t0, %hi(ADDR)\n");
    match &items[0] {
        Item::PseudoInstruction { operands, .. } => match &operands[1] {
            Operand::Expr(Expr::Hi(inner, _)) => {
                assert!(matches!(**inner, Expr::Ident(ref n, _) if n == "ADDR"))
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }

    let items2 = parse_ok("li t0, %position(data, 0x08000000)\n");
    match &items2[0] {
        Item::PseudoInstruction { operands, .. } => match &operands[1] {
            Operand::Expr(Expr::Position(label, base, _)) => {
                assert_eq!(label, "data");
                assert!(matches!(**base, Expr::Int(0x08000000)));
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }
}

#[test]
fn expression_precedence() {
    // `1 + 2 * 3` -> Add(1, Mul(2, 3)), not Mul(Add(1, 2), 3).
    let items = parse_ok("FOO = 1 + 2 * 3\n");
    match &items[0] {
        Item::ConstantDef { expr, .. } => match expr {
            Expr::Binary(BinOp::Add, lhs, rhs, _) => {
                assert!(matches!(**lhs, Expr::Int(1)));
                assert!(matches!(**rhs, Expr::Binary(BinOp::Mul, _, _, _)));
            }
            other => panic!("{other:?}"),
        },
        other => panic!("{other:?}"),
    }
}

#[test]
fn parenthesized_expression_overrides_precedence() {
    let items = parse_ok("FOO = (1 + 2) * 3\n");
    match &items[0] {
        Item::ConstantDef { expr, .. } => {
            assert!(matches!(expr, Expr::Binary(BinOp::Mul, _, _, _)));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn unary_operators() {
    let items = parse_ok("FOO = -1\n");
    assert!(matches!(
        &items[0],
        Item::ConstantDef { expr: Expr::Unary(UnaryOp::Neg, _, _), .. }
    ));
    let items2 = parse_ok("FOO = ~1\n");
    assert!(matches!(
        &items2[0],
        Item::ConstantDef { expr: Expr::Unary(UnaryOp::Not, _, _), .. }
    ));
}

#[test]
fn modulo_operator_is_distinct_from_modifier_percent() {
    let items = parse_ok("FOO = 10 % 3\n");
    assert!(matches!(
        &items[0],
        Item::ConstantDef { expr: Expr::Binary(BinOp::Mod, _, _, _), .. }
    ));
}

#[test]
fn bare_include_is_a_syntax_error() {
    let errs = parse_err("include chip/uart.inc\n");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::Syntax);
}

#[test]
fn bare_include_bytes_is_a_syntax_error() {
    let errs = parse_err("include_bytes boot.bin\n");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::Syntax);
}

#[test]
fn loader_resolved_include_bytes_literal_becomes_an_item() {
    // The source loader replaces `IncludeBytesRest` with this token once it
    // has read the target file; the parser never resolves paths itself.
    let file = 0;
    let tokens = vec![
        Token {
            kind: TokenKind::IncludeBytesLiteral(vec![1, 2, 3]),
            lexeme: "include_bytes boot.bin".into(),
            span: Span::new(file, 1, 1),
        },
        Token {
            kind: TokenKind::Newline,
            lexeme: "\n".into(),
            span: Span::new(file, 1, 24),
        },
        Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: Span::new(file, 2, 1),
        },
    ];
    let r = parse(&tokens, Endian::Little);
    assert!(r.errors.is_empty());
    match &r.items[0] {
        Item::IncludeBytes { bytes, .. } => assert_eq!(bytes, &vec![1, 2, 3]),
        other => panic!("{other:?}"),
    }
}

#[test]
fn stray_close_paren_is_a_syntax_error() {
    let errs = parse_err("nop )\n");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::Syntax);
}
