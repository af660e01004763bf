use super::*;
use crate::lexer::tokenize;
use crate::parser::{ast::Endian, parse};

fn expand_src(src: &str) -> Vec<Item> {
    let lexed = tokenize(src, 0);
    assert!(lexed.errors.is_empty(), "{:?}", lexed.errors);
    let r = parse(&lexed.tokens, Endian::Little);
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    expand(r.items).expect("expand should succeed")
}

fn only_instruction(items: &[Item]) -> (&str, &[Operand]) {
    assert_eq!(items.len(), 1);
    match &items[0] {
        Item::Instruction { mnemonic, operands, .. } => (mnemonic.as_str(), operands.as_slice()),
        other => panic!("expected single Instruction, got {other:?}"),
    }
}

#[test]
fn nop_expands_to_addi_zero_zero_zero() {
    let items = expand_src("nop\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "addi");
    assert_eq!(ops, &[Operand::Reg(0), Operand::Reg(0), Operand::Expr(Expr::Int(0))]);
}

#[test]
fn mv_expands_to_addi() {
    let items = expand_src("mv x1, x2\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "addi");
    assert_eq!(ops[0], Operand::Reg(1));
    assert_eq!(ops[1], Operand::Reg(2));
}

#[test]
fn neg_expands_to_sub_with_zero_first() {
    let items = expand_src("neg x1, x2\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "sub");
    assert_eq!(ops, &[Operand::Reg(1), Operand::Reg(0), Operand::Reg(2)]);
}

#[test]
fn beqz_expands_with_explicit_zero_register() {
    let items = expand_src("beqz x5, target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "beq");
    assert_eq!(ops[0], Operand::Reg(5));
    assert_eq!(ops[1], Operand::Reg(0));
}

#[test]
fn blez_swaps_operands_into_bge() {
    let items = expand_src("blez x5, target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "bge");
    assert_eq!(ops[0], Operand::Reg(0));
    assert_eq!(ops[1], Operand::Reg(5));
}

#[test]
fn bgtz_swaps_operands_into_blt() {
    let items = expand_src("bgtz x5, target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "blt");
    assert_eq!(ops[0], Operand::Reg(0));
    assert_eq!(ops[1], Operand::Reg(5));
}

#[test]
fn bgt_swaps_source_registers_into_blt() {
    let items = expand_src("bgt x1, x2, target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "blt");
    assert_eq!(ops[0], Operand::Reg(2));
    assert_eq!(ops[1], Operand::Reg(1));
}

#[test]
fn j_expands_to_jal_x0() {
    let items = expand_src("j target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "jal");
    assert_eq!(ops[0], Operand::Reg(0));
}

#[test]
fn one_operand_jal_implies_return_address_register() {
    let items = expand_src("jal target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "jal");
    assert_eq!(ops[0], Operand::Reg(1));
}

#[test]
fn two_operand_jal_passes_through_unchanged() {
    let items = expand_src("jal x3, target\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "jal");
    assert_eq!(ops[0], Operand::Reg(3));
}

#[test]
fn jr_expands_to_jalr_x0() {
    let items = expand_src("jr x5\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "jalr");
    assert_eq!(ops[0], Operand::Reg(0));
    assert_eq!(ops[1], Operand::Reg(5));
}

#[test]
fn ret_expands_to_jalr_x0_x1_0() {
    let items = expand_src("ret\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "jalr");
    assert_eq!(ops, &[Operand::Reg(0), Operand::Reg(1), Operand::Expr(Expr::Int(0))]);
}

#[test]
fn fence_no_args_expands_to_iorw_iorw() {
    let items = expand_src("fence\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "fence");
    assert_eq!(ops.len(), 2);
}

#[test]
fn li_becomes_dedicated_item() {
    let lexed = tokenize("li t0, 12\n", 0);
    let r = parse(&lexed.tokens, Endian::Little);
    let items = expand(r.items).unwrap();
    assert_eq!(items.len(), 1);
    assert!(matches!(&items[0], Item::Li { rd: 5, .. }));
}

#[test]
fn call_and_tail_become_dedicated_items() {
    let lexed = tokenize("call target\ntail target\n", 0);
    let r = parse(&lexed.tokens, Endian::Little);
    let items = expand(r.items).unwrap();
    assert!(matches!(&items[0], Item::Call { .. }));
    assert!(matches!(&items[1], Item::Tail { .. }));
}

#[test]
fn wrong_arity_is_an_instruction_form_error() {
    let lexed = tokenize("mv x1\n", 0);
    let r = parse(&lexed.tokens, Endian::Little);
    let errs = expand(r.items).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::InstructionForm);
}

#[test]
fn real_instructions_pass_through_untouched() {
    let items = expand_src("addi x1, zero, 12\n");
    let (m, ops) = only_instruction(&items);
    assert_eq!(m, "addi");
    assert_eq!(ops[0], Operand::Reg(1));
}
