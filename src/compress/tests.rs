use super::*;
use crate::error::Span;
use indexmap::IndexMap;

fn sp() -> Span {
    Span::default()
}

fn instr(mnemonic: &str, operands: Vec<Operand>) -> Item {
    Item::Instruction { mnemonic: mnemonic.to_string(), operands, span: sp() }
}

fn label(name: &str) -> Item {
    Item::Label { name: name.to_string(), span: sp() }
}

fn no_constants() -> IndexMap<String, i64> {
    IndexMap::new()
}

#[test]
fn addi_zero_zero_zero_becomes_c_nop() {
    let items = vec![instr("addi", vec![reg(0), reg(0), imm(0)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.nop", vec![]));
}

#[test]
fn addi_with_zero_source_becomes_c_li() {
    let items = vec![instr("addi", vec![reg(5), reg(0), imm(7)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.li", vec![reg(5), imm(7)]));
}

#[test]
fn addi_with_out_of_range_immediate_stays_uncompressed() {
    let items = vec![instr("addi", vec![reg(5), reg(0), imm(1000)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("addi", vec![reg(5), reg(0), imm(1000)]));
}

#[test]
fn self_addi_becomes_c_addi() {
    let items = vec![instr("addi", vec![reg(9), reg(9), imm(-5)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.addi", vec![reg(9), imm(-5)]));
}

#[test]
fn addi_sp_within_range_becomes_c_addi4spn() {
    let items = vec![instr("addi", vec![reg(8), reg(2), imm(16)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.addi4spn", vec![reg(8), imm(16)]));
}

#[test]
fn add_from_zero_becomes_c_mv() {
    let items = vec![instr("add", vec![reg(9), reg(0), reg(10)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.mv", vec![reg(9), reg(10)]));
}

#[test]
fn self_add_becomes_c_add() {
    let items = vec![instr("add", vec![reg(9), reg(9), reg(10)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.add", vec![reg(9), reg(10)]));
}

#[test]
fn add_into_x0_stays_uncompressed() {
    let items = vec![instr("add", vec![reg(0), reg(0), reg(10)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("add", vec![reg(0), reg(0), reg(10)]));
}

#[test]
fn addi_sp_outside_compressed_reg_class_stays_uncompressed() {
    let items = vec![instr("addi", vec![reg(16), reg(2), imm(16)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("addi", vec![reg(16), reg(2), imm(16)]));
}

#[test]
fn small_nonzero_lui_becomes_c_lui() {
    let items = vec![instr("lui", vec![reg(5), imm(-1)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.lui", vec![reg(5), imm(-1)]));
}

#[test]
fn lui_into_sp_never_compresses() {
    let items = vec![instr("lui", vec![reg(2), imm(3)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("lui", vec![reg(2), imm(3)]));
}

#[test]
fn jal_zero_to_a_nearby_label_becomes_c_j() {
    let items = vec![
        instr("jal", vec![reg(0), Operand::Expr(Expr::Ident("there".into(), sp()))]),
        label("there"),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.j", vec![Operand::Expr(Expr::Ident("there".into(), sp()))]));
}

#[test]
fn jal_ra_to_a_nearby_label_becomes_c_jal() {
    let items = vec![
        instr("jal", vec![reg(1), Operand::Expr(Expr::Ident("there".into(), sp()))]),
        label("there"),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.jal", vec![Operand::Expr(Expr::Ident("there".into(), sp()))]));
}

#[test]
fn jal_to_a_far_label_stays_uncompressed() {
    let mut items = vec![instr("jal", vec![reg(0), Operand::Expr(Expr::Ident("far".into(), sp()))])];
    for _ in 0..2000 {
        items.push(instr("addi", vec![reg(3), reg(3), imm(1)]));
    }
    items.push(label("far"));
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("jal", vec![reg(0), Operand::Expr(Expr::Ident("far".into(), sp()))]));
}

#[test]
fn jalr_zero_rs_zero_becomes_c_jr() {
    let items = vec![instr("jalr", vec![reg(0), reg(5), imm(0)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.jr", vec![reg(5)]));
}

#[test]
fn jalr_ra_becomes_c_jalr() {
    let items = vec![instr("jalr", vec![reg(1), reg(5), imm(0)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.jalr", vec![reg(5)]));
}

#[test]
fn jalr_with_nonzero_offset_stays_uncompressed() {
    let items = vec![instr("jalr", vec![reg(0), reg(5), imm(4)])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("jalr", vec![reg(0), reg(5), imm(4)]));
}

#[test]
fn beqz_pattern_on_compressed_register_class_compresses() {
    let items = vec![
        instr("beq", vec![reg(9), reg(0), Operand::Expr(Expr::Ident("there".into(), sp()))]),
        label("there"),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(
        out[0],
        instr("c.beqz", vec![reg(9), Operand::Expr(Expr::Ident("there".into(), sp()))])
    );
}

#[test]
fn beqz_pattern_outside_compressed_register_class_stays_uncompressed() {
    let items = vec![
        instr("beq", vec![reg(20), reg(0), Operand::Expr(Expr::Ident("there".into(), sp()))]),
        label("there"),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(
        out[0],
        instr("beq", vec![reg(20), reg(0), Operand::Expr(Expr::Ident("there".into(), sp()))])
    );
}

#[test]
fn lw_sp_relative_becomes_c_lwsp() {
    let items = vec![instr(
        "lw",
        vec![reg(5), Operand::Mem { offset: Expr::Int(8), base: 2 }],
    )];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.lwsp", vec![reg(5), imm(8)]));
}

#[test]
fn lw_into_zero_from_sp_stays_uncompressed() {
    let items = vec![instr(
        "lw",
        vec![reg(0), Operand::Mem { offset: Expr::Int(8), base: 2 }],
    )];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("lw", vec![reg(0), Operand::Mem { offset: Expr::Int(8), base: 2 }]));
}

#[test]
fn lw_base_offset_on_compressed_registers_becomes_c_lw() {
    let items = vec![instr(
        "lw",
        vec![reg(8), Operand::Mem { offset: Expr::Int(4), base: 9 }],
    )];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.lw", vec![reg(8), reg(9), imm(4)]));
}

#[test]
fn sw_sp_relative_becomes_c_swsp() {
    let items = vec![instr(
        "sw",
        vec![reg(5), Operand::Mem { offset: Expr::Int(12), base: 2 }],
    )];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.swsp", vec![reg(5), imm(12)]));
}

#[test]
fn and_or_xor_sub_on_compressed_registers_compress() {
    let items = vec![
        instr("and", vec![reg(8), reg(8), reg(9)]),
        instr("or", vec![reg(8), reg(8), reg(9)]),
        instr("xor", vec![reg(8), reg(8), reg(9)]),
        instr("sub", vec![reg(8), reg(8), reg(9)]),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.and", vec![reg(8), reg(9)]));
    assert_eq!(out[1], instr("c.or", vec![reg(8), reg(9)]));
    assert_eq!(out[2], instr("c.xor", vec![reg(8), reg(9)]));
    assert_eq!(out[3], instr("c.sub", vec![reg(8), reg(9)]));
}

#[test]
fn srli_srai_andi_on_compressed_registers_compress() {
    let items = vec![
        instr("srli", vec![reg(10), reg(10), imm(3)]),
        instr("srai", vec![reg(10), reg(10), imm(3)]),
        instr("andi", vec![reg(10), reg(10), imm(15)]),
    ];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.srli", vec![reg(10), imm(3)]));
    assert_eq!(out[1], instr("c.srai", vec![reg(10), imm(3)]));
    assert_eq!(out[2], instr("c.andi", vec![reg(10), imm(15)]));
}

#[test]
fn ebreak_becomes_c_ebreak() {
    let items = vec![instr("ebreak", vec![])];
    let out = compress(items, &no_constants()).unwrap();
    assert_eq!(out[0], instr("c.ebreak", vec![]));
}

#[test]
fn already_compressed_instruction_is_not_reprocessed() {
    // size-2 `c.*` mnemonics should never show up in `try_compress`'s own
    // match arms, so a second compress() call is a no-op.
    let items = vec![instr("addi", vec![reg(5), reg(0), imm(7)])];
    let once = compress(items, &no_constants()).unwrap();
    let twice = compress(once.clone(), &no_constants()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn shrinking_an_earlier_branch_can_bring_a_later_jump_into_range() {
    // Fill with instructions that themselves compress to 2 bytes, so the
    // call target only ends up in jal's 12-bit CJ range after compression
    // shrinks everything ahead of it (exercises the re-layout loop).
    let mut items = vec![instr("jal", vec![reg(0), Operand::Expr(Expr::Ident("far".into(), sp()))])];
    for _ in 0..600 {
        items.push(instr("addi", vec![reg(9), reg(9), imm(1)]));
    }
    items.push(label("far"));
    let out = compress(items, &no_constants()).unwrap();
    // Uncompressed, 600 * 4 = 2400 bytes puts `far` outside jal's +-2047
    // CJ range; once the fillers shrink to `c.addi` at 2 bytes each, 1200
    // bytes brings it back in range.
    assert_eq!(out[0], instr("c.j", vec![Operand::Expr(Expr::Ident("far".into(), sp()))]));
}
