use super::*;
use crate::lexer::tokenize;
use crate::parser::{self};

/// Runs the full pipeline through the encoder (lexer -> parser -> expander
/// -> constant evaluator -> layout -> encode), mirroring what
/// `crate::assemble` does, so these tests exercise the encoder the way a
/// real caller would rather than poking its internals directly.
fn assemble_ok(src: &str) -> Vec<u8> {
    let lexed = tokenize(src, 0);
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    let parsed = parser::parse(&lexed.tokens, Endian::Little);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    let expanded = crate::expand::expand(parsed.items).expect("expand");
    let constants = eval::evaluate_constants(&expanded).expect("constants");
    let layout = crate::layout::resolve_layout(&expanded, &constants).expect("layout");
    encode(&expanded, &layout, &constants, Endian::Little).expect("encode")
}

fn assemble_err(src: &str) -> Vec<AsmError> {
    let lexed = tokenize(src, 0);
    let parsed = parser::parse(&lexed.tokens, Endian::Little);
    let expanded = crate::expand::expand(parsed.items).expect("expand");
    let constants = eval::evaluate_constants(&expanded).expect("constants");
    let layout = crate::layout::resolve_layout(&expanded, &constants).expect("layout");
    encode(&expanded, &layout, &constants, Endian::Little).unwrap_err()
}

fn word_le(bytes: &[u8], idx: usize) -> u32 {
    u32::from_le_bytes(bytes[idx * 4..idx * 4 + 4].try_into().unwrap())
}

#[test]
fn addi_with_immediate_matches_known_encoding() {
    let bytes = assemble_ok("addi x1, zero, 12\n");
    assert_eq!(bytes.len(), 4);
    assert_eq!(word_le(&bytes, 0), 0x00C0_0093);
}

#[test]
fn self_loop_jal_matches_known_encoding() {
    let bytes = assemble_ok("loop: jal zero, loop\n");
    assert_eq!(word_le(&bytes, 0), 0x0000_006F);
}

#[test]
fn lui_packs_into_upper_immediate() {
    let bytes = assemble_ok("lui x5, 0x12345\n");
    assert_eq!(word_le(&bytes, 0), (0x12345 << 12) | (5 << 7) | 0b0110111);
}

#[test]
fn branch_to_a_forward_label_is_pc_relative() {
    let bytes = assemble_ok("beq x1, x2, there\nnop\nthere:\n");
    // beq offset is +8 (past the beq itself and the nop).
    let word = word_le(&bytes, 0);
    assert_eq!(word & 0x7F, 0b1100011);
    assert_eq!((word >> 12) & 0x7, 0); // funct3 == beq
}

#[test]
fn li_with_small_immediate_is_a_single_addi() {
    let bytes = assemble_ok("li t0, 5\n");
    assert_eq!(bytes.len(), 4);
    let word = word_le(&bytes, 0);
    assert_eq!(word & 0x7F, 0b0010011); // OP-IMM
    assert_eq!((word >> 15) & 0x1F, 0); // rs1 == x0
}

#[test]
fn li_with_page_aligned_immediate_is_a_single_lui() {
    let bytes = assemble_ok("li t0, 0x1000\n");
    assert_eq!(bytes.len(), 4);
    let word = word_le(&bytes, 0);
    assert_eq!(word & 0x7F, 0b0110111); // LUI
}

#[test]
fn li_with_arbitrary_immediate_is_lui_then_addi() {
    let bytes = assemble_ok("li t0, 0x123456\n");
    assert_eq!(bytes.len(), 8);
    assert_eq!(word_le(&bytes, 0) & 0x7F, 0b0110111);
    assert_eq!(word_le(&bytes, 1) & 0x7F, 0b0010011);
}

#[test]
fn call_to_a_nearby_label_is_a_single_jal() {
    let bytes = assemble_ok("call there\nthere:\n");
    assert_eq!(bytes.len(), 4);
    let word = word_le(&bytes, 0);
    assert_eq!(word & 0x7F, 0b1101111); // JAL
    assert_eq!((word >> 7) & 0x1F, 1); // rd == ra
}

/// A single `bytes` item stands in for a huge filler region without the
/// cost of lexing/parsing a source file with hundreds of thousands of
/// lines: `call`/`tail`'s far-label case just needs a target outside
/// `jal`'s +-2^20 byte range.
fn far_filler_items(target: Expr, make_item: impl FnOnce(Expr, Span) -> Item) -> Vec<Item> {
    let sp = Span::default();
    vec![
        make_item(target, sp),
        Item::Bytes { values: vec![Expr::Int(0); 1_100_000], span: sp },
        Item::Label { name: "far".to_string(), span: sp },
    ]
}

fn encode_items(items: Vec<Item>) -> Vec<u8> {
    let constants = eval::evaluate_constants(&items).expect("constants");
    let layout = crate::layout::resolve_layout(&items, &constants).expect("layout");
    encode(&items, &layout, &constants, Endian::Little).expect("encode")
}

#[test]
fn call_to_a_far_label_is_auipc_then_jalr() {
    let items = far_filler_items(Expr::Ident("far".to_string(), Span::default()), |target, span| {
        Item::Call { target, span }
    });
    let bytes = encode_items(items);
    assert_eq!(word_le(&bytes, 0) & 0x7F, 0b0010111); // AUIPC
    assert_eq!(word_le(&bytes, 1) & 0x7F, 0b1100111); // JALR
}

#[test]
fn tail_uses_t1_as_scratch_and_x0_as_link() {
    let items = far_filler_items(Expr::Ident("far".to_string(), Span::default()), |target, span| {
        Item::Tail { target, span }
    });
    let bytes = encode_items(items);
    let auipc = word_le(&bytes, 0);
    let jalr = word_le(&bytes, 1);
    assert_eq!((auipc >> 7) & 0x1F, 6); // t1
    assert_eq!((jalr >> 7) & 0x1F, 0); // x0, no return address kept
}

#[test]
fn bytes_directive_emits_one_byte_per_value() {
    let bytes = assemble_ok("bytes 1 2 255\n");
    assert_eq!(bytes, vec![1, 2, 255]);
}

#[test]
fn out_of_range_byte_is_a_range_error() {
    let errs = assemble_err("bytes 256\n");
    assert_eq!(errs[0].kind, crate::error::ErrorKind::Range);
}

#[test]
fn pack_little_and_big_endian_round_trip_the_same_value() {
    let le = assemble_ok("pack <I 0x01020304\n");
    assert_eq!(le, vec![0x04, 0x03, 0x02, 0x01]);
    let be = assemble_ok("pack >I 0x01020304\n");
    assert_eq!(be, vec![0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn align_pads_with_zero_bytes() {
    let bytes = assemble_ok("bytes 1\nalign 4\n");
    assert_eq!(bytes, vec![1, 0, 0, 0]);
}

#[test]
fn error_directive_aborts_with_explicit_abort_kind() {
    let errs = assemble_err("error unsupported configuration\n");
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, crate::error::ErrorKind::ExplicitAbort);
    assert_eq!(errs[0].message, "unsupported configuration");
}

#[test]
fn string_literal_is_emitted_verbatim_with_no_escape_processing() {
    let bytes = assemble_ok("string a\\nb\n");
    assert_eq!(bytes, b"a\\nb");
}

#[test]
fn lr_w_and_amoswap_encode_the_bare_register_memory_operand() {
    let bytes = assemble_ok("lr.w x5, (x2)\namoswap.w x6, x7, (x2)\n");
    let lr = word_le(&bytes, 0);
    assert_eq!(lr & 0x7F, 0b0101111); // AMO opcode
    assert_eq!((lr >> 27) & 0x1F, 0b00010); // lr.w funct5
    let amo = word_le(&bytes, 1);
    assert_eq!((amo >> 27) & 0x1F, 0b00001); // amoswap.w funct5
}

#[test]
fn fence_encodes_pred_succ_flags() {
    let bytes = assemble_ok("fence rw, rw\n");
    let word = word_le(&bytes, 0);
    let imm = (word >> 20) & 0xFF;
    assert_eq!(imm, 0b0011_0011); // pred=rw, succ=rw
}

// --- Compressed encodings -----------------------------------------------

fn assemble_compressed(src: &str) -> Vec<u8> {
    let lexed = tokenize(src, 0);
    assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
    let parsed = parser::parse(&lexed.tokens, Endian::Little);
    assert!(parsed.errors.is_empty(), "parse errors: {:?}", parsed.errors);
    let expanded = crate::expand::expand(parsed.items).expect("expand");
    let constants = eval::evaluate_constants(&expanded).expect("constants");
    let compressed = crate::compress::compress(expanded, &constants).expect("compress");
    let layout = crate::layout::resolve_layout(&compressed, &constants).expect("layout");
    encode(&compressed, &layout, &constants, Endian::Little).expect("encode")
}

fn half_le(bytes: &[u8], idx: usize) -> u16 {
    u16::from_le_bytes(bytes[idx * 2..idx * 2 + 2].try_into().unwrap())
}

#[test]
fn compressed_nop_is_two_bytes_with_quadrant_one() {
    let bytes = assemble_compressed("addi x0, x0, 0\n");
    assert_eq!(bytes.len(), 2);
    assert_eq!(half_le(&bytes, 0) & 0b11, 0b01);
}

#[test]
fn compressed_li_encodes_register_and_immediate_fields() {
    let bytes = assemble_compressed("addi x5, x0, 7\n");
    assert_eq!(bytes.len(), 2);
    let half = half_le(&bytes, 0);
    assert_eq!(half & 0b11, 0b01); // quadrant 1
    assert_eq!((half >> 13) & 0b111, 0b010); // funct3 for c.li
    assert_eq!((half >> 7) & 0x1F, 5); // rd
    assert_eq!(half & 0x7C, 7 << 2); // imm[4:0] (imm[5] is 0 here)
}

#[test]
fn compressed_addi4spn_encodes_scaled_stack_offset() {
    let bytes = assemble_compressed("addi x8, x2, 16\n");
    assert_eq!(bytes.len(), 2);
    let half = half_le(&bytes, 0);
    assert_eq!(half & 0b11, 0b00); // quadrant 0
    assert_eq!((half >> 2) & 0b111, isa::compress_reg(8) as u16);
}

#[test]
fn compressed_ebreak_matches_the_fixed_encoding() {
    let bytes = assemble_compressed("ebreak\n");
    assert_eq!(half_le(&bytes, 0), 0b1001_00000_00000_10);
}

#[test]
fn compressed_jump_places_offset_bits_8_and_9_in_the_right_instruction_bits() {
    // offset[8] must land in inst[9], offset[9] in inst[10] (not swapped).
    // 0x180 = 0b1_1000_0000 has bit 7 set (=256+128=384, i.e. offset bit 7
    // and bit 8 both set, bit 9 clear) so the two placements are
    // distinguishable in the encoded instruction.
    let half = encode_cj(0b101, 0x180);
    assert_eq!((half >> 9) & 1, 1, "offset[8] should set inst[9]");
    assert_eq!((half >> 10) & 1, 0, "offset[9] should set inst[10]");

    let half = encode_cj(0b101, 0x200);
    assert_eq!((half >> 9) & 1, 0, "offset[8] clear should clear inst[9]");
    assert_eq!((half >> 10) & 1, 1, "offset[9] set should set inst[10]");
}
