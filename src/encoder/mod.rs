//! # Encoder (spec §4.8)
//!
//! The last pass: given a converged [`crate::layout::LayoutResult`], turns
//! every [`Item`] into its final bytes. Standard 32-bit RV32I/M/A
//! instructions are packed from [`crate::isa::MnemonicDef`]'s opcode/funct
//! fields via the six base instruction formats (R/I/S/B/U/J); `c.*`
//! mnemonics produced by [`crate::compress`] are packed via the nine
//! compressed formats instead. Bit layouts for both follow the RISC-V
//! unprivileged ISA manual's instruction-format chapters exactly; nothing
//! here is approximated.

#[cfg(test)]
mod tests;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use indexmap::IndexMap;

use crate::error::{AsmError, Span};
use crate::eval::{self, NameResolver};
use crate::isa::{self, Shape};
use crate::layout::{ExpansionForm, LayoutResult};
use crate::parser::ast::{Endian, Expr, Item, Operand, PackType};

struct Resolver<'a> {
    constants: &'a IndexMap<String, i64>,
    labels: &'a IndexMap<String, i64>,
}

impl<'a> NameResolver for Resolver<'a> {
    fn resolve_ident(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        if let Some(v) = self.constants.get(name) {
            return Ok(*v);
        }
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::undefined_identifier(name, span))
    }

    fn resolve_label(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::undefined_identifier(name, span))
    }
}

fn fits_signed(v: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    v >= min && v <= max
}

/// Encode a fully laid-out program to its final byte image.
pub fn encode(
    items: &[Item],
    layout: &LayoutResult,
    constants: &IndexMap<String, i64>,
    default_endian: Endian,
) -> Result<Vec<u8>, Vec<AsmError>> {
    let resolver = Resolver { constants, labels: &layout.labels };
    let mut out = Vec::with_capacity(layout.total_size.max(0) as usize);
    let mut errors = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let item_layout = &layout.items[idx];
        match encode_item(item, item_layout, &resolver, default_endian) {
            Ok(mut bytes) => out.append(&mut bytes),
            Err(mut e) => errors.append(&mut e),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn encode_item(
    item: &Item,
    item_layout: &crate::layout::ItemLayout,
    resolver: &Resolver,
    default_endian: Endian,
) -> Result<Vec<u8>, Vec<AsmError>> {
    let pc = item_layout.offset;
    let form = item_layout.form;
    match item {
        Item::ConstantDef { .. } | Item::Label { .. } => Ok(Vec::new()),
        Item::Instruction { mnemonic, operands, span } => {
            if let Some(bytes) = encode_compressed(mnemonic, operands, pc, *span, resolver, default_endian)? {
                Ok(bytes)
            } else {
                let word = encode_standard(mnemonic, operands, pc, *span, resolver)?;
                Ok(write_u32(word, default_endian))
            }
        }
        Item::PseudoInstruction { span, .. } => Err(vec![AsmError::instruction_form(
            "pseudo-instruction reached the encoder unexpanded (internal invariant violation)",
            *span,
        )]),
        Item::Li { rd, imm, span } => encode_li(*rd, imm, form, *span, resolver, default_endian),
        Item::Call { target, span } => encode_call_tail(1, 1, target, form, pc, *span, resolver, default_endian),
        Item::Tail { target, span } => encode_call_tail(0, 6, target, form, pc, *span, resolver, default_endian),
        Item::Bytes { values, span } => encode_data_list(values, 1, *span, resolver, default_endian),
        Item::Shorts { values, span } => encode_data_list(values, 2, *span, resolver, default_endian),
        Item::Ints { values, span } => encode_data_list(values, 4, *span, resolver, default_endian),
        Item::Longs { values, span } => encode_data_list(values, 4, *span, resolver, default_endian),
        Item::LongLongs { values, span } => encode_data_list(values, 8, *span, resolver, default_endian),
        Item::StringLiteral { bytes, .. } | Item::IncludeBytes { bytes, .. } => Ok(bytes.clone()),
        Item::Pack { endian, ty, expr, span } => encode_pack(*ty, expr, *endian, *span, resolver),
        Item::Align { .. } => Ok(vec![0u8; item_layout.size as usize]),
        Item::ErrorDirective { message, span } => {
            Err(vec![AsmError::new(crate::error::ErrorKind::ExplicitAbort, message.clone(), *span)])
        }
    }
}

fn write_u32(word: u32, endian: Endian) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    match endian {
        Endian::Little => out.write_u32::<LittleEndian>(word).unwrap(),
        Endian::Big => out.write_u32::<BigEndian>(word).unwrap(),
    }
    out
}

fn write_u16(half: u16, endian: Endian) -> Vec<u8> {
    let mut out = Vec::with_capacity(2);
    match endian {
        Endian::Little => out.write_u16::<LittleEndian>(half).unwrap(),
        Endian::Big => out.write_u16::<BigEndian>(half).unwrap(),
    }
    out
}

// --- Standard 32-bit instruction formats -----------------------------

fn encode_r(opcode: u8, rd: u8, funct3: u8, rs1: u8, rs2: u8, funct7: u8) -> u32 {
    (opcode as u32)
        | (rd as u32) << 7
        | (funct3 as u32) << 12
        | (rs1 as u32) << 15
        | (rs2 as u32) << 20
        | (funct7 as u32) << 25
}

fn encode_i(opcode: u8, rd: u8, funct3: u8, rs1: u8, imm12: i64) -> u32 {
    let imm = (imm12 as u32) & 0xFFF;
    (opcode as u32) | (rd as u32) << 7 | (funct3 as u32) << 12 | (rs1 as u32) << 15 | imm << 20
}

fn encode_s(opcode: u8, funct3: u8, rs1: u8, rs2: u8, imm12: i64) -> u32 {
    let imm = (imm12 as u32) & 0xFFF;
    let lo = imm & 0x1F;
    let hi = (imm >> 5) & 0x7F;
    (opcode as u32) | lo << 7 | (funct3 as u32) << 12 | (rs1 as u32) << 15 | (rs2 as u32) << 20 | hi << 25
}

fn encode_b(opcode: u8, funct3: u8, rs1: u8, rs2: u8, imm13: i64) -> u32 {
    let imm = (imm13 as u32) & 0x1FFF;
    let b11 = (imm >> 11) & 1;
    let b4_1 = (imm >> 1) & 0xF;
    let b10_5 = (imm >> 5) & 0x3F;
    let b12 = (imm >> 12) & 1;
    (opcode as u32)
        | b11 << 7
        | b4_1 << 8
        | (funct3 as u32) << 12
        | (rs1 as u32) << 15
        | (rs2 as u32) << 20
        | b10_5 << 25
        | b12 << 31
}

fn encode_u(opcode: u8, rd: u8, imm20: i64) -> u32 {
    let imm = (imm20 as u32) & 0xFFFFF;
    (opcode as u32) | (rd as u32) << 7 | imm << 12
}

fn encode_j(opcode: u8, rd: u8, imm21: i64) -> u32 {
    let imm = (imm21 as u32) & 0x1FFFFF;
    let b19_12 = (imm >> 12) & 0xFF;
    let b11 = (imm >> 11) & 1;
    let b10_1 = (imm >> 1) & 0x3FF;
    let b20 = (imm >> 20) & 1;
    (opcode as u32) | (rd as u32) << 7 | b19_12 << 12 | b11 << 20 | b10_1 << 21 | b20 << 31
}

fn eval_operand(expr: &Expr, resolver: &Resolver) -> Result<i64, AsmError> {
    eval::eval_expr(expr, resolver)
}

fn pc_relative(expr: &Expr, pc: i64, resolver: &Resolver) -> Result<i64, AsmError> {
    Ok(eval_operand(expr, resolver)? - pc)
}

fn fence_mask(expr: &Expr, span: Span) -> Result<u32, AsmError> {
    let name = match expr {
        Expr::Ident(name, _) => name,
        _ => return Err(AsmError::instruction_form("'fence' expects an i/o/r/w identifier", span)),
    };
    let mut mask = 0u32;
    for ch in name.chars() {
        mask |= match ch {
            'i' => 0b1000,
            'o' => 0b0100,
            'r' => 0b0010,
            'w' => 0b0001,
            _ => {
                return Err(AsmError::instruction_form(
                    format!("'{ch}' is not a valid fence flag (expected i/o/r/w)"),
                    span,
                ))
            }
        };
    }
    Ok(mask)
}

fn encode_standard(mnemonic: &str, operands: &[Operand], pc: i64, span: Span, resolver: &Resolver) -> Result<u32, Vec<AsmError>> {
    let def = isa::lookup(mnemonic)
        .ok_or_else(|| vec![AsmError::instruction_form(format!("unknown mnemonic '{mnemonic}'"), span)])?;

    let err = |msg: &str| vec![AsmError::instruction_form(msg.to_string(), span)];

    match def.shape {
        Shape::RRR => match operands {
            [Operand::Reg(rd), Operand::Reg(rs1), Operand::Reg(rs2)] => {
                Ok(encode_r(def.opcode, *rd, def.funct3, *rs1, *rs2, def.funct7))
            }
            _ => Err(err("expected 'rd, rs1, rs2'")),
        },
        Shape::RRI => match operands {
            [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)] => {
                let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
                if !fits_signed(v, 12) {
                    return Err(vec![AsmError::range(format!("immediate {v} does not fit in 12 signed bits"), span)]);
                }
                Ok(encode_i(def.opcode, *rd, def.funct3, *rs1, v))
            }
            _ => Err(err("expected 'rd, rs1, imm'")),
        },
        Shape::RRShamt => match operands {
            [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)] => {
                let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
                if !(0..=31).contains(&v) {
                    return Err(vec![AsmError::range(format!("shift amount {v} out of range 0..31"), span)]);
                }
                let imm12 = ((def.funct7 as i64) << 5) | v;
                Ok(encode_i(def.opcode, *rd, def.funct3, *rs1, imm12))
            }
            _ => Err(err("expected 'rd, rs1, shamt'")),
        },
        Shape::Load => match operands {
            [Operand::Reg(rd), Operand::Mem { offset, base }] => {
                let v = eval_operand(offset, resolver).map_err(|e| vec![e])?;
                if !fits_signed(v, 12) {
                    return Err(vec![AsmError::range(format!("offset {v} does not fit in 12 signed bits"), span)]);
                }
                Ok(encode_i(def.opcode, *rd, def.funct3, *base, v))
            }
            _ => Err(err("expected 'rd, imm(rs1)'")),
        },
        Shape::Store => match operands {
            [Operand::Reg(rs2), Operand::Mem { offset, base }] => {
                let v = eval_operand(offset, resolver).map_err(|e| vec![e])?;
                if !fits_signed(v, 12) {
                    return Err(vec![AsmError::range(format!("offset {v} does not fit in 12 signed bits"), span)]);
                }
                Ok(encode_s(def.opcode, def.funct3, *base, *rs2, v))
            }
            _ => Err(err("expected 'rs2, imm(rs1)'")),
        },
        Shape::Branch => match operands {
            [Operand::Reg(rs1), Operand::Reg(rs2), Operand::Expr(e)] => {
                let delta = pc_relative(e, pc, resolver).map_err(|e| vec![e])?;
                if !fits_signed(delta, 13) || delta % 2 != 0 {
                    return Err(vec![AsmError::range(
                        format!("branch target {delta} is out of range or misaligned"),
                        span,
                    )]);
                }
                Ok(encode_b(def.opcode, def.funct3, *rs1, *rs2, delta))
            }
            _ => Err(err("expected 'rs1, rs2, label'")),
        },
        Shape::Jal => match operands {
            [Operand::Reg(rd), Operand::Expr(e)] => {
                let delta = pc_relative(e, pc, resolver).map_err(|e| vec![e])?;
                if !fits_signed(delta, 21) || delta % 2 != 0 {
                    return Err(vec![AsmError::range(
                        format!("jump target {delta} is out of range or misaligned"),
                        span,
                    )]);
                }
                Ok(encode_j(def.opcode, *rd, delta))
            }
            _ => Err(err("expected 'rd, label'")),
        },
        Shape::Jalr => {
            let (rd, base, off_expr) = match operands {
                [Operand::Reg(rd), Operand::Mem { offset, base }] => (*rd, *base, offset),
                [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)] => (*rd, *rs1, e),
                _ => return Err(err("expected 'rd, imm(rs1)' or 'rd, rs1, imm'")),
            };
            let v = eval_operand(off_expr, resolver).map_err(|e| vec![e])?;
            if !fits_signed(v, 12) {
                return Err(vec![AsmError::range(format!("offset {v} does not fit in 12 signed bits"), span)]);
            }
            Ok(encode_i(def.opcode, rd, def.funct3, base, v))
        }
        Shape::U => match operands {
            [Operand::Reg(rd), Operand::Expr(e)] => {
                let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
                if !(-0x80000..=0xFFFFF).contains(&v) {
                    return Err(vec![AsmError::range(format!("immediate {v} does not fit a 20-bit upper immediate"), span)]);
                }
                Ok(encode_u(def.opcode, *rd, v))
            }
            _ => Err(err("expected 'rd, imm'")),
        },
        Shape::Amo => match operands {
            [Operand::Reg(rd), Operand::Reg(rs2), Operand::Mem { offset, base }] => {
                let off = eval_operand(offset, resolver).map_err(|e| vec![e])?;
                if off != 0 {
                    return Err(vec![AsmError::range("atomic memory operand takes no offset", span)]);
                }
                Ok(encode_r(def.opcode, *rd, def.funct3, *base, *rs2, def.funct7))
            }
            _ => Err(err("expected 'rd, rs2, (rs1)'")),
        },
        Shape::Lr => match operands {
            [Operand::Reg(rd), Operand::Mem { offset, base }] => {
                let off = eval_operand(offset, resolver).map_err(|e| vec![e])?;
                if off != 0 {
                    return Err(vec![AsmError::range("atomic memory operand takes no offset", span)]);
                }
                Ok(encode_r(def.opcode, *rd, def.funct3, *base, 0, def.funct7))
            }
            _ => Err(err("expected 'rd, (rs1)'")),
        },
        Shape::Fence => match operands {
            [Operand::Expr(pred), Operand::Expr(succ)] => {
                let pred_mask = fence_mask(pred, span).map_err(|e| vec![e])?;
                let succ_mask = fence_mask(succ, span).map_err(|e| vec![e])?;
                let imm = (pred_mask << 4) | succ_mask;
                Ok(encode_i(def.opcode, 0, def.funct3, 0, imm as i64))
            }
            _ => Err(err("expected 'pred, succ'")),
        },
        Shape::NoArgs => {
            if !operands.is_empty() {
                return Err(err("expects no operands"));
            }
            let imm = match mnemonic {
                "ecall" => 0,
                "ebreak" => 1,
                "fence.i" => 0,
                _ => 0,
            };
            Ok(encode_i(def.opcode, 0, def.funct3, 0, imm))
        }
    }
}

// --- Li/Call/Tail lowering --------------------------------------------

fn encode_li(
    rd: u8,
    imm: &Expr,
    form: ExpansionForm,
    span: Span,
    resolver: &Resolver,
    endian: Endian,
) -> Result<Vec<u8>, Vec<AsmError>> {
    let v = eval_operand(imm, resolver).map_err(|e| vec![e])?;
    match form {
        ExpansionForm::LiAddi => Ok(write_u32(encode_i(isa::opcode::OP_IMM, rd, 0, 0, v), endian)),
        ExpansionForm::LiLui => Ok(write_u32(encode_u(isa::opcode::LUI, rd, eval::hi20(v)), endian)),
        ExpansionForm::LiLuiAddi => {
            let mut out = write_u32(encode_u(isa::opcode::LUI, rd, eval::hi20(v)), endian);
            out.extend(write_u32(encode_i(isa::opcode::OP_IMM, rd, 0, rd, eval::lo12(v)), endian));
            Ok(out)
        }
        other => Err(vec![AsmError::instruction_form(
            format!("'li' resolved to an unexpected expansion form {other:?}"),
            span,
        )]),
    }
}

/// Lowers `call`/`tail`'s resolved form. `link_rd` is the register that
/// receives the return address (`ra` for `call`, `x0` for `tail`); `scratch`
/// is the register the `auipc` targets in the long form (`ra` itself for
/// `call`, since nothing needs preserving across the setup; `t1` for `tail`,
/// since `x0` can't hold an intermediate address).
fn encode_call_tail(
    link_rd: u8,
    scratch: u8,
    target: &Expr,
    form: ExpansionForm,
    pc: i64,
    span: Span,
    resolver: &Resolver,
    endian: Endian,
) -> Result<Vec<u8>, Vec<AsmError>> {
    let delta = pc_relative(target, pc, resolver).map_err(|e| vec![e])?;
    match form {
        ExpansionForm::JumpShort => Ok(write_u32(encode_j(isa::opcode::JAL, link_rd, delta), endian)),
        ExpansionForm::JumpLong => {
            let hi = eval::hi20(delta);
            let lo = eval::lo12(delta);
            let mut out = write_u32(encode_u(isa::opcode::AUIPC, scratch, hi), endian);
            out.extend(write_u32(encode_i(isa::opcode::JALR, link_rd, 0, scratch, lo), endian));
            Ok(out)
        }
        other => Err(vec![AsmError::instruction_form(
            format!("'call'/'tail' resolved to an unexpected expansion form {other:?}"),
            span,
        )]),
    }
}

// --- Data directives ----------------------------------------------------

fn encode_data_list(
    values: &[Expr],
    width: usize,
    span: Span,
    resolver: &Resolver,
    endian: Endian,
) -> Result<Vec<u8>, Vec<AsmError>> {
    let mut out = Vec::with_capacity(values.len() * width);
    let mut errors = Vec::new();
    for expr in values {
        match eval_operand(expr, resolver) {
            Ok(v) => match write_integer(v, width, endian, span) {
                Ok(mut bytes) => out.append(&mut bytes),
                Err(e) => errors.push(e),
            },
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn write_integer(v: i64, width: usize, endian: Endian, span: Span) -> Result<Vec<u8>, AsmError> {
    let (min, max): (i64, i64) = match width {
        1 => (-128, 255),
        2 => (-32768, 65535),
        4 => (-0x8000_0000, 0xFFFF_FFFF),
        8 => (i64::MIN, i64::MAX),
        _ => unreachable!("data directive width is always 1/2/4/8"),
    };
    if v < min || v > max {
        return Err(AsmError::range(format!("value {v} does not fit in {width} byte(s)"), span));
    }
    let mut out = Vec::with_capacity(width);
    match (width, endian) {
        (1, _) => out.push(v as u8),
        (2, Endian::Little) => out.write_u16::<LittleEndian>(v as u16).unwrap(),
        (2, Endian::Big) => out.write_u16::<BigEndian>(v as u16).unwrap(),
        (4, Endian::Little) => out.write_u32::<LittleEndian>(v as u32).unwrap(),
        (4, Endian::Big) => out.write_u32::<BigEndian>(v as u32).unwrap(),
        (8, Endian::Little) => out.write_u64::<LittleEndian>(v as u64).unwrap(),
        (8, Endian::Big) => out.write_u64::<BigEndian>(v as u64).unwrap(),
        _ => unreachable!(),
    }
    Ok(out)
}

/// `expr` is always evaluated as an integer (there is no float-literal
/// grammar); for `F32`/`F64` that integer is cast to the float type and its
/// IEEE-754 bit pattern is written, not reinterpreted from the integer bits.
fn encode_pack(ty: PackType, expr: &Expr, endian: Endian, span: Span, resolver: &Resolver) -> Result<Vec<u8>, Vec<AsmError>> {
    let v = eval_operand(expr, resolver).map_err(|e| vec![e])?;
    if ty.is_float() {
        let mut out = Vec::with_capacity(ty.width());
        match (ty, endian) {
            (PackType::F32, Endian::Little) => out.write_f32::<LittleEndian>(v as f64 as f32).unwrap(),
            (PackType::F32, Endian::Big) => out.write_f32::<BigEndian>(v as f64 as f32).unwrap(),
            (PackType::F64, Endian::Little) => out.write_f64::<LittleEndian>(v as f64).unwrap(),
            (PackType::F64, Endian::Big) => out.write_f64::<BigEndian>(v as f64).unwrap(),
            _ => unreachable!("is_float() only true for F32/F64"),
        }
        Ok(out)
    } else {
        write_integer(v, ty.width(), endian, span).map_err(|e| vec![e])
    }
}

// --- C-extension (16-bit) instruction formats --------------------------

fn encode_cr(quadrant: u8, funct4: u8, rd_rs1: u8, rs2: u8) -> u16 {
    (quadrant as u16) | (rs2 as u16) << 2 | (rd_rs1 as u16) << 7 | (funct4 as u16) << 12
}

fn encode_ci_signed6(quadrant: u8, funct3: u8, rd_rs1: u8, imm6: i64) -> u16 {
    let u = (imm6 as u32) & 0x3F;
    let lo5 = (u & 0x1F) as u16;
    let hi1 = ((u >> 5) & 1) as u16;
    (quadrant as u16) | lo5 << 2 | (rd_rs1 as u16) << 7 | hi1 << 12 | (funct3 as u16) << 13
}

fn encode_c_lwsp(rd: u8, off: i64) -> u16 {
    let def = isa::compressed::lookup("c.lwsp").expect("c.lwsp is a known C-extension mnemonic");
    let raw6 = ((off / 4) as u32) & 0x3F;
    let bit12 = (raw6 >> 3) & 1;
    let bits6_4 = raw6 & 0b111;
    let bits3_2 = (raw6 >> 4) & 0b11;
    (def.quadrant as u16)
        | (bits3_2 as u16) << 2
        | (bits6_4 as u16) << 4
        | (rd as u16) << 7
        | (bit12 as u16) << 12
        | (def.funct3 as u16) << 13
}

fn encode_c_swsp(rs2: u8, off: i64) -> u16 {
    let def = isa::compressed::lookup("c.swsp").expect("c.swsp is a known C-extension mnemonic");
    let raw6 = ((off / 4) as u32) & 0x3F;
    let field = ((raw6 & 0xF) << 2) | ((raw6 >> 4) & 0x3);
    (def.quadrant as u16) | (rs2 as u16) << 2 | (field as u16) << 7 | (def.funct3 as u16) << 13
}

fn encode_cl_cs(funct3: u8, rd_rs2_prime: u8, rs1_prime: u8, off: i64) -> u16 {
    let raw5 = ((off / 4) as u32) & 0x1F;
    let top3 = (raw5 >> 1) & 0b111;
    let bit6 = raw5 & 1;
    let bit5 = (raw5 >> 4) & 1;
    let rd = isa::compress_reg(rd_rs2_prime) as u16;
    let rs1 = isa::compress_reg(rs1_prime) as u16;
    0b00 | rd << 2 | (bit6 as u16) << 6 | (bit5 as u16) << 5 | rs1 << 7 | (top3 as u16) << 10 | (funct3 as u16) << 13
}

fn encode_c_addi4spn(rd_prime: u8, nzuimm: i64) -> u16 {
    let def = isa::compressed::lookup("c.addi4spn").expect("c.addi4spn is a known C-extension mnemonic");
    let raw8 = ((nzuimm / 4) as u32) & 0xFF;
    let b = |i: u32| (raw8 >> i) & 1;
    let inst12 = b(3);
    let inst11 = b(2);
    let inst10 = b(7);
    let inst9 = b(6);
    let inst8 = b(5);
    let inst7 = b(4);
    let inst6 = b(0);
    let inst5 = b(1);
    let rd = isa::compress_reg(rd_prime) as u16;
    (def.quadrant as u16)
        | rd << 2
        | (inst5 as u16) << 5
        | (inst6 as u16) << 6
        | (inst7 as u16) << 7
        | (inst8 as u16) << 8
        | (inst9 as u16) << 9
        | (inst10 as u16) << 10
        | (inst11 as u16) << 11
        | (inst12 as u16) << 12
        | (def.funct3 as u16) << 13
}

fn encode_cb_branch(funct3: u8, rs1_prime: u8, delta: i64) -> u16 {
    let u = (delta as u32) & 0x1FF;
    let b = |i: u32| (u >> i) & 1;
    let rs1 = isa::compress_reg(rs1_prime) as u16;
    0b01 | rs1 << 7
        | (b(5) as u16) << 2
        | (b(1) as u16) << 3
        | (b(2) as u16) << 4
        | (b(6) as u16) << 5
        | (b(7) as u16) << 6
        | (b(3) as u16) << 10
        | (b(4) as u16) << 11
        | (b(8) as u16) << 12
        | (funct3 as u16) << 13
}

fn encode_cj(funct3: u8, delta: i64) -> u16 {
    let u = (delta as u32) & 0xFFF;
    let b = |i: u32| (u >> i) & 1;
    0b01 | (b(5) as u16) << 2
        | (b(1) as u16) << 3
        | (b(2) as u16) << 4
        | (b(3) as u16) << 5
        | (b(7) as u16) << 6
        | (b(6) as u16) << 7
        | (b(10) as u16) << 8
        | (b(8) as u16) << 9
        | (b(9) as u16) << 10
        | (b(4) as u16) << 11
        | (b(11) as u16) << 12
        | (funct3 as u16) << 13
}

fn encode_ca(funct2: u8, rd_rs1_prime: u8, rs2_prime: u8) -> u16 {
    let rd = isa::compress_reg(rd_rs1_prime) as u16;
    let rs2 = isa::compress_reg(rs2_prime) as u16;
    0b01 | rs2 << 2 | (funct2 as u16) << 5 | rd << 7 | 0b100011 << 10
}

fn encode_cb_shift_andi(funct2: u8, rd_rs1_prime: u8, imm6: i64) -> u16 {
    let u = (imm6 as u32) & 0x3F;
    let lo5 = u & 0x1F;
    let hi1 = (u >> 5) & 1;
    let rd = isa::compress_reg(rd_rs1_prime) as u16;
    0b01 | (lo5 as u16) << 2 | rd << 7 | (hi1 as u16) << 12 | (funct2 as u16) << 10 | 0b100 << 13
}

/// Try to encode a real (uncompressed-named) mnemonic that happens to
/// already be one of the `c.*` names [`crate::compress`] produces. Returns
/// `Ok(None)` for any mnemonic the compressor never emits, so the caller
/// falls back to [`encode_standard`].
fn encode_compressed(
    mnemonic: &str,
    operands: &[Operand],
    pc: i64,
    span: Span,
    resolver: &Resolver,
    endian: Endian,
) -> Result<Option<Vec<u8>>, Vec<AsmError>> {
    if !mnemonic.starts_with("c.") {
        return Ok(None);
    }

    let def = match isa::compressed::lookup(mnemonic) {
        Some(def) => def,
        None => return Ok(None),
    };

    let err = |msg: &str| vec![AsmError::instruction_form(msg.to_string(), span)];
    let half = match (mnemonic, operands) {
        ("c.nop", []) => encode_ci_signed6(def.quadrant, def.funct3, 0, 0),
        ("c.ebreak", []) => encode_cr(def.quadrant, def.funct_extra, 0, 0),
        ("c.li" | "c.addi" | "c.lui", [Operand::Reg(rd), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_ci_signed6(def.quadrant, def.funct3, *rd, v)
        }
        ("c.addi4spn", [Operand::Reg(rd), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_c_addi4spn(*rd, v)
        }
        ("c.lwsp", [Operand::Reg(rd), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_c_lwsp(*rd, v)
        }
        ("c.swsp", [Operand::Reg(rs2), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_c_swsp(*rs2, v)
        }
        ("c.lw", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_cl_cs(def.funct3, *rd, *rs1, v)
        }
        ("c.sw", [Operand::Reg(rs2), Operand::Reg(rs1), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_cl_cs(def.funct3, *rs2, *rs1, v)
        }
        ("c.j" | "c.jal", [Operand::Expr(e)]) => {
            let delta = pc_relative(e, pc, resolver).map_err(|e| vec![e])?;
            encode_cj(def.funct3, delta)
        }
        ("c.jr" | "c.jalr", [Operand::Reg(rs)]) => encode_cr(def.quadrant, def.funct_extra, *rs, 0),
        ("c.mv" | "c.add", [Operand::Reg(rd), Operand::Reg(rs2)]) => {
            encode_cr(def.quadrant, def.funct_extra, *rd, *rs2)
        }
        ("c.beqz" | "c.bnez", [Operand::Reg(rs1), Operand::Expr(e)]) => {
            let delta = pc_relative(e, pc, resolver).map_err(|e| vec![e])?;
            encode_cb_branch(def.funct3, *rs1, delta)
        }
        ("c.and" | "c.or" | "c.xor" | "c.sub", [Operand::Reg(rd), Operand::Reg(rs2)]) => {
            encode_ca(def.funct_extra, *rd, *rs2)
        }
        ("c.srli" | "c.srai" | "c.andi", [Operand::Reg(rd), Operand::Expr(e)]) => {
            let v = eval_operand(e, resolver).map_err(|e| vec![e])?;
            encode_cb_shift_andi(def.funct_extra, *rd, v)
        }
        _ => return Err(err(&format!("malformed compressed instruction '{mnemonic}'"))),
    };
    Ok(Some(write_u16(half, endian)))
}
