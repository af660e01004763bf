//! # RVC Compressor (spec §4.7)
//!
//! Optional, enabled by `--compress` / [`crate::config::AssemblerConfig::compress`].
//! Runs strictly after layout has converged (see the design note atop
//! [`crate::layout`]): it never assumes compression while sizing items, it
//! only shrinks already-sized instructions after the fact.
//!
//! Each round re-derives a full layout (so label offsets and PC values are
//! current), scans every real [`Item::Instruction`] for one of the fixed
//! patterns the C extension can represent, and replaces eligible ones with
//! their `c.*` equivalent. Replacing an instruction can only shrink it (4
//! bytes to 2), which can only shrink the distances used by later
//! eligibility checks, so the loop is a monotonically shrinking fixed
//! point: it terminates in at most `items.len()` rounds, once because every
//! instruction is independently replaced at most once.
//!
//! `Item::Li`/`Item::Call`/`Item::Tail` are left to the layout resolver's own
//! short/long form selection and are not additionally targeted here: once
//! the expander has chosen a dedicated IR node for them, their lowering is
//! the encoder's job, not the compressor's.

#[cfg(test)]
mod tests;

use indexmap::IndexMap;

use crate::error::{AsmError, Span};
use crate::eval::{self, NameResolver};
use crate::isa;
use crate::layout;
use crate::parser::ast::{Expr, Item, Operand};

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

pub fn compress(items: Vec<Item>, constants: &IndexMap<String, i64>) -> Result<Vec<Item>, Vec<AsmError>> {
    let mut items = items;
    let max_rounds = items.len() + 1;

    for _ in 0..max_rounds {
        let layout = layout::resolve_layout(&items, constants)?;
        let resolver = Resolver { constants, labels: &layout.labels };
        let mut changed = false;

        for (idx, item) in items.iter_mut().enumerate() {
            let pc = layout.items[idx].offset;
            if let Item::Instruction { mnemonic, operands, .. } = item {
                if let Some((new_mnemonic, new_operands)) = try_compress(mnemonic, operands, pc, &resolver) {
                    *mnemonic = new_mnemonic;
                    *operands = new_operands;
                    changed = true;
                }
            }
        }

        if !changed {
            return Ok(items);
        }
    }

    Ok(items)
}

fn eval_opt(expr: &Expr, resolver: &Resolver) -> Option<i64> {
    eval::eval_expr(expr, resolver).ok()
}

fn fits_signed(v: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    v >= min && v <= max
}

fn compressed_class(r: u8) -> bool {
    isa::is_compressed_reg(r)
}

fn reg(r: u8) -> Operand {
    Operand::Reg(r)
}

fn imm(v: i64) -> Operand {
    Operand::Expr(Expr::Int(v))
}

/// Try to replace one real instruction with its compressed form. Returns
/// `None` if the pattern or operand values don't qualify. Expression
/// operands that fail to evaluate (should not happen once a layout exists
/// for every label in the program) are treated as ineligible rather than a
/// hard error: the encoder is the authoritative place to report a genuinely
/// unresolved reference.
fn try_compress(mnemonic: &str, operands: &[Operand], pc: i64, resolver: &Resolver) -> Option<(String, Vec<Operand>)> {
    match (mnemonic, operands) {
        ("addi", [Operand::Reg(0), Operand::Reg(0), Operand::Expr(e)]) if eval_opt(e, resolver) == Some(0) => {
            Some(("c.nop".into(), vec![]))
        }
        ("addi", [Operand::Reg(rd), Operand::Reg(0), Operand::Expr(e)]) if *rd != 0 => {
            let v = eval_opt(e, resolver)?;
            fits_signed(v, 6).then(|| ("c.li".into(), vec![reg(*rd), imm(v)]))
        }
        ("addi", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)]) if rd == rs1 && *rd != 0 => {
            let v = eval_opt(e, resolver)?;
            (v != 0 && fits_signed(v, 6)).then(|| ("c.addi".into(), vec![reg(*rd), imm(v)]))
        }
        ("addi", [Operand::Reg(rd), Operand::Reg(2), Operand::Expr(e)]) if compressed_class(*rd) => {
            let v = eval_opt(e, resolver)?;
            (v > 0 && v <= 1020 && v % 4 == 0)
                .then(|| ("c.addi4spn".into(), vec![reg(*rd), imm(v)]))
        }
        ("lui", [Operand::Reg(rd), Operand::Expr(e)]) if *rd != 0 && *rd != 2 => {
            let v = eval_opt(e, resolver)?;
            (v != 0 && fits_signed(v, 6)).then(|| ("c.lui".into(), vec![reg(*rd), imm(v)]))
        }
        ("jal", [Operand::Reg(rd @ (0 | 1)), Operand::Expr(e)]) => {
            let target = eval_opt(e, resolver)?;
            let delta = target - pc;
            if fits_signed(delta, 12) && delta % 2 == 0 {
                let name = if *rd == 0 { "c.j" } else { "c.jal" };
                Some((name.into(), vec![Operand::Expr(e.clone())]))
            } else {
                None
            }
        }
        ("jalr", [Operand::Reg(rd @ (0 | 1)), Operand::Reg(rs), Operand::Expr(e)])
            if eval_opt(e, resolver) == Some(0) && *rs != 0 =>
        {
            let name = if *rd == 0 { "c.jr" } else { "c.jalr" };
            Some((name.into(), vec![reg(*rs)]))
        }
        ("add", [Operand::Reg(rd), Operand::Reg(0), Operand::Reg(rs2)]) if *rd != 0 && *rs2 != 0 => {
            Some(("c.mv".into(), vec![reg(*rd), reg(*rs2)]))
        }
        ("add", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Reg(rs2)])
            if rd == rs1 && *rd != 0 && *rs2 != 0 =>
        {
            Some(("c.add".into(), vec![reg(*rd), reg(*rs2)]))
        }
        ("beq" | "bne", [Operand::Reg(rs1), Operand::Reg(0), Operand::Expr(e)]) if compressed_class(*rs1) => {
            let target = eval_opt(e, resolver)?;
            let delta = target - pc;
            if fits_signed(delta, 9) && delta % 2 == 0 {
                let name = if mnemonic == "beq" { "c.beqz" } else { "c.bnez" };
                Some((name.into(), vec![reg(*rs1), Operand::Expr(e.clone())]))
            } else {
                None
            }
        }
        _ => try_compress_mem(mnemonic, operands, resolver),
    }
}

/// `lw`/`sw` are parsed with the memory-operand sugar, which this table
/// dispatches on `Shape::Load`/`Shape::Store`: `op rd, imm(rs1)` becomes two
/// operands, `Operand::Reg(rd)` and `Operand::Mem { offset, base }`. Kept as
/// a second match (rather than folded into `try_compress`'s tuple pattern)
/// because the operand shapes for loads/stores don't fit the other arms'
/// fixed arity.
fn try_compress_mem(mnemonic: &str, operands: &[Operand], resolver: &Resolver) -> Option<(String, Vec<Operand>)> {
    match (mnemonic, operands) {
        ("lw", [Operand::Reg(rd), Operand::Mem { offset, base }]) => {
            let off = eval_opt(offset, resolver)?;
            if *base == 2 {
                (*rd != 0 && off >= 0 && off <= 252 && off % 4 == 0)
                    .then(|| ("c.lwsp".into(), vec![reg(*rd), imm(off)]))
            } else if compressed_class(*rd) && compressed_class(*base) {
                (off >= 0 && off <= 124 && off % 4 == 0)
                    .then(|| ("c.lw".into(), vec![reg(*rd), reg(*base), imm(off)]))
            } else {
                None
            }
        }
        ("sw", [Operand::Reg(rs2), Operand::Mem { offset, base }]) => {
            let off = eval_opt(offset, resolver)?;
            if *base == 2 {
                (off >= 0 && off <= 252 && off % 4 == 0)
                    .then(|| ("c.swsp".into(), vec![reg(*rs2), imm(off)]))
            } else if compressed_class(*rs2) && compressed_class(*base) {
                (off >= 0 && off <= 124 && off % 4 == 0)
                    .then(|| ("c.sw".into(), vec![reg(*rs2), reg(*base), imm(off)]))
            } else {
                None
            }
        }
        ("and" | "or" | "xor" | "sub", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Reg(rs2)])
            if rd == rs1 && compressed_class(*rd) && compressed_class(*rs2) =>
        {
            let name = match mnemonic {
                "and" => "c.and",
                "or" => "c.or",
                "xor" => "c.xor",
                _ => "c.sub",
            };
            Some((name.into(), vec![reg(*rd), reg(*rs2)]))
        }
        ("srli" | "srai", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)])
            if rd == rs1 && compressed_class(*rd) =>
        {
            let shamt = eval_opt(e, resolver)?;
            (0..=31).contains(&shamt).then(|| {
                let name = if mnemonic == "srli" { "c.srli" } else { "c.srai" };
                (name.into(), vec![reg(*rd), imm(shamt)])
            })
        }
        ("andi", [Operand::Reg(rd), Operand::Reg(rs1), Operand::Expr(e)]) if rd == rs1 && compressed_class(*rd) => {
            let v = eval_opt(e, resolver)?;
            fits_signed(v, 6).then(|| ("c.andi".into(), vec![reg(*rd), imm(v)]))
        }
        ("ebreak", []) => Some(("c.ebreak".into(), vec![])),
        _ => None,
    }
}
