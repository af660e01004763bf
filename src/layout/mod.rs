//! # Layout Resolver (fixed point)
//!
//! Assigns every label a byte offset and every size-variable item (`li`,
//! `call`, `tail`, `align`) a concrete size, per spec §4.6. Compression is
//! deliberately out of scope here: this pass always assumes the
//! uncompressed 4-byte encoding for real instructions, converges, and only
//! then (if `--compress` is set) hands off to [`crate::compress`], which
//! runs its own, separate shrinking fixed point and re-invokes this module
//! to re-layout after every replacement (design note, §9: of the two
//! possible readings of seeding — optimistic 2-byte sizes during layout
//! itself vs. "the compressor runs only after layout has converged without
//! it" — this crate implements the latter; layout and compression are
//! sequential, not interleaved).

pub mod symbol_table;


use indexmap::IndexMap;

use crate::error::{AsmError, Span};
use crate::eval::{self, NameResolver};
use crate::parser::ast::Item;
use symbol_table::SymbolTable;

/// Which concrete instruction sequence a size-variable item resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionForm {
    Fixed,
    LiAddi,
    LiLui,
    LiLuiAddi,
    JumpShort,
    JumpLong,
}

#[derive(Debug, Clone, Copy)]
pub struct ItemLayout {
    pub offset: i64,
    pub size: u32,
    pub form: ExpansionForm,
}

pub struct LayoutResult {
    pub labels: IndexMap<String, i64>,
    pub items: Vec<ItemLayout>,
    pub total_size: i64,
}

struct Resolver<'a> {
    constants: &'a IndexMap<String, i64>,
    labels: &'a SymbolTable,
}

impl<'a> NameResolver for Resolver<'a> {
    fn resolve_ident(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        if let Some(v) = self.constants.get(name) {
            return Ok(*v);
        }
        self.labels
            .get(name)
            .ok_or_else(|| AsmError::undefined_identifier(name, span))
    }

    fn resolve_label(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        self.labels
            .get(name)
            .ok_or_else(|| AsmError::undefined_identifier(name, span))
    }
}

fn fits_signed(v: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    v >= min && v <= max
}

const MAX_ITERATIONS_SLACK: usize = 8;

pub fn resolve_layout(items: &[Item], constants: &IndexMap<String, i64>) -> Result<LayoutResult, Vec<AsmError>> {
    let mut labels = SymbolTable::new();
    let mut errors = Vec::new();
    for item in items {
        if let Item::Label { name, span } = item {
            if let Err(e) = labels.declare(name, *span) {
                errors.push(e);
            }
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut sizes: Vec<u32> = vec![0; items.len()];
    let mut forms: Vec<ExpansionForm> = vec![ExpansionForm::Fixed; items.len()];
    for (idx, item) in items.iter().enumerate() {
        sizes[idx] = fixed_size(item).unwrap_or(4);
    }

    let max_iterations = items.len() + MAX_ITERATIONS_SLACK;
    let mut offsets = vec![0i64; items.len()];

    for _ in 0..max_iterations {
        let mut offset: i64 = 0;
        let mut changed = false;
        let resolver = Resolver { constants, labels: &labels };

        for (idx, item) in items.iter().enumerate() {
            offsets[idx] = offset;
            if let Item::Label { name, .. } = item {
                labels.set(name, offset);
            }

            let (new_size, form) = match item {
                Item::Align { amount, span } => {
                    let n = eval::eval_expr(amount, &resolver).map_err(|e| vec![e])?;
                    if n <= 0 || (n & (n - 1)) != 0 {
                        errors.push(AsmError::alignment(
                            format!("'align' argument {n} is not a positive power of two"),
                            *span,
                        ));
                        (0, ExpansionForm::Fixed)
                    } else {
                        let pad = (n - (offset.rem_euclid(n))) % n;
                        (pad as u32, ExpansionForm::Fixed)
                    }
                }
                Item::Li { imm, .. } => {
                    match eval::eval_expr(imm, &resolver) {
                        Ok(v) => size_of_li(v),
                        Err(_) => (sizes[idx].max(4), forms[idx]),
                    }
                }
                Item::Call { target, .. } | Item::Tail { target, .. } => {
                    match eval::eval_expr(target, &resolver) {
                        Ok(v) => {
                            let delta = v - offset;
                            size_of_jump(delta)
                        }
                        Err(_) => (sizes[idx].max(4), forms[idx]),
                    }
                }
                other => (fixed_size(other).unwrap_or(4), ExpansionForm::Fixed),
            };

            // Monotone non-decreasing: never let a dynamic item's size shrink
            // within this run (spec §4.6 termination argument).
            let merged_size = new_size.max(sizes[idx]);
            if merged_size != sizes[idx] || forms[idx] != form {
                changed = true;
            }
            sizes[idx] = merged_size;
            if matches!(form, ExpansionForm::LiAddi | ExpansionForm::LiLui | ExpansionForm::LiLuiAddi | ExpansionForm::JumpShort | ExpansionForm::JumpLong)
            {
                forms[idx] = form;
            }

            offset += sizes[idx] as i64;
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        if !changed {
            let item_layouts = (0..items.len())
                .map(|i| ItemLayout { offset: offsets[i], size: sizes[i], form: forms[i] })
                .collect();
            return Ok(LayoutResult {
                labels: labels.as_map(),
                items: item_layouts,
                total_size: offset,
            });
        }
    }

    Err(vec![AsmError::name_resolution(
        "layout did not converge (internal invariant violation)",
        Span::default(),
    )])
}

/// Validates that every instruction lands on an offset the target core can
/// fetch from: word-aligned when the C extension is not in play, halfword
/// when it is. This is deliberately a separate pass over the converged
/// offsets rather than folded into the fixed point above, since it depends
/// on the caller's `--compress` setting (spec §8, scenario 3), not on
/// anything the fixed point itself tracks.
pub fn check_instruction_alignment(items: &[Item], layout: &LayoutResult, compress_enabled: bool) -> Vec<AsmError> {
    let required = if compress_enabled { 2 } else { 4 };
    let mut errors = Vec::new();
    for (item, item_layout) in items.iter().zip(&layout.items) {
        let is_instruction = matches!(item, Item::Instruction { .. } | Item::Li { .. } | Item::Call { .. } | Item::Tail { .. });
        if is_instruction && item_layout.offset % required as i64 != 0 {
            errors.push(AsmError::alignment(
                format!("instruction at offset {} is not {}-byte aligned", item_layout.offset, required),
                item.span(),
            ));
        }
    }
    errors
}

fn size_of_li(imm: i64) -> (u32, ExpansionForm) {
    if (-2048..=2047).contains(&imm) {
        (4, ExpansionForm::LiAddi)
    } else if imm & 0xFFF == 0 {
        (4, ExpansionForm::LiLui)
    } else {
        (8, ExpansionForm::LiLuiAddi)
    }
}

fn size_of_jump(delta: i64) -> (u32, ExpansionForm) {
    if fits_signed(delta, 21) && delta % 2 == 0 {
        (4, ExpansionForm::JumpShort)
    } else {
        (8, ExpansionForm::JumpLong)
    }
}

/// Size that does not depend on labels, PC, or iteration state. `None` for
/// instructions and size-variable pseudo-expansions, whose size is computed
/// inside the fixed point.
fn fixed_size(item: &Item) -> Option<u32> {
    match item {
        Item::ConstantDef { .. } | Item::Label { .. } | Item::ErrorDirective { .. } => Some(0),
        Item::Instruction { mnemonic, .. } => Some(if mnemonic.starts_with("c.") { 2 } else { 4 }),
        Item::Bytes { values, .. } => Some(values.len() as u32),
        Item::Shorts { values, .. } => Some(values.len() as u32 * 2),
        Item::Ints { values, .. } => Some(values.len() as u32 * 4),
        Item::Longs { values, .. } => Some(values.len() as u32 * 4),
        Item::LongLongs { values, .. } => Some(values.len() as u32 * 8),
        Item::StringLiteral { bytes, .. } => Some(bytes.len() as u32),
        Item::IncludeBytes { bytes, .. } => Some(bytes.len() as u32),
        Item::Pack { ty, .. } => Some(ty.width() as u32),
        Item::Li { .. } | Item::Call { .. } | Item::Tail { .. } | Item::Align { .. } => None,
        Item::PseudoInstruction { .. } => {
            unreachable!("pseudo-instructions are rewritten before layout runs")
        }
    }
}
