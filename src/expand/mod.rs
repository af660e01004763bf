//! # Pseudo-Instruction Expander
//!
//! Runs once, after parsing and before layout (spec §4.5). Rewrites every
//! [`Item::PseudoInstruction`] into one or more real [`Item`]s. `li`,
//! `call`, and `tail` are the exception: their final instruction count
//! depends on a resolved value that may itself depend on label offsets, so
//! expansion only normalizes them into the dedicated `Item::Li`/`Item::Call`/
//! `Item::Tail` variants and leaves the short-form-vs-long-form decision to
//! the layout fixed point (§4.6).

#[cfg(test)]
mod tests;

use crate::error::AsmError;
use crate::parser::ast::{Expr, Item, Operand, Reg};

const X0: Reg = 0;
const RA: Reg = 1;

pub fn expand(items: Vec<Item>) -> Result<Vec<Item>, Vec<AsmError>> {
    let mut out = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for item in items {
        match item {
            Item::PseudoInstruction { mnemonic, operands, span } => {
                match expand_one(&mnemonic, operands, span) {
                    Ok(mut expanded) => out.append(&mut expanded),
                    Err(e) => errors.push(e),
                }
            }
            other => out.push(other),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn reg_operand(operands: &[Operand], idx: usize, mnemonic: &str, span: crate::error::Span) -> Result<Reg, AsmError> {
    match operands.get(idx) {
        Some(Operand::Reg(r)) => Ok(*r),
        _ => Err(AsmError::instruction_form(
            format!("'{mnemonic}' expects a register operand in position {}", idx + 1),
            span,
        )),
    }
}

fn expr_operand(operands: Vec<Operand>, idx: usize, mnemonic: &str, span: crate::error::Span) -> Result<Expr, AsmError> {
    match operands.into_iter().nth(idx) {
        Some(Operand::Expr(e)) => Ok(e),
        _ => Err(AsmError::instruction_form(
            format!("'{mnemonic}' expects an immediate/label operand in position {}", idx + 1),
            span,
        )),
    }
}

fn check_arity(operands: &[Operand], expected: usize, mnemonic: &str, span: crate::error::Span) -> Result<(), AsmError> {
    if operands.len() != expected {
        return Err(AsmError::instruction_form(
            format!("'{mnemonic}' expects {expected} operand(s), got {}", operands.len()),
            span,
        ));
    }
    Ok(())
}

fn instr(mnemonic: &str, operands: Vec<Operand>, span: crate::error::Span) -> Item {
    Item::Instruction {
        mnemonic: mnemonic.to_string(),
        operands,
        span,
    }
}

fn expand_one(mnemonic: &str, operands: Vec<Operand>, span: crate::error::Span) -> Result<Vec<Item>, AsmError> {
    use Operand::{Expr as E, Reg as R};

    let single = |it: Item| Ok(vec![it]);

    match mnemonic {
        "nop" => {
            check_arity(&operands, 0, mnemonic, span)?;
            single(instr("addi", vec![R(X0), R(X0), E(Expr::Int(0))], span))
        }
        "mv" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("addi", vec![R(rd), R(rs), E(Expr::Int(0))], span))
        }
        "not" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("xori", vec![R(rd), R(rs), E(Expr::Int(-1))], span))
        }
        "neg" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("sub", vec![R(rd), R(X0), R(rs)], span))
        }
        "seqz" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("sltiu", vec![R(rd), R(rs), E(Expr::Int(1))], span))
        }
        "snez" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("sltu", vec![R(rd), R(X0), R(rs)], span))
        }
        "sltz" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("slt", vec![R(rd), R(rs), R(X0)], span))
        }
        "sgtz" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let rs = reg_operand(&operands, 1, mnemonic, span)?;
            single(instr("slt", vec![R(rd), R(X0), R(rs)], span))
        }
        "beqz" | "bnez" | "blez" | "bgez" | "bltz" | "bgtz" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rs = reg_operand(&operands, 0, mnemonic, span)?;
            let off = expr_operand(operands, 1, mnemonic, span)?;
            let (real, a, b) = match mnemonic {
                "beqz" => ("beq", rs, X0),
                "bnez" => ("bne", rs, X0),
                "bgez" => ("bge", rs, X0),
                "bltz" => ("blt", rs, X0),
                // swapped-operand forms
                "blez" => ("bge", X0, rs),
                "bgtz" => ("blt", X0, rs),
                _ => unreachable!(),
            };
            single(instr(real, vec![R(a), R(b), E(off)], span))
        }
        "bgt" | "ble" | "bgtu" | "bleu" => {
            check_arity(&operands, 3, mnemonic, span)?;
            let rs = reg_operand(&operands, 0, mnemonic, span)?;
            let rt = reg_operand(&operands, 1, mnemonic, span)?;
            let off = expr_operand(operands, 2, mnemonic, span)?;
            let real = match mnemonic {
                "bgt" => "blt",
                "ble" => "bge",
                "bgtu" => "bltu",
                "bleu" => "bgeu",
                _ => unreachable!(),
            };
            // source registers swap into the corresponding ordered form
            single(instr(real, vec![R(rt), R(rs), E(off)], span))
        }
        "j" => {
            check_arity(&operands, 1, mnemonic, span)?;
            let off = expr_operand(operands, 0, mnemonic, span)?;
            single(instr("jal", vec![R(X0), E(off)], span))
        }
        // `jal off` (pseudo, implicit x1) vs `jal rd, off` (real, passed
        // through unchanged): disambiguated by operand count, since the
        // parser cannot tell them apart without knowing the mnemonic table.
        "jal" if operands.len() == 1 => {
            let off = expr_operand(operands, 0, mnemonic, span)?;
            single(instr("jal", vec![R(RA), E(off)], span))
        }
        "jal" => {
            check_arity(&operands, 2, mnemonic, span)?;
            single(instr("jal", operands, span))
        }
        "jr" => {
            check_arity(&operands, 1, mnemonic, span)?;
            let rs = reg_operand(&operands, 0, mnemonic, span)?;
            single(instr("jalr", vec![R(X0), R(rs), E(Expr::Int(0))], span))
        }
        // `jalr rs` (pseudo) vs `jalr rd, rs, imm` / `jalr rd, imm(rs)`
        // (real, 2 operands via memory-operand sugar or 3 written out).
        "jalr" if operands.len() == 1 => {
            let rs = reg_operand(&operands, 0, mnemonic, span)?;
            single(instr("jalr", vec![R(RA), R(rs), E(Expr::Int(0))], span))
        }
        "jalr" => {
            if operands.len() != 2 && operands.len() != 3 {
                return Err(AsmError::instruction_form(
                    format!("'jalr' expects 1-3 operands, got {}", operands.len()),
                    span,
                ));
            }
            single(instr("jalr", operands, span))
        }
        "ret" => {
            check_arity(&operands, 0, mnemonic, span)?;
            single(instr("jalr", vec![R(X0), R(RA), E(Expr::Int(0))], span))
        }
        "fence" if operands.is_empty() => {
            let iorw = || E(Expr::Ident("iorw".to_string(), span));
            single(instr("fence", vec![iorw(), iorw()], span))
        }
        "li" => {
            check_arity(&operands, 2, mnemonic, span)?;
            let rd = reg_operand(&operands, 0, mnemonic, span)?;
            let imm = expr_operand(operands, 1, mnemonic, span)?;
            single(Item::Li { rd, imm, span })
        }
        "call" => {
            check_arity(&operands, 1, mnemonic, span)?;
            let target = expr_operand(operands, 0, mnemonic, span)?;
            single(Item::Call { target, span })
        }
        "tail" => {
            check_arity(&operands, 1, mnemonic, span)?;
            let target = expr_operand(operands, 0, mnemonic, span)?;
            single(Item::Tail { target, span })
        }
        _ => Err(AsmError::instruction_form(
            format!("unrecognized pseudo-instruction '{mnemonic}'"),
            span,
        )),
    }
}
