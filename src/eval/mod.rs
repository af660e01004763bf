//! # Constant / Expression Evaluator
//!
//! Walks an [`Expr`](crate::parser::ast::Expr) tree to a signed 64-bit
//! value (spec §4.4). Identifier and `%position` resolution is delegated to
//! a [`NameResolver`] so the same evaluator serves two different passes:
//! eager constant-scope evaluation (only other constants visible, no PC),
//! and full evaluation during layout/encoding (constants, label offsets,
//! and `%position` all visible).


use indexmap::IndexMap;

use crate::error::{AsmError, Span};
use crate::parser::ast::{BinOp, Expr, Item, UnaryOp};

/// Supplies the values an expression may reference beyond integer literals.
pub trait NameResolver {
    /// Resolve a bare identifier: a constant, or (once layout has run) a
    /// label's offset.
    fn resolve_ident(&self, name: &str, span: Span) -> Result<i64, AsmError>;
    /// Resolve the label named in `%position(label, base)`. Distinct from
    /// `resolve_ident` because a label is required here, not a constant.
    fn resolve_label(&self, name: &str, span: Span) -> Result<i64, AsmError>;
}

/// Unmasked `(value + 0x800) >> 12`, before `%hi`'s 20-bit truncation.
/// [`lo12`] needs the unmasked form to reconstruct `value` exactly; values
/// whose full `%hi` exceeds 20 bits would otherwise lose the bits above it
/// twice.
fn hi20_raw(value: i64) -> i64 {
    value.wrapping_add(0x800) >> 12
}

/// `%hi(x)`, masked to the 20 bits a `lui` immediate actually carries (spec
/// §3: `((x + 0x800) >> 12) & 0xFFFFF`).
pub fn hi20(value: i64) -> i64 {
    hi20_raw(value) & 0xFFFFF
}

/// `%lo(x)`: the sign-adjusted low 12 bits consistent with [`hi20`].
pub fn lo12(value: i64) -> i64 {
    value - (hi20_raw(value) << 12)
}

pub fn eval_expr(expr: &Expr, resolver: &impl NameResolver) -> Result<i64, AsmError> {
    match expr {
        Expr::Int(v) => Ok(*v),
        Expr::Ident(name, span) => resolver.resolve_ident(name, *span),
        Expr::Unary(op, inner, span) => {
            let v = eval_expr(inner, resolver)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Neg => v.checked_neg().ok_or_else(|| {
                    AsmError::range("negation overflows signed 64-bit range", *span)
                })?,
                UnaryOp::Not => !v,
            })
        }
        Expr::Binary(op, lhs, rhs, span) => {
            let l = eval_expr(lhs, resolver)?;
            let r = eval_expr(rhs, resolver)?;
            eval_binop(*op, l, r, *span)
        }
        Expr::Hi(inner, _) => Ok(hi20(eval_expr(inner, resolver)?)),
        Expr::Lo(inner, _) => Ok(lo12(eval_expr(inner, resolver)?)),
        Expr::Position(label, base, span) => {
            let label_off = resolver.resolve_label(label, *span)?;
            let base_val = eval_expr(base, resolver)?;
            Ok(base_val + label_off)
        }
    }
}

fn eval_binop(op: BinOp, l: i64, r: i64, span: Span) -> Result<i64, AsmError> {
    match op {
        BinOp::Mul => l.checked_mul(r).ok_or_else(|| overflow(span)),
        BinOp::Div => {
            if r == 0 {
                Err(AsmError::range("division by zero", span))
            } else {
                l.checked_div(r).ok_or_else(|| overflow(span))
            }
        }
        BinOp::Mod => {
            if r == 0 {
                Err(AsmError::range("modulo by zero", span))
            } else {
                l.checked_rem(r).ok_or_else(|| overflow(span))
            }
        }
        BinOp::Add => l.checked_add(r).ok_or_else(|| overflow(span)),
        BinOp::Sub => l.checked_sub(r).ok_or_else(|| overflow(span)),
        BinOp::Shl => {
            if !(0..64).contains(&r) {
                return Err(AsmError::range("shift amount out of range", span));
            }
            Ok(l.wrapping_shl(r as u32))
        }
        BinOp::Shr => {
            if !(0..64).contains(&r) {
                return Err(AsmError::range("shift amount out of range", span));
            }
            Ok(l.wrapping_shr(r as u32))
        }
        BinOp::And => Ok(l & r),
        BinOp::Xor => Ok(l ^ r),
        BinOp::Or => Ok(l | r),
    }
}

fn overflow(span: Span) -> AsmError {
    AsmError::range("arithmetic overflow in constant expression", span)
}

/// Resolver used for eager constant-scope evaluation: only previously
/// resolved constants are visible, no labels or `%position`.
struct ConstantResolver<'a> {
    resolved: &'a IndexMap<String, i64>,
}

impl<'a> NameResolver for ConstantResolver<'a> {
    fn resolve_ident(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        self.resolved
            .get(name)
            .copied()
            .ok_or_else(|| AsmError::undefined_identifier(name, span))
    }

    fn resolve_label(&self, name: &str, span: Span) -> Result<i64, AsmError> {
        Err(AsmError::name_resolution(
            format!("'%position' referencing label '{name}' is not permitted in a constant definition"),
            span,
        ))
    }
}

/// Evaluate every [`Item::ConstantDef`] in `items`, in dependency order
/// (spec §4.4: "forward references among ConstantDefs are resolved by
/// topological evaluation; a cycle is an error").
pub fn evaluate_constants(items: &[Item]) -> Result<IndexMap<String, i64>, Vec<AsmError>> {
    let mut defs: IndexMap<String, (&Expr, Span)> = IndexMap::new();
    let mut errors = Vec::new();

    for item in items {
        if let Item::ConstantDef { name, expr, span } = item {
            if let Some((_, first_span)) = defs.get(name) {
                errors.push(AsmError::duplicate_constant(name, *first_span, *span));
                continue;
            }
            defs.insert(name.clone(), (expr, *span));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut resolved: IndexMap<String, i64> = IndexMap::new();
    let mut in_progress: Vec<String> = Vec::new();

    for name in defs.keys().cloned().collect::<Vec<_>>() {
        if let Err(e) = resolve_one(&name, &defs, &mut resolved, &mut in_progress) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

fn resolve_one(
    name: &str,
    defs: &IndexMap<String, (&Expr, Span)>,
    resolved: &mut IndexMap<String, i64>,
    in_progress: &mut Vec<String>,
) -> Result<i64, AsmError> {
    if let Some(v) = resolved.get(name) {
        return Ok(*v);
    }
    let (expr, span) = match defs.get(name) {
        Some(v) => *v,
        None => return Err(AsmError::undefined_identifier(name, Span::default())),
    };
    if in_progress.contains(&name.to_string()) {
        return Err(AsmError::name_resolution(
            format!("circular definition of constant '{name}'"),
            span,
        ));
    }
    in_progress.push(name.to_string());
    let result = eval_expr_with_deps(expr, defs, resolved, in_progress);
    in_progress.pop();
    let value = result?;
    resolved.insert(name.to_string(), value);
    Ok(value)
}

/// Like [`eval_expr`], but resolving an unresolved constant recursively
/// triggers [`resolve_one`] instead of failing outright, implementing the
/// topological walk.
fn eval_expr_with_deps(
    expr: &Expr,
    defs: &IndexMap<String, (&Expr, Span)>,
    resolved: &mut IndexMap<String, i64>,
    in_progress: &mut Vec<String>,
) -> Result<i64, AsmError> {
    match expr {
        Expr::Int(v) => Ok(*v),
        Expr::Ident(name, span) => {
            if defs.contains_key(name) {
                resolve_one(name, defs, resolved, in_progress)
            } else {
                Err(AsmError::undefined_identifier(name, *span))
            }
        }
        Expr::Unary(op, inner, span) => {
            let v = eval_expr_with_deps(inner, defs, resolved, in_progress)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Neg => v.checked_neg().ok_or_else(|| overflow(*span))?,
                UnaryOp::Not => !v,
            })
        }
        Expr::Binary(op, lhs, rhs, span) => {
            let l = eval_expr_with_deps(lhs, defs, resolved, in_progress)?;
            let r = eval_expr_with_deps(rhs, defs, resolved, in_progress)?;
            eval_binop(*op, l, r, *span)
        }
        Expr::Hi(inner, _) => Ok(hi20(eval_expr_with_deps(inner, defs, resolved, in_progress)?)),
        Expr::Lo(inner, _) => Ok(lo12(eval_expr_with_deps(inner, defs, resolved, in_progress)?)),
        Expr::Position(label, _, span) => Err(AsmError::name_resolution(
            format!("'%position({label}, ...)' is not permitted in a constant definition"),
            *span,
        )),
    }
}

/// Convenience wrapper for a single already-closed expression (no further
/// constants to discover), used once constants are fully resolved.
pub fn eval_with_constants(expr: &Expr, constants: &IndexMap<String, i64>) -> Result<i64, AsmError> {
    eval_expr(expr, &ConstantResolver { resolved: constants })
}
