//! Constant folding (§4.E): used where the language requires a constant
//! expression — array bounds, `case` labels, and static initializers.
//!
//! Deliberately narrow: literals, unary `+ - ~ !`, and binary arithmetic
//! /bitwise/comparison operators over already-foldable operands. Anything
//! involving a variable, a call, or a float literal in an integer context
//! returns `None`, which callers turn into a "not a constant expression"
//! diagnostic.

use crate::ast::{BinOp, Expr, ExprKind, UnaryOp};

pub fn fold_int(expr: &Expr) -> Option<i128> {
    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(*v as i128),
        ExprKind::CharLiteral(c) => Some(*c as i128),
        ExprKind::Unary(op, inner) => {
            let v = fold_int(inner)?;
            Some(match op {
                UnaryOp::Plus => v,
                UnaryOp::Neg => -v,
                UnaryOp::BitNot => !v,
                UnaryOp::Not => {
                    if v == 0 {
                        1
                    } else {
                        0
                    }
                }
            })
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let l = fold_int(lhs)?;
            let r = fold_int(rhs)?;
            Some(match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => {
                    if r == 0 {
                        return None;
                    }
                    l / r
                }
                BinOp::Mod => {
                    if r == 0 {
                        return None;
                    }
                    l % r
                }
                BinOp::BitAnd => l & r,
                BinOp::BitOr => l | r,
                BinOp::BitXor => l ^ r,
                BinOp::Shl => l << r,
                BinOp::Shr => l >> r,
                BinOp::Lt => (l < r) as i128,
                BinOp::Le => (l <= r) as i128,
                BinOp::Gt => (l > r) as i128,
                BinOp::Ge => (l >= r) as i128,
                BinOp::Eq => (l == r) as i128,
                BinOp::Ne => (l != r) as i128,
                BinOp::LogAnd => ((l != 0) && (r != 0)) as i128,
                BinOp::LogOr => ((l != 0) || (r != 0)) as i128,
            })
        }
        ExprKind::Conditional { cond, then, else_ } => {
            if fold_int(cond)? != 0 {
                fold_int(then)
            } else {
                fold_int(else_)
            }
        }
        ExprKind::Cast { expr, .. } => fold_int(expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SourceLocation;

    fn lit(v: u64) -> Expr {
        Expr::new(ExprKind::IntLiteral(v), SourceLocation::default())
    }

    #[test]
    fn folds_arithmetic() {
        let e = Expr::new(
            ExprKind::Binary(BinOp::Add, Box::new(lit(2)), Box::new(lit(3))),
            SourceLocation::default(),
        );
        assert_eq!(fold_int(&e), Some(5));
    }

    #[test]
    fn non_constant_expression_is_none() {
        let e = Expr::new(
            ExprKind::Variable("x".into()),
            SourceLocation::default(),
        );
        assert_eq!(fold_int(&e), None);
    }
}
