//! Compile-time evaluation of operators on constant operands
//!
//! Integers use wrapping `i64` arithmetic and reals use `f64`. A mixed
//! integer/real pair is evaluated in reals. Relational and logical operators
//! produce the integers `1` and `0`. Integer division or remainder by zero
//! is left unfolded so the instruction reaches the backend.

use super::instruction::TacOp;
use crate::symbols::Literal;
use std::cmp::Ordering;

pub fn fold_binary(op: TacOp, lhs: &Literal, rhs: &Literal) -> Option<Literal> {
    match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => fold_int(op, *a, *b),
        (Literal::Int(_) | Literal::Real(_), Literal::Int(_) | Literal::Real(_)) => {
            fold_real(op, lhs.as_real()?, rhs.as_real()?)
        }
        (Literal::Char(a), Literal::Char(b)) => compare(op, a.cmp(b)),
        (Literal::Char(_) | Literal::Str(_), Literal::Char(_) | Literal::Str(_)) => {
            compare(op, text(lhs).cmp(&text(rhs)))
        }
        _ => None,
    }
}

pub fn fold_unary(op: TacOp, operand: &Literal) -> Option<Literal> {
    match (op, operand) {
        (TacOp::Pos, Literal::Int(_) | Literal::Real(_)) => Some(operand.clone()),
        (TacOp::Neg, Literal::Int(i)) => Some(Literal::Int(i.wrapping_neg())),
        (TacOp::Neg, Literal::Real(r)) => Some(Literal::Real(-r)),
        (TacOp::Not, Literal::Int(i)) => Some(truth(*i == 0)),
        _ => None,
    }
}

fn fold_int(op: TacOp, a: i64, b: i64) -> Option<Literal> {
    let value = match op {
        TacOp::Add => a.wrapping_add(b),
        TacOp::Sub => a.wrapping_sub(b),
        TacOp::Mult => a.wrapping_mul(b),
        TacOp::Div if b != 0 => a.wrapping_div(b),
        TacOp::Mod if b != 0 => a.wrapping_rem(b),
        TacOp::And => return Some(truth(a != 0 && b != 0)),
        TacOp::Or => return Some(truth(a != 0 || b != 0)),
        _ if op.is_relational() => return compare(op, a.cmp(&b)),
        _ => return None,
    };
    Some(Literal::Int(value))
}

fn fold_real(op: TacOp, a: f64, b: f64) -> Option<Literal> {
    let value = match op {
        TacOp::Add => a + b,
        TacOp::Sub => a - b,
        TacOp::Mult => a * b,
        TacOp::Div => a / b,
        _ if op.is_relational() => return compare(op, a.partial_cmp(&b)?),
        _ => return None,
    };
    Some(Literal::Real(value))
}

fn compare(op: TacOp, ordering: Ordering) -> Option<Literal> {
    let holds = match op {
        TacOp::Eq => ordering == Ordering::Equal,
        TacOp::Neq => ordering != Ordering::Equal,
        TacOp::Lt => ordering == Ordering::Less,
        TacOp::Lte => ordering != Ordering::Greater,
        TacOp::Gt => ordering == Ordering::Greater,
        TacOp::Gte => ordering != Ordering::Less,
        _ => return None,
    };
    Some(truth(holds))
}

fn truth(value: bool) -> Literal {
    Literal::Int(value as i64)
}

fn text(literal: &Literal) -> String {
    match literal {
        Literal::Char(c) => c.to_string(),
        Literal::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic() {
        let fold = |op| fold_binary(op, &Literal::Int(7), &Literal::Int(2));
        assert_eq!(fold(TacOp::Add), Some(Literal::Int(9)));
        assert_eq!(fold(TacOp::Sub), Some(Literal::Int(5)));
        assert_eq!(fold(TacOp::Mult), Some(Literal::Int(14)));
        assert_eq!(fold(TacOp::Div), Some(Literal::Int(3)));
        assert_eq!(fold(TacOp::Mod), Some(Literal::Int(1)));
    }

    #[test]
    fn test_integer_wraps() {
        assert_eq!(
            fold_binary(TacOp::Add, &Literal::Int(i64::MAX), &Literal::Int(1)),
            Some(Literal::Int(i64::MIN))
        );
        assert_eq!(
            fold_unary(TacOp::Neg, &Literal::Int(i64::MIN)),
            Some(Literal::Int(i64::MIN))
        );
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        assert_eq!(fold_binary(TacOp::Div, &Literal::Int(1), &Literal::Int(0)), None);
        assert_eq!(fold_binary(TacOp::Mod, &Literal::Int(1), &Literal::Int(0)), None);
    }

    #[test]
    fn test_mixed_promotes_to_real() {
        assert_eq!(
            fold_binary(TacOp::Add, &Literal::Int(1), &Literal::Real(0.5)),
            Some(Literal::Real(1.5))
        );
        assert_eq!(
            fold_binary(TacOp::Mult, &Literal::Real(2.0), &Literal::Int(3)),
            Some(Literal::Real(6.0))
        );
        assert_eq!(fold_binary(TacOp::Mod, &Literal::Real(2.0), &Literal::Int(3)), None);
    }

    #[test]
    fn test_relational() {
        assert_eq!(
            fold_binary(TacOp::Lt, &Literal::Int(1), &Literal::Int(2)),
            Some(Literal::Int(1))
        );
        assert_eq!(
            fold_binary(TacOp::Gte, &Literal::Int(1), &Literal::Real(2.0)),
            Some(Literal::Int(0))
        );
        assert_eq!(
            fold_binary(TacOp::Eq, &Literal::Char('a'), &Literal::Str("a".into())),
            Some(Literal::Int(1))
        );
    }

    #[test]
    fn test_logical() {
        assert_eq!(
            fold_binary(TacOp::And, &Literal::Int(1), &Literal::Int(0)),
            Some(Literal::Int(0))
        );
        assert_eq!(
            fold_binary(TacOp::Or, &Literal::Int(1), &Literal::Int(0)),
            Some(Literal::Int(1))
        );
        assert_eq!(fold_unary(TacOp::Not, &Literal::Int(0)), Some(Literal::Int(1)));
    }

    #[test]
    fn test_strings_do_not_add() {
        assert_eq!(
            fold_binary(TacOp::Add, &Literal::Str("a".into()), &Literal::Str("b".into())),
            None
        );
    }
}
