//! Evaluation of parsed expressions against the vectors of a store.

use super::parser::{BinOp, Expr, UnaryOp};
use super::ExprHost;
use crate::error::{Error, Result};
use crate::store::VectorStore;
use crate::vector::IndexValue;
use tracing::trace;

pub(crate) struct Evaluator<'a> {
    pub(crate) store: &'a VectorStore,
    pub(crate) host: &'a mut dyn ExprHost,
}

impl Evaluator<'_> {
    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Vec<f64>> {
        match expr {
            Expr::Number(n) => Ok(vec![*n]),
            Expr::Vector(name) => Ok(self.store.vector_named(name)?.values().to_vec()),
            Expr::Indexed { name, index } => {
                let vector = self.store.vector_named(name)?;
                Ok(match vector.read_index(self.store.resolver(), index)? {
                    IndexValue::Scalar(x) => vec![x],
                    IndexValue::List(values) => values,
                })
            }
            Expr::Script(script) => {
                let text = self.host.eval_script(script)?;
                self.reparse(&text)
            }
            Expr::Quoted(text) => {
                let text = self.host.substitute(text)?;
                self.reparse(&text)
            }
            Expr::Braced(text) => self.reparse(text),
            Expr::Unary(op, operand) => {
                let values = self.eval(operand)?;
                Ok(values.into_iter().map(|x| unary(*op, x)).collect())
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                binary(*op, &a, &b)
            }
            Expr::Call {
                name,
                function,
                arg,
            } => {
                let values = self.eval(arg)?;
                trace!(function = %name, len = values.len(), "math function");
                self.store.functions().apply(*function, &values)
            }
        }
    }

    // Host text is either the name of a vector or a list of numbers.
    fn reparse(&self, text: &str) -> Result<Vec<f64>> {
        let text = text.trim();
        if let Ok(vector) = self.store.vector_named(text) {
            return Ok(vector.values().to_vec());
        }
        let values = text
            .split_whitespace()
            .map(|word| word.parse::<f64>())
            .collect::<core::result::Result<Vec<f64>, _>>()
            .map_err(|_| Error::parse(format!("\"{text}\" is not a vector or list of numbers")))?;
        if values.is_empty() {
            return Err(Error::parse("empty operand"));
        }
        Ok(values)
    }
}

fn truth(x: bool) -> f64 {
    if x {
        1.0
    } else {
        0.0
    }
}

fn unary(op: UnaryOp, x: f64) -> f64 {
    match op {
        UnaryOp::Neg => -x,
        UnaryOp::Not if x.is_nan() => x,
        UnaryOp::Not => truth(x == 0.0),
    }
}

fn combine(op: BinOp, a: f64, b: f64) -> Result<f64> {
    if a.is_nan() || b.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div | BinOp::Mod if b == 0.0 => return Err(Error::DivideByZero),
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::Pow if a == 0.0 && b < 0.0 => return Err(Error::DivideByZero),
        BinOp::Pow if a < 0.0 && b.fract() != 0.0 => return Err(Error::domain("^", a)),
        BinOp::Pow => a.powf(b),
        BinOp::Lt => truth(a < b),
        BinOp::Le => truth(a <= b),
        BinOp::Gt => truth(a > b),
        BinOp::Ge => truth(a >= b),
        BinOp::Eq => truth(a == b),
        BinOp::Ne => truth(a != b),
        BinOp::And => truth(a != 0.0 && b != 0.0),
        BinOp::Or => truth(a != 0.0 || b != 0.0),
        BinOp::Shl | BinOp::Shr => {
            return Err(Error::invalid_arg(op.symbol(), "shifts apply to whole vectors"))
        }
    })
}

/// Rotate `values` left (`<<`) or right (`>>`) by `count` positions.
fn rotate(op: BinOp, values: &[f64], count: &[f64]) -> Result<Vec<f64>> {
    let [count] = count else {
        return Err(Error::invalid_arg(op.symbol(), "shift count must be a scalar"));
    };
    if !count.is_finite() {
        return Err(Error::domain(op.symbol(), *count));
    }
    let mut out = values.to_vec();
    if out.is_empty() {
        return Ok(out);
    }
    let n = out.len() as i64;
    let k = (*count as i64).rem_euclid(n) as usize;
    match op {
        BinOp::Shl => out.rotate_left(k),
        _ => out.rotate_right(k),
    }
    Ok(out)
}

/// Apply `op` element-wise, broadcasting a length-1 operand.
pub(crate) fn binary(op: BinOp, a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if matches!(op, BinOp::Shl | BinOp::Shr) {
        return rotate(op, a, b);
    }
    match (a, b) {
        ([x], _) if b.len() != 1 => b.iter().map(|&y| combine(op, *x, y)).collect(),
        (_, [y]) => a.iter().map(|&x| combine(op, x, *y)).collect(),
        _ if a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(&x, &y)| combine(op, x, y))
            .collect(),
        _ => Err(Error::LengthMismatch {
            left: a.len(),
            right: b.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn scalar_broadcast_keeps_operand_order() {
        assert_eq!(
            binary(BinOp::Div, &[12.0], &[1.0, 2.0, 3.0]),
            Ok(vec![12.0, 6.0, 4.0])
        );
        assert_eq!(
            binary(BinOp::Sub, &[1.0, 2.0], &[10.0]),
            Ok(vec![-9.0, -8.0])
        );
        assert_eq!(
            binary(BinOp::Add, &[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(Error::LengthMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn empty_elements_propagate() {
        let out = binary(BinOp::Lt, &[1.0, NAN], &[2.0]).expect("compare");
        assert_eq!(out[0], 1.0);
        assert!(out[1].is_nan());
        // Division by zero through an empty element is not an error.
        assert!(binary(BinOp::Div, &[NAN], &[0.0]).expect("nan")[0].is_nan());
    }

    #[test]
    fn genuine_domain_errors_abort() {
        assert_eq!(binary(BinOp::Div, &[1.0], &[0.0]), Err(Error::DivideByZero));
        assert_eq!(binary(BinOp::Mod, &[1.0, 2.0], &[0.0]), Err(Error::DivideByZero));
        assert_eq!(binary(BinOp::Pow, &[0.0], &[-1.0]), Err(Error::DivideByZero));
        assert!(matches!(
            binary(BinOp::Pow, &[-8.0], &[0.5]),
            Err(Error::MathDomain { .. })
        ));
        assert_eq!(binary(BinOp::Pow, &[-2.0], &[3.0]), Ok(vec![-8.0]));
    }

    #[test]
    fn shifts_rotate_circularly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(binary(BinOp::Shl, &v, &[1.0]), Ok(vec![2.0, 3.0, 4.0, 1.0]));
        assert_eq!(binary(BinOp::Shr, &v, &[5.0]), Ok(vec![4.0, 1.0, 2.0, 3.0]));
        assert_eq!(binary(BinOp::Shl, &v, &[-1.0]), Ok(vec![4.0, 1.0, 2.0, 3.0]));
        assert!(binary(BinOp::Shl, &v, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn logic_yields_zero_or_one() {
        assert_eq!(
            binary(BinOp::And, &[1.0, 0.0, 2.0], &[3.0]),
            Ok(vec![1.0, 0.0, 1.0])
        );
        assert_eq!(unary(UnaryOp::Not, 0.0), 1.0);
        assert_eq!(unary(UnaryOp::Not, -3.0), 0.0);
        assert!(unary(UnaryOp::Not, NAN).is_nan());
    }
}
