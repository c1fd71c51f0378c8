//! Tree-walking evaluator with JavaScript-like numeric semantics.
//!
//! Booleans are `1.0`/`0.0`; `&&` and `||` return one of their operands;
//! `Math.round` rounds half up.

use super::{BinaryOp, Binding, Expr, FormulaError, FormulaScope, MathFn, UnaryOp};

pub fn eval(expr: &Expr, scope: &FormulaScope<'_>) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Property(binding, name) => {
            let operand = match binding {
                Binding::Subject => scope.a,
                Binding::Target => scope.b,
            };
            operand
                .property(name)
                .ok_or_else(|| FormulaError::UnknownProperty {
                    binding: binding.as_str(),
                    name: name.clone(),
                })
        }
        Expr::Variable(index) => {
            let index = eval(index, scope)?;
            if index.is_finite() && index >= 0.0 {
                Ok(scope.v.variable(index as u32))
            } else {
                Ok(0.0)
            }
        }
        Expr::Unary(op, inner) => {
            let value = eval(inner, scope)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Plus => value,
                UnaryOp::Not => bool_value(!truthy(value)),
            })
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            if truthy(left) { eval(rhs, scope) } else { Ok(left) }
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            if truthy(left) { Ok(left) } else { eval(rhs, scope) }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            let right = eval(rhs, scope)?;
            Ok(apply_binary(*op, left, right))
        }
        Expr::Conditional(condition, then, otherwise) => {
            if truthy(eval(condition, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Call(function, args) => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(apply_math(*function, &values))
        }
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn apply_binary(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left / right,
        BinaryOp::Rem => left % right,
        BinaryOp::Lt => bool_value(left < right),
        BinaryOp::Le => bool_value(left <= right),
        BinaryOp::Gt => bool_value(left > right),
        BinaryOp::Ge => bool_value(left >= right),
        BinaryOp::Eq => bool_value(left == right),
        BinaryOp::Ne => bool_value(left != right),
        // short-circuit forms are handled in eval
        BinaryOp::And => bool_value(truthy(left) && truthy(right)),
        BinaryOp::Or => bool_value(truthy(left) || truthy(right)),
    }
}

fn apply_math(function: MathFn, args: &[f64]) -> f64 {
    let first = args.first().copied().unwrap_or(f64::NAN);
    match function {
        MathFn::Floor => first.floor(),
        MathFn::Ceil => first.ceil(),
        MathFn::Round => (first + 0.5).floor(),
        MathFn::Trunc => first.trunc(),
        MathFn::Abs => first.abs(),
        MathFn::Sign => {
            if first == 0.0 || first.is_nan() {
                first
            } else {
                first.signum()
            }
        }
        MathFn::Sqrt => first.sqrt(),
        MathFn::Pow => first.powf(args.get(1).copied().unwrap_or(f64::NAN)),
        MathFn::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        MathFn::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}
