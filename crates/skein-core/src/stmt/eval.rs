use super::{BinaryOp, Expr, Value};
use crate::{Error, Result};

impl Expr {
    /// True when the expression can be computed without the database: no
    /// column, no variable, no sub-query and no aggregate.
    pub fn is_const(&self) -> bool {
        match self {
            Expr::Value(_) => true,
            Expr::BinaryOp(e) => e.lhs.is_const() && e.rhs.is_const(),
            Expr::And(operands) | Expr::Or(operands) => operands.iter().all(Expr::is_const),
            Expr::Not(e) | Expr::Neg(e) => e.is_const(),
            Expr::IsNull(e) => e.expr.is_const(),
            Expr::Call(e) => e.eval.is_some() && e.args.iter().all(Expr::is_const),
            _ => false,
        }
    }

    /// Computes a constant expression.
    pub fn eval_const(&self) -> Result<Value> {
        match self {
            Expr::Value(value) => Ok(value.clone()),
            Expr::BinaryOp(e) => eval_binary_op(e.op, e.lhs.eval_const()?, e.rhs.eval_const()?),
            Expr::And(operands) => {
                for operand in operands {
                    if !eval_bool(operand)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expr::Or(operands) => {
                for operand in operands {
                    if eval_bool(operand)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Expr::Not(e) => Ok(Value::Bool(!eval_bool(e)?)),
            Expr::Neg(e) => match e.eval_const()? {
                Value::I32(v) => Ok(Value::I32(-v)),
                Value::I64(v) => Ok(Value::I64(-v)),
                Value::F64(v) => Ok(Value::F64(-v)),
                Value::Null => Ok(Value::Null),
                value => Err(Error::type_conversion(value, "number")),
            },
            Expr::IsNull(e) => Ok(Value::Bool(e.expr.eval_const()?.is_null() != e.negate)),
            Expr::Call(e) => {
                let Some(eval) = &e.eval else {
                    return Err(Error::unsupported_expression(format!(
                        "`{}` cannot be evaluated locally",
                        e.name
                    )));
                };
                let args = e
                    .args
                    .iter()
                    .map(Expr::eval_const)
                    .collect::<Result<Vec<_>>>()?;
                eval(&args)
            }
            _ => Err(Error::unsupported_expression(
                "expression depends on the database and cannot be evaluated as a constant",
            )),
        }
    }
}

fn eval_bool(expr: &Expr) -> Result<bool> {
    let value = expr.eval_const()?;
    value
        .as_bool()
        .ok_or_else(|| Error::type_conversion(value, "bool"))
}

fn eval_binary_op(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    use BinaryOp::*;

    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    if op == Concat {
        return match (lhs, rhs) {
            (Value::String(mut a), Value::String(b)) => {
                a.push_str(&b);
                Ok(Value::String(a))
            }
            (lhs, _) => Err(Error::type_conversion(lhs, "String")),
        };
    }

    if op.is_comparison() {
        let ordering = match (&lhs, &rhs) {
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => match (lhs.as_f64(), rhs.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        };
        let Some(ordering) = ordering else {
            return Err(Error::type_conversion(lhs, rhs.variant_name()));
        };
        return Ok(Value::Bool(match op {
            Eq => ordering.is_eq(),
            Ne => ordering.is_ne(),
            Gt => ordering.is_gt(),
            Ge => ordering.is_ge(),
            Lt => ordering.is_lt(),
            _ => ordering.is_le(),
        }));
    }

    match (lhs, rhs) {
        (Value::I32(a), Value::I32(b)) => int_op(op, a as i64, b as i64).map(|v| {
            i32::try_from(v)
                .map(Value::I32)
                .unwrap_or(Value::I64(v))
        }),
        (Value::I64(a), Value::I64(b)) => int_op(op, a, b).map(Value::I64),
        (Value::I32(a), Value::I64(b)) => int_op(op, a as i64, b).map(Value::I64),
        (Value::I64(a), Value::I32(b)) => int_op(op, a, b as i64).map(Value::I64),
        (lhs, rhs) => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::F64(match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                Div => a / b,
                _ => a % b,
            })),
            _ => Err(Error::type_conversion(lhs, "number")),
        },
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<i64> {
    use BinaryOp::*;

    let value = match op {
        Add => a.checked_add(b),
        Sub => a.checked_sub(b),
        Mul => a.checked_mul(b),
        Div => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    value.ok_or_else(|| Error::unsupported_expression(format!("integer overflow in `{a} {op} {b}`")))
}
