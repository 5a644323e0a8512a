use super::{BinaryOp, Expr};

/// `lhs op rhs`. Rendering adds parentheses only where the operand
/// precedence requires them.
#[derive(Debug, Clone)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

macro_rules! binary_constructors {
    ( $( $name:ident => $op:ident ),* $(,)? ) => {
        impl Expr {
            $(
                pub fn $name(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
                    Self::binary_op(lhs, BinaryOp::$op, rhs)
                }
            )*
        }
    };
}

binary_constructors! {
    eq => Eq,
    ne => Ne,
    gt => Gt,
    ge => Ge,
    lt => Lt,
    le => Le,
    add => Add,
    sub => Sub,
    mul => Mul,
    div => Div,
    rem => Mod,
    concat => Concat,
}

impl Expr {
    pub fn binary_op(lhs: impl Into<Self>, op: BinaryOp, rhs: impl Into<Self>) -> Self {
        Self::BinaryOp(ExprBinaryOp::new(lhs.into(), op, rhs.into()))
    }
}

impl ExprBinaryOp {
    pub fn new(lhs: Expr, op: BinaryOp, rhs: Expr) -> ExprBinaryOp {
        ExprBinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// The same comparison with the operands swapped, e.g. `a < b` becomes
    /// `b > a`. `None` for operators that do not commute that way.
    pub fn flipped(&self) -> Option<ExprBinaryOp> {
        let op = match self.op {
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Add | BinaryOp::Mul => self.op,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Concat => return None,
        };
        Some(ExprBinaryOp {
            lhs: self.rhs.clone(),
            op,
            rhs: self.lhs.clone(),
        })
    }
}

impl From<ExprBinaryOp> for Expr {
    fn from(value: ExprBinaryOp) -> Self {
        Self::BinaryOp(value)
    }
}
