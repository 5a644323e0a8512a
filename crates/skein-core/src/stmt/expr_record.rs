use super::Expr;

/// Member-labelled expressions: a projection, or the assignments of a `SET`.
#[derive(Debug, Clone, Default)]
pub struct ExprRecord {
    pub fields: Vec<(String, Expr)>,
}

impl ExprRecord {
    pub fn new() -> ExprRecord {
        ExprRecord::default()
    }

    pub fn push(&mut self, member: impl Into<String>, expr: impl Into<Expr>) {
        self.fields.push((member.into(), expr.into()));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.fields.iter().map(|(member, expr)| (member.as_str(), expr))
    }
}

impl From<ExprRecord> for Expr {
    fn from(value: ExprRecord) -> Self {
        Self::Record(value)
    }
}
