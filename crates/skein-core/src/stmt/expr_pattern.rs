use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `%pattern%`
    Contains,

    /// `pattern%`
    StartsWith,

    /// `%pattern`
    EndsWith,

    /// The pattern is used as written
    Like,
}

/// String match rendered as `LIKE`.
#[derive(Debug, Clone)]
pub struct ExprPattern {
    pub expr: Box<Expr>,
    pub pattern: Box<Expr>,
    pub kind: PatternKind,
}

impl PatternKind {
    /// Wraps a literal pattern with the wildcards this kind implies.
    pub fn apply(self, pattern: &str) -> String {
        match self {
            PatternKind::Contains => format!("%{pattern}%"),
            PatternKind::StartsWith => format!("{pattern}%"),
            PatternKind::EndsWith => format!("%{pattern}"),
            PatternKind::Like => pattern.to_string(),
        }
    }
}

impl From<ExprPattern> for Expr {
    fn from(value: ExprPattern) -> Self {
        Self::Pattern(value)
    }
}
