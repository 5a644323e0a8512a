use skein_core::{schema::TypeHandler, stmt::Value};
use std::sync::Arc;

/// What an expression reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Folded at compile time. Bound as a parameter when emitted, unless it
    /// is inlined as a literal.
    Constant,

    /// Runtime value bound under its own name
    Variable,

    /// A column reference
    Field,

    /// An already bound placeholder
    Parameter,

    /// Operators over other segments
    Expression,

    /// A mapped function call
    MethodCall,

    /// An embedded `SELECT`
    SubQuery,
}

/// Top-level boolean operator of a rendered predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// The entity member a segment reads, kept so constants compared against it
/// go through the member's type handler.
#[derive(Debug, Clone)]
pub struct FieldRef {
    pub member: String,

    /// Rendered, qualified column
    pub column: String,

    pub type_handler: Option<Arc<dyn TypeHandler>>,
}

/// The classified result of reducing one expression node.
#[derive(Debug, Clone)]
pub struct SqlSegment {
    pub kind: SegmentKind,

    /// Rendered SQL. Empty for constants and variables until they are
    /// emitted.
    pub sql: String,

    pub value: Option<Value>,

    /// Variable name
    pub name: Option<String>,

    pub field: Option<FieldRef>,

    /// Some column is referenced below this node
    pub has_field: bool,

    /// Some parameter is bound below this node
    pub has_parameter: bool,

    pub connective: Option<Connective>,

    /// Binding strength of the top-level operator. `None` when the segment
    /// is atomic and never needs parentheses.
    pub precedence: Option<u8>,
}

impl SqlSegment {
    fn new(kind: SegmentKind, sql: String) -> SqlSegment {
        SqlSegment {
            kind,
            sql,
            value: None,
            name: None,
            field: None,
            has_field: false,
            has_parameter: false,
            connective: None,
            precedence: None,
        }
    }

    pub fn constant(value: Value) -> SqlSegment {
        SqlSegment {
            value: Some(value),
            ..SqlSegment::new(SegmentKind::Constant, String::new())
        }
    }

    pub fn variable(name: impl Into<String>, value: Value) -> SqlSegment {
        SqlSegment {
            value: Some(value),
            name: Some(name.into()),
            has_parameter: true,
            ..SqlSegment::new(SegmentKind::Variable, String::new())
        }
    }

    pub fn field(field: FieldRef) -> SqlSegment {
        SqlSegment {
            has_field: true,
            ..SqlSegment::new(SegmentKind::Field, field.column.clone())
        }
        .with_field(field)
    }

    pub fn parameter(placeholder: String) -> SqlSegment {
        SqlSegment {
            has_parameter: true,
            ..SqlSegment::new(SegmentKind::Parameter, placeholder)
        }
    }

    pub fn expression(sql: String, precedence: u8) -> SqlSegment {
        SqlSegment {
            precedence: Some(precedence),
            ..SqlSegment::new(SegmentKind::Expression, sql)
        }
    }

    pub fn method_call(sql: String) -> SqlSegment {
        SqlSegment::new(SegmentKind::MethodCall, sql)
    }

    pub fn sub_query(sql: String) -> SqlSegment {
        SqlSegment::new(SegmentKind::SubQuery, sql)
    }

    fn with_field(mut self, field: FieldRef) -> SqlSegment {
        self.field = Some(field);
        self
    }

    pub(crate) fn with_connective(mut self, connective: Connective) -> SqlSegment {
        self.connective = Some(connective);
        self
    }

    /// Carries the field/parameter flags of the operands up to this node.
    pub(crate) fn absorb(mut self, operand: &SqlSegment) -> SqlSegment {
        self.has_field |= operand.has_field;
        self.has_parameter |= operand.has_parameter || operand.kind == SegmentKind::Constant;
        self
    }

    pub fn is_constant(&self) -> bool {
        self.kind == SegmentKind::Constant
    }

    pub fn is_variable(&self) -> bool {
        self.kind == SegmentKind::Variable
    }

    /// The constant is `NULL`.
    pub fn is_null(&self) -> bool {
        self.is_constant() && self.value.as_ref().is_some_and(Value::is_null)
    }

    pub fn is_sub_query(&self) -> bool {
        self.kind == SegmentKind::SubQuery
    }
}
