use super::{Expr, InsertSource, MemberValues, Query, Value};

/// A deferred insert, update or delete operation.
///
/// Builders append segments in call order; compiling replays them in that
/// order exactly once.
#[derive(Debug, Clone)]
pub enum CommandSegment {
    /// Insert the members of an object
    WithBy(InsertSource),

    /// Insert a single member
    WithByField { member: String, value: Expr },

    /// Insert many rows
    WithBulk(Vec<MemberValues>),

    /// Assign a record of member expressions
    Set(Expr),

    /// Assign a single member
    SetField { member: String, value: Expr },

    /// Assign a record whose values read from other tables
    SetFrom(Expr),

    /// Assign a single member from a scalar sub-query
    SetFromField { member: String, query: Query },

    /// Assign the non-key members of an object, matching its key members
    SetWith(MemberValues),

    /// Update many rows, one statement per row
    SetBulk(Vec<MemberValues>),

    /// First predicate
    Where(Expr),

    /// Additional predicate, AND-joined
    And(Expr),

    /// Match rows by key value(s) or by the members of an object
    WhereWith(Keys),
}

/// Key-based row selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Keys {
    /// A single key value for a single-member key
    One(Value),

    /// Member equality for every entry
    Object(MemberValues),

    /// Several key values for a single-member key
    List(Vec<Value>),

    /// Several objects, each matched on its members
    Objects(Vec<MemberValues>),
}

impl CommandSegment {
    pub fn name(&self) -> &'static str {
        match self {
            CommandSegment::WithBy(_) => "WithBy",
            CommandSegment::WithByField { .. } => "WithByField",
            CommandSegment::WithBulk(_) => "WithBulk",
            CommandSegment::Set(_) => "Set",
            CommandSegment::SetField { .. } => "SetField",
            CommandSegment::SetFrom(_) => "SetFrom",
            CommandSegment::SetFromField { .. } => "SetFromField",
            CommandSegment::SetWith(_) => "SetWith",
            CommandSegment::SetBulk(_) => "SetBulk",
            CommandSegment::Where(_) => "Where",
            CommandSegment::And(_) => "And",
            CommandSegment::WhereWith(_) => "WhereWith",
        }
    }
}

impl Keys {
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Keys {
        Keys::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Keys::One(_) => false,
            Keys::Object(object) => object.is_empty(),
            Keys::List(list) => list.is_empty(),
            Keys::Objects(objects) => objects.is_empty(),
        }
    }
}

impl<T: Into<Value>> From<T> for Keys {
    fn from(value: T) -> Self {
        match value.into() {
            Value::List(items) => Keys::List(items),
            value => Keys::One(value),
        }
    }
}

impl From<MemberValues> for Keys {
    fn from(value: MemberValues) -> Self {
        Keys::Object(value)
    }
}

impl From<Vec<MemberValues>> for Keys {
    fn from(value: Vec<MemberValues>) -> Self {
        Keys::Objects(value)
    }
}
