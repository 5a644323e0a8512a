mod create;
pub use create::compile_insert;

mod delete;
pub use delete::compile_delete;

mod include;
pub use include::build_includes;

mod query;
pub use query::{compile_count, compile_query};

mod shard;

mod update;
pub use update::compile_update;

use crate::{Command, Connective, Context, Dialect, FieldRef, Params, SegmentKind, SqlSegment};
use skein_core::{
    schema::{EntityMap, TypeHandler},
    stmt::{
        BinaryOp, Expr, ExprBinaryOp, ExprColumn, ExprInList, ExprPattern, Keys, MemberValues,
        PatternKind, Query, ScopeId, Value,
    },
    Error, Result,
};
use std::sync::Arc;

const PREC_OR: u8 = 0;
const PREC_AND: u8 = 1;
const PREC_CMP: u8 = 2;
const PREC_NEG: u8 = 5;

/// Reduces expressions to SQL for one command.
///
/// A visitor owns the parameters of the command it renders, so placeholders
/// and parameters are produced in the same left-to-right order. Statements
/// nest through scopes: each `SELECT` (including sub-queries) pushes the
/// tables it reads, and a column resolves against the scope it was built
/// for.
#[derive(Debug)]
pub struct SqlVisitor<'a> {
    cx: &'a Context,
    params: Params,
    scopes: Vec<Scope>,
}

#[derive(Debug)]
struct Scope {
    id: ScopeId,
    tables: Vec<TableRef>,

    /// Columns are qualified with table aliases
    aliased: bool,
}

/// One table visible to the statement being compiled.
#[derive(Debug, Clone)]
pub(crate) struct TableRef {
    pub(crate) entity: Arc<EntityMap>,
    pub(crate) alias: String,

    /// Rendered table name. Empty when the table reads a sub-query.
    pub(crate) name: String,

    /// The source projects member names instead of mapped columns
    pub(crate) reads_members: bool,
}

/// A WHERE clause before it is rendered.
#[derive(Debug)]
pub(crate) enum Clause<'a> {
    Expr(&'a Expr),

    /// Key values matched against the key members of the scope's first
    /// table. Rows of `Keys::Objects` are suffixed starting at `row_offset`.
    Keys {
        scope: ScopeId,
        keys: &'a Keys,
        row_offset: usize,
    },
}

impl<'a> SqlVisitor<'a> {
    pub fn new(cx: &'a Context) -> SqlVisitor<'a> {
        SqlVisitor::with_params(cx, Params::new(cx.command_suffix()))
    }

    pub(crate) fn with_params(cx: &'a Context, params: Params) -> SqlVisitor<'a> {
        SqlVisitor {
            cx,
            params,
            scopes: vec![],
        }
    }

    pub fn context(&self) -> &'a Context {
        self.cx
    }

    pub(crate) fn dialect(&self) -> &'a dyn Dialect {
        &*self.cx.dialect
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Wraps up the rendered SQL with the bound parameters.
    pub(crate) fn finish(self, sql: String, statements: usize, table: &str) -> Command {
        let params = self.params.into_vec();

        tracing::debug!(
            table = table,
            sql = %sql,
            param_count = params.len(),
            statements,
            "SqlVisitor generated SQL"
        );

        Command {
            sql,
            params,
            statements,
        }
    }

    pub(crate) fn push_scope(&mut self, id: ScopeId, aliased: bool) {
        self.scopes.push(Scope {
            id,
            tables: vec![],
            aliased,
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Registers a table in the innermost scope and returns its alias.
    ///
    /// Aliases count up from `table_as_start` across every scope, so a
    /// sub-query never reuses an alias of the statement enclosing it.
    pub(crate) fn add_table(
        &mut self,
        entity: Arc<EntityMap>,
        name: String,
        reads_members: bool,
    ) -> String {
        let position = self.scopes.iter().map(|scope| scope.tables.len()).sum();
        let alias = self.cx.table_alias(position);

        if let Some(scope) = self.scopes.last_mut() {
            scope.tables.push(TableRef {
                entity,
                alias: alias.clone(),
                name,
                reads_members,
            });
        }
        alias
    }

    pub(crate) fn tables(&self) -> &[TableRef] {
        self.scopes
            .last()
            .map(|scope| &scope.tables[..])
            .unwrap_or_default()
    }

    pub(crate) fn placeholder(&self, name: &str) -> String {
        format!("{}{name}", self.dialect().parameter_prefix())
    }

    /// Every mapped member of `entity` read through `alias`, labelled with
    /// the member name where the column name differs.
    pub(crate) fn entity_columns(
        &self,
        entity: &EntityMap,
        alias: &str,
        reads_members: bool,
    ) -> Vec<String> {
        let dialect = self.dialect();

        entity
            .mapped_members()
            .map(|member| {
                if reads_members || member.field_name == member.member_name {
                    let field = if reads_members {
                        &member.member_name
                    } else {
                        &member.field_name
                    };
                    format!("{alias}.{}", dialect.field_name(field))
                } else {
                    format!(
                        "{alias}.{} AS {}",
                        dialect.field_name(&member.field_name),
                        dialect.quote(&member.member_name)
                    )
                }
            })
            .collect()
    }

    /// Resolves a column against the scopes being compiled.
    pub fn column(&self, column: &ExprColumn) -> Result<FieldRef> {
        let Some(index) = self.scopes.iter().rposition(|scope| scope.id == column.scope) else {
            return Err(Error::invalid_argument(format!(
                "member `{}` belongs to a statement that is not being compiled",
                column.member
            )));
        };

        let scope = &self.scopes[index];
        let Some(table) = scope.tables.get(column.table) else {
            return Err(Error::invalid_argument(format!(
                "member `{}` refers to table #{} which the statement does not read",
                column.member, column.table
            )));
        };

        let member = table.entity.member_or_err(&column.member)?;
        let field = self.dialect().field_name(if table.reads_members {
            &member.member_name
        } else {
            &member.field_name
        });

        let column = if scope.aliased {
            format!("{}.{field}", table.alias)
        } else if index + 1 == self.scopes.len() {
            field
        } else {
            format!("{}.{field}", table.name)
        };

        Ok(FieldRef {
            member: member.member_name.clone(),
            column,
            type_handler: member.type_handler.clone(),
        })
    }

    fn hint(&self, expr: &Expr) -> Option<FieldRef> {
        expr.as_column().and_then(|column| self.column(column).ok())
    }

    /// Visits and emits an expression.
    pub fn render(&mut self, expr: &Expr) -> Result<String> {
        let segment = self.visit(expr)?;
        self.emit(&segment, None)
    }

    /// Reduces an expression to a segment.
    ///
    /// Constants and variables come back unbound: the caller emits them once
    /// it knows the member they are compared against. Everything else is
    /// fully rendered, its parameters already bound.
    pub fn visit(&mut self, expr: &Expr) -> Result<SqlSegment> {
        // Fold anything that does not touch a column, variable or sub-query.
        if !expr.is_value() && expr.is_const() {
            return Ok(SqlSegment::constant(expr.eval_const()?));
        }

        match expr {
            Expr::Value(value) => Ok(SqlSegment::constant(value.clone())),
            Expr::Variable(var) => Ok(SqlSegment::variable(&var.name, var.value.clone())),
            Expr::Column(column) => Ok(SqlSegment::field(self.column(column)?)),
            Expr::And(operands) => self.visit_connective(operands, Connective::And),
            Expr::Or(operands) => self.visit_connective(operands, Connective::Or),
            Expr::BinaryOp(e) => self.visit_binary_op(e),
            Expr::Not(e) => {
                let operand = self.predicate(e)?;
                Ok(SqlSegment::expression(format!("NOT ({})", operand.sql), PREC_CMP)
                    .absorb(&operand))
            }
            Expr::Neg(e) => {
                let operand = self.visit(e)?;
                let sql = self.emit_operand(&operand, None, PREC_NEG)?;
                Ok(SqlSegment::expression(format!("-{sql}"), PREC_NEG).absorb(&operand))
            }
            Expr::IsNull(e) => {
                let operand = self.visit(&e.expr)?;
                let sql = self.emit_operand(&operand, None, PREC_CMP)?;
                let op = if e.negate { "IS NOT NULL" } else { "IS NULL" };
                Ok(SqlSegment::expression(format!("{sql} {op}"), PREC_CMP).absorb(&operand))
            }
            Expr::InList(e) => self.visit_in_list(e),
            Expr::InSubquery(e) => {
                let hint = self.hint(&e.expr);
                let operand = self.visit(&e.expr)?;
                let lhs = self.emit_operand(&operand, hint.as_ref(), PREC_CMP)?;
                let query = self.render_select(&e.query)?;
                let op = if e.negate { "NOT IN" } else { "IN" };
                Ok(
                    SqlSegment::expression(format!("{lhs} {op} ({query})"), PREC_CMP)
                        .absorb(&operand),
                )
            }
            Expr::Exists(query) => {
                let query = self.render_select(query)?;
                Ok(SqlSegment::expression(format!("EXISTS ({query})"), PREC_CMP))
            }
            Expr::Stmt(query) => {
                let query = self.render_select(query)?;
                Ok(SqlSegment::sub_query(format!("({query})")))
            }
            Expr::Func(e) => {
                let args = self.render_args(&e.args)?;
                let sql = self.dialect().function(e.func.name(), &args).ok_or_else(|| {
                    Error::unsupported_feature(format!(
                        "{} has no mapping for `{}`",
                        self.dialect().name(),
                        e.func.name()
                    ))
                })?;
                Ok(SqlSegment::method_call(sql))
            }
            Expr::Call(e) => {
                let args = self.render_args(&e.args)?;
                let sql = self.dialect().function(&e.name, &args).ok_or_else(|| {
                    Error::unsupported_expression(format!(
                        "method `{}` has no SQL mapping and depends on the row",
                        e.name
                    ))
                })?;
                Ok(SqlSegment::method_call(sql))
            }
            Expr::Pattern(e) => self.visit_pattern(e),
            Expr::Record(_) => Err(Error::unsupported_expression(
                "a record can only be used as a projection or a set of assignments",
            )),
        }
    }

    /// Turns a segment into SQL text, binding constants and variables.
    ///
    /// `hint` is the member the value is compared against; its type handler
    /// converts the value before binding.
    pub fn emit(&mut self, segment: &SqlSegment, hint: Option<&FieldRef>) -> Result<String> {
        let handler = hint.and_then(|field| field.type_handler.as_ref());

        match segment.kind {
            SegmentKind::Constant => {
                let value = segment.value.clone().unwrap_or_default();
                self.bind(value, handler)
            }
            SegmentKind::Variable => {
                let value = segment.value.clone().unwrap_or_default();
                let name = segment.name.as_deref().unwrap_or("v");
                self.bind_named(name, value, handler)
            }
            _ => Ok(segment.sql.clone()),
        }
    }

    /// Binds a value under the next anonymous name. `NULL` is rendered
    /// inline.
    pub(crate) fn bind(
        &mut self,
        value: Value,
        handler: Option<&Arc<dyn TypeHandler>>,
    ) -> Result<String> {
        let Some(value) = self.prepare(value, handler)? else {
            return Ok("NULL".to_string());
        };
        let name = self.params.push_anonymous(value);
        Ok(self.placeholder(&name))
    }

    /// Binds a value under a member or variable name. `NULL` is rendered
    /// inline.
    pub(crate) fn bind_named(
        &mut self,
        name: &str,
        value: Value,
        handler: Option<&Arc<dyn TypeHandler>>,
    ) -> Result<String> {
        let Some(value) = self.prepare(value, handler)? else {
            return Ok("NULL".to_string());
        };
        let name = self.params.push_named(name, value);
        Ok(self.placeholder(&name))
    }

    fn prepare(
        &self,
        value: Value,
        handler: Option<&Arc<dyn TypeHandler>>,
    ) -> Result<Option<Value>> {
        if value.is_null() {
            return Ok(None);
        }

        let value = match handler {
            Some(handler) => handler.to_db(value)?,
            None => value,
        };

        match value {
            Value::Null => Ok(None),
            Value::List(_) => Err(Error::invalid_argument(
                "a list value can only be matched with IN",
            )),
            value => Ok(Some(self.dialect().parameter_value(value))),
        }
    }

    /// Emits an operand, parenthesized when it binds looser than `precedence`.
    fn emit_operand(
        &mut self,
        segment: &SqlSegment,
        hint: Option<&FieldRef>,
        precedence: u8,
    ) -> Result<String> {
        let sql = self.emit(segment, hint)?;
        Ok(match segment.precedence {
            Some(child) if child < precedence => format!("({sql})"),
            _ => sql,
        })
    }

    fn render_args(&mut self, args: &[Expr]) -> Result<Vec<String>> {
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            rendered.push(self.render(arg)?);
        }
        Ok(rendered)
    }

    /// Renders an expression used as a condition.
    ///
    /// Constant conditions become `1=1` or `1=0`.
    pub fn predicate(&mut self, expr: &Expr) -> Result<SqlSegment> {
        let mut segment = self.visit(expr)?;

        match segment.kind {
            SegmentKind::Constant => match segment.value.take().unwrap_or_default() {
                Value::Bool(true) => Ok(SqlSegment::expression("1=1".into(), PREC_CMP)),
                Value::Bool(false) | Value::Null => {
                    Ok(SqlSegment::expression("1=0".into(), PREC_CMP))
                }
                value => Err(Error::type_conversion(value, "bool")),
            },
            SegmentKind::Variable => {
                let placeholder = self.emit(&segment, None)?;
                Ok(SqlSegment::expression(format!("{placeholder}=1"), PREC_CMP).absorb(&segment))
            }
            _ => Ok(segment),
        }
    }

    fn visit_connective(
        &mut self,
        operands: &[Expr],
        connective: Connective,
    ) -> Result<SqlSegment> {
        let (separator, precedence, empty) = match connective {
            Connective::And => (" AND ", PREC_AND, "1=1"),
            Connective::Or => (" OR ", PREC_OR, "1=0"),
        };

        if operands.is_empty() {
            return Ok(SqlSegment::expression(empty.into(), PREC_CMP));
        }

        let mut parts = Vec::with_capacity(operands.len());
        let mut flags = SqlSegment::expression(String::new(), precedence);
        for operand in operands {
            let segment = self.predicate(operand)?;
            if operands.len() == 1 {
                return Ok(segment);
            }
            parts.push(match segment.precedence {
                Some(child) if child < precedence => format!("({})", segment.sql),
                _ => segment.sql.clone(),
            });
            flags = flags.absorb(&segment);
        }

        Ok(SqlSegment {
            sql: parts.join(separator),
            ..flags
        }
        .with_connective(connective))
    }

    fn visit_binary_op(&mut self, e: &ExprBinaryOp) -> Result<SqlSegment> {
        let op = e.op;

        // `x = NULL` never matches, so equality with null becomes IS NULL.
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let operand = match (is_null(&e.lhs), is_null(&e.rhs)) {
                (_, true) => Some(&e.lhs),
                (true, false) => Some(&e.rhs),
                _ => None,
            };
            if let Some(operand) = operand {
                let segment = self.visit(operand)?;
                let sql = self.emit_operand(&segment, None, PREC_CMP)?;
                let test = if op == BinaryOp::Eq { "IS NULL" } else { "IS NOT NULL" };
                return Ok(
                    SqlSegment::expression(format!("{sql} {test}"), PREC_CMP).absorb(&segment)
                );
            }
        }

        let hint = if op.is_comparison() {
            self.hint(&e.lhs).or_else(|| self.hint(&e.rhs))
        } else {
            None
        };

        let (lhs, lhs_sql) = self.binary_operand(&e.lhs, hint.as_ref(), op, false)?;
        let (rhs, rhs_sql) = self.binary_operand(&e.rhs, hint.as_ref(), op, true)?;

        let segment = if op == BinaryOp::Concat {
            let wrap = |segment: &SqlSegment, sql: String| match segment.precedence {
                Some(_) => format!("({sql})"),
                None => sql,
            };
            let parts = [wrap(&lhs, lhs_sql), wrap(&rhs, rhs_sql)];
            SqlSegment::method_call(self.dialect().concat(&parts))
        } else {
            SqlSegment::expression(format!("{lhs_sql}{op}{rhs_sql}"), op.precedence())
        };

        Ok(segment.absorb(&lhs).absorb(&rhs))
    }

    fn binary_operand(
        &mut self,
        expr: &Expr,
        hint: Option<&FieldRef>,
        op: BinaryOp,
        right: bool,
    ) -> Result<(SqlSegment, String)> {
        let segment = self.visit(expr)?;

        // Numbers in arithmetic are written inline: `"age"+1`.
        let literal = match (&segment.value, segment.kind) {
            (Some(value), SegmentKind::Constant) if op.is_arithmetic() => {
                self.dialect().literal(value)
            }
            _ => None,
        };

        let sql = match literal {
            Some(literal) => literal,
            None => self.emit(&segment, hint)?,
        };

        let precedence = op.precedence();
        let associative = matches!(op, BinaryOp::Add | BinaryOp::Mul);
        let sql = match segment.precedence {
            Some(child) if child < precedence => format!("({sql})"),
            Some(child) if right && child == precedence && !associative => format!("({sql})"),
            _ => sql,
        };

        Ok((segment, sql))
    }

    fn visit_in_list(&mut self, e: &ExprInList) -> Result<SqlSegment> {
        if let Expr::Stmt(query) = &*e.list {
            let in_subquery = Expr::InSubquery(skein_core::stmt::ExprInSubquery {
                expr: e.expr.clone(),
                query: query.clone(),
                negate: e.negate,
            });
            return self.visit(&in_subquery);
        }

        let hint = self.hint(&e.expr);
        let handler = hint.as_ref().and_then(|field| field.type_handler.clone());
        let operand = self.visit(&e.expr)?;
        let lhs = self.emit_operand(&operand, hint.as_ref(), PREC_CMP)?;

        let mut items = vec![];
        match &*e.list {
            Expr::Variable(var) => match &var.value {
                Value::List(values) => {
                    for value in values {
                        items.push(self.bind_named(&var.name, value.clone(), handler.as_ref())?);
                    }
                }
                value => items.push(self.bind_named(&var.name, value.clone(), handler.as_ref())?),
            },
            list if list.is_const() => match list.eval_const()? {
                Value::List(values) => {
                    for value in values {
                        items.push(self.bind(value, handler.as_ref())?);
                    }
                }
                Value::Null => {}
                value => items.push(self.bind(value, handler.as_ref())?),
            },
            list => items.push(self.render(list)?),
        }

        if items.is_empty() {
            let sql = if e.negate { "1=1" } else { "1=0" };
            return Ok(SqlSegment::expression(sql.into(), PREC_CMP));
        }

        let op = if e.negate { "NOT IN" } else { "IN" };
        Ok(
            SqlSegment::expression(format!("{lhs} {op} ({})", items.join(",")), PREC_CMP)
                .absorb(&operand),
        )
    }

    fn visit_pattern(&mut self, e: &ExprPattern) -> Result<SqlSegment> {
        let operand = self.visit(&e.expr)?;
        let lhs = self.emit_operand(&operand, None, PREC_CMP)?;

        let pattern = match &*e.pattern {
            Expr::Variable(var) => {
                let value = pattern_value(e.kind, var.value.clone())?;
                self.bind_named(&var.name, value, None)?
            }
            pattern if pattern.is_const() => {
                let value = pattern_value(e.kind, pattern.eval_const()?)?;
                self.bind(value, None)?
            }
            pattern => {
                let inner = self.render(pattern)?;
                let dialect = self.dialect();
                let wildcard = "'%'".to_string();
                match e.kind {
                    PatternKind::Contains => dialect.concat(&[wildcard.clone(), inner, wildcard]),
                    PatternKind::StartsWith => dialect.concat(&[inner, wildcard]),
                    PatternKind::EndsWith => dialect.concat(&[wildcard, inner]),
                    PatternKind::Like => inner,
                }
            }
        };

        Ok(SqlSegment::expression(format!("{lhs} LIKE {pattern}"), PREC_CMP).absorb(&operand))
    }

    /// Renders WHERE clauses, AND-joined in order.
    ///
    /// A clause whose top-level connective is OR is parenthesized as soon
    /// as it is joined with another clause, so `a OR b` followed by `c`
    /// renders as `(a OR b) AND c`.
    pub(crate) fn render_clauses(&mut self, clauses: &[Clause<'_>]) -> Result<Option<String>> {
        let mut rendered = Vec::with_capacity(clauses.len());
        for clause in clauses {
            rendered.push(match clause {
                Clause::Expr(expr) => self.predicate(expr)?,
                Clause::Keys {
                    scope,
                    keys,
                    row_offset,
                } => self.render_keys(*scope, keys, *row_offset)?,
            });
        }

        Ok(match rendered.len() {
            0 => None,
            1 => rendered.pop().map(|segment| segment.sql),
            _ => Some(
                rendered
                    .iter()
                    .map(|segment| match segment.connective {
                        Some(Connective::Or) => format!("({})", segment.sql),
                        _ => segment.sql.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        })
    }

    pub fn render_conditions(&mut self, conditions: &[Expr]) -> Result<Option<String>> {
        let clauses = conditions.iter().map(Clause::Expr).collect::<Vec<_>>();
        self.render_clauses(&clauses)
    }

    /// Matches key values against the key members of the first table of
    /// `scope`, without going through expression reduction.
    fn render_keys(&mut self, scope: ScopeId, keys: &Keys, row_offset: usize) -> Result<SqlSegment> {
        let entity = match self.scopes.iter().rev().find(|s| s.id == scope) {
            Some(scope) if !scope.tables.is_empty() => scope.tables[0].entity.clone(),
            _ => {
                return Err(Error::invalid_argument(
                    "key values refer to a statement that is not being compiled",
                ))
            }
        };
        let field = |visitor: &Self, member: &str| {
            visitor.column(&ExprColumn {
                scope,
                table: 0,
                member: member.to_string(),
            })
        };

        if keys.is_empty() {
            return Err(Error::invalid_argument("at least one key is required"));
        }

        match keys {
            Keys::One(value) => {
                let key = field(self, &entity.single_key()?.member_name)?;
                reject_null_key(&entity, value)?;
                let value = self.bind(value.clone(), key.type_handler.as_ref())?;
                Ok(SqlSegment::expression(format!("{}={value}", key.column), PREC_CMP))
            }
            Keys::List(values) => {
                let key = field(self, &entity.single_key()?.member_name)?;
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    reject_null_key(&entity, value)?;
                    items.push(self.bind(value.clone(), key.type_handler.as_ref())?);
                }
                Ok(SqlSegment::expression(
                    format!("{} IN ({})", key.column, items.join(",")),
                    PREC_CMP,
                ))
            }
            Keys::Object(object) => self.render_key_object(&entity, scope, object),
            Keys::Objects(objects) => {
                let key_count = entity.key_members().count();
                let mut parts = Vec::with_capacity(objects.len());

                for (index, object) in objects.iter().enumerate() {
                    self.params.set_row(Some(row_offset + index));
                    let part = self.render_key_object(&entity, scope, object);
                    self.params.set_row(None);
                    parts.push(part?);
                }

                // A single key collapses to an IN list.
                if key_count == 1 {
                    let key = field(self, &entity.single_key()?.member_name)?;
                    let prefix = format!("{}=", key.column);
                    let items = parts
                        .iter()
                        .map(|part| part.sql.trim_start_matches(&prefix).to_string())
                        .collect::<Vec<_>>();
                    return Ok(SqlSegment::expression(
                        format!("{} IN ({})", key.column, items.join(",")),
                        PREC_CMP,
                    ));
                }

                let sql = parts
                    .iter()
                    .map(|part| format!("({})", part.sql))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                Ok(SqlSegment::expression(sql, PREC_OR).with_connective(Connective::Or))
            }
        }
    }

    fn render_key_object(
        &mut self,
        entity: &EntityMap,
        scope: ScopeId,
        object: &MemberValues,
    ) -> Result<SqlSegment> {
        let mut parts = vec![];

        for key in entity.key_members() {
            let Some(value) = object.get(&key.member_name) else {
                return Err(Error::invalid_argument(format!(
                    "key object for `{}` is missing member `{}`",
                    entity.name, key.member_name
                )));
            };
            reject_null_key(entity, value)?;
            let column = self.column(&ExprColumn {
                scope,
                table: 0,
                member: key.member_name.clone(),
            })?;
            let value = self.bind_named(&key.member_name, value.clone(), key.type_handler.as_ref())?;
            parts.push(format!("{}={value}", column.column));
        }

        if parts.is_empty() {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` has no key member",
                entity.name
            )));
        }

        Ok(match parts.len() {
            1 => SqlSegment::expression(parts.remove(0), PREC_CMP),
            _ => SqlSegment::expression(parts.join(" AND "), PREC_AND)
                .with_connective(Connective::And),
        })
    }

    /// Renders a nested `SELECT`, continuing this visitor's parameters.
    pub fn render_subquery(&mut self, query: &Query) -> Result<String> {
        self.render_select(query)
    }
}

fn is_null(expr: &Expr) -> bool {
    match expr {
        Expr::Variable(var) => var.value.is_null(),
        expr => expr.is_const() && matches!(expr.eval_const(), Ok(Value::Null)),
    }
}

fn pattern_value(kind: PatternKind, value: Value) -> Result<Value> {
    match value {
        Value::String(pattern) => Ok(Value::String(kind.apply(&pattern))),
        value => Err(Error::type_conversion(value, "String")),
    }
}

/// `key = NULL` matches no row, so a null key is a caller error.
fn reject_null_key(entity: &EntityMap, value: &Value) -> Result<()> {
    if value.is_null() {
        return Err(Error::invalid_argument(format!(
            "key of `{}` cannot be null",
            entity.name
        )));
    }
    Ok(())
}
