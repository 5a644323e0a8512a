use super::{shard, Clause, SqlVisitor};
use crate::{dialect::UpdateJoinStyle, Command, Context};
use indexmap::IndexMap;
use skein_core::{
    schema::{EntityMap, MemberMap},
    stmt::{BinaryOp, CommandSegment, Expr, JoinKind, Keys, MemberValues, Update, Value},
    Error, Result,
};

/// A value assigned by `SET`.
#[derive(Debug)]
enum Assignment {
    /// Bound under the member's name
    Value(Value),

    Expr(Expr),
}

/// The replayed intent of an update.
#[derive(Debug, Default)]
struct Plan<'a> {
    /// In first-assignment order; later assignments replace earlier ones
    sets: IndexMap<&'a str, (&'a MemberMap, Assignment)>,

    /// Conditions matched by key values
    keys: Vec<Keys>,

    /// Row version checks, `member = value`
    versions: Vec<Expr>,

    conditions: Vec<&'a Expr>,
}

/// Compiles an `UPDATE`.
///
/// A bulk update compiles to one `UPDATE` per row, all in the same command.
pub fn compile_update(cx: &Context, update: &Update) -> Result<Command> {
    match update
        .segments
        .iter()
        .position(|segment| matches!(segment, CommandSegment::SetBulk(_)))
    {
        Some(position) => compile_bulk(cx, update, position),
        None => compile_single(cx, update),
    }
}

fn compile_single(cx: &Context, update: &Update) -> Result<Command> {
    let entity = update.entity();
    let mut plan = Plan::default();
    for segment in &update.segments {
        plan.replay(update, segment)?;
    }

    if plan.sets.is_empty() {
        return Err(Error::invalid_argument(format!(
            "update of `{}` has no member to set",
            entity.name
        )));
    }
    if plan.keys.is_empty() && plan.conditions.is_empty() {
        return Err(Error::invalid_argument(format!(
            "update of `{}` has no WHERE clause",
            entity.name
        )));
    }

    let mut visitor = SqlVisitor::new(cx);
    let aliased = update.need_table_alias || update.tables.len() > 1;
    let style = visitor.dialect().update_join_style();

    let mut names = Vec::with_capacity(update.tables.len());
    for (index, table) in update.tables.iter().enumerate() {
        let fixed = plan.pinned(update, index);
        let name = shard::resolve(cx, &table.entity, table.table_name.as_deref(), &fixed)?;
        names.push(name);
    }

    visitor.push_scope(update.scope, aliased);
    for (table, name) in update.tables.iter().zip(&names) {
        let name = visitor.dialect().table_name(name);
        visitor.add_table(table.entity.clone(), name, false);
    }
    let tables = visitor.tables().to_vec();
    let Some(main) = tables.first() else {
        visitor.pop_scope();
        return Err(Error::invalid_argument("update reads no table"));
    };

    let result = (|| -> Result<String> {
        let mut sql = String::new();
        let mut join_conditions = vec![];

        match (style, aliased) {
            (_, false) => fmt!(&mut sql, "UPDATE " main.name.as_str()),
            (UpdateJoinStyle::Join, true) => {
                fmt!(&mut sql, "UPDATE " main.name.as_str() " " main.alias.as_str());
                for (table, source) in tables.iter().zip(&update.tables).skip(1) {
                    let Some(join) = &source.join else {
                        continue;
                    };
                    let kind = match join.kind {
                        JoinKind::Inner => " INNER JOIN ",
                        JoinKind::Left => " LEFT JOIN ",
                        JoinKind::Right => " RIGHT JOIN ",
                    };
                    let on = visitor.predicate(&join.on)?;
                    fmt!(&mut sql, kind table.name.as_str() " " table.alias.as_str() " ON " on.sql);
                }
            }
            (UpdateJoinStyle::From, true) => {
                fmt!(&mut sql, "UPDATE " main.name.as_str() " AS " main.alias.as_str());
                for source in update.tables.iter().skip(1) {
                    match &source.join {
                        Some(join) if join.kind != JoinKind::Inner => {
                            return Err(Error::unsupported_feature(format!(
                                "{} can only update through inner joins",
                                visitor.dialect().name()
                            )))
                        }
                        Some(join) => join_conditions.push(&join.on),
                        None => {}
                    }
                }
            }
        }

        // Join-style updates qualify the assigned columns.
        let qualify = aliased && style == UpdateJoinStyle::Join;
        let sets = render_sets(&mut visitor, &plan, qualify.then_some(main.alias.as_str()))?;
        fmt!(&mut sql, " SET " sets);

        if style == UpdateJoinStyle::From && tables.len() > 1 {
            let sources = tables[1..]
                .iter()
                .map(|table| format!("{} {}", table.name, table.alias))
                .collect::<Vec<_>>();
            fmt!(&mut sql, " FROM " sources.join(","));
        }

        let mut clauses = join_conditions
            .into_iter()
            .map(Clause::Expr)
            .collect::<Vec<_>>();
        clauses.extend(plan.clauses(update));
        if let Some(filter) = visitor.render_clauses(&clauses)? {
            fmt!(&mut sql, " WHERE " filter);
        }

        Ok(sql)
    })();

    visitor.pop_scope();
    let sql = result?;
    Ok(visitor.finish(sql, 1, &names[0]))
}

/// One `UPDATE` per row, keyed by the row's key members.
///
/// Unlike bulk inserts, rows are not chunked: every row is its own
/// statement in the same batch.
fn compile_bulk(cx: &Context, update: &Update, position: usize) -> Result<Command> {
    let entity = update.entity();

    if update.tables.len() > 1 {
        return Err(Error::unsupported_feature(
            "a bulk update cannot read joined tables",
        ));
    }

    let mut plan = Plan::default();
    let mut rows: Vec<&MemberValues> = vec![];
    for (index, segment) in update.segments.iter().enumerate() {
        match segment {
            CommandSegment::SetBulk(batch) => rows.extend(batch),
            CommandSegment::Set(_) | CommandSegment::SetField { .. } | CommandSegment::SetWith(_) => {
                plan.replay(update, segment)?
            }
            _ if index > position => {
                return Err(Error::invalid_argument(
                    "bulk update only supports Set/IgnoreFields/OnlyFields afterward",
                ))
            }
            segment => plan.replay(update, segment)?,
        }
    }

    let Some(first) = rows.first() else {
        return Err(Error::invalid_argument("bulk update needs at least one row"));
    };
    let template = BulkTemplate::derive(entity, update, first)?;

    // Each row routes to its own table on a sharded entity.
    let explicit = update.tables[0].table_name.as_deref();
    let pinned = plan.pinned(update, 0);
    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut fixed = pinned.clone();
        shard::pin_values(row, &mut fixed);
        tables.push(shard::resolve(cx, entity, explicit, &fixed)?);
    }

    let mut visitor = SqlVisitor::new(cx);
    visitor.push_scope(update.scope, false);
    let table = visitor.dialect().table_name(&tables[0]);
    visitor.add_table(entity.clone(), table, false);

    let mut statements = Vec::with_capacity(rows.len());
    let mut result = Ok(());
    for (index, row) in rows.iter().enumerate() {
        let table = visitor.dialect().table_name(&tables[index]);
        visitor.params_mut().set_row(Some(index));
        let statement = template.render_row(&mut visitor, &plan, update, &table, row, index);
        visitor.params_mut().set_row(None);

        match statement {
            Ok(statement) => statements.push(statement),
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }
    visitor.pop_scope();
    result?;

    Ok(visitor.finish(statements.join(";"), statements.len(), &tables[0]))
}

impl<'a> Plan<'a> {
    fn replay(&mut self, update: &'a Update, segment: &'a CommandSegment) -> Result<()> {
        let entity = update.entity();

        match segment {
            CommandSegment::Set(expr) | CommandSegment::SetFrom(expr) => {
                let Expr::Record(record) = expr else {
                    return Err(Error::unsupported_expression(
                        "a SET expects a record of member assignments",
                    ));
                };
                for (member, value) in record.iter() {
                    // `x.a = x.a` changes nothing.
                    if is_same_member(update, member, value) {
                        continue;
                    }
                    self.set(update, member, Assignment::Expr(value.clone()))?;
                }
            }
            CommandSegment::SetField { member, value } => {
                if !is_same_member(update, member, value) {
                    self.set(update, member, Assignment::Expr(value.clone()))?;
                }
            }
            CommandSegment::SetFromField { member, query } => {
                self.set(update, member, Assignment::Expr(Expr::stmt(query.clone())))?;
            }
            CommandSegment::SetWith(values) => {
                let mut keys = MemberValues::new();
                for (member, value) in values.iter() {
                    let Some(map) = entity.member(member) else {
                        continue;
                    };
                    if map.is_key {
                        keys.insert(member, value.clone());
                    } else if map.is_row_version {
                        self.versions.push(Expr::eq(
                            Expr::column(update.scope, 0, member),
                            Expr::variable(member, value.clone()),
                        ));
                        let next = Expr::binary_op(
                            Expr::column(update.scope, 0, member),
                            BinaryOp::Add,
                            1,
                        );
                        self.sets.insert(&map.member_name, (map, Assignment::Expr(next)));
                    } else if map.is_updatable() && update.fields.allows(member) {
                        self.sets
                            .insert(&map.member_name, (map, Assignment::Value(value.clone())));
                    }
                }
                if !keys.is_empty() {
                    self.keys.push(Keys::Object(keys));
                }
            }
            CommandSegment::Where(expr) | CommandSegment::And(expr) => self.conditions.push(expr),
            CommandSegment::WhereWith(keys) => self.keys.push(keys.clone()),
            CommandSegment::SetBulk(_) => {}
            segment => {
                return Err(Error::invalid_argument(format!(
                    "`{}` cannot be applied to an update",
                    segment.name()
                )))
            }
        }

        Ok(())
    }

    fn set(&mut self, update: &'a Update, member: &str, assignment: Assignment) -> Result<()> {
        let entity = update.entity();
        let map = entity.member_or_err(member)?;

        if !map.is_updatable() {
            return Err(Error::invalid_argument(format!(
                "member `{}.{member}` cannot be updated",
                entity.name
            )));
        }
        if update.fields.allows(member) {
            self.sets.insert(&map.member_name, (map, assignment));
        }
        Ok(())
    }

    /// Member values of table `table` the update pins down, for routing a
    /// sharded entity: filter equalities, then single keys, then the
    /// values of a saved entity.
    fn pinned(&self, update: &Update, table: usize) -> MemberValues {
        let mut fixed = MemberValues::new();
        for condition in &self.conditions {
            shard::pin_filter(update.scope, table, condition, &mut fixed);
        }
        if let Some(join) = update.tables.get(table).and_then(|source| source.join.as_ref()) {
            shard::pin_filter(update.scope, table, &join.on, &mut fixed);
        }
        if table == 0 {
            for keys in &self.keys {
                shard::pin_keys(update.entity(), keys, &mut fixed);
            }
            for segment in &update.segments {
                if let CommandSegment::SetWith(values) = segment {
                    shard::pin_values(values, &mut fixed);
                }
            }
        }
        fixed
    }

    /// WHERE clauses in replay order: key matches, version checks, then
    /// the caller's conditions.
    fn clauses<'s>(&'s self, update: &Update) -> Vec<Clause<'s>> {
        let keys = self.keys.iter().map(|keys| Clause::Keys {
            scope: update.scope,
            keys,
            row_offset: 0,
        });
        let versions = self.versions.iter().map(Clause::Expr);
        let conditions = self.conditions.iter().map(|expr| Clause::Expr(*expr));
        keys.chain(versions).chain(conditions).collect()
    }
}

fn render_sets(visitor: &mut SqlVisitor<'_>, plan: &Plan<'_>, qualifier: Option<&str>) -> Result<String> {
    let mut sets = Vec::with_capacity(plan.sets.len());

    for (map, assignment) in plan.sets.values() {
        let field = visitor.dialect().field_name(&map.field_name);
        let column = match qualifier {
            Some(alias) => format!("{alias}.{field}"),
            None => field,
        };
        let handler = map.type_handler.as_ref();

        let value = match assignment {
            Assignment::Value(value) => visitor.bind_named(&map.member_name, value.clone(), handler)?,
            Assignment::Expr(Expr::Variable(var)) => {
                visitor.bind_named(&var.name, var.value.clone(), handler)?
            }
            Assignment::Expr(expr) if expr.is_const() => {
                visitor.bind_named(&map.member_name, expr.eval_const()?, handler)?
            }
            Assignment::Expr(expr) => visitor.render(expr)?,
        };
        sets.push(format!("{column}={value}"));
    }

    Ok(sets.join(","))
}

fn is_same_member(update: &Update, member: &str, value: &Expr) -> bool {
    value.as_column().is_some_and(|column| {
        column.scope == update.scope && column.table == 0 && column.member == member
    })
}

/// How each row of a bulk update is rendered, derived from the first row.
#[derive(Debug)]
struct BulkTemplate<'a> {
    keys: Vec<&'a MemberMap>,
    sets: Vec<&'a MemberMap>,
}

impl<'a> BulkTemplate<'a> {
    fn derive(entity: &'a EntityMap, update: &Update, first: &MemberValues) -> Result<BulkTemplate<'a>> {
        let keys = entity.key_members().collect::<Vec<_>>();
        if keys.is_empty() {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` has no key to match bulk rows on",
                entity.name
            )));
        }

        let sets = first
            .members()
            .filter_map(|member| entity.member(member))
            .filter(|map| map.is_updatable() && update.fields.allows(&map.member_name))
            .collect::<Vec<_>>();

        Ok(BulkTemplate { keys, sets })
    }

    fn render_row(
        &self,
        visitor: &mut SqlVisitor<'_>,
        plan: &Plan<'_>,
        update: &Update,
        table: &str,
        row: &MemberValues,
        index: usize,
    ) -> Result<String> {
        let missing = |member: &str| {
            Error::invalid_argument(format!("bulk row {index} is missing member `{member}`"))
        };

        let mut sets = vec![];
        for map in &self.sets {
            if plan.sets.contains_key(map.member_name.as_str()) {
                continue;
            }
            let value = row.get(&map.member_name).ok_or_else(|| missing(&map.member_name))?;
            let value =
                visitor.bind_named(&map.member_name, value.clone(), map.type_handler.as_ref())?;
            sets.push(format!(
                "{}={value}",
                visitor.dialect().field_name(&map.field_name)
            ));
        }
        if !plan.sets.is_empty() {
            sets.push(render_sets(visitor, plan, None)?);
        }
        if sets.is_empty() {
            return Err(Error::invalid_argument(format!(
                "bulk row {index} has no member to set"
            )));
        }

        let mut keys = MemberValues::new();
        for key in &self.keys {
            let value = row.get(&key.member_name).ok_or_else(|| missing(&key.member_name))?;
            keys.insert(&key.member_name, value.clone());
        }
        let keys = Keys::Object(keys);

        let mut clauses = vec![Clause::Keys {
            scope: update.scope,
            keys: &keys,
            row_offset: 0,
        }];
        clauses.extend(plan.clauses(update));
        let filter = visitor.render_clauses(&clauses)?.unwrap_or_default();

        Ok(format!("UPDATE {table} SET {} WHERE {filter}", sets.join(",")))
    }
}
