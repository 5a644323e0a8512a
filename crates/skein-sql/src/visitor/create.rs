use super::{shard, SqlVisitor};
use crate::{dialect::IdentityFetch, fmt::Comma, Command, Context, Dialect};
use indexmap::IndexMap;
use skein_core::{
    schema::{split_sharding_parameters, EntityMap, MemberMap},
    stmt::{CommandSegment, Expr, FieldFilter, Insert, InsertSource, MemberValues, Upsert},
    Error, Result,
};
use std::borrow::Cow;

/// Compiles an `INSERT`.
///
/// A single-row insert compiles to one command. A bulk insert compiles to
/// one command per `bulk_count` rows, each executed as its own round trip.
pub fn compile_insert(cx: &Context, insert: &Insert) -> Result<Vec<Command>> {
    if insert.is_bulk() {
        compile_bulk(cx, insert)
    } else {
        compile_single(cx, insert).map(|command| vec![command])
    }
}

fn compile_single(cx: &Context, insert: &Insert) -> Result<Command> {
    let entity = &insert.entity;
    let mut visitor = SqlVisitor::new(cx);

    if let Some(query) = &insert.from_query {
        if !insert.segments.is_empty() {
            return Err(Error::invalid_argument(
                "an insert from a query cannot also take member values",
            ));
        }
        return compile_from_query(visitor, insert, query);
    }

    // Later values for the same member replace earlier ones.
    let mut fields = IndexMap::<&str, (&MemberMap, Expr)>::new();
    for segment in &insert.segments {
        match segment {
            CommandSegment::WithBy(InsertSource::One(values)) => {
                for (member, value) in values.iter() {
                    if let Some(member) = writable(entity, &insert.fields, member) {
                        fields.insert(&member.member_name, (member, Expr::Value(value.clone())));
                    }
                }
            }
            CommandSegment::WithBy(InsertSource::Many(_)) => {
                return Err(Error::invalid_argument("use bulk insert instead"));
            }
            CommandSegment::WithByField { member, value } => {
                entity.member_or_err(member)?;
                if let Some(member) = writable(entity, &insert.fields, member) {
                    fields.insert(&member.member_name, (member, value.clone()));
                }
            }
            segment => {
                return Err(Error::invalid_argument(format!(
                    "`{}` cannot be applied to an insert",
                    segment.name()
                )))
            }
        }
    }

    if fields.is_empty() {
        return Err(Error::invalid_argument(format!(
            "insert into `{}` has no member to write",
            entity.name
        )));
    }

    // Constant values, for resolving a sharded table.
    let row = fields
        .values()
        .filter(|(_, expr)| expr.is_const())
        .map(|(member, expr)| Ok((member.member_name.clone(), expr.eval_const()?)))
        .collect::<Result<MemberValues>>()?;
    let table_name = shard::resolve(cx, &insert.entity, insert.table_name.as_deref(), &row)?;
    let table = visitor.dialect().table_name(&table_name);

    visitor.push_scope(insert.scope, false);
    visitor.add_table(entity.clone(), table.clone(), false);

    let columns = fields
        .values()
        .map(|(member, _)| visitor.dialect().field_name(&member.field_name))
        .collect::<Vec<_>>();

    let mut values = Vec::with_capacity(fields.len());
    for (member, expr) in fields.values() {
        values.push(bind_member(&mut visitor, member, expr)?);
    }

    let mut sql = String::new();
    fmt!(&mut sql, "INSERT INTO " table.as_str() " (" Comma(columns) ") VALUES (" Comma(values) ")");

    if let Some(upsert) = &insert.upsert {
        let clause = render_upsert(&mut visitor, insert, upsert)?;
        sql.push_str(&clause);
    }

    let mut statements = 1;
    if insert.return_identity {
        let Some(key) = entity.auto_increment_key() else {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` has no auto-increment key to return",
                entity.name
            )));
        };
        let key_field = visitor.dialect().field_name(&key.field_name);
        match visitor.dialect().identity_sql(&key_field) {
            IdentityFetch::Statement(select) => {
                fmt!(&mut sql, ";" select);
                statements += 1;
            }
            IdentityFetch::Returning(returning) => sql.push_str(&returning),
        }
    }

    visitor.pop_scope();
    Ok(visitor.finish(sql, statements, &table_name))
}

fn compile_from_query(
    mut visitor: SqlVisitor<'_>,
    insert: &Insert,
    query: &skein_core::stmt::Query,
) -> Result<Command> {
    let entity = &insert.entity;
    let Some(Expr::Record(record)) = &query.select else {
        return Err(Error::invalid_argument(
            "insert from a query needs a projection naming the target members",
        ));
    };

    let mut columns = Vec::with_capacity(record.len());
    for (member, _) in record.iter() {
        let member = entity.member_or_err(member)?;
        columns.push(visitor.dialect().field_name(&member.field_name));
    }

    let table_name = insert
        .table_name
        .clone()
        .unwrap_or_else(|| entity.table_name.clone());
    let table = visitor.dialect().table_name(&table_name);
    let select = visitor.render_select(query)?;

    let mut sql = String::new();
    fmt!(&mut sql, "INSERT INTO " table " (" Comma(columns) ") " select);
    Ok(visitor.finish(sql, 1, &table_name))
}

fn compile_bulk(cx: &Context, insert: &Insert) -> Result<Vec<Command>> {
    if insert.return_identity {
        return Err(Error::invalid_argument(
            "a bulk insert cannot return generated keys",
        ));
    }
    if insert.upsert.is_some() || insert.from_query.is_some() {
        return Err(Error::unsupported_feature(
            "a bulk insert cannot be combined with an upsert or a source query",
        ));
    }

    let mut batches = vec![];
    for segment in &insert.segments {
        match segment {
            CommandSegment::WithBulk(rows) => batches.push(rows),
            segment => {
                return Err(Error::invalid_argument(format!(
                    "`{}` cannot be combined with a bulk insert",
                    segment.name()
                )))
            }
        }
    }

    let rows: Cow<'_, [MemberValues]> = match &batches[..] {
        [rows] => Cow::Borrowed(&rows[..]),
        batches => Cow::Owned(batches.iter().flat_map(|rows| rows.iter().cloned()).collect()),
    };
    let Some(first) = rows.first() else {
        return Err(Error::invalid_argument("bulk insert needs at least one row"));
    };

    let template = RowTemplate::derive(&*cx.dialect, &insert.entity, &insert.fields, first)?;
    let sharding = shard::rule(cx, &insert.entity, insert.table_name.as_deref());

    let bulk_count = insert.bulk_count.unwrap_or(cx.bulk_count).max(1);
    let mut commands = vec![];

    for (chunk_index, chunk) in rows.chunks(bulk_count).enumerate() {
        let offset = chunk_index * bulk_count;
        let mut visitor = SqlVisitor::new(cx);

        let groups = match &sharding {
            Some(sharding) => split_sharding_parameters(&**sharding, &insert.entity, chunk)?,
            None => {
                let table = insert
                    .table_name
                    .clone()
                    .unwrap_or_else(|| insert.entity.table_name.clone());
                IndexMap::from([(table, (0..chunk.len()).collect())])
            }
        };

        let mut statements = vec![];
        for (table, indices) in &groups {
            let mut tuples = Vec::with_capacity(indices.len());
            for &index in indices {
                tuples.push(template.render_row(&mut visitor, &chunk[index], offset + index)?);
            }
            let mut sql = String::new();
            fmt!(
                &mut sql,
                "INSERT INTO " visitor.dialect().table_name(table)
                " (" template.columns.as_str() ") VALUES " Comma(tuples)
            );
            statements.push(sql);
        }

        let table = groups
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| insert.entity.table_name.clone());
        commands.push(visitor.finish(statements.join(";"), statements.len(), &table));
    }

    Ok(commands)
}

/// How every row of a bulk insert is rendered, derived once from the
/// first row.
#[derive(Debug)]
struct RowTemplate<'a> {
    members: Vec<&'a MemberMap>,

    /// Rendered column list
    columns: String,
}

impl<'a> RowTemplate<'a> {
    fn derive(
        dialect: &dyn Dialect,
        entity: &'a EntityMap,
        fields: &FieldFilter,
        first: &MemberValues,
    ) -> Result<RowTemplate<'a>> {
        let members = first
            .members()
            .filter_map(|member| writable(entity, fields, member))
            .collect::<Vec<_>>();

        if members.is_empty() {
            return Err(Error::invalid_argument(format!(
                "bulk insert into `{}` has no member to write",
                entity.name
            )));
        }

        let columns = members
            .iter()
            .map(|member| dialect.field_name(&member.field_name))
            .collect::<Vec<_>>()
            .join(",");

        Ok(RowTemplate { members, columns })
    }

    fn render_row(
        &self,
        visitor: &mut SqlVisitor<'_>,
        row: &MemberValues,
        index: usize,
    ) -> Result<String> {
        visitor.params_mut().set_row(Some(index));

        let mut values = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let Some(value) = row.get(&member.member_name) else {
                visitor.params_mut().set_row(None);
                return Err(Error::invalid_argument(format!(
                    "bulk row {index} is missing member `{}`",
                    member.member_name
                )));
            };
            let value = visitor.bind_named(
                &member.member_name,
                value.clone(),
                member.type_handler.as_ref(),
            );
            match value {
                Ok(value) => values.push(value),
                Err(err) => {
                    visitor.params_mut().set_row(None);
                    return Err(err);
                }
            }
        }

        visitor.params_mut().set_row(None);
        Ok(format!("({})", values.join(",")))
    }
}

/// The member, when the insert writes it.
fn writable<'a>(entity: &'a EntityMap, fields: &FieldFilter, member: &str) -> Option<&'a MemberMap> {
    entity
        .member(member)
        .filter(|member| member.is_insertable() && fields.allows(&member.member_name))
}

fn bind_member(visitor: &mut SqlVisitor<'_>, member: &MemberMap, expr: &Expr) -> Result<String> {
    let handler = member.type_handler.as_ref();
    match expr {
        Expr::Variable(var) => visitor.bind_named(&var.name, var.value.clone(), handler),
        expr if expr.is_const() => {
            visitor.bind_named(&member.member_name, expr.eval_const()?, handler)
        }
        expr => visitor.render(expr),
    }
}

fn render_upsert(visitor: &mut SqlVisitor<'_>, insert: &Insert, upsert: &Upsert) -> Result<String> {
    let entity = &insert.entity;
    let dialect = visitor.dialect();

    let conflict = entity
        .key_members()
        .map(|key| dialect.field_name(&key.field_name))
        .collect::<Vec<_>>();
    if conflict.is_empty() {
        return Err(Error::invalid_mapping(format!(
            "entity `{}` has no key to detect conflicts on",
            entity.name
        )));
    }

    let mut assignments = vec![];
    match upsert {
        Upsert::Values(values) => {
            for (member, value) in values.iter() {
                let Some(member) = entity.member(member).filter(|m| m.is_updatable()) else {
                    continue;
                };
                let value = visitor.bind_named(
                    &member.member_name,
                    value.clone(),
                    member.type_handler.as_ref(),
                )?;
                assignments.push(format!("{}={value}", dialect.field_name(&member.field_name)));
            }
        }
        Upsert::Record(Expr::Record(record)) => {
            for (member, expr) in record.iter() {
                let member = entity.member_or_err(member)?;
                let value = bind_member(visitor, member, expr)?;
                assignments.push(format!("{}={value}", dialect.field_name(&member.field_name)));
            }
        }
        Upsert::Record(_) => {
            return Err(Error::unsupported_expression(
                "an upsert expects a record of member assignments",
            ))
        }
    }

    if assignments.is_empty() {
        return Err(Error::invalid_argument(
            "an upsert needs at least one member to update",
        ));
    }

    Ok(dialect.upsert(&conflict, &assignments))
}
