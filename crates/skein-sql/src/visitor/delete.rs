use super::{shard, Clause, SqlVisitor};
use crate::{Command, Context, Params};
use skein_core::{
    stmt::{CommandSegment, Delete, Keys, MemberValues},
    Error, Result,
};

/// Compiles a `DELETE`.
///
/// Key lists longer than `bulk_count` are split, one command per chunk.
/// Chunks are independent round trips. On a sharded entity each chunk is
/// further split by the table its keys route to.
pub fn compile_delete(cx: &Context, delete: &Delete) -> Result<Vec<Command>> {
    let entity = &delete.entity;

    let mut clauses = vec![];
    for segment in &delete.segments {
        match segment {
            CommandSegment::Where(expr) | CommandSegment::And(expr) => clauses.push(Filter::Expr(expr)),
            CommandSegment::WhereWith(keys) if keys.is_empty() => {
                return Err(Error::invalid_argument(format!(
                    "delete from `{}` needs at least one key",
                    entity.name
                )))
            }
            CommandSegment::WhereWith(keys) => clauses.push(Filter::Keys(keys)),
            segment => {
                return Err(Error::invalid_argument(format!(
                    "`{}` cannot be applied to a delete",
                    segment.name()
                )))
            }
        }
    }

    if clauses.is_empty() {
        return Err(Error::invalid_argument(format!(
            "delete from `{}` has no WHERE clause",
            entity.name
        )));
    }

    // Only the first key list is chunked; every chunk repeats the rest.
    let bulk_count = delete.bulk_count.unwrap_or(cx.bulk_count).max(1);
    let chunked = clauses.iter().position(|clause| matches!(clause, Filter::Keys(_)));
    let chunks = match chunked.map(|index| &clauses[index]) {
        Some(Filter::Keys(keys)) => split_keys(keys, bulk_count),
        _ => vec![],
    };

    let mut fixed = MemberValues::new();
    for (index, clause) in clauses.iter().enumerate() {
        match clause {
            Filter::Expr(expr) => shard::pin_filter(delete.scope, 0, expr, &mut fixed),
            Filter::Keys(keys) if Some(index) != chunked => shard::pin_keys(entity, keys, &mut fixed),
            Filter::Keys(_) => {}
        }
    }

    let explicit = delete.table_name.as_deref();
    let mut targets: Vec<(String, Option<(Keys, usize)>)> = vec![];
    if chunks.is_empty() {
        targets.push((shard::resolve(cx, entity, explicit, &fixed)?, None));
    }
    for (keys, row_offset) in chunks {
        match shard::rule(cx, entity, explicit) {
            Some(rule) => {
                for (table, keys) in shard::split_keys(&*rule, entity, &keys, &fixed)? {
                    targets.push((table, Some((keys, row_offset))));
                }
            }
            None => targets.push((
                shard::resolve(cx, entity, explicit, &fixed)?,
                Some((keys, row_offset)),
            )),
        }
    }

    let mut commands = Vec::with_capacity(targets.len());
    let mut ordinal = 0;

    for (table_name, chunk) in &targets {
        let params = Params::new(cx.command_suffix()).continue_from(ordinal);
        let mut visitor = SqlVisitor::with_params(cx, params);
        visitor.push_scope(delete.scope, false);
        let table = visitor.dialect().table_name(table_name);
        visitor.add_table(entity.clone(), table.clone(), false);

        let rendered = clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| match (clause, chunk) {
                (Filter::Keys(_), Some((keys, row_offset))) if Some(index) == chunked => {
                    Clause::Keys {
                        scope: delete.scope,
                        keys,
                        row_offset: *row_offset,
                    }
                }
                (Filter::Keys(keys), _) => Clause::Keys {
                    scope: delete.scope,
                    keys,
                    row_offset: 0,
                },
                (Filter::Expr(expr), _) => Clause::Expr(expr),
            })
            .collect::<Vec<_>>();
        let filter = visitor.render_clauses(&rendered);
        visitor.pop_scope();

        let sql = format!("DELETE FROM {table} WHERE {}", filter?.unwrap_or_default());
        ordinal = visitor.params().next_ordinal();
        commands.push(visitor.finish(sql, 1, table_name));
    }

    Ok(commands)
}

#[derive(Debug)]
enum Filter<'a> {
    Expr(&'a skein_core::stmt::Expr),
    Keys(&'a Keys),
}

/// Splits key lists into chunks of at most `size` keys, each paired with
/// the index of its first key.
fn split_keys(keys: &Keys, size: usize) -> Vec<(Keys, usize)> {
    match keys {
        Keys::List(values) if values.len() > size => values
            .chunks(size)
            .enumerate()
            .map(|(index, chunk)| (Keys::List(chunk.to_vec()), index * size))
            .collect(),
        Keys::Objects(objects) if objects.len() > size => objects
            .chunks(size)
            .enumerate()
            .map(|(index, chunk)| (Keys::Objects(chunk.to_vec()), index * size))
            .collect(),
        keys => vec![(keys.clone(), 0)],
    }
}
