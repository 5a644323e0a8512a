use super::SqlVisitor;
use crate::{fmt::Comma, Command, Context};
use skein_core::{
    stmt::{Include, Value},
    Result,
};

/// Compiles the statements loading navigations, all in one command.
///
/// Each entry pairs a root include with the parent key values read by the
/// primary statement. Statements follow a pre-order walk of every include
/// tree: a root include, then its nested includes. Nested levels select
/// their parents again through a sub-query, so the whole tree loads in a
/// single round trip.
pub fn build_includes(cx: &Context, loads: &[(&Include, &[Value])]) -> Result<Command> {
    let mut visitor = SqlVisitor::new(cx);
    let mut statements = vec![];

    for (include, keys) in loads {
        let mut chain = vec![*include];
        render_tree(&mut visitor, &mut chain, keys, &mut statements)?;
    }

    let count = statements.len();
    let table = loads
        .first()
        .map(|(include, _)| include.target.table_name.clone())
        .unwrap_or_default();
    Ok(visitor.finish(statements.join(";"), count, &table))
}

fn render_tree<'a>(
    visitor: &mut SqlVisitor<'_>,
    chain: &mut Vec<&'a Include>,
    keys: &[Value],
    statements: &mut Vec<String>,
) -> Result<()> {
    statements.push(render_statement(visitor, chain, keys)?);

    let Some(include) = chain.last().copied() else {
        return Ok(());
    };
    for then in &include.then {
        chain.push(then);
        let result = render_tree(visitor, chain, keys, statements);
        chain.pop();
        result?;
    }
    Ok(())
}

/// `SELECT` of the last include of `chain`.
fn render_statement(visitor: &mut SqlVisitor<'_>, chain: &[&Include], keys: &[Value]) -> Result<String> {
    let Some(leaf) = chain.last() else {
        return Ok(String::new());
    };

    let alias = visitor.context().table_alias(0);
    let columns = visitor.entity_columns(&leaf.target, &alias, false);
    let table = visitor.dialect().table_name(&leaf.target.table_name);
    let filter = render_filter(visitor, chain, keys, 0)?;

    let mut sql = String::new();
    fmt!(&mut sql, "SELECT " Comma(columns) " FROM " table " " alias " WHERE " filter);
    Ok(sql)
}

/// Matches the child key of the last include against its parents: the
/// key values for a root include, or a sub-query selecting the parent keys
/// for a nested one.
fn render_filter(
    visitor: &mut SqlVisitor<'_>,
    chain: &[&Include],
    keys: &[Value],
    depth: usize,
) -> Result<String> {
    let Some((include, parents)) = chain.split_last() else {
        return Ok("1=0".to_string());
    };

    let dialect = visitor.dialect();
    let alias = visitor.context().table_alias(depth);
    let child = include.target.member_or_err(&include.child_key)?;
    let column = format!("{alias}.{}", dialect.field_name(&child.field_name));

    let Some(parent) = parents.last() else {
        if keys.is_empty() {
            return Ok("1=0".to_string());
        }
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            items.push(visitor.bind(key.clone(), child.type_handler.as_ref())?);
        }
        return Ok(format!("{column} IN ({})", items.join(",")));
    };

    let parent_alias = visitor.context().table_alias(depth + 1);
    let parent_key = parent.target.member_or_err(&include.parent_key)?;
    let parent_table = dialect.table_name(&parent.target.table_name);
    let inner = render_filter(visitor, parents, keys, depth + 1)?;

    Ok(format!(
        "{column} IN (SELECT {parent_alias}.{} FROM {parent_table} {parent_alias} WHERE {inner})",
        dialect.field_name(&parent_key.field_name)
    ))
}
