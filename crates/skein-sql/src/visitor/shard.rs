use crate::Context;
use indexmap::IndexMap;
use skein_core::{
    schema::{sharded_table_name, EntityMap, TableSharding},
    stmt::{BinaryOp, Expr, Keys, MemberValues, ScopeId, Value},
    Result,
};
use std::sync::Arc;

/// The sharding rule of `entity`. An explicit table name disables it.
pub(crate) fn rule(
    cx: &Context,
    entity: &EntityMap,
    explicit: Option<&str>,
) -> Option<Arc<dyn TableSharding>> {
    match explicit {
        Some(_) => None,
        None => cx
            .sharding
            .as_ref()
            .and_then(|sharding| sharding.table_sharding(&entity.name)),
    }
}

/// The logical table a statement on `entity` reads or writes, given the
/// member values the statement pins down.
pub(crate) fn resolve(
    cx: &Context,
    entity: &EntityMap,
    explicit: Option<&str>,
    fixed: &MemberValues,
) -> Result<String> {
    if let Some(table_name) = explicit {
        return Ok(table_name.to_string());
    }
    match rule(cx, entity, None) {
        Some(rule) => sharded_table_name(&*rule, entity, fixed),
        None => Ok(entity.table_name.clone()),
    }
}

/// Collects `member = constant` conjuncts of `expr` on table `table` of
/// `scope`. Members already fixed are kept.
pub(crate) fn pin_filter(scope: ScopeId, table: usize, expr: &Expr, fixed: &mut MemberValues) {
    match expr {
        Expr::And(operands) => {
            for operand in operands {
                pin_filter(scope, table, operand, fixed);
            }
        }
        Expr::BinaryOp(op) if op.op == BinaryOp::Eq => {
            let pinned = pinned_member(scope, table, &op.lhs, &op.rhs)
                .or_else(|| pinned_member(scope, table, &op.rhs, &op.lhs));
            if let Some((member, value)) = pinned {
                if !fixed.contains(member) {
                    fixed.insert(member, value);
                }
            }
        }
        _ => {}
    }
}

fn pinned_member<'e>(
    scope: ScopeId,
    table: usize,
    column: &'e Expr,
    value: &Expr,
) -> Option<(&'e str, Value)> {
    let column = column.as_column()?;
    if column.scope != scope || column.table != table {
        return None;
    }
    let value = match value {
        Expr::Variable(var) => var.value.clone(),
        value if value.is_const() => value.eval_const().ok()?,
        _ => return None,
    };
    (!value.is_null()).then_some((column.member.as_str(), value))
}

/// Pins the key members of a single-entry key match. Lists of keys pin
/// nothing; they are routed entry by entry with [`split_keys`].
pub(crate) fn pin_keys(entity: &EntityMap, keys: &Keys, fixed: &mut MemberValues) {
    let entry = match keys {
        Keys::One(value) => match entity.single_key() {
            Ok(key) => MemberValues::new().with(&key.member_name, value.clone()),
            Err(_) => return,
        },
        Keys::Object(object) => object.clone(),
        Keys::List(values) if values.len() == 1 => {
            return pin_keys(entity, &Keys::One(values[0].clone()), fixed)
        }
        Keys::Objects(objects) if objects.len() == 1 => objects[0].clone(),
        Keys::List(_) | Keys::Objects(_) => return,
    };
    pin_values(&entry, fixed);
}

/// Pins every value of `values` not pinned yet.
pub(crate) fn pin_values(values: &MemberValues, fixed: &mut MemberValues) {
    for (member, value) in values.iter() {
        if !fixed.contains(member) && !value.is_null() {
            fixed.insert(member, value.clone());
        }
    }
}

/// Groups the entries of `keys` by the table each routes to, in
/// first-seen table order.
pub(crate) fn split_keys(
    rule: &dyn TableSharding,
    entity: &EntityMap,
    keys: &Keys,
    fixed: &MemberValues,
) -> Result<IndexMap<String, Keys>> {
    let route = |entry: &Keys| -> Result<String> {
        let mut pinned = MemberValues::new();
        pin_keys(entity, entry, &mut pinned);
        pin_values(fixed, &mut pinned);
        sharded_table_name(rule, entity, &pinned)
    };

    Ok(match keys {
        Keys::List(values) => {
            let mut groups = IndexMap::<String, Vec<Value>>::new();
            for value in values {
                let table = route(&Keys::One(value.clone()))?;
                groups.entry(table).or_default().push(value.clone());
            }
            groups.into_iter().map(|(table, values)| (table, Keys::List(values))).collect()
        }
        Keys::Objects(objects) => {
            let mut groups = IndexMap::<String, Vec<MemberValues>>::new();
            for object in objects {
                let table = route(&Keys::Object(object.clone()))?;
                groups.entry(table).or_default().push(object.clone());
            }
            groups.into_iter().map(|(table, objects)| (table, Keys::Objects(objects))).collect()
        }
        keys => IndexMap::from([(route(keys)?, keys.clone())]),
    })
}
