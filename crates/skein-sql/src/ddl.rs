use crate::{fmt::Comma, Dialect};
use skein_core::schema::EntityMap;

/// `CREATE TABLE IF NOT EXISTS` for an entity's mapped members.
pub fn create_table(dialect: &dyn Dialect, entity: &EntityMap) -> String {
    let mut columns = vec![];
    let mut declares_key = false;

    for member in entity.mapped_members() {
        let field = dialect.field_name(&member.field_name);

        if member.is_auto_increment {
            let (column, primary_key) = dialect.auto_increment_column(&field, member.ty);
            declares_key |= primary_key;
            columns.push(column);
            continue;
        }

        let null = if member.nullable { "" } else { " NOT NULL" };
        columns.push(format!(
            "{field} {}{null}",
            dialect.map_default_type(member.ty)
        ));
    }

    let keys = entity
        .key_members()
        .filter(|member| !member.is_ignore)
        .map(|member| dialect.field_name(&member.field_name))
        .collect::<Vec<_>>();
    if !declares_key && !keys.is_empty() {
        let mut key = String::new();
        fmt!(&mut key, "PRIMARY KEY (" Comma(keys) ")");
        columns.push(key);
    }

    let mut sql = String::new();
    fmt!(
        &mut sql,
        "CREATE TABLE IF NOT EXISTS " dialect.table_name(&entity.table_name)
        " (" Comma(columns) ")"
    );
    sql
}
