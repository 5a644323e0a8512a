use super::{shard, SqlVisitor};
use crate::{fmt::Comma, Command, Context};
use skein_core::{
    stmt::{Direction, Expr, JoinKind, MemberValues, Query, TableBody},
    Error, Result,
};

/// Compiles a `SELECT`.
pub fn compile_query(cx: &Context, query: &Query) -> Result<Command> {
    let mut visitor = SqlVisitor::new(cx);
    let sql = visitor.render_select(query)?;
    Ok(visitor.finish(sql, 1, &query.entity().table_name))
}

/// Compiles the `SELECT COUNT(*)` matching the rows of `query`.
///
/// Ordering, paging and includes do not change the count and are dropped.
/// Grouped, distinct and union queries are counted through a derived
/// table.
pub fn compile_count(cx: &Context, query: &Query) -> Result<Command> {
    let mut query = query.clone();
    query.order_by.clear();
    query.paging = None;
    query.includes.clear();

    let mut visitor = SqlVisitor::new(cx);
    let sql = if query.group_by.is_empty() && !query.distinct && query.unions.is_empty() {
        query.select = Some(Expr::count_star());
        visitor.render_select(&query)?
    } else {
        let inner = visitor.render_select(&query)?;
        format!("SELECT COUNT(*) FROM ({inner}) {}", cx.dialect.quote("t"))
    };

    Ok(visitor.finish(sql, 1, &query.entity().table_name))
}

impl SqlVisitor<'_> {
    /// Renders a `SELECT` and its CTEs and unions.
    pub(crate) fn render_select(&mut self, query: &Query) -> Result<String> {
        let mut sql = String::new();

        if !query.ctes.is_empty() {
            let mut ctes = Vec::with_capacity(query.ctes.len());
            for cte in &query.ctes {
                let body = self.render_select(&cte.query)?;
                ctes.push(format!("{} AS ({body})", self.dialect().quote(&cte.name)));
            }
            fmt!(&mut sql, "WITH " Comma(ctes) " ");
        }

        self.enter(query, true)?;
        let body = self.render_select_body(query, &mut sql);
        if query.unions.is_empty() {
            let tail = body.and_then(|_| self.render_tail(query, &mut sql));
            self.pop_scope();
            tail?;
            return Ok(sql);
        }
        self.pop_scope();
        body?;

        for union in &query.unions {
            let body = self.render_select(&union.query)?;
            let op = if union.all { " UNION ALL " } else { " UNION " };
            fmt!(&mut sql, op body);
        }

        // The ordering of a compound select reads its result columns.
        self.enter(query, false)?;
        let tail = self.render_tail(query, &mut sql);
        self.pop_scope();
        tail?;

        Ok(sql)
    }

    /// Pushes the query's scope and registers its tables. A sharded table
    /// is resolved from the equalities the query filters it by.
    fn enter(&mut self, query: &Query, aliased: bool) -> Result<()> {
        let mut tables = Vec::with_capacity(query.tables.len());
        for (index, table) in query.tables.iter().enumerate() {
            tables.push(match &table.body {
                Some(TableBody::Cte(name)) => (self.dialect().quote(name), true),
                Some(TableBody::Subquery(_)) => (String::new(), true),
                None => {
                    let mut fixed = MemberValues::new();
                    for filter in &query.filter {
                        shard::pin_filter(query.scope, index, filter, &mut fixed);
                    }
                    if let Some(join) = &table.join {
                        shard::pin_filter(query.scope, index, &join.on, &mut fixed);
                    }
                    let name =
                        shard::resolve(self.context(), &table.entity, table.table_name.as_deref(), &fixed)?;
                    (self.dialect().table_name(&name), false)
                }
            });
        }

        self.push_scope(query.scope, aliased);
        for (table, (name, reads_members)) in query.tables.iter().zip(tables) {
            self.add_table(table.entity.clone(), name, reads_members);
        }
        Ok(())
    }

    fn render_select_body(&mut self, query: &Query, sql: &mut String) -> Result<()> {
        let projection = self.render_projection(query)?;
        let distinct = query.distinct.then_some("DISTINCT ");
        fmt!(sql, "SELECT " distinct projection);

        let tables = self.tables().to_vec();
        for (table, source) in tables.iter().zip(&query.tables) {
            let from = match &source.body {
                Some(TableBody::Subquery(subquery)) => format!("({})", self.render_select(subquery)?),
                _ => table.name.clone(),
            };

            match &source.join {
                None => fmt!(sql, " FROM " from " " table.alias.as_str()),
                Some(join) => {
                    let kind = match join.kind {
                        JoinKind::Inner => " INNER JOIN ",
                        JoinKind::Left => " LEFT JOIN ",
                        JoinKind::Right => " RIGHT JOIN ",
                    };
                    let on = self.predicate(&join.on)?;
                    fmt!(sql, kind from " " table.alias.as_str() " ON " on.sql);
                }
            }
        }

        if let Some(filter) = self.render_conditions(&query.filter)? {
            fmt!(sql, " WHERE " filter);
        }

        if !query.group_by.is_empty() {
            let mut exprs = Vec::with_capacity(query.group_by.len());
            for expr in &query.group_by {
                exprs.push(self.render(expr)?);
            }
            fmt!(sql, " GROUP BY " Comma(exprs));
        }

        if let Some(having) = self.render_conditions(&query.having)? {
            fmt!(sql, " HAVING " having);
        }

        Ok(())
    }

    /// `ORDER BY` and paging.
    fn render_tail(&mut self, query: &Query, sql: &mut String) -> Result<()> {
        if !query.order_by.is_empty() {
            let mut terms = Vec::with_capacity(query.order_by.len());
            for order_by in &query.order_by {
                let expr = self.render(&order_by.expr)?;
                terms.push(match order_by.direction {
                    Direction::Asc => expr,
                    Direction::Desc => format!("{expr} DESC"),
                });
            }
            fmt!(sql, " ORDER BY " Comma(terms));
        }

        if let Some(paging) = &query.paging {
            let (offset, limit) = paging.offset_limit();
            fmt!(sql, self.dialect().paging(offset, limit));
        }

        Ok(())
    }

    fn render_projection(&mut self, query: &Query) -> Result<String> {
        match &query.select {
            None => {
                let Some(table) = self.tables().first() else {
                    return Err(Error::invalid_argument("query reads no table"));
                };
                let columns = self.entity_columns(&table.entity, &table.alias, table.reads_members);
                Ok(columns.join(","))
            }
            Some(Expr::Record(record)) => {
                let mut columns = Vec::with_capacity(record.len());
                for (member, expr) in record.iter() {
                    let column = self.render(expr)?;
                    let label = self.dialect().quote(member);
                    // A column already named after the member needs no label.
                    if expr.is_column() && column.ends_with(&label) {
                        columns.push(column);
                    } else {
                        columns.push(format!("{column} AS {label}"));
                    }
                }
                Ok(columns.join(","))
            }
            Some(expr) => self.render(expr),
        }
    }
}
