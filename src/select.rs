//! The SELECT statement builder and its execution methods.
//!
//! [`SelectQuery`] accumulates clauses through a fluent API and renders them
//! into a [`Query`] on demand. Rendering is a pure function of the current
//! state, so a builder can be mutated further and re-rendered. Execution
//! methods take any [`GenericClient`] and route through the hook chains.

use crate::client::GenericClient;
use crate::error::{QbError, QbResult};
use crate::expr::{Expr, eq};
use crate::hooks::{AllHook, BindNext, BindTarget, ExecHook, ExecNext, OneHook, QueryContext};
use crate::ident::{quote_column, quote_order_by, quote_table};
use crate::model::Model;
use crate::param::{ParamList, Params};
use crate::query::{Query, adjust_placeholders};
use crate::row::{FromRow, scalar_from_row};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Cross => "CROSS",
        }
    }
}

#[derive(Clone, Debug)]
struct Join {
    kind: JoinKind,
    table: String,
    on: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UnionKind {
    Distinct,
    All,
}

impl UnionKind {
    fn as_sql(self) -> &'static str {
        match self {
            UnionKind::Distinct => "UNION",
            UnionKind::All => "UNION ALL",
        }
    }
}

/// A composable SELECT statement.
///
/// Clause methods either replace or append, mirroring their names: `select`
/// replaces the column list while `and_select` appends, and likewise for
/// `where_`/`and_where`/`or_where`, `group_by`/`and_group_by`,
/// `order_by`/`and_order_by` and `bind`/`and_bind`. Join and union methods
/// always append.
///
/// # Example
///
/// ```ignore
/// let query = pgqb::select(["id", "email"])
///     .from(["customer"])
///     .where_(pgqb::eq("status", 1i32))
///     .order_by(["id"])
///     .limit(10)
///     .build();
/// assert_eq!(
///     query.sql(),
///     "SELECT \"id\", \"email\" FROM \"customer\" WHERE \"status\" = $1 ORDER BY \"id\" LIMIT 10",
/// );
/// ```
#[derive(Clone, Default)]
pub struct SelectQuery {
    select_cols: Vec<String>,
    distinct: bool,
    select_option: Option<String>,
    from_tables: Vec<String>,
    joins: Vec<Join>,
    where_expr: Expr,
    group_cols: Vec<String>,
    having_expr: Expr,
    order_cols: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    unions: Vec<(UnionKind, Query)>,
    bound: Params,
    exec_hooks: Vec<Arc<dyn ExecHook>>,
    one_hooks: Vec<Arc<dyn OneHook>>,
    all_hooks: Vec<Arc<dyn AllHook>>,
}

impl SelectQuery {
    /// Create an empty builder. Renders as `SELECT *` until clauses are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the select column list.
    pub fn select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Append to the select column list.
    pub fn and_select<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_cols.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Set or clear the DISTINCT flag.
    pub fn distinct(mut self, on: bool) -> Self {
        self.distinct = on;
        self
    }

    /// Set an option string emitted right after `SELECT [DISTINCT]`, e.g. an
    /// engine hint. Replaces any previous option.
    pub fn select_option(mut self, option: impl Into<String>) -> Self {
        self.select_option = Some(option.into());
        self
    }

    /// Replace the source table list.
    pub fn from<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the WHERE expression.
    pub fn where_(mut self, expr: Expr) -> Self {
        self.where_expr = expr;
        self
    }

    /// AND-combine with the existing WHERE expression. With no WHERE yet, the
    /// expression becomes the WHERE outright.
    pub fn and_where(mut self, expr: Expr) -> Self {
        self.where_expr = std::mem::take(&mut self.where_expr).and(expr);
        self
    }

    /// OR-combine with the existing WHERE expression.
    pub fn or_where(mut self, expr: Expr) -> Self {
        self.where_expr = std::mem::take(&mut self.where_expr).or(expr);
        self
    }

    fn join(mut self, kind: JoinKind, table: impl Into<String>, on: Expr) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            on,
        });
        self
    }

    /// Append an INNER JOIN. An [`Expr::None`] ON-expression renders the join
    /// without an `ON` clause.
    pub fn inner_join(self, table: impl Into<String>, on: Expr) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    /// Append a LEFT JOIN.
    pub fn left_join(self, table: impl Into<String>, on: Expr) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// Append a RIGHT JOIN.
    pub fn right_join(self, table: impl Into<String>, on: Expr) -> Self {
        self.join(JoinKind::Right, table, on)
    }

    /// Append a CROSS JOIN.
    pub fn cross_join(self, table: impl Into<String>) -> Self {
        self.join(JoinKind::Cross, table, Expr::None)
    }

    /// Replace the GROUP BY column list.
    pub fn group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Append to the GROUP BY column list.
    pub fn and_group_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_cols.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Replace the HAVING expression.
    pub fn having(mut self, expr: Expr) -> Self {
        self.having_expr = expr;
        self
    }

    /// AND-combine with the existing HAVING expression.
    pub fn and_having(mut self, expr: Expr) -> Self {
        self.having_expr = std::mem::take(&mut self.having_expr).and(expr);
        self
    }

    /// OR-combine with the existing HAVING expression.
    pub fn or_having(mut self, expr: Expr) -> Self {
        self.having_expr = std::mem::take(&mut self.having_expr).or(expr);
        self
    }

    /// Replace the ORDER BY list. Each entry is a column name with an
    /// optional `ASC`/`DESC` suffix passed through verbatim.
    pub fn order_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Append to the ORDER BY list.
    pub fn and_order_by<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_cols.extend(cols.into_iter().map(Into::into));
        self
    }

    /// Set the LIMIT. A negative value clears the clause.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = if n < 0 { None } else { Some(n) };
        self
    }

    /// Set the OFFSET. A negative value clears the clause.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = if n < 0 { None } else { Some(n) };
        self
    }

    /// Replace the bound named-parameter set.
    ///
    /// Bound parameters resolve `:name` tokens in raw expression text; values
    /// never referenced by a token are still reported by
    /// [`Query::params`], appended after the referenced ones.
    pub fn bind(mut self, params: Params) -> Self {
        self.bound = params;
        self
    }

    /// Merge into the bound named-parameter set; later keys win on conflict.
    pub fn and_bind(mut self, params: Params) -> Self {
        self.bound.merge(params);
        self
    }

    /// Append a UNION arm. The sub-statement is captured as rendered, now.
    pub fn union(mut self, query: Query) -> Self {
        self.unions.push((UnionKind::Distinct, query));
        self
    }

    /// Append a UNION ALL arm.
    pub fn union_all(mut self, query: Query) -> Self {
        self.unions.push((UnionKind::All, query));
        self
    }

    /// Append an execution hook. Hooks run in registration order, first
    /// registered outermost.
    pub fn with_exec_hook(mut self, hook: impl ExecHook + 'static) -> Self {
        self.exec_hooks.push(Arc::new(hook));
        self
    }

    /// Append a single-row bind hook.
    pub fn with_one_hook(mut self, hook: impl OneHook + 'static) -> Self {
        self.one_hooks.push(Arc::new(hook));
        self
    }

    /// Append a multi-row bind hook.
    pub fn with_all_hook(mut self, hook: impl AllHook + 'static) -> Self {
        self.all_hooks.push(Arc::new(hook));
        self
    }

    /// Render the current state into SQL text plus an ordered parameter list.
    ///
    /// Clause order is fixed: SELECT, FROM, JOINs, WHERE, GROUP BY, HAVING,
    /// ORDER BY, LIMIT, OFFSET, UNION arms. Empty clauses are omitted. An
    /// unresolved `:name` token does not fail here; the error is carried on
    /// the [`Query`] and surfaces when it is executed.
    pub fn build(&self) -> Query {
        let mut params = ParamList::new();
        let mut pending = Params::new();
        let mut clauses: Vec<String> = Vec::new();

        let mut head = String::from("SELECT");
        if self.distinct {
            head.push_str(" DISTINCT");
        }
        if let Some(option) = &self.select_option {
            head.push(' ');
            head.push_str(option);
        }
        head.push(' ');
        if self.select_cols.is_empty() {
            head.push('*');
        } else {
            let cols: Vec<String> = self.select_cols.iter().map(|c| quote_column(c)).collect();
            head.push_str(&cols.join(", "));
        }
        clauses.push(head);

        if !self.from_tables.is_empty() {
            let tables: Vec<String> = self.from_tables.iter().map(|t| quote_table(t)).collect();
            clauses.push(format!("FROM {}", tables.join(", ")));
        }

        for join in &self.joins {
            let mut clause = format!("{} JOIN {}", join.kind.as_sql(), quote_table(&join.table));
            if !join.on.is_empty() {
                clause.push_str(" ON ");
                clause.push_str(&join.on.build(&mut params, &mut pending));
            }
            clauses.push(clause);
        }

        if !self.where_expr.is_empty() {
            clauses.push(format!(
                "WHERE {}",
                self.where_expr.build(&mut params, &mut pending)
            ));
        }

        if !self.group_cols.is_empty() {
            let cols: Vec<String> = self.group_cols.iter().map(|c| quote_column(c)).collect();
            clauses.push(format!("GROUP BY {}", cols.join(", ")));
        }

        if !self.having_expr.is_empty() {
            clauses.push(format!(
                "HAVING {}",
                self.having_expr.build(&mut params, &mut pending)
            ));
        }

        if !self.order_cols.is_empty() {
            let cols: Vec<String> = self.order_cols.iter().map(|c| quote_order_by(c)).collect();
            clauses.push(format!("ORDER BY {}", cols.join(", ")));
        }

        if let Some(n) = self.limit {
            clauses.push(format!("LIMIT {n}"));
        }
        if let Some(n) = self.offset {
            clauses.push(format!("OFFSET {n}"));
        }

        let assembled = clauses.join(" ");
        let (mut sql, consumed, mut build_error) =
            resolve_named_params(&assembled, &pending, &self.bound, &mut params);

        let mut extra = ParamList::new();
        for (name, value) in self.bound.iter() {
            if consumed.iter().any(|c| c == name) {
                continue;
            }
            if let Some(param) = value {
                extra.push_param(param.clone());
            }
        }

        if !self.unions.is_empty() {
            let mut combined = format!("({sql})");
            for (kind, sub) in &self.unions {
                let shifted = adjust_placeholders(&sub.sql, params.len());
                params.extend(&sub.params);
                extra.extend(&sub.extra);
                if build_error.is_none() {
                    build_error = sub.build_error.clone();
                }
                combined.push(' ');
                combined.push_str(kind.as_sql());
                combined.push_str(" (");
                combined.push_str(&shifted);
                combined.push(')');
            }
            sql = combined;
        }

        Query {
            sql,
            params,
            extra,
            build_error,
        }
    }

    fn exec_chain<'a>(&'a self, ctx: &'a QueryContext, innermost: ExecNext<'a>) -> ExecNext<'a> {
        let mut next = innermost;
        for hook in self.exec_hooks.iter().rev() {
            let hook: &'a dyn ExecHook = hook.as_ref();
            let inner = next;
            next = ExecNext::new(Box::new(move || hook.around(ctx, inner)));
        }
        next
    }

    fn one_chain<'a>(&'a self, ctx: &'a QueryContext, innermost: BindNext<'a>) -> BindNext<'a> {
        let mut next = innermost;
        for hook in self.one_hooks.iter().rev() {
            let hook: &'a dyn OneHook = hook.as_ref();
            let inner = next;
            next = BindNext::new(Box::new(move |target| hook.around(ctx, target, inner)));
        }
        next
    }

    fn all_chain<'a>(&'a self, ctx: &'a QueryContext, innermost: BindNext<'a>) -> BindNext<'a> {
        let mut next = innermost;
        for hook in self.all_hooks.iter().rev() {
            let hook: &'a dyn AllHook = hook.as_ref();
            let inner = next;
            next = BindNext::new(Box::new(move |target| hook.around(ctx, target, inner)));
        }
        next
    }

    /// Execute and return all rows, routed through the Exec hook chain.
    ///
    /// If an Exec hook short-circuits (returns `Ok` without invoking its
    /// downstream operation), the result is an empty vector.
    pub async fn rows(&self, client: &impl GenericClient) -> QbResult<Vec<Row>> {
        let query = self.build();
        query.validate()?;
        let ctx = QueryContext::new(query.sql(), query.params.len());
        let slot: Arc<Mutex<Option<Vec<Row>>>> = Arc::new(Mutex::new(None));

        {
            let query = &query;
            let slot = Arc::clone(&slot);
            let innermost = ExecNext::new(Box::new(move || {
                Box::pin(async move {
                    let rows = client.query(query.sql(), &query.exec_params()).await?;
                    *lock_slot(&slot)? = Some(rows);
                    Ok(())
                })
            }));
            self.exec_chain(&ctx, innermost).run().await?;
        }

        let taken = lock_slot(&slot)?.take();
        Ok(taken.unwrap_or_default())
    }

    /// Execute and return the first row, routed through the Exec hook chain.
    ///
    /// Returns [`QbError::NotFound`] when the statement ran and produced no
    /// rows. When an Exec hook short-circuits, the statement never ran and
    /// the call succeeds with `None`.
    pub async fn row(&self, client: &impl GenericClient) -> QbResult<Option<Row>> {
        let query = self.build();
        query.validate()?;
        let ctx = QueryContext::new(query.sql(), query.params.len());
        let slot: Arc<Mutex<Option<Row>>> = Arc::new(Mutex::new(None));

        {
            let query = &query;
            let slot = Arc::clone(&slot);
            let innermost = ExecNext::new(Box::new(move || {
                Box::pin(async move {
                    let row = client.query_one(query.sql(), &query.exec_params()).await?;
                    *lock_slot(&slot)? = Some(row);
                    Ok(())
                })
            }));
            self.exec_chain(&ctx, innermost).run().await?;
        }

        Ok(lock_slot(&slot)?.take())
    }

    /// Execute and collect the single selected column across all rows, in row
    /// order. Routed through the Exec hook chain only.
    ///
    /// Fails with [`QbError::InvalidDestination`] when a result row carries
    /// more than one column.
    pub async fn column<T>(&self, client: &impl GenericClient) -> QbResult<Vec<T>>
    where
        T: for<'r> FromSql<'r> + Send,
    {
        let query = self.build();
        query.validate()?;
        let ctx = QueryContext::new(query.sql(), query.params.len());
        let slot: Arc<Mutex<Option<Vec<T>>>> = Arc::new(Mutex::new(None));

        {
            let query = &query;
            let slot = Arc::clone(&slot);
            let innermost = ExecNext::new(Box::new(move || {
                Box::pin(async move {
                    let rows = client.query(query.sql(), &query.exec_params()).await?;
                    let mut values = Vec::with_capacity(rows.len());
                    for row in &rows {
                        values.push(scalar_from_row::<T>(row)?);
                    }
                    *lock_slot(&slot)? = Some(values);
                    Ok(())
                })
            }));
            self.exec_chain(&ctx, innermost).run().await?;
        }

        let taken = lock_slot(&slot)?.take();
        Ok(taken.unwrap_or_default())
    }

    /// Execute, fetch the first row and bind it into `dest`.
    ///
    /// The Exec hook chain wraps the entire One hook chain, which wraps the
    /// actual fetch-and-bind. Returns [`QbError::NotFound`] for an empty
    /// result set. If a hook short-circuits, `dest` is left untouched and
    /// the call succeeds.
    pub async fn one<T>(&self, client: &impl GenericClient, dest: &mut T) -> QbResult<()>
    where
        T: FromRow + Send + 'static,
    {
        let query = self.build();
        query.validate()?;
        let ctx = QueryContext::new(query.sql(), query.params.len());
        let slot: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        let target: BindTarget = Arc::clone(&slot) as BindTarget;

        {
            let query = &query;
            let innermost = BindNext::new(Box::new(move |target: BindTarget| {
                Box::pin(async move {
                    let row = client.query_one(query.sql(), &query.exec_params()).await?;
                    let value = T::from_row(&row)?;
                    let mut guard = lock_slot(&*target)?;
                    match guard.downcast_mut::<Option<T>>() {
                        Some(cell) => {
                            *cell = Some(value);
                            Ok(())
                        }
                        None => Err(QbError::invalid_destination(
                            "single-row bind target has an unexpected type",
                        )),
                    }
                })
            }));
            let bind_entry = self.one_chain(&ctx, innermost);
            let exec_innermost = ExecNext::new(Box::new(move || {
                Box::pin(async move { bind_entry.run(target).await })
            }));
            self.exec_chain(&ctx, exec_innermost).run().await?;
        }

        if let Some(value) = lock_slot(&slot)?.take() {
            *dest = value;
        }
        Ok(())
    }

    /// Execute, fetch all rows and bind one element per row, replacing the
    /// contents of `dest`.
    ///
    /// The Exec hook chain wraps the entire All hook chain. Zero rows leave
    /// `dest` empty and succeed. If a hook short-circuits, `dest` is left
    /// untouched and the call succeeds.
    pub async fn all<T>(&self, client: &impl GenericClient, dest: &mut Vec<T>) -> QbResult<()>
    where
        T: FromRow + Send + 'static,
    {
        let query = self.build();
        query.validate()?;
        let ctx = QueryContext::new(query.sql(), query.params.len());
        let slot: Arc<Mutex<Option<Vec<T>>>> = Arc::new(Mutex::new(None));
        let target: BindTarget = Arc::clone(&slot) as BindTarget;

        {
            let query = &query;
            let innermost = BindNext::new(Box::new(move |target: BindTarget| {
                Box::pin(async move {
                    let rows = client.query(query.sql(), &query.exec_params()).await?;
                    let mut values = Vec::with_capacity(rows.len());
                    for row in &rows {
                        values.push(T::from_row(row)?);
                    }
                    let mut guard = lock_slot(&*target)?;
                    match guard.downcast_mut::<Option<Vec<T>>>() {
                        Some(cell) => {
                            *cell = Some(values);
                            Ok(())
                        }
                        None => Err(QbError::invalid_destination(
                            "multi-row bind target has an unexpected type",
                        )),
                    }
                })
            }));
            let bind_entry = self.all_chain(&ctx, innermost);
            let exec_innermost = ExecNext::new(Box::new(move || {
                Box::pin(async move { bind_entry.run(target).await })
            }));
            self.exec_chain(&ctx, exec_innermost).run().await?;
        }

        if let Some(values) = lock_slot(&slot)?.take() {
            *dest = values;
        }
        Ok(())
    }

    /// Look up a single row by primary-key equality and bind it into `dest`.
    ///
    /// The key condition is AND-combined with any existing WHERE expression,
    /// and `T::TABLE` becomes the source table when `from` was never called.
    /// Fails with [`QbError::MissingPrimaryKey`] when `T` declares no key
    /// column and [`QbError::CompositePrimaryKey`] when it declares several;
    /// a missing row surfaces as [`QbError::NotFound`] from the One path.
    pub async fn model<T, K>(&self, client: &impl GenericClient, pk: K, dest: &mut T) -> QbResult<()>
    where
        T: Model + FromRow + Send + 'static,
        K: ToSql + Send + Sync + 'static,
    {
        match T::PRIMARY_KEY.len() {
            0 => return Err(QbError::MissingPrimaryKey(T::TABLE)),
            1 => {}
            columns => {
                return Err(QbError::CompositePrimaryKey {
                    model: T::TABLE,
                    columns,
                });
            }
        }

        let mut query = self.clone();
        if query.from_tables.is_empty() {
            query.from_tables.push(T::TABLE.to_string());
        }
        let condition = eq(T::PRIMARY_KEY[0], pk);
        query.where_expr = std::mem::take(&mut query.where_expr).and(condition);
        query.one(client, dest).await
    }
}

/// Entry point: a builder with the given select columns.
pub fn select<I, S>(cols: I) -> SelectQuery
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SelectQuery::new().select(cols)
}

/// Entry point: a builder sourced from a model's table.
pub fn select_for<T: Model>() -> SelectQuery {
    SelectQuery::new().from([T::TABLE])
}

fn lock_slot<T: ?Sized>(cell: &Mutex<T>) -> QbResult<MutexGuard<'_, T>> {
    cell.lock()
        .map_err(|_| QbError::invalid_destination("bind target lock poisoned"))
}

/// Resolve `:name` tokens against attached and bound named parameters.
///
/// Attached (raw-expression) parameters take precedence over statement-level
/// bound parameters. Each distinct name gets one `$n` placeholder, numbered
/// in first-appearance order after the clause-built placeholders; a NULL
/// marker substitutes the literal `NULL`. Tokens inside single-quoted
/// strings and `::` casts are left alone. Returns the rewritten SQL, the
/// bound names that were consumed, and the first unresolved name as an
/// error, if any.
fn resolve_named_params(
    sql: &str,
    pending: &Params,
    bound: &Params,
    params: &mut ParamList,
) -> (String, Vec<String>, Option<String>) {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut resolved: Vec<(String, String)> = Vec::new();
    let mut consumed: Vec<String> = Vec::new();
    let mut error = None;

    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            in_string = !in_string;
            out.push(c);
            i += 1;
            continue;
        }
        if in_string || c != ':' {
            out.push(c);
            i += 1;
            continue;
        }
        if i + 1 < chars.len() && chars[i + 1] == ':' {
            out.push_str("::");
            i += 2;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < chars.len() && (chars[end] == '_' || chars[end].is_ascii_alphanumeric()) {
            end += 1;
        }
        if end == start || chars[start].is_ascii_digit() {
            out.push(':');
            i += 1;
            continue;
        }

        let name: String = chars[start..end].iter().collect();
        if let Some((_, replacement)) = resolved.iter().find(|(n, _)| *n == name) {
            out.push_str(replacement);
            i = end;
            continue;
        }

        let value = match pending.get(&name) {
            Some(v) => Some(v),
            None => match bound.get(&name) {
                Some(v) => {
                    consumed.push(name.clone());
                    Some(v)
                }
                None => None,
            },
        };
        let replacement = match value {
            Some(Some(param)) => {
                let idx = params.push_param(param.clone());
                format!("${idx}")
            }
            Some(None) => "NULL".to_string(),
            None => {
                if error.is_none() {
                    error = Some(format!("unresolved named parameter :{name}"));
                }
                format!(":{name}")
            }
        };
        out.push_str(&replacement);
        resolved.push((name, replacement));
        i = end;
    }

    (out, consumed, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::BoxFuture;
    use crate::row::RowExt;

    #[derive(Default)]
    struct MockClient {
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl MockClient {
        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GenericClient for MockClient {
        async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QbResult<Vec<Row>> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.len()));
            Ok(Vec::new())
        }

        async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QbResult<u64> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.len()));
            Ok(0)
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct User {
        id: i64,
        email: String,
    }

    impl FromRow for User {
        fn from_row(row: &Row) -> QbResult<Self> {
            Ok(Self {
                id: row.try_get_column("id")?,
                email: row.try_get_column("email")?,
            })
        }
    }

    impl Model for User {
        const TABLE: &'static str = "user";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];
    }

    struct NoKey;

    impl FromRow for NoKey {
        fn from_row(_row: &Row) -> QbResult<Self> {
            Ok(NoKey)
        }
    }

    impl Model for NoKey {
        const TABLE: &'static str = "nokey";
        const PRIMARY_KEY: &'static [&'static str] = &[];
    }

    struct Membership;

    impl FromRow for Membership {
        fn from_row(_row: &Row) -> QbResult<Self> {
            Ok(Membership)
        }
    }

    impl Model for Membership {
        const TABLE: &'static str = "membership";
        const PRIMARY_KEY: &'static [&'static str] = &["user_id", "team_id"];
    }

    #[derive(Clone)]
    struct LogExecHook {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ExecHook for LogExecHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            next: ExecNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                let result = next.run().await;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                result
            })
        }
    }

    #[derive(Clone)]
    struct LogOneHook {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl OneHook for LogOneHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            target: BindTarget,
            next: BindNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                let result = next.run(target).await;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                result
            })
        }
    }

    struct SkipExecHook;

    impl ExecHook for SkipExecHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            _next: ExecNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move { Ok(()) })
        }
    }

    struct FailExecHook;

    impl ExecHook for FailExecHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            _next: ExecNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move { Err(QbError::Hook("boom".into())) })
        }
    }

    struct CaptureExecHook {
        sql: Arc<Mutex<Option<String>>>,
        param_count: Arc<Mutex<Option<usize>>>,
    }

    impl ExecHook for CaptureExecHook {
        fn around<'a>(
            &'a self,
            ctx: &'a QueryContext,
            next: ExecNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move {
                *self.sql.lock().unwrap() = Some(ctx.sql.clone());
                *self.param_count.lock().unwrap() = Some(ctx.param_count);
                next.run().await
            })
        }
    }

    #[derive(Clone)]
    struct LogAllHook {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl AllHook for LogAllHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            target: BindTarget,
            next: BindNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                let result = next.run(target).await;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                result
            })
        }
    }

    struct SkipAllHook;

    impl AllHook for SkipAllHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            _target: BindTarget,
            _next: BindNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move { Ok(()) })
        }
    }

    struct RedirectOneHook {
        substitute: Arc<Mutex<Option<User>>>,
    }

    impl OneHook for RedirectOneHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            _target: BindTarget,
            next: BindNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            let substitute: BindTarget = Arc::clone(&self.substitute) as BindTarget;
            Box::pin(async move { next.run(substitute).await })
        }
    }

    struct FulfillOneHook;

    impl OneHook for FulfillOneHook {
        fn around<'a>(
            &'a self,
            _ctx: &'a QueryContext,
            target: BindTarget,
            _next: BindNext<'a>,
        ) -> BoxFuture<'a, QbResult<()>> {
            Box::pin(async move {
                let mut guard = target.lock().unwrap();
                match guard.downcast_mut::<Option<User>>() {
                    Some(cell) => {
                        *cell = Some(User {
                            id: 7,
                            email: "seven@example.com".into(),
                        });
                        Ok(())
                    }
                    None => Err(QbError::invalid_destination("wrong target type")),
                }
            })
        }
    }

    #[test]
    fn minimal_query_renders_star() {
        let query = SelectQuery::new().from(["users"]).build();
        assert_eq!(query.sql(), "SELECT * FROM \"users\"");
        assert_eq!(query.param_count(), 0);
    }

    #[test]
    fn full_query_renders_all_clauses_in_order() {
        let query = SelectQuery::new()
            .select(["id", "name"])
            .and_select(["age"])
            .distinct(true)
            .select_option("CALC")
            .from(["users"])
            .inner_join("profile", Expr::raw("user.id = profile.id"))
            .left_join("team", Expr::None)
            .right_join("dept", Expr::None)
            .where_(Expr::raw("age > 30"))
            .and_where(eq("status", 1i32))
            .or_where(Expr::raw("type = 2"))
            .group_by(["id"])
            .and_group_by(["age"])
            .having(Expr::raw("id > 10"))
            .and_having(Expr::raw("id < 20"))
            .or_having(Expr::raw("type = 3"))
            .order_by(["age DESC"])
            .and_order_by(["type", "id"])
            .limit(10)
            .offset(20)
            .bind(Params::new().set("id", 1i32))
            .and_bind(Params::new().set("age", 30i32))
            .build();

        assert_eq!(
            query.sql(),
            "SELECT DISTINCT CALC \"id\", \"name\", \"age\" FROM \"users\" \
             INNER JOIN \"profile\" ON user.id = profile.id \
             LEFT JOIN \"team\" RIGHT JOIN \"dept\" \
             WHERE ((age > 30) AND (\"status\" = $1)) OR (type = 2) \
             GROUP BY \"id\", \"age\" \
             HAVING ((id > 10) AND (id < 20)) OR (type = 3) \
             ORDER BY \"age\" DESC, \"type\", \"id\" \
             LIMIT 10 OFFSET 20",
        );
        // one referenced placeholder plus two unreferenced bound values
        assert_eq!(query.param_count(), 3);
        assert_eq!(query.params().len(), 3);
        assert_eq!(query.exec_params().len(), 1);
    }

    #[test]
    fn and_select_equals_single_select() {
        let a = SelectQuery::new()
            .select(["id", "name"])
            .and_select(["age"])
            .from(["t"])
            .build();
        let b = SelectQuery::new()
            .select(["id", "name", "age"])
            .from(["t"])
            .build();
        assert_eq!(a.sql(), b.sql());
    }

    #[test]
    fn rendering_is_deterministic() {
        let builder = SelectQuery::new()
            .from(["users"])
            .where_(eq("status", 1i32))
            .and_where(Expr::hash(Params::new().set("b", 2i32).set("a", 3i32)))
            .bind(Params::new().set("x", 4i32));
        let first = builder.build();
        let second = builder.build();
        assert_eq!(first.sql(), second.sql());
        assert_eq!(first.param_count(), second.param_count());
    }

    #[test]
    fn where_replaces_and_combines() {
        let query = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw("a = 1"))
            .where_(Expr::raw("b = 2"))
            .build();
        assert_eq!(query.sql(), "SELECT * FROM \"t\" WHERE b = 2");

        let query = SelectQuery::new()
            .from(["t"])
            .and_where(Expr::raw("a = 1"))
            .build();
        assert_eq!(query.sql(), "SELECT * FROM \"t\" WHERE a = 1");
    }

    #[test]
    fn cross_join_has_no_on_clause() {
        let query = SelectQuery::new().from(["a"]).cross_join("b").build();
        assert_eq!(query.sql(), "SELECT * FROM \"a\" CROSS JOIN \"b\"");
    }

    #[test]
    fn join_on_contributes_parameters() {
        let query = SelectQuery::new()
            .from(["orders"])
            .inner_join("customer", eq("customer.archived", false))
            .where_(eq("total", 100i64))
            .build();
        assert_eq!(
            query.sql(),
            "SELECT * FROM \"orders\" \
             INNER JOIN \"customer\" ON \"customer\".\"archived\" = $1 \
             WHERE \"total\" = $2",
        );
        assert_eq!(query.param_count(), 2);
    }

    #[test]
    fn negative_limit_clears_clause() {
        let query = SelectQuery::new().from(["t"]).limit(10).limit(-1).build();
        assert_eq!(query.sql(), "SELECT * FROM \"t\"");

        let query = SelectQuery::new().from(["t"]).offset(5).offset(-3).build();
        assert_eq!(query.sql(), "SELECT * FROM \"t\"");
    }

    #[test]
    fn named_params_resolve_from_raw_attachment() {
        let query = SelectQuery::new()
            .from(["users"])
            .where_(Expr::raw_params(
                "age > :min AND age < :max",
                Params::new().set("min", 18i32).set("max", 65i32),
            ))
            .build();
        assert_eq!(
            query.sql(),
            "SELECT * FROM \"users\" WHERE age > $1 AND age < $2",
        );
        assert_eq!(query.param_count(), 2);
        assert_eq!(query.exec_params().len(), 2);
    }

    #[test]
    fn named_params_resolve_from_bound_set() {
        let query = SelectQuery::new()
            .from(["users"])
            .where_(Expr::raw("age > :min"))
            .bind(Params::new().set("min", 18i32).set("unused", 1i32))
            .build();
        assert_eq!(query.sql(), "SELECT * FROM \"users\" WHERE age > $1");
        // the consumed name moves into the referenced group, the unused one
        // stays in the trailing extras
        assert_eq!(query.exec_params().len(), 1);
        assert_eq!(query.param_count(), 2);
    }

    #[test]
    fn repeated_named_token_binds_once() {
        let query = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw_params(
                ":v = a OR :v = b",
                Params::new().set("v", 9i32),
            ))
            .build();
        assert_eq!(query.sql(), "SELECT * FROM \"t\" WHERE $1 = a OR $1 = b");
        assert_eq!(query.param_count(), 1);
    }

    #[test]
    fn null_marker_renders_literal_null() {
        let query = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw_params(
                "deleted_at IS NOT DISTINCT FROM :d",
                Params::new().set_null("d"),
            ))
            .build();
        assert_eq!(
            query.sql(),
            "SELECT * FROM \"t\" WHERE deleted_at IS NOT DISTINCT FROM NULL",
        );
        assert_eq!(query.param_count(), 0);
    }

    #[test]
    fn cast_and_string_literal_are_not_tokens() {
        let query = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw_params(
                "id::text = :v AND tag = ':v'",
                Params::new().set("v", "x"),
            ))
            .build();
        assert_eq!(
            query.sql(),
            "SELECT * FROM \"t\" WHERE id::text = $1 AND tag = ':v'",
        );
        assert_eq!(query.param_count(), 1);
    }

    #[test]
    fn unresolved_named_param_defers_error_to_execution() {
        let query = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw("a = :missing"))
            .build();
        assert!(query.build_error.is_some());
    }

    #[tokio::test]
    async fn unresolved_named_param_fails_execution() {
        let client = MockClient::default();
        let result = SelectQuery::new()
            .from(["t"])
            .where_(Expr::raw("a = :missing"))
            .rows(&client)
            .await;
        assert!(matches!(result, Err(QbError::Validation(_))));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn unions_parenthesize_in_append_order() {
        let base = SelectQuery::new().from(["a"]);
        let q2 = SelectQuery::new().from(["b"]).build();
        let q3 = SelectQuery::new().from(["c"]).build();
        let query = base.union(q2).union_all(q3).build();
        assert_eq!(
            query.sql(),
            "(SELECT * FROM \"a\") UNION (SELECT * FROM \"b\") UNION ALL (SELECT * FROM \"c\")",
        );
    }

    #[test]
    fn union_renumbers_sub_placeholders() {
        let sub = SelectQuery::new()
            .from(["b"])
            .where_(eq("y", 2i32))
            .build();
        let query = SelectQuery::new()
            .from(["a"])
            .where_(eq("x", 1i32))
            .union(sub)
            .build();
        assert_eq!(
            query.sql(),
            "(SELECT * FROM \"a\" WHERE \"x\" = $1) UNION (SELECT * FROM \"b\" WHERE \"y\" = $2)",
        );
        assert_eq!(query.param_count(), 2);
        assert_eq!(query.exec_params().len(), 2);
    }

    #[test]
    fn bind_replaces_and_bind_merges() {
        let query = SelectQuery::new()
            .from(["t"])
            .bind(Params::new().set("a", 1i32))
            .bind(Params::new().set("b", 2i32))
            .build();
        assert_eq!(query.param_count(), 1);

        let query = SelectQuery::new()
            .from(["t"])
            .bind(Params::new().set("a", 1i32))
            .and_bind(Params::new().set("a", 10i32).set("b", 2i32))
            .build();
        assert_eq!(query.param_count(), 2);
    }

    #[tokio::test]
    async fn rows_sends_only_referenced_params() {
        let client = MockClient::default();
        let rows = SelectQuery::new()
            .from(["users"])
            .where_(eq("status", 1i32))
            .bind(Params::new().set("unused", 5i32))
            .rows(&client)
            .await
            .unwrap();
        assert!(rows.is_empty());
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "SELECT * FROM \"users\" WHERE \"status\" = $1");
        assert_eq!(calls[0].1, 1);
    }

    #[tokio::test]
    async fn row_on_empty_result_is_not_found() {
        let client = MockClient::default();
        let result = SelectQuery::new().from(["users"]).row(&client).await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn column_on_empty_result_is_empty() {
        let client = MockClient::default();
        let values: Vec<i64> = SelectQuery::new()
            .select(["id"])
            .from(["users"])
            .column(&client)
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn all_on_empty_result_yields_empty_vec() {
        let client = MockClient::default();
        let mut users: Vec<User> = Vec::new();
        SelectQuery::new()
            .from(["user"])
            .all(&client, &mut users)
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn all_replaces_previous_contents() {
        let client = MockClient::default();
        let mut users = vec![User {
            id: 1,
            email: "stale@example.com".into(),
        }];
        SelectQuery::new()
            .from(["user"])
            .all(&client, &mut users)
            .await
            .unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn one_on_empty_result_is_not_found() {
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        let result = SelectQuery::new().from(["user"]).one(&client, &mut user).await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        assert_eq!(user.id, 0);
    }

    #[tokio::test]
    async fn exec_hooks_run_first_registered_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let client = MockClient::default();
        SelectQuery::new()
            .from(["t"])
            .with_exec_hook(LogExecHook {
                name: "a",
                log: Arc::clone(&log),
            })
            .with_exec_hook(LogExecHook {
                name: "b",
                log: Arc::clone(&log),
            })
            .rows(&client)
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:before", "b:before", "b:after", "a:after"],
        );
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn exec_chain_wraps_one_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        let result = SelectQuery::new()
            .from(["user"])
            .with_exec_hook(LogExecHook {
                name: "exec",
                log: Arc::clone(&log),
            })
            .with_one_hook(LogOneHook {
                name: "one",
                log: Arc::clone(&log),
            })
            .one(&client, &mut user)
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["exec:before", "one:before", "one:after", "exec:after"],
        );
    }

    #[tokio::test]
    async fn short_circuiting_exec_hook_skips_execution() {
        let client = MockClient::default();
        let rows = SelectQuery::new()
            .from(["t"])
            .with_exec_hook(SkipExecHook)
            .rows(&client)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn short_circuiting_exec_hook_yields_no_row_without_error() {
        let client = MockClient::default();
        let row = SelectQuery::new()
            .from(["t"])
            .with_exec_hook(SkipExecHook)
            .row(&client)
            .await
            .unwrap();
        assert!(row.is_none());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn short_circuiting_exec_hook_leaves_dest_untouched() {
        let client = MockClient::default();
        let mut user = User {
            id: 42,
            email: "keep@example.com".into(),
        };
        SelectQuery::new()
            .from(["user"])
            .with_exec_hook(SkipExecHook)
            .one(&client, &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 42);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn hook_error_propagates_unchanged() {
        let client = MockClient::default();
        let result = SelectQuery::new()
            .from(["t"])
            .with_exec_hook(FailExecHook)
            .rows(&client)
            .await;
        assert!(matches!(result, Err(QbError::Hook(ref msg)) if msg == "boom"));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn exec_chain_wraps_all_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let client = MockClient::default();
        let mut users: Vec<User> = Vec::new();
        SelectQuery::new()
            .from(["user"])
            .with_exec_hook(LogExecHook {
                name: "exec",
                log: Arc::clone(&log),
            })
            .with_all_hook(LogAllHook {
                name: "all",
                log: Arc::clone(&log),
            })
            .all(&client, &mut users)
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["exec:before", "all:before", "all:after", "exec:after"],
        );
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn short_circuiting_all_hook_leaves_dest_untouched() {
        let client = MockClient::default();
        let mut users = vec![User {
            id: 1,
            email: "keep@example.com".into(),
        }];
        SelectQuery::new()
            .from(["user"])
            .with_all_hook(SkipAllHook)
            .all(&client, &mut users)
            .await
            .unwrap();
        assert_eq!(users.len(), 1);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn one_hook_can_substitute_the_bind_target() {
        let substitute: Arc<Mutex<Option<User>>> = Arc::new(Mutex::new(None));
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        SelectQuery::new()
            .from(["user"])
            .with_one_hook(RedirectOneHook {
                substitute: Arc::clone(&substitute),
            })
            .with_one_hook(FulfillOneHook)
            .one(&client, &mut user)
            .await
            .unwrap();
        // the downstream bind landed in the substitute, not the caller's dest
        assert_eq!(user.id, 0);
        assert_eq!(
            substitute.lock().unwrap().as_ref().map(|u| u.id),
            Some(7),
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn one_hook_can_fulfill_the_bind_itself() {
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        SelectQuery::new()
            .from(["user"])
            .with_one_hook(FulfillOneHook)
            .one(&client, &mut user)
            .await
            .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, "seven@example.com");
        // the bind never reached the client
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn model_builds_primary_key_lookup() {
        let sql = Arc::new(Mutex::new(None));
        let param_count = Arc::new(Mutex::new(None));
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        let result = SelectQuery::new()
            .with_exec_hook(CaptureExecHook {
                sql: Arc::clone(&sql),
                param_count: Arc::clone(&param_count),
            })
            .model(&client, 5i64, &mut user)
            .await;
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        assert_eq!(
            sql.lock().unwrap().as_deref(),
            Some("SELECT * FROM \"user\" WHERE \"id\" = $1"),
        );
        assert_eq!(*param_count.lock().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn model_ands_with_existing_where() {
        let sql = Arc::new(Mutex::new(None));
        let client = MockClient::default();
        let mut user = User {
            id: 0,
            email: String::new(),
        };
        let _ = SelectQuery::new()
            .where_(Expr::raw("status = 1"))
            .with_exec_hook(CaptureExecHook {
                sql: Arc::clone(&sql),
                param_count: Arc::new(Mutex::new(None)),
            })
            .model(&client, 5i64, &mut user)
            .await;
        assert_eq!(
            sql.lock().unwrap().as_deref(),
            Some("SELECT * FROM \"user\" WHERE (status = 1) AND (\"id\" = $1)"),
        );
    }

    #[tokio::test]
    async fn model_without_primary_key_fails() {
        let client = MockClient::default();
        let mut value = NoKey;
        let result = SelectQuery::new().model(&client, 1i64, &mut value).await;
        assert!(matches!(result, Err(QbError::MissingPrimaryKey("nokey"))));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn model_with_composite_primary_key_fails() {
        let client = MockClient::default();
        let mut value = Membership;
        let result = SelectQuery::new().model(&client, 1i64, &mut value).await;
        assert!(matches!(
            result,
            Err(QbError::CompositePrimaryKey {
                model: "membership",
                columns: 2,
            }),
        ));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn select_for_defaults_the_table() {
        let query = select_for::<User>().build();
        assert_eq!(query.sql(), "SELECT * FROM \"user\"");
    }

    #[test]
    fn cloned_builder_diverges_independently() {
        let base = SelectQuery::new().from(["t"]).where_(Expr::raw("a = 1"));
        let widened = base.clone().or_where(Expr::raw("b = 2"));
        assert_eq!(base.build().sql(), "SELECT * FROM \"t\" WHERE a = 1");
        assert_eq!(
            widened.build().sql(),
            "SELECT * FROM \"t\" WHERE (a = 1) OR (b = 2)",
        );
    }
}
