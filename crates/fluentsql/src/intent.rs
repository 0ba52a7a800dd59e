//! Statement intent: the per-call description of what to render.
//!
//! A [`StatementIntent`] is a pure data holder with no SQL knowledge. It is
//! created per invocation, handed to the [`SqlProvider`](crate::SqlProvider)
//! for one render, and discarded; nothing in it is shared across calls.

use crate::expr::{Expr, ExprGroup};
use crate::param::Param;
use tokio_postgres::types::ToSql;

/// An update assignment's right-hand side.
#[derive(Clone, Debug)]
pub enum SetValue {
    /// Parameterized value
    Value(Param),
    /// Raw SQL expression
    Raw(String),
}

/// Requested page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paged {
    pub offset: usize,
    pub limit: usize,
}

/// One statement's intent: predicates, grouping/ordering, pagination, update
/// assignments, an optional raw SQL override, and the lock-ignoring flag.
#[derive(Clone, Debug, Default)]
pub struct StatementIntent {
    table: Option<String>,
    wheres: ExprGroup,
    group_by: Vec<String>,
    order_by: Vec<String>,
    paged: Option<Paged>,
    updates: Vec<(String, SetValue)>,
    customized_sql: Option<String>,
    ignore_lock_version: bool,
}

impl StatementIntent {
    /// Create an empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the static table name, e.g. for a sharded query.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    // ==================== WHERE conditions ====================

    /// Add a custom expression.
    pub fn and_expr(mut self, expr: Expr) -> Self {
        self.wheres.push(expr);
        self
    }

    /// Add WHERE: column = value
    pub fn eq<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::eq(column, value));
        self
    }

    /// Add WHERE: column != value
    pub fn ne<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::ne(column, value));
        self
    }

    /// Add WHERE: column > value
    pub fn gt<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::gt(column, value));
        self
    }

    /// Add WHERE: column >= value
    pub fn gte<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::gte(column, value));
        self
    }

    /// Add WHERE: column < value
    pub fn lt<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::lt(column, value));
        self
    }

    /// Add WHERE: column <= value
    pub fn lte<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.wheres.push(Expr::lte(column, value));
        self
    }

    /// Add WHERE: column LIKE pattern
    pub fn like<T: ToSql + Send + Sync + 'static>(mut self, column: &str, pattern: T) -> Self {
        self.wheres.push(Expr::like(column, pattern));
        self
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: &str,
        values: Vec<T>,
    ) -> Self {
        self.wheres.push(Expr::in_list(column, values));
        self
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(mut self, column: &str) -> Self {
        self.wheres.push(Expr::is_null(column));
        self
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(mut self, column: &str) -> Self {
        self.wheres.push(Expr::is_not_null(column));
        self
    }

    /// Add a free-form condition with `?` holes, e.g. `apply("user_name=?", v)`.
    pub fn apply<T: ToSql + Send + Sync + 'static>(mut self, sql: &str, values: Vec<T>) -> Self {
        self.wheres.push(Expr::template(sql, values));
        self
    }

    /// Add a raw WHERE condition.
    pub fn raw(mut self, sql: &str) -> Self {
        self.wheres.push(Expr::raw(sql));
        self
    }

    // ==================== GROUP / ORDER / LIMIT ====================

    /// Add a GROUP BY column.
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    /// Add an ORDER BY item, e.g. `"created_at DESC"`.
    pub fn order_by(mut self, item: &str) -> Self {
        self.order_by.push(item.to_string());
        self
    }

    /// Request the first `limit` rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.paged = Some(Paged { offset: 0, limit });
        self
    }

    /// Request a page window.
    pub fn paged(mut self, offset: usize, limit: usize) -> Self {
        self.paged = Some(Paged { offset, limit });
        self
    }

    // ==================== UPDATE assignments ====================

    /// Set a column value. Insertion order is preserved in the rendered SET
    /// clause.
    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: &str, value: T) -> Self {
        self.updates
            .push((column.to_string(), SetValue::Value(Param::new(value))));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.set(column, v)
        } else {
            self
        }
    }

    /// Set a JSON column.
    pub fn set_json<T: serde::Serialize>(self, column: &str, value: &T) -> serde_json::Result<Self> {
        let json_val = serde_json::to_value(value)?;
        Ok(self.set(column, json_val))
    }

    /// Set a raw SQL expression, e.g. `set_raw("version", "version + 1")`.
    pub fn set_raw(mut self, column: &str, expr: &str) -> Self {
        self.updates
            .push((column.to_string(), SetValue::Raw(expr.to_string())));
        self
    }

    // ==================== Overrides ====================

    /// Supply a complete hand-written SQL string. When present it is
    /// returned verbatim by the orchestrator and all other rendering is
    /// bypassed.
    pub fn customized_sql(mut self, sql: impl Into<String>) -> Self {
        self.customized_sql = Some(sql.into());
        self
    }

    /// Skip the optimistic-lock condition check and drop the lock-version
    /// update default.
    pub fn ignore_lock_version(mut self, ignore: bool) -> Self {
        self.ignore_lock_version = ignore;
        self
    }

    // ==================== Accessors ====================

    /// Table name override, if any.
    pub fn table_override(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The customized raw SQL override, if present.
    pub fn customized(&self) -> Option<&str> {
        self.customized_sql.as_deref()
    }

    /// Whether the lock-version check is suppressed.
    pub fn ignores_lock_version(&self) -> bool {
        self.ignore_lock_version
    }

    /// The predicate tree.
    pub fn wheres(&self) -> &ExprGroup {
        &self.wheres
    }

    /// Columns referenced by the WHERE predicates.
    pub fn where_columns(&self) -> Vec<String> {
        self.wheres.columns()
    }

    /// Whether no predicates were supplied.
    pub fn is_where_empty(&self) -> bool {
        self.wheres.is_empty()
    }

    /// GROUP BY columns.
    pub fn group_by_items(&self) -> &[String] {
        &self.group_by
    }

    /// ORDER BY items.
    pub fn order_by_items(&self) -> &[String] {
        &self.order_by
    }

    /// Requested page window, if any.
    pub fn page(&self) -> Option<Paged> {
        self.paged
    }

    /// Update assignments in insertion order.
    pub fn updates(&self) -> &[(String, SetValue)] {
        &self.updates
    }

    /// Whether any update assignment was supplied.
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}
