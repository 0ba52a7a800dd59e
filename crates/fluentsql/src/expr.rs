//! Predicate tree for WHERE clauses.
//!
//! [`Expr`] supports AND/OR/NOT grouping, the usual comparison operators,
//! template fragments with `?` holes, and raw SQL. Rendering walks the tree
//! once, wrapping column names through the dialect and emitting placeholders
//! through the render-scoped [`Binder`], so placeholder keys always follow
//! output order.

use crate::dialect::DbType;
use crate::param::{Binder, Param};
use tokio_postgres::types::ToSql;

/// Expression node for building WHERE clauses.
#[derive(Clone, Debug)]
pub enum Expr {
    /// AND group: all conditions must be true.
    And(Vec<Expr>),

    /// OR group: at least one condition must be true.
    Or(Vec<Expr>),

    /// NOT: negate the inner expression.
    Not(Box<Expr>),

    /// Simple comparison: column op <placeholder>
    Compare {
        column: String,
        op: &'static str,
        value: Param,
    },

    /// NULL check: column IS NULL or column IS NOT NULL
    NullCheck { column: String, is_null: bool },

    /// IN list: column IN (...) or column NOT IN (...)
    InList {
        column: String,
        values: Vec<Param>,
        negated: bool,
    },

    /// BETWEEN: column BETWEEN a AND b
    Between {
        column: String,
        from: Param,
        to: Param,
        negated: bool,
    },

    /// Free-form fragment with `?` holes bound left to right.
    /// Example: `Template { sql: "a = ? OR b = ?", params: [1, 2] }`
    Template { sql: String, params: Vec<Param> },

    /// Raw SQL fragment without parameters.
    Raw(String),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

impl Expr {
    /// Create an AND expression from a list of expressions.
    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    /// Create an OR expression from a list of expressions.
    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// Create a NOT expression.
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    fn compare<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        op: &'static str,
        value: T,
    ) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: Param::new(value),
        }
    }

    /// column = value
    pub fn eq<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, "=", value)
    }

    /// column != value
    pub fn ne<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, "!=", value)
    }

    /// column > value
    pub fn gt<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, ">", value)
    }

    /// column >= value
    pub fn gte<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, ">=", value)
    }

    /// column < value
    pub fn lt<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, "<", value)
    }

    /// column <= value
    pub fn lte<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, "<=", value)
    }

    /// column LIKE pattern
    pub fn like<T: ToSql + Send + Sync + 'static>(column: impl Into<String>, pattern: T) -> Self {
        Self::compare(column, "LIKE", pattern)
    }

    /// column NOT LIKE pattern
    pub fn not_like<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        pattern: T,
    ) -> Self {
        Self::compare(column, "NOT LIKE", pattern)
    }

    /// column IS NULL
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: true,
        }
    }

    /// column IS NOT NULL
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::NullCheck {
            column: column.into(),
            is_null: false,
        }
    }

    /// column IN (values...). An empty list folds to always-false.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: false,
        }
    }

    /// column NOT IN (values...). An empty list folds to always-true.
    pub fn not_in<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: true,
        }
    }

    /// column BETWEEN from AND to
    pub fn between<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        from: T,
        to: T,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated: false,
        }
    }

    /// column NOT BETWEEN from AND to
    pub fn not_between<T: ToSql + Send + Sync + 'static>(
        column: impl Into<String>,
        from: T,
        to: T,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated: true,
        }
    }

    /// Create a template expression with `?` holes.
    pub fn template<T: ToSql + Send + Sync + 'static>(
        sql: impl Into<String>,
        values: Vec<T>,
    ) -> Self {
        Expr::Template {
            sql: sql.into(),
            params: values.into_iter().map(Param::new).collect(),
        }
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Check if this expression contains no conditions.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => {
                exprs.is_empty() || exprs.iter().all(|e| e.is_empty())
            }
            Expr::Not(inner) => inner.is_empty(),
            _ => false,
        }
    }

    /// Collect the columns this expression references, for the
    /// optimistic-lock condition check. Raw and template fragments are
    /// opaque and contribute nothing.
    pub fn columns_into(&self, out: &mut Vec<String>) {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.columns_into(out);
                }
            }
            Expr::Not(inner) => inner.columns_into(out),
            Expr::Compare { column, .. }
            | Expr::NullCheck { column, .. }
            | Expr::InList { column, .. }
            | Expr::Between { column, .. } => out.push(column.clone()),
            Expr::Template { .. } | Expr::Raw(_) | Expr::True | Expr::False => {}
        }
    }

    /// Render the SQL fragment, emitting placeholders through `binder`.
    pub fn render(&self, db: DbType, binder: &mut Binder) -> String {
        match self {
            Expr::And(exprs) => {
                let parts: Vec<String> = exprs
                    .iter()
                    .filter(|e| !e.is_empty())
                    .map(|e| {
                        let sql = e.render(db, binder);
                        if matches!(e, Expr::Or(_)) && !sql.is_empty() {
                            format!("({sql})")
                        } else {
                            sql
                        }
                    })
                    .filter(|s| !s.is_empty())
                    .collect();
                parts.join(" AND ")
            }
            Expr::Or(exprs) => {
                let parts: Vec<String> = exprs
                    .iter()
                    .filter(|e| !e.is_empty())
                    .map(|e| {
                        let sql = e.render(db, binder);
                        if matches!(e, Expr::And(_)) && !sql.is_empty() {
                            format!("({sql})")
                        } else {
                            sql
                        }
                    })
                    .filter(|s| !s.is_empty())
                    .collect();
                parts.join(" OR ")
            }
            Expr::Not(inner) => {
                let sql = inner.render(db, binder);
                if sql.is_empty() {
                    String::new()
                } else {
                    format!("NOT ({sql})")
                }
            }
            Expr::Compare { column, op, value } => {
                let ph = binder.bind(value.clone());
                format!("{} {} {}", db.wrap(column), op, ph)
            }
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{} IS NULL", db.wrap(column))
                } else {
                    format!("{} IS NOT NULL", db.wrap(column))
                }
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let placeholders: Vec<String> =
                    values.iter().map(|v| binder.bind(v.clone())).collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", db.wrap(column), op, placeholders.join(", "))
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let a = binder.bind(from.clone());
                let b = binder.bind(to.clone());
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {} {} AND {}", db.wrap(column), op, a, b)
            }
            Expr::Template { sql, params } => {
                // Replace each `?` hole with a bound placeholder; extra holes
                // are left as-is.
                let mut result = String::with_capacity(sql.len());
                let mut hole = 0;
                for ch in sql.chars() {
                    if ch == '?' && hole < params.len() {
                        result.push_str(&binder.bind(params[hole].clone()));
                        hole += 1;
                    } else {
                        result.push(ch);
                    }
                }
                result
            }
            Expr::Raw(sql) => sql.clone(),
            Expr::True => "1=1".to_string(),
            Expr::False => "1=0".to_string(),
        }
    }
}

/// Incremental builder for an AND-joined condition set.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    /// Create a new empty expression group.
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    /// Check if the group is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty() || self.exprs.iter().all(|e| e.is_empty())
    }

    /// Add an expression to be ANDed.
    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// All expressions in insertion order.
    pub fn exprs(&self) -> &[Expr] {
        &self.exprs
    }

    /// Columns referenced anywhere in the group.
    pub fn columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        for e in &self.exprs {
            e.columns_into(&mut out);
        }
        out
    }

    /// Render the WHERE content (without the `WHERE` keyword).
    pub fn render(&self, db: DbType, binder: &mut Binder) -> String {
        if self.exprs.is_empty() {
            return String::new();
        }
        Expr::And(self.exprs.clone()).render(db, binder)
    }
}
