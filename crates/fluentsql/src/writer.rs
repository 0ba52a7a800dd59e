//! Append-only SQL text accumulator.
//!
//! One method per clause, called by the orchestrator in a fixed order.
//! Every method is a no-op when its input is empty, so a missing clause
//! simply never appears. [`SqlWriter::finish`] renders the accumulated text
//! once.

use crate::dialect::DbType;

/// Clause-by-clause SQL string builder.
#[derive(Debug, Default)]
pub struct SqlWriter {
    buf: String,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(128),
        }
    }

    /// Separate the next clause from the previous one with a single space.
    fn space(&mut self) {
        if !self.buf.is_empty() && !self.buf.ends_with(' ') {
            self.buf.push(' ');
        }
    }

    /// Append verbatim text.
    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// `INSERT INTO <table>`
    pub fn insert_into(&mut self, table: &str) {
        self.space();
        self.buf.push_str("INSERT INTO ");
        self.buf.push_str(table);
    }

    /// `(<col1>, <col2>, ...)` with dialect quoting.
    pub fn insert_columns(&mut self, db: DbType, columns: &[&str]) {
        if columns.is_empty() {
            return;
        }
        self.space();
        self.buf.push('(');
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                self.buf.push_str(", ");
            }
            self.buf.push_str(&db.wrap(col));
        }
        self.buf.push(')');
    }

    /// `VALUES`
    pub fn values(&mut self) {
        self.space();
        self.buf.push_str("VALUES");
    }

    /// One value group: `(<v1>, <v2>, ...)`
    pub fn insert_values(&mut self, values: &[String]) {
        self.space();
        self.buf.push('(');
        self.buf.push_str(&values.join(", "));
        self.buf.push(')');
    }

    /// `SELECT <columns> FROM <table>`
    pub fn select(&mut self, table: &str, columns: &str) {
        self.space();
        self.buf.push_str("SELECT ");
        self.buf.push_str(columns);
        self.buf.push_str(" FROM ");
        self.buf.push_str(table);
    }

    /// `SELECT COUNT(*) FROM <table>`
    pub fn count(&mut self, table: &str) {
        self.select(table, "COUNT(*)");
    }

    /// `UPDATE <table>`
    pub fn update(&mut self, table: &str) {
        self.space();
        self.buf.push_str("UPDATE ");
        self.buf.push_str(table);
    }

    /// `SET <a1>, <a2>, ...`
    pub fn set(&mut self, assigns: &[String]) {
        if assigns.is_empty() {
            return;
        }
        self.space();
        self.buf.push_str("SET ");
        self.buf.push_str(&assigns.join(", "));
    }

    /// `DELETE FROM <table>`
    pub fn delete_from(&mut self, table: &str) {
        self.space();
        self.buf.push_str("DELETE FROM ");
        self.buf.push_str(table);
    }

    /// `WHERE <condition>`; no-op on an empty condition.
    pub fn where_clause(&mut self, condition: &str) {
        if condition.is_empty() {
            return;
        }
        self.space();
        self.buf.push_str("WHERE ");
        self.buf.push_str(condition);
    }

    /// `WHERE <c1> AND <c2> ...`; no-op on an empty list.
    pub fn where_all(&mut self, conditions: &[String]) {
        if conditions.is_empty() {
            return;
        }
        self.space();
        self.buf.push_str("WHERE ");
        self.buf.push_str(&conditions.join(" AND "));
    }

    /// Primary-key membership: `WHERE <col> = <ph>` for one placeholder,
    /// `WHERE <col> IN (<ph1>, ...)` for several.
    pub fn where_pk_in(&mut self, column: &str, placeholders: &[String]) {
        self.space();
        self.buf.push_str("WHERE ");
        self.buf.push_str(column);
        if placeholders.len() == 1 {
            self.buf.push_str(" = ");
            self.buf.push_str(&placeholders[0]);
        } else {
            self.buf.push_str(" IN (");
            self.buf.push_str(&placeholders.join(", "));
            self.buf.push(')');
        }
    }

    /// `GROUP BY <c1>, <c2>`; no-op on an empty list.
    pub fn group_by(&mut self, columns: &[String]) {
        if columns.is_empty() {
            return;
        }
        self.space();
        self.buf.push_str("GROUP BY ");
        self.buf.push_str(&columns.join(", "));
    }

    /// `ORDER BY <i1>, <i2>`; no-op on an empty list.
    pub fn order_by(&mut self, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.space();
        self.buf.push_str("ORDER BY ");
        self.buf.push_str(&items.join(", "));
    }

    /// `LIMIT <n>` (only valid where the dialect allows it on the statement
    /// kind; the orchestrator gates that).
    pub fn limit(&mut self, limit: usize) {
        self.space();
        self.buf.push_str("LIMIT ");
        self.buf.push_str(&limit.to_string());
    }

    /// Render the accumulated text.
    pub fn finish(self) -> String {
        self.buf
    }
}
