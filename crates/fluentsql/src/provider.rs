//! Statement orchestrator.
//!
//! [`SqlProvider`] is the entry point per statement kind. Each operation is
//! a pure function of (metadata, intent, entities) -> [`Rendered`]: it
//! validates its inputs, resolves the effective table name, applies the
//! logical-delete and optimistic-lock policies, and drives the
//! [`SqlWriter`] clause by clause.

use crate::dialect::DbType;
use crate::error::{SqlError, SqlResult};
use crate::intent::{SetValue, StatementIntent};
use crate::meta::{DeleteMarker, Entity, FieldRole, TableMapping};
use crate::param::{Binder, Param, ParamStyle, Rendered};
use crate::writer::SqlWriter;

/// Millisecond clock used for timestamp logical-delete markers.
pub type Clock = fn() -> i64;

fn default_clock() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Renders statements for one entity type against one dialect.
///
/// The provider borrows its mapping read-only and holds no mutable state, so
/// a single instance may serve arbitrarily many concurrent renders.
#[derive(Clone, Debug)]
pub struct SqlProvider<'a> {
    mapping: &'a TableMapping,
    db: DbType,
    style: ParamStyle,
    clock: Clock,
}

impl<'a> SqlProvider<'a> {
    pub fn new(mapping: &'a TableMapping, db: DbType) -> Self {
        Self {
            mapping,
            db,
            style: ParamStyle::default(),
            clock: default_clock,
        }
    }

    /// Choose the placeholder convention for rendered statements.
    pub fn param_style(mut self, style: ParamStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the wall clock, for deterministic timestamp markers.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // ==================== INSERT ====================

    /// Insert one entity whose primary key is unset.
    pub fn insert(&self, entity: &dyn Entity) -> SqlResult<Rendered> {
        self.build_insert(entity, false)
    }

    /// Insert one entity whose primary key is already set.
    pub fn insert_with_pk(&self, entity: &dyn Entity) -> SqlResult<Rendered> {
        self.build_insert(entity, true)
    }

    fn build_insert(&self, entity: &dyn Entity, with_pk: bool) -> SqlResult<Rendered> {
        self.validate_insert_entity(entity, with_pk)?;
        let table = self.entity_table(entity);
        let fields = self.mapping.insert_fields(with_pk);
        let columns: Vec<&str> = fields.iter().map(|f| f.column.as_str()).collect();

        let mut binder = Binder::new(self.style);
        let values: Vec<String> = fields
            .iter()
            .map(|f| {
                binder.placeholder(format!("entity.{}", f.property), entity.value(&f.property))
            })
            .collect();

        let mut sql = SqlWriter::new();
        sql.insert_into(&table);
        sql.insert_columns(self.db, &columns);
        sql.values();
        sql.insert_values(&values);
        Ok(self.finish(sql, binder))
    }

    /// Insert a batch of entities as one multi-row VALUES statement.
    ///
    /// All rows share one resolved table name, taken from the first row's
    /// override and falling back to the static mapping.
    pub fn insert_batch(&self, entities: &[&dyn Entity], with_pk: bool) -> SqlResult<Rendered> {
        if entities.is_empty() {
            return Err(SqlError::validation("insert batch cannot be empty"));
        }
        for entity in entities {
            self.validate_insert_entity(*entity, with_pk)?;
        }
        let table = self.entity_table(entities[0]);
        let fields = self.mapping.insert_fields(with_pk);
        let columns: Vec<&str> = fields.iter().map(|f| f.column.as_str()).collect();

        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        sql.insert_into(&table);
        sql.insert_columns(self.db, &columns);
        sql.values();
        for (index, entity) in entities.iter().enumerate() {
            if index > 0 {
                sql.append(",");
            }
            let values: Vec<String> = fields
                .iter()
                .map(|f| {
                    binder.placeholder(
                        format!("list[{index}].{}", f.property),
                        entity.value(&f.property),
                    )
                })
                .collect();
            sql.insert_values(&values);
        }
        Ok(self.finish(sql, binder))
    }

    /// `INSERT INTO ... (columns) SELECT columns FROM ...` driven by a query
    /// intent.
    pub fn insert_select(
        &self,
        columns: &[&str],
        query: &StatementIntent,
    ) -> SqlResult<Rendered> {
        if columns.is_empty() {
            return Err(SqlError::validation(
                "insert-select requires a non-empty column list",
            ));
        }
        let table = self.intent_table(query);
        let select_list = columns
            .iter()
            .map(|c| self.db.wrap(c))
            .collect::<Vec<_>>()
            .join(", ");

        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        sql.insert_into(table);
        sql.append(&format!(" ({select_list})"));
        sql.select(table, &select_list);
        self.where_group_order_by(&mut sql, query, &mut binder);
        Ok(self.finish(sql, binder))
    }

    // ==================== SELECT ====================

    /// Look up one row by primary key.
    pub fn find_by_id(&self, id: Param) -> SqlResult<Rendered> {
        let pk = self.mapping.primary_required()?;
        let mut binder = Binder::new(self.style);
        let ph = binder.placeholder("value", Some(id));
        let mut sql = SqlWriter::new();
        sql.select(self.mapping.table(), &self.select_list());
        sql.where_clause(&format!("{} = {}", self.db.wrap(&pk.column), ph));
        Ok(self.finish(sql, binder))
    }

    /// List rows whose primary key is in `ids`.
    pub fn list_by_ids(&self, ids: &[Param]) -> SqlResult<Rendered> {
        let (placeholders, binder) = self.id_placeholders(ids)?;
        let pk = self.mapping.primary_required()?;
        let mut sql = SqlWriter::new();
        sql.select(self.mapping.table(), &self.select_list());
        sql.where_pk_in(&self.db.wrap(&pk.column), &placeholders);
        Ok(self.finish(sql, binder))
    }

    /// List rows matching every (column, value) pair, in caller order.
    pub fn list_by_map(&self, conditions: &[(&str, Param)]) -> SqlResult<Rendered> {
        let (wheres, binder) = self.map_conditions(conditions)?;
        let mut sql = SqlWriter::new();
        sql.select(self.mapping.table(), &self.select_list());
        sql.where_all(&wheres);
        Ok(self.finish(sql, binder))
    }

    /// List rows matching a statement intent.
    pub fn list(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        self.query(intent)
    }

    /// Find a single row matching a statement intent. Renders the same text
    /// as [`list`](Self::list); row-count policy belongs to the execution
    /// layer.
    pub fn find_one(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        self.query(intent)
    }

    fn query(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        if let Some(custom) = intent.customized() {
            return Ok(self.verbatim(custom));
        }
        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        sql.select(self.intent_table(intent), &self.select_list());
        self.where_group_order_by(&mut sql, intent, &mut binder);
        let text = self.apply_page(sql.finish(), intent);
        Ok(self.finish_text(text, binder))
    }

    /// Count rows matching a statement intent, honoring its page window.
    pub fn count(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        if let Some(custom) = intent.customized() {
            return Ok(self.verbatim(custom));
        }
        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        sql.count(self.intent_table(intent));
        self.where_group_order_by(&mut sql, intent, &mut binder);
        let text = self.apply_page(sql.finish(), intent);
        Ok(self.finish_text(text, binder))
    }

    /// Count rows matching a statement intent, ignoring ORDER BY and any
    /// page window the intent carries.
    pub fn count_no_limit(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        if let Some(custom) = intent.customized() {
            return Ok(self.verbatim(custom));
        }
        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        sql.count(self.intent_table(intent));
        let wheres = intent.wheres().render(self.db, &mut binder);
        sql.where_clause(&wheres);
        sql.group_by(intent.group_by_items());
        Ok(self.finish(sql, binder))
    }

    // ==================== DELETE ====================

    /// Physically delete rows matching a statement intent.
    pub fn delete(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        self.build_delete(intent, false)
    }

    /// Logically delete rows matching a statement intent by setting the
    /// logic-delete marker.
    pub fn logic_delete(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        self.build_delete(intent, true)
    }

    fn build_delete(&self, intent: &StatementIntent, logic: bool) -> SqlResult<Rendered> {
        if let Some(custom) = intent.customized() {
            return Ok(self.verbatim(custom));
        }
        if intent.is_where_empty() {
            return Err(SqlError::validation(
                "refusing to render an unconditioned delete; supply at least one predicate",
            ));
        }
        let mut binder = Binder::new(self.style);
        let mut sql = SqlWriter::new();
        if logic {
            self.logic_delete_set(&mut sql, self.intent_table(intent))?;
        } else {
            sql.delete_from(self.intent_table(intent));
        }
        self.where_group_order_by(&mut sql, intent, &mut binder);
        Ok(self.finish(sql, binder))
    }

    /// Physically delete rows by primary key list.
    pub fn delete_by_ids(&self, ids: &[Param]) -> SqlResult<Rendered> {
        let (placeholders, binder) = self.id_placeholders(ids)?;
        let pk = self.mapping.primary_required()?;
        let mut sql = SqlWriter::new();
        sql.delete_from(self.mapping.table());
        sql.where_pk_in(&self.db.wrap(&pk.column), &placeholders);
        Ok(self.finish(sql, binder))
    }

    /// Logically delete rows by primary key list.
    pub fn logic_delete_by_ids(&self, ids: &[Param]) -> SqlResult<Rendered> {
        let (placeholders, binder) = self.id_placeholders(ids)?;
        let pk = self.mapping.primary_required()?;
        let mut sql = SqlWriter::new();
        self.logic_delete_set(&mut sql, self.mapping.table())?;
        sql.where_pk_in(&self.db.wrap(&pk.column), &placeholders);
        Ok(self.finish(sql, binder))
    }

    /// Physically delete rows matching every (column, value) pair.
    pub fn delete_by_map(&self, conditions: &[(&str, Param)]) -> SqlResult<Rendered> {
        let (wheres, binder) = self.map_conditions(conditions)?;
        let mut sql = SqlWriter::new();
        sql.delete_from(self.mapping.table());
        sql.where_all(&wheres);
        Ok(self.finish(sql, binder))
    }

    /// Logically delete rows matching every (column, value) pair.
    pub fn logic_delete_by_map(&self, conditions: &[(&str, Param)]) -> SqlResult<Rendered> {
        let (wheres, binder) = self.map_conditions(conditions)?;
        let mut sql = SqlWriter::new();
        self.logic_delete_set(&mut sql, self.mapping.table())?;
        sql.where_all(&wheres);
        Ok(self.finish(sql, binder))
    }

    // ==================== UPDATE ====================

    /// Update rows matching a statement intent.
    ///
    /// Requires at least one explicit assignment. Fields carrying an update
    /// default that were not explicitly assigned are filled in first; the
    /// lock-version default is dropped when `ignore_lock_version` is set.
    /// Unless suppressed, a versioned mapping must see its version column in
    /// the WHERE predicates.
    pub fn update(&self, intent: &StatementIntent) -> SqlResult<Rendered> {
        if let Some(custom) = intent.customized() {
            return Ok(self.verbatim(custom));
        }
        if !intent.has_updates() {
            return Err(SqlError::validation(
                "update requires at least one SET assignment",
            ));
        }
        if !intent.ignores_lock_version() {
            self.check_version_condition(intent)?;
        }

        let mut binder = Binder::new(self.style);
        let mut assigns = Vec::new();
        for field in self.mapping.fields() {
            let Some(default) = &field.update_default else {
                continue;
            };
            if !field.updatable {
                continue;
            }
            if intent.ignores_lock_version() && field.role == FieldRole::LockVersion {
                continue;
            }
            if intent.updates().iter().any(|(c, _)| *c == field.column) {
                continue;
            }
            assigns.push(format!("{} = {default}", self.db.wrap(&field.column)));
        }
        for (column, value) in intent.updates() {
            match value {
                SetValue::Value(param) => {
                    let ph = binder.bind(param.clone());
                    assigns.push(format!("{} = {ph}", self.db.wrap(column)));
                }
                SetValue::Raw(expr) => {
                    assigns.push(format!("{} = {expr}", self.db.wrap(column)));
                }
            }
        }

        let mut sql = SqlWriter::new();
        sql.update(self.intent_table(intent));
        sql.set(&assigns);
        self.where_group_order_by(&mut sql, intent, &mut binder);
        if let Some(page) = intent.page() {
            if self.db.supports_limited_update() {
                sql.limit(page.limit);
            }
        }
        Ok(self.finish(sql, binder))
    }

    /// Render several independent update intents as one batch statement.
    ///
    /// Each element is rendered on its own, its `#{ew....}` references are
    /// renumbered to `#{ew[i]....}`, and the results are joined with a
    /// statement separator so the batch resolves against one parameter
    /// object holding the intent array.
    pub fn update_batch(&self, intents: &[StatementIntent]) -> SqlResult<Rendered> {
        if intents.is_empty() {
            return Err(SqlError::validation("update batch cannot be empty"));
        }
        let mut statements = Vec::with_capacity(intents.len());
        let mut bindings = Vec::new();
        for (index, intent) in intents.iter().enumerate() {
            let rendered = self.update(intent)?;
            statements.push(index_batch_params(&rendered.sql, index));
            for mut binding in rendered.bindings {
                if let Some(rest) = binding.path.strip_prefix("ew.") {
                    binding.path = format!("ew[{index}].{rest}");
                }
                bindings.push(binding);
            }
        }
        Ok(Rendered {
            sql: statements.join(";\n"),
            bindings,
        })
    }

    // ==================== shared pieces ====================

    fn validate_insert_entity(&self, entity: &dyn Entity, with_pk: bool) -> SqlResult<()> {
        if self.mapping.primary().is_none() {
            return Ok(());
        }
        if with_pk && !entity.primary_is_set() {
            return Err(SqlError::primary_key(
                "the primary key of an insert-with-pk entity must be set",
            ));
        }
        if !with_pk && entity.primary_is_set() {
            return Err(SqlError::primary_key(
                "the primary key of an insert entity must be unset",
            ));
        }
        Ok(())
    }

    /// Effective table for one entity row: its override wins over the
    /// static mapping.
    fn entity_table(&self, entity: &dyn Entity) -> String {
        entity
            .table_override()
            .unwrap_or_else(|| self.mapping.table().to_string())
    }

    /// Effective table for an intent.
    fn intent_table<'i>(&'i self, intent: &'i StatementIntent) -> &'i str {
        intent.table_override().unwrap_or(self.mapping.table())
    }

    fn select_list(&self) -> String {
        self.mapping
            .select_columns()
            .iter()
            .map(|c| self.db.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn id_placeholders(&self, ids: &[Param]) -> SqlResult<(Vec<String>, Binder)> {
        if ids.is_empty() {
            return Err(SqlError::validation("primary key list cannot be empty"));
        }
        let mut binder = Binder::new(self.style);
        let placeholders = ids
            .iter()
            .enumerate()
            .map(|(i, id)| binder.placeholder(format!("list[{i}]"), Some(id.clone())))
            .collect();
        Ok((placeholders, binder))
    }

    fn map_conditions(&self, conditions: &[(&str, Param)]) -> SqlResult<(Vec<String>, Binder)> {
        if conditions.is_empty() {
            return Err(SqlError::validation(
                "condition map cannot be empty; it would match every row",
            ));
        }
        let mut binder = Binder::new(self.style);
        let wheres = conditions
            .iter()
            .map(|(column, value)| {
                let ph = binder.placeholder(format!("cm.{column}"), Some(value.clone()));
                format!("{} = {ph}", self.db.wrap(column))
            })
            .collect();
        Ok((wheres, binder))
    }

    fn where_group_order_by(
        &self,
        sql: &mut SqlWriter,
        intent: &StatementIntent,
        binder: &mut Binder,
    ) {
        let wheres = intent.wheres().render(self.db, binder);
        sql.where_clause(&wheres);
        sql.group_by(intent.group_by_items());
        sql.order_by(intent.order_by_items());
    }

    /// `UPDATE <table> SET <logic-delete column> = <marker>`; the marker kind
    /// is fixed by the mapping.
    fn logic_delete_set(&self, sql: &mut SqlWriter, table: &str) -> SqlResult<()> {
        let field = self.mapping.logic_delete().ok_or_else(|| {
            SqlError::configuration(format!(
                "table '{}' declares no logic-delete field",
                self.mapping.table()
            ))
        })?;
        sql.update(table);
        let column = self.db.wrap(&field.column);
        match field.marker {
            Some(DeleteMarker::Timestamp) => sql.set(&[format!("{column} = {}", (self.clock)())]),
            _ => sql.set(&[format!("{column} = true")]),
        }
        Ok(())
    }

    fn check_version_condition(&self, intent: &StatementIntent) -> SqlResult<()> {
        let Some(version) = self.mapping.version() else {
            return Ok(());
        };
        let wheres = intent.where_columns();
        let wrapped = self.db.wrap(&version.column);
        let found = wheres
            .iter()
            .any(|c| *c == version.column || *c == version.property || *c == wrapped);
        if found {
            Ok(())
        } else {
            Err(SqlError::lock_guard(format!(
                "no condition on lock-version column '{}' in the update predicates; \
                 set ignore_lock_version to suppress",
                version.column
            )))
        }
    }

    fn apply_page(&self, text: String, intent: &StatementIntent) -> String {
        match intent.page() {
            Some(page) => self.db.paginate(&text, page.offset, page.limit),
            None => text,
        }
    }

    fn verbatim(&self, sql: &str) -> Rendered {
        self.finish_text(sql.to_string(), Binder::new(self.style))
    }

    fn finish(&self, sql: SqlWriter, binder: Binder) -> Rendered {
        self.finish_text(sql.finish(), binder)
    }

    fn finish_text(&self, sql: String, binder: Binder) -> Rendered {
        let rendered = Rendered {
            sql,
            bindings: binder.into_bindings(),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            sql = %rendered.sql,
            bindings = rendered.bindings.len(),
            "rendered statement"
        );
        rendered
    }
}

const BATCH_MARKER: [char; 4] = ['#', '{', 'e', 'w'];
const BATCH_NESTED: &str = ".parameters.";

/// Renumber parameter references for one element of a batch statement:
/// `#{ew.parameters.x}` becomes `#{ew[<index>].parameters.x}`.
///
/// Single left-to-right scan with a match counter rather than pattern
/// substitution: the marker may occur mid-identifier or inside raw
/// fragments, and the index is injected only when the text immediately after
/// the marker is exactly the nested parameters segment.
pub fn index_batch_params(sql: &str, index: usize) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut matched = 0;
    for (pos, ch) in sql.char_indices() {
        if matched == BATCH_MARKER.len() {
            if sql[pos..].starts_with(BATCH_NESTED) {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            matched = usize::from(ch == BATCH_MARKER[0]);
        } else if ch == BATCH_MARKER[matched] {
            matched += 1;
        } else {
            matched = usize::from(ch == BATCH_MARKER[0]);
        }
        out.push(ch);
    }
    out
}
